//! Wikitext -> `Document` pipeline.
//!
//! Stages, leaves first:
//! - `tokenizer` finds balanced top-level regions.
//! - `template` splits `{{...}}` into a name and parameters.
//! - `inline` turns fragments into `RichText`.
//! - `sentence`, `list`, `table` give sections their content.
//! - `section` splits the body at headings.
//! - `infobox` and `media` pull document-level metadata.
//!
//! Every stage is error-tolerant: malformed markup is recovered locally and
//! recorded as a `Diagnostic` on the shared `ParseContext`.

pub mod infobox;
pub mod inline;
pub mod list;
pub mod media;
pub mod section;
pub mod sentence;
pub mod table;
pub mod template;
pub mod tokenizer;
mod util;

use crate::ast::*;
use crate::config::Config;

/// Nesting depth past which fragments are no longer parsed for markup.
pub const MAX_NESTING_DEPTH: usize = 32;

/// Result of parsing a document.
#[derive(Debug, Clone)]
pub struct ParseOutput {
    pub document: Document,
    pub diagnostics: Vec<Diagnostic>,
}

/// Per-parse state threaded through every stage.
///
/// Each call to [`parse_document`] owns its own context, so documents can
/// be parsed on any number of threads at once.
#[derive(Debug)]
pub struct ParseContext<'c> {
    config: &'c Config,
    diagnostics: Vec<Diagnostic>,
    depth: usize,
}

impl<'c> ParseContext<'c> {
    pub fn new(config: &'c Config) -> Self {
        Self {
            config,
            diagnostics: Vec::new(),
            depth: 0,
        }
    }

    #[inline]
    pub fn config(&self) -> &'c Config {
        self.config
    }

    /// Records a recovery. Fragments are re-scanned at several stages, so
    /// a repeat of an identical diagnostic is dropped.
    pub fn report(&mut self, diagnostic: Diagnostic) {
        if self.diagnostics.contains(&diagnostic) {
            return;
        }
        log::debug!(
            "{}: {} at {:?}",
            diagnostic.code.as_deref().unwrap_or("wikitext"),
            diagnostic.message,
            diagnostic.span
        );
        self.diagnostics.push(diagnostic);
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }

    /// Enters one level of fragment nesting; `false` once the limit is hit.
    pub(crate) fn enter(&mut self) -> bool {
        if self.depth >= MAX_NESTING_DEPTH {
            return false;
        }
        self.depth += 1;
        true
    }

    pub(crate) fn leave(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }
}

/// Parse wikitext into a `Document`, keeping the recovery diagnostics.
///
/// Spans in diagnostics are byte offsets into `src`.
pub fn parse_document(src: &str, config: &Config) -> ParseOutput {
    let mut ctx = ParseContext::new(config);

    let document = match media::find_redirect(&mut ctx, src) {
        Some(redirect) => {
            log::trace!("redirect to {:?}", redirect.target);
            Document::redirect(redirect.target, redirect.anchor)
        }
        None => build_article(&mut ctx, src),
    };

    ParseOutput {
        document,
        diagnostics: ctx.into_diagnostics(),
    }
}

/// Parse wikitext into a `Document`.
pub fn parse(src: &str, config: &Config) -> Document {
    parse_document(src, config).document
}

fn build_article(ctx: &mut ParseContext, src: &str) -> Document {
    let tokens = tokenizer::tokenize(src, tokenizer::Mode::Block, ctx);

    let (infobox_template, infobox) = match infobox::extract(ctx, src, &tokens) {
        Some(found) => (Some(found.template), Some(found.fields)),
        None => (None, None),
    };
    let sections = section::build_sections(ctx, src, &tokens);
    let categories = media::categories(src);
    let images = media::images(ctx, src);
    let tables = sections
        .iter()
        .flat_map(|s| s.tables.iter().cloned())
        .collect();

    log::trace!(
        "article: {} sections, {} categories, {} images",
        sections.len(),
        categories.len(),
        images.len()
    );

    Document {
        kind: DocumentKind::Article,
        redirect_target: None,
        redirect_anchor: None,
        infobox,
        infobox_template,
        sections,
        categories,
        images,
        tables,
    }
}
