//! `{{...}}` template invocations.
//!
//! Templates are never expanded. A region is split into its name and its
//! parameters; parameter values are parsed as inline markup on demand.

use crate::ast::RichText;
use crate::config::Config;
use crate::parse::ParseContext;
use crate::parse::inline;
use crate::parse::util::{
    find_matching, find_top_level_eq, split_top_level, starts_with_ci, strip_comments,
};
use serde::{Deserialize, Serialize};

/// A parsed template invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Template {
    /// Name as written, trimmed, without `subst:` and comments.
    pub name: String,

    pub kind: TemplateKind,

    /// Parameters in order. Named keys are trimmed and lowercased;
    /// positional ones are numbered from `"1"` among positionals only.
    pub params: Vec<(String, RichText)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemplateKind {
    Template,
    /// `{{#if:...}}`, `{{DEFAULTSORT:...}}` and other magic functions.
    ParserFunction,
}

impl Template {
    /// Value of parameter `key`. A repeated key resolves to its last value.
    pub fn get(&self, key: &str) -> Option<&RichText> {
        self.params
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }
}

/// A template split into name and raw parameter values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RawTemplate<'a> {
    pub name: String,
    pub kind: TemplateKind,
    pub params: Vec<RawParam<'a>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RawParam<'a> {
    pub key: String,
    pub named: bool,
    /// Trimmed value markup.
    pub value: &'a str,
    /// Offset of `value` within the region.
    pub offset: usize,
}

impl<'a> RawTemplate<'a> {
    pub fn param(&self, key: &str) -> Option<&RawParam<'a>> {
        self.params.iter().rev().find(|p| p.key == key)
    }

    pub fn positional(&self) -> impl Iterator<Item = &RawParam<'a>> {
        self.params.iter().filter(|p| !p.named)
    }
}

/// Parse a single template invocation such as `{{Infobox venue|opened=1939}}`.
///
/// Returns `None` unless `markup` (ignoring surrounding whitespace) is
/// exactly one balanced `{{...}}` region with a non-empty name.
pub fn parse_template(markup: &str) -> Option<Template> {
    let trimmed = markup.trim();
    if !trimmed.starts_with("{{") || find_matching(trimmed, "{{", "}}") != Some(trimmed.len()) {
        return None;
    }
    let base = markup.len() - markup.trim_start().len();
    let config = Config::default();
    let mut ctx = ParseContext::new(&config);
    build(&mut ctx, trimmed, base)
}

/// Split and parse a balanced region starting at absolute offset `base`.
pub(crate) fn build(ctx: &mut ParseContext, region: &str, base: usize) -> Option<Template> {
    let raw = scan(region)?;
    let params = raw
        .params
        .iter()
        .map(|p| {
            let value = inline::parse_rich_text(ctx, p.value, base + p.offset);
            (p.key.clone(), value)
        })
        .collect();
    Some(Template {
        name: raw.name,
        kind: raw.kind,
        params,
    })
}

/// Split a balanced `{{...}}` region without parsing parameter values.
pub(crate) fn scan(region: &str) -> Option<RawTemplate<'_>> {
    let inner = region.strip_prefix("{{")?.strip_suffix("}}")?;
    let parts = split_top_level(inner, '|');
    let (first_start, first_end) = parts[0];
    let first = &inner[first_start..first_end];

    let mut name = strip_subst(strip_comments(first).trim()).to_string();

    let mut params = Vec::new();
    let mut kind = TemplateKind::Template;
    let mut position = 1usize;

    if let Some((fname, _)) = name.split_once(':')
        && is_parser_function(fname)
    {
        kind = TemplateKind::ParserFunction;
        name = fname.trim().to_string();
        // the argument after the colon is the first positional parameter.
        let after_subst = first.len() - strip_subst(first).len();
        if let Some(colon) = first[after_subst..].find(':').map(|c| after_subst + c) {
            let arg = &first[colon + 1..];
            let (value, lead) = trim_with_lead(arg);
            params.push(RawParam {
                key: position.to_string(),
                named: false,
                value,
                offset: 2 + first_start + colon + 1 + lead,
            });
            position += 1;
        }
    }

    if name.is_empty() {
        return None;
    }

    for &(start, end) in &parts[1..] {
        let seg = &inner[start..end];
        if let Some(eq) = find_top_level_eq(seg) {
            let key = seg[..eq].trim().to_lowercase();
            let (value, lead) = trim_with_lead(&seg[eq + 1..]);
            params.push(RawParam {
                key,
                named: true,
                value,
                offset: 2 + start + eq + 1 + lead,
            });
        } else {
            let (value, lead) = trim_with_lead(seg);
            params.push(RawParam {
                key: position.to_string(),
                named: false,
                value,
                offset: 2 + start + lead,
            });
            position += 1;
        }
    }

    Some(RawTemplate { name, kind, params })
}

/// `s` without leading `subst:` or `safesubst:` markers.
fn strip_subst(s: &str) -> &str {
    let mut rest = s.trim_start();
    for prefix in ["subst:", "safesubst:"] {
        if starts_with_ci(rest, prefix) {
            rest = rest[prefix.len()..].trim_start();
        }
    }
    rest
}

/// `#if`, `#invoke`, or an all-caps magic word like `DEFAULTSORT`.
fn is_parser_function(prefix: &str) -> bool {
    let prefix = prefix.trim();
    if prefix.starts_with('#') {
        return true;
    }
    prefix.chars().any(|c| c.is_ascii_uppercase())
        && prefix
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_')
}

fn trim_with_lead(s: &str) -> (&str, usize) {
    let start = s.trim_start();
    (start.trim_end(), s.len() - start.len())
}
