//! Balanced-region tokenizer.
//!
//! Splits markup into a flat stream of top-level regions. Nested `{{ }}` and
//! `[[ ]]` are matched by counting delimiters, so a template whose
//! parameters hold further templates is a single `Template` token. Nothing
//! inside a region is tokenized here; later stages re-tokenize fragments in
//! [`Mode::Inline`] as needed.
//!
//! Unterminated delimiters never fail: the opening delimiter is left in the
//! surrounding `Text` and scanning resumes right after it.

use crate::ast::{Diagnostic, DiagnosticPhase, Span};
use crate::parse::ParseContext;
use crate::parse::util::{
    PairTable, char_len_at, find_ci, is_line_start, line_at, rfind_ci, starts_with_ci, strip_cr,
};

/// Runs of this many `{` or `[` are taken as text without matching.
pub const MAX_DELIM_RUN: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,

    /// Span of the whole region, relative to the tokenized fragment.
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    Text,

    /// `{{...}}`
    Template,

    /// `[[...]]`
    Link,

    /// `==Title==`; `title` is the span of the text between the markers.
    Heading { level: u8, title: Span },

    /// `{| ... |}`
    TableBlock,

    /// A line starting with `*`, `#`, `;`, or `:`.
    ListLine { markers: String, content: Span },

    /// `<ref>...</ref>` or `<ref ... />`
    Ref,

    /// `<!-- ... -->`
    Comment,
}

/// Which constructs the tokenizer looks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Whole documents: line-level headings, tables, and list lines too.
    Block,
    /// Fragments (parameter values, paragraphs, cells): inline regions only.
    Inline,
}

/// Outcome of scanning a construct at the current position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scan {
    /// The construct is complete and `len` bytes long.
    Parsed { len: usize },
    /// The construct never closes; its opening `consumed` bytes are text.
    RecoveredAsText { consumed: usize },
}

/// Tokenize a whole fragment. Spans are relative to `src`.
pub fn tokenize(src: &str, mode: Mode, ctx: &mut ParseContext) -> Vec<Token> {
    tokenize_at(src, 0, mode, ctx)
}

/// Like [`tokenize`], but `src` starts at absolute offset `base` of the
/// document, which diagnostics are reported against.
pub(crate) fn tokenize_at(
    src: &str,
    base: usize,
    mode: Mode,
    ctx: &mut ParseContext,
) -> Vec<Token> {
    let tokens = Tokenizer {
        src,
        base,
        mode,
        ctx,
        out: Vec::new(),
        i: 0,
        text_start: 0,
        braces: PairTable::braces(src),
        brackets: PairTable::brackets(src),
        last_comment_close: src.rfind("-->"),
        last_ref_close: rfind_ci(src, "</ref"),
    }
    .run();
    log::trace!("tokenized {} bytes into {} tokens", src.len(), tokens.len());
    tokens
}

struct Tokenizer<'s, 'a, 'c> {
    src: &'s str,
    base: usize,
    mode: Mode,
    ctx: &'a mut ParseContext<'c>,
    out: Vec<Token>,
    i: usize,
    text_start: usize,
    braces: PairTable,
    brackets: PairTable,
    /// Last `-->` and `</ref` in the fragment; nothing closes past them.
    last_comment_close: Option<usize>,
    last_ref_close: Option<usize>,
}

impl Tokenizer<'_, '_, '_> {
    fn run(mut self) -> Vec<Token> {
        while self.i < self.src.len() {
            if self.mode == Mode::Block && is_line_start(self.src, self.i) && self.try_line() {
                continue;
            }
            if self.try_region() {
                continue;
            }
            self.i += char_len_at(self.src, self.i);
        }
        self.flush_text(self.src.len());
        self.out
    }

    fn flush_text(&mut self, end: usize) {
        if self.text_start < end {
            self.out.push(Token {
                kind: TokenKind::Text,
                span: Span::from_range(self.text_start, end),
            });
        }
        self.text_start = end;
    }

    fn emit(&mut self, kind: TokenKind, start: usize, end: usize) {
        self.flush_text(start);
        self.out.push(Token {
            kind,
            span: Span::from_range(start, end),
        });
        self.i = end;
        self.text_start = end;
    }

    fn recover(&mut self, phase: DiagnosticPhase, code: &str, message: &str, consumed: usize) {
        let span = Span::from_range(self.i, self.i + consumed).offset(self.base);
        self.ctx.report(Diagnostic::recovery(
            phase,
            code,
            message,
            span,
        ));
        // the delimiter stays in the pending text run.
        self.i += consumed;
    }

    /// Line-level constructs; only called at the start of a line.
    fn try_line(&mut self) -> bool {
        let src = self.src;
        let line = line_at(src, self.i);
        let text = strip_cr(&src[line.start..line.end]);

        if let Some((level, title_start, title_end)) = parse_heading(text) {
            let title = Span::from_range(line.start + title_start, line.start + title_end);
            self.emit(TokenKind::Heading { level, title }, line.start, line.end);
            return true;
        }

        if text.trim_start().starts_with("{|") {
            let (end, closed) = scan_table(self.src, line.start);
            if !closed {
                let span = Span::from_range(line.start, end).offset(self.base);
                self.ctx.report(Diagnostic::recovery(
                    DiagnosticPhase::Table,
                    "wikitext.table.unclosed",
                    "Table has no closing |}; ending it at the next heading",
                    span,
                ));
            }
            self.emit(TokenKind::TableBlock, line.start, end);
            return true;
        }

        let markers: String = text
            .chars()
            .take_while(|c| matches!(c, '*' | '#' | ';' | ':'))
            .collect();
        if !markers.is_empty() {
            let content_start = line.start + markers.len();
            let end = logical_line_end(self.src, content_start, &self.braces, &self.brackets);
            let content = Span::from_range(content_start, end);
            self.emit(TokenKind::ListLine { markers, content }, line.start, end);
            return true;
        }

        false
    }

    /// Inline regions: comments, refs, templates, links.
    fn try_region(&mut self) -> bool {
        let src = self.src;
        let rem = &src[self.i..];
        let bytes = rem.as_bytes();
        match bytes.first() {
            Some(b'<') => {
                if rem.starts_with("<!--") {
                    let closable = self.last_comment_close.is_some_and(|c| c >= self.i + 4);
                    let close = if closable { rem[4..].find("-->") } else { None };
                    match close {
                        Some(close) => {
                            let end = self.i + 4 + close + 3;
                            self.emit(TokenKind::Comment, self.i, end);
                        }
                        None => self.recover(
                            DiagnosticPhase::Tokenize,
                            "wikitext.comment.unclosed",
                            "Unclosed comment",
                            4,
                        ),
                    }
                    return true;
                }
                let ref_close = self.last_ref_close.and_then(|c| c.checked_sub(self.i));
                match scan_ref(rem, ref_close) {
                    Some(Scan::Parsed { len }) => {
                        self.emit(TokenKind::Ref, self.i, self.i + len);
                        true
                    }
                    Some(Scan::RecoveredAsText { consumed }) => {
                        self.recover(
                            DiagnosticPhase::Tokenize,
                            "wikitext.ref.unclosed",
                            "Unclosed <ref> tag",
                            consumed,
                        );
                        true
                    }
                    None => false,
                }
            }
            Some(b'{') if rem.starts_with("{{") => {
                self.balanced(rem, TokenKind::Template);
                true
            }
            Some(b'[') if rem.starts_with("[[") => {
                self.balanced(rem, TokenKind::Link);
                true
            }
            _ => false,
        }
    }

    fn balanced(&mut self, rem: &str, kind: TokenKind) {
        let delim = rem.as_bytes()[0];
        let run = rem.bytes().take_while(|b| *b == delim).count();
        if run >= MAX_DELIM_RUN {
            self.recover(
                DiagnosticPhase::Tokenize,
                "wikitext.inline.pathological_delim_run",
                "Long run of opening delimiters treated as text",
                run,
            );
            return;
        }
        let table = match kind {
            TokenKind::Template => &self.braces,
            _ => &self.brackets,
        };
        let matched = table.region_len(self.src, self.i);
        match matched {
            Some(len) => self.emit(kind, self.i, self.i + len),
            None if kind == TokenKind::Template => self.recover(
                DiagnosticPhase::Template,
                "wikitext.template.unclosed",
                "Unclosed template; treating {{ as text",
                2,
            ),
            None => self.recover(
                DiagnosticPhase::Tokenize,
                "wikitext.link.unclosed",
                "Unclosed link; treating [[ as text",
                2,
            ),
        }
    }
}

/// Parse a heading line like `== Title ==`.
///
/// Returns `(level, title_start, title_end)` relative to `line`. The level is
/// the smaller of the leading and trailing `=` runs, capped at 6, so
/// unbalanced markers leave the excess in the title.
pub fn parse_heading(line: &str) -> Option<(u8, usize, usize)> {
    let mut body = line.trim_end();
    // tolerate trailing comments after the closing markers.
    while body.ends_with("-->") {
        let open = body.rfind("<!--")?;
        body = body[..open].trim_end();
    }
    let lead = body.bytes().take_while(|b| *b == b'=').count();
    let trail = body.bytes().rev().take_while(|b| *b == b'=').count();
    if lead == 0 || trail == 0 || lead == body.len() {
        return None;
    }
    let level = lead.min(trail).min(6);
    let inner = &body[level..body.len() - level];
    let start = level + (inner.len() - inner.trim_start().len());
    let end = level + inner.trim_end().len();
    if start >= end {
        return None;
    }
    Some((level as u8, start, end))
}

/// Find the end of the table starting at line `start`.
///
/// Returns `(end, closed)`. An unclosed table ends before the next heading
/// line, or at the end of input.
fn scan_table(src: &str, start: usize) -> (usize, bool) {
    let mut depth = 0usize;
    let mut pos = start;
    let mut last_end = start;
    while pos < src.len() {
        let line = line_at(src, pos);
        let text = strip_cr(&src[line.start..line.end]);
        let trimmed = text.trim_start();
        if trimmed.starts_with("{|") {
            depth += 1;
        } else if trimmed.starts_with("|}") {
            depth = depth.saturating_sub(1);
            if depth == 0 {
                return (line.end, true);
            }
        } else if pos != start && parse_heading(text).is_some() {
            return (last_end, false);
        }
        last_end = line.end;
        pos = line.end_with_newline;
        if line.end == line.end_with_newline {
            break;
        }
    }
    (last_end, false)
}

/// End of a line that may be continued by templates or links spanning
/// newlines, e.g. `* {{cite|\n title=...}}`.
fn logical_line_end(src: &str, start: usize, braces: &PairTable, brackets: &PairTable) -> usize {
    let mut j = start;
    while j < src.len() {
        let rem = &src[j..];
        let table = if rem.starts_with("{{") {
            Some(braces)
        } else if rem.starts_with("[[") {
            Some(brackets)
        } else {
            None
        };
        if let Some(table) = table {
            // an unclosed opener is stepped over whole, like the tokenizer does.
            j += table.region_len(src, j).unwrap_or(2);
            continue;
        }
        if rem.starts_with('\n') {
            break;
        }
        j += char_len_at(src, j);
    }
    // keep `\r` out of the line like `strip_cr` would.
    if src[..j].ends_with('\r') { j - 1 } else { j }
}

/// Scan `<ref ...>...</ref>` or `<ref ... />` at the start of `rem`.
///
/// Returns `None` when `rem` does not start a ref tag at all. `last_close`
/// is the offset of the last `</ref` in `rem`, if any.
fn scan_ref(rem: &str, last_close: Option<usize>) -> Option<Scan> {
    if !starts_with_ci(rem, "<ref") {
        return None;
    }
    match rem[4..].chars().next() {
        Some(c) if c.is_whitespace() || c == '>' || c == '/' => {}
        _ => return None,
    }
    // an opening tag cannot contain another `<`.
    let open_end = match rem[1..].find(['<', '>']) {
        Some(at) if rem.as_bytes()[1 + at] == b'>' => 1 + at,
        _ => return Some(Scan::RecoveredAsText { consumed: 4 }),
    };
    if rem[..open_end].trim_end().ends_with('/') {
        return Some(Scan::Parsed { len: open_end + 1 });
    }
    if last_close.is_none_or(|c| c <= open_end) {
        return Some(Scan::RecoveredAsText { consumed: 4 });
    }
    let body = &rem[open_end + 1..];
    let Some(close) = find_ci(body, "</ref") else {
        return Some(Scan::RecoveredAsText { consumed: 4 });
    };
    let after = &body[close..];
    let len = match after.find('>') {
        Some(gt) => open_end + 1 + close + gt + 1,
        None => rem.len(),
    };
    Some(Scan::Parsed { len })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    fn kinds(src: &str, mode: Mode) -> Vec<(TokenKind, String)> {
        let config = Config::default();
        let mut ctx = ParseContext::new(&config);
        tokenize(src, mode, &mut ctx)
            .into_iter()
            .map(|t| (t.kind.clone(), t.span.slice(src).to_string()))
            .collect()
    }

    #[test]
    fn nested_templates_are_one_token() {
        let toks = kinds("a {{x|{{y|z}}|[[l|m]]}} b", Mode::Inline);
        assert_eq!(toks.len(), 3);
        assert_eq!(toks[1].0, TokenKind::Template);
        assert_eq!(toks[1].1, "{{x|{{y|z}}|[[l|m]]}}");
    }

    #[test]
    fn block_mode_finds_line_constructs() {
        let src = "Lead text.\n== History ==\n* one\n** two\n{|\n| a\n|}\nmore";
        let toks = kinds(src, Mode::Block);
        let heading = toks
            .iter()
            .find_map(|(k, _)| match k {
                TokenKind::Heading { level, title } => Some((*level, title.slice(src))),
                _ => None,
            })
            .expect("heading");
        assert_eq!(heading, (2, "History"));

        let lists: Vec<&str> = toks
            .iter()
            .filter_map(|(k, _)| match k {
                TokenKind::ListLine { markers, .. } => Some(markers.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(lists, vec!["*", "**"]);

        assert!(toks
            .iter()
            .any(|(k, s)| *k == TokenKind::TableBlock && s == "{|\n| a\n|}"));
    }

    #[test]
    fn refs_and_comments_are_regions() {
        let src = "a<ref name=\"x\">{{cite|t}}</ref>b<ref name=y />c<!-- hidden -->d";
        let toks = kinds(src, Mode::Inline);
        let regions: Vec<&TokenKind> = toks.iter().map(|(k, _)| k).collect();
        assert_eq!(
            regions,
            vec![
                &TokenKind::Text,
                &TokenKind::Ref,
                &TokenKind::Text,
                &TokenKind::Ref,
                &TokenKind::Text,
                &TokenKind::Comment,
                &TokenKind::Text,
            ]
        );
    }

    #[test]
    fn unclosed_template_recovers_as_text() {
        let config = Config::default();
        let mut ctx = ParseContext::new(&config);
        let src = "before {{broken [[Link]] after";
        let toks = tokenize(src, Mode::Inline, &mut ctx);
        assert_eq!(toks[0].kind, TokenKind::Text);
        assert_eq!(toks[0].span.slice(src), "before {{broken ");
        assert_eq!(toks[1].kind, TokenKind::Link);

        let diags = ctx.into_diagnostics();
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].code.as_deref(), Some("wikitext.template.unclosed"));
        assert_eq!(diags[0].phase, Some(DiagnosticPhase::Template));
        assert_eq!(diags[0].span, Some(Span::new(7, 9)));
    }

    #[test]
    fn heading_levels_use_shorter_marker_run() {
        assert_eq!(parse_heading("== A =="), Some((2, 3, 4)));
        assert_eq!(parse_heading("===B==").map(|h| h.0), Some(2));
        assert_eq!(parse_heading("==C== <!-- note -->").map(|h| h.0), Some(2));
        assert_eq!(parse_heading("===="), None);
        assert_eq!(parse_heading("a == b =="), None);
    }

    #[test]
    fn unclosed_table_stops_at_heading() {
        let src = "{|\n| a\n== Next ==\ntext";
        let toks = kinds(src, Mode::Block);
        assert_eq!(toks[0], (TokenKind::TableBlock, "{|\n| a".to_string()));
        assert!(matches!(toks[2].0, TokenKind::Heading { .. }));
    }

    #[test]
    fn list_line_spans_multiline_template() {
        let src = "* {{cite\n|title=x}} tail\nnext";
        let toks = kinds(src, Mode::Block);
        assert_eq!(toks[0].1, "* {{cite\n|title=x}} tail");
    }

    #[test]
    fn unclosed_openers_before_one_closer_stay_text() {
        let config = Config::default();
        let mut ctx = ParseContext::new(&config);
        let src = "{{a {{b {{c }}";
        let toks = tokenize(src, Mode::Inline, &mut ctx);
        assert_eq!(toks.len(), 2);
        assert_eq!(toks[0].span.slice(src), "{{a {{b ");
        assert_eq!(toks[1].kind, TokenKind::Template);
        assert_eq!(toks[1].span.slice(src), "{{c }}");

        let diags = ctx.into_diagnostics();
        assert!(
            diags
                .iter()
                .all(|d| d.code.as_deref() == Some("wikitext.template.unclosed"))
        );
    }
}
