//! Inline markup -> `RichText`.
//!
//! A fragment is tokenized in [`Mode::Inline`] and folded into visible text:
//! - `''`/`'''` quote markers, comments, and refs vanish.
//! - `[[Page|Display]]` becomes its display text plus a `Link`.
//! - category, file, and interlanguage links vanish.
//! - a few formatting templates render their content; the rest vanish.
//! - HTML tags are stripped, entities decoded, and whitespace collapsed.

use crate::ast::{Diagnostic, DiagnosticPhase, Link, RichText, Span};
use crate::config::Config;
use crate::parse::ParseContext;
use crate::parse::media;
use crate::parse::template::{self, RawParam, RawTemplate};
use crate::parse::tokenizer::{Mode, Token, TokenKind, tokenize_at};
use crate::parse::util::{
    char_len_at, find_ci, normalize_name, split_first_ws, split_target_anchor, split_top_level,
    strip_comments,
};

/// Visible text with the byte offset each link's display text starts at.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct Fragment {
    pub text: String,
    pub links: Vec<(usize, Link)>,
}

impl Fragment {
    pub fn plain(text: &str) -> Self {
        let mut builder = TextBuilder::default();
        builder.push_str(text);
        builder.finish()
    }

    pub fn into_rich_text(self) -> RichText {
        RichText {
            text: self.text,
            links: self.links.into_iter().map(|(_, link)| link).collect(),
        }
    }
}

/// Accumulates visible text, collapsing whitespace runs to one space and
/// trimming both ends.
#[derive(Debug, Default)]
pub(crate) struct TextBuilder {
    text: String,
    pending_space: bool,
    links: Vec<(usize, Link)>,
}

impl TextBuilder {
    pub fn push_str(&mut self, s: &str) {
        for c in s.chars() {
            if c.is_whitespace() {
                self.pending_space = true;
            } else {
                self.flush_space();
                self.text.push(c);
            }
        }
    }

    fn flush_space(&mut self) {
        if self.pending_space && !self.text.is_empty() {
            self.text.push(' ');
        }
        self.pending_space = false;
    }

    pub fn push_link(&mut self, link: Link) {
        if link.display_text.is_empty() {
            return;
        }
        self.flush_space();
        let at = self.text.len();
        self.push_str(&link.display_text);
        self.links.push((at, link));
    }

    pub fn append(&mut self, fragment: Fragment) {
        if fragment.text.is_empty() {
            return;
        }
        self.flush_space();
        let at = self.text.len();
        self.text.push_str(&fragment.text);
        self.links
            .extend(fragment.links.into_iter().map(|(o, link)| (at + o, link)));
    }

    pub fn finish(self) -> Fragment {
        Fragment {
            text: self.text,
            links: self.links,
        }
    }
}

/// Parse a standalone inline fragment with default options.
pub fn parse_inline(markup: &str) -> RichText {
    let config = Config::default();
    let mut ctx = ParseContext::new(&config);
    parse_rich_text(&mut ctx, markup, 0)
}

pub(crate) fn parse_rich_text(ctx: &mut ParseContext, src: &str, base: usize) -> RichText {
    parse_fragment(ctx, src, base).into_rich_text()
}

/// Parse `src`, which starts at absolute offset `base`, into visible text.
pub(crate) fn parse_fragment(ctx: &mut ParseContext, src: &str, base: usize) -> Fragment {
    if !ctx.enter() {
        ctx.report(Diagnostic::recovery(
            DiagnosticPhase::Inline,
            "wikitext.inline.depth_limit",
            "Markup nested too deeply; keeping it as plain text",
            Span::from_range(base, base + src.len()),
        ));
        return Fragment::plain(&strip_markup(src));
    }

    let tokens = tokenize_at(src, base, Mode::Inline, ctx);
    let mut folder = Folder {
        ctx: &mut *ctx,
        src,
        base,
        out: TextBuilder::default(),
        open_external: false,
        dropping: None,
        unclosed_tags: Vec::new(),
    };
    folder.fold(&tokens);
    let fragment = folder.out.finish();

    ctx.leave();
    fragment
}

/// Best-effort text for fragments past the nesting limit.
fn strip_markup(src: &str) -> String {
    let mut out = strip_comments(src);
    for delim in ["{{", "}}", "[[", "]]", "'''", "''"] {
        out = out.replace(delim, " ");
    }
    out
}

/// Tags whose content is never visible text.
const DROPPED_CONTENT_TAGS: &[&str] = &[
    "gallery",
    "math",
    "chem",
    "ce",
    "score",
    "timeline",
    "imagemap",
    "templatedata",
    "references",
    "hiero",
    "graph",
];

/// Tags stripped from text; unknown `<x>` stays literal.
const KNOWN_TAGS: &[&str] = &[
    "abbr", "b", "bdi", "big", "blockquote", "br", "center", "cite", "code", "dd", "del", "div",
    "dl", "dt", "em", "font", "hr", "i", "includeonly", "ins", "kbd", "li", "mark", "noinclude",
    "nowiki", "ol", "onlyinclude", "p", "poem", "pre", "q", "rp", "rt", "ruby", "s", "samp",
    "section", "small", "source", "span", "strike", "strong", "sub", "sup", "syntaxhighlight",
    "table", "td", "th", "tr", "tt", "u", "ul", "var", "wbr", "ref",
];

const URL_SCHEMES: &[&str] = &[
    "http://", "https://", "ftp://", "ftps://", "irc://", "news:", "mailto:", "//",
];

/// Words between two numbers in `{{convert|1|to|2|km}}`.
const CONVERT_RANGE_WORDS: &[&str] = &[
    "-", "–", "to", "and", "or", "by", "x", "+", "to(-)", "and(-)", "+/-", "±",
];

struct Folder<'s, 'a, 'c> {
    ctx: &'a mut ParseContext<'c>,
    src: &'s str,
    base: usize,
    out: TextBuilder,
    /// An `[http://...` whose closing `]` is in a later text token.
    open_external: bool,
    /// Content of this tag is being skipped until its closing tag.
    dropping: Option<&'static str>,
    /// Tags with no closing tag left in the fragment.
    unclosed_tags: Vec<&'static str>,
}

impl Folder<'_, '_, '_> {
    fn fold(&mut self, tokens: &[Token]) {
        let src = self.src;
        let mut skip = 0usize;
        for (idx, token) in tokens.iter().enumerate() {
            let region = &src[token.span.range()];
            match &token.kind {
                TokenKind::Text => {
                    let skipped = skip.min(region.len());
                    skip = 0;
                    self.text(&region[skipped..], token.span.start as usize + skipped);
                }
                _ if self.dropping.is_some() => {}
                TokenKind::Link => {
                    let trail = match tokens.get(idx + 1) {
                        Some(next) if next.kind == TokenKind::Text => {
                            link_trail(&src[next.span.range()])
                        }
                        _ => "",
                    };
                    if self.link(region, token.span.start as usize, trail) {
                        skip = trail.len();
                    }
                }
                TokenKind::Template => self.template(region, token.span.start as usize),
                // references, comments, and block constructs have no inline text.
                _ => {}
            }
        }
    }

    /// Plain text between regions.
    fn text(&mut self, text: &str, at: usize) {
        let (mut text, mut at) = (text, at);
        if let Some(tag) = self.dropping {
            let Some(close) = find_ci(text, &format!("</{tag}")) else {
                return;
            };
            let after = &text[close..];
            let end = close + after.find('>').map_or(after.len(), |gt| gt + 1);
            text = &text[end..];
            at += end;
            self.dropping = None;
        }
        let mut plain = String::new();
        self.scan_text(text, at, &mut plain);
        self.out
            .push_str(&html_escape::decode_html_entities(&plain));
    }

    fn scan_text(&mut self, s: &str, at: usize, plain: &mut String) {
        let mut i = 0usize;
        while i < s.len() {
            let rem = &s[i..];
            let consumed = match rem.as_bytes()[0] {
                b'\'' => {
                    let run = rem.bytes().take_while(|b| *b == b'\'').count();
                    // 2, 3, and 5 are italic/bold toggles; a 4-run is a literal
                    // apostrophe before bold.
                    match run {
                        1 | 4 => plain.push('\''),
                        2 | 3 | 5 => {}
                        n => plain.extend(std::iter::repeat_n('\'', n - 5)),
                    }
                    run
                }
                b'[' if !rem.starts_with("[[") => self.external_link(rem, at + i, plain),
                b']' if self.open_external => {
                    self.open_external = false;
                    1
                }
                b'<' => self.html_tag(rem, at + i, plain),
                b'_' if rem.starts_with("__") => magic_word_len(rem).unwrap_or_else(|| {
                    plain.push('_');
                    1
                }),
                _ => {
                    let len = char_len_at(s, i);
                    plain.push_str(&rem[..len]);
                    len
                }
            };
            i += consumed;
        }
    }

    /// `[http://example.org label]` keeps only `label`.
    fn external_link(&mut self, rem: &str, at: usize, plain: &mut String) -> usize {
        let after = &rem[1..];
        let is_url = URL_SCHEMES.iter().any(|scheme| {
            after
                .get(..scheme.len())
                .is_some_and(|head| head.eq_ignore_ascii_case(scheme))
        });
        if !is_url {
            plain.push('[');
            return 1;
        }
        match after.find(['[', ']', '\n']) {
            Some(close) if after.as_bytes()[close] == b']' => {
                let (_url, label) = split_first_ws(&after[..close]);
                if let Some(label) = label {
                    plain.push(' ');
                    let label_at = at + 1 + (close - label.len());
                    self.scan_text(label, label_at, plain);
                    plain.push(' ');
                }
                close + 2
            }
            _ => {
                // the label continues past this text run, e.g. into a template.
                self.open_external = true;
                1 + after.find(char::is_whitespace).unwrap_or(after.len())
            }
        }
    }

    /// Strips a known HTML tag at the start of `rem`; returns bytes consumed.
    fn html_tag(&mut self, rem: &str, at: usize, plain: &mut String) -> usize {
        let Some((name, closing, len)) = parse_tag(rem) else {
            plain.push('<');
            return 1;
        };
        let lower = name.to_ascii_lowercase();
        if lower == "br" || lower == "hr" {
            plain.push(' ');
            return len;
        }
        if let Some(tag) = DROPPED_CONTENT_TAGS.iter().copied().find(|t| *t == lower) {
            // `<references />` and stray closers hold nothing.
            if closing || rem[..len].ends_with("/>") || self.unclosed_tags.contains(&tag) {
                return len;
            }
            let close_pat = format!("</{tag}");
            if let Some(close) = find_ci(&rem[len..], &close_pat) {
                let after = &rem[len + close..];
                return len + close + after.find('>').map_or(after.len(), |gt| gt + 1);
            }
            // the content runs on past this text; skip it only when the
            // closing tag exists somewhere later.
            let fragment_rest = self.src.get(at + len..).unwrap_or_default();
            if find_ci(fragment_rest, &close_pat).is_some() {
                self.dropping = Some(tag);
                return rem.len();
            }
            self.unclosed_tags.push(tag);
            return len;
        }
        if KNOWN_TAGS.contains(&lower.as_str()) {
            // block-level tags separate words.
            if matches!(lower.as_str(), "p" | "div" | "li" | "td" | "th" | "tr" | "dd" | "dt") {
                plain.push(' ');
            }
            return len;
        }
        plain.push('<');
        1
    }

    /// Renders a `[[...]]` region; `false` when it has no visible text.
    fn link(&mut self, region: &str, at: usize, trail: &str) -> bool {
        let Some(inner) = region
            .strip_prefix("[[")
            .and_then(|r| r.strip_suffix("]]"))
        else {
            return false;
        };
        let parts = split_top_level(inner, '|');
        let (target_start, target_end) = parts[0];
        let target_raw = strip_comments(&inner[target_start..target_end]);
        let target_raw = target_raw.trim();

        let (visible, target) = match target_raw.strip_prefix(':') {
            Some(t) => (true, t.trim_start()),
            None => (false, target_raw),
        };
        if !visible
            && let Some((ns, _)) = target.split_once(':')
            && (is_interlanguage(ns)
                || media::is_category_namespace(ns)
                || media::is_file_namespace(ns))
        {
            return false;
        }

        let (page_part, anchor) = split_target_anchor(target);
        let page = page_part.trim().replace('_', " ");
        let anchor = anchor
            .map(str::trim)
            .filter(|a| !a.is_empty())
            .map(str::to_string);

        let mut display = match parts.get(1) {
            Some(&(label_start, _)) => {
                let label = &inner[label_start..];
                let fragment = if label.trim().is_empty() {
                    Fragment::default()
                } else {
                    parse_fragment(self.ctx, label, self.base + at + 2 + label_start)
                };
                if fragment.text.is_empty() {
                    pipe_trick(&page)
                } else {
                    fragment.text
                }
            }
            None => Fragment::plain(target).text,
        };
        display.push_str(trail);

        self.out.push_link(Link {
            page,
            display_text: display,
            anchor,
        });
        true
    }

    fn template(&mut self, region: &str, at: usize) {
        let Some(raw) = template::scan(region) else {
            return;
        };
        if let Some(fragment) = self.render_template(&raw, self.base + at) {
            self.out.append(fragment);
        }
    }

    /// Visible text for the templates that render inline content.
    fn render_template(&mut self, raw: &RawTemplate<'_>, base: usize) -> Option<Fragment> {
        let name = normalize_name(&raw.name);
        match name.as_str() {
            "nowrap" | "nobr" | "small" | "big" | "resize" | "midsize" | "smaller" | "larger"
            | "nowiki" | "noitalic" | "lang-en" => {
                let param = raw.positional().last()?;
                Some(self.param_fragment(param, base))
            }
            "lang" | "transl" | "nihongo" => {
                let param = if name == "nihongo" {
                    raw.param("1")?
                } else {
                    raw.positional().last()?
                };
                Some(self.param_fragment(param, base))
            }
            "convert" | "cvt" => self.convert(raw, base),
            "start date" | "end date" | "birth date" | "death date" | "start date and age"
            | "end date and age" | "birth date and age" | "death date and age" | "dts"
            | "film date" | "date" => self.date(raw),
            "ubl" | "unbulleted list" | "plainlist" | "plain list" | "hlist" | "flatlist"
            | "flat list" | "bulleted list" | "ordered list" | "collapsible list" => {
                self.item_list(raw, base)
            }
            // footnotes, citation markers, and everything else have no
            // running text.
            _ => None,
        }
    }

    fn param_fragment(&mut self, param: &RawParam<'_>, base: usize) -> Fragment {
        parse_fragment(self.ctx, param.value, base + param.offset)
    }

    fn convert(&mut self, raw: &RawTemplate<'_>, base: usize) -> Option<Fragment> {
        let value = |key: &str| raw.param(key).map(|p| p.value.trim()).filter(|v| !v.is_empty());
        let first = value("1")?;
        let mut builder = TextBuilder::default();
        builder.push_str(first);
        match value("2") {
            Some(word) if CONVERT_RANGE_WORDS.contains(&word) => {
                if word == "-" || word == "–" {
                    builder.push_str("–");
                } else {
                    builder.push_str(" ");
                    builder.push_str(word.trim_end_matches("(-)"));
                    builder.push_str(" ");
                }
                if let Some(second) = value("3") {
                    builder.push_str(second);
                }
                if let Some(unit) = raw.param("4") {
                    builder.push_str(" ");
                    builder.append(self.param_fragment(unit, base));
                }
            }
            Some(_) => {
                if let Some(unit) = raw.param("2") {
                    builder.push_str(" ");
                    builder.append(self.param_fragment(unit, base));
                }
            }
            None => {}
        }
        Some(builder.finish())
    }

    fn date(&mut self, raw: &RawTemplate<'_>) -> Option<Fragment> {
        let mut parts = raw
            .positional()
            .map(|p| p.value.trim())
            .filter(|v| !v.is_empty())
            .take(3);
        let year = parts.next()?;
        let mut out = year.to_string();
        for part in parts {
            out.push('-');
            match part.parse::<u32>() {
                Ok(n) => out.push_str(&format!("{n:02}")),
                Err(_) => out.push_str(part),
            }
        }
        Some(Fragment::plain(&out))
    }

    fn item_list(&mut self, raw: &RawTemplate<'_>, base: usize) -> Option<Fragment> {
        let mut builder = TextBuilder::default();
        let mut first = true;
        for param in raw.positional() {
            let mut line_start = 0usize;
            for line in param.value.split('\n') {
                let offset = param.offset + line_start;
                line_start += line.len() + 1;

                let item = line.trim_start_matches(['*', '#', ':', ';']);
                let lead = line.len() - item.len();
                if item.trim().is_empty() {
                    continue;
                }
                let fragment = parse_fragment(self.ctx, item, base + offset + lead);
                if fragment.text.is_empty() {
                    continue;
                }
                if !first {
                    builder.push_str(", ");
                }
                first = false;
                builder.append(fragment);
            }
        }
        let fragment = builder.finish();
        (!fragment.text.is_empty()).then_some(fragment)
    }
}

/// Lowercase ASCII letters glued to a link's closing `]]`.
fn link_trail(next_text: &str) -> &str {
    let len = next_text
        .bytes()
        .take_while(|b| b.is_ascii_lowercase())
        .count();
    &next_text[..len]
}

/// `[[Page (disambiguation)|]]` displays `Page`; a namespace is dropped too.
fn pipe_trick(page: &str) -> String {
    let mut title = page;
    if let Some((_, rest)) = title.split_once(':') {
        title = rest;
    }
    if let Some(open) = title.rfind(" (")
        && title.ends_with(')')
    {
        title = &title[..open];
    } else if let Some((head, _)) = title.split_once(", ") {
        title = head;
    }
    title.trim().to_string()
}

/// `fr`, `de`, `zh-yue`, `be-tarask`, ...
fn is_interlanguage(prefix: &str) -> bool {
    let mut parts = prefix.split('-');
    let Some(lang) = parts.next() else {
        return false;
    };
    (2..=3).contains(&lang.len())
        && lang.bytes().all(|b| b.is_ascii_lowercase())
        && parts.all(|p| !p.is_empty() && p.bytes().all(|b| b.is_ascii_lowercase()))
}

/// `__TOC__`, `__NOTOC__`, ...: returns the length to skip.
fn magic_word_len(rem: &str) -> Option<usize> {
    let body = &rem[2..];
    let end = body.find("__")?;
    let word = &body[..end];
    (!word.is_empty() && word.bytes().all(|b| b.is_ascii_uppercase())).then_some(end + 4)
}

/// `<name ...>`, `</name>`, or `<name/>` at the start of `rem`.
///
/// Returns the tag name, whether it is a closing tag, and its length.
fn parse_tag(rem: &str) -> Option<(&str, bool, usize)> {
    let body = rem.strip_prefix('<')?;
    let (closing, body) = match body.strip_prefix('/') {
        Some(b) => (true, b),
        None => (false, body),
    };
    let name_len = body
        .bytes()
        .take_while(|b| b.is_ascii_alphanumeric())
        .count();
    if name_len == 0 || !body.as_bytes()[0].is_ascii_alphabetic() {
        return None;
    }
    let name = &body[..name_len];
    let after = &body[name_len..];
    if !after.starts_with(['>', '/', ' ', '\t', '\n']) {
        return None;
    }
    let gt = after.find(['>', '<'])?;
    if after.as_bytes()[gt] != b'>' {
        return None;
    }
    let len = 1 + usize::from(closing) + name_len + gt + 1;
    let lower = name.to_ascii_lowercase();
    let known = KNOWN_TAGS.contains(&lower.as_str())
        || DROPPED_CONTENT_TAGS.contains(&lower.as_str());
    known.then_some((name, closing, len))
}
