//! Scanning helpers shared by the pipeline stages.

/// A byte range for a single line in the source.
///
/// - `start..end` is the line content excluding the trailing `\n`.
/// - `end_with_newline` is `end` or `end+1` if the line ended with `\n`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineRange {
    pub start: usize,
    pub end: usize,
    pub end_with_newline: usize,
}

/// The line starting at byte `start`, excluding its `\n`.
pub fn line_at(src: &str, start: usize) -> LineRange {
    match src[start..].find('\n') {
        Some(rel) => LineRange {
            start,
            end: start + rel,
            end_with_newline: start + rel + 1,
        },
        None => LineRange {
            start,
            end: src.len(),
            end_with_newline: src.len(),
        },
    }
}

pub fn strip_cr(s: &str) -> &str {
    s.strip_suffix('\r').unwrap_or(s)
}

#[inline]
pub fn is_line_start(src: &str, i: usize) -> bool {
    i == 0 || src.as_bytes()[i - 1] == b'\n'
}

#[inline]
pub fn char_len_at(s: &str, i: usize) -> usize {
    s[i..].chars().next().map(|c| c.len_utf8()).unwrap_or(1)
}

/// Case-insensitive ASCII search for `needle` in `haystack`.
pub fn find_ci(haystack: &str, needle: &str) -> Option<usize> {
    // byte windows avoid lowercasing (and allocating) the haystack.
    haystack
        .as_bytes()
        .windows(needle.len())
        .position(|window| window.eq_ignore_ascii_case(needle.as_bytes()))
}

/// Like [`find_ci`], but the last occurrence.
pub fn rfind_ci(haystack: &str, needle: &str) -> Option<usize> {
    haystack
        .as_bytes()
        .windows(needle.len())
        .rposition(|window| window.eq_ignore_ascii_case(needle.as_bytes()))
}

#[inline]
pub fn starts_with_ci(s: &str, prefix: &str) -> bool {
    s.len() >= prefix.len() && s.as_bytes()[..prefix.len()].eq_ignore_ascii_case(prefix.as_bytes())
}

/// Find the end of the balanced `open`...`close` region `s` starts with.
///
/// Nested pairs are counted, so `{{a|{{b}}}}` matches as a whole. Returns
/// the byte length of the region including both delimiters, or `None` if
/// it is never closed.
pub fn find_matching(s: &str, open: &str, close: &str) -> Option<usize> {
    debug_assert!(s.starts_with(open));
    let mut depth = 0usize;
    let mut i = 0usize;
    while i < s.len() {
        let rem = &s[i..];
        if rem.starts_with(open) {
            depth += 1;
            i += open.len();
            continue;
        }
        if rem.starts_with(close) {
            if depth == 0 {
                return None;
            }
            depth -= 1;
            i += close.len();
            if depth == 0 {
                return Some(i);
            }
            continue;
        }
        i += char_len_at(s, i);
    }
    None
}

/// Matching closers for every `open` delimiter in a fragment.
///
/// Built in one forward pass with a stack, so looking up a region is
/// constant work no matter how many openers never close.
#[derive(Debug, Clone)]
pub struct PairTable {
    open: &'static str,
    close: &'static str,
    /// `(opener offset, end of its region)`, sorted by offset.
    pairs: Vec<(usize, Option<usize>)>,
}

impl PairTable {
    pub fn new(s: &str, open: &'static str, close: &'static str) -> Self {
        let mut pairs: Vec<(usize, Option<usize>)> = Vec::new();
        let mut stack = Vec::new();
        let mut i = 0usize;
        while i < s.len() {
            let rem = &s[i..];
            if rem.starts_with(open) {
                stack.push(pairs.len());
                pairs.push((i, None));
                i += open.len();
            } else if rem.starts_with(close) {
                if let Some(at) = stack.pop() {
                    pairs[at].1 = Some(i + close.len());
                }
                i += close.len();
            } else {
                i += char_len_at(s, i);
            }
        }
        Self { open, close, pairs }
    }

    pub fn braces(s: &str) -> Self {
        Self::new(s, "{{", "}}")
    }

    pub fn brackets(s: &str) -> Self {
        Self::new(s, "[[", "]]")
    }

    /// Same answer as [`find_matching`] on `s[at..]`, where `s` is the
    /// fragment the table was built from.
    pub fn region_len(&self, s: &str, at: usize) -> Option<usize> {
        match self.pairs.binary_search_by_key(&at, |&(start, _)| start) {
            Ok(idx) => self.pairs[idx].1.map(|end| end - at),
            // an opener the forward pass stepped over, e.g. the middle of `{{{`.
            Err(_) => find_matching(&s[at..], self.open, self.close),
        }
    }
}

/// Split by `delim` at top-level (ignoring nested `{{...}}` and `[[...]]`).
/// Returns byte ranges into `s`.
pub fn split_top_level(s: &str, delim: char) -> Vec<(usize, usize)> {
    let mut out = Vec::new();
    let mut seg_start = 0usize;
    let mut depth = Nesting::default();
    let mut i = 0usize;
    while i < s.len() {
        if let Some(step) = depth.step(&s[i..]) {
            i += step;
            continue;
        }
        if depth.is_top()
            && let Some(ch) = s[i..].chars().next()
            && ch == delim
        {
            out.push((seg_start, i));
            i += ch.len_utf8();
            seg_start = i;
            continue;
        }
        i += char_len_at(s, i);
    }
    out.push((seg_start, s.len()));
    out
}

/// First `=` not inside nested templates or links.
pub fn find_top_level_eq(s: &str) -> Option<usize> {
    let mut depth = Nesting::default();
    let mut i = 0usize;
    while i < s.len() {
        if let Some(step) = depth.step(&s[i..]) {
            i += step;
            continue;
        }
        if depth.is_top() && s.as_bytes()[i] == b'=' {
            return Some(i);
        }
        i += char_len_at(s, i);
    }
    None
}

/// Running `{{ }}` / `[[ ]]` depth for depth-aware scans.
#[derive(Debug, Default, Clone, Copy)]
pub struct Nesting {
    tpl: usize,
    link: usize,
}

impl Nesting {
    /// Consumes a delimiter pair at the start of `rem`, returning its length.
    pub fn step(&mut self, rem: &str) -> Option<usize> {
        if rem.starts_with("{{") {
            self.tpl += 1;
        } else if rem.starts_with("}}") {
            self.tpl = self.tpl.saturating_sub(1);
        } else if rem.starts_with("[[") {
            self.link += 1;
        } else if rem.starts_with("]]") {
            self.link = self.link.saturating_sub(1);
        } else {
            return None;
        }
        Some(2)
    }

    #[inline]
    pub fn is_top(&self) -> bool {
        self.tpl == 0 && self.link == 0
    }
}

pub fn split_target_anchor(s: &str) -> (&str, Option<&str>) {
    match s.split_once('#') {
        Some((a, b)) => (a, Some(b)),
        None => (s, None),
    }
}

/// Split `s` at its first whitespace run: `("url", Some("label"))`.
pub fn split_first_ws(s: &str) -> (&str, Option<&str>) {
    let s = s.trim_start();
    match s.find(char::is_whitespace) {
        Some(i) => {
            let rest = s[i..].trim_start();
            (&s[..i], (!rest.is_empty()).then_some(rest))
        }
        None => (s, None),
    }
}

/// Remove `<!-- ... -->` comments; an unclosed comment runs to the end.
pub fn strip_comments(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(open) = rest.find("<!--") {
        out.push_str(&rest[..open]);
        match rest[open + 4..].find("-->") {
            Some(close) => rest = &rest[open + 4 + close + 3..],
            None => return out,
        }
    }
    out.push_str(rest);
    out
}

/// Lowercase, trim, and collapse whitespace and underscores to single spaces.
///
/// Used to compare template and namespace names the way MediaWiki does.
pub fn normalize_name(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for word in s.split(|c: char| c.is_whitespace() || c == '_') {
        if word.is_empty() {
            continue;
        }
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(word);
    }
    out.to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matching_counts_nested_pairs() {
        assert_eq!(find_matching("{{a|{{b}}}} tail", "{{", "}}"), Some(11));
        assert_eq!(find_matching("[[a|[[b]] c]]", "[[", "]]"), Some(13));
        assert_eq!(find_matching("{{a|{{b}}", "{{", "}}"), None);
    }

    #[test]
    fn pair_table_agrees_with_find_matching() {
        let s = "x {{a|{{b}}}} {{c [[d]] {{{e}}} {{f";
        let braces = PairTable::braces(s);
        for (at, _) in s.match_indices('{') {
            if s[at..].starts_with("{{") {
                assert_eq!(
                    braces.region_len(s, at),
                    find_matching(&s[at..], "{{", "}}"),
                    "at {at}"
                );
            }
        }
        let brackets = PairTable::brackets(s);
        assert_eq!(brackets.region_len(s, 18), Some(5));
    }

    #[test]
    fn split_ignores_nested_pipes() {
        let s = "name|a=[[x|y]]|{{t|u}}|b";
        let parts: Vec<&str> = split_top_level(s, '|')
            .into_iter()
            .map(|(a, b)| &s[a..b])
            .collect();
        assert_eq!(parts, vec!["name", "a=[[x|y]]", "{{t|u}}", "b"]);
    }

    #[test]
    fn top_level_eq_skips_nested() {
        assert_eq!(find_top_level_eq("{{a|b=c}}"), None);
        assert_eq!(find_top_level_eq("key = {{a|b=c}}"), Some(4));
    }

    #[test]
    fn names_normalize_like_mediawiki() {
        assert_eq!(normalize_name("  Infobox_Venue \n"), "infobox venue");
        assert_eq!(normalize_name("Birth   date"), "birth date");
    }

    #[test]
    fn comments_are_stripped() {
        assert_eq!(strip_comments("a<!-- x -->b<!-- y"), "ab");
    }
}
