//! Sentence splitting for paragraph text.
//!
//! A boundary follows `.`, `!`, or `?` (plus any closing quotes or
//! brackets) when whitespace or the end of the text comes next. It is
//! suppressed when the next word starts lowercase, and for `.` also after
//! initials, dotted abbreviations like `U.S.`, and the words in
//! [`ABBREVIATIONS`].

use crate::ast::RichText;
use crate::parse::inline::Fragment;

/// Words that end with `.` without ending a sentence.
pub const ABBREVIATIONS: &[&str] = &[
    "mr", "mrs", "ms", "dr", "prof", "sr", "jr", "st", "mt", "ft", "vs", "etc", "inc", "ltd",
    "co", "corp", "no", "vol", "jan", "feb", "mar", "apr", "jun", "jul", "aug", "sep", "sept",
    "oct", "nov", "dec", "approx", "est", "gen", "col", "lt", "sgt", "capt", "gov", "sen", "rep",
    "rev", "fig", "ca", "cf", "al",
];

const CLOSERS: &[char] = &['"', '\'', '”', '’', ')', ']'];

/// Split plain text into sentences.
pub fn split_sentences(text: &str) -> Vec<&str> {
    boundaries(text)
        .into_iter()
        .map(|(start, end)| text[start..end].trim())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Split a parsed paragraph, giving each sentence the links whose display
/// text starts inside it.
pub(crate) fn split_fragment(fragment: Fragment) -> Vec<RichText> {
    let mut links = fragment.links.into_iter().peekable();
    let mut out = Vec::new();
    for (start, end) in boundaries(&fragment.text) {
        let sentence = fragment.text[start..end].trim();
        let mut rich = RichText::plain(sentence);
        while let Some((_, link)) = links.next_if(|(offset, _)| *offset < end) {
            rich.links.push(link);
        }
        if !rich.is_empty() {
            out.push(rich);
        }
    }
    out
}

/// Byte ranges of each sentence; together they cover `text`.
fn boundaries(text: &str) -> Vec<(usize, usize)> {
    let mut out = Vec::new();
    let mut start = 0usize;
    let mut iter = text.char_indices().peekable();

    while let Some((i, c)) = iter.next() {
        if !matches!(c, '.' | '!' | '?') {
            continue;
        }
        let mut only_dots = c == '.';
        let mut end = i + c.len_utf8();
        while let Some(&(j, next)) = iter.peek() {
            if matches!(next, '.' | '!' | '?') {
                only_dots &= next == '.';
            } else if !CLOSERS.contains(&next) {
                break;
            }
            end = j + next.len_utf8();
            iter.next();
        }

        let rest = &text[end..];
        if !rest.is_empty() && !rest.starts_with(char::is_whitespace) {
            continue;
        }
        if rest
            .trim_start()
            .chars()
            .next()
            .is_some_and(char::is_lowercase)
        {
            continue;
        }
        if only_dots && is_abbreviation(last_word(&text[start..i])) {
            continue;
        }

        out.push((start, end));
        start = end;
    }
    if start < text.len() {
        out.push((start, text.len()));
    }
    out
}

/// The word right before a terminal, without opening punctuation.
fn last_word(before: &str) -> &str {
    let word = match before.rfind(char::is_whitespace) {
        Some(ws) => &before[ws..],
        None => before,
    };
    word.trim_start()
        .trim_start_matches(['(', '[', '"', '\'', '“', '‘'])
}

fn is_abbreviation(word: &str) -> bool {
    let mut chars = word.chars();
    match (chars.next(), chars.next()) {
        (None, _) => false,
        (Some(c), None) => c.is_alphabetic(),
        _ => {
            word.contains('.')
                || ABBREVIATIONS
                    .iter()
                    .any(|a| a.eq_ignore_ascii_case(word))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Link;

    #[test]
    fn splits_on_terminal_punctuation() {
        assert_eq!(
            split_sentences("It opened. Was it busy? Yes! Then it closed."),
            vec!["It opened.", "Was it busy?", "Yes!", "Then it closed."]
        );
    }

    #[test]
    fn keeps_abbreviations_and_initials_together() {
        assert_eq!(
            split_sentences("John D. Cruickshank met Dr. Smith in the U.S. Army. He left."),
            vec!["John D. Cruickshank met Dr. Smith in the U.S. Army.", "He left."]
        );
        assert_eq!(
            split_sentences("It cost approx. 5 dollars, i.e. cheap."),
            vec!["It cost approx. 5 dollars, i.e. cheap."]
        );
    }

    #[test]
    fn any_single_letter_reads_as_an_initial() {
        // a one-letter word before `.` never ends a sentence, even when it
        // is a name like "Plan B" or a lowercase letter.
        assert_eq!(
            split_sentences("He bought Plan B. Then he left."),
            vec!["He bought Plan B. Then he left."]
        );
        assert_eq!(
            split_sentences("Married (m. 2006). Then divorced."),
            vec!["Married (m. 2006).", "Then divorced."]
        );
    }

    #[test]
    fn quotes_and_brackets_close_sentences() {
        assert_eq!(
            split_sentences("He said \"Go.\" She went. (It was late.) Done."),
            vec!["He said \"Go.\"", "She went.", "(It was late.)", "Done."]
        );
    }

    #[test]
    fn no_split_before_lowercase_or_inside_numbers() {
        assert_eq!(
            split_sentences("Version 2.5 shipped. the end"),
            vec!["Version 2.5 shipped. the end"]
        );
        assert_eq!(split_sentences("Trailing text"), vec!["Trailing text"]);
        assert!(split_sentences("").is_empty());
    }

    #[test]
    fn links_follow_their_sentence() {
        let fragment = Fragment {
            text: "See Toronto. Then Ottawa.".to_string(),
            links: vec![
                (
                    4,
                    Link {
                        page: "Toronto".to_string(),
                        display_text: "Toronto".to_string(),
                        anchor: None,
                    },
                ),
                (
                    18,
                    Link {
                        page: "Ottawa".to_string(),
                        display_text: "Ottawa".to_string(),
                        anchor: None,
                    },
                ),
            ],
        };
        let sentences = split_fragment(fragment);
        assert_eq!(sentences.len(), 2);
        assert_eq!(sentences[0].links[0].page, "Toronto");
        assert_eq!(sentences[1].text, "Then Ottawa.");
        assert_eq!(sentences[1].links[0].page, "Ottawa");
    }
}
