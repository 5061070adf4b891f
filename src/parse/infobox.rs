//! Infobox recognition.
//!
//! The first top-level template whose name starts with an infobox prefix
//! (or is on the configured allow-list) becomes the document's infobox.
//! Templates nested in other templates, tables, or list lines are never
//! considered.

use crate::ast::Infobox;
use crate::parse::ParseContext;
use crate::parse::template::{self, TemplateKind};
use crate::parse::tokenizer::{Token, TokenKind};
use crate::parse::util::normalize_name;

/// The adopted infobox.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FoundInfobox {
    /// Template name with the infobox prefix removed, e.g. `venue`.
    pub template: String,
    pub fields: Infobox,
}

pub(crate) fn extract(ctx: &mut ParseContext, src: &str, tokens: &[Token]) -> Option<FoundInfobox> {
    let config = ctx.config();
    for token in tokens.iter().filter(|t| t.kind == TokenKind::Template) {
        let start = token.span.start as usize;
        let region = &src[token.span.range()];
        let Some(raw) = template::scan(region) else {
            continue;
        };
        if raw.kind == TemplateKind::ParserFunction {
            continue;
        }
        let Some(name) = infobox_name(&raw.name, &config.infobox_prefixes, &config.infobox_templates)
        else {
            continue;
        };

        let Some(parsed) = template::build(ctx, region, start) else {
            continue;
        };
        let mut fields = Infobox::new();
        for (key, value) in parsed.params {
            // later duplicates overwrite earlier ones in place.
            fields.insert(field_key(&key), value);
        }
        log::trace!("infobox {name:?} with {} fields", fields.len());
        return Some(FoundInfobox {
            template: name,
            fields,
        });
    }
    None
}

/// The `infoboxTemplate` value when `name` names an infobox.
fn infobox_name(name: &str, prefixes: &[String], allow_list: &[String]) -> Option<String> {
    // underscores read as spaces; case is kept for the output.
    let display = name
        .split(|c: char| c.is_whitespace() || c == '_')
        .filter(|w| !w.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    let lower = display.to_lowercase();

    for prefix in prefixes {
        let prefix = prefix.to_lowercase();
        if !prefix.is_empty() && lower.starts_with(&prefix) {
            let rest: String = display.chars().skip(prefix.chars().count()).collect();
            return Some(rest.trim().to_string());
        }
    }

    allow_list
        .iter()
        .any(|allowed| normalize_name(allowed) == lower)
        .then_some(display)
}

/// Infobox keys: trimmed, lowercase, inner whitespace as `_`.
pub fn field_key(key: &str) -> String {
    key.split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
        .to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::parse::tokenizer::{Mode, tokenize};

    fn find(src: &str, config: &Config) -> Option<FoundInfobox> {
        let mut ctx = ParseContext::new(config);
        let tokens = tokenize(src, Mode::Block, &mut ctx);
        extract(&mut ctx, src, &tokens)
    }

    #[test]
    fn prefix_match_strips_the_prefix() {
        let src = "{{Use dmy dates}}\n{{Infobox venue\n| name = Royal Cinema\n| Opened = 1939\n| Former Names = The Pylon\n}}\nText.";
        let found = find(src, &Config::default()).expect("infobox");
        assert_eq!(found.template, "venue");
        assert_eq!(found.fields["opened"].text, "1939");
        assert_eq!(found.fields["former_names"].text, "The Pylon");
        let keys: Vec<&str> = found.fields.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["name", "opened", "former_names"]);
    }

    #[test]
    fn localized_prefix_and_underscores() {
        let found = find("{{Infoboks_verksemd|namn=Statoil ASA}}", &Config::default())
            .expect("infobox");
        assert_eq!(found.template, "verksemd");
        assert_eq!(found.fields["namn"].text, "Statoil ASA");
    }

    #[test]
    fn allow_list_matches_whole_names() {
        let src = "{{Taxobox|name=Pike}}";
        assert!(find(src, &Config::default()).is_none());

        let config = Config {
            infobox_templates: vec!["taxobox".to_string()],
            ..Config::default()
        };
        let found = find(src, &config).expect("infobox");
        assert_eq!(found.template, "Taxobox");
    }

    #[test]
    fn only_the_first_top_level_infobox_counts() {
        let src = "{{Other|x={{Infobox inner|a=1}}}}\n{{Infobox person|nationality=[[Canada|Canadian]]}}\n{{Infobox second|b=2}}";
        let found = find(src, &Config::default()).expect("infobox");
        assert_eq!(found.template, "person");
        assert_eq!(found.fields["nationality"].text, "Canadian");
    }

    #[test]
    fn duplicate_keys_overwrite() {
        let found = find("{{Infobox x|a=1|b=2|a=3}}", &Config::default()).expect("infobox");
        let fields: Vec<(&str, &str)> = found
            .fields
            .iter()
            .map(|(k, v)| (k.as_str(), v.text.as_str()))
            .collect();
        assert_eq!(fields, vec![("a", "3"), ("b", "2")]);
    }

    #[test]
    fn keys_normalize() {
        assert_eq!(field_key("  Former   Names "), "former_names");
    }
}
