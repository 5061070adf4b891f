//! Document model and JSON envelope.
//!
//! This module defines the **contract** between parsing wikitext and any
//! consumer of the result:
//! - `Document` is the immutable value `parse` produces.
//! - `RichText` is the text-plus-links shape every field uses.
//! - `Diagnostic` records each local recovery made on malformed input.
//! - `Span` offsets point into the **raw input bytes**.

mod diagnostic;
mod document;
mod envelope;
mod rich_text;
mod span;
mod table;

pub use diagnostic::*;
pub use document::*;
pub use envelope::*;
pub use rich_text::*;
pub use span::*;
pub use table::*;

/// JSON schema version for the document envelope.
///
/// Bump this when making non-backwards-compatible changes to the JSON structure.
pub const SCHEMA_VERSION: u32 = 1;

/// The parser name stored in the JSON envelope.
pub const PARSER_NAME: &str = "wiki2doc";

/// The parser version stored in the JSON envelope.
pub const PARSER_VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_document() -> Document {
        let mut infobox = Infobox::new();
        infobox.insert("opened".to_string(), RichText::plain("1939"));

        let mut row = TableRow::new();
        row.insert("Level".to_string(), RichText::plain("AAA"));

        Document {
            kind: DocumentKind::Article,
            redirect_target: None,
            redirect_anchor: None,
            infobox: Some(infobox),
            infobox_template: Some("venue".to_string()),
            sections: vec![Section {
                title: String::new(),
                depth: 1,
                sentences: vec![RichText {
                    text: "The Royal is a cinema.".to_string(),
                    links: vec![Link {
                        page: "Movie theater".to_string(),
                        display_text: "cinema".to_string(),
                        anchor: None,
                    }],
                }],
                lists: None,
                tables: vec![Table {
                    rows: vec![row.clone()],
                }],
            }],
            categories: vec![Category {
                name: "Cinemas in Toronto".to_string(),
                sort_key: Some("Royal".to_string()),
            }],
            images: vec![],
            tables: vec![Table { rows: vec![row] }],
        }
    }

    #[test]
    fn document_file_json_round_trip() {
        let file = DocumentFile {
            schema_version: SCHEMA_VERSION,
            parser: ParserInfo::default(),
            source: SourceInfo {
                path: Some("tests/testdata/royal_cinema.wiki".to_string()),
                byte_len: 42,
            },
            diagnostics: vec![Diagnostic::recovery(
                DiagnosticPhase::Tokenize,
                "wikitext.template.unclosed",
                "example diagnostic",
                Span::new(5, 7),
            )],
            document: sample_document(),
        };

        let json = serde_json::to_string_pretty(&file).expect("serialize");
        let back: DocumentFile = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(file, back);
    }

    #[test]
    fn json_uses_data_model_field_names() {
        let value = serde_json::to_value(sample_document()).expect("serialize");
        assert_eq!(value["type"], "article");
        assert_eq!(value["infoboxTemplate"], "venue");
        assert_eq!(value["infobox"]["opened"]["text"], "1939");
        assert_eq!(value["categories"][0]["sortKey"], "Royal");
        assert_eq!(
            value["sections"][0]["sentences"][0]["links"][0]["displayText"],
            "cinema"
        );
        // tables serialize as bare arrays of row objects.
        assert_eq!(value["tables"][0][0]["Level"]["text"], "AAA");
        // absent means absent, not null.
        assert!(value.get("redirectTarget").is_none());
        assert!(value["sections"][0].get("lists").is_none());
    }

    #[test]
    fn redirect_omits_article_fields() {
        let doc = Document::redirect("Toronto".to_string(), None);
        let value = serde_json::to_value(&doc).expect("serialize");
        assert_eq!(value["type"], "redirect");
        assert_eq!(value["redirectTarget"], "Toronto");
        assert!(value.get("infobox").is_none());
        assert!(value.get("infoboxTemplate").is_none());
        assert!(value.get("sections").is_none());
    }
}
