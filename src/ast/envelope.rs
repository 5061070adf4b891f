use crate::ast::{Diagnostic, Document};
use serde::{Deserialize, Serialize};

/// Top-level JSON payload printed by the `wiki2doc` binary.
///
/// This wraps a parsed `Document` with metadata that makes debugging easier
/// (schema versioning, source info, diagnostics).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentFile {
    /// Schema version for this JSON payload.
    pub schema_version: u32,

    pub parser: ParserInfo,

    pub source: SourceInfo,

    /// Recovery diagnostics collected while parsing.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<Diagnostic>,

    pub document: Document,
}

/// Identifies the program that produced the document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParserInfo {
    pub name: String,
    pub version: String,
}

impl Default for ParserInfo {
    fn default() -> Self {
        Self {
            name: super::PARSER_NAME.to_string(),
            version: super::PARSER_VERSION.to_string(),
        }
    }
}

/// Information about the markup the document was produced from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceInfo {
    /// If available, a path to the wikitext file used.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    /// Length of the input in bytes.
    pub byte_len: u64,
}
