use crate::ast::Span;
use serde::{Deserialize, Serialize};

/// Severity level of a diagnostic emitted by the parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Warning,
}

/// The pipeline stage that produced the diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticPhase {
    Tokenize,
    Template,
    Inline,
    Table,
    Media,
}

/// A structured record of a local recovery decision.
///
/// Parsing never fails; anything the parser had to repair or reinterpret
/// shows up here instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub severity: Severity,

    /// Which stage produced this diagnostic.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phase: Option<DiagnosticPhase>,

    /// A stable identifier like `wikitext.template.unclosed`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,

    /// Human readable message.
    pub message: String,

    /// The source span this diagnostic refers to, if available.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub span: Option<Span>,

    /// Optional notes that can help explain recovery decisions.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<String>,
}

impl Diagnostic {
    /// A warning describing input that was recovered rather than parsed.
    pub fn recovery(
        phase: DiagnosticPhase,
        code: &str,
        message: impl Into<String>,
        span: Span,
    ) -> Self {
        Self {
            severity: Severity::Warning,
            phase: Some(phase),
            code: Some(code.to_string()),
            message: message.into(),
            span: Some(span),
            notes: vec![],
        }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }
}
