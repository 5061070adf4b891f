use crate::ast::{RichText, Table};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Infobox fields keyed by normalized parameter name, in template order.
pub type Infobox = IndexMap<String, RichText>;

/// The structured view of one wikitext page.
///
/// A `Redirect` document carries only its target: `sections`, `infobox`,
/// `infobox_template`, `categories`, `images`, and `tables` are all empty
/// or absent. An `Article` never has a redirect target and always has at
/// least the lead section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    #[serde(rename = "type")]
    pub kind: DocumentKind,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redirect_target: Option<String>,

    /// Section anchor of a redirect like `#REDIRECT [[Page#Part]]`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redirect_anchor: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub infobox: Option<Infobox>,

    /// Infobox template name with the infobox prefix removed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub infobox_template: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sections: Vec<Section>,

    /// Category memberships in order of appearance; duplicates kept.
    #[serde(default)]
    pub categories: Vec<Category>,

    #[serde(default)]
    pub images: Vec<Image>,

    /// Every section's tables, in document order.
    #[serde(default)]
    pub tables: Vec<Table>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    Article,
    Redirect,
}

impl Document {
    /// A redirect page pointing at `target`.
    pub fn redirect(target: String, anchor: Option<String>) -> Self {
        Self {
            kind: DocumentKind::Redirect,
            redirect_target: Some(target),
            redirect_anchor: anchor,
            infobox: None,
            infobox_template: None,
            sections: vec![],
            categories: vec![],
            images: vec![],
            tables: vec![],
        }
    }

    #[inline]
    pub fn is_redirect(&self) -> bool {
        self.kind == DocumentKind::Redirect
    }

    /// The first section with the given title. The lead section has an
    /// empty title.
    pub fn section(&self, title: &str) -> Option<&Section> {
        self.sections.iter().find(|s| s.title == title)
    }
}

/// A heading-delimited part of an article.
///
/// Sections are flat; hierarchy is implied by `depth`. The lead section
/// has an empty title and depth 1, the same depth as a `==Title==`
/// section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub title: String,
    pub depth: u8,

    #[serde(default)]
    pub sentences: Vec<RichText>,

    /// List items in this section. `None` unless list parsing is enabled.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lists: Option<Vec<ListItem>>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tables: Vec<Table>,
}

impl Section {
    pub fn new(title: String, depth: u8) -> Self {
        Self {
            title,
            depth,
            sentences: vec![],
            lists: None,
            tables: vec![],
        }
    }

    /// The lead (introduction) section.
    pub fn lead() -> Self {
        Self::new(String::new(), 1)
    }

    /// List items, or an empty slice when lists were not parsed.
    pub fn list_items(&self) -> &[ListItem] {
        self.lists.as_deref().unwrap_or_default()
    }
}

/// A single `*`/`#`/`;`/`:` list line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListItem {
    /// Number of leading list markers (`**` is depth 2).
    pub depth: u8,

    /// True when the innermost marker is `#`.
    pub ordered: bool,

    #[serde(flatten)]
    pub content: RichText,
}

/// A category membership, e.g. `[[Category:Cinemas in Toronto|Royal]]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_key: Option<String>,
}

/// A `[[File:...]]` / `[[Image:...]]` reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Image {
    /// Link target as written, including its namespace prefix.
    pub file: String,

    /// Commons media URL derived from the file name.
    pub url: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<RichText>,
}
