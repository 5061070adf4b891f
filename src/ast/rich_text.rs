use serde::{Deserialize, Serialize};

/// Visible text plus the wiki links embedded in it.
///
/// Used for every infobox field, sentence, list item, caption, and table
/// cell. `text` has markup stripped and whitespace collapsed.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RichText {
    pub text: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub links: Vec<Link>,
}

impl RichText {
    /// Plain text without any links.
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            links: vec![],
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.text.is_empty() && self.links.is_empty()
    }
}

/// An internal wiki link, e.g. `[[Toronto Star|the Star]]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Link {
    /// Target page title, excluding any `#anchor`.
    pub page: String,

    /// Text shown for the link. Defaults to the page title.
    pub display_text: String,

    /// Section anchor after `#` in the target.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anchor: Option<String>,
}
