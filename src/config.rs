//! Parser configuration.
//!
//! `Config` deserializes leniently: unknown keys are ignored and a value of
//! the wrong type falls back to that option's default, so callers can pass
//! option objects written for other tools without breaking the parse.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Default base for derived media URLs.
pub const COMMONS_MEDIA_BASE: &str = "https://upload.wikimedia.org/wikipedia/commons";

/// Options controlling how markup is turned into a `Document`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// If true, list lines are dropped and sections carry no `lists`.
    pub ignore_lists: bool,

    /// Infobox template names that do not start with an infobox prefix,
    /// compared case-insensitively.
    pub infobox_templates: Vec<String>,

    /// Lowercase name prefixes that mark a template as an infobox.
    pub infobox_prefixes: Vec<String>,

    /// Base URL media file URLs are derived under.
    pub media_base_url: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ignore_lists: true,
            infobox_templates: vec![],
            infobox_prefixes: vec!["infobox".to_string(), "infoboks".to_string()],
            media_base_url: COMMONS_MEDIA_BASE.to_string(),
        }
    }
}

impl Config {
    /// Reads options from a JSON object, keeping defaults for anything
    /// missing, unknown, or of the wrong type.
    pub fn from_json_value(value: &Value) -> Self {
        let mut config = Config::default();
        let Some(obj) = value.as_object() else {
            log::debug!("config: expected an object, using defaults");
            return config;
        };

        for (key, v) in obj {
            match key.as_str() {
                "ignoreLists" | "ignore_lists" => match v.as_bool() {
                    Some(b) => config.ignore_lists = b,
                    None => log::debug!("config: ignoring non-boolean {key}"),
                },
                "infoboxTemplates" | "infobox_templates" => {
                    if let Some(names) = string_list(v) {
                        config.infobox_templates = names;
                    } else {
                        log::debug!("config: ignoring non-string-list {key}");
                    }
                }
                "infoboxPrefixes" | "infobox_prefixes" => match string_list(v) {
                    Some(prefixes) if !prefixes.is_empty() => {
                        config.infobox_prefixes =
                            prefixes.into_iter().map(|p| p.to_lowercase()).collect();
                    }
                    _ => log::debug!("config: ignoring invalid {key}"),
                },
                "mediaBaseUrl" | "media_base_url" => match v.as_str() {
                    Some(s) if !s.trim().is_empty() => {
                        config.media_base_url = s.trim().trim_end_matches('/').to_string();
                    }
                    _ => log::debug!("config: ignoring invalid {key}"),
                },
                _ => log::trace!("config: ignoring unknown option {key}"),
            }
        }
        config
    }
}

fn string_list(v: &Value) -> Option<Vec<String>> {
    v.as_array()?
        .iter()
        .map(|s| s.as_str().map(str::to_string))
        .collect()
}

impl<'de> Deserialize<'de> for Config {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(Config::from_json_value(&value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn defaults_ignore_lists() {
        let config = Config::default();
        assert!(config.ignore_lists);
        assert!(config.infobox_templates.is_empty());
        assert_eq!(config.infobox_prefixes, vec!["infobox", "infoboks"]);
    }

    #[test]
    fn reads_known_options() {
        let config = Config::from_json_value(&json!({
            "ignoreLists": false,
            "infoboxTemplates": ["Taxobox"],
            "infoboxPrefixes": ["Infoboks"],
        }));
        assert!(!config.ignore_lists);
        assert_eq!(config.infobox_templates, vec!["Taxobox"]);
        assert_eq!(config.infobox_prefixes, vec!["infoboks"]);
    }

    #[test]
    fn wrong_types_and_unknown_keys_fall_back() {
        let config: Config = serde_json::from_str(
            r#"{"ignoreLists": "no", "infoboxTemplates": [1, 2], "colour": true}"#,
        )
        .expect("lenient config");
        assert_eq!(config, Config::default());

        let config: Config = serde_json::from_str("[1, 2, 3]").expect("lenient config");
        assert_eq!(config, Config::default());
    }
}
