//! The language catalog: which languages the application offers and what
//! they are called.

use crate::error::{I18nError, I18nResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageEntry {
    /// Language code as used in resource paths (e.g. "sq", "en")
    pub code: String,

    /// Display name (e.g. "Shqip", "English")
    #[serde(alias = "title", alias = "label")]
    pub name: String,
}

/// Parsed `languages.json`.
///
/// Two shapes are accepted: an object mapping code to name
/// (`{"sq": "Shqip"}`), or a list of records with a `code` and a
/// `name`/`title`/`label`. Object entries come out sorted by code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct LanguageCatalog {
    entries: Vec<LanguageEntry>,
}

impl LanguageCatalog {
    pub fn new(entries: Vec<LanguageEntry>) -> Self {
        Self { entries }
    }

    pub fn from_value(value: Value) -> I18nResult<Self> {
        match value {
            Value::Object(map) => {
                let entries = map
                    .into_iter()
                    .map(|(code, name)| match name {
                        Value::String(name) => Ok(LanguageEntry { code, name }),
                        other => Err(I18nError::CatalogParse(format!(
                            "name for '{}' must be a string, got {}",
                            code, other
                        ))),
                    })
                    .collect::<I18nResult<Vec<_>>>()?;
                Ok(Self { entries })
            }
            Value::Array(_) => serde_json::from_value::<Vec<LanguageEntry>>(value)
                .map(|entries| Self { entries })
                .map_err(|e| I18nError::CatalogParse(e.to_string())),
            other => Err(I18nError::CatalogParse(format!(
                "expected an object or a list, got {}",
                other
            ))),
        }
    }

    pub fn entries(&self) -> &[LanguageEntry] {
        &self.entries
    }

    pub fn codes(&self) -> Vec<&str> {
        self.entries.iter().map(|entry| entry.code.as_str()).collect()
    }

    pub fn get(&self, code: &str) -> Option<&LanguageEntry> {
        self.entries.iter().find(|entry| entry.code == code)
    }

    pub fn contains(&self, code: &str) -> bool {
        self.get(code).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
