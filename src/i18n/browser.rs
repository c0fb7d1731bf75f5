//! Browser-side boundary: the document `lang` attribute, persisted storage,
//! the page query string and the navigator's preferred languages.
//!
//! Everything the i18n layer reads from or writes to the host goes through
//! `BrowserEnv`, so it can run against in-memory stand-ins in tests and a
//! JSON file as persisted storage in the command-line tool.

use crate::i18n::store::lock;
use anyhow::{Context, Result};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::warn;
use url::form_urlencoded;

/// The document root element's `lang` attribute.
pub trait Document: Send + Sync {
    fn lang(&self) -> Option<String>;
    fn set_lang(&self, lang: &str);
}

/// Key/value storage that survives page reloads (e.g. `localStorage`).
pub trait Storage: Send + Sync {
    fn get_item(&self, key: &str) -> Option<String>;
    fn set_item(&self, key: &str, value: &str);
}

#[derive(Debug, Default)]
pub struct MemoryDocument {
    lang: Mutex<Option<String>>,
}

impl MemoryDocument {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Document for MemoryDocument {
    fn lang(&self) -> Option<String> {
        lock(&self.lang).clone()
    }

    fn set_lang(&self, lang: &str) {
        *lock(&self.lang) = Some(lang.to_string());
    }
}

#[derive(Debug, Default)]
pub struct MemoryStorage {
    items: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Storage for MemoryStorage {
    fn get_item(&self, key: &str) -> Option<String> {
        lock(&self.items).get(key).cloned()
    }

    fn set_item(&self, key: &str, value: &str) {
        lock(&self.items).insert(key.to_string(), value.to_string());
    }
}

/// Storage persisted as a flat JSON object on disk.
///
/// Writes go straight through to the file. A write failure is logged and
/// the in-memory value is kept, matching how a full `localStorage` quota
/// behaves for the caller.
#[derive(Debug)]
pub struct JsonFileStorage {
    path: PathBuf,
    items: Mutex<BTreeMap<String, String>>,
}

impl JsonFileStorage {
    /// Open `path`, starting empty if the file does not exist yet.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let items = match std::fs::read_to_string(&path) {
            Ok(contents) => serde_json::from_str(&contents)
                .with_context(|| format!("Invalid storage file {}", path.display()))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to read {}", path.display()))
            }
        };

        Ok(Self {
            path,
            items: Mutex::new(items),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, items: &BTreeMap<String, String>) -> Result<()> {
        let contents = serde_json::to_string_pretty(items)?;
        std::fs::write(&self.path, contents)
            .with_context(|| format!("Failed to write {}", self.path.display()))
    }
}

impl Storage for JsonFileStorage {
    fn get_item(&self, key: &str) -> Option<String> {
        lock(&self.items).get(key).cloned()
    }

    fn set_item(&self, key: &str, value: &str) {
        let mut items = lock(&self.items);
        items.insert(key.to_string(), value.to_string());
        if let Err(e) = self.persist(&items) {
            warn!("Could not persist storage: {:#}", e);
        }
    }
}

/// Parsed `?key=value&...` query string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryString {
    params: Vec<(String, String)>,
}

impl QueryString {
    /// Parse a query string, with or without the leading `?`. Components
    /// are form-decoded (`+` is a space, invalid escapes are kept).
    pub fn parse(raw: &str) -> Self {
        let raw = raw.strip_prefix('?').unwrap_or(raw);
        let params = form_urlencoded::parse(raw.as_bytes())
            .into_owned()
            .collect();
        Self { params }
    }

    /// First value for `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// Handles to everything the i18n layer touches outside itself.
#[derive(Clone)]
pub struct BrowserEnv {
    pub document: Arc<dyn Document>,
    pub storage: Arc<dyn Storage>,
    pub query: QueryString,
    pub navigator_languages: Vec<String>,
}

impl BrowserEnv {
    /// In-memory document and storage, empty query string, no navigator languages.
    pub fn in_memory() -> Self {
        Self {
            document: Arc::new(MemoryDocument::new()),
            storage: Arc::new(MemoryStorage::new()),
            query: QueryString::default(),
            navigator_languages: Vec::new(),
        }
    }

    pub fn with_query(mut self, raw: &str) -> Self {
        self.query = QueryString::parse(raw);
        self
    }

    pub fn with_navigator_languages<I, S>(mut self, languages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.navigator_languages = languages.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_storage(mut self, storage: Arc<dyn Storage>) -> Self {
        self.storage = storage;
        self
    }

    pub fn with_document(mut self, document: Arc<dyn Document>) -> Self {
        self.document = document;
        self
    }
}

impl std::fmt::Debug for BrowserEnv {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BrowserEnv")
            .field("document_lang", &self.document.lang())
            .field("query", &self.query)
            .field("navigator_languages", &self.navigator_languages)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    // ==================== Document / Storage Tests ====================

    #[test]
    fn test_memory_document_lang() {
        let document = MemoryDocument::new();
        assert_eq!(document.lang(), None);
        document.set_lang("sq-AL");
        assert_eq!(document.lang().as_deref(), Some("sq-AL"));
    }

    #[test]
    fn test_memory_storage_roundtrip() {
        let storage = MemoryStorage::new();
        assert_eq!(storage.get_item("locale"), None);
        storage.set_item("locale", "en");
        assert_eq!(storage.get_item("locale").as_deref(), Some("en"));
    }

    #[test]
    fn test_json_file_storage_persists_across_opens() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let path = temp_dir.path().join("storage.json");

        let storage = JsonFileStorage::open(&path).expect("open");
        assert_eq!(storage.get_item("locale"), None);
        storage.set_item("locale", "fr");

        let reopened = JsonFileStorage::open(&path).expect("reopen");
        assert_eq!(reopened.get_item("locale").as_deref(), Some("fr"));
    }

    #[test]
    fn test_json_file_storage_rejects_garbage() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let path = temp_dir.path().join("storage.json");
        std::fs::write(&path, "not json").unwrap();

        let result = JsonFileStorage::open(&path);
        assert!(result.is_err());
    }

    // ==================== QueryString Tests ====================

    #[test]
    fn test_query_string_parse() {
        let query = QueryString::parse("?lang=fr&page=2");
        assert_eq!(query.get("lang"), Some("fr"));
        assert_eq!(query.get("page"), Some("2"));
        assert_eq!(query.get("missing"), None);
    }

    #[test]
    fn test_query_string_without_question_mark() {
        let query = QueryString::parse("lang=en");
        assert_eq!(query.get("lang"), Some("en"));
    }

    #[test]
    fn test_query_string_first_value_wins() {
        let query = QueryString::parse("lang=de&lang=it");
        assert_eq!(query.get("lang"), Some("de"));
    }

    #[test]
    fn test_query_string_decodes_components() {
        let query = QueryString::parse("lang=pt%2DBR&q=a+b&flag");
        assert_eq!(query.get("lang"), Some("pt-BR"));
        assert_eq!(query.get("q"), Some("a b"));
        assert_eq!(query.get("flag"), Some(""));
    }

    #[test]
    fn test_query_string_keeps_invalid_escape() {
        let query = QueryString::parse("lang=%zz&x=%4");
        assert_eq!(query.get("lang"), Some("%zz"));
        assert_eq!(query.get("x"), Some("%4"));
    }

    #[test]
    fn test_query_string_decodes_utf8() {
        let query = QueryString::parse("?name=Shqip%C3%ABri");
        assert_eq!(query.get("name"), Some("Shqipëri"));
    }

    #[test]
    fn test_query_string_empty() {
        let query = QueryString::parse("");
        assert_eq!(query, QueryString::default());
    }

    // ==================== BrowserEnv Tests ====================

    #[test]
    fn test_browser_env_builders() {
        let env = BrowserEnv::in_memory()
            .with_query("?lang=fr")
            .with_navigator_languages(["de-DE", "de"]);

        assert_eq!(env.query.get("lang"), Some("fr"));
        assert_eq!(env.navigator_languages, vec!["de-DE", "de"]);
        assert_eq!(env.document.lang(), None);
    }

    #[test]
    fn test_browser_env_clone_shares_document() {
        let env = BrowserEnv::in_memory();
        let clone = env.clone();
        clone.document.set_lang("en");
        assert_eq!(env.document.lang().as_deref(), Some("en"));
    }
}
