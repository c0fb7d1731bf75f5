//! User language detection from the browser environment.

use crate::i18n::browser::BrowserEnv;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// A place a language preference can be read from (and, for
/// `LocalStorage`, cached to).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DetectorSource {
    QueryString,
    LocalStorage,
    Navigator,
}

/// Query string parameter read during detection.
pub const QUERY_LOOKUP_KEY: &str = "lang";

/// Storage key read during detection and written as its cache.
pub const STORAGE_LOOKUP_KEY: &str = "locale";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectionOptions {
    /// Sources to consult, first match wins
    pub order: Vec<DetectorSource>,

    /// Where a resolved language is remembered
    pub caches: Vec<DetectorSource>,

    /// Query string parameter holding the language
    pub lookup_querystring: String,

    /// Storage key holding the language
    pub lookup_local_storage: String,
}

/// Query string then storage, caching to storage, under the `lang` and
/// `locale` keys.
impl Default for DetectionOptions {
    fn default() -> Self {
        Self {
            order: vec![DetectorSource::QueryString, DetectorSource::LocalStorage],
            caches: vec![DetectorSource::LocalStorage],
            lookup_querystring: QUERY_LOOKUP_KEY.to_string(),
            lookup_local_storage: STORAGE_LOOKUP_KEY.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LanguageDetector {
    options: DetectionOptions,
}

impl LanguageDetector {
    pub fn new(options: DetectionOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &DetectionOptions {
        &self.options
    }

    /// Walk the configured order and return the first non-empty language.
    pub fn detect(&self, env: &BrowserEnv) -> Option<String> {
        self.options
            .order
            .iter()
            .find_map(|source| {
                let found = self.lookup(*source, env);
                if let Some(lang) = &found {
                    debug!("Detected language {} from {:?}", lang, source);
                }
                found
            })
    }

    fn lookup(&self, source: DetectorSource, env: &BrowserEnv) -> Option<String> {
        let candidate = match source {
            DetectorSource::QueryString => env
                .query
                .get(&self.options.lookup_querystring)
                .map(str::to_string),
            DetectorSource::LocalStorage => {
                env.storage.get_item(&self.options.lookup_local_storage)
            }
            DetectorSource::Navigator => env
                .navigator_languages
                .iter()
                .find(|lang| !lang.trim().is_empty())
                .cloned(),
        };
        candidate
            .map(|lang| lang.trim().to_string())
            .filter(|lang| !lang.is_empty())
    }

    /// Remember `language` in every configured cache. Only storage can act
    /// as a cache; other sources in `caches` are ignored.
    pub fn cache_user_language(&self, env: &BrowserEnv, language: &str) {
        for cache in &self.options.caches {
            if *cache == DetectorSource::LocalStorage {
                env.storage
                    .set_item(&self.options.lookup_local_storage, language);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detector(order: Vec<DetectorSource>) -> LanguageDetector {
        LanguageDetector::new(DetectionOptions {
            order,
            caches: vec![DetectorSource::LocalStorage],
            lookup_querystring: "lang".to_string(),
            lookup_local_storage: "locale".to_string(),
        })
    }

    #[test]
    fn test_default_options() {
        let options = DetectionOptions::default();
        assert_eq!(
            options.order,
            vec![DetectorSource::QueryString, DetectorSource::LocalStorage]
        );
        assert_eq!(options.caches, vec![DetectorSource::LocalStorage]);
        assert_eq!(options.lookup_querystring, "lang");
        assert_eq!(options.lookup_local_storage, "locale");
    }

    #[test]
    fn test_query_string_wins_over_storage() {
        let env = BrowserEnv::in_memory().with_query("?lang=fr");
        env.storage.set_item("locale", "de");

        let detected = detector(vec![DetectorSource::QueryString, DetectorSource::LocalStorage])
            .detect(&env);
        assert_eq!(detected.as_deref(), Some("fr"));
    }

    #[test]
    fn test_storage_used_when_query_missing() {
        let env = BrowserEnv::in_memory().with_query("?page=1");
        env.storage.set_item("locale", "de");

        let detected = detector(vec![DetectorSource::QueryString, DetectorSource::LocalStorage])
            .detect(&env);
        assert_eq!(detected.as_deref(), Some("de"));
    }

    #[test]
    fn test_navigator_only_when_in_order() {
        let env = BrowserEnv::in_memory().with_navigator_languages(["it-IT", "it"]);

        let without = detector(vec![DetectorSource::QueryString, DetectorSource::LocalStorage]);
        assert_eq!(without.detect(&env), None);

        let with = detector(vec![
            DetectorSource::QueryString,
            DetectorSource::LocalStorage,
            DetectorSource::Navigator,
        ]);
        assert_eq!(with.detect(&env).as_deref(), Some("it-IT"));
    }

    #[test]
    fn test_empty_values_are_skipped() {
        let env = BrowserEnv::in_memory()
            .with_query("?lang=")
            .with_navigator_languages(["  ", "es"]);

        let detected = detector(vec![DetectorSource::QueryString, DetectorSource::Navigator])
            .detect(&env);
        assert_eq!(detected.as_deref(), Some("es"));
    }

    #[test]
    fn test_cache_user_language_writes_storage_key() {
        let env = BrowserEnv::in_memory();
        detector(vec![]).cache_user_language(&env, "sq");
        assert_eq!(env.storage.get_item("locale").as_deref(), Some("sq"));
    }

    #[test]
    fn test_cache_ignores_non_storage_targets() {
        let env = BrowserEnv::in_memory();
        let detector = LanguageDetector::new(DetectionOptions {
            caches: vec![DetectorSource::QueryString],
            ..DetectionOptions::default()
        });
        detector.cache_user_language(&env, "sq");
        assert_eq!(env.storage.get_item("locale"), None);
    }

    #[test]
    fn test_nothing_detected() {
        let env = BrowserEnv::in_memory();
        assert_eq!(detector(vec![DetectorSource::QueryString]).detect(&env), None);
    }
}
