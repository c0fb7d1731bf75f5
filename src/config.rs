use anyhow::{bail, Context, Result};
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct I18nConfig {
    // Resources
    pub locales_dir: PathBuf,
    pub namespaces: Vec<String>,

    // Language
    pub default_locale: Option<String>,
    pub query: String,

    // Persisted storage
    pub storage_file: PathBuf,

    // Logging
    pub debug: bool,
}

impl I18nConfig {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            // Resources
            locales_dir: std::env::var("LOCALES_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("locales")),
            namespaces: std::env::var("I18N_NAMESPACES")
                .ok()
                .map(|v| {
                    v.split(',')
                        .map(|ns| ns.trim().to_string())
                        .filter(|ns| !ns.is_empty())
                        .collect::<Vec<_>>()
                })
                .filter(|namespaces| !namespaces.is_empty())
                .unwrap_or_else(|| vec!["translation".to_string()]),

            // Language (empty DEFAULT_LOCALE behaves as unset)
            default_locale: std::env::var("DEFAULT_LOCALE")
                .ok()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty()),
            query: std::env::var("I18N_QUERY").unwrap_or_default(),

            // Persisted storage
            storage_file: std::env::var("I18N_STORAGE_FILE")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(".locale-storage.json")),

            // Logging
            debug: match std::env::var("I18N_DEBUG") {
                Ok(v) => parse_bool(&v).context("I18N_DEBUG must be true or false")?,
                Err(_) => false,
            },
        })
    }
}

fn parse_bool(value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => bail!("Invalid boolean value: '{}'", other),
    }
}

/// Navigator languages from the POSIX locale variables, most preferred
/// first: `LANGUAGE` (colon-separated) then `LC_ALL`, then `LANG`.
/// `fr_FR.UTF-8` becomes `fr-FR`; `C` and `POSIX` are skipped.
pub fn navigator_languages_from_env() -> Vec<String> {
    let mut languages: Vec<String> = Vec::new();
    let candidates = std::env::var("LANGUAGE")
        .map(|v| v.split(':').map(str::to_string).collect::<Vec<_>>())
        .unwrap_or_default()
        .into_iter()
        .chain(std::env::var("LC_ALL").ok())
        .chain(std::env::var("LANG").ok());

    for candidate in candidates {
        if let Some(tag) = posix_locale_to_tag(&candidate) {
            if !languages.contains(&tag) {
                languages.push(tag);
            }
        }
    }
    languages
}

fn posix_locale_to_tag(locale: &str) -> Option<String> {
    let base = locale
        .split(['.', '@'])
        .next()
        .unwrap_or_default()
        .trim();
    if base.is_empty() || base == "C" || base == "POSIX" {
        return None;
    }
    Some(base.replace('_', "-"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const VARS: [&str; 9] = [
        "LOCALES_DIR",
        "I18N_NAMESPACES",
        "DEFAULT_LOCALE",
        "I18N_QUERY",
        "I18N_STORAGE_FILE",
        "I18N_DEBUG",
        "LANGUAGE",
        "LC_ALL",
        "LANG",
    ];

    fn clear_env() {
        for var in VARS {
            std::env::remove_var(var);
        }
    }

    #[test]
    #[serial]
    fn test_from_env_defaults() {
        clear_env();
        let config = I18nConfig::from_env().expect("Should load");

        assert_eq!(config.locales_dir, PathBuf::from("locales"));
        assert_eq!(config.namespaces, vec!["translation"]);
        assert_eq!(config.default_locale, None);
        assert_eq!(config.query, "");
        assert_eq!(config.storage_file, PathBuf::from(".locale-storage.json"));
        assert!(!config.debug);
    }

    #[test]
    #[serial]
    fn test_from_env_overrides() {
        clear_env();
        std::env::set_var("LOCALES_DIR", "/srv/locales");
        std::env::set_var("I18N_NAMESPACES", "translation, common,");
        std::env::set_var("DEFAULT_LOCALE", "en");
        std::env::set_var("I18N_QUERY", "?lang=fr");
        std::env::set_var("I18N_DEBUG", "true");

        let config = I18nConfig::from_env().expect("Should load");
        clear_env();

        assert_eq!(config.locales_dir, PathBuf::from("/srv/locales"));
        assert_eq!(config.namespaces, vec!["translation", "common"]);
        assert_eq!(config.default_locale.as_deref(), Some("en"));
        assert_eq!(config.query, "?lang=fr");
        assert!(config.debug);
    }

    #[test]
    #[serial]
    fn test_empty_default_locale_is_unset() {
        clear_env();
        std::env::set_var("DEFAULT_LOCALE", "  ");

        let config = I18nConfig::from_env().expect("Should load");
        clear_env();

        assert_eq!(config.default_locale, None);
    }

    #[test]
    #[serial]
    fn test_invalid_debug_flag() {
        clear_env();
        std::env::set_var("I18N_DEBUG", "maybe");

        let result = I18nConfig::from_env();
        clear_env();

        let err = result.unwrap_err();
        assert!(format!("{:#}", err).contains("I18N_DEBUG"));
    }

    #[test]
    #[serial]
    fn test_navigator_languages_from_env() {
        clear_env();
        std::env::set_var("LANGUAGE", "sq_AL:en");
        std::env::set_var("LANG", "en_US.UTF-8");

        let languages = navigator_languages_from_env();
        clear_env();

        assert_eq!(languages, vec!["sq-AL", "en", "en-US"]);
    }

    #[test]
    fn test_posix_locale_to_tag() {
        assert_eq!(posix_locale_to_tag("fr_FR.UTF-8").as_deref(), Some("fr-FR"));
        assert_eq!(posix_locale_to_tag("de_DE@euro").as_deref(), Some("de-DE"));
        assert_eq!(posix_locale_to_tag("C"), None);
        assert_eq!(posix_locale_to_tag("POSIX.UTF-8"), None);
        assert_eq!(posix_locale_to_tag(""), None);
    }

    #[test]
    fn test_parse_bool() {
        assert!(parse_bool("TRUE").unwrap());
        assert!(parse_bool("1").unwrap());
        assert!(!parse_bool("off").unwrap());
        assert!(parse_bool("nope").is_err());
    }
}
