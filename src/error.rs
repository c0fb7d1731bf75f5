use thiserror::Error;

/// Errors raised while loading translation resources or the language catalog.
///
/// Resource errors never reach callers of the control surface directly; the
/// engine turns them into `failedLoading` events. Catalog errors are returned
/// from `I18nContext::get_languages`.
#[derive(Debug, Error)]
pub enum I18nError {
    #[error("translation resource not found: {language}/{namespace}")]
    ResourceNotFound { language: String, namespace: String },

    #[error("failed to read translation resource {language}/{namespace}: {source}")]
    ResourceRead {
        language: String,
        namespace: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON in translation resource {language}/{namespace}: {source}")]
    ResourceParse {
        language: String,
        namespace: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("language catalog not found at {0}")]
    CatalogNotFound(String),

    #[error("failed to read language catalog at {location}: {source}")]
    CatalogRead {
        location: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid language catalog: {0}")]
    CatalogParse(String),
}

/// Result type for i18n operations
pub type I18nResult<T> = Result<T, I18nError>;
