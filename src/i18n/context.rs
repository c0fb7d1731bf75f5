//! The application-facing i18n context.
//!
//! `I18nContext` owns one engine, the two observable adapters built on it
//! and the browser environment. Whatever owns the UI root creates it once
//! and hands it down; there is no process-wide instance.

use crate::error::I18nResult;
use crate::i18n::adapters::{I18nStore, LoadingStore};
use crate::i18n::backend::ResourceLoader;
use crate::i18n::browser::BrowserEnv;
use crate::i18n::catalog::LanguageCatalog;
use crate::i18n::detector::{DetectionOptions, DetectorSource};
use crate::i18n::engine::{Engine, InitOptions, DEFAULT_NAMESPACE};
use crate::i18n::store::Readable;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Fallback language when no default locale is given.
pub const BASELINE_LOCALE: &str = "sq";

/// Starting language (and document `lang`) when no default locale is given.
pub const BASELINE_LANGUAGE: &str = "sq-AL";

/// Options applied by `I18nContext::initialize`.
///
/// With a default locale, detection skips the navigator and the default
/// locale is both the starting language and the only fallback. Without
/// one, the navigator is consulted last, the starting language is
/// `sq-AL` and the fallback is `sq`.
pub fn init_options(default_locale: Option<&str>) -> InitOptions {
    let default_locale = default_locale.filter(|locale| !locale.is_empty());

    let mut order = DetectionOptions::default().order;
    if default_locale.is_none() {
        order.push(DetectorSource::Navigator);
    }

    InitOptions {
        lng: Some(default_locale.unwrap_or(BASELINE_LANGUAGE).to_string()),
        fallback_lng: vec![default_locale.unwrap_or(BASELINE_LOCALE).to_string()],
        ns: vec![DEFAULT_NAMESPACE.to_string()],
        detection: DetectionOptions {
            order,
            ..DetectionOptions::default()
        },
        // The UI layer escapes on render.
        escape_value: false,
        return_empty_string: false,
        debug: false,
    }
}

pub struct I18nContext {
    engine: Engine,
    i18n: I18nStore,
    is_loading: LoadingStore,
    namespaces: Vec<String>,
    debug: bool,
}

impl I18nContext {
    /// Build the engine and attach both adapters. Nothing is configured or
    /// loaded until `initialize`.
    pub fn new(loader: Arc<dyn ResourceLoader>, env: BrowserEnv) -> Self {
        let engine = Engine::new(loader, env);
        let i18n = I18nStore::new(&engine);
        let is_loading = LoadingStore::new(&engine);

        Self {
            engine,
            i18n,
            is_loading,
            namespaces: vec![DEFAULT_NAMESPACE.to_string()],
            debug: false,
        }
    }

    /// Namespaces to load per language, replacing the default `translation`.
    pub fn with_namespaces<I, S>(mut self, namespaces: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let namespaces: Vec<String> = namespaces.into_iter().map(Into::into).collect();
        if !namespaces.is_empty() {
            self.namespaces = namespaces;
        }
        self
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Configure the engine, set the document language, and start loading
    /// in the background.
    ///
    /// The document `lang` is set before any bundle has loaded, from the
    /// engine's language at that point, else the default locale, else
    /// `sq-AL`. Load failures surface only through `is_loading`. The
    /// returned handle can be awaited or dropped.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn initialize(&self, default_locale: Option<&str>) -> JoinHandle<()> {
        let options = InitOptions {
            ns: self.namespaces.clone(),
            debug: self.debug,
            ..init_options(default_locale)
        };
        self.engine.configure(options);

        let lang = self
            .engine
            .language()
            .or_else(|| default_locale.filter(|l| !l.is_empty()).map(str::to_string))
            .unwrap_or_else(|| BASELINE_LANGUAGE.to_string());
        self.engine.env().document.set_lang(&lang);
        info!("i18n initialized, document language {}", lang);

        tokio::spawn(self.engine.load_current())
    }

    /// Set the document language now and switch the engine in the
    /// background. `lang` is not validated. When switches overlap, the
    /// engine settles on the one called last, matching the document.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn change_language(&self, lang: &str) -> JoinHandle<()> {
        self.engine.env().document.set_lang(lang);
        info!("Changing language to {}", lang);

        tokio::spawn(self.engine.change_language(lang))
    }

    /// Fetch and parse the language catalog. Errors are returned as-is;
    /// there is no retry.
    pub async fn get_languages(&self) -> I18nResult<LanguageCatalog> {
        let metrics = self.engine.metrics();
        metrics.record_catalog_fetch();

        let result = self
            .engine
            .loader()
            .load_catalog()
            .await
            .and_then(LanguageCatalog::from_value);

        if let Err(e) = &result {
            metrics.record_catalog_failure();
            warn!("Language catalog unavailable: {}", e);
        }
        result
    }

    /// Observable engine handle, republished on every language or
    /// resource change.
    pub fn i18n(&self) -> Readable<Engine> {
        self.i18n.readable()
    }

    /// Observable "translations not ready" flag.
    pub fn is_loading(&self) -> Readable<bool> {
        self.is_loading.readable()
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    pub fn env(&self) -> &BrowserEnv {
        self.engine.env()
    }

    /// Shorthand for `engine().t(key)`.
    pub fn t(&self, key: &str) -> String {
        self.engine.t(key)
    }
}

impl std::fmt::Debug for I18nContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("I18nContext")
            .field("engine", &self.engine)
            .field("is_loading", &self.is_loading.get())
            .field("namespaces", &self.namespaces)
            .finish()
    }
}
