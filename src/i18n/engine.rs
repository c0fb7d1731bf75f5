//! The translation engine handle.
//!
//! An `Engine` owns the active language, the loaded resource bundles and the
//! options it was configured with. Clones share the same underlying state,
//! so every clone is the same handle (see `Engine::ptr_eq`). State changes
//! are announced through named events (`EventKind`).

use crate::i18n::backend::ResourceLoader;
use crate::i18n::browser::BrowserEnv;
use crate::i18n::detector::{DetectionOptions, LanguageDetector};
use crate::i18n::events::{EngineEvent, EventEmitter, EventKind, LoadedResources};
use crate::i18n::metrics::LoadMetrics;
use crate::i18n::store::{lock, Subscription};
use futures::future::join_all;
use serde_json::Value;
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};

/// Namespace used when none is configured.
pub const DEFAULT_NAMESPACE: &str = "translation";

/// Separates a namespace prefix from a key in `t("ns:key")`.
const NS_SEPARATOR: char = ':';

/// Separates nested object keys in `t("menu.file.open")`.
const KEY_SEPARATOR: char = '.';

#[derive(Debug, Clone, PartialEq)]
pub struct InitOptions {
    /// Language to use when detection finds nothing
    pub lng: Option<String>,

    /// Languages consulted after the active language's own hierarchy
    pub fallback_lng: Vec<String>,

    /// Namespaces loaded for every language; the first is the default
    pub ns: Vec<String>,

    pub detection: DetectionOptions,

    /// Whether interpolated values should be escaped by the engine. Lookups
    /// here do no interpolation; the flag is carried for the UI layer.
    pub escape_value: bool,

    /// Whether an empty string counts as a translation
    pub return_empty_string: bool,

    /// Raise engine logging from debug to info
    pub debug: bool,
}

impl Default for InitOptions {
    fn default() -> Self {
        Self {
            lng: None,
            fallback_lng: Vec::new(),
            ns: vec![DEFAULT_NAMESPACE.to_string()],
            detection: DetectionOptions::default(),
            escape_value: true,
            return_empty_string: true,
            debug: false,
        }
    }
}

/// Expand a language code into the codes to search, most specific first,
/// followed by any fallbacks not already present.
///
/// `"sq-AL"` becomes `["sq-AL", "sq"]`; `"zh-Hant-TW"` becomes
/// `["zh-Hant-TW", "zh-Hant", "zh"]`.
pub fn resolve_hierarchy(code: &str, fallbacks: &[String]) -> Vec<String> {
    let mut codes: Vec<String> = Vec::new();
    let mut push = |candidate: String| {
        if !candidate.is_empty() && !codes.contains(&candidate) {
            codes.push(candidate);
        }
    };

    let parts: Vec<&str> = code.split('-').collect();
    push(code.to_string());
    if parts.len() > 2 {
        push(parts[..2].join("-"));
    }
    if parts.len() > 1 {
        push(parts[0].to_string());
    }
    for fallback in fallbacks {
        push(fallback.clone());
    }
    codes
}

#[derive(Default)]
struct EngineState {
    options: InitOptions,
    language: Option<String>,
    languages: Vec<String>,
    bundles: HashMap<String, HashMap<String, Value>>,
    initialized: bool,
    /// Bumped by `configure` and each `change_language`; a switch only
    /// applies if its ticket is still the latest when its bundles land.
    generation: u64,
}

struct EngineInner {
    state: Mutex<EngineState>,
    emitter: EventEmitter,
    loader: Arc<dyn ResourceLoader>,
    env: BrowserEnv,
    metrics: LoadMetrics,
}

/// Shared handle to a translation engine.
#[derive(Clone)]
pub struct Engine {
    inner: Arc<EngineInner>,
}

impl Engine {
    pub fn new(loader: Arc<dyn ResourceLoader>, env: BrowserEnv) -> Self {
        Self {
            inner: Arc::new(EngineInner {
                state: Mutex::new(EngineState::default()),
                emitter: EventEmitter::new(),
                loader,
                env,
                metrics: LoadMetrics::new(),
            }),
        }
    }

    /// Whether two handles refer to the same engine.
    pub fn ptr_eq(a: &Engine, b: &Engine) -> bool {
        Arc::ptr_eq(&a.inner, &b.inner)
    }

    /// Register a listener for one kind of event.
    pub fn on(
        &self,
        kind: EventKind,
        listener: impl Fn(&EngineEvent) + Send + Sync + 'static,
    ) -> Subscription {
        self.inner.emitter.on(kind, listener)
    }

    /// Number of listeners currently registered for `kind`.
    pub fn listener_count(&self, kind: EventKind) -> usize {
        self.inner.emitter.listener_count(kind)
    }

    pub(crate) fn emit(&self, event: EngineEvent) {
        self.log(format_args!("event {}", event.kind().name()));
        self.inner.emitter.emit(&event);
    }

    /// Apply `options` and pick the starting language.
    ///
    /// Detection runs first; when it finds nothing, `options.lng` is used,
    /// then the first fallback. The chosen language is cached through the
    /// detector. Nothing is loaded yet; see `load_current`.
    pub fn configure(&self, options: InitOptions) {
        let detector = LanguageDetector::new(options.detection.clone());
        let detected = detector.detect(&self.inner.env);
        let language = detected
            .clone()
            .or_else(|| options.lng.clone())
            .or_else(|| options.fallback_lng.first().cloned());

        {
            let mut state = lock(&self.inner.state);
            state.languages = language
                .as_deref()
                .map(|lang| resolve_hierarchy(lang, &options.fallback_lng))
                .unwrap_or_else(|| options.fallback_lng.clone());
            state.language = language.clone();
            state.options = options;
            state.generation += 1;
        }

        match &language {
            Some(lang) => {
                self.log(format_args!(
                    "configured with language {} (detected: {})",
                    lang,
                    detected.is_some()
                ));
                detector.cache_user_language(&self.inner.env, lang);
            }
            None => warn!("No language could be determined; translations will not load"),
        }
    }

    /// Load every bundle the current language needs, then announce the
    /// language. The first completed load also emits `Initialized`.
    ///
    /// The language is captured when this is called, not when the future
    /// is first polled. If a `change_language` was requested in between,
    /// `LanguageChanged` is skipped for the outdated language.
    pub fn load_current(&self) -> impl Future<Output = ()> + Send + 'static {
        let (ticket, language, languages, namespaces) = {
            let state = lock(&self.inner.state);
            (
                state.generation,
                state.language.clone(),
                state.languages.clone(),
                state.options.ns.clone(),
            )
        };
        let engine = self.clone();

        async move {
            engine.load_bundles(&languages, &namespaces).await;

            if let Some(language) = language {
                if engine.is_current(ticket) {
                    engine.emit(EngineEvent::LanguageChanged(language));
                } else {
                    engine.log(format_args!("initial language {} superseded", language));
                }
            }

            let first_init = {
                let mut state = lock(&engine.inner.state);
                !std::mem::replace(&mut state.initialized, true)
            };
            if first_init {
                engine.emit(EngineEvent::Initialized);
            }
        }
    }

    /// Switch to `language`, loading whatever bundles it is missing.
    ///
    /// The switch is ordered when this is called: once its bundles are in,
    /// it applies only if no later switch (or `configure`) was requested
    /// meanwhile, so overlapping switches settle on the last one asked
    /// for. The code is not validated; an unknown language simply ends up
    /// resolving through the fallbacks.
    pub fn change_language(&self, language: &str) -> impl Future<Output = ()> + Send + 'static {
        let (ticket, fallbacks, namespaces, detection) = {
            let mut state = lock(&self.inner.state);
            state.generation += 1;
            (
                state.generation,
                state.options.fallback_lng.clone(),
                state.options.ns.clone(),
                state.options.detection.clone(),
            )
        };
        let engine = self.clone();
        let language = language.to_string();

        async move {
            let languages = resolve_hierarchy(&language, &fallbacks);
            engine.load_bundles(&languages, &namespaces).await;

            {
                let mut state = lock(&engine.inner.state);
                if state.generation != ticket {
                    drop(state);
                    engine.log(format_args!("language change to {} superseded", language));
                    return;
                }
                state.language = Some(language.clone());
                state.languages = languages;
                // Under the lock: a newer switch must cache after this one
                LanguageDetector::new(detection).cache_user_language(&engine.inner.env, &language);
            }
            engine.log(format_args!("language changed to {}", language));
            engine.emit(EngineEvent::LanguageChanged(language));
        }
    }

    fn is_current(&self, ticket: u64) -> bool {
        lock(&self.inner.state).generation == ticket
    }

    /// Load the bundles in `languages x namespaces` that are not loaded yet.
    ///
    /// Each failure emits `FailedLoading`; afterwards one `Loaded` event
    /// reports what did load. If every bundle was already present, nothing
    /// is emitted.
    async fn load_bundles(&self, languages: &[String], namespaces: &[String]) {
        let pending: Vec<(String, String)> = {
            let state = lock(&self.inner.state);
            languages
                .iter()
                .flat_map(|lang| namespaces.iter().map(move |ns| (lang.clone(), ns.clone())))
                .filter(|(lang, ns)| {
                    !state
                        .bundles
                        .get(lang)
                        .map(|by_ns| by_ns.contains_key(ns))
                        .unwrap_or(false)
                })
                .collect()
        };

        if pending.is_empty() {
            return;
        }

        let loader = Arc::clone(&self.inner.loader);
        let results = join_all(
            pending
                .iter()
                .map(|(lang, ns)| loader.load(lang.as_str(), ns.as_str())),
        )
        .await;

        let mut loaded = LoadedResources::new();
        let mut failures = Vec::new();
        {
            let mut state = lock(&self.inner.state);
            for ((lang, ns), result) in pending.into_iter().zip(results) {
                match result {
                    Ok(bundle) => {
                        self.inner.metrics.record_bundle_load();
                        state
                            .bundles
                            .entry(lang.clone())
                            .or_default()
                            .insert(ns.clone(), bundle);
                        loaded.entry(lang).or_default().push(ns);
                    }
                    Err(e) => {
                        self.inner.metrics.record_bundle_failure();
                        warn!("Failed to load {}/{}: {}", lang, ns, e);
                        failures.push(EngineEvent::FailedLoading {
                            language: lang,
                            namespace: ns,
                            reason: e.to_string(),
                        });
                    }
                }
            }
        }

        for failure in failures {
            self.emit(failure);
        }
        self.emit(EngineEvent::Loaded(loaded));
    }

    /// Add (or deep-merge into) a bundle and emit `Added`.
    pub fn add_resource_bundle(&self, language: &str, namespace: &str, bundle: Value) {
        {
            let mut state = lock(&self.inner.state);
            let slot = state
                .bundles
                .entry(language.to_string())
                .or_default()
                .entry(namespace.to_string())
                .or_insert(Value::Object(Default::default()));
            deep_merge(slot, bundle);
        }
        self.emit(EngineEvent::Added {
            language: language.to_string(),
            namespace: namespace.to_string(),
        });
    }

    /// Active language, if one has been chosen.
    pub fn language(&self) -> Option<String> {
        lock(&self.inner.state).language.clone()
    }

    /// Codes searched by `t`, most specific first.
    pub fn languages(&self) -> Vec<String> {
        lock(&self.inner.state).languages.clone()
    }

    pub fn options(&self) -> InitOptions {
        lock(&self.inner.state).options.clone()
    }

    pub fn is_initialized(&self) -> bool {
        lock(&self.inner.state).initialized
    }

    pub fn has_resource_bundle(&self, language: &str, namespace: &str) -> bool {
        lock(&self.inner.state)
            .bundles
            .get(language)
            .map(|by_ns| by_ns.contains_key(namespace))
            .unwrap_or(false)
    }

    pub fn resource_bundle(&self, language: &str, namespace: &str) -> Option<Value> {
        lock(&self.inner.state)
            .bundles
            .get(language)
            .and_then(|by_ns| by_ns.get(namespace))
            .cloned()
    }

    /// Look `key` up across the language hierarchy. Returns the key itself
    /// when no language has it.
    ///
    /// `key` may carry a namespace prefix (`"common:save"`) and a dotted
    /// path into nested objects (`"menu.file.open"`).
    pub fn t(&self, key: &str) -> String {
        self.lookup(key).unwrap_or_else(|| key.to_string())
    }

    pub fn exists(&self, key: &str) -> bool {
        self.lookup(key).is_some()
    }

    fn lookup(&self, key: &str) -> Option<String> {
        let state = lock(&self.inner.state);
        let default_ns = state
            .options
            .ns
            .first()
            .map(String::as_str)
            .unwrap_or(DEFAULT_NAMESPACE);
        let (namespace, path) = match key.split_once(NS_SEPARATOR) {
            Some((ns, rest)) if !ns.is_empty() => (ns, rest),
            _ => (default_ns, key),
        };

        state.languages.iter().find_map(|lang| {
            let bundle = state.bundles.get(lang)?.get(namespace)?;
            let found = path
                .split(KEY_SEPARATOR)
                .try_fold(bundle, |node, segment| node.get(segment))?;
            match found {
                Value::String(s) if s.is_empty() && !state.options.return_empty_string => None,
                Value::String(s) => Some(s.clone()),
                _ => None,
            }
        })
    }

    pub fn metrics(&self) -> &LoadMetrics {
        &self.inner.metrics
    }

    pub fn env(&self) -> &BrowserEnv {
        &self.inner.env
    }

    pub(crate) fn loader(&self) -> &Arc<dyn ResourceLoader> {
        &self.inner.loader
    }

    fn log(&self, message: std::fmt::Arguments<'_>) {
        if lock(&self.inner.state).options.debug {
            info!("i18n: {}", message);
        } else {
            debug!("i18n: {}", message);
        }
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = lock(&self.inner.state);
        f.debug_struct("Engine")
            .field("language", &state.language)
            .field("languages", &state.languages)
            .field("initialized", &state.initialized)
            .finish()
    }
}

fn deep_merge(target: &mut Value, source: Value) {
    match (target, source) {
        (Value::Object(target), Value::Object(source)) => {
            for (key, value) in source {
                match target.get_mut(&key) {
                    Some(existing) => deep_merge(existing, value),
                    None => {
                        target.insert(key, value);
                    }
                }
            }
        }
        (target, source) => *target = source,
    }
}
