//! Internationalization (i18n) module.
//!
//! Wires a translation engine to observable state a UI layer can subscribe
//! to, and exposes the calls that change language and list the available
//! languages.
//!
//! # Architecture
//!
//! - `context`: `I18nContext`, the control surface (`initialize`,
//!   `change_language`, `get_languages`) and its fixed configuration
//! - `adapters`: engine events bridged to the `i18n` and `is_loading` stores
//! - `engine`: the shared engine handle, its options and lazy bundle loading
//! - `events`: named engine events and their emitter
//! - `store`: observable `Writable`/`Readable` cells and `Subscription`s
//! - `backend`: resource loaders (filesystem, closure, in-memory)
//! - `detector`: language detection from query string, storage, navigator
//! - `browser`: document, storage and query-string boundary
//! - `catalog`: the parsed `languages.json`
//! - `metrics`: per-engine load counters
//!
//! # Example
//!
//! ```rust,ignore
//! use locale_bridge::i18n::{BrowserEnv, FsLoader, I18nContext};
//!
//! let ctx = I18nContext::new(Arc::new(FsLoader::new("locales")), BrowserEnv::in_memory());
//! let _loading = ctx.is_loading().subscribe(|loading| println!("loading: {}", loading));
//! ctx.initialize(None).await?;
//! ctx.change_language("en");
//! ```

mod adapters;
mod backend;
mod browser;
mod catalog;
mod context;
mod detector;
mod engine;
mod events;
mod metrics;
mod store;

pub use adapters::{I18nStore, LoadingStore, REPUBLISH_ON};
pub use backend::{FnLoader, FsLoader, MemoryLoader, ResourceLoader, CATALOG_FILE};
pub use browser::{
    BrowserEnv, Document, JsonFileStorage, MemoryDocument, MemoryStorage, QueryString, Storage,
};
pub use catalog::{LanguageCatalog, LanguageEntry};
pub use context::{init_options, I18nContext, BASELINE_LANGUAGE, BASELINE_LOCALE};
pub use detector::{
    DetectionOptions, DetectorSource, LanguageDetector, QUERY_LOOKUP_KEY, STORAGE_LOOKUP_KEY,
};
pub use engine::{resolve_hierarchy, Engine, InitOptions, DEFAULT_NAMESPACE};
pub use events::{EngineEvent, EventEmitter, EventKind, LoadedResources};
pub use metrics::{LoadMetrics, MetricsReport};
pub use store::{Readable, Subscription, Writable};
