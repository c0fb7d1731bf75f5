//! Bridges from engine events to observable stores.
//!
//! `I18nStore` republishes the engine handle whenever its language or
//! resources change, so subscribers re-render with fresh translations.
//! `LoadingStore` turns load outcomes into a single "not ready" flag.
//!
//! Both keep the `Subscription`s for the engine listeners they register.
//! Dropping the adapter (or calling `detach`) unregisters them.

use crate::i18n::engine::Engine;
use crate::i18n::events::{EngineEvent, EventKind};
use crate::i18n::store::{Readable, Subscription, Writable};

/// Events after which the engine handle is republished.
pub const REPUBLISH_ON: [EventKind; 4] = [
    EventKind::Initialized,
    EventKind::Loaded,
    EventKind::Added,
    EventKind::LanguageChanged,
];

/// Observable holding the engine handle.
///
/// The value is always the same handle; only the engine's internal state
/// changes between notifications.
pub struct I18nStore {
    store: Writable<Engine>,
    listeners: Vec<Subscription>,
}

impl I18nStore {
    pub fn new(engine: &Engine) -> Self {
        let store = Writable::new(engine.clone());
        let listeners = REPUBLISH_ON
            .iter()
            .map(|kind| {
                let store = store.clone();
                let handle = engine.clone();
                engine.on(*kind, move |_| store.set(handle.clone()))
            })
            .collect();

        Self { store, listeners }
    }

    pub fn get(&self) -> Engine {
        self.store.get()
    }

    pub fn subscribe(&self, subscriber: impl Fn(&Engine) + Send + Sync + 'static) -> Subscription {
        self.store.subscribe(subscriber)
    }

    pub fn readable(&self) -> Readable<Engine> {
        self.store.readable()
    }

    /// Stop listening to the engine. The store keeps its last value.
    pub fn detach(&mut self) {
        self.listeners.clear();
    }

    pub fn is_attached(&self) -> bool {
        !self.listeners.is_empty()
    }
}

/// Observable "translations are not ready" flag.
///
/// Starts `false`. A `Loaded` event sets it to whether nothing loaded; a
/// `FailedLoading` event sets it to `true`. An empty load and a failed load
/// therefore read the same.
pub struct LoadingStore {
    store: Writable<bool>,
    listeners: Vec<Subscription>,
}

impl LoadingStore {
    pub fn new(engine: &Engine) -> Self {
        let store = Writable::new(false);

        let on_loaded = {
            let store = store.clone();
            engine.on(EventKind::Loaded, move |event| {
                if let EngineEvent::Loaded(resources) = event {
                    store.set(resources.is_empty());
                }
            })
        };
        let on_failed = {
            let store = store.clone();
            engine.on(EventKind::FailedLoading, move |_| store.set(true))
        };

        Self {
            store,
            listeners: vec![on_loaded, on_failed],
        }
    }

    pub fn get(&self) -> bool {
        self.store.get()
    }

    pub fn subscribe(&self, subscriber: impl Fn(&bool) + Send + Sync + 'static) -> Subscription {
        self.store.subscribe(subscriber)
    }

    pub fn readable(&self) -> Readable<bool> {
        self.store.readable()
    }

    pub fn detach(&mut self) {
        self.listeners.clear();
    }

    pub fn is_attached(&self) -> bool {
        !self.listeners.is_empty()
    }
}
