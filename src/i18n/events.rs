//! Named engine events and the emitter that dispatches them.

use crate::i18n::store::{lock, Subscription};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

/// Namespaces that loaded successfully in one batch, keyed by language.
/// An empty map means nothing was loaded.
pub type LoadedResources = BTreeMap<String, Vec<String>>;

/// The kinds of event an `Engine` emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Initialized,
    Loaded,
    FailedLoading,
    Added,
    LanguageChanged,
}

impl EventKind {
    /// Wire name of the event, as used in log output.
    pub fn name(&self) -> &'static str {
        match self {
            EventKind::Initialized => "initialized",
            EventKind::Loaded => "loaded",
            EventKind::FailedLoading => "failedLoading",
            EventKind::Added => "added",
            EventKind::LanguageChanged => "languageChanged",
        }
    }
}

/// An event emitted by the translation engine.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    /// First load after `configure` finished.
    Initialized,
    /// A batch of bundle loads completed.
    Loaded(LoadedResources),
    /// One bundle could not be loaded.
    FailedLoading {
        language: String,
        namespace: String,
        reason: String,
    },
    /// A bundle was added directly through `Engine::add_resource_bundle`.
    Added { language: String, namespace: String },
    /// The active language is now the given code.
    LanguageChanged(String),
}

impl EngineEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            EngineEvent::Initialized => EventKind::Initialized,
            EngineEvent::Loaded(_) => EventKind::Loaded,
            EngineEvent::FailedLoading { .. } => EventKind::FailedLoading,
            EngineEvent::Added { .. } => EventKind::Added,
            EngineEvent::LanguageChanged(_) => EventKind::LanguageChanged,
        }
    }
}

type Listener = Arc<dyn Fn(&EngineEvent) + Send + Sync>;

#[derive(Default)]
struct Listeners {
    by_kind: Mutex<HashMap<EventKind, Vec<(u64, Listener)>>>,
    next_id: AtomicU64,
}

/// Dispatches events to listeners registered per `EventKind`.
///
/// Listeners of one kind run synchronously in registration order. Dispatch
/// happens outside the registry lock, so a listener may register or drop
/// other listeners while it runs.
#[derive(Default)]
pub struct EventEmitter {
    listeners: Arc<Listeners>,
}

impl EventEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `listener` for `kind`. The listener stays registered until
    /// the returned `Subscription` is dropped or unsubscribed.
    pub fn on(
        &self,
        kind: EventKind,
        listener: impl Fn(&EngineEvent) + Send + Sync + 'static,
    ) -> Subscription {
        let id = self.listeners.next_id.fetch_add(1, Ordering::Relaxed);
        lock(&self.listeners.by_kind)
            .entry(kind)
            .or_default()
            .push((id, Arc::new(listener)));

        let weak = Arc::downgrade(&self.listeners);
        Subscription::new(move || {
            if let Some(listeners) = weak.upgrade() {
                if let Some(registered) = lock(&listeners.by_kind).get_mut(&kind) {
                    registered.retain(|(existing, _)| *existing != id);
                }
            }
        })
    }

    pub fn emit(&self, event: &EngineEvent) {
        let listeners: Vec<Listener> = lock(&self.listeners.by_kind)
            .get(&event.kind())
            .map(|registered| registered.iter().map(|(_, l)| Arc::clone(l)).collect())
            .unwrap_or_default();

        for listener in listeners {
            listener(event);
        }
    }

    pub fn listener_count(&self, kind: EventKind) -> usize {
        lock(&self.listeners.by_kind)
            .get(&kind)
            .map(Vec::len)
            .unwrap_or(0)
    }
}

impl std::fmt::Debug for EventEmitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let counts: HashMap<&'static str, usize> = lock(&self.listeners.by_kind)
            .iter()
            .map(|(kind, registered)| (kind.name(), registered.len()))
            .collect();
        f.debug_struct("EventEmitter")
            .field("listeners", &counts)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn log_into(log: &Arc<Mutex<Vec<String>>>, tag: &'static str) -> impl Fn(&EngineEvent) + Send + Sync {
        let log = Arc::clone(log);
        move |event: &EngineEvent| log.lock().unwrap().push(format!("{}:{}", tag, event.kind().name()))
    }

    #[test]
    fn test_event_kind_names() {
        assert_eq!(EventKind::Initialized.name(), "initialized");
        assert_eq!(EventKind::Loaded.name(), "loaded");
        assert_eq!(EventKind::FailedLoading.name(), "failedLoading");
        assert_eq!(EventKind::Added.name(), "added");
        assert_eq!(EventKind::LanguageChanged.name(), "languageChanged");
    }

    #[test]
    fn test_event_kind_mapping() {
        assert_eq!(EngineEvent::Initialized.kind(), EventKind::Initialized);
        assert_eq!(EngineEvent::Loaded(LoadedResources::new()).kind(), EventKind::Loaded);
        assert_eq!(
            EngineEvent::LanguageChanged("fr".to_string()).kind(),
            EventKind::LanguageChanged
        );
    }

    #[test]
    fn test_listeners_fire_in_registration_order() {
        let emitter = EventEmitter::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        let _first = emitter.on(EventKind::Loaded, log_into(&log, "first"));
        let _second = emitter.on(EventKind::Loaded, log_into(&log, "second"));

        emitter.emit(&EngineEvent::Loaded(LoadedResources::new()));

        assert_eq!(*log.lock().unwrap(), vec!["first:loaded", "second:loaded"]);
    }

    #[test]
    fn test_only_matching_kind_is_dispatched() {
        let emitter = EventEmitter::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        let _loaded = emitter.on(EventKind::Loaded, log_into(&log, "loaded"));
        let _changed = emitter.on(EventKind::LanguageChanged, log_into(&log, "changed"));

        emitter.emit(&EngineEvent::LanguageChanged("en".to_string()));

        assert_eq!(*log.lock().unwrap(), vec!["changed:languageChanged"]);
    }

    #[test]
    fn test_dropped_subscription_stops_delivery() {
        let emitter = EventEmitter::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        let sub = emitter.on(EventKind::Initialized, log_into(&log, "init"));
        assert_eq!(emitter.listener_count(EventKind::Initialized), 1);

        drop(sub);
        emitter.emit(&EngineEvent::Initialized);

        assert_eq!(emitter.listener_count(EventKind::Initialized), 0);
        assert!(log.lock().unwrap().is_empty());
    }

    #[test]
    fn test_emit_without_listeners_is_noop() {
        let emitter = EventEmitter::new();
        emitter.emit(&EngineEvent::Initialized);
        assert_eq!(emitter.listener_count(EventKind::Initialized), 0);
    }
}
