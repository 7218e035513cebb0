//! Change events and listener registry
//!
//! Listeners are registered under a [`Topic`]: either a namespaced event name
//! (`"<app_name>.<key>"`) or the whole-store clear, which has its own slot so
//! that a key literally named `"*"` never reaches clear listeners. Listeners
//! are invoked in registration order. A panicking
//! listener is isolated: the panic is caught, logged and counted, and delivery
//! continues with the next listener.

use crosstab_core::{ContextId, Value};
use indexmap::IndexMap;
use parking_lot::Mutex;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::warn;

/// Event name suffix used for whole-store clears.
pub const CLEAR_EVENT_SUFFIX: &str = "*";

/// What a listener is registered for.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Topic {
    /// Changes to one key, by namespaced event name
    Key(String),
    /// Whole-store clears
    Clear,
}

impl From<&str> for Topic {
    fn from(name: &str) -> Self {
        Self::Key(name.to_string())
    }
}

impl From<String> for Topic {
    fn from(name: String) -> Self {
        Self::Key(name)
    }
}

/// Callback invoked for each matching change event.
pub type Listener = Arc<dyn Fn(&mut ChangeEvent) + Send + Sync>;

/// Handle returned by listener registration, used to unregister.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

/// A global variable change observed in this context but written by another.
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeEvent {
    name: String,
    key: Option<String>,
    from: Option<Value>,
    to: Option<Value>,
    origin: ContextId,
    page: String,
    canceled: bool,
}

impl ChangeEvent {
    /// Build an event. `key` is `None` for a whole-store clear.
    pub fn new(
        name: impl Into<String>,
        key: Option<String>,
        from: Option<Value>,
        to: Option<Value>,
        origin: ContextId,
        page: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            key,
            from,
            to,
            origin,
            page: page.into(),
            canceled: false,
        }
    }

    /// Namespaced event name, `"<app_name>.<key>"`.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Changed key, `None` when the store was cleared.
    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    /// Decoded value before the change; `None` if absent or undecodable.
    pub fn from(&self) -> Option<&Value> {
        self.from.as_ref()
    }

    /// Decoded value after the change; `None` if deleted or undecodable.
    pub fn to(&self) -> Option<&Value> {
        self.to.as_ref()
    }

    /// Registry slot this event is delivered to.
    pub fn topic(&self) -> Topic {
        match self.key {
            Some(_) => Topic::Key(self.name.clone()),
            None => Topic::Clear,
        }
    }

    /// Alias for [`ChangeEvent::to`].
    pub fn data(&self) -> Option<&Value> {
        self.to()
    }

    /// Context that performed the write.
    pub fn origin(&self) -> ContextId {
        self.origin
    }

    /// Page label of the writing context.
    pub fn page(&self) -> &str {
        &self.page
    }

    /// Cancel the event.
    ///
    /// Listeners registered after the current one are skipped. The store is
    /// unaffected: the write has already happened.
    pub fn cancel(&mut self) {
        self.canceled = true;
    }

    /// Whether a listener canceled the event.
    pub fn is_canceled(&self) -> bool {
        self.canceled
    }
}

/// Outcome of dispatching one event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchReport {
    /// Listeners that ran to completion
    pub delivered: usize,
    /// Listeners that panicked
    pub panicked: usize,
    /// Whether delivery stopped early because of cancellation
    pub canceled: bool,
}

/// Listeners keyed by topic.
#[derive(Default)]
pub struct ListenerRegistry {
    listeners: Mutex<IndexMap<Topic, Vec<(ListenerId, Listener)>>>,
    next_id: AtomicU64,
}

impl ListenerRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `listener` for `topic`. Duplicates are kept.
    pub fn add(&self, topic: impl Into<Topic>, listener: Listener) -> ListenerId {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.listeners
            .lock()
            .entry(topic.into())
            .or_default()
            .push((id, listener));
        id
    }

    /// Remove a registration. Returns whether it existed.
    pub fn remove(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.lock();
        let mut removed = false;
        for entries in listeners.values_mut() {
            let before = entries.len();
            entries.retain(|(entry_id, _)| *entry_id != id);
            removed |= entries.len() != before;
        }
        listeners.retain(|_, entries| !entries.is_empty());
        removed
    }

    /// Number of listeners registered for `topic`.
    pub fn count(&self, topic: impl Into<Topic>) -> usize {
        self.listeners
            .lock()
            .get(&topic.into())
            .map_or(0, Vec::len)
    }

    /// Deliver `event` to every listener registered for its topic.
    ///
    /// The registry lock is not held while listeners run, so listeners may
    /// register or remove listeners; such changes apply to the next event.
    pub fn dispatch(&self, event: &mut ChangeEvent) -> DispatchReport {
        let targets: Vec<(ListenerId, Listener)> = self
            .listeners
            .lock()
            .get(&event.topic())
            .cloned()
            .unwrap_or_default();

        let mut report = DispatchReport::default();
        for (id, listener) in targets {
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| listener(event)));
            match outcome {
                Ok(()) => report.delivered += 1,
                Err(_) => {
                    report.panicked += 1;
                    warn!(
                        event = event.name(),
                        listener = id.0,
                        "Change listener panicked, continuing delivery"
                    );
                }
            }
            if event.is_canceled() {
                report.canceled = true;
                break;
            }
        }
        report
    }
}

impl std::fmt::Debug for ListenerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let listeners = self.listeners.lock();
        f.debug_map()
            .entries(listeners.iter().map(|(topic, entries)| (topic, entries.len())))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::AtomicUsize;

    fn event(name: &str) -> ChangeEvent {
        ChangeEvent::new(
            name,
            Some("k".to_string()),
            None,
            Some(json!(1)),
            ContextId::from_bytes([1; 16]),
            "page",
        )
    }

    fn counter() -> (Arc<AtomicUsize>, Listener) {
        let hits = Arc::new(AtomicUsize::new(0));
        let seen = hits.clone();
        let listener: Listener = Arc::new(move |_event: &mut ChangeEvent| {
            seen.fetch_add(1, Ordering::SeqCst);
        });
        (hits, listener)
    }

    #[test]
    fn test_duplicate_registrations_all_fire() {
        let registry = ListenerRegistry::new();
        let (hits, listener) = counter();
        registry.add("app.k", listener.clone());
        registry.add("app.k", listener);

        let report = registry.dispatch(&mut event("app.k"));
        assert_eq!(report.delivered, 2);
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_other_names_do_not_fire() {
        let registry = ListenerRegistry::new();
        let (hits, listener) = counter();
        registry.add("app.other", listener);

        registry.dispatch(&mut event("app.k"));
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_panicking_listener_is_isolated() {
        let registry = ListenerRegistry::new();
        let (hits, listener) = counter();
        registry.add("app.k", Arc::new(|_event: &mut ChangeEvent| panic!("boom")));
        registry.add("app.k", listener);

        let report = registry.dispatch(&mut event("app.k"));
        assert_eq!(report.panicked, 1);
        assert_eq!(report.delivered, 1);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_cancel_skips_later_listeners() {
        let registry = ListenerRegistry::new();
        let (hits, listener) = counter();
        registry.add("app.k", Arc::new(|event: &mut ChangeEvent| event.cancel()));
        registry.add("app.k", listener);

        let mut ev = event("app.k");
        let report = registry.dispatch(&mut ev);
        assert!(report.canceled);
        assert!(ev.is_canceled());
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_remove() {
        let registry = ListenerRegistry::new();
        let (hits, listener) = counter();
        let id = registry.add("app.k", listener);

        assert!(registry.remove(id));
        assert!(!registry.remove(id));
        assert_eq!(registry.count("app.k"), 0);
        registry.dispatch(&mut event("app.k"));
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_clear_topic_is_separate_from_star_key() {
        let registry = ListenerRegistry::new();
        let (clears, on_clear) = counter();
        let (stars, on_star) = counter();
        registry.add(Topic::Clear, on_clear);
        registry.add("app.*", on_star);

        let mut cleared = ChangeEvent::new(
            "app.*",
            None,
            None,
            None,
            ContextId::from_bytes([1; 16]),
            "page",
        );
        let mut star_key = ChangeEvent::new(
            "app.*",
            Some("*".to_string()),
            None,
            Some(json!(1)),
            ContextId::from_bytes([1; 16]),
            "page",
        );
        assert_eq!(cleared.topic(), Topic::Clear);

        registry.dispatch(&mut cleared);
        assert_eq!(clears.load(Ordering::SeqCst), 1);
        assert_eq!(stars.load(Ordering::SeqCst), 0);

        registry.dispatch(&mut star_key);
        assert_eq!(clears.load(Ordering::SeqCst), 1);
        assert_eq!(stars.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_data_aliases_to() {
        let ev = event("app.k");
        assert_eq!(ev.data(), ev.to());
    }
}
