//! Shared origin store
//!
//! One [`Origin`] is shared by every execution context of an application.
//! Entries are raw strings; signals are fanned out to subscriber inboxes under
//! the same lock that applies the mutation, so every context observes writes
//! in the order the origin applied them.

use crate::snapshot::SnapshotFile;
use crosstab_core::{
    ContextId, RawChangeSignal, SharedStoreEffects, SignalReceiver, SignalSender, StorageError,
};
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, trace};

struct Subscriber {
    context: ContextId,
    tx: SignalSender,
}

#[derive(Default)]
struct OriginState {
    entries: BTreeMap<String, String>,
    subscribers: Vec<Subscriber>,
}

struct OriginInner {
    state: Mutex<OriginState>,
    snapshot: Option<SnapshotFile>,
}

/// Shared persistent store for one application origin.
///
/// Cloning an `Origin` shares the same entries and subscribers.
#[derive(Clone)]
pub struct Origin {
    inner: Arc<OriginInner>,
}

/// Change applied under the origin lock, used to build the broadcast signal.
struct Applied {
    key: Option<String>,
    old_raw: Option<String>,
    new_raw: Option<String>,
}

impl Origin {
    /// Create an empty in-memory origin.
    pub fn in_memory() -> Self {
        Self {
            inner: Arc::new(OriginInner {
                state: Mutex::new(OriginState::default()),
                snapshot: None,
            }),
        }
    }

    /// Open an origin persisted to a JSON snapshot at `path`.
    ///
    /// The snapshot is created on first write if it does not exist.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let snapshot = SnapshotFile::new(path);
        let entries = snapshot.load()?;
        debug!(
            path = %snapshot.path().display(),
            entries = entries.len(),
            "Opened persisted origin"
        );

        Ok(Self {
            inner: Arc::new(OriginInner {
                state: Mutex::new(OriginState {
                    entries,
                    subscribers: Vec::new(),
                }),
                snapshot: Some(snapshot),
            }),
        })
    }

    /// Attach a new execution context with a fresh id.
    pub fn attach(&self, page: impl Into<String>) -> OriginStoreHandler {
        self.attach_with_id(ContextId::new_random(), page)
    }

    /// Attach an execution context with a caller-chosen id.
    pub fn attach_with_id(&self, context: ContextId, page: impl Into<String>) -> OriginStoreHandler {
        OriginStoreHandler {
            origin: self.clone(),
            context,
            page: page.into(),
        }
    }

    /// Number of stored keys.
    pub fn len(&self) -> usize {
        self.inner.state.lock().entries.len()
    }

    /// Whether the origin holds no keys.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of live subscriber inboxes.
    pub fn subscriber_count(&self) -> usize {
        let mut state = self.inner.state.lock();
        state.subscribers.retain(|s| !s.tx.is_closed());
        state.subscribers.len()
    }

    fn register(&self, context: ContextId) -> SignalReceiver {
        let (tx, rx) = mpsc::unbounded_channel();
        self.inner
            .state
            .lock()
            .subscribers
            .push(Subscriber { context, tx });
        rx
    }

    fn read(&self, key: &str) -> Option<String> {
        self.inner.state.lock().entries.get(key).cloned()
    }

    fn keys(&self) -> Vec<String> {
        self.inner.state.lock().entries.keys().cloned().collect()
    }

    /// Apply `mutate` under the lock, persist, then broadcast to everyone but `writer`.
    fn mutate<F>(&self, writer: ContextId, page: &str, mutate: F) -> Result<(), StorageError>
    where
        F: FnOnce(&mut BTreeMap<String, String>) -> Option<Applied>,
    {
        let mut state = self.inner.state.lock();
        let previous = self.inner.snapshot.as_ref().map(|_| state.entries.clone());

        let Some(applied) = mutate(&mut state.entries) else {
            return Ok(());
        };

        if let (Some(snapshot), Some(previous)) = (&self.inner.snapshot, previous) {
            if let Err(err) = snapshot.save(&state.entries) {
                state.entries = previous;
                return Err(err);
            }
        }

        let signal = RawChangeSignal {
            key: applied.key,
            old_raw: applied.old_raw,
            new_raw: applied.new_raw,
            origin: writer,
            page: page.to_string(),
        };

        state.subscribers.retain(|subscriber| {
            if subscriber.context == writer {
                return !subscriber.tx.is_closed();
            }
            subscriber.tx.send(signal.clone()).is_ok()
        });
        trace!(
            key = ?signal.key,
            context = %writer,
            receivers = state.subscribers.len(),
            "Broadcast raw change signal"
        );

        Ok(())
    }
}

impl Default for Origin {
    fn default() -> Self {
        Self::in_memory()
    }
}

impl std::fmt::Debug for Origin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Origin")
            .field("entries", &self.len())
            .field(
                "snapshot",
                &self.inner.snapshot.as_ref().map(SnapshotFile::path),
            )
            .finish()
    }
}

/// Handle on an [`Origin`] for one execution context.
#[derive(Debug, Clone)]
pub struct OriginStoreHandler {
    origin: Origin,
    context: ContextId,
    page: String,
}

impl OriginStoreHandler {
    /// Origin this handle writes to.
    pub fn origin(&self) -> &Origin {
        &self.origin
    }
}

impl SharedStoreEffects for OriginStoreHandler {
    fn context_id(&self) -> ContextId {
        self.context
    }

    fn page(&self) -> &str {
        &self.page
    }

    fn raw_get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.origin.read(key))
    }

    fn raw_set(&self, key: &str, value: String) -> Result<(), StorageError> {
        self.origin.mutate(self.context, &self.page, |entries| {
            if entries.get(key) == Some(&value) {
                return None;
            }
            let old_raw = entries.insert(key.to_string(), value.clone());
            Some(Applied {
                key: Some(key.to_string()),
                old_raw,
                new_raw: Some(value),
            })
        })
    }

    fn raw_delete(&self, key: &str) -> Result<(), StorageError> {
        self.origin.mutate(self.context, &self.page, |entries| {
            let old_raw = entries.remove(key)?;
            Some(Applied {
                key: Some(key.to_string()),
                old_raw: Some(old_raw),
                new_raw: None,
            })
        })
    }

    fn raw_clear(&self) -> Result<(), StorageError> {
        self.origin.mutate(self.context, &self.page, |entries| {
            if entries.is_empty() {
                return None;
            }
            entries.clear();
            Some(Applied {
                key: None,
                old_raw: None,
                new_raw: None,
            })
        })
    }

    fn keys(&self) -> Result<Vec<String>, StorageError> {
        Ok(self.origin.keys())
    }

    fn subscribe(&self) -> SignalReceiver {
        self.origin.register(self.context)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_writer_never_sees_own_signal() {
        let origin = Origin::in_memory();
        let a = origin.attach("page-a");
        let b = origin.attach("page-b");
        let mut a_rx = a.subscribe();
        let mut b_rx = b.subscribe();

        a.raw_set("k", "1".to_string()).unwrap();

        assert!(a_rx.try_recv().is_err());
        let signal = b_rx.try_recv().unwrap();
        assert_eq!(signal.key.as_deref(), Some("k"));
        assert_eq!(signal.old_raw, None);
        assert_eq!(signal.new_raw.as_deref(), Some("1"));
        assert_eq!(signal.origin, a.context_id());
        assert_eq!(signal.page, "page-a");
    }

    #[test]
    fn test_set_reports_old_value() {
        let origin = Origin::in_memory();
        let a = origin.attach("a");
        let b = origin.attach("b");
        let mut rx = b.subscribe();

        a.raw_set("k", "1".to_string()).unwrap();
        a.raw_set("k", "2".to_string()).unwrap();

        assert_eq!(rx.try_recv().unwrap().new_raw.as_deref(), Some("1"));
        let second = rx.try_recv().unwrap();
        assert_eq!(second.old_raw.as_deref(), Some("1"));
        assert_eq!(second.new_raw.as_deref(), Some("2"));
    }

    #[test]
    fn test_unchanged_writes_are_silent() {
        let origin = Origin::in_memory();
        let a = origin.attach("a");
        let b = origin.attach("b");

        a.raw_set("k", "1".to_string()).unwrap();
        let mut rx = b.subscribe();

        a.raw_set("k", "1".to_string()).unwrap();
        a.raw_delete("absent").unwrap();
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_clear_signals_without_key() {
        let origin = Origin::in_memory();
        let a = origin.attach("a");
        let b = origin.attach("b");
        a.raw_set("x", "1".to_string()).unwrap();
        let mut rx = b.subscribe();

        a.raw_clear().unwrap();
        assert!(origin.is_empty());
        assert_eq!(rx.try_recv().unwrap().key, None);

        a.raw_clear().unwrap();
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_dropped_inboxes_are_pruned() {
        let origin = Origin::in_memory();
        let a = origin.attach("a");
        let b = origin.attach("b");
        let rx = b.subscribe();
        assert_eq!(origin.subscriber_count(), 1);

        drop(rx);
        a.raw_set("k", "1".to_string()).unwrap();
        assert_eq!(origin.subscriber_count(), 0);
    }

    #[test]
    fn test_persisted_origin_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("origin.json");

        {
            let origin = Origin::open(&path).unwrap();
            let ctx = origin.attach("a");
            ctx.raw_set("theme", "\"dark\"".to_string()).unwrap();
            ctx.raw_set("tmp", "1".to_string()).unwrap();
            ctx.raw_delete("tmp").unwrap();
        }

        let reopened = Origin::open(&path).unwrap();
        let ctx = reopened.attach("b");
        assert_eq!(ctx.raw_get("theme").unwrap().as_deref(), Some("\"dark\""));
        assert_eq!(ctx.keys().unwrap(), vec!["theme".to_string()]);
    }
}
