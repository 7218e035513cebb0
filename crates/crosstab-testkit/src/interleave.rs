//! Deterministic interleaving of concurrent writers
//!
//! [`InterleavingStore`] wraps a context's store handle and runs a one-shot
//! hook right after the next read of a chosen key. The hook typically performs
//! a full operation from another context, reproducing the schedule
//! read(A) read(B) write(B) write(A) without threads.

use crosstab_core::{ContextId, SharedStoreEffects, SignalReceiver, StorageError};
use parking_lot::Mutex;

type Hook = Box<dyn FnOnce() + Send>;

/// Store handle that can inject work between a read and the following write.
pub struct InterleavingStore<S> {
    inner: S,
    hook: Mutex<Option<(String, Hook)>>,
}

impl<S: SharedStoreEffects> InterleavingStore<S> {
    /// Wrap `inner`.
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            hook: Mutex::new(None),
        }
    }

    /// Run `hook` once, right after the next read of `key` returns.
    pub fn after_next_read<F>(&self, key: impl Into<String>, hook: F)
    where
        F: FnOnce() + Send + 'static,
    {
        *self.hook.lock() = Some((key.into(), Box::new(hook)));
    }

    /// Whether a hook is still waiting to fire.
    pub fn is_armed(&self) -> bool {
        self.hook.lock().is_some()
    }

    fn take_hook(&self, key: &str) -> Option<Hook> {
        let mut slot = self.hook.lock();
        match slot.as_ref() {
            Some((armed, _)) if armed == key => slot.take().map(|(_, hook)| hook),
            _ => None,
        }
    }
}

impl<S: SharedStoreEffects> SharedStoreEffects for InterleavingStore<S> {
    fn context_id(&self) -> ContextId {
        self.inner.context_id()
    }

    fn page(&self) -> &str {
        self.inner.page()
    }

    fn raw_get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let value = self.inner.raw_get(key)?;
        // Lock released before the hook runs; the hook may read through us.
        if let Some(hook) = self.take_hook(key) {
            hook();
        }
        Ok(value)
    }

    fn raw_set(&self, key: &str, value: String) -> Result<(), StorageError> {
        self.inner.raw_set(key, value)
    }

    fn raw_delete(&self, key: &str) -> Result<(), StorageError> {
        self.inner.raw_delete(key)
    }

    fn raw_clear(&self) -> Result<(), StorageError> {
        self.inner.raw_clear()
    }

    fn keys(&self) -> Result<Vec<String>, StorageError> {
        self.inner.keys()
    }

    fn subscribe(&self) -> SignalReceiver {
        self.inner.subscribe()
    }
}
