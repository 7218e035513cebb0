//! Named queues
//!
//! A queue is a global variable stored under `"<name>_queue"` whose value is a
//! map from method name to an ordered list of items. Items are appended at the
//! tail by `enqueue` and taken from the head by `dequeue`.
//!
//! # Concurrency
//!
//! Queue mutations are best-effort read-modify-write on a single store entry,
//! like the list operations: concurrent writers in different contexts can
//! lose updates, and the last write wins. Within one context operations apply
//! in call order.
//!
//! Queue change events carry the whole queue map in `from`/`to`, not the item
//! that changed; listeners diff the two to find it.

mod bucket;

use crate::events::{ChangeEvent, ListenerId};
use crate::store::SharedStore;
use crosstab_core::{StoreError, StoreResult, Value};
use tracing::debug;

pub use bucket::QueueMap;

/// Suffix appended to a queue name to form its storage key.
pub const QUEUE_KEY_SUFFIX: &str = "_queue";

/// Storage key of the queue called `name`.
pub fn queue_key(name: &str) -> String {
    format!("{name}{QUEUE_KEY_SUFFIX}")
}

/// Handle on one named queue.
#[derive(Debug, Clone, Copy)]
pub struct QueueHandle<'a> {
    store: &'a SharedStore,
    name: &'a str,
}

impl<'a> QueueHandle<'a> {
    pub(crate) fn new(store: &'a SharedStore, name: &'a str) -> Self {
        Self { store, name }
    }

    /// Queue name.
    pub fn name(&self) -> &str {
        self.name
    }

    /// Storage key of this queue.
    pub fn key(&self) -> String {
        queue_key(self.name)
    }

    /// Append `item` to the tail of `method`'s list.
    pub fn enqueue(&self, method: &str, item: Value) -> StoreResult<()> {
        let key = self.key();
        let mut queue = self.load(&key)?;
        let len = queue.push_back(method, item)?;
        self.store.write_global(&key, &queue.into_value())?;
        debug!(queue = self.name, method, len, "Enqueued item");
        Ok(())
    }

    /// Remove and return the head of `method`'s list.
    pub fn dequeue(&self, method: &str) -> StoreResult<Value> {
        let key = self.key();
        let mut queue = self.load(&key)?;
        let item = queue
            .pop_front(method)?
            .ok_or_else(|| StoreError::empty_queue(&key, method))?;
        self.store.write_global(&key, &queue.into_value())?;
        debug!(queue = self.name, method, "Dequeued item");
        Ok(item)
    }

    /// Snapshot of `method`'s list, empty if the queue or method is absent.
    pub fn snapshot(&self, method: &str) -> StoreResult<Vec<Value>> {
        let key = self.key();
        Ok(self.load(&key)?.items(method)?.to_vec())
    }

    /// Number of items in `method`'s list.
    pub fn len(&self, method: &str) -> StoreResult<usize> {
        let key = self.key();
        Ok(self.load(&key)?.items(method)?.len())
    }

    /// Whether `method`'s list is empty or absent.
    pub fn is_empty(&self, method: &str) -> StoreResult<bool> {
        Ok(self.len(method)? == 0)
    }

    /// Method names that have a list.
    pub fn methods(&self) -> StoreResult<Vec<String>> {
        let key = self.key();
        Ok(self.load(&key)?.methods())
    }

    /// Call `callback` whenever another context changes this queue.
    pub fn listen<F>(&self, callback: F) -> StoreResult<ListenerId>
    where
        F: Fn(&mut ChangeEvent) + Send + Sync + 'static,
    {
        self.store.listen_to(&self.key(), callback)
    }

    fn load(&self, key: &str) -> StoreResult<QueueMap> {
        self.store.require_init()?;
        QueueMap::from_stored(key, self.store.read_global(key)?)
    }
}

impl SharedStore {
    /// Handle on the queue called `name`.
    pub fn queue<'a>(&'a self, name: &'a str) -> QueueHandle<'a> {
        QueueHandle::new(self, name)
    }

    /// Append `item` to `method`'s list in queue `queue_name`.
    pub fn enqueue(&self, queue_name: &str, method: &str, item: Value) -> StoreResult<()> {
        self.queue(queue_name).enqueue(method, item)
    }

    /// Remove and return the head of `method`'s list in queue `queue_name`.
    pub fn dequeue(&self, queue_name: &str, method: &str) -> StoreResult<Value> {
        self.queue(queue_name).dequeue(method)
    }

    /// Snapshot of `method`'s list in queue `queue_name`.
    pub fn get_queue(&self, queue_name: &str, method: &str) -> StoreResult<Vec<Value>> {
        self.queue(queue_name).snapshot(method)
    }

    /// Call `callback` whenever another context changes queue `queue_name`.
    pub fn listen_to_queue<F>(&self, queue_name: &str, callback: F) -> StoreResult<ListenerId>
    where
        F: Fn(&mut ChangeEvent) + Send + Sync + 'static,
    {
        self.queue(queue_name).listen(callback)
    }
}
