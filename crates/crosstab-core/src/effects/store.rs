//! Shared persistent store effects
//!
//! The raw, origin-scoped string store shared by every execution context of
//! one application. Values are opaque strings at this level; the codec and the
//! facade sit above it.
//!
//! # Signal contract
//!
//! A successful mutation through a handle produces one [`RawChangeSignal`] in
//! every *other* context that called [`SharedStoreEffects::subscribe`]. The
//! writing context never receives a signal for its own write. Mutations that
//! leave the store unchanged (re-setting an identical value, deleting an
//! absent key, clearing an empty store) produce no signal.

use crate::context::ContextId;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

/// Sending half of a context's raw signal inbox.
pub type SignalSender = mpsc::UnboundedSender<RawChangeSignal>;

/// Receiving half of a context's raw signal inbox.
pub type SignalReceiver = mpsc::UnboundedReceiver<RawChangeSignal>;

/// Raw change notification delivered to other contexts after a write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawChangeSignal {
    /// Changed key, `None` when the whole store was cleared
    pub key: Option<String>,
    /// Stored string before the write
    pub old_raw: Option<String>,
    /// Stored string after the write
    pub new_raw: Option<String>,
    /// Context that performed the write
    pub origin: ContextId,
    /// Page label of the writing context
    pub page: String,
}

/// Storage backend failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StorageError {
    /// Reading from the backend failed
    #[error("storage read failed: {0}")]
    ReadFailed(String),
    /// Writing to the backend failed
    #[error("storage write failed: {0}")]
    WriteFailed(String),
}

/// Raw shared store as seen from one execution context.
///
/// All operations are synchronous and never suspend.
pub trait SharedStoreEffects: Send + Sync {
    /// Context this handle reads and writes as.
    fn context_id(&self) -> ContextId;

    /// Page label carried in signals produced by this handle.
    fn page(&self) -> &str;

    /// Read the stored string for `key`.
    fn raw_get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Store `value` under `key`, signalling every other subscribed context.
    fn raw_set(&self, key: &str, value: String) -> Result<(), StorageError>;

    /// Remove `key`. Absent keys are not an error.
    fn raw_delete(&self, key: &str) -> Result<(), StorageError>;

    /// Remove every key.
    fn raw_clear(&self) -> Result<(), StorageError>;

    /// All stored keys, sorted.
    fn keys(&self) -> Result<Vec<String>, StorageError>;

    /// Subscribe this context to raw change signals from other contexts.
    ///
    /// Each call creates a new inbox; signals are delivered to every inbox
    /// registered for a context other than the writer's.
    fn subscribe(&self) -> SignalReceiver;

    /// Whether `key` is present.
    fn contains_key(&self, key: &str) -> Result<bool, StorageError> {
        Ok(self.raw_get(key)?.is_some())
    }
}
