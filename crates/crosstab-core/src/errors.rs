//! Unified error system for store operations
//!
//! Every failure is synchronous and surfaced to the immediate caller; nothing
//! here is retried by the store layer.

use crate::codec::CodecError;
use crate::effects::StorageError;
use crate::value::ValueKind;

/// Error type for all facade, queue and listener operations
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StoreError {
    /// Operation attempted before `init`
    #[error("store not initialized: call init() once before any other operation")]
    NotInitialized,

    /// A stored string could not be decoded
    #[error("stored value for '{key}' is malformed: {source}")]
    Decode {
        /// Key whose stored string failed to decode
        key: String,
        /// Underlying codec failure
        source: CodecError,
    },

    /// Dequeue or pop on an empty or absent list
    #[error("nothing to take from '{key}'{}", bucket_suffix(.bucket))]
    EmptyQueue {
        /// Storage key of the list or queue
        key: String,
        /// Method bucket within a queue, `None` for plain lists
        bucket: Option<String>,
    },

    /// A stored value does not have the shape the operation needs
    #[error("'{key}' holds a {found}, expected {expected}")]
    TypeMismatch {
        /// Offending key
        key: String,
        /// What the operation needed
        expected: String,
        /// What was actually stored
        found: ValueKind,
    },

    /// Backend failure
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Invalid configuration
    #[error("invalid configuration: {message}")]
    Config {
        /// What is wrong with the configuration
        message: String,
    },
}

fn bucket_suffix(bucket: &Option<String>) -> String {
    match bucket {
        Some(method) => format!(" (method '{method}')"),
        None => String::new(),
    }
}

impl StoreError {
    /// Create a decode error for `key`
    pub fn decode(key: impl Into<String>, source: CodecError) -> Self {
        Self::Decode {
            key: key.into(),
            source,
        }
    }

    /// Create an empty list error
    pub fn empty_list(key: impl Into<String>) -> Self {
        Self::EmptyQueue {
            key: key.into(),
            bucket: None,
        }
    }

    /// Create an empty queue bucket error
    pub fn empty_queue(key: impl Into<String>, method: impl Into<String>) -> Self {
        Self::EmptyQueue {
            key: key.into(),
            bucket: Some(method.into()),
        }
    }

    /// Create a type mismatch error
    pub fn type_mismatch(
        key: impl Into<String>,
        expected: impl Into<String>,
        found: ValueKind,
    ) -> Self {
        Self::TypeMismatch {
            key: key.into(),
            expected: expected.into(),
            found,
        }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }
}

/// Standard Result type for store operations
pub type StoreResult<T> = std::result::Result<T, StoreError>;
