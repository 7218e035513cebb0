//! # Crosstab Core - Layer 1: Foundation
//!
//! Shared value model, codec adapter and the raw store effect interface that
//! every other crosstab crate builds on.
//!
//! # Architecture Constraints
//!
//! - YES Structured value model and kind inspection
//! - YES Codec adapter between structured values and stored strings
//! - YES Effect interface for the shared persistent store (`SharedStoreEffects`)
//! - YES Unified error taxonomy
//! - NO handler implementations (use `crosstab-effects`)
//! - NO facade, queue or notification logic (that's `crosstab`)
//!
//! ## Execution contexts
//!
//! An execution context is one window/tab/process sharing a store with
//! others. Every write performed through a context's store handle produces a
//! [`RawChangeSignal`] in every *other* subscribed context and never in the
//! writer's own.

#![forbid(unsafe_code)]

/// Structured values and kind inspection
pub mod value;

/// Codec adapter: structured value <-> stored string
pub mod codec;

/// Execution context identifiers
pub mod context;

/// Effect interfaces (no implementations)
pub mod effects;

/// Unified error handling
pub mod errors;

pub use codec::{CodecError, JsonCodec, ValueCodec};
pub use context::ContextId;
pub use effects::{
    RawChangeSignal, SharedStoreEffects, SignalReceiver, SignalSender, StorageError,
};
pub use errors::{StoreError, StoreResult};
pub use value::{Value, ValueKind};
