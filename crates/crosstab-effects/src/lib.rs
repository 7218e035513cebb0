//! # Crosstab Effects - Layer 3: Store Handlers
//!
//! Implementations of [`SharedStoreEffects`](crosstab_core::SharedStoreEffects).
//!
//! An [`Origin`] is the shared persistent store of one application origin.
//! Each execution context attaches to it and receives its own
//! [`OriginStoreHandler`]; a write through one handler is broadcast as a raw
//! change signal to every other attached context that subscribed.
//!
//! Origins are in-memory by default. [`Origin::open`] backs one with a JSON
//! snapshot file so its entries survive process restart.

#![forbid(unsafe_code)]

/// Shared origin and per-context handles
pub mod origin;

/// JSON snapshot persistence for origins
pub mod snapshot;

pub use origin::{Origin, OriginStoreHandler};
pub use snapshot::SnapshotFile;
