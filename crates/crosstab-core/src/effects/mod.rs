//! Effect interfaces
//!
//! Pure trait signatures for the collaborators the store layer needs. Handler
//! implementations live in `crosstab-effects`; test doubles live in
//! `crosstab-testkit`.

pub mod store;

pub use store::{RawChangeSignal, SharedStoreEffects, SignalReceiver, SignalSender, StorageError};
