//! Crosstab Testing Infrastructure
//!
//! Shared helpers for tests that need more than one execution context:
//! a harness of tabs attached to one origin, an event recorder, a store
//! wrapper that injects another context's writes between a read and a write,
//! and proptest strategies for structured values.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(missing_docs)]
//!
//! # Usage
//!
//! ```toml
//! [dev-dependencies]
//! crosstab-testkit = { path = "../crosstab-testkit" }
//! ```

pub mod harness;
pub mod interleave;
pub mod recorder;
pub mod strategies;
pub mod logging;

pub use harness::TabSet;
pub use interleave::InterleavingStore;
pub use recorder::EventLog;
pub use logging::init_test_tracing;
