//! # Crosstab - Layer 4: Shared Store Facade
//!
//! A key-value store shared by every execution context (window, tab,
//! process) of one application origin, with:
//!
//! - transparent structured values: callers read and write [`Value`]s, the
//!   codec handles the stored strings
//! - typed change notification: a write in one context becomes a
//!   `"<app_name>.<key>"` [`ChangeEvent`] with decoded old/new values in every
//!   *other* context (never the writer's own)
//! - named FIFO queues bucketed by method, plus plain list and map helpers
//! - a process-local variable space that is never shared or persisted
//!
//! ## Usage
//!
//! ```rust,ignore
//! use crosstab::{Scope, SharedStore, StoreConfig};
//! use crosstab_effects::Origin;
//! use serde_json::json;
//!
//! let origin = Origin::in_memory();
//! let tab_a = SharedStore::new(origin.attach("tab-a"));
//! let tab_b = SharedStore::new(origin.attach("tab-b"));
//!
//! let config = StoreConfig::new("editor").with_global("count", 0);
//! tab_a.init(config.clone())?;
//! tab_b.init(config)?;
//!
//! tab_b.listen_to("count", |event| println!("{:?} -> {:?}", event.from(), event.to()))?;
//! tab_a.set("count", json!(1), Scope::Global)?;
//! tab_b.process_pending(); // prints Some(Number(0)) -> Some(Number(1))
//! ```
//!
//! ## Guarantees
//!
//! - Within one context, operations apply in call order.
//! - Change events are delivered in the order the origin applied the writes.
//! - List and queue mutations are read-modify-write without a cross-context
//!   guard: concurrent writers can lose updates (last write wins).

#![forbid(unsafe_code)]

/// Store configuration and default variables
pub mod config;

/// Change events and listener registry
pub mod events;

/// One-shot init guard and reset options
pub mod lifecycle;

/// List and object helpers on global variables
pub mod lists;

/// Process-local variables
pub mod locals;

/// Named method-bucketed queues
pub mod queue;

/// Shared store facade
pub mod store;

/// Raw signal to change event translation
pub mod translator;

pub use config::{StoreConfig, Variable};
pub use events::{ChangeEvent, DispatchReport, Listener, ListenerId, ListenerRegistry, Topic};
pub use lifecycle::{InitOutcome, ResetOptions};
pub use locals::LocalVars;
pub use queue::{queue_key, QueueHandle, QueueMap};
pub use store::{Scope, SharedStore};
pub use translator::{ChangeTranslator, TranslatorState};

pub use crosstab_core::{
    CodecError, ContextId, JsonCodec, SharedStoreEffects, StoreError, StoreResult, Value,
    ValueCodec, ValueKind,
};
