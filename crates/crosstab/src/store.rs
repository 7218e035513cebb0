//! Shared store facade
//!
//! [`SharedStore`] is the per-context entry point: typed get/set/delete over
//! the raw shared store, a separate process-local variable map, listener
//! registration and the init/reset lifecycle. One `SharedStore` corresponds to
//! one execution context; independent instances never share hidden state.

use crate::config::{StoreConfig, Variable};
use crate::events::{ChangeEvent, DispatchReport, ListenerId};
use crate::lifecycle::{InitOutcome, Lifecycle, ResetOptions};
use crate::locals::LocalVars;
use crate::translator::{ChangeTranslator, TranslatorState};
use crosstab_core::{
    ContextId, JsonCodec, SharedStoreEffects, StoreError, StoreResult, Value, ValueCodec,
    ValueKind,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info};

/// Which variable space an operation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope {
    /// Shared store, visible to every context of the origin
    Global,
    /// This context's in-memory map, never shared or persisted
    Local,
}

/// Shared key-value store as seen from one execution context.
pub struct SharedStore {
    store: Arc<dyn SharedStoreEffects>,
    codec: Arc<dyn ValueCodec>,
    lifecycle: Lifecycle,
    locals: LocalVars,
    translator: ChangeTranslator,
}

impl SharedStore {
    /// Facade over `store` using the JSON codec.
    pub fn new(store: impl SharedStoreEffects + 'static) -> Self {
        Self::with_codec(Arc::new(store), Arc::new(JsonCodec))
    }

    /// Facade over a shared handle with an explicit codec.
    pub fn with_codec(store: Arc<dyn SharedStoreEffects>, codec: Arc<dyn ValueCodec>) -> Self {
        Self {
            translator: ChangeTranslator::new(codec.clone()),
            store,
            codec,
            lifecycle: Lifecycle::new(),
            locals: LocalVars::new(),
        }
    }

    /// Initialize this context. Only the first call has any effect.
    ///
    /// Records the defaults, subscribes to change signals from other contexts,
    /// seeds local defaults, then seeds global defaults unless the key of the
    /// *first* global default is already present in the shared store. The
    /// presence check is deliberately that coarse; see [`InitOutcome`].
    ///
    /// An invalid `config` or a failed seeding check is reported before
    /// anything is recorded, so `init` may be retried. A failure while writing
    /// the global defaults leaves the context initialized; `reset` re-applies
    /// them.
    pub fn init(&self, config: StoreConfig) -> StoreResult<InitOutcome> {
        if self.lifecycle.is_initialized() {
            debug!(app = %config.app_name, "init called again, ignoring");
            return Ok(InitOutcome::AlreadyInitialized);
        }
        config.validate()?;
        let already_seeded = match config.global.first() {
            Some(first) => self.store.contains_key(&first.name)?,
            None => false,
        };

        let Some(state) = self.lifecycle.begin(&config) else {
            return Ok(InitOutcome::AlreadyInitialized);
        };
        self.translator
            .register(state.app_name(), self.store.subscribe());
        self.locals.apply(state.local_defaults());

        if state.global_defaults().is_empty() {
            info!(app = state.app_name(), context = %self.context_id(), "Initialized without global defaults");
            return Ok(InitOutcome::Seeded);
        }
        if already_seeded {
            info!(
                app = state.app_name(),
                context = %self.context_id(),
                "Global defaults already present, not seeding"
            );
            return Ok(InitOutcome::AlreadySeeded);
        }

        self.write_defaults(state.global_defaults())?;
        info!(
            app = state.app_name(),
            context = %self.context_id(),
            globals = state.global_defaults().len(),
            "Seeded global defaults"
        );
        Ok(InitOutcome::Seeded)
    }

    /// Re-apply defaults, optionally wiping everything first.
    ///
    /// A wipe clears the entire shared store (every key, not only defaults)
    /// and the entire local map.
    pub fn reset(&self, options: ResetOptions) -> StoreResult<()> {
        let state = self.lifecycle.require()?;
        if options.wipe {
            self.store.raw_clear()?;
            self.locals.clear();
        }
        if options.global {
            self.write_defaults(state.global_defaults())?;
        }
        if options.local {
            self.locals.apply(state.local_defaults());
        }
        info!(
            app = state.app_name(),
            global = options.global,
            local = options.local,
            wipe = options.wipe,
            "Reset store"
        );
        Ok(())
    }

    /// Read `key` from `scope`. `Ok(None)` means the key is missing.
    pub fn get(&self, key: &str, scope: Scope) -> StoreResult<Option<Value>> {
        self.lifecycle.require()?;
        match scope {
            Scope::Local => Ok(self.locals.get(key)),
            Scope::Global => self.read_global(key),
        }
    }

    /// Write `key` in `scope`.
    ///
    /// A global write is signalled to every other context, never to this one.
    pub fn set(&self, key: &str, value: Value, scope: Scope) -> StoreResult<()> {
        self.lifecycle.require()?;
        match scope {
            Scope::Local => {
                self.locals.set(key, value);
                Ok(())
            }
            Scope::Global => self.write_global(key, &value),
        }
    }

    /// Read a local variable.
    pub fn get_local(&self, key: &str) -> StoreResult<Option<Value>> {
        self.get(key, Scope::Local)
    }

    /// Write a local variable.
    pub fn set_local(&self, key: &str, value: Value) -> StoreResult<()> {
        self.set(key, value, Scope::Local)
    }

    /// Read `key` and deserialize it into `T`.
    pub fn get_as<T: DeserializeOwned>(&self, key: &str, scope: Scope) -> StoreResult<Option<T>> {
        let Some(value) = self.get(key, scope)? else {
            return Ok(None);
        };
        let found = ValueKind::of(&value);
        serde_json::from_value(value)
            .map(Some)
            .map_err(|_| StoreError::type_mismatch(key, std::any::type_name::<T>(), found))
    }

    /// Serialize `value` and write it under `key`.
    ///
    /// Values that cannot be represented are stored as null.
    pub fn set_as<T: Serialize>(&self, key: &str, value: &T, scope: Scope) -> StoreResult<()> {
        let value = serde_json::to_value(value).unwrap_or(Value::Null);
        self.set(key, value, scope)
    }

    /// Remove a global variable. Absent keys are not an error.
    pub fn delete(&self, key: &str) -> StoreResult<()> {
        self.lifecycle.require()?;
        self.store.raw_delete(key)?;
        debug!(key, "Deleted global variable");
        Ok(())
    }

    /// Call `callback` for every change to global `key` made by another context.
    pub fn listen_to<F>(&self, key: &str, callback: F) -> StoreResult<ListenerId>
    where
        F: Fn(&mut ChangeEvent) + Send + Sync + 'static,
    {
        self.translator.listen(key, Arc::new(callback))
    }

    /// Call `callback` whenever another context clears the whole store.
    ///
    /// Clear listeners are separate from key listeners: a write to a key
    /// named `"*"` is not a clear, and `listen_to("*")` never hears clears.
    pub fn listen_to_clear<F>(&self, callback: F) -> StoreResult<ListenerId>
    where
        F: Fn(&mut ChangeEvent) + Send + Sync + 'static,
    {
        self.translator.listen_clear(Arc::new(callback))
    }

    /// Remove a listener. Returns whether it was registered.
    pub fn unlisten(&self, id: ListenerId) -> bool {
        self.translator.unlisten(id)
    }

    /// Deliver every change signal already received from other contexts.
    pub fn process_pending(&self) -> usize {
        self.translator.process_pending()
    }

    /// Wait for the next change signal from another context and deliver it.
    pub async fn process_next(&self) -> StoreResult<Option<DispatchReport>> {
        self.translator.process_next().await
    }

    /// Whether `init` has run.
    pub fn is_initialized(&self) -> bool {
        self.lifecycle.is_initialized()
    }

    /// Application name recorded by `init`.
    pub fn app_name(&self) -> Option<&str> {
        self.lifecycle.require().ok().map(|state| state.app_name())
    }

    /// Context this facade writes as.
    pub fn context_id(&self) -> ContextId {
        self.store.context_id()
    }

    /// Registration state of the change translator.
    pub fn translator_state(&self) -> TranslatorState {
        self.translator.state()
    }

    /// Number of listeners registered for `key`.
    pub fn listener_count(&self, key: &str) -> usize {
        self.translator.listener_count(key)
    }

    pub(crate) fn require_init(&self) -> StoreResult<()> {
        self.lifecycle.require().map(|_| ())
    }

    pub(crate) fn read_global(&self, key: &str) -> StoreResult<Option<Value>> {
        let raw = self.store.raw_get(key)?;
        self.codec
            .decode_optional(raw.as_deref())
            .map_err(|err| StoreError::decode(key, err))
    }

    pub(crate) fn write_global(&self, key: &str, value: &Value) -> StoreResult<()> {
        let encoded = self.codec.encode(value);
        self.store.raw_set(key, encoded)?;
        debug!(key, context = %self.context_id(), "Wrote global variable");
        Ok(())
    }

    fn write_defaults(&self, defaults: &[Variable]) -> StoreResult<()> {
        for var in defaults {
            self.write_global(&var.name, &var.value)?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for SharedStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedStore")
            .field("context", &self.context_id())
            .field("app_name", &self.app_name())
            .field("codec", &self.codec)
            .field("locals", &self.locals.len())
            .field("translator", &self.translator)
            .finish()
    }
}
