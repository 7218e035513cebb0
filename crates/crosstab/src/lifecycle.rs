//! Initialization and reset control
//!
//! Owns the one-shot init guard and the default variable tables. Every other
//! component asks [`Lifecycle::require`] before touching the store and fails
//! fast with `NotInitialized` instead of duplicating the guard.

use crate::config::{StoreConfig, Variable};
use crosstab_core::{StoreError, StoreResult};
use once_cell::sync::OnceCell;

/// What `init` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitOutcome {
    /// First init in this context; global defaults were written
    Seeded,
    /// First init in this context; the first global default's key already
    /// existed, so no global defaults were written
    ///
    /// Only the first key is checked. Other global defaults may still be
    /// missing if another context wrote the first key by other means.
    AlreadySeeded,
    /// `init` had already run in this context; nothing changed
    AlreadyInitialized,
}

/// What `reset` re-applies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResetOptions {
    /// Re-apply global defaults
    pub global: bool,
    /// Re-apply local defaults
    pub local: bool,
    /// Clear the whole shared store and the local map first
    pub wipe: bool,
}

impl ResetOptions {
    /// Re-apply both default tables without wiping.
    pub fn defaults() -> Self {
        Self {
            global: true,
            local: true,
            wipe: false,
        }
    }

    /// Wipe everything, then re-apply both default tables.
    pub fn wipe_all() -> Self {
        Self {
            global: true,
            local: true,
            wipe: true,
        }
    }
}

/// State recorded by the first successful `init`.
#[derive(Debug, Clone)]
pub struct InitState {
    app_name: String,
    global_defaults: Vec<Variable>,
    local_defaults: Vec<Variable>,
}

impl InitState {
    /// Application namespace.
    pub fn app_name(&self) -> &str {
        &self.app_name
    }

    /// Default global variables.
    pub fn global_defaults(&self) -> &[Variable] {
        &self.global_defaults
    }

    /// Default local variables.
    pub fn local_defaults(&self) -> &[Variable] {
        &self.local_defaults
    }
}

/// One-shot initialization guard.
#[derive(Debug, Default)]
pub struct Lifecycle {
    state: OnceCell<InitState>,
}

impl Lifecycle {
    /// Create an uninitialized guard.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `config` as the init state.
    ///
    /// Returns `None` if init already happened; the earlier state is kept and
    /// `config` is ignored.
    pub fn begin(&self, config: &StoreConfig) -> Option<&InitState> {
        let mut fresh = false;
        let state = self.state.get_or_init(|| {
            fresh = true;
            InitState {
                app_name: config.app_name.clone(),
                global_defaults: config.global.clone(),
                local_defaults: config.local.clone(),
            }
        });
        fresh.then_some(state)
    }

    /// Init state, or `NotInitialized`.
    pub fn require(&self) -> StoreResult<&InitState> {
        self.state.get().ok_or(StoreError::NotInitialized)
    }

    /// Whether init has happened.
    pub fn is_initialized(&self) -> bool {
        self.state.get().is_some()
    }
}
