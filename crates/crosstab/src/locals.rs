//! Process-local variables
//!
//! Values here are never encoded, never written to the shared store and never
//! produce change signals. They live as long as the owning `SharedStore`.

use crate::config::Variable;
use crosstab_core::Value;
use parking_lot::Mutex;
use std::collections::HashMap;

/// In-memory variable map for one execution context.
#[derive(Debug, Default)]
pub struct LocalVars {
    vars: Mutex<HashMap<String, Value>>,
}

impl LocalVars {
    /// Create an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current value of `key`, `None` if never set.
    pub fn get(&self, key: &str) -> Option<Value> {
        self.vars.lock().get(key).cloned()
    }

    /// Set `key`, returning the previous value.
    pub fn set(&self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.vars.lock().insert(key.into(), value)
    }

    /// Write every variable, overwriting existing values.
    pub fn apply(&self, defaults: &[Variable]) {
        let mut vars = self.vars.lock();
        for var in defaults {
            vars.insert(var.name.clone(), var.value.clone());
        }
    }

    /// Drop every variable.
    pub fn clear(&self) {
        self.vars.lock().clear();
    }

    /// Number of variables.
    pub fn len(&self) -> usize {
        self.vars.lock().len()
    }

    /// Whether no variables are set.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
