//! Store configuration
//!
//! Configuration names the application (the namespace for change events) and
//! the default global and local variables applied by `init` and `reset`.
//!
//! ```toml
//! app_name = "editor"
//!
//! [[global]]
//! name = "version"
//! value = "1.1.4"
//!
//! [[local]]
//! name = "panel"
//! value = { open = true, width = 320 }
//! ```

use crosstab_core::{StoreError, StoreResult, Value};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// A named default value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variable {
    /// Key the value is stored under
    pub name: String,
    /// Default value
    pub value: Value,
}

impl Variable {
    /// Create a variable.
    pub fn new(name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Configuration passed to `SharedStore::init`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Application name, prefixed to every change event name
    pub app_name: String,
    /// Defaults seeded into the shared store
    #[serde(default)]
    pub global: Vec<Variable>,
    /// Defaults seeded into the process-local map
    #[serde(default)]
    pub local: Vec<Variable>,
}

impl StoreConfig {
    /// Configuration with no defaults.
    pub fn new(app_name: impl Into<String>) -> Self {
        Self {
            app_name: app_name.into(),
            global: Vec::new(),
            local: Vec::new(),
        }
    }

    /// Add a global default.
    pub fn with_global(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.global.push(Variable::new(name, value));
        self
    }

    /// Add a local default.
    pub fn with_local(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.local.push(Variable::new(name, value));
        self
    }

    /// Parse a TOML document.
    pub fn from_toml_str(contents: &str) -> StoreResult<Self> {
        let config: Self = toml::from_str(contents)
            .map_err(|e| StoreError::config(format!("Failed to parse TOML config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a JSON document.
    pub fn from_json_str(contents: &str) -> StoreResult<Self> {
        let config: Self = serde_json::from_str(contents)
            .map_err(|e| StoreError::config(format!("Failed to parse JSON config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Load a `.toml` or `.json` file.
    pub fn load(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| {
            StoreError::config(format!("Failed to read config {}: {e}", path.display()))
        })?;

        match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Self::from_toml_str(&contents),
            Some("json") => Self::from_json_str(&contents),
            other => Err(StoreError::config(format!(
                "Unsupported config format {other:?} for {}",
                path.display()
            ))),
        }
    }

    /// Check the invariants `init` relies on.
    pub fn validate(&self) -> StoreResult<()> {
        if self.app_name.is_empty() {
            return Err(StoreError::config("app_name cannot be empty"));
        }
        if self.app_name.contains('.') {
            return Err(StoreError::config(format!(
                "app_name '{}' cannot contain '.', it separates the event namespace",
                self.app_name
            )));
        }
        if let Some(var) = self
            .global
            .iter()
            .chain(self.local.iter())
            .find(|var| var.name.is_empty())
        {
            return Err(StoreError::config(format!(
                "variable names cannot be empty (value {})",
                var.value
            )));
        }
        Ok(())
    }
}
