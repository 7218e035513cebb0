//! Structured values
//!
//! A structured value is null, a boolean, a number, a string, an ordered list
//! of structured values or a string-keyed map of structured values. This is
//! exactly the JSON data model, so [`Value`] is `serde_json::Value`.
//!
//! Absence of a key is modelled as `Option<Value>::None` throughout the
//! workspace, which keeps "missing" distinct from a stored `Value::Null`.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A structured value as stored in the shared store or the local map.
pub type Value = serde_json::Value;

/// Coarse type of a [`Value`], used in type mismatch reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueKind {
    /// `null`
    Null,
    /// `true` / `false`
    Bool,
    /// Integer or floating point number
    Number,
    /// UTF-8 string
    String,
    /// Ordered list
    List,
    /// String-keyed map
    Map,
}

impl ValueKind {
    /// Classify a value.
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(_) => Self::Bool,
            Value::Number(_) => Self::Number,
            Value::String(_) => Self::String,
            Value::Array(_) => Self::List,
            Value::Object(_) => Self::Map,
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Null => "null",
            Self::Bool => "bool",
            Self::Number => "number",
            Self::String => "string",
            Self::List => "list",
            Self::Map => "map",
        };
        f.write_str(name)
    }
}
