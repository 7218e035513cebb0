//! List and object operations on global variables
//!
//! Each operation reads the current value, mutates it in memory and writes the
//! whole value back. Nothing guards the gap between the read and the write:
//! two contexts mutating the same key concurrently can interleave as
//! read(A) read(B) write(A) write(B), and B's write silently replaces A's.
//! The last writer wins.

use crate::store::SharedStore;
use crosstab_core::{StoreError, StoreResult, Value, ValueKind};
use serde_json::Map;

impl SharedStore {
    /// Append `value` to the list stored under `key`.
    ///
    /// A missing key starts a new list.
    pub fn push(&self, key: &str, value: Value) -> StoreResult<()> {
        self.require_init()?;
        let mut items = match self.read_global(key)? {
            None => Vec::new(),
            Some(Value::Array(items)) => items,
            Some(other) => return Err(StoreError::type_mismatch(key, "list", ValueKind::of(&other))),
        };
        items.push(value);
        self.write_global(key, &Value::Array(items))
    }

    /// Remove and return the last item of the list stored under `key`.
    pub fn pop(&self, key: &str) -> StoreResult<Value> {
        self.require_init()?;
        let mut items = match self.read_global(key)? {
            None => return Err(StoreError::empty_list(key)),
            Some(Value::Array(items)) => items,
            Some(other) => return Err(StoreError::type_mismatch(key, "list", ValueKind::of(&other))),
        };
        let item = items.pop().ok_or_else(|| StoreError::empty_list(key))?;
        self.write_global(key, &Value::Array(items))?;
        Ok(item)
    }

    /// Set `field` of the map stored under `storage_key`.
    ///
    /// A missing key starts a new map. The map is written back under
    /// `storage_key`.
    pub fn add_to_object(&self, storage_key: &str, field: &str, value: Value) -> StoreResult<()> {
        self.require_init()?;
        let mut object = match self.read_global(storage_key)? {
            None => Map::new(),
            Some(Value::Object(object)) => object,
            Some(other) => {
                return Err(StoreError::type_mismatch(
                    storage_key,
                    "map",
                    ValueKind::of(&other),
                ))
            }
        };
        object.insert(field.to_string(), value);
        self.write_global(storage_key, &Value::Object(object))
    }
}
