//! In-memory view of a decoded queue value

use crosstab_core::{StoreError, StoreResult, Value, ValueKind};
use serde_json::Map;

const QUEUE_SHAPE: &str = "map of method lists";
const BUCKET_SHAPE: &str = "list";

/// Decoded queue: method name to ordered item list.
///
/// Owns the structural checks so a malformed stored queue is reported as a
/// type mismatch instead of being silently reshaped.
#[derive(Debug, Clone, PartialEq)]
pub struct QueueMap {
    key: String,
    buckets: Map<String, Value>,
}

impl QueueMap {
    /// Wrap a stored queue value. A missing value is an empty queue.
    pub fn from_stored(key: &str, stored: Option<Value>) -> StoreResult<Self> {
        let buckets = match stored {
            None => Map::new(),
            Some(Value::Object(buckets)) => buckets,
            Some(other) => {
                return Err(StoreError::type_mismatch(
                    key,
                    QUEUE_SHAPE,
                    ValueKind::of(&other),
                ))
            }
        };
        Ok(Self {
            key: key.to_string(),
            buckets,
        })
    }

    /// Items of `method`, empty if the bucket does not exist.
    pub fn items(&self, method: &str) -> StoreResult<&[Value]> {
        match self.buckets.get(method) {
            None => Ok(&[][..]),
            Some(Value::Array(items)) => Ok(items),
            Some(other) => Err(self.bucket_mismatch(other)),
        }
    }

    /// Append to `method`, creating the bucket. Returns the new length.
    pub fn push_back(&mut self, method: &str, item: Value) -> StoreResult<usize> {
        let bucket = self
            .buckets
            .entry(method.to_string())
            .or_insert_with(|| Value::Array(Vec::new()));
        match bucket {
            Value::Array(items) => {
                items.push(item);
                Ok(items.len())
            }
            other => {
                let found = ValueKind::of(other);
                Err(StoreError::type_mismatch(&self.key, BUCKET_SHAPE, found))
            }
        }
    }

    /// Remove the head of `method`. `None` if the bucket is absent or empty.
    pub fn pop_front(&mut self, method: &str) -> StoreResult<Option<Value>> {
        match self.buckets.get_mut(method) {
            None => Ok(None),
            Some(Value::Array(items)) if items.is_empty() => Ok(None),
            Some(Value::Array(items)) => Ok(Some(items.remove(0))),
            Some(other) => {
                let found = ValueKind::of(other);
                Err(StoreError::type_mismatch(&self.key, BUCKET_SHAPE, found))
            }
        }
    }

    /// Names of all buckets.
    pub fn methods(&self) -> Vec<String> {
        self.buckets.keys().cloned().collect()
    }

    /// Convert back to the stored representation.
    pub fn into_value(self) -> Value {
        Value::Object(self.buckets)
    }

    fn bucket_mismatch(&self, bucket: &Value) -> StoreError {
        StoreError::type_mismatch(&self.key, BUCKET_SHAPE, ValueKind::of(bucket))
    }
}
