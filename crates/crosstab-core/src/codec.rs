//! Codec adapter
//!
//! Every facade operation passes through a [`ValueCodec`] so callers only ever
//! see structured values. The codec is an explicit component rather than a
//! behaviour patched onto the raw store, which keeps the raw store usable by
//! code that expects plain strings.
//!
//! Contract:
//! - `encode` never fails. Input that cannot be represented falls back to the
//!   encoded null ([`ENCODED_NULL`]).
//! - `decode` fails with [`CodecError`] on anything `encode` could not have
//!   produced.
//! - `decode(encode(v)) == v` for every representable `v`.

use crate::value::Value;
use serde::Serialize;
use std::fmt;

/// Encoded form of `null`, also the fallback for unrepresentable input.
pub const ENCODED_NULL: &str = "null";

/// Decode failure for a stored string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("malformed stored value at line {line}, column {column}: {message}")]
pub struct CodecError {
    /// Parser message
    pub message: String,
    /// 1-based line of the failure
    pub line: usize,
    /// 1-based column of the failure
    pub column: usize,
}

impl From<serde_json::Error> for CodecError {
    fn from(err: serde_json::Error) -> Self {
        Self {
            message: err.to_string(),
            line: err.line(),
            column: err.column(),
        }
    }
}

/// Converts structured values to and from their stored string form.
pub trait ValueCodec: Send + Sync + fmt::Debug {
    /// Encode a value. Never fails.
    fn encode(&self, value: &Value) -> String;

    /// Decode a stored string.
    fn decode(&self, raw: &str) -> Result<Value, CodecError>;

    /// Decode a possibly-absent stored string; absence stays absent.
    fn decode_optional(&self, raw: Option<&str>) -> Result<Option<Value>, CodecError> {
        raw.map(|r| self.decode(r)).transpose()
    }
}

/// JSON codec, the default and the format used by persisted snapshots.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl JsonCodec {
    /// Encode any serializable value.
    ///
    /// Serialization failures (for example maps with non-string keys) are
    /// logged and encoded as null.
    pub fn encode_serializable<T: Serialize + ?Sized>(&self, value: &T) -> String {
        match serde_json::to_string(value) {
            Ok(encoded) => encoded,
            Err(err) => {
                tracing::warn!(error = %err, "value is not representable, storing null");
                ENCODED_NULL.to_string()
            }
        }
    }
}

impl ValueCodec for JsonCodec {
    fn encode(&self, value: &Value) -> String {
        self.encode_serializable(value)
    }

    fn decode(&self, raw: &str) -> Result<Value, CodecError> {
        Ok(serde_json::from_str(raw)?)
    }
}
