//! Property test strategies for structured values

use proptest::prelude::*;

// Re-export proptest for convenience
pub use proptest;

use crosstab_core::Value;

/// Strategy for scalar values.
pub fn arb_scalar() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(Value::from),
        any::<f64>()
            .prop_filter("finite", |f| f.is_finite())
            .prop_map(Value::from),
        "[a-zA-Z0-9 _-]{0,16}".prop_map(Value::String),
    ]
}

/// Strategy for arbitrary nested values.
///
/// # Example
///
/// ```rust
/// use crosstab_testkit::strategies::arb_value;
/// use proptest::prelude::*;
///
/// proptest! {
///     #[test]
///     fn encodes(value in arb_value()) {
///         assert!(!crosstab_core::JsonCodec.encode_serializable(&value).is_empty());
///     }
/// }
/// ```
pub fn arb_value() -> impl Strategy<Value = Value> {
    arb_scalar().prop_recursive(4, 64, 8, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..8).prop_map(Value::Array),
            prop::collection::btree_map("[a-z_]{1,8}", inner, 0..8)
                .prop_map(|m| Value::Object(m.into_iter().collect())),
        ]
    })
}

/// Strategy for store keys.
pub fn arb_key() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9_]{0,11}"
}
