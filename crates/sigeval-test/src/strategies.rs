//! Property-based testing strategies for sigeval.
//!
//! # Examples
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use sigeval_test::strategies::*;
//!
//! proptest! {
//!     #[test]
//!     fn test_something((shape, names) in arb_shape_with_names()) {
//!         // Your test here
//!     }
//! }
//! ```
use proptest::prelude::*;
use sigeval::{CallableShape, Expr, Lambda, SequenceOperation, Value, ValueType};

/// Strategy for generating scalar and nested value types.
pub fn arb_value_type() -> impl Strategy<Value = ValueType> {
    let leaf = prop_oneof![
        Just(ValueType::Any),
        Just(ValueType::Bool),
        Just(ValueType::Number),
        Just(ValueType::String),
        prop::string::string_regex("[A-Z][a-z]{2,6}")
            .unwrap()
            .prop_map(|name| ValueType::named(&name)),
    ];

    leaf.prop_recursive(2, 8, 2, |inner| {
        prop_oneof![
            inner.clone().prop_map(ValueType::array),
            inner.clone().prop_map(ValueType::dict),
            inner.prop_map(ValueType::optional),
        ]
    })
}

/// Strategy for generating supported shapes with up to `max_inputs` inputs.
pub fn arb_shape(max_inputs: usize) -> impl Strategy<Value = CallableShape> {
    (
        prop::collection::vec(arb_value_type(), 0..=max_inputs),
        prop::option::of(arb_value_type()),
    )
        .prop_map(|(inputs, output)| match output {
            Some(output) => CallableShape::producing(inputs, output),
            None => CallableShape::non_producing(inputs),
        })
}

/// Strategy for generating distinct parameter names that never look like placeholders.
pub fn arb_names(max: usize) -> impl Strategy<Value = Vec<String>> {
    prop::collection::hash_set(
        prop::string::string_regex("[a-z][a-z0-9_]{0,7}").unwrap(),
        0..=max,
    )
    .prop_map(|names| names.into_iter().collect())
}

/// Strategy for generating a shape together with a name list that may be shorter or
/// longer than its input count.
pub fn arb_shape_with_names() -> impl Strategy<Value = (CallableShape, Vec<String>)> {
    (arb_shape(6), arb_names(8))
}

/// Strategy for generating sequences of integers.
pub fn arb_int_sequence() -> impl Strategy<Value = Vec<i64>> {
    prop::collection::vec(-100i64..100, 0..20)
}

/// Strategy for generating a threshold predicate such as `x => x > 10`.
///
/// Returns a tuple of (predicate, threshold).
pub fn arb_threshold_predicate() -> impl Strategy<Value = (Lambda, i64)> {
    (-100i64..100).prop_map(|threshold| {
        (
            Lambda::new(&["x"], Expr::ident("x").gt(Expr::number(threshold))),
            threshold,
        )
    })
}

/// Strategy for picking any sequence operation.
pub fn arb_sequence_operation() -> impl Strategy<Value = SequenceOperation> {
    prop::sample::select(SequenceOperation::ALL.to_vec())
}

/// Strategy for generating an optional context object.
pub fn arb_context() -> impl Strategy<Value = Option<Value>> {
    prop::option::of(prop_oneof![
        (-100i64..100).prop_map(Value::from),
        prop::string::string_regex("[a-z]{1,5}")
            .unwrap()
            .prop_map(Value::from),
    ])
}
