use std::collections::BTreeMap;
use std::fmt::{self, Display, Formatter};

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

use crate::{Error, Number, Value};

/// Type handle for a parameter or return slot.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueType {
    Any,
    None,
    Bool,
    Number,
    String,
    Array(Box<ValueType>),
    Dict(Box<ValueType>),
    Optional(Box<ValueType>),
    /// Host-defined record type; its values travel as dicts.
    Named(SmolStr),
}

impl ValueType {
    pub fn array(elem: ValueType) -> Self {
        ValueType::Array(Box::new(elem))
    }

    pub fn dict(value: ValueType) -> Self {
        ValueType::Dict(Box::new(value))
    }

    pub fn optional(inner: ValueType) -> Self {
        ValueType::Optional(Box::new(inner))
    }

    pub fn named(name: &str) -> Self {
        ValueType::Named(SmolStr::new(name))
    }

    /// Returns `true` if `value` can be bound to a slot of this type.
    pub fn accepts(&self, value: &Value) -> bool {
        match (self, value) {
            (ValueType::Any, _) => true,
            (ValueType::None, Value::None) => true,
            (ValueType::Bool, Value::Bool(_)) => true,
            (ValueType::Number, Value::Number(_)) => true,
            (ValueType::String, Value::String(_)) => true,
            (ValueType::Array(elem), Value::Array(values)) => values.iter().all(|v| elem.accepts(v)),
            (ValueType::Dict(elem), Value::Dict(values)) => values.values().all(|v| elem.accepts(v)),
            (ValueType::Optional(_), Value::None) => true,
            (ValueType::Optional(inner), value) => inner.accepts(value),
            (ValueType::Named(_), Value::Dict(_)) => true,
            _ => false,
        }
    }
}

impl Display for ValueType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ValueType::Any => write!(f, "any"),
            ValueType::None => write!(f, "none"),
            ValueType::Bool => write!(f, "bool"),
            ValueType::Number => write!(f, "number"),
            ValueType::String => write!(f, "string"),
            ValueType::Array(elem) => write!(f, "array<{}>", elem),
            ValueType::Dict(value) => write!(f, "dict<{}>", value),
            ValueType::Optional(inner) => write!(f, "{}?", inner),
            ValueType::Named(name) => write!(f, "{}", name),
        }
    }
}

/// A Rust type that can occupy a parameter or return slot.
pub trait Typed: Sized {
    fn value_type() -> ValueType;

    fn into_value(self) -> Value;

    #[allow(clippy::result_large_err)]
    fn from_value(value: Value) -> Result<Self, Error>;
}

/// The output position of a callable: `()` for "no output", any [`Typed`] type otherwise.
pub trait ReturnSlot: Sized {
    fn return_type() -> Option<ValueType>;

    #[allow(clippy::result_large_err)]
    fn from_return(value: Value) -> Result<Self, Error>;
}

impl ReturnSlot for () {
    fn return_type() -> Option<ValueType> {
        None
    }

    fn from_return(_: Value) -> Result<Self, Error> {
        Ok(())
    }
}

fn mismatch(expected: ValueType, value: &Value) -> Error {
    Error::ResultType {
        expected,
        actual: value.type_name().to_string(),
    }
}

impl Typed for Value {
    fn value_type() -> ValueType {
        ValueType::Any
    }

    fn into_value(self) -> Value {
        self
    }

    fn from_value(value: Value) -> Result<Self, Error> {
        Ok(value)
    }
}

impl Typed for bool {
    fn value_type() -> ValueType {
        ValueType::Bool
    }

    fn into_value(self) -> Value {
        Value::Bool(self)
    }

    fn from_value(value: Value) -> Result<Self, Error> {
        match value {
            Value::Bool(b) => Ok(b),
            other => Err(mismatch(Self::value_type(), &other)),
        }
    }
}

impl Typed for String {
    fn value_type() -> ValueType {
        ValueType::String
    }

    fn into_value(self) -> Value {
        Value::String(self)
    }

    fn from_value(value: Value) -> Result<Self, Error> {
        match value {
            Value::String(s) => Ok(s),
            other => Err(mismatch(Self::value_type(), &other)),
        }
    }
}

impl Typed for Number {
    fn value_type() -> ValueType {
        ValueType::Number
    }

    fn into_value(self) -> Value {
        Value::Number(self)
    }

    fn from_value(value: Value) -> Result<Self, Error> {
        match value {
            Value::Number(n) => Ok(n),
            other => Err(mismatch(Self::value_type(), &other)),
        }
    }
}

impl Typed for f64 {
    fn value_type() -> ValueType {
        ValueType::Number
    }

    fn into_value(self) -> Value {
        Value::Number(self.into())
    }

    fn from_value(value: Value) -> Result<Self, Error> {
        Number::from_value(value).map(|n| n.value())
    }
}

macro_rules! typed_int {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Typed for $ty {
                fn value_type() -> ValueType {
                    ValueType::Number
                }

                fn into_value(self) -> Value {
                    Value::Number(self.into())
                }

                fn from_value(value: Value) -> Result<Self, Error> {
                    match value {
                        Value::Number(n) => n
                            .to_i64()
                            .and_then(|i| <$ty>::try_from(i).ok())
                            .ok_or_else(|| mismatch(Self::value_type(), &Value::Number(n))),
                        other => Err(mismatch(Self::value_type(), &other)),
                    }
                }
            }
        )*
    };
}

typed_int!(i32, i64, u32, u64, usize);

impl<T: Typed> Typed for Vec<T> {
    fn value_type() -> ValueType {
        ValueType::array(T::value_type())
    }

    fn into_value(self) -> Value {
        Value::Array(self.into_iter().map(Typed::into_value).collect())
    }

    fn from_value(value: Value) -> Result<Self, Error> {
        match value {
            Value::Array(values) => values.into_iter().map(T::from_value).collect(),
            other => Err(mismatch(Self::value_type(), &other)),
        }
    }
}

impl<T: Typed> Typed for Option<T> {
    fn value_type() -> ValueType {
        ValueType::optional(T::value_type())
    }

    fn into_value(self) -> Value {
        self.map(Typed::into_value).unwrap_or(Value::None)
    }

    fn from_value(value: Value) -> Result<Self, Error> {
        match value {
            Value::None => Ok(None),
            value => T::from_value(value).map(Some),
        }
    }
}

impl<T: Typed> Typed for BTreeMap<String, T> {
    fn value_type() -> ValueType {
        ValueType::dict(T::value_type())
    }

    fn into_value(self) -> Value {
        Value::Dict(self.into_iter().map(|(k, v)| (k, v.into_value())).collect())
    }

    fn from_value(value: Value) -> Result<Self, Error> {
        match value {
            Value::Dict(values) => values
                .into_iter()
                .map(|(k, v)| T::from_value(v).map(|v| (k, v)))
                .collect(),
            other => Err(mismatch(Self::value_type(), &other)),
        }
    }
}

macro_rules! typed_return {
    ($($ty:ty),* $(,)?) => {
        $(
            impl ReturnSlot for $ty {
                fn return_type() -> Option<ValueType> {
                    Some(<$ty as Typed>::value_type())
                }

                fn from_return(value: Value) -> Result<Self, Error> {
                    <$ty as Typed>::from_value(value)
                }
            }
        )*
    };
}

typed_return!(Value, bool, String, Number, f64, i32, i64, u32, u64, usize);

impl<T: Typed> ReturnSlot for Vec<T> {
    fn return_type() -> Option<ValueType> {
        Some(Self::value_type())
    }

    fn from_return(value: Value) -> Result<Self, Error> {
        Self::from_value(value)
    }
}

impl<T: Typed> ReturnSlot for Option<T> {
    fn return_type() -> Option<ValueType> {
        Some(Self::value_type())
    }

    fn from_return(value: Value) -> Result<Self, Error> {
        Self::from_value(value)
    }
}

impl<T: Typed> ReturnSlot for BTreeMap<String, T> {
    fn return_type() -> Option<ValueType> {
        Some(Self::value_type())
    }

    fn from_return(value: Value) -> Result<Self, Error> {
        Self::from_value(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::any(ValueType::Any, "any")]
    #[case::array(ValueType::array(ValueType::Number), "array<number>")]
    #[case::optional(ValueType::optional(ValueType::String), "string?")]
    #[case::dict(ValueType::dict(ValueType::Bool), "dict<bool>")]
    #[case::named(ValueType::named("Customer"), "Customer")]
    fn test_display(#[case] ty: ValueType, #[case] expected: &str) {
        assert_eq!(ty.to_string(), expected);
    }

    #[rstest]
    #[case(ValueType::Number, Value::from(1), true)]
    #[case(ValueType::Number, Value::from("1"), false)]
    #[case(ValueType::optional(ValueType::Number), Value::None, true)]
    #[case(ValueType::array(ValueType::String), Value::Array(vec![Value::from("a")]), true)]
    #[case(ValueType::array(ValueType::String), Value::Array(vec![Value::from(1)]), false)]
    #[case(ValueType::named("Customer"), Value::Dict(Default::default()), true)]
    #[case(ValueType::Any, Value::None, true)]
    fn test_accepts(#[case] ty: ValueType, #[case] value: Value, #[case] expected: bool) {
        assert_eq!(ty.accepts(&value), expected);
    }

    #[rstest]
    #[case::fractional(1.5)]
    #[case::beyond_i64(1e20)]
    #[case::infinite(f64::INFINITY)]
    fn test_int_from_inexact_number_is_rejected(#[case] input: f64) {
        let err = i64::from_value(Value::from(input)).unwrap_err();
        assert!(matches!(err, Error::ResultType { expected: ValueType::Number, .. }));
    }

    #[test]
    fn test_unsigned_from_negative_number_is_rejected() {
        assert!(u32::from_value(Value::from(-1)).is_err());
        assert_eq!(u32::from_value(Value::from(7)).unwrap(), 7);
    }

    #[test]
    fn test_option_from_none() {
        assert_eq!(Option::<String>::from_value(Value::None).unwrap(), None);
        assert_eq!(
            Option::<String>::from_value(Value::from("x")).unwrap(),
            Some("x".to_string())
        );
    }

    #[test]
    fn test_vec_value_type_and_conversion() {
        assert_eq!(Vec::<i64>::value_type(), ValueType::array(ValueType::Number));
        let value = vec![1i64, 2].into_value();
        assert_eq!(Vec::<i64>::from_value(value).unwrap(), vec![1, 2]);
    }

    #[test]
    fn test_unit_has_no_return_type() {
        assert_eq!(<() as ReturnSlot>::return_type(), None);
        assert_eq!(<bool as ReturnSlot>::return_type(), Some(ValueType::Bool));
    }
}
