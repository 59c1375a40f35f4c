//! Callable shapes: what an invocable takes and whether it produces a value.
//!
//! A shape is either [`ShapeKind::Producing`] (the last slot is the output) or
//! [`ShapeKind::NonProducing`] (every slot is an input). Static shapes come from Rust
//! function-pointer types through the [`Signature`] trait:
//!
//! ```rust
//! use sigeval::{CallableShape, Signature, ValueType};
//!
//! let shape = <fn(i64, String) -> bool>::shape();
//! assert_eq!(shape, CallableShape::producing(vec![ValueType::Number, ValueType::String], ValueType::Bool));
//!
//! let shape = <fn(i64)>::shape();
//! assert!(!shape.is_producing());
//! ```
use std::fmt::{self, Display, Formatter};

use itertools::Itertools;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::{Error, ReturnSlot, Typed, ValueType};

pub type Slots = SmallVec<[ValueType; 4]>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShapeKind {
    Producing,
    NonProducing,
}

/// Ordered type slots plus the producing/non-producing discriminator.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CallableShape {
    kind: ShapeKind,
    slots: Slots,
}

impl CallableShape {
    /// Builds a shape from raw slots. For a producing shape the last slot is the output.
    #[allow(clippy::result_large_err)]
    pub fn new(kind: ShapeKind, slots: impl IntoIterator<Item = ValueType>) -> Result<Self, Error> {
        let slots: Slots = slots.into_iter().collect();

        if kind == ShapeKind::Producing && slots.is_empty() {
            return Err(Error::UnsupportedShape(
                "a producing shape needs at least an output slot".to_string(),
            ));
        }

        Ok(Self { kind, slots })
    }

    pub fn producing(inputs: impl IntoIterator<Item = ValueType>, output: ValueType) -> Self {
        let mut slots: Slots = inputs.into_iter().collect();
        slots.push(output);
        Self {
            kind: ShapeKind::Producing,
            slots,
        }
    }

    pub fn non_producing(inputs: impl IntoIterator<Item = ValueType>) -> Self {
        Self {
            kind: ShapeKind::NonProducing,
            slots: inputs.into_iter().collect(),
        }
    }

    pub fn kind(&self) -> ShapeKind {
        self.kind
    }

    pub fn is_producing(&self) -> bool {
        self.kind == ShapeKind::Producing
    }

    pub fn slots(&self) -> &[ValueType] {
        &self.slots
    }

    /// Splits the slots into inputs and the optional output.
    ///
    /// Fails with [`Error::UnsupportedShape`] for a producing shape without slots, which can
    /// only be reached through deserialization.
    #[allow(clippy::result_large_err)]
    pub fn decompose(&self) -> Result<(&[ValueType], Option<&ValueType>), Error> {
        match self.kind {
            ShapeKind::NonProducing => Ok((self.slots.as_slice(), None)),
            ShapeKind::Producing => match self.slots.split_last() {
                Some((output, inputs)) => Ok((inputs, Some(output))),
                None => Err(Error::UnsupportedShape(
                    "a producing shape needs at least an output slot".to_string(),
                )),
            },
        }
    }

    pub fn input_count(&self) -> usize {
        match self.kind {
            ShapeKind::NonProducing => self.slots.len(),
            ShapeKind::Producing => self.slots.len().saturating_sub(1),
        }
    }
}

impl Display for CallableShape {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self.decompose() {
            Ok((inputs, output)) => {
                write!(f, "fn({})", inputs.iter().join(", "))?;
                if let Some(output) = output {
                    write!(f, " -> {}", output)?;
                }
                Ok(())
            }
            Err(_) => write!(f, "<unsupported shape>"),
        }
    }
}

/// Static callable shape of a Rust function-pointer type.
pub trait Signature: 'static {
    type Output: ReturnSlot;

    fn shape() -> CallableShape;
}

macro_rules! signature {
    ($($arg:ident),*) => {
        impl<$($arg: Typed + 'static,)* R: ReturnSlot + 'static> Signature for fn($($arg),*) -> R {
            type Output = R;

            fn shape() -> CallableShape {
                let inputs: Vec<ValueType> = vec![$($arg::value_type()),*];
                match R::return_type() {
                    Some(output) => CallableShape::producing(inputs, output),
                    None => CallableShape::non_producing(inputs),
                }
            }
        }
    };
}

signature!();
signature!(A);
signature!(A, B);
signature!(A, B, C);
signature!(A, B, C, D);
signature!(A, B, C, D, E);
signature!(A, B, C, D, E, G);
