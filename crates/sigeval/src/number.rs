use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Largest magnitude up to which every integer is exactly representable as `f64`.
const MAX_EXACT_INT: f64 = 9_007_199_254_740_992.0;

/// Numeric value carried across the engine boundary.
///
/// Host integers and floats both travel as `f64`. `Display` output parses back to the same
/// `f64`, so a number rendered into source text keeps its value.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Number(f64);

impl Number {
    pub fn new(value: f64) -> Self {
        Number(value)
    }

    pub fn value(&self) -> f64 {
        self.0
    }

    pub fn is_int(&self) -> bool {
        self.0.is_finite() && self.0.fract() == 0.0
    }

    /// The value as `i64` when it is an integer in the exactly representable range.
    pub fn to_i64(&self) -> Option<i64> {
        (self.is_int() && self.0.abs() <= MAX_EXACT_INT).then_some(self.0 as i64)
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0.0
    }
}

macro_rules! number_from {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for Number {
                fn from(value: $ty) -> Self {
                    Number(value as f64)
                }
            }
        )*
    };
}

number_from!(i32, i64, u32, u64, usize, f64);

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_i64() {
            Some(n) => write!(f, "{}", n),
            None => write!(f, "{}", self.0),
        }
    }
}

impl PartialOrd for Number {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Eq for Number {}

/// Total order with every NaN after all other values.
impl Ord for Number {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.0.is_nan(), other.0.is_nan()) {
            (true, true) => Ordering::Equal,
            (true, false) => Ordering::Greater,
            (false, true) => Ordering::Less,
            (false, false) => self.0.partial_cmp(&other.0).unwrap_or(Ordering::Equal),
        }
    }
}
