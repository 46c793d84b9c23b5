//! A single cell value of a table.
//!
//! Source data is heterogeneous JSON, so a column may hold values of several kinds. [Scalar]
//! provides a total order over all of them, which is used both for grouping and for sorting the
//! axes of a pivot result.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use serde_json::{Number, Value};

/// A value of any kind that may appear in a table cell.
///
/// Floating point values are always finite. Non-finite results of a computation are
/// represented as [Scalar::Null].
#[derive(Clone, Debug)]
pub enum Scalar {
    /// Missing value
    Null,
    /// Boolean
    Bool(bool),
    /// Integer that fits in an [i64]
    Int(i64),
    /// Finite floating point number
    Float(f64),
    /// String
    Str(String),
    /// JSON array or object
    Nested(Value),
}

impl Scalar {
    /// Returns a float Scalar, or [Scalar::Null] if `value` is not finite.
    pub fn float(value: f64) -> Self {
        if value.is_finite() {
            Self::Float(value)
        } else {
            Self::Null
        }
    }

    /// Whether this is the missing value.
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Numeric view of the value. Booleans count as 0 or 1.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            Self::Int(i) => Some(*i as f64),
            Self::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Integer view of the value. Booleans count as 0 or 1.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Bool(b) => Some(i64::from(*b)),
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Convert to a JSON value.
    pub fn to_json(&self) -> Value {
        match self {
            Self::Null => Value::Null,
            Self::Bool(b) => Value::Bool(*b),
            Self::Int(i) => Value::Number((*i).into()),
            Self::Float(f) => Number::from_f64(*f).map_or(Value::Null, Value::Number),
            Self::Str(s) => Value::String(s.clone()),
            Self::Nested(v) => v.clone(),
        }
    }

    /// Position of the value's kind in the cross-kind ordering.
    fn rank(&self) -> u8 {
        match self {
            Self::Null => 0,
            Self::Bool(_) => 1,
            Self::Int(_) | Self::Float(_) => 2,
            Self::Str(_) => 3,
            Self::Nested(_) => 4,
        }
    }
}

impl From<Value> for Scalar {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Bool(b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => Self::Int(i),
                // u64 values beyond i64::MAX degrade to floats.
                None => n.as_f64().map_or(Self::Null, Self::float),
            },
            Value::String(s) => Self::Str(s),
            nested => Self::Nested(nested),
        }
    }
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<i64> for Scalar {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<f64> for Scalar {
    fn from(value: f64) -> Self {
        Self::float(value)
    }
}

impl Ord for Scalar {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Null, Self::Null) => Ordering::Equal,
            (Self::Bool(a), Self::Bool(b)) => a.cmp(b),
            (Self::Int(a), Self::Int(b)) => a.cmp(b),
            (Self::Str(a), Self::Str(b)) => a.cmp(b),
            (Self::Nested(a), Self::Nested(b)) => a.to_string().cmp(&b.to_string()),
            // Floats are finite so partial_cmp always succeeds.
            (Self::Float(a), Self::Float(b)) => a.partial_cmp(b).unwrap_or(Ordering::Equal),
            (Self::Int(a), Self::Float(b)) => cmp_int_float(*a, *b),
            (Self::Float(a), Self::Int(b)) => cmp_int_float(*b, *a).reverse(),
            (a, b) => a.rank().cmp(&b.rank()),
        }
    }
}

/// Exact comparison of an integer with a finite float.
///
/// Converting the integer to a float would round above 2^53 and make equality intransitive.
fn cmp_int_float(i: i64, f: f64) -> Ordering {
    let whole = f.trunc();
    // Float to integer casts saturate, and every i64 lies strictly inside the i128 range.
    match i128::from(i).cmp(&(whole as i128)) {
        Ordering::Equal => 0.0_f64.partial_cmp(&(f - whole)).unwrap_or(Ordering::Equal),
        ordering => ordering,
    }
}

/// The float as an i64 if it is integral and in range.
fn integral_f64(f: f64) -> Option<i64> {
    // -2^63 and 2^63 are exact as floats.
    let in_range = f >= i64::MIN as f64 && f < -(i64::MIN as f64);
    (in_range && f.fract() == 0.0).then_some(f as i64)
}

impl PartialOrd for Scalar {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Scalar {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Scalar {}

impl Hash for Scalar {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.rank().hash(state);
        match self {
            Self::Null => (),
            Self::Bool(b) => b.hash(state),
            // Integers and floats that compare equal must hash equal.
            Self::Int(i) => i.hash(state),
            Self::Float(f) => match integral_f64(*f) {
                Some(i) => i.hash(state),
                None => f.to_bits().hash(state),
            },
            Self::Str(s) => s.hash(state),
            Self::Nested(v) => v.to_string().hash(state),
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Str(s) => write!(f, "{:?}", s),
            other => write!(f, "{}", other.to_json()),
        }
    }
}
