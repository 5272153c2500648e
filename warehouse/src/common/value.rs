use std::cmp::Ordering;
use std::fmt::{Debug, Display, Formatter};

/// Compare two floats for equality with proper NaN handling.
#[inline]
fn num_eq_float(a: f64, b: f64) -> bool {
    if a.is_nan() && b.is_nan() {
        true
    } else {
        a == b
    }
}

/// Compare two floats with NaN treated as greater than all other values.
#[inline]
fn num_cmp_float(a: f64, b: f64) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
    }
}

/// Represents a scalar value stored in a document field.
///
/// # Purpose
/// Provides a unified representation for every value a stored record carries:
/// user metadata scalars (string, integer, float, boolean), the generated
/// system fields, and the binary message payload.
///
/// # Variants
/// - `Null`: Absence of a value
/// - `Bool(bool)`: Boolean true/false
/// - `I64(i64)`: Integer value
/// - `F64(f64)`: Floating point value
/// - `String(String)`: Text value
/// - `Bytes(Vec<u8>)`: Binary data (payloads; not comparable for ordering)
///
/// # Characteristics
/// - **Comparable**: `compare` yields a total order within numeric and string
///   families; integers and floats compare cross-type
/// - **Serializable**: Can be serialized/deserialized with serde when the
///   `serde` feature is enabled
/// - **Default**: Defaults to `Null`
#[derive(Clone, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Value {
    /// Represents a null value.
    #[default]
    Null,
    /// Represents a boolean value.
    Bool(bool),
    /// Represents a signed 64-bit integer value.
    I64(i64),
    /// Represents a 64-bit floating point value.
    F64(f64),
    /// Represents a string value.
    String(String),
    /// Represents a byte array value. Used for binary payloads; it cannot be
    /// ordered or indexed.
    Bytes(Vec<u8>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn is_number(&self) -> bool {
        matches!(self, Value::I64(_) | Value::F64(_))
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::I64(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::F64(f) => Some(*f),
            Value::I64(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Bytes(b) => Some(b.as_slice()),
            _ => None,
        }
    }

    /// Compares two values, returning `None` when they belong to different
    /// incomparable families (e.g. a string against a number, or bytes
    /// against anything).
    ///
    /// Integers and floats compare cross-type through `f64` widening, the way
    /// a document store compares numeric fields regardless of their stored
    /// width. Widening is lossy above 2^53: an integer beyond the `f64`
    /// mantissa rounds to the nearest representable float, so it can compare
    /// (and test equal) against a float it does not exactly match.
    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Null, Value::Null) => Some(Ordering::Equal),
            (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
            (Value::I64(a), Value::I64(b)) => Some(a.cmp(b)),
            (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
            (a, b) if a.is_number() && b.is_number() => {
                // both as_f64 are Some for numeric values
                let a = a.as_f64()?;
                let b = b.as_f64()?;
                Some(num_cmp_float(a, b))
            }
            _ => None,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::I64(a), Value::I64(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Bytes(a), Value::Bytes(b)) => a == b,
            (a, b) if a.is_number() && b.is_number() => {
                match (a.as_f64(), b.as_f64()) {
                    (Some(a), Some(b)) => num_eq_float(a, b),
                    _ => false,
                }
            }
            _ => false,
        }
    }
}

impl Debug for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Null => write!(f, "Null"),
            Value::Bool(b) => write!(f, "Bool({})", b),
            Value::I64(i) => write!(f, "I64({})", i),
            Value::F64(v) => write!(f, "F64({})", v),
            Value::String(s) => write!(f, "String({:?})", s),
            Value::Bytes(b) => write!(f, "Bytes(len={})", b.len()),
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::I64(i) => write!(f, "{}", i),
            Value::F64(v) => write!(f, "{}", v),
            Value::String(s) => write!(f, "{:?}", s),
            Value::Bytes(b) => write!(f, "<{} bytes>", b.len()),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::I64(i as i64)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::I64(i)
    }
}

impl From<u32> for Value {
    fn from(i: u32) -> Self {
        Value::I64(i as i64)
    }
}

impl From<f32> for Value {
    fn from(f: f32) -> Self {
        Value::F64(f as f64)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::F64(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<Vec<u8>> for Value {
    fn from(b: Vec<u8>) -> Self {
        Value::Bytes(b)
    }
}
