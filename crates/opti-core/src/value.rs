//! Typed parameter values.
//!
//! A parameter value is one of four scalar kinds. A declared
//! [`ParameterType`] constrains which values a parameter accepts; the only
//! implicit conversion is the one-way INT -> DOUBLE promotion. Ranges are
//! pairs of optional bounds of the same declared type.

use core::cmp::Ordering;
use core::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{ValueError, ValueResult};

/// Declared type of a parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ParameterType {
    #[serde(rename = "BOOL")]
    Bool,
    #[serde(rename = "INT")]
    Int,
    #[serde(rename = "DOUBLE")]
    Double,
    #[serde(rename = "STRING")]
    String,
}

impl fmt::Display for ParameterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ParameterType::Bool => "BOOL",
            ParameterType::Int => "INT",
            ParameterType::Double => "DOUBLE",
            ParameterType::String => "STRING",
        };
        write!(f, "{}", name)
    }
}

/// A scalar parameter value. Serializes as a bare JSON scalar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Double(f64),
    Str(String),
}

impl Value {
    /// The natural type of this value.
    pub fn kind(&self) -> ParameterType {
        match self {
            Value::Bool(_) => ParameterType::Bool,
            Value::Int(_) => ParameterType::Int,
            Value::Double(_) => ParameterType::Double,
            Value::Str(_) => ParameterType::String,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(v) => write!(f, "{}", v),
            Value::Int(v) => write!(f, "{}", v),
            Value::Double(v) => write!(f, "{}", v),
            Value::Str(v) => write!(f, "{}", v),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Double(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}

/// An optional pair of bounds of the same declared type.
///
/// An absent bound leaves that side unbounded. When both bounds are present
/// the lower bound is less than or equal to the upper bound.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ValueRange {
    pub lower: Option<Value>,
    pub upper: Option<Value>,
}

impl ValueRange {
    pub fn new(lower: Option<Value>, upper: Option<Value>) -> Self {
        Self { lower, upper }
    }
}

impl fmt::Display for ValueRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn bound(b: &Option<Value>) -> String {
            match b {
                Some(v) => v.to_string(),
                None => "..".to_string(),
            }
        }
        write!(f, "[{}, {}]", bound(&self.lower), bound(&self.upper))
    }
}

/// Whether `value` may be stored under the declared `ty`.
///
/// An absent value is compatible with any type; otherwise the value's
/// natural type must equal `ty`, or `ty` is DOUBLE and the value is an INT
/// (one-way promotion, never the reverse).
pub fn is_compatible_with(ty: ParameterType, value: Option<&Value>) -> bool {
    match value {
        None => true,
        Some(v) => {
            let natural = v.kind();
            natural == ty || (ty == ParameterType::Double && natural == ParameterType::Int)
        }
    }
}

/// Convert `value` to the declared `ty`.
///
/// Fails with [`ValueError::TypeMismatch`] on incompatibility. An INT
/// converted to DOUBLE yields the equal-valued double; everything else is
/// returned unchanged.
pub fn convert_to(ty: ParameterType, value: Option<Value>) -> ValueResult<Option<Value>> {
    let value = match value {
        None => return Ok(None),
        Some(v) => v,
    };

    if !is_compatible_with(ty, Some(&value)) {
        return Err(ValueError::TypeMismatch {
            expected: ty,
            value,
        });
    }

    Ok(Some(match value {
        Value::Int(v) if ty == ParameterType::Double => Value::Double(v as f64),
        other => other,
    }))
}

/// Compare two values of the same declared type.
///
/// Both operands are expected to already be converted to the declared type;
/// INT/DOUBLE pairs are still compared numerically so that a promotion
/// missed by a caller cannot invert an ordering.
pub fn compare(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        (Value::Int(x), Value::Int(y)) => Some(x.cmp(y)),
        (Value::Double(x), Value::Double(y)) => Some(x.total_cmp(y)),
        (Value::Int(x), Value::Double(y)) => Some((*x as f64).total_cmp(y)),
        (Value::Double(x), Value::Int(y)) => Some(x.total_cmp(&(*y as f64))),
        (Value::Str(x), Value::Str(y)) => Some(x.cmp(y)),
        _ => None,
    }
}

/// Validate and normalize a range against the declared `ty`.
///
/// Both bounds are independently converted; when both are present the lower
/// bound must not exceed the upper bound.
pub fn check_range(ty: ParameterType, range: Option<ValueRange>) -> ValueResult<Option<ValueRange>> {
    let range = match range {
        None => return Ok(None),
        Some(r) => r,
    };

    let lower = convert_to(ty, range.lower)?;
    let upper = convert_to(ty, range.upper)?;

    if let (Some(lo), Some(hi)) = (&lower, &upper) {
        if compare(lo, hi) == Some(Ordering::Greater) {
            return Err(ValueError::InvalidRange {
                lower: lo.clone(),
                upper: hi.clone(),
            });
        }
    }

    Ok(Some(ValueRange { lower, upper }))
}

/// Whether `value` satisfies `range`.
///
/// An absent range or absent value enforces nothing; a `None` bound leaves
/// that side unbounded.
pub fn is_in_range(range: Option<&ValueRange>, value: Option<&Value>) -> bool {
    let (range, value) = match (range, value) {
        (Some(r), Some(v)) => (r, v),
        _ => return true,
    };

    if let Some(lo) = &range.lower {
        if compare(lo, value) == Some(Ordering::Greater) {
            return false;
        }
    }

    if let Some(hi) = &range.upper {
        if compare(hi, value) == Some(Ordering::Less) {
            return false;
        }
    }

    true
}
