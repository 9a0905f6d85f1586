//! Parameter values
//!
//! Every parameter value in the model is one of four shapes. Anything else a
//! caller or host hands us is folded into [`ParamValue::Text`] so that
//! conversion always succeeds, at the cost of losing structure.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A node parameter value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    /// Numeric value (integers are carried as floats)
    Number(f64),
    /// Toggle value
    Boolean(bool),
    /// String value, also the fallback for unrepresentable values
    Text(String),
    /// Fixed-length numeric tuple (vectors, colors, ranges)
    Tuple(Vec<f64>),
}

impl ParamValue {
    /// Convert an arbitrary JSON value
    ///
    /// Arrays convert to a tuple only when every element is a number; any
    /// other array, object or null becomes its JSON text.
    pub fn from_json(value: &serde_json::Value) -> Self {
        use serde_json::Value;

        match value {
            Value::Bool(b) => Self::Boolean(*b),
            Value::Number(n) => match n.as_f64() {
                Some(f) => Self::Number(f),
                None => Self::Text(n.to_string()),
            },
            Value::String(s) => Self::Text(s.clone()),
            Value::Array(items) => {
                let numbers: Option<Vec<f64>> = items.iter().map(|v| v.as_f64()).collect();
                match numbers {
                    Some(tuple) => Self::Tuple(tuple),
                    None => Self::Text(value.to_string()),
                }
            }
            Value::Null | Value::Object(_) => Self::Text(value.to_string()),
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{}", n),
            Self::Boolean(b) => write!(f, "{}", b),
            Self::Text(s) => write!(f, "{}", s),
            Self::Tuple(values) => {
                write!(f, "[")?;
                for (i, v) in values.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", v)?;
                }
                write!(f, "]")
            }
        }
    }
}

impl From<f64> for ParamValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        Self::Number(value as f64)
    }
}

impl From<i32> for ParamValue {
    fn from(value: i32) -> Self {
        Self::Number(f64::from(value))
    }
}

impl From<bool> for ParamValue {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<Vec<f64>> for ParamValue {
    fn from(value: Vec<f64>) -> Self {
        Self::Tuple(value)
    }
}

impl<const N: usize> From<[f64; N]> for ParamValue {
    fn from(value: [f64; N]) -> Self {
        Self::Tuple(value.to_vec())
    }
}
