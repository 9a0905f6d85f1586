//! Host value coercion
//!
//! Folds host-native values into the model's four value shapes. The
//! conversion never fails: anything without a direct counterpart is kept
//! as its textual form.

use node_graph::ParamValue;

use crate::host::HostValue;

/// Convert a host value into a model parameter value
pub fn coerce(value: HostValue) -> ParamValue {
    match value {
        HostValue::Float(f) => ParamValue::Number(f),
        HostValue::Int(i) => ParamValue::Number(i as f64),
        HostValue::Bool(b) => ParamValue::Boolean(b),
        HostValue::String(s) => ParamValue::Text(s),
        HostValue::FloatTuple(values) => ParamValue::Tuple(values),
        HostValue::IntTuple(values) => {
            ParamValue::Tuple(values.into_iter().map(|v| v as f64).collect())
        }
        HostValue::Json(json) => ParamValue::from_json(&json),
    }
}
