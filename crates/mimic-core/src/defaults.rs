//! Default return values for calls that arrive before bootstrap completes

use mimic_sdk::{MockResult, Type, Value};

use crate::descriptor::parse_return_type;

/// Zero value for a type: primitives get their zero, arrays an empty array,
/// everything else (including `void`) null.
pub fn default_value_for_type(ty: &Type) -> Value {
    match ty {
        Type::Primitive(p) => p.zero(),
        Type::Array(_) => Value::empty_array(),
        Type::Void | Type::Class(_) => Value::Null,
    }
}

/// Value answered on the bootstrap short-circuit.
///
/// Never fails: a descriptor whose return type cannot be decoded is answered
/// with null.
pub fn bootstrap_default(descriptor: &str) -> Value {
    default_value_for_descriptor(descriptor).unwrap_or_else(|err| {
        tracing::warn!(%descriptor, error = %err, "undecodable descriptor, returning null");
        Value::Null
    })
}

/// Default value for the return type encoded in `descriptor`.
///
/// Only the descriptor is decoded; no class table is touched.
pub fn default_value_for_descriptor(descriptor: &str) -> MockResult<Value> {
    parse_return_type(descriptor).map(|ret| default_value_for_type(&ret))
}
