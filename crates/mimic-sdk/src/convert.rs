//! Conversions between Rust types and [`Value`]
//!
//! Implement `FromValue` to receive a type as a mock argument and
//! `IntoValue` to return it from a mock body.

use crate::error::{MockError, MockResult};
use crate::value::Value;

/// Convert from a `Value` argument
pub trait FromValue: Sized {
    /// Convert, returning a type mismatch if the value has the wrong shape
    fn from_value(value: &Value) -> MockResult<Self>;
}

/// Convert into a `Value` result
pub trait IntoValue {
    /// Convert to a `Value`
    fn into_value(self) -> Value;
}

fn mismatch(expected: &str, value: &Value) -> MockError {
    MockError::TypeMismatch {
        expected: expected.to_string(),
        got: value.type_name().to_string(),
    }
}

macro_rules! primitive_conversions {
    ($($ty:ty => $name:literal, $extract:ident, $variant:ident;)*) => {
        $(
            impl FromValue for $ty {
                fn from_value(value: &Value) -> MockResult<Self> {
                    value.$extract().ok_or_else(|| mismatch($name, value))
                }
            }

            impl IntoValue for $ty {
                fn into_value(self) -> Value {
                    Value::$variant(self)
                }
            }
        )*
    };
}

primitive_conversions! {
    bool => "boolean", as_bool, Bool;
    char => "char", as_char, Char;
    i32 => "int", as_i32, Int;
    i64 => "long", as_i64, Long;
    f64 => "double", as_f64, Double;
}

impl FromValue for String {
    fn from_value(value: &Value) -> MockResult<Self> {
        value
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| mismatch("string", value))
    }
}

impl IntoValue for String {
    fn into_value(self) -> Value {
        Value::string(self)
    }
}

impl IntoValue for &str {
    fn into_value(self) -> Value {
        Value::string(self)
    }
}

impl FromValue for Value {
    fn from_value(value: &Value) -> MockResult<Self> {
        Ok(value.clone())
    }
}

impl IntoValue for Value {
    fn into_value(self) -> Value {
        self
    }
}

// Unit (for mock methods that return void)
impl IntoValue for () {
    fn into_value(self) -> Value {
        Value::Null
    }
}

impl<T: IntoValue> IntoValue for Option<T> {
    fn into_value(self) -> Value {
        self.map_or(Value::Null, IntoValue::into_value)
    }
}

/// Convert the argument at `index`, failing with an argument-count error when absent
pub fn arg<T: FromValue>(args: &[Value], index: usize) -> MockResult<T> {
    let value = args.get(index).ok_or(MockError::ArgumentCount {
        expected: index + 1,
        got: args.len(),
    })?;
    T::from_value(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primitive_conversions() {
        assert_eq!(i32::from_value(&Value::Int(42)).unwrap(), 42);
        assert_eq!(i64::from_value(&Value::Int(42)).unwrap(), 42);
        assert!(bool::from_value(&Value::Int(1)).is_err());
        assert_eq!(7i32.into_value(), Value::Int(7));
        assert!(().into_value().is_null());
    }

    #[test]
    fn test_string_conversions() {
        let v = "hi".into_value();
        assert_eq!(String::from_value(&v).unwrap(), "hi");
        let err = String::from_value(&Value::Bool(true)).unwrap_err();
        assert_eq!(err.to_string(), "Type mismatch: expected string, got boolean");
    }

    #[test]
    fn test_arg_helper() {
        let args = [Value::string("a"), Value::Int(2)];
        assert_eq!(arg::<i32>(&args, 1).unwrap(), 2);
        assert!(matches!(
            arg::<i32>(&args, 5),
            Err(MockError::ArgumentCount { expected: 6, got: 2 })
        ));
        assert_eq!(Some(3i32).into_value(), Value::Int(3));
        assert_eq!(None::<i32>.into_value(), Value::Null);
    }
}
