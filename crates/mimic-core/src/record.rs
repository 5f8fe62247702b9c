//! Call records
//!
//! Instrumented call sites hand the bridge a receiver plus a positional
//! argument array. The fixed prefix of that array is decoded once into a
//! [`CallRecord`] with named fields; nothing downstream indexes positionally.
//!
//! Wire layout, version [`CALL_RECORD_LAYOUT_VERSION`]:
//!
//! | slot | field                 | value        |
//! |------|-----------------------|--------------|
//! | 0    | `is_instance_call`    | `Bool`       |
//! | 1    | `target_class_id`     | `Str`        |
//! | 2    | `mock_name`           | `Str`        |
//! | 3    | `mock_descriptor`     | `Str`        |
//! | 4    | `mock_state_index`    | `Int`        |
//! | 5    | `mock_instance_index` | `Int`        |
//! | 6    | `is_startup_mock`     | `Bool`       |
//! | 7..  | real call arguments   | any          |

use std::sync::Arc;

use mimic_sdk::{MockError, MockResult, Value};

/// Version of the positional layout decoded by [`CallRecord::from_wire`]
pub const CALL_RECORD_LAYOUT_VERSION: u32 = 1;

/// Number of fixed slots ahead of the real arguments
pub const FIXED_FIELD_COUNT: usize = 7;

/// One intercepted call
#[derive(Debug, Clone)]
pub struct CallRecord {
    /// Object the intercepted call was made on; Null for static calls
    pub receiver: Value,
    /// Whether the intercepted method is an instance method
    pub is_instance_call: bool,
    /// Mocked class, internal form
    pub target_class_id: Arc<str>,
    /// Mock method name
    pub mock_name: Arc<str>,
    /// Mock method descriptor
    pub mock_descriptor: Arc<str>,
    /// Mock state index, negative when no state is tracked
    pub mock_state_index: i32,
    /// Mock instance index, negative when no instance exists yet
    pub mock_instance_index: i32,
    /// Whether the indexed instance lives in the startup table
    pub is_startup_mock: bool,
    /// Arguments of the intercepted call
    pub arguments: Vec<Value>,
}

impl CallRecord {
    /// Decode a wire array.
    ///
    /// Fails with `InvalidCallRecord` when the array is shorter than the fixed
    /// prefix or a fixed slot holds the wrong kind of value.
    pub fn from_wire(receiver: Value, wire: &[Value]) -> MockResult<Self> {
        if wire.len() < FIXED_FIELD_COUNT {
            return Err(MockError::InvalidCallRecord(format!(
                "expected at least {} fields (layout v{}), got {}",
                FIXED_FIELD_COUNT,
                CALL_RECORD_LAYOUT_VERSION,
                wire.len()
            )));
        }

        Ok(CallRecord {
            receiver,
            is_instance_call: bool_field(wire, 0, "is_instance_call")?,
            target_class_id: str_field(wire, 1, "target_class_id")?,
            mock_name: str_field(wire, 2, "mock_name")?,
            mock_descriptor: str_field(wire, 3, "mock_descriptor")?,
            mock_state_index: int_field(wire, 4, "mock_state_index")?,
            mock_instance_index: int_field(wire, 5, "mock_instance_index")?,
            is_startup_mock: bool_field(wire, 6, "is_startup_mock")?,
            arguments: wire[FIXED_FIELD_COUNT..].to_vec(),
        })
    }

    /// Encode back into the wire layout (receiver excluded)
    pub fn to_wire(&self) -> Vec<Value> {
        let mut wire = Vec::with_capacity(FIXED_FIELD_COUNT + self.arguments.len());
        wire.push(Value::Bool(self.is_instance_call));
        wire.push(Value::Str(Arc::clone(&self.target_class_id)));
        wire.push(Value::Str(Arc::clone(&self.mock_name)));
        wire.push(Value::Str(Arc::clone(&self.mock_descriptor)));
        wire.push(Value::Int(self.mock_state_index));
        wire.push(Value::Int(self.mock_instance_index));
        wire.push(Value::Bool(self.is_startup_mock));
        wire.extend(self.arguments.iter().cloned());
        wire
    }

    /// Arguments of the intercepted call
    pub fn real_arguments(&self) -> &[Value] {
        &self.arguments
    }

    /// State index, when state is tracked
    pub fn state_index(&self) -> Option<usize> {
        usize::try_from(self.mock_state_index).ok()
    }

    /// Instance index, when an instance exists
    pub fn instance_index(&self) -> Option<usize> {
        usize::try_from(self.mock_instance_index).ok()
    }
}

fn invalid(slot: usize, field: &str, expected: &str, got: &Value) -> MockError {
    MockError::InvalidCallRecord(format!(
        "slot {} ({}): expected {}, got {}",
        slot,
        field,
        expected,
        got.type_name()
    ))
}

fn bool_field(wire: &[Value], slot: usize, field: &str) -> MockResult<bool> {
    match &wire[slot] {
        Value::Bool(b) => Ok(*b),
        other => Err(invalid(slot, field, "boolean", other)),
    }
}

fn int_field(wire: &[Value], slot: usize, field: &str) -> MockResult<i32> {
    match &wire[slot] {
        Value::Int(i) => Ok(*i),
        other => Err(invalid(slot, field, "int", other)),
    }
}

fn str_field(wire: &[Value], slot: usize, field: &str) -> MockResult<Arc<str>> {
    match &wire[slot] {
        Value::Str(s) => Ok(Arc::clone(s)),
        other => Err(invalid(slot, field, "string", other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wire() -> Vec<Value> {
        vec![
            Value::Bool(true),
            Value::string("demo/Greeter"),
            Value::string("greet"),
            Value::string("(Lstd/String;)Lstd/String;"),
            Value::Int(2),
            Value::Int(-1),
            Value::Bool(false),
            Value::string("Ann"),
        ]
    }

    #[test]
    fn test_from_wire() {
        let record = CallRecord::from_wire(Value::Null, &wire()).unwrap();
        assert!(record.is_instance_call);
        assert_eq!(&*record.target_class_id, "demo/Greeter");
        assert_eq!(&*record.mock_name, "greet");
        assert_eq!(record.state_index(), Some(2));
        assert_eq!(record.instance_index(), None);
        assert!(!record.is_startup_mock);
        assert_eq!(record.real_arguments(), &[Value::string("Ann")]);
        assert_eq!(record.to_wire(), wire());
    }

    #[test]
    fn test_no_real_arguments() {
        let record = CallRecord::from_wire(Value::Null, &wire()[..FIXED_FIELD_COUNT]).unwrap();
        assert!(record.real_arguments().is_empty());
    }

    #[test]
    fn test_short_wire() {
        let err = CallRecord::from_wire(Value::Null, &wire()[..3]).unwrap_err();
        assert!(matches!(err, MockError::InvalidCallRecord(_)));
    }

    #[test]
    fn test_misaligned_wire() {
        let mut shifted = wire();
        shifted.remove(0);
        let err = CallRecord::from_wire(Value::Null, &shifted).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid call record: slot 0 (is_instance_call): expected boolean, got string"
        );
    }
}
