//! Argument marshalling
//!
//! Turns a call record's real arguments into the argument list the mock
//! method is invoked with. When the first parameter is the invocation
//! context, a fresh [`Invocation`] is created and prepended; the bridge keeps
//! its own handle to read the proceed flag afterwards.

use std::sync::Arc;

use mimic_sdk::{Invocation, StateView, Type, Value};

use crate::record::CallRecord;
use crate::state::MockState;

/// Final arguments for one mock invocation
#[derive(Debug, Clone)]
pub struct Marshalled {
    /// Arguments in invocation order
    pub arguments: Vec<Value>,
    /// Context prepended to the arguments, if the method takes one
    pub invocation: Option<Invocation>,
}

/// Prepare the arguments for invoking a method with parameters `params`.
///
/// `state` is attached to the context so the mock can read its invocation
/// count and expectations.
pub fn prepare(record: &CallRecord, params: &[Type], state: Option<Arc<MockState>>) -> Marshalled {
    let real = record.real_arguments();
    if !params.first().is_some_and(Type::is_invocation) {
        return Marshalled {
            arguments: real.to_vec(),
            invocation: None,
        };
    }

    let invocation = Invocation::new(
        Arc::clone(&record.target_class_id),
        record.mock_state_index,
        record.receiver.clone(),
        real.to_vec(),
        state.map(|s| s as Arc<dyn StateView>),
    );
    let mut arguments = Vec::with_capacity(real.len() + 1);
    arguments.push(Value::Invocation(invocation.clone()));
    arguments.extend(real.iter().cloned());

    Marshalled {
        arguments,
        invocation: Some(invocation),
    }
}
