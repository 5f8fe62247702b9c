//! Mock method and constructor handler types
//!
//! The class table stores mock behaviour as plain closures keyed by
//! (class, method name, parameter types). These aliases are what a mock
//! author registers.

use std::any::Any;
use std::sync::Arc;

use crate::error::MockResult;
use crate::value::Value;

/// A mock method body.
///
/// Receives the receiver (the mock instance for instance calls, the real
/// object for static calls) and the final argument list, invocation context
/// first when the method declared one.
pub type MockMethodFn = Arc<dyn Fn(&Value, &[Value]) -> MockResult<Value> + Send + Sync>;

/// A no-argument constructor producing the new object's state
pub type ConstructorFn = Arc<dyn Fn() -> MockResult<Box<dyn Any + Send + Sync>> + Send + Sync>;

/// Wrap a closure as a [`MockMethodFn`]
pub fn method_fn(
    f: impl Fn(&Value, &[Value]) -> MockResult<Value> + Send + Sync + 'static,
) -> MockMethodFn {
    Arc::new(f)
}

/// Wrap a state factory as a [`ConstructorFn`]
pub fn constructor_fn<T, F>(f: F) -> ConstructorFn
where
    T: Any + Send + Sync,
    F: Fn() -> MockResult<T> + Send + Sync + 'static,
{
    Arc::new(move || f().map(|state| Box::new(state) as Box<dyn Any + Send + Sync>))
}
