//! Invocation context handed to mock methods
//!
//! A mock method whose first declared parameter is `mimic.Invocation`
//! receives one of these ahead of the real call's arguments. Through it the
//! mock can inspect the intercepted call and ask the bridge to let the real
//! implementation run instead of substituting the mock's result.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::value::Value;

/// Read-only view of the mock state behind an invocation.
///
/// Implemented by the dispatch core's mock-state table.
pub trait StateView: Send + Sync {
    /// Number of invocations recorded so far
    fn invocation_count(&self) -> u32;

    /// Minimum number of invocations expected, if any
    fn min_invocations(&self) -> Option<u32>;

    /// Maximum number of invocations allowed, if any
    fn max_invocations(&self) -> Option<u32>;
}

struct InvocationInner {
    target_class_id: Arc<str>,
    state_index: i32,
    invoked: Value,
    arguments: Vec<Value>,
    state: Option<Arc<dyn StateView>>,
    proceed: AtomicBool,
}

/// Shared handle to a single call's invocation context.
///
/// The bridge keeps one clone and hands another to the mock, so a
/// [`proceed`](Invocation::proceed) request is visible to the bridge after
/// the mock returns.
#[derive(Clone)]
pub struct Invocation(Arc<InvocationInner>);

impl Invocation {
    /// Create a context for one intercepted call
    pub fn new(
        target_class_id: impl Into<Arc<str>>,
        state_index: i32,
        invoked: Value,
        arguments: Vec<Value>,
        state: Option<Arc<dyn StateView>>,
    ) -> Self {
        Invocation(Arc::new(InvocationInner {
            target_class_id: target_class_id.into(),
            state_index,
            invoked,
            arguments,
            state,
            proceed: AtomicBool::new(false),
        }))
    }

    /// Internal name of the mock class the call was routed to
    pub fn target_class_id(&self) -> &str {
        &self.0.target_class_id
    }

    /// Mock state index, negative when no state is tracked
    pub fn state_index(&self) -> i32 {
        self.0.state_index
    }

    /// The object the intercepted call was made on (Null for static calls)
    pub fn invoked_instance(&self) -> &Value {
        &self.0.invoked
    }

    /// Arguments of the intercepted call
    pub fn arguments(&self) -> &[Value] {
        &self.0.arguments
    }

    /// Ask the bridge to run the real implementation.
    ///
    /// Once requested the flag stays set for the rest of the call.
    pub fn proceed(&self) {
        self.0.proceed.store(true, Ordering::Release);
    }

    /// Whether the mock asked for the real implementation
    pub fn proceed_requested(&self) -> bool {
        self.0.proceed.load(Ordering::Acquire)
    }

    /// Invocations recorded on the mock state (0 without a state)
    pub fn invocation_count(&self) -> u32 {
        self.0
            .state
            .as_ref()
            .map_or(0, |state| state.invocation_count())
    }

    /// Expected minimum invocations on the mock state
    pub fn min_invocations(&self) -> Option<u32> {
        self.0.state.as_ref().and_then(|state| state.min_invocations())
    }

    /// Allowed maximum invocations on the mock state
    pub fn max_invocations(&self) -> Option<u32> {
        self.0.state.as_ref().and_then(|state| state.max_invocations())
    }

    /// Identity comparison
    pub fn ptr_eq(&self, other: &Invocation) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl std::fmt::Debug for Invocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Invocation")
            .field("target_class_id", &self.0.target_class_id)
            .field("state_index", &self.0.state_index)
            .field("arguments", &self.0.arguments.len())
            .field("proceed", &self.proceed_requested())
            .finish()
    }
}

impl From<Invocation> for Value {
    fn from(inv: Invocation) -> Self {
        Value::Invocation(inv)
    }
}
