//! Mock method location through the mock-state table

use std::sync::Arc;

use mimic_sdk::Type;

use crate::classes::{ClassTable, MockClass, MockMethod};
use crate::state::{MockState, MockStates};

/// Finds the method a stateful call site is bound to
#[derive(Debug, Clone)]
pub struct MockMethodLocator {
    classes: Arc<ClassTable>,
    states: Arc<MockStates>,
}

impl MockMethodLocator {
    /// Create a locator over the given tables
    pub fn new(classes: Arc<ClassTable>, states: Arc<MockStates>) -> Self {
        Self { classes, states }
    }

    /// Method associated with (`target_class_id`, `state_index`) on
    /// `mock_class` matching `params`.
    ///
    /// A negative index means the call site tracks no state; the answer is
    /// then always `None` and the caller invokes by name.
    pub fn locate(
        &self,
        target_class_id: &str,
        state_index: i32,
        mock_class: &Arc<MockClass>,
        params: &[Type],
    ) -> Option<MockMethod> {
        let index = usize::try_from(state_index).ok()?;
        self.states
            .lookup_mock_method(&self.classes, target_class_id, index, mock_class, params)
    }

    /// State behind (`target_class_id`, `state_index`), if tracked
    pub fn state(&self, target_class_id: &str, state_index: i32) -> Option<Arc<MockState>> {
        let index = usize::try_from(state_index).ok()?;
        self.states.state(target_class_id, index)
    }
}
