//! Mock-state table
//!
//! Each mock method that tracks state owns a [`MockState`], addressed by
//! (mock class internal name, state index). The state remembers which method
//! name it stands for, caches the method resolved for it on first use, counts
//! invocations and carries optional invocation-count expectations that a test
//! lifecycle can verify on teardown.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use mimic_sdk::{StateView, Type};

use crate::classes::{ClassTable, MockClass, MockMethod};

/// State for one mock method
#[derive(Debug)]
pub struct MockState {
    method_name: String,
    min_invocations: Option<u32>,
    max_invocations: Option<u32>,
    invocations: AtomicU32,
    resolved: RwLock<Option<Binding>>,
}

/// A method resolved on one registered class
#[derive(Debug)]
struct Binding {
    class: Weak<MockClass>,
    method: MockMethod,
}

impl Binding {
    fn matches(&self, class: &Arc<MockClass>, params: &[Type]) -> bool {
        std::ptr::eq(self.class.as_ptr(), Arc::as_ptr(class)) && self.method.params() == params
    }
}

impl MockState {
    /// State for the mock method called `method_name`
    pub fn new(method_name: impl Into<String>) -> Self {
        Self {
            method_name: method_name.into(),
            min_invocations: None,
            max_invocations: None,
            invocations: AtomicU32::new(0),
            resolved: RwLock::new(None),
        }
    }

    /// Expect at least `n` invocations
    pub fn expect_min(mut self, n: u32) -> Self {
        self.min_invocations = Some(n);
        self
    }

    /// Allow at most `n` invocations
    pub fn expect_max(mut self, n: u32) -> Self {
        self.max_invocations = Some(n);
        self
    }

    /// Expect exactly `n` invocations
    pub fn expect_exactly(self, n: u32) -> Self {
        self.expect_min(n).expect_max(n)
    }

    /// Name of the mock method
    pub fn method_name(&self) -> &str {
        &self.method_name
    }

    /// Count one invocation, returning the new total
    pub fn record_invocation(&self) -> u32 {
        self.invocations.fetch_add(1, Ordering::AcqRel) + 1
    }

    /// Reset the invocation counter
    pub fn reset(&self) {
        self.invocations.store(0, Ordering::Release);
    }

    /// Resolve the mock method on `mock_class`, caching the last success.
    ///
    /// The binding is tied to the registered class object, not its name: a
    /// class replaced in the table is looked up afresh.
    pub fn mock_method(
        &self,
        classes: &ClassTable,
        mock_class: &Arc<MockClass>,
        params: &[Type],
    ) -> Option<MockMethod> {
        if let Some(binding) = &*self.resolved.read() {
            if binding.matches(mock_class, params) {
                return Some(binding.method.clone());
            }
        }

        let method = classes.find_method(mock_class, &self.method_name, params)?;
        *self.resolved.write() = Some(Binding {
            class: Arc::downgrade(mock_class),
            method: method.clone(),
        });
        Some(method)
    }

    fn violation(&self, class_id: &str, index: usize) -> Option<ExpectationViolation> {
        let actual = self.invocation_count();
        let too_few = self.min_invocations.is_some_and(|min| actual < min);
        let too_many = self.max_invocations.is_some_and(|max| actual > max);
        (too_few || too_many).then(|| ExpectationViolation {
            class_id: class_id.to_string(),
            index,
            method_name: self.method_name.clone(),
            min: self.min_invocations,
            max: self.max_invocations,
            actual,
        })
    }
}

impl StateView for MockState {
    fn invocation_count(&self) -> u32 {
        self.invocations.load(Ordering::Acquire)
    }

    fn min_invocations(&self) -> Option<u32> {
        self.min_invocations
    }

    fn max_invocations(&self) -> Option<u32> {
        self.max_invocations
    }
}

/// An invocation-count expectation that did not hold
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{class_id}#{method_name} (state {index}): expected {}, got {actual} invocation(s)", expectation(.min, .max))]
pub struct ExpectationViolation {
    /// Mock class internal name
    pub class_id: String,
    /// State index
    pub index: usize,
    /// Mock method name
    pub method_name: String,
    /// Minimum expected
    pub min: Option<u32>,
    /// Maximum allowed
    pub max: Option<u32>,
    /// Recorded invocations
    pub actual: u32,
}

fn expectation(min: &Option<u32>, max: &Option<u32>) -> String {
    match (*min, *max) {
        (Some(min), Some(max)) if min == max => format!("exactly {}", min),
        (Some(min), Some(max)) => format!("between {} and {}", min, max),
        (Some(min), None) => format!("at least {}", min),
        (None, Some(max)) => format!("at most {}", max),
        (None, None) => "any number".to_string(),
    }
}

/// Mock states for every mock class, keyed by internal class name
#[derive(Debug, Default)]
pub struct MockStates {
    states: RwLock<FxHashMap<String, Vec<Arc<MockState>>>>,
}

impl MockStates {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a state for `class_id`, returning its index
    pub fn register(&self, class_id: &str, state: MockState) -> usize {
        let mut states = self.states.write();
        let list = states.entry(class_id.to_string()).or_default();
        list.push(Arc::new(state));
        list.len() - 1
    }

    /// State at (`class_id`, `index`)
    pub fn state(&self, class_id: &str, index: usize) -> Option<Arc<MockState>> {
        self.states.read().get(class_id)?.get(index).cloned()
    }

    /// Number of states registered for `class_id`
    pub fn count(&self, class_id: &str) -> usize {
        self.states.read().get(class_id).map_or(0, Vec::len)
    }

    /// Find the mock method associated with (`class_id`, `index`) on
    /// `mock_class` matching `params`
    pub fn lookup_mock_method(
        &self,
        classes: &ClassTable,
        class_id: &str,
        index: usize,
        mock_class: &Arc<MockClass>,
        params: &[Type],
    ) -> Option<MockMethod> {
        self.state(class_id, index)?
            .mock_method(classes, mock_class, params)
    }

    /// Count one invocation on (`class_id`, `index`).
    ///
    /// Returns false when no such state exists.
    pub fn record_invocation(&self, class_id: &str, index: usize) -> bool {
        match self.state(class_id, index) {
            Some(state) => {
                state.record_invocation();
                true
            }
            None => false,
        }
    }

    /// Every state whose invocation count breaks its expectations
    pub fn verify_expectations(&self) -> Vec<ExpectationViolation> {
        let states = self.states.read();
        let mut violations: Vec<_> = states
            .iter()
            .flat_map(|(class_id, list)| {
                list.iter()
                    .enumerate()
                    .filter_map(move |(index, state)| state.violation(class_id, index))
            })
            .collect();
        violations.sort_by(|a, b| (&a.class_id, a.index).cmp(&(&b.class_id, b.index)));
        violations
    }

    /// Reset every invocation counter
    pub fn reset_invocations(&self) {
        for state in self.states.read().values().flatten() {
            state.reset();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mimic_sdk::{method_fn, Primitive, Value};

    fn table_with_greeter() -> (ClassTable, Arc<MockClass>) {
        let classes = ClassTable::new();
        let class = classes.register(
            MockClass::builder("demo/Greeter")
                .method("greet", "(I)I", method_fn(|_, _| Ok(Value::Int(1))))
                .build()
                .unwrap(),
        );
        (classes, class)
    }

    #[test]
    fn test_register_indices() {
        let states = MockStates::new();
        assert_eq!(states.register("demo/Greeter", MockState::new("a")), 0);
        assert_eq!(states.register("demo/Greeter", MockState::new("b")), 1);
        assert_eq!(states.register("demo/Other", MockState::new("c")), 0);
        assert_eq!(states.count("demo/Greeter"), 2);
        assert_eq!(states.state("demo/Greeter", 1).unwrap().method_name(), "b");
        assert!(states.state("demo/Greeter", 2).is_none());
        assert!(states.state("demo/Missing", 0).is_none());
    }

    #[test]
    fn test_lookup_mock_method_caches() {
        let (classes, class) = table_with_greeter();
        let states = MockStates::new();
        let index = states.register("demo/Greeter", MockState::new("greet"));
        let params = [Type::Primitive(Primitive::Int)];

        let first = states
            .lookup_mock_method(&classes, "demo/Greeter", index, &class, &params)
            .unwrap();
        let second = states
            .lookup_mock_method(&classes, "demo/Greeter", index, &class, &params)
            .unwrap();
        assert!(first.ptr_eq(&second));
        assert_eq!(first.name(), "greet");

        assert!(states
            .lookup_mock_method(&classes, "demo/Greeter", index, &class, &[])
            .is_none());
    }

    #[test]
    fn test_lookup_follows_reregistered_class() {
        let (classes, class) = table_with_greeter();
        let states = MockStates::new();
        let index = states.register("demo/Greeter", MockState::new("greet"));
        let params = [Type::Primitive(Primitive::Int)];

        let old = states
            .lookup_mock_method(&classes, "demo/Greeter", index, &class, &params)
            .unwrap();

        let replacement = classes.register(
            MockClass::builder("demo/Greeter")
                .method("greet", "(I)I", method_fn(|_, _| Ok(Value::Int(2))))
                .build()
                .unwrap(),
        );
        let new = states
            .lookup_mock_method(&classes, "demo/Greeter", index, &replacement, &params)
            .unwrap();
        assert!(!old.ptr_eq(&new));

        let again = states
            .lookup_mock_method(&classes, "demo/Greeter", index, &replacement, &params)
            .unwrap();
        assert!(new.ptr_eq(&again));
    }

    #[test]
    fn test_lookup_unknown_name() {
        let (classes, class) = table_with_greeter();
        let states = MockStates::new();
        let index = states.register("demo/Greeter", MockState::new("wave"));
        assert!(states
            .lookup_mock_method(&classes, "demo/Greeter", index, &class, &[])
            .is_none());
    }

    #[test]
    fn test_expectations() {
        let states = MockStates::new();
        let exact = states.register("demo/Greeter", MockState::new("greet").expect_exactly(2));
        let at_most = states.register("demo/Greeter", MockState::new("wave").expect_max(0));
        states.register("demo/Greeter", MockState::new("free"));

        assert!(states.record_invocation("demo/Greeter", exact));
        assert!(!states.record_invocation("demo/Greeter", 9));

        let violations = states.verify_expectations();
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].method_name, "greet");
        assert_eq!(violations[0].actual, 1);
        assert_eq!(
            violations[0].to_string(),
            "demo/Greeter#greet (state 0): expected exactly 2, got 1 invocation(s)"
        );

        states.record_invocation("demo/Greeter", exact);
        states.record_invocation("demo/Greeter", at_most);
        let violations = states.verify_expectations();
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].method_name, "wave");

        states.reset_invocations();
        let state = states.state("demo/Greeter", exact).unwrap();
        assert_eq!(state.invocation_count(), 0);
    }
}
