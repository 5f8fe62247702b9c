//! Startup and per-test mock instance tables

use parking_lot::RwLock;

use mimic_sdk::{InstanceScope, MockError, MockResult, ObjectRef};

/// Indexed mock instances for one lifecycle scope
#[derive(Debug)]
pub struct InstanceTable {
    scope: InstanceScope,
    instances: RwLock<Vec<ObjectRef>>,
}

impl InstanceTable {
    /// Create an empty table for `scope`
    pub fn new(scope: InstanceScope) -> Self {
        Self {
            scope,
            instances: RwLock::new(Vec::new()),
        }
    }

    /// Scope served by this table
    pub fn scope(&self) -> InstanceScope {
        self.scope
    }

    /// Register an instance, returning its index
    pub fn register(&self, instance: ObjectRef) -> usize {
        let mut instances = self.instances.write();
        instances.push(instance);
        instances.len() - 1
    }

    /// Instance at `index`; out of range is an error
    pub fn get(&self, index: usize) -> MockResult<ObjectRef> {
        let instances = self.instances.read();
        instances
            .get(index)
            .cloned()
            .ok_or(MockError::InstanceIndexOutOfRange {
                scope: self.scope,
                index,
                len: instances.len(),
            })
    }

    /// Number of registered instances
    pub fn len(&self) -> usize {
        self.instances.read().len()
    }

    /// Check if no instance is registered
    pub fn is_empty(&self) -> bool {
        self.instances.read().is_empty()
    }

    /// Drop every instance; indices restart at zero
    pub fn clear(&self) {
        self.instances.write().clear();
    }
}

/// The startup and per-test tables together
#[derive(Debug)]
pub struct MockInstances {
    startup: InstanceTable,
    per_test: InstanceTable,
}

impl MockInstances {
    /// Create both tables empty
    pub fn new() -> Self {
        Self {
            startup: InstanceTable::new(InstanceScope::Startup),
            per_test: InstanceTable::new(InstanceScope::PerTest),
        }
    }

    /// Instances registered once during startup, kept for the process
    pub fn startup(&self) -> &InstanceTable {
        &self.startup
    }

    /// Instances registered by the running test
    pub fn per_test(&self) -> &InstanceTable {
        &self.per_test
    }

    /// Table for `scope`
    pub fn table(&self, scope: InstanceScope) -> &InstanceTable {
        match scope {
            InstanceScope::Startup => &self.startup,
            InstanceScope::PerTest => &self.per_test,
        }
    }
}

impl Default for MockInstances {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_and_get() {
        let table = InstanceTable::new(InstanceScope::PerTest);
        let a = ObjectRef::new("demo.A", 1_u8);
        let b = ObjectRef::new("demo.A", 2_u8);
        assert_eq!(table.register(a.clone()), 0);
        assert_eq!(table.register(b.clone()), 1);

        assert_eq!(table.get(0).unwrap(), a);
        assert_eq!(table.get(1).unwrap(), b);
        assert_eq!(table.get(1).unwrap(), table.get(1).unwrap());
    }

    #[test]
    fn test_out_of_range() {
        let table = InstanceTable::new(InstanceScope::Startup);
        table.register(ObjectRef::new("demo.A", ()));
        let err = table.get(3).unwrap_err();
        assert!(matches!(
            err,
            MockError::InstanceIndexOutOfRange {
                scope: InstanceScope::Startup,
                index: 3,
                len: 1
            }
        ));
        assert_eq!(
            err.to_string(),
            "No startup mock instance at index 3 (registered: 1)"
        );
    }

    #[test]
    fn test_clear_per_test() {
        let instances = MockInstances::new();
        instances.startup().register(ObjectRef::new("demo.A", ()));
        instances.per_test().register(ObjectRef::new("demo.A", ()));

        instances.per_test().clear();
        assert!(instances.per_test().is_empty());
        assert_eq!(instances.table(InstanceScope::Startup).len(), 1);
    }
}
