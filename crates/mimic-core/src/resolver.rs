//! Instance resolution
//!
//! An instance-method call needs a mock instance to run on. Which one is
//! decided by the call record alone:
//!
//! - no instance index: a fresh instance is constructed for this call and
//!   dropped afterwards (transient)
//! - index into the startup table (startup)
//! - index into the per-test table (per-test)

use std::sync::Arc;

use mimic_sdk::{InstanceScope, MockResult, ObjectRef};

use crate::classes::ClassTable;
use crate::descriptor::canonicalize;
use crate::instances::MockInstances;

/// Lifecycle category of the instance a call resolves to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Lifecycle {
    /// Created for a single call, never cached
    Transient,
    /// Registered during startup and reused for the process lifetime
    Startup,
    /// Registered by the running test
    PerTest,
}

impl Lifecycle {
    /// Classify a call; static calls resolve no instance and yield `None`
    pub fn classify(is_instance_call: bool, instance_index: i32, is_startup: bool) -> Option<Self> {
        if !is_instance_call {
            return None;
        }
        Some(Self::for_index(instance_index, is_startup))
    }

    fn for_index(instance_index: i32, is_startup: bool) -> Self {
        match (instance_index < 0, is_startup) {
            (true, _) => Lifecycle::Transient,
            (false, true) => Lifecycle::Startup,
            (false, false) => Lifecycle::PerTest,
        }
    }

    /// Instance table backing this lifecycle, if any
    pub fn scope(self) -> Option<InstanceScope> {
        match self {
            Lifecycle::Transient => None,
            Lifecycle::Startup => Some(InstanceScope::Startup),
            Lifecycle::PerTest => Some(InstanceScope::PerTest),
        }
    }
}

impl std::fmt::Display for Lifecycle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Lifecycle::Transient => write!(f, "transient"),
            Lifecycle::Startup => write!(f, "startup"),
            Lifecycle::PerTest => write!(f, "per-test"),
        }
    }
}

/// Supplies the mock instance for instance-method calls.
///
/// Only reads the instance tables; transient instances are handed to the
/// caller and not retained.
#[derive(Debug, Clone)]
pub struct InstanceResolver {
    classes: Arc<ClassTable>,
    instances: Arc<MockInstances>,
}

impl InstanceResolver {
    /// Create a resolver over the given tables
    pub fn new(classes: Arc<ClassTable>, instances: Arc<MockInstances>) -> Self {
        Self { classes, instances }
    }

    /// Resolve the instance for (`target_class_id`, `instance_index`,
    /// `is_startup`).
    ///
    /// Construction failures and out-of-range indices are returned as is.
    pub fn resolve(
        &self,
        target_class_id: &str,
        instance_index: i32,
        is_startup: bool,
    ) -> MockResult<(ObjectRef, Lifecycle)> {
        let lifecycle = Lifecycle::for_index(instance_index, is_startup);
        let instance = match (lifecycle.scope(), usize::try_from(instance_index)) {
            (Some(scope), Ok(index)) => self.instances.table(scope).get(index)?,
            _ => self.classes.construct(&canonicalize(target_class_id))?,
        };
        Ok((instance, lifecycle))
    }
}
