//! Exclusion from mocking
//!
//! Some calls must reach the real implementation even though their call site
//! is instrumented: calls the framework itself makes while running a mock,
//! classes a configuration opts out, and individual receivers a test has
//! explicitly released. A policy answers the question per call; the bridge
//! returns the "proceed" sentinel for every excluded call.

use std::cell::Cell;
use std::marker::PhantomData;

use parking_lot::RwLock;
use rustc_hash::FxHashSet;

use mimic_sdk::{ObjectRef, Value};

use crate::descriptor::internalize;

/// Decides whether an intercepted call bypasses its mock
pub trait ExclusionPolicy: Send + Sync {
    /// Whether the call on `receiver` for `target_class_id` (internal form)
    /// should run the real implementation
    fn is_excluded(&self, receiver: &Value, target_class_id: &str) -> bool;
}

/// Never excludes anything
#[derive(Debug, Clone, Copy, Default)]
pub struct NeverExclude;

impl ExclusionPolicy for NeverExclude {
    fn is_excluded(&self, _receiver: &Value, _target_class_id: &str) -> bool {
        false
    }
}

thread_local! {
    static NO_MOCKING_DEPTH: Cell<u32> = const { Cell::new(0) };
}

/// Check if the current thread is inside a no-mocking zone
pub fn in_no_mocking_zone() -> bool {
    NO_MOCKING_DEPTH.with(|depth| depth.get() > 0)
}

/// RAII guard: while alive, every call made on this thread runs unmocked.
///
/// Guards nest; the zone ends when the outermost guard drops. The guard is
/// tied to the thread that created it.
#[derive(Debug)]
#[must_use = "the zone ends when the guard is dropped"]
pub struct NoMockingZone {
    _not_send: PhantomData<*const ()>,
}

impl NoMockingZone {
    /// Enter a zone on the current thread
    pub fn enter() -> Self {
        NO_MOCKING_DEPTH.with(|depth| depth.set(depth.get() + 1));
        Self {
            _not_send: PhantomData,
        }
    }
}

impl Drop for NoMockingZone {
    fn drop(&mut self) {
        NO_MOCKING_DEPTH.with(|depth| depth.set(depth.get().saturating_sub(1)));
    }
}

/// Default policy: thread-local no-mocking zones, excluded classes and
/// excluded receivers
#[derive(Debug, Default)]
pub struct MockingZone {
    excluded_classes: RwLock<FxHashSet<String>>,
    excluded_instances: RwLock<FxHashSet<ObjectRef>>,
}

impl MockingZone {
    /// Create a policy with nothing excluded
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a policy excluding the given classes (internal or canonical)
    pub fn with_excluded_classes<I, S>(classes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let zone = Self::new();
        for class in classes {
            zone.exclude_class(class.as_ref());
        }
        zone
    }

    /// Exclude every call targeting `class`
    pub fn exclude_class(&self, class: &str) {
        self.excluded_classes.write().insert(internalize(class));
    }

    /// Exclude calls whose receiver is `instance`
    pub fn exclude_instance(&self, instance: ObjectRef) {
        self.excluded_instances.write().insert(instance);
    }

    /// Stop excluding `instance`
    pub fn include_instance(&self, instance: &ObjectRef) -> bool {
        self.excluded_instances.write().remove(instance)
    }

    /// Forget all excluded receivers (per-test teardown)
    pub fn clear_instances(&self) {
        self.excluded_instances.write().clear();
    }
}

impl ExclusionPolicy for MockingZone {
    fn is_excluded(&self, receiver: &Value, target_class_id: &str) -> bool {
        if in_no_mocking_zone() {
            return true;
        }
        if self.excluded_classes.read().contains(target_class_id) {
            return true;
        }
        match receiver.as_object() {
            Some(object) => self.excluded_instances.read().contains(object),
            None => false,
        }
    }
}
