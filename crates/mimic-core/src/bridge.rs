//! The mock dispatch bridge
//!
//! Every intercepted call ends up in [`MockBridge::dispatch`], which decides
//! what the call site sees:
//!
//! 1. Before bootstrap completes, the zero value of the mock's return type
//!    (no table is consulted).
//! 2. For excluded calls, [`Dispatch::Proceed`].
//! 3. Otherwise the mock method runs on the resolved mock instance and its
//!    result is substituted, unless the mock asked its [`Invocation`] to
//!    proceed, in which case the real implementation runs.
//!
//! The bridge holds no per-call state. A process has at most one installed
//! bridge ([`install`]); instrumented code reaches it through
//! [`dispatch_call`].
//!
//! [`Invocation`]: mimic_sdk::Invocation

use std::sync::Arc;

use once_cell::sync::OnceCell;
use thiserror::Error;

use mimic_sdk::{MockResult, ObjectRef, Value};

use crate::bootstrap::{Bootstrap, BootstrapFlag, ProcessBootstrap};
use crate::classes::{ClassTable, MockClass};
use crate::config::BridgeConfig;
use crate::defaults::bootstrap_default;
use crate::descriptor::{canonicalize, DescriptorCache};
use crate::exclusion::{ExclusionPolicy, MockingZone};
use crate::instances::MockInstances;
use crate::locator::MockMethodLocator;
use crate::marshal;
use crate::record::CallRecord;
use crate::resolver::{InstanceResolver, Lifecycle};
use crate::state::MockStates;

/// Outcome of dispatching one call
#[derive(Debug, Clone, PartialEq)]
pub enum Dispatch {
    /// Return this value in place of the real call's result
    Substitute(Value),
    /// Run the real implementation; distinct from every value, including Null
    Proceed,
}

impl Dispatch {
    /// Check if the real implementation should run
    pub fn is_proceed(&self) -> bool {
        matches!(self, Dispatch::Proceed)
    }

    /// The substituted value, if any
    pub fn into_value(self) -> Option<Value> {
        match self {
            Dispatch::Substitute(value) => Some(value),
            Dispatch::Proceed => None,
        }
    }
}

/// Routes intercepted calls to mock methods
pub struct MockBridge {
    bootstrap: Arc<dyn Bootstrap>,
    exclusion: Arc<dyn ExclusionPolicy>,
    classes: Arc<ClassTable>,
    states: Arc<MockStates>,
    instances: Arc<MockInstances>,
    resolver: InstanceResolver,
    locator: MockMethodLocator,
    descriptors: DescriptorCache,
}

impl MockBridge {
    /// Start building a bridge
    pub fn builder() -> MockBridgeBuilder {
        MockBridgeBuilder::default()
    }

    /// Class table consulted by this bridge
    pub fn classes(&self) -> &Arc<ClassTable> {
        &self.classes
    }

    /// Mock-state table consulted by this bridge
    pub fn states(&self) -> &Arc<MockStates> {
        &self.states
    }

    /// Instance tables consulted by this bridge
    pub fn instances(&self) -> &Arc<MockInstances> {
        &self.instances
    }

    /// Dispatch one intercepted call.
    ///
    /// Errors raised by the mock method come back exactly as it raised them.
    /// Before bootstrap completes the call cannot fail; an undecodable
    /// descriptor is answered with null.
    pub fn dispatch(&self, record: &CallRecord) -> MockResult<Dispatch> {
        if !self.bootstrap.is_complete() {
            tracing::trace!(
                descriptor = %record.mock_descriptor,
                "bootstrap incomplete, returning default"
            );
            return Ok(Dispatch::Substitute(bootstrap_default(&record.mock_descriptor)));
        }

        if self
            .exclusion
            .is_excluded(&record.receiver, &record.target_class_id)
        {
            tracing::debug!(class = %record.target_class_id, "call excluded from mocking");
            return Ok(Dispatch::Proceed);
        }

        let (mock, mock_class) = self.receiver(record)?;
        let params = self
            .descriptors
            .parameter_types(&record.mock_descriptor, &*self.classes)?;

        let method = self.locator.locate(
            &record.target_class_id,
            record.mock_state_index,
            &mock_class,
            &params,
        );
        let state = self
            .locator
            .state(&record.target_class_id, record.mock_state_index);
        let marshalled = marshal::prepare(record, &params, state);

        let result = match &method {
            Some(method) => {
                tracing::trace!(?method, "invoking located mock method");
                self.classes
                    .invoke_method(&mock, method, &marshalled.arguments)?
            }
            None => {
                tracing::trace!(
                    class = mock_class.name(),
                    name = %record.mock_name,
                    "invoking mock method by name"
                );
                self.classes.invoke_by_name(
                    &mock_class,
                    &mock,
                    &record.mock_name,
                    &params,
                    &marshalled.arguments,
                )?
            }
        };

        match marshalled.invocation {
            Some(invocation) if invocation.proceed_requested() => {
                tracing::debug!(name = %record.mock_name, "mock requested proceed");
                Ok(Dispatch::Proceed)
            }
            _ => Ok(Dispatch::Substitute(result)),
        }
    }

    /// The value the mock runs on and the class its method is looked up in
    fn receiver(&self, record: &CallRecord) -> MockResult<(Value, Arc<MockClass>)> {
        match Lifecycle::classify(
            record.is_instance_call,
            record.mock_instance_index,
            record.is_startup_mock,
        ) {
            Some(_) => {
                let (instance, lifecycle) = self.resolver.resolve(
                    &record.target_class_id,
                    record.mock_instance_index,
                    record.is_startup_mock,
                )?;
                tracing::debug!(
                    class = %record.target_class_id,
                    index = record.mock_instance_index,
                    %lifecycle,
                    "resolved mock instance"
                );
                let class = self.classes.lookup(instance.class_name())?;
                self.bind_real(&class, &instance, &record.receiver);
                Ok((Value::Object(instance), class))
            }
            None => {
                let class = self.classes.lookup(&canonicalize(&record.target_class_id))?;
                Ok((record.receiver.clone(), class))
            }
        }
    }

    fn bind_real(&self, class: &MockClass, instance: &ObjectRef, real: &Value) {
        if class.declares_real_slot() && !instance.set_real(real.clone()) {
            tracing::trace!(class = class.name(), "instance has no real-object slot");
        }
    }
}

impl std::fmt::Debug for MockBridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockBridge")
            .field("bootstrap_complete", &self.bootstrap.is_complete())
            .field("classes", &self.classes)
            .field("cached_descriptors", &self.descriptors.len())
            .finish()
    }
}

/// Builder for [`MockBridge`].
///
/// Anything not supplied starts empty: a fresh class table, state table and
/// instance tables, the process-wide readiness flag, and a [`MockingZone`]
/// exclusion policy.
#[derive(Default)]
pub struct MockBridgeBuilder {
    bootstrap: Option<Arc<dyn Bootstrap>>,
    exclusion: Option<Arc<dyn ExclusionPolicy>>,
    classes: Option<Arc<ClassTable>>,
    states: Option<Arc<MockStates>>,
    instances: Option<Arc<MockInstances>>,
    config: BridgeConfig,
}

impl MockBridgeBuilder {
    /// Use a different readiness source
    pub fn bootstrap(mut self, bootstrap: impl Bootstrap + 'static) -> Self {
        self.bootstrap = Some(Arc::new(bootstrap));
        self
    }

    /// Use a different exclusion policy.
    ///
    /// Configured excluded classes only apply to the default policy.
    pub fn exclusion(mut self, policy: Arc<dyn ExclusionPolicy>) -> Self {
        self.exclusion = Some(policy);
        self
    }

    /// Share a class table
    pub fn classes(mut self, classes: Arc<ClassTable>) -> Self {
        self.classes = Some(classes);
        self
    }

    /// Share a mock-state table
    pub fn states(mut self, states: Arc<MockStates>) -> Self {
        self.states = Some(states);
        self
    }

    /// Share the instance tables
    pub fn instances(mut self, instances: Arc<MockInstances>) -> Self {
        self.instances = Some(instances);
        self
    }

    /// Apply a loaded configuration
    pub fn config(mut self, config: &BridgeConfig) -> Self {
        self.config = config.clone().normalized();
        self
    }

    /// Build the bridge
    pub fn build(self) -> MockBridge {
        let config = self.config;
        let bootstrap: Arc<dyn Bootstrap> = match self.bootstrap {
            Some(bootstrap) => bootstrap,
            None if config.bootstrap_complete => Arc::new(BootstrapFlag::new(true)),
            None => Arc::new(ProcessBootstrap),
        };
        let exclusion: Arc<dyn ExclusionPolicy> = match self.exclusion {
            Some(policy) => policy,
            None => Arc::new(MockingZone::with_excluded_classes(&config.excluded_classes)),
        };
        let classes = self.classes.unwrap_or_default();
        let states = self.states.unwrap_or_default();
        let instances = self.instances.unwrap_or_default();

        MockBridge {
            resolver: InstanceResolver::new(Arc::clone(&classes), Arc::clone(&instances)),
            locator: MockMethodLocator::new(Arc::clone(&classes), Arc::clone(&states)),
            descriptors: DescriptorCache::new(config.cache_descriptors),
            bootstrap,
            exclusion,
            classes,
            states,
            instances,
        }
    }
}

static BRIDGE: OnceCell<MockBridge> = OnceCell::new();

/// A bridge was already installed for this process
#[derive(Debug, Error)]
#[error("A mock bridge is already installed")]
pub struct AlreadyInstalled;

/// Install the process-wide bridge; only the first call succeeds
pub fn install(bridge: MockBridge) -> Result<&'static MockBridge, AlreadyInstalled> {
    BRIDGE.set(bridge).map_err(|_| AlreadyInstalled)?;
    tracing::debug!("mock bridge installed");
    BRIDGE.get().ok_or(AlreadyInstalled)
}

/// The installed bridge, if any
pub fn installed() -> Option<&'static MockBridge> {
    BRIDGE.get()
}

/// Entry point for instrumented call sites.
///
/// Decodes the wire array and dispatches through the installed bridge. With
/// no bridge installed, the call is answered as if bootstrap were still in
/// progress.
pub fn dispatch_call(receiver: Value, wire: &[Value]) -> MockResult<Dispatch> {
    let record = CallRecord::from_wire(receiver, wire)?;
    match installed() {
        Some(bridge) => bridge.dispatch(&record),
        None => Ok(Dispatch::Substitute(bootstrap_default(&record.mock_descriptor))),
    }
}
