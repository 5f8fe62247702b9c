//! Mimic dispatch core
//!
//! Instrumented call sites route every intercepted call through a single
//! process-wide [`MockBridge`]. The bridge decides whether the call is
//! answered by a mock method, which mock instance receives it, how its
//! arguments are shaped, and whether the real implementation should run
//! after all.
//!
//! # Architecture
//!
//! - [`descriptor`]: method descriptor parsing and class-name forms
//! - [`classes`]: mock classes, construction and method lookup
//! - [`state`]: mock states (method binding, invocation counts)
//! - [`instances`]: startup and per-test instance tables
//! - [`exclusion`]: calls that bypass their mock
//! - [`bootstrap`]: process readiness flag
//! - [`record`]: the call record decoded from the wire layout
//! - [`resolver`], [`locator`], [`marshal`]: the steps of one dispatch
//! - [`bridge`]: the entry point tying it together
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use mimic_core::{ClassTable, MockBridge, MockClass, CallRecord};
//! use mimic_sdk::{constructor_fn, method_fn, Value};
//!
//! let classes = Arc::new(ClassTable::new());
//! classes.register(
//!     MockClass::builder("demo/Greeter")
//!         .constructor(constructor_fn(|| Ok(())))
//!         .method("greet", "(Lstd/String;)Lstd/String;", method_fn(|_, args| {
//!             Ok(Value::string(format!("hello {}", args[0].as_str().unwrap_or(""))))
//!         }))
//!         .build()?,
//! );
//!
//! let bridge = MockBridge::builder().classes(classes).build();
//! mimic_core::install(bridge)?;
//! mimic_core::mark_bootstrap_complete();
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod bootstrap;
pub mod bridge;
pub mod classes;
pub mod config;
pub mod defaults;
pub mod descriptor;
pub mod exclusion;
pub mod instances;
pub mod locator;
pub mod marshal;
pub mod record;
pub mod resolver;
pub mod state;

pub use bootstrap::{
    is_bootstrap_complete, mark_bootstrap_complete, Bootstrap, BootstrapFlag, ProcessBootstrap,
};
pub use bridge::{
    dispatch_call, install, installed, AlreadyInstalled, Dispatch, MockBridge, MockBridgeBuilder,
};
pub use classes::{ClassTable, MockClass, MockClassBuilder, MockMethod};
pub use config::{BridgeConfig, ConfigError, MimicConfig};
pub use defaults::{bootstrap_default, default_value_for_descriptor, default_value_for_type};
pub use descriptor::{
    canonicalize, encode_method_descriptor, internalize, parse_method_descriptor,
    parse_parameter_types, parse_return_type, DescriptorCache, MethodDescriptor, TypeResolver,
    MAX_ARRAY_DIMENSIONS,
};
pub use exclusion::{in_no_mocking_zone, ExclusionPolicy, MockingZone, NeverExclude, NoMockingZone};
pub use instances::{InstanceTable, MockInstances};
pub use locator::MockMethodLocator;
pub use marshal::Marshalled;
pub use record::{CallRecord, CALL_RECORD_LAYOUT_VERSION, FIXED_FIELD_COUNT};
pub use resolver::{InstanceResolver, Lifecycle};
pub use state::{ExpectationViolation, MockState, MockStates};

pub use mimic_sdk;
