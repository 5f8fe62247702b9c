//! Mimic SDK - the surface mock implementations program against
//!
//! This crate provides the minimal types needed to write mock classes
//! without depending on the dispatch core: dynamic [`Value`]s and object
//! handles, resolved parameter [`Type`]s, the [`Invocation`] context and the
//! [`MockError`] taxonomy.
//!
//! # Example
//!
//! ```ignore
//! use mimic_sdk::{method_fn, Invocation, MockResult, Value};
//!
//! // (Lmimic/Invocation;I)I
//! let doubled = method_fn(|_mock, args| {
//!     let inv = args[0].as_invocation().expect("declared first");
//!     if inv.arguments()[0] == Value::Int(0) {
//!         inv.proceed();
//!     }
//!     Ok(Value::Int(args[1].as_i32().unwrap_or_default() * 2))
//! });
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod convert;
pub mod error;
pub mod handler;
pub mod invocation;
pub mod types;
pub mod value;

pub use convert::{arg, FromValue, IntoValue};
pub use error::{InstanceScope, MockError, MockResult, RaisedMessage};
pub use handler::{constructor_fn, method_fn, ConstructorFn, MockMethodFn};
pub use invocation::{Invocation, StateView};
pub use types::{builtin, params_descriptor, Primitive, Type};
pub use value::{ObjectRef, Value};
