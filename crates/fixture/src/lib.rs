//! Shopcheck fixture layer
//!
//! A small dependency-injection framework for test invocations:
//! - A process-wide [`FixtureRegistry`] maps fixture names to async
//!   constructors and their declared dependencies
//! - A [`FixtureContext`] resolves the transitive dependency closure of the
//!   fixtures one test asks for, constructs each exactly once, and tears
//!   everything down in reverse construction order
//! - [`run_invocation`] wraps one test body with resolution, an overall
//!   deadline and guaranteed teardown
//!
//! # Lifecycle
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │ startup                                                      │
//! │   FixtureRegistry::register(name, deps, ctor)  (repeatable)  │
//! │   FixtureRegistry::freeze() -> Arc<FixtureRegistry>          │
//! ├──────────────────────────────────────────────────────────────┤
//! │ per test invocation                                          │
//! │   FixtureContext::resolve(requested)                         │
//! │     ├── plan: depth-first topological order (cycle check)    │
//! │     └── construct each name once, dependencies first         │
//! │   body(Fixtures)                                             │
//! │   FixtureContext::teardown()  (reverse order, collect errors)│
//! └──────────────────────────────────────────────────────────────┘
//! ```

pub mod error;
pub mod graph;
pub mod invocation;
pub mod registry;
pub mod resolver;
pub mod value;

pub use error::{
    BoxError, FixtureError, FixtureResult, SetupFailure, TeardownErrors, TeardownFailure,
};
pub use invocation::{run_invocation, InvocationReport, Outcome};
pub use registry::{global, install, FixtureDescriptor, FixtureRegistry};
pub use resolver::{FixtureContext, FixtureInstance};
pub use value::{Fixtures, Key, Provided};

/// Name reported as the requester of fixtures a test asks for directly
pub const TEST_REQUESTER: &str = "<test>";

pub(crate) fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
