//! Error types for fixture registration and resolution

use std::fmt;

use thiserror::Error;

/// Type-erased failure raised by a constructor, teardown hook or test body
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

pub type FixtureResult<T> = Result<T, FixtureError>;

#[derive(Error, Debug)]
pub enum FixtureError {
    #[error("Fixture configuration error: {0}")]
    Configuration(String),

    #[error("Unknown fixture '{name}' (required by {required_by})")]
    UnknownFixture { name: String, required_by: String },

    #[error("Cyclic fixture dependency: {}", cycle.join(" -> "))]
    CyclicDependency { cycle: Vec<String> },

    #[error("Fixture '{name}' failed to construct: {source}")]
    Construction {
        name: String,
        #[source]
        source: BoxError,
    },

    #[error("Fixture '{name}' holds a {actual}, not a {expected}")]
    TypeMismatch {
        name: String,
        expected: &'static str,
        actual: &'static str,
    },

    #[error("Fixture '{name}' is not available in this scope")]
    NotResolved { name: String },
}

impl FixtureError {
    /// Wiring mistakes: never retried, abort before any test logic runs.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            FixtureError::Configuration(_)
                | FixtureError::UnknownFixture { .. }
                | FixtureError::CyclicDependency { .. }
                | FixtureError::TypeMismatch { .. }
        )
    }
}

/// One teardown hook that failed or panicked
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeardownFailure {
    pub name: String,
    pub message: String,
}

impl fmt::Display for TeardownFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name, self.message)
    }
}

/// Every teardown failure of one context, in the order they happened
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TeardownErrors(pub Vec<TeardownFailure>);

impl TeardownErrors {
    pub fn failures(&self) -> &[TeardownFailure] {
        &self.0
    }

    pub fn into_failures(self) -> Vec<TeardownFailure> {
        self.0
    }
}

impl fmt::Display for TeardownErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} teardown failure(s)", self.0.len())?;
        for failure in &self.0 {
            write!(f, "; {}", failure)?;
        }
        Ok(())
    }
}

impl std::error::Error for TeardownErrors {}

/// A resolution that did not complete. `cause` is the primary reason;
/// `teardown` lists failures hit while unwinding what was already built.
#[derive(Debug, Error)]
#[error("{cause}")]
pub struct SetupFailure {
    #[source]
    pub cause: FixtureError,
    pub teardown: Vec<TeardownFailure>,
}

impl From<FixtureError> for SetupFailure {
    fn from(cause: FixtureError) -> Self {
        Self {
            cause,
            teardown: Vec::new(),
        }
    }
}
