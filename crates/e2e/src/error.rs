//! Error types for the end-to-end suites

use thiserror::Error;

use shopcheck_fixture::FixtureError;

#[derive(Error, Debug)]
pub enum E2eError {
    #[error("Playwright not found. Install with: npm install playwright && npx playwright install")]
    PlaywrightNotFound,

    #[error("Playwright error: {0}")]
    Playwright(String),

    #[error("Playwright bridge exited: {0}")]
    BridgeClosed(String),

    /// An expected element or response never materialized in time
    #[error("{action} on '{target}' failed: {reason}")]
    Interaction {
        action: String,
        target: String,
        reason: String,
    },

    #[error("Login as {email} did not complete: {reason}")]
    AuthenticationSetup { email: String, reason: String },

    #[error("Assertion failed: {0}")]
    AssertionFailed(String),

    #[error("Unexpected response from {endpoint} (HTTP {status}): {reason}")]
    UnexpectedResponse {
        endpoint: String,
        status: u16,
        reason: String,
    },

    #[error("Case file {path}: {reason}")]
    CaseFile { path: String, reason: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Fixture error: {0}")]
    Fixture(#[from] FixtureError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl E2eError {
    pub fn interaction(action: impl Into<String>, target: impl Into<String>, reason: impl Into<String>) -> Self {
        E2eError::Interaction {
            action: action.into(),
            target: target.into(),
            reason: reason.into(),
        }
    }

    pub fn is_interaction(&self) -> bool {
        matches!(self, E2eError::Interaction { .. })
    }
}

pub type E2eResult<T> = Result<T, E2eError>;
