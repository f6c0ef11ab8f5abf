//! Shopcheck end-to-end suites
//!
//! UI and API suites for the automationexercise.com demo store, built on the
//! `shopcheck-fixture` dependency-injection layer:
//! - A Playwright bridge drives one browser page per fixture context over a
//!   line-delimited JSON protocol
//! - Page objects wrap the store's login, products, cart, checkout and
//!   payment screens
//! - An authenticated-session fixture logs in before the test body runs and
//!   fails setup, not the test, when login does not complete
//! - A reqwest-based client covers the store's JSON API
//! - Data-driven suites expand JSON or YAML case files into one test per row
//!
//! # Fixture graph
//!
//! ```text
//! test_data
//! request ──── api
//! page ─┬───── login_page
//!       ├───── products_page
//!       ├───── cart_page
//!       ├───── checkout_page
//!       ├───── payment_page
//!       └─┐
//! test_data ── authenticated_page
//! ```

pub mod api;
pub mod cases;
pub mod config;
pub mod data;
pub mod error;
pub mod fixtures;
pub mod locator;
pub mod page;
pub mod pages;
pub mod playwright;
pub mod runner;
pub mod session;
pub mod suites;

#[cfg(test)]
mod mock;

pub use api::{ApiClient, ApiResponse, RequestContext};
pub use config::SuiteConfig;
pub use data::{Credentials, TestData};
pub use error::{E2eError, E2eResult};
pub use fixtures::standard_registry;
pub use locator::Locator;
pub use page::{PageHandle, ResourceProvider, SharedPage};
pub use playwright::{Browser, PlaywrightProvider};
pub use runner::{RunnerConfig, Suite, TestCase, TestRunner, TestStatus, TestSuiteResult};
pub use session::AuthenticatedSession;
