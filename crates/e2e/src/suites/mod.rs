//! Live suites against the demo store

mod api_login;
mod api_negative;
mod api_products;
mod api_users;
mod integration;
mod ui_cart;
mod ui_checkout;
mod ui_login;

use std::sync::Arc;

use shopcheck_fixture::{FixtureContext, FixtureRegistry};
use tracing::warn;

use crate::cases::{unclaimed_case_files, ApiLoginCase, CartCase, CheckoutCommentCase, DataCase, LoginCase};
use crate::config::SuiteConfig;
use crate::error::E2eResult;
use crate::fixtures::PAGE;
use crate::runner::{Suite, TestCase};

/// Case files the data-driven suites read
pub const CASE_FILE_STEMS: [&str; 4] = [
    LoginCase::FILE_STEM,
    ApiLoginCase::FILE_STEM,
    CartCase::FILE_STEM,
    CheckoutCommentCase::FILE_STEM,
];

/// Every suite, data-driven ones expanded from the case files
pub fn all(config: &SuiteConfig) -> E2eResult<Vec<Suite>> {
    let data_dir = &config.data_dir;
    let mut suites = Vec::new();
    suites.extend(ui_login::suites(data_dir)?);
    suites.extend(ui_cart::suites(data_dir)?);
    suites.extend(ui_checkout::suites(data_dir)?);
    suites.extend(api_login::suites(data_dir)?);
    suites.push(api_products::suite());
    suites.push(api_users::suite());
    suites.push(api_negative::suite());
    suites.push(integration::suite());

    for path in unclaimed_case_files(data_dir, &CASE_FILE_STEMS) {
        warn!("Case file {} is not read by any suite", path.display());
    }
    Ok(suites)
}

/// Whether any of `cases` pulls in a browser page, directly or through
/// a dependency
pub fn needs_browser<'a>(registry: &Arc<FixtureRegistry>, cases: impl IntoIterator<Item = &'a TestCase>) -> bool {
    let context = FixtureContext::new(Arc::clone(registry));
    cases.into_iter().any(|case| {
        let requested: Vec<&str> = case.fixtures.iter().map(String::as_str).collect();
        context
            .plan(&requested)
            .map(|order| order.iter().any(|name| name == PAGE.name()))
            .unwrap_or(false)
    })
}
