//! Operations shared by every page object

use std::time::Duration;

use regex::Regex;
use tokio::time::Instant;

use crate::error::{E2eError, E2eResult};
use crate::locator::Locator;
use crate::page::{SharedPage, WaitState};

const URL_POLL_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Clone)]
pub struct BasePage {
    page: SharedPage,
}

impl BasePage {
    pub fn new(page: SharedPage) -> Self {
        Self { page }
    }

    pub fn page(&self) -> &SharedPage {
        &self.page
    }

    /// Navigate to a path relative to the configured base URL
    pub async fn goto(&self, path: &str) -> E2eResult<()> {
        self.page.goto(path).await
    }

    pub async fn wait_for_page_load(&self) -> E2eResult<()> {
        self.page.wait_for_load_state().await
    }

    pub async fn wait_for_element(&self, locator: &Locator, timeout: Duration) -> E2eResult<()> {
        self.page.wait_for(locator, WaitState::Visible, Some(timeout)).await
    }

    /// Text of the element, empty when it has none
    pub async fn element_text(&self, locator: &Locator) -> E2eResult<String> {
        Ok(self.page.text_content(locator).await?.unwrap_or_default())
    }

    pub async fn click_element(&self, locator: &Locator) -> E2eResult<()> {
        self.page.click(locator, 1).await
    }

    pub async fn fill_field(&self, locator: &Locator, value: &str) -> E2eResult<()> {
        self.page.fill(locator, value).await
    }

    /// Assert `locator` becomes visible within the action timeout
    pub async fn expect_visible(&self, locator: &Locator) -> E2eResult<()> {
        match self.page.wait_for(locator, WaitState::Visible, None).await {
            Ok(()) => Ok(()),
            Err(E2eError::Interaction { reason, .. }) => Err(E2eError::AssertionFailed(format!(
                "expected '{}' to be visible: {}",
                locator, reason
            ))),
            Err(e) => Err(e),
        }
    }

    /// Poll the page URL until it matches `pattern`
    pub async fn wait_for_url(&self, pattern: &Regex, timeout: Duration) -> E2eResult<String> {
        let deadline = Instant::now() + timeout;
        loop {
            let url = self.page.url().await?;
            if pattern.is_match(&url) {
                return Ok(url);
            }
            if Instant::now() >= deadline {
                return Err(E2eError::interaction(
                    "wait_for_url",
                    pattern.as_str(),
                    format!("still at {} after {} ms", url, timeout.as_millis()),
                ));
            }
            tokio::time::sleep(URL_POLL_INTERVAL).await;
        }
    }

    pub async fn current_url(&self) -> E2eResult<String> {
        self.page.url().await
    }
}
