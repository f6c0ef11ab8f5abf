//! Resource handles: the browser page seen by Page Objects and the
//! provider that hands out fresh pages and request contexts

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::api::RequestContext;
use crate::error::E2eResult;
use crate::locator::Locator;

/// Element state to wait for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WaitState {
    Visible,
    Hidden,
    Attached,
    Detached,
}

impl WaitState {
    pub fn as_str(&self) -> &'static str {
        match self {
            WaitState::Visible => "visible",
            WaitState::Hidden => "hidden",
            WaitState::Attached => "attached",
            WaitState::Detached => "detached",
        }
    }
}

/// One navigable browser page.
///
/// Every element operation waits at most the page's action timeout and
/// fails with [`E2eError::Interaction`](crate::error::E2eError::Interaction)
/// when the element never shows up.
#[async_trait]
pub trait PageHandle: Send + Sync {
    /// Navigate to `path`, resolved against the base URL
    async fn goto(&self, path: &str) -> E2eResult<()>;

    /// Wait for `domcontentloaded`
    async fn wait_for_load_state(&self) -> E2eResult<()>;

    /// Wait until `locator` reaches `state`; `None` uses the action timeout
    async fn wait_for(&self, locator: &Locator, state: WaitState, timeout: Option<Duration>) -> E2eResult<()>;

    async fn click(&self, locator: &Locator, click_count: u32) -> E2eResult<()>;

    async fn fill(&self, locator: &Locator, value: &str) -> E2eResult<()>;

    async fn text_content(&self, locator: &Locator) -> E2eResult<Option<String>>;

    /// Immediate check, never waits
    async fn is_visible(&self, locator: &Locator) -> E2eResult<bool>;

    async fn count(&self, locator: &Locator) -> E2eResult<usize>;

    async fn url(&self) -> E2eResult<String>;

    /// Keyboard press on the focused element
    async fn press(&self, key: &str) -> E2eResult<()>;

    /// Keyboard typing on the focused element
    async fn type_text(&self, text: &str) -> E2eResult<()>;

    async fn close(&self) -> E2eResult<()>;
}

pub type SharedPage = Arc<dyn PageHandle>;

/// Source of resource handles. Every call yields an independent handle
/// with its own lifecycle.
#[async_trait]
pub trait ResourceProvider: Send + Sync {
    async fn new_page(&self) -> E2eResult<SharedPage>;

    async fn new_request_context(&self) -> E2eResult<RequestContext>;
}
