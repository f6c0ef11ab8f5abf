//! Scripted in-memory page for exercising page objects and fixtures
//! without a browser

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::api::RequestContext;
use crate::error::{E2eError, E2eResult};
use crate::locator::Locator;
use crate::page::{PageHandle, ResourceProvider, SharedPage, WaitState};

const MOCK_ORIGIN: &str = "https://shop.test";

#[derive(Debug, Clone)]
pub struct MockElement {
    pub visible: bool,
    pub text: Option<String>,
    pub count: usize,
}

/// State change applied when a selector is clicked
#[derive(Debug, Clone)]
pub enum Reaction {
    Show(String, Option<String>),
    Hide(String),
    Remove(String),
    Navigate(String),
}

#[derive(Default)]
struct MockState {
    elements: HashMap<String, MockElement>,
    reactions: HashMap<String, Vec<Reaction>>,
    url: String,
    actions: Vec<String>,
    closed: bool,
}

pub struct MockPage {
    state: Mutex<MockState>,
}

impl MockPage {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MockState {
                url: "about:blank".to_string(),
                ..Default::default()
            }),
        }
    }

    pub fn element(&self, selector: &str, visible: bool, text: Option<&str>) {
        self.state.lock().elements.insert(
            selector.to_string(),
            MockElement {
                visible,
                text: text.map(String::from),
                count: 1,
            },
        );
    }

    pub fn set_count(&self, selector: &str, count: usize) {
        let mut state = self.state.lock();
        let element = state.elements.entry(selector.to_string()).or_insert(MockElement {
            visible: true,
            text: None,
            count: 0,
        });
        element.count = count;
    }

    pub fn on_click(&self, selector: &str, reaction: Reaction) {
        self.state
            .lock()
            .reactions
            .entry(selector.to_string())
            .or_default()
            .push(reaction);
    }

    pub fn actions(&self) -> Vec<String> {
        self.state.lock().actions.clone()
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    fn record(&self, action: String) -> E2eResult<()> {
        let mut state = self.state.lock();
        if state.closed {
            return Err(E2eError::BridgeClosed("page closed".to_string()));
        }
        state.actions.push(action);
        Ok(())
    }

    fn visible(&self, selector: &str) -> bool {
        self.state
            .lock()
            .elements
            .get(selector)
            .map(|e| e.visible && e.count > 0)
            .unwrap_or(false)
    }
}

fn apply(state: &mut MockState, reaction: Reaction) {
    match reaction {
        Reaction::Show(selector, text) => {
            state.elements.insert(
                selector,
                MockElement {
                    visible: true,
                    text,
                    count: 1,
                },
            );
        }
        Reaction::Hide(selector) => {
            if let Some(element) = state.elements.get_mut(&selector) {
                element.visible = false;
            }
        }
        Reaction::Remove(selector) => {
            state.elements.remove(&selector);
        }
        Reaction::Navigate(path) => state.url = format!("{}{}", MOCK_ORIGIN, path),
    }
}

#[async_trait]
impl PageHandle for MockPage {
    async fn goto(&self, path: &str) -> E2eResult<()> {
        self.record(format!("goto {}", path))?;
        self.state.lock().url = format!("{}{}", MOCK_ORIGIN, path);
        Ok(())
    }

    async fn wait_for_load_state(&self) -> E2eResult<()> {
        self.record("wait_for_load_state".to_string())
    }

    async fn wait_for(&self, locator: &Locator, state: WaitState, _timeout: Option<Duration>) -> E2eResult<()> {
        self.record(format!("wait_for {} {}", locator, state.as_str()))?;
        let present = self.state.lock().elements.contains_key(locator.selector());
        let reached = match state {
            WaitState::Visible => self.visible(locator.selector()),
            WaitState::Hidden => !self.visible(locator.selector()),
            WaitState::Attached => present,
            WaitState::Detached => !present,
        };
        if reached {
            Ok(())
        } else {
            Err(E2eError::interaction(
                "wait_for",
                locator.selector(),
                format!("never became {}", state.as_str()),
            ))
        }
    }

    async fn click(&self, locator: &Locator, click_count: u32) -> E2eResult<()> {
        if !self.visible(locator.selector()) {
            return Err(E2eError::interaction("click", locator.selector(), "element not visible"));
        }
        self.record(format!("click {} x{}", locator, click_count))?;
        let mut state = self.state.lock();
        let reactions = state.reactions.get(locator.selector()).cloned().unwrap_or_default();
        for reaction in reactions {
            apply(&mut state, reaction);
        }
        Ok(())
    }

    async fn fill(&self, locator: &Locator, value: &str) -> E2eResult<()> {
        if !self.visible(locator.selector()) {
            return Err(E2eError::interaction("fill", locator.selector(), "element not visible"));
        }
        self.record(format!("fill {}={}", locator, value))
    }

    async fn text_content(&self, locator: &Locator) -> E2eResult<Option<String>> {
        self.state
            .lock()
            .elements
            .get(locator.selector())
            .map(|e| e.text.clone())
            .ok_or_else(|| E2eError::interaction("text_content", locator.selector(), "no such element"))
    }

    async fn is_visible(&self, locator: &Locator) -> E2eResult<bool> {
        Ok(self.visible(locator.selector()))
    }

    async fn count(&self, locator: &Locator) -> E2eResult<usize> {
        Ok(self
            .state
            .lock()
            .elements
            .get(locator.selector())
            .map(|e| e.count)
            .unwrap_or(0))
    }

    async fn url(&self) -> E2eResult<String> {
        Ok(self.state.lock().url.clone())
    }

    async fn press(&self, key: &str) -> E2eResult<()> {
        self.record(format!("press {}", key))
    }

    async fn type_text(&self, text: &str) -> E2eResult<()> {
        self.record(format!("type {}", text))
    }

    async fn close(&self) -> E2eResult<()> {
        self.record("close".to_string())?;
        self.state.lock().closed = true;
        Ok(())
    }
}

type PageScript = Arc<dyn Fn(&MockPage) + Send + Sync>;

/// Hands out fresh scripted pages and records every one of them
pub struct MockProvider {
    script: PageScript,
    pages: Mutex<Vec<Arc<MockPage>>>,
}

impl MockProvider {
    pub fn new<F>(script: F) -> Self
    where
        F: Fn(&MockPage) + Send + Sync + 'static,
    {
        Self {
            script: Arc::new(script),
            pages: Mutex::new(Vec::new()),
        }
    }

    pub fn pages(&self) -> Vec<Arc<MockPage>> {
        self.pages.lock().clone()
    }
}

#[async_trait]
impl ResourceProvider for MockProvider {
    async fn new_page(&self) -> E2eResult<SharedPage> {
        let page = Arc::new(MockPage::new());
        (self.script)(&page);
        self.pages.lock().push(Arc::clone(&page));
        Ok(page)
    }

    async fn new_request_context(&self) -> E2eResult<RequestContext> {
        RequestContext::new("http://127.0.0.1:9/api", Duration::from_millis(200))
    }
}
