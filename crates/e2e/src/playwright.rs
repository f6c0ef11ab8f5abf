//! Playwright browser automation over a long-running node bridge
//!
//! Each [`PlaywrightSession`] owns one `node` process running a generated
//! bridge script that launches the browser, opens a context with the base
//! URL and viewport, and serves page commands as line-delimited JSON on
//! stdin/stdout.

use std::fmt;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::process::{Child, ChildStdin, ChildStdout, Command as TokioCommand};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::api::RequestContext;
use crate::config::SuiteConfig;
use crate::error::{E2eError, E2eResult};
use crate::locator::Locator;
use crate::page::{PageHandle, ResourceProvider, SharedPage, WaitState};

/// Slack on top of a command's own timeout before the bridge is considered hung
const BRIDGE_GRACE: Duration = Duration::from_secs(2);

/// Browser launch and first page
const LAUNCH_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Browser {
    #[default]
    Chromium,
    Firefox,
    Webkit,
}

impl Browser {
    pub fn as_str(&self) -> &'static str {
        match self {
            Browser::Chromium => "chromium",
            Browser::Firefox => "firefox",
            Browser::Webkit => "webkit",
        }
    }
}

impl fmt::Display for Browser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Browser {
    type Err = E2eError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "chromium" | "chrome" => Ok(Browser::Chromium),
            "firefox" => Ok(Browser::Firefox),
            "webkit" | "safari" => Ok(Browser::Webkit),
            other => Err(E2eError::Config(format!("unknown browser '{}'", other))),
        }
    }
}

/// Configuration for Playwright
#[derive(Debug, Clone)]
pub struct PlaywrightConfig {
    pub base_url: String,
    pub viewport_width: u32,
    pub viewport_height: u32,
    pub browser: Browser,
    pub headless: bool,
    pub action_timeout: Duration,
    pub navigation_timeout: Duration,
    /// Handed to node as `NODE_PATH`
    pub node_modules: PathBuf,
}

impl Default for PlaywrightConfig {
    fn default() -> Self {
        SuiteConfig::default().playwright()
    }
}

/// Check if Playwright is installed
pub fn check_playwright_installed() -> E2eResult<()> {
    let output = Command::new("npx")
        .args(["playwright", "--version"])
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status();

    match output {
        Ok(status) if status.success() => Ok(()),
        _ => Err(E2eError::PlaywrightNotFound),
    }
}

/// Build the bridge script for one session
pub fn build_bridge_script(config: &PlaywrightConfig) -> E2eResult<String> {
    let base_url = serde_json::to_string(&config.base_url)?;

    Ok(format!(
        r#"
const playwright = require('playwright');
const readline = require('readline');

const reply = (message) => process.stdout.write(JSON.stringify(message) + '\n');

(async () => {{
  const browser = await playwright.{browser}.launch({{ headless: {headless} }});
  const context = await browser.newContext({{
    baseURL: {base_url},
    viewport: {{ width: {width}, height: {height} }}
  }});
  context.setDefaultTimeout({action_ms});
  context.setDefaultNavigationTimeout({navigation_ms});
  const page = await context.newPage();

  const handlers = {{
    goto: (c) => page.goto(c.url).then(() => null),
    waitForLoadState: (c) => page.waitForLoadState(c.state),
    waitFor: (c) => page.locator(c.selector).waitFor({{ state: c.state, timeout: c.timeout }}),
    click: (c) => page.locator(c.selector).click({{ clickCount: c.clickCount }}),
    fill: (c) => page.locator(c.selector).fill(c.value),
    textContent: (c) => page.locator(c.selector).textContent(),
    isVisible: (c) => page.locator(c.selector).isVisible(),
    count: (c) => page.locator(c.selector).count(),
    url: () => page.url(),
    press: (c) => page.keyboard.press(c.key),
    type: (c) => page.keyboard.type(c.text),
    close: () => page.close(),
  }};

  reply({{ ready: true }});

  const input = readline.createInterface({{ input: process.stdin }});
  for await (const line of input) {{
    if (!line.trim()) continue;
    let command;
    try {{
      command = JSON.parse(line);
    }} catch (error) {{
      process.stderr.write('unparseable command: ' + line + '\n');
      continue;
    }}
    try {{
      const handler = handlers[command.op];
      if (!handler) throw new Error('unknown op ' + command.op);
      const value = await handler(command);
      reply({{ id: command.id, ok: true, value: value === undefined ? null : value }});
    }} catch (error) {{
      reply({{ id: command.id, ok: false, error: error.message, timeout: error.name === 'TimeoutError' }});
    }}
    if (command.op === 'close') break;
  }}

  await browser.close();
}})().catch((error) => {{
  process.stderr.write(String((error && error.stack) || error) + '\n');
  process.exit(1);
}});
"#,
        browser = config.browser.as_str(),
        headless = config.headless,
        base_url = base_url,
        width = config.viewport_width,
        height = config.viewport_height,
        action_ms = config.action_timeout.as_millis(),
        navigation_ms = config.navigation_timeout.as_millis(),
    ))
}

/// Page commands understood by the bridge
#[derive(Debug, Serialize)]
#[serde(tag = "op", rename_all = "camelCase")]
enum BridgeCommand<'a> {
    Goto {
        url: &'a str,
    },
    WaitForLoadState {
        state: &'a str,
    },
    WaitFor {
        selector: &'a str,
        state: WaitState,
        timeout: u64,
    },
    Click {
        selector: &'a str,
        #[serde(rename = "clickCount")]
        click_count: u32,
    },
    Fill {
        selector: &'a str,
        value: &'a str,
    },
    TextContent {
        selector: &'a str,
    },
    IsVisible {
        selector: &'a str,
    },
    Count {
        selector: &'a str,
    },
    Url,
    Press {
        key: &'a str,
    },
    Type {
        text: &'a str,
    },
    Close,
}

impl BridgeCommand<'_> {
    fn action(&self) -> &'static str {
        match self {
            BridgeCommand::Goto { .. } => "goto",
            BridgeCommand::WaitForLoadState { .. } => "wait_for_load_state",
            BridgeCommand::WaitFor { .. } => "wait_for",
            BridgeCommand::Click { .. } => "click",
            BridgeCommand::Fill { .. } => "fill",
            BridgeCommand::TextContent { .. } => "text_content",
            BridgeCommand::IsVisible { .. } => "is_visible",
            BridgeCommand::Count { .. } => "count",
            BridgeCommand::Url => "url",
            BridgeCommand::Press { .. } => "press",
            BridgeCommand::Type { .. } => "type",
            BridgeCommand::Close => "close",
        }
    }

    fn target(&self) -> &str {
        match self {
            BridgeCommand::Goto { url } => url,
            BridgeCommand::WaitFor { selector, .. }
            | BridgeCommand::Click { selector, .. }
            | BridgeCommand::Fill { selector, .. }
            | BridgeCommand::TextContent { selector }
            | BridgeCommand::IsVisible { selector }
            | BridgeCommand::Count { selector } => selector,
            BridgeCommand::Press { key } => key,
            BridgeCommand::WaitForLoadState { state } => state,
            BridgeCommand::Type { .. } => "keyboard",
            BridgeCommand::Url | BridgeCommand::Close => "page",
        }
    }
}

#[derive(Serialize)]
struct Envelope<'a> {
    id: u64,
    #[serde(flatten)]
    command: BridgeCommand<'a>,
}

#[derive(Debug, Deserialize)]
struct BridgeReply {
    #[serde(default)]
    id: Option<u64>,
    #[serde(default)]
    ready: bool,
    #[serde(default)]
    ok: bool,
    #[serde(default)]
    value: serde_json::Value,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    timeout: bool,
}

struct BridgeIo {
    child: Child,
    stdin: ChildStdin,
    stdout: Lines<BufReader<ChildStdout>>,
}

impl BridgeIo {
    /// Next parsed reply; non-JSON output is logged and skipped
    async fn next_reply(&mut self) -> E2eResult<BridgeReply> {
        loop {
            let line = self
                .stdout
                .next_line()
                .await?
                .ok_or_else(|| E2eError::BridgeClosed("stdout closed".to_string()))?;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            match serde_json::from_str::<BridgeReply>(line) {
                Ok(reply) => return Ok(reply),
                Err(_) => debug!("[bridge] {}", line),
            }
        }
    }

    /// Reply for `id`, discarding late replies to abandoned commands
    async fn reply_for(&mut self, id: u64) -> E2eResult<BridgeReply> {
        loop {
            let reply = self.next_reply().await?;
            if reply.id == Some(id) {
                return Ok(reply);
            }
            debug!(expected = id, got = ?reply.id, "Discarding stale bridge reply");
        }
    }
}

/// One browser page driven through a dedicated node process
pub struct PlaywrightSession {
    io: Mutex<BridgeIo>,
    next_id: AtomicU64,
    closed: AtomicBool,
    pid: Option<u32>,
    action_timeout: Duration,
    navigation_timeout: Duration,
    // Holds the bridge script until the process is gone
    _workdir: tempfile::TempDir,
}

impl PlaywrightSession {
    /// Spawn the bridge and wait until the page is open
    pub async fn launch(config: &PlaywrightConfig) -> E2eResult<Self> {
        let workdir = tempfile::tempdir()?;
        let script_path = workdir.path().join("bridge.js");
        std::fs::write(&script_path, build_bridge_script(config)?)?;

        let mut command = TokioCommand::new("node");
        command
            .arg(&script_path)
            .current_dir(workdir.path())
            .env("NODE_PATH", node_path(&config.node_modules))
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = command
            .spawn()
            .map_err(|e| E2eError::Playwright(format!("Failed to spawn node: {}", e)))?;
        let pid = child.id();

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| E2eError::Playwright("bridge stdin unavailable".to_string()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| E2eError::Playwright("bridge stdout unavailable".to_string()))?;
        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(async move {
                let mut lines = BufReader::new(stderr).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    warn!(pid = ?pid, "[bridge stderr] {}", line);
                }
            });
        }

        let mut io = BridgeIo {
            child,
            stdin,
            stdout: BufReader::new(stdout).lines(),
        };

        let ready = tokio::time::timeout(LAUNCH_TIMEOUT, async {
            loop {
                if io.next_reply().await?.ready {
                    return Ok::<_, E2eError>(());
                }
            }
        })
        .await;
        match ready {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(e),
            Err(_) => {
                return Err(E2eError::Playwright(format!(
                    "{} did not open a page within {} s",
                    config.browser,
                    LAUNCH_TIMEOUT.as_secs()
                )))
            }
        }

        info!(pid = ?pid, browser = %config.browser, "Playwright session ready");

        Ok(Self {
            io: Mutex::new(io),
            next_id: AtomicU64::new(1),
            closed: AtomicBool::new(false),
            pid,
            action_timeout: config.action_timeout,
            navigation_timeout: config.navigation_timeout,
            _workdir: workdir,
        })
    }

    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    async fn call(&self, command: BridgeCommand<'_>, limit: Duration) -> E2eResult<serde_json::Value> {
        if self.closed.load(Ordering::Acquire) {
            return Err(E2eError::BridgeClosed("session already closed".to_string()));
        }

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let action = command.action();
        let target = command.target().to_string();
        let mut line = serde_json::to_string(&Envelope { id, command })?;
        line.push('\n');

        let mut io = self.io.lock().await;
        debug!(pid = ?self.pid, id, action, target = %target, "Bridge command");
        io.stdin.write_all(line.as_bytes()).await?;
        io.stdin.flush().await?;

        let reply = match tokio::time::timeout(limit + BRIDGE_GRACE, io.reply_for(id)).await {
            Ok(reply) => reply?,
            Err(_) => {
                return Err(E2eError::interaction(
                    action,
                    target,
                    format!("no reply within {} ms", (limit + BRIDGE_GRACE).as_millis()),
                ))
            }
        };

        if reply.ok {
            Ok(reply.value)
        } else {
            let reason = reply.error.unwrap_or_else(|| "unknown bridge error".to_string());
            if reply.timeout {
                Err(E2eError::interaction(action, target, reason))
            } else {
                Err(E2eError::Playwright(format!("{} '{}': {}", action, target, reason)))
            }
        }
    }
}

#[async_trait]
impl PageHandle for PlaywrightSession {
    async fn goto(&self, path: &str) -> E2eResult<()> {
        self.call(BridgeCommand::Goto { url: path }, self.navigation_timeout).await?;
        Ok(())
    }

    async fn wait_for_load_state(&self) -> E2eResult<()> {
        self.call(
            BridgeCommand::WaitForLoadState {
                state: "domcontentloaded",
            },
            self.navigation_timeout,
        )
        .await?;
        Ok(())
    }

    async fn wait_for(&self, locator: &Locator, state: WaitState, timeout: Option<Duration>) -> E2eResult<()> {
        let limit = timeout.unwrap_or(self.action_timeout);
        self.call(
            BridgeCommand::WaitFor {
                selector: locator.selector(),
                state,
                timeout: limit.as_millis() as u64,
            },
            limit,
        )
        .await?;
        Ok(())
    }

    async fn click(&self, locator: &Locator, click_count: u32) -> E2eResult<()> {
        self.call(
            BridgeCommand::Click {
                selector: locator.selector(),
                click_count,
            },
            self.action_timeout,
        )
        .await?;
        Ok(())
    }

    async fn fill(&self, locator: &Locator, value: &str) -> E2eResult<()> {
        self.call(
            BridgeCommand::Fill {
                selector: locator.selector(),
                value,
            },
            self.action_timeout,
        )
        .await?;
        Ok(())
    }

    async fn text_content(&self, locator: &Locator) -> E2eResult<Option<String>> {
        let value = self
            .call(
                BridgeCommand::TextContent {
                    selector: locator.selector(),
                },
                self.action_timeout,
            )
            .await?;
        Ok(serde_json::from_value(value)?)
    }

    async fn is_visible(&self, locator: &Locator) -> E2eResult<bool> {
        let value = self
            .call(
                BridgeCommand::IsVisible {
                    selector: locator.selector(),
                },
                self.action_timeout,
            )
            .await?;
        Ok(serde_json::from_value(value)?)
    }

    async fn count(&self, locator: &Locator) -> E2eResult<usize> {
        let value = self
            .call(
                BridgeCommand::Count {
                    selector: locator.selector(),
                },
                self.action_timeout,
            )
            .await?;
        Ok(serde_json::from_value(value)?)
    }

    async fn url(&self) -> E2eResult<String> {
        let value = self.call(BridgeCommand::Url, self.action_timeout).await?;
        Ok(serde_json::from_value(value)?)
    }

    async fn press(&self, key: &str) -> E2eResult<()> {
        self.call(BridgeCommand::Press { key }, self.action_timeout).await?;
        Ok(())
    }

    async fn type_text(&self, text: &str) -> E2eResult<()> {
        self.call(BridgeCommand::Type { text }, self.action_timeout).await?;
        Ok(())
    }

    async fn close(&self) -> E2eResult<()> {
        if self.closed.load(Ordering::Acquire) {
            return Ok(());
        }
        let result = self.call(BridgeCommand::Close, self.action_timeout).await;
        self.closed.store(true, Ordering::Release);

        let mut io = self.io.lock().await;
        match tokio::time::timeout(BRIDGE_GRACE, io.child.wait()).await {
            Ok(Ok(status)) => debug!(pid = ?self.pid, %status, "Bridge exited"),
            _ => {
                warn!(pid = ?self.pid, "Bridge did not exit after close, killing it");
                io.child.kill().await?;
            }
        }
        result.map(|_| ())
    }
}

fn node_path(node_modules: &Path) -> PathBuf {
    std::fs::canonicalize(node_modules).unwrap_or_else(|_| node_modules.to_path_buf())
}

/// Real resource provider: a fresh browser process per page and a fresh
/// HTTP client per request context
pub struct PlaywrightProvider {
    playwright: PlaywrightConfig,
    api_base_url: String,
    request_timeout: Duration,
}

impl PlaywrightProvider {
    pub fn new(config: &SuiteConfig) -> Self {
        Self {
            playwright: config.playwright(),
            api_base_url: config.api_base_url.clone(),
            request_timeout: config.request_timeout(),
        }
    }

    pub fn playwright_config(&self) -> &PlaywrightConfig {
        &self.playwright
    }
}

#[async_trait]
impl ResourceProvider for PlaywrightProvider {
    async fn new_page(&self) -> E2eResult<SharedPage> {
        let session = PlaywrightSession::launch(&self.playwright).await?;
        Ok(std::sync::Arc::new(session))
    }

    async fn new_request_context(&self) -> E2eResult<RequestContext> {
        RequestContext::new(&self.api_base_url, self.request_timeout)
    }
}
