//! Suite configuration: defaults, optional TOML file, SHOPCHECK_* overrides

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{E2eError, E2eResult};
use crate::playwright::{Browser, PlaywrightConfig};

/// Everything the runner, the resource providers and the fixtures need
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SuiteConfig {
    /// Storefront root; page paths are resolved against it
    pub base_url: String,

    /// Root of the JSON API
    pub api_base_url: String,

    pub browser: Browser,

    pub headless: bool,

    pub viewport_width: u32,
    pub viewport_height: u32,

    /// Bounded wait for element interactions
    pub action_timeout_ms: u64,

    pub navigation_timeout_ms: u64,

    /// How long the authenticated-session fixture waits for "Logged in as"
    pub login_timeout_ms: u64,

    pub request_timeout_ms: u64,

    /// Overall limit for one test invocation, setup included
    pub test_timeout_ms: u64,

    /// Extra attempts for a failed test
    pub retries: u32,

    /// Test invocations running at once
    pub workers: usize,

    /// Directory holding the `playwright` node package
    pub node_modules: PathBuf,

    /// Data-driven case files
    pub data_dir: PathBuf,

    pub output_dir: PathBuf,
}

impl Default for SuiteConfig {
    fn default() -> Self {
        Self {
            base_url: "https://automationexercise.com".to_string(),
            api_base_url: "https://automationexercise.com/api".to_string(),
            browser: Browser::Chromium,
            headless: true,
            viewport_width: 1280,
            viewport_height: 720,
            action_timeout_ms: 5_000,
            navigation_timeout_ms: 30_000,
            login_timeout_ms: 10_000,
            request_timeout_ms: 10_000,
            test_timeout_ms: 60_000,
            retries: 0,
            workers: 1,
            node_modules: PathBuf::from("node_modules"),
            data_dir: PathBuf::from(concat!(env!("CARGO_MANIFEST_DIR"), "/data-driven")),
            output_dir: PathBuf::from("test-results"),
        }
    }
}

impl SuiteConfig {
    /// Load configuration from file; a missing file yields the defaults
    pub fn load(path: &Path) -> E2eResult<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Self = toml::from_str(&content)?;
            debug!("Loaded suite configuration from {}", path.display());
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Apply `SHOPCHECK_*` environment overrides
    pub fn apply_env(&mut self) -> E2eResult<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    pub fn apply_overrides<F>(&mut self, lookup: F) -> E2eResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("SHOPCHECK_BASE_URL") {
            self.base_url = v;
        }
        if let Some(v) = lookup("SHOPCHECK_API_BASE_URL") {
            self.api_base_url = v;
        }
        if let Some(v) = lookup("SHOPCHECK_BROWSER") {
            self.browser = v.parse()?;
        }
        if let Some(v) = lookup("SHOPCHECK_HEADLESS") {
            self.headless = parse_flag("SHOPCHECK_HEADLESS", &v)?;
        }
        if let Some(v) = lookup("SHOPCHECK_WORKERS") {
            self.workers = parse_number("SHOPCHECK_WORKERS", &v)?;
        }
        if let Some(v) = lookup("SHOPCHECK_RETRIES") {
            self.retries = parse_number("SHOPCHECK_RETRIES", &v)?;
        }
        if let Some(v) = lookup("SHOPCHECK_NODE_MODULES") {
            self.node_modules = PathBuf::from(v);
        }
        if let Some(v) = lookup("SHOPCHECK_DATA_DIR") {
            self.data_dir = PathBuf::from(v);
        }
        Ok(())
    }

    pub fn validate(&self) -> E2eResult<()> {
        if self.base_url.is_empty() || self.api_base_url.is_empty() {
            return Err(E2eError::Config("base_url and api_base_url must be set".to_string()));
        }
        if self.workers == 0 {
            return Err(E2eError::Config("workers must be at least 1".to_string()));
        }
        if self.action_timeout_ms == 0 || self.login_timeout_ms == 0 {
            return Err(E2eError::Config("timeouts must be non-zero".to_string()));
        }
        Ok(())
    }

    pub fn action_timeout(&self) -> Duration {
        Duration::from_millis(self.action_timeout_ms)
    }

    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_millis(self.navigation_timeout_ms)
    }

    pub fn login_timeout(&self) -> Duration {
        Duration::from_millis(self.login_timeout_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn test_timeout(&self) -> Duration {
        Duration::from_millis(self.test_timeout_ms)
    }

    pub fn playwright(&self) -> PlaywrightConfig {
        PlaywrightConfig {
            base_url: self.base_url.clone(),
            viewport_width: self.viewport_width,
            viewport_height: self.viewport_height,
            browser: self.browser,
            headless: self.headless,
            action_timeout: self.action_timeout(),
            navigation_timeout: self.navigation_timeout(),
            node_modules: self.node_modules.clone(),
        }
    }
}

fn parse_flag(key: &str, value: &str) -> E2eResult<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Ok(true),
        "0" | "false" | "no" => Ok(false),
        other => Err(E2eError::Config(format!("{} must be a boolean, got '{}'", key, other))),
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> E2eResult<T> {
    value
        .trim()
        .parse()
        .map_err(|_| E2eError::Config(format!("{} must be a number, got '{}'", key, value)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults_point_at_demo_store() {
        let config = SuiteConfig::default();
        assert_eq!(config.base_url, "https://automationexercise.com");
        assert_eq!(config.action_timeout(), Duration::from_secs(5));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = SuiteConfig::load(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.workers, 1);
    }

    #[test]
    fn test_partial_toml_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shopcheck.toml");
        std::fs::write(&path, "browser = \"firefox\"\nworkers = 4\nretries = 1\n").unwrap();

        let config = SuiteConfig::load(&path).unwrap();
        assert_eq!(config.browser, Browser::Firefox);
        assert_eq!(config.workers, 4);
        assert_eq!(config.retries, 1);
        assert_eq!(config.viewport_width, 1280);
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("SHOPCHECK_BASE_URL", "http://localhost:8080"),
            ("SHOPCHECK_HEADLESS", "false"),
            ("SHOPCHECK_WORKERS", "3"),
        ]
        .into_iter()
        .collect();

        let mut config = SuiteConfig::default();
        config
            .apply_overrides(|key| env.get(key).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.base_url, "http://localhost:8080");
        assert!(!config.headless);
        assert_eq!(config.workers, 3);
        assert_eq!(config.api_base_url, "https://automationexercise.com/api");
    }

    #[test]
    fn test_bad_override_is_config_error() {
        let mut config = SuiteConfig::default();
        let err = config
            .apply_overrides(|key| (key == "SHOPCHECK_WORKERS").then(|| "many".to_string()))
            .unwrap_err();
        assert!(matches!(err, E2eError::Config(_)));
    }

    #[test]
    fn test_zero_workers_rejected() {
        let config = SuiteConfig {
            workers: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
