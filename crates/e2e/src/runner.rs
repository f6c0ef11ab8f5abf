//! Suite runner: fixture-backed test invocations with workers, retries,
//! per-test timeouts and a JSON report

use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::future::BoxFuture;
use futures::{FutureExt, StreamExt};
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use shopcheck_fixture::{run_invocation, FixtureRegistry, Fixtures, Outcome};

use crate::config::SuiteConfig;
use crate::error::E2eResult;

type TestBody = Arc<dyn Fn(Fixtures) -> BoxFuture<'static, anyhow::Result<()>> + Send + Sync>;

/// One test: the fixtures it asks for and the body that receives them
pub struct TestCase {
    pub name: String,
    pub tags: Vec<String>,
    pub fixtures: Vec<String>,
    body: TestBody,
}

impl TestCase {
    pub fn new<F, Fut>(name: impl Into<String>, fixtures: &[&str], body: F) -> Self
    where
        F: Fn(Fixtures) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        Self {
            name: name.into(),
            tags: Vec::new(),
            fixtures: fixtures.iter().map(|f| f.to_string()).collect(),
            body: Arc::new(move |fixtures| body(fixtures).boxed()),
        }
    }

    pub fn tag(mut self, tag: &str) -> Self {
        self.tags.push(tag.to_string());
        self
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}

pub struct Suite {
    pub name: String,
    pub cases: Vec<TestCase>,
}

impl Suite {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            cases: Vec::new(),
        }
    }

    pub fn case(mut self, case: TestCase) -> Self {
        self.cases.push(case);
        self
    }

    pub fn cases(mut self, cases: impl IntoIterator<Item = TestCase>) -> Self {
        self.cases.extend(cases);
        self
    }

    /// Tag every case added so far
    pub fn tag_all(mut self, tag: &str) -> Self {
        for case in &mut self.cases {
            if !case.has_tag(tag) {
                case.tags.push(tag.to_string());
            }
        }
        self
    }

    pub fn len(&self) -> usize {
        self.cases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cases.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestStatus {
    Passed,
    Failed,
    SetupFailed,
    SetupTimedOut,
    TimedOut,
}

impl From<&Outcome> for TestStatus {
    fn from(outcome: &Outcome) -> Self {
        match outcome {
            Outcome::Passed => TestStatus::Passed,
            Outcome::Failed(_) => TestStatus::Failed,
            Outcome::SetupFailed(_) => TestStatus::SetupFailed,
            Outcome::SetupTimedOut(_) => TestStatus::SetupTimedOut,
            Outcome::TimedOut(_) => TestStatus::TimedOut,
        }
    }
}

/// Result of running a single test
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestResult {
    pub suite: String,
    pub name: String,
    pub status: TestStatus,
    pub attempts: u32,
    pub duration_ms: u64,
    pub error: Option<String>,
    pub teardown_errors: Vec<String>,
    pub fixtures: Vec<String>,
}

/// Result of running all tests
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TestSuiteResult {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub setup_failed: usize,
    pub setup_timed_out: usize,
    pub timed_out: usize,
    pub duration_ms: u64,
    pub results: Vec<TestResult>,
}

impl TestSuiteResult {
    pub fn success(&self) -> bool {
        self.passed == self.total
    }
}

/// Configuration for the test runner
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    pub workers: usize,
    pub retries: u32,
    pub test_timeout: Option<Duration>,
    pub tag: Option<String>,
    pub grep: Option<Regex>,
    pub output_dir: PathBuf,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self::from(&SuiteConfig::default())
    }
}

impl From<&SuiteConfig> for RunnerConfig {
    fn from(config: &SuiteConfig) -> Self {
        Self {
            workers: config.workers,
            retries: config.retries,
            test_timeout: Some(config.test_timeout()),
            tag: None,
            grep: None,
            output_dir: config.output_dir.clone(),
        }
    }
}

pub struct TestRunner {
    registry: Arc<FixtureRegistry>,
    config: RunnerConfig,
}

impl TestRunner {
    pub fn new(registry: Arc<FixtureRegistry>, config: RunnerConfig) -> Self {
        Self { registry, config }
    }

    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    /// Tests passing the tag and name filters, in declaration order
    pub fn select<'a>(&self, suites: &'a [Suite]) -> Vec<(&'a Suite, &'a TestCase)> {
        suites
            .iter()
            .flat_map(|suite| suite.cases.iter().map(move |case| (suite, case)))
            .filter(|(_, case)| self.config.tag.as_deref().map_or(true, |tag| case.has_tag(tag)))
            .filter(|(suite, case)| {
                self.config
                    .grep
                    .as_ref()
                    .map_or(true, |re| re.is_match(&case.name) || re.is_match(&suite.name))
            })
            .collect()
    }

    pub async fn run(&self, suites: &[Suite]) -> TestSuiteResult {
        let start = Instant::now();
        let selected = self.select(suites);
        let workers = self.config.workers.max(1);

        info!("Running {} test(s) with {} worker(s)...", selected.len(), workers);

        let results: Vec<TestResult> = futures::stream::iter(
            selected.into_iter().map(|(suite, case)| self.run_case(suite, case)),
        )
        .buffered(workers)
        .collect()
        .await;

        let count = |status: TestStatus| results.iter().filter(|r| r.status == status).count();
        let summary = TestSuiteResult {
            total: results.len(),
            passed: count(TestStatus::Passed),
            failed: count(TestStatus::Failed),
            setup_failed: count(TestStatus::SetupFailed),
            setup_timed_out: count(TestStatus::SetupTimedOut),
            timed_out: count(TestStatus::TimedOut),
            duration_ms: start.elapsed().as_millis() as u64,
            results,
        };

        info!("");
        info!(
            "Test Results: {} passed, {} failed, {} setup failed, {} setup timed out, {} timed out ({} ms)",
            summary.passed,
            summary.failed,
            summary.setup_failed,
            summary.setup_timed_out,
            summary.timed_out,
            summary.duration_ms
        );

        summary
    }

    /// Run one test, retrying failures up to the configured count.
    /// Wiring errors are never retried.
    pub async fn run_case(&self, suite: &Suite, case: &TestCase) -> TestResult {
        let start = Instant::now();
        let requested: Vec<&str> = case.fixtures.iter().map(String::as_str).collect();
        let mut attempts = 0;
        let mut teardown_errors = Vec::new();

        let outcome = loop {
            attempts += 1;
            debug!(suite = %suite.name, test = %case.name, attempt = attempts, "Running test");

            let body = Arc::clone(&case.body);
            let report = run_invocation(
                Arc::clone(&self.registry),
                &requested,
                self.config.test_timeout,
                move |fixtures| body(fixtures),
            )
            .await;

            for failure in &report.teardown_failures {
                warn!(test = %case.name, context = %report.context_id, "Teardown failed: {}", failure);
                teardown_errors.push(failure.to_string());
            }

            let retryable = match &report.outcome {
                Outcome::Passed => false,
                Outcome::SetupFailed(e) => !e.is_configuration(),
                Outcome::Failed(_) | Outcome::SetupTimedOut(_) | Outcome::TimedOut(_) => true,
            };
            if !retryable || attempts > self.config.retries {
                break report.outcome;
            }
            warn!(
                "Retrying {} (attempt {}/{}): {}",
                case.name,
                attempts + 1,
                self.config.retries + 1,
                report.outcome.message().unwrap_or_default()
            );
        };

        let result = TestResult {
            suite: suite.name.clone(),
            name: case.name.clone(),
            status: TestStatus::from(&outcome),
            attempts,
            duration_ms: start.elapsed().as_millis() as u64,
            error: outcome.message(),
            teardown_errors,
            fixtures: case.fixtures.clone(),
        };

        match result.status {
            TestStatus::Passed => info!("✓ {} › {} ({} ms)", result.suite, result.name, result.duration_ms),
            status => error!(
                "✗ {} › {} [{:?}] - {}",
                result.suite,
                result.name,
                status,
                result.error.as_deref().unwrap_or("unknown error")
            ),
        }

        result
    }

    /// Write test results to JSON file
    pub fn write_results(&self, results: &TestSuiteResult) -> E2eResult<PathBuf> {
        std::fs::create_dir_all(&self.config.output_dir)?;

        let path = self.config.output_dir.join("test-results.json");
        let json = serde_json::to_string_pretty(results)?;
        std::fs::write(&path, json)?;

        info!("Results written to: {}", path.display());
        Ok(path)
    }
}
