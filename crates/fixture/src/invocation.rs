//! One test invocation: resolve, run, always tear down

use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::FutureExt;
use tokio::time::Instant as Deadline;
use tracing::debug;
use uuid::Uuid;

use crate::error::{BoxError, FixtureError, TeardownFailure};
use crate::panic_message;
use crate::registry::FixtureRegistry;
use crate::resolver::FixtureContext;
use crate::value::Fixtures;

/// How an invocation ended.
///
/// `SetupFailed` and `SetupTimedOut` are kept apart from `Failed` and
/// `TimedOut` so a broken or slow fixture is never mistaken for a failing
/// or slow test body.
#[derive(Debug)]
pub enum Outcome {
    Passed,
    Failed(BoxError),
    SetupFailed(FixtureError),
    /// The deadline passed while fixtures were still being constructed
    SetupTimedOut(Duration),
    /// The deadline passed inside the test body
    TimedOut(Duration),
}

impl Outcome {
    pub fn is_passed(&self) -> bool {
        matches!(self, Outcome::Passed)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Outcome::Passed => "passed",
            Outcome::Failed(_) => "failed",
            Outcome::SetupFailed(_) => "setup_failed",
            Outcome::SetupTimedOut(_) => "setup_timed_out",
            Outcome::TimedOut(_) => "timed_out",
        }
    }

    pub fn message(&self) -> Option<String> {
        match self {
            Outcome::Passed => None,
            Outcome::Failed(e) => Some(e.to_string()),
            Outcome::SetupFailed(e) => Some(e.to_string()),
            Outcome::SetupTimedOut(limit) => {
                Some(format!("fixture setup timed out after {} ms", limit.as_millis()))
            }
            Outcome::TimedOut(limit) => Some(format!("timed out after {} ms", limit.as_millis())),
        }
    }
}

#[derive(Debug)]
pub struct InvocationReport {
    pub context_id: Uuid,
    pub outcome: Outcome,
    /// Secondary information; never replaces `outcome`
    pub teardown_failures: Vec<TeardownFailure>,
    pub construction_order: Vec<String>,
    pub duration: Duration,
}

/// Run `body` against freshly resolved `requested` fixtures.
///
/// `limit` bounds setup and body together. Teardown runs outside it:
/// whatever happens (assertion failure, panic, timeout, setup failure)
/// every fixture constructed for this invocation is torn down before the
/// report is returned, and a setup failure keeps its constructor error as
/// the outcome.
pub async fn run_invocation<F, Fut, E>(
    registry: Arc<FixtureRegistry>,
    requested: &[&str],
    limit: Option<Duration>,
    body: F,
) -> InvocationReport
where
    F: FnOnce(Fixtures) -> Fut,
    Fut: Future<Output = Result<(), E>>,
    E: Into<BoxError>,
{
    let started = Instant::now();
    let deadline = limit.map(|l| Deadline::now() + l);
    let mut context = FixtureContext::new(registry);
    let mut teardown_failures = Vec::new();

    let outcome = match within(deadline, context.build(requested)).await {
        None => Outcome::SetupTimedOut(limit.unwrap_or_default()),
        Some(Err(cause)) => Outcome::SetupFailed(cause),
        Some(Ok(fixtures)) => {
            let running = AssertUnwindSafe(async move { body(fixtures).await.map_err(Into::<BoxError>::into) })
                .catch_unwind();
            match within(deadline, running).await {
                None => Outcome::TimedOut(limit.unwrap_or_default()),
                Some(Ok(Ok(()))) => Outcome::Passed,
                Some(Ok(Err(e))) => Outcome::Failed(e),
                Some(Err(panic)) => {
                    Outcome::Failed(format!("test body panicked: {}", panic_message(&*panic)).into())
                }
            }
        }
    };

    if let Err(errors) = context.teardown().await {
        teardown_failures.extend(errors.into_failures());
    }

    debug!(
        context = %context.id(),
        outcome = outcome.label(),
        teardown_failures = teardown_failures.len(),
        "Invocation finished"
    );

    InvocationReport {
        context_id: context.id(),
        outcome,
        teardown_failures,
        construction_order: context.construction_order().to_vec(),
        duration: started.elapsed(),
    }
}

async fn within<F: Future>(deadline: Option<Deadline>, future: F) -> Option<F::Output> {
    match deadline {
        Some(deadline) => tokio::time::timeout_at(deadline, future).await.ok(),
        None => Some(future.await),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Provided;

    fn registry() -> Arc<FixtureRegistry> {
        let mut registry = FixtureRegistry::new();
        registry
            .register("number", &[], |_| async { Ok(Provided::new(5u8)) })
            .unwrap();
        Arc::new(registry)
    }

    #[test]
    fn test_outcome_labels() {
        assert_eq!(Outcome::Passed.label(), "passed");
        assert_eq!(Outcome::TimedOut(Duration::from_millis(20)).message().unwrap(), "timed out after 20 ms");
        assert_eq!(Outcome::SetupTimedOut(Duration::from_millis(20)).label(), "setup_timed_out");
        assert_eq!(
            Outcome::SetupTimedOut(Duration::from_millis(20)).message().unwrap(),
            "fixture setup timed out after 20 ms"
        );
        assert!(Outcome::Passed.message().is_none());
    }

    #[tokio::test]
    async fn test_body_sees_fixture() {
        let report = run_invocation(registry(), &["number"], None, |fx| async move {
            let n = fx.get::<u8>("number")?;
            if *n == 5 {
                Ok(())
            } else {
                Err(BoxError::from("wrong number"))
            }
        })
        .await;
        assert!(report.outcome.is_passed(), "{:?}", report.outcome);
        assert_eq!(report.construction_order, vec!["number"]);
    }

    #[tokio::test]
    async fn test_body_error_is_failure_not_setup() {
        let report = run_invocation(registry(), &["number"], None, |_| async {
            Err::<(), _>(BoxError::from("assertion failed"))
        })
        .await;
        assert!(matches!(report.outcome, Outcome::Failed(ref e) if e.to_string() == "assertion failed"));
    }

    #[tokio::test]
    async fn test_unknown_fixture_is_setup_failure() {
        let report = run_invocation(registry(), &["missing"], None, |_| async {
            Ok::<(), BoxError>(())
        })
        .await;
        match report.outcome {
            Outcome::SetupFailed(e) => assert!(e.is_configuration()),
            other => panic!("expected setup failure, got {:?}", other),
        }
    }
}
