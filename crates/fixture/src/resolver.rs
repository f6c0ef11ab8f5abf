//! Per-invocation fixture resolution, memoization and teardown

use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use futures::FutureExt;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::{FixtureError, FixtureResult, SetupFailure, TeardownErrors, TeardownFailure};
use crate::graph;
use crate::panic_message;
use crate::registry::FixtureRegistry;
use crate::value::{Fixtures, Key, Slot, TeardownHook};

/// A constructed fixture, owned by exactly one [`FixtureContext`]
pub struct FixtureInstance {
    name: String,
    slot: Slot,
    constructed_at: DateTime<Utc>,
    teardown: Option<TeardownHook>,
}

impl FixtureInstance {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn type_name(&self) -> &'static str {
        self.slot.type_name
    }

    pub fn constructed_at(&self) -> DateTime<Utc> {
        self.constructed_at
    }

    pub fn has_teardown(&self) -> bool {
        self.teardown.is_some()
    }
}

/// Fixture state for one test invocation.
///
/// Never shared between invocations. Resolution is sequential: each
/// constructor is awaited to completion before anything depending on it
/// starts.
pub struct FixtureContext {
    id: Uuid,
    registry: Arc<FixtureRegistry>,
    instances: HashMap<String, FixtureInstance>,
    /// Live instances, most recent last
    stack: Vec<String>,
    /// Everything ever constructed here, in order
    history: Vec<String>,
    /// Fixture whose teardown hook was in flight when a teardown was dropped
    interrupted: Option<String>,
}

impl FixtureContext {
    pub fn new(registry: Arc<FixtureRegistry>) -> Self {
        Self {
            id: Uuid::new_v4(),
            registry,
            instances: HashMap::new(),
            stack: Vec::new(),
            history: Vec::new(),
            interrupted: None,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn registry(&self) -> &Arc<FixtureRegistry> {
        &self.registry
    }

    /// Order in which `requested` would be constructed; builds nothing
    pub fn plan(&self, requested: &[&str]) -> FixtureResult<Vec<String>> {
        graph::resolution_order(&self.registry, requested)
    }

    /// Construct every fixture `requested` needs that is not already live.
    ///
    /// On a constructor failure, everything built so far is torn down in
    /// reverse order and the constructor's error is returned as the cause.
    pub async fn resolve(&mut self, requested: &[&str]) -> Result<Fixtures, SetupFailure> {
        match self.build(requested).await {
            Ok(fixtures) => Ok(fixtures),
            Err(cause) => {
                let teardown = match self.teardown().await {
                    Ok(()) => Vec::new(),
                    Err(errors) => errors.into_failures(),
                };
                Err(SetupFailure { cause, teardown })
            }
        }
    }

    /// Construct every fixture `requested` needs without unwinding on
    /// failure. Whatever was built stays live until [`teardown`] runs.
    ///
    /// Dropping the returned future mid-constructor leaves the context
    /// consistent: the in-flight fixture is simply never registered.
    ///
    /// [`teardown`]: FixtureContext::teardown
    pub async fn build(&mut self, requested: &[&str]) -> FixtureResult<Fixtures> {
        let plan = self.plan(requested)?;
        debug!(context = %self.id, plan = ?plan, "Resolving fixtures");

        for name in plan {
            if self.instances.contains_key(&name) {
                continue;
            }
            if let Err(cause) = self.construct(&name).await {
                warn!(context = %self.id, fixture = %name, error = %cause, "Fixture construction failed");
                return Err(cause);
            }
        }

        Ok(self.fixtures())
    }

    /// Resolve one fixture and return it
    pub async fn require<T: Send + Sync + 'static>(&mut self, key: &Key<T>) -> Result<Arc<T>, SetupFailure> {
        self.resolve(&[key.name()]).await?;
        self.fetch(key).map_err(SetupFailure::from)
    }

    async fn construct(&mut self, name: &str) -> FixtureResult<()> {
        let registry = Arc::clone(&self.registry);
        let descriptor = registry.lookup(name)?;
        let scope = self.scope_for(descriptor.dependencies())?;

        debug!(context = %self.id, fixture = name, "Constructing fixture");
        let started = Instant::now();

        let pending = descriptor.construct(scope);
        let constructed = match AssertUnwindSafe(pending).catch_unwind().await {
            Ok(Ok(constructed)) => constructed,
            Ok(Err(source)) => {
                return Err(FixtureError::Construction {
                    name: name.to_string(),
                    source,
                })
            }
            Err(panic) => {
                return Err(FixtureError::Construction {
                    name: name.to_string(),
                    source: format!("constructor panicked: {}", panic_message(&*panic)).into(),
                })
            }
        };

        debug!(
            context = %self.id,
            fixture = name,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Constructed fixture"
        );

        self.instances.insert(
            name.to_string(),
            FixtureInstance {
                name: name.to_string(),
                slot: constructed.slot,
                constructed_at: Utc::now(),
                teardown: constructed.teardown,
            },
        );
        self.stack.push(name.to_string());
        self.history.push(name.to_string());
        Ok(())
    }

    fn scope_for(&self, names: &[String]) -> FixtureResult<Fixtures> {
        let mut slots = HashMap::with_capacity(names.len());
        for name in names {
            let instance = self.instances.get(name).ok_or_else(|| FixtureError::NotResolved {
                name: name.clone(),
            })?;
            slots.insert(name.clone(), instance.slot.clone());
        }
        Ok(Fixtures::from_slots(slots))
    }

    /// Everything currently live in this context
    pub fn fixtures(&self) -> Fixtures {
        Fixtures::from_slots(
            self.instances
                .iter()
                .map(|(name, instance)| (name.clone(), instance.slot.clone()))
                .collect(),
        )
    }

    pub fn get<T: Send + Sync + 'static>(&self, name: &str) -> FixtureResult<Arc<T>> {
        self.instances
            .get(name)
            .ok_or_else(|| FixtureError::NotResolved {
                name: name.to_string(),
            })?
            .slot
            .downcast(name)
    }

    pub fn fetch<T: Send + Sync + 'static>(&self, key: &Key<T>) -> FixtureResult<Arc<T>> {
        self.get(key.name())
    }

    pub fn instance(&self, name: &str) -> Option<&FixtureInstance> {
        self.instances.get(name)
    }

    /// Names in the order they were constructed, including ones already
    /// torn down
    pub fn construction_order(&self) -> &[String] {
        &self.history
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    /// Tear down every live instance in strict reverse construction order.
    ///
    /// A failing or panicking hook does not stop the rest; all failures are
    /// returned together. An instance leaves the context only once its hook
    /// has settled, and a hook cut off by a dropped `teardown` future is
    /// reported as a failure by the next call.
    pub async fn teardown(&mut self) -> Result<(), TeardownErrors> {
        let mut failures = Vec::new();

        if let Some(name) = self.interrupted.take() {
            warn!(context = %self.id, fixture = %name, "Previous teardown was interrupted");
            failures.push(TeardownFailure {
                name,
                message: "teardown interrupted before its hook completed".to_string(),
            });
        }

        while let Some(name) = self.stack.last().cloned() {
            let hook = self.instances.get_mut(&name).and_then(|i| i.teardown.take());

            if let Some(hook) = hook {
                debug!(context = %self.id, fixture = %name, "Tearing down fixture");
                self.interrupted = Some(name.clone());
                let settled = AssertUnwindSafe(async move { hook().await }).catch_unwind().await;
                self.interrupted = None;

                match settled {
                    Ok(Ok(())) => {}
                    Ok(Err(e)) => {
                        warn!(context = %self.id, fixture = %name, error = %e, "Fixture teardown failed");
                        failures.push(TeardownFailure {
                            name: name.clone(),
                            message: e.to_string(),
                        });
                    }
                    Err(panic) => {
                        let message = format!("teardown panicked: {}", panic_message(&*panic));
                        warn!(context = %self.id, fixture = %name, "{}", message);
                        failures.push(TeardownFailure {
                            name: name.clone(),
                            message,
                        });
                    }
                }
            }

            self.stack.pop();
            self.instances.remove(&name);
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(TeardownErrors(failures))
        }
    }
}

impl Drop for FixtureContext {
    fn drop(&mut self) {
        if !self.stack.is_empty() || self.interrupted.is_some() {
            warn!(
                context = %self.id,
                live = ?self.stack,
                "Fixture context dropped without teardown"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Provided;
    use crate::BoxError;

    #[derive(Debug)]
    struct Page(&'static str);

    #[tokio::test]
    async fn test_dependency_scope_is_restricted() {
        let mut registry = FixtureRegistry::new();
        registry
            .register("page", &[], |_| async { Ok(Provided::new(Page("tab"))) })
            .unwrap();
        registry
            .register("data", &[], |_| async { Ok(Provided::new(42u32)) })
            .unwrap();
        registry
            .register("login", &["page"], |deps| async move {
                assert!(deps.get::<u32>("data").is_err());
                let page = deps.get::<Page>("page")?;
                Ok::<_, BoxError>(Provided::new(page.0.len()))
            })
            .unwrap();

        let mut context = FixtureContext::new(registry.freeze().unwrap());
        let fixtures = context.resolve(&["data", "login"]).await.unwrap();
        assert_eq!(*fixtures.get::<usize>("login").unwrap(), 3);
        assert_eq!(context.construction_order(), &["data", "page", "login"]);
        assert!(context.teardown().await.is_ok());
        assert!(context.is_empty());
    }

    #[tokio::test]
    async fn test_plan_builds_nothing() {
        let mut registry = FixtureRegistry::new();
        registry
            .register("page", &[], |_| async { Ok(Provided::new(Page("tab"))) })
            .unwrap();
        let context = FixtureContext::new(Arc::new(registry));
        assert_eq!(context.plan(&["page"]).unwrap(), vec!["page"]);
        assert!(context.is_empty());
    }

    #[tokio::test]
    async fn test_instance_records_metadata() {
        let mut registry = FixtureRegistry::new();
        registry
            .register("page", &[], |_| async {
                Ok(Provided::new(Page("tab")).with_teardown(|_| async { Ok(()) }))
            })
            .unwrap();
        let before = Utc::now();
        let mut context = FixtureContext::new(Arc::new(registry));
        context.resolve(&["page"]).await.unwrap();

        let instance = context.instance("page").unwrap();
        assert_eq!(instance.name(), "page");
        assert!(instance.type_name().ends_with("Page"));
        assert!(instance.has_teardown());
        assert!(instance.constructed_at() >= before);
        context.teardown().await.unwrap();
    }
}
