//! Fixture registry - name to constructor table built at startup

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt};
use once_cell::sync::OnceCell;
use tracing::{debug, info};

use crate::error::{BoxError, FixtureError, FixtureResult};
use crate::graph;
use crate::value::{Constructed, Fixtures, Key, Provided};

type Constructor = Arc<dyn Fn(Fixtures) -> BoxFuture<'static, Result<Constructed, BoxError>> + Send + Sync>;

/// One registered fixture: its name, what it needs, and how to build it
#[derive(Clone)]
pub struct FixtureDescriptor {
    name: String,
    dependencies: Vec<String>,
    type_name: &'static str,
    constructor: Constructor,
}

impl FixtureDescriptor {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared dependencies, in declaration order
    pub fn dependencies(&self) -> &[String] {
        &self.dependencies
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub(crate) fn construct(&self, dependencies: Fixtures) -> BoxFuture<'static, Result<Constructed, BoxError>> {
        (self.constructor)(dependencies)
    }
}

impl fmt::Debug for FixtureDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FixtureDescriptor")
            .field("name", &self.name)
            .field("dependencies", &self.dependencies)
            .field("type_name", &self.type_name)
            .finish()
    }
}

/// Declarative fixture table.
///
/// Populated once at process startup, then frozen behind an `Arc` and only
/// ever read. Registration defers all construction.
#[derive(Default)]
pub struct FixtureRegistry {
    descriptors: HashMap<String, FixtureDescriptor>,
    order: Vec<String>,
}

impl FixtureRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a fixture constructor under `name`.
    ///
    /// The constructor receives a [`Fixtures`] scope holding exactly the
    /// declared `dependencies`, already constructed.
    pub fn register<T, F, Fut>(&mut self, name: &str, dependencies: &[&str], constructor: F) -> FixtureResult<()>
    where
        T: Send + Sync + 'static,
        F: Fn(Fixtures) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Provided<T>, BoxError>> + Send + 'static,
    {
        if name.trim().is_empty() {
            return Err(FixtureError::Configuration(
                "fixture name must not be empty".to_string(),
            ));
        }
        if self.descriptors.contains_key(name) {
            return Err(FixtureError::Configuration(format!(
                "fixture '{}' is already registered",
                name
            )));
        }

        let mut declared: Vec<String> = Vec::with_capacity(dependencies.len());
        for dependency in dependencies {
            if declared.iter().any(|d| d == dependency) {
                return Err(FixtureError::Configuration(format!(
                    "fixture '{}' declares dependency '{}' twice",
                    name, dependency
                )));
            }
            declared.push(dependency.to_string());
        }

        let constructor: Constructor = Arc::new(move |scope| {
            let pending = constructor(scope);
            async move { pending.await.map(Provided::erase) }.boxed()
        });

        debug!(fixture = name, dependencies = ?declared, "Registered fixture");

        self.descriptors.insert(
            name.to_string(),
            FixtureDescriptor {
                name: name.to_string(),
                dependencies: declared,
                type_name: std::any::type_name::<T>(),
                constructor,
            },
        );
        self.order.push(name.to_string());
        Ok(())
    }

    /// [`register`](Self::register) under a typed key
    pub fn register_key<T, F, Fut>(&mut self, key: &Key<T>, dependencies: &[&str], constructor: F) -> FixtureResult<()>
    where
        T: Send + Sync + 'static,
        F: Fn(Fixtures) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Provided<T>, BoxError>> + Send + 'static,
    {
        self.register(key.name(), dependencies, constructor)
    }

    pub fn lookup(&self, name: &str) -> FixtureResult<&FixtureDescriptor> {
        self.get(name).ok_or_else(|| FixtureError::UnknownFixture {
            name: name.to_string(),
            required_by: "registry lookup".to_string(),
        })
    }

    pub fn get(&self, name: &str) -> Option<&FixtureDescriptor> {
        self.descriptors.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.descriptors.contains_key(name)
    }

    /// Registered names, in registration order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Check the whole table once: every dependency is registered and the
    /// graph is acyclic.
    pub fn validate(&self) -> FixtureResult<()> {
        for descriptor in self.order.iter().filter_map(|n| self.descriptors.get(n)) {
            if let Some(missing) = descriptor
                .dependencies()
                .iter()
                .find(|d| !self.descriptors.contains_key(d.as_str()))
            {
                return Err(FixtureError::UnknownFixture {
                    name: missing.clone(),
                    required_by: descriptor.name().to_string(),
                });
            }
        }

        let all: Vec<&str> = self.names().collect();
        graph::resolution_order(self, &all)?;
        Ok(())
    }

    /// Validate and make the table read-only
    pub fn freeze(self) -> FixtureResult<Arc<Self>> {
        self.validate()?;
        Ok(Arc::new(self))
    }
}

impl fmt::Debug for FixtureRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FixtureRegistry")
            .field("fixtures", &self.order)
            .finish()
    }
}

static GLOBAL: OnceCell<Arc<FixtureRegistry>> = OnceCell::new();

/// Freeze `registry` and make it the process-wide table.
///
/// Only one install is allowed per process.
pub fn install(registry: FixtureRegistry) -> FixtureResult<Arc<FixtureRegistry>> {
    let frozen = registry.freeze()?;
    GLOBAL.set(Arc::clone(&frozen)).map_err(|_| {
        FixtureError::Configuration("a global fixture registry is already installed".to_string())
    })?;
    info!(fixtures = frozen.len(), "Installed global fixture registry");
    Ok(frozen)
}

pub fn global() -> Option<Arc<FixtureRegistry>> {
    GLOBAL.get().cloned()
}
