//! Dependency ordering over the registry

use std::collections::HashSet;

use crate::error::{FixtureError, FixtureResult};
use crate::registry::FixtureRegistry;
use crate::TEST_REQUESTER;

/// Depth-first topological order of the transitive closure of `requested`.
///
/// Dependencies always precede their dependents and every name appears once.
/// Fails before anything is constructed if a name is unregistered or the
/// closure contains a cycle.
pub fn resolution_order(registry: &FixtureRegistry, requested: &[&str]) -> FixtureResult<Vec<String>> {
    let mut order = Vec::new();
    let mut visited = HashSet::new();
    let mut path = Vec::new();

    for name in requested {
        visit(registry, name, TEST_REQUESTER, &mut visited, &mut path, &mut order)?;
    }

    Ok(order)
}

fn visit(
    registry: &FixtureRegistry,
    name: &str,
    required_by: &str,
    visited: &mut HashSet<String>,
    path: &mut Vec<String>,
    order: &mut Vec<String>,
) -> FixtureResult<()> {
    if visited.contains(name) {
        return Ok(());
    }

    if let Some(start) = path.iter().position(|n| n == name) {
        let mut cycle = path[start..].to_vec();
        cycle.push(name.to_string());
        return Err(FixtureError::CyclicDependency { cycle });
    }

    let descriptor = registry.get(name).ok_or_else(|| FixtureError::UnknownFixture {
        name: name.to_string(),
        required_by: required_by.to_string(),
    })?;

    path.push(name.to_string());
    for dependency in descriptor.dependencies() {
        visit(registry, dependency, name, visited, path, order)?;
    }
    path.pop();

    visited.insert(name.to_string());
    order.push(name.to_string());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Provided;
    use test_case::test_case;

    /// `edges` pairs a name with its comma separated dependencies
    fn registry(edges: &[(&str, &str)]) -> FixtureRegistry {
        let mut registry = FixtureRegistry::new();
        for (name, deps) in edges {
            let deps: Vec<&str> = deps.split(',').filter(|d| !d.is_empty()).collect();
            registry
                .register(name, &deps, |_| async { Ok(Provided::new(())) })
                .unwrap();
        }
        registry
    }

    #[test]
    fn test_dependencies_come_first() {
        let registry = registry(&[
            ("page", ""),
            ("data", ""),
            ("login", "page"),
            ("session", "page,data"),
        ]);
        let order = resolution_order(&registry, &["session", "login"]).unwrap();
        assert_eq!(order, vec!["page", "data", "session", "login"]);
    }

    #[test]
    fn test_shared_dependency_listed_once() {
        let registry = registry(&[("page", ""), ("cart", "page"), ("products", "page")]);
        let order = resolution_order(&registry, &["cart", "products", "cart"]).unwrap();
        assert_eq!(order, vec!["page", "cart", "products"]);
    }

    #[test_case(&[("a", "b"), ("b", "a")], "a", &["a", "b", "a"] ; "direct")]
    #[test_case(&[("a", "b"), ("b", "c"), ("c", "a")], "a", &["a", "b", "c", "a"] ; "transitive")]
    #[test_case(&[("a", "a")], "a", &["a", "a"] ; "self")]
    fn test_cycle_reports_path(edges: &[(&str, &str)], start: &str, expected: &[&str]) {
        let registry = registry(edges);
        match resolution_order(&registry, &[start]) {
            Err(FixtureError::CyclicDependency { cycle }) => assert_eq!(cycle, expected),
            other => panic!("expected cycle, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_dependency_names_requester() {
        let registry = registry(&[("login", "page")]);
        match resolution_order(&registry, &["login"]) {
            Err(FixtureError::UnknownFixture { name, required_by }) => {
                assert_eq!(name, "page");
                assert_eq!(required_by, "login");
            }
            other => panic!("expected unknown fixture, got {:?}", other),
        }
    }
}
