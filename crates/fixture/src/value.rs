//! Values flowing in and out of fixture constructors

use std::any::{type_name, Any};
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt};

use crate::error::{BoxError, FixtureError, FixtureResult};

pub(crate) type FixtureValue = Arc<dyn Any + Send + Sync>;

pub(crate) type TeardownHook = Box<dyn FnOnce() -> BoxFuture<'static, Result<(), BoxError>> + Send>;

type TypedTeardown<T> = Box<dyn FnOnce(Arc<T>) -> BoxFuture<'static, Result<(), BoxError>> + Send>;

/// Typed fixture name.
///
/// ```
/// use shopcheck_fixture::Key;
///
/// struct Inbox;
/// const INBOX: Key<Inbox> = Key::new("inbox");
/// assert_eq!(INBOX.name(), "inbox");
/// ```
pub struct Key<T> {
    name: &'static str,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Key<T> {
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            _marker: PhantomData,
        }
    }

    pub const fn name(&self) -> &'static str {
        self.name
    }
}

impl<T> Clone for Key<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Key<T> {}

impl<T> fmt::Debug for Key<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Key<{}>({})", type_name::<T>(), self.name)
    }
}

/// What a constructor hands back: the fixture value and an optional
/// teardown hook that receives it once the test is over.
pub struct Provided<T> {
    value: Arc<T>,
    teardown: Option<TypedTeardown<T>>,
}

impl<T: Send + Sync + 'static> Provided<T> {
    pub fn new(value: T) -> Self {
        Self::from_arc(Arc::new(value))
    }

    pub fn from_arc(value: Arc<T>) -> Self {
        Self {
            value,
            teardown: None,
        }
    }

    pub fn with_teardown<F, Fut>(mut self, teardown: F) -> Self
    where
        F: FnOnce(Arc<T>) -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), BoxError>> + Send + 'static,
    {
        self.teardown = Some(Box::new(move |value| teardown(value).boxed()));
        self
    }

    pub fn value(&self) -> &Arc<T> {
        &self.value
    }

    pub(crate) fn erase(self) -> Constructed {
        let Provided { value, teardown } = self;
        let hook = teardown.map(|hook| {
            let value = Arc::clone(&value);
            Box::new(move || hook(value)) as TeardownHook
        });
        Constructed {
            slot: Slot {
                value: value as FixtureValue,
                type_name: type_name::<T>(),
            },
            teardown: hook,
        }
    }
}

pub(crate) struct Constructed {
    pub(crate) slot: Slot,
    pub(crate) teardown: Option<TeardownHook>,
}

#[derive(Clone)]
pub(crate) struct Slot {
    pub(crate) value: FixtureValue,
    pub(crate) type_name: &'static str,
}

impl Slot {
    pub(crate) fn downcast<T: Send + Sync + 'static>(&self, name: &str) -> FixtureResult<Arc<T>> {
        Arc::clone(&self.value)
            .downcast::<T>()
            .map_err(|_| FixtureError::TypeMismatch {
                name: name.to_string(),
                expected: type_name::<T>(),
                actual: self.type_name,
            })
    }
}

/// Read-only view over resolved fixtures.
///
/// Constructors receive one holding only their declared dependencies; test
/// bodies receive one holding everything resolved for the invocation.
/// Cloning is cheap and every clone hands out the same instances.
#[derive(Clone, Default)]
pub struct Fixtures {
    slots: Arc<HashMap<String, Slot>>,
}

impl Fixtures {
    pub(crate) fn from_slots(slots: HashMap<String, Slot>) -> Self {
        Self {
            slots: Arc::new(slots),
        }
    }

    pub fn get<T: Send + Sync + 'static>(&self, name: &str) -> FixtureResult<Arc<T>> {
        self.slots
            .get(name)
            .ok_or_else(|| FixtureError::NotResolved {
                name: name.to_string(),
            })?
            .downcast(name)
    }

    pub fn fetch<T: Send + Sync + 'static>(&self, key: &Key<T>) -> FixtureResult<Arc<T>> {
        self.get(key.name())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.slots.contains_key(name)
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.slots.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

impl fmt::Debug for Fixtures {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Fixtures").field("names", &self.names()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Cart(u32);

    fn scope_with(name: &str, value: Cart) -> Fixtures {
        let mut slots = HashMap::new();
        slots.insert(name.to_string(), Provided::new(value).erase().slot);
        Fixtures::from_slots(slots)
    }

    #[test]
    fn test_get_returns_same_instance() {
        let fixtures = scope_with("cart", Cart(3));
        let a = fixtures.get::<Cart>("cart").unwrap();
        let b = fixtures.clone().get::<Cart>("cart").unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(*a, Cart(3));
    }

    #[test]
    fn test_get_wrong_type_is_mismatch() {
        let fixtures = scope_with("cart", Cart(1));
        let err = fixtures.get::<String>("cart").unwrap_err();
        assert!(matches!(err, FixtureError::TypeMismatch { .. }));
    }

    #[test]
    fn test_missing_name_is_not_resolved() {
        let fixtures = Fixtures::default();
        const CART: Key<Cart> = Key::new("cart");
        let err = fixtures.fetch(&CART).unwrap_err();
        assert!(matches!(err, FixtureError::NotResolved { name } if name == "cart"));
    }

    #[tokio::test]
    async fn test_teardown_hook_receives_value() {
        let (tx, rx) = tokio::sync::oneshot::channel();
        let constructed = Provided::new(Cart(7))
            .with_teardown(move |cart| async move {
                let _ = tx.send(cart.0);
                Ok(())
            })
            .erase();
        let hook = constructed.teardown.unwrap();
        hook().await.unwrap();
        assert_eq!(rx.await.unwrap(), 7);
    }
}
