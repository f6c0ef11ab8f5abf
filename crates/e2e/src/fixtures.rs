//! The standard fixture table for the store suites
//!
//! | fixture              | depends on             | value                  |
//! |----------------------|------------------------|------------------------|
//! | `test_data`          |                        | [`TestData`]           |
//! | `page`               |                        | [`SharedPage`], closed on teardown |
//! | `request`            |                        | [`RequestContext`]     |
//! | `login_page` ...     | `page`                 | page objects           |
//! | `api`                | `request`              | [`ApiClient`]          |
//! | `authenticated_page` | `page`, `test_data`    | [`AuthenticatedSession`] |

use std::sync::Arc;

use shopcheck_fixture::{BoxError, FixtureRegistry, FixtureResult, Key, Provided};

use crate::api::{ApiClient, RequestContext};
use crate::config::SuiteConfig;
use crate::data::TestData;
use crate::page::{ResourceProvider, SharedPage};
use crate::pages::{CartPage, CheckoutPage, LoginPage, PaymentPage, ProductsPage};
use crate::session::AuthenticatedSession;

pub const TEST_DATA: Key<TestData> = Key::new("test_data");
pub const PAGE: Key<SharedPage> = Key::new("page");
pub const REQUEST: Key<RequestContext> = Key::new("request");
pub const LOGIN_PAGE: Key<LoginPage> = Key::new("login_page");
pub const PRODUCTS_PAGE: Key<ProductsPage> = Key::new("products_page");
pub const CART_PAGE: Key<CartPage> = Key::new("cart_page");
pub const CHECKOUT_PAGE: Key<CheckoutPage> = Key::new("checkout_page");
pub const PAYMENT_PAGE: Key<PaymentPage> = Key::new("payment_page");
pub const API: Key<ApiClient> = Key::new("api");
pub const AUTHENTICATED_PAGE: Key<AuthenticatedSession> = Key::new("authenticated_page");

/// Build the table over `provider`. The result is validated and ready to
/// freeze.
pub fn standard_registry(
    provider: Arc<dyn ResourceProvider>,
    data: TestData,
    config: &SuiteConfig,
) -> FixtureResult<FixtureRegistry> {
    let mut registry = FixtureRegistry::new();

    registry.register_key(&TEST_DATA, &[], move |_| {
        let data = data.clone();
        async move { Ok::<_, BoxError>(Provided::new(data)) }
    })?;

    let pages = Arc::clone(&provider);
    registry.register_key(&PAGE, &[], move |_| {
        let provider = Arc::clone(&pages);
        async move {
            let page = provider.new_page().await?;
            Ok::<_, BoxError>(Provided::new(page).with_teardown(|page: Arc<SharedPage>| async move {
                page.close().await.map_err(BoxError::from)
            }))
        }
    })?;

    let requests = Arc::clone(&provider);
    registry.register_key(&REQUEST, &[], move |_| {
        let provider = Arc::clone(&requests);
        async move {
            let request = provider.new_request_context().await?;
            Ok::<_, BoxError>(Provided::new(request))
        }
    })?;

    register_page_object(&mut registry, &LOGIN_PAGE, LoginPage::new)?;
    register_page_object(&mut registry, &PRODUCTS_PAGE, ProductsPage::new)?;
    register_page_object(&mut registry, &CART_PAGE, CartPage::new)?;
    register_page_object(&mut registry, &CHECKOUT_PAGE, CheckoutPage::new)?;
    register_page_object(&mut registry, &PAYMENT_PAGE, PaymentPage::new)?;

    registry.register_key(&API, &[REQUEST.name()], |scope| async move {
        let request = scope.fetch(&REQUEST)?;
        Ok::<_, BoxError>(Provided::new(ApiClient::new(&request)))
    })?;

    let login_timeout = config.login_timeout();
    registry.register_key(
        &AUTHENTICATED_PAGE,
        &[PAGE.name(), TEST_DATA.name()],
        move |scope| async move {
            let page = scope.fetch(&PAGE)?;
            let data = scope.fetch(&TEST_DATA)?;
            let session = AuthenticatedSession::establish(page.as_ref().clone(), &data.valid, login_timeout).await?;
            Ok::<_, BoxError>(Provided::new(session))
        },
    )?;

    registry.validate()?;
    Ok(registry)
}

fn register_page_object<T, F>(registry: &mut FixtureRegistry, key: &Key<T>, build: F) -> FixtureResult<()>
where
    T: Send + Sync + 'static,
    F: Fn(SharedPage) -> T + Copy + Send + Sync + 'static,
{
    registry.register_key(key, &[PAGE.name()], move |scope| async move {
        let page = scope.fetch(&PAGE)?;
        Ok::<_, BoxError>(Provided::new(build(page.as_ref().clone())))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::E2eError;
    use crate::mock::MockProvider;
    use crate::session::tests::script_login;
    use shopcheck_fixture::{run_invocation, FixtureContext, FixtureError, Outcome};
    use std::sync::atomic::{AtomicBool, Ordering};

    fn registry_with(provider: Arc<MockProvider>) -> Arc<FixtureRegistry> {
        standard_registry(provider, TestData::default(), &SuiteConfig::default())
            .unwrap()
            .freeze()
            .unwrap()
    }

    #[test]
    fn test_table_is_complete() {
        let registry = registry_with(Arc::new(MockProvider::new(|_| {})));
        let mut names: Vec<&str> = registry.names().collect();
        names.sort();
        assert_eq!(
            names,
            vec![
                "api",
                "authenticated_page",
                "cart_page",
                "checkout_page",
                "login_page",
                "page",
                "payment_page",
                "products_page",
                "request",
                "test_data",
            ]
        );
        assert_eq!(
            registry.lookup("authenticated_page").unwrap().dependencies(),
            &["page".to_string(), "test_data".to_string()]
        );
    }

    #[tokio::test]
    async fn test_page_objects_share_one_page() {
        let provider = Arc::new(MockProvider::new(|page| script_login(page, true)));
        let registry = registry_with(Arc::clone(&provider));

        let report = run_invocation(
            registry,
            &["authenticated_page", "login_page", "cart_page"],
            None,
            |fx| async move {
                let session = fx.fetch(&AUTHENTICATED_PAGE)?;
                let login = fx.fetch(&LOGIN_PAGE)?;
                assert!(Arc::ptr_eq(session.page(), login.base().page()));
                Ok::<_, FixtureError>(())
            },
        )
        .await;

        assert!(report.outcome.is_passed(), "{:?}", report.outcome.message());
        assert_eq!(provider.pages().len(), 1);
        assert_eq!(report.construction_order[0], "page");
        assert!(provider.pages()[0].is_closed());
    }

    #[tokio::test]
    async fn test_failed_login_is_setup_failure() {
        let provider = Arc::new(MockProvider::new(|page| script_login(page, false)));
        let registry = registry_with(Arc::clone(&provider));

        let ran = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&ran);
        let report = run_invocation(registry, &["authenticated_page"], None, |_| async move {
            flag.store(true, Ordering::SeqCst);
            Ok::<(), FixtureError>(())
        })
        .await;

        assert!(!ran.load(Ordering::SeqCst));

        match &report.outcome {
            Outcome::SetupFailed(FixtureError::Construction { name, source }) => {
                assert_eq!(name, "authenticated_page");
                assert!(matches!(
                    source.downcast_ref::<E2eError>(),
                    Some(E2eError::AuthenticationSetup { .. })
                ));
            }
            other => panic!("expected setup failure, got {:?}", other),
        }
        assert!(provider.pages()[0].is_closed());
    }

    #[tokio::test]
    async fn test_session_is_not_a_login_page() {
        let provider = Arc::new(MockProvider::new(|page| script_login(page, true)));
        let mut context = FixtureContext::new(registry_with(provider));

        let fixtures = context.resolve(&["authenticated_page"]).await.unwrap();
        assert!(matches!(
            fixtures.get::<LoginPage>("authenticated_page"),
            Err(FixtureError::TypeMismatch { .. })
        ));
        context.teardown().await.unwrap();
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_concurrent_sessions_get_their_own_pages() {
        let provider = Arc::new(MockProvider::new(|page| script_login(page, true)));
        let registry = registry_with(Arc::clone(&provider));

        let a = tokio::spawn(run_invocation(Arc::clone(&registry), &["authenticated_page"], None, |_| async {
            Ok::<_, FixtureError>(())
        }));
        let b = tokio::spawn(run_invocation(Arc::clone(&registry), &["authenticated_page"], None, |_| async {
            Err::<(), _>(E2eError::AssertionFailed("boom".to_string()))
        }));
        let (a, b) = (a.await.unwrap(), b.await.unwrap());

        assert!(a.outcome.is_passed());
        assert_eq!(b.outcome.label(), "failed");
        assert_ne!(a.context_id, b.context_id);

        let pages = provider.pages();
        assert_eq!(pages.len(), 2);
        assert!(!Arc::ptr_eq(&pages[0], &pages[1]));
        assert!(pages.iter().all(|p| p.is_closed()));
    }
}
