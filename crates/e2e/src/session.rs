//! Authenticated-session fixture value
//!
//! A distinct type rather than a bare [`LoginPage`], so a test asking for a
//! logged-in page cannot be handed one that never went through login.

use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::data::Credentials;
use crate::error::{E2eError, E2eResult};
use crate::page::SharedPage;
use crate::pages::LoginPage;

pub struct AuthenticatedSession {
    login: LoginPage,
    email: String,
    logged_in_at: DateTime<Utc>,
}

impl AuthenticatedSession {
    /// Log in on a fresh page and wait for the "Logged in as" indicator.
    ///
    /// Any failure along the way, including the indicator not showing up
    /// within `timeout`, is an [`E2eError::AuthenticationSetup`] and no
    /// session is returned.
    pub async fn establish(page: SharedPage, credentials: &Credentials, timeout: Duration) -> E2eResult<Self> {
        let login = LoginPage::new(page);
        let setup_error = |e: E2eError| E2eError::AuthenticationSetup {
            email: credentials.email.clone(),
            reason: e.to_string(),
        };

        debug!(email = %credentials.email, "Establishing authenticated session");
        login.goto().await.map_err(setup_error)?;
        login
            .login(&credentials.email, &credentials.password)
            .await
            .map_err(setup_error)?;
        login.wait_until_logged_in(timeout).await.map_err(setup_error)?;

        info!(email = %credentials.email, "Authenticated session ready");
        Ok(Self {
            login,
            email: credentials.email.clone(),
            logged_in_at: Utc::now(),
        })
    }

    pub fn login_page(&self) -> &LoginPage {
        &self.login
    }

    pub fn page(&self) -> &SharedPage {
        self.login.base().page()
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn logged_in_at(&self) -> DateTime<Utc> {
        self.logged_in_at
    }

    /// Whether the indicator is still showing right now
    pub async fn is_logged_in(&self) -> E2eResult<bool> {
        self.login.is_logged_in().await
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::data::TestData;
    use crate::mock::{MockPage, Reaction};
    use std::sync::Arc;

    /// A login screen whose submit button logs the user in
    pub(crate) fn script_login(mock: &MockPage, succeeds: bool) {
        mock.element(".login-form", true, None);
        mock.element(r#"[data-qa="login-email"]"#, true, None);
        mock.element(r#"[data-qa="login-password"]"#, true, None);
        mock.element(r#"[data-qa="login-button"]"#, true, None);
        if succeeds {
            mock.on_click(
                r#"[data-qa="login-button"]"#,
                Reaction::Show(
                    r#"a:has-text("Logged in as")"#.to_string(),
                    Some("Logged in as Testuser".to_string()),
                ),
            );
        }
    }

    #[tokio::test]
    async fn test_establish_waits_for_indicator() {
        let mock = Arc::new(MockPage::new());
        script_login(&mock, true);
        let data = TestData::default();

        let session = AuthenticatedSession::establish(mock.clone(), &data.valid, Duration::from_secs(1))
            .await
            .unwrap();

        assert_eq!(session.email(), "testqauser@example.com");
        assert!(session.is_logged_in().await.unwrap());
        assert_eq!(
            mock.actions().last().map(String::as_str),
            Some(r#"wait_for a:has-text("Logged in as") visible"#)
        );
    }

    #[tokio::test]
    async fn test_missing_indicator_is_setup_error() {
        let mock = Arc::new(MockPage::new());
        script_login(&mock, false);
        let data = TestData::default();

        let err = AuthenticatedSession::establish(mock, &data.valid, Duration::from_millis(10))
            .await
            .err()
            .unwrap();

        match err {
            E2eError::AuthenticationSetup { email, reason } => {
                assert_eq!(email, "testqauser@example.com");
                assert!(reason.contains("Logged in as"));
            }
            other => panic!("expected authentication setup error, got {}", other),
        }
    }

    #[tokio::test]
    async fn test_broken_login_form_is_setup_error() {
        let mock = Arc::new(MockPage::new());
        let data = TestData::default();

        let err = AuthenticatedSession::establish(mock, &data.valid, Duration::from_millis(10))
            .await
            .err()
            .unwrap();
        assert!(matches!(err, E2eError::AuthenticationSetup { .. }));
    }
}
