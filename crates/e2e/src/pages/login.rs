use std::time::Duration;

use crate::error::E2eResult;
use crate::locator::Locator;
use crate::page::{SharedPage, WaitState};
use crate::pages::BasePage;

const ERROR_TIMEOUT: Duration = Duration::from_secs(5);

/// Login / signup screen
pub struct LoginPage {
    base: BasePage,
    pub form: Locator,
    pub email_input: Locator,
    pub password_input: Locator,
    pub login_button: Locator,
    pub error_message: Locator,
    pub logout_link: Locator,
    pub logged_in_as: Locator,
}

impl LoginPage {
    pub fn new(page: SharedPage) -> Self {
        Self {
            base: BasePage::new(page),
            form: Locator::new(".login-form"),
            email_input: Locator::new(r#"[data-qa="login-email"]"#),
            password_input: Locator::new(r#"[data-qa="login-password"]"#),
            login_button: Locator::new(r#"[data-qa="login-button"]"#),
            error_message: Locator::new(".login-form p"),
            logout_link: Locator::new("role=link[name=/logout/i]"),
            logged_in_as: Locator::new(r#"a:has-text("Logged in as")"#),
        }
    }

    pub fn base(&self) -> &BasePage {
        &self.base
    }

    pub async fn goto(&self) -> E2eResult<()> {
        self.base.goto("/login").await?;
        self.base.page().wait_for(&self.form, WaitState::Visible, None).await
    }

    pub async fn login(&self, email: &str, password: &str) -> E2eResult<()> {
        self.base.fill_field(&self.email_input, email).await?;
        self.base.fill_field(&self.password_input, password).await?;
        self.base.click_element(&self.login_button).await
    }

    pub async fn error_text(&self) -> E2eResult<String> {
        self.base
            .page()
            .wait_for(&self.error_message, WaitState::Visible, Some(ERROR_TIMEOUT))
            .await?;
        self.base.element_text(&self.error_message).await
    }

    /// Name from the "Logged in as ..." header link
    pub async fn logged_in_username(&self) -> E2eResult<String> {
        self.base
            .page()
            .wait_for(&self.logged_in_as, WaitState::Visible, None)
            .await?;
        let text = self.base.element_text(&self.logged_in_as).await?;
        Ok(text.replace("Logged in as ", "").trim().to_string())
    }

    pub async fn is_logged_in(&self) -> E2eResult<bool> {
        self.base.page().is_visible(&self.logged_in_as).await
    }

    pub async fn wait_until_logged_in(&self, timeout: Duration) -> E2eResult<()> {
        self.base
            .page()
            .wait_for(&self.logged_in_as, WaitState::Visible, Some(timeout))
            .await
    }

    pub async fn logout(&self) -> E2eResult<()> {
        self.base.click_element(&self.logout_link).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockPage, Reaction};
    use std::sync::Arc;

    fn login_screen() -> Arc<MockPage> {
        let mock = Arc::new(MockPage::new());
        mock.element(".login-form", true, None);
        mock.element(r#"[data-qa="login-email"]"#, true, None);
        mock.element(r#"[data-qa="login-password"]"#, true, None);
        mock.element(r#"[data-qa="login-button"]"#, true, Some("Login"));
        mock
    }

    #[tokio::test]
    async fn test_login_fills_and_submits() {
        let mock = login_screen();
        let page = LoginPage::new(mock.clone());

        page.goto().await.unwrap();
        page.login("a@b.c", "pw").await.unwrap();

        assert_eq!(
            mock.actions(),
            vec![
                "goto /login".to_string(),
                "wait_for .login-form visible".to_string(),
                r#"fill [data-qa="login-email"]=a@b.c"#.to_string(),
                r#"fill [data-qa="login-password"]=pw"#.to_string(),
                r#"click [data-qa="login-button"] x1"#.to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_logged_in_username_strips_prefix() {
        let mock = login_screen();
        mock.on_click(
            r#"[data-qa="login-button"]"#,
            Reaction::Show(
                r#"a:has-text("Logged in as")"#.to_string(),
                Some(" Logged in as Testuser ".to_string()),
            ),
        );
        let page = LoginPage::new(mock);

        assert!(!page.is_logged_in().await.unwrap());
        page.login("testqauser@example.com", "Test@123").await.unwrap();
        assert!(page.is_logged_in().await.unwrap());
        assert_eq!(page.logged_in_username().await.unwrap(), "Testuser");
    }

    #[tokio::test]
    async fn test_error_text_times_out_as_interaction() {
        let page = LoginPage::new(login_screen());
        let err = page.error_text().await.unwrap_err();
        assert!(err.is_interaction());
    }

    #[tokio::test]
    async fn test_logout_navigates() {
        let mock = login_screen();
        mock.element("role=link[name=/logout/i]", true, Some("Logout"));
        mock.on_click("role=link[name=/logout/i]", Reaction::Navigate("/login".to_string()));
        let page = LoginPage::new(mock);

        page.logout().await.unwrap();
        assert!(page.base().current_url().await.unwrap().ends_with("/login"));
    }
}
