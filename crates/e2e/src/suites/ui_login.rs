//! UI login: valid and invalid credentials, logout, anonymous access

use std::path::Path;
use std::time::Duration;

use anyhow::ensure;
use regex::Regex;

use crate::cases::{load_cases, DataCase, LoginCase};
use crate::error::E2eResult;
use crate::fixtures::{LOGIN_PAGE, PAGE, TEST_DATA};
use crate::runner::{Suite, TestCase};

const URL_TIMEOUT: Duration = Duration::from_secs(5);

pub fn suites(data_dir: &Path) -> E2eResult<Vec<Suite>> {
    Ok(vec![login_tests(), data_driven(load_cases(data_dir)?)])
}

fn login_tests() -> Suite {
    Suite::new("UI - Login")
        .case(
            TestCase::new(
                "TC01 - Login with valid credentials",
                &[LOGIN_PAGE.name(), TEST_DATA.name()],
                |fx| async move {
                    let login = fx.fetch(&LOGIN_PAGE)?;
                    let data = fx.fetch(&TEST_DATA)?;

                    login.goto().await?;
                    login.login(&data.valid.email, &data.valid.password).await?;
                    login.base().expect_visible(&login.logged_in_as).await?;

                    let username = login.logged_in_username().await?;
                    ensure!(
                        data.valid.name.as_deref() == Some(username.as_str()),
                        "logged in as '{}', expected {:?}",
                        username,
                        data.valid.name
                    );
                    Ok(())
                },
            )
            .tag("smoke"),
        )
        .case(TestCase::new(
            "TC02 - Invalid credentials show an error",
            &[LOGIN_PAGE.name(), TEST_DATA.name()],
            |fx| async move {
                let login = fx.fetch(&LOGIN_PAGE)?;
                let data = fx.fetch(&TEST_DATA)?;

                login.goto().await?;
                login.login(&data.invalid.email, &data.invalid.password).await?;
                login.base().expect_visible(&login.error_message).await?;

                let error = login.error_text().await?;
                ensure!(error.len() > 10, "error message too short: '{}'", error);
                Ok(())
            },
        ))
        .case(TestCase::new(
            "TC03 - Logout returns to the login form",
            &[LOGIN_PAGE.name(), TEST_DATA.name()],
            |fx| async move {
                let login = fx.fetch(&LOGIN_PAGE)?;
                let data = fx.fetch(&TEST_DATA)?;

                login.goto().await?;
                login.login(&data.valid.email, &data.valid.password).await?;
                login.base().expect_visible(&login.logged_in_as).await?;

                login.logout().await?;
                login.base().wait_for_url(&Regex::new("login")?, URL_TIMEOUT).await?;
                login.base().expect_visible(&login.form).await?;
                Ok(())
            },
        ))
        .case(TestCase::new(
            "TC04 - Anonymous visitor sees no logout link",
            &[PAGE.name(), LOGIN_PAGE.name()],
            |fx| async move {
                let page = fx.fetch(&PAGE)?;
                let login = fx.fetch(&LOGIN_PAGE)?;

                page.goto("/").await?;
                if page.is_visible(&login.logged_in_as).await.unwrap_or(false) {
                    login.logout().await?;
                }

                page.goto("/").await?;
                let logout_visible = page.is_visible(&login.logout_link).await.unwrap_or(false);
                ensure!(!logout_visible, "logout link visible without a session");
                Ok(())
            },
        ))
        .tag_all("ui")
}

fn data_driven(cases: Vec<LoginCase>) -> Suite {
    Suite::new("UI - Login Data-Driven")
        .cases(cases.into_iter().map(|case| {
            TestCase::new(case.label(), &[LOGIN_PAGE.name()], move |fx| {
                let case = case.clone();
                async move {
                    let login = fx.fetch(&LOGIN_PAGE)?;
                    login.goto().await?;
                    login.login(&case.email, &case.password).await?;

                    match &case.expected_message {
                        Some(expected) => {
                            let actual = login.error_text().await?;
                            ensure!(
                                actual.trim().contains(expected.as_str()),
                                "error '{}' does not contain '{}'",
                                actual.trim(),
                                expected
                            );
                        }
                        None => {
                            // HTML5 validation keeps the form from submitting
                            let before = login.base().current_url().await?;
                            login.base().click_element(&login.login_button).await?;
                            tokio::time::sleep(Duration::from_millis(500)).await;
                            let after = login.base().current_url().await?;
                            ensure!(after == before, "navigated from {} to {}", before, after);
                        }
                    }
                    Ok(())
                }
            })
        }))
        .tag_all("ui")
        .tag_all("data-driven")
}
