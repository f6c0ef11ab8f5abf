//! API negative and edge cases

use std::time::Duration;

use anyhow::ensure;
use serde_json::Value;

use crate::api::NewAccount;
use crate::fixtures::API;
use crate::runner::{Suite, TestCase};

const RESPONSE_BUDGET: Duration = Duration::from_secs(5);

pub fn suite() -> Suite {
    Suite::new("API - Negative & Edge Cases")
        .case(TestCase::new(
            "NEG-TC01 - Login with empty parameters",
            &[API.name()],
            |fx| async move {
                let response = fx.fetch(&API)?.login("", "").await?;
                ensure!(response.response_code()? != 200, "empty login succeeded");
                ensure!(response.message().is_some(), "no message: {}", response.text);
                Ok(())
            },
        ))
        .case(TestCase::new(
            "NEG-TC02 - Login with a malformed email",
            &[API.name()],
            |fx| async move {
                let response = fx.fetch(&API)?.login("not-an-email", "password123").await?;
                ensure!(response.response_code()? == 404, "responseCode {}", response.response_code()?);
                Ok(())
            },
        ))
        .case(TestCase::new(
            "NEG-TC03 - Create account with missing fields",
            &[API.name()],
            |fx| async move {
                let response = fx
                    .fetch(&API)?
                    .create_account(&NewAccount::minimal("", "test@test.com", ""))
                    .await?;
                ensure!(response.response_code()? != 201, "incomplete account created");
                Ok(())
            },
        ))
        .case(TestCase::new(
            "NEG-TC04 - Create account with an invalid email",
            &[API.name()],
            |fx| async move {
                let response = fx
                    .fetch(&API)?
                    .create_account(&NewAccount::minimal("Test User", "invalid-email-format", "test123"))
                    .await?;
                ensure!(response.response_code()? == 400, "responseCode {}", response.response_code()?);
                Ok(())
            },
        ))
        .case(TestCase::new(
            "NEG-TC05 - Unknown email has no user detail",
            &[API.name()],
            |fx| async move {
                let response = fx.fetch(&API)?.user_detail_by_email("nonexistent@fake.com").await?;
                ensure!(response.response_code()? == 404, "responseCode {}", response.response_code()?);
                let message = response.message().unwrap_or_default();
                ensure!(message.contains("not exist"), "message '{}'", message);
                Ok(())
            },
        ))
        .case(TestCase::new(
            "NEG-TC06 - Delete account with wrong credentials",
            &[API.name()],
            |fx| async move {
                let response = fx.fetch(&API)?.delete_account("fake@test.com", "wrongpass").await?;
                ensure!(response.response_code()? == 404, "responseCode {}", response.response_code()?);
                Ok(())
            },
        ))
        .case(TestCase::new(
            "NEG-TC07 - Search with an empty term",
            &[API.name()],
            |fx| async move {
                let response = fx.fetch(&API)?.search_product("").await?;
                ensure!(response.status == 200, "HTTP {}", response.status);
                ensure!(response.has_field("products"), "no products field: {}", response.text);
                Ok(())
            },
        ))
        .case(TestCase::new(
            "NEG-TC08 - Product list responds in time",
            &[API.name()],
            |fx| async move {
                let response = fx.fetch(&API)?.products_list().await?;
                ensure!(response.status == 200, "HTTP {}", response.status);
                ensure!(
                    response.elapsed < RESPONSE_BUDGET,
                    "took {} ms",
                    response.elapsed.as_millis()
                );
                Ok(())
            },
        ))
        .case(TestCase::new(
            "NEG-TC09 - SQL injection in the password",
            &[API.name()],
            |fx| async move {
                let response = fx
                    .fetch(&API)?
                    .login("test@test.com", "'; DROP TABLE users; --")
                    .await?;
                ensure!(response.status < 500, "HTTP {}", response.status);
                response.response_code()?;
                Ok(())
            },
        ))
        .case(TestCase::new(
            "NEG-TC10 - Create account with a one-character password",
            &[API.name()],
            |fx| async move {
                let response = fx
                    .fetch(&API)?
                    .create_account(&NewAccount::minimal("Test", "test@example.com", "1"))
                    .await?;
                response.response_code()?;
                ensure!(response.message().is_some(), "no message: {}", response.text);
                Ok(())
            },
        ))
        .case(TestCase::new(
            "NEG-TC11 - Error responses keep their shape",
            &[API.name()],
            |fx| async move {
                let response = fx.fetch(&API)?.login("wrong@test.com", "wrong").await?;
                let body = response.json()?;
                ensure!(matches!(body.get("responseCode"), Some(Value::Number(_))), "{}", body);
                ensure!(matches!(body.get("message"), Some(Value::String(_))), "{}", body);
                Ok(())
            },
        ))
        .case(TestCase::new(
            "NEG-TC12 - Email with surrounding spaces",
            &[API.name()],
            |fx| async move {
                let response = fx.fetch(&API)?.login(" test@test.com ", "password").await?;
                response.response_code()?;
                Ok(())
            },
        ))
        .tag_all("api")
        .tag_all("negative")
}
