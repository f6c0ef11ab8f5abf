//! API login: `/verifyLogin` with valid, wrong and missing credentials

use std::path::Path;

use anyhow::ensure;
use serde_json::Value;

use crate::cases::{load_cases, ApiLoginCase, DataCase};
use crate::error::E2eResult;
use crate::fixtures::{API, TEST_DATA};
use crate::runner::{Suite, TestCase};

pub fn suites(data_dir: &Path) -> E2eResult<Vec<Suite>> {
    Ok(vec![login_tests(), data_driven(load_cases(data_dir)?)])
}

fn login_tests() -> Suite {
    Suite::new("API - Login")
        .case(
            TestCase::new(
                "API-TC01 - Valid login returns responseCode 200",
                &[API.name(), TEST_DATA.name()],
                |fx| async move {
                    let api = fx.fetch(&API)?;
                    let data = fx.fetch(&TEST_DATA)?;

                    let response = api.login(&data.valid.email, &data.valid.password).await?;
                    ensure!(response.status == 200, "HTTP {}", response.status);
                    let code = response.response_code()?;
                    ensure!(code == 200, "responseCode {}", code);
                    Ok(())
                },
            )
            .tag("smoke"),
        )
        .case(TestCase::new(
            "API-TC02 - Wrong password returns responseCode 404",
            &[API.name(), TEST_DATA.name()],
            |fx| async move {
                let api = fx.fetch(&API)?;
                let data = fx.fetch(&TEST_DATA)?;

                let response = api.login(&data.valid.email, &data.invalid.password).await?;
                let code = response.response_code()?;
                ensure!(code == 404, "responseCode {}", code);
                let message = response.message().unwrap_or_default();
                ensure!(message.contains("User not found"), "message '{}'", message);
                Ok(())
            },
        ))
        .case(TestCase::new(
            "API-TC03 - Unknown email returns responseCode 404",
            &[API.name(), TEST_DATA.name()],
            |fx| async move {
                let api = fx.fetch(&API)?;
                let data = fx.fetch(&TEST_DATA)?;

                let response = api
                    .login(&data.non_existent.email, &data.non_existent.password)
                    .await?;
                let code = response.response_code()?;
                ensure!(code == 404, "responseCode {}", code);
                Ok(())
            },
        ))
        .case(TestCase::new(
            "API-TC04 - Response body has responseCode and message",
            &[API.name(), TEST_DATA.name()],
            |fx| async move {
                let api = fx.fetch(&API)?;
                let data = fx.fetch(&TEST_DATA)?;

                let response = api.login(&data.valid.email, &data.invalid.password).await?;
                let body = response.json()?;
                ensure!(
                    matches!(body.get("responseCode"), Some(Value::Number(_))),
                    "responseCode is not a number: {}",
                    body
                );
                ensure!(
                    matches!(body.get("message"), Some(Value::String(_))),
                    "message is not a string: {}",
                    body
                );
                Ok(())
            },
        ))
        .case(TestCase::new(
            "API-TC05 - Missing email is rejected",
            &[API.name(), TEST_DATA.name()],
            |fx| async move {
                let api = fx.fetch(&API)?;
                let data = fx.fetch(&TEST_DATA)?;

                let response = api.login("", &data.valid.password).await?;
                ensure!(response.response_code()? != 200, "login without email succeeded");
                Ok(())
            },
        ))
        .case(TestCase::new(
            "API-TC06 - Missing password is rejected",
            &[API.name(), TEST_DATA.name()],
            |fx| async move {
                let api = fx.fetch(&API)?;
                let data = fx.fetch(&TEST_DATA)?;

                let response = api.login(&data.valid.email, "").await?;
                ensure!(response.response_code()? != 200, "login without password succeeded");
                Ok(())
            },
        ))
        .tag_all("api")
}

fn data_driven(cases: Vec<ApiLoginCase>) -> Suite {
    Suite::new("API - Login Data-Driven")
        .cases(cases.into_iter().map(|case| {
            TestCase::new(case.label(), &[API.name()], move |fx| {
                let case = case.clone();
                async move {
                    let api = fx.fetch(&API)?;
                    let response = api.login(&case.email, &case.password).await?;
                    let code = response.response_code()?;
                    ensure!(
                        code == case.expected_response_code,
                        "responseCode {}, expected {}",
                        code,
                        case.expected_response_code
                    );
                    if code == 200 {
                        ensure!(response.status == 200, "HTTP {}", response.status);
                    }
                    Ok(())
                }
            })
        }))
        .tag_all("api")
        .tag_all("data-driven")
}
