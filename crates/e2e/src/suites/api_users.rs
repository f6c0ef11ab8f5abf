//! API user management. Every test that creates an account deletes it
//! again, whatever the outcome of its assertions.

use anyhow::ensure;
use tracing::{debug, warn};

use crate::api::{ApiClient, NewAccount};
use crate::data::generate_user_data;
use crate::fixtures::API;
use crate::runner::{Suite, TestCase};

async fn delete_quietly(api: &ApiClient, account: &NewAccount) {
    match api.delete_account(&account.email, &account.password).await {
        Ok(response) => debug!(email = %account.email, code = ?response.response_code().ok(), "Cleaned up account"),
        Err(e) => warn!(email = %account.email, "Account cleanup failed: {}", e),
    }
}

pub fn suite() -> Suite {
    Suite::new("API - User Management")
        .case(TestCase::new(
            "API-TC13 - Create account with a new email",
            &[API.name()],
            |fx| async move {
                let api = fx.fetch(&API)?;
                let user = generate_user_data();

                let result = async {
                    let response = api.create_account(&user).await?;
                    ensure!(response.status == 200, "HTTP {}", response.status);
                    ensure!(response.response_code()? == 201, "responseCode {}", response.response_code()?);
                    let message = response.message().unwrap_or_default();
                    ensure!(message.contains("User created"), "message '{}'", message);
                    Ok::<(), anyhow::Error>(())
                }
                .await;

                delete_quietly(&api, &user).await;
                result
            },
        ))
        .case(TestCase::new(
            "API-TC14 - Creating an existing email fails",
            &[API.name()],
            |fx| async move {
                let api = fx.fetch(&API)?;
                let user = generate_user_data();

                let result = async {
                    api.create_account(&user).await?;
                    let response = api.create_account(&user).await?;
                    ensure!(response.response_code()? == 400, "responseCode {}", response.response_code()?);
                    let message = response.message().unwrap_or_default();
                    ensure!(message.contains("Email already exists"), "message '{}'", message);
                    Ok::<(), anyhow::Error>(())
                }
                .await;

                delete_quietly(&api, &user).await;
                result
            },
        ))
        .case(TestCase::new(
            "API-TC15 - Account creation requires an email",
            &[API.name()],
            |fx| async move {
                let api = fx.fetch(&API)?;
                let response = api
                    .create_account(&NewAccount::minimal("Test", "", "test123"))
                    .await?;
                ensure!(response.response_code()? != 201, "account created without email");
                Ok(())
            },
        ))
        .case(TestCase::new(
            "API-TC16 - Get user detail by email",
            &[API.name()],
            |fx| async move {
                let api = fx.fetch(&API)?;
                let user = generate_user_data();

                let result = async {
                    api.create_account(&user).await?;
                    let response = api.user_detail_by_email(&user.email).await?;
                    ensure!(response.status == 200, "HTTP {}", response.status);
                    ensure!(response.response_code()? == 200, "responseCode {}", response.response_code()?);
                    let detail = response.user()?;
                    ensure!(detail.email == user.email, "got user {}", detail.email);
                    Ok::<(), anyhow::Error>(())
                }
                .await;

                delete_quietly(&api, &user).await;
                result
            },
        ))
        .case(TestCase::new(
            "API-TC17 - Delete an existing account",
            &[API.name()],
            |fx| async move {
                let api = fx.fetch(&API)?;
                let user = generate_user_data();

                api.create_account(&user).await?;
                let response = api.delete_account(&user.email, &user.password).await?;
                ensure!(response.status == 200, "HTTP {}", response.status);
                ensure!(response.response_code()? == 200, "responseCode {}", response.response_code()?);
                let message = response.message().unwrap_or_default();
                ensure!(message.contains("Account deleted"), "message '{}'", message);
                Ok(())
            },
        ))
        .tag_all("api")
}
