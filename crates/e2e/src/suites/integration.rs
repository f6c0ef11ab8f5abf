//! Cross-checks between what the UI shows and what the API reports

use anyhow::ensure;

use crate::fixtures::{API, LOGIN_PAGE, PAGE, TEST_DATA};
use crate::locator::Locator;
use crate::page::WaitState;
use crate::runner::{Suite, TestCase};

pub fn suite() -> Suite {
    Suite::new("Integration - UI + API")
        .case(TestCase::new(
            "INT-TC01 - Logged-in UI user matches the API user",
            &[LOGIN_PAGE.name(), API.name(), TEST_DATA.name()],
            |fx| async move {
                let login = fx.fetch(&LOGIN_PAGE)?;
                let api = fx.fetch(&API)?;
                let data = fx.fetch(&TEST_DATA)?;

                login.goto().await?;
                login.login(&data.valid.email, &data.valid.password).await?;
                login.base().expect_visible(&login.logged_in_as).await?;
                let ui_name = login.logged_in_username().await?;

                let response = api.user_detail_by_email(&data.valid.email).await?;
                ensure!(response.status == 200, "HTTP {}", response.status);
                let user = response.user()?;
                ensure!(user.name == ui_name, "UI shows '{}', API has '{}'", ui_name, user.name);
                Ok(())
            },
        ))
        .case(TestCase::new(
            "INT-TC02 - First UI product exists in the API",
            &[PAGE.name(), API.name()],
            |fx| async move {
                let page = fx.fetch(&PAGE)?;
                let products = fx.fetch(&API)?.products_list().await?.products()?;

                page.goto("/products").await?;
                page.wait_for(&Locator::new(".features_items"), WaitState::Visible, None)
                    .await?;
                let first = page
                    .text_content(&Locator::new(".productinfo p").first())
                    .await?
                    .unwrap_or_default();

                let known = products
                    .iter()
                    .any(|p| first.contains(&p.name) || p.name.contains(&first));
                ensure!(known, "'{}' is not in the API product list", first);
                Ok(())
            },
        ))
        .case(TestCase::new(
            "INT-TC03 - Product price matches between UI and API",
            &[PAGE.name(), API.name()],
            |fx| async move {
                let page = fx.fetch(&PAGE)?;
                let products = fx.fetch(&API)?.products_list().await?.products()?;
                let product = products
                    .first()
                    .ok_or_else(|| anyhow::anyhow!("API lists no products"))?;

                page.goto(&format!("/product_details/{}", product.id)).await?;
                let ui_price = page
                    .text_content(&Locator::new(".product-information span span"))
                    .await?
                    .unwrap_or_default();

                let amount = product.price.replace("Rs. ", "");
                ensure!(ui_price.contains(&amount), "UI price '{}', API price '{}'", ui_price, product.price);
                Ok(())
            },
        ))
        .tag_all("integration")
}
