//! UI checkout and payment, starting from a logged-in cart

use std::path::Path;
use std::time::Duration;

use anyhow::ensure;
use regex::Regex;

use shopcheck_fixture::Fixtures;

use crate::cases::{load_cases, CheckoutCommentCase, DataCase};
use crate::error::E2eResult;
use crate::fixtures::{AUTHENTICATED_PAGE, CART_PAGE, CHECKOUT_PAGE, PAYMENT_PAGE, PRODUCTS_PAGE, TEST_DATA};
use crate::runner::{Suite, TestCase};

const URL_TIMEOUT: Duration = Duration::from_secs(10);

const CHECKOUT_FIXTURES: &[&str] = &[
    AUTHENTICATED_PAGE.name(),
    PRODUCTS_PAGE.name(),
    CART_PAGE.name(),
    CHECKOUT_PAGE.name(),
];

pub fn suites(data_dir: &Path) -> E2eResult<Vec<Suite>> {
    Ok(vec![checkout_tests(), data_driven(load_cases(data_dir)?)])
}

/// Put the first product in the cart and open the cart
async fn fill_cart(fx: &Fixtures) -> anyhow::Result<()> {
    let products = fx.fetch(&PRODUCTS_PAGE)?;
    products.goto().await?;
    products.add_product_to_cart(0).await?;
    products.go_to_cart().await?;
    Ok(())
}

fn checkout_tests() -> Suite {
    Suite::new("UI - Checkout")
        .case(TestCase::new(
            "TC12 - Full checkout reaches payment",
            &[CHECKOUT_FIXTURES, &[TEST_DATA.name()]].concat(),
            |fx| async move {
                fill_cart(&fx).await?;
                let cart = fx.fetch(&CART_PAGE)?;
                let checkout = fx.fetch(&CHECKOUT_PAGE)?;
                let data = fx.fetch(&TEST_DATA)?;

                cart.proceed_to_checkout().await?;
                checkout.base().expect_visible(&checkout.delivery_address).await?;
                let address = checkout.delivery_address_text().await?;
                ensure!(!address.trim().is_empty(), "delivery address is empty");

                checkout.add_comment(&data.billing.checkout_comment).await?;
                checkout.place_order().await?;
                checkout.base().wait_for_url(&Regex::new("payment")?, URL_TIMEOUT).await?;
                Ok(())
            },
        ))
        .case(TestCase::new(
            "TC13 - Complete payment",
            &[CHECKOUT_FIXTURES, &[PAYMENT_PAGE.name(), TEST_DATA.name()]].concat(),
            |fx| async move {
                fill_cart(&fx).await?;
                let cart = fx.fetch(&CART_PAGE)?;
                let checkout = fx.fetch(&CHECKOUT_PAGE)?;
                let payment = fx.fetch(&PAYMENT_PAGE)?;
                let data = fx.fetch(&TEST_DATA)?;

                cart.proceed_to_checkout().await?;
                checkout.add_comment("Test order").await?;
                checkout.place_order().await?;

                payment.fill_payment_details(&data.payment).await?;
                payment.submit_payment().await?;

                payment
                    .base()
                    .wait_for_url(&Regex::new("payment_done|download")?, URL_TIMEOUT)
                    .await?;
                let message = payment.success_message().await?;
                ensure!(
                    message.contains(&data.order_success_message),
                    "confirmation reads '{}'",
                    message
                );
                Ok(())
            },
        ))
        .case(TestCase::new(
            "TC14 - Checkout shows delivery and billing addresses",
            CHECKOUT_FIXTURES,
            |fx| async move {
                fill_cart(&fx).await?;
                let cart = fx.fetch(&CART_PAGE)?;
                let checkout = fx.fetch(&CHECKOUT_PAGE)?;

                cart.proceed_to_checkout().await?;
                checkout.base().expect_visible(&checkout.delivery_address).await?;
                checkout.base().expect_visible(&checkout.billing_address).await?;

                let delivery = checkout.delivery_address_text().await?;
                ensure!(!delivery.trim().is_empty(), "delivery address is empty");
                Ok(())
            },
        ))
        .tag_all("ui")
}

fn data_driven(cases: Vec<CheckoutCommentCase>) -> Suite {
    Suite::new("UI - Checkout Data-Driven")
        .cases(cases.into_iter().map(|case| {
            TestCase::new(case.label(), CHECKOUT_FIXTURES, move |fx| {
                let case = case.clone();
                async move {
                    fill_cart(&fx).await?;
                    let cart = fx.fetch(&CART_PAGE)?;
                    let checkout = fx.fetch(&CHECKOUT_PAGE)?;

                    cart.proceed_to_checkout().await?;
                    checkout.add_comment(&case.comment).await?;
                    checkout.place_order().await?;
                    checkout.base().wait_for_url(&Regex::new("payment")?, URL_TIMEOUT).await?;
                    Ok(())
                }
            })
        }))
        .tag_all("ui")
        .tag_all("data-driven")
}
