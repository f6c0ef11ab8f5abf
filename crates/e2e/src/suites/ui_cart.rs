//! UI cart: adding, reading, removing products

use std::path::Path;
use std::time::Duration;

use anyhow::ensure;
use regex::Regex;

use crate::cases::{load_cases, CartCase, DataCase};
use crate::error::E2eResult;
use crate::fixtures::{AUTHENTICATED_PAGE, CART_PAGE, PRODUCTS_PAGE};
use crate::runner::{Suite, TestCase};

pub fn suites(data_dir: &Path) -> E2eResult<Vec<Suite>> {
    Ok(vec![cart_tests(), data_driven(load_cases(data_dir)?)])
}

/// First ten characters, for comparing truncated listing names
fn prefix(name: &str) -> String {
    name.chars().take(10).collect()
}

fn cart_tests() -> Suite {
    Suite::new("UI - Cart")
        .case(TestCase::new(
            "TC07 - Add product shows the confirmation modal",
            &[AUTHENTICATED_PAGE.name(), PRODUCTS_PAGE.name()],
            |fx| async move {
                let products = fx.fetch(&PRODUCTS_PAGE)?;
                products.goto().await?;
                products.add_product_to_cart(0).await?;

                products.base().expect_visible(&products.cart_modal).await?;
                products.base().expect_visible(&products.added_to_cart_text).await?;
                Ok(())
            },
        ))
        .case(TestCase::new(
            "TC08 - Cart shows name, quantity and price",
            &[PRODUCTS_PAGE.name(), CART_PAGE.name()],
            |fx| async move {
                let products = fx.fetch(&PRODUCTS_PAGE)?;
                let cart = fx.fetch(&CART_PAGE)?;

                products.goto().await?;
                let listed = products.product_name(0).await?;
                products.add_product_to_cart(0).await?;
                products.go_to_cart().await?;

                let name = cart.product_name(0).await?;
                ensure!(name.contains(&prefix(&listed)), "cart shows '{}', listed '{}'", name, listed);

                let quantity = cart.product_quantity(0).await?;
                ensure!(quantity.trim() == "1", "quantity is '{}'", quantity);

                let price = cart.product_price(0).await?;
                ensure!(Regex::new(r"Rs\.\s*\d+")?.is_match(&price), "price '{}'", price);
                Ok(())
            },
        ))
        .case(TestCase::new(
            "TC09 - Adding the same product twice raises its quantity",
            &[PRODUCTS_PAGE.name(), CART_PAGE.name()],
            |fx| async move {
                let products = fx.fetch(&PRODUCTS_PAGE)?;
                let cart = fx.fetch(&CART_PAGE)?;

                products.goto().await?;
                let listed = products.product_name(0).await?;
                products.add_product_to_cart(0).await?;
                products.continue_shopping().await?;
                products.add_product_to_cart(0).await?;
                products.go_to_cart().await?;

                let name = cart.product_name(0).await?;
                ensure!(name.contains(&prefix(&listed)), "cart shows '{}', listed '{}'", name, listed);
                let quantity = cart.product_quantity(0).await?;
                ensure!(quantity.trim() == "2", "quantity is '{}'", quantity);
                Ok(())
            },
        ))
        .case(TestCase::new(
            "TC10 - Remove product from cart",
            &[PRODUCTS_PAGE.name(), CART_PAGE.name()],
            |fx| async move {
                let products = fx.fetch(&PRODUCTS_PAGE)?;
                let cart = fx.fetch(&CART_PAGE)?;

                products.goto().await?;
                products.add_product_to_cart(0).await?;
                products.go_to_cart().await?;

                cart.delete_product(0).await?;
                tokio::time::sleep(Duration::from_secs(1)).await;
                ensure!(cart.is_cart_empty().await?, "cart still has products");
                Ok(())
            },
        ))
        .case(TestCase::new(
            "TC11 - Cart is empty after removing every product",
            &[PRODUCTS_PAGE.name(), CART_PAGE.name()],
            |fx| async move {
                let products = fx.fetch(&PRODUCTS_PAGE)?;
                let cart = fx.fetch(&CART_PAGE)?;

                products.goto().await?;
                products.add_product_to_cart(0).await?;
                products.continue_shopping().await?;
                products.add_product_to_cart(1).await?;
                products.go_to_cart().await?;

                let rows = cart.row_count().await?;
                ensure!(rows == 2, "expected 2 rows, found {}", rows);
                for _ in 0..rows {
                    cart.delete_product(0).await?;
                    tokio::time::sleep(Duration::from_millis(500)).await;
                }
                ensure!(cart.is_cart_empty().await?, "cart still has products");
                Ok(())
            },
        ))
        .tag_all("ui")
}

fn data_driven(cases: Vec<CartCase>) -> Suite {
    Suite::new("UI - Cart Data-Driven")
        .cases(cases.into_iter().map(|case| {
            TestCase::new(case.label(), &[PRODUCTS_PAGE.name(), CART_PAGE.name()], move |fx| {
                let case = case.clone();
                async move {
                    let products = fx.fetch(&PRODUCTS_PAGE)?;
                    let cart = fx.fetch(&CART_PAGE)?;

                    products.goto().await?;
                    products.add_product_to_cart(case.product_index).await?;
                    products.go_to_cart().await?;

                    let quantity = cart.product_quantity(0).await?;
                    ensure!(
                        quantity.trim() == case.expected_quantity,
                        "quantity '{}', expected '{}'",
                        quantity,
                        case.expected_quantity
                    );
                    Ok(())
                }
            })
        }))
        .tag_all("ui")
        .tag_all("data-driven")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefix_is_char_safe() {
        assert_eq!(prefix("Men Tshirt"), "Men Tshirt");
        assert_eq!(prefix("Señora Top Blue"), "Señora Top");
    }
}
