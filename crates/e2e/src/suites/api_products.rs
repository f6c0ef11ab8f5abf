//! API products: listing shape and search

use std::collections::HashSet;

use anyhow::ensure;
use regex::Regex;
use serde_json::Value;

use crate::fixtures::API;
use crate::runner::{Suite, TestCase};

pub fn suite() -> Suite {
    Suite::new("API - Products")
        .case(TestCase::new(
            "API-TC07 - GET /productsList returns 200",
            &[API.name()],
            |fx| async move {
                let response = fx.fetch(&API)?.products_list().await?;
                ensure!(response.status == 200, "HTTP {}", response.status);
                Ok(())
            },
        ))
        .case(TestCase::new(
            "API-TC08 - Product list is not empty",
            &[API.name()],
            |fx| async move {
                let response = fx.fetch(&API)?.products_list().await?;
                ensure!(response.response_code()? == 200, "responseCode {}", response.response_code()?);
                let products = response.products()?;
                ensure!(!products.is_empty(), "no products listed");
                Ok(())
            },
        ))
        .case(TestCase::new(
            "API-TC09 - Product has id, name and price",
            &[API.name()],
            |fx| async move {
                let response = fx.fetch(&API)?.products_list().await?;
                let first = &response.json()?["products"][0];
                ensure!(matches!(first.get("id"), Some(Value::Number(_))), "id: {}", first);
                ensure!(matches!(first.get("name"), Some(Value::String(_))), "name: {}", first);
                ensure!(matches!(first.get("price"), Some(Value::String(_))), "price: {}", first);
                Ok(())
            },
        ))
        .case(TestCase::new(
            "API-TC10 - Product ids are unique",
            &[API.name()],
            |fx| async move {
                let products = fx.fetch(&API)?.products_list().await?.products()?;
                let unique: HashSet<i64> = products.iter().map(|p| p.id).collect();
                ensure!(
                    unique.len() == products.len(),
                    "{} products, {} distinct ids",
                    products.len(),
                    unique.len()
                );
                Ok(())
            },
        ))
        .case(TestCase::new(
            "API-TC11 - Every product has a valid price",
            &[API.name()],
            |fx| async move {
                let products = fx.fetch(&API)?.products_list().await?.products()?;
                let price = Regex::new(r"Rs\.\s*\d+")?;
                for product in &products {
                    ensure!(
                        price.is_match(&product.price),
                        "product {} has price '{}'",
                        product.id,
                        product.price
                    );
                }
                Ok(())
            },
        ))
        .case(TestCase::new(
            "API-TC12 - Search for a product",
            &[API.name()],
            |fx| async move {
                let response = fx.fetch(&API)?.search_product("tshirt").await?;
                ensure!(response.status == 200, "HTTP {}", response.status);
                ensure!(response.response_code()? == 200, "responseCode {}", response.response_code()?);
                ensure!(response.has_field("products"), "no products in search result");
                Ok(())
            },
        ))
        .tag_all("api")
}
