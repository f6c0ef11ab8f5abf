use crate::error::E2eResult;
use crate::locator::Locator;
use crate::page::SharedPage;
use crate::pages::BasePage;

/// Shopping cart table
pub struct CartPage {
    base: BasePage,
    pub cart_table: Locator,
    pub product_rows: Locator,
    pub proceed_to_checkout_button: Locator,
    pub empty_cart_message: Locator,
    pub prices: Locator,
    pub quantities: Locator,
    pub delete_links: Locator,
}

impl CartPage {
    pub fn new(page: SharedPage) -> Self {
        Self {
            base: BasePage::new(page),
            cart_table: Locator::new("#cart_info_table"),
            product_rows: Locator::new(".cart_description"),
            proceed_to_checkout_button: Locator::new(r#"a:has-text("Proceed To Checkout")"#),
            empty_cart_message: Locator::new("#empty_cart"),
            prices: Locator::new(".cart_price p"),
            quantities: Locator::new(".cart_quantity button"),
            delete_links: Locator::new(".cart_delete a"),
        }
    }

    pub fn base(&self) -> &BasePage {
        &self.base
    }

    pub async fn goto(&self) -> E2eResult<()> {
        self.base.goto("/view_cart").await
    }

    pub async fn product_name(&self, index: usize) -> E2eResult<String> {
        self.base
            .element_text(&self.product_rows.nth(index).locator("h4 a"))
            .await
    }

    pub async fn product_price(&self, index: usize) -> E2eResult<String> {
        self.base.element_text(&self.prices.nth(index)).await
    }

    pub async fn product_quantity(&self, index: usize) -> E2eResult<String> {
        self.base.element_text(&self.quantities.nth(index)).await
    }

    /// Select the quantity cell and type over it
    pub async fn update_quantity(&self, index: usize, quantity: u32) -> E2eResult<()> {
        let page = self.base.page();
        page.click(&self.quantities.nth(index), 3).await?;
        page.type_text(&quantity.to_string()).await?;
        page.press("Enter").await
    }

    pub async fn delete_product(&self, index: usize) -> E2eResult<()> {
        self.base.click_element(&self.delete_links.nth(index)).await
    }

    pub async fn row_count(&self) -> E2eResult<usize> {
        self.base.page().count(&self.product_rows).await
    }

    pub async fn is_cart_empty(&self) -> E2eResult<bool> {
        Ok(self.row_count().await? == 0)
    }

    pub async fn proceed_to_checkout(&self) -> E2eResult<()> {
        self.base.click_element(&self.proceed_to_checkout_button).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockPage, Reaction};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_row_reads() {
        let mock = Arc::new(MockPage::new());
        mock.element(".cart_description >> nth=0 >> h4 a", true, Some("Blue Top"));
        mock.element(".cart_price p >> nth=0", true, Some("Rs. 500"));
        mock.element(".cart_quantity button >> nth=0", true, Some("1"));
        let cart = CartPage::new(mock);

        assert_eq!(cart.product_name(0).await.unwrap(), "Blue Top");
        assert_eq!(cart.product_price(0).await.unwrap(), "Rs. 500");
        assert_eq!(cart.product_quantity(0).await.unwrap(), "1");
    }

    #[tokio::test]
    async fn test_update_quantity_triple_clicks_then_types() {
        let mock = Arc::new(MockPage::new());
        mock.element(".cart_quantity button >> nth=0", true, Some("1"));
        let cart = CartPage::new(mock.clone());

        cart.update_quantity(0, 4).await.unwrap();
        assert_eq!(
            mock.actions(),
            vec![
                "click .cart_quantity button >> nth=0 x3".to_string(),
                "type 4".to_string(),
                "press Enter".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_delete_empties_cart() {
        let mock = Arc::new(MockPage::new());
        mock.set_count(".cart_description", 1);
        mock.element(".cart_delete a >> nth=0", true, None);
        mock.on_click(
            ".cart_delete a >> nth=0",
            Reaction::Remove(".cart_description".to_string()),
        );
        let cart = CartPage::new(mock);

        assert!(!cart.is_cart_empty().await.unwrap());
        cart.delete_product(0).await.unwrap();
        assert!(cart.is_cart_empty().await.unwrap());
    }
}
