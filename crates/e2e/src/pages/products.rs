use crate::error::E2eResult;
use crate::locator::Locator;
use crate::page::{SharedPage, WaitState};
use crate::pages::BasePage;

/// Product listing with its "added to cart" modal
pub struct ProductsPage {
    base: BasePage,
    pub products_list: Locator,
    pub add_to_cart_buttons: Locator,
    pub continue_shopping_button: Locator,
    pub view_cart_link: Locator,
    pub cart_modal: Locator,
    pub added_to_cart_text: Locator,
    pub product_names: Locator,
}

impl ProductsPage {
    pub fn new(page: SharedPage) -> Self {
        Self {
            base: BasePage::new(page),
            products_list: Locator::new(".features_items"),
            add_to_cart_buttons: Locator::new(r#".productinfo a:has-text("Add to cart")"#),
            continue_shopping_button: Locator::new(r#"button:has-text("Continue Shopping")"#),
            view_cart_link: Locator::new(r#"a:has-text("View Cart")"#),
            cart_modal: Locator::new("#cartModal"),
            added_to_cart_text: Locator::text("Your product has been added to cart"),
            product_names: Locator::new(".productinfo p"),
        }
    }

    pub fn base(&self) -> &BasePage {
        &self.base
    }

    pub async fn goto(&self) -> E2eResult<()> {
        self.base.goto("/products").await?;
        self.base
            .page()
            .wait_for(&self.products_list, WaitState::Visible, None)
            .await
    }

    /// Click "Add to cart" on the `index`th product and wait for the modal
    pub async fn add_product_to_cart(&self, index: usize) -> E2eResult<()> {
        self.base.click_element(&self.add_to_cart_buttons.nth(index)).await?;
        self.base
            .page()
            .wait_for(&self.cart_modal, WaitState::Visible, None)
            .await
    }

    pub async fn continue_shopping(&self) -> E2eResult<()> {
        self.base.click_element(&self.continue_shopping_button).await?;
        self.base
            .page()
            .wait_for(&self.cart_modal, WaitState::Hidden, None)
            .await
    }

    pub async fn go_to_cart(&self) -> E2eResult<()> {
        self.base.click_element(&self.view_cart_link).await
    }

    pub async fn product_name(&self, index: usize) -> E2eResult<String> {
        self.base.element_text(&self.product_names.nth(index)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockPage, Reaction};
    use std::sync::Arc;

    const MODAL: &str = "#cartModal";
    const CONTINUE: &str = r#"button:has-text("Continue Shopping")"#;

    #[tokio::test]
    async fn test_add_and_continue_shopping() {
        let mock = Arc::new(MockPage::new());
        let second = r#".productinfo a:has-text("Add to cart") >> nth=1"#;
        mock.element(second, true, Some("Add to cart"));
        mock.on_click(second, Reaction::Show(MODAL.to_string(), None));
        mock.element(CONTINUE, true, None);
        mock.on_click(CONTINUE, Reaction::Hide(MODAL.to_string()));
        let page = ProductsPage::new(mock.clone());

        page.add_product_to_cart(1).await.unwrap();
        assert!(mock.actions().contains(&"wait_for #cartModal visible".to_string()));

        page.continue_shopping().await.unwrap();
        assert_eq!(
            mock.actions().last().map(String::as_str),
            Some("wait_for #cartModal hidden")
        );
    }

    #[tokio::test]
    async fn test_modal_never_appears() {
        let mock = Arc::new(MockPage::new());
        mock.element(r#".productinfo a:has-text("Add to cart") >> nth=0"#, true, None);
        let page = ProductsPage::new(mock);

        assert!(page.add_product_to_cart(0).await.unwrap_err().is_interaction());
    }

    #[tokio::test]
    async fn test_product_name_by_index() {
        let mock = Arc::new(MockPage::new());
        mock.element(".productinfo p >> nth=2", true, Some("Sleeveless Dress"));
        let page = ProductsPage::new(mock);

        assert_eq!(page.product_name(2).await.unwrap(), "Sleeveless Dress");
    }
}
