use crate::error::E2eResult;
use crate::locator::Locator;
use crate::page::SharedPage;
use crate::pages::BasePage;

pub struct CheckoutPage {
    base: BasePage,
    pub delivery_address: Locator,
    pub billing_address: Locator,
    pub comment_textarea: Locator,
    pub place_order_button: Locator,
}

impl CheckoutPage {
    pub fn new(page: SharedPage) -> Self {
        Self {
            base: BasePage::new(page),
            delivery_address: Locator::new("#address_delivery"),
            billing_address: Locator::new("#address_invoice"),
            comment_textarea: Locator::new(r#"textarea[name="message"]"#),
            place_order_button: Locator::new(r#"a:has-text("Place Order")"#),
        }
    }

    pub fn base(&self) -> &BasePage {
        &self.base
    }

    pub async fn delivery_address_text(&self) -> E2eResult<String> {
        self.base.element_text(&self.delivery_address).await
    }

    pub async fn add_comment(&self, comment: &str) -> E2eResult<()> {
        self.base.fill_field(&self.comment_textarea, comment).await
    }

    pub async fn place_order(&self) -> E2eResult<()> {
        self.base.click_element(&self.place_order_button).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockPage, Reaction};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_comment_and_place_order() {
        let mock = Arc::new(MockPage::new());
        mock.element(r#"textarea[name="message"]"#, true, None);
        mock.element(r#"a:has-text("Place Order")"#, true, None);
        mock.on_click(r#"a:has-text("Place Order")"#, Reaction::Navigate("/payment".to_string()));
        let checkout = CheckoutPage::new(mock.clone());

        checkout.add_comment("Test order").await.unwrap();
        checkout.place_order().await.unwrap();

        assert!(checkout.base().current_url().await.unwrap().ends_with("/payment"));
        assert_eq!(mock.actions()[0], r#"fill textarea[name="message"]=Test order"#);
    }
}
