use std::time::Duration;

use crate::data::PaymentCard;
use crate::error::E2eResult;
use crate::locator::Locator;
use crate::page::{SharedPage, WaitState};
use crate::pages::BasePage;

const SUCCESS_TIMEOUT: Duration = Duration::from_secs(5);

pub struct PaymentPage {
    base: BasePage,
    pub name_on_card: Locator,
    pub card_number: Locator,
    pub cvc: Locator,
    pub expiry_month: Locator,
    pub expiry_year: Locator,
    pub pay_button: Locator,
    pub success_message: Locator,
}

impl PaymentPage {
    pub fn new(page: SharedPage) -> Self {
        Self {
            base: BasePage::new(page),
            name_on_card: Locator::new(r#"[data-qa="name-on-card"]"#),
            card_number: Locator::new(r#"[data-qa="card-number"]"#),
            cvc: Locator::new(r#"[data-qa="cvc"]"#),
            expiry_month: Locator::new(r#"[data-qa="expiry-month"]"#),
            expiry_year: Locator::new(r#"[data-qa="expiry-year"]"#),
            pay_button: Locator::new(r#"[data-qa="pay-button"]"#),
            success_message: Locator::text("Congratulations!"),
        }
    }

    pub fn base(&self) -> &BasePage {
        &self.base
    }

    pub async fn fill_payment_details(&self, card: &PaymentCard) -> E2eResult<()> {
        self.base.fill_field(&self.name_on_card, &card.name_on_card).await?;
        self.base.fill_field(&self.card_number, &card.number).await?;
        self.base.fill_field(&self.cvc, &card.cvc).await?;
        self.base.fill_field(&self.expiry_month, &card.expiry_month).await?;
        self.base.fill_field(&self.expiry_year, &card.expiry_year).await
    }

    pub async fn submit_payment(&self) -> E2eResult<()> {
        self.base.click_element(&self.pay_button).await
    }

    pub async fn success_message(&self) -> E2eResult<String> {
        self.base
            .page()
            .wait_for(&self.success_message, WaitState::Visible, Some(SUCCESS_TIMEOUT))
            .await?;
        self.base.element_text(&self.success_message).await
    }
}
