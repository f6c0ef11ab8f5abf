//! Shared test data for the live suites

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::api::NewAccount;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
    /// Display name shown after "Logged in as", when known
    #[serde(default)]
    pub name: Option<String>,
}

impl Credentials {
    pub fn new(email: &str, password: &str) -> Self {
        Self {
            email: email.to_string(),
            password: password.to_string(),
            name: None,
        }
    }
}

/// Address block the checkout page shows for the valid user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BillingAddress {
    pub title: String,
    pub full_name: String,
    pub company: String,
    pub street: String,
    pub country: String,
    pub city_zip: String,
    pub state: String,
    pub phone: String,
    pub checkout_comment: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentCard {
    pub name_on_card: String,
    pub number: String,
    pub cvc: String,
    pub expiry_month: String,
    pub expiry_year: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestData {
    pub valid: Credentials,
    pub invalid: Credentials,
    pub non_existent: Credentials,
    pub billing: BillingAddress,
    pub payment: PaymentCard,
    pub order_success_message: String,
}

impl Default for TestData {
    fn default() -> Self {
        Self {
            valid: Credentials {
                name: Some("Testuser".to_string()),
                ..Credentials::new("testqauser@example.com", "Test@123")
            },
            invalid: Credentials::new("invalid@example.com", "wrongpass"),
            non_existent: Credentials::new("nonexistent@example.com", "anypassword"),
            billing: BillingAddress {
                title: "Your delivery address".to_string(),
                full_name: "Mr. Testuser user".to_string(),
                company: "Something".to_string(),
                street: "kane Street,falt no 234,usa".to_string(),
                country: "usa".to_string(),
                city_zip: "newyork new 144258".to_string(),
                state: "India".to_string(),
                phone: "235478961".to_string(),
                checkout_comment: "Por favor, entregar en la mañana".to_string(),
            },
            payment: PaymentCard {
                name_on_card: "Test User".to_string(),
                number: "4111111111111111".to_string(),
                cvc: "123".to_string(),
                expiry_month: "12".to_string(),
                expiry_year: "2027".to_string(),
            },
            order_success_message: "Congratulations! Your order has been confirmed!".to_string(),
        }
    }
}

/// Unique address built from the current millisecond timestamp
pub fn generate_random_email() -> String {
    format!("testuser{}@example.com", Utc::now().timestamp_millis())
}

/// A complete, unique account for the user-management suites
pub fn generate_user_data() -> NewAccount {
    let stamp = Utc::now().timestamp_millis();
    NewAccount {
        name: format!("Test User {}", stamp),
        email: format!("testuser{}@example.com", stamp),
        password: "Test@123".to_string(),
        title: "Mr".to_string(),
        birth_date: "15".to_string(),
        birth_month: "5".to_string(),
        birth_year: "1990".to_string(),
        firstname: "Test".to_string(),
        lastname: "User".to_string(),
        company: "Test Company".to_string(),
        address1: "123 Test Street".to_string(),
        address2: "Apt 4B".to_string(),
        country: "United States".to_string(),
        zipcode: "12345".to_string(),
        state: "California".to_string(),
        city: "Los Angeles".to_string(),
        mobile_number: "1234567890".to_string(),
    }
}
