//! Page objects for the store's screens
//!
//! Each page object binds one shared page handle and exposes the screen's
//! locators plus its domain actions. None of them navigates to another
//! screen on the caller's behalf.

mod base;
mod cart;
mod checkout;
mod login;
mod payment;
mod products;

pub use base::BasePage;
pub use cart::CartPage;
pub use checkout::CheckoutPage;
pub use login::LoginPage;
pub use payment::PaymentPage;
pub use products::ProductsPage;
