//! Client for the store's JSON API
//!
//! The API answers almost everything with HTTP 200 and reports the real
//! outcome as `responseCode` inside a JSON body served as `text/html`, so
//! bodies are parsed from text and never by content type.

use std::time::{Duration, Instant};

use reqwest::{Client, RequestBuilder};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::error::{E2eError, E2eResult};

/// HTTP resource handle: one client and the API root it talks to
#[derive(Debug, Clone)]
pub struct RequestContext {
    client: Client,
    base_url: String,
    timeout: Duration,
}

impl RequestContext {
    pub fn new(base_url: &str, timeout: Duration) -> E2eResult<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url, endpoint)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub price: String,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub category: Option<Value>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct UserDetail {
    pub id: Option<i64>,
    pub name: String,
    pub email: String,
    pub title: String,
    pub birth_day: String,
    pub birth_month: String,
    pub birth_year: String,
    pub first_name: String,
    pub last_name: String,
    pub company: String,
    pub address1: String,
    pub address2: String,
    pub country: String,
    pub state: String,
    pub city: String,
    pub zipcode: String,
}

/// Form for `/createAccount`; empty fields are left out of the request
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewAccount {
    pub name: String,
    pub email: String,
    pub password: String,
    pub title: String,
    pub birth_date: String,
    pub birth_month: String,
    pub birth_year: String,
    pub firstname: String,
    pub lastname: String,
    pub company: String,
    pub address1: String,
    pub address2: String,
    pub country: String,
    pub zipcode: String,
    pub state: String,
    pub city: String,
    pub mobile_number: String,
}

impl NewAccount {
    pub fn minimal(name: &str, email: &str, password: &str) -> Self {
        Self {
            name: name.to_string(),
            email: email.to_string(),
            password: password.to_string(),
            ..Default::default()
        }
    }

    pub fn to_form(&self) -> Vec<(&'static str, &str)> {
        [
            ("name", &self.name),
            ("email", &self.email),
            ("password", &self.password),
            ("title", &self.title),
            ("birth_date", &self.birth_date),
            ("birth_month", &self.birth_month),
            ("birth_year", &self.birth_year),
            ("firstname", &self.firstname),
            ("lastname", &self.lastname),
            ("company", &self.company),
            ("address1", &self.address1),
            ("address2", &self.address2),
            ("country", &self.country),
            ("zipcode", &self.zipcode),
            ("state", &self.state),
            ("city", &self.city),
            ("mobile_number", &self.mobile_number),
        ]
        .into_iter()
        .filter(|(_, value)| !value.is_empty())
        .map(|(key, value)| (key, value.as_str()))
        .collect()
    }
}

/// A response as the suites observe it
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub endpoint: String,
    pub status: u16,
    pub elapsed: Duration,
    pub text: String,
    body: Option<Value>,
}

impl ApiResponse {
    pub fn new(endpoint: &str, status: u16, elapsed: Duration, text: String) -> Self {
        let body = serde_json::from_str(&text).ok();
        Self {
            endpoint: endpoint.to_string(),
            status,
            elapsed,
            text,
            body,
        }
    }

    pub fn json(&self) -> E2eResult<&Value> {
        self.body.as_ref().ok_or_else(|| self.unexpected("body is not JSON"))
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.body.as_ref().and_then(|b| b.get(field)).is_some()
    }

    pub fn response_code(&self) -> E2eResult<i64> {
        self.json()?
            .get("responseCode")
            .and_then(Value::as_i64)
            .ok_or_else(|| self.unexpected("no numeric responseCode"))
    }

    pub fn message(&self) -> Option<&str> {
        self.body.as_ref()?.get("message")?.as_str()
    }

    pub fn products(&self) -> E2eResult<Vec<Product>> {
        let products = self
            .json()?
            .get("products")
            .ok_or_else(|| self.unexpected("no products array"))?;
        Ok(serde_json::from_value(products.clone())?)
    }

    pub fn user(&self) -> E2eResult<UserDetail> {
        let user = self
            .json()?
            .get("user")
            .ok_or_else(|| self.unexpected("no user object"))?;
        Ok(serde_json::from_value(user.clone())?)
    }

    fn unexpected(&self, reason: &str) -> E2eError {
        E2eError::UnexpectedResponse {
            endpoint: self.endpoint.clone(),
            status: self.status,
            reason: reason.to_string(),
        }
    }
}

/// Domain requests against the store API
#[derive(Debug, Clone)]
pub struct ApiClient {
    request: RequestContext,
}

impl ApiClient {
    pub fn new(request: &RequestContext) -> Self {
        Self {
            request: request.clone(),
        }
    }

    pub fn base_url(&self) -> &str {
        self.request.base_url()
    }

    pub async fn login(&self, email: &str, password: &str) -> E2eResult<ApiResponse> {
        let endpoint = "/verifyLogin";
        let builder = self
            .request
            .client
            .post(self.request.url(endpoint))
            .form(&[("email", email), ("password", password)]);
        self.send(endpoint, builder).await
    }

    pub async fn products_list(&self) -> E2eResult<ApiResponse> {
        let endpoint = "/productsList";
        let builder = self.request.client.get(self.request.url(endpoint));
        self.send(endpoint, builder).await
    }

    pub async fn search_product(&self, term: &str) -> E2eResult<ApiResponse> {
        let endpoint = "/searchProduct";
        let builder = self
            .request
            .client
            .post(self.request.url(endpoint))
            .form(&[("search_product", term)]);
        self.send(endpoint, builder).await
    }

    pub async fn create_account(&self, account: &NewAccount) -> E2eResult<ApiResponse> {
        let endpoint = "/createAccount";
        let builder = self
            .request
            .client
            .post(self.request.url(endpoint))
            .form(&account.to_form());
        self.send(endpoint, builder).await
    }

    pub async fn user_detail_by_email(&self, email: &str) -> E2eResult<ApiResponse> {
        let endpoint = "/getUserDetailByEmail";
        let builder = self
            .request
            .client
            .get(self.request.url(endpoint))
            .query(&[("email", email)]);
        self.send(endpoint, builder).await
    }

    pub async fn delete_account(&self, email: &str, password: &str) -> E2eResult<ApiResponse> {
        let endpoint = "/deleteAccount";
        let builder = self
            .request
            .client
            .delete(self.request.url(endpoint))
            .form(&[("email", email), ("password", password)]);
        self.send(endpoint, builder).await
    }

    async fn send(&self, endpoint: &str, builder: RequestBuilder) -> E2eResult<ApiResponse> {
        let started = Instant::now();
        let response = builder.send().await.map_err(|e| self.transport_error(endpoint, e))?;
        let status = response.status().as_u16();
        let text = response.text().await.map_err(|e| self.transport_error(endpoint, e))?;
        let elapsed = started.elapsed();

        debug!(endpoint, status, elapsed_ms = elapsed.as_millis() as u64, "API response");
        Ok(ApiResponse::new(endpoint, status, elapsed, text))
    }

    /// Timeouts, whether waiting for headers or for the body, are
    /// interaction failures
    fn transport_error(&self, endpoint: &str, error: reqwest::Error) -> E2eError {
        if error.is_timeout() {
            E2eError::interaction(
                "request",
                endpoint,
                format!("no response within {} ms", self.request.timeout.as_millis()),
            )
        } else {
            E2eError::Http(error)
        }
    }
}
