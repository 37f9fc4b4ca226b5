use std::time::Duration;

use async_trait::async_trait;
use domain::{CustomerId, CustomerProfile, Product, Sku};
use reqwest::{Client, Response, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;

use super::RetailApi;
use super::types::*;
use crate::error::RetailApiError;

/// HTTP client for the retail data service.
///
/// `base_url` includes the API prefix, e.g. `http://localhost:5001/api`.
#[derive(Clone)]
pub struct HttpRetailApi {
    client: Client,
    base_url: String,
}

impl HttpRetailApi {
    /// Creates a client with a per-request timeout.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, RetailApiError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RetailApiError::Unavailable(format!("failed to build client: {e}")))?;
        Ok(Self::with_client(client, base_url))
    }

    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, RetailApiError> {
        let response = self
            .client
            .get(self.url(path))
            .send()
            .await
            .map_err(request_failed)?;
        decode(path, response).await
    }

    async fn post_json<B: Serialize + Sync, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, RetailApiError> {
        let response = self
            .client
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .map_err(request_failed)?;
        decode(path, response).await
    }
}

fn request_failed(err: reqwest::Error) -> RetailApiError {
    if err.is_timeout() {
        RetailApiError::Unavailable(format!("request timed out: {err}"))
    } else {
        RetailApiError::Unavailable(format!("request failed: {err}"))
    }
}

#[derive(serde::Deserialize, Default)]
struct ErrorBody {
    message: Option<String>,
    error: Option<String>,
    error_code: Option<String>,
}

async fn decode<T: DeserializeOwned>(path: &str, response: Response) -> Result<T, RetailApiError> {
    let status = response.status();
    if status.is_success() {
        return response
            .json()
            .await
            .map_err(|e| RetailApiError::Decode(format!("{path}: {e}")));
    }

    let body_text = response.text().await.unwrap_or_default();
    let body: ErrorBody = serde_json::from_str(&body_text).unwrap_or_default();
    let message = body
        .message
        .or(body.error)
        .unwrap_or_else(|| format!("{path} returned {status}"));

    Err(map_status(status, message, body.error_code))
}

fn map_status(status: StatusCode, message: String, error_code: Option<String>) -> RetailApiError {
    if status == StatusCode::NOT_FOUND {
        RetailApiError::NotFound(message)
    } else if status.is_client_error() {
        RetailApiError::Rejected {
            status: status.as_u16(),
            message,
            error_code,
        }
    } else {
        RetailApiError::Unavailable(format!("{status}: {message}"))
    }
}

#[async_trait]
impl RetailApi for HttpRetailApi {
    async fn get_customer(
        &self,
        customer_id: &CustomerId,
    ) -> Result<CustomerProfile, RetailApiError> {
        self.get_json(&format!("/customers/{customer_id}")).await
    }

    async fn list_products(&self) -> Result<Vec<Product>, RetailApiError> {
        self.get_json("/products").await
    }

    async fn get_product(&self, sku: &Sku) -> Result<Product, RetailApiError> {
        self.get_json(&format!("/products/{sku}")).await
    }

    async fn get_inventory(&self, sku: &Sku) -> Result<InventoryRecord, RetailApiError> {
        self.get_json(&format!("/inventory/{sku}")).await
    }

    async fn process_payment(
        &self,
        charge: &PaymentCharge,
    ) -> Result<PaymentReceipt, RetailApiError> {
        self.post_json("/payment/process", charge).await
    }

    async fn retry_payment(&self, charge: &PaymentCharge) -> Result<PaymentReceipt, RetailApiError> {
        self.post_json("/payment/retry", charge).await
    }

    async fn list_promotions(&self) -> Result<Vec<Promotion>, RetailApiError> {
        self.get_json("/promotions").await
    }

    async fn apply_promotion(
        &self,
        request: &PromoApplyRequest,
    ) -> Result<PromoApplyResponse, RetailApiError> {
        self.post_json("/promotions/apply", request).await
    }

    async fn get_loyalty(&self, customer_id: &CustomerId) -> Result<LoyaltyInfo, RetailApiError> {
        self.get_json(&format!("/loyalty/{customer_id}")).await
    }

    async fn redeem_points(
        &self,
        request: &RedeemRequest,
    ) -> Result<RedeemResponse, RetailApiError> {
        self.post_json("/loyalty/redeem", request).await
    }

    async fn create_order(
        &self,
        request: &OrderRequest,
    ) -> Result<OrderConfirmation, RetailApiError> {
        self.post_json("/orders/create", request).await
    }

    async fn get_order(&self, order_id: &str) -> Result<OrderStatus, RetailApiError> {
        self.get_json(&format!("/orders/{order_id}")).await
    }
}
