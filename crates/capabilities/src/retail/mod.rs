//! Client side of the retail data service: products, inventory, payments,
//! promotions, loyalty and orders.

mod http;
mod memory;
mod types;

pub use http::HttpRetailApi;
pub use memory::{InMemoryRetailApi, demo_catalog};
pub use types::{
    InventoryRecord, LoyaltyInfo, OrderConfirmation, OrderRequest, OrderStatus, PaymentCharge,
    PaymentReceipt, PromoApplyRequest, PromoApplyResponse, Promotion, PromotionKind,
    RedeemRequest, RedeemResponse, TierBenefits,
};

use async_trait::async_trait;
use domain::{CustomerId, CustomerProfile, Product, Sku};

use crate::error::RetailApiError;

/// The retail data service, source of truth for catalog, stock, promotions,
/// loyalty and orders.
#[async_trait]
pub trait RetailApi: Send + Sync {
    /// `GET /customers/{id}`
    async fn get_customer(
        &self,
        customer_id: &CustomerId,
    ) -> Result<CustomerProfile, RetailApiError>;

    /// `GET /products`
    async fn list_products(&self) -> Result<Vec<Product>, RetailApiError>;

    /// `GET /products/{sku}`
    async fn get_product(&self, sku: &Sku) -> Result<Product, RetailApiError>;

    /// `GET /inventory/{sku}`
    async fn get_inventory(&self, sku: &Sku) -> Result<InventoryRecord, RetailApiError>;

    /// `POST /payment/process`
    async fn process_payment(
        &self,
        charge: &PaymentCharge,
    ) -> Result<PaymentReceipt, RetailApiError>;

    /// `POST /payment/retry`
    async fn retry_payment(&self, charge: &PaymentCharge) -> Result<PaymentReceipt, RetailApiError>;

    /// `GET /promotions`
    async fn list_promotions(&self) -> Result<Vec<Promotion>, RetailApiError>;

    /// `POST /promotions/apply`
    async fn apply_promotion(
        &self,
        request: &PromoApplyRequest,
    ) -> Result<PromoApplyResponse, RetailApiError>;

    /// `GET /loyalty/{id}`
    async fn get_loyalty(&self, customer_id: &CustomerId) -> Result<LoyaltyInfo, RetailApiError>;

    /// `POST /loyalty/redeem`
    async fn redeem_points(
        &self,
        request: &RedeemRequest,
    ) -> Result<RedeemResponse, RetailApiError>;

    /// `POST /orders/create`
    async fn create_order(
        &self,
        request: &OrderRequest,
    ) -> Result<OrderConfirmation, RetailApiError>;

    /// `GET /orders/{id}`
    async fn get_order(&self, order_id: &str) -> Result<OrderStatus, RetailApiError>;
}
