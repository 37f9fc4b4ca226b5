//! Stock availability across stores and warehouses.

use std::sync::Arc;

use async_trait::async_trait;
use domain::Sku;
use serde::{Deserialize, Serialize};

use crate::capability::Capability;
use crate::error::{CapabilityError, Result};
use crate::retail::{InventoryRecord, RetailApi};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryRequest {
    pub sku: Sku,
    pub quantity: u32,
    /// Store the customer wants to pick up from.
    pub preferred_location: Option<String>,
    /// Where the customer is. Used as the preferred store when none is given.
    pub customer_location: Option<String>,
}

impl InventoryRequest {
    pub fn new(sku: Sku, quantity: u32) -> Self {
        Self {
            sku,
            quantity,
            preferred_location: None,
            customer_location: None,
        }
    }

    pub fn with_customer_location(mut self, location: Option<String>) -> Self {
        self.customer_location = location;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AvailabilityStatus {
    Available,
    OutOfStock,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptionKind {
    InStore,
    Online,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FulfillmentMode {
    PickUpToday,
    ReserveAndCollect,
    ShipToHome,
}

/// One way the customer can get the product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilityOption {
    #[serde(rename = "type")]
    pub kind: OptionKind,
    pub location: String,
    pub quantity: u32,
    pub fulfillment: FulfillmentMode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delivery_time: Option<String>,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Availability {
    pub status: AvailabilityStatus,
    pub options: Vec<AvailabilityOption>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

impl Availability {
    pub fn is_available(&self) -> bool {
        self.status == AvailabilityStatus::Available
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryReport {
    pub sku: Sku,
    pub product_name: String,
    pub availability: Availability,
}

/// Works out where `quantity` units can come from.
///
/// In-store options come first: the preferred store (pick up today), then
/// every other store with enough stock (reserve and collect). A single
/// ship-to-home option follows when total warehouse stock is sufficient.
pub fn assess_availability(
    record: &InventoryRecord,
    quantity: u32,
    preferred_location: Option<&str>,
) -> Availability {
    let mut options = Vec::new();

    if let Some(preferred) = preferred_location
        && let Some(&stock) = record.store_stock.get(preferred)
        && stock >= quantity
    {
        options.push(AvailabilityOption {
            kind: OptionKind::InStore,
            location: preferred.to_string(),
            quantity: stock,
            fulfillment: FulfillmentMode::PickUpToday,
            delivery_time: None,
            message: format!("Available at {preferred}. Pick up today!"),
        });
    }

    for (store, &stock) in &record.store_stock {
        if stock >= quantity && Some(store.as_str()) != preferred_location {
            options.push(AvailabilityOption {
                kind: OptionKind::InStore,
                location: store.clone(),
                quantity: stock,
                fulfillment: FulfillmentMode::ReserveAndCollect,
                delivery_time: None,
                message: format!("Reserve at {store} for try-on"),
            });
        }
    }

    let warehouse_total: u32 = record.warehouse_stock.values().sum();
    if warehouse_total >= quantity {
        options.push(AvailabilityOption {
            kind: OptionKind::Online,
            location: "warehouse".to_string(),
            quantity: warehouse_total,
            fulfillment: FulfillmentMode::ShipToHome,
            delivery_time: Some("3-5 business days".to_string()),
            message: "Ship to home - Delivery in 3-5 business days".to_string(),
        });
    }

    // Stable: keeps store order within each group
    options.sort_by_key(|opt| match opt.kind {
        OptionKind::InStore => 0,
        OptionKind::Online => 1,
    });

    if options.is_empty() {
        Availability {
            status: AvailabilityStatus::OutOfStock,
            options,
            message: Some("Currently out of stock".to_string()),
            suggestion: Some(
                "Would you like me to notify you when it's back in stock, or show you similar products?"
                    .to_string(),
            ),
        }
    } else {
        Availability {
            status: AvailabilityStatus::Available,
            options,
            message: None,
            suggestion: None,
        }
    }
}

/// Checks stock for a SKU against the data service.
#[derive(Clone)]
pub struct InventoryCapability {
    api: Arc<dyn RetailApi>,
}

impl InventoryCapability {
    pub fn new(api: Arc<dyn RetailApi>) -> Self {
        Self { api }
    }

    /// Convenience wrapper around [`Capability::execute`].
    pub async fn check(&self, request: InventoryRequest) -> Result<InventoryReport> {
        self.execute(request).await
    }
}

#[async_trait]
impl Capability for InventoryCapability {
    type Request = InventoryRequest;
    type Response = InventoryReport;

    fn name(&self) -> &'static str {
        "inventory"
    }

    #[tracing::instrument(skip(self), fields(sku = %request.sku, quantity = request.quantity))]
    async fn execute(&self, request: InventoryRequest) -> Result<InventoryReport> {
        if request.quantity == 0 {
            return Err(CapabilityError::Validation(
                "quantity must be greater than 0".to_string(),
            ));
        }

        let record = self.api.get_inventory(&request.sku).await?;
        let preferred = request
            .preferred_location
            .as_deref()
            .or(request.customer_location.as_deref());
        let availability = assess_availability(&record, request.quantity, preferred);

        tracing::info!(status = ?availability.status, options = availability.options.len(), "inventory checked");

        Ok(InventoryReport {
            sku: request.sku,
            product_name: record.name,
            availability,
        })
    }
}
