//! Order creation, tracking and store notification.

use std::sync::Arc;

use async_trait::async_trait;
use domain::{CartItem, CustomerId};
use serde::{Deserialize, Serialize};

use crate::capability::Capability;
use crate::error::{CapabilityError, RetailApiError, Result};
use crate::retail::{OrderRequest, RetailApi};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FulfillmentType {
    #[default]
    ShipToHome,
    PickUp,
    Reserve,
}

impl FulfillmentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FulfillmentType::ShipToHome => "ship_to_home",
            FulfillmentType::PickUp => "pick_up",
            FulfillmentType::Reserve => "reserve",
        }
    }

    /// Whether a store has to be named and told about the order.
    pub fn needs_store(&self) -> bool {
        !matches!(self, FulfillmentType::ShipToHome)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FulfillmentRequest {
    pub customer_id: CustomerId,
    pub items: Vec<CartItem>,
    pub fulfillment_type: FulfillmentType,
    pub delivery_address: Option<String>,
    pub store_location: Option<String>,
}

/// Customer-facing guidance for how the order reaches them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FulfillmentDetails {
    ShipToHome {
        order_id: String,
        message: String,
        delivery_address: Option<String>,
        estimated_delivery: String,
        tracking_available: bool,
        next_steps: Vec<String>,
    },
    PickUp {
        order_id: String,
        message: String,
        store_location: String,
        pickup_time: String,
        instructions: String,
        next_steps: Vec<String>,
    },
    Reserve {
        order_id: String,
        message: String,
        store_location: String,
        reservation_valid: String,
        instructions: String,
        next_steps: Vec<String>,
    },
}

impl FulfillmentDetails {
    fn build(
        kind: FulfillmentType,
        order_id: &str,
        store_location: Option<&str>,
        delivery_address: Option<&str>,
    ) -> Self {
        let order_id = order_id.to_string();
        let store = store_location.unwrap_or_default().to_string();
        let steps = |s: [&str; 3]| -> Vec<String> { s.iter().map(|s| s.to_string()).collect() };

        match kind {
            FulfillmentType::ShipToHome => FulfillmentDetails::ShipToHome {
                order_id,
                message: "Your order will be shipped to your address".to_string(),
                delivery_address: delivery_address.map(str::to_string),
                estimated_delivery: "3-5 business days".to_string(),
                tracking_available: true,
                next_steps: steps([
                    "You will receive a confirmation email",
                    "Track your order using the tracking number",
                    "Package will be delivered to your doorstep",
                ]),
            },
            FulfillmentType::PickUp => FulfillmentDetails::PickUp {
                order_id,
                message: format!("Your order is ready for pickup at {store}"),
                store_location: store,
                pickup_time: "Available today after 2 PM".to_string(),
                instructions: "Please bring your order confirmation and ID".to_string(),
                next_steps: steps([
                    "You will receive a pickup ready notification",
                    "Visit the store during business hours",
                    "Show your order confirmation at the counter",
                ]),
            },
            FulfillmentType::Reserve => FulfillmentDetails::Reserve {
                order_id,
                message: format!("Items reserved for you at {store}"),
                store_location: store,
                reservation_valid: "24 hours".to_string(),
                instructions: "Visit the store to try on and complete purchase".to_string(),
                next_steps: steps([
                    "Items will be held for 24 hours",
                    "Visit store to try on products",
                    "Complete purchase at store or decline reservation",
                ]),
            },
        }
    }

    pub fn message(&self) -> &str {
        match self {
            FulfillmentDetails::ShipToHome { message, .. }
            | FulfillmentDetails::PickUp { message, .. }
            | FulfillmentDetails::Reserve { message, .. } => message,
        }
    }

    pub fn next_steps(&self) -> &[String] {
        match self {
            FulfillmentDetails::ShipToHome { next_steps, .. }
            | FulfillmentDetails::PickUp { next_steps, .. }
            | FulfillmentDetails::Reserve { next_steps, .. } => next_steps,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderPlacement {
    pub order_id: String,
    pub tracking_number: String,
    pub fulfillment_details: FulfillmentDetails,
    pub estimated_delivery: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackingUpdate {
    pub timestamp: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderTracking {
    pub order_id: String,
    pub status: String,
    pub estimated_delivery: String,
    pub updates: Vec<TrackingUpdate>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreNotification {
    pub store_location: String,
    pub order_id: String,
    pub items: usize,
    pub message: String,
    pub notification_sent: bool,
}

/// Places orders with the data service.
#[derive(Clone)]
pub struct FulfillmentCapability {
    api: Arc<dyn RetailApi>,
}

impl FulfillmentCapability {
    pub fn new(api: Arc<dyn RetailApi>) -> Self {
        Self { api }
    }

    #[tracing::instrument(skip(self))]
    pub async fn track_order(&self, order_id: &str) -> Result<OrderTracking> {
        let status = match self.api.get_order(order_id).await {
            Ok(status) => status,
            Err(RetailApiError::NotFound(_)) => {
                return Err(CapabilityError::NotFound("Order not found".to_string()));
            }
            Err(e) => return Err(CapabilityError::Unavailable(format!("Tracking failed: {e}"))),
        };

        let updates = [
            ("2024-11-08 10:00", "Order placed"),
            ("2024-11-08 14:00", "Order confirmed"),
            ("2024-11-08 18:00", "Shipped"),
        ]
        .into_iter()
        .map(|(timestamp, message)| TrackingUpdate {
            timestamp: timestamp.to_string(),
            message: message.to_string(),
        })
        .collect();

        Ok(OrderTracking {
            order_id: order_id.to_string(),
            status: status.status,
            estimated_delivery: status.estimated_delivery,
            updates,
        })
    }

    /// Tells store staff to prepare a pickup or reservation.
    pub fn notify_store(
        &self,
        store_location: &str,
        order_id: &str,
        items: &[CartItem],
    ) -> StoreNotification {
        tracing::info!(store = store_location, order_id, "notifying store");
        StoreNotification {
            store_location: store_location.to_string(),
            order_id: order_id.to_string(),
            items: items.len(),
            message: format!("Store staff at {store_location} have been notified"),
            notification_sent: true,
        }
    }
}

#[async_trait]
impl Capability for FulfillmentCapability {
    type Request = FulfillmentRequest;
    type Response = OrderPlacement;

    fn name(&self) -> &'static str {
        "fulfillment"
    }

    #[tracing::instrument(skip(self, request), fields(customer_id = %request.customer_id, kind = request.fulfillment_type.as_str()))]
    async fn execute(&self, request: FulfillmentRequest) -> Result<OrderPlacement> {
        if request.items.is_empty() {
            return Err(CapabilityError::Validation(
                "Cannot create an order without items".to_string(),
            ));
        }
        if request.fulfillment_type.needs_store() && request.store_location.is_none() {
            return Err(CapabilityError::Validation(format!(
                "A store location is required for {}",
                request.fulfillment_type.as_str()
            )));
        }

        let order = OrderRequest {
            customer_id: request.customer_id.clone(),
            items: request.items,
            fulfillment_type: request.fulfillment_type.as_str().to_string(),
            delivery_address: request.delivery_address.clone(),
            store_location: request.store_location.clone(),
        };

        let confirmation = self.api.create_order(&order).await.map_err(|e| match e {
            RetailApiError::Unavailable(msg) | RetailApiError::Decode(msg) => {
                CapabilityError::Unavailable(format!("Order creation failed: {msg}"))
            }
            other => other.into(),
        })?;

        tracing::info!(order_id = %confirmation.order_id, "order created");

        let fulfillment_details = FulfillmentDetails::build(
            request.fulfillment_type,
            &confirmation.order_id,
            request.store_location.as_deref(),
            request.delivery_address.as_deref(),
        );

        Ok(OrderPlacement {
            order_id: confirmation.order_id,
            tracking_number: confirmation.tracking_number,
            fulfillment_details,
            estimated_delivery: confirmation.estimated_delivery,
        })
    }
}
