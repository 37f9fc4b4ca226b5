//! Returns, exchanges, feedback and shipment tracking.
//!
//! Responses are scripted: no order lookup happens here. Return and exchange
//! ids come from the injected [`IdGenerator`].

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::capability::Capability;
use crate::error::Result;
use crate::ids::IdGenerator;

/// Loyalty points granted for leaving feedback.
pub const FEEDBACK_REWARD_POINTS: i64 = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SupportRequestType {
    Return,
    Exchange,
    Feedback,
    TrackShipment,
}

impl SupportRequestType {
    /// Classifies a free-text request. `return` wins over `exchange`, which
    /// wins over shipment questions; anything else is feedback.
    pub fn from_message(message: &str) -> Self {
        let lower = message.to_lowercase();
        if lower.contains("return") {
            SupportRequestType::Return
        } else if lower.contains("exchange") {
            SupportRequestType::Exchange
        } else if ["track", "shipment", "delivery status", "where is my order"]
            .iter()
            .any(|k| lower.contains(k))
        {
            SupportRequestType::TrackShipment
        } else {
            SupportRequestType::Feedback
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupportRequest {
    pub request_type: SupportRequestType,
    pub order_id: Option<String>,
    pub reason: Option<String>,
    pub item_name: Option<String>,
    pub rating: Option<u8>,
    pub comments: Option<String>,
}

impl SupportRequest {
    pub fn new(request_type: SupportRequestType, order_id: Option<String>) -> Self {
        Self {
            request_type,
            order_id,
            reason: None,
            item_name: None,
            rating: None,
            comments: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefundDetails {
    pub method: String,
    pub timeline: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PickupDetails {
    pub scheduled: bool,
    pub date: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReturnPolicy {
    pub return_window: String,
    pub conditions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReturnTicket {
    pub return_id: String,
    pub order_id: Option<String>,
    pub reason: String,
    pub status: String,
    pub message: String,
    pub refund_details: RefundDetails,
    pub pickup_details: PickupDetails,
    pub next_steps: Vec<String>,
    pub policy: ReturnPolicy,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExchangeDetails {
    pub original_item: String,
    pub price_difference: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExchangeProcess {
    pub steps: Vec<String>,
    pub timeline: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExchangeTicket {
    pub exchange_id: String,
    pub order_id: Option<String>,
    pub reason: String,
    pub status: String,
    pub message: String,
    pub exchange_details: ExchangeDetails,
    pub process: ExchangeProcess,
    pub next_steps: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackReward {
    pub points_earned: i64,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackReceipt {
    pub order_id: Option<String>,
    pub message: String,
    pub rating: u8,
    pub comments: String,
    pub reward: FeedbackReward,
    pub followup: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShipmentEvent {
    pub timestamp: String,
    pub status: String,
    pub location: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShipmentStatus {
    pub order_id: Option<String>,
    pub status: String,
    pub current_location: String,
    pub estimated_delivery: String,
    pub tracking_updates: Vec<ShipmentEvent>,
    pub delivery_contact: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "request_type", rename_all = "snake_case")]
pub enum SupportResponse {
    Return(ReturnTicket),
    Exchange(ExchangeTicket),
    Feedback(FeedbackReceipt),
    TrackShipment(ShipmentStatus),
}

impl SupportResponse {
    /// A one-line summary for the customer.
    pub fn message(&self) -> String {
        match self {
            SupportResponse::Return(ticket) => ticket.message.clone(),
            SupportResponse::Exchange(ticket) => ticket.message.clone(),
            SupportResponse::Feedback(receipt) => receipt.message.clone(),
            SupportResponse::TrackShipment(status) => format!(
                "Your order is {} ({}). Estimated delivery: {}",
                status.status, status.current_location, status.estimated_delivery
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupportOption {
    #[serde(rename = "type")]
    pub kind: SupportRequestType,
    pub name: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupportContact {
    pub phone: String,
    pub email: String,
    pub chat: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupportOptions {
    pub support_options: Vec<SupportOption>,
    pub contact: SupportContact,
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Scripted after-sales support.
#[derive(Clone)]
pub struct PostPurchaseCapability {
    ids: Arc<dyn IdGenerator>,
}

impl PostPurchaseCapability {
    pub fn new(ids: Arc<dyn IdGenerator>) -> Self {
        Self { ids }
    }

    pub fn support_options(&self) -> SupportOptions {
        let option = |kind, name: &str, description: &str| SupportOption {
            kind,
            name: name.to_string(),
            description: description.to_string(),
        };

        SupportOptions {
            support_options: vec![
                option(
                    SupportRequestType::Return,
                    "Return Product",
                    "Return unwanted products within 30 days",
                ),
                option(
                    SupportRequestType::Exchange,
                    "Exchange Product",
                    "Exchange for different size or color",
                ),
                option(
                    SupportRequestType::TrackShipment,
                    "Track Shipment",
                    "Get real-time delivery updates",
                ),
                option(
                    SupportRequestType::Feedback,
                    "Share Feedback",
                    "Tell us about your experience",
                ),
            ],
            contact: SupportContact {
                phone: "1800-123-4567".to_string(),
                email: "support@retailstore.com".to_string(),
                chat: "Available 24/7".to_string(),
            },
        }
    }

    fn process_return(&self, request: SupportRequest) -> ReturnTicket {
        ReturnTicket {
            return_id: self.ids.support_id("RET"),
            order_id: request.order_id,
            reason: request.reason.unwrap_or_else(|| "Not specified".to_string()),
            status: "initiated".to_string(),
            message: "Return request has been initiated".to_string(),
            refund_details: RefundDetails {
                method: "Original payment method".to_string(),
                timeline: "5-7 business days after pickup".to_string(),
            },
            pickup_details: PickupDetails {
                scheduled: true,
                date: "Within 2 business days".to_string(),
                message: "A pickup will be scheduled from your address".to_string(),
            },
            next_steps: strings(&[
                "Keep the product in original packaging",
                "Courier will pick up from your address",
                "Refund will be processed after quality check",
            ]),
            policy: ReturnPolicy {
                return_window: "30 days from delivery".to_string(),
                conditions: strings(&[
                    "Product must be unused",
                    "Original tags and packaging required",
                    "Quality check will be performed",
                ]),
            },
        }
    }

    fn process_exchange(&self, request: SupportRequest) -> ExchangeTicket {
        ExchangeTicket {
            exchange_id: self.ids.support_id("EXC"),
            order_id: request.order_id,
            reason: request.reason.unwrap_or_else(|| "Size/color issue".to_string()),
            status: "initiated".to_string(),
            message: "Exchange request has been initiated".to_string(),
            exchange_details: ExchangeDetails {
                original_item: request.item_name.unwrap_or_else(|| "Product".to_string()),
                price_difference: 0,
            },
            process: ExchangeProcess {
                steps: strings(&[
                    "Return pickup will be scheduled",
                    "Quality check of returned item",
                    "New item will be shipped",
                ]),
                timeline: "7-10 business days".to_string(),
            },
            next_steps: strings(&[
                "Keep the product in original packaging",
                "Pickup will be scheduled within 2 days",
                "New item ships after quality check",
            ]),
        }
    }

    fn collect_feedback(&self, request: SupportRequest) -> FeedbackReceipt {
        FeedbackReceipt {
            order_id: request.order_id,
            message: "Thank you for your feedback!".to_string(),
            rating: request.rating.unwrap_or(0),
            comments: request.comments.unwrap_or_default(),
            reward: FeedbackReward {
                points_earned: FEEDBACK_REWARD_POINTS,
                message: format!(
                    "You've earned {FEEDBACK_REWARD_POINTS} bonus loyalty points for sharing feedback!"
                ),
            },
            followup: "We value your opinion and will use it to improve our service".to_string(),
        }
    }

    fn track_shipment(&self, request: SupportRequest) -> ShipmentStatus {
        let tracking_updates = [
            ("2024-11-08 10:00", "Order Placed", "Online"),
            ("2024-11-08 14:00", "Order Confirmed", "Warehouse"),
            ("2024-11-08 18:00", "Shipped", "Mumbai Warehouse"),
            ("2024-11-09 08:00", "In Transit", "Mumbai Distribution Center"),
        ]
        .into_iter()
        .map(|(timestamp, status, location)| ShipmentEvent {
            timestamp: timestamp.to_string(),
            status: status.to_string(),
            location: location.to_string(),
        })
        .collect();

        ShipmentStatus {
            order_id: request.order_id,
            status: "In Transit".to_string(),
            current_location: "Mumbai Distribution Center".to_string(),
            estimated_delivery: "November 10, 2024".to_string(),
            tracking_updates,
            delivery_contact: "+91-9876543210".to_string(),
        }
    }
}

#[async_trait]
impl Capability for PostPurchaseCapability {
    type Request = SupportRequest;
    type Response = SupportResponse;

    fn name(&self) -> &'static str {
        "post_purchase"
    }

    #[tracing::instrument(skip(self, request), fields(kind = ?request.request_type, order_id = ?request.order_id))]
    async fn execute(&self, request: SupportRequest) -> Result<SupportResponse> {
        tracing::info!("handling support request");
        let response = match request.request_type {
            SupportRequestType::Return => SupportResponse::Return(self.process_return(request)),
            SupportRequestType::Exchange => {
                SupportResponse::Exchange(self.process_exchange(request))
            }
            SupportRequestType::Feedback => {
                SupportResponse::Feedback(self.collect_feedback(request))
            }
            SupportRequestType::TrackShipment => {
                SupportResponse::TrackShipment(self.track_shipment(request))
            }
        };
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::SequentialIdGenerator;

    fn capability() -> PostPurchaseCapability {
        PostPurchaseCapability::new(Arc::new(SequentialIdGenerator::new()))
    }

    #[test]
    fn request_type_priority() {
        assert_eq!(
            SupportRequestType::from_message("I want to return or exchange this"),
            SupportRequestType::Return
        );
        assert_eq!(
            SupportRequestType::from_message("Exchange and track please"),
            SupportRequestType::Exchange
        );
        assert_eq!(
            SupportRequestType::from_message("track my shipment"),
            SupportRequestType::TrackShipment
        );
        assert_eq!(
            SupportRequestType::from_message("where is my order"),
            SupportRequestType::TrackShipment
        );
        assert_eq!(
            SupportRequestType::from_message("The fabric was lovely"),
            SupportRequestType::Feedback
        );
    }

    #[tokio::test]
    async fn return_uses_injected_ids() {
        let capability = capability();
        let response = capability
            .execute(SupportRequest::new(
                SupportRequestType::Return,
                Some("ORD000001".to_string()),
            ))
            .await
            .unwrap();

        match response {
            SupportResponse::Return(ticket) => {
                assert_eq!(ticket.return_id, "RET100001");
                assert_eq!(ticket.order_id.as_deref(), Some("ORD000001"));
                assert_eq!(ticket.policy.return_window, "30 days from delivery");
            }
            other => panic!("expected return ticket, got {other:?}"),
        }

        let exchange = capability
            .execute(SupportRequest::new(SupportRequestType::Exchange, None))
            .await
            .unwrap();
        match exchange {
            SupportResponse::Exchange(ticket) => {
                assert_eq!(ticket.exchange_id, "EXC100002");
                assert_eq!(ticket.exchange_details.original_item, "Product");
            }
            other => panic!("expected exchange ticket, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn feedback_grants_fixed_reward() {
        let response = capability()
            .execute(SupportRequest::new(SupportRequestType::Feedback, None))
            .await
            .unwrap();

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["request_type"], "feedback");
        assert_eq!(json["reward"]["points_earned"], 50);
        assert_eq!(response.message(), "Thank you for your feedback!");
    }

    #[tokio::test]
    async fn shipment_timeline_has_four_events() {
        let response = capability()
            .execute(SupportRequest::new(SupportRequestType::TrackShipment, None))
            .await
            .unwrap();

        match &response {
            SupportResponse::TrackShipment(status) => {
                assert_eq!(status.tracking_updates.len(), 4);
                assert_eq!(status.tracking_updates[3].status, "In Transit");
            }
            other => panic!("expected shipment status, got {other:?}"),
        }
        assert!(response.message().contains("Mumbai Distribution Center"));
    }

    #[test]
    fn support_options_list_all_request_types() {
        let options = capability().support_options();
        assert_eq!(options.support_options.len(), 4);
        assert_eq!(options.contact.phone, "1800-123-4567");
    }
}
