//! Worker capabilities for the shopping conversation.
//!
//! Each capability owns one concern and is called by the orchestrator
//! through the [`Capability`] contract:
//! 1. Recommendation: scores the catalog for a customer
//! 2. Inventory: works out where stock can come from
//! 3. Loyalty: promo codes, automatic promotions, points
//! 4. Payment: charges and retries
//! 5. Fulfillment: places and tracks orders
//! 6. Post-purchase: scripted support responses
//!
//! All of them talk to the retail data service through [`RetailApi`], and the
//! recommender writes copy through an [`Assistant`].

pub mod assistant;
pub mod capability;
pub mod error;
pub mod fulfillment;
pub mod ids;
pub mod inventory;
pub mod loyalty;
pub mod payment;
pub mod post_purchase;
pub mod recommendation;
pub mod retail;

use std::sync::Arc;

pub use assistant::{
    Assistant, DiscoveryReply, GeminiTextGenerator, GenerationError, GenerativeAssistant,
    ScriptedTextGenerator, TemplateAssistant, TextGenerator,
};
pub use capability::Capability;
pub use error::{CapabilityError, RetailApiError, Result};
pub use fulfillment::{
    FulfillmentCapability, FulfillmentDetails, FulfillmentRequest, FulfillmentType,
    OrderPlacement, OrderTracking, StoreNotification,
};
pub use ids::{IdGenerator, RandomIdGenerator, SequentialIdGenerator};
pub use inventory::{
    Availability, AvailabilityOption, AvailabilityStatus, InventoryCapability, InventoryReport,
    InventoryRequest,
};
pub use loyalty::{Discount, DiscountKind, LoyaltyCapability, LoyaltyOutcome, LoyaltyRequest, Redemption};
pub use payment::{
    PaymentCapability, PaymentFailure, PaymentMethod, PaymentOutcome, PaymentRequest,
};
pub use post_purchase::{
    PostPurchaseCapability, SupportOptions, SupportRequest, SupportRequestType, SupportResponse,
};
pub use recommendation::{RecommendationCapability, RecommendationRequest, RecommendationSet};
pub use retail::{HttpRetailApi, InMemoryRetailApi, RetailApi};

/// Every capability, wired to one data service and assistant.
#[derive(Clone)]
pub struct Capabilities {
    pub recommendation: RecommendationCapability,
    pub inventory: InventoryCapability,
    pub loyalty: LoyaltyCapability,
    pub payment: PaymentCapability,
    pub fulfillment: FulfillmentCapability,
    pub post_purchase: PostPurchaseCapability,
    pub assistant: Arc<dyn Assistant>,
    pub api: Arc<dyn RetailApi>,
}

impl Capabilities {
    pub fn new(
        api: Arc<dyn RetailApi>,
        assistant: Arc<dyn Assistant>,
        ids: Arc<dyn IdGenerator>,
    ) -> Self {
        Self {
            recommendation: RecommendationCapability::new(api.clone(), assistant.clone()),
            inventory: InventoryCapability::new(api.clone()),
            loyalty: LoyaltyCapability::new(api.clone()),
            payment: PaymentCapability::new(api.clone()),
            fulfillment: FulfillmentCapability::new(api.clone()),
            post_purchase: PostPurchaseCapability::new(ids),
            assistant,
            api,
        }
    }
}
