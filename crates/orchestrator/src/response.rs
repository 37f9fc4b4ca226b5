//! What the orchestrator hands back to channels.

use capabilities::payment::PaymentApproval;
use capabilities::{
    FulfillmentType, InventoryReport, OrderPlacement, PaymentFailure, PaymentMethod,
    StoreNotification, SupportResponse,
};
use domain::{CartItem, CartSummary, Intent, Money, Product, Session};
use serde::{Deserialize, Serialize};

/// Structured payload attached to an [`AgentResponse`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResponseDetail {
    /// Plain text reply.
    Message,
    Recommendations {
        recommendations: Vec<Product>,
        complementary_items: Vec<Product>,
    },
    CartUpdated {
        product: Product,
        cart: Vec<CartItem>,
        cart_total: Money,
        #[serde(skip_serializing_if = "Option::is_none")]
        inventory: Option<InventoryReport>,
    },
    OrderPlaced {
        order: OrderPlacement,
        /// `None` when nothing was left to charge.
        #[serde(skip_serializing_if = "Option::is_none")]
        payment: Option<PaymentApproval>,
        subtotal: Money,
        savings: Money,
        amount_paid: Money,
        #[serde(skip_serializing_if = "Option::is_none")]
        points_earned: Option<i64>,
        #[serde(skip_serializing_if = "Option::is_none")]
        store_notification: Option<StoreNotification>,
    },
    PaymentFailed {
        payment_error: PaymentFailure,
    },
    /// Payment was captured but no order exists. Needs manual follow-up.
    ReconciliationNeeded {
        transaction_id: String,
        amount: Money,
        error: String,
    },
    PromoApplied {
        promo: PromoApplication,
    },
    Support {
        support: SupportResponse,
    },
    ChannelSwitched {
        channel: String,
        cart_items: usize,
    },
}

/// One reply of the sales assistant.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgentResponse {
    pub success: bool,
    pub intent: Intent,
    pub message: String,
    #[serde(flatten)]
    pub detail: ResponseDetail,
}

impl AgentResponse {
    pub fn success(intent: Intent, message: impl Into<String>, detail: ResponseDetail) -> Self {
        Self {
            success: true,
            intent,
            message: message.into(),
            detail,
        }
    }

    pub fn failure(intent: Intent, message: impl Into<String>) -> Self {
        Self {
            success: false,
            intent,
            message: message.into(),
            detail: ResponseDetail::Message,
        }
    }

    pub fn with_detail(mut self, detail: ResponseDetail) -> Self {
        self.detail = detail;
        self
    }

    /// True when money was taken but the order could not be confirmed.
    pub fn requires_reconciliation(&self) -> bool {
        matches!(self.detail, ResponseDetail::ReconciliationNeeded { .. })
    }
}

/// How the customer wants to pay and receive the order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutOptions {
    #[serde(default)]
    pub payment_method: PaymentMethod,
    #[serde(default)]
    pub fulfillment_type: FulfillmentType,
    #[serde(default)]
    pub store_location: Option<String>,
    #[serde(default)]
    pub delivery_address: Option<String>,
}

/// Result of validating a promo code against the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromoApplication {
    pub success: bool,
    pub promo_code: String,
    pub cart_total: Money,
    pub discount: Money,
    /// Cart total after this code. Equal to `cart_total` when the code
    /// was rejected.
    pub final_total: Money,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Items and priced totals of a session's cart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CartView {
    pub items: Vec<CartItem>,
    #[serde(flatten)]
    pub summary: CartSummary,
}

impl CartView {
    pub fn of(session: &Session) -> Self {
        Self {
            items: session.cart.clone(),
            summary: session.cart_summary(),
        }
    }
}
