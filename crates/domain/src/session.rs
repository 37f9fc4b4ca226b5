//! The per-conversation session record.

use std::collections::BTreeMap;

use common::SessionId;
use serde::{Deserialize, Serialize};

use crate::{CartItem, CartSummary, CustomerId, Money, Product};

/// Informal progress tag. Any intent may run at any stage.
///
/// ```text
/// Greeting ──► Browsing ──► Cart ──► Completed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    #[default]
    Greeting,
    Browsing,
    Cart,
    Completed,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Greeting => "greeting",
            Stage::Browsing => "browsing",
            Stage::Cart => "cart",
            Stage::Completed => "completed",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Discounts attached to the cart ahead of checkout.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CartContext {
    #[serde(default)]
    pub promo_code: Option<String>,
    #[serde(default)]
    pub promo_discount: Money,
    #[serde(default)]
    pub redeemed_points: i64,
    #[serde(default)]
    pub redeemed_discount: Money,
}

impl CartContext {
    pub fn is_empty(&self) -> bool {
        self == &CartContext::default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Agent,
}

/// One message in the conversation transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: Role,
    pub message: String,
}

/// Durable state of one shopping conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub session_id: SessionId,
    pub customer_id: CustomerId,
    pub channel: String,
    #[serde(default)]
    pub stage: Stage,
    #[serde(default)]
    pub cart: Vec<CartItem>,
    /// Last recommendation set shown to the customer.
    #[serde(default)]
    pub recommendations: Vec<Product>,
    /// Free-form context supplied by channels (location, device, ...).
    #[serde(default)]
    pub context: BTreeMap<String, serde_json::Value>,
    #[serde(default)]
    pub cart_context: CartContext,
    #[serde(default)]
    pub conversation_history: Vec<ConversationTurn>,
    /// Most recent order placed in this session.
    #[serde(default)]
    pub last_order_id: Option<String>,
}

impl Session {
    /// Starts a fresh session at the greeting stage.
    pub fn new(session_id: SessionId, customer_id: CustomerId, channel: impl Into<String>) -> Self {
        Self {
            session_id,
            customer_id,
            channel: channel.into(),
            stage: Stage::Greeting,
            cart: Vec::new(),
            recommendations: Vec::new(),
            context: BTreeMap::new(),
            cart_context: CartContext::default(),
            conversation_history: Vec::new(),
            last_order_id: None,
        }
    }

    /// Sum of price * quantity over the current cart.
    pub fn cart_total(&self) -> Money {
        self.cart.iter().map(CartItem::line_total).sum()
    }

    pub fn cart_summary(&self) -> CartSummary {
        CartSummary::compute(&self.cart, &self.cart_context)
    }

    pub fn add_to_cart(&mut self, item: CartItem) {
        self.cart.push(item);
    }

    /// Categories of the items in the cart, one per line.
    pub fn cart_categories(&self) -> Vec<String> {
        self.cart
            .iter()
            .map(|item| item.product.category.clone())
            .collect()
    }

    /// Clears the cart and the discounts attached to it.
    pub fn clear_cart(&mut self) {
        self.cart.clear();
        self.cart_context = CartContext::default();
    }

    pub fn record_user_turn(&mut self, message: impl Into<String>) {
        self.conversation_history.push(ConversationTurn {
            role: Role::User,
            message: message.into(),
        });
    }

    pub fn record_agent_turn(&mut self, message: impl Into<String>) {
        self.conversation_history.push(ConversationTurn {
            role: Role::Agent,
            message: message.into(),
        });
    }

    /// The last `count` user messages before the most recent one, oldest first.
    pub fn previous_user_messages(&self, count: usize) -> Vec<&str> {
        let mut user_messages: Vec<&str> = self
            .conversation_history
            .iter()
            .filter(|turn| turn.role == Role::User)
            .map(|turn| turn.message.as_str())
            .collect();
        // Drop the message currently being handled
        user_messages.pop();
        let skip = user_messages.len().saturating_sub(count);
        user_messages.into_iter().skip(skip).collect()
    }

    /// Moves the conversation to another channel, merging any supplied context.
    pub fn switch_channel(
        &mut self,
        channel: impl Into<String>,
        context: BTreeMap<String, serde_json::Value>,
    ) {
        self.channel = channel.into();
        self.context.extend(context);
    }

    /// Reads a string value from the channel context.
    pub fn context_str(&self, key: &str) -> Option<&str> {
        self.context.get(key).and_then(|v| v.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::product::fixtures::product;

    fn session() -> Session {
        Session::new(SessionId::new(), CustomerId::new("CUST001"), "web")
    }

    #[test]
    fn test_new_session_starts_at_greeting() {
        let session = session();
        assert_eq!(session.stage, Stage::Greeting);
        assert!(session.cart.is_empty());
        assert!(session.cart_context.is_empty());
        assert_eq!(session.cart_total(), Money::zero());
    }

    #[test]
    fn test_cart_total_tracks_cart_contents() {
        let mut session = session();
        session.add_to_cart(CartItem::new(product("A", "Saree", "Women's Ethnic", 2000), 1).unwrap());
        session.add_to_cart(CartItem::new(product("B", "Belt", "Accessories", 300), 2).unwrap());

        assert_eq!(session.cart_total(), Money::from_rupees(2600));
        assert_eq!(session.cart_summary().subtotal, session.cart_total());

        session.cart.pop();
        assert_eq!(session.cart_total(), Money::from_rupees(2000));
    }

    #[test]
    fn test_clear_cart_resets_discounts() {
        let mut session = session();
        session.add_to_cart(CartItem::new(product("A", "Saree", "Women's Ethnic", 2000), 1).unwrap());
        session.cart_context.redeemed_points = 100;
        session.cart_context.redeemed_discount = Money::from_rupees(100);

        session.clear_cart();

        assert!(session.cart.is_empty());
        assert!(session.cart_context.is_empty());
    }

    #[test]
    fn test_previous_user_messages_skips_current_and_agent_turns() {
        let mut session = session();
        for (i, text) in ["one", "two", "three", "four", "now"].iter().enumerate() {
            session.record_user_turn(*text);
            if i < 4 {
                session.record_agent_turn("ok");
            }
        }

        assert_eq!(session.previous_user_messages(3), vec!["two", "three", "four"]);
    }

    #[test]
    fn test_switch_channel_merges_context() {
        let mut session = session();
        session
            .context
            .insert("location".to_string(), serde_json::json!("Mumbai"));

        let mut update = BTreeMap::new();
        update.insert("device".to_string(), serde_json::json!("ios"));
        session.switch_channel("mobile", update);

        assert_eq!(session.channel, "mobile");
        assert_eq!(session.context_str("location"), Some("Mumbai"));
        assert_eq!(session.context_str("device"), Some("ios"));
    }

    #[test]
    fn test_session_survives_serialization() {
        let mut session = session();
        session.add_to_cart(CartItem::new(product("A", "Saree", "Women's Ethnic", 2000), 1).unwrap());
        session.stage = Stage::Cart;
        session.record_user_turn("add the saree");

        let json = serde_json::to_value(&session).unwrap();
        assert_eq!(json["stage"], "cart");
        let restored: Session = serde_json::from_value(json).unwrap();
        assert_eq!(restored, session);
    }
}
