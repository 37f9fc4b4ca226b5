//! Intent classification.

use std::sync::Arc;

use capabilities::Assistant;
use capabilities::recommendation::dictionary_keywords;
use domain::Intent;

const POST_PURCHASE_KEYWORDS: &[&str] = &[
    "return",
    "exchange",
    "track",
    "shipment",
    "delivery status",
    "where is my order",
];

const CHECKOUT_KEYWORDS: &[&str] = &["checkout", "pay", "complete order", "bill"];

const ADD_TO_CART_KEYWORDS: &[&str] = &[
    "add to cart",
    "add this",
    "buy this",
    "take it",
    "to my cart",
    "to cart",
];

const OFFER_KEYWORDS: &[&str] = &["offer", "discount", "promo", "coupon", "code"];

const DISCOVERY_KEYWORDS: &[&str] = &[
    "show",
    "looking for",
    "need",
    "want",
    "recommend",
    "suggest",
    "find",
    "search",
    "browse",
    "options",
    "collection",
    "new arrivals",
];

/// Category words that signal browsing even without a verb.
const CATEGORY_WORDS: &[&str] = &[
    "ethnic",
    "western",
    "formal",
    "casual",
    "accessor",
    "footwear",
    "outfit",
    "clothes",
    "kids",
];

fn mentions_any(text: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|k| text.contains(k))
}

/// Classifies a message by keyword membership. Categories are checked in a
/// fixed order and the first hit wins.
pub fn classify_by_rules(message: &str) -> Intent {
    let text = message.to_lowercase();

    if mentions_any(&text, POST_PURCHASE_KEYWORDS) {
        Intent::PostPurchase
    } else if mentions_any(&text, CHECKOUT_KEYWORDS) {
        Intent::Checkout
    } else if mentions_any(&text, ADD_TO_CART_KEYWORDS) {
        Intent::AddToCart
    } else if mentions_any(&text, OFFER_KEYWORDS) {
        Intent::ApplyOffer
    } else if mentions_any(&text, DISCOVERY_KEYWORDS)
        || mentions_any(&text, CATEGORY_WORDS)
        || !dictionary_keywords(&text).is_empty()
    {
        Intent::ProductDiscovery
    } else {
        Intent::General
    }
}

/// Asks the assistant first and falls back to [`classify_by_rules`].
#[derive(Clone)]
pub struct IntentClassifier {
    assistant: Arc<dyn Assistant>,
}

impl IntentClassifier {
    pub fn new(assistant: Arc<dyn Assistant>) -> Self {
        Self { assistant }
    }

    pub async fn classify(&self, message: &str) -> Intent {
        if let Some(intent) = self.assistant.classify_intent(message).await {
            tracing::debug!(%intent, "intent from assistant");
            return intent;
        }
        classify_by_rules(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use capabilities::{
        GenerativeAssistant, ScriptedTextGenerator, SequentialIdGenerator, TemplateAssistant,
    };

    #[test]
    fn post_purchase_beats_everything() {
        assert_eq!(classify_by_rules("I want to return my order"), Intent::PostPurchase);
        assert_eq!(classify_by_rules("Track my shipment please"), Intent::PostPurchase);
        assert_eq!(classify_by_rules("Where is my order?"), Intent::PostPurchase);
    }

    #[test]
    fn checkout_beats_cart_and_offers() {
        assert_eq!(classify_by_rules("Checkout now"), Intent::Checkout);
        assert_eq!(classify_by_rules("I'll pay with my promo code"), Intent::Checkout);
        assert_eq!(classify_by_rules("Generate the bill"), Intent::Checkout);
    }

    #[test]
    fn add_to_cart_phrases() {
        assert_eq!(classify_by_rules("Add this to my cart"), Intent::AddToCart);
        assert_eq!(classify_by_rules("add the red saree to cart"), Intent::AddToCart);
        assert_eq!(classify_by_rules("I'll take it"), Intent::AddToCart);
        assert_eq!(classify_by_rules("Buy this saree"), Intent::AddToCart);
    }

    #[test]
    fn offers() {
        assert_eq!(classify_by_rules("Apply code FESTIVE20"), Intent::ApplyOffer);
        assert_eq!(classify_by_rules("any discount?"), Intent::ApplyOffer);
    }

    #[test]
    fn discovery_by_verb_or_product_word() {
        assert_eq!(classify_by_rules("Show me sarees"), Intent::ProductDiscovery);
        assert_eq!(classify_by_rules("blue kurta"), Intent::ProductDiscovery);
        assert_eq!(classify_by_rules("Something formal"), Intent::ProductDiscovery);
    }

    #[test]
    fn everything_else_is_general() {
        assert_eq!(classify_by_rules("hello there"), Intent::General);
        assert_eq!(classify_by_rules("what are your store hours?"), Intent::General);
    }

    #[tokio::test]
    async fn assistant_label_wins_when_valid() {
        let generator = Arc::new(ScriptedTextGenerator::with_responses(["checkout"]));
        let assistant = GenerativeAssistant::new(
            generator,
            TemplateAssistant::new(Arc::new(SequentialIdGenerator::new())),
        );
        let classifier = IntentClassifier::new(Arc::new(assistant));

        assert_eq!(classifier.classify("show me sarees").await, Intent::Checkout);
    }

    #[tokio::test]
    async fn malformed_label_falls_back_to_rules() {
        let generator = Arc::new(ScriptedTextGenerator::with_responses([
            "The customer wants to check out",
        ]));
        let assistant = GenerativeAssistant::new(
            generator,
            TemplateAssistant::new(Arc::new(SequentialIdGenerator::new())),
        );
        let classifier = IntentClassifier::new(Arc::new(assistant));

        assert_eq!(
            classifier.classify("show me sarees").await,
            Intent::ProductDiscovery
        );
    }

    #[tokio::test]
    async fn template_assistant_defers_to_rules() {
        let assistant = TemplateAssistant::new(Arc::new(SequentialIdGenerator::new()));
        let classifier = IntentClassifier::new(Arc::new(assistant));

        assert_eq!(classifier.classify("checkout").await, Intent::Checkout);
    }
}
