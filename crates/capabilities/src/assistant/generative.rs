use std::sync::Arc;

use async_trait::async_trait;
use domain::{CustomerProfile, Intent, Product};

use super::generator::TextGenerator;
use super::templates::TemplateAssistant;
use super::{Assistant, DiscoveryReply};

/// Asks a [`TextGenerator`] first and falls back to [`TemplateAssistant`]
/// whenever it fails or answers with something unusable.
#[derive(Clone)]
pub struct GenerativeAssistant {
    generator: Arc<dyn TextGenerator>,
    fallback: TemplateAssistant,
}

impl GenerativeAssistant {
    pub fn new(generator: Arc<dyn TextGenerator>, fallback: TemplateAssistant) -> Self {
        Self {
            generator,
            fallback,
        }
    }

    async fn generate(&self, operation: &'static str, prompt: &str) -> Option<String> {
        match self.generator.generate(prompt).await {
            Ok(text) if !text.trim().is_empty() => Some(text.trim().to_string()),
            Ok(_) => {
                tracing::warn!(operation, "text generator returned empty text, using fallback");
                metrics::counter!("assistant_fallback_total", "operation" => operation)
                    .increment(1);
                None
            }
            Err(e) => {
                tracing::warn!(operation, error = %e, "text generator failed, using fallback");
                metrics::counter!("assistant_fallback_total", "operation" => operation)
                    .increment(1);
                None
            }
        }
    }
}

fn intent_prompt(message: &str) -> String {
    let labels: Vec<&str> = Intent::ALL.iter().map(Intent::as_str).collect();
    format!(
        "You are the intent classifier of a fashion retail sales assistant.\n\
         Classify the customer's message into exactly one of these intents: {}.\n\n\
         - product_discovery: looking for, browsing or asking for recommendations\n\
         - add_to_cart: wants to add or buy a specific item\n\
         - checkout: wants to pay or complete the order\n\
         - apply_offer: mentions an offer, discount, promo or coupon code\n\
         - post_purchase: returns, exchanges, tracking or delivery status\n\
         - general: anything else\n\n\
         Customer message: \"{message}\"\n\n\
         Reply with the intent label only.",
        labels.join(", ")
    )
}

fn keyword_prompt(context: &str) -> String {
    format!(
        "Extract the product types the customer is asking for (for example: saree, kurta, \
         watch, shoe, bag).\n\n\
         Customer said: \"{context}\"\n\n\
         Reply with a short comma-separated list of lowercase keywords, or \"none\" if no \
         product type is mentioned."
    )
}

fn parse_keywords(text: &str) -> Vec<String> {
    let text = text.trim().trim_matches('"');
    if text.eq_ignore_ascii_case("none") {
        return Vec::new();
    }
    text.split(',')
        .map(|k| k.trim().trim_matches('.').to_lowercase())
        .filter(|k| !k.is_empty() && k != "none")
        .collect()
}

fn greeting_prompt(customer: &CustomerProfile, channel: &str) -> String {
    let recent: Vec<&str> = customer.purchased_categories().take(2).collect();
    let tier = if customer.loyalty_tier.is_empty() {
        "Bronze"
    } else {
        customer.loyalty_tier.as_str()
    };
    format!(
        "You are a friendly AI sales assistant. Create a warm, personalized greeting (1-2 sentences) for:\n\n\
         Customer: {}\n\
         Loyalty Tier: {}\n\
         Points: {}\n\
         Channel: {}\n\
         Recent Purchases: {}\n\n\
         Be friendly, acknowledge their loyalty tier, and make them feel valued. \
         Keep it conversational and not too salesy.",
        customer.name,
        tier,
        customer.loyalty_points,
        channel,
        recent.join(", ")
    )
}

fn recommendation_prompt(customer: &CustomerProfile, products: &[Product]) -> String {
    let names: Vec<&str> = products.iter().take(3).map(|p| p.name.as_str()).collect();
    format!(
        "You are a helpful sales assistant. Create a friendly, natural message (2-3 sentences) \
         recommending products:\n\n\
         Customer preferences: {:?}, Budget: {}\n\
         Recommended products: {}\n\n\
         Make it sound like a friend giving advice, not a salesperson. Be enthusiastic but genuine.",
        customer.preferences.favorite_colors,
        customer
            .preferences
            .budget_range
            .as_deref()
            .unwrap_or("flexible"),
        names.join(", ")
    )
}

fn discovery_prompt(reply: &DiscoveryReply<'_>) -> String {
    let summaries: Vec<String> = reply
        .products
        .iter()
        .take(3)
        .map(|p| format!("- {}", p.summary()))
        .collect();
    format!(
        "You are a helpful fashion retail sales assistant. The customer said: \"{}\"\n\n\
         Products we found for them:\n{}\n\n\
         Write a short, friendly reply (3-5 sentences) presenting these products with their \
         prices and why they fit the request.",
        reply.user_message,
        summaries.join("\n")
    )
}

fn query_prompt(query: &str) -> String {
    format!(
        "You are a helpful retail sales assistant. The customer asked: \"{query}\"\n\n\
         Context:\n\
         - Store: Fashion retail (ethnic, western, formal wear, accessories)\n\
         - Services: Product recommendations, inventory checks, order tracking, returns/exchanges\n\
         - Available: Multi-channel shopping (web, mobile, in-store)\n\n\
         Provide a helpful, friendly response (2-3 sentences). If it's a product question, \
         suggest they can get recommendations. If it's about orders, mention tracking. \
         Keep it concise and actionable."
    )
}

#[async_trait]
impl Assistant for GenerativeAssistant {
    async fn classify_intent(&self, message: &str) -> Option<Intent> {
        let label = self.generate("classify_intent", &intent_prompt(message)).await?;
        match label.parse::<Intent>() {
            Ok(intent) => Some(intent),
            Err(_) => {
                tracing::warn!(%label, "unrecognised intent label, using rules");
                metrics::counter!("assistant_fallback_total", "operation" => "classify_intent")
                    .increment(1);
                None
            }
        }
    }

    async fn extract_keywords(&self, context: &str) -> Option<Vec<String>> {
        self.generate("extract_keywords", &keyword_prompt(context))
            .await
            .map(|text| parse_keywords(&text))
    }

    async fn greeting(&self, customer: Option<&CustomerProfile>, channel: &str) -> String {
        let Some(profile) = customer else {
            return TemplateAssistant::greeting_text(None);
        };
        match self
            .generate("greeting", &greeting_prompt(profile, channel))
            .await
        {
            Some(text) => text,
            None => TemplateAssistant::greeting_text(customer),
        }
    }

    async fn recommendation_message(
        &self,
        customer: &CustomerProfile,
        products: &[Product],
    ) -> String {
        if products.is_empty() {
            return self.fallback.recommendation_text(customer, products);
        }
        match self
            .generate(
                "recommendation_message",
                &recommendation_prompt(customer, products),
            )
            .await
        {
            Some(text) => text,
            None => self.fallback.recommendation_text(customer, products),
        }
    }

    async fn discovery_reply(&self, reply: DiscoveryReply<'_>) -> String {
        match self
            .generate("discovery_reply", &discovery_prompt(&reply))
            .await
        {
            Some(text) => text,
            None => TemplateAssistant::discovery_text(&reply),
        }
    }

    async fn answer_query(&self, query: &str) -> String {
        match self.generate("answer_query", &query_prompt(query)).await {
            Some(text) => text,
            None => self.fallback.answer_query(query).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assistant::{HELP_MENU, ScriptedTextGenerator};
    use crate::ids::SequentialIdGenerator;
    use domain::CustomerId;

    fn assistant(generator: &ScriptedTextGenerator) -> GenerativeAssistant {
        GenerativeAssistant::new(
            Arc::new(generator.clone()),
            TemplateAssistant::new(Arc::new(SequentialIdGenerator::new())),
        )
    }

    #[tokio::test]
    async fn intent_label_must_parse_exactly() {
        let generator = ScriptedTextGenerator::with_responses([
            " Checkout \n",
            "I think checkout",
            "product_discovery",
        ]);
        let assistant = assistant(&generator);

        assert_eq!(assistant.classify_intent("pay now").await, Some(Intent::Checkout));
        assert_eq!(assistant.classify_intent("pay now").await, None);
        assert_eq!(
            assistant.classify_intent("show me shoes").await,
            Some(Intent::ProductDiscovery)
        );
        assert!(generator.prompts()[0].contains("post_purchase"));
    }

    #[tokio::test]
    async fn failures_fall_back_to_templates() {
        let generator = ScriptedTextGenerator::new();
        generator.set_fail(true);
        let assistant = assistant(&generator);

        assert_eq!(assistant.classify_intent("hello").await, None);
        assert_eq!(assistant.extract_keywords("a watch").await, None);
        assert_eq!(assistant.answer_query("hours?").await, HELP_MENU);

        let mut profile = CustomerProfile::anonymous(CustomerId::new("CUST002"));
        profile.name = "Rahul Verma".to_string();
        profile.loyalty_tier = "Silver".to_string();
        profile.loyalty_points = 800;
        assert_eq!(
            assistant.greeting(Some(&profile), "mobile").await,
            "Welcome back, Rahul! As our Silver member, you have 800 points. How can I help you today?"
        );
    }

    #[tokio::test]
    async fn keywords_are_split_and_none_means_empty() {
        let generator = ScriptedTextGenerator::with_responses(["Watch, Leather Bag.", "none"]);
        let assistant = assistant(&generator);

        assert_eq!(
            assistant.extract_keywords("a watch and a bag").await,
            Some(vec!["watch".to_string(), "leather bag".to_string()])
        );
        assert_eq!(assistant.extract_keywords("hello").await, Some(vec![]));
    }

    #[tokio::test]
    async fn unknown_customer_greeting_skips_generator() {
        let generator = ScriptedTextGenerator::with_responses(["unused"]);
        let assistant = assistant(&generator);

        assert_eq!(
            assistant.greeting(None, "web").await,
            crate::assistant::GENERIC_GREETING
        );
        assert!(generator.prompts().is_empty());
    }

    #[tokio::test]
    async fn generated_text_is_used_when_available() {
        let generator = ScriptedTextGenerator::with_responses(["  We have lovely sarees for you!  "]);
        let assistant = assistant(&generator);
        let catalog = crate::retail::demo_catalog();

        let reply = assistant
            .discovery_reply(DiscoveryReply {
                user_message: "show me sarees",
                intro: "Hi!",
                products: &catalog[..1],
                complementary: &[],
            })
            .await;

        assert_eq!(reply, "We have lovely sarees for you!");
        assert!(generator.prompts()[0].contains("Royal Blue Silk Saree - ₹2499 (37% off)"));
    }
}
