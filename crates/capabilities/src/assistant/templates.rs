use std::fmt::Write;
use std::sync::Arc;

use async_trait::async_trait;
use domain::{CustomerProfile, Intent, Product};

use super::{Assistant, DiscoveryReply};
use crate::ids::IdGenerator;

pub const GENERIC_GREETING: &str =
    "👋 Hello! Welcome to our store! I'm your personal shopping assistant.";

/// Appended to every greeting.
pub const CAPABILITIES_MENU: &str = "\n\nI can help you:\n✨ Find the perfect products\n📦 Check availability\n🎁 Apply best offers\n🚚 Complete your purchase\n\nWhat are you looking for today?";

pub const HELP_MENU: &str = "I'm here to help! You can:\n• Browse products\n• Get recommendations\n• Check out your cart\n• Apply promo codes\n• Track orders\n\nWhat would you like to do?";

/// Deterministic copy. Template choice goes through the injected generator.
#[derive(Clone)]
pub struct TemplateAssistant {
    ids: Arc<dyn IdGenerator>,
}

impl TemplateAssistant {
    pub fn new(ids: Arc<dyn IdGenerator>) -> Self {
        Self { ids }
    }

    pub(crate) fn greeting_text(customer: Option<&CustomerProfile>) -> String {
        match customer {
            Some(customer) => {
                let tier = if customer.loyalty_tier.is_empty() {
                    "valued"
                } else {
                    customer.loyalty_tier.as_str()
                };
                format!(
                    "Welcome back, {}! As our {} member, you have {} points. How can I help you today?",
                    customer.first_name(),
                    tier,
                    customer.loyalty_points
                )
            }
            None => GENERIC_GREETING.to_string(),
        }
    }

    pub(crate) fn recommendation_text(
        &self,
        customer: &CustomerProfile,
        products: &[Product],
    ) -> String {
        let name = customer.first_name();
        let Some(top) = products.first() else {
            return format!("Hi {name}! Let me help you find something perfect for you.");
        };

        let mut templates = vec![
            format!("Hi {name}! Based on your preferences, I think you'll love this {}.", top.name),
            format!(
                "Hello {name}! I've found some great options for you. This {} is perfect!",
                top.name
            ),
        ];
        if let Some(browsed) = customer.browsing_history.first() {
            templates.push(format!(
                "Hi {name}! I noticed you like {browsed}, so I picked this {} for you.",
                top.name
            ));
        }

        let choice = self.ids.choose(templates.len());
        templates.swap_remove(choice)
    }

    pub(crate) fn discovery_text(reply: &DiscoveryReply<'_>) -> String {
        let mut message = format!("{}\n\nHere are my top recommendations:\n\n", reply.intro);

        for (i, product) in reply.products.iter().take(3).enumerate() {
            let _ = writeln!(
                message,
                "{}. **{}** - {} (was {}, {}% off)",
                i + 1,
                product.name,
                product.price,
                product.mrp,
                product.discount
            );
            let _ = writeln!(message, "   {}", product.description);
        }

        if !reply.complementary.is_empty() {
            let names: Vec<&str> = reply
                .complementary
                .iter()
                .take(2)
                .map(|p| p.name.as_str())
                .collect();
            message.push_str("\n💡 **You might also like:** ");
            message.push_str(&names.join(", "));
        }

        message
    }
}

#[async_trait]
impl Assistant for TemplateAssistant {
    async fn classify_intent(&self, _message: &str) -> Option<Intent> {
        None
    }

    async fn extract_keywords(&self, _context: &str) -> Option<Vec<String>> {
        None
    }

    async fn greeting(&self, customer: Option<&CustomerProfile>, _channel: &str) -> String {
        Self::greeting_text(customer)
    }

    async fn recommendation_message(
        &self,
        customer: &CustomerProfile,
        products: &[Product],
    ) -> String {
        self.recommendation_text(customer, products)
    }

    async fn discovery_reply(&self, reply: DiscoveryReply<'_>) -> String {
        Self::discovery_text(&reply)
    }

    async fn answer_query(&self, _query: &str) -> String {
        HELP_MENU.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::SequentialIdGenerator;
    use crate::retail::demo_catalog;
    use domain::CustomerId;

    fn priya() -> CustomerProfile {
        let mut profile = CustomerProfile::anonymous(CustomerId::new("CUST001"));
        profile.name = "Priya Sharma".to_string();
        profile.loyalty_tier = "Gold".to_string();
        profile.loyalty_points = 2500;
        profile.browsing_history = vec!["Women's Ethnic".to_string()];
        profile
    }

    #[tokio::test]
    async fn greeting_for_known_and_unknown_customers() {
        let assistant = TemplateAssistant::new(Arc::new(SequentialIdGenerator::new()));

        assert_eq!(
            assistant.greeting(Some(&priya()), "web").await,
            "Welcome back, Priya! As our Gold member, you have 2500 points. How can I help you today?"
        );
        assert_eq!(assistant.greeting(None, "web").await, GENERIC_GREETING);
    }

    #[tokio::test]
    async fn recommendation_template_is_chosen_by_injected_generator() {
        let catalog = demo_catalog();
        let third = TemplateAssistant::new(Arc::new(SequentialIdGenerator::with_choice(2)));

        assert_eq!(
            third.recommendation_message(&priya(), &catalog).await,
            "Hi Priya! I noticed you like Women's Ethnic, so I picked this Royal Blue Silk Saree for you."
        );

        // Without browsing history only the first two templates exist.
        let anonymous = CustomerProfile::anonymous(CustomerId::new("CUST404"));
        assert_eq!(
            third.recommendation_message(&anonymous, &catalog).await,
            "Hello there! I've found some great options for you. This Royal Blue Silk Saree is perfect!"
        );

        assert_eq!(
            third.recommendation_message(&anonymous, &[]).await,
            "Hi there! Let me help you find something perfect for you."
        );
    }

    #[tokio::test]
    async fn discovery_reply_lists_three_products_and_two_extras() {
        let catalog = demo_catalog();
        let assistant = TemplateAssistant::new(Arc::new(SequentialIdGenerator::new()));

        let reply = assistant
            .discovery_reply(DiscoveryReply {
                user_message: "show me sarees",
                intro: "Hi Priya!",
                products: &catalog[..4],
                complementary: &catalog[7..10],
            })
            .await;

        assert!(reply.starts_with("Hi Priya!\n\nHere are my top recommendations:\n\n"));
        assert!(reply.contains("1. **Royal Blue Silk Saree** - ₹2499 (was ₹3999, 37% off)\n"));
        assert!(reply.contains("3. **Floral Maxi Dress**"));
        assert!(!reply.contains("4. "));
        assert!(reply.ends_with(
            "💡 **You might also like:** Leather Analog Watch, Chronograph Steel Watch"
        ));
    }

    #[tokio::test]
    async fn open_questions_get_help_menu() {
        let assistant = TemplateAssistant::new(Arc::new(SequentialIdGenerator::new()));
        assert_eq!(assistant.answer_query("what's up?").await, HELP_MENU);
        assert_eq!(assistant.classify_intent("checkout").await, None);
    }
}
