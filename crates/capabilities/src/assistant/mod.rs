//! Natural-language assistance: intent labels, keyword extraction,
//! greetings and recommendation copy.
//!
//! One [`Assistant`] is chosen when the application is wired up.
//! [`TemplateAssistant`] is fully deterministic. [`GenerativeAssistant`] asks
//! a [`TextGenerator`] first and falls back to the templates whenever the
//! generator fails, so callers never see a generation error.

mod gemini;
mod generative;
mod generator;
mod templates;

pub use gemini::{DEFAULT_GEMINI_MODEL, GeminiTextGenerator};
pub use generative::GenerativeAssistant;
pub use generator::{GenerationError, ScriptedTextGenerator, TextGenerator};
pub use templates::{CAPABILITIES_MENU, GENERIC_GREETING, HELP_MENU, TemplateAssistant};

use async_trait::async_trait;
use domain::{CustomerProfile, Intent, Product};

/// Input for the reply to a product discovery request.
#[derive(Debug, Clone, Copy)]
pub struct DiscoveryReply<'a> {
    pub user_message: &'a str,
    /// Personalised opening line from the recommender.
    pub intro: &'a str,
    pub products: &'a [Product],
    pub complementary: &'a [Product],
}

#[async_trait]
pub trait Assistant: Send + Sync {
    /// Classifies a message, or `None` when this assistant has no opinion.
    async fn classify_intent(&self, message: &str) -> Option<Intent>;

    /// Product keywords mentioned in `context`. `Some(vec![])` means the
    /// text names no product; `None` means this assistant has no opinion.
    async fn extract_keywords(&self, context: &str) -> Option<Vec<String>>;

    /// Opening line for a new session. `customer` is `None` when the
    /// customer is unknown.
    async fn greeting(&self, customer: Option<&CustomerProfile>, channel: &str) -> String;

    /// Personalised line introducing `products`.
    async fn recommendation_message(
        &self,
        customer: &CustomerProfile,
        products: &[Product],
    ) -> String;

    /// Full reply to a discovery request.
    async fn discovery_reply(&self, reply: DiscoveryReply<'_>) -> String;

    /// Answer to an open question.
    async fn answer_query(&self, query: &str) -> String;
}
