//! Personalised product recommendations.
//!
//! Every product gets a score from the customer's profile and the request
//! text:
//!
//! | signal                                               | points |
//! |------------------------------------------------------|--------|
//! | a requested keyword appears in the name or category  | +100   |
//! | category in browsing history                         | +30    |
//! | category among past purchases                        | +20    |
//! | shares a favourite colour                            | +15    |
//! | price inside the budget                              | +25    |
//! | occasion requested and listed on the product         | +20    |
//! | rating of 4.5 or more                                | +10    |
//! | discount of 30% or more                              | +5     |
//!
//! Products above an explicit price ceiling in the text ("under 2000") are
//! dropped before scoring. Ranking is stable, so ties keep catalog order.

use std::sync::{Arc, LazyLock};

use async_trait::async_trait;
use domain::{BudgetRange, CustomerId, CustomerProfile, Money, Product};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::assistant::Assistant;
use crate::capability::Capability;
use crate::error::{CapabilityError, RetailApiError, Result};
use crate::retail::RetailApi;

pub const DIRECT_MATCH_SCORE: u32 = 100;
const BROWSED_CATEGORY_SCORE: u32 = 30;
const PURCHASED_CATEGORY_SCORE: u32 = 20;
const FAVORITE_COLOR_SCORE: u32 = 15;
const IN_BUDGET_SCORE: u32 = 25;
const OCCASION_SCORE: u32 = 20;
const TOP_RATED_SCORE: u32 = 10;
const DEEP_DISCOUNT_SCORE: u32 = 5;

/// Results returned in browsing mode.
pub const DEFAULT_LIMIT: usize = 5;
/// Complementary products suggested alongside the top pick.
pub const COMPLEMENTARY_LIMIT: usize = 3;

/// Product nouns recognised without the assistant.
const KEYWORD_DICTIONARY: &[&str] = &[
    "saree", "kurta", "lehenga", "anarkali", "dress", "jeans", "shirt", "t-shirt", "blazer",
    "trouser", "suit", "shoe", "sneaker", "sandal", "heel", "watch", "bag", "handbag", "belt",
    "wallet", "jewelry", "earring", "necklace", "scarf", "jacket", "skirt",
];

static PRICE_CEILING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:under|below|less than|within|maximum|max|up to)\s*(?:rs\.?|inr|₹)?\s*(\d[\d,]*)")
        .expect("price ceiling pattern is valid")
});

/// The explicit upper price bound stated in `text`, if any.
pub fn price_ceiling(text: &str) -> Option<Money> {
    let captures = PRICE_CEILING.captures(text)?;
    let digits: String = captures[1].chars().filter(char::is_ascii_digit).collect();
    digits.parse::<i64>().ok().map(Money::from_rupees)
}

/// Dictionary keywords found in `text`, in dictionary order.
pub fn dictionary_keywords(text: &str) -> Vec<String> {
    let lower = text.to_lowercase();
    KEYWORD_DICTIONARY
        .iter()
        .filter(|k| lower.contains(*k))
        .map(|k| k.to_string())
        .collect()
}

fn complementary_categories(category: &str) -> &'static [&'static str] {
    match category {
        "Women's Ethnic" | "Women's Western" | "Men's Formal" | "Men's Casual"
        | "Men's Ethnic" => &["Accessories", "Footwear"],
        _ => &[],
    }
}

/// Up to three catalog products that go with `top`, in catalog order.
pub fn complementary_items(top: &Product, catalog: &[Product]) -> Vec<Product> {
    let categories = complementary_categories(&top.category);
    catalog
        .iter()
        .filter(|p| categories.contains(&p.category.as_str()))
        .take(COMPLEMENTARY_LIMIT)
        .cloned()
        .collect()
}

/// Everything scoring depends on apart from the product itself.
#[derive(Debug, Clone)]
pub struct RankingQuery<'a> {
    pub profile: &'a CustomerProfile,
    pub keywords: &'a [String],
    pub occasion: Option<&'a str>,
    pub budget: BudgetRange,
    /// Hard upper bound; products above it are never returned.
    pub ceiling: Option<Money>,
}

impl<'a> RankingQuery<'a> {
    /// Builds a query, resolving the budget: an explicit `budget` wins over
    /// the profile's range, and a ceiling in `context` caps either.
    pub fn new(
        profile: &'a CustomerProfile,
        context: &str,
        keywords: &'a [String],
        occasion: Option<&'a str>,
        budget: Option<Money>,
    ) -> Self {
        let mut range = budget.map_or_else(|| profile.budget(), BudgetRange::up_to);
        let ceiling = price_ceiling(context);
        if let Some(max) = ceiling {
            range.max = max;
        }
        Self {
            profile,
            keywords,
            occasion: occasion.filter(|o| !o.is_empty()),
            budget: range,
            ceiling,
        }
    }

    fn is_direct_match(&self, product: &Product) -> bool {
        let name = product.name_lower();
        let category = product.category_lower();
        self.keywords
            .iter()
            .any(|k| name.contains(k.as_str()) || category.contains(k.as_str()))
    }

    pub fn score(&self, product: &Product) -> u32 {
        let mut score = 0;

        if self.is_direct_match(product) {
            tracing::debug!(sku = %product.sku, "direct match");
            score += DIRECT_MATCH_SCORE;
        }
        if self.profile.browsing_history.contains(&product.category) {
            score += BROWSED_CATEGORY_SCORE;
        }
        if self
            .profile
            .purchased_categories()
            .any(|c| c == product.category)
        {
            score += PURCHASED_CATEGORY_SCORE;
        }
        if product
            .attributes
            .color
            .iter()
            .any(|c| self.profile.preferences.favorite_colors.contains(c))
        {
            score += FAVORITE_COLOR_SCORE;
        }
        if self.budget.contains(product.price) {
            score += IN_BUDGET_SCORE;
        }
        if let Some(occasion) = self.occasion
            && product
                .attributes
                .occasion
                .to_lowercase()
                .contains(&occasion.to_lowercase())
        {
            score += OCCASION_SCORE;
        }
        if product.rating >= 4.5 {
            score += TOP_RATED_SCORE;
        }
        if product.discount >= 30 {
            score += DEEP_DISCOUNT_SCORE;
        }

        score
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredProduct {
    pub product: Product,
    pub score: u32,
}

/// Scores and orders `catalog`, then applies the selection policy: with
/// keywords and a direct match on top, every direct match is returned;
/// otherwise the best [`DEFAULT_LIMIT`].
pub fn score_and_rank(query: &RankingQuery<'_>, catalog: &[Product]) -> Vec<ScoredProduct> {
    let mut scored: Vec<ScoredProduct> = catalog
        .iter()
        .filter(|p| query.ceiling.is_none_or(|max| p.price <= max))
        .map(|p| ScoredProduct {
            score: query.score(p),
            product: p.clone(),
        })
        .collect();

    // sort_by is stable
    scored.sort_by(|a, b| b.score.cmp(&a.score));

    let strict = !query.keywords.is_empty()
        && scored
            .first()
            .is_some_and(|top| top.score >= DIRECT_MATCH_SCORE);

    if strict {
        scored.retain(|s| s.score >= DIRECT_MATCH_SCORE);
    } else {
        scored.truncate(DEFAULT_LIMIT);
    }
    scored
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecommendationRequest {
    pub customer_id: CustomerId,
    /// What the customer said, possibly with earlier messages appended.
    pub context: String,
    pub occasion: Option<String>,
    /// Explicit budget ceiling; overrides the profile's range.
    pub budget: Option<Money>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationSet {
    pub recommendations: Vec<Product>,
    pub complementary_items: Vec<Product>,
    pub personalized_message: String,
}

/// Ranks the catalog for a customer.
#[derive(Clone)]
pub struct RecommendationCapability {
    api: Arc<dyn RetailApi>,
    assistant: Arc<dyn Assistant>,
}

impl RecommendationCapability {
    pub fn new(api: Arc<dyn RetailApi>, assistant: Arc<dyn Assistant>) -> Self {
        Self { api, assistant }
    }

    async fn profile(&self, customer_id: &CustomerId) -> Result<CustomerProfile> {
        match self.api.get_customer(customer_id).await {
            Ok(profile) => Ok(profile),
            Err(RetailApiError::NotFound(_)) => {
                tracing::info!(%customer_id, "unknown customer, recommending without profile");
                Ok(CustomerProfile::anonymous(customer_id.clone()))
            }
            Err(e) => Err(CapabilityError::Unavailable(format!(
                "Failed to fetch customer data: {e}"
            ))),
        }
    }

    async fn keywords(&self, context: &str) -> Vec<String> {
        match self.assistant.extract_keywords(context).await {
            Some(keywords) => keywords,
            None => dictionary_keywords(context),
        }
    }
}

#[async_trait]
impl Capability for RecommendationCapability {
    type Request = RecommendationRequest;
    type Response = RecommendationSet;

    fn name(&self) -> &'static str {
        "recommendation"
    }

    #[tracing::instrument(skip(self, request), fields(customer_id = %request.customer_id))]
    async fn execute(&self, request: RecommendationRequest) -> Result<RecommendationSet> {
        let profile = self.profile(&request.customer_id).await?;
        let catalog = self.api.list_products().await.map_err(|e| {
            CapabilityError::Unavailable(format!("Failed to fetch products: {e}"))
        })?;

        let keywords = self.keywords(&request.context).await;
        let query = RankingQuery::new(
            &profile,
            &request.context,
            &keywords,
            request.occasion.as_deref(),
            request.budget,
        );

        let recommendations: Vec<Product> = score_and_rank(&query, &catalog)
            .into_iter()
            .map(|s| s.product)
            .collect();

        let complementary = recommendations
            .first()
            .map(|top| complementary_items(top, &catalog))
            .unwrap_or_default();

        let personalized_message = self
            .assistant
            .recommendation_message(&profile, &recommendations)
            .await;

        tracing::info!(
            count = recommendations.len(),
            keywords = ?keywords,
            "generated recommendations"
        );

        Ok(RecommendationSet {
            recommendations,
            complementary_items: complementary,
            personalized_message,
        })
    }
}
