//! Loyalty points, promo codes and automatic promotions.

use std::sync::Arc;

use async_trait::async_trait;
use domain::{CartItem, CustomerId, Money};
use serde::{Deserialize, Serialize};

use crate::capability::Capability;
use crate::error::{CapabilityError, RetailApiError, Result};
use crate::retail::{LoyaltyInfo, PromoApplyRequest, Promotion, RedeemRequest, RetailApi};

/// Points earned per ₹100 when the tier does not say otherwise.
pub const DEFAULT_POINTS_PER_100: i64 = 5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoyaltyRequest {
    pub customer_id: CustomerId,
    pub cart_total: Money,
    pub cart_items: Vec<CartItem>,
    pub promo_code: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscountKind {
    PromoCode,
    Automatic,
}

/// One line of savings applied to the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Discount {
    #[serde(rename = "type")]
    pub kind: DiscountKind,
    /// Promo code or promotion id.
    pub code: String,
    pub amount: Money,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoyaltyOutcome {
    pub original_total: Money,
    pub discounts: Vec<Discount>,
    pub final_total: Money,
    /// Only known when the loyalty lookup succeeded.
    pub points_to_earn: Option<i64>,
    pub total_savings: Money,
    pub loyalty: Option<LoyaltyInfo>,
    /// Why the supplied promo code was not applied.
    pub promo_error: Option<String>,
}

impl LoyaltyOutcome {
    /// The discount granted by the supplied promo code, if it was accepted.
    pub fn promo_discount(&self) -> Option<&Discount> {
        self.discounts
            .iter()
            .find(|d| d.kind == DiscountKind::PromoCode)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Redemption {
    pub points_redeemed: i64,
    pub discount: Money,
    pub remaining_points: i64,
}

/// Whether an automatic promotion applies to a cart.
pub fn promotion_applies(promotion: &Promotion, cart_total: Money, cart_items: &[CartItem]) -> bool {
    if !promotion.active || cart_total < promotion.min_purchase {
        return false;
    }

    if !promotion.applicable_categories.is_empty()
        && !cart_items
            .iter()
            .any(|item| promotion.applicable_categories.contains(&item.product.category))
    {
        return false;
    }

    cart_items.len() >= promotion.min_items
}

/// `floor(amount / 100) * rate`.
pub fn points_for(amount: Money, points_per_100: i64) -> i64 {
    (amount.non_negative().paise() / 10_000) * points_per_100
}

/// Computes discounts and points, and redeems points.
#[derive(Clone)]
pub struct LoyaltyCapability {
    api: Arc<dyn RetailApi>,
}

impl LoyaltyCapability {
    pub fn new(api: Arc<dyn RetailApi>) -> Self {
        Self { api }
    }

    /// Redeems `points` against the customer's balance. One point is worth one rupee.
    #[tracing::instrument(skip(self), fields(customer_id = %customer_id))]
    pub async fn redeem_points(&self, customer_id: &CustomerId, points: i64) -> Result<Redemption> {
        if points <= 0 {
            return Err(CapabilityError::Validation(
                "Points to redeem must be positive".to_string(),
            ));
        }

        let request = RedeemRequest {
            customer_id: customer_id.clone(),
            points,
        };

        match self.api.redeem_points(&request).await {
            Ok(response) => {
                tracing::info!(discount = %response.discount, "points redeemed");
                Ok(Redemption {
                    points_redeemed: points,
                    discount: response.discount,
                    remaining_points: response.remaining_points,
                })
            }
            Err(RetailApiError::Unavailable(e)) | Err(RetailApiError::Decode(e)) => Err(
                CapabilityError::Unavailable(format!("Failed to redeem points: {e}")),
            ),
            Err(e) => Err(e.into()),
        }
    }

    async fn apply_promo_code(
        &self,
        code: &str,
        cart_total: Money,
        cart_items: &[CartItem],
    ) -> std::result::Result<Discount, String> {
        let request = PromoApplyRequest {
            promo_code: code.to_string(),
            cart_total,
            categories: cart_items
                .iter()
                .map(|item| item.product.category.clone())
                .collect(),
        };

        match self.api.apply_promotion(&request).await {
            Ok(response) if response.valid => Ok(Discount {
                kind: DiscountKind::PromoCode,
                code: code.to_string(),
                amount: response.discount,
                description: response.description,
            }),
            Ok(_) => Err("Invalid promo code".to_string()),
            Err(RetailApiError::Rejected { message, .. }) => Err(message),
            Err(e) => Err(format!("Failed to apply promo code: {e}")),
        }
    }

    async fn automatic_discounts(
        &self,
        cart_total: Money,
        cart_items: &[CartItem],
        promo_code: Option<&str>,
    ) -> Vec<Discount> {
        let promotions = match self.api.list_promotions().await {
            Ok(promotions) => promotions,
            Err(e) => {
                tracing::warn!(error = %e, "could not check promotions");
                return Vec::new();
            }
        };

        promotions
            .iter()
            // A code the customer typed is already counted once.
            .filter(|p| Some(p.promo_id.as_str()) != promo_code)
            .filter(|p| promotion_applies(p, cart_total, cart_items))
            .map(|p| Discount {
                kind: DiscountKind::Automatic,
                code: p.promo_id.clone(),
                amount: p.discount_for(cart_total),
                description: p.description.clone(),
            })
            .collect()
    }
}

#[async_trait]
impl Capability for LoyaltyCapability {
    type Request = LoyaltyRequest;
    type Response = LoyaltyOutcome;

    fn name(&self) -> &'static str {
        "loyalty"
    }

    #[tracing::instrument(skip(self, request), fields(customer_id = %request.customer_id, cart_total = %request.cart_total))]
    async fn execute(&self, request: LoyaltyRequest) -> Result<LoyaltyOutcome> {
        let loyalty = match self.api.get_loyalty(&request.customer_id).await {
            Ok(info) => Some(info),
            Err(e) => {
                tracing::warn!(error = %e, "could not fetch loyalty data");
                None
            }
        };

        let mut discounts = Vec::new();
        let mut promo_error = None;

        let promo_code = request
            .promo_code
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty());

        if let Some(code) = promo_code {
            match self
                .apply_promo_code(code, request.cart_total, &request.cart_items)
                .await
            {
                Ok(discount) => discounts.push(discount),
                Err(message) => {
                    tracing::info!(code, error = %message, "promo code rejected");
                    promo_error = Some(message);
                }
            }
        }

        discounts.extend(
            self.automatic_discounts(request.cart_total, &request.cart_items, promo_code)
                .await,
        );

        let applied: Money = discounts.iter().map(|d| d.amount).sum();
        let final_total = (request.cart_total - applied).non_negative();

        let points_to_earn = loyalty.as_ref().map(|info| {
            let rate = info
                .tier_benefits
                .points_per_100
                .unwrap_or(DEFAULT_POINTS_PER_100);
            points_for(final_total, rate)
        });

        let total_savings = request.cart_total - final_total;
        tracing::info!(savings = %total_savings, discounts = discounts.len(), "loyalty applied");

        Ok(LoyaltyOutcome {
            original_total: request.cart_total,
            discounts,
            final_total,
            points_to_earn,
            total_savings,
            loyalty,
            promo_error,
        })
    }
}
