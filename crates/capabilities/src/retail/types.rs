//! Request and response bodies of the retail data service.

use std::collections::BTreeMap;

use domain::{CartItem, CustomerId, Money, Sku};
use serde::{Deserialize, Serialize};

/// Stock levels for one SKU, by location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryRecord {
    pub sku: Sku,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub warehouse_stock: BTreeMap<String, u32>,
    #[serde(default)]
    pub store_stock: BTreeMap<String, u32>,
}

/// Benefits attached to a loyalty tier.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TierBenefits {
    #[serde(default)]
    pub points_per_100: Option<i64>,
}

/// Loyalty standing of a customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoyaltyInfo {
    pub customer_id: CustomerId,
    #[serde(default)]
    pub points: i64,
    #[serde(default)]
    pub tier: String,
    #[serde(default)]
    pub tier_benefits: TierBenefits,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PromotionKind {
    Percentage,
    Flat,
}

/// A promotion published by the data service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Promotion {
    pub promo_id: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "type")]
    pub kind: PromotionKind,
    /// Percent for percentage promotions, rupees for flat ones.
    pub value: f64,
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub min_purchase: Money,
    #[serde(default)]
    pub applicable_categories: Vec<String>,
    #[serde(default)]
    pub min_items: usize,
}

impl Promotion {
    /// Discount this promotion grants on `cart_total`.
    pub fn discount_for(&self, cart_total: Money) -> Money {
        match self.kind {
            PromotionKind::Percentage => cart_total.percent(self.value),
            PromotionKind::Flat => Money::from_rupees_f64(self.value),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromoApplyRequest {
    pub promo_code: String,
    pub cart_total: Money,
    pub categories: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromoApplyResponse {
    #[serde(default)]
    pub valid: bool,
    #[serde(default)]
    pub discount: Money,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentCharge {
    pub amount: Money,
    pub method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub card_number: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentReceipt {
    pub transaction_id: String,
    #[serde(default)]
    pub timestamp: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RedeemRequest {
    pub customer_id: CustomerId,
    pub points: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RedeemResponse {
    pub points_redeemed: i64,
    pub discount: Money,
    pub remaining_points: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRequest {
    pub customer_id: CustomerId,
    pub items: Vec<CartItem>,
    pub fulfillment_type: String,
    #[serde(default)]
    pub delivery_address: Option<String>,
    #[serde(default)]
    pub store_location: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderConfirmation {
    pub order_id: String,
    pub tracking_number: String,
    #[serde(default)]
    pub estimated_delivery: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderStatus {
    pub order_id: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub estimated_delivery: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn promotion_parses_data_service_json() {
        let promo: Promotion = serde_json::from_value(serde_json::json!({
            "promo_id": "FESTIVE20",
            "description": "20% off ethnic wear",
            "type": "percentage",
            "value": 20,
            "active": true,
            "min_purchase": 2000,
            "applicable_categories": ["Women's Ethnic", "Men's Ethnic"]
        }))
        .unwrap();

        assert_eq!(promo.kind, PromotionKind::Percentage);
        assert_eq!(promo.min_items, 0);
        assert_eq!(
            promo.discount_for(Money::from_rupees(3000)),
            Money::from_rupees(600)
        );
    }

    #[test]
    fn flat_promotion_discount_ignores_total() {
        let promo = Promotion {
            promo_id: "FLAT200".to_string(),
            description: String::new(),
            kind: PromotionKind::Flat,
            value: 200.0,
            active: true,
            min_purchase: Money::zero(),
            applicable_categories: vec![],
            min_items: 0,
        };
        assert_eq!(promo.discount_for(Money::from_rupees(5000)), Money::from_rupees(200));
    }

    #[test]
    fn loyalty_info_tolerates_empty_benefits() {
        let info: LoyaltyInfo = serde_json::from_value(serde_json::json!({
            "customer_id": "CUST001",
            "points": 1200,
            "tier": "Silver",
            "tier_benefits": {}
        }))
        .unwrap();
        assert_eq!(info.tier_benefits.points_per_100, None);
    }
}
