//! Cart totals and the delivery rule.

use serde::{Deserialize, Serialize};

use crate::{CartContext, CartItem, Money};

/// Subtotals strictly above this ship free.
pub const FREE_DELIVERY_ABOVE_RUPEES: i64 = 1000;

/// Flat delivery charge for smaller, non-empty carts.
pub const DELIVERY_FEE_RUPEES: i64 = 50;

/// Priced view of a cart, including stored discounts and delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartSummary {
    pub subtotal: Money,
    pub promo_discount: Money,
    pub redeemed_discount: Money,
    pub delivery: Money,
    pub total: Money,
}

impl CartSummary {
    /// Prices a cart. The subtotal is always recomputed from the items.
    pub fn compute(items: &[CartItem], context: &CartContext) -> Self {
        let subtotal: Money = items.iter().map(CartItem::line_total).sum();
        let delivery = delivery_charge(subtotal);
        let total =
            (subtotal - context.promo_discount - context.redeemed_discount + delivery).non_negative();

        Self {
            subtotal,
            promo_discount: context.promo_discount,
            redeemed_discount: context.redeemed_discount,
            delivery,
            total,
        }
    }
}

/// Delivery is free for empty carts and for subtotals above the threshold.
pub fn delivery_charge(subtotal: Money) -> Money {
    if subtotal.is_zero() || subtotal > Money::from_rupees(FREE_DELIVERY_ABOVE_RUPEES) {
        Money::zero()
    } else {
        Money::from_rupees(DELIVERY_FEE_RUPEES)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::product::fixtures::product;

    fn item(price: i64, quantity: u32) -> CartItem {
        CartItem::new(product("SKU1", "Shirt", "Men's Casual", price), quantity).unwrap()
    }

    #[test]
    fn test_empty_cart_has_no_delivery() {
        let summary = CartSummary::compute(&[], &CartContext::default());
        assert_eq!(summary.subtotal, Money::zero());
        assert_eq!(summary.delivery, Money::zero());
        assert_eq!(summary.total, Money::zero());
    }

    #[test]
    fn test_small_cart_pays_delivery() {
        let summary = CartSummary::compute(&[item(400, 2)], &CartContext::default());
        assert_eq!(summary.subtotal, Money::from_rupees(800));
        assert_eq!(summary.delivery, Money::from_rupees(50));
        assert_eq!(summary.total, Money::from_rupees(850));
    }

    #[test]
    fn test_threshold_is_exclusive() {
        assert_eq!(delivery_charge(Money::from_rupees(1000)), Money::from_rupees(50));
        assert_eq!(delivery_charge(Money::from_rupees(1001)), Money::zero());
    }

    #[test]
    fn test_discounts_are_subtracted_and_total_floored() {
        let context = CartContext {
            promo_code: Some("SAVE10".to_string()),
            promo_discount: Money::from_rupees(200),
            redeemed_points: 100,
            redeemed_discount: Money::from_rupees(100),
        };
        let summary = CartSummary::compute(&[item(1500, 1)], &context);
        assert_eq!(summary.total, Money::from_rupees(1200));

        let generous = CartContext {
            redeemed_discount: Money::from_rupees(5000),
            ..context
        };
        let summary = CartSummary::compute(&[item(1500, 1)], &generous);
        assert_eq!(summary.total, Money::zero());
    }

    #[test]
    fn test_summary_is_stable_without_mutation() {
        let items = vec![item(700, 1), item(350, 2)];
        let context = CartContext::default();
        assert_eq!(
            CartSummary::compute(&items, &context),
            CartSummary::compute(&items, &context)
        );
    }
}
