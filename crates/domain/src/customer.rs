//! Customer profiles as served by the retail data service.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{CustomerId, DomainError, Money};

/// A past purchase. Only the category matters for recommendations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseRecord {
    pub category: String,
}

/// Shopping preferences stated by the customer.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Preferences {
    #[serde(default)]
    pub favorite_colors: Vec<String>,
    /// Preferred price range as `"min-max"` in rupees.
    #[serde(default)]
    pub budget_range: Option<String>,
}

/// Customer profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerProfile {
    pub customer_id: CustomerId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub loyalty_tier: String,
    #[serde(default)]
    pub loyalty_points: i64,
    /// Categories the customer browsed recently.
    #[serde(default)]
    pub browsing_history: Vec<String>,
    #[serde(default)]
    pub purchase_history: Vec<PurchaseRecord>,
    #[serde(default)]
    pub preferences: Preferences,
}

impl CustomerProfile {
    /// An empty profile for a customer the data service does not know.
    pub fn anonymous(customer_id: CustomerId) -> Self {
        Self {
            customer_id,
            name: String::new(),
            loyalty_tier: String::new(),
            loyalty_points: 0,
            browsing_history: Vec::new(),
            purchase_history: Vec::new(),
            preferences: Preferences::default(),
        }
    }

    /// First word of the name, or "there" when the name is blank.
    pub fn first_name(&self) -> &str {
        self.name.split_whitespace().next().unwrap_or("there")
    }

    /// Categories of past purchases, in purchase order.
    pub fn purchased_categories(&self) -> impl Iterator<Item = &str> {
        self.purchase_history.iter().map(|p| p.category.as_str())
    }

    /// The preferred budget, falling back to an unbounded range when absent
    /// or malformed.
    pub fn budget(&self) -> BudgetRange {
        self.preferences
            .budget_range
            .as_deref()
            .and_then(|raw| raw.parse().ok())
            .unwrap_or_default()
    }
}

/// Inclusive price range used by recommendation scoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BudgetRange {
    pub min: Money,
    pub max: Money,
}

impl BudgetRange {
    pub fn new(min: Money, max: Money) -> Self {
        Self { min, max }
    }

    /// Range from zero to `max`.
    pub fn up_to(max: Money) -> Self {
        Self {
            min: Money::zero(),
            max,
        }
    }

    pub fn contains(&self, price: Money) -> bool {
        self.min <= price && price <= self.max
    }
}

impl Default for BudgetRange {
    fn default() -> Self {
        Self {
            min: Money::zero(),
            max: Money::from_rupees(999_999),
        }
    }
}

impl FromStr for BudgetRange {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || DomainError::InvalidBudgetRange(s.to_string());
        let (min, max) = s.split_once('-').ok_or_else(invalid)?;
        let min: i64 = min.trim().parse().map_err(|_| invalid())?;
        let max: i64 = max.trim().parse().map_err(|_| invalid())?;
        Ok(Self::new(Money::from_rupees(min), Money::from_rupees(max)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile_json() -> serde_json::Value {
        serde_json::json!({
            "customer_id": "CUST001",
            "name": "Priya Sharma",
            "loyalty_tier": "Gold",
            "loyalty_points": 2500,
            "browsing_history": ["Women's Ethnic", "Accessories"],
            "purchase_history": [
                {"order_id": "ORD1", "category": "Women's Ethnic", "amount": 2999}
            ],
            "preferences": {
                "favorite_colors": ["Red", "Blue"],
                "budget_range": "1000-5000"
            }
        })
    }

    #[test]
    fn test_profile_parses_data_service_json() {
        let profile: CustomerProfile = serde_json::from_value(profile_json()).unwrap();
        assert_eq!(profile.customer_id.as_str(), "CUST001");
        assert_eq!(profile.first_name(), "Priya");
        assert_eq!(
            profile.purchased_categories().collect::<Vec<_>>(),
            vec!["Women's Ethnic"]
        );
        assert_eq!(
            profile.budget(),
            BudgetRange::new(Money::from_rupees(1000), Money::from_rupees(5000))
        );
    }

    #[test]
    fn test_first_name_defaults_to_there() {
        let profile = CustomerProfile::anonymous(CustomerId::new("CUST404"));
        assert_eq!(profile.first_name(), "there");
    }

    #[test]
    fn test_budget_falls_back_to_unbounded() {
        let mut profile = CustomerProfile::anonymous(CustomerId::new("CUST001"));
        assert_eq!(profile.budget(), BudgetRange::default());

        profile.preferences.budget_range = Some("cheap".to_string());
        assert_eq!(profile.budget(), BudgetRange::default());
    }

    #[test]
    fn test_budget_range_parse_and_contains() {
        let range: BudgetRange = "500-1500".parse().unwrap();
        assert!(range.contains(Money::from_rupees(500)));
        assert!(range.contains(Money::from_rupees(1500)));
        assert!(!range.contains(Money::from_rupees(1501)));

        assert!("1500".parse::<BudgetRange>().is_err());
    }
}
