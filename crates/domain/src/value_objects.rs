//! Value objects shared across the shopping domain.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Customer identifier as issued by the retail data service (e.g. `CUST001`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CustomerId(String);

impl CustomerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CustomerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for CustomerId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for CustomerId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl AsRef<str> for CustomerId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Stock keeping unit, the product identifier (e.g. `SKU0042`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Sku(String);

impl Sku {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Sku {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for Sku {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for Sku {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl AsRef<str> for Sku {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Money amount in paise (1/100 rupee) to avoid floating point drift.
///
/// On the wire an amount is a plain JSON number of rupees (`2499` or
/// `249.9`), which is what the retail data service speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Money {
    paise: i64,
}

impl Money {
    /// Creates an amount from paise.
    pub fn from_paise(paise: i64) -> Self {
        Self { paise }
    }

    /// Creates an amount from whole rupees, saturating at the bounds of
    /// what paise can represent.
    pub fn from_rupees(rupees: i64) -> Self {
        Self {
            paise: rupees.saturating_mul(100),
        }
    }

    /// Creates an amount from fractional rupees, rounded to the nearest paisa.
    pub fn from_rupees_f64(rupees: f64) -> Self {
        Self {
            paise: (rupees * 100.0).round() as i64,
        }
    }

    pub fn zero() -> Self {
        Self { paise: 0 }
    }

    pub fn paise(&self) -> i64 {
        self.paise
    }

    /// Returns the whole-rupee part, truncated toward zero.
    pub fn rupees(&self) -> i64 {
        self.paise / 100
    }

    pub fn as_rupees_f64(&self) -> f64 {
        self.paise as f64 / 100.0
    }

    pub fn is_positive(&self) -> bool {
        self.paise > 0
    }

    pub fn is_zero(&self) -> bool {
        self.paise == 0
    }

    pub fn is_negative(&self) -> bool {
        self.paise < 0
    }

    /// Multiplies by a quantity.
    pub fn multiply(&self, quantity: u32) -> Money {
        Money {
            paise: self.paise.saturating_mul(quantity as i64),
        }
    }

    /// Returns `percent`% of this amount, rounded to the nearest paisa.
    pub fn percent(&self, percent: f64) -> Money {
        Money {
            paise: (self.paise as f64 * percent / 100.0).round() as i64,
        }
    }

    /// Floors negative amounts at zero.
    pub fn non_negative(self) -> Money {
        Money {
            paise: self.paise.max(0),
        }
    }
}

impl std::fmt::Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let sign = if self.paise < 0 { "-" } else { "" };
        let abs = self.paise.abs();
        if abs % 100 == 0 {
            write!(f, "{sign}₹{}", abs / 100)
        } else {
            write!(f, "{sign}₹{}.{:02}", abs / 100, abs % 100)
        }
    }
}

impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.paise % 100 == 0 {
            serializer.serialize_i64(self.paise / 100)
        } else {
            serializer.serialize_f64(self.as_rupees_f64())
        }
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let rupees = f64::deserialize(deserializer)?;
        Ok(Money::from_rupees_f64(rupees))
    }
}

impl std::ops::Add for Money {
    type Output = Money;

    fn add(self, rhs: Self) -> Self::Output {
        Money {
            paise: self.paise + rhs.paise,
        }
    }
}

impl std::ops::Sub for Money {
    type Output = Money;

    fn sub(self, rhs: Self) -> Self::Output {
        Money {
            paise: self.paise - rhs.paise,
        }
    }
}

impl std::ops::AddAssign for Money {
    fn add_assign(&mut self, rhs: Self) {
        self.paise += rhs.paise;
    }
}

impl std::ops::SubAssign for Money {
    fn sub_assign(&mut self, rhs: Self) {
        self.paise -= rhs.paise;
    }
}

impl std::iter::Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sku_string_conversion() {
        let sku = Sku::new("SKU0001");
        assert_eq!(sku.as_str(), "SKU0001");

        let other: Sku = "SKU0002".into();
        assert_eq!(other.to_string(), "SKU0002");
    }

    #[test]
    fn test_customer_id_serializes_as_plain_string() {
        let id = CustomerId::new("CUST001");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"CUST001\"");
    }

    #[test]
    fn test_money_from_rupees() {
        let money = Money::from_rupees(2499);
        assert_eq!(money.paise(), 249_900);
        assert_eq!(money.rupees(), 2499);
    }

    #[test]
    fn test_money_from_huge_rupees_saturates() {
        assert_eq!(Money::from_rupees(99_999_999_999_999_999).paise(), i64::MAX);
        assert_eq!(Money::from_rupees(-99_999_999_999_999_999).paise(), i64::MIN);
    }

    #[test]
    fn test_money_from_fractional_rupees_rounds() {
        assert_eq!(Money::from_rupees_f64(249.9).paise(), 24_990);
        assert_eq!(Money::from_rupees_f64(0.005).paise(), 1);
    }

    #[test]
    fn test_money_display() {
        assert_eq!(Money::from_rupees(1500).to_string(), "₹1500");
        assert_eq!(Money::from_paise(24_990).to_string(), "₹249.90");
        assert_eq!(Money::from_rupees(-50).to_string(), "-₹50");
    }

    #[test]
    fn test_money_percent() {
        assert_eq!(Money::from_rupees(2000).percent(10.0), Money::from_rupees(200));
        assert_eq!(Money::from_rupees(999).percent(15.0), Money::from_paise(14_985));
    }

    #[test]
    fn test_money_arithmetic() {
        let a = Money::from_rupees(1000);
        let b = Money::from_rupees(300);

        assert_eq!(a + b, Money::from_rupees(1300));
        assert_eq!(a - b, Money::from_rupees(700));
        assert_eq!(b.multiply(3), Money::from_rupees(900));
        assert_eq!((b - a).non_negative(), Money::zero());

        let total: Money = vec![a, b, b].into_iter().sum();
        assert_eq!(total, Money::from_rupees(1600));
    }

    #[test]
    fn test_money_wire_format_is_rupees() {
        assert_eq!(serde_json::to_string(&Money::from_rupees(2499)).unwrap(), "2499");
        assert_eq!(serde_json::to_string(&Money::from_paise(24_990)).unwrap(), "249.9");

        let parsed: Money = serde_json::from_str("1299").unwrap();
        assert_eq!(parsed, Money::from_rupees(1299));
        let parsed: Money = serde_json::from_str("199.5").unwrap();
        assert_eq!(parsed, Money::from_paise(19_950));
    }
}
