//! User intents.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::DomainError;

/// The classified purpose of one user message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    ProductDiscovery,
    AddToCart,
    Checkout,
    ApplyOffer,
    PostPurchase,
    General,
}

impl Intent {
    /// All intents, in the order they are presented to the assistant.
    pub const ALL: [Intent; 6] = [
        Intent::ProductDiscovery,
        Intent::AddToCart,
        Intent::Checkout,
        Intent::ApplyOffer,
        Intent::PostPurchase,
        Intent::General,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Intent::ProductDiscovery => "product_discovery",
            Intent::AddToCart => "add_to_cart",
            Intent::Checkout => "checkout",
            Intent::ApplyOffer => "apply_offer",
            Intent::PostPurchase => "post_purchase",
            Intent::General => "general",
        }
    }
}

impl std::fmt::Display for Intent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Intent {
    type Err = DomainError;

    /// Parses an exact intent label. Surrounding whitespace and case are
    /// ignored; anything else is rejected.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let label = s.trim().to_lowercase();
        Intent::ALL
            .into_iter()
            .find(|intent| intent.as_str() == label)
            .ok_or_else(|| DomainError::UnknownIntent(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_accepts_exact_labels() {
        for intent in Intent::ALL {
            assert_eq!(intent.as_str().parse::<Intent>().unwrap(), intent);
        }
        assert_eq!(" Checkout\n".parse::<Intent>().unwrap(), Intent::Checkout);
    }

    #[test]
    fn test_parse_rejects_chatty_output() {
        assert!("The intent is checkout".parse::<Intent>().is_err());
        assert!("checkout.".parse::<Intent>().is_err());
        assert!("".parse::<Intent>().is_err());
    }

    #[test]
    fn test_serde_uses_snake_case_labels() {
        assert_eq!(
            serde_json::to_string(&Intent::ProductDiscovery).unwrap(),
            "\"product_discovery\""
        );
    }
}
