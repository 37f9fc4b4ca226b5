//! Catalog products and cart lines.

use serde::{Deserialize, Serialize};

use crate::{DomainError, Money, Sku};

/// Descriptive attributes of a product.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProductAttributes {
    #[serde(default)]
    pub color: Vec<String>,
    #[serde(default)]
    pub size: Vec<String>,
    #[serde(default)]
    pub material: String,
    #[serde(default)]
    pub occasion: String,
}

/// A catalog product. Reference data owned by the retail data service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub sku: Sku,
    pub name: String,
    pub category: String,
    #[serde(default)]
    pub subcategory: String,
    pub price: Money,
    #[serde(default)]
    pub mrp: Money,
    /// Discount off MRP, in percent.
    #[serde(default)]
    pub discount: u32,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub attributes: ProductAttributes,
    #[serde(default)]
    pub rating: f64,
    #[serde(default)]
    pub reviews: u32,
    #[serde(default)]
    pub image_url: String,
}

impl Product {
    /// Lower-cased name, for keyword matching.
    pub fn name_lower(&self) -> String {
        self.name.to_lowercase()
    }

    /// Lower-cased category, for keyword matching.
    pub fn category_lower(&self) -> String {
        self.category.to_lowercase()
    }

    /// One-line summary used in prompts: name, price, discount.
    pub fn summary(&self) -> String {
        format!("{} - {} ({}% off)", self.name, self.price, self.discount)
    }
}

fn default_quantity() -> u32 {
    1
}

/// A product snapshot in the cart, with the quantity requested.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartItem {
    #[serde(flatten)]
    pub product: Product,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
}

impl CartItem {
    /// Creates a cart line. Quantity must be at least one.
    pub fn new(product: Product, quantity: u32) -> Result<Self, DomainError> {
        if quantity == 0 {
            return Err(DomainError::InvalidQuantity { quantity });
        }
        Ok(Self { product, quantity })
    }

    /// Returns the price of this line (quantity * unit price).
    pub fn line_total(&self) -> Money {
        self.product.price.multiply(self.quantity)
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub fn product(sku: &str, name: &str, category: &str, price: i64) -> Product {
        Product {
            sku: Sku::new(sku),
            name: name.to_string(),
            category: category.to_string(),
            subcategory: String::new(),
            price: Money::from_rupees(price),
            mrp: Money::from_rupees(price),
            discount: 0,
            description: String::new(),
            attributes: ProductAttributes::default(),
            rating: 4.0,
            reviews: 10,
            image_url: String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_product_parses_data_service_json() {
        let json = serde_json::json!({
            "sku": "SKU0001",
            "name": "Blue Silk Saree",
            "category": "Women's Ethnic",
            "subcategory": "Sarees",
            "price": 2499,
            "mrp": 3999,
            "discount": 37,
            "description": "Handwoven silk saree",
            "attributes": {
                "color": ["Blue", "Gold"],
                "size": ["Free Size"],
                "material": "Silk",
                "occasion": "Wedding, Festival"
            },
            "image_url": "https://example.com/1.jpg",
            "rating": 4.6,
            "reviews": 120
        });

        let product: Product = serde_json::from_value(json).unwrap();
        assert_eq!(product.sku.as_str(), "SKU0001");
        assert_eq!(product.price, Money::from_rupees(2499));
        assert_eq!(product.discount, 37);
        assert_eq!(product.attributes.color, vec!["Blue", "Gold"]);
        assert_eq!(product.attributes.occasion, "Wedding, Festival");
    }

    #[test]
    fn test_product_tolerates_missing_optional_fields() {
        let json = serde_json::json!({
            "sku": "SKU0002",
            "name": "Leather Belt",
            "category": "Accessories",
            "price": 799
        });
        let product: Product = serde_json::from_value(json).unwrap();
        assert_eq!(product.rating, 0.0);
        assert!(product.attributes.color.is_empty());
    }

    #[test]
    fn test_cart_item_line_total() {
        let item = CartItem::new(fixtures::product("SKU1", "Kurta", "Men's Ethnic", 1200), 3).unwrap();
        assert_eq!(item.line_total(), Money::from_rupees(3600));
    }

    #[test]
    fn test_cart_item_rejects_zero_quantity() {
        let result = CartItem::new(fixtures::product("SKU1", "Kurta", "Men's Ethnic", 1200), 0);
        assert_eq!(result, Err(DomainError::InvalidQuantity { quantity: 0 }));
    }

    #[test]
    fn test_cart_item_is_flat_product_plus_quantity() {
        let item = CartItem::new(fixtures::product("SKU1", "Kurta", "Men's Ethnic", 1200), 2).unwrap();
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["sku"], "SKU1");
        assert_eq!(json["quantity"], 2);

        let restored: CartItem = serde_json::from_value(json).unwrap();
        assert_eq!(restored, item);
    }
}
