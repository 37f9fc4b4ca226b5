use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use domain::{
    CustomerId, CustomerProfile, Money, Preferences, Product, ProductAttributes, PurchaseRecord,
    Sku,
};

use super::RetailApi;
use super::types::*;
use crate::error::RetailApiError;

#[derive(Debug, Default)]
struct InMemoryRetailState {
    customers: HashMap<CustomerId, CustomerProfile>,
    products: Vec<Product>,
    inventory: HashMap<Sku, InventoryRecord>,
    promotions: Vec<Promotion>,
    tiers: HashMap<String, TierBenefits>,
    orders: HashMap<String, OrderRequest>,
    next_transaction: u32,
    next_order: u32,
    unavailable: bool,
    decline_payments: bool,
    fail_inventory: bool,
    fail_order_creation: bool,
    payment_calls: u32,
    order_calls: u32,
    inventory_calls: u32,
}

/// In-memory retail data service for tests and local runs.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRetailApi {
    state: Arc<RwLock<InMemoryRetailState>>,
}

impl InMemoryRetailApi {
    /// Creates an empty data service.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a data service seeded with the demo catalog, stock,
    /// customers, promotions and loyalty tiers.
    pub fn demo() -> Self {
        let api = Self::new();
        for product in demo_catalog() {
            let sku = product.sku.clone();
            let (warehouse, stores) = demo_stock(sku.as_str());
            api.set_inventory(InventoryRecord {
                sku,
                name: product.name.clone(),
                warehouse_stock: warehouse,
                store_stock: stores,
            });
            api.add_product(product);
        }
        for customer in demo_customers() {
            api.add_customer(customer);
        }
        for promotion in demo_promotions() {
            api.add_promotion(promotion);
        }
        for (tier, rate) in [("Bronze", 5), ("Silver", 10), ("Gold", 15)] {
            api.set_tier_benefits(
                tier,
                TierBenefits {
                    points_per_100: Some(rate),
                },
            );
        }
        api
    }

    pub fn add_product(&self, product: Product) {
        self.state.write().unwrap().products.push(product);
    }

    pub fn set_inventory(&self, record: InventoryRecord) {
        self.state
            .write()
            .unwrap()
            .inventory
            .insert(record.sku.clone(), record);
    }

    pub fn add_customer(&self, customer: CustomerProfile) {
        self.state
            .write()
            .unwrap()
            .customers
            .insert(customer.customer_id.clone(), customer);
    }

    pub fn add_promotion(&self, promotion: Promotion) {
        self.state.write().unwrap().promotions.push(promotion);
    }

    pub fn set_tier_benefits(&self, tier: &str, benefits: TierBenefits) {
        self.state
            .write()
            .unwrap()
            .tiers
            .insert(tier.to_string(), benefits);
    }

    /// Makes every call fail as if the service were down.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.state.write().unwrap().unavailable = unavailable;
    }

    /// Makes payment and payment retry calls decline.
    pub fn set_decline_payments(&self, decline: bool) {
        self.state.write().unwrap().decline_payments = decline;
    }

    /// Makes inventory lookups fail with a transport error.
    pub fn set_fail_inventory(&self, fail: bool) {
        self.state.write().unwrap().fail_inventory = fail;
    }

    /// Makes order creation fail with a transport error.
    pub fn set_fail_order_creation(&self, fail: bool) {
        self.state.write().unwrap().fail_order_creation = fail;
    }

    /// Number of payment and payment retry calls received.
    pub fn payment_calls(&self) -> u32 {
        self.state.read().unwrap().payment_calls
    }

    /// Number of order creation calls received.
    pub fn order_calls(&self) -> u32 {
        self.state.read().unwrap().order_calls
    }

    /// Number of inventory lookups received.
    pub fn inventory_calls(&self) -> u32 {
        self.state.read().unwrap().inventory_calls
    }

    /// Returns the order request stored under `order_id`.
    pub fn order(&self, order_id: &str) -> Option<OrderRequest> {
        self.state.read().unwrap().orders.get(order_id).cloned()
    }

    /// Current loyalty balance of a customer.
    pub fn loyalty_points(&self, customer_id: &CustomerId) -> Option<i64> {
        self.state
            .read()
            .unwrap()
            .customers
            .get(customer_id)
            .map(|c| c.loyalty_points)
    }

    fn check_available(&self) -> Result<(), RetailApiError> {
        if self.state.read().unwrap().unavailable {
            return Err(RetailApiError::Unavailable("simulated outage".to_string()));
        }
        Ok(())
    }

    fn charge(&self, retry: bool) -> Result<PaymentReceipt, RetailApiError> {
        self.check_available()?;
        let mut state = self.state.write().unwrap();
        state.payment_calls += 1;

        if state.decline_payments {
            return Err(if retry {
                RetailApiError::Rejected {
                    status: 400,
                    message: "Payment retry failed".to_string(),
                    error_code: None,
                }
            } else {
                RetailApiError::Rejected {
                    status: 400,
                    message: "Payment declined. Please try another payment method.".to_string(),
                    error_code: Some("DECLINED".to_string()),
                }
            });
        }

        state.next_transaction += 1;
        Ok(PaymentReceipt {
            transaction_id: format!("TXN{:06}", state.next_transaction),
            timestamp: Some(chrono::Utc::now().to_rfc3339()),
        })
    }
}

#[async_trait]
impl RetailApi for InMemoryRetailApi {
    async fn get_customer(
        &self,
        customer_id: &CustomerId,
    ) -> Result<CustomerProfile, RetailApiError> {
        self.check_available()?;
        self.state
            .read()
            .unwrap()
            .customers
            .get(customer_id)
            .cloned()
            .ok_or_else(|| RetailApiError::NotFound("Customer not found".to_string()))
    }

    async fn list_products(&self) -> Result<Vec<Product>, RetailApiError> {
        self.check_available()?;
        Ok(self.state.read().unwrap().products.clone())
    }

    async fn get_product(&self, sku: &Sku) -> Result<Product, RetailApiError> {
        self.check_available()?;
        self.state
            .read()
            .unwrap()
            .products
            .iter()
            .find(|p| &p.sku == sku)
            .cloned()
            .ok_or_else(|| RetailApiError::NotFound("Product not found".to_string()))
    }

    async fn get_inventory(&self, sku: &Sku) -> Result<InventoryRecord, RetailApiError> {
        self.check_available()?;
        let mut state = self.state.write().unwrap();
        state.inventory_calls += 1;
        if state.fail_inventory {
            return Err(RetailApiError::Unavailable(
                "inventory lookup timed out".to_string(),
            ));
        }
        state
            .inventory
            .get(sku)
            .cloned()
            .ok_or_else(|| RetailApiError::NotFound("Inventory not found".to_string()))
    }

    async fn process_payment(
        &self,
        _charge: &PaymentCharge,
    ) -> Result<PaymentReceipt, RetailApiError> {
        self.charge(false)
    }

    async fn retry_payment(&self, _charge: &PaymentCharge) -> Result<PaymentReceipt, RetailApiError> {
        self.charge(true)
    }

    async fn list_promotions(&self) -> Result<Vec<Promotion>, RetailApiError> {
        self.check_available()?;
        Ok(self.state.read().unwrap().promotions.clone())
    }

    async fn apply_promotion(
        &self,
        request: &PromoApplyRequest,
    ) -> Result<PromoApplyResponse, RetailApiError> {
        self.check_available()?;
        let state = self.state.read().unwrap();
        let rejected = |message: String| RetailApiError::Rejected {
            status: 400,
            message,
            error_code: None,
        };

        let promo = state
            .promotions
            .iter()
            .find(|p| p.promo_id == request.promo_code && p.active)
            .ok_or_else(|| rejected("Invalid promo code".to_string()))?;

        if request.cart_total < promo.min_purchase {
            return Err(rejected(format!(
                "Minimum purchase of {} required",
                promo.min_purchase
            )));
        }

        if !promo.applicable_categories.is_empty()
            && !request
                .categories
                .iter()
                .any(|c| promo.applicable_categories.contains(c))
        {
            return Err(rejected(
                "Promo code does not apply to the items in your cart".to_string(),
            ));
        }

        Ok(PromoApplyResponse {
            valid: true,
            discount: promo.discount_for(request.cart_total),
            description: promo.description.clone(),
        })
    }

    async fn get_loyalty(&self, customer_id: &CustomerId) -> Result<LoyaltyInfo, RetailApiError> {
        self.check_available()?;
        let state = self.state.read().unwrap();
        let customer = state
            .customers
            .get(customer_id)
            .ok_or_else(|| RetailApiError::NotFound("Customer not found".to_string()))?;
        let tier = if customer.loyalty_tier.is_empty() {
            "Bronze".to_string()
        } else {
            customer.loyalty_tier.clone()
        };
        Ok(LoyaltyInfo {
            customer_id: customer_id.clone(),
            points: customer.loyalty_points,
            tier_benefits: state.tiers.get(&tier).cloned().unwrap_or_default(),
            tier,
        })
    }

    async fn redeem_points(
        &self,
        request: &RedeemRequest,
    ) -> Result<RedeemResponse, RetailApiError> {
        self.check_available()?;
        let mut state = self.state.write().unwrap();
        let customer = state
            .customers
            .get_mut(&request.customer_id)
            .ok_or_else(|| RetailApiError::NotFound("Customer not found".to_string()))?;

        if request.points > customer.loyalty_points {
            return Err(RetailApiError::Rejected {
                status: 400,
                message: "Insufficient loyalty points".to_string(),
                error_code: None,
            });
        }

        customer.loyalty_points -= request.points;
        Ok(RedeemResponse {
            points_redeemed: request.points,
            // 1 point = 1 rupee
            discount: Money::from_rupees(request.points),
            remaining_points: customer.loyalty_points,
        })
    }

    async fn create_order(
        &self,
        request: &OrderRequest,
    ) -> Result<OrderConfirmation, RetailApiError> {
        self.check_available()?;
        let mut state = self.state.write().unwrap();
        state.order_calls += 1;
        if state.fail_order_creation {
            return Err(RetailApiError::Unavailable(
                "order service timed out".to_string(),
            ));
        }

        state.next_order += 1;
        let order_id = format!("ORD{:06}", state.next_order);
        let tracking_number = format!("TRK{:06}", state.next_order);
        state.orders.insert(order_id.clone(), request.clone());

        Ok(OrderConfirmation {
            order_id,
            tracking_number,
            estimated_delivery: "3-5 business days".to_string(),
        })
    }

    async fn get_order(&self, order_id: &str) -> Result<OrderStatus, RetailApiError> {
        self.check_available()?;
        let state = self.state.read().unwrap();
        if !state.orders.contains_key(order_id) {
            return Err(RetailApiError::NotFound("Order not found".to_string()));
        }
        Ok(OrderStatus {
            order_id: order_id.to_string(),
            status: "Processing".to_string(),
            estimated_delivery: "3-5 business days".to_string(),
        })
    }
}

#[allow(clippy::too_many_arguments)]
fn product(
    sku: &str,
    name: &str,
    category: &str,
    subcategory: &str,
    price: i64,
    mrp: i64,
    colors: &[&str],
    occasion: &str,
    rating: f64,
) -> Product {
    let discount = ((mrp - price) * 100 / mrp) as u32;
    Product {
        sku: Sku::new(sku),
        name: name.to_string(),
        category: category.to_string(),
        subcategory: subcategory.to_string(),
        price: Money::from_rupees(price),
        mrp: Money::from_rupees(mrp),
        discount,
        description: format!("{name} from our {category} collection"),
        attributes: ProductAttributes {
            color: colors.iter().map(|c| c.to_string()).collect(),
            size: vec!["S".into(), "M".into(), "L".into(), "XL".into()],
            material: String::new(),
            occasion: occasion.to_string(),
        },
        rating,
        reviews: 120,
        image_url: format!("https://images.example.com/{sku}.jpg"),
    }
}

/// A small fashion catalog covering every category the recommender knows.
#[rustfmt::skip]
pub fn demo_catalog() -> Vec<Product> {
    vec![
        product("SKU0001", "Royal Blue Silk Saree", "Women's Ethnic", "Sarees", 2499, 3999, &["Blue", "Gold"], "Wedding, Festival", 4.6),
        product("SKU0002", "Red Anarkali Suit", "Women's Ethnic", "Anarkali", 1899, 2999, &["Red"], "Party, Festival", 4.4),
        product("SKU0003", "Floral Maxi Dress", "Women's Western", "Dresses", 1299, 1999, &["Pink", "White"], "Casual, Party", 4.5),
        product("SKU0004", "Slim Fit Formal Shirt", "Men's Formal", "Shirts", 999, 1499, &["White", "Blue"], "Office, Formal", 4.3),
        product("SKU0005", "Cotton Polo T-Shirt", "Men's Casual", "T-Shirts", 599, 899, &["Black", "Navy"], "Casual", 4.2),
        product("SKU0006", "Navy Wool Blazer", "Men's Formal", "Blazers", 3499, 4999, &["Navy"], "Office, Formal, Party", 4.7),
        product("SKU0007", "Silk Kurta Set", "Men's Ethnic", "Kurtas", 1799, 2499, &["Cream", "Gold"], "Wedding, Festival", 4.5),
        product("SKU0008", "Leather Analog Watch", "Accessories", "Watches", 1500, 2200, &["Brown"], "Formal, Casual", 4.4),
        product("SKU0009", "Chronograph Steel Watch", "Accessories", "Watches", 2500, 3500, &["Silver"], "Formal, Party", 4.6),
        product("SKU0010", "Tan Leather Loafers", "Footwear", "Loafers", 1999, 2999, &["Tan"], "Formal, Casual", 4.3),
        product("SKU0011", "Embroidered Clutch Bag", "Accessories", "Bags", 899, 1299, &["Gold"], "Party, Wedding", 4.1),
        product("SKU0012", "Kids Denim Jeans", "Kids", "Jeans", 699, 999, &["Blue"], "Casual", 4.0),
    ]
}

fn demo_stock(sku: &str) -> (BTreeMap<String, u32>, BTreeMap<String, u32>) {
    let (warehouse, mumbai, delhi) = match sku {
        // Sold out everywhere
        "SKU0011" => (0, 0, 0),
        // Online only
        "SKU0006" => (8, 0, 0),
        _ => (25, 3, 1),
    };
    (
        BTreeMap::from([
            ("Mumbai Warehouse".to_string(), warehouse),
            ("Delhi Warehouse".to_string(), 0),
        ]),
        BTreeMap::from([
            ("Phoenix Mall Mumbai".to_string(), mumbai),
            ("Select Citywalk Delhi".to_string(), delhi),
        ]),
    )
}

fn demo_customers() -> Vec<CustomerProfile> {
    vec![
        CustomerProfile {
            customer_id: CustomerId::new("CUST001"),
            name: "Priya Sharma".to_string(),
            loyalty_tier: "Gold".to_string(),
            loyalty_points: 2500,
            browsing_history: vec!["Women's Ethnic".to_string(), "Accessories".to_string()],
            purchase_history: vec![PurchaseRecord {
                category: "Women's Ethnic".to_string(),
            }],
            preferences: Preferences {
                favorite_colors: vec!["Blue".to_string(), "Red".to_string()],
                budget_range: Some("1000-5000".to_string()),
            },
        },
        CustomerProfile {
            customer_id: CustomerId::new("CUST002"),
            name: "Rahul Verma".to_string(),
            loyalty_tier: "Silver".to_string(),
            loyalty_points: 800,
            browsing_history: vec!["Men's Formal".to_string()],
            purchase_history: vec![PurchaseRecord {
                category: "Men's Casual".to_string(),
            }],
            preferences: Preferences {
                favorite_colors: vec!["Navy".to_string(), "White".to_string()],
                budget_range: Some("500-4000".to_string()),
            },
        },
    ]
}

fn demo_promotions() -> Vec<Promotion> {
    vec![
        Promotion {
            promo_id: "FESTIVE20".to_string(),
            description: "20% off ethnic wear above ₹3000".to_string(),
            kind: PromotionKind::Percentage,
            value: 20.0,
            active: true,
            min_purchase: Money::from_rupees(3000),
            applicable_categories: vec!["Women's Ethnic".to_string(), "Men's Ethnic".to_string()],
            min_items: 0,
        },
        Promotion {
            promo_id: "FLAT200".to_string(),
            description: "₹200 off when you buy 2 or more items".to_string(),
            kind: PromotionKind::Flat,
            value: 200.0,
            active: true,
            min_purchase: Money::from_rupees(1500),
            applicable_categories: vec![],
            min_items: 2,
        },
        Promotion {
            promo_id: "SUMMER15".to_string(),
            description: "15% off summer styles".to_string(),
            kind: PromotionKind::Percentage,
            value: 15.0,
            active: false,
            min_purchase: Money::zero(),
            applicable_categories: vec![],
            min_items: 0,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn demo_data_is_consistent() {
        let api = InMemoryRetailApi::demo();
        let products = api.list_products().await.unwrap();
        assert_eq!(products.len(), 12);
        for product in &products {
            let record = api.get_inventory(&product.sku).await.unwrap();
            assert_eq!(record.name, product.name);
        }
        assert_eq!(api.inventory_calls(), 12);
    }

    #[tokio::test]
    async fn unknown_product_is_not_found() {
        let api = InMemoryRetailApi::demo();
        let result = api.get_product(&Sku::new("SKU9999")).await;
        assert!(matches!(result, Err(RetailApiError::NotFound(_))));
    }

    #[tokio::test]
    async fn declined_payment_carries_error_code() {
        let api = InMemoryRetailApi::demo();
        api.set_decline_payments(true);
        let charge = PaymentCharge {
            amount: Money::from_rupees(100),
            method: "card".to_string(),
            card_number: None,
        };

        let result = api.process_payment(&charge).await;
        assert!(matches!(
            result,
            Err(RetailApiError::Rejected { error_code: Some(ref code), .. }) if code == "DECLINED"
        ));
        assert_eq!(api.payment_calls(), 1);
    }

    #[tokio::test]
    async fn redeem_deducts_balance_and_rejects_overdraw() {
        let api = InMemoryRetailApi::demo();
        let customer_id = CustomerId::new("CUST002");

        let response = api
            .redeem_points(&RedeemRequest {
                customer_id: customer_id.clone(),
                points: 300,
            })
            .await
            .unwrap();
        assert_eq!(response.discount, Money::from_rupees(300));
        assert_eq!(response.remaining_points, 500);

        let result = api
            .redeem_points(&RedeemRequest {
                customer_id: customer_id.clone(),
                points: 501,
            })
            .await;
        assert!(matches!(result, Err(RetailApiError::Rejected { .. })));
        assert_eq!(api.loyalty_points(&customer_id), Some(500));
    }

    #[tokio::test]
    async fn promo_code_checks_minimum_and_categories() {
        let api = InMemoryRetailApi::demo();
        let ethnic = vec!["Women's Ethnic".to_string()];

        let too_small = api
            .apply_promotion(&PromoApplyRequest {
                promo_code: "FESTIVE20".to_string(),
                cart_total: Money::from_rupees(2499),
                categories: ethnic.clone(),
            })
            .await;
        assert!(matches!(too_small, Err(RetailApiError::Rejected { .. })));

        let wrong_category = api
            .apply_promotion(&PromoApplyRequest {
                promo_code: "FESTIVE20".to_string(),
                cart_total: Money::from_rupees(4000),
                categories: vec!["Footwear".to_string()],
            })
            .await;
        assert!(matches!(wrong_category, Err(RetailApiError::Rejected { .. })));

        let applied = api
            .apply_promotion(&PromoApplyRequest {
                promo_code: "FESTIVE20".to_string(),
                cart_total: Money::from_rupees(4000),
                categories: ethnic,
            })
            .await
            .unwrap();
        assert_eq!(applied.discount, Money::from_rupees(800));
    }

    #[tokio::test]
    async fn orders_get_sequential_ids() {
        let api = InMemoryRetailApi::demo();
        let request = OrderRequest {
            customer_id: CustomerId::new("CUST001"),
            items: vec![],
            fulfillment_type: "ship_to_home".to_string(),
            delivery_address: None,
            store_location: None,
        };

        let first = api.create_order(&request).await.unwrap();
        let second = api.create_order(&request).await.unwrap();
        assert_eq!(first.order_id, "ORD000001");
        assert_eq!(second.tracking_number, "TRK000002");
        assert_eq!(api.get_order("ORD000001").await.unwrap().status, "Processing");
    }

    #[tokio::test]
    async fn outage_fails_every_call() {
        let api = InMemoryRetailApi::demo();
        api.set_unavailable(true);
        assert!(matches!(
            api.list_products().await,
            Err(RetailApiError::Unavailable(_))
        ));
        assert!(matches!(
            api.get_loyalty(&CustomerId::new("CUST001")).await,
            Err(RetailApiError::Unavailable(_))
        ));
    }
}
