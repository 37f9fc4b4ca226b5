//! The sales orchestrator: routes each message to an intent handler and
//! coordinates the capabilities it needs.

use std::collections::BTreeMap;
use std::fmt::Write;
use std::sync::LazyLock;

use capabilities::assistant::CAPABILITIES_MENU;
use capabilities::recommendation::dictionary_keywords;
use capabilities::{
    Capabilities, Capability, CapabilityError, DiscoveryReply, FulfillmentRequest,
    InventoryRequest, LoyaltyRequest, PaymentOutcome, PaymentRequest, RecommendationRequest,
    RecommendationSet, Redemption, RetailApiError, SupportRequest, SupportRequestType,
};
use domain::{CartItem, Intent, Money, Product, Session, Sku, Stage, delivery_charge};
use regex::Regex;

use crate::error::{Result, ServiceError};
use crate::intent::IntentClassifier;
use crate::matching::ProductQuery;
use crate::response::{AgentResponse, CheckoutOptions, PromoApplication, ResponseDetail};

/// Session context key holding a captured payment that has no order.
pub const PENDING_RECONCILIATION: &str = "pending_reconciliation";

/// Earlier user messages folded into a discovery request.
const DISCOVERY_HISTORY: usize = 3;

static ORDER_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bORD\d+\b").expect("order id pattern is valid"));

const NO_PRODUCTS: &str =
    "I couldn't find any products matching your request. Could you be more specific?";
const NO_RECOMMENDATIONS: &str = "I'm having trouble finding recommendations. Could you tell me more about what you're looking for?";
const ALL_OUT_OF_STOCK: &str = "Sorry, everything matching your request is currently out of stock. Would you like to see similar products?";
const PRODUCT_NOT_FOUND: &str =
    "I couldn't find that product. Could you describe what you're looking for?";
const EMPTY_CART: &str = "Your cart is empty. Let me help you find something!";
const INVALID_PROMO: &str = "Invalid promo code. Would you like to see available offers?";

fn occasion_for(message: &str) -> Option<String> {
    let text = message.to_lowercase();
    if text.contains("party") || text.contains("wedding") {
        Some("party".to_string())
    } else if text.contains("office") || text.contains("formal") {
        Some("formal".to_string())
    } else {
        None
    }
}

/// An `ORD<digits>` token in the message, upper-cased.
fn order_id_in(message: &str) -> Option<String> {
    ORDER_ID
        .find(message)
        .map(|m| m.as_str().to_uppercase())
}

/// Coordinates the capabilities behind one conversation turn.
///
/// The orchestrator holds no session state of its own: every handler takes
/// the session it works on, and the caller decides when to persist it.
#[derive(Clone)]
pub struct SalesOrchestrator {
    caps: Capabilities,
    classifier: IntentClassifier,
}

impl SalesOrchestrator {
    pub fn new(caps: Capabilities) -> Self {
        let classifier = IntentClassifier::new(caps.assistant.clone());
        Self { caps, classifier }
    }

    pub fn capabilities(&self) -> &Capabilities {
        &self.caps
    }

    /// Greeting for a new session, followed by what the assistant can do.
    #[tracing::instrument(skip(self, session), fields(customer_id = %session.customer_id))]
    pub async fn greet(&self, session: &Session) -> String {
        let profile = match self.caps.api.get_customer(&session.customer_id).await {
            Ok(profile) => Some(profile),
            Err(RetailApiError::NotFound(_)) => None,
            Err(e) => {
                tracing::warn!(error = %e, "could not fetch customer for greeting");
                None
            }
        };

        let greeting = self
            .caps
            .assistant
            .greeting(profile.as_ref(), &session.channel)
            .await;
        format!("{greeting}{CAPABILITIES_MENU}")
    }

    /// Handles one user message: records it, classifies it, runs the
    /// matching handler and records the reply.
    #[tracing::instrument(skip(self, session, message), fields(session_id = %session.session_id))]
    pub async fn handle(&self, session: &mut Session, message: &str) -> Result<AgentResponse> {
        session.record_user_turn(message);

        let intent = self.classifier.classify(message).await;
        tracing::info!(%intent, "message classified");
        metrics::counter!("conversation_turns_total", "intent" => intent.as_str()).increment(1);

        let response = match intent {
            Intent::ProductDiscovery => self.discover(session, message).await?,
            Intent::AddToCart => self.add_to_cart(session, message).await?,
            Intent::Checkout => self.checkout(session, &CheckoutOptions::default()).await?,
            Intent::ApplyOffer => self.apply_offer(session, message).await?,
            Intent::PostPurchase => self.post_purchase(session, message).await?,
            Intent::General => self.general(message).await,
        };

        session.record_agent_turn(response.message.clone());
        Ok(response)
    }

    async fn recommend(&self, session: &Session, context: String) -> Result<RecommendationSet> {
        let request = RecommendationRequest {
            customer_id: session.customer_id.clone(),
            occasion: occasion_for(&context),
            context,
            budget: None,
        };
        Ok(self.caps.recommendation.execute(request).await?)
    }

    fn inventory_request(&self, session: &Session, sku: Sku, quantity: u32) -> InventoryRequest {
        InventoryRequest::new(sku, quantity)
            .with_customer_location(session.context_str("location").map(str::to_string))
    }

    /// Keeps the products that are in stock. A failed lookup counts as in
    /// stock so a flaky inventory service does not empty the results.
    async fn in_stock(&self, session: &Session, products: Vec<Product>) -> Vec<Product> {
        let mut available = Vec::with_capacity(products.len());
        for product in products {
            let request = self.inventory_request(session, product.sku.clone(), 1);
            match self.caps.inventory.check(request).await {
                Ok(report) if !report.availability.is_available() => {
                    tracing::debug!(sku = %product.sku, "dropping out-of-stock product");
                }
                Ok(_) => available.push(product),
                Err(e) => {
                    tracing::warn!(sku = %product.sku, error = %e, "inventory check failed, treating as available");
                    available.push(product);
                }
            }
        }
        available
    }

    /// Recommends products for the message, filtered to what is in stock.
    #[tracing::instrument(skip(self, session, message))]
    pub async fn discover(&self, session: &mut Session, message: &str) -> Result<AgentResponse> {
        let mut context = message.to_string();
        if dictionary_keywords(message).is_empty() {
            let earlier = session.previous_user_messages(DISCOVERY_HISTORY);
            if !earlier.is_empty() {
                context = format!("{message} {}", earlier.join(" "));
            }
        }

        let set = match self.recommend(session, context).await {
            Ok(set) => set,
            Err(e) => {
                tracing::warn!(error = %e, "recommendation failed");
                return Ok(AgentResponse::failure(
                    Intent::ProductDiscovery,
                    NO_RECOMMENDATIONS,
                ));
            }
        };

        if set.recommendations.is_empty() {
            return Ok(AgentResponse::failure(Intent::ProductDiscovery, NO_PRODUCTS));
        }

        let available = self.in_stock(session, set.recommendations).await;
        if available.is_empty() {
            return Ok(AgentResponse::failure(
                Intent::ProductDiscovery,
                ALL_OUT_OF_STOCK,
            ));
        }

        let reply = self
            .caps
            .assistant
            .discovery_reply(DiscoveryReply {
                user_message: message,
                intro: &set.personalized_message,
                products: &available,
                complementary: &set.complementary_items,
            })
            .await;

        tracing::info!(count = available.len(), "recommendations ready");
        session.stage = Stage::Browsing;
        session.recommendations = available.clone();

        Ok(AgentResponse::success(
            Intent::ProductDiscovery,
            reply,
            ResponseDetail::Recommendations {
                recommendations: available,
                complementary_items: set.complementary_items,
            },
        ))
    }

    /// Finds the product the message refers to and adds one unit of it.
    #[tracing::instrument(skip(self, session, message))]
    pub async fn add_to_cart(&self, session: &mut Session, message: &str) -> Result<AgentResponse> {
        let query = ProductQuery::parse(message);
        if query.is_empty() {
            tracing::info!("nothing specific requested, showing recommendations");
            return self.discover(session, message).await;
        }

        if session.recommendations.is_empty() {
            match self.recommend(session, message.to_string()).await {
                Ok(set) => session.recommendations = set.recommendations,
                Err(e) => {
                    tracing::warn!(error = %e, "recommendation failed");
                    return Ok(AgentResponse::failure(Intent::AddToCart, NO_PRODUCTS));
                }
            }
        }

        let catalog = self.caps.api.list_products().await.unwrap_or_else(|e| {
            tracing::warn!(error = %e, "could not fetch catalog, matching recommendations only");
            Vec::new()
        });

        let Some(product) = query.resolve(&catalog, &session.recommendations) else {
            return Ok(AgentResponse::failure(Intent::AddToCart, PRODUCT_NOT_FOUND));
        };

        let request = self.inventory_request(session, product.sku.clone(), 1);
        let report = match self.caps.inventory.check(request).await {
            Ok(report) if report.availability.is_available() => report,
            Ok(_) => return Ok(out_of_stock(&product)),
            Err(e) => {
                tracing::warn!(sku = %product.sku, error = %e, "inventory check failed");
                return Ok(out_of_stock(&product));
            }
        };

        session.add_to_cart(CartItem::new(product.clone(), 1)?);
        session.stage = Stage::Cart;
        let cart_total = session.cart_total();
        tracing::info!(sku = %product.sku, %cart_total, "added to cart");

        let mut text = format!(
            "Great choice! I've added **{}** to your cart.\n\n**Availability Options:**\n",
            product.name
        );
        for option in report.availability.options.iter().take(2) {
            let _ = writeln!(text, "✓ {}", option.message);
        }
        let _ = write!(
            text,
            "\n**Cart Total:** {cart_total}\n\nWould you like to:\n1. Continue shopping\n2. Proceed to checkout\n3. Apply promo code"
        );

        Ok(AgentResponse::success(
            Intent::AddToCart,
            text,
            ResponseDetail::CartUpdated {
                product,
                cart: session.cart.clone(),
                cart_total,
                inventory: Some(report),
            },
        ))
    }

    /// Adds `quantity` units of a known SKU.
    ///
    /// Unknown SKUs are `NotFound`; insufficient stock is a business-rule
    /// rejection.
    #[tracing::instrument(skip(self, session, sku), fields(sku = %sku))]
    pub async fn add_item(
        &self,
        session: &mut Session,
        sku: &Sku,
        quantity: u32,
    ) -> Result<AgentResponse> {
        if quantity == 0 {
            return Err(ServiceError::Validation(
                "quantity must be greater than 0".to_string(),
            ));
        }

        let product = match self.caps.api.get_product(sku).await {
            Ok(product) => product,
            Err(RetailApiError::NotFound(_)) => {
                return Err(CapabilityError::NotFound("Product not found".to_string()).into());
            }
            Err(e) => {
                return Err(
                    CapabilityError::Unavailable(format!("Failed to fetch product: {e}")).into(),
                );
            }
        };

        let request = self.inventory_request(session, sku.clone(), quantity);
        let in_stock = match self.caps.inventory.check(request).await {
            Ok(report) => report.availability.is_available(),
            Err(e) => {
                tracing::warn!(error = %e, "inventory check failed");
                false
            }
        };
        if !in_stock {
            return Err(CapabilityError::Rejected {
                message: format!("Sorry, {} is currently out of stock.", product.name),
                error_code: Some("OUT_OF_STOCK".to_string()),
            }
            .into());
        }

        session.add_to_cart(CartItem::new(product.clone(), quantity)?);
        session.stage = Stage::Cart;
        let cart_total = session.cart_total();

        Ok(AgentResponse::success(
            Intent::AddToCart,
            format!("Added {} to your cart.", product.name),
            ResponseDetail::CartUpdated {
                product,
                cart: session.cart.clone(),
                cart_total,
                inventory: None,
            },
        ))
    }

    /// Discounts, then payment, then the order.
    ///
    /// Nothing left to pay after discounts and redeemed points places the
    /// order without a payment. The cart is cleared only once an order exists. A payment failure
    /// keeps the cart for a retry. A captured payment without an order is
    /// recorded in the session context for manual reconciliation and is
    /// never reported as success.
    #[tracing::instrument(skip(self, session, options), fields(session_id = %session.session_id))]
    pub async fn checkout(
        &self,
        session: &mut Session,
        options: &CheckoutOptions,
    ) -> Result<AgentResponse> {
        if session.cart.is_empty() {
            return Ok(AgentResponse::failure(Intent::Checkout, EMPTY_CART));
        }

        if let Some(pending) = session.context.get(PENDING_RECONCILIATION) {
            let transaction_id = pending["transaction_id"].as_str().unwrap_or("unknown");
            return Ok(AgentResponse::failure(
                Intent::Checkout,
                format!(
                    "Your earlier payment ({transaction_id}) is still being reconciled. Our team will contact you shortly."
                ),
            ));
        }

        let store_location = options
            .store_location
            .clone()
            .or_else(|| session.context_str("location").map(str::to_string));
        if options.fulfillment_type.needs_store() && store_location.is_none() {
            return Err(ServiceError::Validation(format!(
                "A store location is required for {}",
                options.fulfillment_type.as_str()
            )));
        }

        metrics::counter!("checkout_total").increment(1);
        tracing::info!(step = "loyalty", "checkout step");

        let subtotal = session.cart_total();
        let loyalty = self
            .caps
            .loyalty
            .execute(LoyaltyRequest {
                customer_id: session.customer_id.clone(),
                cart_total: subtotal,
                cart_items: session.cart.clone(),
                promo_code: session.cart_context.promo_code.clone(),
            })
            .await?;
        if let Some(error) = &loyalty.promo_error {
            tracing::warn!(%error, "stored promo code no longer applies");
        }

        let delivery = delivery_charge(subtotal);
        let amount =
            (loyalty.final_total - session.cart_context.redeemed_discount + delivery).non_negative();
        let savings = (subtotal + delivery - amount).non_negative();

        let approval = if amount.is_zero() {
            tracing::info!("nothing left to pay, skipping payment");
            None
        } else {
            tracing::info!(step = "payment", %amount, "checkout step");
            let request = PaymentRequest::new(amount, options.payment_method);
            Some(self.caps.payment.execute(request).await?)
        };
        let approval = match approval {
            None => None,
            Some(PaymentOutcome::Approved(approval)) => Some(approval),
            Some(PaymentOutcome::Failed(failure)) => {
                metrics::counter!("checkout_payment_failed").increment(1);
                tracing::info!(error = %failure.error, "payment failed, cart kept");
                let message = format!(
                    "⚠️ Payment failed: {}\n\nWould you like to:\n1. Try another payment method\n2. Retry payment",
                    failure.error
                );
                return Ok(AgentResponse::failure(Intent::Checkout, message).with_detail(
                    ResponseDetail::PaymentFailed {
                        payment_error: failure,
                    },
                ));
            }
        };

        let transaction_id = approval.as_ref().map(|a| a.transaction_id.as_str());
        tracing::info!(step = "fulfillment", ?transaction_id, "checkout step");
        let request = FulfillmentRequest {
            customer_id: session.customer_id.clone(),
            items: session.cart.clone(),
            fulfillment_type: options.fulfillment_type,
            delivery_address: options.delivery_address.clone(),
            store_location: store_location.clone(),
        };
        let order = match self.caps.fulfillment.execute(request).await {
            Ok(order) => order,
            Err(e) => {
                return match transaction_id {
                    Some(transaction_id) => {
                        Ok(self.flag_for_reconciliation(session, transaction_id, amount, e))
                    }
                    None => Err(e.into()),
                };
            }
        };

        let store_notification = match (&store_location, options.fulfillment_type.needs_store()) {
            (Some(store), true) => Some(self.caps.fulfillment.notify_store(
                store,
                &order.order_id,
                &session.cart,
            )),
            _ => None,
        };

        let mut text = format!("🎉 **Order Confirmed!**\n\n**Order ID:** {}\n", order.order_id);
        if let Some(transaction_id) = transaction_id {
            let _ = writeln!(text, "**Transaction ID:** {transaction_id}");
        }
        let _ = write!(text, "\n**Order Summary:**\n- Subtotal: {subtotal}\n");
        if savings.is_positive() {
            let _ = writeln!(text, "- Savings: -{savings} 🎁");
        }
        let _ = write!(text, "- **Total Paid:** {amount}\n\n");
        if let Some(points) = loyalty.points_to_earn.filter(|p| *p > 0) {
            let _ = write!(text, "✨ You've earned {points} loyalty points!\n\n");
        }
        let _ = write!(
            text,
            "**Delivery:** {}\n**Tracking:** {}\n\nThank you for shopping with us! 🛍️",
            order.estimated_delivery, order.tracking_number
        );

        session.last_order_id = Some(order.order_id.clone());
        session.clear_cart();
        session.stage = Stage::Completed;

        metrics::counter!("checkout_completed").increment(1);
        tracing::info!(order_id = %order.order_id, "checkout completed");

        Ok(AgentResponse::success(
            Intent::Checkout,
            text,
            ResponseDetail::OrderPlaced {
                order,
                payment: approval,
                subtotal,
                savings,
                amount_paid: amount,
                points_earned: loyalty.points_to_earn,
                store_notification,
            },
        ))
    }

    fn flag_for_reconciliation(
        &self,
        session: &mut Session,
        transaction_id: &str,
        amount: Money,
        error: CapabilityError,
    ) -> AgentResponse {
        metrics::counter!("checkout_reconciliation_needed").increment(1);
        tracing::error!(
            session_id = %session.session_id,
            transaction_id,
            %amount,
            error = %error,
            "payment captured but order creation failed, needs reconciliation"
        );

        session.context.insert(
            PENDING_RECONCILIATION.to_string(),
            serde_json::json!({
                "transaction_id": transaction_id,
                "amount": amount,
                "error": error.to_string(),
            }),
        );

        let message = format!(
            "⚠️ We received your payment of {amount} (transaction {transaction_id}) but could not confirm your order.\n\nOur team has been notified and will sort it out shortly. Your cart has been kept and you will not be charged again."
        );
        AgentResponse::failure(Intent::Checkout, message).with_detail(
            ResponseDetail::ReconciliationNeeded {
                transaction_id: transaction_id.to_string(),
                amount,
                error: error.to_string(),
            },
        )
    }

    /// Validates a promo code against the cart and stores it on success.
    #[tracing::instrument(skip(self, session))]
    pub async fn apply_promo(&self, session: &mut Session, code: &str) -> Result<PromoApplication> {
        let code = code.trim().to_uppercase();
        let cart_total = session.cart_total();

        let outcome = self
            .caps
            .loyalty
            .execute(LoyaltyRequest {
                customer_id: session.customer_id.clone(),
                cart_total,
                cart_items: session.cart.clone(),
                promo_code: Some(code.clone()),
            })
            .await?;

        let Some(discount) = outcome.promo_discount().map(|d| d.amount) else {
            return Ok(PromoApplication {
                success: false,
                promo_code: code,
                cart_total,
                discount: Money::zero(),
                final_total: cart_total,
                error: Some(
                    outcome
                        .promo_error
                        .unwrap_or_else(|| "Invalid promo code".to_string()),
                ),
            });
        };

        session.cart_context.promo_code = Some(code.clone());
        session.cart_context.promo_discount = discount;
        tracing::info!(%discount, "promo code stored");

        Ok(PromoApplication {
            success: true,
            promo_code: code,
            cart_total,
            discount,
            final_total: (cart_total - discount).non_negative(),
            error: None,
        })
    }

    /// Chat flavour of [`Self::apply_promo`]. The code is the last word of
    /// the message.
    pub async fn apply_offer(&self, session: &mut Session, message: &str) -> Result<AgentResponse> {
        let code = message.split_whitespace().last().unwrap_or_default();
        let promo = self.apply_promo(session, code).await?;

        if !promo.success {
            return Ok(AgentResponse::failure(Intent::ApplyOffer, INVALID_PROMO)
                .with_detail(ResponseDetail::PromoApplied { promo }));
        }

        let text = format!(
            "✅ Promo code **{}** applied!\n\nYou saved {}! 🎉\nNew total: {}",
            promo.promo_code, promo.discount, promo.final_total
        );
        Ok(AgentResponse::success(
            Intent::ApplyOffer,
            text,
            ResponseDetail::PromoApplied { promo },
        ))
    }

    /// Redeems loyalty points against the cart.
    #[tracing::instrument(skip(self, session))]
    pub async fn redeem_points(&self, session: &mut Session, points: i64) -> Result<Redemption> {
        let redemption = self
            .caps
            .loyalty
            .redeem_points(&session.customer_id, points)
            .await?;

        session.cart_context.redeemed_points += redemption.points_redeemed;
        session.cart_context.redeemed_discount =
            session.cart_context.redeemed_discount + redemption.discount;
        Ok(redemption)
    }

    /// Returns, exchanges, tracking and feedback.
    #[tracing::instrument(skip(self, session, message))]
    pub async fn post_purchase(&self, session: &Session, message: &str) -> Result<AgentResponse> {
        let request_type = SupportRequestType::from_message(message);
        let order_id = order_id_in(message).or_else(|| session.last_order_id.clone());

        let mut request = SupportRequest::new(request_type, order_id);
        if request_type == SupportRequestType::Feedback {
            request.comments = Some(message.to_string());
        }

        let support = self.caps.post_purchase.execute(request).await?;
        let text = serde_json::to_string_pretty(&support).unwrap_or_else(|_| support.message());

        Ok(AgentResponse::success(
            Intent::PostPurchase,
            text,
            ResponseDetail::Support { support },
        ))
    }

    pub async fn general(&self, message: &str) -> AgentResponse {
        let answer = self.caps.assistant.answer_query(message).await;
        AgentResponse::success(Intent::General, answer, ResponseDetail::Message)
    }

    /// Moves the conversation to another channel, keeping cart and history.
    pub fn switch_channel(
        &self,
        session: &mut Session,
        channel: &str,
        context: BTreeMap<String, serde_json::Value>,
    ) -> AgentResponse {
        let previous = session.channel.clone();
        session.switch_channel(channel, context);
        tracing::info!(from = %previous, to = channel, "channel switched");

        let mut text = format!("Continuing our conversation on {channel}. ");
        if !session.cart.is_empty() {
            let _ = write!(text, "I see you have {} items in your cart. ", session.cart.len());
        }
        text.push_str("How can I help you?");

        AgentResponse::success(
            Intent::General,
            text,
            ResponseDetail::ChannelSwitched {
                channel: channel.to_string(),
                cart_items: session.cart.len(),
            },
        )
    }
}

fn out_of_stock(product: &Product) -> AgentResponse {
    AgentResponse::failure(
        Intent::AddToCart,
        format!(
            "Sorry, **{}** is currently out of stock. Would you like to see similar products?",
            product.name
        ),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn occasion_overrides() {
        assert_eq!(occasion_for("something for a wedding").as_deref(), Some("party"));
        assert_eq!(occasion_for("office wear").as_deref(), Some("formal"));
        assert_eq!(occasion_for("Formal party outfit").as_deref(), Some("party"));
        assert_eq!(occasion_for("a blue saree"), None);
    }

    #[test]
    fn order_id_is_taken_from_message() {
        assert_eq!(
            order_id_in("please return ord000042, it doesn't fit").as_deref(),
            Some("ORD000042")
        );
        assert_eq!(order_id_in("return my last order"), None);
        assert_eq!(order_id_in("RECORD123"), None);
    }
}
