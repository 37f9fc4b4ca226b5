//! Domain model for the shopping conversation.
//!
//! This crate holds the plain data the orchestrator works with:
//! - Value objects (`Money`, `Sku`, `CustomerId`)
//! - Catalog and customer reference data (`Product`, `CustomerProfile`)
//! - The per-conversation `Session` with its cart, stage and history
//! - The closed set of user `Intent`s
//! - `CartSummary` with the delivery rule

pub mod cart;
pub mod customer;
pub mod error;
pub mod intent;
pub mod product;
pub mod session;
pub mod value_objects;

pub use cart::{CartSummary, DELIVERY_FEE_RUPEES, FREE_DELIVERY_ABOVE_RUPEES, delivery_charge};
pub use common::SessionId;
pub use customer::{BudgetRange, CustomerProfile, Preferences, PurchaseRecord};
pub use error::DomainError;
pub use intent::Intent;
pub use product::{CartItem, Product, ProductAttributes};
pub use session::{CartContext, ConversationTurn, Role, Session, Stage};
pub use value_objects::{CustomerId, Money, Sku};
