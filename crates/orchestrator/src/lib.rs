//! Conversation orchestration for the sales assistant.
//!
//! A chat turn flows through three layers:
//! 1. [`ConversationService`] loads the session and saves it back with a
//!    revision check
//! 2. [`SalesOrchestrator`] classifies the message and runs the handler
//!    for its intent
//! 3. The handlers call the worker capabilities and build an
//!    [`AgentResponse`]
//!
//! [`matching`] resolves free-text product references ("the blue shirt for
//! men") to a catalog product.

pub mod error;
pub mod intent;
pub mod matching;
pub mod orchestrator;
pub mod response;
pub mod service;

pub use error::{Result, ServiceError};
pub use intent::{IntentClassifier, classify_by_rules};
pub use matching::{Demographics, ProductQuery, ProductType};
pub use orchestrator::{PENDING_RECONCILIATION, SalesOrchestrator};
pub use response::{AgentResponse, CartView, CheckoutOptions, PromoApplication, ResponseDetail};
pub use service::{ConversationService, PointsRedeemed, SessionStarted};
