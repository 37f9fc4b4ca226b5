//! Session and conversation endpoints.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use capabilities::Capabilities;
use common::SessionId;
use domain::{CustomerId, Session, Sku};
use orchestrator::{
    AgentResponse, CartView, CheckoutOptions, ConversationService, PointsRedeemed,
    PromoApplication, SalesOrchestrator, SessionStarted,
};
use serde::Deserialize;
use session_store::SessionStore;

use crate::error::ApiError;

/// Shared application state accessible from all handlers.
pub struct AppState<S: SessionStore> {
    pub service: ConversationService<S>,
}

impl<S: SessionStore> AppState<S> {
    pub fn new(store: S, capabilities: Capabilities) -> Self {
        Self {
            service: ConversationService::new(store, SalesOrchestrator::new(capabilities)),
        }
    }

    pub fn capabilities(&self) -> &Capabilities {
        self.service.orchestrator().capabilities()
    }
}

// -- Request types --

#[derive(Deserialize)]
pub struct StartSessionRequest {
    pub customer_id: String,
    #[serde(default = "default_channel")]
    pub channel: String,
    #[serde(default)]
    pub context: BTreeMap<String, serde_json::Value>,
}

fn default_channel() -> String {
    "web".to_string()
}

#[derive(Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

#[derive(Deserialize)]
pub struct AddItemRequest {
    pub sku: String,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
}

fn default_quantity() -> u32 {
    1
}

#[derive(Deserialize)]
pub struct PromoRequest {
    pub promo_code: String,
}

#[derive(Deserialize)]
pub struct RedeemRequest {
    pub points: i64,
}

#[derive(Deserialize)]
pub struct SwitchChannelRequest {
    pub channel: String,
    #[serde(default)]
    pub context: BTreeMap<String, serde_json::Value>,
}

/// An agent reply. A payment taken without an order is a 502 so clients
/// cannot mistake it for a plain decline.
type AgentReply = (StatusCode, Json<AgentResponse>);

fn agent_reply(response: AgentResponse) -> AgentReply {
    let status = if response.requires_reconciliation() {
        StatusCode::BAD_GATEWAY
    } else {
        StatusCode::OK
    };
    (status, Json(response))
}

// -- Handlers --

/// POST /sessions: start a conversation and greet the customer.
#[tracing::instrument(skip(state, req), fields(customer_id = %req.customer_id))]
pub async fn create<S: SessionStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Json(req): Json<StartSessionRequest>,
) -> Result<(StatusCode, Json<SessionStarted>), ApiError> {
    if req.customer_id.trim().is_empty() {
        return Err(ApiError::BadRequest("customer_id is required".to_string()));
    }

    let started = state
        .service
        .start_session(CustomerId::new(req.customer_id), &req.channel, req.context)
        .await?;
    metrics::counter!("sessions_started_total", "channel" => req.channel).increment(1);

    Ok((StatusCode::CREATED, Json(started)))
}

/// GET /sessions/{id}: the full session state.
#[tracing::instrument(skip(state))]
pub async fn get<S: SessionStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<Session>, ApiError> {
    let session_id = parse_session_id(&id)?;
    Ok(Json(state.service.session(session_id).await?))
}

/// GET /customers/{id}/sessions: every session of a customer.
#[tracing::instrument(skip(state))]
pub async fn list_for_customer<S: SessionStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(customer_id): Path<String>,
) -> Result<Json<Vec<Session>>, ApiError> {
    let sessions = state
        .service
        .customer_sessions(&CustomerId::new(customer_id))
        .await?;
    Ok(Json(sessions))
}

/// POST /sessions/{id}/chat: one conversation turn.
#[tracing::instrument(skip(state, req))]
pub async fn chat<S: SessionStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
    Json(req): Json<ChatRequest>,
) -> Result<AgentReply, ApiError> {
    let session_id = parse_session_id(&id)?;
    if req.message.trim().is_empty() {
        return Err(ApiError::BadRequest("message is required".to_string()));
    }

    let response = state.service.chat(session_id, &req.message).await?;
    Ok(agent_reply(response))
}

/// GET /sessions/{id}/cart: items and priced totals.
#[tracing::instrument(skip(state))]
pub async fn cart<S: SessionStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<CartView>, ApiError> {
    let session_id = parse_session_id(&id)?;
    Ok(Json(state.service.cart(session_id).await?))
}

/// POST /sessions/{id}/cart/items: add a product by SKU.
#[tracing::instrument(skip(state, req))]
pub async fn add_item<S: SessionStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
    Json(req): Json<AddItemRequest>,
) -> Result<Json<AgentResponse>, ApiError> {
    let session_id = parse_session_id(&id)?;
    let response = state
        .service
        .add_item(session_id, Sku::new(req.sku), req.quantity)
        .await?;
    Ok(Json(response))
}

/// POST /sessions/{id}/promo: validate and store a promo code.
#[tracing::instrument(skip(state, req))]
pub async fn apply_promo<S: SessionStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
    Json(req): Json<PromoRequest>,
) -> Result<Json<PromoApplication>, ApiError> {
    let session_id = parse_session_id(&id)?;
    Ok(Json(
        state.service.apply_promo(session_id, &req.promo_code).await?,
    ))
}

/// POST /sessions/{id}/redeem: redeem loyalty points against the cart.
#[tracing::instrument(skip(state, req))]
pub async fn redeem<S: SessionStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
    Json(req): Json<RedeemRequest>,
) -> Result<Json<PointsRedeemed>, ApiError> {
    let session_id = parse_session_id(&id)?;
    Ok(Json(
        state.service.redeem_points(session_id, req.points).await?,
    ))
}

/// POST /sessions/{id}/checkout: pay for the cart and place the order.
#[tracing::instrument(skip(state, options))]
pub async fn checkout<S: SessionStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
    Json(options): Json<CheckoutOptions>,
) -> Result<AgentReply, ApiError> {
    let session_id = parse_session_id(&id)?;
    let response = state.service.checkout(session_id, options).await?;
    Ok(agent_reply(response))
}

/// POST /sessions/{id}/channel: continue the conversation elsewhere.
#[tracing::instrument(skip(state, req))]
pub async fn switch_channel<S: SessionStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
    Json(req): Json<SwitchChannelRequest>,
) -> Result<Json<AgentResponse>, ApiError> {
    let session_id = parse_session_id(&id)?;
    if req.channel.trim().is_empty() {
        return Err(ApiError::BadRequest("channel is required".to_string()));
    }

    let response = state
        .service
        .switch_channel(session_id, &req.channel, req.context)
        .await?;
    Ok(Json(response))
}

fn parse_session_id(id: &str) -> Result<SessionId, ApiError> {
    SessionId::parse(id).map_err(|e| ApiError::BadRequest(format!("Invalid session ID: {e}")))
}
