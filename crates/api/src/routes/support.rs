//! Reference data and order tracking, independent of any session.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use capabilities::payment::PaymentMethodInfo;
use capabilities::{OrderTracking, SupportOptions};
use session_store::SessionStore;

use super::sessions::AppState;
use crate::error::ApiError;

/// GET /support/options
pub async fn options<S: SessionStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> Json<SupportOptions> {
    Json(state.capabilities().post_purchase.support_options())
}

/// GET /payment/methods
pub async fn payment_methods<S: SessionStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> Json<Vec<PaymentMethodInfo>> {
    Json(state.capabilities().payment.payment_methods())
}

/// GET /orders/{id}/track
#[tracing::instrument(skip(state))]
pub async fn track_order<S: SessionStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(order_id): Path<String>,
) -> Result<Json<OrderTracking>, ApiError> {
    let tracking = state
        .capabilities()
        .fulfillment
        .track_order(&order_id)
        .await?;
    Ok(Json(tracking))
}
