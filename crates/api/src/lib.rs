//! HTTP API server with observability for the sales assistant.
//!
//! Exposes the conversation service as REST endpoints (sessions, chat,
//! cart, promo, points, checkout, channel switching) plus support and
//! payment reference data, with structured logging (tracing) and
//! Prometheus metrics.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use capabilities::{Capabilities, InMemoryRetailApi, RandomIdGenerator, TemplateAssistant};
use metrics_exporter_prometheus::PrometheusHandle;
use session_store::SessionStore;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use routes::sessions::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S: SessionStore + 'static>(
    state: Arc<AppState<S>>,
    metrics_handle: PrometheusHandle,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route("/sessions", post(routes::sessions::create::<S>))
        .route("/sessions/{id}", get(routes::sessions::get::<S>))
        .route("/sessions/{id}/chat", post(routes::sessions::chat::<S>))
        .route("/sessions/{id}/cart", get(routes::sessions::cart::<S>))
        .route(
            "/sessions/{id}/cart/items",
            post(routes::sessions::add_item::<S>),
        )
        .route("/sessions/{id}/promo", post(routes::sessions::apply_promo::<S>))
        .route("/sessions/{id}/redeem", post(routes::sessions::redeem::<S>))
        .route("/sessions/{id}/checkout", post(routes::sessions::checkout::<S>))
        .route(
            "/sessions/{id}/channel",
            post(routes::sessions::switch_channel::<S>),
        )
        .route(
            "/customers/{id}/sessions",
            get(routes::sessions::list_for_customer::<S>),
        )
        .route("/support/options", get(routes::support::options::<S>))
        .route("/payment/methods", get(routes::support::payment_methods::<S>))
        .route("/orders/{id}/track", get(routes::support::track_order::<S>))
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Creates application state backed by the in-memory demo data service and
/// template copy.
pub fn create_default_state<S: SessionStore + 'static>(store: S) -> Arc<AppState<S>> {
    let ids = Arc::new(RandomIdGenerator);
    let capabilities = Capabilities::new(
        Arc::new(InMemoryRetailApi::demo()),
        Arc::new(TemplateAssistant::new(ids.clone())),
        ids,
    );
    Arc::new(AppState::new(store, capabilities))
}
