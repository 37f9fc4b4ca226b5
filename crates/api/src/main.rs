//! API server entry point.

use std::sync::Arc;
use std::time::Duration;

use api::config::Config;
use api::routes::sessions::AppState;
use capabilities::{
    Assistant, Capabilities, GeminiTextGenerator, GenerativeAssistant, HttpRetailApi,
    RandomIdGenerator, TemplateAssistant,
};
use session_store::{
    InMemorySessionStore, PostgresSessionStore, RetryPolicy, RetryingSessionStore, SessionStore,
};
use tokio::signal;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

const GENERATION_TIMEOUT: Duration = Duration::from_secs(15);

/// Waits for a shutdown signal (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install SIGINT handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("received SIGINT, starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("received SIGTERM, starting graceful shutdown");
        }
    }
}

/// Generated copy when an API key is configured, templates otherwise.
fn build_assistant(config: &Config, ids: Arc<RandomIdGenerator>) -> Arc<dyn Assistant> {
    let templates = TemplateAssistant::new(ids);
    let Some(key) = &config.gemini_api_key else {
        tracing::info!("no GEMINI_API_KEY, using template copy");
        return Arc::new(templates);
    };

    match GeminiTextGenerator::new(key, &config.gemini_model, GENERATION_TIMEOUT) {
        Ok(generator) => {
            tracing::info!(model = %config.gemini_model, "generated copy enabled");
            Arc::new(GenerativeAssistant::new(Arc::new(generator), templates))
        }
        Err(e) => {
            tracing::warn!(error = %e, "could not build text generator, using template copy");
            Arc::new(templates)
        }
    }
}

async fn build_store(config: &Config) -> Arc<dyn SessionStore> {
    let Some(url) = &config.database_url else {
        tracing::info!("no DATABASE_URL, sessions are kept in memory");
        return Arc::new(InMemorySessionStore::new());
    };

    let store = PostgresSessionStore::connect(url)
        .await
        .expect("failed to connect to session database");
    store
        .run_migrations()
        .await
        .expect("failed to run session store migrations");
    tracing::info!("sessions are stored in PostgreSQL");
    Arc::new(store)
}

#[tokio::main]
async fn main() {
    let config = Config::from_env();

    // 1. Initialize tracing
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level)))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // 2. Install Prometheus metrics recorder
    let prometheus_builder = metrics_exporter_prometheus::PrometheusBuilder::new();
    let metrics_handle = prometheus_builder
        .install_recorder()
        .expect("failed to install Prometheus recorder");

    // 3. Wire the data service, assistant and session store
    let retail_api = HttpRetailApi::new(&config.mock_api_url, config.mock_api_timeout)
        .expect("failed to build retail data service client");
    let ids = Arc::new(RandomIdGenerator);
    let assistant = build_assistant(&config, ids.clone());
    let capabilities = Capabilities::new(Arc::new(retail_api), assistant, ids);

    let store = RetryingSessionStore::new(build_store(&config).await, RetryPolicy::default());
    let state = Arc::new(AppState::new(store, capabilities));

    // 4. Build the application
    let app = api::create_app(state, metrics_handle);

    // 5. Start server
    let addr = config.addr();
    tracing::info!(%addr, mock_api_url = %config.mock_api_url, "starting API server");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("failed to bind address");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");

    tracing::info!("server shut down gracefully");
}
