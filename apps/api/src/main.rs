mod assessment;
mod config;
mod conversation;
mod doctor_search;
mod errors;
mod extract;
mod llm_client;
mod models;
mod routes;
mod safety;
mod state;

use anyhow::Result;
use std::net::SocketAddr;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use std::sync::Arc;
use std::time::Duration;

use crate::config::Config;
use crate::conversation::session::SessionStore;
use crate::doctor_search::{DoctorSearch, GooglePlacesSearch, MockDoctorSearch};
use crate::llm_client::LlmClient;
use crate::routes::build_router;
use crate::state::AppState;

const SWEEP_INTERVAL: Duration = Duration::from_secs(5 * 60);

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on malformed env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting intake API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize LLM client
    let llm = LlmClient::new(
        config.mistral_api_key.clone(),
        config.mistral_api_url.clone(),
        config.mistral_model.clone(),
        config.llm_timeout,
    );
    info!("LLM client initialized (model: {})", llm.model());

    // Doctor search backend: Google Places when a key is set
    let doctor_search: Arc<dyn DoctorSearch> = match config.google_places_api_key.clone() {
        Some(key) => Arc::new(GooglePlacesSearch::new(key)),
        None => Arc::new(MockDoctorSearch),
    };
    info!("Doctor search backend: {}", doctor_search.backend());
    info!("Default conversation mode: {:?}", config.conversation_mode);

    // In-memory sessions, swept for idle entries in the background
    let sessions = SessionStore::with_idle_ttl(config.session_idle_ttl);
    sessions.spawn_sweeper(SWEEP_INTERVAL);
    info!(
        "Session store initialized (idle TTL: {}s)",
        config.session_idle_ttl.as_secs()
    );

    // Build app state
    let state = AppState {
        llm: Arc::new(llm),
        doctor_search,
        sessions,
        config: config.clone(),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
