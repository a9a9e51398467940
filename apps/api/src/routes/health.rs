use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::state::AppState;

/// GET /health
/// Liveness plus the backends this instance is wired to.
pub async fn health_handler(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "service": "intake-api",
        "llm_configured": state.config.mistral_api_key.is_some(),
        "doctor_search": state.doctor_search.backend(),
        "active_conversations": state.sessions.len().await
    }))
}
