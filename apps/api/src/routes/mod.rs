pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::assessment::handlers as assessment;
use crate::conversation::handlers as conversation;
use crate::doctor_search::handlers as doctors;
use crate::safety::handlers as safety;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Conversation API
        .route("/api/v1/conversations", post(conversation::handle_create))
        .route("/api/v1/conversations/:id", get(conversation::handle_get))
        .route(
            "/api/v1/conversations/:id/messages",
            post(conversation::handle_message),
        )
        .route(
            "/api/v1/conversations/:id/reset",
            post(conversation::handle_reset),
        )
        .route(
            "/api/v1/conversations/:id/assessment",
            post(conversation::handle_assess),
        )
        // Assessment + safety API
        .route("/api/v1/assessments", post(assessment::handle_assess))
        .route("/api/v1/red-flags/evaluate", post(safety::handle_evaluate))
        // Doctor search API
        .route("/api/v1/doctors", get(doctors::handle_search))
        .with_state(state)
}
