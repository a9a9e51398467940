//! Axum route handlers for the Conversation API.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::info;
use uuid::Uuid;

use crate::assessment::schema::AssessmentResponse;
use crate::assessment::service::assess_intake;
use crate::conversation::session::Session;
use crate::conversation::ConversationMode;
use crate::errors::AppError;
use crate::llm_client::ChatMessage;
use crate::models::intake::SymptomIntake;
use crate::safety::red_flags::{evaluate_red_flags, RedFlagsResult};
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct CreateConversationRequest {
    pub mode: Option<ConversationMode>,
}

#[derive(Debug, Serialize)]
pub struct CreateConversationResponse {
    pub conversation_id: Uuid,
    pub mode: ConversationMode,
    pub stage: &'static str,
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct MessageRequest {
    pub content: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub reply: String,
    pub stage: &'static str,
    pub ready_for_assessment: bool,
    pub intake: SymptomIntake,
}

#[derive(Debug, Serialize)]
pub struct ConversationView {
    pub conversation_id: Uuid,
    pub mode: ConversationMode,
    pub stage: &'static str,
    pub ready_for_assessment: bool,
    pub history: Vec<ChatMessage>,
    pub intake: SymptomIntake,
    pub red_flags: RedFlagsResult,
    pub assessment: Option<AssessmentResponse>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ConversationView {
    fn from_session(session: &Session) -> Self {
        Self {
            conversation_id: session.id,
            mode: session.mode,
            stage: session.stage(),
            ready_for_assessment: session.is_ready(),
            history: session.history.clone(),
            intake: session.intake.clone(),
            red_flags: evaluate_red_flags(&session.intake),
            assessment: session.assessment.clone(),
            created_at: session.created_at,
            updated_at: session.updated_at,
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/conversations
pub async fn handle_create(
    State(state): State<AppState>,
    body: Option<Json<CreateConversationRequest>>,
) -> Result<(StatusCode, Json<CreateConversationResponse>), AppError> {
    let request = body.map(|Json(r)| r).unwrap_or_default();
    let mode = request.mode.unwrap_or(state.config.conversation_mode);

    let session = Session::new(mode, state.llm.clone());
    let response = CreateConversationResponse {
        conversation_id: session.id,
        mode,
        stage: session.stage(),
        message: session.last_reply().unwrap_or_default().to_string(),
    };
    state.sessions.insert(session).await;
    info!("Conversation {} started ({:?})", response.conversation_id, mode);

    Ok((StatusCode::CREATED, Json(response)))
}

/// GET /api/v1/conversations/:id
pub async fn handle_get(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ConversationView>, AppError> {
    let handle = find_session(&state, id).await?;
    let session = handle.lock().await;
    Ok(Json(ConversationView::from_session(&session)))
}

/// POST /api/v1/conversations/:id/messages
///
/// Runs one turn to completion, including any language-model call.
pub async fn handle_message(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<MessageRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    if request.content.trim().is_empty() {
        return Err(AppError::Validation("content cannot be empty".to_string()));
    }

    let handle = find_session(&state, id).await?;
    let mut session = handle.lock().await;
    let reply = session.handle_message(&request.content).await;

    Ok(Json(MessageResponse {
        reply: reply.text().to_string(),
        stage: session.stage(),
        ready_for_assessment: session.is_ready(),
        intake: session.intake.clone(),
    }))
}

/// POST /api/v1/conversations/:id/reset
pub async fn handle_reset(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ConversationView>, AppError> {
    let handle = find_session(&state, id).await?;
    let mut session = handle.lock().await;
    session.reset();
    Ok(Json(ConversationView::from_session(&session)))
}

/// POST /api/v1/conversations/:id/assessment
///
/// Assesses the session's intake once the driver reports it ready. A failed
/// assessment leaves the session untouched so the caller can retry.
pub async fn handle_assess(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<AssessmentResponse>, AppError> {
    let handle = find_session(&state, id).await?;
    let mut session = handle.lock().await;

    if !session.is_ready() {
        return Err(AppError::Conflict(format!(
            "Conversation {id} is not ready for assessment (stage: {})",
            session.stage()
        )));
    }

    let assessment = assess_intake(state.llm.as_ref(), &session.intake).await?;
    session.record_assessment(assessment.clone());
    info!("Assessment stored for conversation {id}");

    Ok(Json(assessment))
}

async fn find_session(state: &AppState, id: Uuid) -> Result<Arc<Mutex<Session>>, AppError> {
    state
        .sessions
        .get(id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("Conversation {id} not found")))
}
