//! Axum route handlers for stateless assessments.

use axum::{extract::State, Json};
use serde::Deserialize;

use crate::assessment::schema::AssessmentResponse;
use crate::assessment::service::assess_intake;
use crate::errors::AppError;
use crate::models::intake::SymptomIntake;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct AssessRequest {
    pub intake: SymptomIntake,
}

/// POST /api/v1/assessments
///
/// Assesses a caller-supplied intake without touching any conversation.
pub async fn handle_assess(
    State(state): State<AppState>,
    Json(request): Json<AssessRequest>,
) -> Result<Json<AssessmentResponse>, AppError> {
    if request.intake.chief_complaint().is_none() {
        return Err(AppError::Validation(
            "intake.chief_complaint cannot be empty".to_string(),
        ));
    }

    let assessment = assess_intake(state.llm.as_ref(), &request.intake).await?;
    Ok(Json(assessment))
}
