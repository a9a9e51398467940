use axum::Json;
use serde::Deserialize;

use crate::models::intake::SymptomIntake;
use crate::safety::red_flags::{evaluate_red_flags, RedFlagsResult};

#[derive(Debug, Deserialize)]
pub struct EvaluateRequest {
    pub intake: SymptomIntake,
}

/// POST /api/v1/red-flags/evaluate
pub async fn handle_evaluate(Json(req): Json<EvaluateRequest>) -> Json<RedFlagsResult> {
    Json(evaluate_red_flags(&req.intake))
}
