use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::models::doctor::DoctorResult;
use crate::state::AppState;

const DEFAULT_LIMIT: usize = 5;
const MAX_LIMIT: usize = 20;

#[derive(Debug, Deserialize)]
pub struct DoctorSearchQuery {
    pub specialty: String,
    pub location: String,
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct DoctorSearchResponse {
    pub backend: &'static str,
    pub results: Vec<DoctorResult>,
}

/// GET /api/v1/doctors?specialty=&location=&limit=
pub async fn handle_search(
    State(state): State<AppState>,
    Query(query): Query<DoctorSearchQuery>,
) -> Result<Json<DoctorSearchResponse>, AppError> {
    if query.specialty.trim().is_empty() || query.location.trim().is_empty() {
        return Err(AppError::Validation(
            "specialty and location are required".to_string(),
        ));
    }
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT);

    let results = state
        .doctor_search
        .search(query.specialty.trim(), query.location.trim(), limit)
        .await;

    Ok(Json(DoctorSearchResponse {
        backend: state.doctor_search.backend(),
        results,
    }))
}
