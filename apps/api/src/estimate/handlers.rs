use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;
use crate::estimate::flat_rate::{self, FlatRateEntry, FlatRateMatch, FLAT_RATE_TABLE};
use crate::estimate::pipeline::{generate_estimate, GenerateEstimateRequest, GenerateEstimateResponse};
use crate::models::job::JobRow;
use crate::state::AppState;

/// Upper bound on `GET /api/jobs`.
const RECENT_JOBS_LIMIT: i64 = 50;

#[derive(Deserialize)]
pub struct FlatRateQuery {
    #[serde(default)]
    pub description: String,
}

#[derive(Serialize)]
pub struct FlatRateMatchResponse {
    #[serde(rename = "match")]
    pub matched: Option<FlatRateMatch>,
}

/// POST /api/generate-estimate
///
/// Malformed bodies are reported in the standard error envelope instead of axum's plain-text rejection.
pub async fn handle_generate_estimate(
    State(state): State<AppState>,
    body: Result<Json<GenerateEstimateRequest>, JsonRejection>,
) -> Result<Json<GenerateEstimateResponse>, AppError> {
    let Json(req) = body.map_err(|rejection| AppError::BadRequest(rejection.body_text()))?;
    let response = generate_estimate(
        state.generator.as_ref(),
        state.store.as_ref(),
        &state.pricing,
        req,
    )
    .await?;
    Ok(Json(response))
}

/// GET /api/jobs
pub async fn handle_list_jobs(
    State(state): State<AppState>,
) -> Result<Json<Vec<JobRow>>, AppError> {
    let jobs = state.store.recent_jobs(RECENT_JOBS_LIMIT).await?;
    Ok(Json(jobs))
}

/// GET /api/jobs/:id
pub async fn handle_get_job(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<JobRow>, AppError> {
    let job = state
        .store
        .get_job(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Job {id} not found")))?;
    Ok(Json(job))
}

/// GET /api/flat-rates
pub async fn handle_list_flat_rates() -> Json<&'static [FlatRateEntry]> {
    Json(FLAT_RATE_TABLE)
}

/// GET /api/flat-rates/match?description=
pub async fn handle_match_flat_rate(
    Query(params): Query<FlatRateQuery>,
) -> Json<FlatRateMatchResponse> {
    Json(FlatRateMatchResponse {
        matched: flat_rate::lookup(&params.description),
    })
}
