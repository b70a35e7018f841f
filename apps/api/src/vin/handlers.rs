use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;

use crate::errors::AppError;
use crate::state::AppState;
use crate::vin::DecodedVehicle;

#[derive(Serialize)]
pub struct VinLookupResponse {
    pub ok: bool,
    pub vehicle: DecodedVehicle,
}

/// GET /api/vin-lookup/:vin
pub async fn handle_vin_lookup(
    State(state): State<AppState>,
    Path(vin): Path<String>,
) -> Result<Json<VinLookupResponse>, AppError> {
    let vehicle = state.vin.decode(&vin).await?;
    Ok(Json(VinLookupResponse { ok: true, vehicle }))
}
