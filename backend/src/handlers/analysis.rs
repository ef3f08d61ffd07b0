//! Persisted analysis handlers

use axum::{extract::State, http::StatusCode, Json};
use shared::AnalysisResult;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::AnalysisService;
use crate::AppState;

/// Run the analysis now for the caller's tenant
pub async fn run_analysis(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<(StatusCode, Json<AnalysisResult>)> {
    let service = AnalysisService::from_state(&state);
    let result = service.run_for_tenant(current_user.0.tenant_id).await?;
    Ok((StatusCode::CREATED, Json(result)))
}

/// Latest persisted analysis
pub async fn get_latest_analysis(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<Json<AnalysisResult>> {
    let service = AnalysisService::from_state(&state);
    let result = service.latest(current_user.0.tenant_id).await?;
    Ok(Json(result))
}
