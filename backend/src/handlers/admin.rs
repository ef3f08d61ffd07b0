//! Administrative handlers

use axum::{extract::State, Json};
use serde::Serialize;

use crate::error::AppResult;
use crate::middleware::{require_admin, CurrentUser};
use crate::services::IngestionService;
use crate::AppState;

#[derive(Serialize)]
pub struct ClearDataResponse {
    pub deleted_products: u64,
    pub message: String,
}

/// Delete all data of the caller's tenant
pub async fn clear_data(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<Json<ClearDataResponse>> {
    require_admin(&current_user.0)?;

    let service = IngestionService::new(state.db);
    let deleted_products = service.clear_tenant_data(current_user.0.tenant_id).await?;

    tracing::warn!(
        user_id = %current_user.0.user_id,
        tenant_id = %current_user.0.tenant_id,
        deleted_products,
        "Admin cleared tenant data"
    );

    Ok(Json(ClearDataResponse {
        deleted_products,
        message: "Tenant data cleared".to_string(),
    }))
}
