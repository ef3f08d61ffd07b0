//! HTTP handlers for the store agent ingestion endpoints

use axum::{extract::State, Json};
use shared::{ProductInput, SaleInput, StockInput, SyncResponse, ValidityInput};

use crate::error::AppResult;
use crate::middleware::CurrentTenant;
use crate::services::IngestionService;
use crate::AppState;

/// Receive the product catalogue
pub async fn sync_products(
    State(state): State<AppState>,
    tenant: CurrentTenant,
    Json(products): Json<Vec<ProductInput>>,
) -> AppResult<Json<SyncResponse>> {
    let service = IngestionService::new(state.db);
    let response = service.sync_products(tenant.0.tenant_id, products).await?;
    Ok(Json(response))
}

/// Receive stock levels
pub async fn sync_stock(
    State(state): State<AppState>,
    tenant: CurrentTenant,
    Json(stocks): Json<Vec<StockInput>>,
) -> AppResult<Json<SyncResponse>> {
    let service = IngestionService::new(state.db);
    let response = service.sync_stock(tenant.0.tenant_id, stocks).await?;
    Ok(Json(response))
}

/// Receive sales
pub async fn sync_sales(
    State(state): State<AppState>,
    tenant: CurrentTenant,
    Json(sales): Json<Vec<SaleInput>>,
) -> AppResult<Json<SyncResponse>> {
    let service = IngestionService::new(state.db);
    let response = service.sync_sales(tenant.0.tenant_id, sales).await?;
    Ok(Json(response))
}

/// Receive expiry batches
pub async fn sync_validities(
    State(state): State<AppState>,
    tenant: CurrentTenant,
    Json(validities): Json<Vec<ValidityInput>>,
) -> AppResult<Json<SyncResponse>> {
    let service = IngestionService::new(state.db);
    let response = service
        .sync_validities(tenant.0.tenant_id, validities)
        .await?;
    Ok(Json(response))
}
