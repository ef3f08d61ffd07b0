//! Dashboard metric and alert handlers

use axum::{
    extract::{Query, State},
    http::header,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use shared::{parse_history_days, Alert, DashboardMetrics};

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::MetricsService;
use crate::AppState;

#[derive(Deserialize)]
pub struct SalesHistoryQuery {
    /// Kept raw so bad values fall back to the default window
    pub days: Option<String>,
    pub format: Option<String>, // "json" or "csv"
}

/// Get dashboard metrics
pub async fn get_dashboard(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<Json<DashboardMetrics>> {
    let service = MetricsService::from_state(&state);
    let metrics = service
        .get_dashboard_metrics(current_user.0.tenant_id)
        .await?;
    Ok(Json(metrics))
}

/// Get rupture alerts
pub async fn get_rupture_alerts(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<Json<Vec<Alert>>> {
    let service = MetricsService::from_state(&state);
    let alerts = service.get_rupture_alerts(current_user.0.tenant_id).await?;
    Ok(Json(alerts))
}

/// Get excess stock alerts
pub async fn get_excess_alerts(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<Json<Vec<Alert>>> {
    let service = MetricsService::from_state(&state);
    let alerts = service
        .get_excess_stock_alerts(current_user.0.tenant_id)
        .await?;
    Ok(Json(alerts))
}

/// Get validity alerts
pub async fn get_validity_alerts(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<Json<Vec<Alert>>> {
    let service = MetricsService::from_state(&state);
    let alerts = service.get_validity_alerts(current_user.0.tenant_id).await?;
    Ok(Json(alerts))
}

/// Get daily sales history, as JSON or CSV
pub async fn get_sales_history(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(query): Query<SalesHistoryQuery>,
) -> AppResult<impl IntoResponse> {
    let days = parse_history_days(query.days.as_deref());
    let service = MetricsService::from_state(&state);
    let history = service
        .get_sales_history(current_user.0.tenant_id, days)
        .await?;

    if query.format.as_deref() == Some("csv") {
        let csv = MetricsService::export_to_csv(&history)?;
        Ok((
            [
                (header::CONTENT_TYPE, "text/csv"),
                (
                    header::CONTENT_DISPOSITION,
                    "attachment; filename=\"sales_history.csv\"",
                ),
            ],
            csv,
        )
            .into_response())
    } else {
        Ok(Json(history).into_response())
    }
}
