//! AI suggestion and insight handlers

use axum::{extract::State, Json};
use shared::{DailyInsight, PromotionSuggestion};

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::AiService;
use crate::AppState;

/// Generate promotion suggestions
pub async fn generate_suggestions(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<Json<Vec<PromotionSuggestion>>> {
    let service = AiService::from_state(&state);
    let suggestions = service
        .generate_promotion_suggestions(current_user.0.tenant_id)
        .await?;
    Ok(Json(suggestions))
}

/// Generate the daily insight
pub async fn get_insights(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<Json<DailyInsight>> {
    let service = AiService::from_state(&state);
    let insight = service
        .generate_daily_insights(current_user.0.tenant_id)
        .await?;
    Ok(Json(insight))
}
