//! Periodic analysis: persisted daily insights per tenant

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use shared::{AnalysisResult, DailyInsight};
use sqlx::types::Json;
use sqlx::PgPool;
use tokio::time;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::services::AiService;
use crate::AppState;

/// Analysis service
#[derive(Clone)]
pub struct AnalysisService {
    db: PgPool,
    ai: AiService,
}

#[derive(Debug, sqlx::FromRow)]
struct AnalysisRow {
    id: Uuid,
    tenant_id: Uuid,
    content: Json<DailyInsight>,
    created_at: DateTime<Utc>,
}

impl From<AnalysisRow> for AnalysisResult {
    fn from(r: AnalysisRow) -> Self {
        AnalysisResult {
            id: r.id,
            tenant_id: r.tenant_id,
            content: r.content.0,
            created_at: r.created_at,
        }
    }
}

impl AnalysisService {
    pub fn new(db: PgPool, ai: AiService) -> Self {
        Self { db, ai }
    }

    pub fn from_state(state: &AppState) -> Self {
        Self::new(state.db.clone(), AiService::from_state(state))
    }

    /// Generate and persist a fresh insight for one tenant
    pub async fn run_for_tenant(&self, tenant_id: Uuid) -> AppResult<AnalysisResult> {
        let insight = self.ai.generate_daily_insights(tenant_id).await?;

        let row = sqlx::query_as::<_, AnalysisRow>(
            r#"
            INSERT INTO analysis_results (tenant_id, content)
            VALUES ($1, $2)
            RETURNING id, tenant_id, content, created_at
            "#,
        )
        .bind(tenant_id)
        .bind(Json(&insight))
        .fetch_one(&self.db)
        .await?;

        tracing::info!(%tenant_id, analysis_id = %row.id, "Persisted analysis result");

        Ok(row.into())
    }

    /// Run the analysis for every tenant; returns how many succeeded
    pub async fn run_all(&self) -> AppResult<usize> {
        let tenants = sqlx::query_scalar::<_, Uuid>("SELECT id FROM tenants ORDER BY created_at")
            .fetch_all(&self.db)
            .await?;

        let mut succeeded = 0;
        for tenant_id in &tenants {
            match self.run_for_tenant(*tenant_id).await {
                Ok(_) => succeeded += 1,
                Err(e) => {
                    tracing::error!(%tenant_id, error = %e, "Periodic analysis failed for tenant")
                }
            }
        }

        Ok(succeeded)
    }

    /// Most recent persisted insight of a tenant
    pub async fn latest(&self, tenant_id: Uuid) -> AppResult<AnalysisResult> {
        sqlx::query_as::<_, AnalysisRow>(
            r#"
            SELECT id, tenant_id, content, created_at
            FROM analysis_results
            WHERE tenant_id = $1
            ORDER BY created_at DESC
            LIMIT 1
            "#,
        )
        .bind(tenant_id)
        .fetch_optional(&self.db)
        .await?
        .map(AnalysisResult::from)
        .ok_or_else(|| AppError::NotFound("Analysis result".to_string()))
    }
}

/// Background task running the analysis for all tenants on a fixed interval
pub struct AnalysisScheduler {
    service: AnalysisService,
    tick_interval: Duration,
}

impl AnalysisScheduler {
    pub fn new(service: AnalysisService, tick_interval: Duration) -> Self {
        Self {
            service,
            tick_interval,
        }
    }

    pub async fn start(self: Arc<Self>) {
        let mut ticker = time::interval(self.tick_interval);
        // The first tick completes immediately; the first run waits a full interval
        ticker.tick().await;

        tracing::info!(
            interval_secs = self.tick_interval.as_secs(),
            "Analysis scheduler started"
        );

        loop {
            ticker.tick().await;

            tracing::info!("Running periodic analysis");
            match self.service.run_all().await {
                Ok(count) => tracing::info!(tenants = count, "Periodic analysis complete"),
                Err(e) => tracing::error!(error = %e, "Analysis scheduler tick failed"),
            }
        }
    }
}
