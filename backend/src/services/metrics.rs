//! Metrics facade for the dashboard
//!
//! Fetches a fresh snapshot through the inventory gateway on every call and
//! runs the pure alert rules from `shared::alerts` over it.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use shared::alerts::{self, AlertSettings};
use shared::{Alert, DashboardMetrics, SalesHistoryPoint};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::repository::{InventoryGateway, PgInventoryGateway};
use crate::AppState;

/// Metrics service computing alerts and dashboard aggregates
#[derive(Clone)]
pub struct MetricsService {
    gateway: Arc<dyn InventoryGateway>,
    settings: AlertSettings,
    clock: fn() -> DateTime<Utc>,
}

impl MetricsService {
    /// Create a new MetricsService over any gateway
    pub fn new(gateway: Arc<dyn InventoryGateway>, settings: AlertSettings) -> Self {
        Self {
            gateway,
            settings,
            clock: Utc::now,
        }
    }

    /// MetricsService backed by the application's database pool
    pub fn from_state(state: &AppState) -> Self {
        Self::new(
            Arc::new(PgInventoryGateway::new(state.db.clone())),
            state.config.alerts.clone(),
        )
    }

    /// Replace the wall clock, for deterministic evaluation
    pub fn with_clock(mut self, clock: fn() -> DateTime<Utc>) -> Self {
        self.clock = clock;
        self
    }

    fn now(&self) -> DateTime<Utc> {
        (self.clock)()
    }

    /// Dashboard counts and totals; fetches run concurrently
    pub async fn get_dashboard_metrics(&self, tenant_id: Uuid) -> AppResult<DashboardMetrics> {
        let now = self.now();

        let (total_products, sales, rupture_snapshots, excess_snapshots, batches) = tokio::try_join!(
            self.gateway.count_active_products(tenant_id),
            self.gateway.sales_summary(tenant_id),
            self.gateway
                .product_snapshots(tenant_id, self.settings.rupture_since(now)),
            self.gateway
                .product_snapshots(tenant_id, self.settings.excess_since(now)),
            self.gateway
                .list_expiring_batches(tenant_id, self.settings.validity_horizon(now)),
        )?;

        let rupture = alerts::evaluate_rupture(&rupture_snapshots, &self.settings);
        let excess = alerts::evaluate_excess(&excess_snapshots, &self.settings);
        let validity = alerts::evaluate_validity(&batches, now);

        let metrics = alerts::summarize(total_products, sales, &rupture, &excess, &validity);

        tracing::debug!(
            %tenant_id,
            total_products = metrics.total_products,
            rupture = metrics.rupture_alerts,
            excess = metrics.excess_alerts,
            validity = metrics.validity_alerts,
            "Computed dashboard metrics"
        );

        Ok(metrics)
    }

    /// Products at risk of running out, most urgent first
    pub async fn get_rupture_alerts(&self, tenant_id: Uuid) -> AppResult<Vec<Alert>> {
        let since = self.settings.rupture_since(self.now());
        let snapshots = self.gateway.product_snapshots(tenant_id, since).await?;
        Ok(alerts::evaluate_rupture(&snapshots, &self.settings))
    }

    /// Overstocked products, most urgent first
    pub async fn get_excess_stock_alerts(&self, tenant_id: Uuid) -> AppResult<Vec<Alert>> {
        let since = self.settings.excess_since(self.now());
        let snapshots = self.gateway.product_snapshots(tenant_id, since).await?;
        Ok(alerts::evaluate_excess(&snapshots, &self.settings))
    }

    /// Batches expiring inside the horizon, most urgent first
    pub async fn get_validity_alerts(&self, tenant_id: Uuid) -> AppResult<Vec<Alert>> {
        let now = self.now();
        let batches = self
            .gateway
            .list_expiring_batches(tenant_id, self.settings.validity_horizon(now))
            .await?;
        Ok(alerts::evaluate_validity(&batches, now))
    }

    /// Daily sales totals over the trailing `days`, ascending by date
    pub async fn get_sales_history(
        &self,
        tenant_id: Uuid,
        days: i64,
    ) -> AppResult<Vec<SalesHistoryPoint>> {
        let since = Duration::try_days(days)
            .and_then(|window| self.now().checked_sub_signed(window))
            .ok_or_else(|| AppError::Validation {
                field: "days".to_string(),
                message: format!("History window of {} days is out of range", days),
                message_pt: format!("Janela de histórico de {} dias fora do intervalo", days),
            })?;
        let sales = self.gateway.list_sale_totals(tenant_id, since).await?;
        Ok(alerts::group_sales_by_date(&sales))
    }

    /// Export rows as CSV with a header line
    pub fn export_to_csv<T: Serialize>(data: &[T]) -> AppResult<String> {
        let mut wtr = csv::Writer::from_writer(vec![]);
        for record in data {
            wtr.serialize(record)
                .map_err(|e| AppError::Internal(format!("CSV serialization error: {}", e)))?;
        }
        let bytes = wtr
            .into_inner()
            .map_err(|e| AppError::Internal(format!("CSV writer error: {}", e)))?;
        String::from_utf8(bytes)
            .map_err(|e| AppError::Internal(format!("UTF-8 conversion error: {}", e)))
    }
}
