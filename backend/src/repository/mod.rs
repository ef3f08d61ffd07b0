//! Data access gateway consumed by the metrics engine
//!
//! Read-only, tenant-scoped queries behind a narrow async trait so the
//! metrics facade can run against PostgreSQL or an in-memory snapshot.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use shared::{
    ExpiringBatch, Product, ProductSnapshot, SaleItemQuantity, SaleTotal, SalesSummary,
    StockRecord,
};
use uuid::Uuid;

use crate::error::AppResult;

pub mod inventory;

pub use inventory::PgInventoryGateway;

#[async_trait]
pub trait InventoryGateway: Send + Sync {
    async fn list_active_products(&self, tenant_id: Uuid) -> AppResult<Vec<Product>>;

    async fn get_latest_stock(
        &self,
        tenant_id: Uuid,
        product_id: Uuid,
    ) -> AppResult<Option<StockRecord>>;

    /// Sale items of a product whose sale date is at or after `since`
    async fn get_sale_items(
        &self,
        tenant_id: Uuid,
        product_id: Uuid,
        since: DateTime<Utc>,
    ) -> AppResult<Vec<SaleItemQuantity>>;

    /// Batches expiring at or before `horizon`, joined with product identity
    async fn list_expiring_batches(
        &self,
        tenant_id: Uuid,
        horizon: DateTime<Utc>,
    ) -> AppResult<Vec<ExpiringBatch>>;

    async fn count_active_products(&self, tenant_id: Uuid) -> AppResult<i64>;

    /// All-time sales count and revenue
    async fn sales_summary(&self, tenant_id: Uuid) -> AppResult<SalesSummary>;

    /// One entry per sale at or after `since`
    async fn list_sale_totals(
        &self,
        tenant_id: Uuid,
        since: DateTime<Utc>,
    ) -> AppResult<Vec<SaleTotal>>;

    /// Active products with their stock and windowed sale items
    async fn product_snapshots(
        &self,
        tenant_id: Uuid,
        since: DateTime<Utc>,
    ) -> AppResult<Vec<ProductSnapshot>> {
        let products = self.list_active_products(tenant_id).await?;
        let mut snapshots = Vec::with_capacity(products.len());
        for product in products {
            let stock = self.get_latest_stock(tenant_id, product.id).await?;
            let sale_items = self.get_sale_items(tenant_id, product.id, since).await?;
            snapshots.push(ProductSnapshot {
                product,
                stock,
                sale_items,
            });
        }
        Ok(snapshots)
    }
}
