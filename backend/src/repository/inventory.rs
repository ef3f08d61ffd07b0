//! PostgreSQL implementation of the inventory gateway

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use shared::{
    ExpiringBatch, Product, ProductSnapshot, SaleItemQuantity, SaleTotal, SalesSummary,
    StockRecord,
};
use sqlx::{FromRow, PgPool};
use tracing::debug;
use uuid::Uuid;

use super::InventoryGateway;
use crate::error::AppResult;

#[derive(Clone)]
pub struct PgInventoryGateway {
    db: PgPool,
}

impl PgInventoryGateway {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

/// Row for product queries
#[derive(Debug, FromRow)]
struct ProductRow {
    id: Uuid,
    tenant_id: Uuid,
    sku: String,
    name: String,
    barcode: Option<String>,
    department: Option<String>,
    category: Option<String>,
    brand: Option<String>,
    cost_price: Decimal,
    sale_price: Decimal,
    active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ProductRow> for Product {
    fn from(r: ProductRow) -> Self {
        Product {
            id: r.id,
            tenant_id: r.tenant_id,
            sku: r.sku,
            name: r.name,
            barcode: r.barcode,
            department: r.department,
            category: r.category,
            brand: r.brand,
            cost_price: r.cost_price,
            sale_price: r.sale_price,
            active: r.active,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

/// Row for stock queries
#[derive(Debug, FromRow)]
struct StockRow {
    product_id: Uuid,
    tenant_id: Uuid,
    quantity: i32,
    min_stock: Option<i32>,
    max_stock: Option<i32>,
    updated_at: DateTime<Utc>,
}

impl From<StockRow> for StockRecord {
    fn from(r: StockRow) -> Self {
        StockRecord {
            product_id: r.product_id,
            tenant_id: r.tenant_id,
            quantity: r.quantity,
            min_stock: r.min_stock,
            max_stock: r.max_stock,
            updated_at: r.updated_at,
        }
    }
}

/// Row for the joined product + stock snapshot query
#[derive(Debug, FromRow)]
struct SnapshotRow {
    #[sqlx(flatten)]
    product: ProductRow,
    stock_quantity: Option<i32>,
    min_stock: Option<i32>,
    max_stock: Option<i32>,
    stock_updated_at: Option<DateTime<Utc>>,
}

/// Row for expiring batch query
#[derive(Debug, FromRow)]
struct ExpiringBatchRow {
    product_id: Uuid,
    product_name: String,
    sku: String,
    quantity: i32,
    expiration_date: DateTime<Utc>,
}

const PRODUCT_COLUMNS: &str = "p.id, p.tenant_id, p.sku, p.name, p.barcode, p.department, \
     p.category, p.brand, p.cost_price, p.sale_price, p.active, p.created_at, p.updated_at";

#[async_trait]
impl InventoryGateway for PgInventoryGateway {
    async fn list_active_products(&self, tenant_id: Uuid) -> AppResult<Vec<Product>> {
        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            r#"
            SELECT {PRODUCT_COLUMNS}
            FROM products p
            WHERE p.tenant_id = $1 AND p.active = true
            ORDER BY p.created_at, p.sku
            "#
        ))
        .bind(tenant_id)
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(Product::from).collect())
    }

    async fn get_latest_stock(
        &self,
        tenant_id: Uuid,
        product_id: Uuid,
    ) -> AppResult<Option<StockRecord>> {
        let row = sqlx::query_as::<_, StockRow>(
            r#"
            SELECT product_id, tenant_id, quantity, min_stock, max_stock, updated_at
            FROM stocks
            WHERE tenant_id = $1 AND product_id = $2
            "#,
        )
        .bind(tenant_id)
        .bind(product_id)
        .fetch_optional(&self.db)
        .await?;

        Ok(row.map(StockRecord::from))
    }

    async fn get_sale_items(
        &self,
        tenant_id: Uuid,
        product_id: Uuid,
        since: DateTime<Utc>,
    ) -> AppResult<Vec<SaleItemQuantity>> {
        let quantities = sqlx::query_scalar::<_, i32>(
            r#"
            SELECT si.quantity
            FROM sale_items si
            JOIN sales s ON s.id = si.sale_id
            WHERE s.tenant_id = $1 AND si.product_id = $2 AND s.date >= $3
            "#,
        )
        .bind(tenant_id)
        .bind(product_id)
        .bind(since)
        .fetch_all(&self.db)
        .await?;

        Ok(quantities
            .into_iter()
            .map(|quantity| SaleItemQuantity { quantity })
            .collect())
    }

    async fn list_expiring_batches(
        &self,
        tenant_id: Uuid,
        horizon: DateTime<Utc>,
    ) -> AppResult<Vec<ExpiringBatch>> {
        let rows = sqlx::query_as::<_, ExpiringBatchRow>(
            r#"
            SELECT v.product_id, p.name as product_name, p.sku, v.quantity, v.expiration_date
            FROM validities v
            JOIN products p ON p.id = v.product_id
            WHERE v.tenant_id = $1 AND v.expiration_date <= $2
            ORDER BY v.created_at, v.id
            "#,
        )
        .bind(tenant_id)
        .bind(horizon)
        .fetch_all(&self.db)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| ExpiringBatch {
                product_id: r.product_id,
                product_name: r.product_name,
                sku: r.sku,
                quantity: r.quantity,
                expiration_date: r.expiration_date,
            })
            .collect())
    }

    async fn count_active_products(&self, tenant_id: Uuid) -> AppResult<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM products WHERE tenant_id = $1 AND active = true",
        )
        .bind(tenant_id)
        .fetch_one(&self.db)
        .await?;

        Ok(count)
    }

    async fn sales_summary(&self, tenant_id: Uuid) -> AppResult<SalesSummary> {
        let (count, revenue) = sqlx::query_as::<_, (i64, Option<Decimal>)>(
            "SELECT COUNT(*), SUM(total) FROM sales WHERE tenant_id = $1",
        )
        .bind(tenant_id)
        .fetch_one(&self.db)
        .await?;

        Ok(SalesSummary {
            count,
            revenue: revenue.unwrap_or(Decimal::ZERO),
        })
    }

    async fn list_sale_totals(
        &self,
        tenant_id: Uuid,
        since: DateTime<Utc>,
    ) -> AppResult<Vec<SaleTotal>> {
        let rows = sqlx::query_as::<_, (DateTime<Utc>, Decimal)>(
            r#"
            SELECT date, total
            FROM sales
            WHERE tenant_id = $1 AND date >= $2
            ORDER BY date
            "#,
        )
        .bind(tenant_id)
        .bind(since)
        .fetch_all(&self.db)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(date, total)| SaleTotal { date, total })
            .collect())
    }

    /// Two queries instead of one round trip per product
    async fn product_snapshots(
        &self,
        tenant_id: Uuid,
        since: DateTime<Utc>,
    ) -> AppResult<Vec<ProductSnapshot>> {
        let rows = sqlx::query_as::<_, SnapshotRow>(&format!(
            r#"
            SELECT {PRODUCT_COLUMNS},
                   st.quantity as stock_quantity, st.min_stock, st.max_stock,
                   st.updated_at as stock_updated_at
            FROM products p
            LEFT JOIN stocks st ON st.product_id = p.id AND st.tenant_id = p.tenant_id
            WHERE p.tenant_id = $1 AND p.active = true
            ORDER BY p.created_at, p.sku
            "#
        ))
        .bind(tenant_id)
        .fetch_all(&self.db)
        .await?;

        let items = sqlx::query_as::<_, (Uuid, i32)>(
            r#"
            SELECT si.product_id, si.quantity
            FROM sale_items si
            JOIN sales s ON s.id = si.sale_id
            WHERE s.tenant_id = $1 AND s.date >= $2
            "#,
        )
        .bind(tenant_id)
        .bind(since)
        .fetch_all(&self.db)
        .await?;

        debug!(
            %tenant_id,
            products = rows.len(),
            sale_items = items.len(),
            "Loaded product snapshots"
        );

        let mut items_by_product: HashMap<Uuid, Vec<SaleItemQuantity>> = HashMap::new();
        for (product_id, quantity) in items {
            items_by_product
                .entry(product_id)
                .or_default()
                .push(SaleItemQuantity { quantity });
        }

        Ok(rows
            .into_iter()
            .map(|row| {
                let stock = match (row.stock_quantity, row.stock_updated_at) {
                    (Some(quantity), Some(updated_at)) => Some(StockRecord {
                        product_id: row.product.id,
                        tenant_id,
                        quantity,
                        min_stock: row.min_stock,
                        max_stock: row.max_stock,
                        updated_at,
                    }),
                    _ => None,
                };
                let sale_items = items_by_product.remove(&row.product.id).unwrap_or_default();
                ProductSnapshot {
                    product: row.product.into(),
                    stock,
                    sale_items,
                }
            })
            .collect())
    }
}
