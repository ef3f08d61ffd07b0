//! Ingestion service for data pushed by store agents
//!
//! Batches are validated as a whole before anything is written.

use std::collections::HashSet;

use shared::validation::{validate_product_prices, validate_sale_amounts, validate_sku};
use shared::{ProductInput, SaleInput, StockInput, SyncResponse, ValidityInput};
use sqlx::PgPool;
use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, AppResult};

/// Ingestion service
#[derive(Clone)]
pub struct IngestionService {
    db: PgPool,
}

impl IngestionService {
    /// Create a new IngestionService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Upsert products by (tenant, SKU)
    pub async fn sync_products(
        &self,
        tenant_id: Uuid,
        products: Vec<ProductInput>,
    ) -> AppResult<SyncResponse> {
        check_products(&products)?;

        let mut tx = self.db.begin().await?;
        for product in &products {
            sqlx::query(
                r#"
                INSERT INTO products (id, tenant_id, sku, name, barcode, department, category,
                                      brand, cost_price, sale_price, active)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
                ON CONFLICT (tenant_id, sku) DO UPDATE SET
                    name = EXCLUDED.name,
                    barcode = EXCLUDED.barcode,
                    department = EXCLUDED.department,
                    category = EXCLUDED.category,
                    brand = EXCLUDED.brand,
                    cost_price = EXCLUDED.cost_price,
                    sale_price = EXCLUDED.sale_price,
                    active = EXCLUDED.active,
                    updated_at = NOW()
                "#,
            )
            .bind(product.id.unwrap_or_else(Uuid::new_v4))
            .bind(tenant_id)
            .bind(product.sku.trim())
            .bind(product.name.trim())
            .bind(&product.barcode)
            .bind(&product.department)
            .bind(&product.category)
            .bind(&product.brand)
            .bind(product.cost_price)
            .bind(product.sale_price)
            .bind(product.active)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;

        info!(%tenant_id, count = products.len(), "Synced products");

        Ok(SyncResponse::new(
            products.len(),
            "Products synchronized successfully",
        ))
    }

    /// Upsert stock levels; records for unknown products are skipped
    pub async fn sync_stock(
        &self,
        tenant_id: Uuid,
        stocks: Vec<StockInput>,
    ) -> AppResult<SyncResponse> {
        for stock in &stocks {
            stock.validate()?;
        }

        let ids: Vec<Uuid> = stocks.iter().map(|s| s.product_id).collect();
        let owned = self.owned_products(tenant_id, &ids).await?;

        let mut tx = self.db.begin().await?;
        let mut written = 0usize;
        for stock in &stocks {
            if !owned.contains(&stock.product_id) {
                warn!(%tenant_id, product_id = %stock.product_id, "Skipping stock for unknown product");
                continue;
            }

            sqlx::query(
                r#"
                INSERT INTO stocks (tenant_id, product_id, quantity, min_stock, max_stock)
                VALUES ($1, $2, $3, $4, $5)
                ON CONFLICT (tenant_id, product_id) DO UPDATE SET
                    quantity = EXCLUDED.quantity,
                    min_stock = EXCLUDED.min_stock,
                    max_stock = EXCLUDED.max_stock,
                    updated_at = NOW()
                "#,
            )
            .bind(tenant_id)
            .bind(stock.product_id)
            .bind(stock.quantity)
            .bind(stock.min_stock)
            .bind(stock.max_stock)
            .execute(&mut *tx)
            .await?;
            written += 1;
        }
        tx.commit().await?;

        info!(%tenant_id, received = stocks.len(), written, "Synced stock");

        Ok(SyncResponse::new(
            stocks.len(),
            "Stock synchronized successfully",
        ))
    }

    /// Insert sales with their items; known transaction ids are skipped
    pub async fn sync_sales(
        &self,
        tenant_id: Uuid,
        sales: Vec<SaleInput>,
    ) -> AppResult<SyncResponse> {
        check_sales(&sales)?;

        let ids: Vec<Uuid> = sales
            .iter()
            .flat_map(|s| s.items.iter().map(|i| i.product_id))
            .collect();
        let owned = self.owned_products(tenant_id, &ids).await?;

        let mut created = 0usize;
        for sale in &sales {
            let mut tx = self.db.begin().await?;

            let sale_id = sqlx::query_scalar::<_, Uuid>(
                r#"
                INSERT INTO sales (tenant_id, transaction_id, date, total, payment_method, customer_id)
                VALUES ($1, $2, $3, $4, $5, $6)
                ON CONFLICT (tenant_id, transaction_id) DO NOTHING
                RETURNING id
                "#,
            )
            .bind(tenant_id)
            .bind(&sale.transaction_id)
            .bind(sale.date)
            .bind(sale.total)
            .bind(&sale.payment_method)
            .bind(&sale.customer_id)
            .fetch_optional(&mut *tx)
            .await?;

            let Some(sale_id) = sale_id else {
                warn!(%tenant_id, transaction_id = %sale.transaction_id, "Skipping duplicate sale");
                continue;
            };

            for item in &sale.items {
                if !owned.contains(&item.product_id) {
                    warn!(
                        %tenant_id,
                        transaction_id = %sale.transaction_id,
                        product_id = %item.product_id,
                        "Skipping sale item for unknown product"
                    );
                    continue;
                }

                sqlx::query(
                    r#"
                    INSERT INTO sale_items (sale_id, product_id, quantity, unit_price, total_price, discount)
                    VALUES ($1, $2, $3, $4, $5, $6)
                    "#,
                )
                .bind(sale_id)
                .bind(item.product_id)
                .bind(item.quantity)
                .bind(item.unit_price)
                .bind(item.total_price)
                .bind(item.discount)
                .execute(&mut *tx)
                .await?;
            }

            tx.commit().await?;
            created += 1;
        }

        info!(%tenant_id, received = sales.len(), created, "Synced sales");

        Ok(SyncResponse::new(
            sales.len(),
            "Sales synchronized successfully",
        ))
    }

    /// Insert expiry batches; batches of unknown products are skipped
    pub async fn sync_validities(
        &self,
        tenant_id: Uuid,
        validities: Vec<ValidityInput>,
    ) -> AppResult<SyncResponse> {
        for validity in &validities {
            validity.validate()?;
        }

        let ids: Vec<Uuid> = validities.iter().map(|v| v.product_id).collect();
        let owned = self.owned_products(tenant_id, &ids).await?;

        let mut tx = self.db.begin().await?;
        let mut written = 0usize;
        for validity in &validities {
            if !owned.contains(&validity.product_id) {
                warn!(%tenant_id, product_id = %validity.product_id, "Skipping batch for unknown product");
                continue;
            }

            sqlx::query(
                r#"
                INSERT INTO validities (tenant_id, product_id, batch, quantity, expiration_date)
                VALUES ($1, $2, $3, $4, $5)
                "#,
            )
            .bind(tenant_id)
            .bind(validity.product_id)
            .bind(&validity.batch)
            .bind(validity.quantity)
            .bind(validity.expiration_date)
            .execute(&mut *tx)
            .await?;
            written += 1;
        }
        tx.commit().await?;

        info!(%tenant_id, received = validities.len(), written, "Synced validities");

        Ok(SyncResponse::new(
            validities.len(),
            "Validities synchronized successfully",
        ))
    }

    /// Delete every catalogue, stock, sales and analysis row of a tenant
    pub async fn clear_tenant_data(&self, tenant_id: Uuid) -> AppResult<u64> {
        let mut tx = self.db.begin().await?;

        for table in ["analysis_results", "validities", "stocks"] {
            sqlx::query(&format!("DELETE FROM {table} WHERE tenant_id = $1"))
                .bind(tenant_id)
                .execute(&mut *tx)
                .await?;
        }

        // sale_items go with their sales
        sqlx::query("DELETE FROM sales WHERE tenant_id = $1")
            .bind(tenant_id)
            .execute(&mut *tx)
            .await?;

        let products = sqlx::query("DELETE FROM products WHERE tenant_id = $1")
            .bind(tenant_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        tx.commit().await?;

        info!(%tenant_id, products, "Cleared tenant data");

        Ok(products)
    }

    /// Subset of `product_ids` that belong to the tenant
    async fn owned_products(
        &self,
        tenant_id: Uuid,
        product_ids: &[Uuid],
    ) -> AppResult<HashSet<Uuid>> {
        if product_ids.is_empty() {
            return Ok(HashSet::new());
        }

        let ids = sqlx::query_scalar::<_, Uuid>(
            "SELECT id FROM products WHERE tenant_id = $1 AND id = ANY($2)",
        )
        .bind(tenant_id)
        .bind(product_ids)
        .fetch_all(&self.db)
        .await?;

        Ok(ids.into_iter().collect())
    }
}

fn invalid(field: &str, message: &str) -> AppError {
    AppError::Validation {
        field: field.to_string(),
        message: message.to_string(),
        message_pt: format!("Dados inválidos no campo {}", field),
    }
}

/// Validate a product batch
fn check_products(products: &[ProductInput]) -> AppResult<()> {
    for product in products {
        product.validate()?;
        validate_sku(&product.sku).map_err(|e| invalid("sku", e))?;
        validate_product_prices(product).map_err(|(field, e)| invalid(field, e))?;
    }
    Ok(())
}

/// Validate a sales batch, items included
fn check_sales(sales: &[SaleInput]) -> AppResult<()> {
    for sale in sales {
        sale.validate()?;
        for item in &sale.items {
            item.validate()?;
        }
        validate_sale_amounts(sale).map_err(|(field, e)| invalid(field, e))?;
    }
    Ok(())
}
