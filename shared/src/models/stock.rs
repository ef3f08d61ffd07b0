//! Stock level models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Current stock of a product; one record per tenant and product
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StockRecord {
    pub product_id: Uuid,
    pub tenant_id: Uuid,
    pub quantity: i32,
    pub min_stock: Option<i32>,
    pub max_stock: Option<i32>,
    pub updated_at: DateTime<Utc>,
}

/// Stock level pushed by the store agent
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct StockInput {
    pub product_id: Uuid,
    pub quantity: i32,
    #[validate(range(min = 0))]
    pub min_stock: Option<i32>,
    #[validate(range(min = 0))]
    pub max_stock: Option<i32>,
}
