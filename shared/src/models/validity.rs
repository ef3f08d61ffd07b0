//! Expiry batch models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// A batch of a product with an expiration date
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ValidityBatch {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub product_id: Uuid,
    pub batch: Option<String>,
    pub quantity: i32,
    pub expiration_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// Expiry batch pushed by the store agent
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ValidityInput {
    pub product_id: Uuid,
    #[validate(length(max = 64))]
    pub batch: Option<String>,
    #[validate(range(min = 0))]
    pub quantity: i32,
    pub expiration_date: DateTime<Utc>,
}

/// A batch inside the expiry horizon, joined with its product identity
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExpiringBatch {
    pub product_id: Uuid,
    pub product_name: String,
    pub sku: String,
    pub quantity: i32,
    pub expiration_date: DateTime<Utc>,
}
