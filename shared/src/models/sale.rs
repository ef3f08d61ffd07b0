//! Sales models

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// A point-of-sale transaction, unique per tenant and transaction id
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sale {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub transaction_id: String,
    pub date: DateTime<Utc>,
    pub total: Decimal,
    pub payment_method: Option<String>,
    pub customer_id: Option<String>,
    pub items: Vec<SaleItem>,
    pub created_at: DateTime<Utc>,
}

/// A line item of a sale
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaleItem {
    pub product_id: Uuid,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub total_price: Decimal,
    pub discount: Option<Decimal>,
}

/// Sale pushed by the store agent
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SaleInput {
    #[validate(length(min = 1, max = 128))]
    pub transaction_id: String,
    pub date: DateTime<Utc>,
    pub total: Decimal,
    pub payment_method: Option<String>,
    pub customer_id: Option<String>,
    #[validate(length(min = 1))]
    pub items: Vec<SaleItemInput>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SaleItemInput {
    pub product_id: Uuid,
    #[validate(range(min = 1))]
    pub quantity: i32,
    pub unit_price: Decimal,
    pub total_price: Decimal,
    pub discount: Option<Decimal>,
}

/// Quantity of a sale line item, as read by the alert rules
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleItemQuantity {
    pub quantity: i32,
}

/// Total of a single sale, used for history grouping
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaleTotal {
    pub date: DateTime<Utc>,
    pub total: Decimal,
}

/// All-time sales count and revenue of a tenant
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SalesSummary {
    pub count: i64,
    pub revenue: Decimal,
}

/// One day of sales history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalesHistoryPoint {
    pub date: NaiveDate,
    pub total: Decimal,
    pub count: i64,
}
