//! Derived alert and dashboard models
//!
//! Nothing in this module is persisted; every value is recomputed per request.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Product, SaleItemQuantity, StockRecord};

/// Ordinal urgency of an alert.
///
/// Variant order is the display order: `High` sorts before `Medium`,
/// which sorts before `Low`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    High,
    Medium,
    Low,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::High => "high",
            Severity::Medium => "medium",
            Severity::Low => "low",
        }
    }
}

/// Alert rule category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertKind {
    Rupture,
    Excess,
    Validity,
}

/// An alert raised for a product by one of the rules
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub product_id: Uuid,
    pub product_name: String,
    pub sku: String,
    /// Stock on hand, or the batch quantity for validity alerts
    pub current_stock: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub average_daily_sales: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub days_until_expiration: Option<i64>,
    pub reason: String,
    pub severity: Severity,
}

/// Dashboard summary counts and totals
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DashboardMetrics {
    pub total_products: i64,
    pub total_sales: i64,
    pub total_revenue: Decimal,
    pub rupture_alerts: usize,
    pub excess_alerts: usize,
    pub validity_alerts: usize,
}

/// An active product with its stock and the sale items inside a window
#[derive(Debug, Clone, PartialEq)]
pub struct ProductSnapshot {
    pub product: Product,
    pub stock: Option<StockRecord>,
    pub sale_items: Vec<SaleItemQuantity>,
}

impl ProductSnapshot {
    /// Units sold inside the snapshot window
    pub fn units_sold(&self) -> i64 {
        self.sale_items.iter().map(|i| i64::from(i.quantity)).sum()
    }
}
