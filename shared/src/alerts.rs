//! Alert derivation engine
//!
//! Rupture (stock-out risk), excess-stock and validity (expiry) rules plus
//! the ranking and aggregation applied to their output. Every function is
//! pure: callers fetch a snapshot, pass the clock and the settings
//! explicitly, and get the derived alerts back.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{
    Alert, DashboardMetrics, ExpiringBatch, ProductSnapshot, SaleTotal, SalesHistoryPoint,
    SalesSummary, Severity,
};

const MILLIS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

/// Days of cover below which a rupture alert is high / medium
const RUPTURE_HIGH_DAYS: f64 = 1.0;
const RUPTURE_MEDIUM_DAYS: f64 = 2.0;

/// Months of cover above which an excess alert is high / medium
const EXCESS_HIGH_MONTHS: f64 = 6.0;
const EXCESS_MEDIUM_MONTHS: f64 = 4.0;

/// Days to expiration below which a validity alert is high / medium
const VALIDITY_HIGH_DAYS: i64 = 7;
const VALIDITY_MEDIUM_DAYS: i64 = 15;

/// Windows and multipliers used by the alert rules
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertSettings {
    /// Trailing sales window for the rupture rule
    pub rupture_window_days: i64,
    /// Alert when stock covers fewer days than this
    pub rupture_cover_days: f64,
    /// Trailing sales window for the excess rule
    pub excess_window_days: i64,
    /// Alert when stock exceeds this many windows of sales
    pub excess_cover_months: f64,
    /// Batches expiring within this many days are reported
    pub validity_horizon_days: i64,
}

impl Default for AlertSettings {
    fn default() -> Self {
        Self {
            rupture_window_days: 7,
            rupture_cover_days: 3.0,
            excess_window_days: 30,
            excess_cover_months: 2.0,
            validity_horizon_days: 30,
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum SettingsError {
    #[error("{0} must be positive")]
    NotPositive(&'static str),
}

impl AlertSettings {
    /// Reject windows and multipliers the rules cannot divide by
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.rupture_window_days <= 0 {
            return Err(SettingsError::NotPositive("rupture_window_days"));
        }
        if self.excess_window_days <= 0 {
            return Err(SettingsError::NotPositive("excess_window_days"));
        }
        if self.validity_horizon_days <= 0 {
            return Err(SettingsError::NotPositive("validity_horizon_days"));
        }
        if !(self.rupture_cover_days > 0.0) {
            return Err(SettingsError::NotPositive("rupture_cover_days"));
        }
        if !(self.excess_cover_months > 0.0) {
            return Err(SettingsError::NotPositive("excess_cover_months"));
        }
        Ok(())
    }

    /// Start of the rupture sales window
    pub fn rupture_since(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now - Duration::days(self.rupture_window_days)
    }

    /// Start of the excess sales window
    pub fn excess_since(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now - Duration::days(self.excess_window_days)
    }

    /// Latest expiration date reported by the validity rule
    pub fn validity_horizon(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now + Duration::days(self.validity_horizon_days)
    }
}

// ============================================================================
// Rules
// ============================================================================

/// Stock-out risk for one product.
///
/// No sales in the window means no forecast, so no alert regardless of stock.
pub fn rupture_alert(snapshot: &ProductSnapshot, settings: &AlertSettings) -> Option<Alert> {
    if !snapshot.product.active {
        return None;
    }
    let stock = snapshot.stock.as_ref()?;

    let average_daily_sales = snapshot.units_sold() as f64 / settings.rupture_window_days as f64;
    let current = f64::from(stock.quantity);

    if average_daily_sales > 0.0 && current < average_daily_sales * settings.rupture_cover_days {
        let days_of_stock = current / average_daily_sales;
        Some(Alert {
            product_id: snapshot.product.id,
            product_name: snapshot.product.name.clone(),
            sku: snapshot.product.sku.clone(),
            current_stock: stock.quantity,
            average_daily_sales: Some(average_daily_sales),
            days_until_expiration: None,
            reason: format!("Estoque para apenas {} dias", one_decimal(days_of_stock)),
            severity: rupture_severity(days_of_stock),
        })
    } else {
        None
    }
}

/// Render with one decimal place, ties rounded away from zero
fn one_decimal(value: f64) -> String {
    match Decimal::from_f64_retain(value) {
        Some(d) => format!(
            "{:.1}",
            d.round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero)
        ),
        None => format!("{:.1}", value),
    }
}

pub fn rupture_severity(days_of_stock: f64) -> Severity {
    if days_of_stock < RUPTURE_HIGH_DAYS {
        Severity::High
    } else if days_of_stock < RUPTURE_MEDIUM_DAYS {
        Severity::Medium
    } else {
        Severity::Low
    }
}

/// Overstock for one product.
///
/// The trigger compares stock against the raw window total, while the
/// reported `average_daily_sales` divides that total by the window length.
pub fn excess_alert(snapshot: &ProductSnapshot, settings: &AlertSettings) -> Option<Alert> {
    if !snapshot.product.active {
        return None;
    }
    let stock = snapshot.stock.as_ref()?;

    let total_sold = snapshot.units_sold();
    let monthly_sales = total_sold as f64;
    let current = f64::from(stock.quantity);

    if monthly_sales > 0.0 && current > monthly_sales * settings.excess_cover_months {
        let months_of_stock = current / monthly_sales;
        Some(Alert {
            product_id: snapshot.product.id,
            product_name: snapshot.product.name.clone(),
            sku: snapshot.product.sku.clone(),
            current_stock: stock.quantity,
            average_daily_sales: Some(total_sold as f64 / settings.excess_window_days as f64),
            days_until_expiration: None,
            reason: format!("Estoque para {} meses", one_decimal(months_of_stock)),
            severity: excess_severity(months_of_stock),
        })
    } else {
        None
    }
}

pub fn excess_severity(months_of_stock: f64) -> Severity {
    if months_of_stock > EXCESS_HIGH_MONTHS {
        Severity::High
    } else if months_of_stock > EXCESS_MEDIUM_MONTHS {
        Severity::Medium
    } else {
        Severity::Low
    }
}

/// Whole days until `expiration`, rounded toward negative infinity
pub fn days_until(expiration: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    (expiration - now).num_milliseconds().div_euclid(MILLIS_PER_DAY)
}

/// Expiry alert for a batch already inside the horizon; always emitted
pub fn validity_alert(batch: &ExpiringBatch, now: DateTime<Utc>) -> Alert {
    let days = days_until(batch.expiration_date, now);
    Alert {
        product_id: batch.product_id,
        product_name: batch.product_name.clone(),
        sku: batch.sku.clone(),
        current_stock: batch.quantity,
        average_daily_sales: None,
        days_until_expiration: Some(days),
        reason: format!("Vence em {} dias", days),
        severity: validity_severity(days),
    }
}

pub fn validity_severity(days_until_expiration: i64) -> Severity {
    if days_until_expiration < VALIDITY_HIGH_DAYS {
        Severity::High
    } else if days_until_expiration < VALIDITY_MEDIUM_DAYS {
        Severity::Medium
    } else {
        Severity::Low
    }
}

// ============================================================================
// Ranking & aggregation
// ============================================================================

/// Sort high before medium before low, keeping fetch order within a severity
pub fn rank_by_severity(mut alerts: Vec<Alert>) -> Vec<Alert> {
    alerts.sort_by_key(|a| a.severity);
    alerts
}

pub fn evaluate_rupture(snapshots: &[ProductSnapshot], settings: &AlertSettings) -> Vec<Alert> {
    rank_by_severity(
        snapshots
            .iter()
            .filter_map(|s| rupture_alert(s, settings))
            .collect(),
    )
}

pub fn evaluate_excess(snapshots: &[ProductSnapshot], settings: &AlertSettings) -> Vec<Alert> {
    rank_by_severity(
        snapshots
            .iter()
            .filter_map(|s| excess_alert(s, settings))
            .collect(),
    )
}

/// Evaluate batches fetched up to the horizon
pub fn evaluate_validity(batches: &[ExpiringBatch], now: DateTime<Utc>) -> Vec<Alert> {
    rank_by_severity(batches.iter().map(|b| validity_alert(b, now)).collect())
}

/// Dashboard summary; sales totals are all-time, alert counts are windowed
pub fn summarize(
    total_products: i64,
    sales: SalesSummary,
    rupture: &[Alert],
    excess: &[Alert],
    validity: &[Alert],
) -> DashboardMetrics {
    DashboardMetrics {
        total_products,
        total_sales: sales.count,
        total_revenue: sales.revenue,
        rupture_alerts: rupture.len(),
        excess_alerts: excess.len(),
        validity_alerts: validity.len(),
    }
}

/// Merge sales into one bucket per UTC calendar date, ascending.
///
/// `count` is the number of sales in the bucket, not the number of items.
pub fn group_sales_by_date(sales: &[SaleTotal]) -> Vec<SalesHistoryPoint> {
    let mut buckets: BTreeMap<NaiveDate, (Decimal, i64)> = BTreeMap::new();
    for sale in sales {
        let entry = buckets
            .entry(sale.date.date_naive())
            .or_insert((Decimal::ZERO, 0));
        entry.0 += sale.total;
        entry.1 += 1;
    }

    buckets
        .into_iter()
        .map(|(date, (total, count))| SalesHistoryPoint { date, total, count })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Product, SaleItemQuantity, StockRecord};
    use chrono::TimeZone;
    use uuid::Uuid;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 10, 12, 0, 0).unwrap()
    }

    fn snapshot(stock: Option<i32>, sold: &[i32]) -> ProductSnapshot {
        let tenant_id = Uuid::new_v4();
        let product = Product {
            id: Uuid::new_v4(),
            tenant_id,
            sku: "SKU-1".to_string(),
            name: "Arroz 5kg".to_string(),
            barcode: None,
            department: None,
            category: None,
            brand: None,
            cost_price: Decimal::new(1500, 2),
            sale_price: Decimal::new(2290, 2),
            active: true,
            created_at: now(),
            updated_at: now(),
        };
        ProductSnapshot {
            stock: stock.map(|quantity| StockRecord {
                product_id: product.id,
                tenant_id,
                quantity,
                min_stock: None,
                max_stock: None,
                updated_at: now(),
            }),
            product,
            sale_items: sold
                .iter()
                .map(|&quantity| SaleItemQuantity { quantity })
                .collect(),
        }
    }

    #[test]
    fn test_default_settings_are_valid() {
        assert_eq!(AlertSettings::default().validate(), Ok(()));
    }

    #[test]
    fn test_zero_window_rejected() {
        let settings = AlertSettings {
            rupture_window_days: 0,
            ..AlertSettings::default()
        };
        assert_eq!(
            settings.validate(),
            Err(SettingsError::NotPositive("rupture_window_days"))
        );
    }

    #[test]
    fn test_windows_from_clock() {
        let settings = AlertSettings::default();
        assert_eq!(settings.rupture_since(now()), now() - Duration::days(7));
        assert_eq!(settings.excess_since(now()), now() - Duration::days(30));
        assert_eq!(settings.validity_horizon(now()), now() + Duration::days(30));
    }

    #[test]
    fn test_product_without_stock_is_skipped() {
        let settings = AlertSettings::default();
        let s = snapshot(None, &[100]);
        assert!(rupture_alert(&s, &settings).is_none());
        assert!(excess_alert(&s, &settings).is_none());
    }

    #[test]
    fn test_inactive_product_is_skipped() {
        let settings = AlertSettings::default();
        let mut s = snapshot(Some(0), &[70]);
        s.product.active = false;
        assert!(rupture_alert(&s, &settings).is_none());
    }

    #[test]
    fn test_rupture_without_sales_never_alerts() {
        let settings = AlertSettings::default();
        assert!(rupture_alert(&snapshot(Some(0), &[]), &settings).is_none());
        assert!(rupture_alert(&snapshot(Some(-3), &[]), &settings).is_none());
    }

    #[test]
    fn test_rupture_boundaries() {
        let settings = AlertSettings::default();
        // 7 units in 7 days: one unit per day, so stock equals days of cover
        let at = |stock| rupture_alert(&snapshot(Some(stock), &[7]), &settings);

        assert_eq!(at(0).unwrap().severity, Severity::High);
        assert_eq!(at(1).unwrap().severity, Severity::Medium);
        assert_eq!(at(2).unwrap().severity, Severity::Low);
        assert!(at(3).is_none());
    }

    #[test]
    fn test_rupture_reason_uses_one_decimal() {
        let settings = AlertSettings::default();
        let alert = rupture_alert(&snapshot(Some(5), &[10, 11]), &settings).unwrap();
        assert_eq!(alert.reason, "Estoque para apenas 1.7 dias");
        assert_eq!(alert.average_daily_sales, Some(3.0));
        assert_eq!(alert.days_until_expiration, None);
    }

    #[test]
    fn test_reason_ties_round_up() {
        let settings = AlertSettings::default();
        // 28 units over 7 days, 1 on hand: 0.25 days
        let rupture = rupture_alert(&snapshot(Some(1), &[28]), &settings).unwrap();
        assert_eq!(rupture.reason, "Estoque para apenas 0.3 dias");
        assert_eq!(rupture.severity, Severity::High);

        // 9 on hand against 4 sold: 2.25 months
        let excess = excess_alert(&snapshot(Some(9), &[4]), &settings).unwrap();
        assert_eq!(excess.reason, "Estoque para 2.3 meses");
        assert_eq!(excess.severity, Severity::Low);
    }

    #[test]
    fn test_one_decimal() {
        assert_eq!(one_decimal(0.25), "0.3");
        assert_eq!(one_decimal(2.25), "2.3");
        assert_eq!(one_decimal(1.75), "1.8");
        assert_eq!(one_decimal(6.0), "6.0");
        assert_eq!(one_decimal(1.6666666666666667), "1.7");
    }

    #[test]
    fn test_excess_boundaries() {
        let settings = AlertSettings::default();
        let at = |stock| excess_alert(&snapshot(Some(stock), &[10]), &settings);

        assert!(at(20).is_none());
        assert_eq!(at(21).unwrap().severity, Severity::Low);
        assert_eq!(at(40).unwrap().severity, Severity::Low);
        assert_eq!(at(41).unwrap().severity, Severity::Medium);
        assert_eq!(at(60).unwrap().severity, Severity::Medium);
        assert_eq!(at(61).unwrap().severity, Severity::High);
    }

    #[test]
    fn test_excess_reports_daily_average_over_window() {
        let settings = AlertSettings::default();
        let alert = excess_alert(&snapshot(Some(90), &[15]), &settings).unwrap();
        assert_eq!(alert.average_daily_sales, Some(0.5));
        assert_eq!(alert.reason, "Estoque para 6.0 meses");
        assert_eq!(alert.severity, Severity::Medium);
    }

    #[test]
    fn test_excess_without_sales_never_alerts() {
        let settings = AlertSettings::default();
        assert!(excess_alert(&snapshot(Some(10_000), &[]), &settings).is_none());
    }

    #[test]
    fn test_days_until_floors() {
        let n = now();
        assert_eq!(days_until(n + Duration::hours(6 * 24 + 22), n), 6);
        assert_eq!(days_until(n + Duration::days(7), n), 7);
        assert_eq!(days_until(n + Duration::days(7) - Duration::milliseconds(1), n), 6);
        assert_eq!(days_until(n - Duration::hours(1), n), -1);
    }

    #[test]
    fn test_validity_severity_partition() {
        assert_eq!(validity_severity(-2), Severity::High);
        assert_eq!(validity_severity(6), Severity::High);
        assert_eq!(validity_severity(7), Severity::Medium);
        assert_eq!(validity_severity(14), Severity::Medium);
        assert_eq!(validity_severity(15), Severity::Low);
        assert_eq!(validity_severity(30), Severity::Low);
    }

    #[test]
    fn test_rank_is_stable() {
        let settings = AlertSettings::default();
        let mut low_a = rupture_alert(&snapshot(Some(2), &[7]), &settings).unwrap();
        low_a.sku = "A".to_string();
        let high = rupture_alert(&snapshot(Some(0), &[7]), &settings).unwrap();
        let mut low_b = low_a.clone();
        low_b.sku = "B".to_string();
        let medium = rupture_alert(&snapshot(Some(1), &[7]), &settings).unwrap();

        let ranked = rank_by_severity(vec![low_a, high, low_b, medium]);
        let order: Vec<(Severity, &str)> = ranked
            .iter()
            .map(|a| (a.severity, a.sku.as_str()))
            .collect();
        assert_eq!(
            order,
            vec![
                (Severity::High, "SKU-1"),
                (Severity::Medium, "SKU-1"),
                (Severity::Low, "A"),
                (Severity::Low, "B"),
            ]
        );
    }

    #[test]
    fn test_group_sales_by_date() {
        let day = |d, h| Utc.with_ymd_and_hms(2024, 3, d, h, 0, 0).unwrap();
        let sales = vec![
            SaleTotal { date: day(9, 18), total: Decimal::new(500, 2) },
            SaleTotal { date: day(8, 10), total: Decimal::new(1000, 2) },
            SaleTotal { date: day(9, 8), total: Decimal::new(250, 2) },
        ];

        let history = group_sales_by_date(&sales);
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].date, NaiveDate::from_ymd_opt(2024, 3, 8).unwrap());
        assert_eq!(history[0].count, 1);
        assert_eq!(history[1].total, Decimal::new(750, 2));
        assert_eq!(history[1].count, 2);
    }

    #[test]
    fn test_summarize_empty_tenant() {
        let metrics = summarize(0, SalesSummary::default(), &[], &[], &[]);
        assert_eq!(metrics, DashboardMetrics::default());
        assert_eq!(metrics.total_revenue, Decimal::ZERO);
    }
}
