//! Tests for the alert derivation engine
//! Verifies rupture, excess and validity rules, ranking, and history grouping

use chrono::{DateTime, Duration, TimeZone, Utc};
use proptest::prelude::*;
use rust_decimal::Decimal;
use shared::alerts::{
    days_until, evaluate_excess, evaluate_rupture, evaluate_validity, excess_alert,
    group_sales_by_date, rank_by_severity, rupture_alert, summarize, validity_alert,
    AlertSettings,
};
use shared::{
    Alert, DashboardMetrics, ExpiringBatch, Product, ProductSnapshot, SaleItemQuantity, SaleTotal,
    SalesSummary, Severity, StockRecord,
};
use uuid::Uuid;

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 20, 15, 45, 0).unwrap()
}

fn snapshot(sku: &str, stock: Option<i32>, sold: &[i32]) -> ProductSnapshot {
    let tenant_id = Uuid::new_v4();
    let product_id = Uuid::new_v4();
    ProductSnapshot {
        product: Product {
            id: product_id,
            tenant_id,
            sku: sku.to_string(),
            name: format!("Produto {}", sku),
            barcode: None,
            department: None,
            category: None,
            brand: None,
            cost_price: Decimal::new(500, 2),
            sale_price: Decimal::new(799, 2),
            active: true,
            created_at: now(),
            updated_at: now(),
        },
        stock: stock.map(|quantity| StockRecord {
            product_id,
            tenant_id,
            quantity,
            min_stock: None,
            max_stock: None,
            updated_at: now(),
        }),
        sale_items: sold
            .iter()
            .map(|&quantity| SaleItemQuantity { quantity })
            .collect(),
    }
}

fn batch(sku: &str, quantity: i32, expiration_date: DateTime<Utc>) -> ExpiringBatch {
    ExpiringBatch {
        product_id: Uuid::new_v4(),
        product_name: format!("Produto {}", sku),
        sku: sku.to_string(),
        quantity,
        expiration_date,
    }
}

fn severity_strategy() -> impl Strategy<Value = Severity> {
    prop_oneof![
        Just(Severity::High),
        Just(Severity::Medium),
        Just(Severity::Low),
    ]
}

// =============================================================================
// End-to-end scenarios
// =============================================================================

mod scenarios {
    use super::*;

    #[test]
    fn rupture_medium_for_one_point_seven_days() {
        // 21 units over 7 days, 5 on hand
        let alerts = evaluate_rupture(
            &[snapshot("ARROZ", Some(5), &[10, 11])],
            &AlertSettings::default(),
        );

        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].severity, Severity::Medium);
        assert_eq!(alerts[0].reason, "Estoque para apenas 1.7 dias");
        assert_eq!(alerts[0].current_stock, 5);
    }

    #[test]
    fn excess_low_for_two_and_a_half_months() {
        let alerts = evaluate_excess(
            &[snapshot("OLEO", Some(25), &[10])],
            &AlertSettings::default(),
        );

        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].severity, Severity::Low);
        assert_eq!(alerts[0].reason, "Estoque para 2.5 meses");
        // Displayed average divides by the 30-day window
        let avg = alerts[0].average_daily_sales.unwrap();
        assert!((avg - 10.0 / 30.0).abs() < 1e-9);
    }

    #[test]
    fn batch_expiring_in_seven_days_is_medium() {
        let alerts = evaluate_validity(&[batch("IOGURTE", 12, now() + Duration::days(7))], now());

        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].days_until_expiration, Some(7));
        assert_eq!(alerts[0].severity, Severity::Medium);
        assert_eq!(alerts[0].reason, "Vence em 7 dias");
        assert_eq!(alerts[0].current_stock, 12);
    }

    #[test]
    fn empty_tenant_dashboard_is_zero() {
        let metrics = summarize(0, SalesSummary::default(), &[], &[], &[]);
        assert_eq!(metrics, DashboardMetrics::default());
        assert_eq!(metrics.total_revenue, Decimal::ZERO);
    }

    #[test]
    fn mixed_catalogue_ranks_each_rule() {
        let settings = AlertSettings::default();
        let catalogue = vec![
            snapshot("LOW", Some(20), &[35]),   // 5/day, 4 days: no rupture
            snapshot("MED", Some(8), &[35]),    // 1.6 days: medium
            snapshot("HIGH", Some(2), &[35]),   // 0.4 days: high
            snapshot("NONE", None, &[100]),     // no stock record
            snapshot("IDLE", Some(0), &[]),     // no sales
        ];

        let skus: Vec<String> = evaluate_rupture(&catalogue, &settings)
            .into_iter()
            .map(|a| a.sku)
            .collect();
        assert_eq!(skus, vec!["HIGH", "MED"]);
    }

    #[test]
    fn expired_batch_is_high_with_negative_days() {
        let alert = validity_alert(&batch("PAO", 3, now() - Duration::hours(30)), now());
        assert_eq!(alert.days_until_expiration, Some(-2));
        assert_eq!(alert.severity, Severity::High);
    }
}

// =============================================================================
// Boundaries
// =============================================================================

mod boundaries {
    use super::*;

    /// Severity of a rupture alert for `stock` units after selling 7 per day
    fn rupture_at(stock: i32) -> Option<Severity> {
        rupture_alert(&snapshot("B", Some(stock), &[49]), &AlertSettings::default())
            .map(|a| a.severity)
    }

    #[test]
    fn rupture_day_boundaries() {
        // 7 units per day: stock 7 = 1.0 day, 14 = 2.0 days, 21 = 3.0 days
        assert_eq!(rupture_at(6), Some(Severity::High));
        assert_eq!(rupture_at(7), Some(Severity::Medium));
        assert_eq!(rupture_at(13), Some(Severity::Medium));
        assert_eq!(rupture_at(14), Some(Severity::Low));
        assert_eq!(rupture_at(20), Some(Severity::Low));
        assert_eq!(rupture_at(21), None);
    }

    fn excess_at(stock: i32) -> Option<Severity> {
        excess_alert(&snapshot("B", Some(stock), &[10]), &AlertSettings::default())
            .map(|a| a.severity)
    }

    #[test]
    fn excess_month_boundaries() {
        assert_eq!(excess_at(20), None);
        assert_eq!(excess_at(21), Some(Severity::Low));
        assert_eq!(excess_at(40), Some(Severity::Low));
        assert_eq!(excess_at(41), Some(Severity::Medium));
        assert_eq!(excess_at(60), Some(Severity::Medium));
        assert_eq!(excess_at(61), Some(Severity::High));
    }

    #[test]
    fn validity_uses_floor() {
        let almost_seven = now() + Duration::hours(6 * 24 + 23);
        let alert = validity_alert(&batch("B", 1, almost_seven), now());
        assert_eq!(alert.days_until_expiration, Some(6));
        assert_eq!(alert.severity, Severity::High);

        assert_eq!(days_until(now() + Duration::days(15), now()), 15);
        assert_eq!(
            validity_alert(&batch("B", 1, now() + Duration::days(15)), now()).severity,
            Severity::Low
        );
        assert_eq!(
            validity_alert(&batch("B", 1, now() + Duration::days(14)), now()).severity,
            Severity::Medium
        );
    }
}

// =============================================================================
// Properties
// =============================================================================

mod properties {
    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        /// Without sales there is no forecast, so no rupture alert
        #[test]
        fn prop_no_sales_no_rupture(stock in -10i32..10_000) {
            let alert = rupture_alert(&snapshot("P", Some(stock), &[]), &AlertSettings::default());
            prop_assert!(alert.is_none());
        }

        /// Rupture fires exactly when stock covers fewer than 3 days
        #[test]
        fn prop_rupture_trigger(
            stock in 0i32..500,
            sold in prop::collection::vec(1i32..50, 1..10)
        ) {
            let settings = AlertSettings::default();
            let units: i64 = sold.iter().map(|&q| i64::from(q)).sum();
            let average = units as f64 / 7.0;
            let alert = rupture_alert(&snapshot("P", Some(stock), &sold), &settings);

            prop_assert_eq!(alert.is_some(), f64::from(stock) < average * 3.0);
            if let Some(alert) = alert {
                let days = f64::from(stock) / average;
                let expected = if days < 1.0 {
                    Severity::High
                } else if days < 2.0 {
                    Severity::Medium
                } else {
                    Severity::Low
                };
                prop_assert_eq!(alert.severity, expected);
            }
        }

        /// Excess fires exactly when stock exceeds twice the 30-day total
        #[test]
        fn prop_excess_trigger(
            stock in 0i32..5_000,
            sold in prop::collection::vec(1i32..50, 0..10)
        ) {
            let units: i64 = sold.iter().map(|&q| i64::from(q)).sum();
            let alert = excess_alert(&snapshot("P", Some(stock), &sold), &AlertSettings::default());

            prop_assert_eq!(alert.is_some(), units > 0 && i64::from(stock) > units * 2);
        }

        /// Days until expiration are floored
        #[test]
        fn prop_validity_days_floor(minutes in -10_000i64..50_000) {
            let expiration = now() + Duration::minutes(minutes);
            let days = days_until(expiration, now());

            prop_assert!(days * 24 * 60 <= minutes);
            prop_assert!(minutes < (days + 1) * 24 * 60);
        }

        /// Ranking groups by severity and keeps input order within a group
        #[test]
        fn prop_ranking_is_stable(severities in prop::collection::vec(severity_strategy(), 0..30)) {
            let alerts: Vec<Alert> = severities
                .iter()
                .enumerate()
                .map(|(i, &severity)| {
                    let mut alert = validity_alert(&batch(&i.to_string(), 1, now()), now());
                    alert.severity = severity;
                    alert
                })
                .collect();

            let ranked = rank_by_severity(alerts);

            prop_assert_eq!(ranked.len(), severities.len());
            for pair in ranked.windows(2) {
                prop_assert!(pair[0].severity <= pair[1].severity);
                if pair[0].severity == pair[1].severity {
                    let a: usize = pair[0].sku.parse().unwrap();
                    let b: usize = pair[1].sku.parse().unwrap();
                    prop_assert!(a < b);
                }
            }
        }

        /// History conserves totals and counts sales, one bucket per date
        #[test]
        fn prop_history_grouping(
            sales in prop::collection::vec((0i64..60 * 24, 0i64..100_000), 0..50)
        ) {
            let records: Vec<SaleTotal> = sales
                .iter()
                .map(|&(hours_ago, cents)| SaleTotal {
                    date: now() - Duration::hours(hours_ago),
                    total: Decimal::new(cents, 2),
                })
                .collect();

            let history = group_sales_by_date(&records);

            let count: i64 = history.iter().map(|p| p.count).sum();
            let total: Decimal = history.iter().map(|p| p.total).sum();
            let expected: Decimal = records.iter().map(|r| r.total).sum();
            prop_assert_eq!(count, records.len() as i64);
            prop_assert_eq!(total, expected);
            for pair in history.windows(2) {
                prop_assert!(pair[0].date < pair[1].date);
            }
        }
    }
}
