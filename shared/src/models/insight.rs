//! AI-generated promotion and insight models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Severity;

/// A promotion proposed for an overstocked or expiring product
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromotionSuggestion {
    pub product_id: Uuid,
    pub product_name: String,
    pub sku: String,
    pub reason: String,
    /// Discount in percent
    pub suggested_discount: u8,
    pub priority: Severity,
    pub ai_insight: String,
}

/// Daily executive summary for a tenant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyInsight {
    pub summary: String,
    pub key_metrics: Vec<String>,
    pub recommendations: Vec<String>,
    pub generated_at: DateTime<Utc>,
}

/// A persisted daily insight
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub content: DailyInsight,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_suggestion_serializes_priority_lowercase() {
        let suggestion = PromotionSuggestion {
            product_id: Uuid::nil(),
            product_name: "Leite 1L".to_string(),
            sku: "LEITE-1L".to_string(),
            reason: "Validade próxima: Vence em 3 dias".to_string(),
            suggested_discount: 40,
            priority: Severity::High,
            ai_insight: "Leve 2, pague 1".to_string(),
        };

        let json = serde_json::to_value(&suggestion).unwrap();
        assert_eq!(json["priority"], "high");
        assert_eq!(json["suggested_discount"], 40);
    }
}
