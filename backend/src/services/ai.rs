//! AI service for promotion suggestions and daily insights
//!
//! Every call degrades to deterministic text when the model is disabled or
//! fails; callers never see a provider error.

use std::sync::Arc;

use chrono::Utc;
use serde::Deserialize;
use shared::{Alert, DailyInsight, DashboardMetrics, PromotionSuggestion, Severity};
use uuid::Uuid;

use crate::error::AppResult;
use crate::external::{GeminiClient, TextGenerator};
use crate::services::MetricsService;
use crate::AppState;

/// Number of alerts of each kind turned into suggestions
const SUGGESTIONS_PER_KIND: usize = 5;

/// Insight text used when the model cannot answer
pub const INSIGHT_UNAVAILABLE: &str = "Análise de IA temporariamente indisponível";

/// AI service
#[derive(Clone)]
pub struct AiService {
    metrics: MetricsService,
    generator: Option<Arc<dyn TextGenerator>>,
}

/// Insight fields as the model is asked to return them
#[derive(Debug, Deserialize)]
struct InsightReply {
    summary: Option<String>,
    #[serde(rename = "keyMetrics", default)]
    key_metrics: Vec<String>,
    #[serde(default)]
    recommendations: Vec<String>,
}

impl AiService {
    /// Create a new AiService; `None` disables the model
    pub fn new(metrics: MetricsService, generator: Option<Arc<dyn TextGenerator>>) -> Self {
        Self { metrics, generator }
    }

    /// AiService wired to Gemini when an API key is configured
    pub fn from_state(state: &AppState) -> Self {
        let generator: Option<Arc<dyn TextGenerator>> = if state.config.ai.is_enabled() {
            match GeminiClient::new(&state.config.ai) {
                Ok(client) => Some(Arc::new(client)),
                Err(e) => {
                    tracing::warn!(error = %e, "AI client unavailable");
                    None
                }
            }
        } else {
            None
        };

        Self::new(MetricsService::from_state(state), generator)
    }

    /// Promotions for the most urgent excess-stock and expiring products
    pub async fn generate_promotion_suggestions(
        &self,
        tenant_id: Uuid,
    ) -> AppResult<Vec<PromotionSuggestion>> {
        let (excess, validity) = tokio::try_join!(
            self.metrics.get_excess_stock_alerts(tenant_id),
            self.metrics.get_validity_alerts(tenant_id),
        )?;

        let mut suggestions = Vec::new();

        for alert in excess.iter().take(SUGGESTIONS_PER_KIND) {
            let prompt = format!(
                "Produto: {}. {}. Estoque atual: {} unidades. Sugira uma estratégia de promoção.",
                alert.product_name, alert.reason, alert.current_stock
            );
            let insight = self.short_insight(&prompt).await;
            suggestions.push(suggestion(
                alert,
                format!("Excesso de estoque: {}", alert.reason),
                excess_discount(alert.severity),
                insight,
            ));
        }

        for alert in validity.iter().take(SUGGESTIONS_PER_KIND) {
            let prompt = format!(
                "Produto: {}. {}. Quantidade: {} unidades. Sugira uma estratégia de promoção urgente.",
                alert.product_name, alert.reason, alert.current_stock
            );
            let insight = self.short_insight(&prompt).await;
            suggestions.push(suggestion(
                alert,
                format!("Validade próxima: {}", alert.reason),
                validity_discount(alert.severity),
                insight,
            ));
        }

        suggestions.sort_by_key(|s| s.priority);

        tracing::info!(%tenant_id, count = suggestions.len(), "Generated promotion suggestions");

        Ok(suggestions)
    }

    /// Executive summary of the tenant's current situation
    pub async fn generate_daily_insights(&self, tenant_id: Uuid) -> AppResult<DailyInsight> {
        let metrics = self.metrics.get_dashboard_metrics(tenant_id).await?;

        let Some(generator) = &self.generator else {
            return Ok(fallback_insight(&metrics));
        };

        match generator.generate(&insight_prompt(&metrics)).await {
            Ok(text) => match parse_insight(&text) {
                Some(insight) => return Ok(insight),
                None => tracing::warn!(%tenant_id, "Model reply contained no insight JSON"),
            },
            Err(e) => tracing::error!(%tenant_id, error = %e, "Error generating AI insights"),
        }

        Ok(fallback_insight(&metrics))
    }

    async fn short_insight(&self, prompt: &str) -> String {
        let Some(generator) = &self.generator else {
            return INSIGHT_UNAVAILABLE.to_string();
        };

        match generator.generate(prompt).await {
            Ok(text) => text.trim().to_string(),
            Err(e) => {
                tracing::error!(model = generator.model_name(), error = %e, "Error getting AI insight");
                INSIGHT_UNAVAILABLE.to_string()
            }
        }
    }
}

fn suggestion(
    alert: &Alert,
    reason: String,
    suggested_discount: u8,
    ai_insight: String,
) -> PromotionSuggestion {
    PromotionSuggestion {
        product_id: alert.product_id,
        product_name: alert.product_name.clone(),
        sku: alert.sku.clone(),
        reason,
        suggested_discount,
        priority: alert.severity,
        ai_insight,
    }
}

/// Discount in percent for an overstocked product
pub fn excess_discount(severity: Severity) -> u8 {
    match severity {
        Severity::High => 30,
        Severity::Medium => 20,
        Severity::Low => 15,
    }
}

/// Discount in percent for a product close to expiry
pub fn validity_discount(severity: Severity) -> u8 {
    match severity {
        Severity::High => 40,
        Severity::Medium => 25,
        Severity::Low => 15,
    }
}

fn insight_prompt(metrics: &DashboardMetrics) -> String {
    format!(
        r#"Você é um consultor de varejo especializado. Analise os seguintes dados e forneça insights acionáveis:

Métricas Gerais:
- Total de produtos: {}
- Total de vendas: {}
- Receita total: R$ {}
- Alertas de ruptura: {}
- Alertas de excesso: {}
- Alertas de validade: {}

Forneça:
1. Um resumo executivo (2-3 frases)
2. 3-5 métricas-chave para acompanhar
3. 3-5 recomendações práticas e específicas

Formato: JSON com campos "summary", "keyMetrics" (array), "recommendations" (array)"#,
        metrics.total_products,
        metrics.total_sales,
        metrics.total_revenue.round_dp(2),
        metrics.rupture_alerts,
        metrics.excess_alerts,
        metrics.validity_alerts,
    )
}

/// Text from the first `{` to the last `}`
fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

fn parse_insight(text: &str) -> Option<DailyInsight> {
    let reply: InsightReply = serde_json::from_str(extract_json_object(text)?).ok()?;

    Some(DailyInsight {
        summary: reply
            .summary
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| "Análise em andamento".to_string()),
        key_metrics: reply.key_metrics,
        recommendations: reply.recommendations,
        generated_at: Utc::now(),
    })
}

/// Insight built from the metrics alone
pub fn fallback_insight(metrics: &DashboardMetrics) -> DailyInsight {
    DailyInsight {
        summary: format!(
            "Sistema com {} produtos ativos, {} vendas realizadas. Atenção para {} alertas de ruptura e {} produtos próximos da validade.",
            metrics.total_products, metrics.total_sales, metrics.rupture_alerts, metrics.validity_alerts
        ),
        key_metrics: vec![
            format!("{} produtos em risco de ruptura", metrics.rupture_alerts),
            format!("{} produtos com excesso de estoque", metrics.excess_alerts),
            format!("{} produtos próximos da validade", metrics.validity_alerts),
        ],
        recommendations: vec![
            "Revisar níveis de estoque dos produtos em alerta".to_string(),
            "Criar promoções para produtos com excesso".to_string(),
            "Priorizar venda de produtos próximos da validade".to_string(),
        ],
        generated_at: Utc::now(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::repository::testing::MemoryGateway;
    use async_trait::async_trait;
    use chrono::{DateTime, Duration, TimeZone};
    use rust_decimal::Decimal;
    use shared::alerts::AlertSettings;

    struct CannedGenerator(Result<String, ()>);

    #[async_trait]
    impl TextGenerator for CannedGenerator {
        fn model_name(&self) -> &str {
            "canned"
        }

        async fn generate(&self, _prompt: &str) -> AppResult<String> {
            self.0
                .clone()
                .map_err(|_| AppError::AiServiceError("offline".to_string()))
        }
    }

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
    }

    fn service(gw: MemoryGateway, reply: Option<Result<String, ()>>) -> AiService {
        let metrics = MetricsService::new(Arc::new(gw), AlertSettings::default())
            .with_clock(fixed_now);
        let generator = reply.map(|r| Arc::new(CannedGenerator(r)) as Arc<dyn TextGenerator>);
        AiService::new(metrics, generator)
    }

    /// One low excess product and one high validity product
    fn store(tenant: Uuid) -> MemoryGateway {
        let mut gw = MemoryGateway::default();
        let oil = gw.product(tenant, "OLEO-900", "Óleo 900ml");
        gw.stock(tenant, oil, 25);
        gw.sell(tenant, oil, fixed_now(), 20, 10, Decimal::new(8990, 2));
        let milk = gw.product(tenant, "LEITE-1L", "Leite 1L");
        gw.batch(tenant, milk, 8, fixed_now() + Duration::days(3));
        gw
    }

    #[test]
    fn test_discount_tables() {
        assert_eq!(excess_discount(Severity::High), 30);
        assert_eq!(excess_discount(Severity::Medium), 20);
        assert_eq!(excess_discount(Severity::Low), 15);
        assert_eq!(validity_discount(Severity::High), 40);
        assert_eq!(validity_discount(Severity::Medium), 25);
        assert_eq!(validity_discount(Severity::Low), 15);
    }

    #[test]
    fn test_extract_json_object() {
        let text = "Claro! ```json\n{\"summary\": \"ok\", \"keyMetrics\": [\"a\"]}\n``` Espero ter ajudado.";
        assert_eq!(
            extract_json_object(text),
            Some("{\"summary\": \"ok\", \"keyMetrics\": [\"a\"]}")
        );
        assert_eq!(extract_json_object("sem json"), None);
        assert_eq!(extract_json_object("} invertido {"), None);
    }

    #[test]
    fn test_parse_insight_defaults_missing_fields() {
        let insight = parse_insight(r#"{"recommendations": ["Repor arroz"]}"#).unwrap();
        assert_eq!(insight.summary, "Análise em andamento");
        assert!(insight.key_metrics.is_empty());
        assert_eq!(insight.recommendations, vec!["Repor arroz".to_string()]);

        assert!(parse_insight("{ não é json }").is_none());
    }

    #[test]
    fn test_fallback_insight_mentions_counts() {
        let metrics = DashboardMetrics {
            total_products: 12,
            total_sales: 40,
            rupture_alerts: 2,
            excess_alerts: 1,
            validity_alerts: 3,
            ..Default::default()
        };
        let insight = fallback_insight(&metrics);
        assert!(insight.summary.starts_with("Sistema com 12 produtos ativos, 40 vendas"));
        assert_eq!(insight.key_metrics[0], "2 produtos em risco de ruptura");
        assert_eq!(insight.key_metrics[1], "1 produtos com excesso de estoque");
        assert_eq!(insight.recommendations.len(), 3);
    }

    #[tokio::test]
    async fn test_suggestions_ranked_with_discounts() {
        let tenant = Uuid::new_v4();
        let svc = service(store(tenant), Some(Ok("  Leve 3, pague 2  ".to_string())));

        let suggestions = svc.generate_promotion_suggestions(tenant).await.unwrap();

        assert_eq!(suggestions.len(), 2);
        assert_eq!(suggestions[0].sku, "LEITE-1L");
        assert_eq!(suggestions[0].priority, Severity::High);
        assert_eq!(suggestions[0].suggested_discount, 40);
        assert_eq!(suggestions[0].reason, "Validade próxima: Vence em 3 dias");
        assert_eq!(suggestions[0].ai_insight, "Leve 3, pague 2");
        assert_eq!(suggestions[1].sku, "OLEO-900");
        assert_eq!(suggestions[1].suggested_discount, 15);
        assert_eq!(
            suggestions[1].reason,
            "Excesso de estoque: Estoque para 2.5 meses"
        );
    }

    #[tokio::test]
    async fn test_suggestions_survive_provider_failure() {
        let tenant = Uuid::new_v4();
        let svc = service(store(tenant), Some(Err(())));

        let suggestions = svc.generate_promotion_suggestions(tenant).await.unwrap();

        assert_eq!(suggestions.len(), 2);
        assert!(suggestions.iter().all(|s| s.ai_insight == INSIGHT_UNAVAILABLE));
    }

    #[tokio::test]
    async fn test_suggestions_capped_per_kind() {
        let tenant = Uuid::new_v4();
        let mut gw = MemoryGateway::default();
        for i in 0..8 {
            let id = gw.product(tenant, &format!("SKU-{i}"), "Biscoito");
            gw.batch(tenant, id, 5, fixed_now() + Duration::days(i + 1));
        }

        let suggestions = service(gw, None)
            .generate_promotion_suggestions(tenant)
            .await
            .unwrap();

        assert_eq!(suggestions.len(), 5);
    }

    #[tokio::test]
    async fn test_daily_insight_from_model_reply() {
        let tenant = Uuid::new_v4();
        let reply = r#"Segue a análise:
{"summary": "Loja saudável", "keyMetrics": ["Giro"], "recommendations": ["Promover óleo"]}"#;
        let svc = service(store(tenant), Some(Ok(reply.to_string())));

        let insight = svc.generate_daily_insights(tenant).await.unwrap();

        assert_eq!(insight.summary, "Loja saudável");
        assert_eq!(insight.key_metrics, vec!["Giro".to_string()]);
        assert_eq!(insight.recommendations, vec!["Promover óleo".to_string()]);
    }

    #[tokio::test]
    async fn test_daily_insight_falls_back() {
        let tenant = Uuid::new_v4();

        for reply in [None, Some(Err(())), Some(Ok("sem json aqui".to_string()))] {
            let insight = service(store(tenant), reply)
                .generate_daily_insights(tenant)
                .await
                .unwrap();
            assert!(insight.summary.starts_with("Sistema com 2 produtos ativos"));
            assert_eq!(insight.key_metrics[1], "1 produtos com excesso de estoque");
            assert_eq!(insight.key_metrics[2], "1 produtos próximos da validade");
        }
    }
}
