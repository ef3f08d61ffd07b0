//! Route definitions for the Gôndola backend

use axum::{
    middleware,
    routing::{delete, get, post},
    Router,
};

use crate::{
    handlers,
    middleware::{api_key_middleware, auth_middleware},
    AppState,
};

/// Create API routes
pub fn api_routes(state: AppState) -> Router<AppState> {
    Router::new()
        // Health check (public)
        .route("/health", get(handlers::health_check))
        // Auth routes (public)
        .nest("/auth", auth_routes())
        // Store agent routes - API key
        .nest("/data", data_routes(state.clone()))
        // Protected routes - dashboard metrics
        .nest("/metrics", metrics_routes(state.clone()))
        // Protected routes - AI features
        .nest("/ai", ai_routes(state.clone()))
        // Protected routes - persisted analysis
        .nest("/analysis", analysis_routes(state.clone()))
        // Protected routes - administration
        .nest("/admin", admin_routes(state))
}

/// Authentication routes (public)
fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(handlers::register))
        .route("/login", post(handlers::login))
}

/// Ingestion routes (API key)
fn data_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/products", post(handlers::sync_products))
        .route("/stock", post(handlers::sync_stock))
        .route("/sales", post(handlers::sync_sales))
        .route("/validities", post(handlers::sync_validities))
        .route_layer(middleware::from_fn_with_state(state, api_key_middleware))
}

/// Metrics routes (protected)
fn metrics_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/dashboard", get(handlers::get_dashboard))
        .route("/rupture", get(handlers::get_rupture_alerts))
        .route("/excess", get(handlers::get_excess_alerts))
        .route("/validity", get(handlers::get_validity_alerts))
        .route("/sales-history", get(handlers::get_sales_history))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

/// AI routes (protected)
fn ai_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/suggestions", post(handlers::generate_suggestions))
        .route("/insights", get(handlers::get_insights))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

/// Analysis routes (protected)
fn analysis_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/run", post(handlers::run_analysis))
        .route("/latest", get(handlers::get_latest_analysis))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

/// Admin routes (protected, admin role checked in handlers)
fn admin_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/data", delete(handlers::clear_data))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::services::auth::encode_token;
    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
    };
    use shared::UserRole;
    use sqlx::postgres::PgPoolOptions;
    use std::sync::Arc;
    use tower::ServiceExt;
    use uuid::Uuid;

    const SECRET: &str = "test-secret";

    fn test_state() -> AppState {
        std::env::set_var("GONDOLA__DATABASE__URL", "postgres://localhost/gondola_test");
        std::env::set_var("GONDOLA__JWT__SECRET", SECRET);
        let config = Config::load().unwrap();
        // Never connects unless a handler touches the database
        let db = PgPoolOptions::new()
            .connect_lazy(&config.database.url)
            .unwrap();
        AppState {
            db,
            config: Arc::new(config),
        }
    }

    fn app() -> Router {
        let state = test_state();
        Router::new()
            .nest("/api/v1", api_routes(state.clone()))
            .with_state(state)
    }

    async fn status_of(request: Request<Body>) -> StatusCode {
        app().oneshot(request).await.unwrap().status()
    }

    #[tokio::test]
    async fn test_metrics_require_token() {
        let request = Request::builder()
            .uri("/api/v1/metrics/dashboard")
            .body(Body::empty())
            .unwrap();
        assert_eq!(status_of(request).await, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_metrics_reject_bad_token() {
        let request = Request::builder()
            .uri("/api/v1/metrics/rupture")
            .header(header::AUTHORIZATION, "Bearer not-a-jwt")
            .body(Body::empty())
            .unwrap();
        assert_eq!(status_of(request).await, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_data_routes_require_api_key() {
        let request = Request::builder()
            .method("POST")
            .uri("/api/v1/data/products")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("[]"))
            .unwrap();
        assert_eq!(status_of(request).await, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_admin_route_forbidden_for_members() {
        let token = encode_token(
            SECRET,
            3600,
            Uuid::new_v4(),
            Uuid::new_v4(),
            UserRole::Member,
        )
        .unwrap();
        let request = Request::builder()
            .method("DELETE")
            .uri("/api/v1/admin/data")
            .header(header::AUTHORIZATION, format!("Bearer {}", token))
            .body(Body::empty())
            .unwrap();
        assert_eq!(status_of(request).await, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_unknown_route_is_not_found() {
        let request = Request::builder()
            .uri("/api/v1/metrics/unknown")
            .body(Body::empty())
            .unwrap();
        assert_eq!(status_of(request).await, StatusCode::NOT_FOUND);
    }
}
