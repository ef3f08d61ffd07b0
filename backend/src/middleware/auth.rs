//! Authentication middleware
//!
//! JWT authentication for dashboard users, API-key authentication for store
//! agents, and role checks

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::{IntoResponse, Response},
};
use shared::UserRole;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::services::auth::decode_token;
use crate::services::AuthService;
use crate::AppState;

/// Authenticated user information extracted from JWT
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub tenant_id: Uuid,
    pub role: UserRole,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}

/// Tenant resolved from a store agent's API key
#[derive(Clone, Copy, Debug)]
pub struct AuthTenant {
    pub tenant_id: Uuid,
}

/// Bearer token from the Authorization header
fn bearer_token(request: &Request) -> Option<&str> {
    request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

fn missing_credentials() -> Response {
    AppError::Unauthorized {
        message: "Missing or invalid Authorization header".to_string(),
        message_pt: "Cabeçalho Authorization ausente ou inválido".to_string(),
    }
    .into_response()
}

/// Authentication middleware that validates JWT tokens
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let Some(token) = bearer_token(&request) else {
        return missing_credentials();
    };

    let auth_user = match decode_token(token, &state.config.jwt.secret).and_then(auth_user_from) {
        Ok(user) => user,
        Err(e) => return e.into_response(),
    };

    request.extensions_mut().insert(auth_user);

    next.run(request).await
}

fn auth_user_from(claims: crate::services::auth::Claims) -> AppResult<AuthUser> {
    let user_id = Uuid::parse_str(&claims.sub).map_err(|_| AppError::InvalidToken)?;
    let tenant_id = Uuid::parse_str(&claims.tenant_id).map_err(|_| AppError::InvalidToken)?;
    let role = UserRole::parse(&claims.role).ok_or(AppError::InvalidToken)?;

    Ok(AuthUser {
        user_id,
        tenant_id,
        role,
    })
}

/// Authentication middleware that resolves a tenant API key
pub async fn api_key_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let Some(api_key) = bearer_token(&request) else {
        return missing_credentials();
    };

    let auth_service = AuthService::new(state.db.clone(), &state.config);
    let tenant_id = match auth_service.resolve_api_key(api_key).await {
        Ok(id) => id,
        Err(e) => {
            tracing::warn!("Rejected store agent request: {}", e);
            return e.into_response();
        }
    };

    request.extensions_mut().insert(AuthTenant { tenant_id });

    next.run(request).await
}

/// Extractor for authenticated user
/// Use this in handlers to get the current user
#[derive(Clone, Debug)]
pub struct CurrentUser(pub AuthUser);

#[axum::async_trait]
impl<S> axum::extract::FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .map(CurrentUser)
            .ok_or_else(|| AppError::Unauthorized {
                message: "Authentication required".to_string(),
                message_pt: "Autenticação necessária".to_string(),
            })
    }
}

/// Extractor for the tenant behind an API key
#[derive(Clone, Copy, Debug)]
pub struct CurrentTenant(pub AuthTenant);

#[axum::async_trait]
impl<S> axum::extract::FromRequestParts<S> for CurrentTenant
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthTenant>()
            .copied()
            .map(CurrentTenant)
            .ok_or(AppError::InvalidApiKey)
    }
}

/// Role guard for use in handlers
pub fn require_admin(user: &AuthUser) -> AppResult<()> {
    if user.is_admin() {
        Ok(())
    } else {
        Err(AppError::InsufficientPermissions)
    }
}
