//! Authentication service for account registration, login, and API keys

use bcrypt::{hash, verify, DEFAULT_COST};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use shared::validation::{validate_email, validate_password};
use shared::UserRole;
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use crate::config::Config;
use crate::error::{AppError, AppResult};

/// Authentication service
#[derive(Clone)]
pub struct AuthService {
    db: PgPool,
    jwt_secret: String,
    access_token_expiry: i64,
}

/// Input for registering a new tenant with its first user
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterInput {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    pub email: String,
    pub password: String,
    #[validate(length(min = 1, max = 255))]
    pub tenant_name: String,
}

/// Response after successful registration
///
/// The API key is only returned here; the database keeps its hash.
#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub user_id: Uuid,
    pub tenant_id: Uuid,
    pub api_key: String,
}

/// JWT claims structure
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // User ID
    pub tenant_id: String,
    pub role: String,
    pub exp: i64,
    pub iat: i64,
}

/// Public user details returned on login
#[derive(Debug, Serialize)]
pub struct UserSummary {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

/// Login response
#[derive(Debug, Serialize)]
pub struct AuthTokens {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
    pub user: UserSummary,
}

/// User info from database
#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    tenant_id: Uuid,
    name: String,
    email: String,
    password_hash: String,
    role: String,
}

impl AuthService {
    /// Create a new AuthService instance
    pub fn new(db: PgPool, config: &Config) -> Self {
        Self {
            db,
            jwt_secret: config.jwt.secret.clone(),
            access_token_expiry: config.jwt.access_token_expiry,
        }
    }

    /// Register a new tenant and its admin user
    pub async fn register(&self, input: RegisterInput) -> AppResult<RegisterResponse> {
        input.validate()?;
        validate_email(&input.email).map_err(|e| AppError::Validation {
            field: "email".to_string(),
            message: e.to_string(),
            message_pt: "Formato de e-mail inválido".to_string(),
        })?;
        validate_password(&input.password).map_err(|e| AppError::Validation {
            field: "password".to_string(),
            message: e.to_string(),
            message_pt: "A senha deve ter pelo menos 8 caracteres".to_string(),
        })?;

        let email = input.email.trim().to_lowercase();

        let existing = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users WHERE email = $1")
            .bind(&email)
            .fetch_one(&self.db)
            .await?;

        if existing > 0 {
            return Err(AppError::Conflict {
                resource: "email".to_string(),
                message: "Email already registered".to_string(),
                message_pt: "E-mail já cadastrado".to_string(),
            });
        }

        let password_hash = hash(&input.password, DEFAULT_COST)
            .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))?;

        let api_key = generate_api_key();
        let api_key_hash = hash_api_key(&api_key);

        let mut tx = self.db.begin().await?;

        let tenant_id = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO tenants (name, api_key_hash)
            VALUES ($1, $2)
            RETURNING id
            "#,
        )
        .bind(input.tenant_name.trim())
        .bind(&api_key_hash)
        .fetch_one(&mut *tx)
        .await?;

        let user_id = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO users (tenant_id, name, email, password_hash, role)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            "#,
        )
        .bind(tenant_id)
        .bind(input.name.trim())
        .bind(&email)
        .bind(&password_hash)
        .bind(UserRole::Admin.as_str())
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(%tenant_id, %user_id, "Registered tenant");

        Ok(RegisterResponse {
            user_id,
            tenant_id,
            api_key,
        })
    }

    /// Authenticate user with email and password
    pub async fn login(&self, email: &str, password: &str) -> AppResult<AuthTokens> {
        let user = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, tenant_id, name, email, password_hash, role
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email.trim().to_lowercase())
        .fetch_optional(&self.db)
        .await?
        .ok_or(AppError::InvalidCredentials)?;

        let valid = verify(password, &user.password_hash)
            .map_err(|e| AppError::Internal(format!("Password verification failed: {}", e)))?;

        if !valid {
            return Err(AppError::InvalidCredentials);
        }

        let role = UserRole::parse(&user.role).unwrap_or_default();
        let access_token = self.issue_token(user.id, user.tenant_id, role)?;

        Ok(AuthTokens {
            access_token,
            token_type: "Bearer".to_string(),
            expires_in: self.access_token_expiry,
            user: UserSummary {
                id: user.id,
                name: user.name,
                email: user.email,
            },
        })
    }

    /// Resolve the tenant owning an API key
    pub async fn resolve_api_key(&self, api_key: &str) -> AppResult<Uuid> {
        sqlx::query_scalar::<_, Uuid>("SELECT id FROM tenants WHERE api_key_hash = $1")
            .bind(hash_api_key(api_key))
            .fetch_optional(&self.db)
            .await?
            .ok_or(AppError::InvalidApiKey)
    }

    /// Sign an access token for a user
    pub fn issue_token(&self, user_id: Uuid, tenant_id: Uuid, role: UserRole) -> AppResult<String> {
        encode_token(
            &self.jwt_secret,
            self.access_token_expiry,
            user_id,
            tenant_id,
            role,
        )
    }
}

/// Encode HS256 access token claims
pub fn encode_token(
    secret: &str,
    expiry_secs: i64,
    user_id: Uuid,
    tenant_id: Uuid,
    role: UserRole,
) -> AppResult<String> {
    let now = Utc::now();
    let claims = Claims {
        sub: user_id.to_string(),
        tenant_id: tenant_id.to_string(),
        role: role.as_str().to_string(),
        exp: (now + Duration::seconds(expiry_secs)).timestamp(),
        iat: now.timestamp(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(format!("Token generation failed: {}", e)))
}

/// Decode and validate an access token
pub fn decode_token(token: &str, secret: &str) -> AppResult<Claims> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => AppError::TokenExpired,
        _ => AppError::InvalidToken,
    })
}

/// Random tenant API key
fn generate_api_key() -> String {
    format!("gdl_{}", Uuid::new_v4().simple())
}

/// Hex SHA-256 of an API key, as stored in `tenants.api_key_hash`
pub fn hash_api_key(api_key: &str) -> String {
    let digest = Sha256::digest(api_key.as_bytes());
    digest.iter().map(|b| format!("{:02x}", b)).collect()
}
