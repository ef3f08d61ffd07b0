//! Request middleware

pub mod auth;

pub use auth::{
    api_key_middleware, auth_middleware, require_admin, AuthTenant, AuthUser, CurrentTenant,
    CurrentUser,
};
