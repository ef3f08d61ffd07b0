//! HTTP request handlers

pub mod admin;
pub mod ai;
pub mod analysis;
pub mod auth;
pub mod health;
pub mod ingestion;
pub mod metrics;

pub use admin::*;
pub use ai::*;
pub use analysis::*;
pub use auth::*;
pub use health::*;
pub use ingestion::*;
pub use metrics::*;
