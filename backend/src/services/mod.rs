//! Business logic services for the Gôndola backend

pub mod ai;
pub mod analysis;
pub mod auth;
pub mod ingestion;
pub mod metrics;

pub use ai::AiService;
pub use analysis::{AnalysisScheduler, AnalysisService};
pub use auth::AuthService;
pub use ingestion::IngestionService;
pub use metrics::MetricsService;
