//! Shared types and models for the Gôndola retail platform
//!
//! This crate contains the domain models and the alert derivation engine
//! shared between the backend and its tests.

pub mod alerts;
pub mod models;
pub mod types;
pub mod validation;

pub use models::*;
pub use types::*;
pub use validation::*;
