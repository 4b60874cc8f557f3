//! Shared types and models for the Costbook ledger
//!
//! This crate contains the domain model, unit normalization and validation
//! helpers shared between the backend and other components of the system.

pub mod models;
pub mod types;
pub mod units;
pub mod validation;

pub use models::*;
pub use types::*;
pub use units::*;
pub use validation::*;
