//! Shared types and models for the PrepPal demand forecasting platform
//!
//! This crate contains the domain types and pure calculations shared between
//! the backend, the dashboard (via WASM), and other components of the system.

pub mod models;
pub mod types;
pub mod validation;

pub use models::*;
pub use types::*;
pub use validation::*;
