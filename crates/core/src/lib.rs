//! Core types for the canasta price consensus engine
//!
//! This crate provides shared types used across all components:
//! - Source and product identifiers
//! - Price observations and fetch outcomes
//! - Consensus records and the emitted row shape
//! - Engine configuration and error taxonomy

pub mod config;
pub mod errors;
pub mod records;
pub mod types;

pub use config::*;
pub use errors::*;
pub use records::*;
pub use types::*;
