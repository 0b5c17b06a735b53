//! Consensus price aggregation
//!
//! Features:
//! - Modified Z-score / MAD outlier rejection with safety fallbacks
//! - Reliability-weighted consensus with an unweighted-mean fallback
//! - Deterministic records from identical batches and weight snapshots
//! - Concurrent multi-product aggregation runs

pub mod calculator;
pub mod engine;
pub mod outlier;

pub use calculator::consensus;
pub use engine::AggregationEngine;
pub use outlier::filter_outliers;
