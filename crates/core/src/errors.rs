//! Error types

use thiserror::Error;

use crate::ProductId;

/// Adapter-side fetch failures
///
/// Recovered at the collection orchestrator: they become per-source
/// outcome records and never propagate to the caller.
#[derive(Debug, Clone, Error)]
pub enum AdapterError {
    #[error("fetch timed out")]
    Timeout,

    #[error("fetch failed: {0}")]
    Failed(String),
}

impl AdapterError {
    pub fn failed(reason: impl Into<String>) -> Self {
        AdapterError::Failed(reason.into())
    }
}

/// Per-product aggregation failures
///
/// Abort consensus for a single product/period only; the surrounding
/// multi-product run continues.
#[derive(Debug, Clone, Error)]
pub enum AggregationError {
    #[error("no surviving observations for {product_id} after filtering")]
    InsufficientData { product_id: ProductId },

    #[error("every registered source failed for {product_id}")]
    NoSourcesAvailable { product_id: ProductId },
}

/// Result type aliases
pub type AdapterResult<T> = Result<T, AdapterError>;
pub type AggregationResult<T> = Result<T, AggregationError>;
