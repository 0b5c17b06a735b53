//! Source adapter contract

use async_trait::async_trait;

use canasta_core::{AdapterResult, PriceObservation, ProductId, SourceId};

/// A price source the engine can query
///
/// Implementations wrap whatever transport a site needs (HTTP client,
/// markup parsing, rate limiting); the engine only sees this surface.
/// Adapters are registered by id before any aggregation cycle runs.
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    fn source_id(&self) -> SourceId;

    /// Fetch the current price for one product, or a typed failure
    /// distinguishing timeout from error
    async fn fetch(&self, product_id: &ProductId) -> AdapterResult<PriceObservation>;
}

/// Adapter serving a fixed price table; used for demo catalogs and as
/// a deterministic stand-in during testing
pub struct StaticAdapter {
    source_id: SourceId,
    prices: Vec<(ProductId, f64)>,
}

impl StaticAdapter {
    pub fn new(source_id: impl Into<SourceId>, prices: Vec<(ProductId, f64)>) -> Self {
        Self {
            source_id: source_id.into(),
            prices,
        }
    }
}

#[async_trait]
impl SourceAdapter for StaticAdapter {
    fn source_id(&self) -> SourceId {
        self.source_id.clone()
    }

    async fn fetch(&self, product_id: &ProductId) -> AdapterResult<PriceObservation> {
        self.prices
            .iter()
            .find(|(id, _)| id == product_id)
            .map(|(_, price)| {
                PriceObservation::new(self.source_id.clone(), product_id.clone(), *price)
            })
            .ok_or_else(|| {
                canasta_core::AdapterError::failed(format!("product {product_id} not listed"))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_static_adapter_hit() {
        let adapter = StaticAdapter::new(
            "coto",
            vec![(ProductId::from("leche-entera-1l"), 1250.0)],
        );

        let obs = adapter.fetch(&ProductId::from("leche-entera-1l")).await.unwrap();
        assert_eq!(obs.price, 1250.0);
        assert_eq!(obs.source_id, SourceId::from("coto"));
    }

    #[tokio::test]
    async fn test_static_adapter_miss() {
        let adapter = StaticAdapter::new("coto", vec![]);
        let err = adapter.fetch(&ProductId::from("pan-frances")).await;
        assert!(err.is_err());
    }
}
