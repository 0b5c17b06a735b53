//! Concurrent multi-source collection

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use canasta_core::{
    AdapterError, AggregatorConfig, FetchOutcome, PriceObservation, ProductId, SourceId,
};
use canasta_health::HealthTracker;

use crate::adapter::SourceAdapter;

/// Everything one collection cycle produced for one product
#[derive(Debug, Default)]
pub struct CollectedBatch {
    /// Successful observations, in arrival order
    pub observations: Vec<PriceObservation>,
    /// One outcome per registered source, present even on failure
    pub outcomes: HashMap<SourceId, FetchOutcome>,
}

impl CollectedBatch {
    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }
}

/// Fans one product's fetch out to every registered adapter
///
/// All fetches are dispatched before any is awaited; a semaphore bounds
/// how many run at once. Each fetch carries its own timeout, and every
/// outcome is fed to the health tracker before [`collect`] returns.
///
/// [`collect`]: CollectionOrchestrator::collect
pub struct CollectionOrchestrator {
    config: AggregatorConfig,
    adapters: Vec<Arc<dyn SourceAdapter>>,
    health: Arc<HealthTracker>,
    semaphore: Arc<Semaphore>,
}

impl CollectionOrchestrator {
    pub fn new(
        config: AggregatorConfig,
        adapters: Vec<Arc<dyn SourceAdapter>>,
        health: Arc<HealthTracker>,
    ) -> Self {
        for adapter in &adapters {
            health.register(adapter.source_id());
        }

        let semaphore = Arc::new(Semaphore::new(config.max_concurrent_fetches.max(1)));

        Self {
            config,
            adapters,
            health,
            semaphore,
        }
    }

    pub fn source_ids(&self) -> Vec<SourceId> {
        self.adapters.iter().map(|a| a.source_id()).collect()
    }

    /// Collect one batch of observations for a product
    ///
    /// Never errors: if every source fails the batch is empty but the
    /// outcome map is still complete.
    pub async fn collect(&self, product_id: &ProductId) -> CollectedBatch {
        type FetchResult = (FetchOutcome, Option<PriceObservation>, Option<std::time::Duration>);

        let mut handles: Vec<(SourceId, JoinHandle<FetchResult>)> =
            Vec::with_capacity(self.adapters.len());

        for adapter in &self.adapters {
            let adapter = Arc::clone(adapter);
            let semaphore = Arc::clone(&self.semaphore);
            let product = product_id.clone();
            let timeout = self.config.request_timeout;
            let source_id = adapter.source_id();

            let handle = tokio::spawn(async move {
                let _permit = match semaphore.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(_) => return (FetchOutcome::Failure, None, None),
                };

                let start = Instant::now();
                match tokio::time::timeout(timeout, adapter.fetch(&product)).await {
                    Ok(Ok(obs)) => {
                        if obs.price.is_finite() && obs.price > 0.0 {
                            (FetchOutcome::Success, Some(obs), Some(start.elapsed()))
                        } else {
                            warn!(source = %obs.source_id, price = obs.price, "rejecting non-positive price");
                            (FetchOutcome::Failure, None, None)
                        }
                    }
                    Ok(Err(AdapterError::Timeout)) => (FetchOutcome::Timeout, None, None),
                    Ok(Err(err)) => {
                        debug!(error = %err, "adapter fetch failed");
                        (FetchOutcome::Failure, None, None)
                    }
                    Err(_) => (FetchOutcome::Timeout, None, None),
                }
            });

            handles.push((source_id, handle));
        }

        let mut batch = CollectedBatch::default();

        for (source_id, handle) in handles {
            let (outcome, observation, elapsed) = match handle.await {
                Ok(result) => result,
                Err(err) => {
                    warn!(source = %source_id, error = %err, "fetch task panicked");
                    (FetchOutcome::Failure, None, None)
                }
            };

            self.health.record_outcome(&source_id, outcome, elapsed);
            batch.outcomes.insert(source_id, outcome);
            if let Some(obs) = observation {
                batch.observations.push(obs);
            }
        }

        debug!(
            product = %product_id,
            observations = batch.observations.len(),
            sources = batch.outcomes.len(),
            "collection cycle complete"
        );

        batch
    }
}
