//! The full aggregation cycle: collect, filter, reconcile

use chrono::NaiveDate;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

use canasta_collector::{CollectionOrchestrator, SourceAdapter};
use canasta_core::{
    AggregationError, AggregationResult, AggregatorConfig, ConsensusRecord, PriceRow,
    ProductId, ProductInfo, ProductOutcome,
};
use canasta_health::{HealthReport, HealthTracker};

use crate::calculator::consensus;
use crate::outlier::filter_outliers;

/// Drives collect → filter → consensus cycles and owns the shared
/// health state those cycles feed
///
/// Cycles for different products are independent and may run
/// concurrently; the health tracker is the only state they share.
pub struct AggregationEngine {
    config: AggregatorConfig,
    orchestrator: CollectionOrchestrator,
    health: Arc<HealthTracker>,
}

impl AggregationEngine {
    pub fn new(config: AggregatorConfig, adapters: Vec<Arc<dyn SourceAdapter>>) -> Self {
        let health = Arc::new(HealthTracker::new(config.clone()));
        Self::with_health(config, adapters, health)
    }

    /// Build the engine around an externally owned tracker, letting a
    /// monitoring surface keep reading it independently
    pub fn with_health(
        config: AggregatorConfig,
        adapters: Vec<Arc<dyn SourceAdapter>>,
        health: Arc<HealthTracker>,
    ) -> Self {
        let orchestrator =
            CollectionOrchestrator::new(config.clone(), adapters, Arc::clone(&health));

        Self {
            config,
            orchestrator,
            health,
        }
    }

    pub fn health(&self) -> Arc<HealthTracker> {
        Arc::clone(&self.health)
    }

    pub fn health_report(&self) -> HealthReport {
        self.health.health_report()
    }

    /// Run one aggregation cycle for one product/period
    ///
    /// The weight snapshot is taken before collection starts, so this
    /// cycle's outcomes only influence the next cycle's weights.
    pub async fn aggregate(
        &self,
        product_id: &ProductId,
        period: NaiveDate,
    ) -> AggregationResult<ConsensusRecord> {
        let weights = self
            .health
            .weights_snapshot(&self.orchestrator.source_ids());

        let batch = self.orchestrator.collect(product_id).await;

        if batch.is_empty() {
            warn!(product = %product_id, "every source failed, no consensus emitted");
            return Err(AggregationError::NoSourcesAvailable {
                product_id: product_id.clone(),
            });
        }

        let surviving = filter_outliers(batch.observations, &self.config);
        if surviving.is_empty() {
            // The filter's own fallback makes this unreachable for a
            // non-empty batch; kept as a named decision point
            return Err(AggregationError::InsufficientData {
                product_id: product_id.clone(),
            });
        }

        let record = consensus(product_id, period, &surviving, &weights);

        debug!(
            product = %product_id,
            price = record.price,
            sources = record.num_sources,
            weight = record.reliability_weight,
            "consensus computed"
        );

        Ok(record)
    }

    /// Run independent cycles for many products concurrently
    ///
    /// Per-product failures are carried as structured outcomes; one
    /// product with no data never aborts the rest of the run.
    pub async fn aggregate_all(
        &self,
        products: &[ProductId],
        period: NaiveDate,
    ) -> Vec<ProductOutcome> {
        let cycles = products.iter().map(|product_id| async move {
            ProductOutcome {
                product_id: product_id.clone(),
                result: self.aggregate(product_id, period).await,
            }
        });

        let outcomes = futures::future::join_all(cycles).await;

        let emitted = outcomes.iter().filter(|o| o.is_success()).count();
        info!(
            products = products.len(),
            emitted,
            skipped = products.len() - emitted,
            "aggregation run complete"
        );

        outcomes
    }

    /// Aggregate a catalog of products and emit persistence-ready rows
    ///
    /// Products with no consensus (or missing catalog metadata) are
    /// logged and skipped.
    pub async fn aggregate_rows(
        &self,
        catalog: &HashMap<ProductId, ProductInfo>,
        period: NaiveDate,
    ) -> Vec<PriceRow> {
        let products: Vec<ProductId> = catalog.keys().cloned().collect();
        let outcomes = self.aggregate_all(&products, period).await;

        outcomes
            .iter()
            .filter_map(|outcome| match &outcome.result {
                Ok(record) => {
                    let info = catalog.get(&outcome.product_id)?;
                    Some(PriceRow::from_record(record, info))
                }
                Err(reason) => {
                    warn!(product = %outcome.product_id, %reason, "skipping product");
                    None
                }
            })
            .collect()
    }
}
