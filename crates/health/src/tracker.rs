//! Shared health state for all registered sources
//!
//! Uses DashMap for per-entry locking: updates to one source never
//! block reads or writes on another, and a snapshot never observes a
//! half-updated record.

use dashmap::DashMap;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, warn};

use canasta_core::{AggregatorConfig, FetchOutcome, HealthStatus, SourceId};

use crate::metrics::SourceMetrics;
use crate::report::{HealthReport, OverallHealth, SourceHealthSummary};

/// Process-wide per-source reliability registry
///
/// Written by the collection orchestrator after every fetch; read by
/// the consensus calculator via [`HealthTracker::weights_snapshot`].
#[derive(Debug)]
pub struct HealthTracker {
    config: AggregatorConfig,
    metrics: DashMap<SourceId, SourceMetrics>,
}

impl HealthTracker {
    pub fn new(config: AggregatorConfig) -> Self {
        Self {
            config,
            metrics: DashMap::new(),
        }
    }

    /// Register a source; idempotent, existing state is preserved
    pub fn register(&self, source_id: SourceId) {
        self.metrics
            .entry(source_id.clone())
            .or_insert_with(|| SourceMetrics::new(source_id));
    }

    /// Fold one fetch outcome into the source's rolling state
    pub fn record_outcome(
        &self,
        source_id: &SourceId,
        outcome: FetchOutcome,
        response_time: Option<Duration>,
    ) {
        let mut entry = self
            .metrics
            .entry(source_id.clone())
            .or_insert_with(|| SourceMetrics::new(source_id.clone()));

        let before = entry.health_status;
        entry.apply(outcome, response_time, &self.config);

        if entry.health_status != before {
            if entry.health_status == HealthStatus::Unhealthy {
                warn!(
                    source = %source_id,
                    failures = entry.consecutive_failures,
                    "source marked unhealthy"
                );
            } else {
                debug!(
                    source = %source_id,
                    from = %before,
                    to = %entry.health_status,
                    "source health transition"
                );
            }
        }
    }

    /// Point-in-time reliability weights for the given sources
    ///
    /// Each entry is read under its own lock; an unregistered source
    /// gets the optimistic default weight.
    pub fn weights_snapshot(&self, source_ids: &[SourceId]) -> HashMap<SourceId, f64> {
        source_ids
            .iter()
            .map(|id| {
                let weight = self
                    .metrics
                    .get(id)
                    .map(|m| m.reliability_weight)
                    .unwrap_or(1.0);
                (id.clone(), weight)
            })
            .collect()
    }

    /// Current metrics for one source
    pub fn metrics(&self, source_id: &SourceId) -> Option<SourceMetrics> {
        self.metrics.get(source_id).map(|m| m.clone())
    }

    /// All registered source ids
    pub fn source_ids(&self) -> Vec<SourceId> {
        self.metrics.iter().map(|e| e.key().clone()).collect()
    }

    /// Per-source summary plus an aggregate label for the monitoring
    /// surface
    pub fn health_report(&self) -> HealthReport {
        let mut sources = std::collections::BTreeMap::new();
        let mut healthy = 0usize;

        for entry in self.metrics.iter() {
            let m = entry.value();
            if m.health_status == HealthStatus::Healthy {
                healthy += 1;
            }
            sources.insert(
                entry.key().clone(),
                SourceHealthSummary {
                    health_status: m.health_status,
                    success_rate: m.success_rate,
                    reliability_weight: m.reliability_weight,
                    consecutive_failures: m.consecutive_failures,
                    last_success: m.last_success,
                },
            );
        }

        let overall_health = OverallHealth::from_counts(healthy, sources.len());

        HealthReport {
            generated_at: chrono::Utc::now(),
            sources,
            overall_health,
        }
    }
}
