//! Per-source reliability metrics and the health state machine

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use canasta_core::{AggregatorConfig, FetchOutcome, HealthStatus, SourceId};

/// Rolling reliability state for a single source
///
/// One instance per registered source, mutated only by the tracker;
/// persists across aggregation cycles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceMetrics {
    pub source_id: SourceId,
    pub success_rate: f64,
    pub avg_response_time: Duration,
    pub consecutive_failures: u32,
    pub health_status: HealthStatus,
    pub reliability_weight: f64,
    pub last_success: Option<DateTime<Utc>>,
}

impl SourceMetrics {
    /// Optimistic initial state before any evidence
    pub fn new(source_id: SourceId) -> Self {
        Self {
            source_id,
            success_rate: 1.0,
            avg_response_time: Duration::ZERO,
            consecutive_failures: 0,
            health_status: HealthStatus::Unknown,
            reliability_weight: 1.0,
            last_success: None,
        }
    }

    /// Fold one fetch outcome into the moving averages, then re-derive
    /// status and weight
    pub fn apply(
        &mut self,
        outcome: FetchOutcome,
        response_time: Option<Duration>,
        config: &AggregatorConfig,
    ) {
        let alpha = config.ema_alpha;

        match outcome {
            FetchOutcome::Success => {
                self.consecutive_failures = 0;
                self.last_success = Some(Utc::now());
                self.success_rate = alpha + (1.0 - alpha) * self.success_rate;

                if let Some(elapsed) = response_time {
                    self.avg_response_time = if self.avg_response_time.is_zero() {
                        elapsed
                    } else {
                        self.avg_response_time.mul_f64(1.0 - alpha) + elapsed.mul_f64(alpha)
                    };
                }
            }
            FetchOutcome::Timeout | FetchOutcome::Failure => {
                self.consecutive_failures += 1;
                self.success_rate = (1.0 - alpha) * self.success_rate;
            }
        }

        self.health_status = self.derive_status(config);
        self.reliability_weight = self.derive_weight(config);
    }

    fn derive_status(&self, config: &AggregatorConfig) -> HealthStatus {
        // A failure burst trips unhealthy even if the moving average
        // still looks good after a long healthy streak.
        if self.consecutive_failures >= config.failure_cap {
            return HealthStatus::Unhealthy;
        }

        if self.success_rate > config.healthy_threshold {
            HealthStatus::Healthy
        } else if self.success_rate < config.degraded_threshold {
            HealthStatus::Degraded
        } else {
            // Between the thresholds: hold the current tier
            self.health_status
        }
    }

    fn derive_weight(&self, config: &AggregatorConfig) -> f64 {
        match self.health_status {
            HealthStatus::Unknown => 1.0,
            HealthStatus::Healthy => self.success_rate.min(1.0),
            HealthStatus::Degraded => self.success_rate * config.degraded_weight_factor,
            HealthStatus::Unhealthy => config.floor_weight,
        }
    }
}
