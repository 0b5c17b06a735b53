//! Configuration types

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Aggregation engine configuration
///
/// All thresholds are tunable; the defaults are the reference values
/// the engine was calibrated with.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregatorConfig {
    /// Deadline for a single adapter fetch
    #[serde(with = "duration_secs")]
    pub request_timeout: Duration,
    /// Maximum in-flight fetches per collection cycle
    pub max_concurrent_fetches: usize,
    /// Modified Z-score cutoff for outlier rejection
    pub outlier_threshold: f64,
    /// Below this batch size, outlier detection is skipped entirely
    pub min_observations_for_outliers: usize,
    /// Consecutive failures that force a source unhealthy
    pub failure_cap: u32,
    /// Smoothing factor for the success-rate moving average
    pub ema_alpha: f64,
    /// Success rate above which a source is promoted to healthy
    pub healthy_threshold: f64,
    /// Success rate below which a source is demoted to degraded
    pub degraded_threshold: f64,
    /// Weight multiplier applied to degraded sources
    pub degraded_weight_factor: f64,
    /// Weight of an unhealthy source; never zero, so a lone unhealthy
    /// source can still carry a damped vote
    pub floor_weight: f64,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(30),
            max_concurrent_fetches: 4,
            outlier_threshold: 3.5,
            min_observations_for_outliers: 3,
            failure_cap: 5,
            ema_alpha: 0.2,
            healthy_threshold: 0.8,
            degraded_threshold: 0.5,
            degraded_weight_factor: 0.5,
            floor_weight: 0.1,
        }
    }
}

mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_secs(u64::deserialize(d)?))
    }
}
