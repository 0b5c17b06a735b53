//! Health report types for the external monitoring surface

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use canasta_core::{HealthStatus, SourceId};

/// Aggregate label across all registered sources
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverallHealth {
    Healthy,
    Degraded,
    Critical,
    Unknown,
}

impl OverallHealth {
    /// Healthy when at least three quarters of sources are healthy,
    /// degraded at half, critical below that
    pub fn from_counts(healthy: usize, total: usize) -> Self {
        if total == 0 {
            return OverallHealth::Unknown;
        }
        let ratio = healthy as f64 / total as f64;
        if ratio >= 0.75 {
            OverallHealth::Healthy
        } else if ratio >= 0.5 {
            OverallHealth::Degraded
        } else {
            OverallHealth::Critical
        }
    }
}

impl fmt::Display for OverallHealth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            OverallHealth::Healthy => "healthy",
            OverallHealth::Degraded => "degraded",
            OverallHealth::Critical => "critical",
            OverallHealth::Unknown => "unknown",
        };
        write!(f, "{s}")
    }
}

/// One source's entry in the report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceHealthSummary {
    pub health_status: HealthStatus,
    pub success_rate: f64,
    pub reliability_weight: f64,
    pub consecutive_failures: u32,
    pub last_success: Option<DateTime<Utc>>,
}

/// Snapshot of every source's health plus the aggregate label
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthReport {
    pub generated_at: DateTime<Utc>,
    pub sources: BTreeMap<SourceId, SourceHealthSummary>,
    pub overall_health: OverallHealth,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overall_thresholds() {
        assert_eq!(OverallHealth::from_counts(4, 4), OverallHealth::Healthy);
        assert_eq!(OverallHealth::from_counts(3, 4), OverallHealth::Healthy);
        assert_eq!(OverallHealth::from_counts(2, 4), OverallHealth::Degraded);
        assert_eq!(OverallHealth::from_counts(1, 4), OverallHealth::Critical);
        assert_eq!(OverallHealth::from_counts(0, 0), OverallHealth::Unknown);
    }
}
