//! Per-source health tracking
//!
//! Features:
//! - Exponential moving average success rate per source
//! - Health state machine with a hard consecutive-failure trip
//! - Reliability weights driving automatic failover in consensus
//! - Lock-per-source concurrent access via DashMap

pub mod metrics;
pub mod report;
pub mod tracker;

pub use metrics::SourceMetrics;
pub use report::{HealthReport, OverallHealth, SourceHealthSummary};
pub use tracker::HealthTracker;
