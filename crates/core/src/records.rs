//! Consensus record and emitted row types

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{AggregationError, ProductId, SourceId};

/// The reconciled price for one product in one period
///
/// Created fresh each aggregation cycle; immutable once emitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsensusRecord {
    pub product_id: ProductId,
    pub period: NaiveDate,
    pub price: f64,
    pub price_min: f64,
    pub price_max: f64,
    pub price_std: f64,
    pub num_sources: usize,
    /// Contributing source ids in observation arrival order, no duplicates
    pub contributing_sources: Vec<SourceId>,
    /// Mean reliability weight of the contributing sources
    pub reliability_weight: f64,
}

impl ConsensusRecord {
    /// Check the emitted-record invariants. Violations are programming
    /// errors, not expected runtime conditions.
    pub fn validate(&self) -> bool {
        self.price > 0.0
            && self.num_sources >= 1
            && self.price_min <= self.price
            && self.price <= self.price_max
            && !self.contributing_sources.is_empty()
            && (0.0..=1.0).contains(&self.reliability_weight)
    }

    /// Spread between the highest and lowest surviving price
    pub fn price_range(&self) -> f64 {
        self.price_max - self.price_min
    }
}

/// Static catalog metadata for a tracked product
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductInfo {
    pub sku: String,
    pub name: String,
    pub division: String,
    pub province: String,
}

/// One flat row per product per period, in the shape the external
/// store persists
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceRow {
    pub date: NaiveDate,
    pub store: String,
    pub sku: String,
    pub name: String,
    pub price: f64,
    pub division: String,
    pub province: String,
    pub source: String,
    pub price_sources: Vec<SourceId>,
    pub num_sources: usize,
    pub price_min: f64,
    pub price_max: f64,
    pub price_std: f64,
    pub reliability_weight: f64,
}

impl PriceRow {
    pub const CONSENSUS_SOURCE: &'static str = "consensus";

    pub fn from_record(record: &ConsensusRecord, info: &ProductInfo) -> Self {
        Self {
            date: record.period,
            store: Self::CONSENSUS_SOURCE.to_string(),
            sku: info.sku.clone(),
            name: info.name.clone(),
            price: record.price,
            division: info.division.clone(),
            province: info.province.clone(),
            source: Self::CONSENSUS_SOURCE.to_string(),
            price_sources: record.contributing_sources.clone(),
            num_sources: record.num_sources,
            price_min: record.price_min,
            price_max: record.price_max,
            price_std: record.price_std,
            reliability_weight: record.reliability_weight,
        }
    }
}

/// Result of one aggregation cycle for one product
///
/// Per-product failures are structured data, never faults: a failed
/// product carries its reason and the surrounding run continues.
#[derive(Debug, Clone)]
pub struct ProductOutcome {
    pub product_id: ProductId,
    pub result: Result<ConsensusRecord, AggregationError>,
}

impl ProductOutcome {
    pub fn record(&self) -> Option<&ConsensusRecord> {
        self.result.as_ref().ok()
    }

    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_record() -> ConsensusRecord {
        ConsensusRecord {
            product_id: ProductId::from("leche-entera-1l"),
            period: NaiveDate::from_ymd_opt(2025, 3, 14).unwrap(),
            price: 101.0,
            price_min: 98.0,
            price_max: 105.0,
            price_std: 3.6,
            num_sources: 3,
            contributing_sources: vec!["coto".into(), "jumbo".into(), "laanonima".into()],
            reliability_weight: 1.0,
        }
    }

    #[test]
    fn test_record_validates() {
        assert!(sample_record().validate());
    }

    #[test]
    fn test_empty_sources_invalid() {
        let mut record = sample_record();
        record.contributing_sources.clear();
        assert!(!record.validate());
    }

    #[test]
    fn test_row_conversion() {
        let record = sample_record();
        let info = ProductInfo {
            sku: "leche-entera-1l".to_string(),
            name: "Leche entera 1L".to_string(),
            division: "Leche, lácteos y huevos".to_string(),
            province: "Nacional".to_string(),
        };

        let row = PriceRow::from_record(&record, &info);
        assert_eq!(row.source, "consensus");
        assert_eq!(row.price, record.price);
        assert_eq!(row.price_sources.len(), 3);
        assert_eq!(row.date, record.period);
    }
}
