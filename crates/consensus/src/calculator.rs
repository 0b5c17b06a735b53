//! Reliability-weighted consensus computation
//!
//! Pure functions over an already-collected batch: the same surviving
//! observations and weight snapshot always yield an identical record.

use chrono::NaiveDate;
use std::collections::HashMap;

use canasta_core::{ConsensusRecord, PriceObservation, ProductId, SourceId};

/// Weight assumed for a source absent from the snapshot; matches the
/// optimistic first-registration default
const DEFAULT_WEIGHT: f64 = 1.0;

/// Compute the consensus record for one product/period
///
/// `observations` must be non-empty; the caller is responsible for
/// mapping an empty batch to a structured no-data result first.
pub fn consensus(
    product_id: &ProductId,
    period: NaiveDate,
    observations: &[PriceObservation],
    weights: &HashMap<SourceId, f64>,
) -> ConsensusRecord {
    debug_assert!(!observations.is_empty(), "consensus over empty batch");

    let prices: Vec<f64> = observations.iter().map(|o| o.price).collect();

    let weight_of =
        |id: &SourceId| -> f64 { weights.get(id).copied().unwrap_or(DEFAULT_WEIGHT) };

    let total_weight: f64 = observations.iter().map(|o| weight_of(&o.source_id)).sum();

    let price = if total_weight > 0.0 {
        observations
            .iter()
            .map(|o| o.price * weight_of(&o.source_id))
            .sum::<f64>()
            / total_weight
    } else {
        // All weights zero: fall back to the unweighted mean
        mean(&prices)
    };

    // Arrival order, no duplicates
    let mut contributing_sources: Vec<SourceId> = Vec::with_capacity(observations.len());
    for o in observations {
        if !contributing_sources.contains(&o.source_id) {
            contributing_sources.push(o.source_id.clone());
        }
    }

    let reliability_weight = mean(
        &contributing_sources
            .iter()
            .map(|id| weight_of(id))
            .collect::<Vec<_>>(),
    )
    .clamp(0.0, 1.0);

    let price_min = prices.iter().copied().fold(f64::INFINITY, f64::min);
    let price_max = prices.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    let record = ConsensusRecord {
        product_id: product_id.clone(),
        period,
        price,
        price_min,
        price_max,
        price_std: sample_std(&prices),
        num_sources: observations.len(),
        contributing_sources,
        reliability_weight,
    };

    debug_assert!(record.validate(), "emitted record violates invariants");
    record
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation; 0.0 for fewer than two values
fn sample_std(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let variance =
        values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    variance.sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn period() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 14).unwrap()
    }

    fn obs(source: &str, price: f64) -> PriceObservation {
        PriceObservation::new(source, "arroz-1kg", price)
    }

    fn equal_weights(observations: &[PriceObservation], w: f64) -> HashMap<SourceId, f64> {
        observations
            .iter()
            .map(|o| (o.source_id.clone(), w))
            .collect()
    }

    #[test]
    fn test_single_observation() {
        let observations = vec![obs("coto", 1250.0)];
        let weights = equal_weights(&observations, 1.0);
        let record = consensus(&"arroz-1kg".into(), period(), &observations, &weights);

        assert_eq!(record.price, 1250.0);
        assert_eq!(record.num_sources, 1);
        assert_eq!(record.price_std, 0.0);
        assert_eq!(record.price_min, 1250.0);
        assert_eq!(record.price_max, 1250.0);
    }

    #[test]
    fn test_equal_weights_match_simple_mean() {
        let observations = vec![obs("coto", 100.0), obs("jumbo", 105.0), obs("laanonima", 98.0)];
        let weights = equal_weights(&observations, 1.0);
        let record = consensus(&"arroz-1kg".into(), period(), &observations, &weights);

        assert!((record.price - 101.0).abs() < 1e-9);
        assert_eq!(record.num_sources, 3);
        assert_eq!(record.price_min, 98.0);
        assert_eq!(record.price_max, 105.0);
    }

    #[test]
    fn test_weighting_pulls_toward_reliable_source() {
        let observations = vec![obs("coto", 100.0), obs("jumbo", 200.0)];
        let mut weights = HashMap::new();
        weights.insert(SourceId::from("coto"), 1.0);
        weights.insert(SourceId::from("jumbo"), 0.1);

        let record = consensus(&"arroz-1kg".into(), period(), &observations, &weights);
        assert!(record.price < 150.0);
        assert!((record.price - (100.0 + 20.0) / 1.1).abs() < 1e-9);
    }

    #[test]
    fn test_zero_weights_fall_back_to_mean() {
        let observations = vec![obs("coto", 100.0), obs("jumbo", 200.0)];
        let weights = equal_weights(&observations, 0.0);

        let record = consensus(&"arroz-1kg".into(), period(), &observations, &weights);
        assert!((record.price - 150.0).abs() < 1e-9);
        assert_eq!(record.reliability_weight, 0.0);
    }

    #[test]
    fn test_missing_weight_defaults_optimistic() {
        let observations = vec![obs("coto", 100.0), obs("ghost", 104.0)];
        let mut weights = HashMap::new();
        weights.insert(SourceId::from("coto"), 1.0);

        let record = consensus(&"arroz-1kg".into(), period(), &observations, &weights);
        assert!((record.price - 102.0).abs() < 1e-9);
    }

    #[test]
    fn test_contributing_sources_arrival_order() {
        let observations = vec![obs("jumbo", 100.0), obs("coto", 102.0), obs("ml", 99.0)];
        let weights = equal_weights(&observations, 1.0);

        let record = consensus(&"arroz-1kg".into(), period(), &observations, &weights);
        assert_eq!(
            record.contributing_sources,
            vec![SourceId::from("jumbo"), SourceId::from("coto"), SourceId::from("ml")]
        );
    }

    #[test]
    fn test_deterministic() {
        let observations = vec![obs("coto", 100.0), obs("jumbo", 105.0)];
        let weights = equal_weights(&observations, 0.7);

        let a = consensus(&"arroz-1kg".into(), period(), &observations, &weights);
        let b = consensus(&"arroz-1kg".into(), period(), &observations, &weights);
        assert_eq!(a, b);
    }

    proptest! {
        #[test]
        fn prop_equal_weights_equal_mean(
            prices in proptest::collection::vec(1.0f64..1e6, 1..10),
            w in 0.05f64..1.0,
        ) {
            let observations: Vec<PriceObservation> = prices
                .iter()
                .enumerate()
                .map(|(i, p)| obs(&format!("source-{i}"), *p))
                .collect();
            let weights = equal_weights(&observations, w);

            let record = consensus(&"arroz-1kg".into(), period(), &observations, &weights);
            let simple = prices.iter().sum::<f64>() / prices.len() as f64;
            prop_assert!((record.price - simple).abs() <= simple * 1e-6);
        }

        #[test]
        fn prop_price_within_extrema(
            prices in proptest::collection::vec(1.0f64..1e6, 1..10),
        ) {
            let observations: Vec<PriceObservation> = prices
                .iter()
                .enumerate()
                .map(|(i, p)| obs(&format!("source-{i}"), *p))
                .collect();
            let weights = equal_weights(&observations, 1.0);

            let record = consensus(&"arroz-1kg".into(), period(), &observations, &weights);
            prop_assert!(record.price_min <= record.price + 1e-9);
            prop_assert!(record.price <= record.price_max + 1e-9);
        }
    }
}
