//! Statistical outlier rejection
//!
//! Uses the modified Z-score over the median absolute deviation, which
//! stays robust in the presence of the very outliers it is detecting.

use tracing::{debug, warn};

use canasta_core::{AggregatorConfig, PriceObservation};

/// Scale factor relating MAD to the standard deviation of a normal
/// distribution
const MAD_SCALE: f64 = 0.6745;

/// Drop statistically anomalous observations from a batch
///
/// Three named guards keep the filter from destroying real data:
/// - batches below the minimum size pass through untouched (too small
///   to estimate dispersion),
/// - a zero MAD means every price is identical, so nothing is flagged,
/// - if filtering would remove everything, the original batch is
///   returned instead.
pub fn filter_outliers(
    observations: Vec<PriceObservation>,
    config: &AggregatorConfig,
) -> Vec<PriceObservation> {
    if observations.len() < config.min_observations_for_outliers {
        return observations;
    }

    let prices: Vec<f64> = observations.iter().map(|o| o.price).collect();
    let med = median(&prices);

    let deviations: Vec<f64> = prices.iter().map(|p| (p - med).abs()).collect();
    let mad = median(&deviations);

    if mad == 0.0 {
        return observations;
    }

    let surviving: Vec<PriceObservation> = observations
        .iter()
        .filter(|o| {
            let score = MAD_SCALE * (o.price - med) / mad;
            let keep = score.abs() <= config.outlier_threshold;
            if !keep {
                debug!(
                    source = %o.source_id,
                    price = o.price,
                    score,
                    "dropping outlier observation"
                );
            }
            keep
        })
        .cloned()
        .collect();

    if surviving.is_empty() {
        warn!(
            count = observations.len(),
            "filter would remove every observation, keeping full batch"
        );
        return observations;
    }

    surviving
}

/// Median of an unsorted slice; 0.0 for an empty slice
fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn obs(source: &str, price: f64) -> PriceObservation {
        PriceObservation::new(source, "arroz-1kg", price)
    }

    fn batch(prices: &[f64]) -> Vec<PriceObservation> {
        prices
            .iter()
            .enumerate()
            .map(|(i, p)| obs(&format!("source-{i}"), *p))
            .collect()
    }

    fn config() -> AggregatorConfig {
        AggregatorConfig::default()
    }

    #[test]
    fn test_median_odd_even() {
        assert_eq!(median(&[3.0, 1.0, 2.0]), 2.0);
        assert_eq!(median(&[4.0, 1.0, 2.0, 3.0]), 2.5);
        assert_eq!(median(&[]), 0.0);
    }

    #[test]
    fn test_small_batch_untouched() {
        let b = batch(&[100.0, 9999.0]);
        let surviving = filter_outliers(b.clone(), &config());
        assert_eq!(surviving, b);
    }

    #[test]
    fn test_identical_prices_untouched() {
        let b = batch(&[250.0, 250.0, 250.0, 250.0]);
        let surviving = filter_outliers(b.clone(), &config());
        assert_eq!(surviving.len(), 4);
    }

    #[test]
    fn test_gross_outlier_removed() {
        let b = batch(&[100.0, 102.0, 98.0, 500.0]);
        let surviving = filter_outliers(b, &config());

        assert_eq!(surviving.len(), 3);
        assert!(surviving.iter().all(|o| o.price < 200.0));
    }

    #[test]
    fn test_tight_cluster_survives() {
        let b = batch(&[100.0, 105.0, 98.0]);
        let surviving = filter_outliers(b, &config());
        assert_eq!(surviving.len(), 3);
    }

    proptest! {
        #[test]
        fn prop_small_batches_unchanged(prices in proptest::collection::vec(1.0f64..1e6, 0..3)) {
            let b = batch(&prices);
            let surviving = filter_outliers(b.clone(), &config());
            prop_assert_eq!(surviving, b);
        }

        #[test]
        fn prop_identical_prices_unchanged(price in 1.0f64..1e6, n in 3usize..12) {
            let b = batch(&vec![price; n]);
            let surviving = filter_outliers(b, &config());
            prop_assert_eq!(surviving.len(), n);
        }

        #[test]
        fn prop_never_empties_nonempty_batch(prices in proptest::collection::vec(1.0f64..1e6, 1..16)) {
            let b = batch(&prices);
            let surviving = filter_outliers(b, &config());
            prop_assert!(!surviving.is_empty());
        }
    }
}
