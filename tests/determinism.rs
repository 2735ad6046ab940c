//! Property tests for the selection and planning invariants.

use muestreo::selection::systematic_indices;
use muestreo::{
    plan, ConfidenceLevel, NonStatisticalMode, PopulationRow, SamplingParameters,
};
use proptest::prelude::*;

fn make_rows(n: usize) -> Vec<PopulationRow> {
    (0..n)
        .map(|i| PopulationRow::new(format!("tx-{i}"), (i as f64 + 1.0) * 7.5))
        .collect()
}

proptest! {
    #[test]
    fn selection_is_deterministic(
        count in 0usize..500,
        seed in any::<u64>(),
        population in 0usize..2_000,
    ) {
        let a = systematic_indices(count, seed, population);
        let b = systematic_indices(count, seed, population);
        prop_assert_eq!(a, b);
    }

    #[test]
    fn selection_respects_bounds(
        count in 0usize..500,
        seed in any::<u64>(),
        population in 0usize..2_000,
    ) {
        let indices = systematic_indices(count, seed, population);
        prop_assert!(indices.len() <= population);
        for pair in indices.windows(2) {
            prop_assert!(pair[0] < pair[1]);
        }
        if let Some(&last) = indices.last() {
            prop_assert!(last < population);
        }
    }

    #[test]
    fn census_threshold_yields_full_coverage(
        population in 1usize..500,
        seed in any::<u64>(),
    ) {
        // Any request at or above 95% of the population is a census.
        let count = (population as f64 * 0.95).ceil() as usize;
        let indices = systematic_indices(count, seed, population);
        prop_assert_eq!(indices, (0..population).collect::<Vec<_>>());
    }

    #[test]
    fn requested_count_is_honored_below_threshold(
        population in 100usize..1_500,
        seed in any::<u64>(),
    ) {
        // Far enough below the census threshold the draw must deliver
        // exactly the requested number of unique indices.
        let count = population / 2;
        let indices = systematic_indices(count, seed, population);
        prop_assert_eq!(indices.len(), count);
    }

    #[test]
    fn planned_sample_sizes_stay_within_population(
        population in 0usize..300,
        seed in any::<u64>(),
        tolerable in 1.0f64..20.0,
    ) {
        let rows = make_rows(population);
        let params = SamplingParameters::Attribute {
            confidence: ConfidenceLevel::NinetyFive,
            tolerable_error_pct: tolerable,
            expected_error_pct: 0.0,
            sequential: false,
        };
        let results = plan(&rows, &params, seed).unwrap();
        prop_assert!(results.sample_size <= rows.len());
    }

    #[test]
    fn non_statistical_plans_are_reproducible(
        population in 1usize..300,
        requested in 0usize..100,
        seed in any::<u64>(),
    ) {
        let rows = make_rows(population);
        let params = SamplingParameters::NonStatistical {
            sample_size: requested,
            mode: NonStatisticalMode::Systematic,
        };
        let a = plan(&rows, &params, seed).unwrap();
        let b = plan(&rows, &params, seed).unwrap();
        prop_assert_eq!(a, b);
    }
}
