//! Numeric reference scenarios for sizing, allocation, and inference.

use muestreo::inference::upper_error_limit_pct;
use muestreo::pilot::stop_or_go_expansion;
use muestreo::sizing::mus_size;
use muestreo::stratify::{allocate, Stratum};
use muestreo::{
    plan, AllocationMethod, ConfidenceLevel, NegativePolicy, PilotPhase, PoissonTier,
    PopulationRow, SamplingParameters, StratificationBasis,
};

fn rows_with_values(values: &[f64]) -> Vec<PopulationRow> {
    values
        .iter()
        .enumerate()
        .map(|(i, &v)| PopulationRow::new(format!("tx-{i}"), v))
        .collect()
}

#[test]
fn mus_reference_scenario() {
    // V = 1,000,000, TE = 50,000, EE = 0, RIA = 5 (95% tier, FC = 3.0):
    // n = ceil(1,000,000 * 3.0 / 50,000) = 60 and J = 1,000,000 / 60.
    let sizing = mus_size(50_000.0, 0.0, 5.0, 1_000_000.0, 100_000);
    assert_eq!(sizing.size, 60);
    assert!((sizing.interval - 16_666.666_666_666_668).abs() < 1e-6);
}

#[test]
fn mus_degenerate_denominator_never_panics() {
    // TE = 1000, EE = 900 at the 95% tier (FE = 1.6) drives the
    // denominator negative; the engine caps instead of erroring.
    let rows = rows_with_values(&vec![250.0; 1_200]);
    let params = SamplingParameters::Mus {
        tolerable_error: 1_000.0,
        expected_error: 900.0,
        risk_incorrect_acceptance: 5.0,
        negative_policy: NegativePolicy::Zero,
        extract_certainty: false,
        pilot: false,
    };
    let results = plan(&rows, &params, 7).unwrap();
    assert!(results.sample_size <= 500);
    assert!(results
        .methodology_notes
        .iter()
        .any(|note| note.contains("Expected error consumes")));
}

#[test]
fn neyman_allocation_matches_closed_form() {
    // Two synthetic strata with known dispersion. Expected counts follow
    // n_h = round(n * N_h * sigma_h / sum(N_i * sigma_i)) within +/- 1.
    let low: Vec<f64> = (0..40).map(|i| 100.0 + (i % 5) as f64).collect();
    let high: Vec<f64> = (0..20).map(|i| 1_000.0 + i as f64 * 250.0).collect();
    let strata = vec![
        Stratum {
            label: "low".into(),
            rows: rows_with_values(&low),
        },
        Stratum {
            label: "high".into(),
            rows: rows_with_values(&high),
        },
    ];

    let sigma = |values: &[f64]| {
        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        (values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0)).sqrt()
    };
    let weight_low = 40.0 * sigma(&low);
    let weight_high = 20.0 * sigma(&high);
    let total = 18usize;
    let expected_low = (total as f64 * weight_low / (weight_low + weight_high)).round();
    let expected_high = (total as f64 * weight_high / (weight_low + weight_high)).round();

    let (counts, _) = allocate(total, &strata, AllocationMethod::Neyman, None);
    assert!((counts[0] as f64 - expected_low).abs() <= 1.0);
    assert!((counts[1] as f64 - expected_high).abs() <= 1.0);
}

#[test]
fn zero_exception_pilot_needs_no_expansion() {
    let decision = stop_or_go_expansion(0, 95.0, 5.0, 25, 10_000);
    assert_eq!(decision.additional, 0);
    assert_eq!(decision.phase, PilotPhase::PilotOnly);
}

#[test]
fn inference_sanity_zero_exceptions() {
    // n = 100, k = 0 at 95% confidence: upper limit 3.0 / 100 * 100 = 3.0%.
    let upper = upper_error_limit_pct(PoissonTier::NinetyFive, 0, 100);
    assert!((upper - 3.0).abs() < 1e-12);
}

#[test]
fn attribute_sizes_track_confidence() {
    let rows = rows_with_values(&vec![50.0; 20_000]);
    let size_at = |confidence| {
        let params = SamplingParameters::Attribute {
            confidence,
            tolerable_error_pct: 5.0,
            expected_error_pct: 0.0,
            sequential: false,
        };
        plan(&rows, &params, 1).unwrap().sample_size
    };
    let n90 = size_at(ConfidenceLevel::Ninety);
    let n95 = size_at(ConfidenceLevel::NinetyFive);
    let n99 = size_at(ConfidenceLevel::NinetyNine);
    assert!(n90 < n95 && n95 < n99);
    // ceil(1.96^2 * 0.25 / 0.05^2) = 385 with no FPCF at N = 20,000.
    assert_eq!(n95, 385);
}

#[test]
fn stratified_conservation_invariants() {
    let values: Vec<f64> = (1..=200).map(|i| i as f64 * 50.0).collect();
    let rows = rows_with_values(&values);
    let params = SamplingParameters::Stratified {
        basis: StratificationBasis::Monetary,
        strata_count: 4,
        allocation: AllocationMethod::Proportional,
        certainty_threshold: 9_000.0,
        confidence: ConfidenceLevel::NinetyFive,
        tolerable_error_pct: 5.0,
        size_override: Some(40),
        manual_allocations: None,
    };
    let results = plan(&rows, &params, 99).unwrap();
    let strata = results.strata_metadata.as_ref().unwrap();

    let sampled: usize = strata.iter().map(|s| s.sample_size).sum();
    assert_eq!(sampled, results.sample_size);

    let covered: usize = strata.iter().map(|s| s.population_size).sum();
    assert_eq!(covered, rows.len());

    // The certainty stratum is examined in full.
    let certainty = strata.iter().find(|s| s.label == "Certainty").unwrap();
    assert_eq!(certainty.population_size, certainty.sample_size);
}

#[test]
fn stratified_manual_allocation_is_verbatim() {
    let values: Vec<f64> = (1..=90).map(|i| i as f64).collect();
    let rows = rows_with_values(&values);
    let params = SamplingParameters::Stratified {
        basis: StratificationBasis::Monetary,
        strata_count: 3,
        allocation: AllocationMethod::Manual,
        certainty_threshold: f64::INFINITY,
        confidence: ConfidenceLevel::NinetyFive,
        tolerable_error_pct: 5.0,
        size_override: Some(0),
        manual_allocations: Some(vec![5, 3, 2]),
    };
    let results = plan(&rows, &params, 4).unwrap();
    let strata = results.strata_metadata.as_ref().unwrap();
    let per_stratum: Vec<usize> = strata.iter().map(|s| s.sample_size).collect();
    assert_eq!(per_stratum, vec![5, 3, 2]);
    assert_eq!(results.sample_size, 10);
}
