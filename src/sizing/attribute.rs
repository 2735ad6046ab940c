//! Attribute (deviation-rate) sample sizing.

use crate::constants::{attribute_reliability_factor, ATTRIBUTE_PILOT_SIZE};
use crate::types::ConfidenceLevel;

use super::{finite_population_correction, SizeDecision};

/// Fixed-size attribute sample.
///
/// Baseline is the worst-case proportion formula with p = q = 0.5:
///
/// ```text
/// n0 = ceil(z^2 * p * q / E^2),  E = ET / 100
/// ```
///
/// with the finite population correction applied when `n0/N > 5%`. When an
/// expected deviation rate is supplied, the reliability-factor size
/// `ceil(FC * 100 / (ET - PE))` is computed as well and the larger of the
/// two wins.
pub fn attribute_size(
    confidence: ConfidenceLevel,
    tolerable_error_pct: f64,
    expected_error_pct: f64,
    population: usize,
) -> SizeDecision {
    if population == 0 {
        return SizeDecision {
            size: 0,
            notes: vec!["Empty population: attribute sample size is 0.".to_string()],
        };
    }

    let z = confidence.z_score();
    let precision = tolerable_error_pct / 100.0;
    let n0 = (z * z * 0.25 / (precision * precision)).ceil() as usize;
    let mut size = finite_population_correction(n0, population);

    let mut notes = vec![format!(
        "Attribute baseline: n0 = ceil({z}^2 * 0.25 / {precision}^2) = {n0} at {}% confidence{}.",
        confidence.percent(),
        if size != n0 {
            format!(", FPCF-adjusted to {size}")
        } else {
            String::new()
        }
    )];

    if expected_error_pct > 0.0 {
        let factor = attribute_reliability_factor(confidence.percent());
        let n_factors =
            (factor * 100.0 / (tolerable_error_pct - expected_error_pct)).ceil() as usize;
        notes.push(format!(
            "Expected deviation {expected_error_pct}%: reliability-factor size \
             ceil({factor} * 100 / ({tolerable_error_pct} - {expected_error_pct})) = {n_factors}."
        ));
        if n_factors > size {
            size = n_factors;
        }
    }

    if size > population {
        notes.push(format!(
            "Theoretical size {size} exceeds the population of {population}; \
             examining every item (full census)."
        ));
        size = population;
    }

    SizeDecision { size, notes }
}

/// Pilot size for sequential ("stop-or-go") attribute sampling.
///
/// The pilot is a fixed 25 items (clamped to the population); expansion
/// after fieldwork is decided by the pilot calibrator.
pub fn sequential_pilot_size(population: usize) -> SizeDecision {
    let size = ATTRIBUTE_PILOT_SIZE.min(population);
    SizeDecision {
        size,
        notes: vec![format!(
            "Sequential (stop-or-go) attribute sampling: fixed pilot of {size} items; \
             expansion decided after fieldwork."
        )],
    }
}
