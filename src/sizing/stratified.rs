//! Theoretical total size for stratified sampling.

use crate::population::PopulationSummary;
use crate::types::ConfidenceLevel;

use super::{finite_population_correction, SizeDecision};

/// Theoretical stratified total:
///
/// ```text
/// n = ceil((N * Z * sigma / TE_abs)^2),  TE_abs = ET% * V
/// ```
///
/// Sigma is the population's sample standard deviation; when the
/// dispersion is zero or unusable it is estimated as `V / sqrt(N)`. The
/// finite population correction applies as for attribute sampling, and
/// the result never exceeds the population. A caller-supplied override
/// replaces the whole computation upstream.
pub fn stratified_theoretical_size(
    confidence: ConfidenceLevel,
    tolerable_error_pct: f64,
    summary: &PopulationSummary,
) -> SizeDecision {
    let population = summary.count;
    if population == 0 {
        return SizeDecision {
            size: 0,
            notes: vec!["Empty population: stratified sample size is 0.".to_string()],
        };
    }

    let tolerable_abs = tolerable_error_pct / 100.0 * summary.total_value;
    if tolerable_abs <= 0.0 || !tolerable_abs.is_finite() {
        return SizeDecision {
            size: 0,
            notes: vec![format!(
                "Population value is {:.2}: absolute tolerable error is not \
                 positive, stratified size is 0.",
                summary.total_value
            )],
        };
    }

    let mut notes = Vec::new();
    let sigma = if summary.std_dev > 0.0 && summary.std_dev.is_finite() {
        summary.std_dev
    } else {
        let estimate = summary.total_value / (population as f64).sqrt();
        notes.push(format!(
            "Population dispersion unavailable; sigma estimated as V/sqrt(N) = {estimate:.2}."
        ));
        estimate
    };

    let z = confidence.z_score();
    let n0 = (population as f64 * z * sigma / tolerable_abs).powi(2).ceil() as usize;
    let mut size = finite_population_correction(n0, population);
    notes.push(format!(
        "Stratified theoretical size: ceil(({population} * {z} * {sigma:.2} / \
         {tolerable_abs:.2})^2) = {n0}{}.",
        if size != n0 {
            format!(", FPCF-adjusted to {size}")
        } else {
            String::new()
        }
    ));

    if size > population {
        notes.push(format!(
            "Theoretical size {size} exceeds the population of {population}; \
             examining every item (full census)."
        ));
        size = population;
    }

    SizeDecision { size, notes }
}
