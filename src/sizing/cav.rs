//! Classical variables (mean-per-unit) sample sizing.

use crate::types::ConfidenceLevel;

use super::SizeDecision;

/// Final CAV size from a designed (or pilot-calibrated) sigma:
///
/// ```text
/// n = ceil((N * Z * sigma / TE)^2)
/// ```
///
/// clamped to the population.
pub fn cav_size(
    confidence: ConfidenceLevel,
    sigma: f64,
    tolerable_error: f64,
    population: usize,
) -> SizeDecision {
    if population == 0 {
        return SizeDecision {
            size: 0,
            notes: vec!["Empty population: CAV sample size is 0.".to_string()],
        };
    }

    let z = confidence.z_score();
    let raw = (population as f64 * z * sigma / tolerable_error).powi(2).ceil() as usize;
    let mut notes = vec![format!(
        "CAV mean-per-unit size: ceil(({population} * {z} * {sigma:.2} / \
         {tolerable_error:.2})^2) = {raw}."
    )];

    let size = if raw > population {
        notes.push(format!(
            "Theoretical size {raw} exceeds the population of {population}; \
             examining every item (full census)."
        ));
        population
    } else {
        raw
    };

    SizeDecision { size, notes }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn moderate_sigma_yields_formula_size() {
        // (1000 * 1.96 * 25 / 5000)^2 = 9.8^2 = 96.04 -> 97.
        let decision = cav_size(ConfidenceLevel::NinetyFive, 25.0, 5_000.0, 1_000);
        assert_eq!(decision.size, 97);
    }

    #[test]
    fn huge_sigma_falls_back_to_census() {
        let decision = cav_size(ConfidenceLevel::NinetyFive, 500.0, 1_000.0, 200);
        assert_eq!(decision.size, 200);
        assert!(decision
            .notes
            .iter()
            .any(|note| note.contains("full census")));
    }

    #[test]
    fn empty_population_is_zero() {
        assert_eq!(cav_size(ConfidenceLevel::Ninety, 10.0, 100.0, 0).size, 0);
    }
}
