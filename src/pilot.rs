//! Pilot-phase calibration and post-pilot expansion decisions.
//!
//! Pilot sizes are fixed constants per method (25 for sequential
//! attribute, 30 for MUS, 50 for CAV). After fieldwork on the pilot, the
//! calibrator either recalibrates a design parameter (CAV sigma) or
//! decides how many additional items the sample needs.

use crate::constants::{
    ATTRIBUTE_PILOT_SIZE, CAV_PILOT_SIZE, CAV_RECALIBRATION_DEVIATION, MUS_PILOT_SIZE,
};
use crate::types::{MethodTag, PilotPhase};

/// Fixed pilot size for a method, when the method defines one.
pub fn pilot_size(method: MethodTag) -> Option<usize> {
    match method {
        MethodTag::Attribute => Some(ATTRIBUTE_PILOT_SIZE),
        MethodTag::Mus => Some(MUS_PILOT_SIZE),
        MethodTag::Cav => Some(CAV_PILOT_SIZE),
        MethodTag::Stratified | MethodTag::NonStatistical => None,
    }
}

/// Outcome of calibrating CAV sigma from pilot observations.
#[derive(Debug, Clone, PartialEq)]
pub struct CavCalibration {
    /// Sample standard deviation of the pilot values.
    pub calibrated_sigma: f64,

    /// Relative deviation from the designed sigma.
    pub deviation: f64,

    /// True when the deviation exceeds the 25% tolerance and the analyst
    /// must revisit the designed sigma before trusting the final size.
    pub requires_recalibration: bool,

    /// Note for the audit file.
    pub note: String,
}

/// Calibrate sigma from pilot values.
///
/// Sample variance uses the n-1 denominator. Fewer than two observations
/// cannot estimate dispersion; the designed sigma is kept with a note.
pub fn calibrate_cav_sigma(pilot_values: &[f64], designed_sigma: f64) -> CavCalibration {
    if pilot_values.len() < 2 {
        return CavCalibration {
            calibrated_sigma: designed_sigma,
            deviation: 0.0,
            requires_recalibration: false,
            note: "Pilot too small to estimate dispersion; designed sigma retained."
                .to_string(),
        };
    }

    let n = pilot_values.len() as f64;
    let mean = pilot_values.iter().sum::<f64>() / n;
    let variance = pilot_values
        .iter()
        .map(|v| (v - mean).powi(2))
        .sum::<f64>()
        / (n - 1.0);
    let calibrated_sigma = variance.sqrt();
    let deviation = (calibrated_sigma - designed_sigma).abs() / designed_sigma;
    let requires_recalibration = deviation > CAV_RECALIBRATION_DEVIATION;

    let note = if requires_recalibration {
        format!(
            "Pilot sigma {calibrated_sigma:.2} deviates {:.1}% from the designed \
             {designed_sigma:.2} (tolerance 25%): revisit the designed sigma \
             before finalizing the sample size.",
            deviation * 100.0
        )
    } else {
        format!(
            "Pilot sigma {calibrated_sigma:.2} within 25% of the designed \
             {designed_sigma:.2}; design retained."
        )
    };

    CavCalibration {
        calibrated_sigma,
        deviation,
        requires_recalibration,
        note,
    }
}

/// An expansion decision after pilot fieldwork.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpansionDecision {
    /// Additional items to draw, 0 when the pilot suffices.
    pub additional: usize,

    /// Phase the run lands in after acting on the decision.
    pub phase: PilotPhase,

    /// Note for the audit file.
    pub note: String,
}

/// Stop-or-go expansion for sequential attribute sampling.
///
/// Zero exceptions in the pilot means the pilot stands. Otherwise the
/// full theoretical size `ceil(FC * 100 / ET)` is computed with FC = 3.0
/// at 95%+ confidence and 2.31 below, and the shortfall is drawn.
pub fn stop_or_go_expansion(
    exceptions: usize,
    confidence_pct: f64,
    tolerable_error_pct: f64,
    current_size: usize,
    population: usize,
) -> ExpansionDecision {
    if exceptions == 0 {
        return ExpansionDecision {
            additional: 0,
            phase: PilotPhase::PilotOnly,
            note: "No exceptions in the pilot; no expansion required.".to_string(),
        };
    }

    let factor = if confidence_pct >= 95.0 { 3.0 } else { 2.31 };
    let full = (factor * 100.0 / tolerable_error_pct).ceil() as usize;
    let additional = full.saturating_sub(current_size).min(population.saturating_sub(current_size));
    ExpansionDecision {
        additional,
        phase: if additional > 0 {
            PilotPhase::Expanded
        } else {
            PilotPhase::PilotOnly
        },
        note: format!(
            "{exceptions} exception(s) in the pilot: full attribute size \
             ceil({factor} * 100 / {tolerable_error_pct}) = {full}, \
             {additional} additional item(s)."
        ),
    }
}

/// Variable expansion for MUS: recompute the sampling interval with an
/// error-adjusted denominator and grow the sample to the implied size.
///
/// ```text
/// J' = TE / (FC + 0.5 * k),  n' = ceil(V / J')
/// ```
pub fn mus_expansion(
    exceptions: usize,
    tolerable_error: f64,
    reliability_factor: f64,
    population_value: f64,
    current_size: usize,
    population: usize,
) -> ExpansionDecision {
    if exceptions == 0 {
        return ExpansionDecision {
            additional: 0,
            phase: PilotPhase::PilotOnly,
            note: "No exceptions found; the computed sample stands.".to_string(),
        };
    }

    let adjusted_interval =
        tolerable_error / (reliability_factor + 0.5 * exceptions as f64);
    let implied = if adjusted_interval > 0.0 {
        (population_value / adjusted_interval).ceil() as usize
    } else {
        population
    };
    let implied = implied.min(population);
    let additional = implied.saturating_sub(current_size);
    ExpansionDecision {
        additional,
        phase: if additional > 0 {
            PilotPhase::Expanded
        } else {
            PilotPhase::PilotOnly
        },
        note: format!(
            "{exceptions} exception(s): error-adjusted interval \
             {adjusted_interval:.2} implies {implied} item(s), \
             {additional} additional."
        ),
    }
}

/// Variable expansion for non-statistical samples: half again the current
/// size, at least 10 items, never past the population.
pub fn non_statistical_expansion(
    exceptions: usize,
    current_size: usize,
    population: usize,
) -> ExpansionDecision {
    if exceptions == 0 {
        return ExpansionDecision {
            additional: 0,
            phase: PilotPhase::PilotOnly,
            note: "No exceptions found; no extension required.".to_string(),
        };
    }

    let grow = ((current_size as f64 * 0.5).round() as usize).max(10);
    let additional = grow.min(population.saturating_sub(current_size));
    ExpansionDecision {
        additional,
        phase: if additional > 0 {
            PilotPhase::Expanded
        } else {
            PilotPhase::PilotOnly
        },
        note: format!(
            "{exceptions} exception(s): extending the judgmental sample by \
             {additional} item(s)."
        ),
    }
}
