//! Sampling run orchestration.
//!
//! Stateless entry points: [`plan`] runs size computation and selection
//! for one parameter set, [`extend`] grows a previously planned sample
//! after pilot fieldwork, and [`project_results`] bridges a completed
//! sample into the inference module. Every function is a pure function of
//! `(rows, params, seed)`; nothing is cached between calls.

use std::collections::HashSet;

use crate::error::ParameterError;
use crate::inference::{project, ErrorProjection, PoissonTier, PopulationContext};
use crate::params::SamplingParameters;
use crate::pilot::{
    calibrate_cav_sigma, mus_expansion, non_statistical_expansion, pilot_size,
    stop_or_go_expansion, ExpansionDecision,
};
use crate::population::{PopulationRow, PopulationSummary};
use crate::result::{AuditResults, PilotMetrics, SampleItem, StratumMetadata};
use crate::selection::{draw_items, stream_seed};
use crate::sizing::{
    attribute_size, cav_size, extract_certainty, mus_size, prepare_population,
    select_non_statistical, sequential_pilot_size, stratified_theoretical_size,
};
use crate::stratify::stratified_sample;
use crate::types::{MethodTag, PilotPhase, RiskFlag};

/// Compute the sample size and select items for one sampling run.
///
/// Returns the assembled [`AuditResults`]; all items start with
/// `Pending` compliance status. Malformed parameter sets are rejected;
/// degenerate numeric situations degrade into notes instead.
pub fn plan(
    rows: &[PopulationRow],
    params: &SamplingParameters,
    seed: u64,
) -> Result<AuditResults, ParameterError> {
    params.validate()?;
    tracing::debug!(method = ?params.method(), rows = rows.len(), seed, "planning sample");

    let results = match params {
        SamplingParameters::Attribute {
            confidence,
            tolerable_error_pct,
            expected_error_pct,
            sequential,
        } => {
            if *sequential {
                let decision = sequential_pilot_size(rows.len());
                let sample = draw_items(decision.size, seed, rows, |_, item| {
                    item.is_pilot_item = true;
                });
                let mut results = AuditResults::new(sample, decision.notes);
                results.pilot_metrics = Some(PilotMetrics {
                    method: MethodTag::Attribute,
                    initial_param: pilot_size(MethodTag::Attribute).unwrap_or(0) as f64,
                    calibrated_param: None,
                    phase: PilotPhase::PilotOnly,
                    requires_recalibration: false,
                    deviation: None,
                });
                results
            } else {
                let decision = attribute_size(
                    *confidence,
                    *tolerable_error_pct,
                    *expected_error_pct,
                    rows.len(),
                );
                let sample = draw_items(decision.size, seed, rows, |_, _| {});
                AuditResults::new(sample, decision.notes)
            }
        }

        SamplingParameters::Mus {
            tolerable_error,
            expected_error,
            risk_incorrect_acceptance,
            negative_policy,
            extract_certainty: certainty_enabled,
            pilot,
        } => {
            let prepared = prepare_population(rows, *negative_policy);
            let mut notes = prepared.notes.clone();
            let folded: HashSet<&str> =
                prepared.sign_folded.iter().map(String::as_str).collect();

            if *pilot {
                let pilot_count =
                    pilot_size(MethodTag::Mus).unwrap_or(0).min(prepared.rows.len());
                notes.push(format!(
                    "MUS pilot: {pilot_count} item(s) drawn ahead of the full sample."
                ));
                let mut sample = draw_items(pilot_count, seed, &prepared.rows, |_, item| {
                    item.is_pilot_item = true;
                    if folded.contains(item.id.as_str()) {
                        item.risk_flag = Some(RiskFlag::NegativeAbsolute);
                    }
                });
                sample.extend(prepared.segregated.clone());
                let mut results = AuditResults::new(sample, notes);
                results.pilot_metrics = Some(PilotMetrics {
                    method: MethodTag::Mus,
                    initial_param: pilot_size(MethodTag::Mus).unwrap_or(0) as f64,
                    calibrated_param: None,
                    phase: PilotPhase::PilotOnly,
                    requires_recalibration: false,
                    deviation: None,
                });
                return Ok(results);
            }

            let sizing = mus_size(
                *tolerable_error,
                *expected_error,
                *risk_incorrect_acceptance,
                prepared.effective_value,
                prepared.rows.len(),
            );
            notes.extend(sizing.notes.clone());

            let mut sample = Vec::new();
            let mut metadata = None;
            let residual_drawn;

            if *certainty_enabled {
                let split = extract_certainty(prepared.rows.clone(), sizing.interval);
                let certainty_count = split.certainty.len();
                if certainty_count > 0 {
                    notes.push(format!(
                        "{certainty_count} item(s) extracted with certainty \
                         (value at or above the interval of {:.2}, or key risk items).",
                        sizing.interval
                    ));
                }
                sample.extend(split.certainty.iter().map(|(row, flag)| {
                    let mut item = SampleItem::from_row(row);
                    item.risk_flag = Some(*flag);
                    item.stratum_label = Some("Certainty".to_string());
                    item
                }));

                let residual_count = sizing.size.saturating_sub(certainty_count);
                let drawn =
                    draw_items(residual_count, seed, &split.residual, |_, item| {
                        if folded.contains(item.id.as_str()) {
                            item.risk_flag = Some(RiskFlag::NegativeAbsolute);
                        }
                    });
                residual_drawn = drawn.len();
                sample.extend(drawn);

                metadata = Some(vec![
                    StratumMetadata {
                        label: "Certainty".to_string(),
                        population_size: certainty_count,
                        population_value: split
                            .certainty
                            .iter()
                            .map(|(row, _)| row.monetary_value)
                            .sum(),
                        sample_size: certainty_count,
                    },
                    StratumMetadata {
                        label: "Residual".to_string(),
                        population_size: split.residual.len(),
                        population_value: split
                            .residual
                            .iter()
                            .map(|row| row.monetary_value)
                            .sum(),
                        sample_size: residual_drawn,
                    },
                ]);
            } else {
                let drawn = draw_items(sizing.size, seed, &prepared.rows, |_, item| {
                    if folded.contains(item.id.as_str()) {
                        item.risk_flag = Some(RiskFlag::NegativeAbsolute);
                    }
                });
                sample.extend(drawn);
            }

            sample.extend(prepared.segregated.clone());
            let mut results = AuditResults::new(sample, notes);
            results.strata_metadata = metadata;
            results
        }

        SamplingParameters::Stratified {
            basis,
            strata_count,
            allocation,
            certainty_threshold,
            confidence,
            tolerable_error_pct,
            size_override,
            manual_allocations,
        } => {
            let mut notes = Vec::new();
            let total_size = match size_override {
                Some(size) => {
                    notes.push(format!(
                        "Caller-supplied total sample size of {size} overrides the \
                         theoretical formula."
                    ));
                    *size
                }
                None => {
                    let summary = PopulationSummary::of(rows);
                    let decision = stratified_theoretical_size(
                        *confidence,
                        *tolerable_error_pct,
                        &summary,
                    );
                    notes.extend(decision.notes);
                    decision.size
                }
            };

            let draw = stratified_sample(
                rows,
                basis,
                *strata_count,
                *allocation,
                manual_allocations.as_deref(),
                *certainty_threshold,
                total_size,
                seed,
            );
            notes.extend(draw.notes);
            let mut results = AuditResults::new(draw.items, notes);
            results.strata_metadata = Some(draw.metadata);
            results
        }

        SamplingParameters::Cav {
            tolerable_error,
            confidence,
            sigma,
            pilot,
        } => {
            if *pilot {
                let pilot_count = pilot_size(MethodTag::Cav).unwrap_or(0).min(rows.len());
                let sample = draw_items(pilot_count, seed, rows, |_, item| {
                    item.is_pilot_item = true;
                });
                let mut results = AuditResults::new(
                    sample,
                    vec![format!(
                        "CAV pilot: {pilot_count} item(s) drawn to calibrate the \
                         designed sigma of {sigma:.2}."
                    )],
                );
                results.pilot_metrics = Some(PilotMetrics {
                    method: MethodTag::Cav,
                    initial_param: *sigma,
                    calibrated_param: None,
                    phase: PilotPhase::PilotOnly,
                    requires_recalibration: false,
                    deviation: None,
                });
                results
            } else {
                let decision =
                    cav_size(*confidence, *sigma, *tolerable_error, rows.len());
                let sample = draw_items(decision.size, seed, rows, |_, _| {});
                AuditResults::new(sample, decision.notes)
            }
        }

        SamplingParameters::NonStatistical { sample_size, mode } => {
            let (items, notes) = select_non_statistical(rows, *sample_size, *mode, seed);
            AuditResults::new(items, notes)
        }
    };

    Ok(results)
}

/// Grow a previously planned sample after pilot fieldwork.
///
/// Exceptions are read from the compliance statuses already recorded on
/// `results`. Additional items come from rows not yet sampled, drawn with
/// a seed stream derived from the caller seed, so repeating the call
/// reproduces the same extension. The original results are not mutated.
pub fn extend(
    results: &AuditResults,
    rows: &[PopulationRow],
    params: &SamplingParameters,
    seed: u64,
) -> Result<AuditResults, ParameterError> {
    params.validate()?;
    let exceptions = results.exception_count();
    let current = results.sample_size;
    tracing::debug!(
        method = ?params.method(),
        exceptions,
        current,
        "evaluating sample extension"
    );

    let (decision, calibration_note, metrics_update) = match params {
        SamplingParameters::Attribute {
            confidence,
            tolerable_error_pct,
            ..
        } => (
            stop_or_go_expansion(
                exceptions,
                confidence.percent(),
                *tolerable_error_pct,
                current,
                rows.len(),
            ),
            None,
            None,
        ),

        SamplingParameters::Mus {
            tolerable_error,
            expected_error,
            risk_incorrect_acceptance,
            negative_policy,
            ..
        } => {
            let prepared = prepare_population(rows, *negative_policy);
            let sizing = mus_size(
                *tolerable_error,
                *expected_error,
                *risk_incorrect_acceptance,
                prepared.effective_value,
                prepared.rows.len(),
            );
            let decision = if exceptions == 0 {
                // A clean pilot proceeds straight to the theoretical size.
                let additional = sizing.size.saturating_sub(current);
                ExpansionDecision {
                    additional,
                    phase: if additional > 0 {
                        PilotPhase::Expanded
                    } else {
                        PilotPhase::PilotOnly
                    },
                    note: format!(
                        "Clean pilot: growing to the theoretical MUS size of {}.",
                        sizing.size
                    ),
                }
            } else {
                mus_expansion(
                    exceptions,
                    *tolerable_error,
                    sizing.reliability_factor,
                    prepared.effective_value,
                    current,
                    prepared.rows.len(),
                )
            };
            (decision, None, None)
        }

        SamplingParameters::Cav {
            tolerable_error,
            confidence,
            sigma,
            ..
        } => {
            let pilot_values: Vec<f64> = results
                .sample
                .iter()
                .filter(|item| item.is_pilot_item)
                .map(|item| item.value)
                .collect();
            let calibration = calibrate_cav_sigma(&pilot_values, *sigma);
            let decision_size = cav_size(
                *confidence,
                calibration.calibrated_sigma,
                *tolerable_error,
                rows.len(),
            );
            let additional = decision_size.size.saturating_sub(current);
            let decision = ExpansionDecision {
                additional,
                phase: if additional > 0 {
                    PilotPhase::Expanded
                } else {
                    PilotPhase::PilotOnly
                },
                note: format!(
                    "Calibrated sigma {:.2}: final CAV size {}, {additional} \
                     additional item(s).",
                    calibration.calibrated_sigma, decision_size.size
                ),
            };
            (
                decision,
                Some(calibration.note.clone()),
                Some((calibration.calibrated_sigma, calibration.deviation, calibration.requires_recalibration)),
            )
        }

        SamplingParameters::NonStatistical { .. } => (
            non_statistical_expansion(exceptions, current, rows.len()),
            None,
            None,
        ),

        SamplingParameters::Stratified { .. } => (
            non_statistical_expansion(exceptions, current, rows.len()),
            None,
            None,
        ),
    };

    let mut notes = Vec::new();
    if let Some(note) = calibration_note {
        notes.push(note);
    }
    notes.push(decision.note.clone());

    let sampled: HashSet<&str> = results.sample.iter().map(|i| i.id.as_str()).collect();
    let unused: Vec<PopulationRow> = rows
        .iter()
        .filter(|row| !sampled.contains(row.id.as_str()))
        .cloned()
        .collect();
    let additional = draw_items(decision.additional, stream_seed(seed, 2), &unused, |_, _| {});
    if additional.len() < decision.additional {
        notes.push(format!(
            "Only {} unsampled item(s) remained for the requested extension of {}.",
            additional.len(),
            decision.additional
        ));
    }

    let mut extended = results.extended_with(additional, notes);
    if let Some(metrics) = &mut extended.pilot_metrics {
        metrics.phase = decision.phase;
        if let Some((calibrated, deviation, requires)) = metrics_update {
            metrics.calibrated_param = Some(calibrated);
            metrics.deviation = Some(deviation);
            metrics.requires_recalibration = requires;
        }
    }
    Ok(extended)
}

/// Project population error for a completed sample, deriving the Poisson
/// tier from the parameters that produced it.
pub fn project_results(
    results: &AuditResults,
    params: &SamplingParameters,
    context: PopulationContext,
) -> ErrorProjection {
    let tier = match params {
        SamplingParameters::Attribute { confidence, .. }
        | SamplingParameters::Stratified { confidence, .. }
        | SamplingParameters::Cav { confidence, .. } => PoissonTier::from(*confidence),
        SamplingParameters::Mus {
            risk_incorrect_acceptance,
            ..
        } => {
            if *risk_incorrect_acceptance <= 5.0 {
                PoissonTier::NinetyFive
            } else {
                PoissonTier::Ninety
            }
        }
        SamplingParameters::NonStatistical { .. } => PoissonTier::NinetyFive,
    };
    project(results, params.method(), tier, context)
}
