//! Error projection from completed fieldwork.
//!
//! Given a sample with compliance outcomes, projects the population error
//! and an upper error limit from the Poisson factor table. Projection
//! style follows the method: attribute reports a rate bound only, CAV
//! projects mean-per-unit, stratified projects per stratum, MUS and
//! non-statistical use ratio estimation.

use serde::{Deserialize, Serialize};

use crate::constants::{POISSON_FACTORS_90, POISSON_FACTORS_95};
use crate::result::{AuditResults, SampleItem};
use crate::types::{ComplianceStatus, ConfidenceLevel, MethodTag};

/// Confidence tier of the Poisson upper-limit table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PoissonTier {
    /// 90% confidence factors.
    Ninety,
    /// 95% confidence factors.
    NinetyFive,
}

impl From<ConfidenceLevel> for PoissonTier {
    /// 99% confidence has no dedicated table; the 95% factors apply as
    /// the nearest conservative tier.
    fn from(level: ConfidenceLevel) -> Self {
        match level {
            ConfidenceLevel::Ninety => Self::Ninety,
            ConfidenceLevel::NinetyFive | ConfidenceLevel::NinetyNine => Self::NinetyFive,
        }
    }
}

/// Poisson upper-error-limit factor for `k` observed exceptions.
///
/// Factors beyond the tabulated k = 10 extrapolate as `k + 3.0`; this
/// policy matches the historical tables downstream documents cite.
pub fn poisson_factor(tier: PoissonTier, exceptions: usize) -> f64 {
    let table = match tier {
        PoissonTier::Ninety => &POISSON_FACTORS_90,
        PoissonTier::NinetyFive => &POISSON_FACTORS_95,
    };
    match table.get(exceptions) {
        Some(&factor) => factor,
        None => exceptions as f64 + 3.0,
    }
}

/// Upper error limit as a percentage rate: `factor / n * 100`.
pub fn upper_error_limit_pct(tier: PoissonTier, exceptions: usize, sample_size: usize) -> f64 {
    if sample_size == 0 {
        return 0.0;
    }
    poisson_factor(tier, exceptions) / sample_size as f64 * 100.0
}

/// Population figures the projection needs beyond the sample itself.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PopulationContext {
    /// Row count, required for CAV mean-per-unit projection.
    pub count: Option<usize>,

    /// Total monetary value, required for ratio estimation and for
    /// expressing the upper limit in monetary terms.
    pub total_value: Option<f64>,

    /// Tolerable error, in the method's unit (percent for attribute,
    /// monetary otherwise). Enables the conclusion.
    pub tolerable_error: Option<f64>,
}

/// Verdict on the projection against the tolerable error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Conclusion {
    /// Upper error limit within tolerable error.
    Acceptable,
    /// Projected error within tolerable error, but the upper limit is
    /// not; more work is needed before accepting the population.
    RequiresExtension,
    /// Projected error alone already exceeds tolerable error.
    ExceedsTolerable,
}

/// Projected population error with its upper bound.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorProjection {
    /// Method the projection was computed under.
    pub method: MethodTag,

    /// Items examined.
    pub sample_size: usize,

    /// Exceptions found (the critical number for attribute sampling).
    pub exceptions: usize,

    /// Projected population error: 0 for attribute, monetary otherwise.
    pub projected_error: f64,

    /// Upper error limit as a percentage rate.
    pub upper_error_limit_pct: f64,

    /// Upper error limit in monetary terms, when the population value is
    /// known.
    #[serde(default)]
    pub upper_error_limit_value: Option<f64>,

    /// Verdict against the tolerable error, when one was supplied.
    #[serde(default)]
    pub conclusion: Option<Conclusion>,

    /// Notes recording the projection path taken.
    pub notes: Vec<String>,
}

fn exceptions_of(sample: &[SampleItem]) -> Vec<&SampleItem> {
    sample
        .iter()
        .filter(|item| item.compliance_status == ComplianceStatus::Exception)
        .collect()
}

/// Project population error from completed fieldwork.
pub fn project(
    results: &AuditResults,
    method: MethodTag,
    tier: PoissonTier,
    context: PopulationContext,
) -> ErrorProjection {
    let sample_size = results.sample_size;
    let exceptions = exceptions_of(&results.sample);
    let k = exceptions.len();
    let upper_pct = upper_error_limit_pct(tier, k, sample_size);
    let mut notes = Vec::new();

    let projected_error = match method {
        MethodTag::Attribute => {
            notes.push(format!(
                "Attribute evaluation: critical number {k}, upper deviation \
                 limit {upper_pct:.2}%."
            ));
            0.0
        }
        MethodTag::Cav => match context.count {
            Some(population_count) if sample_size > 0 => {
                let exception_value: f64 = exceptions.iter().map(|item| item.value).sum();
                let projected =
                    exception_value / sample_size as f64 * population_count as f64;
                notes.push(format!(
                    "Mean-per-unit projection: ({exception_value:.2} / {sample_size}) \
                     * {population_count} = {projected:.2}."
                ));
                projected
            }
            _ => {
                notes.push(
                    "Population count unavailable; mean-per-unit projection skipped."
                        .to_string(),
                );
                0.0
            }
        },
        MethodTag::Stratified => match &results.strata_metadata {
            Some(strata) => {
                let mut total = 0.0;
                for stratum in strata {
                    if stratum.sample_size == 0 {
                        continue;
                    }
                    let stratum_error: f64 = exceptions
                        .iter()
                        .filter(|item| {
                            item.stratum_label.as_deref() == Some(stratum.label.as_str())
                        })
                        .map(|item| item.projected_error_value())
                        .sum();
                    total += stratum_error / stratum.sample_size as f64
                        * stratum.population_size as f64;
                }
                notes.push(format!(
                    "Stratified projection over {} strata: {total:.2}.",
                    strata.len()
                ));
                total
            }
            None => {
                notes.push(
                    "Strata metadata unavailable; falling back to ratio estimation."
                        .to_string(),
                );
                ratio_projection(results, &exceptions, context, &mut notes)
            }
        },
        MethodTag::Mus | MethodTag::NonStatistical => {
            ratio_projection(results, &exceptions, context, &mut notes)
        }
    };

    let upper_value = context
        .total_value
        .map(|value| upper_pct / 100.0 * value);

    let conclusion = context.tolerable_error.map(|tolerable| {
        let upper_bound = match method {
            MethodTag::Attribute => upper_pct,
            _ => upper_value.unwrap_or(projected_error),
        };
        if projected_error > tolerable {
            Conclusion::ExceedsTolerable
        } else if upper_bound > tolerable {
            Conclusion::RequiresExtension
        } else {
            Conclusion::Acceptable
        }
    });

    ErrorProjection {
        method,
        sample_size,
        exceptions: k,
        projected_error,
        upper_error_limit_pct: upper_pct,
        upper_error_limit_value: upper_value,
        conclusion,
        notes,
    }
}

/// Ratio estimation: sample error rate scaled to the population value.
fn ratio_projection(
    results: &AuditResults,
    exceptions: &[&SampleItem],
    context: PopulationContext,
    notes: &mut Vec<String>,
) -> f64 {
    let sample_value: f64 = results.sample.iter().map(|item| item.value.abs()).sum();
    if sample_value <= 0.0 {
        notes.push("Sample value is zero; ratio projection skipped.".to_string());
        return 0.0;
    }
    let error_value: f64 = exceptions
        .iter()
        .map(|item| item.projected_error_value())
        .sum();
    match context.total_value {
        Some(total_value) => {
            let projected = error_value / sample_value * total_value;
            notes.push(format!(
                "Ratio projection: ({error_value:.2} / {sample_value:.2}) * \
                 {total_value:.2} = {projected:.2}."
            ));
            projected
        }
        None => {
            notes.push(
                "Population value unavailable; ratio projection skipped.".to_string(),
            );
            0.0
        }
    }
}
