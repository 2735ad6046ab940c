//! Monetary unit sampling: negative-value treatment, sizing, and
//! certainty-stratum extraction.

use crate::constants::{
    CERTAINTY_RISK_SCORE, MUS_ABSOLUTE_CEILING, MUS_DEGENERATE_CAP,
    MUS_POPULATION_CEILING_FRACTION,
};
use crate::population::PopulationRow;
use crate::result::SampleItem;
use crate::types::{NegativePolicy, RiskFlag};

/// Reliability and expansion factors for the tier selected by the risk of
/// incorrect acceptance: RIA at or below 5% maps to the 95% tier.
pub(crate) fn mus_tier(risk_incorrect_acceptance: f64) -> (f64, f64, u8) {
    if risk_incorrect_acceptance <= 5.0 {
        (3.0, 1.6, 95)
    } else {
        (2.31, 1.5, 90)
    }
}

/// Statistical population after the negative-value policy was applied.
#[derive(Debug, Clone)]
pub struct PreparedPopulation {
    /// Rows entering the statistical draw, with effective values.
    pub rows: Vec<PopulationRow>,

    /// Negative rows pulled out for mandatory manual review
    /// (policy `Separate`), already flagged.
    pub segregated: Vec<SampleItem>,

    /// Ids whose value sign was folded (policy `Absolute`), so selected
    /// items can be flagged accordingly.
    pub sign_folded: Vec<String>,

    /// Effective population value after treatment.
    pub effective_value: f64,

    /// Notes recording the treatment.
    pub notes: Vec<String>,
}

/// Apply the configured negative-value policy before sizing.
pub fn prepare_population(
    rows: &[PopulationRow],
    policy: NegativePolicy,
) -> PreparedPopulation {
    let negatives = rows.iter().filter(|r| r.monetary_value < 0.0).count();
    let mut notes = Vec::new();

    let (statistical, segregated, sign_folded): (Vec<_>, Vec<_>, Vec<_>) = match policy {
        NegativePolicy::Separate => {
            let (kept, removed): (Vec<_>, Vec<_>) =
                rows.iter().cloned().partition(|r| r.monetary_value >= 0.0);
            let segregated = removed
                .iter()
                .map(|row| {
                    let mut item = SampleItem::from_row(row);
                    item.risk_flag = Some(RiskFlag::NegativeSegregated);
                    item.is_manual_selection = true;
                    item
                })
                .collect();
            if negatives > 0 {
                notes.push(format!(
                    "{negatives} negative item(s) segregated from the statistical \
                     population for mandatory manual review."
                ));
            }
            (kept, segregated, Vec::new())
        }
        NegativePolicy::Zero => {
            let kept = rows
                .iter()
                .map(|row| {
                    let mut row = row.clone();
                    if row.monetary_value < 0.0 {
                        row.monetary_value = 0.0;
                    }
                    row
                })
                .collect();
            if negatives > 0 {
                notes.push(format!("{negatives} negative value(s) clamped to zero."));
            }
            (kept, Vec::new(), Vec::new())
        }
        NegativePolicy::Absolute => {
            let mut folded = Vec::new();
            let kept = rows
                .iter()
                .map(|row| {
                    let mut row = row.clone();
                    if row.monetary_value < 0.0 {
                        folded.push(row.id.clone());
                        row.monetary_value = row.monetary_value.abs();
                    }
                    row
                })
                .collect();
            if negatives > 0 {
                notes.push(format!(
                    "{negatives} negative value(s) taken at absolute value; \
                     original signs retained for reporting."
                ));
            }
            (kept, Vec::new(), folded)
        }
    };

    let effective_value = statistical.iter().map(|r| r.monetary_value).sum();
    PreparedPopulation {
        rows: statistical,
        segregated,
        sign_folded,
        effective_value,
        notes,
    }
}

/// A computed MUS size with its sampling interval.
#[derive(Debug, Clone, PartialEq)]
pub struct MusSizing {
    /// Integer sample size, clamped to the population.
    pub size: usize,

    /// Sampling interval `J = V_eff / n` (0 when the size is 0), retained
    /// for certainty-stratum extraction.
    pub interval: f64,

    /// Reliability factor of the selected tier.
    pub reliability_factor: f64,

    /// Confidence tier in percent (90 or 95).
    pub tier_pct: u8,

    /// Methodology notes.
    pub notes: Vec<String>,
}

/// Compute the MUS sample size over an effective population value.
///
/// ```text
/// n = ceil(V_eff * FC / (TE - EE * FE))
/// ```
///
/// Degenerate denominators and oversized results degrade into clamped
/// sizes with notes; the size never exceeds the population.
pub fn mus_size(
    tolerable_error: f64,
    expected_error: f64,
    risk_incorrect_acceptance: f64,
    effective_value: f64,
    population: usize,
) -> MusSizing {
    let (fc, fe, tier_pct) = mus_tier(risk_incorrect_acceptance);
    let mut notes = vec![format!(
        "MUS tier {tier_pct}% (RIA {risk_incorrect_acceptance}%): FC = {fc}, FE = {fe}."
    )];

    if population == 0 {
        notes.push("Empty population: MUS sample size is 0.".to_string());
        return MusSizing {
            size: 0,
            interval: 0.0,
            reliability_factor: fc,
            tier_pct,
            notes,
        };
    }

    let denominator = tolerable_error - expected_error * fe;
    let mut size = if denominator <= 1.0 {
        let cap = population.min(MUS_DEGENERATE_CAP);
        tracing::warn!(
            tolerable_error,
            expected_error,
            denominator,
            "degenerate MUS denominator, capping sample size"
        );
        notes.push(format!(
            "Expected error consumes too much of tolerable error \
             (TE - EE*FE = {denominator:.2} <= 1): sample capped at {cap} items. \
             Review the expected error estimate before relying on this sample."
        ));
        cap
    } else {
        let mut raw = (effective_value * fc / denominator).ceil() as usize;
        notes.push(format!(
            "MUS size: ceil({effective_value:.2} * {fc} / {denominator:.2}) = {raw}."
        ));
        let ceiling = ((MUS_POPULATION_CEILING_FRACTION * population as f64).floor()
            as usize)
            .min(MUS_ABSOLUTE_CEILING);
        if raw > ceiling && ceiling > 0 {
            notes.push(format!(
                "Size {raw} exceeds the working ceiling of {ceiling} \
                 (min of 80% of population and {MUS_ABSOLUTE_CEILING}); clamped. \
                 Consider raising the tolerable error."
            ));
            raw = ceiling;
        }
        raw
    };

    if size >= population {
        if size > population {
            notes.push(format!(
                "Size {size} exceeds the population of {population}; \
                 examining every item (full census)."
            ));
        }
        size = population;
    }

    let interval = if size == 0 {
        0.0
    } else {
        effective_value / size as f64
    };

    MusSizing {
        size,
        interval,
        reliability_factor: fc,
        tier_pct,
        notes,
    }
}

/// Rows split between 100%-examined certainty items and the residual
/// population subjected to systematic selection.
#[derive(Debug, Clone)]
pub struct CertaintySplit {
    /// Certainty rows with the flag explaining the extraction.
    pub certainty: Vec<(PopulationRow, RiskFlag)>,

    /// Remaining rows for the systematic draw.
    pub residual: Vec<PopulationRow>,
}

/// Pull out rows examined with certainty: monetary value at or above the
/// sampling interval, or risk score at or above the key-item threshold.
///
/// Value wins over risk score when both apply, so an oversized risky item
/// reports as a top-stratum extraction.
pub fn extract_certainty(rows: Vec<PopulationRow>, interval: f64) -> CertaintySplit {
    let mut certainty = Vec::new();
    let mut residual = Vec::new();
    for row in rows {
        if interval > 0.0 && row.monetary_value >= interval {
            certainty.push((row, RiskFlag::TopStratum));
        } else if row.risk_score.is_some_and(|s| s >= CERTAINTY_RISK_SCORE) {
            certainty.push((row, RiskFlag::KeyItem));
        } else {
            residual.push(row);
        }
    }
    CertaintySplit {
        certainty,
        residual,
    }
}
