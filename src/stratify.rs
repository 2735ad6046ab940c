//! Stratum construction, allocation, and per-stratum selection.
//!
//! The stratifier owns only grouping and allocation; sizes come from the
//! sizing module and the actual draws go through the systematic selector,
//! once per stratum with the shared seed.

use std::collections::BTreeMap;

use crate::population::{PopulationRow, PopulationSummary};
use crate::result::{SampleItem, StratumMetadata};
use crate::selection::draw_items;
use crate::types::{AllocationMethod, StratificationBasis};

/// Label of the mandatory 100%-examined stratum.
pub const CERTAINTY_LABEL: &str = "Certainty";

/// One group of residual rows.
#[derive(Debug, Clone)]
pub struct Stratum {
    /// Display label ("Stratum 1", a categorical key, ...).
    pub label: String,
    /// Rows belonging to this stratum.
    pub rows: Vec<PopulationRow>,
}

/// Population split into the certainty stratum and residual groups.
#[derive(Debug, Clone)]
pub struct StrataPlan {
    /// Rows at or above the certainty threshold, examined at 100%.
    pub certainty: Vec<PopulationRow>,
    /// Residual strata, each non-empty.
    pub strata: Vec<Stratum>,
}

/// Group rows into the certainty stratum plus residual strata.
pub fn build_strata(
    rows: &[PopulationRow],
    basis: &StratificationBasis,
    strata_count: usize,
    certainty_threshold: f64,
) -> StrataPlan {
    let (certainty, residual): (Vec<_>, Vec<_>) = rows
        .iter()
        .cloned()
        .partition(|row| row.monetary_value >= certainty_threshold);

    let strata = match basis {
        StratificationBasis::Monetary => monetary_bins(residual, strata_count),
        StratificationBasis::Category(column) => {
            categorical_groups(residual, |row| row.column_key(column))
        }
        StratificationBasis::MultiVariable(columns) => categorical_groups(residual, |row| {
            columns
                .iter()
                .map(|column| row.column_key(column))
                .collect::<Vec<_>>()
                .join(" | ")
        }),
    };

    StrataPlan { certainty, strata }
}

/// Equal-count bins over ascending monetary value.
fn monetary_bins(mut residual: Vec<PopulationRow>, bins: usize) -> Vec<Stratum> {
    if residual.is_empty() || bins == 0 {
        return Vec::new();
    }
    // Stable sort: equal values keep their population order, so the bin
    // boundaries are reproducible.
    residual.sort_by(|a, b| a.monetary_value.total_cmp(&b.monetary_value));

    let total = residual.len();
    let mut strata = Vec::new();
    let mut taken = 0;
    for bin in 0..bins {
        let end = ((bin + 1) * total) / bins;
        if end > taken {
            strata.push(Stratum {
                label: format!("Stratum {}", strata.len() + 1),
                rows: residual[taken..end].to_vec(),
            });
            taken = end;
        }
    }
    strata
}

/// Group rows by a categorical key, strata ordered by key.
fn categorical_groups<F>(residual: Vec<PopulationRow>, key_of: F) -> Vec<Stratum>
where
    F: Fn(&PopulationRow) -> String,
{
    let mut groups: BTreeMap<String, Vec<PopulationRow>> = BTreeMap::new();
    for row in residual {
        groups.entry(key_of(&row)).or_default().push(row);
    }
    groups
        .into_iter()
        .map(|(label, rows)| Stratum { label, rows })
        .collect()
}

/// Allocate `total` draws across strata per the chosen method.
///
/// Each count is clamped to its stratum size. Neyman with a degenerate
/// denominator falls back to proportional allocation with a note.
pub fn allocate(
    total: usize,
    strata: &[Stratum],
    method: AllocationMethod,
    manual: Option<&[usize]>,
) -> (Vec<usize>, Vec<String>) {
    if strata.is_empty() {
        return (Vec::new(), Vec::new());
    }
    let mut notes = Vec::new();
    let residual_total: usize = strata.iter().map(|s| s.rows.len()).sum();

    let raw: Vec<usize> = match method {
        AllocationMethod::Proportional => proportional(total, strata, residual_total),
        AllocationMethod::Equal => {
            let share = (total as f64 / strata.len() as f64).round() as usize;
            vec![share; strata.len()]
        }
        AllocationMethod::Neyman => {
            let weights: Vec<f64> = strata
                .iter()
                .map(|s| s.rows.len() as f64 * PopulationSummary::of(&s.rows).std_dev)
                .collect();
            let denominator: f64 = weights.iter().sum();
            if denominator > 0.0 {
                weights
                    .iter()
                    .map(|w| (total as f64 * w / denominator).round() as usize)
                    .collect()
            } else {
                notes.push(
                    "Neyman allocation degenerate (no within-stratum dispersion); \
                     falling back to proportional allocation."
                        .to_string(),
                );
                proportional(total, strata, residual_total)
            }
        }
        AllocationMethod::Manual => {
            let manual = manual.unwrap_or(&[]);
            (0..strata.len())
                .map(|i| manual.get(i).copied().unwrap_or(0))
                .collect()
        }
    };

    let counts: Vec<usize> = raw
        .into_iter()
        .zip(strata)
        .map(|(count, stratum)| count.min(stratum.rows.len()))
        .collect();
    (counts, notes)
}

fn proportional(total: usize, strata: &[Stratum], residual_total: usize) -> Vec<usize> {
    if residual_total == 0 {
        return vec![0; strata.len()];
    }
    strata
        .iter()
        .map(|s| (total as f64 * s.rows.len() as f64 / residual_total as f64).round() as usize)
        .collect()
}

/// Everything a stratified draw produces.
#[derive(Debug, Clone)]
pub struct StratifiedDraw {
    /// Certainty items followed by per-stratum systematic picks.
    pub items: Vec<SampleItem>,
    /// One entry per populated stratum, certainty included.
    pub metadata: Vec<StratumMetadata>,
    /// Allocation notes.
    pub notes: Vec<String>,
}

/// Run the full stratified selection: group, allocate, and draw each
/// stratum with the shared seed.
pub fn stratified_sample(
    rows: &[PopulationRow],
    basis: &StratificationBasis,
    strata_count: usize,
    allocation: AllocationMethod,
    manual: Option<&[usize]>,
    certainty_threshold: f64,
    total_size: usize,
    seed: u64,
) -> StratifiedDraw {
    let plan = build_strata(rows, basis, strata_count, certainty_threshold);
    let (counts, mut notes) = allocate(total_size, &plan.strata, allocation, manual);

    let mut items = Vec::new();
    let mut metadata = Vec::new();

    if !plan.certainty.is_empty() {
        let value: f64 = plan.certainty.iter().map(|r| r.monetary_value).sum();
        metadata.push(StratumMetadata {
            label: CERTAINTY_LABEL.to_string(),
            population_size: plan.certainty.len(),
            population_value: value,
            sample_size: plan.certainty.len(),
        });
        items.extend(plan.certainty.iter().map(|row| {
            let mut item = SampleItem::from_row(row);
            item.stratum_label = Some(CERTAINTY_LABEL.to_string());
            item
        }));
        notes.push(format!(
            "Certainty stratum: {} item(s) at or above {certainty_threshold:.2}, \
             examined at 100%.",
            plan.certainty.len()
        ));
    }

    for (stratum, &count) in plan.strata.iter().zip(&counts) {
        let drawn = draw_items(count, seed, &stratum.rows, |_, item| {
            item.stratum_label = Some(stratum.label.clone());
        });
        metadata.push(StratumMetadata {
            label: stratum.label.clone(),
            population_size: stratum.rows.len(),
            population_value: stratum.rows.iter().map(|r| r.monetary_value).sum(),
            sample_size: drawn.len(),
        });
        items.extend(drawn);
    }

    StratifiedDraw {
        items,
        metadata,
        notes,
    }
}
