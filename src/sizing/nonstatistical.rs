//! Non-statistical (judgmental) selection modes.

use crate::population::PopulationRow;
use crate::result::SampleItem;
use crate::selection::draw_items;
use crate::types::{NonStatisticalMode, RiskFlag};

/// Select items for a non-statistical run.
///
/// - `RiskScoring` takes the top `sample_size` rows by descending risk
///   score, each flagged high risk.
/// - `Directed` filters rows whose risk factors match the requested
///   finding category; a shortfall is topped up by systematic selection
///   over the unused rows, with a note.
/// - `Systematic` is a plain seeded systematic draw.
pub fn select_non_statistical(
    rows: &[PopulationRow],
    sample_size: usize,
    mode: NonStatisticalMode,
    seed: u64,
) -> (Vec<SampleItem>, Vec<String>) {
    if sample_size == 0 || rows.is_empty() {
        return (Vec::new(), Vec::new());
    }

    match mode {
        NonStatisticalMode::RiskScoring => {
            let mut order: Vec<usize> = (0..rows.len()).collect();
            // Descending score; original order breaks ties so the pick is
            // stable across runs.
            order.sort_by(|&a, &b| {
                let sa = rows[a].risk_score.unwrap_or(0.0);
                let sb = rows[b].risk_score.unwrap_or(0.0);
                sb.total_cmp(&sa).then(a.cmp(&b))
            });
            let items = order
                .into_iter()
                .take(sample_size)
                .map(|i| {
                    let mut item = SampleItem::from_row(&rows[i]);
                    item.risk_flag = Some(RiskFlag::HighRisk);
                    item
                })
                .collect();
            (
                items,
                vec![format!(
                    "Non-statistical risk scoring: top {sample_size} items by \
                     descending risk score."
                )],
            )
        }
        NonStatisticalMode::Directed(category) => {
            let pattern = category.pattern();
            let (matched, unused): (Vec<_>, Vec<_>) = rows.iter().partition(|row| {
                row.risk_factors
                    .iter()
                    .any(|factor| factor.contains(pattern))
            });

            let mut items: Vec<SampleItem> = matched
                .iter()
                .take(sample_size)
                .map(|row| SampleItem::from_row(row))
                .collect();
            let mut notes = vec![format!(
                "Directed selection on \"{pattern}\" findings: {} matching item(s).",
                matched.len()
            )];

            if items.len() < sample_size {
                let shortfall = sample_size - items.len();
                let unused: Vec<PopulationRow> =
                    unused.into_iter().cloned().collect();
                let fill = draw_items(shortfall, seed, &unused, |_, _| {});
                notes.push(format!(
                    "Only {} of {sample_size} requested items matched; \
                     {} item(s) added by systematic selection over the \
                     remaining population.",
                    items.len(),
                    fill.len()
                ));
                items.extend(fill);
            }
            (items, notes)
        }
        NonStatisticalMode::Systematic => {
            let items = draw_items(sample_size, seed, rows, |_, _| {});
            (
                items,
                vec![format!(
                    "Non-statistical systematic selection of {} item(s).",
                    sample_size.min(rows.len())
                )],
            )
        }
    }
}
