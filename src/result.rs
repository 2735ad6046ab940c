//! Result types assembled by a sampling run.

use serde::{Deserialize, Serialize};

use crate::population::PopulationRow;
use crate::types::{ComplianceStatus, MethodTag, PilotPhase, RiskFlag};

/// One selected item, carried through fieldwork and inference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleItem {
    /// Identifier of the underlying population row.
    pub id: String,

    /// Monetary value as recorded in the population (original sign).
    pub value: f64,

    /// Risk score copied from the row, when present.
    #[serde(default)]
    pub risk_score: Option<f64>,

    /// Risk factor annotations copied from the row.
    #[serde(default)]
    pub risk_factors: Vec<String>,

    /// Label of the stratum this item was drawn from, when stratified.
    #[serde(default)]
    pub stratum_label: Option<String>,

    /// True for items belonging to a fixed-size pilot draw.
    #[serde(default)]
    pub is_pilot_item: bool,

    /// True for items that entered the sample outside the statistical
    /// plan, such as negative rows segregated for mandatory review.
    #[serde(default)]
    pub is_manual_selection: bool,

    /// Why the item bypassed or decorated the statistical draw.
    #[serde(default)]
    pub risk_flag: Option<RiskFlag>,

    /// Fieldwork outcome; `Pending` until the item is examined.
    #[serde(default)]
    pub compliance_status: ComplianceStatus,

    /// Misstatement found during fieldwork, when quantified.
    #[serde(default)]
    pub error_amount: Option<f64>,
}

impl SampleItem {
    /// Build a pending item from a population row.
    pub fn from_row(row: &PopulationRow) -> Self {
        Self {
            id: row.id.clone(),
            value: row.monetary_value,
            risk_score: row.risk_score,
            risk_factors: row.risk_factors.clone(),
            stratum_label: None,
            is_pilot_item: false,
            is_manual_selection: false,
            risk_flag: None,
            compliance_status: ComplianceStatus::Pending,
            error_amount: None,
        }
    }

    /// Misstatement attributed to this item during projection: the
    /// recorded error amount when quantified, otherwise the full value.
    pub fn projected_error_value(&self) -> f64 {
        self.error_amount.unwrap_or(self.value)
    }
}

/// Size and value bookkeeping for one populated stratum.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StratumMetadata {
    /// Stratum label ("Certainty", "Stratum 1", a categorical key, ...).
    pub label: String,

    /// Rows in this stratum (N_h).
    pub population_size: usize,

    /// Total monetary value of the stratum (V_h).
    pub population_value: f64,

    /// Items drawn from this stratum (n_h).
    pub sample_size: usize,
}

/// Pilot bookkeeping for methods that calibrate or expand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PilotMetrics {
    /// Method the pilot belongs to.
    pub method: MethodTag,

    /// Designed parameter the pilot started from (sigma for CAV, the
    /// pilot size for the others).
    pub initial_param: f64,

    /// Calibrated parameter after the pilot, when one was computed.
    #[serde(default)]
    pub calibrated_param: Option<f64>,

    /// Whether the run stopped at the pilot or was expanded.
    pub phase: PilotPhase,

    /// True when the calibrated parameter drifted far enough from the
    /// design that the analyst must revisit it before trusting the size.
    #[serde(default)]
    pub requires_recalibration: bool,

    /// Relative deviation between calibrated and designed parameter.
    #[serde(default)]
    pub deviation: Option<f64>,
}

/// Everything a sampling run produces.
///
/// Created once per run. Expansion never mutates an existing value;
/// [`AuditResults::extended_with`] returns a new result with the extra
/// items appended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditResults {
    /// Number of items in `sample`.
    pub sample_size: usize,

    /// Selected items, in draw order.
    pub sample: Vec<SampleItem>,

    /// Human-readable record of every formula applied and every
    /// adjustment made, for the audit file.
    pub methodology_notes: Vec<String>,

    /// Pilot bookkeeping, for pilot-driven runs.
    #[serde(default)]
    pub pilot_metrics: Option<PilotMetrics>,

    /// Per-stratum bookkeeping, when the method stratifies.
    #[serde(default)]
    pub strata_metadata: Option<Vec<StratumMetadata>>,
}

impl AuditResults {
    /// Assemble a result, deriving `sample_size` from the items.
    pub fn new(sample: Vec<SampleItem>, methodology_notes: Vec<String>) -> Self {
        Self {
            sample_size: sample.len(),
            sample,
            methodology_notes,
            pilot_metrics: None,
            strata_metadata: None,
        }
    }

    /// Copy of this result with extra items appended and notes extended.
    pub fn extended_with(
        &self,
        additional: Vec<SampleItem>,
        notes: impl IntoIterator<Item = String>,
    ) -> Self {
        let mut extended = self.clone();
        extended.sample.extend(additional);
        extended.sample_size = extended.sample.len();
        extended.methodology_notes.extend(notes);
        if let Some(metrics) = &mut extended.pilot_metrics {
            metrics.phase = PilotPhase::Expanded;
        }
        extended
    }

    /// Count of items marked `Exception` by fieldwork.
    pub fn exception_count(&self) -> usize {
        self.sample
            .iter()
            .filter(|item| item.compliance_status == ComplianceStatus::Exception)
            .count()
    }
}
