//! Closed enumerations shared across the engine.
//!
//! The legacy system carried these as loose strings and option bags; here
//! every state is a closed enum, with serde renames preserving the wire
//! strings that downstream report templates already match on.

use serde::{Deserialize, Serialize};

/// Confidence level for statistical size formulas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConfidenceLevel {
    /// 90% confidence (z = 1.645).
    Ninety,
    /// 95% confidence (z = 1.96).
    NinetyFive,
    /// 99% confidence (z = 2.576).
    NinetyNine,
}

impl ConfidenceLevel {
    /// Two-sided z-score for this confidence level.
    pub fn z_score(self) -> f64 {
        match self {
            Self::Ninety => 1.645,
            Self::NinetyFive => 1.96,
            Self::NinetyNine => 2.576,
        }
    }

    /// Confidence as a percentage.
    pub fn percent(self) -> f64 {
        match self {
            Self::Ninety => 90.0,
            Self::NinetyFive => 95.0,
            Self::NinetyNine => 99.0,
        }
    }
}

/// Fieldwork outcome of a sample item.
///
/// Every item starts `Pending`; the fieldwork collaborator flips it to
/// `Ok` or `Exception` before inference runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ComplianceStatus {
    /// Not yet examined.
    #[default]
    Pending,
    /// Examined, no deviation found.
    Ok,
    /// Examined, deviation or misstatement found.
    Exception,
}

/// Flag attached to items selected outside the plain statistical draw.
///
/// Serialized names are the legacy report strings and must not change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskFlag {
    /// Negative row segregated for mandatory manual review.
    #[serde(rename = "NEGATIVO_SEGREGADO")]
    NegativeSegregated,
    /// Row whose value sign was folded to absolute for sizing.
    #[serde(rename = "NEGATIVO_ABS")]
    NegativeAbsolute,
    /// Monetary certainty extraction (value at or above the interval).
    #[serde(rename = "TOP_STRATUM")]
    TopStratum,
    /// Risk-score certainty extraction.
    #[serde(rename = "PARTIDA_CLAVE")]
    KeyItem,
    /// Selected by descending risk score in non-statistical mode.
    #[serde(rename = "ALTO RIESGO")]
    HighRisk,
}

/// Treatment of negative monetary values before a MUS run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NegativePolicy {
    /// Remove negative rows from the statistical population and report
    /// them individually for manual review.
    Separate,
    /// Clamp negative values to zero.
    Zero,
    /// Use absolute values, remembering the original sign.
    Absolute,
}

/// How a stratified sample is allocated across strata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AllocationMethod {
    /// `n_h = round(n * N_h / N)`.
    Proportional,
    /// `n_h = round(n / #strata)`.
    Equal,
    /// Variance-minimizing: `n_h = round(n * N_h * sigma_h / sum(N_i * sigma_i))`.
    Neyman,
    /// Caller-supplied per-stratum counts, used verbatim.
    Manual,
}

/// Basis on which residual rows are grouped into strata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StratificationBasis {
    /// Equal-count monetary bins over ascending value.
    Monetary,
    /// Group by one categorical column from the row payload.
    Category(String),
    /// Group by the concatenation of several categorical columns.
    MultiVariable(Vec<String>),
}

/// Finding category for directed non-statistical selection.
///
/// Matching is by substring against each row's risk factor annotations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FindingCategory {
    /// Statistical outlier findings.
    Outliers,
    /// Benford first-digit anomalies.
    Benford,
    /// Duplicate record findings.
    Duplicates,
    /// Suspiciously round amounts.
    RoundNumbers,
}

impl FindingCategory {
    /// Substring matched against risk factor annotations.
    pub fn pattern(self) -> &'static str {
        match self {
            Self::Outliers => "Outlier",
            Self::Benford => "Benford",
            Self::Duplicates => "Duplicate",
            Self::RoundNumbers => "Round",
        }
    }
}

/// Selection mode for the non-statistical method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NonStatisticalMode {
    /// Top-n rows by descending risk score, flagged high risk.
    RiskScoring,
    /// Rows whose risk factors match a finding category, topped up
    /// systematically when matches run short.
    Directed(FindingCategory),
    /// Plain systematic selection.
    Systematic,
}

/// Which sampling method produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MethodTag {
    /// Attribute (deviation-rate) sampling.
    Attribute,
    /// Monetary unit sampling.
    Mus,
    /// Stratified sampling.
    Stratified,
    /// Classical variables sampling (mean-per-unit).
    Cav,
    /// Non-statistical selection.
    NonStatistical,
}

/// Where a pilot-driven run currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PilotPhase {
    /// Only the fixed-size pilot has been drawn.
    PilotOnly,
    /// The sample was expanded past the pilot.
    Expanded,
}
