//! Sampling method parameters.
//!
//! One variant per ISA/NIA 530 method. The legacy option bags are replaced
//! by a closed tagged union; `validate` rejects parameter sets that would
//! make a run meaningless before any rows are touched.

use serde::{Deserialize, Serialize};

use crate::error::ParameterError;
use crate::types::{
    AllocationMethod, ConfidenceLevel, MethodTag, NegativePolicy, NonStatisticalMode,
    StratificationBasis,
};

/// Parameters for one sampling run, tagged by method.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SamplingParameters {
    /// Attribute (deviation-rate) sampling.
    Attribute {
        /// Required confidence level (NC).
        confidence: ConfidenceLevel,

        /// Tolerable deviation rate in percent (ET), in (0, 100].
        tolerable_error_pct: f64,

        /// Expected deviation rate in percent (PE). Zero disables the
        /// reliability-factor branch. Must stay below `tolerable_error_pct`.
        expected_error_pct: f64,

        /// Sequential ("stop-or-go") mode: draw a fixed 25-item pilot and
        /// expand only if exceptions appear.
        sequential: bool,
    },

    /// Monetary unit sampling.
    Mus {
        /// Tolerable misstatement in monetary units (TE).
        tolerable_error: f64,

        /// Expected misstatement in monetary units (EE).
        expected_error: f64,

        /// Risk of incorrect acceptance in percent (RIA). At or below 5
        /// the 95% factor tier applies, otherwise the 90% tier.
        risk_incorrect_acceptance: f64,

        /// Negative-value treatment applied before the effective
        /// population value is computed.
        negative_policy: NegativePolicy,

        /// Extract rows with `value >= J` or `risk_score >= 80` at 100%.
        extract_certainty: bool,

        /// Draw a fixed 30-item pilot before the full sample.
        pilot: bool,
    },

    /// Stratified sampling.
    Stratified {
        /// Grouping basis for residual rows.
        basis: StratificationBasis,

        /// Number of monetary bins (ignored for categorical bases).
        strata_count: usize,

        /// Allocation of the total size across strata.
        allocation: AllocationMethod,

        /// Rows at or above this value form the mandatory certainty
        /// stratum, examined at 100%.
        certainty_threshold: f64,

        /// Required confidence level (NC).
        confidence: ConfidenceLevel,

        /// Tolerable error in percent of total population value (ET).
        tolerable_error_pct: f64,

        /// Caller override for the total size; when present the
        /// theoretical formula is skipped.
        size_override: Option<usize>,

        /// Per-stratum counts for `AllocationMethod::Manual`, in stratum
        /// order. Missing tail entries default to 0.
        manual_allocations: Option<Vec<usize>>,
    },

    /// Classical variables sampling (mean-per-unit).
    Cav {
        /// Tolerable misstatement in monetary units (TE).
        tolerable_error: f64,

        /// Required confidence level (NC).
        confidence: ConfidenceLevel,

        /// Designed population standard deviation.
        sigma: f64,

        /// Draw a fixed 50-item pilot and calibrate sigma from it.
        pilot: bool,
    },

    /// Non-statistical (judgmental) selection.
    NonStatistical {
        /// Requested number of items.
        sample_size: usize,

        /// Selection mode.
        mode: NonStatisticalMode,
    },
}

impl SamplingParameters {
    /// Which method these parameters drive.
    pub fn method(&self) -> MethodTag {
        match self {
            Self::Attribute { .. } => MethodTag::Attribute,
            Self::Mus { .. } => MethodTag::Mus,
            Self::Stratified { .. } => MethodTag::Stratified,
            Self::Cav { .. } => MethodTag::Cav,
            Self::NonStatistical { .. } => MethodTag::NonStatistical,
        }
    }

    /// Check the parameter set for construction-time validity.
    pub fn validate(&self) -> Result<(), ParameterError> {
        match self {
            Self::Attribute {
                tolerable_error_pct,
                expected_error_pct,
                ..
            } => {
                check_pct("tolerable_error_pct", *tolerable_error_pct)?;
                if *expected_error_pct < 0.0 || *expected_error_pct > 100.0 {
                    return Err(ParameterError::PercentageOutOfRange {
                        field: "expected_error_pct",
                        value: *expected_error_pct,
                    });
                }
                if *expected_error_pct >= *tolerable_error_pct {
                    return Err(ParameterError::ExpectedExceedsTolerable {
                        expected: *expected_error_pct,
                        tolerable: *tolerable_error_pct,
                    });
                }
                Ok(())
            }
            Self::Mus {
                tolerable_error,
                expected_error,
                risk_incorrect_acceptance,
                ..
            } => {
                check_positive("tolerable_error", *tolerable_error)?;
                if *expected_error < 0.0 {
                    return Err(ParameterError::NonPositive {
                        field: "expected_error",
                        value: *expected_error,
                    });
                }
                check_pct("risk_incorrect_acceptance", *risk_incorrect_acceptance)
            }
            Self::Stratified {
                basis,
                strata_count,
                allocation,
                tolerable_error_pct,
                manual_allocations,
                ..
            } => {
                check_pct("tolerable_error_pct", *tolerable_error_pct)?;
                if matches!(basis, StratificationBasis::Monetary) && *strata_count == 0 {
                    return Err(ParameterError::ZeroStrata);
                }
                if let StratificationBasis::Category(column) = basis {
                    if column.is_empty() {
                        return Err(ParameterError::EmptyCategoryBasis);
                    }
                }
                if let StratificationBasis::MultiVariable(columns) = basis {
                    if columns.is_empty() {
                        return Err(ParameterError::EmptyCategoryBasis);
                    }
                }
                if *allocation == AllocationMethod::Manual && manual_allocations.is_none() {
                    return Err(ParameterError::MissingManualAllocations);
                }
                Ok(())
            }
            Self::Cav {
                tolerable_error,
                sigma,
                ..
            } => {
                check_positive("tolerable_error", *tolerable_error)?;
                check_positive("sigma", *sigma)
            }
            // Zero items is a valid (empty) request per the error design.
            Self::NonStatistical { .. } => Ok(()),
        }
    }
}

fn check_pct(field: &'static str, value: f64) -> Result<(), ParameterError> {
    if value > 0.0 && value <= 100.0 && value.is_finite() {
        Ok(())
    } else {
        Err(ParameterError::PercentageOutOfRange { field, value })
    }
}

fn check_positive(field: &'static str, value: f64) -> Result<(), ParameterError> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(ParameterError::NonPositive { field, value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attribute(et: f64, pe: f64) -> SamplingParameters {
        SamplingParameters::Attribute {
            confidence: ConfidenceLevel::NinetyFive,
            tolerable_error_pct: et,
            expected_error_pct: pe,
            sequential: false,
        }
    }

    #[test]
    fn attribute_validation() {
        assert!(attribute(5.0, 0.0).validate().is_ok());
        assert!(attribute(5.0, 2.0).validate().is_ok());
        assert!(matches!(
            attribute(0.0, 0.0).validate(),
            Err(ParameterError::PercentageOutOfRange { .. })
        ));
        assert!(matches!(
            attribute(5.0, 5.0).validate(),
            Err(ParameterError::ExpectedExceedsTolerable { .. })
        ));
    }

    #[test]
    fn mus_rejects_nonpositive_tolerable() {
        let params = SamplingParameters::Mus {
            tolerable_error: 0.0,
            expected_error: 0.0,
            risk_incorrect_acceptance: 5.0,
            negative_policy: NegativePolicy::Zero,
            extract_certainty: false,
            pilot: false,
        };
        assert!(matches!(
            params.validate(),
            Err(ParameterError::NonPositive { field: "tolerable_error", .. })
        ));
    }

    #[test]
    fn manual_allocation_requires_counts() {
        let params = SamplingParameters::Stratified {
            basis: StratificationBasis::Monetary,
            strata_count: 3,
            allocation: AllocationMethod::Manual,
            certainty_threshold: 10_000.0,
            confidence: ConfidenceLevel::NinetyFive,
            tolerable_error_pct: 5.0,
            size_override: None,
            manual_allocations: None,
        };
        assert_eq!(
            params.validate(),
            Err(ParameterError::MissingManualAllocations)
        );
    }

    #[test]
    fn method_tags() {
        assert_eq!(attribute(5.0, 0.0).method(), MethodTag::Attribute);
        let params = SamplingParameters::NonStatistical {
            sample_size: 10,
            mode: NonStatisticalMode::Systematic,
        };
        assert_eq!(params.method(), MethodTag::NonStatistical);
    }
}
