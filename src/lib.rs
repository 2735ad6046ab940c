//! # muestreo
//!
//! Statistical audit sampling per ISA/NIA 530.
//!
//! This crate answers the two questions of audit sampling: *how many and
//! which records to test*, and *what the test result implies about the
//! whole population*. It provides:
//! - Per-method sample-size computation (attribute, MUS, stratified,
//!   classical variables, non-statistical)
//! - Seeded deterministic systematic selection: same seed + same rows =
//!   same sample, always
//! - Stratified allocation (proportional, equal, Neyman, manual) with a
//!   mandatory certainty stratum
//! - Pilot-phase calibration and stop-or-go expansion
//! - Error projection with Poisson upper error limits
//!
//! ## Quick Start
//!
//! ```
//! use muestreo::{plan, PopulationRow, SamplingParameters, ConfidenceLevel};
//!
//! let rows: Vec<PopulationRow> = (0..1_000)
//!     .map(|i| PopulationRow::new(format!("inv-{i}"), 100.0 + i as f64))
//!     .collect();
//!
//! let params = SamplingParameters::Attribute {
//!     confidence: ConfidenceLevel::NinetyFive,
//!     tolerable_error_pct: 5.0,
//!     expected_error_pct: 0.0,
//!     sequential: false,
//! };
//!
//! let results = plan(&rows, &params, 42).unwrap();
//! assert!(results.sample_size <= rows.len());
//! ```
//!
//! After fieldwork, feed the compliance outcomes back through
//! [`project_results`] for the projected error and upper error limit, or
//! through [`extend`] when a pilot demands a larger sample.
//!
//! The engine is purely synchronous and holds no state across calls;
//! every entry point is a pure function of `(rows, parameters, seed)`.
//! Degenerate inputs degrade into methodology notes rather than errors,
//! since the output feeds audit documentation that must record why every
//! number was adjusted.

#![warn(missing_docs)]
#![warn(clippy::all)]

// Core modules
mod constants;
mod engine;
mod error;
mod params;
mod population;
mod result;
mod types;

// Functional modules
pub mod inference;
pub mod pilot;
pub mod selection;
pub mod sizing;
pub mod stratify;

// Re-exports for the public API
pub use constants::{
    attribute_reliability_factor, ATTRIBUTE_PILOT_SIZE, CAV_PILOT_SIZE, MUS_PILOT_SIZE,
};
pub use engine::{extend, plan, project_results};
pub use error::ParameterError;
pub use inference::{
    poisson_factor, Conclusion, ErrorProjection, PoissonTier, PopulationContext,
};
pub use params::SamplingParameters;
pub use population::{PopulationRow, PopulationSummary};
pub use result::{AuditResults, PilotMetrics, SampleItem, StratumMetadata};
pub use types::{
    AllocationMethod, ComplianceStatus, ConfidenceLevel, FindingCategory, MethodTag,
    NegativePolicy, NonStatisticalMode, PilotPhase, RiskFlag, StratificationBasis,
};
