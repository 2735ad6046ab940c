//! Population rows and summary statistics.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// One audited transaction, as supplied by the data-loading collaborator.
///
/// Rows are immutable inputs. `risk_score` and `risk_factors` come from a
/// separate risk-scoring collaborator and are treated as opaque here: the
/// engine reads them for certainty extraction and risk-based selection but
/// never computes them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PopulationRow {
    /// Caller-assigned unique identifier.
    pub id: String,

    /// Recorded monetary value. May be negative; MUS applies its
    /// configured negative-value policy before sizing.
    pub monetary_value: f64,

    /// Optional risk score in [0, 100] from the risk-scoring collaborator.
    #[serde(default)]
    pub risk_score: Option<f64>,

    /// Optional finding annotations ("Outlier", "Benford anomaly", ...).
    #[serde(default)]
    pub risk_factors: Vec<String>,

    /// Remaining source columns, kept opaque for categorical stratification.
    #[serde(default)]
    pub raw: BTreeMap<String, serde_json::Value>,
}

impl PopulationRow {
    /// Build a row with just an id and a monetary value.
    pub fn new(id: impl Into<String>, monetary_value: f64) -> Self {
        Self {
            id: id.into(),
            monetary_value,
            risk_score: None,
            risk_factors: Vec::new(),
            raw: BTreeMap::new(),
        }
    }

    /// Attach a risk score.
    pub fn with_risk_score(mut self, score: f64) -> Self {
        self.risk_score = Some(score);
        self
    }

    /// Attach risk factor annotations.
    pub fn with_risk_factors(mut self, factors: Vec<String>) -> Self {
        self.risk_factors = factors;
        self
    }

    /// Attach an opaque payload column.
    pub fn with_column(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.raw.insert(key.into(), value);
        self
    }

    /// String form of a payload column, used as a categorical stratum key.
    ///
    /// Missing columns and non-scalar values collapse to `"<none>"` so
    /// rows with incomplete payloads still land in a stratum.
    pub fn column_key(&self, column: &str) -> String {
        match self.raw.get(column) {
            Some(serde_json::Value::String(s)) => s.clone(),
            Some(serde_json::Value::Number(n)) => n.to_string(),
            Some(serde_json::Value::Bool(b)) => b.to_string(),
            _ => "<none>".to_string(),
        }
    }
}

/// Count, total value, and dispersion of a set of rows.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PopulationSummary {
    /// Number of rows.
    pub count: usize,
    /// Sum of monetary values.
    pub total_value: f64,
    /// Arithmetic mean of monetary values (0 for an empty set).
    pub mean_value: f64,
    /// Sample standard deviation (n-1 denominator; 0 when n < 2).
    pub std_dev: f64,
}

impl PopulationSummary {
    /// Summarize a slice of rows.
    pub fn of(rows: &[PopulationRow]) -> Self {
        Self::of_values(rows.iter().map(|r| r.monetary_value))
    }

    /// Summarize an iterator of raw values.
    pub fn of_values(values: impl IntoIterator<Item = f64>) -> Self {
        let values: Vec<f64> = values.into_iter().collect();
        let count = values.len();
        let total_value: f64 = values.iter().sum();
        let mean_value = if count == 0 {
            0.0
        } else {
            total_value / count as f64
        };
        let std_dev = if count < 2 {
            0.0
        } else {
            let ss: f64 = values.iter().map(|v| (v - mean_value).powi(2)).sum();
            (ss / (count as f64 - 1.0)).sqrt()
        };
        Self {
            count,
            total_value,
            mean_value,
            std_dev,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_of_empty_population() {
        let summary = PopulationSummary::of(&[]);
        assert_eq!(summary.count, 0);
        assert_eq!(summary.total_value, 0.0);
        assert_eq!(summary.std_dev, 0.0);
    }

    #[test]
    fn summary_std_dev_uses_sample_form() {
        // Values 2, 4, 4, 4, 5, 5, 7, 9: mean 5, sum of squares 32,
        // sample variance 32/7.
        let summary =
            PopulationSummary::of_values([2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]);
        assert!((summary.mean_value - 5.0).abs() < 1e-12);
        assert!((summary.std_dev - (32.0f64 / 7.0).sqrt()).abs() < 1e-12);
    }

    #[test]
    fn column_key_falls_back_for_missing_columns() {
        let row = PopulationRow::new("tx-1", 100.0)
            .with_column("branch", serde_json::json!("Bogota"));
        assert_eq!(row.column_key("branch"), "Bogota");
        assert_eq!(row.column_key("region"), "<none>");
    }
}
