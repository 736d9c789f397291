use serde::Serialize;
use std::fmt;

/// Non-fatal conditions raised while building a cycle. Callers may display
/// them; none of them stop processing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Advisory {
    /// A required column was absent and has been synthesized.
    MissingColumn { column: String, action: String },
    /// Strategy labels were derived for every row.
    StrategiesDetected { rows: usize },
    /// Aggregation did not run because a column it needs is absent.
    AggregationSkipped { missing: String },
    /// A data row was dropped at load time.
    MalformedRow { line: usize, reason: String },
}

impl Advisory {
    pub fn code(&self) -> &'static str {
        match self {
            Advisory::MissingColumn { .. } => "missing_column",
            Advisory::StrategiesDetected { .. } => "strategies_detected",
            Advisory::AggregationSkipped { .. } => "aggregation_skipped",
            Advisory::MalformedRow { .. } => "malformed_row",
        }
    }

    pub fn is_warning(&self) -> bool {
        !matches!(self, Advisory::StrategiesDetected { .. })
    }
}

impl fmt::Display for Advisory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Advisory::MissingColumn { column, action } => {
                write!(f, "'{}' column missing. {}", column, action)
            }
            Advisory::StrategiesDetected { rows } => {
                write!(f, "Strategies detected for {} rows", rows)
            }
            Advisory::AggregationSkipped { missing } => {
                write!(f, "'{}' column missing. Win rate not computed.", missing)
            }
            Advisory::MalformedRow { line, reason } => {
                write!(f, "Skipped line {}: {}", line, reason)
            }
        }
    }
}
