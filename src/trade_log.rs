//! Column-oriented trade log.
//!
//! Only four column names carry meaning (`Strategy`, `Confidence`,
//! `Prediction`, `Result`, matched exactly). Every other column is kept
//! verbatim, in header order, so a loaded log can be written back unchanged.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

pub const STRATEGY: &str = "Strategy";
pub const CONFIDENCE: &str = "Confidence";
pub const PREDICTION: &str = "Prediction";
pub const RESULT: &str = "Result";

pub const RECOGNIZED_COLUMNS: [&str; 4] = [STRATEGY, CONFIDENCE, PREDICTION, RESULT];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Prediction {
    Up,
    Down,
    /// Any other text found in the column, kept as-is.
    Other(String),
}

impl Prediction {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "Up" => Prediction::Up,
            "Down" => Prediction::Down,
            other => Prediction::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Prediction::Up => "Up",
            Prediction::Down => "Down",
            Prediction::Other(s) => s,
        }
    }
}

impl fmt::Display for Prediction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row of the log. `None` is a null cell.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TradeRecord {
    pub strategy: Option<String>,
    pub confidence: Option<f64>,
    pub prediction: Option<Prediction>,
    pub result: Option<String>,
    /// Pass-through cells, aligned with [`TradeLog::extra_columns`].
    pub extra: Vec<Option<String>>,
}

impl TradeRecord {
    pub fn new(prediction: Prediction, confidence: f64) -> Self {
        Self {
            prediction: Some(prediction),
            confidence: Some(confidence),
            ..Self::default()
        }
    }

    pub fn with_strategy(mut self, strategy: &str) -> Self {
        self.strategy = Some(strategy.to_string());
        self
    }

    pub fn with_result(mut self, result: &str) -> Self {
        self.result = Some(result.to_string());
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TradeLog {
    header: Vec<String>,
    extra_columns: Vec<String>,
    records: Vec<TradeRecord>,
}

impl TradeLog {
    /// Builds a log from a header and records. Each record's `extra` is
    /// padded or truncated to the number of pass-through columns.
    pub fn new(header: Vec<String>, mut records: Vec<TradeRecord>) -> Self {
        let extra_columns = extra_columns_of(&header);
        for r in &mut records {
            r.extra.resize(extra_columns.len(), None);
        }
        Self {
            header,
            extra_columns,
            records,
        }
    }

    /// Builds a log from raw text cells. Blank cells are null. `Strategy`,
    /// `Confidence` and `Prediction` are trimmed; `Result` and pass-through
    /// cells are kept verbatim.
    pub fn from_rows(header: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        let mut records = Vec::with_capacity(rows.len());
        for row in rows {
            let mut rec = TradeRecord::default();
            let mut seen = BTreeSet::new();
            for (idx, name) in header.iter().enumerate() {
                let raw = row.get(idx).filter(|s| !s.trim().is_empty());
                let trimmed = raw.map(|s| s.trim().to_string());
                let verbatim = raw.cloned();
                // Repeated recognized names after the first are pass-through.
                let recognized =
                    RECOGNIZED_COLUMNS.contains(&name.as_str()) && seen.insert(name.as_str());
                if !recognized {
                    rec.extra.push(verbatim);
                    continue;
                }
                match name.as_str() {
                    STRATEGY => rec.strategy = trimmed,
                    CONFIDENCE => rec.confidence = trimmed.and_then(|c| c.parse::<f64>().ok()),
                    PREDICTION => rec.prediction = trimmed.map(|c| Prediction::parse(&c)),
                    RESULT => rec.result = verbatim,
                    _ => unreachable!("recognized column"),
                }
            }
            records.push(rec);
        }
        Self::new(header, records)
    }

    pub fn header(&self) -> &[String] {
        &self.header
    }

    pub fn extra_columns(&self) -> &[String] {
        &self.extra_columns
    }

    pub fn records(&self) -> &[TradeRecord] {
        &self.records
    }

    pub fn records_mut(&mut self) -> &mut [TradeRecord] {
        &mut self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.header.iter().any(|h| h == name)
    }

    /// Appends a recognized column to the header if it is not there yet.
    pub fn ensure_column(&mut self, name: &str) {
        debug_assert!(RECOGNIZED_COLUMNS.contains(&name));
        if !self.has_column(name) {
            self.header.push(name.to_string());
        }
    }

    /// True when the column is absent, or present with no non-null cell in a
    /// non-empty log.
    pub fn column_is_vacant(&self, name: &str) -> bool {
        if !self.has_column(name) {
            return true;
        }
        !self.records.is_empty() && self.records.iter().all(|r| self.cell(r, name).is_none())
    }

    /// Text value of a cell, by column name.
    pub fn cell(&self, record: &TradeRecord, column: &str) -> Option<String> {
        match column {
            STRATEGY => record.strategy.clone(),
            CONFIDENCE => record.confidence.map(format_confidence),
            PREDICTION => record.prediction.as_ref().map(|p| p.to_string()),
            RESULT => record.result.clone(),
            other => self
                .extra_columns
                .iter()
                .position(|c| c == other)
                .and_then(|idx| record.extra.get(idx).cloned().flatten()),
        }
    }

    /// Rows rendered as text in header order. Nulls become empty strings.
    pub fn to_rows(&self) -> Vec<Vec<String>> {
        self.records
            .iter()
            .map(|r| self.row_cells(r))
            .collect()
    }

    fn row_cells(&self, record: &TradeRecord) -> Vec<String> {
        let mut extra = record.extra.iter();
        let mut seen = BTreeSet::new();
        self.header
            .iter()
            .map(|name| {
                if RECOGNIZED_COLUMNS.contains(&name.as_str()) && seen.insert(name.as_str()) {
                    self.cell(record, name).unwrap_or_default()
                } else {
                    extra.next().cloned().flatten().unwrap_or_default()
                }
            })
            .collect()
    }

    /// First `n` records, same header.
    pub fn head(&self, n: usize) -> TradeLog {
        TradeLog {
            header: self.header.clone(),
            extra_columns: self.extra_columns.clone(),
            records: self.records.iter().take(n).cloned().collect(),
        }
    }

    /// Keeps only rows whose strategy is in `allowed`. An empty set keeps everything.
    pub fn filter_strategies(&self, allowed: &BTreeSet<String>) -> TradeLog {
        if allowed.is_empty() {
            return self.clone();
        }
        TradeLog {
            header: self.header.clone(),
            extra_columns: self.extra_columns.clone(),
            records: self
                .records
                .iter()
                .filter(|r| r.strategy.as_ref().is_some_and(|s| allowed.contains(s)))
                .cloned()
                .collect(),
        }
    }
}

fn extra_columns_of(header: &[String]) -> Vec<String> {
    let mut seen = BTreeSet::new();
    header
        .iter()
        .filter(|h| !(RECOGNIZED_COLUMNS.contains(&h.as_str()) && seen.insert(h.as_str())))
        .cloned()
        .collect()
}

/// Whole percentages print without a fractional part.
pub fn format_confidence(value: f64) -> String {
    if value.fract() == 0.0 && value.is_finite() {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(cols: &[&str]) -> Vec<String> {
        cols.iter().map(|s| s.to_string()).collect()
    }

    fn row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn parses_recognized_and_extra_columns() {
        let log = TradeLog::from_rows(
            header(&["Date", "Prediction", "Confidence", "Symbol", "Result"]),
            vec![row(&["2024-05-01", "Up", "90", "MES", "Win"])],
        );
        assert_eq!(log.extra_columns(), &["Date".to_string(), "Symbol".to_string()]);
        let r = &log.records()[0];
        assert_eq!(r.prediction, Some(Prediction::Up));
        assert_eq!(r.confidence, Some(90.0));
        assert_eq!(r.result.as_deref(), Some("Win"));
        assert_eq!(log.cell(r, "Symbol").as_deref(), Some("MES"));
    }

    #[test]
    fn empty_and_non_numeric_cells_are_null() {
        let log = TradeLog::from_rows(
            header(&["Prediction", "Confidence"]),
            vec![row(&["", "high"]), row(&["Down"])],
        );
        assert_eq!(log.records()[0].prediction, None);
        assert_eq!(log.records()[0].confidence, None);
        assert_eq!(log.records()[1].confidence, None);
    }

    #[test]
    fn unknown_prediction_is_kept_verbatim() {
        assert_eq!(Prediction::parse("Sideways"), Prediction::Other("Sideways".into()));
        assert_eq!(Prediction::parse("up"), Prediction::Other("up".into()));
        assert_eq!(Prediction::parse("Sideways").as_str(), "Sideways");
    }

    #[test]
    fn vacant_column_detection() {
        let log = TradeLog::from_rows(
            header(&["Strategy", "Prediction"]),
            vec![row(&["", "Up"]), row(&["", "Down"])],
        );
        assert!(log.column_is_vacant(STRATEGY));
        assert!(!log.column_is_vacant(PREDICTION));
        assert!(log.column_is_vacant(CONFIDENCE));

        let partial = TradeLog::from_rows(
            header(&["Confidence"]),
            vec![row(&["80"]), row(&[""])],
        );
        assert!(!partial.column_is_vacant(CONFIDENCE));
    }

    #[test]
    fn rows_keep_header_order() {
        let log = TradeLog::from_rows(
            header(&["Note", "Confidence", "Prediction"]),
            vec![row(&["a,b", "72", "Down"])],
        );
        assert_eq!(log.to_rows(), vec![row(&["a,b", "72", "Down"])]);
    }

    #[test]
    fn filter_by_strategy() {
        let log = TradeLog::new(
            header(&["Strategy", "Prediction", "Confidence"]),
            vec![
                TradeRecord::new(Prediction::Up, 90.0).with_strategy("Breakout"),
                TradeRecord::new(Prediction::Down, 80.0).with_strategy("Reversal"),
            ],
        );
        let allowed: BTreeSet<String> = ["Reversal".to_string()].into_iter().collect();
        let filtered = log.filter_strategies(&allowed);
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered.records()[0].strategy.as_deref(), Some("Reversal"));
        assert_eq!(log.filter_strategies(&BTreeSet::new()).len(), 2);
    }

    #[test]
    fn confidence_formatting() {
        assert_eq!(format_confidence(85.0), "85");
        assert_eq!(format_confidence(85.5), "85.5");
    }
}
