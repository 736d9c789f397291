//! Live price bars for the chart panel.
//!
//! Feeds hand back a [`BarTable`]; the chart is drawn only when every one of
//! [`CHART_COLUMNS`] is present. A feed missing a column is not an error.

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, NaiveDateTime, TimeZone, Utc};
use serde::Serialize;
use std::fs;
use std::path::PathBuf;

use crate::ingest::{record_lines, split_record};
use crate::logging::{log, obj, v_str, Domain, Level};

pub const CHART_COLUMNS: [&str; 6] = ["Time", "Open", "High", "Low", "Close", "Volume"];

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LiveBar {
    pub time: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl LiveBar {
    /// Mean of open, high, low and close.
    pub fn typical_price(&self) -> f64 {
        (self.open + self.high + self.low + self.close) / 4.0
    }

    pub fn is_up(&self) -> bool {
        self.close >= self.open
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BarTable {
    pub columns: Vec<String>,
    /// Chronological.
    pub bars: Vec<LiveBar>,
}

impl BarTable {
    pub fn complete(bars: Vec<LiveBar>) -> Self {
        Self {
            columns: CHART_COLUMNS.iter().map(|c| c.to_string()).collect(),
            bars,
        }
    }

    pub fn chart_ready(&self) -> bool {
        CHART_COLUMNS
            .iter()
            .all(|c| self.columns.iter().any(|have| have == c))
    }

    pub fn missing_columns(&self) -> Vec<&'static str> {
        CHART_COLUMNS
            .iter()
            .copied()
            .filter(|c| !self.columns.iter().any(|have| have == c))
            .collect()
    }
}

pub trait LiveFeed {
    fn fetch_bars(&self) -> Result<BarTable>;
}

/// Rising one-minute bars anchored at `start` (or now).
#[derive(Debug, Clone)]
pub struct SyntheticFeed {
    pub base_price: f64,
    pub periods: usize,
    pub interval: Duration,
    pub start: Option<DateTime<Utc>>,
}

impl Default for SyntheticFeed {
    fn default() -> Self {
        Self {
            base_price: 4170.0,
            periods: 15,
            interval: Duration::minutes(1),
            start: None,
        }
    }
}

impl SyntheticFeed {
    pub fn starting_at(start: DateTime<Utc>) -> Self {
        Self {
            start: Some(start),
            ..Self::default()
        }
    }

    pub fn generate(&self, start: DateTime<Utc>) -> Vec<LiveBar> {
        (0..self.periods)
            .map(|i| {
                let step = i as f64;
                let open = self.base_price + step;
                LiveBar {
                    time: start + self.interval * i as i32,
                    open,
                    high: open + 1.0,
                    low: open - 1.0,
                    close: open + 0.5,
                    volume: 100.0 + step * 10.0,
                }
            })
            .collect()
    }
}

impl LiveFeed for SyntheticFeed {
    fn fetch_bars(&self) -> Result<BarTable> {
        let start = self.start.unwrap_or_else(Utc::now);
        Ok(BarTable::complete(self.generate(start)))
    }
}

/// Bars read from a delimited file with a `Time,Open,High,Low,Close,Volume` header.
#[derive(Debug, Clone)]
pub struct CsvFeed {
    pub path: PathBuf,
    pub delimiter: char,
}

impl CsvFeed {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            delimiter: ',',
        }
    }
}

impl LiveFeed for CsvFeed {
    fn fetch_bars(&self) -> Result<BarTable> {
        let text = fs::read_to_string(&self.path)
            .with_context(|| format!("reading bars from {}", self.path.display()))?;
        parse_bars(&text, self.delimiter)
    }
}

pub fn parse_bars(text: &str, delimiter: char) -> Result<BarTable> {
    let mut lines = record_lines(text);

    let Some((header_no, header_line)) = lines.next() else {
        return Ok(BarTable::default());
    };
    let columns: Vec<String> = split_record(header_line, delimiter, header_no)?
        .into_iter()
        .map(|c| c.trim().to_string())
        .collect();
    let mut table = BarTable {
        columns,
        bars: Vec::new(),
    };
    if !table.chart_ready() {
        log(
            Level::Warn,
            Domain::Feed,
            "chart_disabled",
            obj(&[("missing", v_str(&table.missing_columns().join(",")))]),
        );
        return Ok(table);
    }

    let idx: Vec<usize> = CHART_COLUMNS
        .iter()
        .filter_map(|c| table.columns.iter().position(|have| have == c))
        .collect();
    for (line_no, line) in lines {
        let fields = split_record(line, delimiter, line_no)?;
        match parse_bar(&fields, &idx) {
            Some(bar) => table.bars.push(bar),
            None => log(
                Level::Warn,
                Domain::Feed,
                "bad_bar",
                obj(&[("line", serde_json::json!(line_no))]),
            ),
        }
    }
    table.bars.sort_by_key(|b| b.time);
    Ok(table)
}

fn parse_bar(fields: &[String], idx: &[usize]) -> Option<LiveBar> {
    let get = |i: usize| fields.get(idx[i]).map(|s| s.trim());
    let num = |i: usize| get(i).and_then(|s| s.parse::<f64>().ok());
    Some(LiveBar {
        time: parse_time(get(0)?)?,
        open: num(1)?,
        high: num(2)?,
        low: num(3)?,
        close: num(4)?,
        volume: num(5)?,
    })
}

/// RFC3339, `YYYY-MM-DD HH:MM:SS[.f]` (taken as UTC), or epoch seconds.
pub fn parse_time(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(t) = DateTime::parse_from_rfc3339(raw) {
        return Some(t.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }
    raw.parse::<i64>()
        .ok()
        .and_then(|secs| Utc.timestamp_opt(secs, 0).single())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn anchor() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 12, 14, 0, 0).unwrap()
    }

    #[test]
    fn synthetic_bars_are_minute_spaced_and_rising() {
        let table = SyntheticFeed::starting_at(anchor()).fetch_bars().unwrap();
        assert!(table.chart_ready());
        assert_eq!(table.bars.len(), 15);
        let first = table.bars[0];
        assert_eq!(first.open, 4170.0);
        assert_eq!(first.high, 4171.0);
        assert_eq!(first.low, 4169.0);
        assert_eq!(first.close, 4170.5);
        assert_eq!(first.volume, 100.0);
        for pair in table.bars.windows(2) {
            assert_eq!(pair[1].time - pair[0].time, Duration::minutes(1));
            assert_eq!(pair[1].open - pair[0].open, 1.0);
        }
        assert_eq!(table.bars[14].volume, 240.0);
    }

    #[test]
    fn typical_price_is_ohlc_mean() {
        let bar = SyntheticFeed::default().generate(anchor())[0];
        assert_eq!(bar.typical_price(), (4170.0 + 4171.0 + 4169.0 + 4170.5) / 4.0);
        assert!(bar.is_up());
    }

    #[test]
    fn parses_bar_file_in_any_column_order() {
        let text = "Volume,Time,Open,High,Low,Close\n\
                    110,2024-06-12 14:01:00,2,3,1,2.5\n\
                    100,2024-06-12 14:00:00,1,2,0.5,1.5\n";
        let table = parse_bars(text, ',').unwrap();
        assert!(table.chart_ready());
        assert_eq!(table.bars.len(), 2);
        assert_eq!(table.bars[0].time, anchor());
        assert_eq!(table.bars[0].volume, 100.0);
        assert_eq!(table.bars[1].close, 2.5);
    }

    #[test]
    fn missing_column_disables_chart() {
        let table = parse_bars("Time,Open,High,Low,Close\n1718200800,1,2,0.5,1.5\n", ',').unwrap();
        assert!(!table.chart_ready());
        assert_eq!(table.missing_columns(), vec!["Volume"]);
        assert!(table.bars.is_empty());
    }

    #[test]
    fn bad_rows_are_skipped() {
        let text = "Time,Open,High,Low,Close,Volume\n\
                    not-a-time,1,2,0,1,5\n\
                    1718200800,1,2,0.5,1.5,9\n";
        let table = parse_bars(text, ',').unwrap();
        assert_eq!(table.bars.len(), 1);
        assert_eq!(table.bars[0].time, anchor());
    }

    #[test]
    fn time_formats() {
        assert_eq!(parse_time("2024-06-12T14:00:00Z"), Some(anchor()));
        assert_eq!(parse_time("2024-06-12 14:00:00"), Some(anchor()));
        assert_eq!(parse_time("1718200800"), Some(anchor()));
        assert_eq!(parse_time("14:00 ET"), None);
    }

    #[test]
    fn tab_delimited_file_with_bom() {
        let text = "\u{feff}Time\tOpen\tHigh\tLow\tClose\tVolume\r\n\
                    1718200800\t1\t2\t0.5\t1.5\t9\r\n";
        let table = parse_bars(text, '\t').unwrap();
        assert!(table.chart_ready());
        assert_eq!(table.columns[0], "Time");
        assert_eq!(table.bars.len(), 1);
        assert_eq!(table.bars[0].volume, 9.0);
    }
}
