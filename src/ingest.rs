//! Trade log loading and preparation.
//!
//! Source selection: an explicit file wins, otherwise the default log path,
//! otherwise [`IngestError::MissingSourceData`]. After loading, missing
//! columns are backfilled and strategies detected (see [`prepare`]).

use rand::Rng;
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};

use crate::advisory::Advisory;
use crate::backfill::backfill_columns;
use crate::classify::apply_strategy_detection;
use crate::error::IngestError;
use crate::logging::{log_advisory, log_ingest};
use crate::trade_log::TradeLog;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogSource {
    Supplied(PathBuf),
    Default(PathBuf),
    Inline,
}

impl LogSource {
    pub fn describe(&self) -> String {
        match self {
            LogSource::Supplied(p) => format!("Loaded: {}", p.display()),
            LogSource::Default(p) => format!("Loaded default log ({})", p.display()),
            LogSource::Inline => "Loaded inline log".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LoadedLog {
    pub log: TradeLog,
    pub source: LogSource,
    pub sha256: String,
    pub advisories: Vec<Advisory>,
}

/// Loads the trade log from `supplied`, falling back to `default_path`.
pub fn load_trade_log(
    supplied: Option<&Path>,
    default_path: &Path,
    delimiter: char,
) -> Result<LoadedLog, IngestError> {
    let (path, source) = match supplied {
        Some(p) => (p.to_path_buf(), LogSource::Supplied(p.to_path_buf())),
        None if default_path.exists() => (
            default_path.to_path_buf(),
            LogSource::Default(default_path.to_path_buf()),
        ),
        None => {
            return Err(IngestError::MissingSourceData {
                default_path: default_path.to_path_buf(),
            })
        }
    };
    let text = fs::read_to_string(&path).map_err(|source| IngestError::Io {
        path: path.clone(),
        source,
    })?;
    let mut loaded = parse_loaded(&text, delimiter)?;
    loaded.source = source;
    log_ingest(
        &path.display().to_string(),
        loaded.log.len(),
        loaded.log.header(),
        &loaded.sha256,
    );
    Ok(loaded)
}

/// Parses an in-memory delimited trade log.
pub fn parse_loaded(text: &str, delimiter: char) -> Result<LoadedLog, IngestError> {
    let (log, advisories) = parse_trade_log(text, delimiter)?;
    Ok(LoadedLog {
        log,
        source: LogSource::Inline,
        sha256: content_sha256(text.as_bytes()),
        advisories,
    })
}

/// Parses delimited text with a header row. Blank lines and `#` comments are
/// skipped. Short rows are padded with nulls; rows with too many fields are
/// dropped and reported.
pub fn parse_trade_log(
    text: &str,
    delimiter: char,
) -> Result<(TradeLog, Vec<Advisory>), IngestError> {
    let mut header: Option<Vec<String>> = None;
    let mut rows = Vec::new();
    let mut advisories = Vec::new();

    for (line_no, line) in record_lines(text) {
        let fields = match split_record(line, delimiter, line_no) {
            Ok(f) => f,
            Err(err) if header.is_some() => {
                advisories.push(Advisory::MalformedRow {
                    line: line_no,
                    reason: err.to_string(),
                });
                continue;
            }
            Err(err) => return Err(err),
        };
        let expected = match &header {
            Some(h) => h.len(),
            None => {
                header = Some(fields.into_iter().map(|f| f.trim().to_string()).collect());
                continue;
            }
        };
        if fields.len() > expected {
            let err = IngestError::RowWidth {
                line: line_no,
                expected,
                got: fields.len(),
            };
            advisories.push(Advisory::MalformedRow {
                line: line_no,
                reason: err.to_string(),
            });
        } else {
            rows.push(fields);
        }
    }

    let header = header.ok_or(IngestError::EmptyHeader)?;
    for adv in &advisories {
        log_advisory(adv);
    }
    Ok((TradeLog::from_rows(header, rows), advisories))
}

/// Numbered record lines with a leading byte-order mark removed. Blank and
/// `#` lines are skipped by their trimmed view, but records are yielded
/// untrimmed so a whitespace delimiter keeps empty edge fields.
pub fn record_lines(text: &str) -> impl Iterator<Item = (usize, &str)> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    text.lines()
        .enumerate()
        .map(|(i, l)| (i + 1, l.strip_suffix('\r').unwrap_or(l)))
        .filter(|(_, l)| {
            let t = l.trim();
            !t.is_empty() && !t.starts_with('#')
        })
}

/// Splits one record, honouring double-quoted fields (`""` escapes a quote).
pub fn split_record(
    line: &str,
    delimiter: char,
    line_no: usize,
) -> Result<Vec<String>, IngestError> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '"' if in_quotes => {
                if chars.peek() == Some(&'"') {
                    current.push('"');
                    chars.next();
                } else {
                    in_quotes = false;
                }
            }
            '"' if current.trim().is_empty() => {
                current.clear();
                in_quotes = true;
            }
            c if c == delimiter && !in_quotes => {
                fields.push(std::mem::take(&mut current));
            }
            c => current.push(c),
        }
    }
    if in_quotes {
        return Err(IngestError::UnterminatedQuote { line: line_no });
    }
    fields.push(current);
    Ok(fields)
}

/// Serializes a log back to delimited text, header first.
pub fn write_csv(log: &TradeLog, delimiter: char) -> String {
    let mut out = String::new();
    push_record(&mut out, log.header().iter().map(String::as_str), delimiter);
    for row in log.to_rows() {
        push_record(&mut out, row.iter().map(String::as_str), delimiter);
    }
    out
}

fn push_record<'a>(out: &mut String, cells: impl Iterator<Item = &'a str>, delimiter: char) {
    for (i, cell) in cells.enumerate() {
        if i > 0 {
            out.push(delimiter);
        }
        if cell.contains(delimiter) || cell.contains('"') || cell.contains('\n') {
            out.push('"');
            out.push_str(&cell.replace('"', "\"\""));
            out.push('"');
        } else {
            out.push_str(cell);
        }
    }
    out.push('\n');
}

/// Backfills missing columns, then labels strategies. Returns every advisory
/// raised, in order.
pub fn prepare<R: Rng + ?Sized>(log: &mut TradeLog, rng: &mut R) -> Vec<Advisory> {
    let mut advisories = backfill_columns(log, rng);
    if let Some(adv) = apply_strategy_detection(log) {
        advisories.push(adv);
    }
    for adv in &advisories {
        log_advisory(adv);
    }
    advisories
}

pub fn content_sha256(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}
