use std::collections::BTreeSet;
use std::path::PathBuf;

/// Refresh choices offered by the dashboard, in milliseconds.
pub const REFRESH_LABELS: [(&str, u64); 5] = [
    ("Off", 0),
    ("1s", 1_000),
    ("5s", 5_000),
    ("10s", 10_000),
    ("30s", 30_000),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NewsSource {
    Static,
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

/// Options for a render cycle. Owned by the caller and passed into every
/// cycle; the core keeps nothing between cycles.
#[derive(Debug, Clone)]
pub struct DashboardConfig {
    /// 0 disables auto refresh.
    pub auto_refresh_interval_ms: u64,
    /// Strategies to show. Empty shows all.
    pub strategy_filter: BTreeSet<String>,
    pub trade_log_path: Option<PathBuf>,
    pub default_log_path: PathBuf,
    pub delimiter: char,
    pub preview_rows: usize,
    pub news_source: NewsSource,
    /// Bars file; the synthetic feed is used when unset.
    pub feed_csv: Option<PathBuf>,
    pub output: OutputFormat,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            auto_refresh_interval_ms: 0,
            strategy_filter: BTreeSet::new(),
            trade_log_path: None,
            default_log_path: PathBuf::from("data/test_trade_log.csv"),
            delimiter: ',',
            preview_rows: 10,
            news_source: NewsSource::Static,
            feed_csv: None,
            output: OutputFormat::Text,
        }
    }
}

impl DashboardConfig {
    pub fn from_env() -> Self {
        let d = Self::default();
        Self {
            auto_refresh_interval_ms: std::env::var("DASH_REFRESH")
                .ok()
                .and_then(|v| parse_refresh(&v))
                .unwrap_or(d.auto_refresh_interval_ms),
            strategy_filter: std::env::var("DASH_STRATEGIES")
                .map(|v| parse_strategy_filter(&v))
                .unwrap_or_default(),
            trade_log_path: std::env::var("DASH_TRADE_LOG").ok().map(PathBuf::from),
            default_log_path: std::env::var("DASH_DEFAULT_LOG")
                .map(PathBuf::from)
                .unwrap_or(d.default_log_path),
            delimiter: std::env::var("DASH_DELIMITER")
                .ok()
                .and_then(|v| parse_delimiter(&v))
                .unwrap_or(d.delimiter),
            preview_rows: std::env::var("DASH_PREVIEW_ROWS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(d.preview_rows),
            news_source: match std::env::var("DASH_NEWS")
                .unwrap_or_default()
                .to_lowercase()
                .as_str()
            {
                "none" | "off" => NewsSource::None,
                _ => NewsSource::Static,
            },
            feed_csv: std::env::var("DASH_FEED_CSV").ok().map(PathBuf::from),
            output: match std::env::var("DASH_OUTPUT")
                .unwrap_or_default()
                .to_lowercase()
                .as_str()
            {
                "json" => OutputFormat::Json,
                _ => OutputFormat::Text,
            },
        }
    }

    pub fn auto_refresh(&self) -> bool {
        self.auto_refresh_interval_ms > 0
    }
}

/// Accepts a dashboard label (`Off`, `5s`, ...), `<n>ms`, `<n>s`, or bare milliseconds.
pub fn parse_refresh(raw: &str) -> Option<u64> {
    let raw = raw.trim();
    if let Some((_, ms)) = REFRESH_LABELS.iter().find(|(l, _)| l.eq_ignore_ascii_case(raw)) {
        return Some(*ms);
    }
    if let Some(n) = raw.strip_suffix("ms") {
        return n.trim().parse().ok();
    }
    if let Some(n) = raw.strip_suffix('s') {
        return n.trim().parse::<u64>().ok().map(|s| s * 1_000);
    }
    raw.parse().ok()
}

/// Comma-separated labels; blanks are dropped.
pub fn parse_strategy_filter(raw: &str) -> BTreeSet<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Single character, or `tab` / `\t` for a tab.
pub fn parse_delimiter(raw: &str) -> Option<char> {
    match raw {
        "\\t" | "tab" => Some('\t'),
        s => {
            let mut chars = s.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => Some(c),
                _ => None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn refresh_labels() {
        assert_eq!(parse_refresh("Off"), Some(0));
        assert_eq!(parse_refresh("off"), Some(0));
        assert_eq!(parse_refresh("1s"), Some(1_000));
        assert_eq!(parse_refresh("30s"), Some(30_000));
        assert_eq!(parse_refresh("250ms"), Some(250));
        assert_eq!(parse_refresh("2500"), Some(2_500));
        assert_eq!(parse_refresh("soon"), None);
    }

    #[test]
    fn strategy_filter_parsing() {
        let f = parse_strategy_filter("Breakout, Reversal,,");
        assert_eq!(f.len(), 2);
        assert!(f.contains("Breakout"));
        assert!(f.contains("Reversal"));
    }

    #[test]
    fn delimiter_parsing() {
        assert_eq!(parse_delimiter(";"), Some(';'));
        assert_eq!(parse_delimiter("tab"), Some('\t'));
        assert_eq!(parse_delimiter("\\t"), Some('\t'));
        assert_eq!(parse_delimiter(";;"), None);
        assert_eq!(parse_delimiter(""), None);
    }

    #[test]
    fn defaults() {
        let cfg = DashboardConfig::default();
        assert!(!cfg.auto_refresh());
        assert!(cfg.strategy_filter.is_empty());
        assert_eq!(cfg.preview_rows, 10);
    }
}
