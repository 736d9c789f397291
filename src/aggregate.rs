use serde::Serialize;
use std::fmt;

use crate::trade_log::{TradeLog, TradeRecord, RESULT};

/// A win percentage, or no rows to compute it from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", content = "pct", rename_all = "snake_case")]
pub enum WinRate {
    NoData,
    Percent(f64),
}

impl WinRate {
    pub fn from_counts(wins: usize, trades: usize) -> Self {
        if trades == 0 {
            WinRate::NoData
        } else {
            WinRate::Percent(wins as f64 / trades as f64 * 100.0)
        }
    }

    pub fn percent(&self) -> Option<f64> {
        match self {
            WinRate::NoData => None,
            WinRate::Percent(p) => Some(*p),
        }
    }
}

impl fmt::Display for WinRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WinRate::NoData => f.write_str("no data"),
            WinRate::Percent(p) => write!(f, "{:.1}%", p),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StrategyWinRate {
    pub strategy: String,
    pub wins: usize,
    pub trades: usize,
    pub win_rate: WinRate,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PerformanceSummary {
    pub wins: usize,
    pub trades: usize,
    pub overall: WinRate,
    /// Sorted by win rate, highest first.
    pub by_strategy: Vec<StrategyWinRate>,
}

/// Case-insensitive match on "win". Anything else, including null, is not a win.
pub fn is_win(result: Option<&str>) -> bool {
    result.is_some_and(|r| r.to_lowercase() == "win")
}

pub fn overall_win_rate(records: &[TradeRecord]) -> WinRate {
    let wins = records.iter().filter(|r| is_win(r.result.as_deref())).count();
    WinRate::from_counts(wins, records.len())
}

/// Win rate per distinct strategy, highest first. Rows without a strategy are
/// not grouped. Equal rates keep first-seen order.
pub fn win_rate_by_strategy(records: &[TradeRecord]) -> Vec<StrategyWinRate> {
    let mut groups: Vec<(String, usize, usize)> = Vec::new();
    for r in records {
        let Some(strategy) = r.strategy.as_deref() else {
            continue;
        };
        let win = is_win(r.result.as_deref()) as usize;
        match groups.iter_mut().find(|(name, _, _)| name == strategy) {
            Some((_, wins, trades)) => {
                *wins += win;
                *trades += 1;
            }
            None => groups.push((strategy.to_string(), win, 1)),
        }
    }

    let mut ranking: Vec<StrategyWinRate> = groups
        .into_iter()
        .map(|(strategy, wins, trades)| StrategyWinRate {
            strategy,
            wins,
            trades,
            win_rate: WinRate::from_counts(wins, trades),
        })
        .collect();
    // sort_by is stable
    ranking.sort_by(|a, b| {
        let pa = a.win_rate.percent().unwrap_or(f64::NEG_INFINITY);
        let pb = b.win_rate.percent().unwrap_or(f64::NEG_INFINITY);
        pb.total_cmp(&pa)
    });
    ranking
}

/// Overall and per-strategy win rates. `None` when the log has no `Result`
/// column; the caller reports that.
pub fn summarize(log: &TradeLog) -> Option<PerformanceSummary> {
    if !log.has_column(RESULT) {
        return None;
    }
    let records = log.records();
    let wins = records.iter().filter(|r| is_win(r.result.as_deref())).count();
    Some(PerformanceSummary {
        wins,
        trades: records.len(),
        overall: overall_win_rate(records),
        by_strategy: win_rate_by_strategy(records),
    })
}
