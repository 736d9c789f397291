//! One render cycle: ingest, classify, aggregate, then gather bars and news
//! into a [`DashboardSnapshot`] for the presentation layer.

use anyhow::{Context, Result};
use rand::Rng;
use serde::Serialize;

use crate::advisory::Advisory;
use crate::aggregate::{summarize, PerformanceSummary};
use crate::config::{DashboardConfig, NewsSource};
use crate::feed::{CsvFeed, LiveBar, LiveFeed, SyntheticFeed};
use crate::ingest::{load_trade_log, prepare, LoadedLog};
use crate::logging::{
    self, log, log_advisory, log_cycle_summary, obj, v_str, Domain, Level, ProfileScope,
};
use crate::news::{format_news_alert, NewsItem, NewsProvider, NoNews, StaticNews};
use crate::trade_log::{format_confidence, Prediction, TradeLog, RESULT};

/// Horizon shown on every prediction card.
pub const FORECAST_HORIZON: &str = "Next 5-10 min";

#[derive(Debug, Clone, Serialize)]
pub struct TablePreview {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
    pub total_rows: usize,
}

impl TablePreview {
    pub fn of(log: &TradeLog, n: usize) -> Self {
        Self {
            columns: log.header().to_vec(),
            rows: log.head(n).to_rows(),
            total_rows: log.len(),
        }
    }
}

/// Card for one row's prediction.
#[derive(Debug, Clone, Serialize)]
pub struct PredictionCard {
    pub prediction: String,
    pub confidence: String,
    pub strategy: Option<String>,
    pub bullish: bool,
    pub horizon: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChartData {
    pub bars: Vec<LiveBar>,
    pub typical_prices: Vec<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardSnapshot {
    pub cycle: u64,
    pub run_id: String,
    pub generated_at: String,
    pub source: String,
    pub log_sha256: String,
    pub news_banner: String,
    pub news: Vec<NewsItem>,
    /// `None` when the feed failed or lacks a chart column.
    pub chart: Option<ChartData>,
    pub preview: TablePreview,
    pub predictions: Vec<PredictionCard>,
    /// `None` when the log has no `Result` column.
    pub performance: Option<PerformanceSummary>,
    pub advisories: Vec<Advisory>,
}

/// Collaborators for a cycle. Built once from config and reused.
pub struct RenderCycle {
    config: DashboardConfig,
    feed: Box<dyn LiveFeed>,
    news: Box<dyn NewsProvider>,
}

impl RenderCycle {
    pub fn new(
        config: DashboardConfig,
        feed: Box<dyn LiveFeed>,
        news: Box<dyn NewsProvider>,
    ) -> Self {
        Self { config, feed, news }
    }

    /// Picks collaborators from config: `feed_csv` selects a file feed, the
    /// synthetic feed otherwise.
    pub fn from_config(config: DashboardConfig) -> Self {
        let feed: Box<dyn LiveFeed> = match &config.feed_csv {
            Some(path) => Box::new(CsvFeed {
                path: path.clone(),
                delimiter: config.delimiter,
            }),
            None => Box::new(SyntheticFeed::default()),
        };
        let news: Box<dyn NewsProvider> = match config.news_source {
            NewsSource::Static => Box::new(StaticNews),
            NewsSource::None => Box::new(NoNews),
        };
        Self::new(config, feed, news)
    }

    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }

    /// Loads the trade log from the configured paths and builds a snapshot.
    /// Fails only when no log can be loaded.
    pub fn run<R: Rng + ?Sized>(&self, cycle: u64, rng: &mut R) -> Result<DashboardSnapshot> {
        let loaded = load_trade_log(
            self.config.trade_log_path.as_deref(),
            &self.config.default_log_path,
            self.config.delimiter,
        )
        .context("loading trade log")?;
        Ok(self.assemble(cycle, loaded, rng))
    }

    /// Builds a snapshot from an already loaded log.
    pub fn assemble<R: Rng + ?Sized>(
        &self,
        cycle: u64,
        loaded: LoadedLog,
        rng: &mut R,
    ) -> DashboardSnapshot {
        let _scope =
            ProfileScope::with_context("render_cycle", &[("cycle", serde_json::json!(cycle))]);
        let LoadedLog {
            mut log,
            source,
            sha256,
            mut advisories,
        } = loaded;

        advisories.extend(prepare(&mut log, rng));
        let view = log.filter_strategies(&self.config.strategy_filter);

        let performance = summarize(&view);
        if performance.is_none() {
            let adv = Advisory::AggregationSkipped {
                missing: RESULT.to_string(),
            };
            log_advisory(&adv);
            advisories.push(adv);
        }

        let chart = self.fetch_chart();
        let news = self.news.fetch_news();

        log_cycle_summary(
            cycle,
            view.len(),
            performance.as_ref().and_then(|p| p.overall.percent()),
            performance.as_ref().map_or(0, |p| p.by_strategy.len()),
            chart.as_ref().map_or(0, |c| c.bars.len()),
            news.len(),
        );

        DashboardSnapshot {
            cycle,
            run_id: logging::run_id().to_string(),
            generated_at: logging::ts_now(),
            source: source.describe(),
            log_sha256: sha256,
            news_banner: format_news_alert(&news),
            news,
            chart,
            preview: TablePreview::of(&view, self.config.preview_rows),
            predictions: prediction_cards(&view),
            performance,
            advisories,
        }
    }

    fn fetch_chart(&self) -> Option<ChartData> {
        let table = match self.feed.fetch_bars() {
            Ok(t) => t,
            Err(err) => {
                log(
                    Level::Warn,
                    Domain::Feed,
                    "feed_failed",
                    obj(&[("msg", v_str(&format!("{:#}", err)))]),
                );
                return None;
            }
        };
        if !table.chart_ready() {
            return None;
        }
        let typical_prices = table.bars.iter().map(LiveBar::typical_price).collect();
        Some(ChartData {
            bars: table.bars,
            typical_prices,
        })
    }
}

pub fn prediction_cards(log: &TradeLog) -> Vec<PredictionCard> {
    log.records()
        .iter()
        .map(|r| PredictionCard {
            prediction: r.prediction.as_ref().map(|p| p.to_string()).unwrap_or_default(),
            confidence: r.confidence.map(format_confidence).unwrap_or_default(),
            strategy: r.strategy.clone(),
            bullish: r.prediction == Some(Prediction::Up),
            horizon: FORECAST_HORIZON,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::WinRate;
    use crate::feed::BarTable;
    use crate::ingest::parse_loaded;
    use chrono::{TimeZone, Utc};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    struct BrokenFeed;

    impl LiveFeed for BrokenFeed {
        fn fetch_bars(&self) -> Result<BarTable> {
            anyhow::bail!("socket closed")
        }
    }

    fn cycle_with(config: DashboardConfig) -> RenderCycle {
        let start = Utc.with_ymd_and_hms(2024, 6, 12, 14, 0, 0).unwrap();
        RenderCycle::new(config, Box::new(SyntheticFeed::starting_at(start)), Box::new(StaticNews))
    }

    const LOG: &str = "Date,Prediction,Confidence,Result\n\
                       d1,Up,90,Win\n\
                       d2,Down,80,Loss\n\
                       d3,Down,60,win\n\
                       d4,Up,50,Loss\n";

    #[test]
    fn full_cycle_from_inline_log() {
        let cycle = cycle_with(DashboardConfig::default());
        let loaded = parse_loaded(LOG, ',').unwrap();
        let snap = cycle.assemble(1, loaded, &mut StdRng::seed_from_u64(1));

        assert_eq!(snap.preview.total_rows, 4);
        let strategy_col = snap.preview.columns.iter().position(|c| c == "Strategy").unwrap();
        let labels: Vec<_> = snap.preview.rows.iter().map(|r| r[strategy_col].clone()).collect();
        assert_eq!(labels, vec!["Breakout", "Reversal", "Observation", "Observation"]);

        let perf = snap.performance.unwrap();
        assert_eq!(perf.overall, WinRate::Percent(50.0));
        assert_eq!(perf.by_strategy[0].strategy, "Breakout");

        assert_eq!(snap.chart.as_ref().unwrap().bars.len(), 15);
        assert!(snap.news_banner.contains("FOMC"));
        assert_eq!(snap.predictions.len(), 4);
        assert!(snap.predictions[0].bullish);
        assert_eq!(snap.predictions[1].confidence, "80");
        assert_eq!(snap.advisories, vec![Advisory::StrategiesDetected { rows: 4 }]);
    }

    #[test]
    fn strategy_filter_narrows_population() {
        let mut config = DashboardConfig::default();
        config.strategy_filter.insert("Observation".to_string());
        let cycle = cycle_with(config);
        let loaded = parse_loaded(LOG, ',').unwrap();
        let snap = cycle.assemble(1, loaded, &mut StdRng::seed_from_u64(1));
        let perf = snap.performance.unwrap();
        assert_eq!(perf.trades, 2);
        assert_eq!(perf.overall, WinRate::Percent(50.0));
        assert_eq!(perf.by_strategy.len(), 1);
    }

    #[test]
    fn missing_result_reports_skip() {
        let cycle = cycle_with(DashboardConfig::default());
        let loaded = parse_loaded("Prediction,Confidence\nUp,99\n", ',').unwrap();
        let snap = cycle.assemble(1, loaded, &mut StdRng::seed_from_u64(1));
        assert!(snap.performance.is_none());
        assert!(snap
            .advisories
            .contains(&Advisory::AggregationSkipped { missing: "Result".to_string() }));
    }

    #[test]
    fn feed_failure_only_drops_chart() {
        let cycle =
            RenderCycle::new(DashboardConfig::default(), Box::new(BrokenFeed), Box::new(NoNews));
        let loaded = parse_loaded(LOG, ',').unwrap();
        let snap = cycle.assemble(2, loaded, &mut StdRng::seed_from_u64(1));
        assert!(snap.chart.is_none());
        assert_eq!(snap.news_banner, crate::news::NO_NEWS_BANNER);
        assert!(snap.performance.is_some());
    }

    #[test]
    fn preview_is_capped() {
        let mut config = DashboardConfig::default();
        config.preview_rows = 2;
        let loaded = parse_loaded(LOG, ',').unwrap();
        let snap = cycle_with(config).assemble(1, loaded, &mut StdRng::seed_from_u64(1));
        assert_eq!(snap.preview.rows.len(), 2);
        assert_eq!(snap.preview.total_rows, 4);
    }
}
