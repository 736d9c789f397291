use anyhow::{bail, Context, Result};
use serde_json::json;
use std::path::PathBuf;
use tokio::time::{interval, Duration, MissedTickBehavior};

use trade_dashboard::config::{
    parse_refresh, parse_strategy_filter, DashboardConfig, NewsSource, OutputFormat,
};
use trade_dashboard::logging::{log, obj, v_str, Domain, Level};
use trade_dashboard::render::RenderCycle;
use trade_dashboard::report::{render_text, ReportOptions};

const USAGE: &str = "usage: trade-dashboard [TRADE_LOG] [--json] \
[--refresh Off|1s|5s|10s|30s|<ms>] [--strategies A,B] [--feed BARS.csv] [--no-news] [--cycles N]";

struct Args {
    config: DashboardConfig,
    max_cycles: Option<u64>,
}

/// Env first (`DASH_*`), then command-line overrides.
fn parse_args() -> Result<Args> {
    let mut config = DashboardConfig::from_env();
    let mut max_cycles = std::env::var("DASH_MAX_CYCLES").ok().and_then(|v| v.parse().ok());
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--json" => config.output = OutputFormat::Json,
            "--no-news" => config.news_source = NewsSource::None,
            "--refresh" => {
                let raw = args.next().context("--refresh needs a value")?;
                config.auto_refresh_interval_ms =
                    parse_refresh(&raw).with_context(|| format!("bad refresh interval: {}", raw))?;
            }
            "--strategies" => {
                let raw = args.next().context("--strategies needs a value")?;
                config.strategy_filter = parse_strategy_filter(&raw);
            }
            "--feed" => {
                config.feed_csv = Some(PathBuf::from(args.next().context("--feed needs a path")?));
            }
            "--cycles" => {
                let raw = args.next().context("--cycles needs a value")?;
                let n = raw
                    .parse()
                    .with_context(|| format!("bad cycle count: {}", raw))?;
                max_cycles = Some(n);
            }
            "-h" | "--help" => {
                println!("{}", USAGE);
                std::process::exit(0);
            }
            flag if flag.starts_with("--") => bail!("unknown flag {}\n{}", flag, USAGE),
            path => config.trade_log_path = Some(PathBuf::from(path)),
        }
    }
    Ok(Args { config, max_cycles })
}

fn run_once(cycle: &RenderCycle, n: u64, opts: &ReportOptions) -> Result<()> {
    let snapshot = cycle.run(n, &mut rand::thread_rng())?;
    match cycle.config().output {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&snapshot)?),
        OutputFormat::Text => print!("{}", render_text(&snapshot, opts)),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let Args { config, max_cycles } = parse_args()?;
    let refresh_ms = config.auto_refresh_interval_ms;
    let cycle = RenderCycle::from_config(config);
    let opts = ReportOptions::default();

    log(
        Level::Info,
        Domain::System,
        "startup",
        obj(&[
            ("refresh_ms", json!(refresh_ms)),
            ("max_cycles", json!(max_cycles)),
            (
                "filter",
                v_str(
                    &cycle
                        .config()
                        .strategy_filter
                        .iter()
                        .cloned()
                        .collect::<Vec<_>>()
                        .join(","),
                ),
            ),
        ]),
    );

    if refresh_ms == 0 {
        return run_once(&cycle, 1, &opts);
    }

    let mut ticker = interval(Duration::from_millis(refresh_ms));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut n = 0u64;
    loop {
        ticker.tick().await;
        n += 1;
        // A failed cycle is abandoned; the next tick starts from scratch.
        if let Err(err) = run_once(&cycle, n, &opts) {
            log(
                Level::Error,
                Domain::Render,
                "cycle_failed",
                obj(&[("cycle", json!(n)), ("msg", v_str(&format!("{:#}", err)))]),
            );
        }
        if max_cycles.is_some_and(|max| n >= max) {
            break;
        }
    }
    log(Level::Info, Domain::System, "shutdown", obj(&[("cycles", json!(n))]));
    Ok(())
}
