use std::fs;
use std::path::Path;

use trade_dashboard::aggregate::summarize;
use trade_dashboard::config::parse_delimiter;
use trade_dashboard::ingest::{load_trade_log, prepare, write_csv};

/// Reads a trade log, backfills and labels it, and writes the result to
/// OUT (or stdout). Win rates go to stderr when a `Result` column exists.
fn main() {
    let mut args = std::env::args().skip(1);
    let Some(input) = args.next() else {
        eprintln!("usage: classify_log TRADE_LOG [OUT]");
        std::process::exit(2);
    };
    let output = args.next();
    let delimiter = std::env::var("DASH_DELIMITER")
        .ok()
        .and_then(|v| parse_delimiter(&v))
        .unwrap_or(',');

    let input = Path::new(&input);
    let mut loaded = match load_trade_log(Some(input), input, delimiter) {
        Ok(l) => l,
        Err(err) => {
            eprintln!("failed to load {}: {}", input.display(), err);
            std::process::exit(1);
        }
    };
    let advisories = prepare(&mut loaded.log, &mut rand::thread_rng());
    for adv in loaded.advisories.iter().chain(&advisories) {
        eprintln!("warning: {}", adv);
    }

    if let Some(perf) = summarize(&loaded.log) {
        eprintln!("win_rate={} trades={}", perf.overall, perf.trades);
        for s in &perf.by_strategy {
            eprintln!("  {}={} ({}/{})", s.strategy, s.win_rate, s.wins, s.trades);
        }
    }

    let text = write_csv(&loaded.log, delimiter);
    match output {
        Some(path) => {
            if let Err(err) = fs::write(&path, text) {
                eprintln!("failed to write {}: {}", path, err);
                std::process::exit(1);
            }
        }
        None => print!("{}", text),
    }
}
