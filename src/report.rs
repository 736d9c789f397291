//! Plain-text presentation of a [`DashboardSnapshot`].

use std::fmt::Write;

use crate::aggregate::WinRate;
use crate::render::DashboardSnapshot;

#[derive(Debug, Clone)]
pub struct ReportOptions {
    /// Width of the win-rate bars at 100%.
    pub bar_width: usize,
    pub max_cards: usize,
    pub show_chart: bool,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            bar_width: 30,
            max_cards: 10,
            show_chart: true,
        }
    }
}

pub fn render_text(snap: &DashboardSnapshot, opts: &ReportOptions) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "== Trading Dashboard · cycle {} · {}", snap.cycle, snap.generated_at);
    let _ = writeln!(out, "{}", snap.source);
    let _ = writeln!(out, "!! {}", snap.news_banner);
    for adv in &snap.advisories {
        let _ = writeln!(out, "-- {}", adv);
    }

    if opts.show_chart {
        let _ = writeln!(out, "\n[Live]");
        match &snap.chart {
            Some(chart) if !chart.bars.is_empty() => {
                let first = &chart.bars[0];
                let last = &chart.bars[chart.bars.len() - 1];
                let high = chart.bars.iter().map(|b| b.high).fold(f64::MIN, f64::max);
                let low = chart.bars.iter().map(|b| b.low).fold(f64::MAX, f64::min);
                let volume: f64 = chart.bars.iter().map(|b| b.volume).sum();
                let _ = writeln!(
                    out,
                    "{} bars {} → {}",
                    chart.bars.len(),
                    first.time.format("%H:%M"),
                    last.time.format("%H:%M")
                );
                let _ = writeln!(
                    out,
                    "open {:.2}  close {:.2}  high {:.2}  low {:.2}  volume {:.0}",
                    first.open, last.close, high, low, volume
                );
            }
            _ => {
                let _ = writeln!(out, "chart unavailable");
            }
        }
    }

    let _ = writeln!(
        out,
        "\n[Trade Log] showing {} of {}",
        snap.preview.rows.len(),
        snap.preview.total_rows
    );
    out.push_str(&format_table(&snap.preview.columns, &snap.preview.rows));

    let _ = writeln!(out, "\n[Predictions]");
    for card in snap.predictions.iter().take(opts.max_cards) {
        let arrow = if card.bullish { "▲" } else { "▼" };
        let _ = writeln!(
            out,
            "{} {:<5} {:>4}%  {:<12} {}",
            arrow,
            card.prediction,
            card.confidence,
            card.strategy.as_deref().unwrap_or("-"),
            card.horizon
        );
    }
    if snap.predictions.len() > opts.max_cards {
        let _ = writeln!(out, "  … {} more", snap.predictions.len() - opts.max_cards);
    }

    let _ = writeln!(out, "\n[Performance]");
    match &snap.performance {
        Some(perf) => {
            let _ = writeln!(out, "Win Rate: {} ({}/{})", perf.overall, perf.wins, perf.trades);
            let name_width = perf
                .by_strategy
                .iter()
                .map(|s| s.strategy.chars().count())
                .max()
                .unwrap_or(0);
            for s in &perf.by_strategy {
                let _ = writeln!(
                    out,
                    "{:<width$} {:>7} {}",
                    s.strategy,
                    s.win_rate.to_string(),
                    bar(s.win_rate, opts.bar_width),
                    width = name_width
                );
            }
        }
        None => {
            let _ = writeln!(out, "Win Rate: n/a");
        }
    }
    out
}

fn bar(rate: WinRate, width: usize) -> String {
    let filled = rate
        .percent()
        .map(|p| ((p / 100.0) * width as f64).round() as usize)
        .unwrap_or(0)
        .min(width);
    "#".repeat(filled)
}

/// Left-aligned columns separated by two spaces.
pub fn format_table(columns: &[String], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = columns.iter().map(|c| c.chars().count()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            if let Some(w) = widths.get_mut(i) {
                *w = (*w).max(cell.chars().count());
            }
        }
    }
    let mut out = String::new();
    let mut push_line = |cells: &[String]| {
        let line: Vec<String> = cells
            .iter()
            .zip(&widths)
            .map(|(c, w)| format!("{:<w$}", c, w = *w))
            .collect();
        out.push_str(line.join("  ").trim_end());
        out.push('\n');
    };
    push_line(columns);
    for row in rows {
        push_line(row);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DashboardConfig;
    use crate::feed::SyntheticFeed;
    use crate::ingest::parse_loaded;
    use crate::news::StaticNews;
    use crate::render::RenderCycle;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn table_alignment() {
        let cols = vec!["A".to_string(), "Long".to_string()];
        let rows = vec![vec!["xyz".to_string(), "1".to_string()]];
        assert_eq!(format_table(&cols, &rows), "A    Long\nxyz  1\n");
    }

    #[test]
    fn bar_scales_to_width() {
        assert_eq!(bar(WinRate::Percent(50.0), 10), "#####");
        assert_eq!(bar(WinRate::Percent(100.0), 10), "##########");
        assert_eq!(bar(WinRate::NoData, 10), "");
    }

    #[test]
    fn report_has_every_panel() {
        let cycle = RenderCycle::new(
            DashboardConfig::default(),
            Box::new(SyntheticFeed::default()),
            Box::new(StaticNews),
        );
        let loaded = parse_loaded(
            "Strategy,Result\nA,Win\nA,Win\nA,Win\nA,Loss\nB,Win\nB,Loss\nB,Loss\nB,Loss\n",
            ',',
        )
        .unwrap();
        let snap = cycle.assemble(3, loaded, &mut StdRng::seed_from_u64(5));
        let text = render_text(&snap, &ReportOptions::default());
        assert!(text.contains("Breaking News: FOMC Rate Decision"));
        assert!(text.contains("[Live]\n15 bars"));
        assert!(text.contains("Win Rate: 50.0% (4/8)"));
        let a = text.find("A   75.0%").unwrap();
        let b = text.find("B   25.0%").unwrap();
        assert!(a < b);
        assert!(text.contains("'Confidence' column missing."));
    }
}
