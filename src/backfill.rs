use rand::Rng;
use std::ops::RangeInclusive;

use crate::advisory::Advisory;
use crate::trade_log::{Prediction, TradeLog, CONFIDENCE, PREDICTION};

/// Range for synthesized confidence values, inclusive.
pub const SYNTHETIC_CONFIDENCE: RangeInclusive<i64> = 70..=95;

/// Synthesizes `Confidence` and `Prediction` for every row when the column is
/// absent or entirely null. A partially filled column is left alone.
///
/// Values are independent per row. Pass `rand::thread_rng()` in production
/// and a seeded generator in tests.
pub fn backfill_columns<R: Rng + ?Sized>(log: &mut TradeLog, rng: &mut R) -> Vec<Advisory> {
    let mut advisories = Vec::new();

    if log.column_is_vacant(CONFIDENCE) {
        log.ensure_column(CONFIDENCE);
        for r in log.records_mut() {
            r.confidence = Some(rng.gen_range(SYNTHETIC_CONFIDENCE) as f64);
        }
        advisories.push(Advisory::MissingColumn {
            column: CONFIDENCE.to_string(),
            action: "Generating demo confidence.".to_string(),
        });
    }

    if log.column_is_vacant(PREDICTION) {
        log.ensure_column(PREDICTION);
        for r in log.records_mut() {
            r.prediction = Some(if rng.gen_bool(0.5) {
                Prediction::Up
            } else {
                Prediction::Down
            });
        }
        advisories.push(Advisory::MissingColumn {
            column: PREDICTION.to_string(),
            action: "Generating demo predictions.".to_string(),
        });
    }

    advisories
}
