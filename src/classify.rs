//! Fixed-threshold strategy labelling.
//!
//! | Prediction | Confidence | Label       |
//! |------------|------------|-------------|
//! | Up         | > 85       | Breakout    |
//! | Down       | > 75       | Reversal    |
//! | otherwise  | otherwise  | Observation |

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::advisory::Advisory;
use crate::trade_log::{Prediction, TradeLog, STRATEGY};

pub const BREAKOUT_MIN_CONFIDENCE: f64 = 85.0;
pub const REVERSAL_MIN_CONFIDENCE: f64 = 75.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StrategyLabel {
    Breakout,
    Reversal,
    Observation,
}

impl StrategyLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyLabel::Breakout => "Breakout",
            StrategyLabel::Reversal => "Reversal",
            StrategyLabel::Observation => "Observation",
        }
    }
}

impl fmt::Display for StrategyLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// First match wins. Missing inputs, NaN confidence and unknown predictions
/// fall through to `Observation`.
pub fn classify(prediction: Option<&Prediction>, confidence: Option<f64>) -> StrategyLabel {
    let confidence = confidence.unwrap_or(f64::NAN);
    match prediction {
        Some(Prediction::Up) if confidence > BREAKOUT_MIN_CONFIDENCE => StrategyLabel::Breakout,
        Some(Prediction::Down) if confidence > REVERSAL_MIN_CONFIDENCE => StrategyLabel::Reversal,
        _ => StrategyLabel::Observation,
    }
}

/// Detection runs only when no row carries a strategy.
pub fn needs_detection(log: &TradeLog) -> bool {
    log.column_is_vacant(STRATEGY)
}

/// Labels every row when the `Strategy` column is absent or entirely null.
/// Existing labels are never touched.
pub fn apply_strategy_detection(log: &mut TradeLog) -> Option<Advisory> {
    if !needs_detection(log) {
        return None;
    }
    log.ensure_column(STRATEGY);
    for r in log.records_mut() {
        let label = classify(r.prediction.as_ref(), r.confidence);
        r.strategy = Some(label.as_str().to_string());
    }
    Some(Advisory::StrategiesDetected { rows: log.len() })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trade_log::{TradeRecord, CONFIDENCE, PREDICTION};

    fn unlabeled(rows: Vec<TradeRecord>) -> TradeLog {
        TradeLog::new(vec![PREDICTION.to_string(), CONFIDENCE.to_string()], rows)
    }

    #[test]
    fn decision_table_examples() {
        assert_eq!(classify(Some(&Prediction::Up), Some(90.0)), StrategyLabel::Breakout);
        assert_eq!(classify(Some(&Prediction::Down), Some(80.0)), StrategyLabel::Reversal);
        assert_eq!(classify(Some(&Prediction::Down), Some(60.0)), StrategyLabel::Observation);
        assert_eq!(classify(Some(&Prediction::Up), Some(50.0)), StrategyLabel::Observation);
    }

    #[test]
    fn thresholds_are_strict_and_asymmetric() {
        assert_eq!(classify(Some(&Prediction::Up), Some(85.0)), StrategyLabel::Observation);
        assert_eq!(classify(Some(&Prediction::Up), Some(85.1)), StrategyLabel::Breakout);
        assert_eq!(classify(Some(&Prediction::Down), Some(75.0)), StrategyLabel::Observation);
        assert_eq!(classify(Some(&Prediction::Down), Some(76.0)), StrategyLabel::Reversal);
        assert_eq!(classify(Some(&Prediction::Up), Some(80.0)), StrategyLabel::Observation);
    }

    #[test]
    fn total_over_odd_inputs() {
        let other = Prediction::Other("Flat".into());
        assert_eq!(classify(Some(&other), Some(99.0)), StrategyLabel::Observation);
        assert_eq!(classify(None, Some(99.0)), StrategyLabel::Observation);
        assert_eq!(classify(Some(&Prediction::Up), None), StrategyLabel::Observation);
        assert_eq!(classify(Some(&Prediction::Down), Some(f64::NAN)), StrategyLabel::Observation);
    }

    #[test]
    fn labels_every_row_when_column_absent() {
        let mut log = unlabeled(vec![
            TradeRecord::new(Prediction::Up, 90.0),
            TradeRecord::new(Prediction::Down, 80.0),
            TradeRecord::new(Prediction::Down, 60.0),
            TradeRecord::new(Prediction::Up, 50.0),
        ]);
        let adv = apply_strategy_detection(&mut log);
        assert_eq!(adv, Some(Advisory::StrategiesDetected { rows: 4 }));
        let labels: Vec<_> = log
            .records()
            .iter()
            .map(|r| r.strategy.clone().unwrap())
            .collect();
        assert_eq!(labels, vec!["Breakout", "Reversal", "Observation", "Observation"]);
        assert!(log.has_column(STRATEGY));
    }

    #[test]
    fn all_null_column_is_relabelled() {
        let mut log = TradeLog::new(
            vec![STRATEGY.to_string(), PREDICTION.to_string(), CONFIDENCE.to_string()],
            vec![TradeRecord::new(Prediction::Up, 95.0)],
        );
        assert!(apply_strategy_detection(&mut log).is_some());
        assert_eq!(log.records()[0].strategy.as_deref(), Some("Breakout"));
        assert_eq!(log.header().iter().filter(|h| *h == STRATEGY).count(), 1);
    }

    #[test]
    fn existing_labels_are_kept() {
        let mut log = TradeLog::new(
            vec![STRATEGY.to_string(), PREDICTION.to_string(), CONFIDENCE.to_string()],
            vec![
                TradeRecord::new(Prediction::Up, 95.0).with_strategy("Scalp"),
                TradeRecord::new(Prediction::Down, 90.0),
            ],
        );
        let before = log.clone();
        assert_eq!(apply_strategy_detection(&mut log), None);
        assert_eq!(log, before);
    }

    #[test]
    fn rerun_is_idempotent() {
        let mut log = unlabeled(vec![
            TradeRecord::new(Prediction::Up, 90.0),
            TradeRecord::new(Prediction::Down, 60.0),
        ]);
        apply_strategy_detection(&mut log);
        let once = log.clone();
        assert_eq!(apply_strategy_detection(&mut log), None);
        assert_eq!(log, once);
    }
}
