// ============================================================
// Layer 3 — Training History
// ============================================================
// Per-epoch scalars produced by the fit loop. Frozen once the
// loop returns and handed to reporting as-is.

use serde::{Deserialize, Serialize};

use crate::domain::params::{HistoryKeys, ScoreMetric};

/// One row of metrics for a single epoch.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EpochMetrics {
    /// Starts at 1
    pub epoch:      usize,
    pub loss:       f64,
    pub metric:     f64,
    pub val_loss:   f64,
    pub val_metric: f64,
}

impl EpochMetrics {
    pub fn new(epoch: usize, loss: f64, metric: f64, val_loss: f64, val_metric: f64) -> Self {
        Self { epoch, loss, metric, val_loss, val_metric }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingHistory {
    metric: ScoreMetricName,
    epochs: Vec<EpochMetrics>,
}

/// Serialisable stand-in for ScoreMetric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
enum ScoreMetricName {
    Mae,
    Mse,
}

impl From<ScoreMetric> for ScoreMetricName {
    fn from(m: ScoreMetric) -> Self {
        match m {
            ScoreMetric::MeanAbsoluteError => Self::Mae,
            ScoreMetric::MeanSquaredError  => Self::Mse,
        }
    }
}

impl From<ScoreMetricName> for ScoreMetric {
    fn from(m: ScoreMetricName) -> Self {
        match m {
            ScoreMetricName::Mae => ScoreMetric::MeanAbsoluteError,
            ScoreMetricName::Mse => ScoreMetric::MeanSquaredError,
        }
    }
}

impl TrainingHistory {
    pub fn new(metric: ScoreMetric) -> Self {
        Self { metric: metric.into(), epochs: Vec::new() }
    }

    pub fn push(&mut self, m: EpochMetrics) {
        self.epochs.push(m);
    }

    pub fn metric(&self) -> ScoreMetric {
        self.metric.into()
    }

    pub fn epochs(&self) -> &[EpochMetrics] {
        &self.epochs
    }

    pub fn len(&self) -> usize {
        self.epochs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.epochs.is_empty()
    }

    /// Look a series up by its key name: "loss", "val_loss", or the
    /// train/validation keys of the tracked metric.
    pub fn series(&self, key: &str) -> Option<Vec<f64>> {
        let keys: HistoryKeys = self.metric().history_keys();
        let pick: fn(&EpochMetrics) -> f64 = match key {
            "loss"                      => |m| m.loss,
            "val_loss"                  => |m| m.val_loss,
            k if k == keys.train        => |m| m.metric,
            k if k == keys.validation   => |m| m.val_metric,
            _ => return None,
        };
        Some(self.epochs.iter().map(pick).collect())
    }

    /// Training-split values of the tracked metric.
    pub fn train_scores(&self) -> Vec<f64> {
        self.epochs.iter().map(|m| m.metric).collect()
    }

    /// Held-out values of the tracked metric.
    pub fn validation_scores(&self) -> Vec<f64> {
        self.epochs.iter().map(|m| m.val_metric).collect()
    }

    /// The epoch with the lowest validation loss (first one on ties).
    pub fn best_epoch(&self) -> Option<&EpochMetrics> {
        self.epochs.iter().fold(None, |best: Option<&EpochMetrics>, m| match best {
            Some(b) if b.val_loss <= m.val_loss => Some(b),
            _ => Some(m),
        })
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> TrainingHistory {
        let mut h = TrainingHistory::new(ScoreMetric::MeanAbsoluteError);
        h.push(EpochMetrics::new(1, 0.30, 0.20, 0.25, 0.19));
        h.push(EpochMetrics::new(2, 0.20, 0.15, 0.22, 0.16));
        h.push(EpochMetrics::new(3, 0.18, 0.14, 0.23, 0.17));
        h
    }

    #[test]
    fn test_series_by_metric_key() {
        let h = sample();
        assert_eq!(h.series("mean_absolute_error").unwrap(), vec![0.20, 0.15, 0.14]);
        assert_eq!(h.series("val_mean_absolute_error").unwrap(), vec![0.19, 0.16, 0.17]);
        assert_eq!(h.series("val_loss").unwrap(), vec![0.25, 0.22, 0.23]);
        // mse keys are not recorded for an mae run
        assert!(h.series("mean_squared_error").is_none());
    }

    #[test]
    fn test_best_epoch_is_lowest_val_loss() {
        assert_eq!(sample().best_epoch().unwrap().epoch, 2);
        assert!(TrainingHistory::new(ScoreMetric::MeanSquaredError).best_epoch().is_none());
    }

    #[test]
    fn test_json_round_trip_keeps_metric() {
        let h    = sample();
        let json = serde_json::to_string(&h).unwrap();
        assert!(json.contains("\"mae\""));
        let back: TrainingHistory = serde_json::from_str(&json).unwrap();
        assert_eq!(back, h);
    }
}
