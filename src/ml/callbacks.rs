// ============================================================
// Layer 5 — Fit-Loop Monitors
// ============================================================
// Two monitors watch the validation loss after every epoch:
//
//   EarlyStopping  → improvement means current < best − min_delta;
//                    after `patience` epochs in a row without one,
//                    training stops.
//   BestCheckpoint → any strictly lower value than the best seen
//                    so far replaces the saved weights.
//
// Both start from +∞, so the first finite value is always an
// improvement. NaN never compares lower and counts as a miss.

/// What the fit loop should do after an epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    Continue,
    Stop,
}

// ─── EarlyStopping ────────────────────────────────────────────────────────────
#[derive(Debug, Clone)]
pub struct EarlyStopping {
    patience:  usize,
    min_delta: f64,
    best:      f64,
    wait:      usize,
}

impl EarlyStopping {
    pub fn new(patience: usize, min_delta: f64) -> Self {
        Self {
            patience,
            min_delta: min_delta.abs(),
            best:      f64::INFINITY,
            wait:      0,
        }
    }

    /// Record one epoch's validation loss.
    pub fn observe(&mut self, current: f64) -> Signal {
        if current < self.best - self.min_delta {
            self.best = current;
            self.wait = 0;
            return Signal::Continue;
        }

        self.wait += 1;
        if self.wait >= self.patience {
            Signal::Stop
        } else {
            Signal::Continue
        }
    }

    /// Consecutive epochs without improvement.
    pub fn wait(&self) -> usize {
        self.wait
    }

    pub fn best(&self) -> f64 {
        self.best
    }
}

// ─── BestCheckpoint ───────────────────────────────────────────────────────────
#[derive(Debug, Clone)]
pub struct BestCheckpoint {
    best:       f64,
    best_epoch: Option<usize>,
}

impl Default for BestCheckpoint {
    fn default() -> Self {
        Self { best: f64::INFINITY, best_epoch: None }
    }
}

impl BestCheckpoint {
    pub fn new() -> Self {
        Self::default()
    }

    /// True when this epoch's weights should replace the checkpoint.
    pub fn observe(&mut self, epoch: usize, current: f64) -> bool {
        if current < self.best {
            self.best       = current;
            self.best_epoch = Some(epoch);
            true
        } else {
            false
        }
    }

    pub fn best_epoch(&self) -> Option<usize> {
        self.best_epoch
    }

    pub fn best(&self) -> f64 {
        self.best
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_epoch_always_improves() {
        let mut stop = EarlyStopping::new(1, 0.0005);
        assert_eq!(stop.observe(0.10), Signal::Continue);
        assert_eq!(stop.best(), 0.10);
        assert_eq!(stop.wait(), 0);
    }

    #[test]
    fn test_stops_after_patience_misses() {
        let mut stop = EarlyStopping::new(3, 0.0);
        assert_eq!(stop.observe(1.0), Signal::Continue);
        assert_eq!(stop.observe(1.0), Signal::Continue);
        assert_eq!(stop.observe(1.1), Signal::Continue);
        assert_eq!(stop.observe(1.2), Signal::Stop);
    }

    #[test]
    fn test_improvement_smaller_than_min_delta_is_a_miss() {
        let mut stop = EarlyStopping::new(2, 0.01);
        stop.observe(0.500);
        // lower, but not by more than min_delta
        assert_eq!(stop.observe(0.495), Signal::Continue);
        assert_eq!(stop.wait(), 1);
        assert_eq!(stop.best(), 0.500);
        // a real improvement resets the counter
        assert_eq!(stop.observe(0.480), Signal::Continue);
        assert_eq!(stop.wait(), 0);
        assert_eq!(stop.observe(0.479), Signal::Continue);
        assert_eq!(stop.observe(0.478), Signal::Stop);
    }

    #[test]
    fn test_never_stops_while_improving() {
        let mut stop = EarlyStopping::new(1, 0.0005);
        for i in 0..50 {
            let loss = 1.0 - i as f64 * 0.01;
            assert_eq!(stop.observe(loss), Signal::Continue, "epoch {i}");
        }
    }

    #[test]
    fn test_nan_counts_as_miss() {
        let mut stop = EarlyStopping::new(1, 0.0);
        stop.observe(0.3);
        assert_eq!(stop.observe(f64::NAN), Signal::Stop);
    }

    #[test]
    fn test_checkpoint_requires_strict_improvement() {
        let mut ckpt = BestCheckpoint::new();
        assert!(ckpt.observe(1, 0.10));
        assert!(!ckpt.observe(2, 0.10));
        assert!(!ckpt.observe(3, 0.12));
        assert!(ckpt.observe(4, 0.0999));
        assert_eq!(ckpt.best_epoch(), Some(4));
    }

    #[test]
    fn test_checkpoint_ignores_min_delta() {
        // a gain too small for early stopping still replaces the weights
        let mut stop = EarlyStopping::new(5, 0.01);
        let mut ckpt = BestCheckpoint::new();
        stop.observe(0.5);
        ckpt.observe(1, 0.5);
        stop.observe(0.499);
        assert!(ckpt.observe(2, 0.499));
        assert_eq!(stop.wait(), 1);
    }
}
