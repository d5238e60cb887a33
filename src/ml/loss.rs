// ============================================================
// Layer 5 — Reconstruction Losses and Score Metrics
// ============================================================
// Every function reduces over the whole batch to a single value
// (shape [1]). Targets are the input images themselves, in [0, 1].

use burn::prelude::*;

use crate::domain::params::{LossKind, ScoreMetric};

/// Clamp applied to predictions before taking logs.
const EPSILON: f32 = 1e-7;

pub fn reconstruction_loss<B: Backend>(
    kind:   LossKind,
    output: Tensor<B, 4>,
    target: Tensor<B, 4>,
) -> Tensor<B, 1> {
    match kind {
        LossKind::BinaryCrossEntropy => binary_cross_entropy(output, target),
        LossKind::MeanSquaredError   => mean_squared_error(output, target),
        LossKind::MeanAbsoluteError  => mean_absolute_error(output, target),
    }
}

pub fn score<B: Backend>(
    metric: ScoreMetric,
    output: Tensor<B, 4>,
    target: Tensor<B, 4>,
) -> Tensor<B, 1> {
    match metric {
        ScoreMetric::MeanSquaredError  => mean_squared_error(output, target),
        ScoreMetric::MeanAbsoluteError => mean_absolute_error(output, target),
    }
}

pub fn mean_squared_error<B: Backend, const D: usize>(
    output: Tensor<B, D>,
    target: Tensor<B, D>,
) -> Tensor<B, 1> {
    (output - target).powf_scalar(2.0).mean()
}

pub fn mean_absolute_error<B: Backend, const D: usize>(
    output: Tensor<B, D>,
    target: Tensor<B, D>,
) -> Tensor<B, 1> {
    (output - target).abs().mean()
}

/// −mean(t·ln p + (1−t)·ln(1−p)), with p clamped to [ε, 1−ε].
pub fn binary_cross_entropy<B: Backend, const D: usize>(
    output: Tensor<B, D>,
    target: Tensor<B, D>,
) -> Tensor<B, 1> {
    let p   = output.clamp(EPSILON, 1.0 - EPSILON);
    let pos = target.clone() * p.clone().log();
    let neg = target.neg().add_scalar(1.0) * p.neg().add_scalar(1.0).log();
    (pos + neg).neg().mean()
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::TestBackend;

    fn pair(out: [f32; 4], tgt: [f32; 4]) -> (Tensor<TestBackend, 4>, Tensor<TestBackend, 4>) {
        let device = Default::default();
        (
            Tensor::<TestBackend, 1>::from_floats(out, &device).reshape([1, 1, 2, 2]),
            Tensor::<TestBackend, 1>::from_floats(tgt, &device).reshape([1, 1, 2, 2]),
        )
    }

    fn value(t: Tensor<TestBackend, 1>) -> f32 {
        t.into_scalar()
    }

    #[test]
    fn test_mse_and_mae() {
        let (o, t) = pair([0.0, 0.5, 1.0, 1.0], [0.0, 0.0, 0.0, 1.0]);
        assert!((value(score(ScoreMetric::MeanSquaredError, o.clone(), t.clone())) - 0.3125).abs() < 1e-6);
        assert!((value(score(ScoreMetric::MeanAbsoluteError, o, t)) - 0.375).abs() < 1e-6);
    }

    #[test]
    fn test_bce_of_perfect_reconstruction_is_near_zero() {
        let (o, t) = pair([0.0, 1.0, 1.0, 0.0], [0.0, 1.0, 1.0, 0.0]);
        let loss   = value(reconstruction_loss(LossKind::BinaryCrossEntropy, o, t));
        assert!(loss >= 0.0 && loss < 1e-5);
    }

    #[test]
    fn test_bce_at_half_is_ln2() {
        let (o, t) = pair([0.5; 4], [1.0, 0.0, 1.0, 0.0]);
        let loss   = value(reconstruction_loss(LossKind::BinaryCrossEntropy, o, t));
        assert!((loss - std::f32::consts::LN_2).abs() < 1e-5);
    }
}
