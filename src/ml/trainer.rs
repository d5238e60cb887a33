// ============================================================
// Layer 5 — Training Loop
// ============================================================
// Fit loop, per-epoch runner and final evaluation.
//
//   fit_loop        — backend-free: asks an EpochRunner for one
//                     epoch at a time and applies the monitors
//                     (BestCheckpoint, EarlyStopping, run log)
//   BurnEpochRunner — the real EpochRunner: shuffled mini-batches
//                     on Autodiff<B>, validation on B::InnerBackend
//   run_training    — builds the model, binds the optimizer, fits,
//                     restores the best checkpoint and evaluates it
//
// Key Burn insight:
//   - Training uses an AutodiffBackend for gradients
//   - model.valid() returns the model on the inner backend, with
//     batch norm switched to its running statistics
//   - The validation batcher must also use the inner backend
//
// Learning-rate decay is time based, per optimizer step t:
//   lr_t = lr / (1 + decay · t)

use anyhow::Result;
use burn::{
    data::dataloader::{DataLoader, DataLoaderBuilder},
    module::AutodiffModule,
    optim::{momentum::MomentumConfig, AdamConfig, GradientsParams, Optimizer, SgdConfig},
    prelude::*,
    tensor::backend::AutodiffBackend,
};
use std::sync::Arc;

use crate::data::{
    batcher::{ImageBatch, ImageBatcher},
    dataset::ImageDataset,
};
use crate::domain::architecture::Architecture;
use crate::domain::history::{EpochMetrics, TrainingHistory};
use crate::domain::params::{LossKind, OptimizerKind, RunPlan, ScoreMetric};
use crate::domain::traits::EpochRunner;
use crate::infra::{checkpoint::CheckpointManager, metrics::MetricsLogger};
use crate::ml::callbacks::{BestCheckpoint, EarlyStopping, Signal};
use crate::ml::loss::score;
use crate::ml::model::Autoencoder;

const ADAM_EPSILON: f32 = 1e-8;
const SGD_MOMENTUM: f64 = 0.9;

// ─── Learning-rate schedule ───────────────────────────────────────────────────
#[derive(Debug, Clone)]
pub struct DecaySchedule {
    base:  f64,
    decay: f64,
    step:  usize,
}

impl DecaySchedule {
    pub fn new(base: f64, decay: f64) -> Self {
        Self { base, decay, step: 0 }
    }

    /// Rate for the next optimizer step.
    pub fn next_lr(&mut self) -> f64 {
        let lr = self.base / (1.0 + self.decay * self.step as f64);
        self.step += 1;
        lr
    }

    pub fn steps(&self) -> usize {
        self.step
    }
}

// ─── Evaluation ───────────────────────────────────────────────────────────────
/// `[loss, metric]` over a whole split.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Evaluation {
    pub loss:   f64,
    pub metric: f64,
}

/// Sample-weighted running mean, so a short last batch counts
/// for exactly its share of the split.
#[derive(Debug, Default)]
struct WeightedMean {
    sum:   f64,
    count: usize,
}

impl WeightedMean {
    fn add(&mut self, value: f64, n: usize) {
        self.sum   += value * n as f64;
        self.count += n;
    }

    fn value(&self) -> f64 {
        if self.count > 0 { self.sum / self.count as f64 } else { f64::NAN }
    }
}

/// Score `model` on every batch of `loader`.
pub fn evaluate<B: Backend>(
    model:  &Autoencoder<B>,
    loader: &dyn DataLoader<ImageBatch<B>>,
    loss:   LossKind,
    metric: ScoreMetric,
) -> Evaluation {
    let mut loss_mean   = WeightedMean::default();
    let mut metric_mean = WeightedMean::default();

    for batch in loader.iter() {
        let n = batch.len();
        let (batch_loss, output) = model.forward_loss(batch.images.clone(), loss);
        loss_mean.add(batch_loss.into_scalar().elem::<f64>(), n);
        metric_mean.add(score(metric, output, batch.images).into_scalar().elem::<f64>(), n);
    }

    Evaluation { loss: loss_mean.value(), metric: metric_mean.value() }
}

// ─── Fit loop ─────────────────────────────────────────────────────────────────
#[derive(Debug, Clone)]
pub struct FitOutcome {
    pub history:       TrainingHistory,
    /// Epoch whose weights are in the checkpoint
    pub best_epoch:    Option<usize>,
    /// Set when early stopping ended the run
    pub stopped_epoch: Option<usize>,
}

/// Run up to `n_epochs` epochs. After each one the checkpoint is
/// replaced on a strict val_loss improvement, the row is logged,
/// and early stopping decides whether to go on.
pub fn fit_loop<R: EpochRunner>(
    runner:    &mut R,
    n_epochs:  usize,
    mut early: EarlyStopping,
    metric:    ScoreMetric,
    logger:    Option<&MetricsLogger>,
) -> Result<FitOutcome> {
    let keys        = metric.history_keys();
    let mut history = TrainingHistory::new(metric);
    let mut best    = BestCheckpoint::new();
    let mut stopped = None;

    for epoch in 1..=n_epochs {
        let m = runner.run_epoch(epoch)?;

        if best.observe(epoch, m.val_loss) {
            runner.save_checkpoint(epoch)?;
            tracing::info!("Epoch {epoch}: val_loss improved to {:.5}, checkpoint saved", m.val_loss);
        }

        if let Some(logger) = logger {
            logger.log(&m)?;
        }

        println!(
            "Epoch {:>3}/{} | loss={:.4} | {}={:.4} | val_loss={:.4} | {}={:.4}",
            epoch, n_epochs, m.loss, keys.train, m.metric, m.val_loss, keys.validation, m.val_metric,
        );
        history.push(m);

        if early.observe(m.val_loss) == Signal::Stop {
            tracing::info!("Epoch {epoch}: early stopping (no val_loss improvement for {} epochs)", early.wait());
            stopped = Some(epoch);
            break;
        }
    }

    Ok(FitOutcome { history, best_epoch: best.best_epoch(), stopped_epoch: stopped })
}

// ─── BurnEpochRunner ──────────────────────────────────────────────────────────
pub struct BurnEpochRunner<'a, B: AutodiffBackend, O> {
    model:        Autoencoder<B>,
    optim:        O,
    schedule:     DecaySchedule,
    train_loader: Arc<dyn DataLoader<ImageBatch<B>>>,
    valid_loader: Arc<dyn DataLoader<ImageBatch<B::InnerBackend>>>,
    loss:         LossKind,
    metric:       ScoreMetric,
    ckpt:         &'a CheckpointManager,
}

impl<'a, B, O> BurnEpochRunner<'a, B, O>
where
    B: AutodiffBackend,
    O: Optimizer<Autoencoder<B>, B>,
{
    pub fn into_model(self) -> Autoencoder<B> {
        self.model
    }
}

impl<'a, B, O> EpochRunner for BurnEpochRunner<'a, B, O>
where
    B: AutodiffBackend,
    O: Optimizer<Autoencoder<B>, B>,
{
    fn run_epoch(&mut self, epoch: usize) -> Result<EpochMetrics> {
        let mut loss_mean   = WeightedMean::default();
        let mut metric_mean = WeightedMean::default();

        for batch in self.train_loader.iter() {
            let n = batch.len();
            let (loss, output) = self.model.forward_loss(batch.images.clone(), self.loss);

            loss_mean.add(loss.clone().into_scalar().elem::<f64>(), n);
            let batch_score = score(self.metric, output.detach(), batch.images);
            metric_mean.add(batch_score.into_scalar().elem::<f64>(), n);

            let lr    = self.schedule.next_lr();
            let grads = GradientsParams::from_grads(loss.backward(), &self.model);
            self.model = self.optim.step(lr, self.model.clone(), grads);
        }

        let val = evaluate(&self.model.valid(), &*self.valid_loader, self.loss, self.metric);

        Ok(EpochMetrics {
            epoch,
            loss:       loss_mean.value(),
            metric:     metric_mean.value(),
            val_loss:   val.loss,
            val_metric: val.metric,
        })
    }

    fn save_checkpoint(&mut self, epoch: usize) -> Result<()> {
        self.ckpt.save_model(&self.model, epoch)
    }
}

// ─── run_training ─────────────────────────────────────────────────────────────
pub struct TrainingOutcome<B: Backend> {
    pub fit:        FitOutcome,
    /// Held-out `[loss, metric]` of the restored best model
    pub test_score: Evaluation,
    /// The restored best model, ready for inference
    pub model:      Autoencoder<B>,
}

fn adam_config() -> AdamConfig {
    AdamConfig::new().with_epsilon(ADAM_EPSILON)
}

/// Nesterov momentum without dampening.
fn sgd_config() -> SgdConfig {
    let momentum = MomentumConfig::new()
        .with_momentum(SGD_MOMENTUM)
        .with_dampening(0.0)
        .with_nesterov(true);
    SgdConfig::new().with_momentum(Some(momentum))
}

pub fn run_training<B: AutodiffBackend>(
    plan:   &RunPlan,
    arch:   &Architecture,
    train:  ImageDataset,
    test:   ImageDataset,
    ckpt:   &CheckpointManager,
    logger: Option<&MetricsLogger>,
    device: &B::Device,
) -> Result<TrainingOutcome<B::InnerBackend>> {
    let p = &plan.params;

    if let Some(seed) = p.seed {
        B::seed(seed);
    }
    let shuffle_seed = p.seed.unwrap_or_else(rand::random);

    // ── Build model ───────────────────────────────────────────────────────────
    let model = Autoencoder::<B>::from_architecture(arch, device);
    tracing::info!(
        "Model ready: depth={}, encoded {}x{}x{}, crop {:?}, {} parameters",
        arch.encoder.len(),
        arch.encoded_size,
        arch.encoded_size,
        arch.encoded_channels,
        arch.crop,
        model.num_params(),
    );

    // ── Data loaders ──────────────────────────────────────────────────────────
    let train_loader = DataLoaderBuilder::new(ImageBatcher::<B>::new(device.clone()))
        .batch_size(p.batch_size)
        .shuffle(shuffle_seed)
        .build(train);

    let valid_loader = DataLoaderBuilder::new(ImageBatcher::<B::InnerBackend>::new(device.clone()))
        .batch_size(p.batch_size)
        .build(test);

    // ── Optimizer dispatch ────────────────────────────────────────────────────
    let schedule = DecaySchedule::new(p.learning_rate, p.lr_decay);
    let early    = EarlyStopping::new(p.patience, p.min_delta);
    let valid    = valid_loader.clone();

    let (fit, model) = match plan.optimizer {
        OptimizerKind::Adam => {
            // m = β1*m + (1-β1)*g        (mean)
            // v = β2*v + (1-β2)*g²       (variance)
            // θ = θ - lr * m / (√v + ε)  (update)
            let optim = adam_config().init::<B, Autoencoder<B>>();
            let runner = BurnEpochRunner {
                model, optim, schedule, train_loader, valid_loader: valid,
                loss: plan.loss, metric: plan.metric, ckpt,
            };
            fit_runner(runner, p.n_epochs, early, plan.metric, logger)?
        }
        OptimizerKind::Sgd => {
            let optim = sgd_config().init::<B, Autoencoder<B>>();
            let runner = BurnEpochRunner {
                model, optim, schedule, train_loader, valid_loader: valid,
                loss: plan.loss, metric: plan.metric, ckpt,
            };
            fit_runner(runner, p.n_epochs, early, plan.metric, logger)?
        }
    };

    // ── Restore the best epoch and evaluate it ────────────────────────────────
    let model = match fit.best_epoch {
        Some(epoch) => {
            tracing::info!("Restoring best checkpoint from epoch {epoch}");
            ckpt.load_model(model.valid(), device)?
        }
        None => {
            tracing::warn!("No epoch produced a finite val_loss; evaluating the last weights");
            model.valid()
        }
    };

    let test_score = evaluate(&model, &*valid_loader, plan.loss, plan.metric);
    tracing::info!(
        "Final test score: loss={:.6}, {}={:.6}",
        test_score.loss,
        plan.metric,
        test_score.metric,
    );

    Ok(TrainingOutcome { fit, test_score, model })
}

fn fit_runner<B, O>(
    mut runner: BurnEpochRunner<'_, B, O>,
    n_epochs:   usize,
    early:      EarlyStopping,
    metric:     ScoreMetric,
    logger:     Option<&MetricsLogger>,
) -> Result<(FitOutcome, Autoencoder<B>)>
where
    B: AutodiffBackend,
    O: Optimizer<Autoencoder<B>, B>,
{
    let fit = fit_loop(&mut runner, n_epochs, early, metric, logger)?;
    tracing::info!(
        "Training finished after {} epochs ({} optimizer steps)",
        fit.history.len(),
        runner.schedule.steps(),
    );
    Ok((fit, runner.into_model()))
}
