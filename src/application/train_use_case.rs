// ============================================================
// Layer 2 — TrainUseCase
// ============================================================
// Orchestrates one training run, strictly in this order:
//
//   Step 1: Resolve run parameters      (flags or YAML config file)
//   Step 2: Validate + infer the shapes (Layer 3 - domain)
//   Step 3: Prepare the output dir      (Layer 6 - infra)
//   Step 4: Load MNIST                  (Layer 4 - data)
//   Step 5: Train, restore best, eval   (Layer 5 - ml)
//   Step 6: Render both figures         (Layer 7 - report)
//   Step 7: Copy artifacts to GCS       (Layer 6 - infra, remote only)
//
// Any failure aborts the run; nothing is retried.

use anyhow::Result;
use burn::{
    backend::{wgpu::WgpuDevice, Autodiff},
    data::dataset::Dataset,
    tensor::backend::AutodiffBackend,
};
use std::path::PathBuf;

use crate::application::backend::{BackendKind, NdArrayBackend, WgpuBackend};
use crate::data::{
    dataset::{ImageDataset, ImageSample},
    loader::MnistLoader,
    sampler::sample_indices,
};
use crate::domain::{
    architecture::{Architecture, IMAGE_SIZE},
    artifacts::{ArtifactNames, TIMESTAMP_FORMAT},
    params::{RunParams, RunPlan},
};
use crate::infra::{
    checkpoint::CheckpointManager,
    config_file::load_run_params,
    metrics::MetricsLogger,
    storage::{Location, OutputDir},
};
use crate::ml::{
    inferencer::Reconstructor,
    trainer::{run_training, Evaluation, FitOutcome},
};
use crate::report::{learning_curve, reconstruction};

// ─── TrainRequest ─────────────────────────────────────────────────────────────
/// Everything the `train` command passes down.
#[derive(Debug, Clone)]
pub struct TrainRequest {
    /// Local directory or gs:// URI for all artifacts
    pub job_dir:     String,
    /// Names the checkpoint and figures; a timestamp when absent
    pub job_id:      Option<String>,
    /// Local staging directory used when job_dir is remote
    pub local_dir:   PathBuf,
    pub backend:     BackendKind,
    /// YAML file (local or gs://) replacing `params` entirely
    pub config_file: Option<String>,
    pub params:      RunParams,
}

/// What a finished run reports back to the CLI.
#[derive(Debug, Clone)]
pub struct TrainSummary {
    pub fit:        FitOutcome,
    pub test_score: Evaluation,
    pub checkpoint: PathBuf,
    pub artifacts:  Vec<String>,
}

// ─── TrainUseCase ─────────────────────────────────────────────────────────────
pub struct TrainUseCase {
    request: TrainRequest,
}

impl TrainUseCase {
    pub fn new(request: TrainRequest) -> Self {
        Self { request }
    }

    pub fn execute(&self) -> Result<TrainSummary> {
        let req = &self.request;

        // ── Step 1-2: parameters and architecture ─────────────────────────────
        let params = match &req.config_file {
            Some(source) => load_run_params(source)?,
            None         => req.params.clone(),
        };
        let plan = params.validate()?;
        let arch = Architecture::from_plan(&plan, IMAGE_SIZE)?;
        tracing::info!(
            "Run parameters: optimizer={}, loss={}, metric={}, pool={}, transposed={}, norm_before_activation={}",
            plan.optimizer,
            plan.loss,
            plan.metric,
            plan.pool,
            params.use_transposed_conv,
            params.batch_norm_before_activation,
        );

        // ── Step 3: output directory and names ────────────────────────────────
        let destination = Location::parse(&req.job_dir)?;
        let output      = OutputDir::new(&destination, &req.local_dir)?;
        let timestamp   = chrono::Local::now().format(TIMESTAMP_FORMAT).to_string();
        let names       = ArtifactNames::resolve(req.job_id.as_deref(), &timestamp, params.use_transposed_conv)?;
        tracing::info!("Writing artifacts for '{}' to {}", names.checkpoint, destination);

        let ckpt   = CheckpointManager::new(output.local().root(), &names.checkpoint)?;
        let logger = MetricsLogger::create(output.local().root(), &names.tag, plan.metric)?;
        ckpt.save_params(&params)?;

        // ── Step 4: data ──────────────────────────────────────────────────────
        let splits = MnistLoader::new(params.max_train_samples, params.max_test_samples).load();
        let shown  = pick_samples(&splits.test, &params);

        // ── Step 5: train on the chosen backend ───────────────────────────────
        let run = match req.backend {
            BackendKind::Wgpu => {
                let device = WgpuDevice::default();
                tracing::info!("Using WGPU device: {:?}", device);
                train_on::<Autodiff<WgpuBackend>>(&plan, &arch, splits.train, splits.test, &ckpt, &logger, &shown, device)?
            }
            BackendKind::NdArray => {
                tracing::info!("Using NdArray CPU backend");
                train_on::<Autodiff<NdArrayBackend>>(
                    &plan, &arch, splits.train, splits.test, &ckpt, &logger, &shown, Default::default(),
                )?
            }
        };
        println!(
            "Final test score: [loss={:.6}, {}={:.6}]",
            run.test_score.loss, plan.metric, run.test_score.metric
        );

        // ── Step 6: figures ───────────────────────────────────────────────────
        let caption = learning_curve::caption_lines(&plan, run.test_score.metric);
        learning_curve::render_learning_curve(
            &output.local_path(&names.learning_curve()),
            &run.fit.history,
            &caption,
        )?;
        reconstruction::render_comparison(
            &output.local_path(&names.comparison()),
            &shown,
            &run.reconstructions,
            params.sample_rows,
        )?;

        // ── Step 7: mirror to remote storage ──────────────────────────────────
        // no checkpoint exists when no epoch reached a finite val_loss
        let mut written = ckpt.files();
        written.push(MetricsLogger::file_name(&names.tag));
        written.push(names.learning_curve());
        written.push(names.comparison());
        let artifacts = output.publish_all(&written)?;

        Ok(TrainSummary {
            fit:        run.fit,
            test_score: run.test_score,
            checkpoint: output.local_path(&ckpt.weights_file()),
            artifacts,
        })
    }
}

/// Held-out images for the comparison figure, in random order.
fn pick_samples(test: &ImageDataset, params: &RunParams) -> Vec<ImageSample> {
    sample_indices(test.len(), params.n_samples_to_show, params.seed)
        .into_iter()
        .filter_map(|i| test.get(i))
        .collect()
}

struct BackendRun {
    fit:             FitOutcome,
    test_score:      Evaluation,
    reconstructions: Vec<ImageSample>,
}

#[allow(clippy::too_many_arguments)]
fn train_on<B: AutodiffBackend>(
    plan:   &RunPlan,
    arch:   &Architecture,
    train:  ImageDataset,
    test:   ImageDataset,
    ckpt:   &CheckpointManager,
    logger: &MetricsLogger,
    shown:  &[ImageSample],
    device: B::Device,
) -> Result<BackendRun> {
    let outcome = run_training::<B>(plan, arch, train, test, ckpt, Some(logger), &device)?;
    let reconstructions = Reconstructor::new(outcome.model, device).reconstruct(shown)?;
    Ok(BackendRun { fit: outcome.fit, test_score: outcome.test_score, reconstructions })
}
