// ============================================================
// Layer 2 — EvaluateUseCase
// ============================================================
// Reloads a finished run from its local output directory:
//
//   run_params.json  → same architecture as in training
//   <job_id>.mpk.gz  → best weights
//
// then recomputes [loss, metric] on the held-out split and
// re-renders the reconstruction grid.

use anyhow::{bail, Result};
use burn::{
    backend::wgpu::WgpuDevice,
    data::{dataloader::DataLoaderBuilder, dataset::Dataset},
    prelude::*,
};
use std::path::PathBuf;

use crate::application::backend::{BackendKind, NdArrayBackend, WgpuBackend};
use crate::data::{batcher::ImageBatcher, dataset::ImageDataset, loader::MnistLoader, sampler::sample_indices};
use crate::domain::{
    artifacts::ArtifactNames,
    params::{RunParams, RunPlan},
};
use crate::infra::checkpoint::CheckpointManager;
use crate::ml::{
    inferencer::Reconstructor,
    trainer::{evaluate, Evaluation},
};
use crate::report::reconstruction;

#[derive(Debug, Clone)]
pub struct EvaluateRequest {
    /// Local directory the run wrote to
    pub job_dir: PathBuf,
    /// Checkpoint name printed by `train`
    pub job_id:  String,
    pub backend: BackendKind,
}

#[derive(Debug, Clone)]
pub struct EvaluateSummary {
    pub best_epoch: usize,
    pub test_score: Evaluation,
    pub figure:     PathBuf,
}

pub struct EvaluateUseCase {
    request: EvaluateRequest,
}

impl EvaluateUseCase {
    pub fn new(request: EvaluateRequest) -> Self {
        Self { request }
    }

    pub fn execute(&self) -> Result<EvaluateSummary> {
        self.run(|params| MnistLoader::new(None, params.max_test_samples).load_test())
    }

    /// `load_test` supplies the held-out split once the run's
    /// parameters are known.
    fn run(&self, load_test: impl FnOnce(&RunParams) -> ImageDataset) -> Result<EvaluateSummary> {
        let req  = &self.request;
        let ckpt = CheckpointManager::new(&req.job_dir, &req.job_id)?;
        if !ckpt.has_checkpoint() {
            bail!(
                "No checkpoint '{}' in '{}'. Have you run 'train' first?",
                ckpt.weights_file(),
                req.job_dir.display()
            );
        }

        let params     = ckpt.load_params()?;
        let plan       = params.validate()?;
        let best_epoch = ckpt.best_epoch()?;
        let names      = ArtifactNames::from_checkpoint(&req.job_id, params.use_transposed_conv);
        tracing::info!("Evaluating '{}' (best epoch {})", ckpt.weights_file(), best_epoch);

        let test = load_test(&params);

        let (test_score, originals, reconstructions) = match req.backend {
            BackendKind::Wgpu    => evaluate_on::<WgpuBackend>(&ckpt, &plan, test, WgpuDevice::default())?,
            BackendKind::NdArray => evaluate_on::<NdArrayBackend>(&ckpt, &plan, test, Default::default())?,
        };

        let figure = req.job_dir.join(names.comparison());
        reconstruction::render_comparison(&figure, &originals, &reconstructions, params.sample_rows)?;

        Ok(EvaluateSummary { best_epoch, test_score, figure })
    }
}

type Evaluated = (Evaluation, Vec<crate::data::dataset::ImageSample>, Vec<crate::data::dataset::ImageSample>);

fn evaluate_on<B: Backend>(
    ckpt:   &CheckpointManager,
    plan:   &RunPlan,
    test:   ImageDataset,
    device: B::Device,
) -> Result<Evaluated> {
    let p   = &plan.params;
    let rec = Reconstructor::<B>::from_checkpoint(ckpt, plan, device.clone())?;

    let originals: Vec<_> = sample_indices(test.len(), p.n_samples_to_show, p.seed)
        .into_iter()
        .filter_map(|i| test.get(i))
        .collect();
    let reconstructions = rec.reconstruct(&originals)?;

    let loader = DataLoaderBuilder::new(ImageBatcher::<B>::new(device))
        .batch_size(p.batch_size)
        .build(test);
    let score = evaluate(rec.model(), &*loader, plan.loss, plan.metric);

    Ok((score, originals, reconstructions))
}
