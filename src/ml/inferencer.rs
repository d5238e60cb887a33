// ============================================================
// Layer 5 — Reconstructor
// ============================================================
// Runs a trained autoencoder (inference mode, no autodiff) over
// a handful of images and returns the reconstructions in the
// same flat, row-major layout the data layer uses.

use anyhow::{anyhow, Result};
use burn::{data::dataloader::batcher::Batcher, prelude::*};

use crate::data::{batcher::ImageBatcher, dataset::ImageSample};
use crate::domain::architecture::{Architecture, IMAGE_SIZE};
use crate::domain::params::RunPlan;
use crate::infra::checkpoint::CheckpointManager;
use crate::ml::model::Autoencoder;

pub struct Reconstructor<B: Backend> {
    model:   Autoencoder<B>,
    batcher: ImageBatcher<B>,
}

impl<B: Backend> Reconstructor<B> {
    pub fn new(model: Autoencoder<B>, device: B::Device) -> Self {
        Self { model, batcher: ImageBatcher::new(device) }
    }

    /// Rebuild the architecture from `plan` and load the saved weights.
    pub fn from_checkpoint(ckpt: &CheckpointManager, plan: &RunPlan, device: B::Device) -> Result<Self> {
        let arch  = Architecture::from_plan(plan, IMAGE_SIZE)?;
        let model = Autoencoder::<B>::from_architecture(&arch, &device);
        let model = ckpt.load_model(model, &device)?;
        tracing::info!("Model loaded from checkpoint");
        Ok(Self::new(model, device))
    }

    pub fn model(&self) -> &Autoencoder<B> {
        &self.model
    }

    /// One reconstruction per input, in input order.
    pub fn reconstruct(&self, samples: &[ImageSample]) -> Result<Vec<ImageSample>> {
        if samples.is_empty() {
            return Ok(Vec::new());
        }

        let batch  = self.batcher.batch(samples.to_vec());
        let output = self.model.forward(batch.images);
        let pixels = output
            .into_data()
            .to_vec::<f32>()
            .map_err(|e| anyhow!("Cannot read reconstructions: {e:?}"))?;

        Ok(pixels
            .chunks(IMAGE_SIZE * IMAGE_SIZE)
            .map(|chunk| ImageSample::new(chunk.to_vec()))
            .collect())
    }
}
