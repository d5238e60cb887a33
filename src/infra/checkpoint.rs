// ============================================================
// Layer 6 — Checkpoint Manager
// ============================================================
// Saves and restores the best model weights with Burn's
// NamedMpkGzFileRecorder at full precision.
//
// Files in the output directory:
//   {checkpoint}.mpk.gz   ← weights of the best epoch so far
//   best_epoch.json       ← which epoch those weights are from
//   run_params.json       ← parameters the model was built from
//
// The weights file is overwritten each time the validation loss
// improves, so only the best epoch is ever on disk. The params
// are needed to rebuild the exact architecture before loading.

use anyhow::{Context, Result};
use burn::{
    prelude::*,
    record::{FullPrecisionSettings, NamedMpkGzFileRecorder, Recorder},
};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::domain::params::RunParams;
use crate::ml::model::Autoencoder;

type CheckpointRecorder = NamedMpkGzFileRecorder<FullPrecisionSettings>;

pub const BEST_EPOCH_FILE: &str = "best_epoch.json";
pub const PARAMS_FILE:     &str = "run_params.json";
const WEIGHTS_EXTENSION:   &str = "mpk.gz";

pub struct CheckpointManager {
    /// Directory holding all checkpoint files
    dir:  PathBuf,
    /// Weights file stem
    name: String,
}

impl CheckpointManager {
    /// Creates the directory if it does not exist yet.
    pub fn new(dir: &Path, name: impl Into<String>) -> Result<Self> {
        fs::create_dir_all(dir)
            .with_context(|| format!("Cannot create checkpoint directory '{}'", dir.display()))?;
        Ok(Self { dir: dir.to_path_buf(), name: name.into() })
    }

    /// File name of the weights, including the recorder's extension.
    pub fn weights_file(&self) -> String {
        format!("{}.{WEIGHTS_EXTENSION}", self.name)
    }

    /// Every file this manager writes, relative to its directory.
    pub fn files(&self) -> Vec<String> {
        vec![self.weights_file(), BEST_EPOCH_FILE.to_string(), PARAMS_FILE.to_string()]
    }

    /// Overwrite the checkpoint with `model` and record `epoch`.
    pub fn save_model<B: Backend>(&self, model: &Autoencoder<B>, epoch: usize) -> Result<()> {
        let path = self.dir.join(&self.name);

        CheckpointRecorder::new()
            .record(model.clone().into_record(), path.clone())
            .with_context(|| format!("Failed to save checkpoint to '{}'", path.display()))?;

        let best_path = self.dir.join(BEST_EPOCH_FILE);
        fs::write(&best_path, serde_json::to_string(&epoch)?)
            .with_context(|| format!("Failed to write '{}'", best_path.display()))?;

        tracing::debug!("Saved checkpoint '{}' (epoch {})", self.weights_file(), epoch);
        Ok(())
    }

    /// Load the saved weights into `model`, which must have the
    /// architecture the checkpoint was recorded from.
    pub fn load_model<B: Backend>(
        &self,
        model:  Autoencoder<B>,
        device: &B::Device,
    ) -> Result<Autoencoder<B>> {
        let path = self.dir.join(&self.name);
        let record = CheckpointRecorder::new()
            .load(path.clone(), device)
            .with_context(|| {
                format!(
                    "Cannot load checkpoint '{}'. Have you trained the model first?",
                    path.display()
                )
            })?;
        Ok(model.load_record(record))
    }

    pub fn save_params(&self, params: &RunParams) -> Result<()> {
        let path = self.dir.join(PARAMS_FILE);
        fs::write(&path, serde_json::to_string_pretty(params)?)
            .with_context(|| format!("Cannot write run parameters to '{}'", path.display()))?;
        tracing::debug!("Saved run parameters to '{}'", path.display());
        Ok(())
    }

    pub fn load_params(&self) -> Result<RunParams> {
        let path = self.dir.join(PARAMS_FILE);
        let json = fs::read_to_string(&path).with_context(|| {
            format!(
                "Cannot read run parameters from '{}'. Make sure you have run 'train' first.",
                path.display()
            )
        })?;
        Ok(serde_json::from_str(&json)?)
    }

    /// Epoch of the weights currently on disk.
    pub fn best_epoch(&self) -> Result<usize> {
        let path = self.dir.join(BEST_EPOCH_FILE);
        let s = fs::read_to_string(&path)
            .with_context(|| format!("Cannot find '{}'. Have you run 'train' first?", path.display()))?;
        Ok(serde_json::from_str::<usize>(&s)?)
    }

    pub fn has_checkpoint(&self) -> bool {
        self.dir.join(self.weights_file()).is_file()
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use burn::tensor::Distribution;

    use crate::domain::architecture::{Architecture, IMAGE_SIZE};
    use crate::test_support::{backend_lock, TestBackend};

    fn model(params: &RunParams, device: &<TestBackend as Backend>::Device) -> Autoencoder<TestBackend> {
        let plan = params.validate().unwrap();
        let arch = Architecture::from_plan(&plan, IMAGE_SIZE).unwrap();
        Autoencoder::from_architecture(&arch, device)
    }

    #[test]
    fn test_params_round_trip() {
        let dir  = tempfile::tempdir().unwrap();
        let ckpt = CheckpointManager::new(dir.path(), "job").unwrap();
        let params = RunParams { n_epochs: 3, seed: Some(9), ..Default::default() };
        ckpt.save_params(&params).unwrap();
        assert_eq!(ckpt.load_params().unwrap(), params);
    }

    #[test]
    fn test_missing_files_are_errors() {
        let dir  = tempfile::tempdir().unwrap();
        let ckpt = CheckpointManager::new(dir.path(), "job").unwrap();
        assert!(ckpt.load_params().is_err());
        assert!(ckpt.best_epoch().is_err());
        assert!(!ckpt.has_checkpoint());
    }

    #[test]
    fn test_saved_weights_reload_identically() {
        let _guard = backend_lock();
        let device = Default::default();
        let dir    = tempfile::tempdir().unwrap();
        let ckpt   = CheckpointManager::new(dir.path(), "job").unwrap();
        let params = RunParams { n_filters: 2, depth: 2, ..Default::default() };

        let saved = model(&params, &device);
        ckpt.save_model(&saved, 4).unwrap();
        assert!(ckpt.has_checkpoint());
        assert_eq!(ckpt.best_epoch().unwrap(), 4);

        let fresh    = model(&params, &device);
        let restored = ckpt.load_model(fresh, &device).unwrap();

        let x = Tensor::<TestBackend, 4>::random([2, 1, 28, 28], Distribution::Default, &device);
        let a = saved.forward(x.clone()).into_data();
        let b = restored.forward(x).into_data();
        a.assert_approx_eq(&b, 5);
    }
}
