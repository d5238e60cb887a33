// ============================================================
// Layer 6 — Run Log
// ============================================================
// Records per-epoch metrics to a CSV file, one row per epoch,
// written as soon as the epoch finishes so a run can be inspected
// while it is still training.
//
// The metric columns are named after the score metric's history
// keys, e.g. for "mse":
//
//   epoch,loss,mean_squared_error,val_loss,val_mean_squared_error
//   1,0.214310,0.061772,0.143025,0.036410
//   2,0.127811,0.031194,0.114356,0.027053
//
// Output file: {output_dir}/log_{job_id}.csv. A rerun with the
// same job id starts a fresh file.

use anyhow::{Context, Result};
use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
};

use crate::domain::history::EpochMetrics;
use crate::domain::params::ScoreMetric;

/// Appends epoch metrics to a CSV file.
pub struct MetricsLogger {
    /// Full path to the CSV file
    csv_path: PathBuf,
}

impl MetricsLogger {
    /// Create the log, truncating any previous file of the same
    /// name, and write the header row.
    pub fn create(dir: &Path, job_id: &str, metric: ScoreMetric) -> Result<Self> {
        fs::create_dir_all(dir)
            .with_context(|| format!("Cannot create log directory '{}'", dir.display()))?;

        let csv_path = dir.join(Self::file_name(job_id));
        let keys     = metric.history_keys();
        let mut f    = fs::File::create(&csv_path)
            .with_context(|| format!("Cannot create run log '{}'", csv_path.display()))?;
        writeln!(f, "epoch,loss,{},val_loss,{}", keys.train, keys.validation)?;
        tracing::debug!("Created run log: '{}'", csv_path.display());

        Ok(Self { csv_path })
    }

    pub fn file_name(job_id: &str) -> String {
        format!("log_{job_id}.csv")
    }

    /// Append one epoch's metrics as a new row.
    pub fn log(&self, m: &EpochMetrics) -> Result<()> {
        let mut f = OpenOptions::new()
            .append(true)
            .open(&self.csv_path)
            .with_context(|| format!("Cannot open run log '{}'", self.csv_path.display()))?;

        writeln!(
            f,
            "{},{:.6},{:.6},{:.6},{:.6}",
            m.epoch, m.loss, m.metric, m.val_loss, m.val_metric,
        )?;

        tracing::debug!(
            "Logged epoch {} metrics: loss={:.4}, val_loss={:.4}",
            m.epoch,
            m.loss,
            m.val_loss,
        );
        Ok(())
    }

    pub fn csv_path(&self) -> &Path {
        &self.csv_path
    }
}
