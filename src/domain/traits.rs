// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// The seams between layers:
//   - ArtifactStore → LocalStore / GcsStore        (infra)
//   - EpochRunner   → BurnEpochRunner / test stubs (ml)

use anyhow::Result;

use crate::domain::history::EpochMetrics;

// ─── ArtifactStore ────────────────────────────────────────────────────────────
/// A place artifacts can be written to and read from by name,
/// relative to the store's root.
///
/// Implementations:
///   - LocalStore → a directory on the local filesystem
///   - GcsStore   → a bucket prefix in Google Cloud Storage
pub trait ArtifactStore {
    /// Write `bytes` under `name`, replacing any previous object.
    fn put(&self, name: &str, bytes: &[u8]) -> Result<()>;

    /// Read the full contents stored under `name`.
    fn get(&self, name: &str) -> Result<Vec<u8>>;

    /// Whether anything is stored under `name`.
    fn exists(&self, name: &str) -> Result<bool>;

    /// Human-readable location of `name`, for logs.
    fn describe(&self, name: &str) -> String;
}

// ─── EpochRunner ──────────────────────────────────────────────────────────────
/// Whatever performs one training epoch and can persist its
/// current weights. The fit loop drives this without knowing
/// which tensor backend sits underneath.
pub trait EpochRunner {
    /// Train on every batch once, then score the held-out split.
    fn run_epoch(&mut self, epoch: usize) -> Result<EpochMetrics>;

    /// Persist the current weights as the best checkpoint.
    fn save_checkpoint(&mut self, epoch: usize) -> Result<()>;
}
