// ============================================================
// Layer 3 — Artifact Naming
// ============================================================
// Every file a run produces is named from the job id:
//
//   job id given      checkpoint  <job_id>.mpk.gz
//   no job id         checkpoint  mnist_autoencoder_checkpoint_<timestamp>.mpk.gz
//
//   figures / log     lr_<tag>.png, compare_<tag>.png, log_<tag>.csv
//                     tag = job id (or the timestamp), prefixed with
//                     "transposed_conv_" when the decoder uses
//                     transposed convolutions.

use crate::domain::error::ConfigError;

/// Prefix of the checkpoint name when no job id is given.
pub const FALLBACK_CHECKPOINT_PREFIX: &str = "mnist_autoencoder_checkpoint_";

/// Prefix of the figure tag for transposed-convolution runs.
pub const TRANSPOSED_TAG_PREFIX: &str = "transposed_conv_";

/// strftime pattern of the fallback job id, e.g. 2017Aug10_1530.
pub const TIMESTAMP_FORMAT: &str = "%Y%b%d_%H%M";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactNames {
    /// Checkpoint file stem (the recorder adds the extension).
    pub checkpoint: String,
    /// Suffix shared by figures and the run log.
    pub tag:        String,
}

impl ArtifactNames {
    /// `timestamp` is only used when `job_id` is None. The id ends
    /// up in file names, so it must be a single path component.
    pub fn resolve(job_id: Option<&str>, timestamp: &str, transposed: bool) -> Result<Self, ConfigError> {
        let (checkpoint, id) = match job_id {
            Some(id) => {
                let id = id.trim();
                if id.is_empty() || id == "." || id == ".." || id.contains(['/', '\\']) {
                    return Err(ConfigError::InvalidJobId(id.to_string()));
                }
                (id.to_string(), id.to_string())
            }
            None => (format!("{FALLBACK_CHECKPOINT_PREFIX}{timestamp}"), timestamp.to_string()),
        };
        Ok(Self { checkpoint, tag: Self::tag_for(&id, transposed) })
    }

    /// Names for an existing checkpoint, as produced by `resolve`.
    pub fn from_checkpoint(checkpoint: &str, transposed: bool) -> Self {
        let id = checkpoint.strip_prefix(FALLBACK_CHECKPOINT_PREFIX).unwrap_or(checkpoint);
        Self { checkpoint: checkpoint.to_string(), tag: Self::tag_for(id, transposed) }
    }

    fn tag_for(id: &str, transposed: bool) -> String {
        if transposed { format!("{TRANSPOSED_TAG_PREFIX}{id}") } else { id.to_string() }
    }

    pub fn learning_curve(&self) -> String {
        format!("lr_{}.png", self.tag)
    }

    pub fn comparison(&self) -> String {
        format!("compare_{}.png", self.tag)
    }
}
