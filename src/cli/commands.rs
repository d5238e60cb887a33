// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Defines the two subcommands, `train` and `evaluate`, and all
// their configurable flags. Run parameters mirror RunParams one
// to one; `--config-file` replaces all of them at once.

use clap::{Args, Subcommand};
use std::path::PathBuf;

use crate::application::{
    backend::BackendKind,
    evaluate_use_case::EvaluateRequest,
    train_use_case::TrainRequest,
};
use crate::domain::params::RunParams;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Train the autoencoder on MNIST and write checkpoint, log and figures
    Train(TrainArgs),

    /// Rescore a finished run from its checkpoint
    Evaluate(EvaluateArgs),
}

// ─── train ────────────────────────────────────────────────────────────────────
#[derive(Args, Debug)]
pub struct TrainArgs {
    /// Local directory or gs://bucket/prefix for all outputs
    #[arg(long)]
    pub job_dir: String,

    /// Run identifier used in artifact names; a timestamp when omitted
    #[arg(long)]
    pub job_id: Option<String>,

    /// Local staging directory when --job-dir is a gs:// URI
    #[arg(long, default_value = "job_output")]
    pub local_dir: PathBuf,

    /// Tensor backend: wgpu or ndarray
    #[arg(long, default_value = "wgpu")]
    pub backend: BackendKind,

    /// YAML file (local path or gs:// URI) holding every run parameter.
    /// When given, the parameter flags below are ignored.
    #[arg(long)]
    pub config_file: Option<String>,

    #[command(flatten)]
    pub params: ParamArgs,
}

/// Training run parameters.
#[derive(Args, Debug)]
pub struct ParamArgs {
    /// Use transposed convolutions in the decoder blocks
    #[arg(long)]
    pub use_transposed_conv: bool,

    /// Tracked metric: mse or mae
    #[arg(long, default_value = "mse")]
    pub score_metric: String,

    /// Reconstruction loss: binary_crossentropy, mse or mae
    #[arg(long, default_value = "binary_crossentropy")]
    pub loss: String,

    #[arg(long, default_value_t = 0.001)]
    pub learning_rate: f64,

    /// Time-based decay applied per optimizer step
    #[arg(long, default_value_t = 0.001)]
    pub lr_decay: f64,

    /// Optimizer: adam or sgd (Nesterov, momentum 0.9)
    #[arg(long, default_value = "adam")]
    pub optimizer_name: String,

    #[arg(long, default_value_t = 100)]
    pub n_epochs: usize,

    /// Epochs without improvement before stopping
    #[arg(long, default_value_t = 5)]
    pub patience: usize,

    /// Smallest val_loss drop that counts as improvement
    #[arg(long, default_value_t = 0.0005)]
    pub min_delta: f64,

    /// Normalize before the activation instead of after it
    #[arg(long)]
    pub batch_norm_before_activation: bool,

    /// Pooling: max, anything else averages
    #[arg(long, default_value = "max")]
    pub pool_method: String,

    #[arg(long, default_value_t = 8)]
    pub n_filters: usize,

    #[arg(long, default_value_t = 3)]
    pub kernel_size: usize,

    /// Number of encoder stages
    #[arg(long, default_value_t = 3)]
    pub depth: usize,

    #[arg(long, default_value_t = 2)]
    pub pool_size: usize,

    /// same or valid
    #[arg(long, default_value = "same")]
    pub padding: String,

    #[arg(long, default_value_t = 1)]
    pub dilation_rate: usize,

    /// relu, sigmoid, tanh or linear
    #[arg(long, default_value = "relu")]
    pub activation: String,

    #[arg(long, default_value_t = 1000)]
    pub batch_size: usize,

    /// Seeds the backend, the loader shuffle and the figure samples
    #[arg(long)]
    pub seed: Option<u64>,

    #[arg(long)]
    pub max_train_samples: Option<usize>,

    #[arg(long)]
    pub max_test_samples: Option<usize>,

    /// Images in the reconstruction grid
    #[arg(long, default_value_t = 30)]
    pub n_samples_to_show: usize,

    #[arg(long, default_value_t = 3)]
    pub sample_rows: usize,
}

impl From<ParamArgs> for RunParams {
    fn from(a: ParamArgs) -> Self {
        RunParams {
            use_transposed_conv:          a.use_transposed_conv,
            score_metric:                 a.score_metric,
            loss:                         a.loss,
            learning_rate:                a.learning_rate,
            lr_decay:                     a.lr_decay,
            optimizer_name:               a.optimizer_name,
            n_epochs:                     a.n_epochs,
            patience:                     a.patience,
            min_delta:                    a.min_delta,
            batch_norm_before_activation: a.batch_norm_before_activation,
            pool_method:                  a.pool_method,
            n_filters:                    a.n_filters,
            kernel_size:                  a.kernel_size,
            depth:                        a.depth,
            pool_size:                    a.pool_size,
            padding:                      a.padding,
            dilation_rate:                a.dilation_rate,
            activation:                   a.activation,
            batch_size:                   a.batch_size,
            seed:                         a.seed,
            max_train_samples:            a.max_train_samples,
            max_test_samples:             a.max_test_samples,
            n_samples_to_show:            a.n_samples_to_show,
            sample_rows:                  a.sample_rows,
        }
    }
}

/// The application layer never sees clap types.
impl From<TrainArgs> for TrainRequest {
    fn from(a: TrainArgs) -> Self {
        TrainRequest {
            job_dir:     a.job_dir,
            job_id:      a.job_id,
            local_dir:   a.local_dir,
            backend:     a.backend,
            config_file: a.config_file,
            params:      a.params.into(),
        }
    }
}

// ─── evaluate ─────────────────────────────────────────────────────────────────
#[derive(Args, Debug)]
pub struct EvaluateArgs {
    /// Local directory a previous `train` wrote to
    #[arg(long)]
    pub job_dir: PathBuf,

    /// Checkpoint name printed at the end of `train`
    #[arg(long)]
    pub job_id: String,

    #[arg(long, default_value = "wgpu")]
    pub backend: BackendKind,
}

impl From<EvaluateArgs> for EvaluateRequest {
    fn from(a: EvaluateArgs) -> Self {
        EvaluateRequest { job_dir: a.job_dir, job_id: a.job_id, backend: a.backend }
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Cli;
    use clap::Parser;

    #[test]
    fn test_flag_defaults_match_run_params() {
        let cli = Cli::try_parse_from(["conv-autoencoder", "train", "--job-dir", "out"]).unwrap();
        let Commands::Train(args) = cli.command else { panic!("expected train") };
        let request: TrainRequest = args.into();
        assert_eq!(request.params, RunParams::default());
        assert_eq!(request.backend, BackendKind::Wgpu);
        assert!(request.job_id.is_none());
    }

    #[test]
    fn test_train_flags_are_forwarded() {
        let cli = Cli::try_parse_from([
            "conv-autoencoder", "train",
            "--job-dir", "gs://bucket/runs",
            "--job-id", "run7",
            "--backend", "ndarray",
            "--use-transposed-conv",
            "--optimizer-name", "sgd",
            "--score-metric", "mae",
            "--n-epochs", "4",
            "--seed", "3",
        ])
        .unwrap();
        let Commands::Train(args) = cli.command else { panic!("expected train") };
        let request: TrainRequest = args.into();
        assert_eq!(request.job_dir, "gs://bucket/runs");
        assert_eq!(request.job_id.as_deref(), Some("run7"));
        assert_eq!(request.backend, BackendKind::NdArray);
        assert!(request.params.use_transposed_conv);
        assert_eq!(request.params.optimizer_name, "sgd");
        assert_eq!(request.params.score_metric, "mae");
        assert_eq!(request.params.n_epochs, 4);
        assert_eq!(request.params.seed, Some(3));
    }

    #[test]
    fn test_evaluate_requires_job_id() {
        assert!(Cli::try_parse_from(["conv-autoencoder", "evaluate", "--job-dir", "out"]).is_err());
        assert!(Cli::try_parse_from(["conv-autoencoder", "train", "--job-dir", "out", "--backend", "tpu"]).is_err());
    }
}
