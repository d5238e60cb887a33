// ============================================================
// Layer 3 — Training Run Parameters
// ============================================================
// RunParams is the flat, serialisable set of knobs a run is
// started with (CLI flags or a YAML file). Names are kept as raw
// strings here and resolved exactly once into tagged variants by
// RunParams::validate(), which is where every unknown name turns
// into a ConfigError.
//
//   RunParams (strings, numbers)
//       │ validate()
//       ▼
//   RunPlan   (OptimizerKind, LossKind, ScoreMetric, PoolMethod,
//              PaddingMode, Activation + the numbers)

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::error::ConfigError;

// ─── RunParams ────────────────────────────────────────────────────────────────
/// All hyperparameters for a training run.
/// Missing keys in a config file fall back to the defaults below.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunParams {
    pub use_transposed_conv:          bool,
    pub score_metric:                 String,
    pub loss:                         String,
    pub learning_rate:                f64,
    pub lr_decay:                     f64,
    pub optimizer_name:               String,
    pub n_epochs:                     usize,
    pub patience:                     usize,
    pub min_delta:                    f64,
    pub batch_norm_before_activation: bool,
    pub pool_method:                  String,
    pub n_filters:                    usize,
    pub kernel_size:                  usize,
    pub depth:                        usize,
    pub pool_size:                    usize,
    pub padding:                      String,
    pub dilation_rate:                usize,
    pub activation:                   String,
    pub batch_size:                   usize,
    pub seed:                         Option<u64>,
    pub max_train_samples:            Option<usize>,
    pub max_test_samples:             Option<usize>,
    pub n_samples_to_show:            usize,
    pub sample_rows:                  usize,
}

impl Default for RunParams {
    fn default() -> Self {
        Self {
            use_transposed_conv:          false,
            score_metric:                 "mse".to_string(),
            loss:                         "binary_crossentropy".to_string(),
            learning_rate:                0.001,
            lr_decay:                     0.001,
            optimizer_name:               "adam".to_string(),
            n_epochs:                     100,
            patience:                     5,
            min_delta:                    0.0005,
            batch_norm_before_activation: false,
            pool_method:                  "max".to_string(),
            n_filters:                    8,
            kernel_size:                  3,
            depth:                        3,
            pool_size:                    2,
            padding:                      "same".to_string(),
            dilation_rate:                1,
            activation:                   "relu".to_string(),
            batch_size:                   1000,
            seed:                         None,
            max_train_samples:            None,
            max_test_samples:             None,
            n_samples_to_show:            30,
            sample_rows:                  3,
        }
    }
}

impl RunParams {
    /// Parse a YAML document into RunParams.
    pub fn from_yaml(text: &str) -> anyhow::Result<Self> {
        Ok(serde_yaml::from_str(text)?)
    }

    /// Resolve every named choice and check the sizes that must be
    /// non-zero. Nothing is built until this succeeds.
    pub fn validate(&self) -> Result<RunPlan, ConfigError> {
        let non_zero = [
            ("n_epochs",          self.n_epochs),
            ("n_filters",         self.n_filters),
            ("kernel_size",       self.kernel_size),
            ("depth",             self.depth),
            ("pool_size",         self.pool_size),
            ("dilation_rate",     self.dilation_rate),
            ("batch_size",        self.batch_size),
            ("sample_rows",       self.sample_rows),
        ];
        if let Some(&(field, _)) = non_zero.iter().find(|(_, v)| *v == 0) {
            return Err(ConfigError::Zero { field });
        }

        Ok(RunPlan {
            optimizer:  self.optimizer_name.parse()?,
            loss:       self.loss.parse()?,
            metric:     self.score_metric.parse()?,
            pool:       PoolMethod::from_name(&self.pool_method),
            padding:    self.padding.parse()?,
            activation: self.activation.parse()?,
            params:     self.clone(),
        })
    }
}

// ─── RunPlan ──────────────────────────────────────────────────────────────────
/// RunParams after validation: every name is a variant.
#[derive(Debug, Clone, PartialEq)]
pub struct RunPlan {
    pub optimizer:  OptimizerKind,
    pub loss:       LossKind,
    pub metric:     ScoreMetric,
    pub pool:       PoolMethod,
    pub padding:    PaddingMode,
    pub activation: Activation,
    pub params:     RunParams,
}

// ─── OptimizerKind ────────────────────────────────────────────────────────────
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptimizerKind {
    Adam,
    /// SGD with momentum 0.9 and Nesterov updates.
    Sgd,
}

impl FromStr for OptimizerKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "adam" => Ok(Self::Adam),
            "sgd"  => Ok(Self::Sgd),
            other  => Err(ConfigError::UnknownOptimizer(other.to_string())),
        }
    }
}

impl fmt::Display for OptimizerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Adam => "adam",
            Self::Sgd  => "sgd",
        })
    }
}

// ─── LossKind ─────────────────────────────────────────────────────────────────
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LossKind {
    BinaryCrossEntropy,
    MeanSquaredError,
    MeanAbsoluteError,
}

impl FromStr for LossKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "binary_crossentropy"        => Ok(Self::BinaryCrossEntropy),
            "mse" | "mean_squared_error"  => Ok(Self::MeanSquaredError),
            "mae" | "mean_absolute_error" => Ok(Self::MeanAbsoluteError),
            other => Err(ConfigError::UnknownLoss(other.to_string())),
        }
    }
}

impl fmt::Display for LossKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::BinaryCrossEntropy => "binary_crossentropy",
            Self::MeanSquaredError   => "mse",
            Self::MeanAbsoluteError  => "mae",
        })
    }
}

// ─── ScoreMetric ──────────────────────────────────────────────────────────────
/// The metric tracked next to the loss.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreMetric {
    MeanAbsoluteError,
    MeanSquaredError,
}

/// Names under which a metric's per-epoch values are recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryKeys {
    pub train:      &'static str,
    pub validation: &'static str,
}

impl ScoreMetric {
    pub fn history_keys(self) -> HistoryKeys {
        match self {
            Self::MeanAbsoluteError => HistoryKeys {
                train:      "mean_absolute_error",
                validation: "val_mean_absolute_error",
            },
            Self::MeanSquaredError => HistoryKeys {
                train:      "mean_squared_error",
                validation: "val_mean_squared_error",
            },
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::MeanAbsoluteError => "mae",
            Self::MeanSquaredError  => "mse",
        }
    }
}

impl FromStr for ScoreMetric {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mae" => Ok(Self::MeanAbsoluteError),
            "mse" => Ok(Self::MeanSquaredError),
            other => Err(ConfigError::UnknownMetric(other.to_string())),
        }
    }
}

impl fmt::Display for ScoreMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─── PoolMethod ───────────────────────────────────────────────────────────────
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolMethod {
    Max,
    Average,
}

impl PoolMethod {
    /// "max" selects max pooling; every other string, including the
    /// empty one, selects average pooling. This never fails.
    pub fn from_name(name: &str) -> Self {
        if name == "max" { Self::Max } else { Self::Average }
    }
}

impl fmt::Display for PoolMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Max     => "max",
            Self::Average => "average",
        })
    }
}

// ─── PaddingMode ──────────────────────────────────────────────────────────────
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaddingMode {
    /// Pad so stride-1 operators keep the spatial size.
    Same,
    /// No padding.
    Valid,
}

impl FromStr for PaddingMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "same"  => Ok(Self::Same),
            "valid" => Ok(Self::Valid),
            other   => Err(ConfigError::UnknownPadding(other.to_string())),
        }
    }
}

// ─── Activation ───────────────────────────────────────────────────────────────
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activation {
    Relu,
    Sigmoid,
    Tanh,
    /// Identity.
    Linear,
}

impl FromStr for Activation {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "relu"    => Ok(Self::Relu),
            "sigmoid" => Ok(Self::Sigmoid),
            "tanh"    => Ok(Self::Tanh),
            "linear"  => Ok(Self::Linear),
            other     => Err(ConfigError::UnknownActivation(other.to_string())),
        }
    }
}
