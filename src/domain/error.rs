// ============================================================
// Layer 3 — Configuration Errors
// ============================================================
// Every way a run can be misconfigured before the first weight
// is allocated. The application layer wraps these in anyhow,
// so callers see one error chain from CLI to failure site.

use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("config file does not exist: '{0}'")]
    MissingConfigFile(String),

    #[error("unknown optimizer '{0}' (expected one of: adam, sgd)")]
    UnknownOptimizer(String),

    #[error("unknown loss '{0}' (expected one of: binary_crossentropy, mse, mae)")]
    UnknownLoss(String),

    /// Only `mae` and `mse` have a defined history-key mapping.
    #[error("unknown score metric '{0}' (expected one of: mae, mse)")]
    UnknownMetric(String),

    #[error("unknown activation '{0}' (expected one of: relu, sigmoid, tanh, linear)")]
    UnknownActivation(String),

    #[error("unknown padding mode '{0}' (expected one of: same, valid)")]
    UnknownPadding(String),

    #[error("'{field}' must be greater than zero")]
    Zero { field: &'static str },

    #[error("invalid output location '{0}'")]
    InvalidLocation(String),

    #[error("invalid job id '{0}': must be a non-empty file name without path separators")]
    InvalidJobId(String),

    #[error(
        "decoder produces {produced}x{produced} images but the input is {expected}x{expected}; \
         reduce depth or use 'same' padding"
    )]
    ShapeMismatch { produced: usize, expected: usize },

    #[error("depth {depth} is too deep: layer widths or decoder sizes overflow")]
    TooDeep { depth: usize },
}
