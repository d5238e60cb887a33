// ============================================================
// Layer 2 — Backend Selection
// ============================================================
// The tensor backend is picked at run time; everything below the
// application layer is generic over it.
//
//   wgpu    → GPU through wgpu (default)
//   ndarray → CPU, pure Rust
//
// Training runs on Autodiff<backend>, evaluation on the backend
// itself.

use std::fmt;
use std::str::FromStr;

pub type WgpuBackend    = burn::backend::Wgpu;
pub type NdArrayBackend = burn::backend::NdArray<f32>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackendKind {
    #[default]
    Wgpu,
    NdArray,
}

impl FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "wgpu"    => Ok(Self::Wgpu),
            "ndarray" => Ok(Self::NdArray),
            other     => Err(format!("unknown backend '{other}' (expected one of: wgpu, ndarray)")),
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Wgpu    => "wgpu",
            Self::NdArray => "ndarray",
        })
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_backend_names() {
        assert_eq!("wgpu".parse::<BackendKind>(), Ok(BackendKind::Wgpu));
        assert_eq!("ndarray".parse::<BackendKind>(), Ok(BackendKind::NdArray));
        assert!("cuda".parse::<BackendKind>().is_err());
        assert_eq!(BackendKind::default().to_string(), "wgpu");
    }
}
