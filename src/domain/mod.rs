// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Plain Rust types describing a run: its parameters, the shape
// of the network, the history it produces, and the traits other
// layers implement.
//
// Rules for this layer:
//   - NO burn types
//   - NO file I/O or network calls

/// Configuration failures
pub mod error;

/// Run parameters and their validated, tagged form
pub mod params;

/// One block's configuration and stage ordering
pub mod layer;

/// Whole-network description with shape inference
pub mod architecture;

/// Per-epoch metrics collected by the fit loop
pub mod history;

/// File names derived from the job id
pub mod artifacts;

/// Abstractions implemented by infra and ml
pub mod traits;
