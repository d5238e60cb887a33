// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Everything that touches the filesystem or the network:
//
//   checkpoint.rs  — best-model weights (NamedMpkGzFileRecorder),
//                    best_epoch.json and run_params.json
//
//   metrics.rs     — per-epoch CSV run log
//
//   storage.rs     — Location parsing, LocalStore / GcsStore and
//                    the copy-after-write OutputDir
//
//   config_file.rs — YAML run parameters from a local or gs:// path

/// Model checkpoint saving and loading
pub mod checkpoint;

/// Training metrics CSV logger
pub mod metrics;

/// Local and Cloud Storage artifact stores
pub mod storage;

/// YAML config file loading
pub mod config_file;
