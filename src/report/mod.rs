// ============================================================
// Layer 7 — Reporting
// ============================================================
// Renders the two diagnostic figures of a run as PNG files:
//
//   learning_curve.rs — lr_<tag>.png: training / validation score
//                       per epoch with the final test score
//   reconstruction.rs — compare_<tag>.png: held-out images next to
//                       their reconstructions
//
// Figures are written locally; the application layer mirrors
// them to remote storage.

/// Two-panel learning curve
pub mod learning_curve;

/// Original vs reconstructed grid
pub mod reconstruction;
