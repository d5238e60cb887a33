// ============================================================
// Layer 2 — Application Layer
// ============================================================
// Use cases that wire the lower layers together. The CLI builds
// a request, the use case runs it and hands back a summary.
//
//   TrainUseCase    — full training run, figures, remote copy
//   EvaluateUseCase — rescore a finished run from its checkpoint

/// Runtime choice of tensor backend
pub mod backend;

/// Training pipeline orchestration
pub mod train_use_case;

/// Checkpoint evaluation
pub mod evaluate_use_case;
