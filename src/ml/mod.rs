// ============================================================
// Layer 5 — ML / Model Layer (Burn)
// ============================================================
// All tensor code lives here. The domain layer describes the
// network as plain data; this layer turns that description into
// burn modules and trains them.
//
//   block.rs      — Block Builder: conv / deconv + batch norm +
//                   activation, in the order the layout table says
//   pooling.rs    — Pooling Selector: "max" or average
//   model.rs      — Network Assembler: encoder, decoder, output
//                   block and the inferred crop
//   loss.rs       — reconstruction losses and score metrics
//   callbacks.rs  — early stopping and best-checkpoint monitors
//   trainer.rs    — fit loop, epoch runner, evaluation
//   inferencer.rs — reconstructions from a trained model

/// Convolution block
pub mod block;

/// Max / average pooling
pub mod pooling;

/// Encoder-decoder autoencoder
pub mod model;

/// Losses and metrics
pub mod loss;

/// Fit-loop monitors
pub mod callbacks;

/// Training loop with validation and checkpointing
pub mod trainer;

/// Reconstruction of held-out samples
pub mod inferencer;
