// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// Everything between the raw MNIST corpus and tensor batches:
//
//   MnistDataset (burn vision)
//       │
//       ▼
//   MnistLoader   → train/test splits, optional leading subsets
//       │
//       ▼
//   ImageDataset  → Burn Dataset of [0, 1]-scaled images
//       │
//       ▼
//   ImageBatcher  → [N, 1, 28, 28] tensors
//       │
//       ▼
//   DataLoader    → shuffled batches for the fit loop
//
// sampler.rs picks held-out images for the reconstruction figure.

/// MNIST train/test loading
pub mod loader;

/// Implements Burn's Dataset trait for images
pub mod dataset;

/// Implements Burn's Batcher trait to create image batches
pub mod batcher;

/// Seeded random selection of held-out samples
pub mod sampler;
