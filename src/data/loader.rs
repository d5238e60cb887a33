// ============================================================
// Layer 4 — MNIST Loader
// ============================================================
// Fetches the MNIST train/test partitions through burn's vision
// dataset (downloaded once into the burn cache directory) and
// converts them to ImageDatasets with pixels scaled to [0, 1].
//
// Optional limits take the leading N items of each split, so a
// limited run always sees the same images.

use burn::data::dataset::vision::MnistDataset;

use crate::data::dataset::ImageDataset;

/// The held-out split is used both for validation during fit and
/// for the final evaluation.
pub struct MnistSplits {
    pub train: ImageDataset,
    pub test:  ImageDataset,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct MnistLoader {
    max_train: Option<usize>,
    max_test:  Option<usize>,
}

impl MnistLoader {
    pub fn new(max_train: Option<usize>, max_test: Option<usize>) -> Self {
        Self { max_train, max_test }
    }

    pub fn load(&self) -> MnistSplits {
        tracing::info!("Loading MNIST (burn dataset cache)");
        let splits = MnistSplits {
            train: ImageDataset::from_source(&MnistDataset::train(), self.max_train),
            test:  self.load_test(),
        };
        tracing::info!(
            "MNIST ready: {} train / {} test images",
            splits.train.sample_count(),
            splits.test.sample_count(),
        );
        splits
    }

    /// Only the held-out split, for evaluation.
    pub fn load_test(&self) -> ImageDataset {
        ImageDataset::from_source(&MnistDataset::test(), self.max_test)
    }
}
