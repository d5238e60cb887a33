// ============================================================
// Layer 4 — Image Batcher
// ============================================================
// Implements Burn's Batcher trait to stack a Vec<ImageSample>
// into one [N, 1, 28, 28] float tensor.
//
// The autoencoder's target is its own input, so a batch carries
// nothing but the images.

use burn::{
    data::dataloader::batcher::Batcher,
    prelude::*,
};

use crate::data::dataset::ImageSample;
use crate::domain::architecture::{IMAGE_CHANNELS, IMAGE_SIZE};

// ─── ImageBatch ───────────────────────────────────────────────────────────────
#[derive(Debug, Clone)]
pub struct ImageBatch<B: Backend> {
    /// shape: [batch_size, 1, 28, 28], values in [0, 1]
    pub images: Tensor<B, 4>,
}

impl<B: Backend> ImageBatch<B> {
    pub fn len(&self) -> usize {
        self.images.dims()[0]
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// ─── ImageBatcher ─────────────────────────────────────────────────────────────
/// Holds the target device so tensors are created where the
/// model lives.
#[derive(Clone, Debug)]
pub struct ImageBatcher<B: Backend> {
    pub device: B::Device,
}

impl<B: Backend> ImageBatcher<B> {
    pub fn new(device: B::Device) -> Self {
        Self { device }
    }
}

impl<B: Backend> Batcher<ImageSample, ImageBatch<B>> for ImageBatcher<B> {
    fn batch(&self, items: Vec<ImageSample>) -> ImageBatch<B> {
        let batch_size = items.len();

        // [img1 row-major, img2 row-major, …] → [N, 1, 28, 28]
        let flat: Vec<f32> = items.into_iter().flat_map(|s| s.pixels).collect();
        let data = TensorData::new(flat, [batch_size, IMAGE_CHANNELS, IMAGE_SIZE, IMAGE_SIZE]);

        ImageBatch { images: Tensor::from_data(data, &self.device) }
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::TestBackend;

    #[test]
    fn test_batch_shape_and_layout() {
        let mut first = vec![0.0; 784];
        first[28 + 2] = 0.5;
        let second = vec![1.0; 784];

        let batcher = ImageBatcher::<TestBackend>::new(Default::default());
        let batch   = batcher.batch(vec![ImageSample::new(first), ImageSample::new(second)]);
        assert_eq!(batch.images.dims(), [2, 1, 28, 28]);
        assert_eq!(batch.len(), 2);

        let pixel: f32 = batch.images.clone().slice([0..1, 0..1, 1..2, 2..3]).into_scalar();
        assert_eq!(pixel, 0.5);
        let total: f32 = batch.images.slice([1..2, 0..1, 0..28, 0..28]).sum().into_scalar();
        assert_eq!(total, 784.0);
    }
}
