use burn::data::dataset::{vision::MnistItem, Dataset};

use crate::domain::architecture::IMAGE_SIZE;

/// Pixel intensity of a fully lit MNIST pixel.
const MAX_PIXEL: f32 = 255.0;

/// One grayscale image, row-major, scaled to [0, 1].
#[derive(Debug, Clone, PartialEq)]
pub struct ImageSample {
    pub pixels: Vec<f32>,
}

impl ImageSample {
    pub fn new(pixels: Vec<f32>) -> Self {
        Self { pixels }
    }

    /// Pixel at (row, col).
    pub fn at(&self, row: usize, col: usize) -> f32 {
        self.pixels[row * IMAGE_SIZE + col]
    }
}

impl From<MnistItem> for ImageSample {
    fn from(item: MnistItem) -> Self {
        let pixels = item
            .image
            .iter()
            .flat_map(|row| row.iter().map(|&p| p / MAX_PIXEL))
            .collect();
        Self { pixels }
    }
}

pub struct ImageDataset {
    samples: Vec<ImageSample>,
}

impl ImageDataset {
    pub fn new(samples: Vec<ImageSample>) -> Self { Self { samples } }

    /// Every item of `source`, or only its first `limit` items.
    pub fn from_source<D: Dataset<MnistItem>>(source: &D, limit: Option<usize>) -> Self {
        let n = limit.map_or(source.len(), |l| l.min(source.len()));
        let samples = (0..n).filter_map(|i| source.get(i)).map(ImageSample::from).collect();
        Self { samples }
    }

    pub fn sample_count(&self) -> usize { self.samples.len() }

    pub fn samples(&self) -> &[ImageSample] { &self.samples }
}

impl Dataset<ImageSample> for ImageDataset {
    fn get(&self, index: usize) -> Option<ImageSample> {
        self.samples.get(index).cloned()
    }

    fn len(&self) -> usize {
        self.samples.len()
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use burn::data::dataset::InMemDataset;

    fn item(value: f32) -> MnistItem {
        MnistItem { image: [[value; 28]; 28], label: 0 }
    }

    #[test]
    fn test_pixels_are_scaled_to_unit_range() {
        let mut raw = item(0.0);
        raw.image[0][1] = 255.0;
        raw.image[27][27] = 51.0;
        let sample = ImageSample::from(raw);
        assert_eq!(sample.pixels.len(), 784);
        assert_eq!(sample.at(0, 1), 1.0);
        assert!((sample.at(27, 27) - 0.2).abs() < 1e-6);
        assert_eq!(sample.at(5, 5), 0.0);
    }

    #[test]
    fn test_limit_takes_leading_items() {
        let source = InMemDataset::new(vec![item(0.0), item(255.0), item(0.0)]);
        let subset = ImageDataset::from_source(&source, Some(2));
        assert_eq!(subset.len(), 2);
        assert_eq!(subset.get(1).unwrap().at(0, 0), 1.0);

        let all = ImageDataset::from_source(&source, Some(10));
        assert_eq!(all.sample_count(), 3);
    }
}
