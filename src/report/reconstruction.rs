// ============================================================
// Layer 7 — Reconstruction Comparison Figure
// ============================================================
// A grid of held-out images and their reconstructions. The
// samples are split over `rows` rows; every row of originals is
// directly followed by the row of their reconstructions:
//
//   row 0   original  0 … n_cols-1
//   row 1   reconstructed 0 … n_cols-1
//   row 2   original  n_cols … 2·n_cols-1
//   …
//
// Pixels are drawn in grayscale, black = 0, white = 1.

use anyhow::{anyhow, ensure, Result};
use plotters::prelude::*;
use std::path::Path;

use crate::data::dataset::ImageSample;
use crate::domain::architecture::IMAGE_SIZE;

/// Screen pixels per image pixel.
const SCALE: i32 = 3;
/// Gap between cells, in screen pixels.
const GAP:   i32 = 6;

/// Grid shape for `n` samples over `rows` original rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridLayout {
    pub n_cols:     usize,
    /// Originals rows plus reconstruction rows.
    pub total_rows: usize,
}

impl GridLayout {
    pub fn new(n: usize, rows: usize) -> Self {
        let rows   = rows.max(1);
        let n_cols = n.div_ceil(rows).max(1);
        Self { n_cols, total_rows: n.div_ceil(n_cols) * 2 }
    }

    /// (original row, reconstruction row, column) of sample `i`.
    pub fn position(&self, i: usize) -> (usize, usize, usize) {
        let row = i / self.n_cols * 2;
        (row, row + 1, i % self.n_cols)
    }

    pub fn pixel_size(&self) -> (u32, u32) {
        let cell = IMAGE_SIZE as i32 * SCALE + GAP;
        ((self.n_cols as i32 * cell + GAP) as u32, (self.total_rows as i32 * cell + GAP) as u32)
    }
}

pub fn render_comparison(
    path:            &Path,
    originals:       &[ImageSample],
    reconstructions: &[ImageSample],
    rows:            usize,
) -> Result<()> {
    ensure!(
        originals.len() == reconstructions.len(),
        "{} originals but {} reconstructions",
        originals.len(),
        reconstructions.len()
    );

    let layout = GridLayout::new(originals.len(), rows);
    let root   = BitMapBackend::new(path, layout.pixel_size()).into_drawing_area();
    root.fill(&WHITE).map_err(|e| anyhow!("backend error: {e}"))?;

    for (i, (original, reconstructed)) in originals.iter().zip(reconstructions).enumerate() {
        let (orig_row, rec_row, col) = layout.position(i);
        draw_image(&root, original, orig_row, col)?;
        draw_image(&root, reconstructed, rec_row, col)?;
    }

    root.present().map_err(|e| anyhow!("render error: {e}"))?;
    tracing::debug!("Comparison grid written to '{}'", path.display());
    Ok(())
}

fn draw_image<DB: DrawingBackend>(
    area:   &DrawingArea<DB, plotters::coord::Shift>,
    image:  &ImageSample,
    row:    usize,
    col:    usize,
) -> Result<()> {
    let cell = IMAGE_SIZE as i32 * SCALE + GAP;
    let x0   = GAP + col as i32 * cell;
    let y0   = GAP + row as i32 * cell;

    for (p, value) in image.pixels.iter().enumerate() {
        let (r, c) = ((p / IMAGE_SIZE) as i32, (p % IMAGE_SIZE) as i32);
        let g      = (value.clamp(0.0, 1.0) * 255.0).round() as u8;
        let x      = x0 + c * SCALE;
        let y      = y0 + r * SCALE;
        area.draw(&Rectangle::new([(x, y), (x + SCALE, y + SCALE)], RGBColor(g, g, g).filled()))
            .map_err(|e| anyhow!("draw error: {e:?}"))?;
    }
    Ok(())
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_layout() {
        // 30 samples over 3 rows → 10 columns, 6 grid rows
        let layout = GridLayout::new(30, 3);
        assert_eq!(layout, GridLayout { n_cols: 10, total_rows: 6 });
        assert_eq!(layout.position(0), (0, 1, 0));
        assert_eq!(layout.position(9), (0, 1, 9));
        assert_eq!(layout.position(10), (2, 3, 0));
        assert_eq!(layout.position(29), (4, 5, 9));
    }

    #[test]
    fn test_uneven_layout_fits_every_sample() {
        let layout = GridLayout::new(7, 3);
        assert_eq!(layout.n_cols, 3);
        assert_eq!(layout.total_rows, 6);
        assert_eq!(layout.position(6), (4, 5, 0));
    }

    #[test]
    fn test_renders_png() {
        let dir  = tempfile::tempdir().unwrap();
        let path = dir.path().join("compare_test.png");
        let a    = vec![ImageSample::new(vec![0.0; 784]), ImageSample::new(vec![1.0; 784])];
        let b    = vec![ImageSample::new(vec![0.5; 784]), ImageSample::new(vec![0.25; 784])];
        render_comparison(&path, &a, &b, 1).unwrap();
        assert!(std::fs::metadata(&path).unwrap().len() > 0);
    }

    #[test]
    fn test_mismatched_inputs_are_rejected() {
        let dir  = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.png");
        let a    = vec![ImageSample::new(vec![0.0; 784])];
        assert!(render_comparison(&path, &a, &[], 1).is_err());
    }
}
