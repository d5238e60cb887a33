#![recursion_limit = "256"]

mod cli;
mod application;
mod domain;
mod data;
mod ml;
mod infra;
mod report;

use anyhow::Result;
use cli::Cli;
use clap::Parser;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("conv_autoencoder=info".parse()?),
        )
        .init();

    let cli = Cli::parse();
    cli.run()
}

#[cfg(test)]
mod test_support {
    use std::sync::{Mutex, MutexGuard};

    use crate::data::dataset::{ImageDataset, ImageSample};
    use crate::domain::architecture::IMAGE_SIZE;

    pub type TestBackend         = burn::backend::NdArray<f32>;
    pub type TestAutodiffBackend = burn::backend::Autodiff<TestBackend>;

    static BACKEND_LOCK: Mutex<()> = Mutex::new(());

    /// Serialises tests that seed the global backend RNG.
    pub fn backend_lock() -> MutexGuard<'static, ()> {
        BACKEND_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Images with a bright square at a position that varies per index.
    pub fn squares(n: usize) -> ImageDataset {
        let samples = (0..n)
            .map(|i| {
                let offset = (i * 3) % 18;
                let pixels = (0..IMAGE_SIZE * IMAGE_SIZE)
                    .map(|p| {
                        let (r, c) = (p / IMAGE_SIZE, p % IMAGE_SIZE);
                        let inside = (offset..offset + 8).contains(&r) && (offset..offset + 8).contains(&c);
                        if inside { 1.0 } else { 0.0 }
                    })
                    .collect();
                ImageSample::new(pixels)
            })
            .collect();
        ImageDataset::new(samples)
    }
}
