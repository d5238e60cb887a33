// ============================================================
// Layer 5 — Autoencoder Model
// ============================================================
// Encoder stages shrink the image, decoder stages grow it back,
// and a single-channel sigmoid block produces the reconstruction.
// Whatever size drift padding causes is cut off by the crop the
// architecture inferred, so the output is always 28×28.

use burn::{
    prelude::*,
    tensor::{
        module::interpolate,
        ops::{InterpolateMode, InterpolateOptions},
    },
};

use crate::domain::architecture::{Architecture, DecoderStageSpec, EncoderStageSpec, PoolSpec};
use crate::domain::params::{LossKind, PoolMethod};
use crate::ml::block::ConvBlock;
use crate::ml::loss::reconstruction_loss;
use crate::ml::pooling::pool2d;

// ─── Encoder ──────────────────────────────────────────────────────────────────
/// Two blocks followed by a pooling step.
#[derive(Module, Debug)]
pub struct EncoderStage<B: Backend> {
    pub first:       ConvBlock<B>,
    pub second:      ConvBlock<B>,
    pool_max:        bool,
    pool_window:     usize,
    pool_pad_before: usize,
    pool_pad_after:  usize,
}

impl<B: Backend> EncoderStage<B> {
    fn from_spec(spec: &EncoderStageSpec, device: &B::Device) -> Self {
        Self {
            first:           ConvBlock::from_spec(&spec.blocks[0], device),
            second:          ConvBlock::from_spec(&spec.blocks[1], device),
            pool_max:        spec.pool.method == PoolMethod::Max,
            pool_window:     spec.pool.window,
            pool_pad_before: spec.pool.pad_before,
            pool_pad_after:  spec.pool.pad_after,
        }
    }

    pub fn pool_spec(&self) -> PoolSpec {
        PoolSpec {
            method:     if self.pool_max { PoolMethod::Max } else { PoolMethod::Average },
            window:     self.pool_window,
            pad_before: self.pool_pad_before,
            pad_after:  self.pool_pad_after,
        }
    }

    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        let x = self.second.forward(self.first.forward(x));
        pool2d(x, &self.pool_spec())
    }
}

// ─── Decoder ──────────────────────────────────────────────────────────────────
/// Two blocks followed by nearest-neighbour upsampling.
#[derive(Module, Debug)]
pub struct DecoderStage<B: Backend> {
    pub first:  ConvBlock<B>,
    pub second: ConvBlock<B>,
    scale:      usize,
}

impl<B: Backend> DecoderStage<B> {
    fn from_spec(spec: &DecoderStageSpec, device: &B::Device) -> Self {
        Self {
            first:  ConvBlock::from_spec(&spec.blocks[0], device),
            second: ConvBlock::from_spec(&spec.blocks[1], device),
            scale:  spec.upsample,
        }
    }

    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        let x = self.second.forward(self.first.forward(x));
        let [_, _, h, w] = x.dims();
        interpolate(
            x,
            [h * self.scale, w * self.scale],
            InterpolateOptions::new(InterpolateMode::Nearest),
        )
    }
}

// ─── Autoencoder ──────────────────────────────────────────────────────────────
#[derive(Module, Debug)]
pub struct Autoencoder<B: Backend> {
    pub encoder: Vec<EncoderStage<B>>,
    pub decoder: Vec<DecoderStage<B>>,
    pub output:  ConvBlock<B>,
    crop_top:    usize,
    crop_bottom: usize,
    crop_left:   usize,
    crop_right:  usize,
}

impl<B: Backend> Autoencoder<B> {
    /// Assemble the network: encoder stages, decoder stages, the
    /// single-channel output block, then the inferred crop.
    pub fn from_architecture(arch: &Architecture, device: &B::Device) -> Self {
        let encoder = arch.encoder.iter().map(|s| EncoderStage::from_spec(s, device)).collect();
        let decoder = arch.decoder.iter().map(|s| DecoderStage::from_spec(s, device)).collect();
        let output  = ConvBlock::from_spec(&arch.output, device);

        Self {
            encoder,
            decoder,
            output,
            crop_top:    arch.crop.top,
            crop_bottom: arch.crop.bottom,
            crop_left:   arch.crop.left,
            crop_right:  arch.crop.right,
        }
    }

    /// images: [batch, 1, h, w] → compressed representation
    pub fn encode(&self, images: Tensor<B, 4>) -> Tensor<B, 4> {
        self.encoder.iter().fold(images, |x, stage| stage.forward(x))
    }

    /// compressed representation → [batch, 1, h, w]
    pub fn decode(&self, encoded: Tensor<B, 4>) -> Tensor<B, 4> {
        let x = self.decoder.iter().fold(encoded, |x, stage| stage.forward(x));
        self.crop(self.output.forward(x))
    }

    /// images: [batch, 1, 28, 28] → reconstructions of the same shape
    pub fn forward(&self, images: Tensor<B, 4>) -> Tensor<B, 4> {
        self.decode(self.encode(images))
    }

    pub fn forward_loss(&self, images: Tensor<B, 4>, loss: LossKind) -> (Tensor<B, 1>, Tensor<B, 4>) {
        let output = self.forward(images.clone());
        (reconstruction_loss(loss, output.clone(), images), output)
    }

    fn crop(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        let [batch, channels, h, w] = x.dims();
        x.slice([
            0..batch,
            0..channels,
            self.crop_top..h - self.crop_bottom,
            self.crop_left..w - self.crop_right,
        ])
    }
}
