// ============================================================
// Layer 5 — Block Builder
// ============================================================
// One convolution (or transposed convolution) unit with optional
// batch normalisation and a non-linearity. The stage order comes
// from BlockSpec::layout() and is replayed verbatim in forward().
//
// BatchNorm keeps 0.99 of the old running average per step
// (burn momentum 0.01) and uses epsilon 1e-3.

use burn::{
    module::Ignored,
    nn::{
        conv::{Conv2d, Conv2dConfig, ConvTranspose2d, ConvTranspose2dConfig},
        BatchNorm, BatchNormConfig, PaddingConfig2d,
    },
    prelude::*,
    tensor::activation,
};

use crate::domain::layer::{BlockSpec, BlockStage};
use crate::domain::params::Activation;

const BATCH_NORM_MOMENTUM: f64 = 0.01;
const BATCH_NORM_EPSILON:  f64 = 1e-3;

#[derive(Module, Debug)]
pub struct ConvBlock<B: Backend> {
    conv:   Option<Conv2d<B>>,
    deconv: Option<ConvTranspose2d<B>>,
    norm:   Option<BatchNorm<B, 2>>,
    layout: Ignored<Vec<BlockStage>>,
}

impl<B: Backend> ConvBlock<B> {
    pub fn from_spec(spec: &BlockSpec, device: &B::Device) -> Self {
        let k = spec.kernel_size;
        let d = spec.dilation;
        let p = spec.padding_amount();

        let (conv, deconv) = if spec.transposed {
            let deconv = ConvTranspose2dConfig::new([spec.in_channels, spec.out_channels], [k, k])
                .with_dilation([d, d])
                .with_padding([p, p])
                .with_bias(spec.conv_bias())
                .init(device);
            (None, Some(deconv))
        } else {
            let conv = Conv2dConfig::new([spec.in_channels, spec.out_channels], [k, k])
                .with_dilation([d, d])
                .with_padding(PaddingConfig2d::Explicit(p, p))
                .with_bias(spec.conv_bias())
                .init(device);
            (Some(conv), None)
        };

        let norm = spec.batch_norm.then(|| {
            BatchNormConfig::new(spec.out_channels)
                .with_momentum(BATCH_NORM_MOMENTUM)
                .with_epsilon(BATCH_NORM_EPSILON)
                .init(device)
        });

        Self { conv, deconv, norm, layout: Ignored(spec.layout()) }
    }

    /// input: [batch, in_channels, h, w] → [batch, out_channels, h', w']
    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        self.layout.0.iter().fold(x, |x, stage| match *stage {
            BlockStage::Convolution { .. } => self.convolve(x),
            BlockStage::BatchNorm => match &self.norm {
                Some(norm) => norm.forward(x),
                None       => x,
            },
            BlockStage::Activation(a) => activate(a, x),
        })
    }

    fn convolve(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        match (&self.conv, &self.deconv) {
            (_, Some(deconv)) => deconv.forward(x),
            (Some(conv), None) => conv.forward(x),
            (None, None) => x,
        }
    }

    pub fn stages(&self) -> &[BlockStage] {
        &self.layout.0
    }
}

pub fn activate<B: Backend, const D: usize>(a: Activation, x: Tensor<B, D>) -> Tensor<B, D> {
    match a {
        Activation::Relu    => activation::relu(x),
        Activation::Sigmoid => activation::sigmoid(x),
        Activation::Tanh    => activation::tanh(x),
        Activation::Linear  => x,
    }
}
