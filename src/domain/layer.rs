// ============================================================
// Layer 3 — Layer Configuration
// ============================================================
// A BlockSpec is the immutable description of one block:
// one convolution (or transposed convolution), optional batch
// normalisation and a non-linearity. A fresh spec is created for
// every block the assembler places.
//
// The order of the stages inside a block is decided here, not in
// the burn module, so it can be checked without tensors:
//
//   batch_norm  norm_before_activation   stages
//   ──────────  ──────────────────────   ─────────────────────────────
//   yes         yes                      Conv(no bias) → Norm → Act
//   yes         no                       Conv(no bias) → Act  → Norm
//   no          (ignored)                Conv(bias)    → Act

use crate::domain::params::{Activation, PaddingMode};

/// One step inside a block, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockStage {
    Convolution { transposed: bool, bias: bool },
    BatchNorm,
    Activation(Activation),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockSpec {
    pub in_channels:            usize,
    pub out_channels:           usize,
    pub kernel_size:            usize,
    pub padding:                PaddingMode,
    pub activation:             Activation,
    pub dilation:               usize,
    pub batch_norm:             bool,
    pub transposed:             bool,
    pub norm_before_activation: bool,
}

impl BlockSpec {
    /// Defaults: 'same' padding, relu, dilation 1, batch norm on,
    /// plain convolution, norm after activation.
    pub fn new(in_channels: usize, out_channels: usize, kernel_size: usize) -> Self {
        Self {
            in_channels,
            out_channels,
            kernel_size,
            padding:                PaddingMode::Same,
            activation:             Activation::Relu,
            dilation:               1,
            batch_norm:             true,
            transposed:             false,
            norm_before_activation: false,
        }
    }

    pub fn with_padding(mut self, padding: PaddingMode) -> Self {
        self.padding = padding;
        self
    }

    pub fn with_activation(mut self, activation: Activation) -> Self {
        self.activation = activation;
        self
    }

    pub fn with_dilation(mut self, dilation: usize) -> Self {
        self.dilation = dilation;
        self
    }

    pub fn with_batch_norm(mut self, batch_norm: bool) -> Self {
        self.batch_norm = batch_norm;
        self
    }

    pub fn with_transposed(mut self, transposed: bool) -> Self {
        self.transposed = transposed;
        self
    }

    pub fn with_norm_before_activation(mut self, before: bool) -> Self {
        self.norm_before_activation = before;
        self
    }

    /// The convolution carries a bias only when no normalisation follows it.
    pub fn conv_bias(&self) -> bool {
        !self.batch_norm
    }

    pub fn layout(&self) -> Vec<BlockStage> {
        let conv = BlockStage::Convolution {
            transposed: self.transposed,
            bias:       self.conv_bias(),
        };
        let act = BlockStage::Activation(self.activation);

        match (self.batch_norm, self.norm_before_activation) {
            (true, true)  => vec![conv, BlockStage::BatchNorm, act],
            (true, false) => vec![conv, act, BlockStage::BatchNorm],
            (false, _)    => vec![conv, act],
        }
    }

    /// Symmetric zero padding applied on each side.
    pub fn padding_amount(&self) -> usize {
        match self.padding {
            PaddingMode::Same  => self.dilation * (self.kernel_size - 1) / 2,
            PaddingMode::Valid => 0,
        }
    }

    /// Spatial size after this block, or None if the kernel does not fit.
    ///
    /// convolution:            s + 2p − d(k−1)
    /// transposed convolution: s − 2p + d(k−1)
    pub fn output_size(&self, size: usize) -> Option<usize> {
        let p      = self.padding_amount();
        let reach  = self.dilation * (self.kernel_size - 1);
        if self.transposed {
            size.checked_add(reach)?.checked_sub(2 * p).filter(|s| *s > 0)
        } else {
            size.checked_add(2 * p)?.checked_sub(reach).filter(|s| *s > 0)
        }
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_norm_before_activation() {
        let spec = BlockSpec::new(1, 8, 3).with_norm_before_activation(true);
        assert_eq!(
            spec.layout(),
            vec![
                BlockStage::Convolution { transposed: false, bias: false },
                BlockStage::BatchNorm,
                BlockStage::Activation(Activation::Relu),
            ]
        );
    }

    #[test]
    fn test_layout_norm_after_activation() {
        let spec = BlockSpec::new(1, 8, 3).with_norm_before_activation(false);
        assert_eq!(
            spec.layout(),
            vec![
                BlockStage::Convolution { transposed: false, bias: false },
                BlockStage::Activation(Activation::Relu),
                BlockStage::BatchNorm,
            ]
        );
    }

    #[test]
    fn test_layout_without_norm_ignores_placement() {
        for before in [true, false] {
            let spec = BlockSpec::new(8, 1, 3)
                .with_batch_norm(false)
                .with_activation(Activation::Sigmoid)
                .with_transposed(true)
                .with_norm_before_activation(before);
            assert_eq!(
                spec.layout(),
                vec![
                    BlockStage::Convolution { transposed: true, bias: true },
                    BlockStage::Activation(Activation::Sigmoid),
                ]
            );
        }
    }

    #[test]
    fn test_same_padding_keeps_size() {
        for transposed in [false, true] {
            let spec = BlockSpec::new(1, 8, 3).with_transposed(transposed);
            assert_eq!(spec.output_size(28), Some(28));
            let dilated = spec.with_dilation(2);
            assert_eq!(dilated.padding_amount(), 2);
            assert_eq!(dilated.output_size(28), Some(28));
        }
    }

    #[test]
    fn test_valid_padding_sizes() {
        let conv = BlockSpec::new(1, 8, 3).with_padding(PaddingMode::Valid);
        assert_eq!(conv.output_size(28), Some(26));
        assert_eq!(conv.output_size(2), None);

        let deconv = conv.with_transposed(true);
        assert_eq!(deconv.output_size(28), Some(30));
    }
}
