// ============================================================
// Layer 3 — Network Architecture (shape inference)
// ============================================================
// Describes the whole encoder/decoder as plain data before any
// burn module exists. Spatial size is tracked through every
// block, pooling and upsampling step, and the final crop is
// derived from the size the decoder actually produces.
//
// Default design (depth 3, 'same' padding, 2x2 pooling):
//
//   28 ─enc─▶ 14 ─enc─▶ 7 ─enc─▶ 4      (n, 2n, 4n channels)
//    4 ─dec─▶  8 ─dec─▶ 16 ─dec─▶ 32    (4n, 2n, n channels)
//   32 ─out─▶ 32 ─crop 2/2─▶ 28

use crate::domain::error::ConfigError;
use crate::domain::layer::BlockSpec;
use crate::domain::params::{Activation, PaddingMode, PoolMethod, RunPlan};

/// Input images are square, single channel.
pub const IMAGE_SIZE:     usize = 28;
pub const IMAGE_CHANNELS: usize = 1;

/// Decoder upsampling factor.
pub const UPSAMPLE_FACTOR: usize = 2;

// ─── PoolSpec ─────────────────────────────────────────────────────────────────
/// A square pooling window with stride equal to the window.
///
/// 'same' pads just enough for the output to be ceil(size / window),
/// putting the odd pixel after the image (bottom/right), so for 7 → 4
/// the windows are [0,1] [2,3] [4,5] [6,pad].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolSpec {
    pub method:     PoolMethod,
    pub window:     usize,
    /// Padding above and left of the image
    pub pad_before: usize,
    /// Padding below and right of the image
    pub pad_after:  usize,
}

impl PoolSpec {
    pub fn for_input(method: PoolMethod, window: usize, mode: PaddingMode, size: usize) -> Self {
        let (pad_before, pad_after) = match mode {
            PaddingMode::Valid => (0, 0),
            PaddingMode::Same  => {
                let needed = (size.div_ceil(window) * window).saturating_sub(size);
                (needed / 2, needed - needed / 2)
            }
        };
        Self { method, window, pad_before, pad_after }
    }

    pub fn is_symmetric(&self) -> bool {
        self.pad_before == self.pad_after
    }

    /// (s + before + after − w) / w + 1
    pub fn output_size(&self, size: usize) -> Option<usize> {
        (size + self.pad_before + self.pad_after)
            .checked_sub(self.window)
            .map(|s| s / self.window + 1)
    }
}

// ─── Crop ─────────────────────────────────────────────────────────────────────
/// Pixels removed from each border of the decoded image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Crop {
    pub top:    usize,
    pub bottom: usize,
    pub left:   usize,
    pub right:  usize,
}

impl Crop {
    /// Crop `produced` down to `expected`; an odd excess puts the extra
    /// pixel on the bottom/right edge.
    pub fn to_fit(produced: usize, expected: usize) -> Result<Self, ConfigError> {
        let excess = produced
            .checked_sub(expected)
            .ok_or(ConfigError::ShapeMismatch { produced, expected })?;
        let lead  = excess / 2;
        let trail = excess - lead;
        Ok(Self { top: lead, bottom: trail, left: lead, right: trail })
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

// ─── Stages ───────────────────────────────────────────────────────────────────
#[derive(Debug, Clone, PartialEq)]
pub struct EncoderStageSpec {
    pub blocks:      [BlockSpec; 2],
    pub pool:        PoolSpec,
    /// Spatial size leaving the stage (after pooling).
    pub output_size: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DecoderStageSpec {
    pub blocks:      [BlockSpec; 2],
    pub upsample:    usize,
    /// Spatial size leaving the stage (after upsampling).
    pub output_size: usize,
}

// ─── Architecture ─────────────────────────────────────────────────────────────
#[derive(Debug, Clone, PartialEq)]
pub struct Architecture {
    pub input_size:       usize,
    pub encoder:          Vec<EncoderStageSpec>,
    pub decoder:          Vec<DecoderStageSpec>,
    pub output:           BlockSpec,
    pub encoded_size:     usize,
    pub encoded_channels: usize,
    pub decoded_size:     usize,
    pub crop:             Crop,
}

impl Architecture {
    pub fn from_plan(plan: &RunPlan, input_size: usize) -> Result<Self, ConfigError> {
        let p = &plan.params;
        let mismatch = |produced: usize| ConfigError::ShapeMismatch { produced, expected: input_size };
        let too_deep = || ConfigError::TooDeep { depth: p.depth };
        let width_at = |stage: usize| {
            u32::try_from(stage)
                .ok()
                .and_then(|s| 1usize.checked_shl(s))
                .and_then(|scale| p.n_filters.checked_mul(scale))
                .ok_or_else(too_deep)
        };

        let hidden = |in_ch: usize, out_ch: usize, transposed: bool| {
            BlockSpec::new(in_ch, out_ch, p.kernel_size)
                .with_padding(plan.padding)
                .with_activation(plan.activation)
                .with_dilation(p.dilation_rate)
                .with_transposed(transposed)
                .with_norm_before_activation(p.batch_norm_before_activation)
        };

        // ── Encoder: widths n, 2n, 4n, … ─────────────────────────────────────
        let mut size     = input_size;
        let mut channels = IMAGE_CHANNELS;
        let mut encoder  = Vec::new();
        for stage in 0..p.depth {
            let width  = width_at(stage)?;
            let blocks = [hidden(channels, width, false), hidden(width, width, false)];
            for block in &blocks {
                size = block.output_size(size).ok_or_else(|| mismatch(0))?;
            }
            // a 1x1 map cannot be pooled any further
            if size <= 1 {
                return Err(too_deep());
            }
            let pool = PoolSpec::for_input(plan.pool, p.pool_size, plan.padding, size);
            size     = pool.output_size(size).ok_or_else(|| mismatch(0))?;
            channels = width;
            encoder.push(EncoderStageSpec { blocks, pool, output_size: size });
        }
        let encoded_size     = size;
        let encoded_channels = channels;

        // ── Decoder: mirrored widths, transposed flag applies here only ─────
        let mut decoder = Vec::new();
        for stage in (0..p.depth).rev() {
            let width  = width_at(stage)?;
            let blocks = [
                hidden(channels, width, p.use_transposed_conv),
                hidden(width, width, p.use_transposed_conv),
            ];
            for block in &blocks {
                size = block.output_size(size).ok_or_else(|| mismatch(0))?;
            }
            size     = size.checked_mul(UPSAMPLE_FACTOR).ok_or_else(too_deep)?;
            channels = width;
            decoder.push(DecoderStageSpec { blocks, upsample: UPSAMPLE_FACTOR, output_size: size });
        }

        // ── Output block: one channel, sigmoid, no normalisation ────────────
        let output = BlockSpec::new(channels, IMAGE_CHANNELS, p.kernel_size)
            .with_padding(PaddingMode::Same)
            .with_activation(Activation::Sigmoid)
            .with_dilation(p.dilation_rate)
            .with_batch_norm(false)
            .with_transposed(p.use_transposed_conv)
            .with_norm_before_activation(p.batch_norm_before_activation);
        let decoded_size = output.output_size(size).ok_or_else(|| mismatch(0))?;
        let crop         = Crop::to_fit(decoded_size, input_size)?;

        tracing::debug!(
            "Architecture: {input_size} → encoded {encoded_size}x{encoded_size}x{encoded_channels} \
             → decoded {decoded_size} → crop {crop:?}"
        );

        Ok(Self {
            input_size,
            encoder,
            decoder,
            output,
            encoded_size,
            encoded_channels,
            decoded_size,
            crop,
        })
    }

    /// Spatial size of the network output after the crop.
    pub fn output_size(&self) -> usize {
        self.decoded_size - self.crop.top - self.crop.bottom
    }

    /// Every block in the order the forward pass visits them.
    pub fn blocks(&self) -> impl Iterator<Item = &BlockSpec> {
        self.encoder
            .iter()
            .flat_map(|s| s.blocks.iter())
            .chain(self.decoder.iter().flat_map(|s| s.blocks.iter()))
            .chain(std::iter::once(&self.output))
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::params::RunParams;

    fn plan_with(params: RunParams) -> RunPlan {
        params.validate().unwrap()
    }

    #[test]
    fn test_default_design_matches_fixed_crop() {
        let arch = Architecture::from_plan(&plan_with(RunParams::default()), IMAGE_SIZE).unwrap();
        let sizes: Vec<usize> = arch.encoder.iter().map(|s| s.output_size).collect();
        assert_eq!(sizes, vec![14, 7, 4]);
        assert_eq!(arch.encoded_size, 4);
        assert_eq!(arch.encoded_channels, 32);
        assert_eq!(arch.decoded_size, 32);
        assert_eq!(arch.crop, Crop { top: 2, bottom: 2, left: 2, right: 2 });
        assert_eq!(arch.output_size(), IMAGE_SIZE);
    }

    #[test]
    fn test_channel_widths_double_then_halve() {
        let arch = Architecture::from_plan(&plan_with(RunParams::default()), IMAGE_SIZE).unwrap();
        let enc: Vec<usize> = arch.encoder.iter().map(|s| s.blocks[1].out_channels).collect();
        let dec: Vec<usize> = arch.decoder.iter().map(|s| s.blocks[1].out_channels).collect();
        assert_eq!(enc, vec![8, 16, 32]);
        assert_eq!(dec, vec![32, 16, 8]);
        assert_eq!(arch.output.in_channels, 8);
        assert_eq!(arch.output.out_channels, 1);
        assert!(!arch.output.batch_norm);
        assert_eq!(arch.output.activation, Activation::Sigmoid);
    }

    #[test]
    fn test_transposed_flag_only_reaches_decoder() {
        let params = RunParams { use_transposed_conv: true, ..Default::default() };
        let arch   = Architecture::from_plan(&plan_with(params), IMAGE_SIZE).unwrap();
        assert!(arch.encoder.iter().flat_map(|s| s.blocks.iter()).all(|b| !b.transposed));
        assert!(arch.decoder.iter().flat_map(|s| s.blocks.iter()).all(|b| b.transposed));
        assert!(arch.output.transposed);
        assert_eq!(arch.output_size(), IMAGE_SIZE);
    }

    #[test]
    fn test_placement_flag_threads_into_every_block() {
        let params = RunParams { batch_norm_before_activation: true, ..Default::default() };
        let arch   = Architecture::from_plan(&plan_with(params), IMAGE_SIZE).unwrap();
        assert!(arch.blocks().all(|b| b.norm_before_activation));
        assert_eq!(arch.blocks().count(), 13);
    }

    #[test]
    fn test_shallower_network_needs_no_crop() {
        let params = RunParams { depth: 2, ..Default::default() };
        let arch   = Architecture::from_plan(&plan_with(params), IMAGE_SIZE).unwrap();
        assert_eq!(arch.decoded_size, 28);
        assert!(arch.crop.is_empty());
    }

    #[test]
    fn test_valid_transposed_network_recomputes_crop() {
        let params = RunParams {
            depth:               2,
            padding:             "valid".into(),
            use_transposed_conv: true,
            ..Default::default()
        };
        let arch = Architecture::from_plan(&plan_with(params), IMAGE_SIZE).unwrap();
        assert_eq!(arch.encoded_size, 4);
        assert_eq!(arch.decoded_size, 40);
        assert_eq!(arch.crop, Crop { top: 6, bottom: 6, left: 6, right: 6 });
        assert_eq!(arch.output_size(), IMAGE_SIZE);
    }

    #[test]
    fn test_valid_padding_too_deep_is_rejected() {
        let params = RunParams { padding: "valid".into(), ..Default::default() };
        let err    = Architecture::from_plan(&plan_with(params), IMAGE_SIZE).unwrap_err();
        assert!(matches!(err, ConfigError::ShapeMismatch { expected: 28, .. }));
    }

    #[test]
    fn test_odd_excess_goes_to_trailing_edge() {
        let crop = Crop::to_fit(31, 28).unwrap();
        assert_eq!(crop, Crop { top: 1, bottom: 2, left: 1, right: 2 });
        assert!(Crop::to_fit(20, 28).is_err());
    }

    #[test]
    fn test_same_pool_padding() {
        let pool = PoolSpec::for_input(PoolMethod::Max, 2, PaddingMode::Same, 7);
        assert_eq!((pool.pad_before, pool.pad_after), (0, 1));
        assert!(!pool.is_symmetric());
        assert_eq!(pool.output_size(7), Some(4));

        let wide = PoolSpec::for_input(PoolMethod::Max, 3, PaddingMode::Same, 7);
        assert_eq!((wide.pad_before, wide.pad_after), (1, 1));
        assert_eq!(wide.output_size(7), Some(3));

        let even = PoolSpec::for_input(PoolMethod::Average, 2, PaddingMode::Same, 28);
        assert_eq!((even.pad_before, even.pad_after), (0, 0));
        assert_eq!(even.output_size(28), Some(14));

        let valid = PoolSpec::for_input(PoolMethod::Max, 2, PaddingMode::Valid, 7);
        assert_eq!(valid.output_size(7), Some(3));
    }

    #[test]
    fn test_overly_deep_network_is_an_error_not_a_panic() {
        // 28 → 14 → 7 → 4 → 2 → 1 is the deepest 'same' encoder
        let deepest = Architecture::from_plan(&plan_with(RunParams { depth: 5, ..Default::default() }), IMAGE_SIZE)
            .unwrap();
        assert_eq!(deepest.encoded_size, 1);
        assert_eq!(deepest.output_size(), IMAGE_SIZE);

        for depth in [6, 40, 64, 200] {
            let params = RunParams { depth, ..Default::default() };
            let err    = Architecture::from_plan(&plan_with(params), IMAGE_SIZE).unwrap_err();
            assert_eq!(err, ConfigError::TooDeep { depth });
        }
    }

    #[test]
    fn test_width_overflow_is_an_error() {
        // a 1x1 window never shrinks the map, so only the widths overflow
        let params = RunParams { depth: 64, pool_size: 1, ..Default::default() };
        let err    = Architecture::from_plan(&plan_with(params), IMAGE_SIZE).unwrap_err();
        assert_eq!(err, ConfigError::TooDeep { depth: 64 });
    }
}
