// ============================================================
// Layer 5 — Pooling Selector
// ============================================================
// Maps a pooling method to the downsampling op. "max" is the only
// name that selects max pooling; anything else, including typos
// and the empty string, falls back to average pooling.
//
// 'same' padding puts the odd pixel after the image (bottom and
// right). burn's pooling only pads symmetrically, so lopsided padding
// is added explicitly and the op then runs unpadded:
//
//   max     → pad with -inf, padded cells never win
//   average → pad with 0 and divide by the share of real cells,
//             so padded cells are excluded from the mean

use burn::{
    prelude::*,
    tensor::module::{avg_pool2d, max_pool2d},
};

use crate::domain::architecture::PoolSpec;
use crate::domain::params::{PaddingMode, PoolMethod};

/// Apply the pooling described by `spec` (stride = window).
pub fn pool2d<B: Backend>(x: Tensor<B, 4>, spec: &PoolSpec) -> Tensor<B, 4> {
    let w = spec.window;

    if spec.is_symmetric() {
        let p = spec.pad_before;
        return match spec.method {
            PoolMethod::Max     => max_pool2d(x, [w, w], [w, w], [p, p], [1, 1]),
            PoolMethod::Average => avg_pool2d(x, [w, w], [w, w], [p, p], false),
        };
    }

    match spec.method {
        PoolMethod::Max => {
            let padded = pad_spatial(x, spec, f32::NEG_INFINITY);
            max_pool2d(padded, [w, w], [w, w], [0, 0], [1, 1])
        }
        PoolMethod::Average => {
            let real  = x.ones_like();
            let sum   = avg_pool2d(pad_spatial(x, spec, 0.0), [w, w], [w, w], [0, 0], true);
            let share = avg_pool2d(pad_spatial(real, spec, 0.0), [w, w], [w, w], [0, 0], true);
            sum / share
        }
    }
}

/// Pad height and width with `value`: `pad_before` cells above and
/// left, `pad_after` cells below and right.
fn pad_spatial<B: Backend>(x: Tensor<B, 4>, spec: &PoolSpec, value: f32) -> Tensor<B, 4> {
    let x = pad_axis(x, 2, spec.pad_before, spec.pad_after, value);
    pad_axis(x, 3, spec.pad_before, spec.pad_after, value)
}

fn pad_axis<B: Backend>(x: Tensor<B, 4>, axis: usize, before: usize, after: usize, value: f32) -> Tensor<B, 4> {
    let dims   = x.dims();
    let device = x.device();
    let band   = |len: usize| {
        let mut shape = dims;
        shape[axis] = len;
        Tensor::<B, 4>::full(shape, value, &device)
    };

    let mut parts = Vec::with_capacity(3);
    if before > 0 {
        parts.push(band(before));
    }
    parts.push(x);
    if after > 0 {
        parts.push(band(after));
    }
    Tensor::cat(parts, axis)
}

/// Select a pooling op by name and apply it, sizing the padding
/// from the input's spatial size.
pub fn pool_layer<B: Backend>(
    x:       Tensor<B, 4>,
    method:  &str,
    window:  usize,
    padding: PaddingMode,
) -> Tensor<B, 4> {
    let [_, _, height, _] = x.dims();
    let spec = PoolSpec::for_input(PoolMethod::from_name(method), window, padding, height);
    pool2d(x, &spec)
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::TestBackend;

    fn square(values: [f32; 4]) -> Tensor<TestBackend, 4> {
        Tensor::<TestBackend, 1>::from_floats(values, &Default::default()).reshape([1, 1, 2, 2])
    }

    fn scalar(t: Tensor<TestBackend, 4>) -> f32 {
        t.into_data().to_vec::<f32>().unwrap()[0]
    }

    #[test]
    fn test_max_selects_max_pooling() {
        let out = pool_layer(square([1.0, 2.0, 3.0, 4.0]), "max", 2, PaddingMode::Same);
        assert_eq!(out.dims(), [1, 1, 1, 1]);
        assert_eq!(scalar(out), 4.0);
    }

    #[test]
    fn test_every_other_name_selects_average_pooling() {
        for name in ["average", "avg", "", "MAX", "Max ", "unknown"] {
            let out = pool_layer(square([1.0, 2.0, 3.0, 4.0]), name, 2, PaddingMode::Same);
            assert_eq!(scalar(out), 2.5, "method name {name:?}");
        }
    }

    #[test]
    fn test_same_padding_rounds_odd_sizes_up() {
        let x   = Tensor::<TestBackend, 4>::ones([2, 3, 7, 7], &Default::default());
        let max = pool_layer(x.clone(), "max", 2, PaddingMode::Same);
        assert_eq!(max.dims(), [2, 3, 4, 4]);

        // padded cells are excluded from the mean
        let avg = pool_layer(x, "average", 2, PaddingMode::Same);
        assert_eq!(avg.dims(), [2, 3, 4, 4]);
        let values = avg.into_data().to_vec::<f32>().unwrap();
        assert!(values.iter().all(|v| (*v - 1.0).abs() < 1e-6));
    }

    #[test]
    fn test_valid_padding_floors_odd_sizes() {
        let x = Tensor::<TestBackend, 4>::ones([1, 1, 7, 7], &Default::default());
        assert_eq!(pool_layer(x, "max", 2, PaddingMode::Valid).dims(), [1, 1, 3, 3]);
    }

    /// 3x3 map holding 0..9 row by row.
    fn ramp() -> Tensor<TestBackend, 4> {
        Tensor::<TestBackend, 1>::from_floats([0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0], &Default::default())
            .reshape([1, 1, 3, 3])
    }

    #[test]
    fn test_same_padding_goes_after_the_image() {
        // windows cover rows/cols {0,1} and {2,pad}
        let max = pool_layer(ramp(), "max", 2, PaddingMode::Same);
        assert_eq!(max.into_data().to_vec::<f32>().unwrap(), vec![4.0, 5.0, 7.0, 8.0]);

        let avg = pool_layer(ramp(), "average", 2, PaddingMode::Same);
        assert_eq!(avg.into_data().to_vec::<f32>().unwrap(), vec![2.0, 3.5, 6.5, 8.0]);
    }

    #[test]
    fn test_padded_max_pool_stays_finite_with_negative_inputs() {
        let x   = ramp().neg();
        let out = pool_layer(x, "max", 2, PaddingMode::Same).into_data().to_vec::<f32>().unwrap();
        assert_eq!(out, vec![0.0, -2.0, -6.0, -8.0]);
    }
}
