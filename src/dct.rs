// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

//! Orthonormal 8x8 DCT-II and its inverse (DCT-III).
//!
//! The forward transform runs along rows, then along columns; the inverse
//! undoes the columns first. With the orthonormal scaling the coefficient at
//! `(0, 0)` is 8 times the block mean.

use std::f64::consts::{FRAC_1_SQRT_2, PI};
use std::sync::LazyLock;

use crate::{BLOCK_DIM, BLOCK_SIZE};

/// `DCT_MATRIX[u][x] = alpha(u) * cos((2x + 1) * u * pi / 16)`, with
/// `alpha(0) = sqrt(1/8)` and `alpha(u) = sqrt(2/8)` otherwise.
static DCT_MATRIX: LazyLock<[[f32; BLOCK_DIM]; BLOCK_DIM]> = LazyLock::new(|| {
    array_init::array_init(|u| {
        let alpha = (if u == 0 { FRAC_1_SQRT_2 } else { 1.0 }) * (2.0 / BLOCK_DIM as f64).sqrt();
        array_init::array_init(|x| {
            (alpha * ((x as f64 + 0.5) * u as f64 * PI / BLOCK_DIM as f64).cos()) as f32
        })
    })
});

#[inline(always)]
fn dct1d(input: &[f32; BLOCK_DIM], output: &mut [f32; BLOCK_DIM]) {
    let m = &*DCT_MATRIX;
    for (u, out) in output.iter_mut().enumerate() {
        *out = m[u].iter().zip(input).map(|(c, v)| c * v).sum();
    }
}

#[inline(always)]
fn idct1d(input: &[f32; BLOCK_DIM], output: &mut [f32; BLOCK_DIM]) {
    let m = &*DCT_MATRIX;
    for (x, out) in output.iter_mut().enumerate() {
        *out = (0..BLOCK_DIM).map(|u| m[u][x] * input[u]).sum();
    }
}

/// Applies `f` to every row of `block`, then to every column.
fn separable(
    block: &mut [f32; BLOCK_SIZE],
    f: fn(&[f32; BLOCK_DIM], &mut [f32; BLOCK_DIM]),
    rows_first: bool,
) {
    let mut tmp_in = [0.0f32; BLOCK_DIM];
    let mut tmp_out = [0.0f32; BLOCK_DIM];
    let mut pass = |block: &mut [f32; BLOCK_SIZE], rows: bool| {
        for i in 0..BLOCK_DIM {
            for j in 0..BLOCK_DIM {
                tmp_in[j] = if rows { block[i * BLOCK_DIM + j] } else { block[j * BLOCK_DIM + i] };
            }
            f(&tmp_in, &mut tmp_out);
            for j in 0..BLOCK_DIM {
                if rows {
                    block[i * BLOCK_DIM + j] = tmp_out[j];
                } else {
                    block[j * BLOCK_DIM + i] = tmp_out[j];
                }
            }
        }
    };
    pass(block, rows_first);
    pass(block, !rows_first);
}

/// In-place forward 2D DCT of a row-major 8x8 block.
pub fn forward_dct(block: &mut [f32; BLOCK_SIZE]) {
    separable(block, dct1d, true);
}

/// In-place inverse of [`forward_dct`].
pub fn inverse_dct(block: &mut [f32; BLOCK_SIZE]) {
    separable(block, idct1d, false);
}

#[cfg(test)]
mod test {
    use test_log::test;

    use super::*;
    use crate::util::test::{assert_all_almost_eq, assert_almost_eq, test_rng};
    use rand::Rng;

    /// Direct evaluation of the 2D DCT-II sum, in f64.
    fn slow_dct2d(block: &[f32; BLOCK_SIZE]) -> [f64; BLOCK_SIZE] {
        let alpha = |u: usize| if u == 0 { (1.0f64 / 8.0).sqrt() } else { (2.0f64 / 8.0).sqrt() };
        let mut out = [0.0; BLOCK_SIZE];
        for v in 0..8 {
            for u in 0..8 {
                let mut sum = 0.0;
                for y in 0..8 {
                    for x in 0..8 {
                        sum += block[y * 8 + x] as f64
                            * ((2 * x + 1) as f64 * u as f64 * PI / 16.0).cos()
                            * ((2 * y + 1) as f64 * v as f64 * PI / 16.0).cos();
                    }
                }
                out[v * 8 + u] = alpha(u) * alpha(v) * sum;
            }
        }
        out
    }

    fn roundtrip_error(block: &[f32; BLOCK_SIZE]) -> f32 {
        let mut work = *block;
        forward_dct(&mut work);
        inverse_dct(&mut work);
        work.iter()
            .zip(block)
            .map(|(a, b)| (a.round() - b).abs())
            .fold(0.0, f32::max)
    }

    #[test]
    fn matches_direct_sum() {
        let mut rng = test_rng();
        let block: [f32; BLOCK_SIZE] = std::array::from_fn(|_| rng.random_range(-128.0..128.0));
        let mut fast = block;
        forward_dct(&mut fast);
        let slow: Vec<f32> = slow_dct2d(&block).iter().map(|&v| v as f32).collect();
        assert_all_almost_eq!(fast, slow, 1e-2);
    }

    #[test]
    fn dc_of_constant_block() {
        let mut block = [-37.0f32; BLOCK_SIZE];
        forward_dct(&mut block);
        assert_almost_eq!(block[0], -37.0 * 8.0, 1e-3);
        assert_all_almost_eq!(block[1..], [0.0f32; BLOCK_SIZE - 1], 1e-3);
    }

    #[test]
    fn horizontal_ramp_has_only_first_row() {
        let mut block: [f32; BLOCK_SIZE] = std::array::from_fn(|i| (i % 8) as f32 * 16.0 - 64.0);
        forward_dct(&mut block);
        // Energy only in odd horizontal frequencies of the first row.
        for (i, v) in block.iter().enumerate() {
            let (row, col) = (i / 8, i % 8);
            if row != 0 || (col % 2 == 0 && col != 0) {
                assert_almost_eq!(*v, 0.0, 1e-3);
            }
        }
        assert!(block[1].abs() > block[3].abs());
        assert!(block[3].abs() > block[5].abs());
    }

    #[test]
    fn roundtrip_all_zero() {
        assert_eq!(roundtrip_error(&[0.0; BLOCK_SIZE]), 0.0);
    }

    #[test]
    fn roundtrip_all_max() {
        assert_eq!(roundtrip_error(&[127.0; BLOCK_SIZE]), 0.0);
        assert_eq!(roundtrip_error(&[-128.0; BLOCK_SIZE]), 0.0);
    }

    #[test]
    fn roundtrip_random() {
        let mut rng = test_rng();
        for _ in 0..100 {
            let block: [f32; BLOCK_SIZE] =
                std::array::from_fn(|_| rng.random_range(-128..=127) as f32);
            assert!(roundtrip_error(&block) <= 1.0);
        }
    }

    #[test]
    fn roundtrip_sharp_edges() {
        let checker: [f32; BLOCK_SIZE] =
            std::array::from_fn(|i| if (i / 8 + i % 8) % 2 == 0 { 127.0 } else { -128.0 });
        let step: [f32; BLOCK_SIZE] = std::array::from_fn(|i| if i % 8 < 3 { 127.0 } else { -128.0 });
        let diagonal: [f32; BLOCK_SIZE] =
            std::array::from_fn(|i| if i / 8 > i % 8 { 127.0 } else { -128.0 });
        for block in [checker, step, diagonal] {
            assert!(roundtrip_error(&block) <= 1.0);
        }
    }
}
