// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

use crate::{BLOCK_DIM, BLOCK_SIZE};

/// `ZIGZAG[k]` is the row-major index of the `k`-th coefficient in scan order.
pub const ZIGZAG: [u8; BLOCK_SIZE] = zigzag_order();

/// `INVERSE_ZIGZAG[i]` is the scan position of row-major index `i`.
pub const INVERSE_ZIGZAG: [u8; BLOCK_SIZE] = invert(&ZIGZAG);

/// Walks the anti-diagonals `r + c = s`, alternating direction: even
/// diagonals go up and to the right, odd ones down and to the left.
const fn zigzag_order() -> [u8; BLOCK_SIZE] {
    let mut out = [0u8; BLOCK_SIZE];
    let mut k = 0;
    let mut s = 0;
    while s < 2 * BLOCK_DIM - 1 {
        let lo = if s >= BLOCK_DIM { s - (BLOCK_DIM - 1) } else { 0 };
        let hi = if s < BLOCK_DIM { s } else { BLOCK_DIM - 1 };
        let mut i = 0;
        while i <= hi - lo {
            let r = if s % 2 == 0 { hi - i } else { lo + i };
            let c = s - r;
            out[k] = (r * BLOCK_DIM + c) as u8;
            k += 1;
            i += 1;
        }
        s += 1;
    }
    assert!(k == BLOCK_SIZE);
    out
}

const fn invert(order: &[u8; BLOCK_SIZE]) -> [u8; BLOCK_SIZE] {
    let mut out = [0u8; BLOCK_SIZE];
    let mut k = 0;
    while k < BLOCK_SIZE {
        out[order[k] as usize] = k as u8;
        k += 1;
    }
    out
}

/// Reorders a row-major block into scan order.
pub fn zigzag<T: Copy>(block: &[T; BLOCK_SIZE]) -> [T; BLOCK_SIZE] {
    std::array::from_fn(|k| block[ZIGZAG[k] as usize])
}

/// Restores row-major order from a scan-ordered sequence.
pub fn unzigzag<T: Copy>(scan: &[T; BLOCK_SIZE]) -> [T; BLOCK_SIZE] {
    std::array::from_fn(|i| scan[INVERSE_ZIGZAG[i] as usize])
}
