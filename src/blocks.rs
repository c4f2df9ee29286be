// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

//! Splitting planes into 8x8 blocks and reassembling them.

use crate::image::Image;
use crate::{BLOCK_DIM, BLOCK_SIZE};

/// Subtracted from every sample before the forward transform so that the
/// block values are centered on zero.
pub const LEVEL_SHIFT: f32 = 128.0;

/// Position of a block: plane index and block coordinates within it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockPos {
    pub plane: usize,
    pub bx: usize,
    pub by: usize,
}

/// Number of blocks covering a plane of `size` samples, horizontally and
/// vertically. Partial blocks count.
pub fn blocks_in(size: (usize, usize)) -> (usize, usize) {
    (size.0.div_ceil(BLOCK_DIM), size.1.div_ceil(BLOCK_DIM))
}

/// Total number of blocks covering `sizes`, or `None` on overflow.
pub fn block_count(sizes: &[(usize, usize)]) -> Option<usize> {
    sizes.iter().try_fold(0usize, |total, &size| {
        let (xblocks, yblocks) = blocks_in(size);
        total.checked_add(xblocks.checked_mul(yblocks)?)
    })
}

/// Every block of every plane, in coding order: plane by plane, blocks in
/// row-major order within a plane.
pub fn block_positions(sizes: &[(usize, usize)]) -> Vec<BlockPos> {
    let mut out = Vec::with_capacity(block_count(sizes).unwrap_or(0));
    for (plane, &size) in sizes.iter().enumerate() {
        let (xblocks, yblocks) = blocks_in(size);
        if xblocks == 0 {
            continue;
        }
        for by in 0..yblocks {
            for bx in 0..xblocks {
                out.push(BlockPos { plane, bx, by });
            }
        }
    }
    out
}

/// Copies a level-shifted block out of `plane`. Positions past the right or
/// bottom edge repeat the last column or row.
pub fn extract(plane: &Image<f32>, bx: usize, by: usize) -> [f32; BLOCK_SIZE] {
    let (x0, y0) = ((bx * BLOCK_DIM) as isize, (by * BLOCK_DIM) as isize);
    array_init::array_init(|i| {
        let (dx, dy) = ((i % BLOCK_DIM) as isize, (i / BLOCK_DIM) as isize);
        plane.get_clamped(x0 + dx, y0 + dy) - LEVEL_SHIFT
    })
}

/// Writes a level-shifted block back into `plane`, dropping the samples
/// that fall outside it.
pub fn store(plane: &mut Image<f32>, bx: usize, by: usize, block: &[f32; BLOCK_SIZE]) {
    let (xsize, ysize) = plane.size();
    let (x0, y0) = (bx * BLOCK_DIM, by * BLOCK_DIM);
    let width = BLOCK_DIM.min(xsize.saturating_sub(x0));
    for dy in 0..BLOCK_DIM.min(ysize.saturating_sub(y0)) {
        let src = &block[dy * BLOCK_DIM..][..width];
        for (out, v) in plane.row_mut(y0 + dy)[x0..x0 + width].iter_mut().zip(src) {
            *out = v + LEVEL_SHIFT;
        }
    }
}

/// Applies `f` to every item, on the rayon pool when the `parallel` feature
/// is enabled. Results keep the order of `items`.
pub fn map_blocks<T, U, F>(items: &[T], f: F) -> Vec<U>
where
    T: Sync,
    U: Send,
    F: Fn(&T) -> U + Sync + Send,
{
    #[cfg(feature = "parallel")]
    {
        use rayon::prelude::*;
        items.par_iter().map(f).collect()
    }
    #[cfg(not(feature = "parallel"))]
    {
        items.iter().map(f).collect()
    }
}

#[cfg(test)]
mod test {
    use test_log::test;

    use super::*;
    use crate::error::Result;

    fn ramp(size: (usize, usize)) -> Result<Image<f32>> {
        let mut image = Image::new(size)?;
        for y in 0..size.1 {
            for (x, v) in image.row_mut(y).iter_mut().enumerate() {
                *v = (y * 100 + x) as f32;
            }
        }
        Ok(image)
    }

    #[test]
    fn positions() {
        assert_eq!(blocks_in((0, 5)), (0, 1));
        assert_eq!(blocks_in((8, 9)), (1, 2));
        let positions = block_positions(&[(17, 8), (0, 0), (9, 1)]);
        let as_tuples: Vec<_> = positions.iter().map(|p| (p.plane, p.bx, p.by)).collect();
        assert_eq!(
            as_tuples,
            [(0, 0, 0), (0, 1, 0), (0, 2, 0), (2, 0, 0), (2, 1, 0)]
        );
        assert_eq!(block_count(&[(17, 8), (0, 0), (9, 1)]), Some(5));
    }

    #[test]
    fn block_count_overflow() {
        assert_eq!(block_count(&[(0, usize::MAX)]), Some(0));
        assert_eq!(block_count(&[(usize::MAX, usize::MAX)]), None);
        // Each plane alone fits; the sum does not.
        let wide = (usize::MAX, 4 * BLOCK_DIM);
        assert!(block_count(&[wide]).is_some());
        assert_eq!(block_count(&[wide, wide]), None);
        assert!(block_positions(&[(0, usize::MAX)]).is_empty());
    }

    #[test]
    fn edge_replication() -> Result<()> {
        let plane = ramp((10, 3))?;
        let block = extract(&plane, 1, 0);
        // Columns 8 and 9 exist, the rest repeats column 9.
        assert_eq!(block[0] + LEVEL_SHIFT, 8.0);
        assert_eq!(block[1] + LEVEL_SHIFT, 9.0);
        assert_eq!(block[7] + LEVEL_SHIFT, 9.0);
        // Rows past 2 repeat row 2.
        assert_eq!(block[7 * BLOCK_DIM] + LEVEL_SHIFT, 208.0);
        Ok(())
    }

    #[test]
    fn extract_store_roundtrip() -> Result<()> {
        let size = (13, 11);
        let plane = ramp(size)?;
        let mut out = Image::new(size)?;
        for pos in block_positions(&[size]) {
            store(&mut out, pos.bx, pos.by, &extract(&plane, pos.bx, pos.by));
        }
        assert_eq!(out.as_slice(), plane.as_slice());
        Ok(())
    }

    #[test]
    fn map_keeps_order() {
        let items: Vec<usize> = (0..1000).collect();
        let squares = map_blocks(&items, |&i| i * i);
        assert!(squares.iter().enumerate().all(|(i, &s)| s == i * i));
    }
}
