// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

//! Full-range BT.601 color conversion (JFIF clause 7) and chroma resampling.
//!
//! All planes hold samples in `[0, 255]`; Cb and Cr are centered at 128.

use crate::error::Result;
use crate::image::Image;
use crate::util::tracing_wrappers::*;

const CHROMA_OFFSET: f32 = 128.0;

/// Converts `[R, G, B]` planes to `[Y, Cb, Cr]` in place.
pub fn rgb_to_ycbcr(planes: &mut [Image<f32>; 3]) {
    let [r_plane, g_plane, b_plane] = planes;
    let ysize = r_plane.size().1;
    for y in 0..ysize {
        let (row_r, row_g, row_b) = (r_plane.row_mut(y), g_plane.row_mut(y), b_plane.row_mut(y));
        for x in 0..row_r.len() {
            let (r, g, b) = (row_r[x], row_g[x], row_b[x]);
            let luma = 0.299f32.mul_add(r, 0.587f32.mul_add(g, 0.114 * b));
            row_r[x] = luma;
            row_g[x] = (b - luma).mul_add(0.5 / (1.0 - 0.114), CHROMA_OFFSET);
            row_b[x] = (r - luma).mul_add(0.5 / (1.0 - 0.299), CHROMA_OFFSET);
        }
    }
}

/// Converts `[Y, Cb, Cr]` planes back to `[R, G, B]` in place.
pub fn ycbcr_to_rgb(planes: &mut [Image<f32>; 3]) {
    let [y_plane, cb_plane, cr_plane] = planes;
    let ysize = y_plane.size().1;
    for y in 0..ysize {
        let (row_y, row_cb, row_cr) =
            (y_plane.row_mut(y), cb_plane.row_mut(y), cr_plane.row_mut(y));
        for x in 0..row_y.len() {
            let luma = row_y[x];
            let cb = row_cb[x] - CHROMA_OFFSET;
            let cr = row_cr[x] - CHROMA_OFFSET;
            row_y[x] = cr.mul_add(1.402, luma);
            row_cb[x] = cr.mul_add(
                -0.299 * 1.402 / 0.587,
                cb.mul_add(-0.114 * 1.772 / 0.587, luma),
            );
            row_cr[x] = cb.mul_add(1.772, luma);
        }
    }
}

/// Size of a plane of `size` samples after subsampling by `factor`.
pub fn downsampled_size(size: (usize, usize), factor: usize) -> (usize, usize) {
    (size.0.div_ceil(factor), size.1.div_ceil(factor))
}

/// Averages every `factor`x`factor` neighborhood into one sample. Partial
/// neighborhoods at the right and bottom edges average only the samples
/// that exist.
pub fn downsample(plane: &Image<f32>, factor: usize) -> Result<Image<f32>> {
    if factor == 1 {
        return Ok(plane.clone());
    }
    let (xsize, ysize) = plane.size();
    let out_size = downsampled_size((xsize, ysize), factor);
    let mut out = Image::new(out_size)?;
    for oy in 0..out_size.1 {
        let y_range = oy * factor..((oy + 1) * factor).min(ysize);
        for ox in 0..out_size.0 {
            let x_range = ox * factor..((ox + 1) * factor).min(xsize);
            let count = (y_range.len() * x_range.len()) as f32;
            let sum: f32 = y_range
                .clone()
                .map(|y| plane.row(y)[x_range.clone()].iter().sum::<f32>())
                .sum();
            out.row_mut(oy)[ox] = sum / count;
        }
    }
    trace!(?out_size, factor, "downsampled chroma");
    Ok(out)
}

/// Bilinear upsampling by `factor` back to `size`. Each input sample sits at
/// the center of the neighborhood it was averaged from; coordinates outside
/// the plane are clamped to its edge.
pub fn upsample(plane: &Image<f32>, factor: usize, size: (usize, usize)) -> Result<Image<f32>> {
    if factor == 1 {
        debug_assert_eq!(plane.size(), size);
        return Ok(plane.clone());
    }
    let mut out = Image::new(size)?;
    if plane.size().0 == 0 || plane.size().1 == 0 {
        return Ok(out);
    }
    let inv = 1.0 / factor as f32;
    let source_coord = |p: usize| {
        let s = (p as f32 + 0.5) * inv - 0.5;
        let base = s.floor();
        (base as isize, s - base)
    };
    for y in 0..size.1 {
        let (sy, fy) = source_coord(y);
        for x in 0..size.0 {
            let (sx, fx) = source_coord(x);
            let top = lerp(plane.get_clamped(sx, sy), plane.get_clamped(sx + 1, sy), fx);
            let bottom = lerp(
                plane.get_clamped(sx, sy + 1),
                plane.get_clamped(sx + 1, sy + 1),
                fx,
            );
            out.row_mut(y)[x] = lerp(top, bottom, fy);
        }
    }
    Ok(out)
}

#[inline]
fn lerp(a: f32, b: f32, t: f32) -> f32 {
    (b - a).mul_add(t, a)
}
