// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

use crate::error::{Error, Result};
use crate::image::PixelImage;

fn check_same_shape(a: &PixelImage, b: &PixelImage) -> Result<()> {
    if (a.width(), a.height(), a.channels()) != (b.width(), b.height(), b.channels()) {
        return Err(Error::InvalidPixelData {
            expected: a.samples().len(),
            actual: b.samples().len(),
        });
    }
    Ok(())
}

/// Mean squared error over all samples of all channels. Zero for empty
/// images.
pub fn mse(a: &PixelImage, b: &PixelImage) -> Result<f64> {
    check_same_shape(a, b)?;
    let n = a.samples().len();
    if n == 0 {
        return Ok(0.0);
    }
    let sum: u64 = a
        .samples()
        .iter()
        .zip(b.samples())
        .map(|(&x, &y)| {
            let d = x.abs_diff(y) as u64;
            d * d
        })
        .sum();
    Ok(sum as f64 / n as f64)
}

/// Peak signal-to-noise ratio in dB for 8-bit samples; `f64::INFINITY`
/// when the images are identical.
pub fn psnr(a: &PixelImage, b: &PixelImage) -> Result<f64> {
    let mse = mse(a, b)?;
    if mse == 0.0 {
        return Ok(f64::INFINITY);
    }
    Ok(10.0 * (255.0 * 255.0 / mse).log10())
}
