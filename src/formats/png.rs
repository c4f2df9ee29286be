// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

use std::io::Cursor;

use crate::error::{Error, Result};
use crate::image::PixelImage;
use crate::util::tracing_wrappers::*;

pub const SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', b'\r', b'\n', 0x1a, b'\n'];

fn png_color(num_channels: usize) -> Result<png::ColorType> {
    match num_channels {
        1 => Ok(png::ColorType::Grayscale),
        3 => Ok(png::ColorType::Rgb),
        _ => Err(Error::UnsupportedPngLayout(format!(
            "{num_channels} channels"
        ))),
    }
}

/// Keeps all but the last sample of every `stride`-sample pixel.
fn strip_alpha(samples: &[u8], stride: usize) -> Vec<u8> {
    samples
        .chunks_exact(stride)
        .flat_map(|px| px[..stride - 1].iter().copied())
        .collect()
}

/// Decodes any PNG to 8-bit gray or RGB: palettes and low bit depths are
/// expanded, 16-bit samples are truncated to their high byte and alpha is
/// dropped.
pub fn decode(data: &[u8]) -> Result<PixelImage> {
    let mut decoder = png::Decoder::new(Cursor::new(data));
    decoder.set_transformations(png::Transformations::EXPAND | png::Transformations::STRIP_16);
    let mut reader = decoder.read_info()?;
    let (info_width, info_height) = (reader.info().width as usize, reader.info().height as usize);
    // Every sample is one byte after the transformations above.
    let (color_type, _) = reader.output_color_type();
    let size = info_width
        .checked_mul(info_height)
        .and_then(|n| n.checked_mul(color_type.samples()))
        .ok_or(Error::ImageSizeTooLarge(info_width, info_height))?;
    let mut buf = vec![0; size];
    let frame = reader.next_frame(&mut buf)?;
    buf.truncate(frame.buffer_size());
    let (width, height) = (frame.width as usize, frame.height as usize);
    if frame.bit_depth != png::BitDepth::Eight {
        return Err(Error::UnsupportedPngLayout(format!(
            "bit depth {:?}",
            frame.bit_depth
        )));
    }
    debug!(width, height, color_type = ?frame.color_type, "decoded PNG");
    if matches!(
        frame.color_type,
        png::ColorType::GrayscaleAlpha | png::ColorType::Rgba
    ) {
        debug!("discarding PNG alpha channel");
    }
    match frame.color_type {
        png::ColorType::Grayscale => PixelImage::new_gray(width, height, buf),
        png::ColorType::GrayscaleAlpha => PixelImage::new_gray(width, height, strip_alpha(&buf, 2)),
        png::ColorType::Rgb => PixelImage::new_rgb(width, height, buf),
        png::ColorType::Rgba => PixelImage::new_rgb(width, height, strip_alpha(&buf, 4)),
        png::ColorType::Indexed => Err(Error::UnsupportedPngLayout(
            "palette was not expanded".to_string(),
        )),
    }
}

/// Encodes 8-bit gray or RGB samples as PNG.
pub fn encode(image: &PixelImage) -> Result<Vec<u8>> {
    let (width, height) = (image.width(), image.height());
    if width == 0 || height == 0 {
        return Err(Error::InvalidImageSize(width, height));
    }
    let (Ok(png_width), Ok(png_height)) = (u32::try_from(width), u32::try_from(height)) else {
        return Err(Error::InvalidImageSize(width, height));
    };
    let mut buf = Vec::new();
    let mut encoder = png::Encoder::new(&mut buf, png_width, png_height);
    encoder.set_color(png_color(image.channels())?);
    encoder.set_depth(png::BitDepth::Eight);
    let mut writer = encoder.write_header()?;
    writer.write_image_data(image.samples())?;
    writer.finish()?;
    Ok(buf)
}
