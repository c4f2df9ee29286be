// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

//! Binary PGM (`P5`) and PPM (`P6`) with at most 8 bits per sample.

use crate::error::{Error, Result};
use crate::image::PixelImage;

struct HeaderReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl HeaderReader<'_> {
    fn skip_whitespace_and_comments(&mut self) {
        while let Some(&c) = self.data.get(self.pos) {
            if c == b'#' {
                while self.data.get(self.pos).is_some_and(|&c| c != b'\n') {
                    self.pos += 1;
                }
            } else if c.is_ascii_whitespace() {
                self.pos += 1;
            } else {
                break;
            }
        }
    }

    fn read_number(&mut self, what: &'static str) -> Result<usize> {
        self.skip_whitespace_and_comments();
        let start = self.pos;
        while self.data.get(self.pos).is_some_and(u8::is_ascii_digit) {
            self.pos += 1;
        }
        if start == self.pos {
            return Err(Error::InvalidPnm(what));
        }
        // Only ASCII digits were consumed.
        std::str::from_utf8(&self.data[start..self.pos])
            .ok()
            .and_then(|s| s.parse().ok())
            .ok_or(Error::InvalidPnm(what))
    }
}

pub fn decode(data: &[u8]) -> Result<PixelImage> {
    let channels = match data.get(..2) {
        Some(b"P5") => 1,
        Some(b"P6") => 3,
        _ => return Err(Error::InvalidPnm("magic")),
    };
    let mut header = HeaderReader { data, pos: 2 };
    let width = header.read_number("width")?;
    let height = header.read_number("height")?;
    let maxval = header.read_number("maxval")?;
    if maxval == 0 || maxval > 255 {
        return Err(Error::InvalidPnm("maxval must be in [1, 255]"));
    }
    // Exactly one whitespace byte separates the header from the raster.
    if !data.get(header.pos).is_some_and(u8::is_ascii_whitespace) {
        return Err(Error::InvalidPnm("missing raster"));
    }
    let raster = &data[header.pos + 1..];
    let expected = width
        .checked_mul(height)
        .and_then(|n| n.checked_mul(channels))
        .ok_or(Error::ImageSizeTooLarge(width, height))?;
    if raster.len() < expected {
        return Err(Error::InvalidPnm("truncated raster"));
    }
    let samples: Vec<u8> = raster[..expected]
        .iter()
        .map(|&v| {
            let v = (v as usize).min(maxval);
            ((v * 255 + maxval / 2) / maxval) as u8
        })
        .collect();
    if channels == 1 {
        PixelImage::new_gray(width, height, samples)
    } else {
        PixelImage::new_rgb(width, height, samples)
    }
}
