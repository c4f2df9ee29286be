// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

//! Encoder parameters and decoder resource limits.

use crate::error::{Error, Result};
use crate::quant::{MAX_QUALITY, MIN_QUALITY};

pub const MIN_DOWNSAMPLE: u8 = 1;
pub const MAX_DOWNSAMPLE: u8 = 8;

/// Parameters of a single compression call.
///
/// # Example
///
/// ```
/// use mathcompress::CompressOptions;
///
/// let options = CompressOptions::default();
/// assert_eq!((options.quality, options.downsample), (50, 2));
///
/// assert!(CompressOptions::new(0, 1).is_err());
/// assert!(CompressOptions::new(90, 9).is_err());
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CompressOptions {
    /// Quantization quality in `[1, 100]`; higher keeps more detail.
    pub quality: u8,
    /// Chroma downsampling factor in `[1, 8]`; 1 keeps full resolution.
    /// Ignored for grayscale images.
    pub downsample: u8,
}

impl Default for CompressOptions {
    fn default() -> Self {
        Self {
            quality: 50,
            downsample: 2,
        }
    }
}

impl CompressOptions {
    pub fn new(quality: u8, downsample: u8) -> Result<Self> {
        let options = Self {
            quality,
            downsample,
        };
        options.validate()?;
        Ok(options)
    }

    /// Checks that every field is in range. Called by the encoder before it
    /// touches any pixel, since the fields are public.
    pub fn validate(&self) -> Result<()> {
        if !(MIN_QUALITY..=MAX_QUALITY).contains(&self.quality) {
            return Err(Error::InvalidQuality(self.quality as u32));
        }
        if !(MIN_DOWNSAMPLE..=MAX_DOWNSAMPLE).contains(&self.downsample) {
            return Err(Error::InvalidDownsample(self.downsample as u32));
        }
        Ok(())
    }
}

/// Resource limits applied while decompressing a container.
///
/// By default nothing is limited. Use [`DecodeLimits::default_safe()`] for
/// containers from untrusted sources.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DecodeLimits {
    /// Maximum `width * height` of the decoded image.
    /// Default: `None` (unlimited).
    /// Recommended safe: `1 << 28`.
    pub max_pixels: Option<usize>,
}

impl DecodeLimits {
    /// Limits suitable for containers of unknown origin.
    pub fn default_safe() -> Self {
        Self {
            max_pixels: Some(1 << 28),
        }
    }

    pub(crate) fn check_size(&self, width: usize, height: usize) -> Result<()> {
        let pixels = width
            .checked_mul(height)
            .ok_or(Error::ImageSizeTooLarge(width, height))?;
        if self.max_pixels.is_some_and(|max| pixels > max) {
            return Err(Error::ImageSizeTooLarge(width, height));
        }
        Ok(())
    }
}
