// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

//! Source and output pixel formats at the codec boundary.

use crate::error::{Error, Result};
use crate::image::PixelImage;

pub mod png;
pub mod pnm;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Png,
    Pnm,
}

impl SourceFormat {
    /// Identifies a file by its leading bytes.
    pub fn sniff(data: &[u8]) -> Option<SourceFormat> {
        if data.starts_with(&png::SIGNATURE) {
            Some(SourceFormat::Png)
        } else if data.starts_with(b"P5") || data.starts_with(b"P6") {
            Some(SourceFormat::Pnm)
        } else {
            None
        }
    }
}

/// Decodes a PNG or binary PNM file into 8-bit gray or RGB samples.
pub fn decode_image(data: &[u8]) -> Result<PixelImage> {
    match SourceFormat::sniff(data) {
        Some(SourceFormat::Png) => png::decode(data),
        Some(SourceFormat::Pnm) => pnm::decode(data),
        None => Err(Error::UnsupportedImageFormat),
    }
}

#[cfg(test)]
mod test {
    use test_log::test;

    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn sniffing() {
        assert_eq!(
            SourceFormat::sniff(b"\x89PNG\r\n\x1a\n...."),
            Some(SourceFormat::Png)
        );
        assert_eq!(SourceFormat::sniff(b"P6\n1 1\n255\n"), Some(SourceFormat::Pnm));
        assert_eq!(SourceFormat::sniff(b"P3\n"), None);
        assert_eq!(SourceFormat::sniff(b"GIF89a"), None);
        assert_eq!(SourceFormat::sniff(b""), None);
    }

    #[test]
    fn unknown_format() {
        let err = decode_image(b"BM\x00\x00").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidImageFormat);
    }
}
