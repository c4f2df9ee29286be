// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

//! A lossy still-image codec.
//!
//! Compression converts RGB samples to YCbCr (optionally downsampling the
//! chroma planes), splits every plane into 8x8 blocks, applies a DCT-II,
//! quantizes with a quality-derived step table, reorders the coefficients
//! in zig-zag order, compacts zero runs into `(run, value)` symbols and
//! entropy codes the symbols with a canonical Huffman code. The result is
//! wrapped in a small private container format.
//!
//! ```
//! use mathcompress::{CompressOptions, PixelImage, compress_image, decompress_image};
//!
//! let mut pixels = Vec::new();
//! for y in 0..16u8 {
//!     for x in 0..16u8 {
//!         pixels.extend_from_slice(&[x * 16, y * 16, 128]);
//!     }
//! }
//! let image = PixelImage::new_rgb(16, 16, pixels)?;
//! let container = compress_image(&image, &CompressOptions::new(80, 1)?)?;
//! let decoded = decompress_image(&container)?;
//! assert_eq!((decoded.width(), decoded.height()), (16, 16));
//! # Ok::<(), mathcompress::error::Error>(())
//! ```

#![deny(unsafe_code)]
pub mod bit_reader;
pub mod bit_writer;
pub mod blocks;
pub mod codec;
pub mod color;
pub mod container;
pub mod dct;
pub mod error;
pub mod formats;
pub mod huffman;
pub mod image;
pub mod metrics;
pub mod options;
pub mod quant;
pub mod rle;
pub mod util;
pub mod zigzag;

pub use codec::{
    CompressionStats, compress, compress_image, decompress, decompress_image,
    decompress_image_with_limits, inspect,
};
pub use container::ContainerInfo;
pub use error::{Error, ErrorKind, Result};
pub use image::PixelImage;
pub use options::{CompressOptions, DecodeLimits};

const BLOCK_DIM: usize = 8;
const BLOCK_SIZE: usize = BLOCK_DIM * BLOCK_DIM;
