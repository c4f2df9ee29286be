// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

//! End-to-end compression and decompression.

use crate::bit_reader::BitReader;
use crate::bit_writer::BitWriter;
use crate::blocks::{self, BlockPos};
use crate::color;
use crate::container::{self, ChannelLayout, Container, ContainerInfo, Header};
use crate::dct::{forward_dct, inverse_dct};
use crate::error::{Error, Result};
use crate::formats;
use crate::huffman::{CodeTable, Histogram};
use crate::image::{Image, MAX_PLANE_SAMPLES, PixelImage};
use crate::metrics;
use crate::options::{CompressOptions, DecodeLimits};
use crate::quant::{PlaneTables, QuantTable};
use crate::rle::{self, Symbol};
use crate::util::tracing_wrappers::*;
use crate::zigzag::{unzigzag, zigzag};
use crate::BLOCK_SIZE;

/// Summary of one [`compress`] call.
#[derive(Debug, Clone, PartialEq)]
pub struct CompressionStats {
    /// Size of the source file in bytes.
    pub original_size: usize,
    /// Size of the container in bytes.
    pub compressed_size: usize,
    /// `original_size / compressed_size`.
    pub ratio: f64,
    /// Percentage of the original size saved; negative if the container is
    /// larger than the source file.
    pub space_saving: f64,
    /// PSNR in dB of the decoded container against the source samples.
    pub psnr: f64,
    pub payload_bits: u64,
    pub symbol_count: u32,
    pub alphabet_size: usize,
}

struct Encoded {
    container: Vec<u8>,
    payload_bits: u64,
    symbol_count: u32,
    alphabet_size: usize,
}

fn as_three(planes: &mut [Image<f32>]) -> Result<&mut [Image<f32>; 3]> {
    let actual = planes.len();
    planes
        .try_into()
        .map_err(|_| Error::InvalidPixelData {
            expected: 3,
            actual,
        })
}

/// Sizes of the coded planes: full-size luma, then the chroma planes at
/// their downsampled size.
fn plane_sizes(layout: ChannelLayout, size: (usize, usize), downsample: usize) -> Vec<(usize, usize)> {
    let chroma = color::downsampled_size(size, downsample);
    match layout {
        ChannelLayout::Gray => vec![size],
        ChannelLayout::YCbCr => vec![size, chroma, chroma],
    }
}

fn encode_block(plane: &Image<f32>, table: &QuantTable, pos: &BlockPos) -> Vec<Symbol> {
    let mut block = blocks::extract(plane, pos.bx, pos.by);
    forward_dct(&mut block);
    let symbols = rle::encode(&zigzag(&table.quantize(&block)));
    trace!(?pos, symbols = symbols.len(), "encoded block");
    symbols
}

fn decode_block(scan: &[i16; BLOCK_SIZE], table: &QuantTable) -> [f32; BLOCK_SIZE] {
    let mut block = table.dequantize(&unzigzag(scan));
    inverse_dct(&mut block);
    block
}

fn encode(image: &PixelImage, options: &CompressOptions) -> Result<Encoded> {
    options.validate()?;
    let (width, height) = (image.width(), image.height());
    let (Ok(width32), Ok(height32)) = (u32::try_from(width), u32::try_from(height)) else {
        return Err(Error::ImageSizeTooLarge(width, height));
    };
    let (layout, downsample) = if image.is_gray() {
        (ChannelLayout::Gray, 1)
    } else {
        (ChannelLayout::YCbCr, options.downsample)
    };

    let mut planes = image.planes()?;
    if layout == ChannelLayout::YCbCr {
        let ycbcr = as_three(&mut planes)?;
        color::rgb_to_ycbcr(ycbcr);
        for chroma in &mut ycbcr[1..] {
            *chroma = color::downsample(chroma, downsample as usize)?;
        }
    }
    let sizes: Vec<_> = planes.iter().map(|p| p.size()).collect();
    let positions = blocks::block_positions(&sizes);
    debug!(
        width,
        height,
        ?layout,
        downsample,
        quality = options.quality,
        blocks = positions.len(),
        "compressing"
    );

    let tables = PlaneTables::for_quality(options.quality)?;
    let per_block = blocks::map_blocks(&positions, |pos| {
        encode_block(&planes[pos.plane], tables.for_plane(pos.plane), pos)
    });

    let mut histogram = Histogram::new();
    for symbols in &per_block {
        histogram.add_symbols(symbols);
    }
    let symbol_count = u32::try_from(histogram.total())
        .map_err(|_| Error::ImageSizeTooLarge(width, height))?;
    let header = Header {
        width: width32,
        height: height32,
        layout,
        downsample,
        quality: options.quality,
    };
    if symbol_count == 0 {
        let container = container::write(&header, None, 0, 0, &[])?;
        return Ok(Encoded {
            container,
            payload_bits: 0,
            symbol_count: 0,
            alphabet_size: 0,
        });
    }

    let table = CodeTable::from_histogram(&histogram)?;
    let mut writer = BitWriter::with_capacity(
        table
            .encoded_bits(&histogram)
            .map_or(0, |bits| bits.div_ceil(8) as usize),
    );
    let mut payload_bits = 0;
    for symbols in &per_block {
        payload_bits += table.encode(symbols, &mut writer)?;
    }
    let payload = writer.finalize();
    debug!(
        symbol_count,
        alphabet_size = table.len(),
        payload_bits,
        "entropy coded"
    );
    let container = container::write(&header, Some(&table), symbol_count, payload_bits, &payload)?;
    Ok(Encoded {
        container,
        payload_bits,
        symbol_count,
        alphabet_size: table.len(),
    })
}

/// Compresses an in-memory image.
pub fn compress_image(image: &PixelImage, options: &CompressOptions) -> Result<Vec<u8>> {
    Ok(encode(image, options)?.container)
}

/// Compresses a PNG or binary PNM file. The parameters are validated before
/// the file is looked at.
pub fn compress(
    raw_image: &[u8],
    quality: u8,
    downsample: u8,
) -> Result<(Vec<u8>, CompressionStats)> {
    let options = CompressOptions::new(quality, downsample)?;
    let image = formats::decode_image(raw_image)?;
    let encoded = encode(&image, &options)?;
    let decoded = decompress_image(&encoded.container)?;
    let original_size = raw_image.len();
    let compressed_size = encoded.container.len();
    let stats = CompressionStats {
        original_size,
        compressed_size,
        ratio: original_size as f64 / compressed_size as f64,
        space_saving: if original_size == 0 {
            0.0
        } else {
            (1.0 - compressed_size as f64 / original_size as f64) * 100.0
        },
        psnr: metrics::psnr(&image, &decoded)?,
        payload_bits: encoded.payload_bits,
        symbol_count: encoded.symbol_count,
        alphabet_size: encoded.alphabet_size,
    };
    debug!(?stats, "compressed");
    Ok((encoded.container, stats))
}

/// Checks the header's plane sizes against the declared symbol count before
/// anything is allocated, returning the number of blocks. Every block codes
/// to between one and [`BLOCK_SIZE`] symbols.
fn check_block_count(container: &Container<'_>, sizes: &[(usize, usize)]) -> Result<usize> {
    for &(xsize, ysize) in sizes {
        if xsize.checked_mul(ysize).is_none_or(|n| n > MAX_PLANE_SAMPLES) {
            return Err(Error::PlaneTooLarge(xsize, ysize));
        }
    }
    let num_blocks = blocks::block_count(sizes).ok_or(Error::SizeOverflow)?;
    let declared = container.symbol_count as u64;
    let blocks = num_blocks as u64;
    if declared < blocks || declared > blocks.saturating_mul(BLOCK_SIZE as u64) {
        return Err(Error::SymbolCountOutOfRange { declared, blocks });
    }
    Ok(num_blocks)
}

/// Entropy decodes exactly `symbol_count` symbols, then checks that they
/// span the declared number of bits and that the padding is zero.
fn read_symbols(container: &Container<'_>, num_blocks: usize) -> Result<Vec<Symbol>> {
    let Some(table) = &container.table else {
        return Ok(Vec::new());
    };
    let bit_count = container.bit_count;
    let mismatch = |consumed: usize| Error::BitCountMismatch {
        declared: bit_count,
        consumed: consumed as u64,
    };
    // Every symbol takes at least one bit.
    let capacity = (container.symbol_count as u64)
        .min(bit_count)
        .min(num_blocks.saturating_mul(BLOCK_SIZE) as u64) as usize;
    let mut symbols = Vec::with_capacity(capacity);
    let decoder = table.decoder();
    let mut br = BitReader::with_limit(container.payload, bit_count as usize);
    for _ in 0..container.symbol_count {
        let id = decoder.read(&mut br).map_err(|err| match err {
            Error::OutOfBounds => mismatch(br.total_bits_read()),
            err => err,
        })?;
        symbols.push(Symbol::from_id(id)?);
    }
    if br.total_bits_read() as u64 != bit_count {
        return Err(mismatch(br.total_bits_read()));
    }
    br.jump_to_byte_boundary()?;
    Ok(symbols)
}

/// Decompresses a container into 8-bit samples, refusing images larger than
/// `limits` allow.
pub fn decompress_image_with_limits(data: &[u8], limits: &DecodeLimits) -> Result<PixelImage> {
    let container = container::parse(data)?;
    let header = container.header;
    let size = (header.width as usize, header.height as usize);
    limits.check_size(size.0, size.1)?;
    let downsample = header.downsample as usize;
    let sizes = plane_sizes(header.layout, size, downsample);
    let num_blocks = check_block_count(&container, &sizes)?;
    debug!(
        width = size.0,
        height = size.1,
        layout = ?header.layout,
        downsample,
        quality = header.quality,
        blocks = num_blocks,
        "decompressing"
    );

    let symbols = read_symbols(&container, num_blocks)?;
    let mut iter = symbols.iter().copied();
    let scans = (0..num_blocks)
        .map(|i| rle::decode_block(&mut iter, i))
        .collect::<Result<Vec<_>>>()?;
    let left_over = iter.count();
    if left_over != 0 {
        return Err(Error::SymbolCountMismatch {
            declared: container.symbol_count as u64,
            consumed: (symbols.len() - left_over) as u64,
        });
    }
    if num_blocks == 0 {
        return match header.layout {
            ChannelLayout::Gray => PixelImage::new_gray(size.0, size.1, Vec::new()),
            ChannelLayout::YCbCr => PixelImage::new_rgb(size.0, size.1, Vec::new()),
        };
    }

    let tables = PlaneTables::for_quality(header.quality)?;
    let positions = blocks::block_positions(&sizes);
    let coded: Vec<(BlockPos, [i16; BLOCK_SIZE])> = positions.into_iter().zip(scans).collect();
    let decoded = blocks::map_blocks(&coded, |(pos, scan)| {
        decode_block(scan, tables.for_plane(pos.plane))
    });
    let mut planes = sizes
        .iter()
        .map(|&size| Image::new(size))
        .collect::<Result<Vec<_>>>()?;
    for ((pos, _), block) in coded.iter().zip(&decoded) {
        blocks::store(&mut planes[pos.plane], pos.bx, pos.by, block);
    }

    if header.layout == ChannelLayout::YCbCr {
        let ycbcr = as_three(&mut planes)?;
        for chroma in &mut ycbcr[1..] {
            *chroma = color::upsample(chroma, downsample, size)?;
        }
        color::ycbcr_to_rgb(ycbcr);
    }
    PixelImage::from_planes(&planes)
}

/// Decompresses a container into 8-bit samples, without size limits.
pub fn decompress_image(data: &[u8]) -> Result<PixelImage> {
    decompress_image_with_limits(data, &DecodeLimits::default())
}

/// Decompresses a container into a PNG file.
pub fn decompress(data: &[u8]) -> Result<Vec<u8>> {
    formats::png::encode(&decompress_image(data)?)
}

/// Reads the header and code table of a container without decoding the
/// payload.
pub fn inspect(data: &[u8]) -> Result<ContainerInfo> {
    let container = container::parse(data)?;
    Ok(ContainerInfo::new(&container, data.len()))
}

#[cfg(test)]
mod test {
    use test_log::test;

    use super::*;
    use crate::container::FIXED_HEADER_SIZE;
    use crate::error::ErrorKind;
    use crate::util::test::{gradient_image, max_abs_diff, noisy_image};

    fn options(quality: u8, downsample: u8) -> CompressOptions {
        CompressOptions::new(quality, downsample).unwrap()
    }

    #[test]
    fn gradient_roundtrip() -> Result<()> {
        let image = gradient_image(16, 16);
        let container = compress_image(&image, &options(60, 1))?;
        assert!(!container.is_empty());
        assert!(container.len() < 16 * 16 * 3);
        let decoded = decompress_image(&container)?;
        assert_eq!((decoded.width(), decoded.height()), (16, 16));
        assert!(!decoded.is_gray());
        Ok(())
    }

    #[test]
    fn high_quality_is_close() -> Result<()> {
        let image = gradient_image(16, 16);
        let decoded = decompress_image(&compress_image(&image, &options(90, 1))?)?;
        assert!(max_abs_diff(&image, &decoded) <= 16);
        assert!(metrics::psnr(&image, &decoded)? > 30.0);
        Ok(())
    }

    #[test]
    fn odd_sizes_are_cropped() -> Result<()> {
        for (w, h) in [(1, 1), (7, 9), (17, 3), (8, 8), (9, 16)] {
            for downsample in [1, 2, 3] {
                let image = gradient_image(w, h);
                let decoded = decompress_image(&compress_image(&image, &options(95, downsample))?)?;
                assert_eq!((decoded.width(), decoded.height()), (w, h));
                // Steep tiny gradients lose chroma detail once downsampled.
                if downsample == 1 {
                    assert!(max_abs_diff(&image, &decoded) <= 24, "{w}x{h}");
                }
            }
        }
        Ok(())
    }

    #[test]
    fn uniform_image_single_symbol() -> Result<()> {
        let image = PixelImage::new_gray(16, 8, vec![128; 16 * 8])?;
        let container = compress_image(&image, &options(50, 1))?;
        let info = inspect(&container)?;
        // Level-shifted 128 is zero: every block is a lone end-of-block.
        assert_eq!(info.alphabet_size, 1);
        assert_eq!(info.symbol_count, 2);
        assert_eq!(info.bit_count, 2);
        assert_eq!(decompress_image(&container)?, image);
        Ok(())
    }

    #[test]
    fn gray_layout() -> Result<()> {
        let image = PixelImage::new_gray(10, 10, (0..100).map(|v| (v * 2) as u8).collect())?;
        let container = compress_image(&image, &options(90, 4))?;
        let info = inspect(&container)?;
        assert_eq!(info.layout, ChannelLayout::Gray);
        assert_eq!(info.downsample, 1);
        let decoded = decompress_image(&container)?;
        assert!(decoded.is_gray());
        assert!(max_abs_diff(&image, &decoded) <= 12);
        Ok(())
    }

    #[test]
    fn zero_sized() -> Result<()> {
        for (w, h) in [(0, 0), (0, 4), (5, 0)] {
            let image = PixelImage::new_rgb(w, h, vec![])?;
            let container = compress_image(&image, &options(50, 2))?;
            let info = inspect(&container)?;
            assert_eq!((info.alphabet_size, info.symbol_count, info.bit_count), (0, 0, 0));
            let decoded = decompress_image(&container)?;
            assert_eq!((decoded.width(), decoded.height()), (w, h));
            let err = decompress(&container).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidImageFormat);
        }
        Ok(())
    }

    #[test]
    fn deterministic_output() -> Result<()> {
        let image = noisy_image(40, 24, 30);
        let a = compress_image(&image, &options(70, 2))?;
        let b = compress_image(&image, &options(70, 2))?;
        assert_eq!(a, b);
        Ok(())
    }

    #[test]
    fn downsampling_shrinks_container() -> Result<()> {
        let image = noisy_image(64, 64, 20);
        let full = compress_image(&image, &options(75, 1))?;
        let half = compress_image(&image, &options(75, 2))?;
        assert!(half.len() < full.len());
        Ok(())
    }

    #[test]
    fn stats() -> Result<()> {
        let image = gradient_image(24, 24);
        let png = formats::png::encode(&image)?;
        let (container, stats) = compress(&png, 80, 2)?;
        assert_eq!(stats.original_size, png.len());
        assert_eq!(stats.compressed_size, container.len());
        assert!((stats.ratio - png.len() as f64 / container.len() as f64).abs() < 1e-12);
        assert!(stats.psnr > 25.0);
        assert_eq!(stats.symbol_count, inspect(&container)?.symbol_count);
        assert!(stats.alphabet_size > 1);
        Ok(())
    }

    #[test]
    fn parameters_checked_before_decoding() {
        for (q, d) in [(0, 1), (101, 1), (50, 0), (50, 9)] {
            let err = compress(b"not an image", q, d).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidParameter);
        }
        let err = compress(b"not an image", 50, 2).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidImageFormat);
    }

    #[test]
    fn limits() -> Result<()> {
        let container = compress_image(&gradient_image(32, 32), &options(50, 2))?;
        let tight = DecodeLimits {
            max_pixels: Some(32 * 32 - 1),
        };
        assert!(matches!(
            decompress_image_with_limits(&container, &tight),
            Err(Error::ImageSizeTooLarge(32, 32))
        ));
        assert!(decompress_image_with_limits(&container, &DecodeLimits::default_safe()).is_ok());
        Ok(())
    }

    fn empty_header(width: u32, height: u32, layout: ChannelLayout) -> Result<Vec<u8>> {
        let downsample = if layout == ChannelLayout::Gray { 1 } else { 2 };
        let header = Header {
            width,
            height,
            layout,
            downsample,
            quality: 50,
        };
        container::write(&header, None, 0, 0, &[])
    }

    #[test]
    fn oversized_headers_fail_before_allocating() -> Result<()> {
        for layout in [ChannelLayout::Gray, ChannelLayout::YCbCr] {
            for (w, h) in [(u32::MAX, u32::MAX), (65536, 65536), (u32::MAX, 1)] {
                let data = empty_header(w, h, layout)?;
                assert_eq!(data.len(), FIXED_HEADER_SIZE + 12);
                let err = decompress_image(&data).unwrap_err();
                assert!(matches!(err, Error::PlaneTooLarge(..)), "{w}x{h}: {err}");
                assert_eq!(err.kind(), ErrorKind::CorruptContainer);
            }
        }
        Ok(())
    }

    #[test]
    fn symbol_count_must_cover_blocks() -> Result<()> {
        let data = empty_header(4096, 4096, ChannelLayout::Gray)?;
        let err = decompress_image(&data).unwrap_err();
        assert!(
            matches!(
                err,
                Error::SymbolCountOutOfRange {
                    declared: 0,
                    blocks: 262144
                }
            ),
            "{err}"
        );

        // One block never codes to more than 64 symbols.
        let container = compress_image(&noisy_image(8, 8, 40), &options(95, 1))?;
        let info = inspect(&container)?;
        let symbols_offset = container.len() - info.bit_count.div_ceil(8) as usize - 12;
        let mut inflated = container.clone();
        inflated[symbols_offset..symbols_offset + 4].copy_from_slice(&65u32.to_be_bytes());
        let err = decompress_image(&inflated).unwrap_err();
        assert!(
            matches!(
                err,
                Error::SymbolCountOutOfRange {
                    declared: 65,
                    blocks: 1
                }
            ),
            "{err}"
        );
        Ok(())
    }

    #[test]
    fn declared_counts_are_enforced() -> Result<()> {
        let container = compress_image(&gradient_image(16, 16), &options(60, 1))?;
        let info = inspect(&container)?;
        let payload_len = info.bit_count.div_ceil(8) as usize;
        let symbols_offset = container.len() - payload_len - 12;

        let mut fewer = container.clone();
        fewer[symbols_offset..symbols_offset + 4]
            .copy_from_slice(&(info.symbol_count - 1).to_be_bytes());
        let err = decompress_image(&fewer).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CorruptContainer, "{err}");

        let mut more = container.clone();
        more[symbols_offset..symbols_offset + 4]
            .copy_from_slice(&(info.symbol_count + 1).to_be_bytes());
        let err = decompress_image(&more).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CorruptContainer, "{err}");
        Ok(())
    }
}
