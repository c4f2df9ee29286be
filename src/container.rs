// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

//! The `MC2v` container.
//!
//! All fields are big-endian:
//!
//! ```text
//! "MC2v" | version u8 | width u32 | height u32 | layout u8 | block size u8
//! | downsample u8 | quality u8 | entries u32 | entries * (symbol u24, length u8)
//! | symbols u32 | bits u64 | ceil(bits / 8) payload bytes
//! ```
//!
//! Code table entries are stored in canonical order, so the codewords
//! themselves are implied by the lengths.

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use num_derive::FromPrimitive;
use num_traits::FromPrimitive;

use crate::BLOCK_DIM;
use crate::error::{Error, Result};
use crate::huffman::CodeTable;
use crate::options::{MAX_DOWNSAMPLE, MIN_DOWNSAMPLE};
use crate::quant::{MAX_QUALITY, MIN_QUALITY};
use crate::rle::{MAX_SYMBOL_ID, Symbol};

pub const SIGNATURE: [u8; 4] = *b"MC2v";
pub const VERSION: u8 = 2;

/// Bytes before the code table entries.
pub const FIXED_HEADER_SIZE: usize = 4 + 1 + 4 + 4 + 4 + 4;

#[repr(u8)]
#[derive(Debug, FromPrimitive, Clone, Copy, PartialEq, Eq)]
pub enum ChannelLayout {
    /// Luma only.
    Gray = 1,
    /// Luma and two chroma planes, the latter possibly downsampled.
    YCbCr = 3,
}

impl ChannelLayout {
    pub fn num_channels(self) -> usize {
        self as usize
    }
}

impl TryFrom<u8> for ChannelLayout {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        Self::from_u8(value).ok_or(Error::InvalidEnum(value as u32, "ChannelLayout".to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub width: u32,
    pub height: u32,
    pub layout: ChannelLayout,
    /// Chroma downsampling factor; always 1 for [`ChannelLayout::Gray`].
    pub downsample: u8,
    pub quality: u8,
}

impl Header {
    fn validate(&self, block_size: u8) -> Result<()> {
        if block_size as usize != BLOCK_DIM {
            return Err(Error::InvalidHeaderField("block size", block_size as u32));
        }
        if !(MIN_DOWNSAMPLE..=MAX_DOWNSAMPLE).contains(&self.downsample)
            || (self.layout == ChannelLayout::Gray && self.downsample != 1)
        {
            return Err(Error::InvalidHeaderField(
                "downsample",
                self.downsample as u32,
            ));
        }
        if !(MIN_QUALITY..=MAX_QUALITY).contains(&self.quality) {
            return Err(Error::InvalidHeaderField("quality", self.quality as u32));
        }
        Ok(())
    }
}

/// A parsed container; the payload borrows from the input.
#[derive(Debug)]
pub struct Container<'a> {
    pub header: Header,
    /// `None` when no symbols were coded (zero-sized images).
    pub table: Option<CodeTable>,
    pub symbol_count: u32,
    pub bit_count: u64,
    pub payload: &'a [u8],
}

/// Writes a complete container. `payload` must hold exactly
/// `ceil(bit_count / 8)` bytes.
pub fn write(
    header: &Header,
    table: Option<&CodeTable>,
    symbol_count: u32,
    bit_count: u64,
    payload: &[u8],
) -> Result<Vec<u8>> {
    header.validate(BLOCK_DIM as u8)?;
    debug_assert_eq!(payload.len() as u64, bit_count.div_ceil(8));
    let entries = table.map_or(&[][..], |t| t.entries());
    let mut out = Vec::with_capacity(FIXED_HEADER_SIZE + 4 * entries.len() + 12 + payload.len());
    out.extend_from_slice(&SIGNATURE);
    out.write_u8(VERSION)?;
    out.write_u32::<BigEndian>(header.width)?;
    out.write_u32::<BigEndian>(header.height)?;
    out.write_u8(header.layout as u8)?;
    out.write_u8(BLOCK_DIM as u8)?;
    out.write_u8(header.downsample)?;
    out.write_u8(header.quality)?;
    out.write_u32::<BigEndian>(entries.len() as u32)?;
    for entry in entries {
        out.write_u24::<BigEndian>(entry.symbol)?;
        out.write_u8(entry.length as u8)?;
    }
    out.write_u32::<BigEndian>(symbol_count)?;
    out.write_u64::<BigEndian>(bit_count)?;
    out.extend_from_slice(payload);
    Ok(out)
}

fn parse_header(data: &mut &[u8]) -> Result<Header> {
    let mut signature = [0u8; 4];
    std::io::Read::read_exact(data, &mut signature)?;
    if signature != SIGNATURE {
        let [a, b, c, d] = signature;
        return Err(Error::InvalidSignature(a, b, c, d));
    }
    let version = data.read_u8()?;
    if version != VERSION {
        return Err(Error::UnsupportedVersion(version));
    }
    let width = data.read_u32::<BigEndian>()?;
    let height = data.read_u32::<BigEndian>()?;
    let layout = ChannelLayout::try_from(data.read_u8()?)?;
    let block_size = data.read_u8()?;
    let header = Header {
        width,
        height,
        layout,
        downsample: data.read_u8()?,
        quality: data.read_u8()?,
    };
    header.validate(block_size)?;
    Ok(header)
}

fn parse_table(data: &mut &[u8]) -> Result<Option<CodeTable>> {
    let num_entries = data.read_u32::<BigEndian>()? as usize;
    if num_entries > MAX_SYMBOL_ID as usize + 1 {
        return Err(Error::InvalidHuffman);
    }
    if data.len() < num_entries * 4 {
        return Err(Error::FileTruncated);
    }
    if num_entries == 0 {
        return Ok(None);
    }
    let mut lengths = Vec::with_capacity(num_entries);
    for _ in 0..num_entries {
        let id = data.read_u24::<BigEndian>()?;
        Symbol::from_id(id)?;
        lengths.push((id, data.read_u8()? as u32));
    }
    CodeTable::from_canonical_lengths(&lengths).map(Some)
}

/// Parses and validates everything but the payload bits themselves.
pub fn parse(mut data: &[u8]) -> Result<Container<'_>> {
    let header = parse_header(&mut data)?;
    let table = parse_table(&mut data)?;
    let symbol_count = data.read_u32::<BigEndian>()?;
    let bit_count = data.read_u64::<BigEndian>()?;
    if table.is_none() && symbol_count != 0 {
        return Err(Error::InvalidHuffman);
    }
    if symbol_count == 0 && bit_count != 0 {
        return Err(Error::BitCountMismatch {
            declared: bit_count,
            consumed: 0,
        });
    }
    let payload_len = usize::try_from(bit_count.div_ceil(8)).map_err(|_| Error::SizeOverflow)?;
    if data.len() < payload_len {
        return Err(Error::PayloadTruncated {
            declared: bit_count,
            available: data.len() as u64 * 8,
        });
    }
    if data.len() > payload_len {
        return Err(Error::TrailingData(data.len() - payload_len));
    }
    Ok(Container {
        header,
        table,
        symbol_count,
        bit_count,
        payload: data,
    })
}

/// What [`crate::inspect`] reports about a container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerInfo {
    pub width: u32,
    pub height: u32,
    pub layout: ChannelLayout,
    pub block_size: u8,
    pub downsample: u8,
    pub quality: u8,
    /// Number of distinct symbols in the code table.
    pub alphabet_size: usize,
    pub max_code_length: u32,
    pub symbol_count: u32,
    pub bit_count: u64,
    pub container_size: usize,
}

impl ContainerInfo {
    pub fn new(container: &Container<'_>, container_size: usize) -> ContainerInfo {
        let header = &container.header;
        ContainerInfo {
            width: header.width,
            height: header.height,
            layout: header.layout,
            block_size: BLOCK_DIM as u8,
            downsample: header.downsample,
            quality: header.quality,
            alphabet_size: container.table.as_ref().map_or(0, CodeTable::len),
            max_code_length: container.table.as_ref().map_or(0, CodeTable::max_length),
            symbol_count: container.symbol_count,
            bit_count: container.bit_count,
            container_size,
        }
    }
}
