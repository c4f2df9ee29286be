// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

use thiserror::Error;

use crate::huffman::MAX_CODE_LENGTH;

#[derive(Error, Debug)]
pub enum Error {
    // Parameter errors
    #[error("Invalid quality {0}, expected a value in [1, 100]")]
    InvalidQuality(u32),
    #[error("Invalid downsample factor {0}, expected a value in [1, 8]")]
    InvalidDownsample(u32),
    #[error("Image size too large: {0}x{1}")]
    ImageSizeTooLarge(usize, usize),
    #[error("Pixel buffer has {actual} samples, expected {expected}")]
    InvalidPixelData { expected: usize, actual: usize },
    #[error("Huffman alphabet is empty")]
    EmptyAlphabet,
    // Source image errors
    #[error("Unrecognized image format")]
    UnsupportedImageFormat,
    #[error("PNG decoding failed: {0}")]
    PngDecode(#[from] png::DecodingError),
    #[error("PNG encoding failed: {0}")]
    PngEncode(#[from] png::EncodingError),
    #[error("Unsupported PNG layout: {0}")]
    UnsupportedPngLayout(String),
    #[error("Invalid PNM header: {0}")]
    InvalidPnm(&'static str),
    #[error("Invalid image size: {0}x{1}")]
    InvalidImageSize(usize, usize),
    // Container errors
    #[error("Invalid signature {0:02x}{1:02x}{2:02x}{3:02x}, expected \"MC2v\"")]
    InvalidSignature(u8, u8, u8, u8),
    #[error("Unsupported container version {0}")]
    UnsupportedVersion(u8),
    #[error("Invalid enum value {0} for {1}")]
    InvalidEnum(u32, String),
    #[error("Invalid header field {0}: {1}")]
    InvalidHeaderField(&'static str, u32),
    #[error("Invalid symbol id {0}")]
    InvalidSymbol(u32),
    #[error("Invalid Huffman code length {0}, max is {MAX_CODE_LENGTH}")]
    InvalidCodeLength(u32),
    #[error("Invalid Huffman code table")]
    InvalidHuffman,
    #[error("Codeword does not lead to a symbol")]
    InvalidCodeword,
    #[error("Run of {0} zeros overflows the block")]
    RunOverflow(usize),
    #[error("Symbol stream ended inside block {0}")]
    IncompleteBlock(usize),
    #[error("Declared {declared} symbols, but the blocks consume {consumed}")]
    SymbolCountMismatch { declared: u64, consumed: u64 },
    #[error("Declared {declared} payload bits, but decoding consumed {consumed}")]
    BitCountMismatch { declared: u64, consumed: u64 },
    #[error("{declared} symbols cannot code {blocks} blocks")]
    SymbolCountOutOfRange { declared: u64, blocks: u64 },
    #[error("Plane of {0}x{1} samples is too large to decode")]
    PlaneTooLarge(usize, usize),
    #[error("Non-zero padding bits")]
    NonZeroPadding,
    #[error("{0} unexpected trailing bytes after payload")]
    TrailingData(usize),
    #[error("Overflow when computing a bitstream size")]
    SizeOverflow,
    // Truncation
    #[error("Read out of bounds")]
    OutOfBounds,
    #[error("File truncated")]
    FileTruncated,
    #[error("Payload truncated: {declared} bits declared, {available} available")]
    PayloadTruncated { declared: u64, available: u64 },
}

/// Coarse classification of [`Error`]s, as reported at the codec boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Rejected before any work began.
    InvalidParameter,
    /// The source bytes could not be turned into samples.
    InvalidImageFormat,
    /// Malformed header, inconsistent code table or undecodable payload.
    CorruptContainer,
    /// Fewer bytes or bits than declared.
    TruncatedInput,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        use Error::*;
        match self {
            InvalidQuality(_)
            | InvalidDownsample(_)
            | ImageSizeTooLarge(..)
            | InvalidPixelData { .. }
            | EmptyAlphabet => ErrorKind::InvalidParameter,
            UnsupportedImageFormat
            | PngDecode(_)
            | PngEncode(_)
            | UnsupportedPngLayout(_)
            | InvalidPnm(_)
            | InvalidImageSize(..) => ErrorKind::InvalidImageFormat,
            InvalidSignature(..)
            | UnsupportedVersion(_)
            | InvalidEnum(..)
            | InvalidHeaderField(..)
            | InvalidSymbol(_)
            | InvalidCodeLength(_)
            | InvalidHuffman
            | InvalidCodeword
            | RunOverflow(_)
            | IncompleteBlock(_)
            | SymbolCountMismatch { .. }
            | BitCountMismatch { .. }
            | SymbolCountOutOfRange { .. }
            | PlaneTooLarge(..)
            | NonZeroPadding
            | TrailingData(_)
            | SizeOverflow => ErrorKind::CorruptContainer,
            OutOfBounds | FileTruncated | PayloadTruncated { .. } => ErrorKind::TruncatedInput,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        // Header fields are read from in-memory slices, so EOF is the only
        // error `byteorder` can surface.
        debug_assert_eq!(err.kind(), std::io::ErrorKind::UnexpectedEof);
        Error::FileTruncated
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn kinds() {
        assert_eq!(Error::InvalidQuality(0).kind(), ErrorKind::InvalidParameter);
        assert_eq!(
            Error::UnsupportedImageFormat.kind(),
            ErrorKind::InvalidImageFormat
        );
        assert_eq!(
            Error::UnsupportedVersion(7).kind(),
            ErrorKind::CorruptContainer
        );
        assert_eq!(Error::FileTruncated.kind(), ErrorKind::TruncatedInput);
    }

    #[test]
    fn eof_is_truncation() {
        let mut empty: &[u8] = &[];
        let err: Error = byteorder::ReadBytesExt::read_u8(&mut empty)
            .unwrap_err()
            .into();
        assert_eq!(err.kind(), ErrorKind::TruncatedInput);
    }
}
