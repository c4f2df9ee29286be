// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

use crate::error::{Error, Result};
use byteorder::{ByteOrder, LittleEndian};

/// Reads bits from a sequence of bytes, least significant bit of each byte
/// first, never past a declared bit count.
pub struct BitReader<'a> {
    data: &'a [u8],
    bit_buf: u64,
    bits_in_buf: usize,
    total_bits_read: usize,
    bit_limit: usize,
}

pub const MAX_BITS_PER_CALL: usize = 56;

impl<'a> BitReader<'a> {
    /// Constructs a BitReader that may consume every bit of `data`.
    pub fn new(data: &'a [u8]) -> BitReader<'a> {
        Self::with_limit(data, data.len() * 8)
    }

    /// Constructs a BitReader over `data` that refuses to read beyond the
    /// first `bit_limit` bits, even if `data` holds more (padding).
    pub fn with_limit(data: &'a [u8], bit_limit: usize) -> BitReader<'a> {
        BitReader {
            data,
            bit_buf: 0,
            bits_in_buf: 0,
            total_bits_read: 0,
            bit_limit: bit_limit.min(data.len() * 8),
        }
    }

    /// Reads `num` bits from the buffer without consuming them.
    pub fn peek(&mut self, num: usize) -> u64 {
        debug_assert!(num <= MAX_BITS_PER_CALL);
        self.refill();
        self.bit_buf & ((1u64 << num) - 1)
    }

    /// Advances by `num` bits. Similar to `skip_bits`, but bits must be in the buffer.
    pub fn consume(&mut self, num: usize) -> Result<()> {
        if self.bits_in_buf < num || self.total_bits_read + num > self.bit_limit {
            return Err(Error::OutOfBounds);
        }
        self.bit_buf >>= num;
        self.bits_in_buf -= num;
        self.total_bits_read += num;
        Ok(())
    }

    /// Reads `num` bits from the buffer.
    /// ```
    /// # use mathcompress::bit_reader::BitReader;
    /// let mut br = BitReader::new(&[0, 1]);
    /// assert_eq!(br.read(8)?, 0);
    /// assert_eq!(br.read(4)?, 1);
    /// assert_eq!(br.read(4)?, 0);
    /// assert_eq!(br.total_bits_read(), 16);
    /// assert!(br.read(1).is_err());
    /// # Ok::<(), mathcompress::error::Error>(())
    /// ```
    pub fn read(&mut self, num: usize) -> Result<u64> {
        let ret = self.peek(num);
        self.consume(num)?;
        Ok(ret)
    }

    /// Reads a single bit; the Huffman decoder walks its tree with these.
    #[inline]
    pub fn read_bit(&mut self) -> Result<bool> {
        Ok(self.read(1)? != 0)
    }

    /// Returns the total number of bits that have been read or skipped.
    pub fn total_bits_read(&self) -> usize {
        self.total_bits_read
    }

    /// Bits left before the limit is reached.
    pub fn bits_remaining(&self) -> usize {
        self.bit_limit - self.total_bits_read
    }

    /// Jumps to the next byte boundary. The skipped bits have to be 0.
    /// ```
    /// # use mathcompress::bit_reader::BitReader;
    /// let mut br = BitReader::new(&[0, 1]);
    /// assert_eq!(br.read(8)?, 0);
    /// assert_eq!(br.read(1)?, 1);
    /// br.jump_to_byte_boundary()?;
    /// assert_eq!(br.total_bits_read(), 16);
    /// # Ok::<(), mathcompress::error::Error>(())
    /// ```
    pub fn jump_to_byte_boundary(&mut self) -> Result<()> {
        let byte_boundary = self.total_bits_read.div_ceil(8) * 8;
        let num = byte_boundary - self.total_bits_read;
        // Padding lies past the logical limit; it is only inspected here.
        let limit = self.bit_limit;
        self.bit_limit = byte_boundary.min(self.data_len_bits());
        let padding = self.read(num);
        self.bit_limit = limit.max(self.total_bits_read);
        if padding? != 0 {
            return Err(Error::NonZeroPadding);
        }
        Ok(())
    }

    fn data_len_bits(&self) -> usize {
        self.total_bits_read + self.bits_in_buf + self.data.len() * 8
    }

    fn refill(&mut self) {
        if self.data.len() >= 8 {
            let bits = LittleEndian::read_u64(self.data);
            self.bit_buf |= bits << self.bits_in_buf;
            let read_bytes = (63 - self.bits_in_buf) >> 3;
            self.bits_in_buf |= 56;
            self.data = &self.data[read_bytes..];
            debug_assert!(56 <= self.bits_in_buf && self.bits_in_buf < 64);
        } else {
            self.refill_slow()
        }
    }

    #[inline(never)]
    fn refill_slow(&mut self) {
        while self.bits_in_buf < 56 {
            if self.data.is_empty() {
                return;
            }
            self.bit_buf |= (self.data[0] as u64) << self.bits_in_buf;
            self.bits_in_buf += 8;
            self.data = &self.data[1..];
        }
    }
}
