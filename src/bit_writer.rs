// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

use byteorder::{ByteOrder, LittleEndian};

use crate::bit_reader::MAX_BITS_PER_CALL;

/// Writes bits into a byte vector, least significant bit of each byte first:
/// the mirror image of [`crate::bit_reader::BitReader`].
///
/// The final partial byte is padded with zero bits.
#[derive(Debug, Default)]
pub struct BitWriter {
    data: Vec<u8>,
    bit_buf: u64,
    bits_in_buf: usize,
    total_bits_written: usize,
}

impl BitWriter {
    pub fn new() -> BitWriter {
        BitWriter::default()
    }

    pub fn with_capacity(bytes: usize) -> BitWriter {
        BitWriter {
            data: Vec::with_capacity(bytes),
            ..Default::default()
        }
    }

    /// Appends the low `num` bits of `bits`.
    /// ```
    /// # use mathcompress::bit_writer::BitWriter;
    /// let mut bw = BitWriter::new();
    /// bw.write(4, 0b0101);
    /// bw.write(4, 0b1100);
    /// bw.write(1, 1);
    /// assert_eq!(bw.total_bits_written(), 9);
    /// assert_eq!(bw.finalize(), vec![0b1100_0101, 0b0000_0001]);
    /// ```
    pub fn write(&mut self, num: usize, bits: u64) {
        debug_assert!(num <= MAX_BITS_PER_CALL);
        debug_assert!(bits >> num == 0);
        debug_assert!(self.bits_in_buf < 8);
        self.bit_buf |= bits << self.bits_in_buf;
        self.bits_in_buf += num;
        self.total_bits_written += num;
        let full_bytes = self.bits_in_buf / 8;
        if full_bytes > 0 {
            let mut word = [0u8; 8];
            LittleEndian::write_u64(&mut word, self.bit_buf);
            self.data.extend_from_slice(&word[..full_bytes]);
            // full_bytes <= 7, so the shift stays in range.
            self.bit_buf >>= full_bytes * 8;
            self.bits_in_buf -= full_bytes * 8;
        }
    }

    /// Appends a prefix code whose first bit is the most significant of the
    /// `len` low bits of `code`, one bit at a time in path order.
    pub fn write_code(&mut self, len: usize, code: u64) {
        debug_assert!(len <= 64);
        if len == 0 {
            return;
        }
        let mut reversed = code.reverse_bits() >> (64 - len);
        let mut left = len;
        while left > 0 {
            let chunk = left.min(MAX_BITS_PER_CALL);
            self.write(chunk, reversed & ((1u64 << chunk) - 1));
            reversed >>= chunk;
            left -= chunk;
        }
    }

    pub fn total_bits_written(&self) -> usize {
        self.total_bits_written
    }

    /// Flushes pending bits, zero-filling the last byte, and returns the bytes.
    pub fn finalize(mut self) -> Vec<u8> {
        if self.bits_in_buf > 0 {
            self.data.push(self.bit_buf as u8);
        }
        debug_assert_eq!(self.data.len(), self.total_bits_written.div_ceil(8));
        self.data
    }
}
