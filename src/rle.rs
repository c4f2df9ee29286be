// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

//! Run-length compaction of zig-zag ordered blocks.
//!
//! A block becomes a sequence of `Run { zeros, value }` symbols, each
//! standing for `zeros` zero coefficients followed by the nonzero `value`,
//! terminated by `EndOfBlock` when the block ends in one or more zeros. A
//! block whose last coefficient is nonzero has no terminator: the decoder
//! knows the block is full after 64 coefficients.

use crate::BLOCK_SIZE;
use crate::error::{Error, Result};
use crate::quant::MAX_QUANTIZED;

const VALUE_OFFSET: u32 = 2048;
const VALUES_PER_RUN: u32 = 2 * VALUE_OFFSET;

/// Largest valid symbol id, `Run { zeros: 63, value: 2047 }`.
pub const MAX_SYMBOL_ID: u32 =
    1 + (BLOCK_SIZE as u32 - 1) * VALUES_PER_RUN + VALUE_OFFSET + MAX_QUANTIZED as u32;

/// One entry of the entropy-coded alphabet. The derived ordering agrees
/// with the ordering of [`Symbol::id`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Symbol {
    /// Every remaining coefficient of the block is zero.
    EndOfBlock,
    /// `zeros` zero coefficients, then `value` (never zero).
    Run { zeros: u8, value: i16 },
}

impl Symbol {
    /// Dense integer id: 0 for `EndOfBlock`, `1 + zeros * 4096 + value + 2048`
    /// for runs.
    pub fn id(self) -> u32 {
        match self {
            Symbol::EndOfBlock => 0,
            Symbol::Run { zeros, value } => {
                1 + zeros as u32 * VALUES_PER_RUN + (value as i32 + VALUE_OFFSET as i32) as u32
            }
        }
    }

    pub fn from_id(id: u32) -> Result<Symbol> {
        if id == 0 {
            return Ok(Symbol::EndOfBlock);
        }
        if id > MAX_SYMBOL_ID {
            return Err(Error::InvalidSymbol(id));
        }
        let zeros = (id - 1) / VALUES_PER_RUN;
        let value = ((id - 1) % VALUES_PER_RUN) as i32 - VALUE_OFFSET as i32;
        if value == 0 || value.unsigned_abs() > MAX_QUANTIZED as u32 {
            return Err(Error::InvalidSymbol(id));
        }
        Ok(Symbol::Run {
            zeros: zeros as u8,
            value: value as i16,
        })
    }
}

/// Appends the symbols for one scan-ordered block to `out`.
pub fn encode_block(scan: &[i16; BLOCK_SIZE], out: &mut Vec<Symbol>) {
    let mut zeros = 0u8;
    for &value in scan {
        if value == 0 {
            zeros += 1;
        } else {
            debug_assert!(value.unsigned_abs() <= MAX_QUANTIZED as u16);
            out.push(Symbol::Run { zeros, value });
            zeros = 0;
        }
    }
    if zeros > 0 {
        out.push(Symbol::EndOfBlock);
    }
}

/// Convenience wrapper around [`encode_block`].
pub fn encode(scan: &[i16; BLOCK_SIZE]) -> Vec<Symbol> {
    let mut out = Vec::new();
    encode_block(scan, &mut out);
    out
}

/// Rebuilds one scan-ordered block, consuming exactly the symbols that
/// [`encode_block`] produced for it. `block` only labels errors.
pub fn decode_block<I: Iterator<Item = Symbol>>(
    symbols: &mut I,
    block: usize,
) -> Result<[i16; BLOCK_SIZE]> {
    let mut scan = [0i16; BLOCK_SIZE];
    let mut pos = 0;
    while pos < BLOCK_SIZE {
        match symbols.next().ok_or(Error::IncompleteBlock(block))? {
            Symbol::EndOfBlock => break,
            Symbol::Run { zeros, value } => {
                let target = pos + zeros as usize;
                if target >= BLOCK_SIZE {
                    return Err(Error::RunOverflow(zeros as usize));
                }
                scan[target] = value;
                pos = target + 1;
            }
        }
    }
    Ok(scan)
}
