// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

use crate::BLOCK_SIZE;
use crate::error::{Error, Result};

/// Quantized coefficients are clamped to this magnitude so that every value
/// fits the symbol alphabet.
pub const MAX_QUANTIZED: i16 = 2047;

pub const MIN_QUALITY: u8 = 1;
pub const MAX_QUALITY: u8 = 100;

/// Luminance base table for quality 50, in row-major order (ITU T.81 K.1).
#[rustfmt::skip]
const LUMA_BASE: [u16; BLOCK_SIZE] = [
    16, 11, 10, 16, 24, 40, 51, 61,
    12, 12, 14, 19, 26, 58, 60, 55,
    14, 13, 16, 24, 40, 57, 69, 56,
    14, 17, 22, 29, 51, 87, 80, 62,
    18, 22, 37, 56, 68, 109, 103, 77,
    24, 35, 55, 64, 81, 104, 113, 92,
    49, 64, 78, 87, 103, 121, 120, 101,
    72, 92, 95, 98, 112, 100, 103, 99,
];

/// Chrominance base table for quality 50, in row-major order (ITU T.81 K.2).
#[rustfmt::skip]
const CHROMA_BASE: [u16; BLOCK_SIZE] = [
    17, 18, 24, 47, 99, 99, 99, 99,
    18, 21, 26, 66, 99, 99, 99, 99,
    24, 26, 56, 99, 99, 99, 99, 99,
    47, 66, 99, 99, 99, 99, 99, 99,
    99, 99, 99, 99, 99, 99, 99, 99,
    99, 99, 99, 99, 99, 99, 99, 99,
    99, 99, 99, 99, 99, 99, 99, 99,
    99, 99, 99, 99, 99, 99, 99, 99,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableKind {
    Luma,
    Chroma,
}

/// Per-coefficient step sizes for one plane, in row-major order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuantTable {
    steps: [u16; BLOCK_SIZE],
}

impl QuantTable {
    /// Scales the base table for `quality`: quality 50 reproduces it, 100
    /// collapses every step to 1 and 1 multiplies it by 50. Steps are
    /// clamped to `[1, 255]`.
    pub fn for_quality(quality: u8, kind: TableKind) -> Result<QuantTable> {
        if !(MIN_QUALITY..=MAX_QUALITY).contains(&quality) {
            return Err(Error::InvalidQuality(quality as u32));
        }
        let scale = if quality < 50 {
            50.0 / quality as f32
        } else {
            2.0 - quality as f32 / 50.0
        };
        let base = match kind {
            TableKind::Luma => &LUMA_BASE,
            TableKind::Chroma => &CHROMA_BASE,
        };
        let steps = array_init::array_init(|i| {
            (base[i] as f32 * scale).round().clamp(1.0, 255.0) as u16
        });
        Ok(QuantTable { steps })
    }

    pub fn steps(&self) -> &[u16; BLOCK_SIZE] {
        &self.steps
    }

    /// Divides by the step and rounds to the nearest integer, ties away from
    /// zero.
    pub fn quantize(&self, coeffs: &[f32; BLOCK_SIZE]) -> [i16; BLOCK_SIZE] {
        array_init::array_init(|i| {
            (coeffs[i] / self.steps[i] as f32)
                .round()
                .clamp(-MAX_QUANTIZED as f32, MAX_QUANTIZED as f32) as i16
        })
    }

    pub fn dequantize(&self, quantized: &[i16; BLOCK_SIZE]) -> [f32; BLOCK_SIZE] {
        array_init::array_init(|i| quantized[i] as f32 * self.steps[i] as f32)
    }
}

/// Tables for every plane of an image: luma for plane 0, chroma for the
/// others.
#[derive(Debug, Clone)]
pub struct PlaneTables {
    luma: QuantTable,
    chroma: QuantTable,
}

impl PlaneTables {
    pub fn for_quality(quality: u8) -> Result<PlaneTables> {
        Ok(PlaneTables {
            luma: QuantTable::for_quality(quality, TableKind::Luma)?,
            chroma: QuantTable::for_quality(quality, TableKind::Chroma)?,
        })
    }

    pub fn for_plane(&self, plane: usize) -> &QuantTable {
        if plane == 0 { &self.luma } else { &self.chroma }
    }
}

#[cfg(test)]
mod test {
    use test_log::test;

    use super::*;

    #[test]
    fn quality_50_is_base() -> Result<()> {
        assert_eq!(QuantTable::for_quality(50, TableKind::Luma)?.steps(), &LUMA_BASE);
        assert_eq!(
            QuantTable::for_quality(50, TableKind::Chroma)?.steps(),
            &CHROMA_BASE
        );
        Ok(())
    }

    #[test]
    fn quality_100_is_lossless_step() -> Result<()> {
        let table = QuantTable::for_quality(100, TableKind::Luma)?;
        assert!(table.steps().iter().all(|&s| s == 1));
        Ok(())
    }

    #[test]
    fn quality_1_is_coarsest() -> Result<()> {
        let table = QuantTable::for_quality(1, TableKind::Luma)?;
        assert_eq!(table.steps()[0], 255);
        assert!(table.steps().iter().all(|&s| s >= 255));
        Ok(())
    }

    #[test]
    fn out_of_range() {
        assert!(matches!(
            QuantTable::for_quality(0, TableKind::Luma),
            Err(Error::InvalidQuality(0))
        ));
        assert!(matches!(
            QuantTable::for_quality(101, TableKind::Chroma),
            Err(Error::InvalidQuality(101))
        ));
    }

    #[test]
    fn rounds_half_away_from_zero() -> Result<()> {
        let table = QuantTable::for_quality(100, TableKind::Luma)?;
        let mut coeffs = [0.0f32; BLOCK_SIZE];
        coeffs[..6].copy_from_slice(&[0.5, -0.5, 1.5, -2.5, 0.49, 5000.0]);
        let q = table.quantize(&coeffs);
        assert_eq!(&q[..6], &[1, -1, 2, -3, 0, MAX_QUANTIZED]);
        Ok(())
    }

    #[test]
    fn dequantize_multiplies() -> Result<()> {
        let table = QuantTable::for_quality(50, TableKind::Luma)?;
        let mut q = [0i16; BLOCK_SIZE];
        q[0] = -3;
        q[63] = 2;
        let d = table.dequantize(&q);
        assert_eq!(d[0], -48.0);
        assert_eq!(d[63], 198.0);
        assert!(d[1..63].iter().all(|&v| v == 0.0));
        Ok(())
    }

    #[test]
    fn plane_tables() -> Result<()> {
        let tables = PlaneTables::for_quality(50)?;
        assert_eq!(tables.for_plane(0).steps(), &LUMA_BASE);
        assert_eq!(tables.for_plane(1).steps(), &CHROMA_BASE);
        assert_eq!(tables.for_plane(2).steps(), &CHROMA_BASE);
        assert!(PlaneTables::for_quality(0).is_err());
        Ok(())
    }

    macro_rules! monotonic_steps_test {
        ($lo:literal, $hi:literal) => {
            paste::paste! {
                #[test]
                fn [<steps_shrink_from_ $lo _to_ $hi>]() -> Result<()> {
                    for kind in [TableKind::Luma, TableKind::Chroma] {
                        let lo = QuantTable::for_quality($lo, kind)?;
                        let hi = QuantTable::for_quality($hi, kind)?;
                        for (a, b) in lo.steps().iter().zip(hi.steps()) {
                            assert!(a >= b);
                        }
                    }
                    Ok(())
                }
            }
        };
    }

    monotonic_steps_test!(10, 30);
    monotonic_steps_test!(30, 60);
    monotonic_steps_test!(60, 90);
    monotonic_steps_test!(90, 100);
}
