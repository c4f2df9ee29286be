// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

use std::fmt::Debug;

use crate::error::{Error, Result};

/// Images larger than this many samples per plane are refused outright.
pub const MAX_PLANE_SAMPLES: usize = 1 << 30;

/// A single plane of samples, stored row by row.
#[derive(Clone, PartialEq)]
pub struct Image<T> {
    size: (usize, usize),
    data: Vec<T>,
}

impl<T: Copy + Default> Image<T> {
    /// Creates a zero-filled plane of `(xsize, ysize)` samples.
    pub fn new(size: (usize, usize)) -> Result<Image<T>> {
        Self::new_with_value(size, T::default())
    }

    pub fn new_with_value(size: (usize, usize), value: T) -> Result<Image<T>> {
        let total = size
            .0
            .checked_mul(size.1)
            .filter(|&n| n <= MAX_PLANE_SAMPLES)
            .ok_or(Error::ImageSizeTooLarge(size.0, size.1))?;
        Ok(Image {
            size,
            data: vec![value; total],
        })
    }

    pub fn from_vec(size: (usize, usize), data: Vec<T>) -> Result<Image<T>> {
        let expected = size
            .0
            .checked_mul(size.1)
            .ok_or(Error::ImageSizeTooLarge(size.0, size.1))?;
        if data.len() != expected {
            return Err(Error::InvalidPixelData {
                expected,
                actual: data.len(),
            });
        }
        Ok(Image { size, data })
    }

    pub fn size(&self) -> (usize, usize) {
        self.size
    }

    pub fn row(&self, y: usize) -> &[T] {
        &self.data[y * self.size.0..(y + 1) * self.size.0]
    }

    pub fn row_mut(&mut self, y: usize) -> &mut [T] {
        &mut self.data[y * self.size.0..(y + 1) * self.size.0]
    }

    pub fn fill(&mut self, v: T) {
        self.data.fill(v);
    }

    /// Sample at `(x, y)`, with coordinates clamped to the plane.
    pub fn get_clamped(&self, x: isize, y: isize) -> T {
        let x = x.clamp(0, self.size.0 as isize - 1) as usize;
        let y = y.clamp(0, self.size.1 as isize - 1) as usize;
        self.data[y * self.size.0 + x]
    }

    pub fn as_slice(&self) -> &[T] {
        &self.data
    }
}

impl<T: Debug> Debug for Image<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Image {}x{}", self.size.0, self.size.1)
    }
}

/// 8-bit interleaved pixels: the form images take at the codec boundary.
#[derive(Clone, PartialEq, Eq)]
pub struct PixelImage {
    width: usize,
    height: usize,
    channels: usize,
    samples: Vec<u8>,
}

impl PixelImage {
    /// `samples` holds `width * height` RGB triples, row by row.
    pub fn new_rgb(width: usize, height: usize, samples: Vec<u8>) -> Result<PixelImage> {
        Self::new(width, height, 3, samples)
    }

    pub fn new_gray(width: usize, height: usize, samples: Vec<u8>) -> Result<PixelImage> {
        Self::new(width, height, 1, samples)
    }

    fn new(width: usize, height: usize, channels: usize, samples: Vec<u8>) -> Result<PixelImage> {
        let expected = width
            .checked_mul(height)
            .filter(|&n| n <= MAX_PLANE_SAMPLES)
            .and_then(|n| n.checked_mul(channels))
            .ok_or(Error::ImageSizeTooLarge(width, height))?;
        if samples.len() != expected {
            return Err(Error::InvalidPixelData {
                expected,
                actual: samples.len(),
            });
        }
        Ok(PixelImage {
            width,
            height,
            channels,
            samples,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// 1 for grayscale, 3 for RGB.
    pub fn channels(&self) -> usize {
        self.channels
    }

    pub fn is_gray(&self) -> bool {
        self.channels == 1
    }

    pub fn samples(&self) -> &[u8] {
        &self.samples
    }

    pub fn into_samples(self) -> Vec<u8> {
        self.samples
    }

    /// Splits interleaved samples into one `f32` plane per channel.
    pub fn planes(&self) -> Result<Vec<Image<f32>>> {
        let mut planes = (0..self.channels)
            .map(|_| Image::new((self.width, self.height)))
            .collect::<Result<Vec<_>>>()?;
        for y in 0..self.height {
            let row = &self.samples[y * self.width * self.channels..][..self.width * self.channels];
            for (c, plane) in planes.iter_mut().enumerate() {
                for (out, px) in plane.row_mut(y).iter_mut().zip(row.chunks_exact(self.channels)) {
                    *out = px[c] as f32;
                }
            }
        }
        Ok(planes)
    }

    /// Interleaves 1 or 3 planes, rounding and clamping to 8 bits.
    pub fn from_planes(planes: &[Image<f32>]) -> Result<PixelImage> {
        let (width, height) = planes.first().map_or((0, 0), |p| p.size());
        let channels = planes.len();
        debug_assert!(channels == 1 || channels == 3);
        debug_assert!(planes.iter().all(|p| p.size() == (width, height)));
        let mut samples = Vec::with_capacity(width * height * channels);
        for y in 0..height {
            for x in 0..width {
                for plane in planes {
                    samples.push(plane.row(y)[x].round().clamp(0.0, 255.0) as u8);
                }
            }
        }
        Self::new(width, height, channels, samples)
    }
}

impl Debug for PixelImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "PixelImage {}x{}x{}",
            self.width, self.height, self.channels
        )
    }
}

#[cfg(test)]
mod test {
    use test_log::test;

    use super::*;

    #[test]
    fn huge_image() {
        assert!(Image::<f32>::new((1 << 28, 1 << 28)).is_err());
    }

    #[test]
    fn rows() -> Result<()> {
        let mut image = Image::<u8>::new((32, 42))?;
        image.row_mut(30)[31] = 1;
        assert_eq!(image.row(30)[31], 1);
        assert_eq!(image.get_clamped(40, 30), 1);
        assert_eq!(image.get_clamped(-1, -1), 0);
        Ok(())
    }

    #[test]
    fn wrong_buffer_length() {
        let err = PixelImage::new_rgb(2, 2, vec![0; 11]).unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidPixelData {
                expected: 12,
                actual: 11
            }
        ));
    }

    #[test]
    fn planes_roundtrip() -> Result<()> {
        let samples: Vec<u8> = (0..2 * 3 * 3).map(|v| v as u8 * 7).collect();
        let image = PixelImage::new_rgb(3, 2, samples)?;
        let planes = image.planes()?;
        assert_eq!(planes.len(), 3);
        assert_eq!(planes[1].row(1)[2], image.samples()[(3 + 2) * 3 + 1] as f32);
        assert_eq!(PixelImage::from_planes(&planes)?, image);
        Ok(())
    }

    #[test]
    fn zero_sized() -> Result<()> {
        let image = PixelImage::new_gray(0, 0, vec![])?;
        assert!(image.planes()?[0].as_slice().is_empty());
        Ok(())
    }
}
