//! Binary foreground masks.

use crate::detect::BoundingBox;
use crate::util::{GarmatchError, GarmatchResult};

/// Row-major binary mask matching its source image's dimensions.
#[derive(Debug, Clone, PartialEq)]
pub struct Mask {
    width: u32,
    height: u32,
    data: Vec<bool>,
}

impl Mask {
    /// Wraps a row-major buffer, checking its length against the dimensions.
    pub fn new(width: u32, height: u32, data: Vec<bool>) -> GarmatchResult<Self> {
        if data.len() != (width as usize) * (height as usize) {
            return Err(GarmatchError::MaskSize {
                width,
                height,
                len: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Rectangular mask covering the pixel bounds of `bbox`, clamped to the
    /// `width`×`height` frame.
    pub fn from_box(width: u32, height: u32, bbox: &BoundingBox) -> Self {
        let mut data = vec![false; (width as usize) * (height as usize)];
        let (x0, y0, x1, y1) = super::pixel_bounds(bbox, width, height);
        for y in y0..y1 {
            let row = (y as usize) * (width as usize);
            for x in x0..x1 {
                data[row + x as usize] = true;
            }
        }
        Self {
            width,
            height,
            data,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Foreground test; coordinates outside the frame are background.
    pub fn get(&self, x: u32, y: u32) -> bool {
        if x >= self.width || y >= self.height {
            return false;
        }
        self.data[(y as usize) * (self.width as usize) + x as usize]
    }

    /// Number of foreground pixels.
    pub fn foreground_count(&self) -> usize {
        self.data.iter().filter(|&&on| on).count()
    }
}
