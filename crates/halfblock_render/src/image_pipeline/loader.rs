use std::path::Path;

use image::{DynamicImage, RgbaImage};

use crate::RenderError;

/// Row-major RGBA pixels, four bytes per pixel.
pub type PixelGrid = RgbaImage;

/// Caller-owned RGBA pixel data with explicit dimensions.
#[derive(Clone, Debug)]
pub struct RawImage {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

impl RawImage {
    pub fn new(width: u32, height: u32, data: impl Into<Vec<u8>>) -> Self {
        Self { width, height, data: data.into() }
    }

    pub fn into_grid(self) -> Result<PixelGrid, RenderError> {
        let RawImage { width, height, data } = self;
        let expected = width as usize * height as usize * 4;
        if data.len() != expected {
            return Err(RenderError::PixelBuffer { width, height, expected, actual: data.len() });
        }

        PixelGrid::from_raw(width, height, data).ok_or(RenderError::PixelBuffer {
            width,
            height,
            expected,
            actual: expected,
        })
    }
}

impl From<PixelGrid> for RawImage {
    fn from(grid: PixelGrid) -> Self {
        let (width, height) = grid.dimensions();
        Self { width, height, data: grid.into_raw() }
    }
}

/// Decodes an encoded image in any format the enabled codecs support.
pub fn decode(bytes: &[u8]) -> Result<PixelGrid, RenderError> {
    Ok(image::load_from_memory(bytes)?.into_rgba8())
}

pub fn open<P: AsRef<Path>>(path: P) -> Result<PixelGrid, RenderError> {
    Ok(image::open(path)?.into_rgba8())
}

pub fn from_dynamic(image: DynamicImage) -> PixelGrid {
    image.into_rgba8()
}
