//! Floating-point RGBA images
//!
//! Lightmap and ambient-occlusion bakes are read into [`LinearImage`]s: row-major
//! RGBA with one f32 per channel, nominally in [0, 1].

pub mod store;

use std::io::Cursor;
use std::path::Path;

use lightmap_common::pack_color_rgba_unorm8;

use crate::error::Result;

/// Read/write access to a rectangular RGBA pixel grid
pub trait ImageBuffer {
    fn width(&self) -> u32;
    fn height(&self) -> u32;

    /// False when the pixel data cannot be read (missing or malformed buffer)
    fn has_pixels(&self) -> bool {
        true
    }

    /// Pixel at (x, y). Panics when out of bounds.
    fn get_pixel(&self, x: u32, y: u32) -> [f32; 4];

    /// Overwrite the pixel at (x, y). Panics when out of bounds.
    fn set_pixel(&mut self, x: u32, y: u32, rgba: [f32; 4]);
}

/// RGBA f32 image buffer
#[derive(Debug, Clone, PartialEq)]
pub struct LinearImage {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// RGBA pixel data (4 floats per pixel, row-major order)
    pub pixels: Vec<f32>,
}

impl LinearImage {
    /// Create a new image initialized to transparent black
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![0.0; width as usize * height as usize * 4],
        }
    }

    /// Create an image filled with a solid color
    pub fn filled(width: u32, height: u32, color: [f32; 4]) -> Self {
        let mut image = Self::new(width, height);
        for chunk in image.pixels.chunks_exact_mut(4) {
            chunk.copy_from_slice(&color);
        }
        image
    }

    /// Wrap an existing pixel vector. Length is not checked here; a short
    /// buffer reports `has_pixels() == false`.
    pub fn from_raw(width: u32, height: u32, pixels: Vec<f32>) -> Self {
        Self {
            width,
            height,
            pixels,
        }
    }

    /// Load an image file, mapping 8-bit channels to `byte / 255.0`
    pub fn open(path: &Path) -> Result<Self> {
        let img = image::open(path)?;
        let rgba = img.to_rgba32f();
        let (width, height) = rgba.dimensions();
        tracing::debug!("Loaded image {:?}: {}x{}", path, width, height);
        Ok(Self::from_raw(width, height, rgba.into_raw()))
    }

    #[inline]
    fn offset(&self, x: u32, y: u32) -> usize {
        (x as usize + y as usize * self.width as usize) * 4
    }

    /// Convert to RGBA8, clamping each channel into [0, 1] and rounding
    pub fn to_rgba8(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.pixels.len());
        for px in self.pixels.chunks_exact(4) {
            out.extend_from_slice(&pack_color_rgba_unorm8(px[0], px[1], px[2], px[3]));
        }
        out
    }

    /// Encode as PNG bytes
    pub fn encode_png(&self) -> Result<Vec<u8>> {
        let rgba = image::RgbaImage::from_raw(self.width, self.height, self.to_rgba8())
            .ok_or(crate::error::LightmapError::NoPixelData("Encoded"))?;
        let mut bytes = Vec::new();
        rgba.write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)?;
        Ok(bytes)
    }
}

impl ImageBuffer for LinearImage {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn has_pixels(&self) -> bool {
        self.pixels.len() == self.width as usize * self.height as usize * 4
    }

    #[inline]
    fn get_pixel(&self, x: u32, y: u32) -> [f32; 4] {
        let i = self.offset(x, y);
        [
            self.pixels[i],
            self.pixels[i + 1],
            self.pixels[i + 2],
            self.pixels[i + 3],
        ]
    }

    #[inline]
    fn set_pixel(&mut self, x: u32, y: u32, rgba: [f32; 4]) {
        let i = self.offset(x, y);
        self.pixels[i..i + 4].copy_from_slice(&rgba);
    }
}
