//! Raster surface capability and the CPU RGBA8 implementation
//!
//! The engraving math only talks to [`RasterSurface`], so any 2D backend
//! that can fill, draw text, blur, and move pixels in and out can host it.

use thiserror::Error;

use crate::blur::gaussian_blur;
use crate::text::{draw_text, measure_text, TextStyle};

/// Failures acquiring or writing a drawing surface
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SurfaceError {
    #[error("Invalid surface dimensions: {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },
    #[error("Failed to allocate a {width}x{height} surface")]
    AllocationFailed { width: u32, height: u32 },
    #[error("Pixel buffer holds {actual} pixels, surface needs {expected}")]
    SizeMismatch { expected: usize, actual: usize },
}

/// A 2D drawing surface with 8-bit RGBA pixels
pub trait RasterSurface {
    fn width(&self) -> u32;
    fn height(&self) -> u32;

    /// Fill the whole surface with one color
    fn fill(&mut self, color: [u8; 4]);

    /// Rendered width of `text` at `font_size`, in pixels
    fn measure_text(&self, text: &str, font_size: f32) -> f32;

    /// Draw `text` centered on the style's anchor point
    fn draw_text(&mut self, text: &str, style: &TextStyle);

    /// Gaussian blur with standard deviation `radius` pixels
    fn blur(&mut self, radius: f32);

    /// Copy of the pixels in row-major order
    fn read_pixels(&self) -> Vec<[u8; 4]>;

    /// Replace every pixel. The buffer must match the surface size.
    fn write_pixels(&mut self, pixels: &[[u8; 4]]) -> Result<(), SurfaceError>;
}

/// Creates drawing surfaces
pub trait RasterBackend {
    type Surface: RasterSurface;

    fn create_surface(&mut self, width: u32, height: u32) -> Result<Self::Surface, SurfaceError>;
}

/// An 8-bit RGBA CPU surface
#[derive(Debug, Clone, PartialEq)]
pub struct CpuSurface {
    /// Surface dimensions
    pub width: u32,
    pub height: u32,
    /// Pixel data in row-major order, each pixel is [r, g, b, a]
    pixels: Vec<[u8; 4]>,
}

impl CpuSurface {
    /// Create a surface initialized to transparent black
    pub fn try_new(width: u32, height: u32) -> Result<Self, SurfaceError> {
        if width == 0 || height == 0 {
            return Err(SurfaceError::InvalidDimensions { width, height });
        }
        let pixel_count = (width as usize)
            .checked_mul(height as usize)
            .ok_or(SurfaceError::AllocationFailed { width, height })?;

        let mut pixels = Vec::new();
        pixels
            .try_reserve_exact(pixel_count)
            .map_err(|_| SurfaceError::AllocationFailed { width, height })?;
        pixels.resize(pixel_count, [0, 0, 0, 0]);

        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// Get a pixel at the given coordinates
    /// Returns None if coordinates are out of bounds
    #[inline]
    pub fn get_pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let index = (y as usize) * (self.width as usize) + (x as usize);
        Some(self.pixels[index])
    }

    /// Set a pixel at the given coordinates
    /// Does nothing if coordinates are out of bounds
    #[inline]
    pub fn set_pixel(&mut self, x: u32, y: u32, color: [u8; 4]) {
        if x >= self.width || y >= self.height {
            return;
        }
        let index = (y as usize) * (self.width as usize) + (x as usize);
        self.pixels[index] = color;
    }

    #[inline]
    pub fn pixels(&self) -> &[[u8; 4]] {
        &self.pixels
    }
}

impl RasterSurface for CpuSurface {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn fill(&mut self, color: [u8; 4]) {
        self.pixels.fill(color);
    }

    fn measure_text(&self, text: &str, font_size: f32) -> f32 {
        measure_text(text, font_size)
    }

    fn draw_text(&mut self, text: &str, style: &TextStyle) {
        draw_text(&mut self.pixels, self.width, self.height, text, style);
    }

    fn blur(&mut self, radius: f32) {
        let mut channels: Vec<[f32; 4]> = self
            .pixels
            .iter()
            .map(|p| [p[0] as f32, p[1] as f32, p[2] as f32, p[3] as f32])
            .collect();
        gaussian_blur(&mut channels, self.width as usize, self.height as usize, radius);
        for (dst, src) in self.pixels.iter_mut().zip(&channels) {
            *dst = src.map(|c| c.round().clamp(0.0, 255.0) as u8);
        }
    }

    fn read_pixels(&self) -> Vec<[u8; 4]> {
        self.pixels.clone()
    }

    fn write_pixels(&mut self, pixels: &[[u8; 4]]) -> Result<(), SurfaceError> {
        if pixels.len() != self.pixels.len() {
            return Err(SurfaceError::SizeMismatch {
                expected: self.pixels.len(),
                actual: pixels.len(),
            });
        }
        self.pixels.copy_from_slice(pixels);
        Ok(())
    }
}

/// Backend producing [`CpuSurface`]s
#[derive(Debug, Clone, Copy, Default)]
pub struct CpuBackend;

impl RasterBackend for CpuBackend {
    type Surface = CpuSurface;

    fn create_surface(&mut self, width: u32, height: u32) -> Result<CpuSurface, SurfaceError> {
        CpuSurface::try_new(width, height)
    }
}
