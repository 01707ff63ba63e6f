//! Tangent-space normal maps derived from an engraving alpha raster

use glam::Vec3;
use tracing::trace;

use crate::surface::{RasterBackend, RasterSurface, SurfaceError};
use vitrine_config::EngravingSettings;

/// Parameters for [`build_normal_from_alpha`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalOptions {
    /// Invert luminance so strokes read as recessed
    pub invert: bool,
    /// Blur radius as a fraction of `min(width, height)`
    pub blur_fraction: f32,
    /// Gradient multiplier
    pub strength: f32,
}

impl From<&EngravingSettings> for NormalOptions {
    fn from(settings: &EngravingSettings) -> Self {
        Self {
            invert: settings.invert_height,
            blur_fraction: settings.blur_fraction,
            strength: settings.normal_strength,
        }
    }
}

/// Rec. 601 luma of an RGBA pixel
#[inline]
pub fn luminance(pixel: [u8; 4]) -> u8 {
    let [r, g, b, _] = pixel;
    (0.299 * r as f32 + 0.587 * g as f32 + 0.114 * b as f32)
        .round()
        .clamp(0.0, 255.0) as u8
}

/// Map a unit normal from `[-1, 1]` to an RGB byte triple
#[inline]
pub fn encode_normal(normal: Vec3) -> [u8; 3] {
    normal
        .to_array()
        .map(|c| ((c * 0.5 + 0.5) * 255.0).round().clamp(0.0, 255.0) as u8)
}

/// Normal map from a height field in `[0, 1]`.
///
/// Gradients are central differences with edge clamping, and the normal is
/// `normalize(-dx * strength, -dy * strength, 1)`. Alpha is always 255.
pub fn normals_from_heights(heights: &[f32], width: usize, height: usize, strength: f32) -> Vec<[u8; 4]> {
    let at = |x: usize, y: usize| heights[y * width + x];
    let mut out = Vec::with_capacity(width * height);

    for y in 0..height {
        let up = y.saturating_sub(1);
        let down = (y + 1).min(height - 1);
        for x in 0..width {
            let left = x.saturating_sub(1);
            let right = (x + 1).min(width - 1);

            let dx = (at(right, y) - at(left, y)) * strength;
            let dy = (at(x, down) - at(x, up)) * strength;
            let [r, g, b] = encode_normal(Vec3::new(-dx, -dy, 1.0).normalize());
            out.push([r, g, b, 255]);
        }
    }
    out
}

/// Build a normal-map surface from an alpha surface.
///
/// The alpha raster's luminance (optionally inverted) is blurred into a
/// height field, and the height field's gradient becomes the normal. The
/// input surface is left untouched.
pub fn build_normal_from_alpha<B: RasterBackend>(
    backend: &mut B,
    alpha: &B::Surface,
    options: &NormalOptions,
) -> Result<B::Surface, SurfaceError> {
    let (width, height) = (alpha.width(), alpha.height());
    let mut surface = backend.create_surface(width, height)?;

    let gray: Vec<[u8; 4]> = alpha
        .read_pixels()
        .into_iter()
        .map(|pixel| {
            let l = luminance(pixel);
            let v = if options.invert { 255 - l } else { l };
            [v, v, v, 255]
        })
        .collect();
    surface.write_pixels(&gray)?;

    let radius = options.blur_fraction * width.min(height) as f32;
    surface.blur(radius);

    let heights: Vec<f32> = surface
        .read_pixels()
        .iter()
        .map(|pixel| pixel[0] as f32 / 255.0)
        .collect();
    let normals = normals_from_heights(&heights, width as usize, height as usize, options.strength);
    surface.write_pixels(&normals)?;

    trace!(
        "build_normal_from_alpha: {}x{} blur={:.1} strength={}",
        width,
        height,
        radius,
        options.strength
    );
    Ok(surface)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::{CpuBackend, CpuSurface};

    #[test]
    fn test_encode_flat_normal() {
        assert_eq!(encode_normal(Vec3::Z), [128, 128, 255]);
        assert_eq!(encode_normal(Vec3::NEG_X), [0, 128, 128]);
    }

    #[test]
    fn test_uniform_alpha_gives_flat_normal() {
        for fill in [[0, 0, 0, 255], [255, 255, 255, 255], [90, 90, 90, 255]] {
            let mut alpha = CpuSurface::try_new(32, 16).unwrap();
            alpha.fill(fill);
            let normal =
                build_normal_from_alpha(&mut CpuBackend, &alpha, &NormalOptions::from(&EngravingSettings::default()))
                    .unwrap();
            assert!(normal.pixels().iter().all(|p| *p == [128, 128, 255, 255]));
        }
    }

    #[test]
    fn test_gradient_direction() {
        // Height rising to the right tilts normals toward -x
        let heights: Vec<f32> = (0..5).map(|x| x as f32 / 4.0).collect();
        let normals = normals_from_heights(&heights, 5, 1, 2.0);
        let [r, g, b, a] = normals[2];
        assert!(r < 128);
        assert_eq!(g, 128);
        assert!(b < 255);
        assert_eq!(a, 255);
    }

    #[test]
    fn test_input_surface_untouched() {
        let mut alpha = CpuSurface::try_new(16, 16).unwrap();
        alpha.fill([0, 0, 0, 255]);
        alpha.set_pixel(8, 8, [255, 255, 255, 255]);
        let before = alpha.clone();

        let options = NormalOptions {
            invert: true,
            blur_fraction: 0.1,
            strength: 2.0,
        };
        let normal = build_normal_from_alpha(&mut CpuBackend, &alpha, &options).unwrap();
        assert_eq!(alpha, before);
        assert_eq!((normal.width, normal.height), (16, 16));
        assert!(normal.pixels().iter().all(|p| p[3] == 255));
    }

    #[test]
    fn test_luminance() {
        assert_eq!(luminance([255, 255, 255, 255]), 255);
        assert_eq!(luminance([0, 0, 0, 0]), 0);
        assert_eq!(luminance([128, 128, 128, 255]), 128);
    }
}
