//! Bitmap text rasterization and font fitting
//!
//! Glyphs come from the 8x8 public-domain font in `font8x8`. Each glyph
//! occupies a square cell of `font_size` pixels, rows top to bottom, bit 0
//! of a row byte being the leftmost column. Coverage is estimated with a
//! 2x2 supersample per pixel.

use font8x8::legacy::BASIC_LEGACY;

use crate::surface::RasterSurface;
use vitrine_config::EngravingSettings;

/// Glyph grid size in cells
const GLYPH_CELLS: f32 = 8.0;

/// Sub-pixel sample offsets
const SAMPLES: [(f32, f32); 4] = [(0.25, 0.25), (0.75, 0.25), (0.25, 0.75), (0.75, 0.75)];

/// How text is drawn onto a surface
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextStyle {
    /// Glyph cell size in pixels
    pub font_size: f32,
    pub color: [u8; 4],
    /// Thicken strokes by half a glyph cell
    pub bold: bool,
    /// Point the text is centered on
    pub center: (f32, f32),
}

impl TextStyle {
    /// Bold text centered on a `width` x `height` surface
    pub fn centered(font_size: f32, color: [u8; 4], width: u32, height: u32) -> Self {
        Self {
            font_size,
            color,
            bold: true,
            center: (width as f32 / 2.0, height as f32 / 2.0),
        }
    }
}

/// Glyph bitmap for a character, `?` for anything outside ASCII
pub fn glyph_for_char(ch: char) -> [u8; 8] {
    let index = ch as usize;
    if index < BASIC_LEGACY.len() {
        BASIC_LEGACY[index]
    } else {
        BASIC_LEGACY[b'?' as usize]
    }
}

/// Rendered width of `text`: one `font_size` advance per character
pub fn measure_text(text: &str, font_size: f32) -> f32 {
    text.chars().count() as f32 * font_size
}

/// Largest font size that keeps `text` within the width budget.
///
/// Starts at a fraction of the surface height and steps down until the text
/// fits or the minimum size is reached. Overlong text is drawn at the minimum
/// size and clipped by the surface edges.
pub fn fit_font_size<S: RasterSurface + ?Sized>(
    surface: &S,
    text: &str,
    settings: &EngravingSettings,
) -> f32 {
    let max_width = surface.width() as f32 * settings.text_width_fraction;
    let min_size = settings.min_font_size.max(1);
    let step = settings.font_size_step.max(1);
    let mut size = ((surface.height() as f32 * settings.max_font_fraction).floor() as u32).max(min_size);

    while size > min_size && surface.measure_text(text, size as f32) > max_width {
        size = size.saturating_sub(step).max(min_size);
    }
    size as f32
}

#[inline]
fn glyph_bit(glyph: &[u8; 8], column: i32, row: i32) -> bool {
    if !(0..8).contains(&column) || !(0..8).contains(&row) {
        return false;
    }
    glyph[row as usize] & (1 << column) != 0
}

/// Draw `text` into an RGBA pixel buffer, blending by coverage
pub fn draw_text(pixels: &mut [[u8; 4]], width: u32, height: u32, text: &str, style: &TextStyle) {
    let glyphs: Vec<[u8; 8]> = text.chars().map(glyph_for_char).collect();
    if glyphs.is_empty() || style.font_size <= 0.0 || pixels.len() != (width as usize) * (height as usize) {
        return;
    }

    let cell = style.font_size / GLYPH_CELLS;
    let text_width = measure_text(text, style.font_size);
    let origin_x = style.center.0 - text_width / 2.0;
    let origin_y = style.center.1 - style.font_size / 2.0;

    let x_start = origin_x.floor().max(0.0) as u32;
    let x_end = ((origin_x + text_width).ceil().max(0.0) as u32).min(width);
    let y_start = origin_y.floor().max(0.0) as u32;
    let y_end = ((origin_y + style.font_size).ceil().max(0.0) as u32).min(height);

    let covered = |u: f32, v: f32| -> bool {
        if u < 0.0 || v < 0.0 {
            return false;
        }
        let index = (u / GLYPH_CELLS) as usize;
        let Some(glyph) = glyphs.get(index) else {
            return false;
        };
        let local = u - index as f32 * GLYPH_CELLS;
        let row = v as i32;
        glyph_bit(glyph, local as i32, row)
            || (style.bold && glyph_bit(glyph, (local - 0.5).floor() as i32, row))
    };

    for py in y_start..y_end {
        for px in x_start..x_end {
            let hits = SAMPLES
                .iter()
                .filter(|(sx, sy)| {
                    let u = (px as f32 + sx - origin_x) / cell;
                    let v = (py as f32 + sy - origin_y) / cell;
                    covered(u, v)
                })
                .count();
            if hits == 0 {
                continue;
            }

            let coverage = hits as f32 / SAMPLES.len() as f32;
            let dst = &mut pixels[(py as usize) * (width as usize) + px as usize];
            for (d, s) in dst.iter_mut().zip(style.color) {
                *d = (*d as f32 * (1.0 - coverage) + s as f32 * coverage).round() as u8;
            }
        }
    }
}
