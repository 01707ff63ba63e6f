//! Separable Gaussian blur approximated by three box passes
//!
//! Samples past the border are clamped to the nearest edge pixel, so a
//! uniform image stays uniform.

/// Number of box passes used to approximate the Gaussian
const BOX_PASSES: usize = 3;

/// Box widths whose successive application approximates a Gaussian with
/// standard deviation `sigma`
pub fn box_sizes(sigma: f32) -> [usize; BOX_PASSES] {
    let n = BOX_PASSES as f32;
    let ideal = (12.0 * sigma * sigma / n + 1.0).sqrt();
    let mut lower = ideal.floor() as i64;
    if lower % 2 == 0 {
        lower -= 1;
    }
    let lower = lower.max(1);
    let upper = lower + 2;

    let l = lower as f32;
    let m_ideal = (12.0 * sigma * sigma - n * l * l - 4.0 * n * l - 3.0 * n) / (-4.0 * l - 4.0);
    let m = m_ideal.round().max(0.0) as usize;

    let mut sizes = [upper as usize; BOX_PASSES];
    for (i, size) in sizes.iter_mut().enumerate() {
        if i < m {
            *size = lower as usize;
        }
    }
    sizes
}

/// Blur an RGBA float buffer in place with edge clamping
pub fn gaussian_blur(pixels: &mut [[f32; 4]], width: usize, height: usize, sigma: f32) {
    if width == 0 || height == 0 || sigma.is_nan() || sigma <= 0.0 || pixels.len() != width * height {
        return;
    }

    let mut scratch = vec![[0.0f32; 4]; width.max(height)];
    let mut line = vec![[0.0f32; 4]; width.max(height)];

    for size in box_sizes(sigma) {
        let radius = (size - 1) / 2;
        if radius == 0 {
            continue;
        }

        for row in pixels.chunks_exact_mut(width) {
            line[..width].copy_from_slice(row);
            box_blur_line(&line[..width], &mut scratch[..width], radius);
            row.copy_from_slice(&scratch[..width]);
        }

        for x in 0..width {
            for y in 0..height {
                line[y] = pixels[y * width + x];
            }
            box_blur_line(&line[..height], &mut scratch[..height], radius);
            for y in 0..height {
                pixels[y * width + x] = scratch[y];
            }
        }
    }
}

/// Running-sum box filter over one line
fn box_blur_line(src: &[[f32; 4]], dst: &mut [[f32; 4]], radius: usize) {
    let n = src.len();
    let last = n as isize - 1;
    let at = |i: isize| src[i.clamp(0, last) as usize];
    let scale = 1.0 / (2 * radius + 1) as f32;
    let r = radius as isize;

    let mut acc = [0.0f32; 4];
    for i in -r..=r {
        add(&mut acc, &at(i), 1.0);
    }

    for (x, out) in dst.iter_mut().enumerate() {
        let x = x as isize;
        *out = acc.map(|c| c * scale);
        add(&mut acc, &at(x + r + 1), 1.0);
        add(&mut acc, &at(x - r), -1.0);
    }
}

#[inline]
fn add(acc: &mut [f32; 4], value: &[f32; 4], sign: f32) {
    for (a, v) in acc.iter_mut().zip(value) {
        *a += sign * v;
    }
}
