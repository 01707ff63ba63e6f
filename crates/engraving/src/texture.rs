//! Generated engraving textures

use image::RgbaImage;

use vitrine_materials::TextureId;

/// A generated RGBA8 texture owned by the engraving renderer.
///
/// The id stays fixed for the renderer's lifetime; regeneration replaces the
/// pixels in place and bumps the revision.
#[derive(Debug, Clone, PartialEq)]
pub struct EngravingTexture {
    id: TextureId,
    width: u32,
    height: u32,
    pixels: Vec<[u8; 4]>,
    revision: u64,
}

impl EngravingTexture {
    pub(crate) fn new(id: TextureId, width: u32, height: u32, pixels: Vec<[u8; 4]>) -> Self {
        Self {
            id,
            width,
            height,
            pixels,
            revision: 0,
        }
    }

    /// Replace contents and dimensions, keeping the id
    pub(crate) fn replace(&mut self, width: u32, height: u32, pixels: Vec<[u8; 4]>) {
        self.width = width;
        self.height = height;
        self.pixels = pixels;
        self.revision = self.revision.wrapping_add(1);
    }

    #[inline]
    pub fn id(&self) -> TextureId {
        self.id
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn pixels(&self) -> &[[u8; 4]] {
        &self.pixels
    }

    /// Raw RGBA bytes for GPU upload
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.pixels)
    }

    /// Copy into an `image` buffer, e.g. for saving a preview
    pub fn to_image(&self) -> Option<RgbaImage> {
        RgbaImage::from_raw(self.width, self.height, self.as_bytes().to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_replace_keeps_id() {
        let mut texture = EngravingTexture::new(TextureId(3), 2, 1, vec![[0; 4]; 2]);
        texture.replace(1, 1, vec![[9; 4]]);
        assert_eq!(texture.id(), TextureId(3));
        assert_eq!((texture.width(), texture.height()), (1, 1));
        assert_eq!(texture.revision(), 1);
        assert_eq!(texture.as_bytes(), &[9, 9, 9, 9]);
    }

    #[test]
    fn test_to_image() {
        let texture = EngravingTexture::new(TextureId(1), 2, 1, vec![[1, 2, 3, 4], [5, 6, 7, 8]]);
        let image = texture.to_image().unwrap();
        assert_eq!(image.dimensions(), (2, 1));
        assert_eq!(image.get_pixel(1, 0).0, [5, 6, 7, 8]);
    }
}
