//! Vitrine engraving - procedural text rasters for engraved surfaces
//!
//! Turns a line of text into two textures bound on every mesh carrying the
//! engraving tag:
//! - an alpha raster (white text on black) used as the opacity input
//! - a normal map derived from the blurred, inverted alpha raster
//!
//! Drawing goes through the [`RasterSurface`] capability so hosts can swap
//! the CPU implementation for a GPU one.

pub mod aspect;
pub mod blur;
pub mod normal;
pub mod renderer;
pub mod surface;
pub mod text;
pub mod texture;

pub use aspect::{aspect_from_extents, DEFAULT_ASPECT};
pub use normal::{build_normal_from_alpha, encode_normal, NormalOptions};
pub use renderer::{EngravingRenderer, EngravingTextures};
pub use surface::{CpuBackend, CpuSurface, RasterBackend, RasterSurface, SurfaceError};
pub use text::{fit_font_size, measure_text, TextStyle};
pub use texture::EngravingTexture;
