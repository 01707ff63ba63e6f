//! Live engine material model
//!
//! Mesh materials are derived state: the resolver and the engraving renderer
//! write onto them, nothing reads back from them into the descriptor table.

use tracing::trace;

use crate::error::MaterialError;
use crate::resolve::ResolvedMaterial;

/// Texture coordinate transform
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UvTransform {
    pub u_offset: f32,
    pub v_offset: f32,
    pub u_scale: f32,
    pub v_scale: f32,
    /// W rotation in degrees
    pub w_ang: f32,
}

impl Default for UvTransform {
    fn default() -> Self {
        Self {
            u_offset: 0.0,
            v_offset: 0.0,
            u_scale: 1.0,
            v_scale: 1.0,
            w_ang: 0.0,
        }
    }
}

/// Identifier of a procedurally generated texture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureId(pub u64);

/// Where a bound texture's pixels come from
#[derive(Debug, Clone, PartialEq)]
pub enum TextureSource {
    /// Texture file from the texture set
    Asset(String),
    /// Texture produced at runtime (engraving rasters)
    Generated(TextureId),
}

/// A texture bound to a material input
#[derive(Debug, Clone, PartialEq)]
pub struct TextureBinding {
    pub source: TextureSource,
    /// Derive alpha from the RGB luminance instead of the alpha channel
    pub get_alpha_from_rgb: bool,
    /// Flip rows on upload
    pub invert_y: bool,
    pub anisotropic_level: u32,
}

impl TextureBinding {
    /// Binding for a texture-set file with loader defaults
    pub fn asset(name: impl Into<String>) -> Self {
        Self {
            source: TextureSource::Asset(name.into()),
            get_alpha_from_rgb: false,
            invert_y: true,
            anisotropic_level: 1,
        }
    }

    /// Binding for a generated raster (rows are already top-down)
    pub fn generated(id: TextureId, anisotropic_level: u32) -> Self {
        Self {
            source: TextureSource::Generated(id),
            get_alpha_from_rgb: false,
            invert_y: false,
            anisotropic_level,
        }
    }

    pub fn is_generated(&self) -> bool {
        matches!(self.source, TextureSource::Generated(_))
    }
}

/// How the material handles transparency
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransparencyMode {
    #[default]
    Opaque,
    AlphaTest,
    AlphaBlend,
    AlphaTestAndBlend,
}

/// The live material on one mesh instance
#[derive(Debug, Clone, PartialEq)]
pub struct LiveMaterial {
    /// Name of the descriptor last applied, if any
    pub material_name: Option<String>,
    /// sRGB base color
    pub base_color: [f32; 3],
    pub metallic: f32,
    pub roughness: f32,
    pub alpha: f32,
    pub albedo_texture: Option<TextureBinding>,
    pub metallic_texture: Option<TextureBinding>,
    pub micro_surface_texture: Option<TextureBinding>,
    pub ambient_texture: Option<TextureBinding>,
    pub opacity_texture: Option<TextureBinding>,
    pub bump_texture: Option<TextureBinding>,
    pub lightmap_texture: Option<TextureBinding>,
    pub uv: UvTransform,
    pub use_lightmap_as_shadowmap: bool,
    pub back_face_culling: bool,
    pub transparency_mode: TransparencyMode,
    pub needs_depth_prepass: bool,
    /// Bumped whenever derived GPU state must be regenerated
    pub revision: u64,
}

impl Default for LiveMaterial {
    fn default() -> Self {
        Self {
            material_name: None,
            base_color: [1.0, 1.0, 1.0],
            metallic: 0.0,
            roughness: 0.5,
            alpha: 1.0,
            albedo_texture: None,
            metallic_texture: None,
            micro_surface_texture: None,
            ambient_texture: None,
            opacity_texture: None,
            bump_texture: None,
            lightmap_texture: None,
            uv: UvTransform::default(),
            use_lightmap_as_shadowmap: true,
            back_face_culling: true,
            transparency_mode: TransparencyMode::Opaque,
            needs_depth_prepass: false,
            revision: 0,
        }
    }
}

impl LiveMaterial {
    /// Flag the material so renderers regenerate derived state
    #[inline]
    pub fn mark_dirty(&mut self) {
        self.revision = self.revision.wrapping_add(1);
    }

    /// Write every property of a resolved material onto this material.
    ///
    /// With `preserve_generated`, the opacity and bump inputs are left alone
    /// because a procedural producer owns them. The color is parsed before
    /// anything is written, so an invalid color leaves the material untouched.
    pub fn apply_resolved(
        &mut self,
        resolved: &ResolvedMaterial,
        preserve_generated: bool,
    ) -> Result<(), MaterialError> {
        let base_color = parse_hex_color(&resolved.base_color)?;

        self.material_name = Some(resolved.name.clone());
        self.base_color = base_color;
        self.metallic = resolved.metallic as f32;
        self.roughness = resolved.roughness as f32;
        self.alpha = resolved.alpha as f32;

        let textures = &resolved.textures;
        self.albedo_texture = textures.albedo.as_deref().map(TextureBinding::asset);
        self.metallic_texture = textures.metallic.as_deref().map(TextureBinding::asset);
        self.micro_surface_texture = textures.micro_surface.as_deref().map(TextureBinding::asset);
        self.ambient_texture = textures.ambient.as_deref().map(TextureBinding::asset);
        self.lightmap_texture = textures.lightmap.as_deref().map(TextureBinding::asset);
        if !preserve_generated {
            self.opacity_texture = textures.opacity.as_deref().map(TextureBinding::asset);
            self.bump_texture = textures.bump.as_deref().map(TextureBinding::asset);
        }

        self.uv = resolved.uv.to_transform();
        self.use_lightmap_as_shadowmap = resolved.use_lightmap_as_shadowmap;
        self.back_face_culling = resolved.back_face_culling;
        self.mark_dirty();

        trace!(
            "LiveMaterial::apply_resolved: {} (preserve_generated={})",
            resolved.name,
            preserve_generated
        );
        Ok(())
    }
}

/// Parse `#rgb` or `#rrggbb` into sRGB floats
pub fn parse_hex_color(value: &str) -> Result<[f32; 3], MaterialError> {
    let invalid = || MaterialError::InvalidColor(value.to_string());
    let hex = value.trim().strip_prefix('#').ok_or_else(invalid)?;
    if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(invalid());
    }

    let channel = |s: &str| u8::from_str_radix(s, 16).map_err(|_| invalid());
    let [r, g, b] = match hex.len() {
        3 => {
            let mut out = [0u8; 3];
            for (i, c) in hex.chars().enumerate() {
                let v = channel(&c.to_string())?;
                out[i] = v * 17;
            }
            out
        }
        6 => [channel(&hex[0..2])?, channel(&hex[2..4])?, channel(&hex[4..6])?],
        _ => return Err(invalid()),
    };
    Ok([r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0])
}
