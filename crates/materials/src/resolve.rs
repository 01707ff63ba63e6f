//! Material descriptor resolution through the parent chain
//!
//! Resolution walks child -> parent and takes, for every property, the first
//! explicit value. Properties never set anywhere on the chain fall back to
//! fixed defaults, so a [`ResolvedMaterial`] has no absent fields.

use std::fmt;

use vitrine_config::{MaterialDescriptor, OrderedMap, Property, NO_TEXTURE};

use crate::error::MaterialError;
use crate::live::UvTransform;

pub const DEFAULT_BASE_COLOR: &str = "#ffffff";
pub const DEFAULT_METALLIC: f64 = 0.0;
pub const DEFAULT_ROUGHNESS: f64 = 0.5;
pub const DEFAULT_ALPHA: f64 = 1.0;

/// Every property a material descriptor can set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PropertyKey {
    BaseColor,
    Metallic,
    Roughness,
    Alpha,
    AlbedoTexture,
    MetallicTexture,
    MicroSurfaceTexture,
    AmbientTexture,
    OpacityTexture,
    BumpTexture,
    LightmapTexture,
    UOffset,
    VOffset,
    UScale,
    VScale,
    WAng,
    UseLightmapAsShadowmap,
    BackFaceCulling,
}

impl PropertyKey {
    pub const ALL: [PropertyKey; 18] = [
        PropertyKey::BaseColor,
        PropertyKey::Metallic,
        PropertyKey::Roughness,
        PropertyKey::Alpha,
        PropertyKey::AlbedoTexture,
        PropertyKey::MetallicTexture,
        PropertyKey::MicroSurfaceTexture,
        PropertyKey::AmbientTexture,
        PropertyKey::OpacityTexture,
        PropertyKey::BumpTexture,
        PropertyKey::LightmapTexture,
        PropertyKey::UOffset,
        PropertyKey::VOffset,
        PropertyKey::UScale,
        PropertyKey::VScale,
        PropertyKey::WAng,
        PropertyKey::UseLightmapAsShadowmap,
        PropertyKey::BackFaceCulling,
    ];

    /// Key name as used in the material set document
    pub fn name(self) -> &'static str {
        match self {
            PropertyKey::BaseColor => "baseColor",
            PropertyKey::Metallic => "metallic",
            PropertyKey::Roughness => "roughness",
            PropertyKey::Alpha => "alpha",
            PropertyKey::AlbedoTexture => "albedoTexture",
            PropertyKey::MetallicTexture => "metallicTexture",
            PropertyKey::MicroSurfaceTexture => "microSurfaceTexture",
            PropertyKey::AmbientTexture => "ambientTexture",
            PropertyKey::OpacityTexture => "opacityTexture",
            PropertyKey::BumpTexture => "bumpTexture",
            PropertyKey::LightmapTexture => "lightmapTexture",
            PropertyKey::UOffset => "uOffset",
            PropertyKey::VOffset => "vOffset",
            PropertyKey::UScale => "uScale",
            PropertyKey::VScale => "vScale",
            PropertyKey::WAng => "wAng",
            PropertyKey::UseLightmapAsShadowmap => "useLightmapAsShadowmap",
            PropertyKey::BackFaceCulling => "backFaceCulling",
        }
    }
}

impl fmt::Display for PropertyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A value written to a single descriptor property
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    /// Hex color string
    Color(String),
    Scalar(f64),
    /// Texture name; `None` explicitly clears the texture
    Texture(Option<String>),
    Flag(bool),
}

/// Typed property access on a descriptor
pub trait DescriptorProperties {
    /// Whether `key` is set on this descriptor rather than inherited
    fn is_explicit(&self, key: PropertyKey) -> bool;

    /// Set `key` explicitly. Fails if the value kind does not fit the key.
    fn set_property(&mut self, key: PropertyKey, value: PropertyValue) -> Result<(), MaterialError>;

    /// Drop the explicit value so `key` is inherited again
    fn clear_property(&mut self, key: PropertyKey);
}

fn texture_slot(desc: &mut MaterialDescriptor, key: PropertyKey) -> Option<&mut Property<String>> {
    Some(match key {
        PropertyKey::AlbedoTexture => &mut desc.albedo_texture,
        PropertyKey::MetallicTexture => &mut desc.metallic_texture,
        PropertyKey::MicroSurfaceTexture => &mut desc.micro_surface_texture,
        PropertyKey::AmbientTexture => &mut desc.ambient_texture,
        PropertyKey::OpacityTexture => &mut desc.opacity_texture,
        PropertyKey::BumpTexture => &mut desc.bump_texture,
        PropertyKey::LightmapTexture => &mut desc.lightmap_texture,
        _ => return None,
    })
}

fn scalar_slot(desc: &mut MaterialDescriptor, key: PropertyKey) -> Option<&mut Property<f64>> {
    Some(match key {
        PropertyKey::Metallic => &mut desc.metallic,
        PropertyKey::Roughness => &mut desc.roughness,
        PropertyKey::Alpha => &mut desc.alpha,
        PropertyKey::UOffset => &mut desc.u_offset,
        PropertyKey::VOffset => &mut desc.v_offset,
        PropertyKey::UScale => &mut desc.u_scale,
        PropertyKey::VScale => &mut desc.v_scale,
        PropertyKey::WAng => &mut desc.w_ang,
        _ => return None,
    })
}

fn flag_slot(desc: &mut MaterialDescriptor, key: PropertyKey) -> Option<&mut Property<bool>> {
    Some(match key {
        PropertyKey::UseLightmapAsShadowmap => &mut desc.use_lightmap_as_shadowmap,
        PropertyKey::BackFaceCulling => &mut desc.back_face_culling,
        _ => return None,
    })
}

impl DescriptorProperties for MaterialDescriptor {
    fn is_explicit(&self, key: PropertyKey) -> bool {
        match key {
            PropertyKey::BaseColor => self.base_color.is_explicit(),
            PropertyKey::Metallic => self.metallic.is_explicit(),
            PropertyKey::Roughness => self.roughness.is_explicit(),
            PropertyKey::Alpha => self.alpha.is_explicit(),
            PropertyKey::AlbedoTexture => self.albedo_texture.is_explicit(),
            PropertyKey::MetallicTexture => self.metallic_texture.is_explicit(),
            PropertyKey::MicroSurfaceTexture => self.micro_surface_texture.is_explicit(),
            PropertyKey::AmbientTexture => self.ambient_texture.is_explicit(),
            PropertyKey::OpacityTexture => self.opacity_texture.is_explicit(),
            PropertyKey::BumpTexture => self.bump_texture.is_explicit(),
            PropertyKey::LightmapTexture => self.lightmap_texture.is_explicit(),
            PropertyKey::UOffset => self.u_offset.is_explicit(),
            PropertyKey::VOffset => self.v_offset.is_explicit(),
            PropertyKey::UScale => self.u_scale.is_explicit(),
            PropertyKey::VScale => self.v_scale.is_explicit(),
            PropertyKey::WAng => self.w_ang.is_explicit(),
            PropertyKey::UseLightmapAsShadowmap => self.use_lightmap_as_shadowmap.is_explicit(),
            PropertyKey::BackFaceCulling => self.back_face_culling.is_explicit(),
        }
    }

    fn set_property(&mut self, key: PropertyKey, value: PropertyValue) -> Result<(), MaterialError> {
        match value {
            PropertyValue::Color(color) if key == PropertyKey::BaseColor => {
                crate::live::parse_hex_color(&color)?;
                self.base_color = Property::Explicit(color);
            }
            PropertyValue::Texture(texture) => {
                let slot = texture_slot(self, key).ok_or(MaterialError::PropertyKind {
                    key,
                    expected: expected_kind(key),
                })?;
                *slot = Property::Explicit(texture.unwrap_or_else(|| NO_TEXTURE.to_string()));
            }
            PropertyValue::Scalar(value) => {
                let slot = scalar_slot(self, key).ok_or(MaterialError::PropertyKind {
                    key,
                    expected: expected_kind(key),
                })?;
                *slot = Property::Explicit(value);
            }
            PropertyValue::Flag(value) => {
                let slot = flag_slot(self, key).ok_or(MaterialError::PropertyKind {
                    key,
                    expected: expected_kind(key),
                })?;
                *slot = Property::Explicit(value);
            }
            PropertyValue::Color(_) => {
                return Err(MaterialError::PropertyKind {
                    key,
                    expected: expected_kind(key),
                });
            }
        }
        Ok(())
    }

    fn clear_property(&mut self, key: PropertyKey) {
        if key == PropertyKey::BaseColor {
            self.base_color = Property::Inherited;
        } else if let Some(slot) = texture_slot(self, key) {
            *slot = Property::Inherited;
        } else if let Some(slot) = scalar_slot(self, key) {
            *slot = Property::Inherited;
        } else if let Some(slot) = flag_slot(self, key) {
            *slot = Property::Inherited;
        }
    }
}

fn expected_kind(key: PropertyKey) -> &'static str {
    match key {
        PropertyKey::BaseColor => "color",
        PropertyKey::AlbedoTexture
        | PropertyKey::MetallicTexture
        | PropertyKey::MicroSurfaceTexture
        | PropertyKey::AmbientTexture
        | PropertyKey::OpacityTexture
        | PropertyKey::BumpTexture
        | PropertyKey::LightmapTexture => "texture",
        PropertyKey::UseLightmapAsShadowmap | PropertyKey::BackFaceCulling => "flag",
        _ => "scalar",
    }
}

/// Texture references of a resolved material; `None` means no texture
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MaterialTextures {
    pub albedo: Option<String>,
    pub metallic: Option<String>,
    pub micro_surface: Option<String>,
    pub ambient: Option<String>,
    pub opacity: Option<String>,
    pub bump: Option<String>,
    pub lightmap: Option<String>,
}

/// Texture coordinate parameters at table precision
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UvParameters {
    pub u_offset: f64,
    pub v_offset: f64,
    pub u_scale: f64,
    pub v_scale: f64,
    /// W rotation in degrees
    pub w_ang: f64,
}

impl Default for UvParameters {
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

impl UvParameters {
    /// Narrow to the engine transform
    pub fn to_transform(&self) -> UvTransform {
        UvTransform {
            u_offset: self.u_offset as f32,
            v_offset: self.v_offset as f32,
            u_scale: self.u_scale as f32,
            v_scale: self.v_scale as f32,
            w_ang: self.w_ang as f32,
        }
    }
}

/// A material with every property populated
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedMaterial {
    pub name: String,
    pub base_color: String,
    pub metallic: f64,
    pub roughness: f64,
    pub alpha: f64,
    pub textures: MaterialTextures,
    pub uv: UvParameters,
    pub use_lightmap_as_shadowmap: bool,
    pub back_face_culling: bool,
}

/// Descriptors from `name` up to its root, child first.
///
/// A chain longer than the table itself can only come from a cycle.
pub fn inheritance_chain<'a>(
    materials: &'a OrderedMap<MaterialDescriptor>,
    name: &str,
) -> Result<Vec<&'a MaterialDescriptor>, MaterialError> {
    let mut chain = Vec::new();
    let mut current = name;
    loop {
        let descriptor = materials.get(current).ok_or_else(|| MaterialError::NotFound {
            name: current.to_string(),
        })?;
        chain.push(descriptor);
        if chain.len() > materials.len() {
            return Err(MaterialError::CyclicInheritance {
                name: name.to_string(),
            });
        }
        match descriptor.parent_name() {
            Some(parent) => current = parent,
            None => return Ok(chain),
        }
    }
}

fn first_explicit<T: Clone>(
    chain: &[&MaterialDescriptor],
    property: impl Fn(&MaterialDescriptor) -> &Property<T>,
) -> Option<T> {
    chain
        .iter()
        .find_map(|descriptor| property(descriptor).explicit().cloned())
}

fn texture_ref(
    chain: &[&MaterialDescriptor],
    property: impl Fn(&MaterialDescriptor) -> &Property<String>,
) -> Option<String> {
    first_explicit(chain, property)
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty() && !name.eq_ignore_ascii_case(NO_TEXTURE))
}

/// Resolve `name` through its parent chain into a fully populated material.
pub fn resolve_material(
    materials: &OrderedMap<MaterialDescriptor>,
    name: &str,
) -> Result<ResolvedMaterial, MaterialError> {
    let chain = inheritance_chain(materials, name)?;
    let chain = chain.as_slice();

    let identity = UvParameters::default();
    Ok(ResolvedMaterial {
        name: name.to_string(),
        base_color: first_explicit(chain, |d| &d.base_color)
            .unwrap_or_else(|| DEFAULT_BASE_COLOR.to_string()),
        metallic: first_explicit(chain, |d| &d.metallic).unwrap_or(DEFAULT_METALLIC),
        roughness: first_explicit(chain, |d| &d.roughness).unwrap_or(DEFAULT_ROUGHNESS),
        alpha: first_explicit(chain, |d| &d.alpha).unwrap_or(DEFAULT_ALPHA),
        textures: MaterialTextures {
            albedo: texture_ref(chain, |d| &d.albedo_texture),
            metallic: texture_ref(chain, |d| &d.metallic_texture),
            micro_surface: texture_ref(chain, |d| &d.micro_surface_texture),
            ambient: texture_ref(chain, |d| &d.ambient_texture),
            opacity: texture_ref(chain, |d| &d.opacity_texture),
            bump: texture_ref(chain, |d| &d.bump_texture),
            lightmap: texture_ref(chain, |d| &d.lightmap_texture),
        },
        uv: UvParameters {
            u_offset: first_explicit(chain, |d| &d.u_offset).unwrap_or(identity.u_offset),
            v_offset: first_explicit(chain, |d| &d.v_offset).unwrap_or(identity.v_offset),
            u_scale: first_explicit(chain, |d| &d.u_scale).unwrap_or(identity.u_scale),
            v_scale: first_explicit(chain, |d| &d.v_scale).unwrap_or(identity.v_scale),
            w_ang: first_explicit(chain, |d| &d.w_ang).unwrap_or(identity.w_ang),
        },
        use_lightmap_as_shadowmap: first_explicit(chain, |d| &d.use_lightmap_as_shadowmap)
            .unwrap_or(true),
        back_face_culling: first_explicit(chain, |d| &d.back_face_culling).unwrap_or(true),
    })
}
