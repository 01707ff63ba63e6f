//! JSON document contracts shared with the persistence layer

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::ordered_map::OrderedMap;
use crate::property::Property;

/// Parent value marking a descriptor as a root
pub const NO_PARENT: &str = "none";

/// Texture reference value meaning "no texture"
pub const NO_TEXTURE: &str = "None";

/// A named PBR material definition as stored in the material set document.
///
/// Every property may be left [`Property::Inherited`], in which case it is
/// taken from the parent chain when the material is resolved. Scalars are
/// kept as `f64` so exported documents carry the numbers as written.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaterialDescriptor {
    /// Parent material name, or `"none"` for a root
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,

    #[serde(default, skip_serializing_if = "Property::is_inherited")]
    pub base_color: Property<String>,
    #[serde(default, skip_serializing_if = "Property::is_inherited")]
    pub metallic: Property<f64>,
    #[serde(default, skip_serializing_if = "Property::is_inherited")]
    pub roughness: Property<f64>,
    #[serde(default, skip_serializing_if = "Property::is_inherited")]
    pub alpha: Property<f64>,

    #[serde(default, skip_serializing_if = "Property::is_inherited")]
    pub albedo_texture: Property<String>,
    #[serde(default, skip_serializing_if = "Property::is_inherited")]
    pub metallic_texture: Property<String>,
    #[serde(default, skip_serializing_if = "Property::is_inherited")]
    pub micro_surface_texture: Property<String>,
    #[serde(default, skip_serializing_if = "Property::is_inherited")]
    pub ambient_texture: Property<String>,
    #[serde(default, skip_serializing_if = "Property::is_inherited")]
    pub opacity_texture: Property<String>,
    #[serde(default, skip_serializing_if = "Property::is_inherited")]
    pub bump_texture: Property<String>,
    #[serde(default, skip_serializing_if = "Property::is_inherited")]
    pub lightmap_texture: Property<String>,

    #[serde(default, skip_serializing_if = "Property::is_inherited")]
    pub u_offset: Property<f64>,
    #[serde(default, skip_serializing_if = "Property::is_inherited")]
    pub v_offset: Property<f64>,
    #[serde(default, skip_serializing_if = "Property::is_inherited")]
    pub u_scale: Property<f64>,
    #[serde(default, skip_serializing_if = "Property::is_inherited")]
    pub v_scale: Property<f64>,
    /// W rotation in degrees
    #[serde(default, skip_serializing_if = "Property::is_inherited")]
    pub w_ang: Property<f64>,

    #[serde(default, skip_serializing_if = "Property::is_inherited")]
    pub use_lightmap_as_shadowmap: Property<bool>,
    #[serde(default, skip_serializing_if = "Property::is_inherited")]
    pub back_face_culling: Property<bool>,
}

impl MaterialDescriptor {
    /// Parent name with the `"none"` sentinel filtered out
    pub fn parent_name(&self) -> Option<&str> {
        self.parent
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty() && !name.eq_ignore_ascii_case(NO_PARENT))
    }
}

/// `{ materials: { [name]: MaterialDescriptor } }`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MaterialSetDocument {
    #[serde(default)]
    pub materials: OrderedMap<MaterialDescriptor>,
}

/// `{ models: { [modelKey]: ModelEntry } }`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelSetDocument {
    #[serde(default)]
    pub models: OrderedMap<ModelEntry>,
}

/// Meshes of one model, keyed by base mesh name
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelEntry {
    #[serde(default)]
    pub meshes: OrderedMap<MeshEntry>,
}

/// Material slots and gating tags for one base mesh
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeshEntry {
    /// `material_slots[i]` is the material for slot `i + 1`
    #[serde(default)]
    pub material_slots: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl FromStr for MaterialSetDocument {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(serde_json::from_str(s)?)
    }
}

impl FromStr for ModelSetDocument {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(serde_json::from_str(s)?)
    }
}
