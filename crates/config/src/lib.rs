//! Shared configuration for Vitrine
//!
//! This crate provides the single source of truth for the engraving raster
//! constants, the runtime tag defaults, and the JSON document contracts
//! exchanged with the persistence layer:
//! - [`MaterialSetDocument`] - `{ materials: { [name]: MaterialDescriptor } }`
//! - [`ModelSetDocument`] - `{ models: { [key]: { meshes: { [name]: MeshEntry } } } }`
//! - [`Property`] - explicit-or-inherited material property values

mod document;
mod error;
mod ordered_map;
mod property;

pub use document::*;
pub use error::ConfigError;
pub use ordered_map::OrderedMap;
pub use property::Property;

use std::path::Path;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

#[cfg(feature = "bevy")]
use bevy::prelude::Resource;

/// Environment variable holding the path of the runtime config file
pub const CONFIG_ENV_VAR: &str = "VITRINE_CONFIG";

/// Tag that gates the procedural engraving surfaces
pub const ENGRAVING_TAG: &str = "engraving";

/// Tag enabled at scene load for the default material family
pub const BASE_TAG: &str = "base";

/// Fixed engraving raster height in pixels
pub const DEFAULT_RASTER_HEIGHT: u32 = 1024;

/// Lower bound for the engraving aspect ratio
pub const MIN_ASPECT: f32 = 0.1;

/// Upper bound for the engraving aspect ratio
pub const MAX_ASPECT: f32 = 10.0;

/// Floor applied to bounding-box extents before taking their ratio
pub const EXTENT_EPSILON: f32 = 0.0001;

/// Gradient multiplier used when deriving the normal map
pub const DEFAULT_NORMAL_STRENGTH: f32 = 2.0;

/// Blur radius as a fraction of the smaller raster dimension
pub const DEFAULT_BLUR_FRACTION: f32 = 0.1;

/// Starting font size as a fraction of the raster height
pub const MAX_FONT_FRACTION: f32 = 0.35;

/// Font size decrement while fitting text
pub const FONT_SIZE_STEP: u32 = 4;

/// Smallest font size the fitter will go down to
pub const MIN_FONT_SIZE: u32 = 32;

/// Share of the raster width the text may occupy
pub const TEXT_WIDTH_FRACTION: f32 = 0.9;

/// Ceiling for anisotropic filtering on generated textures
pub const MAX_ANISOTROPY: u32 = 16;

/// Engraving raster and normal-map generation settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngravingSettings {
    /// Raster height in pixels (width follows the aspect ratio)
    pub base_height: u32,
    /// Clamp range for the bounding-box aspect ratio
    pub min_aspect: f32,
    pub max_aspect: f32,
    /// Floor for bounding-box extents
    pub extent_epsilon: f32,
    /// Starting font size relative to the raster height
    pub max_font_fraction: f32,
    /// Font size decrement in pixels
    pub font_size_step: u32,
    /// Minimum font size in pixels
    pub min_font_size: u32,
    /// Maximum text width relative to the raster width
    pub text_width_fraction: f32,
    /// Blur radius relative to `min(width, height)`
    pub blur_fraction: f32,
    /// Gradient multiplier for the normal map
    pub normal_strength: f32,
    /// Invert luminance before building the height field (engraved look)
    pub invert_height: bool,
    /// Ceiling for anisotropic filtering
    pub max_anisotropy: u32,
    /// Tag that marks engraving surfaces
    pub tag: String,
}

impl Default for EngravingSettings {
    fn default() -> Self {
        Self {
            base_height: DEFAULT_RASTER_HEIGHT,
            min_aspect: MIN_ASPECT,
            max_aspect: MAX_ASPECT,
            extent_epsilon: EXTENT_EPSILON,
            max_font_fraction: MAX_FONT_FRACTION,
            font_size_step: FONT_SIZE_STEP,
            min_font_size: MIN_FONT_SIZE,
            text_width_fraction: TEXT_WIDTH_FRACTION,
            blur_fraction: DEFAULT_BLUR_FRACTION,
            normal_strength: DEFAULT_NORMAL_STRENGTH,
            invert_height: true,
            max_anisotropy: MAX_ANISOTROPY,
            tag: ENGRAVING_TAG.to_string(),
        }
    }
}

impl EngravingSettings {
    /// Settings with a different raster height, everything else default
    pub fn with_base_height(base_height: u32) -> Self {
        Self {
            base_height,
            ..Self::default()
        }
    }

    /// Raster dimensions `(width, height)` for an aspect ratio
    ///
    /// Height is fixed; width is `max(2, round(height * aspect))`.
    pub fn raster_size(&self, aspect: f32) -> (u32, u32) {
        let height = self.base_height.max(1);
        let width = ((height as f32 * aspect).round() as u32).max(2);
        (width, height)
    }
}

/// Runtime configuration for a configurator session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "bevy", derive(Resource))]
#[serde(default)]
pub struct RuntimeConfig {
    /// Tags active at scene load
    pub default_tags: Vec<String>,
    /// Tags whose meshes have their opacity and bump textures owned by a
    /// procedural producer rather than the material table
    pub exclusive_tags: Vec<String>,
    /// Engraving generation settings
    pub engraving: EngravingSettings,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            default_tags: vec![BASE_TAG.to_string()],
            exclusive_tags: vec![ENGRAVING_TAG.to_string()],
            engraving: EngravingSettings::default(),
        }
    }
}

impl RuntimeConfig {
    /// Load from the file named by `VITRINE_CONFIG`, or defaults when the
    /// variable is unset or the file does not exist
    pub fn from_env() -> Result<Self, ConfigError> {
        match std::env::var(CONFIG_ENV_VAR) {
            Ok(path) if !path.is_empty() && Path::new(&path).exists() => load_json(path),
            _ => Ok(Self::default()),
        }
    }
}

/// Read and deserialize a JSON document from disk
pub fn load_json<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<T, ConfigError> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })?;
    Ok(serde_json::from_str(&text)?)
}

/// Serialize a document as pretty-printed JSON and write it to disk
pub fn save_json<T: Serialize>(path: impl AsRef<Path>, value: &T) -> Result<(), ConfigError> {
    let path = path.as_ref();
    let text = serde_json::to_string_pretty(value)?;
    std::fs::write(path, text).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })
}
