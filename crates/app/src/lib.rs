//! Vitrine - product configurator core
//!
//! [`Configurator`] owns one session: the tag resolver, the engraving
//! renderer and the mesh registry they both act on. Hosts construct it
//! explicitly and route UI events (tag toggles, engraving text, aspect
//! overrides, material edits) through it.

pub mod args;
pub mod error;
pub mod layout;

use std::path::{Path, PathBuf};

use tracing::{debug, info};

pub use error::AppError;
pub use layout::scene_from_models;

use vitrine_config::{
    load_json, save_json, MaterialSetDocument, ModelSetDocument, RuntimeConfig,
};
use vitrine_engraving::{CpuBackend, EngravingRenderer, EngravingTexture, RasterBackend};
use vitrine_materials::{
    ApplyReport, MaterialError, MeshRegistry, PropertyKey, PropertyValue, ResolvedMaterial, Scene,
    TagResolver,
};

/// File name of the saved alpha raster
pub const ALPHA_PREVIEW: &str = "engraving_alpha.png";

/// File name of the saved normal map
pub const NORMAL_PREVIEW: &str = "engraving_normal.png";

/// A configurator session
pub struct Configurator<R: MeshRegistry = Scene, B: RasterBackend = CpuBackend> {
    config: RuntimeConfig,
    resolver: TagResolver,
    engraving: EngravingRenderer<B>,
    registry: R,
}

impl Configurator {
    /// Load the material and model documents and lay out a stand-in scene
    pub fn load(
        config: RuntimeConfig,
        materials: impl AsRef<Path>,
        models: impl AsRef<Path>,
    ) -> Result<Self, AppError> {
        let materials: MaterialSetDocument = load_json(materials)?;
        let models: ModelSetDocument = load_json(models)?;
        let scene = scene_from_models(&models, &config.engraving.tag);
        Ok(Self::new(config, materials, &models, scene, CpuBackend))
    }
}

impl<R: MeshRegistry, B: RasterBackend> Configurator<R, B> {
    /// Start a session and apply the default tags, as at scene load
    pub fn new(
        config: RuntimeConfig,
        materials: MaterialSetDocument,
        models: &ModelSetDocument,
        registry: R,
        backend: B,
    ) -> Self {
        let resolver = TagResolver::new(materials, models, &config);
        let engraving = EngravingRenderer::with_backend(backend, config.engraving.clone());
        let mut configurator = Self {
            config,
            resolver,
            engraving,
            registry,
        };
        let report = configurator.apply_active_tags();
        info!(
            "Configurator: scene loaded, {} materials applied, {} skipped",
            report.applied.len(),
            report.skipped.len()
        );
        configurator
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    pub fn resolver(&self) -> &TagResolver {
        &self.resolver
    }

    pub fn registry(&self) -> &R {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut R {
        &mut self.registry
    }

    pub fn engraving(&self) -> &EngravingRenderer<B> {
        &self.engraving
    }

    /// Re-apply materials for the current tag set
    pub fn apply_active_tags(&mut self) -> ApplyReport {
        self.resolver.apply_active_tags(&mut self.registry)
    }

    /// Toggle a tag and re-apply
    pub fn set_tag_active(&mut self, tag: &str, active: bool) -> ApplyReport {
        self.resolver.set_tag_active(tag, active);
        self.apply_active_tags()
    }

    /// Set the engraving text; empty text removes the engraving
    pub fn set_text(&mut self, text: &str) -> ApplyReport {
        self.engraving
            .set_text(text, &mut self.resolver, &mut self.registry)
    }

    /// Override the engraving aspect ratio, `None` to measure the mesh again
    pub fn set_aspect(&mut self, aspect: Option<f32>) -> bool {
        self.engraving
            .set_aspect(aspect, &self.resolver, &mut self.registry)
    }

    pub fn resolve_material(&self, name: &str) -> Result<ResolvedMaterial, MaterialError> {
        self.resolver.resolve_material(name)
    }

    /// Edit a material property and re-apply
    pub fn edit_property(
        &mut self,
        material: &str,
        key: PropertyKey,
        value: PropertyValue,
    ) -> Result<ApplyReport, MaterialError> {
        self.resolver.edit_property(material, key, value)?;
        Ok(self.apply_active_tags())
    }

    /// Return a property to inheriting from its parent and re-apply
    pub fn reset_property(
        &mut self,
        material: &str,
        key: PropertyKey,
    ) -> Result<ApplyReport, MaterialError> {
        self.resolver.reset_property(material, key)?;
        Ok(self.apply_active_tags())
    }

    /// Write the session's material table as JSON
    pub fn save_materials(&self, path: impl AsRef<Path>) -> Result<(), AppError> {
        save_json(path.as_ref(), &self.resolver.export_materials())?;
        debug!("Configurator: materials saved to {}", path.as_ref().display());
        Ok(())
    }

    /// Save the current engraving rasters as PNG files in `dir`.
    ///
    /// Returns the alpha and normal paths.
    pub fn save_engraving(&self, dir: impl AsRef<Path>) -> Result<(PathBuf, PathBuf), AppError> {
        let dir = dir.as_ref();
        let textures = self.engraving.textures().ok_or(AppError::NoEngraving)?;
        std::fs::create_dir_all(dir).map_err(|source| AppError::Io {
            path: dir.display().to_string(),
            source,
        })?;

        let alpha = dir.join(ALPHA_PREVIEW);
        let normal = dir.join(NORMAL_PREVIEW);
        save_texture(&textures.alpha, &alpha)?;
        save_texture(&textures.normal, &normal)?;
        Ok((alpha, normal))
    }
}

fn save_texture(texture: &EngravingTexture, path: &Path) -> Result<(), AppError> {
    let image = texture.to_image().ok_or(AppError::NoEngraving)?;
    image.save(path).map_err(|source| AppError::Image {
        path: path.display().to_string(),
        source,
    })?;
    info!(
        "Configurator: wrote {}x{} raster to {}",
        texture.width(),
        texture.height(),
        path.display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use vitrine_config::EngravingSettings;

    const MATERIALS: &str = r##"{
        "materials": {
            "metal": { "parent": "none", "baseColor": "#c0c0c0", "metallic": 1.0, "roughness": 0.3 },
            "red": { "parent": "metal", "baseColor": "#ff0000" },
            "gold": { "parent": "metal", "baseColor": "#ffd700" },
            "brass": { "parent": "metal", "baseColor": "#b5a642" }
        }
    }"##;

    const MODELS: &str = r#"{
        "models": {
            "lamp": {
                "meshes": {
                    "bloc": { "materialSlots": ["red", "metal"], "tags": ["base"] },
                    "plate": { "materialSlots": ["brass"], "tags": ["engraving"] }
                }
            },
            "gold": {
                "meshes": { "bloc": { "materialSlots": ["gold"], "tags": ["gold"] } }
            }
        }
    }"#;

    fn config() -> RuntimeConfig {
        RuntimeConfig {
            engraving: EngravingSettings {
                min_font_size: 4,
                ..EngravingSettings::with_base_height(32)
            },
            ..RuntimeConfig::default()
        }
    }

    fn configurator() -> Configurator {
        let models: ModelSetDocument = MODELS.parse().unwrap();
        let scene = scene_from_models(&models, "engraving");
        Configurator::new(config(), MATERIALS.parse().unwrap(), &models, scene, CpuBackend)
    }

    fn applied(configurator: &Configurator, mesh: &str) -> Option<String> {
        let scene = configurator.registry();
        scene.material(scene.find(mesh)?)?.material_name.clone()
    }

    fn temp_dir(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("vitrine-{}-{}", name, std::process::id()))
    }

    #[test]
    fn test_default_tags_applied_on_load() {
        let configurator = configurator();
        assert_eq!(applied(&configurator, "bloc_primitive0").as_deref(), Some("red"));
        assert_eq!(applied(&configurator, "bloc_primitive1").as_deref(), Some("metal"));
        // Engraving mesh waits for text
        assert_eq!(applied(&configurator, "plate"), None);
    }

    #[test]
    fn test_tag_overrides_slot() {
        let mut configurator = configurator();
        configurator.set_tag_active("gold", true);
        assert_eq!(applied(&configurator, "bloc_primitive0").as_deref(), Some("gold"));
        assert_eq!(applied(&configurator, "bloc_primitive1").as_deref(), Some("metal"));
    }

    #[test]
    fn test_text_round_trip() {
        let mut configurator = configurator();
        configurator.set_text("Ada");
        assert!(configurator.resolver().is_tag_active("engraving"));
        assert_eq!(applied(&configurator, "plate").as_deref(), Some("brass"));

        let plate = configurator.registry().find("plate").unwrap();
        let textures = configurator.engraving().textures().unwrap();
        // Plate is 2:1
        assert_eq!((textures.alpha.width(), textures.alpha.height()), (64, 32));
        assert!(
            configurator
                .registry()
                .material(plate)
                .unwrap()
                .opacity_texture
                .is_some()
        );

        configurator.set_text("");
        assert!(!configurator.resolver().is_tag_active("engraving"));
        assert!(configurator.engraving().textures().is_none());
    }

    #[test]
    fn test_tag_toggle_keeps_engraving() {
        let mut configurator = configurator();
        configurator.set_text("Ada");
        configurator.set_tag_active("gold", true);

        let scene = configurator.registry();
        let plate = scene.material(scene.find("plate").unwrap()).unwrap();
        assert!(plate.opacity_texture.as_ref().unwrap().is_generated());
        assert!(plate.bump_texture.as_ref().unwrap().is_generated());
    }

    #[test]
    fn test_edit_reapplies() {
        let mut configurator = configurator();
        configurator
            .edit_property("metal", PropertyKey::Roughness, PropertyValue::Scalar(0.9))
            .unwrap();
        let scene = configurator.registry();
        let bloc = scene.material(scene.find("bloc_primitive0").unwrap()).unwrap();
        assert_eq!(bloc.roughness, 0.9);

        configurator
            .edit_property("red", PropertyKey::Roughness, PropertyValue::Scalar(0.1))
            .unwrap();
        configurator
            .edit_property("metal", PropertyKey::Roughness, PropertyValue::Scalar(0.5))
            .unwrap();
        // red diverged from metal
        assert_eq!(configurator.resolve_material("red").unwrap().roughness, 0.1);

        configurator.reset_property("red", PropertyKey::Roughness).unwrap();
        assert_eq!(configurator.resolve_material("red").unwrap().roughness, 0.5);
    }

    #[test]
    fn test_save_engraving_requires_text() {
        let configurator = configurator();
        assert!(matches!(
            configurator.save_engraving(temp_dir("empty")),
            Err(AppError::NoEngraving)
        ));
    }

    #[test]
    fn test_save_engraving_and_materials() {
        let mut configurator = configurator();
        configurator.set_text("Ada");
        let dir = temp_dir("save");

        let (alpha, normal) = configurator.save_engraving(&dir).unwrap();
        let alpha_image = image::open(&alpha).unwrap().to_rgba8();
        assert_eq!(alpha_image.dimensions(), (64, 32));
        assert!(normal.exists());

        let export = dir.join("materials.json");
        configurator.save_materials(&export).unwrap();
        let saved: MaterialSetDocument = load_json(&export).unwrap();
        let names: Vec<&str> = saved.materials.keys().collect();
        assert_eq!(names, vec!["metal", "red", "gold", "brass"]);

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_load_from_files() {
        let dir = temp_dir("load");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("materials.json"), MATERIALS).unwrap();
        std::fs::write(dir.join("models.json"), MODELS).unwrap();

        let configurator =
            Configurator::load(config(), dir.join("materials.json"), dir.join("models.json")).unwrap();
        assert_eq!(applied(&configurator, "bloc_primitive0").as_deref(), Some("red"));

        assert!(Configurator::load(config(), dir.join("missing.json"), dir.join("models.json")).is_err());
        std::fs::remove_dir_all(&dir).unwrap();
    }
}
