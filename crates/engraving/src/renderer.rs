//! Engraving renderer - text to alpha/normal rasters bound on tagged meshes

use std::sync::atomic::{AtomicU64, Ordering};

use tracing::{debug, error, info, warn};

use crate::aspect::{aspect_from_extents, DEFAULT_ASPECT};
use crate::normal::{build_normal_from_alpha, NormalOptions};
use crate::surface::{CpuBackend, RasterBackend, RasterSurface};
use crate::text::{fit_font_size, TextStyle};
use crate::texture::EngravingTexture;
use vitrine_config::EngravingSettings;
use vitrine_materials::{
    ApplyReport, MeshRegistry, TagResolver, TextureBinding, TextureId, TransparencyMode,
};

/// Background of the alpha raster
const BACKGROUND: [u8; 4] = [0, 0, 0, 255];

/// Text color on the alpha raster
const INK: [u8; 4] = [255, 255, 255, 255];

static NEXT_TEXTURE_ID: AtomicU64 = AtomicU64::new(1);

fn allocate_texture_id() -> TextureId {
    TextureId(NEXT_TEXTURE_ID.fetch_add(1, Ordering::Relaxed))
}

/// Alpha and normal textures produced for the current text
#[derive(Debug, Clone, PartialEq)]
pub struct EngravingTextures {
    pub alpha: EngravingTexture,
    pub normal: EngravingTexture,
}

/// Produces the engraving rasters and binds them on engraving-tagged meshes.
///
/// One alpha/normal pair exists per renderer. It is created on the first
/// non-empty text, regenerated in place on every later update, and dropped
/// when the text is cleared.
#[derive(Debug)]
pub struct EngravingRenderer<B: RasterBackend = CpuBackend> {
    backend: B,
    settings: EngravingSettings,
    text: String,
    aspect_override: Option<f32>,
    alpha_id: TextureId,
    normal_id: TextureId,
    textures: Option<EngravingTextures>,
}

impl EngravingRenderer<CpuBackend> {
    /// Renderer drawing on CPU surfaces
    pub fn new(settings: EngravingSettings) -> Self {
        Self::with_backend(CpuBackend, settings)
    }
}

impl<B: RasterBackend> EngravingRenderer<B> {
    pub fn with_backend(backend: B, settings: EngravingSettings) -> Self {
        Self {
            backend,
            settings,
            text: String::new(),
            aspect_override: None,
            alpha_id: allocate_texture_id(),
            normal_id: allocate_texture_id(),
            textures: None,
        }
    }

    pub fn settings(&self) -> &EngravingSettings {
        &self.settings
    }

    /// Current (trimmed) engraving text
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn aspect_override(&self) -> Option<f32> {
        self.aspect_override
    }

    pub fn textures(&self) -> Option<&EngravingTextures> {
        self.textures.as_ref()
    }

    /// Set the engraving text and re-apply the active tags.
    ///
    /// The text is trimmed. The engraving tag is enabled for non-empty text
    /// and disabled otherwise, and the tag set is updated before the
    /// resolver pass so the pass sees the new state.
    pub fn set_text<R: MeshRegistry + ?Sized>(
        &mut self,
        text: &str,
        resolver: &mut TagResolver,
        registry: &mut R,
    ) -> ApplyReport {
        self.text = text.trim().to_string();
        let active = !self.text.is_empty();
        resolver.set_tag_active(&self.settings.tag, active);
        debug!("EngravingRenderer::set_text: {:?}", self.text);

        self.update(resolver, registry);
        resolver.apply_active_tags(registry)
    }

    /// Override the raster aspect ratio, or clear the override with `None`.
    ///
    /// Non-finite or non-positive values are ignored and leave state
    /// unchanged. Returns true if the value was accepted.
    pub fn set_aspect<R: MeshRegistry + ?Sized>(
        &mut self,
        aspect: Option<f32>,
        resolver: &TagResolver,
        registry: &mut R,
    ) -> bool {
        match aspect {
            Some(value) if !value.is_finite() || value <= 0.0 => {
                debug!("EngravingRenderer::set_aspect: ignoring {}", value);
                return false;
            }
            other => self.aspect_override = other,
        }
        self.update(resolver, registry);
        true
    }

    /// Aspect the next raster will use: the override as given, else the
    /// first engraving mesh's clamped bounding-box ratio, else 1.0
    pub fn current_aspect<R: MeshRegistry + ?Sized>(&self, resolver: &TagResolver, registry: &R) -> f32 {
        if let Some(aspect) = self.aspect_override {
            return aspect;
        }
        resolver
            .meshes_with_tag(&self.settings.tag)
            .into_iter()
            .flat_map(|mesh| registry.instances(mesh))
            .find_map(|instance| registry.bounding_extents(instance.id))
            .map(|extents| aspect_from_extents(extents, &self.settings))
            .unwrap_or(DEFAULT_ASPECT)
    }

    /// Regenerate the rasters for the current text and aspect and bind them.
    ///
    /// Empty text unbinds the engraving textures instead. Surface failures
    /// leave the previous textures and bindings in place.
    pub fn update<R: MeshRegistry + ?Sized>(&mut self, resolver: &TagResolver, registry: &mut R) {
        if self.text.is_empty() {
            self.detach(resolver, registry);
            return;
        }

        let aspect = self.current_aspect(resolver, registry);
        let (width, height) = self.settings.raster_size(aspect);
        let Some((alpha, normal)) = self.render(width, height) else {
            return;
        };

        match &mut self.textures {
            Some(textures) => {
                textures.alpha.replace(width, height, alpha);
                textures.normal.replace(width, height, normal);
            }
            None => {
                self.textures = Some(EngravingTextures {
                    alpha: EngravingTexture::new(self.alpha_id, width, height, alpha),
                    normal: EngravingTexture::new(self.normal_id, width, height, normal),
                });
            }
        }
        info!(
            "EngravingRenderer: rendered {:?} at {}x{} (aspect {:.3})",
            self.text, width, height, aspect
        );

        self.bind(resolver, registry);
    }

    /// Draw the alpha raster and derive its normal map
    fn render(&mut self, width: u32, height: u32) -> Option<(Vec<[u8; 4]>, Vec<[u8; 4]>)> {
        let mut surface = self.acquire_surface(width, height)?;
        surface.fill(BACKGROUND);
        let font_size = fit_font_size(&surface, &self.text, &self.settings);
        surface.draw_text(&self.text, &TextStyle::centered(font_size, INK, width, height));

        let options = NormalOptions::from(&self.settings);
        let normal = match build_normal_from_alpha(&mut self.backend, &surface, &options) {
            Ok(normal) => normal,
            Err(err) => {
                error!("EngravingRenderer: normal map generation failed: {}", err);
                return None;
            }
        };
        Some((surface.read_pixels(), normal.read_pixels()))
    }

    /// Create a surface, retrying once
    fn acquire_surface(&mut self, width: u32, height: u32) -> Option<B::Surface> {
        match self.backend.create_surface(width, height) {
            Ok(surface) => Some(surface),
            Err(first) => {
                warn!(
                    "EngravingRenderer: surface {}x{} unavailable ({}), recreating",
                    width, height, first
                );
                match self.backend.create_surface(width, height) {
                    Ok(surface) => Some(surface),
                    Err(err) => {
                        error!(
                            "EngravingRenderer: giving up on {}x{} surface: {}",
                            width, height, err
                        );
                        None
                    }
                }
            }
        }
    }

    fn bind<R: MeshRegistry + ?Sized>(&self, resolver: &TagResolver, registry: &mut R) {
        let Some(textures) = &self.textures else {
            return;
        };
        let anisotropy = registry
            .max_anisotropy()
            .min(self.settings.max_anisotropy)
            .max(1);

        for mesh in resolver.meshes_with_tag(&self.settings.tag) {
            for instance in registry.instances(mesh) {
                let Some(material) = registry.material_mut(instance.id) else {
                    continue;
                };
                material.opacity_texture = Some(TextureBinding {
                    get_alpha_from_rgb: true,
                    ..TextureBinding::generated(textures.alpha.id(), anisotropy)
                });
                material.bump_texture = Some(TextureBinding::generated(textures.normal.id(), anisotropy));
                material.transparency_mode = TransparencyMode::AlphaTestAndBlend;
                material.needs_depth_prepass = true;
                material.mark_dirty();
                debug!("EngravingRenderer: bound engraving on {}", instance.name);
            }
        }
    }

    fn detach<R: MeshRegistry + ?Sized>(&mut self, resolver: &TagResolver, registry: &mut R) {
        for mesh in resolver.meshes_with_tag(&self.settings.tag) {
            for instance in registry.instances(mesh) {
                let Some(material) = registry.material_mut(instance.id) else {
                    continue;
                };
                material.opacity_texture = None;
                material.bump_texture = None;
                material.transparency_mode = TransparencyMode::Opaque;
                material.needs_depth_prepass = false;
                material.mark_dirty();
            }
        }
        if self.textures.take().is_some() {
            info!("EngravingRenderer: engraving cleared");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::{CpuSurface, SurfaceError};
    use glam::Vec3;
    use vitrine_config::RuntimeConfig;
    use vitrine_materials::{MeshId, Scene, TextureSource};

    const MATERIALS: &str = r##"{
        "materials": {
            "metal": { "parent": "none", "baseColor": "#c0c0c0", "metallic": 1.0 },
            "brass": { "parent": "metal", "baseColor": "#b5a642" }
        }
    }"##;

    const MODELS: &str = r#"{
        "models": {
            "lamp": {
                "meshes": {
                    "bloc": { "materialSlots": ["metal"], "tags": ["base"] },
                    "plate": { "materialSlots": ["brass"], "tags": ["engraving"] }
                }
            }
        }
    }"#;

    fn resolver() -> TagResolver {
        TagResolver::new(
            serde_json::from_str(MATERIALS).unwrap(),
            &serde_json::from_str(MODELS).unwrap(),
            &RuntimeConfig::default(),
        )
    }

    /// Plate with a 2:1 footprint
    fn scene() -> (Scene, MeshId) {
        let mut scene = Scene::with_max_anisotropy(8);
        scene.add_mesh("bloc", Vec3::ZERO, Vec3::ONE);
        let plate = scene.add_mesh("plate", Vec3::ZERO, Vec3::new(2.0, 1.0, 0.05));
        (scene, plate)
    }

    fn small_renderer() -> EngravingRenderer {
        EngravingRenderer::new(EngravingSettings {
            min_font_size: 4,
            ..EngravingSettings::with_base_height(64)
        })
    }

    #[test]
    fn test_set_text_binds_textures() {
        let mut resolver = resolver();
        let (mut scene, plate) = scene();
        let mut renderer = small_renderer();

        let report = renderer.set_text("  ABC  ", &mut resolver, &mut scene);
        assert!(report.is_clean());
        assert_eq!(renderer.text(), "ABC");
        assert!(resolver.is_tag_active("engraving"));

        let textures = renderer.textures().unwrap();
        assert_eq!((textures.alpha.width(), textures.alpha.height()), (128, 64));
        // Some ink made it onto the raster
        assert!(textures.alpha.pixels().iter().any(|p| p[0] > 0));

        let material = scene.material(plate).unwrap();
        assert_eq!(material.material_name.as_deref(), Some("brass"));
        let opacity = material.opacity_texture.as_ref().unwrap();
        assert_eq!(opacity.source, TextureSource::Generated(textures.alpha.id()));
        assert!(opacity.get_alpha_from_rgb);
        assert!(!opacity.invert_y);
        // min(device 8, ceiling 16)
        assert_eq!(opacity.anisotropic_level, 8);
        let bump = material.bump_texture.as_ref().unwrap();
        assert_eq!(bump.source, TextureSource::Generated(textures.normal.id()));
        assert_eq!(material.transparency_mode, TransparencyMode::AlphaTestAndBlend);
        assert!(material.needs_depth_prepass);
    }

    #[test]
    fn test_set_text_twice_is_deterministic() {
        let mut resolver = resolver();
        let (mut scene, _) = scene();
        let mut renderer = small_renderer();

        renderer.set_text("ABC", &mut resolver, &mut scene);
        let first = renderer.textures().unwrap().clone();
        renderer.set_text("ABC", &mut resolver, &mut scene);
        let second = renderer.textures().unwrap();

        assert_eq!(first.alpha.pixels(), second.alpha.pixels());
        assert_eq!(first.normal.pixels(), second.normal.pixels());
        // Regenerated in place
        assert_eq!(first.alpha.id(), second.alpha.id());
        assert_eq!(second.alpha.revision(), first.alpha.revision() + 1);
    }

    #[test]
    fn test_empty_text_tears_down() {
        let mut resolver = resolver();
        let (mut scene, plate) = scene();
        let mut renderer = small_renderer();

        renderer.set_text("ABC", &mut resolver, &mut scene);
        renderer.set_text("   ", &mut resolver, &mut scene);

        assert!(!resolver.is_tag_active("engraving"));
        assert!(renderer.textures().is_none());
        let material = scene.material(plate).unwrap();
        assert_eq!(material.opacity_texture, None);
        assert_eq!(material.bump_texture, None);
        assert_eq!(material.transparency_mode, TransparencyMode::Opaque);
        assert!(!material.needs_depth_prepass);
    }

    #[test]
    fn test_engraving_survives_second_binding_on_plate() {
        let models = r#"{
            "models": {
                "engraved": { "meshes": { "plate": { "materialSlots": ["brass"], "tags": ["engraving"] } } },
                "lamp": { "meshes": { "plate": { "materialSlots": ["metal"], "tags": ["base"] } } }
            }
        }"#;
        let mut resolver = TagResolver::new(
            serde_json::from_str(MATERIALS).unwrap(),
            &serde_json::from_str(models).unwrap(),
            &RuntimeConfig::default(),
        );
        let (mut scene, plate) = scene();
        let mut renderer = small_renderer();

        renderer.set_text("ABC", &mut resolver, &mut scene);

        let material = scene.material(plate).unwrap();
        // lamp.plate is applied last and wins the material
        assert_eq!(material.material_name.as_deref(), Some("metal"));
        assert!(material.opacity_texture.as_ref().unwrap().is_generated());
        assert!(material.bump_texture.as_ref().unwrap().is_generated());
    }

    #[test]
    fn test_aspect_override_sets_width() {
        let mut resolver = resolver();
        let (mut scene, _) = scene();
        let mut renderer = EngravingRenderer::new(EngravingSettings::default());

        assert!(renderer.set_aspect(Some(2.0), &resolver, &mut scene));
        renderer.set_text("HI", &mut resolver, &mut scene);

        let textures = renderer.textures().unwrap();
        assert_eq!(textures.alpha.width(), 2048);
        assert_eq!(textures.alpha.height(), 1024);
        assert_eq!(textures.normal.width(), 2048);
    }

    #[test]
    fn test_aspect_override_outside_measured_range() {
        let mut resolver = resolver();
        let (mut scene, _) = scene();
        let mut renderer = small_renderer();
        renderer.set_text("HI", &mut resolver, &mut scene);

        renderer.set_aspect(Some(20.0), &resolver, &mut scene);
        assert_eq!(renderer.current_aspect(&resolver, &scene), 20.0);
        let alpha = &renderer.textures().unwrap().alpha;
        assert_eq!((alpha.width(), alpha.height()), (1280, 64));

        // round(64 * 0.001) is 0; width never drops below 2
        renderer.set_aspect(Some(0.001), &resolver, &mut scene);
        let alpha = &renderer.textures().unwrap().alpha;
        assert_eq!((alpha.width(), alpha.height()), (2, 64));
    }

    #[test]
    fn test_invalid_aspect_ignored() {
        let resolver = resolver();
        let (mut scene, _) = scene();
        let mut renderer = small_renderer();

        renderer.set_aspect(Some(3.0), &resolver, &mut scene);
        assert!(!renderer.set_aspect(Some(f32::NAN), &resolver, &mut scene));
        assert!(!renderer.set_aspect(Some(-1.0), &resolver, &mut scene));
        assert!(!renderer.set_aspect(Some(0.0), &resolver, &mut scene));
        assert_eq!(renderer.aspect_override(), Some(3.0));

        // None falls back to the plate's bounding box
        assert!(renderer.set_aspect(None, &resolver, &mut scene));
        assert_eq!(renderer.current_aspect(&resolver, &scene), 2.0);
    }

    #[test]
    fn test_aspect_without_engraving_mesh() {
        let resolver = resolver();
        let renderer = small_renderer();
        assert_eq!(renderer.current_aspect(&resolver, &Scene::new()), 1.0);
    }

    /// Backend that fails a set number of times before delegating
    struct FlakyBackend {
        failures_left: u32,
        attempts: u32,
    }

    impl RasterBackend for FlakyBackend {
        type Surface = CpuSurface;

        fn create_surface(&mut self, width: u32, height: u32) -> Result<CpuSurface, SurfaceError> {
            self.attempts += 1;
            if self.failures_left > 0 {
                self.failures_left -= 1;
                return Err(SurfaceError::AllocationFailed { width, height });
            }
            CpuSurface::try_new(width, height)
        }
    }

    fn flaky(failures_left: u32) -> EngravingRenderer<FlakyBackend> {
        EngravingRenderer::with_backend(
            FlakyBackend {
                failures_left,
                attempts: 0,
            },
            EngravingSettings {
                min_font_size: 4,
                ..EngravingSettings::with_base_height(32)
            },
        )
    }

    #[test]
    fn test_surface_recreated_once() {
        let mut resolver = resolver();
        let (mut scene, _) = scene();
        let mut renderer = flaky(1);

        renderer.set_text("A", &mut resolver, &mut scene);
        assert!(renderer.textures().is_some());
        // Failed + retry for the alpha raster, one for the normal map
        assert_eq!(renderer.backend.attempts, 3);
    }

    #[test]
    fn test_surface_failure_is_soft() {
        let mut resolver = resolver();
        let (mut scene, plate) = scene();
        let mut renderer = flaky(2);

        let report = renderer.set_text("A", &mut resolver, &mut scene);
        assert!(report.is_clean());
        assert!(renderer.textures().is_none());
        assert_eq!(scene.material(plate).unwrap().opacity_texture, None);

        // Backend recovered; next update succeeds
        renderer.update(&resolver, &mut scene);
        assert!(renderer.textures().is_some());
        assert!(scene.material(plate).unwrap().opacity_texture.is_some());
    }

    #[test]
    fn test_bevel_is_flat_away_from_text() {
        let mut resolver = resolver();
        let (mut scene, _) = scene();
        let mut renderer = small_renderer();

        renderer.set_text(".", &mut resolver, &mut scene);
        let normal = &renderer.textures().unwrap().normal;
        // Corner pixel is far from the dot
        assert_eq!(normal.pixels()[0], [128, 128, 255, 255]);
    }
}
