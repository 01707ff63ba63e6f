//! Stand-in scene built from a model document
//!
//! Headless hosts have no glTF loader, so each bound mesh becomes a scene
//! instance with a placeholder bounding box: one instance for a single-slot
//! mesh, `<name>_primitiveN` instances for multi-slot meshes.

use glam::Vec3;
use tracing::debug;

use vitrine_config::ModelSetDocument;
use vitrine_materials::Scene;

/// Footprint given to engraving meshes (a 2:1 plate)
pub const PLATE_EXTENTS: Vec3 = Vec3::new(2.0, 1.0, 0.05);

/// Build a [`Scene`] with one instance per bound mesh primitive.
///
/// A base mesh bound by several models is laid out once, with as many
/// primitives as its widest slot list. Meshes carrying `engraving_tag` get
/// [`PLATE_EXTENTS`]; everything else is a unit cube.
pub fn scene_from_models(models: &ModelSetDocument, engraving_tag: &str) -> Scene {
    // (base name, slot count, engraved) in first-seen order
    let mut meshes: Vec<(&str, usize, bool)> = Vec::new();
    for (_, model) in models.models.iter() {
        for (name, mesh) in model.meshes.iter() {
            let engraved = mesh.tags.iter().any(|tag| tag == engraving_tag);
            match meshes.iter_mut().find(|(base, _, _)| *base == name) {
                Some((_, slots, flag)) => {
                    *slots = (*slots).max(mesh.material_slots.len());
                    *flag |= engraved;
                }
                None => meshes.push((name, mesh.material_slots.len(), engraved)),
            }
        }
    }

    let mut scene = Scene::new();
    for (name, slots, engraved) in meshes {
        let extents = if engraved { PLATE_EXTENTS } else { Vec3::ONE };
        if slots <= 1 {
            scene.add_mesh(name, Vec3::ZERO, extents);
        } else {
            for i in 0..slots {
                scene.add_mesh(format!("{name}_primitive{i}"), Vec3::ZERO, extents);
            }
        }
    }

    debug!("scene_from_models: {} instances", scene.len());
    scene
}

#[cfg(test)]
mod tests {
    use super::*;
    use vitrine_materials::MeshRegistry;

    const MODELS: &str = r#"{
        "models": {
            "lamp": {
                "meshes": {
                    "bloc": { "materialSlots": ["red", "metal"], "tags": ["base"] },
                    "plate": { "materialSlots": ["brass"], "tags": ["engraving"] }
                }
            },
            "flag": {
                "meshes": { "bloc": { "materialSlots": ["blue"], "tags": ["flag"] } }
            }
        }
    }"#;

    #[test]
    fn test_instances_per_slot() {
        let models: ModelSetDocument = MODELS.parse().unwrap();
        let scene = scene_from_models(&models, "engraving");

        // bloc appears in two models but is laid out once
        assert_eq!(scene.len(), 3);
        assert!(scene.find("bloc_primitive0").is_some());
        assert!(scene.find("bloc_primitive1").is_some());

        let plate = scene.find("plate").unwrap();
        assert_eq!(scene.bounding_extents(plate), Some(PLATE_EXTENTS));
    }
}
