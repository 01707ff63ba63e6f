//! Mesh registry capability and an in-memory scene
//!
//! The configurator core never owns the scene graph. It asks a
//! [`MeshRegistry`] for mesh instances by base name, their bounding boxes,
//! and mutable access to their live materials.

use glam::Vec3;

use crate::binding::primitive_slot;
use crate::live::LiveMaterial;
use vitrine_config::MAX_ANISOTROPY;

/// Identifier of a live mesh instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MeshId(pub u32);

/// A live mesh instance returned by a registry lookup
#[derive(Debug, Clone, PartialEq)]
pub struct MeshInstance {
    pub id: MeshId,
    pub name: String,
}

/// Scene access used by the resolver and the engraving renderer
pub trait MeshRegistry {
    /// All instances named `base_name` or `<base_name>_primitiveN`
    fn instances(&self, base_name: &str) -> Vec<MeshInstance>;

    /// Axis-aligned bounding-box extents of an instance
    fn bounding_extents(&self, mesh: MeshId) -> Option<Vec3>;

    /// The instance's live material
    fn material_mut(&mut self, mesh: MeshId) -> Option<&mut LiveMaterial>;

    /// Maximum anisotropic filtering level reported by the device
    fn max_anisotropy(&self) -> u32 {
        MAX_ANISOTROPY
    }
}

/// A mesh instance stored in a [`Scene`]
#[derive(Debug, Clone)]
pub struct SceneMesh {
    pub name: String,
    pub min: Vec3,
    pub max: Vec3,
    pub material: LiveMaterial,
}

/// Simple in-memory registry, used by headless hosts and tests
#[derive(Debug, Clone)]
pub struct Scene {
    meshes: Vec<SceneMesh>,
    max_anisotropy: u32,
}

impl Default for Scene {
    fn default() -> Self {
        Self {
            meshes: Vec::new(),
            max_anisotropy: MAX_ANISOTROPY,
        }
    }
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scene reporting a specific device anisotropy limit
    pub fn with_max_anisotropy(max_anisotropy: u32) -> Self {
        Self {
            max_anisotropy,
            ..Self::default()
        }
    }

    /// Add a mesh instance with a bounding box and a default material
    pub fn add_mesh(&mut self, name: impl Into<String>, min: Vec3, max: Vec3) -> MeshId {
        let id = MeshId(self.meshes.len() as u32);
        self.meshes.push(SceneMesh {
            name: name.into(),
            min: min.min(max),
            max: min.max(max),
            material: LiveMaterial::default(),
        });
        id
    }

    pub fn mesh(&self, id: MeshId) -> Option<&SceneMesh> {
        self.meshes.get(id.0 as usize)
    }

    /// Look up an instance by its exact name
    pub fn find(&self, name: &str) -> Option<MeshId> {
        self.meshes
            .iter()
            .position(|mesh| mesh.name == name)
            .map(|index| MeshId(index as u32))
    }

    pub fn material(&self, id: MeshId) -> Option<&LiveMaterial> {
        self.mesh(id).map(|mesh| &mesh.material)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.meshes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.meshes.is_empty()
    }
}

impl MeshRegistry for Scene {
    fn instances(&self, base_name: &str) -> Vec<MeshInstance> {
        self.meshes
            .iter()
            .enumerate()
            .filter(|(_, mesh)| primitive_slot(base_name, &mesh.name).is_some())
            .map(|(index, mesh)| MeshInstance {
                id: MeshId(index as u32),
                name: mesh.name.clone(),
            })
            .collect()
    }

    fn bounding_extents(&self, mesh: MeshId) -> Option<Vec3> {
        self.mesh(mesh).map(|mesh| mesh.max - mesh.min)
    }

    fn material_mut(&mut self, mesh: MeshId) -> Option<&mut LiveMaterial> {
        self.meshes
            .get_mut(mesh.0 as usize)
            .map(|mesh| &mut mesh.material)
    }

    fn max_anisotropy(&self) -> u32 {
        self.max_anisotropy
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_instances_by_base_name() {
        let mut scene = Scene::new();
        scene.add_mesh("bloc_primitive0", Vec3::ZERO, Vec3::ONE);
        scene.add_mesh("bloc_primitive1", Vec3::ZERO, Vec3::ONE);
        scene.add_mesh("blocker", Vec3::ZERO, Vec3::ONE);
        scene.add_mesh("plate", Vec3::ZERO, Vec3::ONE);

        let names: Vec<String> = scene
            .instances("bloc")
            .into_iter()
            .map(|instance| instance.name)
            .collect();
        assert_eq!(names, vec!["bloc_primitive0", "bloc_primitive1"]);
        assert_eq!(scene.instances("plate").len(), 1);
        assert!(scene.instances("missing").is_empty());
    }

    #[test]
    fn test_bounding_extents() {
        let mut scene = Scene::new();
        // Corners given in any order
        let id = scene.add_mesh("plate", Vec3::new(5.0, 1.0, 1.0), Vec3::new(-5.0, 0.0, 0.5));
        assert_eq!(scene.bounding_extents(id), Some(Vec3::new(10.0, 1.0, 0.5)));
        assert_eq!(scene.bounding_extents(MeshId(99)), None);
    }

    #[test]
    fn test_material_mut() {
        let mut scene = Scene::with_max_anisotropy(8);
        let id = scene.add_mesh("plate", Vec3::ZERO, Vec3::ONE);
        scene.material_mut(id).unwrap().metallic = 1.0;
        assert_eq!(scene.material(id).unwrap().metallic, 1.0);
        assert_eq!(scene.max_anisotropy(), 8);
    }
}
