//! Tag resolver - applies tag-gated material bindings to live meshes

use std::collections::{HashMap, HashSet};

use tracing::{debug, info, warn};
use vitrine_config::{
    MaterialDescriptor, MaterialSetDocument, ModelSetDocument, OrderedMap, RuntimeConfig,
};

#[cfg(feature = "bevy")]
use bevy::prelude::Resource;

use crate::binding::{primitive_slot, BindingTable};
use crate::error::MaterialError;
use crate::registry::{MeshId, MeshRegistry};
use crate::resolve::{
    inheritance_chain, resolve_material, DescriptorProperties, PropertyKey, PropertyValue,
    ResolvedMaterial,
};
use crate::tags::ActiveTagSet;

/// A material written onto a mesh instance
#[derive(Debug, Clone, PartialEq)]
pub struct AppliedMaterial {
    pub mesh: MeshId,
    pub mesh_name: String,
    pub slot: u32,
    pub material: String,
}

/// A mesh instance whose material could not be resolved
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedMesh {
    pub mesh_name: String,
    pub material: String,
    pub error: MaterialError,
}

/// Outcome of one [`TagResolver::apply_active_tags`] pass
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ApplyReport {
    pub applied: Vec<AppliedMaterial>,
    pub skipped: Vec<SkippedMesh>,
}

impl ApplyReport {
    pub fn is_clean(&self) -> bool {
        self.skipped.is_empty()
    }
}

/// Owns the material table, the binding table and the active tags.
///
/// This is the explicitly constructed replacement for a process-wide tag
/// manager: hosts create one per session and pass it by reference to the
/// engraving renderer.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "bevy", derive(Resource))]
pub struct TagResolver {
    materials: OrderedMap<MaterialDescriptor>,
    bindings: BindingTable,
    active: ActiveTagSet,
    exclusive_tags: Vec<String>,
}

impl TagResolver {
    /// Build a resolver from the material and model documents
    pub fn new(
        materials: MaterialSetDocument,
        models: &ModelSetDocument,
        config: &RuntimeConfig,
    ) -> Self {
        let resolver = Self {
            materials: materials.materials,
            bindings: BindingTable::from_document(models),
            active: config.default_tags.iter().cloned().collect(),
            exclusive_tags: config.exclusive_tags.clone(),
        };
        info!(
            "TagResolver: {} materials, {} bindings, active tags {:?}",
            resolver.materials.len(),
            resolver.bindings.len(),
            resolver.active.iter().collect::<Vec<_>>()
        );
        resolver
    }

    /// Resolve a material through its parent chain
    pub fn resolve_material(&self, name: &str) -> Result<ResolvedMaterial, MaterialError> {
        resolve_material(&self.materials, name)
    }

    pub fn material(&self, name: &str) -> Option<&MaterialDescriptor> {
        self.materials.get(name)
    }

    pub fn bindings(&self) -> &BindingTable {
        &self.bindings
    }

    pub fn active_tags(&self) -> &ActiveTagSet {
        &self.active
    }

    pub fn is_tag_active(&self, tag: &str) -> bool {
        self.active.contains(tag)
    }

    /// Enable or disable a tag. Returns true if the set changed.
    pub fn set_tag_active(&mut self, tag: &str, active: bool) -> bool {
        let changed = if active {
            self.active.insert(tag)
        } else {
            self.active.remove(tag)
        };
        if changed {
            info!("TagResolver: tag '{}' -> {}", tag, active);
        }
        changed
    }

    /// Base mesh names carrying `tag`, in binding order
    pub fn meshes_with_tag(&self, tag: &str) -> Vec<&str> {
        self.bindings.meshes_with_tag(tag)
    }

    /// Write resolved materials onto every enabled binding's mesh instances.
    ///
    /// Bindings are visited in insertion order, so a later enabled binding
    /// for the same mesh wins. Disabled bindings leave their meshes at the
    /// last applied state. A material that fails to resolve skips that mesh
    /// only; the failure is reported and the pass continues.
    pub fn apply_active_tags<R: MeshRegistry + ?Sized>(&self, registry: &mut R) -> ApplyReport {
        let mut report = ApplyReport::default();
        let mut cache: HashMap<&str, ResolvedMaterial> = HashMap::new();
        let protected = self.protected_meshes();

        for binding in self.bindings.iter() {
            if !binding.is_enabled(&self.active) {
                debug!(
                    "apply_active_tags: {} gated off (tags {:?})",
                    binding.mesh, binding.tags
                );
                continue;
            }
            let preserve_generated = protected.contains(binding.mesh.as_str());

            for instance in registry.instances(&binding.mesh) {
                let Some(slot) = primitive_slot(&binding.mesh, &instance.name) else {
                    continue;
                };
                let Some(material_name) = binding.material_for_slot(slot) else {
                    continue;
                };

                if !cache.contains_key(material_name) {
                    match self.resolve_material(material_name) {
                        Ok(resolved) => {
                            cache.insert(material_name, resolved);
                        }
                        Err(error) => {
                            warn!(
                                "apply_active_tags: skipping {} slot {}: {}",
                                instance.name, slot, error
                            );
                            report.skipped.push(SkippedMesh {
                                mesh_name: instance.name,
                                material: material_name.to_string(),
                                error,
                            });
                            continue;
                        }
                    }
                }
                let Some(resolved) = cache.get(material_name) else {
                    continue;
                };
                let Some(live) = registry.material_mut(instance.id) else {
                    continue;
                };

                if let Err(error) = live.apply_resolved(resolved, preserve_generated) {
                    warn!(
                        "apply_active_tags: skipping {} slot {}: {}",
                        instance.name, slot, error
                    );
                    report.skipped.push(SkippedMesh {
                        mesh_name: instance.name,
                        material: material_name.to_string(),
                        error,
                    });
                    continue;
                }

                debug!(
                    "apply_active_tags: {} slot {} <- {}",
                    instance.name, slot, material_name
                );
                report.applied.push(AppliedMaterial {
                    mesh: instance.id,
                    mesh_name: instance.name,
                    slot,
                    material: material_name.to_string(),
                });
            }
        }

        report
    }

    /// Meshes whose opacity and bump inputs belong to a procedural producer.
    ///
    /// Ownership is per mesh: any binding carrying an exclusive tag claims
    /// the mesh for every other binding too.
    fn protected_meshes(&self) -> HashSet<&str> {
        self.exclusive_tags
            .iter()
            .flat_map(|tag| self.bindings.meshes_with_tag(tag))
            .collect()
    }

    fn descriptor_mut(&mut self, name: &str) -> Result<&mut MaterialDescriptor, MaterialError> {
        self.materials
            .get_mut(name)
            .ok_or_else(|| MaterialError::NotFound {
                name: name.to_string(),
            })
    }

    /// Edit a material property during the session.
    ///
    /// The value becomes explicit on `material`, which marks the property
    /// independent: later parent edits no longer reach it.
    pub fn edit_property(
        &mut self,
        material: &str,
        key: PropertyKey,
        value: PropertyValue,
    ) -> Result<(), MaterialError> {
        self.descriptor_mut(material)?.set_property(key, value)?;
        debug!("edit_property: {}.{} is now independent", material, key);
        Ok(())
    }

    /// Drop an edited value so the property tracks the parent again
    pub fn reset_property(&mut self, material: &str, key: PropertyKey) -> Result<(), MaterialError> {
        self.descriptor_mut(material)?.clear_property(key);
        debug!("reset_property: {}.{} inherits again", material, key);
        Ok(())
    }

    /// Whether `key` has diverged from the parent on `material`
    pub fn is_independent(&self, material: &str, key: PropertyKey) -> Result<bool, MaterialError> {
        self.materials
            .get(material)
            .map(|descriptor| descriptor.is_explicit(key))
            .ok_or_else(|| MaterialError::NotFound {
                name: material.to_string(),
            })
    }

    /// Re-parent a material. A parent that is unknown or would create a
    /// cycle is rejected and the previous parent is kept.
    pub fn set_parent(&mut self, material: &str, parent: Option<&str>) -> Result<(), MaterialError> {
        if let Some(parent) = parent {
            if !self.materials.contains_key(parent) {
                return Err(MaterialError::NotFound {
                    name: parent.to_string(),
                });
            }
        }

        let descriptor = self.descriptor_mut(material)?;
        let previous = std::mem::replace(&mut descriptor.parent, parent.map(str::to_string));

        if let Err(error) = inheritance_chain(&self.materials, material) {
            if let Some(descriptor) = self.materials.get_mut(material) {
                descriptor.parent = previous;
            }
            return Err(error);
        }
        Ok(())
    }

    /// The current material table, including session edits
    pub fn export_materials(&self) -> MaterialSetDocument {
        MaterialSetDocument {
            materials: self.materials.clone(),
        }
    }
}
