//! Mesh/tag binding table
//!
//! Bindings are flattened from the model document in document order. Each
//! binding names a base mesh; live instances are either the base mesh itself
//! or its sub-meshes `<base>_primitiveN`, and primitive `N` maps to material
//! slot `N + 1`.

use vitrine_config::ModelSetDocument;

use crate::tags::ActiveTagSet;

const PRIMITIVE_SUFFIX: &str = "_primitive";

/// Material slot for a live mesh instance named `name` under base mesh `base`.
///
/// The base mesh itself is slot 1, `<base>_primitiveN` is slot `N + 1`, and
/// anything else does not belong to `base`.
pub fn primitive_slot(base: &str, name: &str) -> Option<u32> {
    if name == base {
        return Some(1);
    }
    let digits = name.strip_prefix(base)?.strip_prefix(PRIMITIVE_SUFFIX)?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse::<u32>().ok()?.checked_add(1)
}

/// One mesh's slot mapping and gating tags
#[derive(Debug, Clone, PartialEq)]
pub struct MeshTagBinding {
    /// Model key the binding came from
    pub model: String,
    /// Base mesh name
    pub mesh: String,
    /// `slots[i]` names the material for slot `i + 1`
    pub slots: Vec<String>,
    /// Gating tags; empty means always applied
    pub tags: Vec<String>,
}

impl MeshTagBinding {
    /// Material configured for a 1-based slot, if any
    pub fn material_for_slot(&self, slot: u32) -> Option<&str> {
        let index = slot.checked_sub(1)? as usize;
        self.slots
            .get(index)
            .map(|name| name.trim())
            .filter(|name| !name.is_empty())
    }

    pub fn carries_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    /// Whether the binding applies under the given active tags
    pub fn is_enabled(&self, active: &ActiveTagSet) -> bool {
        self.tags.is_empty() || active.any_of(self.tags.as_slice())
    }
}

/// All bindings in insertion order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BindingTable {
    bindings: Vec<MeshTagBinding>,
}

impl BindingTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flatten every model's meshes, in document order
    pub fn from_document(doc: &ModelSetDocument) -> Self {
        let bindings = doc
            .models
            .iter()
            .flat_map(|(model, entry)| {
                entry.meshes.iter().map(move |(mesh, mesh_entry)| MeshTagBinding {
                    model: model.to_string(),
                    mesh: mesh.to_string(),
                    slots: mesh_entry.material_slots.clone(),
                    tags: mesh_entry.tags.clone(),
                })
            })
            .collect();
        Self { bindings }
    }

    pub fn iter(&self) -> impl Iterator<Item = &MeshTagBinding> {
        self.bindings.iter()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Base mesh names carrying `tag`, first occurrence order, deduplicated
    pub fn meshes_with_tag(&self, tag: &str) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for binding in self.bindings.iter().filter(|b| b.carries_tag(tag)) {
            if !names.contains(&binding.mesh.as_str()) {
                names.push(&binding.mesh);
            }
        }
        names
    }
}
