//! Error types for material resolution.

use crate::resolve::PropertyKey;

/// Configuration errors surfaced by material resolution and editing.
///
/// These indicate a corrupt or inconsistent material table and are always
/// returned to the caller.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MaterialError {
    #[error("Material not found: {name}")]
    NotFound { name: String },

    #[error("Cyclic inheritance detected while resolving material {name}")]
    CyclicInheritance { name: String },

    #[error("Property {key} expects a {expected} value")]
    PropertyKind {
        key: PropertyKey,
        expected: &'static str,
    },

    #[error("Invalid hex color: {0:?}")]
    InvalidColor(String),
}
