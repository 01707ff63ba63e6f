//! Vitrine material resolution - tag-gated material bindings
//!
//! This crate maps the declarative mesh/tag binding table and the currently
//! active tags onto concrete material writes:
//! - [`tags::ActiveTagSet`] - Tags currently enabled in the session
//! - [`binding`] - Mesh/slot/tag bindings flattened from the model document
//! - [`resolve`] - Parent-chain resolution of material descriptors
//! - [`live`] - The live engine material the resolver writes to
//! - [`registry`] - Mesh lookup capability and an in-memory scene
//! - [`resolver`] - The [`TagResolver`] tying it all together

pub mod binding;
pub mod error;
pub mod live;
pub mod registry;
pub mod resolve;
pub mod resolver;
pub mod tags;

pub use binding::*;
pub use error::MaterialError;
pub use live::*;
pub use registry::*;
pub use resolve::*;
pub use resolver::*;
pub use tags::*;
