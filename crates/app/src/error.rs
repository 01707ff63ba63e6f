//! Errors surfaced by the configurator facade

use thiserror::Error;

use vitrine_config::ConfigError;
use vitrine_materials::MaterialError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Material(#[from] MaterialError),

    #[error("Failed to create {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write {path}: {source}")]
    Image {
        path: String,
        #[source]
        source: image::ImageError,
    },

    #[error("No engraving text has been set")]
    NoEngraving,
}
