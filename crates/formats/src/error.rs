use std::path::PathBuf;

use terrain::{AssetError, TerrainError};

#[derive(Debug, thiserror::Error)]
pub enum FormatError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("manifest {} is invalid: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("unsupported manifest version: {found}")]
    UnsupportedVersion { found: String },

    #[error("failed to decode image {}: {source}", path.display())]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("{} is not a usable terrain image: {source}", path.display())]
    Terrain {
        path: PathBuf,
        #[source]
        source: TerrainError,
    },
}

impl FormatError {
    /// Reports this failure against the named resource.
    pub fn into_asset_error(self, resource: impl Into<String>) -> AssetError {
        AssetError::new(resource, self)
    }
}
