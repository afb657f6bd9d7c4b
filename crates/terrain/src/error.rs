/// Errors raised while building terrain data from its inputs.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TerrainError {
    #[error("height map {width}x{height} is too small: at least 2x2 samples are required")]
    HeightMapTooSmall { width: u32, height: u32 },

    #[error("height map {width}x{height} expects {expected} samples, got {actual}")]
    SampleCountMismatch {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },

    #[error("{layer} layer {width}x{height} expects {expected} texels, got {actual}")]
    LayerSizeMismatch {
        layer: &'static str,
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },

    #[error("patch size must cover at least one height-map cell")]
    InvalidPatchSize,
}

/// A required resource (height map, material layer) could not be provided.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("failed to load {resource}: {message}")]
pub struct AssetError {
    pub resource: String,
    pub message: String,
}

impl AssetError {
    pub fn new(resource: impl Into<String>, message: impl ToString) -> Self {
        Self {
            resource: resource.into(),
            message: message.to_string(),
        }
    }
}
