use std::fmt;

use terrain::{AssetError, TerrainError};

/// Pipeline stage a shader module implements.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ShaderStage {
    TessControl,
    TessEvaluation,
    Fragment,
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ShaderStage::TessControl => "tessellation control",
            ShaderStage::TessEvaluation => "tessellation evaluation",
            ShaderStage::Fragment => "fragment",
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum GpuError {
    /// `module` names the shader source that failed.
    #[error("{stage} shader `{module}` failed to build: {message}")]
    ShaderCompile {
        stage: ShaderStage,
        module: String,
        message: String,
    },

    #[error(transparent)]
    Asset(#[from] AssetError),

    #[error(transparent)]
    Terrain(#[from] TerrainError),

    #[error("surface error: {0}")]
    Surface(String),

    #[error("no suitable GPU adapter: {0}")]
    Adapter(String),

    #[error("device request failed: {0}")]
    Device(String),

    #[error("terrain scene used before initialise")]
    NotInitialised,
}
