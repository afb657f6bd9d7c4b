pub mod buffers;
pub mod context;
pub mod error;
pub mod pipeline;
pub mod renderer;
pub mod scene;
pub mod shaders;
pub mod textures;

pub use buffers::{CellCounter, Globals};
pub use context::GpuContext;
pub use error::{GpuError, ShaderStage};
pub use renderer::{TerrainRenderer, TerrainResources};
pub use scene::TerrainScene;
