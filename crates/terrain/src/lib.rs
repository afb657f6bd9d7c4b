//! Terrain core: height field, patch grid, camera and the CPU rendition of
//! the adaptive tessellation pipeline.

pub mod assets;
pub mod camera;
pub mod controls;
pub mod error;
pub mod frustum;
pub mod heightmap;
pub mod lighting;
pub mod params;
pub mod patch;
pub mod reference;
pub mod scene;
pub mod settings;
pub mod shading;
pub mod tessellation;

pub use glam;

pub use assets::{AssetSource, InMemoryAssets};
pub use camera::{Axis, Camera, Projection};
pub use controls::{ControlMap, ControlOutcome, Key, PointerButton};
pub use error::{AssetError, TerrainError};
pub use frustum::{Frustum, Plane};
pub use heightmap::HeightMap;
pub use lighting::{Lighting, sun_direction};
pub use params::{Param, SteppedValue, TerrainParams};
pub use patch::{Patch, PatchGrid};
pub use reference::{FrameStats, ReferenceFrame};
pub use scene::{FrameUniforms, SceneState};
pub use settings::SceneSettings;
pub use shading::{DisplayMode, MaterialImage, MaterialLayers};
pub use tessellation::{ControlParams, TerrainTransform, TessLevels};
