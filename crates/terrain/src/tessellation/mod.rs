//! CPU rendition of the two tessellation stages. The WGSL in the `gpu` crate
//! implements the same arithmetic.

pub mod control;
pub mod evaluation;

pub use control::{
    ControlParams, MAX_TESSELLATION_LEVEL, TessLevels, edge_factor, patch_bounds, patch_levels,
    screen_length,
};
pub use evaluation::{
    SurfaceVertex, TerrainTransform, TessellatedPatch, displace, evaluate, grid_coordinate,
    surface_normal, tessellate_patch,
};
