//! Tessellation control: per-patch culling and edge subdivision factors
//! from a screen-space error budget.

use foundation::{Aabb3, Viewport};
use glam::{Mat4, Vec2, Vec3};

use crate::frustum::Frustum;
use crate::heightmap::HeightMap;
use crate::patch::Patch;
use crate::tessellation::evaluation::{TerrainTransform, displace};

/// Clip-space `w` at or below which a point counts as behind the camera.
pub const CLIP_W_EPSILON: f32 = 1e-4;

/// Smallest error threshold used in the factor division.
pub const MIN_ERROR_PX: f32 = 1e-3;

/// Largest per-edge factor hardware tessellators accept.
pub const MAX_TESSELLATION_LEVEL: u32 = 64;

/// Everything the control stage reads besides the patch itself.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ControlParams {
    pub view_proj: Mat4,
    pub frustum: Frustum,
    pub viewport: Viewport,
    /// Target on-screen length of one generated segment, in pixels.
    pub screen_space_error: f32,
    pub max_level: f32,
}

impl ControlParams {
    /// `max_level` is clamped to `1..=MAX_TESSELLATION_LEVEL`.
    pub fn new(view_proj: Mat4, viewport: Viewport, screen_space_error: f32, max_level: u32) -> Self {
        Self {
            view_proj,
            frustum: Frustum::from_view_proj(view_proj),
            viewport,
            screen_space_error,
            max_level: max_level.clamp(1, MAX_TESSELLATION_LEVEL) as f32,
        }
    }
}

/// Outer factors per edge (bottom, right, top, left) and the inner factor.
/// All zero when the patch is culled.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct TessLevels {
    pub outer: [f32; 4],
    pub inner: f32,
}

impl TessLevels {
    pub fn culled() -> Self {
        Self {
            outer: [0.0; 4],
            inner: 0.0,
        }
    }

    pub fn from_outer(outer: [f32; 4]) -> Self {
        Self {
            outer,
            inner: outer.into_iter().fold(0.0, f32::max),
        }
    }

    pub fn is_culled(&self) -> bool {
        self.inner <= 0.0
    }

    pub fn inner_divisions(&self) -> u32 {
        self.inner.max(0.0) as u32
    }

    /// Grid cells the evaluation stage generates for this patch.
    pub fn cell_count(&self) -> u64 {
        let n = self.inner_divisions() as u64;
        n * n
    }
}

/// Pixel distance between two projected points, or `None` when either lies
/// on or behind the camera plane.
pub fn screen_length(a: Vec3, b: Vec3, params: &ControlParams) -> Option<f32> {
    let project = |p: Vec3| -> Option<Vec2> {
        let clip = params.view_proj * p.extend(1.0);
        if clip.w <= CLIP_W_EPSILON {
            return None;
        }
        Some(params.viewport.ndc_to_pixels(clip.truncate().truncate() / clip.w))
    };
    Some(project(a)?.distance(project(b)?))
}

/// Equal-spacing subdivision factor for the edge `a → b`.
///
/// Depends only on the two endpoints, so both patches sharing an edge agree.
pub fn edge_factor(a: Vec3, b: Vec3, params: &ControlParams) -> f32 {
    match screen_length(a, b, params) {
        None => params.max_level,
        Some(pixels) => {
            let raw = pixels / params.screen_space_error.max(MIN_ERROR_PX);
            if raw.is_nan() {
                return params.max_level;
            }
            raw.clamp(1.0, params.max_level).ceil()
        }
    }
}

/// World-space box that contains every vertex the patch can produce.
pub fn patch_bounds(corners: &[Vec3; 4], transform: &TerrainTransform) -> Aabb3 {
    let (lo, hi) = transform.height_bounds();
    let mut min = corners[0];
    let mut max = corners[0];
    for c in &corners[1..] {
        min = min.min(*c);
        max = max.max(*c);
    }
    Aabb3::new(Vec3::new(min.x, lo, min.z), Vec3::new(max.x, hi, max.z))
}

pub fn patch_levels(
    patch: &Patch,
    map: &HeightMap,
    transform: &TerrainTransform,
    params: &ControlParams,
) -> TessLevels {
    let corners = patch.corners.map(|uv| displace(map, transform, uv));
    if !params.frustum.intersects_aabb(&patch_bounds(&corners, transform)) {
        return TessLevels::culled();
    }

    let mut outer = [0.0; 4];
    for (k, factor) in outer.iter_mut().enumerate() {
        *factor = edge_factor(corners[k], corners[(k + 1) % 4], params);
    }
    TessLevels::from_outer(outer)
}
