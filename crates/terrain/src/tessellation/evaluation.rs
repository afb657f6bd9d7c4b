//! Tessellation evaluation: maps generated grid points of a patch to
//! displaced world-space vertices.

use glam::{UVec2, Vec2, Vec3};

use crate::heightmap::{HeightMap, texel_step};
use crate::patch::Patch;
use crate::tessellation::control::TessLevels;

/// Height-map UV and normalized height to world space.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct TerrainTransform {
    /// World size of the full map along x and z.
    pub extent: Vec2,
    /// World meters for a normalized height of 1.
    pub height_scale: f32,
    /// UV distance between neighbouring height-map samples.
    pub texel_step: Vec2,
}

impl TerrainTransform {
    pub fn new(
        map_size: UVec2,
        texel_size_m: f32,
        horizontal_scale: f32,
        height_range_m: f32,
        vertical_scale: f32,
    ) -> Self {
        let cells = map_size.max(UVec2::splat(2)) - UVec2::ONE;
        Self {
            extent: cells.as_vec2() * texel_size_m * horizontal_scale,
            height_scale: height_range_m * vertical_scale,
            texel_step: texel_step(map_size),
        }
    }

    pub fn world_position(&self, uv: Vec2, height: f32) -> Vec3 {
        Vec3::new(
            uv.x * self.extent.x,
            height * self.height_scale,
            uv.y * self.extent.y,
        )
    }

    /// World-space y range any displaced vertex can occupy.
    pub fn height_bounds(&self) -> (f32, f32) {
        (self.height_scale.min(0.0), self.height_scale.max(0.0))
    }
}

/// One evaluated vertex.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct SurfaceVertex {
    pub position: Vec3,
    pub normal: Vec3,
    pub uv: Vec2,
    pub height: f32,
}

pub fn displace(map: &HeightMap, transform: &TerrainTransform, uv: Vec2) -> Vec3 {
    transform.world_position(uv, map.sample(uv))
}

/// Normal from central differences of the neighbouring height samples.
pub fn surface_normal(map: &HeightMap, transform: &TerrainTransform, uv: Vec2) -> Vec3 {
    let step = transform.texel_step;
    let dx = Vec2::new(step.x, 0.0);
    let dz = Vec2::new(0.0, step.y);

    let slope_x = (map.sample(uv + dx) - map.sample(uv - dx)) * transform.height_scale;
    let slope_z = (map.sample(uv + dz) - map.sample(uv - dz)) * transform.height_scale;
    let run_x = (2.0 * step.x * transform.extent.x).abs().max(f32::EPSILON);
    let run_z = (2.0 * step.y * transform.extent.y).abs().max(f32::EPSILON);

    Vec3::new(-slope_x / run_x, 1.0, -slope_z / run_z)
        .try_normalize()
        .unwrap_or(Vec3::Y)
}

pub fn evaluate(
    patch: &Patch,
    map: &HeightMap,
    transform: &TerrainTransform,
    t: Vec2,
) -> SurfaceVertex {
    let uv = patch.uv_at(t);
    let height = map.sample(uv);
    SurfaceVertex {
        position: transform.world_position(uv, height),
        normal: surface_normal(map, transform, uv),
        uv,
        height,
    }
}

fn snap(t: f32, factor: f32) -> f32 {
    if factor <= 0.0 {
        return t;
    }
    (t * factor).round() / factor
}

/// Patch-local coordinate of grid point `(i, j)` on an `n × n` grid.
///
/// Points on the patch boundary are snapped to the spacing of that edge's
/// outer factor, so both patches sharing an edge place its vertices at the
/// same positions. Edges are ordered bottom, right, top, left
/// (`c0→c1, c1→c2, c2→c3, c3→c0`).
pub fn grid_coordinate(i: u32, j: u32, n: u32, outer: [f32; 4]) -> Vec2 {
    let n_f = n.max(1) as f32;
    let mut t = Vec2::new(i as f32 / n_f, j as f32 / n_f);
    if j == 0 {
        t.x = snap(t.x, outer[0]);
    } else if j == n {
        t.x = snap(t.x, outer[2]);
    }
    if i == n {
        t.y = snap(t.y, outer[1]);
    } else if i == 0 {
        t.y = snap(t.y, outer[3]);
    }
    t
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TessellatedPatch {
    pub vertices: Vec<SurfaceVertex>,
    /// Counter-clockwise seen from above (+y).
    pub triangles: Vec<[u32; 3]>,
}

impl TessellatedPatch {
    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }
}

/// Generates the displaced grid for one patch. Culled patches produce nothing.
pub fn tessellate_patch(
    patch: &Patch,
    levels: &TessLevels,
    map: &HeightMap,
    transform: &TerrainTransform,
) -> TessellatedPatch {
    let n = levels.inner_divisions();
    if n == 0 {
        return TessellatedPatch::default();
    }

    let stride = n + 1;
    let mut vertices = Vec::with_capacity((stride * stride) as usize);
    for j in 0..=n {
        for i in 0..=n {
            let t = grid_coordinate(i, j, n, levels.outer);
            vertices.push(evaluate(patch, map, transform, t));
        }
    }

    let mut triangles = Vec::with_capacity((n * n * 2) as usize);
    for j in 0..n {
        for i in 0..n {
            let i0 = j * stride + i;
            let i1 = i0 + 1;
            let i3 = i0 + stride;
            let i2 = i3 + 1;
            triangles.push([i0, i3, i2]);
            triangles.push([i0, i2, i1]);
        }
    }

    TessellatedPatch {
        vertices,
        triangles,
    }
}

#[cfg(test)]
mod tests {
    use super::{TerrainTransform, displace, grid_coordinate, surface_normal, tessellate_patch};
    use crate::heightmap::HeightMap;
    use crate::patch::PatchGrid;
    use crate::tessellation::control::TessLevels;
    use glam::{UVec2, Vec2, Vec3};

    fn transform(map: &HeightMap) -> TerrainTransform {
        TerrainTransform::new(map.size(), 10.0, 1.0, 100.0, 1.0)
    }

    #[test]
    fn transform_scales_extent_and_height() {
        let t = TerrainTransform::new(UVec2::new(65, 33), 2.0, 1.5, 200.0, 0.5);
        assert_eq!(t.extent, Vec2::new(192.0, 96.0));
        assert_eq!(t.height_scale, 100.0);
        assert_eq!(
            t.world_position(Vec2::new(0.5, 1.0), 0.25),
            Vec3::new(96.0, 25.0, 96.0)
        );
    }

    #[test]
    fn flat_map_has_up_normals() {
        let map = HeightMap::from_fn(5, 5, |_, _| 0.3).expect("map");
        let t = transform(&map);
        for uv in [Vec2::ZERO, Vec2::splat(0.5), Vec2::ONE] {
            assert!(surface_normal(&map, &t, uv).abs_diff_eq(Vec3::Y, 1e-6));
            assert!((displace(&map, &t, uv).y - 30.0).abs() < 1e-4);
        }
    }

    #[test]
    fn slope_rising_east_tilts_normal_west() {
        let map = HeightMap::from_fn(5, 5, |x, _| x as f32 / 4.0).expect("map");
        let n = surface_normal(&map, &transform(&map), Vec2::splat(0.5));
        assert!(n.x < 0.0);
        assert!(n.z.abs() < 1e-6);
        assert!((n.length() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn boundary_points_snap_to_edge_spacing() {
        // inner 4, bottom edge factor 2: the points at 1/4 and 3/4 snap onto
        // the edge's two-segment spacing.
        let outer = [2.0, 4.0, 4.0, 4.0];
        assert_eq!(grid_coordinate(1, 0, 4, outer).x, 0.5);
        assert_eq!(grid_coordinate(2, 0, 4, outer).x, 0.5);
        assert_eq!(grid_coordinate(3, 0, 4, outer).x, 1.0);
        // interior points are untouched
        assert_eq!(grid_coordinate(1, 1, 4, outer), Vec2::new(0.25, 0.25));
    }

    #[test]
    fn shared_edges_line_up_between_patches() {
        let map = HeightMap::from_fn(9, 9, |x, y| ((x * 7 + y * 3) % 5) as f32 / 4.0)
            .expect("map");
        let t = transform(&map);
        let grid = PatchGrid::with_patch_size(9, 9, 4).expect("grid");
        let left = grid.get(0, 0).expect("left");
        let right = grid.get(1, 0).expect("right");

        let shared = 3.0;
        let a = tessellate_patch(
            left,
            &TessLevels::from_outer([2.0, shared, 5.0, 4.0]),
            &map,
            &t,
        );
        let b = tessellate_patch(
            right,
            &TessLevels::from_outer([1.0, 2.0, 2.0, shared]),
            &map,
            &t,
        );

        let on_edge = |tp: &super::TessellatedPatch, u: f32| {
            let mut ys: Vec<[i64; 3]> = tp
                .vertices
                .iter()
                .filter(|v| (v.uv.x - u).abs() < 1e-6)
                .map(|v| {
                    let p = (v.position * 1e3).round();
                    [p.x as i64, p.y as i64, p.z as i64]
                })
                .collect();
            ys.sort();
            ys.dedup();
            ys
        };
        assert_eq!(on_edge(&a, 0.5), on_edge(&b, 0.5));
        assert_eq!(on_edge(&a, 0.5).len(), shared as usize + 1);
    }

    #[test]
    fn triangles_face_up_and_count_two_per_cell() {
        let map = HeightMap::from_fn(3, 3, |_, _| 0.0).expect("map");
        let t = transform(&map);
        let grid = PatchGrid::from_height_map_size(3, 3).expect("grid");
        let tp = tessellate_patch(
            grid.get(0, 0).expect("patch"),
            &TessLevels::from_outer([3.0; 4]),
            &map,
            &t,
        );
        assert_eq!(tp.vertices.len(), 16);
        assert_eq!(tp.triangles.len(), 18);
        for [a, b, c] in &tp.triangles {
            let (a, b, c) = (
                tp.vertices[*a as usize].position,
                tp.vertices[*b as usize].position,
                tp.vertices[*c as usize].position,
            );
            assert!((b - a).cross(c - a).y > 0.0);
        }
        assert!(tessellate_patch(grid.get(0, 0).expect("patch"), &TessLevels::culled(), &map, &t).is_empty());
    }
}
