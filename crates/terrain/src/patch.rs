use glam::{UVec2, Vec2};

use crate::error::TerrainError;

/// One quad cell of the terrain grid, the unit of adaptive subdivision.
///
/// Corners are height-map UVs in `[0, 1]²`, counter-clockwise starting at
/// `(u0, v0)`: `[(u0,v0), (u1,v0), (u1,v1), (u0,v1)]`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Patch {
    pub grid: UVec2,
    pub corners: [Vec2; 4],
}

impl Patch {
    pub fn min_uv(&self) -> Vec2 {
        self.corners[0]
    }

    pub fn max_uv(&self) -> Vec2 {
        self.corners[2]
    }

    /// Bilinear interpolation of the corner UVs at patch-local `t ∈ [0, 1]²`.
    pub fn uv_at(&self, t: Vec2) -> Vec2 {
        let [c0, c1, c2, c3] = self.corners;
        let bottom = c0.lerp(c1, t.x);
        let top = c3.lerp(c2, t.x);
        bottom.lerp(top, t.y)
    }
}

/// Static grid of patches covering the height-map footprint.
///
/// Built once per height map; a new map means a new grid. There is no partial
/// update.
#[derive(Debug, Clone, PartialEq)]
pub struct PatchGrid {
    columns: u32,
    rows: u32,
    cells_per_patch: u32,
    patches: Vec<Patch>,
}

impl PatchGrid {
    /// One patch per height-map cell: `(W-1) × (H-1)` patches.
    pub fn from_height_map_size(width: u32, height: u32) -> Result<Self, TerrainError> {
        Self::with_patch_size(width, height, 1)
    }

    /// Patches spanning `cells_per_patch` height-map cells per edge. The last
    /// row and column are clipped to the map.
    pub fn with_patch_size(
        width: u32,
        height: u32,
        cells_per_patch: u32,
    ) -> Result<Self, TerrainError> {
        if width < 2 || height < 2 {
            return Err(TerrainError::HeightMapTooSmall { width, height });
        }
        if cells_per_patch == 0 {
            return Err(TerrainError::InvalidPatchSize);
        }

        let cells = UVec2::new(width - 1, height - 1);
        let columns = cells.x.div_ceil(cells_per_patch);
        let rows = cells.y.div_ceil(cells_per_patch);
        let to_uv = |cell: UVec2| cell.min(cells).as_vec2() / cells.as_vec2();

        let mut patches = Vec::with_capacity(columns as usize * rows as usize);
        for y in 0..rows {
            for x in 0..columns {
                let lo = to_uv(UVec2::new(x, y) * cells_per_patch);
                let hi = to_uv(UVec2::new(x + 1, y + 1) * cells_per_patch);
                patches.push(Patch {
                    grid: UVec2::new(x, y),
                    corners: [
                        Vec2::new(lo.x, lo.y),
                        Vec2::new(hi.x, lo.y),
                        Vec2::new(hi.x, hi.y),
                        Vec2::new(lo.x, hi.y),
                    ],
                });
            }
        }

        Ok(Self {
            columns,
            rows,
            cells_per_patch,
            patches,
        })
    }

    pub fn columns(&self) -> u32 {
        self.columns
    }

    pub fn rows(&self) -> u32 {
        self.rows
    }

    pub fn cells_per_patch(&self) -> u32 {
        self.cells_per_patch
    }

    pub fn patch_count(&self) -> usize {
        self.patches.len()
    }

    pub fn patches(&self) -> &[Patch] {
        &self.patches
    }

    pub fn get(&self, x: u32, y: u32) -> Option<&Patch> {
        if x >= self.columns || y >= self.rows {
            return None;
        }
        self.patches.get((y * self.columns + x) as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::PatchGrid;
    use crate::error::TerrainError;
    use glam::Vec2;

    #[test]
    fn one_patch_per_cell() {
        let grid = PatchGrid::from_height_map_size(5, 3).expect("grid");
        assert_eq!((grid.columns(), grid.rows()), (4, 2));
        assert_eq!(grid.patch_count(), 8);

        let p = grid.get(1, 1).expect("patch");
        assert_eq!(p.corners[0], Vec2::new(0.25, 0.5));
        assert_eq!(p.corners[2], Vec2::new(0.5, 1.0));
        assert!(grid.get(4, 0).is_none());
    }

    #[test]
    fn neighbouring_patches_share_edges() {
        let grid = PatchGrid::from_height_map_size(9, 9).expect("grid");
        let a = grid.get(2, 3).expect("a");
        let right = grid.get(3, 3).expect("right");
        let above = grid.get(2, 4).expect("above");
        assert_eq!(a.corners[1], right.corners[0]);
        assert_eq!(a.corners[2], right.corners[3]);
        assert_eq!(a.corners[3], above.corners[0]);
    }

    #[test]
    fn larger_patches_clip_last_column() {
        let grid = PatchGrid::with_patch_size(11, 6, 4).expect("grid");
        // 10 x 5 cells -> 3 x 2 patches
        assert_eq!((grid.columns(), grid.rows()), (3, 2));
        let last = grid.get(2, 1).expect("last");
        assert_eq!(last.max_uv(), Vec2::new(1.0, 1.0));
        assert_eq!(last.min_uv(), Vec2::new(0.8, 0.8));
    }

    #[test]
    fn rejects_invalid_inputs() {
        assert_eq!(
            PatchGrid::with_patch_size(4, 4, 0),
            Err(TerrainError::InvalidPatchSize)
        );
        assert!(matches!(
            PatchGrid::from_height_map_size(1, 1),
            Err(TerrainError::HeightMapTooSmall { .. })
        ));
    }

    #[test]
    fn uv_at_interpolates_corners() {
        let grid = PatchGrid::from_height_map_size(3, 3).expect("grid");
        let p = grid.get(0, 0).expect("patch");
        assert_eq!(p.uv_at(Vec2::new(0.5, 0.5)), Vec2::new(0.25, 0.25));
        assert_eq!(p.uv_at(Vec2::ONE), p.corners[2]);
    }
}
