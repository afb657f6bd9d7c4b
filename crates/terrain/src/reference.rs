//! Whole-frame CPU reference: tessellation control, evaluation and shading
//! over every patch, the same work the GPU pipeline performs.

use std::fmt;

use glam::{Vec3, Vec4};

use crate::heightmap::HeightMap;
use crate::patch::PatchGrid;
use crate::scene::SceneState;
use crate::shading::{FragmentInput, MaterialLayers, ShadingContext, shade};
use crate::tessellation::{SurfaceVertex, patch_levels, tessellate_patch};

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ReferenceVertex {
    pub surface: SurfaceVertex,
    pub clip: Vec4,
}

impl ReferenceVertex {
    /// Normalized device depth, as written to the depth buffer.
    pub fn depth(&self) -> f32 {
        self.clip.z / self.clip.w
    }
}

#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct FrameStats {
    pub patches: usize,
    pub visible_patches: usize,
    pub culled_patches: usize,
    pub cells: u64,
    pub triangles: u64,
    pub max_factor: f32,
}

impl fmt::Display for FrameStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} patches ({} visible, {} culled), {} cells, {} triangles, max factor {}",
            self.patches,
            self.visible_patches,
            self.culled_patches,
            self.cells,
            self.triangles,
            self.max_factor
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReferenceFrame {
    pub vertices: Vec<ReferenceVertex>,
    pub triangles: Vec<[u32; 3]>,
    /// One color per triangle, shaded at its centroid.
    pub colors: Vec<Vec4>,
    pub stats: FrameStats,
}

impl ReferenceFrame {
    pub fn render(
        scene: &SceneState,
        map: &HeightMap,
        layers: &MaterialLayers,
        grid: &PatchGrid,
    ) -> Self {
        let control = scene.control_params();
        let transform = scene.transform();
        let ctx = ShadingContext {
            lighting: scene.lighting(),
            camera_position: scene.camera().position(),
            settings: &scene.settings().shading,
            layers,
        };

        let mut frame = ReferenceFrame {
            stats: FrameStats {
                patches: grid.patch_count(),
                ..FrameStats::default()
            },
            ..ReferenceFrame::default()
        };

        for patch in grid.patches() {
            let levels = patch_levels(patch, map, &transform, &control);
            if levels.is_culled() {
                frame.stats.culled_patches += 1;
                continue;
            }
            frame.stats.visible_patches += 1;
            frame.stats.cells += levels.cell_count();
            frame.stats.max_factor = frame.stats.max_factor.max(levels.inner);

            let tessellated = tessellate_patch(patch, &levels, map, &transform);
            let base = frame.vertices.len() as u32;
            frame
                .vertices
                .extend(tessellated.vertices.iter().map(|&surface| ReferenceVertex {
                    surface,
                    clip: control.view_proj * surface.position.extend(1.0),
                }));

            for tri in tessellated.triangles {
                let [a, b, c] = tri.map(|i| tessellated.vertices[i as usize]);
                let input = centroid(&a, &b, &c);
                frame.colors.push(shade(scene.display_mode(), &input, &ctx));
                frame.triangles.push(tri.map(|i| base + i));
            }
        }
        frame.stats.triangles = frame.triangles.len() as u64;
        frame
    }
}

fn centroid(a: &SurfaceVertex, b: &SurfaceVertex, c: &SurfaceVertex) -> FragmentInput {
    let third = 1.0 / 3.0;
    FragmentInput {
        position: (a.position + b.position + c.position) * third,
        normal: (a.normal + b.normal + c.normal)
            .try_normalize()
            .unwrap_or(Vec3::Y),
        uv: (a.uv + b.uv + c.uv) * third,
        height: (a.height + b.height + c.height) * third,
        barycentric: Vec3::splat(third),
    }
}
