use bytemuck::{Pod, Zeroable};
use glam::UVec2;
use terrain::scene::viewport_vec4;
use terrain::{FrameUniforms, PatchGrid};
use wgpu::util::DeviceExt;

/// Per-frame uniform block. Layout matches `Globals` in the WGSL sources.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct Globals {
    pub view_proj: [[f32; 4]; 4],
    pub camera_pos: [f32; 4],
    pub sun: [f32; 4],
    pub viewport: [f32; 4],
    pub terrain: [f32; 4],
    pub texel: [f32; 4],
    pub tess: [f32; 4],
    pub fog: [f32; 4],
    pub wire: [f32; 4],
    pub wire_fill: [f32; 4],
    pub frustum: [[f32; 4]; 6],
    pub dims: [u32; 4],
    pub limits: [u32; 4],
}

impl Globals {
    pub fn from_frame(
        frame: &FrameUniforms,
        map_size: UVec2,
        patch_count: u32,
        cell_capacity: u32,
    ) -> Self {
        let t = &frame.transform;
        let s = &frame.shading;
        Self {
            view_proj: frame.view_proj.to_cols_array_2d(),
            camera_pos: frame.camera_position.extend(1.0).to_array(),
            sun: frame.sun_dir.extend(s.ambient).to_array(),
            viewport: viewport_vec4(frame.viewport).to_array(),
            terrain: [t.extent.x, t.extent.y, t.height_scale, s.texture_tiling],
            texel: [t.texel_step.x, t.texel_step.y, 0.0, 0.0],
            tess: [frame.screen_space_error, frame.max_level, 0.0, 0.0],
            fog: [s.fog_color[0], s.fog_color[1], s.fog_color[2], s.fog_density],
            wire: [s.wire_color[0], s.wire_color[1], s.wire_color[2], 1.0],
            wire_fill: [
                s.wire_fill_color[0],
                s.wire_fill_color[1],
                s.wire_fill_color[2],
                1.0,
            ],
            frustum: frame.frustum_planes.map(|p| p.to_array()),
            dims: [
                map_size.x,
                map_size.y,
                patch_count,
                frame.display_mode.index(),
            ],
            limits: [cell_capacity, 0, 0, 0],
        }
    }
}

/// Corner UVs of one patch, in the order the control stage reads them.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct PatchRecord {
    pub corners: [[f32; 2]; 4],
}

pub fn patch_records(grid: &PatchGrid) -> Vec<PatchRecord> {
    grid.patches()
        .iter()
        .map(|p| PatchRecord {
            corners: p.corners.map(|c| c.to_array()),
        })
        .collect()
}

/// Atomic counters written by the control stage.
#[repr(C)]
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct CellCounter {
    pub cells: u32,
    pub overflowed_patches: u32,
}

/// `(patch index, cell index)` appended per generated grid cell.
pub const CELL_RECORD_SIZE: u64 = 8;

/// Buffers shared by the control and evaluation stages.
#[derive(Debug)]
pub struct TerrainBuffers {
    pub globals: wgpu::Buffer,
    pub patches: wgpu::Buffer,
    pub levels: wgpu::Buffer,
    pub cells: wgpu::Buffer,
    pub counter: wgpu::Buffer,
    pub draw_args: wgpu::Buffer,
    pub readback: wgpu::Buffer,
    pub patch_count: u32,
    pub cell_capacity: u32,
}

impl TerrainBuffers {
    pub fn new(device: &wgpu::Device, grid: &PatchGrid, cell_capacity: u32) -> Self {
        let records = patch_records(grid);
        let patch_count = records.len() as u32;
        let max_cells = device.limits().max_storage_buffer_binding_size as u64 / CELL_RECORD_SIZE;
        let cell_capacity = (cell_capacity.max(1) as u64).min(max_cells) as u32;

        let globals = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("terrain-globals"),
            size: std::mem::size_of::<Globals>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let patches = patch_buffer(device, &records);
        let levels = levels_buffer(device, patch_count);
        let cells = cells_buffer(device, cell_capacity);

        let counter = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("terrain-cell-counter"),
            size: std::mem::size_of::<CellCounter>() as u64,
            usage: wgpu::BufferUsages::STORAGE
                | wgpu::BufferUsages::COPY_DST
                | wgpu::BufferUsages::COPY_SRC,
            mapped_at_creation: false,
        });

        let draw_args = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("terrain-draw-args"),
            size: 16,
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::INDIRECT,
            mapped_at_creation: false,
        });

        let readback = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("terrain-counter-readback"),
            size: std::mem::size_of::<CellCounter>() as u64,
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        Self {
            globals,
            patches,
            levels,
            cells,
            counter,
            draw_args,
            readback,
            patch_count,
            cell_capacity,
        }
    }

    /// Replaces the patch, level and cell buffers for `grid`. The cell
    /// capacity is unchanged; bind groups referencing the old buffers must be
    /// rebuilt.
    pub fn replace_patches(&mut self, device: &wgpu::Device, grid: &PatchGrid) {
        let records = patch_records(grid);
        self.patch_count = records.len() as u32;
        self.patches = patch_buffer(device, &records);
        self.levels = levels_buffer(device, self.patch_count);
        self.cells = cells_buffer(device, self.cell_capacity);
    }
}

fn patch_buffer(device: &wgpu::Device, records: &[PatchRecord]) -> wgpu::Buffer {
    device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("terrain-patches"),
        contents: bytemuck::cast_slice(records),
        usage: wgpu::BufferUsages::STORAGE,
    })
}

// One vec4 of outer factors per patch.
fn levels_buffer(device: &wgpu::Device, patch_count: u32) -> wgpu::Buffer {
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("terrain-levels"),
        size: (patch_count.max(1) as u64) * 16,
        usage: wgpu::BufferUsages::STORAGE,
        mapped_at_creation: false,
    })
}

fn cells_buffer(device: &wgpu::Device, cell_capacity: u32) -> wgpu::Buffer {
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("terrain-cells"),
        size: cell_capacity as u64 * CELL_RECORD_SIZE,
        usage: wgpu::BufferUsages::STORAGE,
        mapped_at_creation: false,
    })
}

#[cfg(test)]
mod tests {
    use super::{CellCounter, Globals, PatchRecord, patch_records};
    use foundation::Viewport;
    use glam::UVec2;
    use pretty_assertions::assert_eq;
    use terrain::{DisplayMode, PatchGrid, SceneSettings, SceneState};

    #[test]
    fn layouts_match_wgsl() {
        assert_eq!(std::mem::size_of::<Globals>(), 336);
        assert_eq!(std::mem::size_of::<Globals>() % 16, 0);
        assert_eq!(std::mem::size_of::<PatchRecord>(), 32);
        assert_eq!(std::mem::size_of::<CellCounter>(), 8);
    }

    #[test]
    fn globals_pack_scene_state() {
        let mut scene = SceneState::new(
            SceneSettings::default(),
            UVec2::new(129, 65),
            Viewport::new(800, 400),
        );
        scene.set_display_mode(DisplayMode::GrassAndRock);
        scene.set_screen_space_error(5.0);
        let g = Globals::from_frame(&scene.frame_uniforms(), scene.map_size(), 42, 1000);

        assert_eq!(g.dims, [129, 65, 42, 4]);
        assert_eq!(g.limits[0], 1000);
        assert_eq!(g.tess[..2], [5.0, 64.0]);
        assert_eq!(g.viewport, [800.0, 400.0, 1.0 / 800.0, 1.0 / 400.0]);
        assert_eq!(g.terrain[..3], [128.0, 64.0, 200.0]);
        assert_eq!(g.sun[3], 0.2);
    }

    #[test]
    fn patch_records_follow_grid_order() {
        let grid = PatchGrid::from_height_map_size(3, 3).expect("grid");
        let records = patch_records(&grid);
        assert_eq!(records.len(), 4);
        assert_eq!(
            records[1].corners,
            [[0.5, 0.0], [1.0, 0.0], [1.0, 0.5], [0.5, 0.5]]
        );
    }
}
