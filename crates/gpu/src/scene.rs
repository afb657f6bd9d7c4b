use foundation::Viewport;
use glam::UVec2;
use runtime::Frame;
use terrain::{AssetSource, PatchGrid, SceneSettings, SceneState};
use tracing::info;

use crate::buffers::CellCounter;
use crate::context::GpuContext;
use crate::error::GpuError;
use crate::renderer::{TerrainRenderer, TerrainResources};

#[derive(Debug)]
struct Initialised {
    state: SceneState,
    grid: PatchGrid,
    renderer: TerrainRenderer,
}

/// Terrain scene driven by the host: `initialise` once, then `update` and
/// `render` every frame, `resize` when the window changes.
#[derive(Debug, Default)]
pub struct TerrainScene {
    inner: Option<Initialised>,
}

impl TerrainScene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_initialised(&self) -> bool {
        self.inner.is_some()
    }

    /// Loads the height map and material layers from `assets`, builds the
    /// patch grid and compiles the pipelines. Any previous state is replaced.
    pub fn initialise(
        &mut self,
        ctx: &GpuContext,
        assets: &impl AssetSource,
        settings: SceneSettings,
    ) -> Result<(), GpuError> {
        let height_map = assets.height_map()?;
        let layers = assets.material_layers()?;
        let grid = PatchGrid::with_patch_size(
            height_map.width(),
            height_map.height(),
            settings.terrain.patch_size,
        )?;

        let (width, height) = ctx.size();
        let cell_capacity = settings.terrain.cell_capacity;
        let state = SceneState::new(
            settings,
            UVec2::new(height_map.width(), height_map.height()),
            Viewport::new(width, height),
        );
        let renderer = TerrainRenderer::new(
            &ctx.device,
            &ctx.queue,
            ctx.format(),
            UVec2::new(width, height),
            TerrainResources {
                height_map: &height_map,
                layers: &layers,
                grid: &grid,
            },
            cell_capacity,
        )?;

        info!(
            patches = grid.patch_count(),
            cells_per_patch = grid.cells_per_patch(),
            cell_capacity = renderer.cell_capacity(),
            "terrain scene initialised"
        );
        self.inner = Some(Initialised {
            state,
            grid,
            renderer,
        });
        Ok(())
    }

    pub fn state(&self) -> Option<&SceneState> {
        self.inner.as_ref().map(|i| &i.state)
    }

    pub fn state_mut(&mut self) -> Option<&mut SceneState> {
        self.inner.as_mut().map(|i| &mut i.state)
    }

    pub fn patch_grid(&self) -> Option<&PatchGrid> {
        self.inner.as_ref().map(|i| &i.grid)
    }

    pub fn last_counter(&self) -> Option<CellCounter> {
        self.inner.as_ref().and_then(|i| i.renderer.last_counter())
    }

    /// Rebuilds the patch grid with `cells_per_patch` height-map cells per
    /// patch edge.
    pub fn set_patch_size(
        &mut self,
        ctx: &GpuContext,
        cells_per_patch: u32,
    ) -> Result<(), GpuError> {
        let inner = self.inner.as_mut().ok_or(GpuError::NotInitialised)?;
        let size = inner.state.map_size();
        let grid = PatchGrid::with_patch_size(size.x, size.y, cells_per_patch)?;
        inner.renderer.rebuild_patches(&ctx.device, &grid);
        info!(
            patches = grid.patch_count(),
            cells_per_patch, "patch grid rebuilt"
        );
        inner.grid = grid;
        Ok(())
    }

    /// Advances the camera to absolute time `elapsed_s`.
    pub fn update(&mut self, elapsed_s: f64) -> Result<Frame, GpuError> {
        let inner = self.inner.as_mut().ok_or(GpuError::NotInitialised)?;
        Ok(inner.state.update(elapsed_s))
    }

    /// Renders into an arbitrary colour target of the context's format.
    pub fn render_to(
        &mut self,
        ctx: &GpuContext,
        view: &wgpu::TextureView,
    ) -> Result<(), GpuError> {
        let inner = self.inner.as_mut().ok_or(GpuError::NotInitialised)?;
        let uniforms = inner.state.frame_uniforms();
        inner
            .renderer
            .render(&ctx.device, &ctx.queue, view, &uniforms);
        Ok(())
    }

    /// Renders one frame to the window surface and presents it.
    pub fn render(&mut self, ctx: &GpuContext) -> Result<(), GpuError> {
        if self.inner.is_none() {
            return Err(GpuError::NotInitialised);
        }
        let frame = ctx.acquire()?;
        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        self.render_to(ctx, &view)?;
        frame.present();
        Ok(())
    }

    /// Resizes the surface, depth target and viewport. Zero sizes become 1.
    pub fn resize(&mut self, ctx: &mut GpuContext, width: u32, height: u32) {
        ctx.resize(width, height);
        if let Some(inner) = self.inner.as_mut() {
            inner.state.resize(width, height);
            inner.renderer.resize(&ctx.device, width, height);
        }
    }
}
