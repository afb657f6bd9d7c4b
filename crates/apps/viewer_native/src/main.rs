mod app;
mod input;

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use formats::TerrainPackage;
use foundation::Viewport;
use gpu::{GpuContext, TerrainScene};
use terrain::glam::UVec2;
use terrain::{ControlMap, DisplayMode, PatchGrid, ReferenceFrame, SceneSettings, SceneState};
use tracing::info;
use tracing_subscriber::EnvFilter;
use winit::dpi::PhysicalSize;
use winit::event_loop::EventLoop;
use winit::window::WindowBuilder;

use crate::app::Viewer;

#[derive(Parser, Debug)]
#[command(author, version, about = "Adaptive tessellation terrain viewer")]
struct Args {
    /// Directory holding terrain.manifest.json
    package_dir: PathBuf,

    #[arg(long, default_value_t = 1280)]
    width: u32,

    #[arg(long, default_value_t = 720)]
    height: u32,

    /// Height-map cells per patch edge
    #[arg(long)]
    patch_size: Option<u32>,

    /// Maximum tessellation factor per edge (1 to 64)
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..=64))]
    max_level: Option<u32>,

    /// Screen-space error threshold in pixels
    #[arg(long)]
    error: Option<f32>,

    /// Initial display mode, e.g. wireframe or grass-and-rock
    #[arg(long)]
    mode: Option<DisplayMode>,

    /// Tessellate one frame on the CPU, print statistics and exit
    #[arg(long)]
    stats: bool,
}

impl Args {
    fn apply(&self, settings: &mut SceneSettings) {
        if let Some(size) = self.patch_size {
            settings.terrain.patch_size = size;
        }
        if let Some(level) = self.max_level {
            settings.terrain.max_tessellation_level = level;
        }
        if let Some(error) = self.error {
            settings.params.screen_space_error_px = error;
        }
        if let Some(mode) = self.mode {
            settings.display_mode = mode;
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let package = TerrainPackage::load(&args.package_dir)?;
    let mut settings = package.manifest().settings.clone();
    args.apply(&mut settings);

    if args.stats {
        return print_stats(&package, settings, Viewport::new(args.width, args.height));
    }

    let event_loop = EventLoop::new()?;
    let window = Arc::new(
        WindowBuilder::new()
            .with_title("Terrain")
            .with_inner_size(PhysicalSize::new(args.width, args.height))
            .build(&event_loop)?,
    );
    let size = window.inner_size();
    let ctx = pollster::block_on(GpuContext::new(window.clone(), size.width, size.height))?;

    let controls = ControlMap::from_settings(&settings.camera);
    let mut scene = TerrainScene::new();
    scene.initialise(&ctx, &package, settings)?;

    Viewer::new(window, ctx, scene, controls).run(event_loop)?;
    Ok(())
}

fn print_stats(
    package: &TerrainPackage,
    settings: SceneSettings,
    viewport: Viewport,
) -> Result<(), Box<dyn std::error::Error>> {
    let height_map = package.load_height_map()?;
    let layers = package.load_layers()?;
    let grid = PatchGrid::with_patch_size(
        height_map.width(),
        height_map.height(),
        settings.terrain.patch_size,
    )?;
    let state = SceneState::new(
        settings,
        UVec2::new(height_map.width(), height_map.height()),
        viewport,
    );
    let frame = ReferenceFrame::render(&state, &height_map, &layers, &grid);
    info!(mode = %state.display_mode(), "reference frame rendered");
    println!("{}", frame.stats);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::Args;
    use clap::Parser;

    #[test]
    fn max_level_outside_the_tessellation_range_is_rejected() {
        assert!(Args::try_parse_from(["viewer_native", "pkg", "--max-level", "70000"]).is_err());
        assert!(Args::try_parse_from(["viewer_native", "pkg", "--max-level", "0"]).is_err());
        let args = Args::try_parse_from(["viewer_native", "pkg", "--max-level", "64"])
            .expect("valid level");
        assert_eq!(args.max_level, Some(64));
    }
}
