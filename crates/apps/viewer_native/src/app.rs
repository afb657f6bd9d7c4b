use std::sync::Arc;
use std::time::Instant;

use gpu::{GpuContext, GpuError, TerrainScene};
use runtime::FrameMetrics;
use terrain::glam::Vec2;
use terrain::{ControlMap, ControlOutcome};
use tracing::{error, info};
use winit::event::{ElementState, Event, KeyEvent, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop, EventLoopWindowTarget};
use winit::keyboard::PhysicalKey;
use winit::window::Window;

use crate::input::{map_button, map_key};

/// Frame timing is summarised over windows of this many seconds.
const METRICS_WINDOW_S: f64 = 5.0;

pub struct Viewer {
    window: Arc<Window>,
    ctx: GpuContext,
    scene: TerrainScene,
    controls: ControlMap,
    metrics: FrameMetrics,
    started: Instant,
    cursor: Vec2,
}

impl Viewer {
    pub fn new(
        window: Arc<Window>,
        ctx: GpuContext,
        scene: TerrainScene,
        controls: ControlMap,
    ) -> Self {
        Self {
            window,
            ctx,
            scene,
            controls,
            metrics: FrameMetrics::new(METRICS_WINDOW_S),
            started: Instant::now(),
            cursor: Vec2::ZERO,
        }
    }

    pub fn run(mut self, event_loop: EventLoop<()>) -> Result<(), winit::error::EventLoopError> {
        event_loop.run(move |event, elwt| {
            elwt.set_control_flow(ControlFlow::Poll);
            match event {
                Event::AboutToWait => self.window.request_redraw(),
                Event::WindowEvent { event, .. } => self.handle_window_event(event, elwt),
                _ => {}
            }
        })
    }

    fn handle_window_event(&mut self, event: WindowEvent, elwt: &EventLoopWindowTarget<()>) {
        match event {
            WindowEvent::CloseRequested => elwt.exit(),
            WindowEvent::Resized(size) => {
                self.scene.resize(&mut self.ctx, size.width, size.height);
            }
            WindowEvent::RedrawRequested => {
                if let Err(err) = self.frame() {
                    error!(error = %err, "frame failed");
                    elwt.exit();
                }
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(code),
                        state,
                        ..
                    },
                ..
            } => {
                let (Some(key), Some(scene)) = (map_key(code), self.scene.state_mut()) else {
                    return;
                };
                let outcome = match state {
                    ElementState::Pressed => self.controls.key_pressed(key, scene),
                    ElementState::Released => self.controls.key_released(key, scene),
                };
                if outcome == ControlOutcome::Quit {
                    info!("quit requested");
                    elwt.exit();
                }
            }
            WindowEvent::MouseInput { button, state, .. } => {
                let Some(button) = map_button(button) else {
                    return;
                };
                match state {
                    ElementState::Pressed => self.controls.button_pressed(button, self.cursor),
                    ElementState::Released => self.controls.button_released(button),
                };
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.cursor = Vec2::new(position.x as f32, position.y as f32);
                if let Some(scene) = self.scene.state_mut() {
                    self.controls.pointer_moved(self.cursor, scene);
                }
            }
            _ => {}
        }
    }

    fn frame(&mut self) -> Result<(), GpuError> {
        let frame = self.scene.update(self.started.elapsed().as_secs_f64())?;
        self.controls.end_frame();
        self.scene.render(&self.ctx)?;

        if let Some(report) = self.metrics.record(frame) {
            let counter = self.scene.last_counter().unwrap_or_default();
            info!(
                fps = report.fps,
                mean_ms = report.mean_ms,
                max_ms = report.max_ms,
                cells = counter.cells,
                "frame timing"
            );
        }
        Ok(())
    }
}
