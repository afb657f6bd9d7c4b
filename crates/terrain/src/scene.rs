//! CPU-side scene controller state: camera, live parameters, display mode,
//! viewport and frame clock.
//!
//! The GPU scene wraps one of these and turns `frame_uniforms()` into its
//! uniform buffer each frame; the CPU reference frame reads the same values.

use foundation::{Time, Viewport};
use glam::{Mat4, UVec2, Vec2, Vec3, Vec4};
use runtime::{Frame, FrameClock};
use tracing::{debug, info, warn};

use crate::camera::{Axis, Camera, Projection};
use crate::frustum::Frustum;
use crate::lighting::Lighting;
use crate::params::{Param, TerrainParams};
use crate::settings::{SceneSettings, ShadingSettings};
use crate::shading::DisplayMode;
use crate::tessellation::{ControlParams, TerrainTransform};

/// Values the GPU stages read once per frame.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameUniforms {
    pub view_proj: Mat4,
    pub camera_position: Vec3,
    pub sun_dir: Vec3,
    pub viewport: Viewport,
    pub transform: TerrainTransform,
    pub screen_space_error: f32,
    pub max_level: f32,
    pub frustum_planes: [Vec4; 6],
    pub display_mode: DisplayMode,
    pub shading: ShadingSettings,
}

#[derive(Debug, Clone)]
pub struct SceneState {
    settings: SceneSettings,
    camera: Camera,
    params: TerrainParams,
    display_mode: DisplayMode,
    viewport: Viewport,
    clock: FrameClock,
    map_size: UVec2,
}

impl SceneState {
    /// Builds the initial state for a height map of `map_size` samples.
    pub fn new(settings: SceneSettings, map_size: UVec2, viewport: Viewport) -> Self {
        let params = TerrainParams::from_settings(&settings.params);
        let transform = TerrainTransform::new(
            map_size,
            settings.terrain.texel_size_m,
            params.horizontal_scale(),
            settings.terrain.height_range_m,
            params.vertical_scale(),
        );

        let cam = &settings.camera;
        let position = cam.position.map(Vec3::from).unwrap_or(Vec3::new(
            0.5 * transform.extent.x,
            0.75 * transform.height_scale,
            0.9 * transform.extent.y,
        ));
        let view_center = cam
            .view_center
            .map(Vec3::from)
            .unwrap_or(position + Vec3::NEG_Z);
        let projection = Projection {
            fov_y_deg: cam.fov_y_deg,
            aspect: viewport.aspect(),
            near: cam.near,
            far: cam.far,
        };

        info!(
            width = map_size.x,
            height = map_size.y,
            extent_x = transform.extent.x,
            extent_z = transform.extent.y,
            "scene state initialised"
        );

        Self {
            camera: Camera::new(position, view_center, projection),
            params,
            display_mode: settings.display_mode,
            viewport,
            clock: FrameClock::new(),
            map_size,
            settings,
        }
    }

    pub fn settings(&self) -> &SceneSettings {
        &self.settings
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut Camera {
        &mut self.camera
    }

    pub fn params(&self) -> &TerrainParams {
        &self.params
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn map_size(&self) -> UVec2 {
        self.map_size
    }

    pub fn set_side_speed(&mut self, v: f32) {
        self.camera.set_velocity(Axis::Side, v);
    }

    pub fn set_vertical_speed(&mut self, v: f32) {
        self.camera.set_velocity(Axis::Vertical, v);
    }

    pub fn set_forward_speed(&mut self, v: f32) {
        self.camera.set_velocity(Axis::Forward, v);
    }

    pub fn set_view_center_fixed(&mut self, fixed: bool) {
        self.camera.set_view_center_fixed(fixed);
    }

    pub fn pan(&mut self, angle_deg: f32) {
        self.camera.pan(angle_deg);
    }

    pub fn tilt(&mut self, angle_deg: f32) {
        self.camera.tilt(angle_deg);
    }

    pub fn set_horizontal_scale(&mut self, v: f32) {
        self.params.set(Param::HorizontalScale, v);
    }

    pub fn horizontal_scale(&self) -> f32 {
        self.params.horizontal_scale()
    }

    pub fn set_vertical_scale(&mut self, v: f32) {
        self.params.set(Param::VerticalScale, v);
    }

    pub fn vertical_scale(&self) -> f32 {
        self.params.vertical_scale()
    }

    pub fn set_sun_angle(&mut self, deg: f32) {
        self.params.set(Param::SunAngle, deg);
    }

    pub fn sun_angle(&self) -> f32 {
        self.params.sun_angle()
    }

    pub fn set_screen_space_error(&mut self, px: f32) {
        self.params.set(Param::ScreenSpaceError, px);
    }

    pub fn screen_space_error(&self) -> f32 {
        self.params.screen_space_error()
    }

    /// Moves a parameter by whole steps of its configured increment.
    pub fn nudge(&mut self, param: Param, steps: i32) {
        self.params.nudge(param, steps);
    }

    pub fn display_mode(&self) -> DisplayMode {
        self.display_mode
    }

    pub fn set_display_mode(&mut self, mode: DisplayMode) {
        if mode != self.display_mode {
            debug!(%mode, "display mode changed");
        }
        self.display_mode = mode;
    }

    /// Advances to absolute time `elapsed_s` (seconds since initialisation).
    pub fn update(&mut self, elapsed_s: f64) -> Frame {
        let frame = self.clock.advance_to(Time(elapsed_s));
        self.camera.integrate(frame.dt_s as f32);
        frame
    }

    /// Restarts elapsed-time tracking, for example after re-initialisation.
    pub fn reset_clock(&mut self) {
        self.clock.reset();
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            warn!(width, height, "degenerate viewport clamped to 1 pixel");
        }
        self.viewport = Viewport::new(width, height);
        self.camera.set_aspect(self.viewport.aspect());
        info!(
            width = self.viewport.width(),
            height = self.viewport.height(),
            "viewport resized"
        );
    }

    pub fn transform(&self) -> TerrainTransform {
        TerrainTransform::new(
            self.map_size,
            self.settings.terrain.texel_size_m,
            self.horizontal_scale(),
            self.settings.terrain.height_range_m,
            self.vertical_scale(),
        )
    }

    pub fn view_projection(&self) -> Mat4 {
        self.camera.view_projection()
    }

    pub fn frustum(&self) -> Frustum {
        Frustum::from_view_proj(self.view_projection())
    }

    pub fn control_params(&self) -> ControlParams {
        ControlParams::new(
            self.view_projection(),
            self.viewport,
            self.screen_space_error(),
            self.settings.terrain.max_tessellation_level,
        )
    }

    pub fn lighting(&self) -> Lighting {
        Lighting::new(self.sun_angle(), self.settings.shading.ambient)
    }

    pub fn frame_uniforms(&self) -> FrameUniforms {
        let control = self.control_params();
        FrameUniforms {
            view_proj: control.view_proj,
            camera_position: self.camera.position(),
            sun_dir: self.lighting().sun_dir,
            viewport: self.viewport,
            transform: self.transform(),
            screen_space_error: control.screen_space_error,
            max_level: control.max_level,
            frustum_planes: control.frustum.planes().map(|p| p.to_vec4()),
            display_mode: self.display_mode,
            shading: self.settings.shading.clone(),
        }
    }
}

/// `(w, h, 1/w, 1/h)` as the shaders expect it.
pub fn viewport_vec4(viewport: Viewport) -> Vec4 {
    let size = viewport.size();
    let inv = Vec2::ONE / size;
    Vec4::new(size.x, size.y, inv.x, inv.y)
}

#[cfg(test)]
mod tests {
    use super::{SceneState, viewport_vec4};
    use crate::params::Param;
    use crate::settings::SceneSettings;
    use crate::shading::DisplayMode;
    use foundation::Viewport;
    use glam::{UVec2, Vec3, Vec4};

    fn state() -> SceneState {
        SceneState::new(SceneSettings::default(), UVec2::new(257, 129), Viewport::new(800, 600))
    }

    #[test]
    fn default_camera_looks_north_over_the_terrain() {
        let s = state();
        let cam = s.camera();
        assert_eq!(cam.position(), Vec3::new(128.0, 150.0, 115.2));
        assert!(cam.forward().abs_diff_eq(Vec3::NEG_Z, 1e-6));
        assert_eq!(s.display_mode(), DisplayMode::TexturedAndLit);
    }

    #[test]
    fn update_uses_absolute_time() {
        let mut s = state();
        s.set_side_speed(2.0);
        let start = s.camera().position();
        assert_eq!(s.update(0.5).dt_s, 0.5);
        assert_eq!(s.update(1.5).dt_s, 1.0);
        // a clock that goes backwards never moves the camera backwards
        assert_eq!(s.update(1.0).dt_s, 0.0);
        assert!((s.camera().position().x - (start.x + 3.0)).abs() < 1e-4);
    }

    #[test]
    fn resize_to_zero_is_clamped() {
        let mut s = state();
        s.resize(0, 0);
        assert_eq!(s.viewport(), Viewport::new(1, 1));
        assert_eq!(s.camera().projection().aspect, 1.0);
        let u = s.frame_uniforms();
        assert!(u.view_proj.is_finite());
        assert_eq!(viewport_vec4(u.viewport), Vec4::new(1.0, 1.0, 1.0, 1.0));
    }

    #[test]
    fn scales_feed_the_transform() {
        let mut s = state();
        s.set_horizontal_scale(2.0);
        s.nudge(Param::VerticalScale, 2);
        let t = s.transform();
        assert_eq!(t.extent.x, 512.0);
        assert!((t.height_scale - 220.0).abs() < 1e-3);
    }

    #[test]
    fn uniforms_carry_mode_and_threshold() {
        let mut s = state();
        s.set_display_mode(DisplayMode::Normals);
        s.set_screen_space_error(3.0);
        let u = s.frame_uniforms();
        assert_eq!(u.display_mode, DisplayMode::Normals);
        assert_eq!(u.screen_space_error, 3.0);
        assert_eq!(u.max_level, 64.0);
        assert_eq!(u.camera_position, s.camera().position());
    }
}
