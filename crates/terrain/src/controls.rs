//! Platform-neutral input mapping. The window shell translates its key and
//! pointer events into these types; `ControlMap` turns them into scene calls.

use glam::Vec2;

use crate::params::Param;
use crate::scene::SceneState;
use crate::settings::CameraSettings;
use crate::shading::DisplayMode;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Key {
    W,
    A,
    S,
    D,
    PageUp,
    PageDown,
    Shift,
    Plus,
    Minus,
    Home,
    End,
    BracketLeft,
    BracketRight,
    Comma,
    Period,
    F1,
    F2,
    F3,
    F4,
    F5,
    F6,
    F7,
    F8,
    Escape,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PointerButton {
    Left,
    Right,
    Middle,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ControlOutcome {
    Handled,
    Ignored,
    Quit,
}

/// Per-press parameter adjustments.
fn param_step(key: Key) -> Option<(Param, i32)> {
    Some(match key {
        Key::Plus => (Param::HorizontalScale, 1),
        Key::Minus => (Param::HorizontalScale, -1),
        Key::Home => (Param::VerticalScale, 1),
        Key::End => (Param::VerticalScale, -1),
        Key::BracketLeft => (Param::SunAngle, -1),
        Key::BracketRight => (Param::SunAngle, 1),
        Key::Comma => (Param::ScreenSpaceError, 1),
        Key::Period => (Param::ScreenSpaceError, -1),
        _ => return None,
    })
}

fn display_mode(key: Key) -> Option<DisplayMode> {
    Some(match key {
        Key::F1 => DisplayMode::TexturedAndLit,
        Key::F2 => DisplayMode::Wireframe,
        Key::F3 => DisplayMode::Height,
        Key::F4 => DisplayMode::Normals,
        Key::F5 => DisplayMode::Grass,
        Key::F6 => DisplayMode::GrassAndRock,
        Key::F7 => DisplayMode::GrassRockAndSnow,
        Key::F8 => DisplayMode::LightingFactors,
        _ => return None,
    })
}

/// Tracks drag state between pointer events.
///
/// Pan and tilt requests replace each other until the camera consumes them,
/// so drag deltas are summed over the frame and re-issued on every move;
/// `end_frame` starts a new sum.
#[derive(Debug, Clone, PartialEq)]
pub struct ControlMap {
    speed: f32,
    sensitivity: f32,
    dragging: bool,
    last_pointer: Option<Vec2>,
    frame_drag: Vec2,
}

impl ControlMap {
    pub fn new(speed_m_s: f32, drag_sensitivity: f32) -> Self {
        Self {
            speed: speed_m_s,
            sensitivity: drag_sensitivity,
            dragging: false,
            last_pointer: None,
            frame_drag: Vec2::ZERO,
        }
    }

    pub fn from_settings(camera: &CameraSettings) -> Self {
        Self::new(camera.speed_m_s, camera.drag_sensitivity)
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    pub fn key_pressed(&mut self, key: Key, scene: &mut SceneState) -> ControlOutcome {
        let speed = self.speed;
        match key {
            Key::W => scene.set_forward_speed(speed),
            Key::S => scene.set_forward_speed(-speed),
            Key::D => scene.set_side_speed(speed),
            Key::A => scene.set_side_speed(-speed),
            Key::PageUp => scene.set_vertical_speed(speed),
            Key::PageDown => scene.set_vertical_speed(-speed),
            Key::Shift => scene.set_view_center_fixed(true),
            Key::Escape => return ControlOutcome::Quit,
            other => {
                if let Some((param, steps)) = param_step(other) {
                    scene.nudge(param, steps);
                } else if let Some(mode) = display_mode(other) {
                    scene.set_display_mode(mode);
                } else {
                    return ControlOutcome::Ignored;
                }
            }
        }
        ControlOutcome::Handled
    }

    pub fn key_released(&mut self, key: Key, scene: &mut SceneState) -> ControlOutcome {
        match key {
            Key::W | Key::S => scene.set_forward_speed(0.0),
            Key::A | Key::D => scene.set_side_speed(0.0),
            Key::PageUp | Key::PageDown => scene.set_vertical_speed(0.0),
            Key::Shift => scene.set_view_center_fixed(false),
            _ => return ControlOutcome::Ignored,
        }
        ControlOutcome::Handled
    }

    /// `position` is where the button went down; it becomes the drag origin.
    pub fn button_pressed(&mut self, button: PointerButton, position: Vec2) -> ControlOutcome {
        if button != PointerButton::Left {
            return ControlOutcome::Ignored;
        }
        self.dragging = true;
        self.last_pointer = Some(position);
        ControlOutcome::Handled
    }

    pub fn button_released(&mut self, button: PointerButton) -> ControlOutcome {
        if button != PointerButton::Left {
            return ControlOutcome::Ignored;
        }
        self.dragging = false;
        ControlOutcome::Handled
    }

    pub fn pointer_moved(&mut self, position: Vec2, scene: &mut SceneState) -> ControlOutcome {
        let last = self.last_pointer.replace(position);
        let Some(last) = last.filter(|_| self.dragging) else {
            return ControlOutcome::Ignored;
        };
        self.frame_drag += position - last;
        scene.pan(self.sensitivity * self.frame_drag.x);
        scene.tilt(-self.sensitivity * self.frame_drag.y);
        ControlOutcome::Handled
    }

    /// Call after the scene update that consumed this frame's pan and tilt.
    pub fn end_frame(&mut self) {
        self.frame_drag = Vec2::ZERO;
    }
}

#[cfg(test)]
mod tests {
    use super::{ControlMap, ControlOutcome, Key, PointerButton};
    use crate::scene::SceneState;
    use crate::settings::SceneSettings;
    use crate::shading::DisplayMode;
    use foundation::Viewport;
    use glam::{UVec2, Vec2, Vec3};

    fn setup() -> (ControlMap, SceneState) {
        let settings = SceneSettings::default();
        (
            ControlMap::from_settings(&settings.camera),
            SceneState::new(settings, UVec2::new(65, 65), Viewport::new(640, 480)),
        )
    }

    #[test]
    fn movement_keys_are_level_triggered() {
        let (mut map, mut scene) = setup();
        map.key_pressed(Key::W, &mut scene);
        map.key_pressed(Key::A, &mut scene);
        map.key_pressed(Key::PageUp, &mut scene);
        assert_eq!(scene.camera().velocity(), Vec3::new(-44.7, 44.7, 44.7));

        map.key_released(Key::A, &mut scene);
        assert_eq!(scene.camera().velocity(), Vec3::new(0.0, 44.7, 44.7));
        map.key_released(Key::W, &mut scene);
        map.key_released(Key::PageUp, &mut scene);
        assert_eq!(scene.camera().velocity(), Vec3::ZERO);
    }

    #[test]
    fn each_press_is_one_step() {
        let (mut map, mut scene) = setup();
        let sun = scene.sun_angle();
        map.key_pressed(Key::BracketRight, &mut scene);
        map.key_pressed(Key::BracketRight, &mut scene);
        map.key_released(Key::BracketRight, &mut scene);
        assert!((scene.sun_angle() - (sun + 0.4)).abs() < 1e-5);

        let error = scene.screen_space_error();
        map.key_pressed(Key::Period, &mut scene);
        assert!((scene.screen_space_error() - (error - 0.1)).abs() < 1e-5);
    }

    #[test]
    fn function_keys_select_modes() {
        let (mut map, mut scene) = setup();
        map.key_pressed(Key::F2, &mut scene);
        assert_eq!(scene.display_mode(), DisplayMode::Wireframe);
        map.key_pressed(Key::F8, &mut scene);
        assert_eq!(scene.display_mode(), DisplayMode::LightingFactors);
        map.key_pressed(Key::F1, &mut scene);
        assert_eq!(scene.display_mode(), DisplayMode::TexturedAndLit);
    }

    #[test]
    fn shift_holds_the_view_center() {
        let (mut map, mut scene) = setup();
        map.key_pressed(Key::Shift, &mut scene);
        assert!(scene.camera().view_center_fixed());
        map.key_released(Key::Shift, &mut scene);
        assert!(!scene.camera().view_center_fixed());
    }

    #[test]
    fn escape_quits() {
        let (mut map, mut scene) = setup();
        assert_eq!(map.key_pressed(Key::Escape, &mut scene), ControlOutcome::Quit);
        assert_eq!(map.key_released(Key::Escape, &mut scene), ControlOutcome::Ignored);
    }

    #[test]
    fn drag_pans_and_tilts_by_summed_delta() {
        let (mut map, mut scene) = setup();
        let before = scene.camera().forward();

        // moves without a held button only record the pointer
        assert_eq!(
            map.pointer_moved(Vec2::new(100.0, 100.0), &mut scene),
            ControlOutcome::Ignored
        );
        map.button_pressed(PointerButton::Left, Vec2::new(100.0, 100.0));
        map.pointer_moved(Vec2::new(110.0, 100.0), &mut scene);
        map.pointer_moved(Vec2::new(125.0, 100.0), &mut scene);
        scene.update(0.016);
        map.end_frame();

        // 25 px at 0.2 deg/px: a 5 degree pan about +y
        let after = scene.camera().forward();
        let angle = before.angle_between(after).to_degrees();
        assert!((angle - 5.0).abs() < 1e-3, "panned {angle} degrees");

        map.button_released(PointerButton::Left);
        map.pointer_moved(Vec2::new(200.0, 300.0), &mut scene);
        scene.update(0.032);
        assert!(scene.camera().forward().abs_diff_eq(after, 1e-6));
    }

    #[test]
    fn drag_starts_from_the_press_position() {
        let (mut map, mut scene) = setup();
        let before = scene.camera().forward();

        // Last recorded pointer is far away, e.g. before leaving the window.
        map.pointer_moved(Vec2::new(0.0, 0.0), &mut scene);
        map.button_pressed(PointerButton::Left, Vec2::new(500.0, 0.0));
        map.pointer_moved(Vec2::new(510.0, 0.0), &mut scene);
        scene.update(0.016);
        map.end_frame();

        let angle = before.angle_between(scene.camera().forward()).to_degrees();
        assert!((angle - 2.0).abs() < 1e-3, "panned {angle} degrees");
    }
}
