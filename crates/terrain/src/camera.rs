//! Free-flight camera with level-triggered velocity and per-frame pan/tilt.
//!
//! The camera is stored as eye position, view center and up vector. Velocity
//! is expressed in camera-local axes (side, vertical, forward) and rotated
//! into world space by the basis at the start of each integration step.

use glam::{Mat4, Quat, Vec3};

/// The eye never gets closer than this to a fixed view center.
const MIN_ORBIT_DISTANCE: f32 = 1e-2;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Axis {
    Side,
    Vertical,
    Forward,
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Projection {
    pub fov_y_deg: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl Projection {
    pub fn matrix(&self) -> Mat4 {
        Mat4::perspective_rh(
            self.fov_y_deg.to_radians(),
            self.aspect.max(f32::EPSILON),
            self.near,
            self.far,
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    position: Vec3,
    view_center: Vec3,
    up: Vec3,
    velocity: Vec3,
    pending_pan_deg: f32,
    pending_tilt_deg: f32,
    view_center_fixed: bool,
    projection: Projection,
}

impl Camera {
    pub fn new(position: Vec3, view_center: Vec3, projection: Projection) -> Self {
        let mut camera = Self {
            position,
            view_center,
            up: Vec3::Y,
            velocity: Vec3::ZERO,
            pending_pan_deg: 0.0,
            pending_tilt_deg: 0.0,
            view_center_fixed: false,
            projection,
        };
        camera.orthonormalize();
        camera
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn view_center(&self) -> Vec3 {
        self.view_center
    }

    pub fn up(&self) -> Vec3 {
        self.up
    }

    pub fn forward(&self) -> Vec3 {
        (self.view_center - self.position)
            .try_normalize()
            .unwrap_or(Vec3::NEG_Z)
    }

    pub fn right(&self) -> Vec3 {
        self.forward()
            .cross(self.up)
            .try_normalize()
            .unwrap_or(Vec3::X)
    }

    pub fn velocity(&self) -> Vec3 {
        self.velocity
    }

    pub fn projection(&self) -> Projection {
        self.projection
    }

    pub fn set_aspect(&mut self, aspect: f32) {
        self.projection.aspect = aspect;
    }

    /// Sets one axis of the target velocity; the others are untouched.
    pub fn set_velocity(&mut self, axis: Axis, value: f32) {
        match axis {
            Axis::Side => self.velocity.x = value,
            Axis::Vertical => self.velocity.y = value,
            Axis::Forward => self.velocity.z = value,
        }
    }

    pub fn view_center_fixed(&self) -> bool {
        self.view_center_fixed
    }

    pub fn set_view_center_fixed(&mut self, fixed: bool) {
        self.view_center_fixed = fixed;
    }

    /// Rotation about world up (degrees) applied by the next `integrate`.
    pub fn pan(&mut self, angle_deg: f32) {
        self.pending_pan_deg = angle_deg;
    }

    /// Rotation about the camera's right axis (degrees) applied by the next `integrate`.
    pub fn tilt(&mut self, angle_deg: f32) {
        self.pending_tilt_deg = angle_deg;
    }

    /// Advances the camera by `dt` seconds.
    ///
    /// Translation uses the basis at the start of the step. Pending pan and
    /// tilt are applied afterwards and cleared.
    pub fn integrate(&mut self, dt: f32) {
        let delta = (self.right() * self.velocity.x
            + self.up * self.velocity.y
            + self.forward() * self.velocity.z)
            * dt;

        if self.view_center_fixed {
            let moved = self.position + delta;
            if moved.distance(self.view_center) > MIN_ORBIT_DISTANCE {
                self.position = moved;
            }
        } else {
            self.position += delta;
            self.view_center += delta;
        }
        self.orthonormalize();

        let pan = std::mem::take(&mut self.pending_pan_deg);
        if pan != 0.0 {
            self.rotate(Quat::from_axis_angle(Vec3::Y, pan.to_radians()));
        }

        let tilt = std::mem::take(&mut self.pending_tilt_deg);
        if tilt != 0.0 {
            self.rotate(Quat::from_axis_angle(self.right(), tilt.to_radians()));
        }
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.position + self.forward(), self.up)
    }

    pub fn projection_matrix(&self) -> Mat4 {
        self.projection.matrix()
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    fn rotate(&mut self, q: Quat) {
        let to_center = self.view_center - self.position;
        self.up = q * self.up;
        if self.view_center_fixed {
            self.position = self.view_center - q * to_center;
        } else {
            self.view_center = self.position + q * to_center;
        }
        self.orthonormalize();
    }

    fn orthonormalize(&mut self) {
        let forward = self.forward();
        if let Some(right) = forward.cross(self.up).try_normalize() {
            self.up = right.cross(forward).normalize();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Axis, Camera, Projection};
    use glam::Vec3;

    fn camera() -> Camera {
        Camera::new(
            Vec3::new(10.0, 5.0, 10.0),
            Vec3::new(10.0, 5.0, 9.0),
            Projection {
                fov_y_deg: 45.0,
                aspect: 16.0 / 9.0,
                near: 0.5,
                far: 1000.0,
            },
        )
    }

    fn assert_vec_close(a: Vec3, b: Vec3) {
        assert!(a.abs_diff_eq(b, 1e-4), "expected {b:?}, got {a:?}");
    }

    fn assert_orthonormal(c: &Camera) {
        let (f, r, u) = (c.forward(), c.right(), c.up());
        for v in [f, r, u] {
            assert!((v.length() - 1.0).abs() < 1e-4);
        }
        assert!(f.dot(u).abs() < 1e-4);
        assert!(f.dot(r).abs() < 1e-4);
        assert!(r.dot(u).abs() < 1e-4);
    }

    #[test]
    fn displacement_is_velocity_in_start_basis() {
        let mut c = camera();
        c.pan(30.0);
        c.integrate(0.0);
        c.tilt(-20.0);
        c.integrate(0.0);

        let (r, u, f) = (c.right(), c.up(), c.forward());
        let start = c.position();
        c.set_velocity(Axis::Side, 2.0);
        c.set_velocity(Axis::Vertical, -1.0);
        c.set_velocity(Axis::Forward, 3.0);
        c.pan(45.0);
        c.integrate(0.5);

        let expected = (r * 2.0 - u + f * 3.0) * 0.5;
        assert_vec_close(c.position() - start, expected);
    }

    #[test]
    fn velocity_axes_are_independent() {
        let mut c = camera();
        c.set_velocity(Axis::Forward, 4.0);
        c.set_velocity(Axis::Side, 1.0);
        c.set_velocity(Axis::Forward, 0.0);
        assert_eq!(c.velocity(), Vec3::new(1.0, 0.0, 0.0));
    }

    #[test]
    fn zero_pan_and_tilt_leave_orientation_unchanged() {
        let mut c = camera();
        let before = (c.forward(), c.up());
        c.pan(0.0);
        c.tilt(0.0);
        c.integrate(1.0);
        assert_eq!((c.forward(), c.up()), before);
    }

    #[test]
    fn opposite_pans_restore_orientation() {
        let mut c = camera();
        c.tilt(-15.0);
        c.integrate(0.0);
        let (f0, u0, center0) = (c.forward(), c.up(), c.view_center());

        for _ in 0..5 {
            c.pan(17.0);
            c.integrate(0.0);
            c.pan(-17.0);
            c.integrate(0.0);
        }
        c.tilt(12.0);
        c.integrate(0.0);
        c.tilt(-12.0);
        c.integrate(0.0);

        assert_vec_close(c.forward(), f0);
        assert_vec_close(c.up(), u0);
        assert_vec_close(c.view_center(), center0);
        assert_orthonormal(&c);
    }

    #[test]
    fn pending_rotation_applies_once() {
        let mut c = camera();
        c.pan(90.0);
        c.integrate(0.0);
        let after_first = c.forward();
        c.integrate(0.0);
        assert_eq!(c.forward(), after_first);
        assert_vec_close(after_first, Vec3::new(-1.0, 0.0, 0.0));
    }

    #[test]
    fn fixed_view_center_orbits_instead_of_translating_target() {
        let mut c = camera();
        c.set_view_center_fixed(true);
        let center = c.view_center();

        c.set_velocity(Axis::Side, 1.0);
        c.integrate(1.0);
        assert_eq!(c.view_center(), center);
        assert_vec_close(c.forward(), (center - c.position()).normalize());

        let radius = c.position().distance(center);
        c.pan(40.0);
        c.integrate(0.0);
        assert_eq!(c.view_center(), center);
        assert!((c.position().distance(center) - radius).abs() < 1e-4);
        assert_orthonormal(&c);
    }

    #[test]
    fn fixed_view_center_is_never_reached() {
        let mut c = camera();
        c.set_view_center_fixed(true);
        c.set_velocity(Axis::Forward, 1.0);
        c.integrate(1.0);
        assert!(c.position().distance(c.view_center()) > 0.0);
        assert!(c.view_matrix().is_finite());
    }

    #[test]
    fn basis_stays_orthonormal_under_mixed_motion() {
        let mut c = camera();
        c.set_velocity(Axis::Forward, 3.0);
        c.set_velocity(Axis::Vertical, 1.0);
        for i in 0..50 {
            c.pan(7.0 * (i % 3) as f32);
            c.tilt(-3.0 + (i % 5) as f32);
            c.set_view_center_fixed(i % 7 == 0);
            c.integrate(0.016);
            assert_orthonormal(&c);
        }
    }
}
