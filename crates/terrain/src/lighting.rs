use glam::Vec3;

/// Unit vector pointing towards the sun.
///
/// The sun moves in the vertical east-west plane: 0° is straight overhead,
/// +90° on the eastern horizon (+X), -90° on the western horizon.
pub fn sun_direction(angle_deg: f32) -> Vec3 {
    let (sin, cos) = angle_deg.to_radians().sin_cos();
    Vec3::new(sin, cos, 0.0)
}

/// Directional light derived once per frame from the sun angle.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Lighting {
    pub sun_dir: Vec3,
    pub ambient: f32,
}

impl Lighting {
    pub fn new(sun_angle_deg: f32, ambient: f32) -> Self {
        Self {
            sun_dir: sun_direction(sun_angle_deg),
            ambient,
        }
    }

    /// Lambertian diffuse term.
    pub fn diffuse(&self, normal: Vec3) -> f32 {
        normal.dot(self.sun_dir).max(0.0)
    }

    /// Total light reaching a surface: ambient plus the remaining diffuse share.
    pub fn factor(&self, normal: Vec3) -> f32 {
        self.ambient + (1.0 - self.ambient) * self.diffuse(normal)
    }
}

#[cfg(test)]
mod tests {
    use super::{Lighting, sun_direction};
    use glam::Vec3;

    #[test]
    fn sun_angles_map_to_sky_positions() {
        assert!(sun_direction(0.0).abs_diff_eq(Vec3::Y, 1e-6));
        assert!(sun_direction(90.0).abs_diff_eq(Vec3::X, 1e-6));
        assert!(sun_direction(-90.0).abs_diff_eq(Vec3::NEG_X, 1e-6));
    }

    #[test]
    fn overhead_sun_fully_lights_flat_ground() {
        let l = Lighting::new(0.0, 0.2);
        assert!((l.factor(Vec3::Y) - 1.0).abs() < 1e-6);
        assert_eq!(l.factor(Vec3::NEG_Y), 0.2);
    }

    #[test]
    fn low_sun_lights_facing_slopes() {
        let l = Lighting::new(60.0, 0.0);
        let east_slope = Vec3::new(1.0, 1.0, 0.0).normalize();
        let west_slope = Vec3::new(-1.0, 1.0, 0.0).normalize();
        assert!(l.diffuse(east_slope) > l.diffuse(Vec3::Y));
        assert!(l.diffuse(west_slope) < l.diffuse(Vec3::Y));
    }
}
