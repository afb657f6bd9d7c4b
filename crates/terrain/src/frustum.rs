use foundation::bounds::Aabb3;
use glam::{Mat4, Vec3, Vec4};

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Plane {
    pub n: Vec3,
    pub d: f32,
}

impl Plane {
    pub fn new(n: Vec3, d: f32) -> Self {
        Self { n, d }
    }

    fn from_row(v: Vec4) -> Self {
        Self::new(v.truncate(), v.w)
    }

    pub fn normalize(self) -> Self {
        let len = self.n.length();
        if len <= 0.0 {
            return self;
        }
        Self::new(self.n / len, self.d / len)
    }

    pub fn distance(&self, p: Vec3) -> f32 {
        self.n.dot(p) + self.d
    }

    /// `(n, d)` packed for shader uniforms.
    pub fn to_vec4(self) -> Vec4 {
        self.n.extend(self.d)
    }
}

/// View frustum as 6 world-space planes.
///
/// A point `p` is inside iff `plane.distance(p) >= 0` for every plane.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Frustum {
    planes: [Plane; 6],
}

impl Frustum {
    pub fn new(planes: [Plane; 6]) -> Self {
        Self { planes }
    }

    /// Extracts the planes of a view-projection matrix using the wgpu clip
    /// convention `-w <= x,y <= w`, `0 <= z <= w`.
    pub fn from_view_proj(m: Mat4) -> Self {
        let (r0, r1, r2, r3) = (m.row(0), m.row(1), m.row(2), m.row(3));
        Self::new(
            [
                r3 + r0, // left
                r3 - r0, // right
                r3 + r1, // bottom
                r3 - r1, // top
                r2,      // near (z0)
                r3 - r2, // far
            ]
            .map(|row| Plane::from_row(row).normalize()),
        )
    }

    pub fn planes(&self) -> &[Plane; 6] {
        &self.planes
    }

    pub fn intersects_aabb(&self, aabb: &Aabb3) -> bool {
        // p-vertex test: a box is outside if its most positive corner is
        // behind any plane.
        self.planes
            .iter()
            .all(|plane| plane.distance(aabb.positive_vertex(plane.n)) >= 0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::{Frustum, Plane};
    use foundation::bounds::Aabb3;
    use glam::{Mat4, Vec3};

    fn unit_cube_frustum() -> Frustum {
        Frustum::new([
            Plane::new(Vec3::X, 1.0),
            Plane::new(Vec3::NEG_X, 1.0),
            Plane::new(Vec3::Y, 1.0),
            Plane::new(Vec3::NEG_Y, 1.0),
            Plane::new(Vec3::Z, 1.0),
            Plane::new(Vec3::NEG_Z, 1.0),
        ])
    }

    #[test]
    fn intersects_aabb_basic() {
        let f = unit_cube_frustum();
        assert!(f.intersects_aabb(&Aabb3::new(Vec3::splat(-0.5), Vec3::splat(0.5))));
        assert!(f.intersects_aabb(&Aabb3::new(Vec3::splat(0.5), Vec3::splat(3.0))));
        assert!(!f.intersects_aabb(&Aabb3::new(Vec3::splat(2.0), Vec3::splat(3.0))));
    }

    #[test]
    fn perspective_frustum_sees_in_front_not_behind() {
        let view = Mat4::look_at_rh(Vec3::ZERO, Vec3::NEG_Z, Vec3::Y);
        let proj = Mat4::perspective_rh(60f32.to_radians(), 1.0, 0.1, 100.0);
        let f = Frustum::from_view_proj(proj * view);

        let ahead = Aabb3::new(Vec3::new(-1.0, -1.0, -11.0), Vec3::new(1.0, 1.0, -9.0));
        let behind = Aabb3::new(Vec3::new(-1.0, -1.0, 9.0), Vec3::new(1.0, 1.0, 11.0));
        let beyond_far = Aabb3::new(Vec3::new(-1.0, -1.0, -300.0), Vec3::new(1.0, 1.0, -200.0));
        let off_side = Aabb3::new(Vec3::new(50.0, -1.0, -11.0), Vec3::new(52.0, 1.0, -9.0));

        assert!(f.intersects_aabb(&ahead));
        assert!(!f.intersects_aabb(&behind));
        assert!(!f.intersects_aabb(&beyond_far));
        assert!(!f.intersects_aabb(&off_side));
    }

    #[test]
    fn planes_are_normalized() {
        let proj = Mat4::perspective_rh(1.0, 1.5, 0.5, 50.0);
        for p in Frustum::from_view_proj(proj).planes() {
            assert!((p.n.length() - 1.0).abs() < 1e-5);
        }
    }
}
