use glam::Vec3;

/// Axis-aligned bounding box in world space.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Aabb3 {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb3 {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Aabb3 { min, max }
    }

    /// Smallest box containing every point. Returns `None` for an empty set.
    pub fn from_points(points: impl IntoIterator<Item = Vec3>) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let mut b = Aabb3::new(first, first);
        for p in iter {
            b.min = b.min.min(p);
            b.max = b.max.max(p);
        }
        Some(b)
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    /// Corner that lies furthest along `n` (the "p-vertex" of plane tests).
    pub fn positive_vertex(&self, n: Vec3) -> Vec3 {
        Vec3::new(
            if n.x >= 0.0 { self.max.x } else { self.min.x },
            if n.y >= 0.0 { self.max.y } else { self.min.y },
            if n.z >= 0.0 { self.max.z } else { self.min.z },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::Aabb3;
    use glam::Vec3;

    #[test]
    fn from_points_spans_all_points() {
        let b = Aabb3::from_points([
            Vec3::new(1.0, -2.0, 0.0),
            Vec3::new(-1.0, 3.0, 4.0),
            Vec3::new(0.5, 0.0, -4.0),
        ])
        .expect("non-empty");
        assert_eq!(b.min, Vec3::new(-1.0, -2.0, -4.0));
        assert_eq!(b.max, Vec3::new(1.0, 3.0, 4.0));
        assert_eq!(b.center(), Vec3::new(0.0, 0.5, 0.0));
        assert!(Aabb3::from_points(std::iter::empty()).is_none());
    }

    #[test]
    fn positive_vertex_follows_normal_signs() {
        let b = Aabb3::new(Vec3::splat(-1.0), Vec3::splat(2.0));
        assert_eq!(
            b.positive_vertex(Vec3::new(1.0, -1.0, 0.0)),
            Vec3::new(2.0, -1.0, 2.0)
        );
    }
}
