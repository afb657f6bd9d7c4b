use glam::{UVec2, Vec2};

use crate::error::TerrainError;

/// Normalized height samples in `[0, 1]`, row-major with `y` along the map's `v` axis.
///
/// Sampling mirrors the GPU path exactly: integer texel fetches clamped to the
/// edge and combined bilinearly, so CPU and GPU tessellation agree.
#[derive(Debug, Clone, PartialEq)]
pub struct HeightMap {
    width: u32,
    height: u32,
    samples: Vec<f32>,
}

impl HeightMap {
    pub fn new(width: u32, height: u32, samples: Vec<f32>) -> Result<Self, TerrainError> {
        if width < 2 || height < 2 {
            return Err(TerrainError::HeightMapTooSmall { width, height });
        }
        let expected = width as usize * height as usize;
        if samples.len() != expected {
            return Err(TerrainError::SampleCountMismatch {
                width,
                height,
                expected,
                actual: samples.len(),
            });
        }
        Ok(Self {
            width,
            height,
            samples,
        })
    }

    pub fn from_fn(
        width: u32,
        height: u32,
        mut f: impl FnMut(u32, u32) -> f32,
    ) -> Result<Self, TerrainError> {
        let mut samples = Vec::with_capacity(width as usize * height as usize);
        for y in 0..height {
            for x in 0..width {
                samples.push(f(x, y));
            }
        }
        Self::new(width, height, samples)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn size(&self) -> UVec2 {
        UVec2::new(self.width, self.height)
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    /// UV distance between neighbouring texels.
    pub fn texel_step(&self) -> Vec2 {
        texel_step(self.size())
    }

    pub fn texel(&self, x: i32, y: i32) -> f32 {
        let x = x.clamp(0, self.width as i32 - 1) as usize;
        let y = y.clamp(0, self.height as i32 - 1) as usize;
        self.samples[y * self.width as usize + x]
    }

    pub fn sample(&self, uv: Vec2) -> f32 {
        let p = uv * Vec2::new((self.width - 1) as f32, (self.height - 1) as f32);
        let base = p.floor();
        let f = p - base;
        let (x0, y0) = (base.x as i32, base.y as i32);

        let h00 = self.texel(x0, y0);
        let h10 = self.texel(x0 + 1, y0);
        let h01 = self.texel(x0, y0 + 1);
        let h11 = self.texel(x0 + 1, y0 + 1);

        let bottom = h00 + (h10 - h00) * f.x;
        let top = h01 + (h11 - h01) * f.x;
        bottom + (top - bottom) * f.y
    }
}

pub fn texel_step(size: UVec2) -> Vec2 {
    Vec2::new(
        1.0 / (size.x.max(2) - 1) as f32,
        1.0 / (size.y.max(2) - 1) as f32,
    )
}

#[cfg(test)]
mod tests {
    use super::HeightMap;
    use crate::error::TerrainError;
    use glam::Vec2;

    fn ramp() -> HeightMap {
        HeightMap::from_fn(3, 3, |x, y| (x + 3 * y) as f32 / 8.0).expect("ramp")
    }

    #[test]
    fn rejects_degenerate_sizes() {
        assert_eq!(
            HeightMap::new(1, 4, vec![0.0; 4]),
            Err(TerrainError::HeightMapTooSmall {
                width: 1,
                height: 4
            })
        );
        assert!(matches!(
            HeightMap::new(2, 2, vec![0.0; 3]),
            Err(TerrainError::SampleCountMismatch { expected: 4, .. })
        ));
    }

    #[test]
    fn sample_hits_texels_at_texel_centres() {
        let hm = ramp();
        assert_eq!(hm.sample(Vec2::new(0.0, 0.0)), 0.0);
        assert_eq!(hm.sample(Vec2::new(1.0, 1.0)), 1.0);
        assert_eq!(hm.sample(Vec2::new(0.5, 0.0)), hm.texel(1, 0));
    }

    #[test]
    fn sample_interpolates_and_clamps() {
        let hm = ramp();
        let mid = hm.sample(Vec2::new(0.25, 0.0));
        assert!((mid - 0.0625).abs() < 1e-6);
        assert_eq!(hm.sample(Vec2::new(-1.0, -1.0)), hm.texel(0, 0));
        assert_eq!(hm.sample(Vec2::new(2.0, 2.0)), hm.texel(2, 2));
    }
}
