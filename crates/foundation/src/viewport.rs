use glam::Vec2;

/// Render target size in pixels plus the NDC → pixel transform.
///
/// Dimensions are clamped to at least one pixel so a minimised window (0×0)
/// still yields a finite aspect ratio and transform.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Viewport {
    width: u32,
    height: u32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(1366, 768)
    }
}

impl Viewport {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width: width.max(1),
            height: height.max(1),
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn size(&self) -> Vec2 {
        Vec2::new(self.width as f32, self.height as f32)
    }

    pub fn aspect(&self) -> f32 {
        self.width as f32 / self.height as f32
    }

    /// Maps normalized device coordinates (`[-1, 1]²`, y up) to pixels (y down).
    pub fn ndc_to_pixels(&self, ndc: Vec2) -> Vec2 {
        let half = self.size() * 0.5;
        Vec2::new((ndc.x + 1.0) * half.x, (1.0 - ndc.y) * half.y)
    }
}

#[cfg(test)]
mod tests {
    use super::Viewport;
    use glam::Vec2;

    #[test]
    fn zero_size_is_clamped() {
        let vp = Viewport::new(0, 0);
        assert_eq!((vp.width(), vp.height()), (1, 1));
        assert_eq!(vp.aspect(), 1.0);
    }

    #[test]
    fn ndc_corners_map_to_pixel_corners() {
        let vp = Viewport::new(800, 600);
        assert_eq!(vp.ndc_to_pixels(Vec2::new(-1.0, 1.0)), Vec2::new(0.0, 0.0));
        assert_eq!(vp.ndc_to_pixels(Vec2::new(1.0, -1.0)), Vec2::new(800.0, 600.0));
    }
}
