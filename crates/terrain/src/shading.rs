//! Display modes and the per-mode fragment shading table.
//!
//! The GPU fragment stage switches on the mode index stored in the frame
//! uniforms; this module holds the same table for the CPU reference. Modes
//! only change color output, never geometry.

use std::fmt;
use std::str::FromStr;

use glam::{Vec2, Vec3, Vec4};
use serde::{Deserialize, Serialize};

use crate::error::TerrainError;
use crate::lighting::Lighting;
use crate::settings::ShadingSettings;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisplayMode {
    Wireframe,
    Height,
    Normals,
    Grass,
    GrassAndRock,
    GrassRockAndSnow,
    LightingFactors,
    #[default]
    TexturedAndLit,
}

impl DisplayMode {
    pub const COUNT: usize = 8;

    pub const ALL: [DisplayMode; Self::COUNT] = [
        DisplayMode::Wireframe,
        DisplayMode::Height,
        DisplayMode::Normals,
        DisplayMode::Grass,
        DisplayMode::GrassAndRock,
        DisplayMode::GrassRockAndSnow,
        DisplayMode::LightingFactors,
        DisplayMode::TexturedAndLit,
    ];

    /// Index into the fragment stage's shading table.
    pub fn index(self) -> u32 {
        self as u32
    }

    pub fn from_index(index: u32) -> Option<Self> {
        Self::ALL.get(index as usize).copied()
    }

    pub fn name(self) -> &'static str {
        match self {
            DisplayMode::Wireframe => "wireframe",
            DisplayMode::Height => "height",
            DisplayMode::Normals => "normals",
            DisplayMode::Grass => "grass",
            DisplayMode::GrassAndRock => "grass_and_rock",
            DisplayMode::GrassRockAndSnow => "grass_rock_and_snow",
            DisplayMode::LightingFactors => "lighting_factors",
            DisplayMode::TexturedAndLit => "textured_and_lit",
        }
    }
}

impl fmt::Display for DisplayMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DisplayMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|m| m.name() == wanted)
            .ok_or_else(|| {
                let names: Vec<_> = Self::ALL.iter().map(|m| m.name()).collect();
                format!("unknown display mode `{s}` (expected one of {})", names.join(", "))
            })
    }
}

pub fn srgb_to_linear(c: f32) -> f32 {
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

pub fn linear_to_srgb(c: f32) -> f32 {
    let c = c.clamp(0.0, 1.0);
    if c <= 0.003_130_8 {
        c * 12.92
    } else {
        1.055 * c.powf(1.0 / 2.4) - 0.055
    }
}

/// Linear-space RGBA texture sampled with bilinear filtering and repeat
/// addressing, matching the GPU sampler.
#[derive(Debug, Clone, PartialEq)]
pub struct MaterialImage {
    width: u32,
    height: u32,
    texels: Vec<Vec4>,
}

impl MaterialImage {
    /// Decodes 8-bit sRGB RGBA texels into linear space.
    pub fn from_srgba8(
        layer: &'static str,
        width: u32,
        height: u32,
        rgba: &[u8],
    ) -> Result<Self, TerrainError> {
        let expected = width as usize * height as usize;
        if width == 0 || height == 0 || rgba.len() != expected * 4 {
            return Err(TerrainError::LayerSizeMismatch {
                layer,
                width,
                height,
                expected,
                actual: rgba.len() / 4,
            });
        }
        let texels = rgba
            .chunks_exact(4)
            .map(|px| {
                Vec4::new(
                    srgb_to_linear(px[0] as f32 / 255.0),
                    srgb_to_linear(px[1] as f32 / 255.0),
                    srgb_to_linear(px[2] as f32 / 255.0),
                    px[3] as f32 / 255.0,
                )
            })
            .collect();
        Ok(Self {
            width,
            height,
            texels,
        })
    }

    /// Single-texel image of a linear color.
    pub fn solid(color: Vec3) -> Self {
        Self {
            width: 1,
            height: 1,
            texels: vec![color.extend(1.0)],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Re-encodes the texels as 8-bit sRGB RGBA for GPU upload.
    pub fn to_srgba8(&self) -> Vec<u8> {
        let quantize = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        self.texels
            .iter()
            .flat_map(|t| {
                [
                    quantize(linear_to_srgb(t.x)),
                    quantize(linear_to_srgb(t.y)),
                    quantize(linear_to_srgb(t.z)),
                    quantize(t.w),
                ]
            })
            .collect()
    }

    fn texel(&self, x: i64, y: i64) -> Vec4 {
        let x = x.rem_euclid(self.width as i64) as usize;
        let y = y.rem_euclid(self.height as i64) as usize;
        self.texels[y * self.width as usize + x]
    }

    pub fn sample(&self, uv: Vec2) -> Vec4 {
        let p = uv * Vec2::new(self.width as f32, self.height as f32) - 0.5;
        let base = p.floor();
        let f = p - base;
        let (x, y) = (base.x as i64, base.y as i64);
        let bottom = self.texel(x, y).lerp(self.texel(x + 1, y), f.x);
        let top = self.texel(x, y + 1).lerp(self.texel(x + 1, y + 1), f.x);
        bottom.lerp(top, f.y)
    }
}

/// Grass, rock and snow color layers blended by slope and height.
#[derive(Debug, Clone, PartialEq)]
pub struct MaterialLayers {
    pub grass: MaterialImage,
    pub rock: MaterialImage,
    pub snow: MaterialImage,
}

impl MaterialLayers {
    pub fn solid(grass: Vec3, rock: Vec3, snow: Vec3) -> Self {
        Self {
            grass: MaterialImage::solid(grass),
            rock: MaterialImage::solid(rock),
            snow: MaterialImage::solid(snow),
        }
    }
}

pub fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// Blend weights: steep slopes favour rock, high ground favours snow, grass
/// fills the rest.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct LayerWeights {
    pub rock: f32,
    pub snow: f32,
}

pub fn layer_weights(normal: Vec3, height: f32) -> LayerWeights {
    let slope = (1.0 - normal.y).clamp(0.0, 1.0);
    let rock = smoothstep(0.1, 0.25, slope);
    let snow = smoothstep(0.65, 0.8, height) * (1.0 - smoothstep(0.25, 0.45, slope));
    LayerWeights { rock, snow }
}

/// Interpolated fragment attributes produced by tessellation evaluation.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct FragmentInput {
    pub position: Vec3,
    pub normal: Vec3,
    pub uv: Vec2,
    /// Normalized height-map sample in `[0, 1]`.
    pub height: f32,
    /// Barycentric coordinate within the generated triangle.
    pub barycentric: Vec3,
}

/// Per-frame state the shading functions read.
#[derive(Debug, Copy, Clone)]
pub struct ShadingContext<'a> {
    pub lighting: Lighting,
    pub camera_position: Vec3,
    pub settings: &'a ShadingSettings,
    pub layers: &'a MaterialLayers,
}

type ShadeFn = fn(&FragmentInput, &ShadingContext<'_>) -> Vec3;

/// Indexed by `DisplayMode::index()`; the fragment shader's `switch` has the
/// same order.
const SHADE_TABLE: [ShadeFn; DisplayMode::COUNT] = [
    shade_wireframe,
    shade_height,
    shade_normals,
    shade_grass,
    shade_grass_and_rock,
    shade_grass_rock_and_snow,
    shade_lighting_factors,
    shade_textured_and_lit,
];

pub fn shade(mode: DisplayMode, input: &FragmentInput, ctx: &ShadingContext<'_>) -> Vec4 {
    SHADE_TABLE[mode.index() as usize](input, ctx).extend(1.0)
}

fn sample_layers(input: &FragmentInput, ctx: &ShadingContext<'_>) -> [Vec3; 3] {
    let uv = input.uv * ctx.settings.texture_tiling;
    [
        ctx.layers.grass.sample(uv).truncate(),
        ctx.layers.rock.sample(uv).truncate(),
        ctx.layers.snow.sample(uv).truncate(),
    ]
}

fn shade_wireframe(input: &FragmentInput, ctx: &ShadingContext<'_>) -> Vec3 {
    let edge = input.barycentric.min_element();
    let line = 1.0 - smoothstep(0.0, 0.05, edge);
    Vec3::from(ctx.settings.wire_fill_color).lerp(Vec3::from(ctx.settings.wire_color), line)
}

fn shade_height(input: &FragmentInput, _ctx: &ShadingContext<'_>) -> Vec3 {
    Vec3::splat(input.height.clamp(0.0, 1.0))
}

fn shade_normals(input: &FragmentInput, _ctx: &ShadingContext<'_>) -> Vec3 {
    input.normal * 0.5 + 0.5
}

fn shade_grass(input: &FragmentInput, ctx: &ShadingContext<'_>) -> Vec3 {
    let [grass, _, _] = sample_layers(input, ctx);
    grass * ctx.lighting.factor(input.normal)
}

fn shade_grass_and_rock(input: &FragmentInput, ctx: &ShadingContext<'_>) -> Vec3 {
    let [grass, rock, _] = sample_layers(input, ctx);
    let w = layer_weights(input.normal, input.height);
    grass.lerp(rock, w.rock) * ctx.lighting.factor(input.normal)
}

fn blended(input: &FragmentInput, ctx: &ShadingContext<'_>) -> Vec3 {
    let [grass, rock, snow] = sample_layers(input, ctx);
    let w = layer_weights(input.normal, input.height);
    grass.lerp(rock, w.rock).lerp(snow, w.snow)
}

fn shade_grass_rock_and_snow(input: &FragmentInput, ctx: &ShadingContext<'_>) -> Vec3 {
    blended(input, ctx) * ctx.lighting.factor(input.normal)
}

fn shade_lighting_factors(input: &FragmentInput, ctx: &ShadingContext<'_>) -> Vec3 {
    Vec3::splat(ctx.lighting.factor(input.normal))
}

fn shade_textured_and_lit(input: &FragmentInput, ctx: &ShadingContext<'_>) -> Vec3 {
    let lit = blended(input, ctx) * ctx.lighting.factor(input.normal);
    let distance = input.position.distance(ctx.camera_position);
    let fog = 1.0 - (-distance * ctx.settings.fog_density).exp();
    lit.lerp(Vec3::from(ctx.settings.fog_color), fog.clamp(0.0, 1.0))
}

#[cfg(test)]
mod tests {
    use super::{
        DisplayMode, FragmentInput, MaterialImage, MaterialLayers, ShadingContext, layer_weights,
        shade,
    };
    use crate::lighting::Lighting;
    use crate::settings::ShadingSettings;
    use glam::{Vec2, Vec3, Vec4};

    fn layers() -> MaterialLayers {
        MaterialLayers::solid(
            Vec3::new(0.1, 0.6, 0.1),
            Vec3::new(0.4, 0.4, 0.4),
            Vec3::new(1.0, 1.0, 1.0),
        )
    }

    fn input(normal: Vec3, height: f32) -> FragmentInput {
        FragmentInput {
            position: Vec3::new(10.0, height * 100.0, 10.0),
            normal,
            uv: Vec2::new(0.3, 0.7),
            height,
            barycentric: Vec3::new(0.3, 0.3, 0.4),
        }
    }

    #[test]
    fn index_round_trips_through_table_order() {
        for (i, mode) in DisplayMode::ALL.into_iter().enumerate() {
            assert_eq!(mode.index(), i as u32);
            assert_eq!(DisplayMode::from_index(i as u32), Some(mode));
            assert_eq!(mode.name().parse::<DisplayMode>(), Ok(mode));
        }
        assert_eq!(DisplayMode::from_index(8), None);
        assert_eq!("Grass-And-Rock".parse(), Ok(DisplayMode::GrassAndRock));
        assert!("plaid".parse::<DisplayMode>().is_err());
        assert_eq!(DisplayMode::default(), DisplayMode::TexturedAndLit);
    }

    #[test]
    fn slope_and_height_drive_layer_weights() {
        let flat_low = layer_weights(Vec3::Y, 0.1);
        assert_eq!((flat_low.rock, flat_low.snow), (0.0, 0.0));

        let cliff = layer_weights(Vec3::new(1.0, 0.5, 0.0).normalize(), 0.1);
        assert_eq!(cliff.rock, 1.0);

        let peak = layer_weights(Vec3::Y, 0.95);
        assert_eq!(peak.snow, 1.0);

        let steep_peak = layer_weights(Vec3::new(1.0, 0.3, 0.0).normalize(), 0.95);
        assert_eq!(steep_peak.snow, 0.0);
    }

    #[test]
    fn every_mode_produces_a_distinct_color() {
        let settings = ShadingSettings::default();
        let layers = layers();
        let ctx = ShadingContext {
            lighting: Lighting::new(40.0, settings.ambient),
            camera_position: Vec3::new(500.0, 300.0, 500.0),
            settings: &settings,
            layers: &layers,
        };
        let frag = input(Vec3::new(0.5, 0.85, 0.1).normalize(), 0.72);

        let colors: Vec<Vec4> = DisplayMode::ALL
            .into_iter()
            .map(|m| shade(m, &frag, &ctx))
            .collect();
        for i in 0..colors.len() {
            for j in (i + 1)..colors.len() {
                assert!(
                    !colors[i].abs_diff_eq(colors[j], 1e-4),
                    "{} and {} shade identically",
                    DisplayMode::ALL[i],
                    DisplayMode::ALL[j]
                );
            }
        }
    }

    #[test]
    fn wireframe_ignores_lighting() {
        let settings = ShadingSettings::default();
        let layers = layers();
        let frag = input(Vec3::Y, 0.5);
        let lit = |angle| ShadingContext {
            lighting: Lighting::new(angle, settings.ambient),
            camera_position: Vec3::ZERO,
            settings: &settings,
            layers: &layers,
        };
        assert_eq!(
            shade(DisplayMode::Wireframe, &frag, &lit(0.0)),
            shade(DisplayMode::Wireframe, &frag, &lit(80.0))
        );
        assert_ne!(
            shade(DisplayMode::TexturedAndLit, &frag, &lit(0.0)),
            shade(DisplayMode::TexturedAndLit, &frag, &lit(80.0))
        );
    }

    #[test]
    fn material_sampling_repeats() {
        let img = MaterialImage::from_srgba8(
            "grass",
            2,
            1,
            &[255, 255, 255, 255, 0, 0, 0, 255],
        )
        .expect("image");
        let a = img.sample(Vec2::new(0.25, 0.5));
        let b = img.sample(Vec2::new(1.25, 0.5));
        assert!(a.abs_diff_eq(b, 1e-6));
        assert!(a.abs_diff_eq(Vec4::ONE, 1e-6));
        assert!(MaterialImage::from_srgba8("rock", 2, 2, &[0; 12]).is_err());
    }

    #[test]
    fn srgb_bytes_survive_linearization() {
        let bytes: Vec<u8> = (0..=255u8).flat_map(|v| [v, 255 - v, v / 2, 255]).collect();
        let img = MaterialImage::from_srgba8("grass", 16, 16, &bytes).expect("image");
        assert_eq!(img.to_srgba8(), bytes);
    }
}
