//! Scene configuration. Every field has a default so partial JSON objects
//! (for example the `settings` block of a terrain manifest) deserialize.

use serde::{Deserialize, Serialize};

use crate::shading::DisplayMode;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneSettings {
    pub camera: CameraSettings,
    pub terrain: TerrainSettings,
    pub params: ParamSettings,
    pub shading: ShadingSettings,
    pub display_mode: DisplayMode,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraSettings {
    /// World-space eye position. Defaults to above the southern part of the terrain.
    pub position: Option<[f32; 3]>,
    /// World-space look-at point. Defaults to one unit north of the eye.
    pub view_center: Option<[f32; 3]>,
    pub fov_y_deg: f32,
    pub near: f32,
    pub far: f32,
    /// Magnitude set on a movement key press, in m/s (44.7 m/s is 100 mph).
    pub speed_m_s: f32,
    /// Degrees of pan/tilt per pixel of pointer drag.
    pub drag_sensitivity: f32,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            position: None,
            view_center: None,
            fov_y_deg: 45.0,
            near: 0.5,
            far: 20_000.0,
            speed_m_s: 44.7,
            drag_sensitivity: 0.2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerrainSettings {
    /// World meters between neighbouring height-map samples at horizontal scale 1.
    pub texel_size_m: f32,
    /// World meters spanned by normalized heights `[0, 1]` at vertical scale 1.
    pub height_range_m: f32,
    /// Height-map cells per patch edge.
    pub patch_size: u32,
    /// Upper bound on per-edge subdivision, as on tessellation hardware.
    pub max_tessellation_level: u32,
    /// Maximum tessellated cells drawn per frame.
    pub cell_capacity: u32,
}

impl Default for TerrainSettings {
    fn default() -> Self {
        Self {
            texel_size_m: 1.0,
            height_range_m: 200.0,
            patch_size: 8,
            max_tessellation_level: 64,
            cell_capacity: 2_000_000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParamSettings {
    pub horizontal_scale: f32,
    pub horizontal_scale_step: f32,
    pub vertical_scale: f32,
    pub vertical_scale_step: f32,
    pub sun_angle_deg: f32,
    pub sun_angle_step: f32,
    pub screen_space_error_px: f32,
    pub screen_space_error_step: f32,
}

impl Default for ParamSettings {
    fn default() -> Self {
        Self {
            horizontal_scale: 1.0,
            horizontal_scale_step: 0.1,
            vertical_scale: 1.0,
            vertical_scale_step: 0.05,
            sun_angle_deg: 30.0,
            sun_angle_step: 0.2,
            screen_space_error_px: 12.0,
            screen_space_error_step: 0.1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShadingSettings {
    pub ambient: f32,
    pub fog_density: f32,
    pub fog_color: [f32; 3],
    /// Material texture repeats across the whole terrain.
    pub texture_tiling: f32,
    pub wire_color: [f32; 3],
    pub wire_fill_color: [f32; 3],
}

impl Default for ShadingSettings {
    fn default() -> Self {
        Self {
            ambient: 0.2,
            fog_density: 0.000_35,
            fog_color: [0.62, 0.72, 0.84],
            texture_tiling: 64.0,
            wire_color: [0.95, 0.95, 0.35],
            wire_fill_color: [0.08, 0.1, 0.12],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::SceneSettings;
    use crate::shading::DisplayMode;
    use pretty_assertions::assert_eq;

    #[test]
    fn partial_json_fills_defaults() {
        let s: SceneSettings = serde_json::from_str(
            r#"{ "params": { "screen_space_error_px": 4.0 }, "display_mode": "wireframe" }"#,
        )
        .expect("parse");
        assert_eq!(s.params.screen_space_error_px, 4.0);
        assert_eq!(s.params.sun_angle_deg, 30.0);
        assert_eq!(s.display_mode, DisplayMode::Wireframe);
        assert_eq!(s.terrain, SceneSettings::default().terrain);
    }

    #[test]
    fn round_trips_through_json() {
        let s = SceneSettings::default();
        let json = serde_json::to_string(&s).expect("serialize");
        let back: SceneSettings = serde_json::from_str(&json).expect("parse");
        assert_eq!(back, s);
    }
}
