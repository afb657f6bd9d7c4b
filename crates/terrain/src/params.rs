use tracing::debug;

use crate::settings::ParamSettings;

/// A scalar adjusted either directly or in whole steps.
///
/// The value is `base + steps * step`, so `k` increments followed by `k`
/// decrements land exactly on the starting value.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct SteppedValue {
    base: f32,
    steps: i32,
    step: f32,
}

impl SteppedValue {
    pub fn new(value: f32, step: f32) -> Self {
        Self {
            base: value,
            steps: 0,
            step,
        }
    }

    pub fn value(&self) -> f32 {
        self.base + self.steps as f32 * self.step
    }

    pub fn step(&self) -> f32 {
        self.step
    }

    pub fn set(&mut self, value: f32) {
        self.base = value;
        self.steps = 0;
    }

    pub fn nudge(&mut self, steps: i32) {
        self.steps = self.steps.saturating_add(steps);
    }
}

/// The live-adjustable terrain parameters.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Param {
    HorizontalScale,
    VerticalScale,
    /// Degrees; 0 is overhead, positive towards the east.
    SunAngle,
    /// Pixels of permitted on-screen deviation.
    ScreenSpaceError,
}

/// Values are not clamped: zero or negative settings are
/// reachable and every consumer handles them.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct TerrainParams {
    horizontal_scale: SteppedValue,
    vertical_scale: SteppedValue,
    sun_angle: SteppedValue,
    screen_space_error: SteppedValue,
}

impl Default for TerrainParams {
    fn default() -> Self {
        Self::from_settings(&ParamSettings::default())
    }
}

impl TerrainParams {
    pub fn from_settings(s: &ParamSettings) -> Self {
        Self {
            horizontal_scale: SteppedValue::new(s.horizontal_scale, s.horizontal_scale_step),
            vertical_scale: SteppedValue::new(s.vertical_scale, s.vertical_scale_step),
            sun_angle: SteppedValue::new(s.sun_angle_deg, s.sun_angle_step),
            screen_space_error: SteppedValue::new(
                s.screen_space_error_px,
                s.screen_space_error_step,
            ),
        }
    }

    fn slot(&self, param: Param) -> &SteppedValue {
        match param {
            Param::HorizontalScale => &self.horizontal_scale,
            Param::VerticalScale => &self.vertical_scale,
            Param::SunAngle => &self.sun_angle,
            Param::ScreenSpaceError => &self.screen_space_error,
        }
    }

    fn slot_mut(&mut self, param: Param) -> &mut SteppedValue {
        match param {
            Param::HorizontalScale => &mut self.horizontal_scale,
            Param::VerticalScale => &mut self.vertical_scale,
            Param::SunAngle => &mut self.sun_angle,
            Param::ScreenSpaceError => &mut self.screen_space_error,
        }
    }

    pub fn get(&self, param: Param) -> f32 {
        self.slot(param).value()
    }

    pub fn set(&mut self, param: Param, value: f32) {
        self.slot_mut(param).set(value);
        debug!(?param, value, "terrain parameter set");
    }

    pub fn nudge(&mut self, param: Param, steps: i32) {
        let slot = self.slot_mut(param);
        slot.nudge(steps);
        debug!(?param, value = slot.value(), "terrain parameter adjusted");
    }

    pub fn horizontal_scale(&self) -> f32 {
        self.get(Param::HorizontalScale)
    }

    pub fn vertical_scale(&self) -> f32 {
        self.get(Param::VerticalScale)
    }

    pub fn sun_angle(&self) -> f32 {
        self.get(Param::SunAngle)
    }

    pub fn screen_space_error(&self) -> f32 {
        self.get(Param::ScreenSpaceError)
    }
}
