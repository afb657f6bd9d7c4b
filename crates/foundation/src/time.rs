/// Absolute engine time in seconds since the scene was initialised.
#[derive(Copy, Clone, Debug, Default, PartialEq, PartialOrd)]
pub struct Time(pub f64);

impl Time {
    pub const ZERO: Time = Time(0.0);

    pub fn seconds(self) -> f64 {
        self.0
    }

    /// Seconds elapsed since `earlier`, never negative.
    ///
    /// A clock that jumps backwards (timer restart) yields a zero step instead of
    /// rewinding simulation state.
    pub fn since(self, earlier: Time) -> f64 {
        (self.0 - earlier.0).max(0.0)
    }
}

impl From<f32> for Time {
    fn from(seconds: f32) -> Self {
        Time(seconds as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::Time;

    #[test]
    fn since_is_non_negative() {
        assert_eq!(Time(2.5).since(Time(1.0)), 1.5);
        assert_eq!(Time(1.0).since(Time(2.5)), 0.0);
    }

    #[test]
    fn converts_from_f32_seconds() {
        assert_eq!(Time::from(0.5_f32), Time(0.5));
    }
}
