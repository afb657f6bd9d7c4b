use foundation::time::Time;

/// Per-frame timing handed to the scene on every update.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Frame {
    /// 0-based frame index.
    pub index: u64,
    /// Seconds since the previous frame (0 for a clock that did not advance).
    pub dt_s: f64,
    /// Absolute time at the start of the frame.
    pub time: Time,
}

/// Turns absolute elapsed time into frame deltas.
///
/// The window shell reports seconds since initialisation rather than deltas,
/// so the clock remembers the previous timestamp. The first `advance_to`
/// measures from `Time::ZERO`.
#[derive(Debug, Copy, Clone, PartialEq, Default)]
pub struct FrameClock {
    last: Time,
    next_index: u64,
}

impl FrameClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_time(&self) -> Time {
        self.last
    }

    pub fn frames(&self) -> u64 {
        self.next_index
    }

    pub fn advance_to(&mut self, now: Time) -> Frame {
        let dt_s = now.since(self.last);
        if now > self.last {
            self.last = now;
        }
        let frame = Frame {
            index: self.next_index,
            dt_s,
            time: self.last,
        };
        self.next_index += 1;
        frame
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
