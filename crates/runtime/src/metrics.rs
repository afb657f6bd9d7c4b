use crate::frame::Frame;

#[derive(Debug, Copy, Clone, PartialEq, Default)]
pub struct Histogram {
    pub count: u64,
    pub sum: f64,
    pub min: f64,
    pub max: f64,
}

impl Histogram {
    pub fn record(&mut self, value: f64) {
        if self.count == 0 {
            self.min = value;
            self.max = value;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);
        }
        self.count += 1;
        self.sum += value;
    }

    pub fn mean(&self) -> Option<f64> {
        (self.count > 0).then(|| self.sum / self.count as f64)
    }
}

/// Summary of the frames recorded since the last report.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct FrameReport {
    pub frames: u64,
    pub mean_ms: f64,
    pub min_ms: f64,
    pub max_ms: f64,
    pub fps: f64,
}

/// Frame-time aggregation over fixed reporting windows.
///
/// Driven purely by the `Frame` values it is fed, so it behaves the same under
/// a recorded or synthetic clock.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameMetrics {
    window_s: f64,
    elapsed_s: f64,
    frame_ms: Histogram,
}

impl FrameMetrics {
    pub fn new(window_s: f64) -> Self {
        Self {
            window_s: window_s.max(f64::EPSILON),
            elapsed_s: 0.0,
            frame_ms: Histogram::default(),
        }
    }

    pub fn histogram(&self) -> Histogram {
        self.frame_ms
    }

    /// Records `frame`; returns a report once a full window has elapsed.
    pub fn record(&mut self, frame: Frame) -> Option<FrameReport> {
        self.frame_ms.record(frame.dt_s * 1000.0);
        self.elapsed_s += frame.dt_s;
        if self.elapsed_s < self.window_s {
            return None;
        }

        let h = std::mem::take(&mut self.frame_ms);
        let elapsed = std::mem::replace(&mut self.elapsed_s, 0.0);
        Some(FrameReport {
            frames: h.count,
            mean_ms: h.mean().unwrap_or(0.0),
            min_ms: h.min,
            max_ms: h.max,
            fps: h.count as f64 / elapsed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{FrameMetrics, Histogram};
    use crate::frame::FrameClock;
    use foundation::time::Time;

    #[test]
    fn histogram_tracks_min_max_sum_count() {
        let mut h = Histogram::default();
        h.record(5.0);
        h.record(-2.0);
        h.record(7.0);
        assert_eq!(h.count, 3);
        assert_eq!(h.sum, 10.0);
        assert_eq!(h.min, -2.0);
        assert_eq!(h.max, 7.0);
        assert_eq!(Histogram::default().mean(), None);
    }

    #[test]
    fn reports_once_per_window() {
        let mut clock = FrameClock::new();
        let mut metrics = FrameMetrics::new(1.0);

        let mut reports = Vec::new();
        for i in 1..=8 {
            let frame = clock.advance_to(Time(i as f64 * 0.25));
            if let Some(r) = metrics.record(frame) {
                reports.push(r);
            }
        }

        assert_eq!(reports.len(), 2);
        assert_eq!(reports[0].frames, 4);
        assert_eq!(reports[0].mean_ms, 250.0);
        assert_eq!(reports[0].fps, 4.0);
        assert_eq!(metrics.histogram().count, 0);
    }
}
