use std::time::{Duration, Instant};

/// Receives periodic frame-rate estimates from the engine.
pub trait StatsSink {
    fn report_fps(&mut self, fps: f32);
}

impl<F> StatsSink for F
where
    F: FnMut(f32),
{
    fn report_fps(&mut self, fps: f32) {
        self(fps)
    }
}

/// Discards every report.
#[derive(Debug, Default, Copy, Clone)]
pub struct NoStats;

impl StatsSink for NoStats {
    fn report_fps(&mut self, _fps: f32) {}
}

/// Frames-per-second estimate over windows of at least `window` length.
///
/// Counting over a window instead of inverting each frame delta keeps the
/// reported value stable.
#[derive(Debug, Clone)]
pub struct FpsCounter {
    window: Duration,
    window_start: Option<Instant>,
    frames: u32,
    last: Option<f32>,
}

impl FpsCounter {
    pub fn new(window: Duration) -> Self {
        Self {
            window: window.max(Duration::from_millis(1)),
            window_start: None,
            frames: 0,
            last: None,
        }
    }

    /// Counts one frame at `now`; returns a fresh estimate when a window closes.
    ///
    /// The first call only opens the window.
    pub fn tick(&mut self, now: Instant) -> Option<f32> {
        let Some(start) = self.window_start else {
            self.window_start = Some(now);
            return None;
        };

        self.frames += 1;

        let elapsed = now.saturating_duration_since(start);
        if elapsed < self.window {
            return None;
        }

        let fps = self.frames as f32 / elapsed.as_secs_f32();
        self.window_start = Some(now);
        self.frames = 0;
        self.last = Some(fps);
        Some(fps)
    }

    /// Most recent estimate, if any window has closed yet.
    pub fn last(&self) -> Option<f32> {
        self.last
    }
}

impl Default for FpsCounter {
    fn default() -> Self {
        Self::new(Duration::from_secs(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    // ── windowing ─────────────────────────────────────────────────────────

    #[test]
    fn no_report_before_window_closes() {
        let mut fps = FpsCounter::default();
        let t0 = Instant::now();
        assert_eq!(fps.tick(t0), None);
        for i in 1..30 {
            assert_eq!(fps.tick(t0 + ms(i * 16)), None);
        }
        assert_eq!(fps.last(), None);
    }

    #[test]
    fn reports_frames_over_elapsed() {
        let mut fps = FpsCounter::default();
        let t0 = Instant::now();
        fps.tick(t0);
        let mut report = None;
        for i in 1..=60 {
            if let Some(v) = fps.tick(t0 + ms(i * 1000 / 60 + 1)) {
                report = Some(v);
            }
        }
        let v = report.expect("window should close after one second");
        assert!((v - 60.0).abs() < 1.0, "fps = {v}");
    }

    #[test]
    fn at_most_one_report_per_window() {
        let mut fps = FpsCounter::default();
        let t0 = Instant::now();
        fps.tick(t0);
        let reports = (1..=200)
            .filter_map(|i| fps.tick(t0 + ms(i * 10)))
            .count();
        assert_eq!(reports, 2);
    }

    // ── sinks ─────────────────────────────────────────────────────────────

    #[test]
    fn closure_is_a_sink() {
        let mut seen = Vec::new();
        {
            let mut sink = |v: f32| seen.push(v);
            sink.report_fps(42.0);
        }
        assert_eq!(seen, vec![42.0]);
    }
}
