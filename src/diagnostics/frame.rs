use super::timing::TimingBreakdown;
use crate::edges::TraceStats;
use serde::Serialize;
use std::time::{Duration, Instant};

/// What one camera produced in one frame.
#[derive(Clone, Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CameraFrameReport {
    pub camera: usize,
    pub frame_index: u64,
    pub foreground_pixels: usize,
    pub keypoints: usize,
    pub segments: usize,
    pub rays: usize,
    pub intersections: usize,
    pub quads: usize,
    pub trace: TraceStats,
    pub timing: TimingBreakdown,
    /// Set when the 2D stages did not run (background sampling, source
    /// failure).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skipped: Option<String>,
}

/// Frames per second over consecutive one-second windows.
#[derive(Clone, Debug)]
pub struct FpsCounter {
    window_start: Option<Instant>,
    frames: u32,
    last: u32,
}

impl Default for FpsCounter {
    fn default() -> Self {
        Self::new()
    }
}

impl FpsCounter {
    pub fn new() -> Self {
        Self {
            window_start: None,
            frames: 0,
            last: 0,
        }
    }

    /// Counts a frame; returns the rate once per completed window.
    pub fn tick(&mut self) -> Option<u32> {
        self.tick_at(Instant::now())
    }

    pub fn tick_at(&mut self, now: Instant) -> Option<u32> {
        let start = *self.window_start.get_or_insert(now);
        self.frames += 1;
        if now.duration_since(start) >= Duration::from_secs(1) {
            self.last = self.frames;
            self.frames = 0;
            self.window_start = Some(now);
            return Some(self.last);
        }
        None
    }

    /// Rate of the last completed window.
    pub fn fps(&self) -> u32 {
        self.last
    }
}

/// Mean, minimum and maximum of a stream of values, with a helper for
/// periodic reporting.
#[derive(Clone, Debug)]
pub struct RunningAverage {
    sum: f64,
    count: u64,
    min: f64,
    max: f64,
    last_report: Option<Instant>,
}

impl Default for RunningAverage {
    fn default() -> Self {
        Self {
            sum: 0.0,
            count: 0,
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
            last_report: None,
        }
    }
}

impl RunningAverage {
    pub fn push(&mut self, value: f64) {
        self.sum += value;
        self.count += 1;
        self.min = self.min.min(value);
        self.max = self.max.max(value);
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn average(&self) -> Option<f64> {
        (self.count > 0).then(|| self.sum / self.count as f64)
    }

    pub fn min(&self) -> Option<f64> {
        (self.count > 0).then_some(self.min)
    }

    pub fn max(&self) -> Option<f64> {
        (self.count > 0).then_some(self.max)
    }

    pub fn reset(&mut self) {
        *self = Self {
            last_report: self.last_report,
            ..Self::default()
        };
    }

    /// True at most once per `every`; the first call only starts the clock.
    pub fn report_due(&mut self, now: Instant, every: Duration) -> bool {
        match self.last_report {
            None => {
                self.last_report = Some(now);
                false
            }
            Some(last) if now.duration_since(last) >= every => {
                self.last_report = Some(now);
                true
            }
            Some(_) => false,
        }
    }
}
