//! Per-frame reports and rate counters.
//!
//! `CameraFrameReport` is filled by every camera pipeline each frame and
//! carries the stage counts plus a `TimingBreakdown`. The coordinator folds
//! the reports into `FpsCounter`/`RunningAverage` and logs them periodically.

pub mod frame;
pub mod timing;

pub use frame::{CameraFrameReport, FpsCounter, RunningAverage};
pub use timing::{StageTiming, TimingBreakdown};
