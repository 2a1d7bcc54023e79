//! Frame suppliers feeding the per-camera pipelines.
//!
//! A source is polled in two steps so that all cameras latch their frame at
//! nearly the same instant: `grab` is called for every camera during the
//! grab phase, `retrieve` decodes the latched frame later during processing.
//! Sources may also supply a ready-made background reference (recorded
//! playback) or accept one for storage (recording).
pub mod sequence;

pub use sequence::{ImageSequenceSource, RecordingSource};

use crate::image::RgbFrame;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to decode frame: {0}")]
    Decode(String),
    #[error("source {0} has no more frames")]
    Exhausted(String),
    #[error("source {0} is disconnected")]
    Disconnected(String),
}

pub trait FrameSource: Send {
    fn name(&self) -> &str;

    /// Latches the next frame.
    fn grab(&mut self) -> Result<(), SourceError>;

    /// Copies the latched frame into `frame`, resizing it when needed.
    fn retrieve(&mut self, frame: &mut RgbFrame) -> Result<(), SourceError>;

    /// A background reference that replaces live sampling, if the source
    /// has one.
    fn supplied_background(&mut self) -> Option<RgbFrame> {
        None
    }

    /// Receives a freshly sampled background reference.
    fn store_background(&mut self, _background: &RgbFrame) -> Result<(), SourceError> {
        Ok(())
    }

    /// Minimum time between two grabs; `None` runs as fast as possible.
    fn frame_interval(&self) -> Option<Duration> {
        None
    }
}

impl<S: FrameSource + ?Sized> FrameSource for Box<S> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn grab(&mut self) -> Result<(), SourceError> {
        (**self).grab()
    }

    fn retrieve(&mut self, frame: &mut RgbFrame) -> Result<(), SourceError> {
        (**self).retrieve(frame)
    }

    fn supplied_background(&mut self) -> Option<RgbFrame> {
        (**self).supplied_background()
    }

    fn store_background(&mut self, background: &RgbFrame) -> Result<(), SourceError> {
        (**self).store_background(background)
    }

    fn frame_interval(&self) -> Option<Duration> {
        (**self).frame_interval()
    }
}

/// In-memory source cycling over a fixed list of frames.
///
/// The first `warmup` grabs return the background frame so that live
/// background sampling sees an empty scene.
#[derive(Clone, Debug)]
pub struct SyntheticSource {
    name: String,
    background: Option<RgbFrame>,
    warmup: usize,
    frames: Vec<RgbFrame>,
    grabbed: usize,
    latched: Option<usize>,
    interval: Option<Duration>,
}

impl SyntheticSource {
    pub fn new(name: impl Into<String>, frames: Vec<RgbFrame>) -> Self {
        Self {
            name: name.into(),
            background: None,
            warmup: 0,
            frames,
            grabbed: 0,
            latched: None,
            interval: None,
        }
    }

    /// Serves `background` for the first `warmup` grabs.
    pub fn with_background_warmup(mut self, background: RgbFrame, warmup: usize) -> Self {
        self.background = Some(background);
        self.warmup = warmup;
        self
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = Some(interval);
        self
    }

    /// Restarts the warmup, e.g. before the background is sampled again.
    pub fn restart_warmup(&mut self) {
        self.grabbed = 0;
    }

    pub fn grabbed(&self) -> usize {
        self.grabbed
    }
}

/// Sentinel latch index meaning "the background frame".
const BACKGROUND_LATCH: usize = usize::MAX;

impl FrameSource for SyntheticSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn grab(&mut self) -> Result<(), SourceError> {
        let latch = if self.grabbed < self.warmup && self.background.is_some() {
            BACKGROUND_LATCH
        } else if self.frames.is_empty() {
            return Err(SourceError::Exhausted(self.name.clone()));
        } else {
            (self.grabbed - self.warmup.min(self.grabbed)) % self.frames.len()
        };
        self.latched = Some(latch);
        self.grabbed += 1;
        Ok(())
    }

    fn retrieve(&mut self, frame: &mut RgbFrame) -> Result<(), SourceError> {
        let source = match self.latched {
            Some(BACKGROUND_LATCH) => self.background.as_ref(),
            Some(i) => self.frames.get(i),
            None => None,
        }
        .ok_or_else(|| SourceError::Disconnected(self.name.clone()))?;
        frame.clone_from(source);
        Ok(())
    }

    fn frame_interval(&self) -> Option<Duration> {
        self.interval
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn warmup_serves_the_background_then_cycles() {
        let bg = RgbFrame::filled(4, 4, [10, 10, 10]);
        let a = RgbFrame::filled(4, 4, [1, 0, 0]);
        let b = RgbFrame::filled(4, 4, [2, 0, 0]);
        let mut source = SyntheticSource::new("cam", vec![a.clone(), b.clone()])
            .with_background_warmup(bg.clone(), 2);
        let mut frame = RgbFrame::default();
        let mut seen = Vec::new();
        for _ in 0..5 {
            source.grab().expect("grab");
            source.retrieve(&mut frame).expect("retrieve");
            seen.push(frame.get(0, 0)[0]);
        }
        assert_eq!(seen, vec![10, 10, 1, 2, 1]);
    }

    #[test]
    fn retrieve_without_grab_is_disconnected() {
        let mut source = SyntheticSource::new("cam", vec![RgbFrame::new(2, 2)]);
        let mut frame = RgbFrame::default();
        assert!(matches!(
            source.retrieve(&mut frame),
            Err(SourceError::Disconnected(_))
        ));
    }

    #[test]
    fn empty_source_is_exhausted() {
        let mut source = SyntheticSource::new("empty", Vec::new());
        let err = source.grab().unwrap_err();
        assert_eq!(err.to_string(), "source empty has no more frames");
    }

    #[test]
    fn boxed_sources_forward_every_call() {
        let mut source: Box<dyn FrameSource> = Box::new(
            SyntheticSource::new("boxed", vec![RgbFrame::filled(2, 2, [5, 6, 7])])
                .with_interval(Duration::from_millis(40)),
        );
        assert_eq!(source.name(), "boxed");
        assert_eq!(source.frame_interval(), Some(Duration::from_millis(40)));
        assert!(source.supplied_background().is_none());
        let mut frame = RgbFrame::default();
        source.grab().expect("grab");
        source.retrieve(&mut frame).expect("retrieve");
        assert_eq!(frame.get(1, 1), [5, 6, 7]);
    }
}
