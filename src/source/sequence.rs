//! File-backed sources: playback of recorded PNG sequences and a recorder
//! wrapping any other source.
//!
//! A recording directory holds `frame_00000.png`, `frame_00001.png`, … and,
//! once a background was sampled, `background.png`. The playback source
//! loops over the frames and hands out the stored background so playback
//! never has to sample one.
use super::{FrameSource, SourceError};
use crate::image::io::{load_rgb_image, save_rgb_image};
use crate::image::RgbFrame;
use log::{debug, info, warn};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const BACKGROUND_FILE: &str = "background.png";

pub fn frame_file_name(index: u64) -> String {
    format!("frame_{index:05}.png")
}

fn is_frame_file(path: &Path) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    name.starts_with("frame_") && name.ends_with(".png")
}

#[derive(Debug)]
pub struct ImageSequenceSource {
    name: String,
    dir: PathBuf,
    files: Vec<PathBuf>,
    next: usize,
    latched: Option<usize>,
    background: Option<RgbFrame>,
    background_loaded: bool,
    interval: Option<Duration>,
}

impl ImageSequenceSource {
    /// Lists the frame files of `dir`; fails when there are none.
    pub fn open(dir: &Path) -> Result<Self, SourceError> {
        let mut files = fs::read_dir(dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| is_frame_file(p))
            .collect::<Vec<_>>();
        files.sort();
        let name = dir
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("sequence")
            .to_string();
        if files.is_empty() {
            return Err(SourceError::Exhausted(name));
        }
        info!("{name}: {} frames in {}", files.len(), dir.display());
        Ok(Self {
            name,
            dir: dir.to_path_buf(),
            files,
            next: 0,
            latched: None,
            background: None,
            background_loaded: false,
            interval: None,
        })
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = Some(interval);
        self
    }

    pub fn frame_count(&self) -> usize {
        self.files.len()
    }
}

impl FrameSource for ImageSequenceSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn grab(&mut self) -> Result<(), SourceError> {
        self.latched = Some(self.next);
        self.next = (self.next + 1) % self.files.len();
        Ok(())
    }

    fn retrieve(&mut self, frame: &mut RgbFrame) -> Result<(), SourceError> {
        let index = self
            .latched
            .ok_or_else(|| SourceError::Disconnected(self.name.clone()))?;
        *frame = load_rgb_image(&self.files[index]).map_err(SourceError::Decode)?;
        Ok(())
    }

    fn supplied_background(&mut self) -> Option<RgbFrame> {
        if !self.background_loaded {
            self.background_loaded = true;
            let path = self.dir.join(BACKGROUND_FILE);
            if path.is_file() {
                match load_rgb_image(&path) {
                    Ok(frame) => self.background = Some(frame),
                    Err(e) => warn!("{}: {e}", self.name),
                }
            }
        }
        self.background.clone()
    }

    fn frame_interval(&self) -> Option<Duration> {
        self.interval
    }
}

/// Passes frames through from `inner` and writes each retrieved frame and
/// every stored background into `dir`.
#[derive(Debug)]
pub struct RecordingSource<S> {
    inner: S,
    dir: PathBuf,
    written: u64,
}

impl<S: FrameSource> RecordingSource<S> {
    pub fn new(inner: S, dir: &Path) -> Result<Self, SourceError> {
        fs::create_dir_all(dir)?;
        Ok(Self {
            inner,
            dir: dir.to_path_buf(),
            written: 0,
        })
    }

    pub fn written(&self) -> u64 {
        self.written
    }
}

fn write_png(frame: &RgbFrame, path: &Path) -> Result<(), SourceError> {
    save_rgb_image(frame, path).map_err(|e| SourceError::Io(std::io::Error::other(e)))
}

impl<S: FrameSource> FrameSource for RecordingSource<S> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn grab(&mut self) -> Result<(), SourceError> {
        self.inner.grab()
    }

    fn retrieve(&mut self, frame: &mut RgbFrame) -> Result<(), SourceError> {
        self.inner.retrieve(frame)?;
        let path = self.dir.join(frame_file_name(self.written));
        write_png(frame, &path)?;
        self.written += 1;
        debug!("{}: recorded {}", self.inner.name(), path.display());
        Ok(())
    }

    fn supplied_background(&mut self) -> Option<RgbFrame> {
        self.inner.supplied_background()
    }

    fn store_background(&mut self, background: &RgbFrame) -> Result<(), SourceError> {
        write_png(background, &self.dir.join(BACKGROUND_FILE))?;
        self.inner.store_background(background)
    }

    fn frame_interval(&self) -> Option<Duration> {
        self.inner.frame_interval()
    }
}
