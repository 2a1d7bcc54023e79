//! Published model frames and the consumer-side access to them.
//!
//! The coordinator assembles every frame into a private back buffer and
//! swaps it into the published slot under the write lock, so a reader always
//! sees one complete frame. A separate flag (mutex + condvar) announces new
//! frames to consumers that poll or block.
use crate::diagnostics::CameraFrameReport;
use crate::image::RgbFrame;
use crate::types::ModelFrame;
use log::error;
use parking_lot::{Condvar, Mutex, RwLock, RwLockReadGuard};
use std::collections::HashSet;
use std::ops::Deref;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread::{self, ThreadId};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum OutputError {
    #[error("the model is already acquired by this thread; release it before acquiring again")]
    AlreadyAcquired,
}

#[derive(Debug)]
pub struct ModelOutput {
    published: RwLock<ModelFrame>,
    fresh: Mutex<bool>,
    fresh_cv: Condvar,
    /// Threads currently holding a guard.
    holders: Mutex<HashSet<ThreadId>>,
    frames: AtomicU64,
    previews: Vec<Mutex<Option<RgbFrame>>>,
    reports: Mutex<Vec<CameraFrameReport>>,
}

impl ModelOutput {
    pub fn new(cameras: usize) -> Self {
        Self {
            published: RwLock::new(ModelFrame::default()),
            fresh: Mutex::new(false),
            fresh_cv: Condvar::new(),
            holders: Mutex::new(HashSet::new()),
            frames: AtomicU64::new(0),
            previews: (0..cameras).map(|_| Mutex::new(None)).collect(),
            reports: Mutex::new(Vec::new()),
        }
    }

    /// Swaps `back` into the published slot; `back` receives the previous
    /// frame for reuse.
    pub fn publish(&self, back: &mut ModelFrame) {
        std::mem::swap(&mut *self.published.write(), back);
        self.frames.fetch_add(1, Ordering::AcqRel);
        *self.fresh.lock() = true;
        self.fresh_cv.notify_all();
    }

    /// Number of frames published so far.
    pub fn frames_published(&self) -> u64 {
        self.frames.load(Ordering::Acquire)
    }

    /// Whether a frame was published since the last check; clears the flag.
    pub fn has_new_model(&self) -> bool {
        std::mem::replace(&mut *self.fresh.lock(), false)
    }

    /// Blocks until a new frame is published or `timeout` elapses; clears
    /// the flag.
    pub fn wait_for_new_model(&self, timeout: Duration) -> bool {
        let mut fresh = self.fresh.lock();
        if !*fresh {
            self.fresh_cv.wait_while_for(&mut fresh, |f| !*f, timeout);
        }
        std::mem::replace(&mut *fresh, false)
    }

    /// Read access to the published frame. Publishing blocks while the guard
    /// is held, so keep it short.
    ///
    /// Several consumer threads may hold guards at once. A second acquire on
    /// the same thread fails, since a queued publish would deadlock it.
    pub fn acquire(&self) -> Result<ModelGuard<'_>, OutputError> {
        let thread = thread::current().id();
        if !self.holders.lock().insert(thread) {
            error!("model acquired twice on one thread without release");
            return Err(OutputError::AlreadyAcquired);
        }
        Ok(ModelGuard {
            frame: self.published.read(),
            holders: &self.holders,
            thread,
        })
    }

    /// Copy of the published frame without holding a guard.
    pub fn snapshot(&self) -> ModelFrame {
        self.published.read().clone()
    }

    pub fn set_preview(&self, camera: usize, preview: Option<RgbFrame>) {
        if let Some(slot) = self.previews.get(camera) {
            *slot.lock() = preview;
        }
    }

    /// The latest preview of `camera`, if one is being rendered.
    pub fn preview(&self, camera: usize) -> Option<RgbFrame> {
        self.previews.get(camera).and_then(|slot| slot.lock().clone())
    }

    pub fn set_reports(&self, reports: Vec<CameraFrameReport>) {
        *self.reports.lock() = reports;
    }

    /// Per-camera reports of the last published frame.
    pub fn reports(&self) -> Vec<CameraFrameReport> {
        self.reports.lock().clone()
    }
}

/// Read guard over the published frame; released on drop.
#[derive(Debug)]
pub struct ModelGuard<'a> {
    frame: RwLockReadGuard<'a, ModelFrame>,
    holders: &'a Mutex<HashSet<ThreadId>>,
    thread: ThreadId,
}

impl ModelGuard<'_> {
    pub fn release(self) {}
}

impl Deref for ModelGuard<'_> {
    type Target = ModelFrame;

    fn deref(&self) -> &ModelFrame {
        &self.frame
    }
}

impl Drop for ModelGuard<'_> {
    fn drop(&mut self) {
        self.holders.lock().remove(&self.thread);
    }
}
