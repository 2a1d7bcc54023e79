//! One camera's worker thread.
//!
//! The worker owns its source, pipeline and model builder. Everything the
//! other threads read lives in the camera's `CameraSlot`.
use super::barrier::{FrameBarrier, Phase, Signal};
use super::control::{drain, CameraCommand};
use super::output::ModelOutput;
use crate::camera::CameraPose;
use crate::diagnostics::CameraFrameReport;
use crate::model::{CameraRays, ModelBuilder};
use crate::pipeline::CameraPipeline;
use crate::rays::Ray;
use crate::source::FrameSource;
use crate::texture::TextureAtlas;
use crate::types::ModelQuad;
use crossbeam_channel::{Receiver, Sender};
use log::{debug, warn};
use parking_lot::{Mutex, RwLock};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Poll period of a waiting worker; bounds how long a cleared running flag
/// goes unnoticed.
const POLL: Duration = Duration::from_millis(50);

/// Per-camera state shared between the worker, the other workers and the
/// coordinator.
#[derive(Debug)]
pub(crate) struct CameraSlot {
    pub camera: Arc<CameraPose>,
    /// Written in `Process`, read by every worker in `Intersect`.
    pub rays: RwLock<Vec<Ray>>,
    /// Written in `Intersect`, read by the coordinator after the barrier.
    pub quads: Mutex<Vec<ModelQuad>>,
    pub report: Mutex<CameraFrameReport>,
    pub running: AtomicBool,
}

impl CameraSlot {
    pub fn new(camera: Arc<CameraPose>) -> Self {
        Self {
            camera,
            rays: RwLock::new(Vec::new()),
            quads: Mutex::new(Vec::new()),
            report: Mutex::new(CameraFrameReport::default()),
            running: AtomicBool::new(true),
        }
    }
}

pub(crate) struct Worker<S> {
    pub index: usize,
    pub source: S,
    pub pipeline: CameraPipeline,
    pub builder: ModelBuilder,
    pub slots: Arc<Vec<CameraSlot>>,
    pub barrier: Arc<FrameBarrier>,
    pub output: Arc<ModelOutput>,
    pub atlas: Option<Arc<TextureAtlas>>,
    pub commands: Receiver<CameraCommand>,
    pub show_full_rays: Arc<AtomicBool>,
    /// Bound on acquiring another camera's ray list.
    pub lock_timeout: Duration,
}

impl<S: FrameSource> Worker<S> {
    /// Serves phases until shutdown or until the running flag is cleared,
    /// then reports its index on `exit`.
    pub fn run(mut self, exit: Sender<usize>) {
        let mut seen = 0;
        let mut grabbed = false;
        while self.slot().running.load(Ordering::Acquire) {
            match self.barrier.next_phase(seen, POLL) {
                None => continue,
                Some(Signal::Shutdown) => break,
                Some(Signal::Run {
                    generation,
                    phase,
                    frame_index,
                }) => {
                    seen = generation;
                    match phase {
                        Phase::Grab => grabbed = self.grab(),
                        Phase::Process => self.process(frame_index, grabbed),
                        Phase::Intersect => self.intersect(),
                    }
                    self.barrier.arrive(self.index, generation);
                }
            }
        }
        debug!("{}: worker exiting", self.slot().camera.name);
        let _ = exit.send(self.index);
    }

    fn slot(&self) -> &CameraSlot {
        &self.slots[self.index]
    }

    fn grab(&mut self) -> bool {
        match self.source.grab() {
            Ok(()) => true,
            Err(e) => {
                warn!("{}: grab failed: {e}", self.source.name());
                false
            }
        }
    }

    fn apply_commands(&mut self) {
        let pipeline = &mut self.pipeline;
        let output = &self.output;
        let index = self.index;
        drain(&self.commands, |command| match command {
            CameraCommand::RecomputeBackground => pipeline.request_background(),
            CameraCommand::SetPreview(kind) => {
                pipeline.set_preview(kind);
                if !kind.is_enabled() {
                    output.set_preview(index, None);
                }
            }
        });
    }

    fn process(&mut self, frame_index: u64, grabbed: bool) {
        self.apply_commands();
        let slots = Arc::clone(&self.slots);
        let slot = &slots[self.index];
        let mut rays = slot.rays.write();
        let report = if grabbed {
            match self.pipeline.process(&mut self.source, frame_index, &mut rays) {
                Ok(report) => report.clone(),
                Err(e) => {
                    warn!("{}: frame {frame_index} skipped: {e}", slot.camera.name);
                    skipped_report(self.index, frame_index, e.to_string())
                }
            }
        } else {
            rays.clear();
            skipped_report(self.index, frame_index, "grab failed".to_string())
        };
        drop(rays);

        if report.skipped.is_none() {
            if let Some(atlas) = &self.atlas {
                atlas.write_frame(&slot.camera, self.pipeline.frame());
            }
            if let Some(preview) = self.pipeline.take_preview() {
                self.output.set_preview(self.index, Some(preview));
            }
        }
        *slot.report.lock() = report;
    }

    fn intersect(&mut self) {
        let slots = Arc::clone(&self.slots);
        let slot = &slots[self.index];
        let guards: Option<Vec<_>> = slots
            .iter()
            .map(|s| s.rays.try_read_for(self.lock_timeout))
            .collect();
        let Some(guards) = guards else {
            warn!("{}: ray lists busy, no quads this frame", slot.camera.name);
            slot.quads.lock().clear();
            return;
        };
        let views: Vec<CameraRays<'_>> = slots
            .iter()
            .zip(&guards)
            .map(|(s, rays)| CameraRays {
                camera: s.camera.as_ref(),
                rays: rays.as_slice(),
            })
            .collect();
        let full = self.show_full_rays.load(Ordering::Acquire);
        let quads = self.builder.build(&views, full);
        let mut out = slot.quads.lock();
        out.clear();
        out.extend_from_slice(quads);
        drop(out);
        drop(views);
        drop(guards);

        let stats = self.builder.stats();
        let mut report = slot.report.lock();
        report.intersections = stats.intersections;
        report.quads = stats.quads;
    }
}

fn skipped_report(camera: usize, frame_index: u64, reason: String) -> CameraFrameReport {
    CameraFrameReport {
        camera,
        frame_index,
        skipped: Some(reason),
        ..Default::default()
    }
}
