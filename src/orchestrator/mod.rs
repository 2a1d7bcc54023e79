//! Threaded frame orchestration.
//!
//! Overview
//! - One worker thread per camera owns that camera's source, pipeline and
//!   model builder (`worker`).
//! - A coordinator thread drives every frame through the phases
//!   `Grab → Process → Intersect` with a `FrameBarrier`, then concatenates
//!   the per-camera quads in camera order and publishes them (`output`).
//! - A phase that does not complete within the barrier timeout skips the
//!   frame; the previously published model stays current.
//! - Consumers talk to the running system through `Command`s and read the
//!   model through `ModelOutput`.
pub mod barrier;
pub mod control;
pub mod output;
mod worker;

pub use barrier::{BarrierTimeout, FrameBarrier, Phase, Signal};
pub use control::Command;
pub use output::{ModelGuard, ModelOutput, OutputError};

use crate::camera::CameraPose;
use crate::config::HullConfig;
use crate::diagnostics::{FpsCounter, RunningAverage};
use crate::model::ModelBuilder;
use crate::pipeline::CameraPipeline;
use crate::source::FrameSource;
use crate::texture::TextureAtlas;
use crate::types::ModelFrame;
use control::{drain, route, CameraCommand};
use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError, Sender};
use log::{debug, error, info};
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use thiserror::Error;
use worker::{CameraSlot, Worker};

#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("failed to spawn thread: {0}")]
    Spawn(#[from] io::Error),
    #[error("no cameras configured")]
    NoCameras,
    #[error("{cameras} cameras configured but {sources} sources given")]
    SourceCount { cameras: usize, sources: usize },
}

/// Running reconstruction: worker threads plus the coordinator.
pub struct Reconstructor {
    output: Arc<ModelOutput>,
    atlas: Option<Arc<TextureAtlas>>,
    commands: Sender<Command>,
    running: Arc<AtomicBool>,
    slots: Arc<Vec<CameraSlot>>,
    barrier: Arc<FrameBarrier>,
    coordinator: Option<JoinHandle<()>>,
    workers: Vec<(String, JoinHandle<()>)>,
    exits: Receiver<usize>,
    shutdown_timeout: Duration,
}

impl Reconstructor {
    /// Spawns one worker per camera and the coordinator. `sources` pair with
    /// `config.cameras` in order.
    pub fn start<S: FrameSource + 'static>(
        config: HullConfig,
        sources: Vec<S>,
    ) -> Result<Self, OrchestratorError> {
        if config.cameras.is_empty() {
            return Err(OrchestratorError::NoCameras);
        }
        if config.cameras.len() != sources.len() {
            return Err(OrchestratorError::SourceCount {
                cameras: config.cameras.len(),
                sources: sources.len(),
            });
        }
        let cameras: Vec<Arc<CameraPose>> = config
            .cameras
            .iter()
            .enumerate()
            .map(|(i, c)| Arc::new(CameraPose::from_config(i, c)))
            .collect();
        let n = cameras.len();
        let interval = sources.iter().filter_map(|s| s.frame_interval()).max();
        let slots = Arc::new(
            cameras
                .iter()
                .map(|c| CameraSlot::new(c.clone()))
                .collect::<Vec<_>>(),
        );
        let barrier = Arc::new(FrameBarrier::new(n));
        let output = Arc::new(ModelOutput::new(n));
        let atlas = config
            .processing
            .texture_atlas
            .then(|| Arc::new(TextureAtlas::for_cameras(cameras.iter().map(|c| c.as_ref()))));
        let show_full_rays = Arc::new(AtomicBool::new(config.processing.show_full_rays));
        let running = Arc::new(AtomicBool::new(true));
        let timeout = config.processing.barrier_timeout();
        let (exit_tx, exits) = unbounded();
        let (command_tx, command_rx) = unbounded();

        let mut reconstructor = Self {
            output: output.clone(),
            atlas: atlas.clone(),
            commands: command_tx,
            running: running.clone(),
            slots: slots.clone(),
            barrier: barrier.clone(),
            coordinator: None,
            workers: Vec::with_capacity(n),
            exits,
            shutdown_timeout: timeout * 2,
        };

        let mut camera_tx = Vec::with_capacity(n);
        for (index, (camera, source)) in cameras.iter().zip(sources).enumerate() {
            let (tx, rx) = unbounded();
            camera_tx.push(tx);
            let worker = Worker {
                index,
                source,
                pipeline: CameraPipeline::new(camera.clone(), &config.processing),
                builder: ModelBuilder::new(index, &config),
                slots: slots.clone(),
                barrier: barrier.clone(),
                output: output.clone(),
                atlas: atlas.clone(),
                commands: rx,
                show_full_rays: show_full_rays.clone(),
                lock_timeout: Duration::from_millis(config.processing.thread_timeout_ms),
            };
            let exit = exit_tx.clone();
            // on error the partially started threads are stopped by Drop
            let handle = thread::Builder::new()
                .name(format!("hull-{}", camera.name))
                .spawn(move || worker.run(exit))?;
            reconstructor.workers.push((camera.name.clone(), handle));
        }

        let coordinator = Coordinator {
            slots,
            barrier,
            output,
            commands: command_rx,
            camera_tx,
            show_full_rays,
            running,
            timeout,
            interval,
        };
        let handle = thread::Builder::new()
            .name("hull-coordinator".to_string())
            .spawn(move || coordinator.run())?;
        reconstructor.coordinator = Some(handle);
        info!("reconstruction started with {n} cameras");
        Ok(reconstructor)
    }

    pub fn output(&self) -> Arc<ModelOutput> {
        self.output.clone()
    }

    pub fn atlas(&self) -> Option<Arc<TextureAtlas>> {
        self.atlas.clone()
    }

    pub fn send(&self, command: Command) {
        let _ = self.commands.send(command);
    }

    /// Sender for issuing commands from other threads.
    pub fn commands(&self) -> Sender<Command> {
        self.commands.clone()
    }

    pub fn frames_published(&self) -> u64 {
        self.output.frames_published()
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Stops every thread. Workers that do not exit within the shutdown
    /// timeout are detached.
    pub fn stop(&mut self) {
        if !self.running.swap(false, Ordering::AcqRel) && self.workers.is_empty() {
            return;
        }
        for slot in self.slots.iter() {
            slot.running.store(false, Ordering::Release);
        }
        self.barrier.shutdown();
        if let Some(handle) = self.coordinator.take() {
            if handle.join().is_err() {
                error!("coordinator thread panicked");
            }
        }

        let deadline = Instant::now() + self.shutdown_timeout;
        let mut pending = self.workers.len();
        while pending > 0 {
            match self.exits.recv_deadline(deadline) {
                Ok(_) => pending -= 1,
                Err(_) => break,
            }
        }
        for (name, handle) in self.workers.drain(..) {
            if handle.is_finished() {
                if handle.join().is_err() {
                    error!("{name}: worker thread panicked");
                }
            } else {
                error!("{name}: worker did not stop in time, detaching");
            }
        }
        info!("reconstruction stopped");
    }
}

impl Drop for Reconstructor {
    fn drop(&mut self) {
        self.stop();
    }
}

struct Coordinator {
    slots: Arc<Vec<CameraSlot>>,
    barrier: Arc<FrameBarrier>,
    output: Arc<ModelOutput>,
    commands: Receiver<Command>,
    camera_tx: Vec<Sender<CameraCommand>>,
    show_full_rays: Arc<AtomicBool>,
    running: Arc<AtomicBool>,
    timeout: Duration,
    interval: Option<Duration>,
}

impl Coordinator {
    fn run(self) {
        let mut back = ModelFrame::default();
        let mut fps = FpsCounter::new();
        let mut frame_ms = RunningAverage::default();
        let mut frame_index = 0u64;
        while self.running.load(Ordering::Acquire) {
            let started = Instant::now();
            drain(&self.commands, |command| {
                debug!("command {command:?}");
                if let Some(enabled) = route(command, &self.camera_tx) {
                    self.show_full_rays.store(enabled, Ordering::Release);
                }
            });

            if self.run_frame(frame_index) && self.running.load(Ordering::Acquire) {
                self.assemble(frame_index, &mut back);
                self.output.publish(&mut back);
                frame_ms.push(started.elapsed().as_secs_f64() * 1000.0);
                if let Some(rate) = fps.tick() {
                    info!(
                        "{rate} fps, {:.1} ms/frame (max {:.1})",
                        frame_ms.average().unwrap_or(0.0),
                        frame_ms.max().unwrap_or(0.0)
                    );
                    frame_ms.reset();
                }
            }
            frame_index += 1;

            if let Some(interval) = self.interval {
                let elapsed = started.elapsed();
                if elapsed < interval {
                    self.sleep(interval - elapsed);
                }
            }
        }
        debug!("coordinator exiting after {frame_index} frames");
    }

    /// Runs the three phases of one frame; false when the frame was skipped.
    fn run_frame(&self, frame_index: u64) -> bool {
        for phase in Phase::ORDER {
            if !self.running.load(Ordering::Acquire) {
                return false;
            }
            let generation = self.barrier.dispatch(phase, frame_index);
            if let Err(timeout) = self.barrier.wait_for_all(generation, self.timeout) {
                let names = timeout
                    .stalled
                    .iter()
                    .filter_map(|&i| self.slots.get(i))
                    .map(|s| s.camera.name.as_str())
                    .collect::<Vec<_>>()
                    .join(", ");
                error!("frame {frame_index}: {phase:?} timed out waiting for [{names}], frame skipped");
                return false;
            }
        }
        true
    }

    fn assemble(&self, frame_index: u64, back: &mut ModelFrame) {
        back.clear();
        back.frame_index = frame_index;
        let mut reports = Vec::with_capacity(self.slots.len());
        for slot in self.slots.iter() {
            back.push_camera(&slot.quads.lock());
            reports.push(slot.report.lock().clone());
        }
        self.output.set_reports(reports);
    }

    /// Sleeps in short steps so a stop request is not delayed by pacing.
    fn sleep(&self, total: Duration) {
        let deadline = Instant::now() + total;
        while self.running.load(Ordering::Acquire) {
            let now = Instant::now();
            if now >= deadline {
                break;
            }
            match self.commands.recv_timeout((deadline - now).min(Duration::from_millis(20))) {
                Ok(command) => {
                    if let Some(enabled) = route(command, &self.camera_tx) {
                        self.show_full_rays.store(enabled, Ordering::Release);
                    }
                }
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => thread::sleep(deadline - now),
            }
        }
    }
}

#[cfg(test)]
mod tests;
