//! Per-camera 2D stages: frame → mask → keypoints → segments → rays.
//!
//! Overview
//! - `CameraPipeline` owns every per-camera buffer and reuses it between
//!   frames; buffers are resized only when the frame size changes.
//! - `process` runs one frame through background subtraction, contour
//!   extraction, edge tracing and ray building, writing into a caller-owned
//!   ray list so the orchestrator can share it with the other cameras.
//! - When a new background is requested (or none exists yet) the frame is
//!   spent on sampling instead and contributes no rays.
//!
//! `driver::SyncDriver` runs all cameras of one frame on the rayon pool
//! without the threaded orchestrator.
pub mod driver;

pub use driver::SyncDriver;

use crate::background::{BackgroundModel, SampleCount};
use crate::camera::CameraPose;
use crate::config::ProcessingConfig;
use crate::contour::ContourExtractor;
use crate::diagnostics::CameraFrameReport;
use crate::edges::EdgeTracer;
use crate::error::PipelineError;
use crate::image::RgbFrame;
use crate::preview::{render_preview, PreviewInputs, PreviewKind};
use crate::rays::{build_rays, Ray};
use crate::source::FrameSource;
use log::{debug, info};
use std::sync::Arc;

#[derive(Debug)]
pub struct CameraPipeline {
    camera: Arc<CameraPose>,
    frame: RgbFrame,
    background: BackgroundModel,
    background_frames: usize,
    needs_background: bool,
    contour: ContourExtractor,
    tracer: EdgeTracer,
    preview_kind: PreviewKind,
    preview_scale: f32,
    preview: Option<RgbFrame>,
    report: CameraFrameReport,
}

impl CameraPipeline {
    pub fn new(camera: Arc<CameraPose>, config: &ProcessingConfig) -> Self {
        let report = CameraFrameReport {
            camera: camera.index,
            ..Default::default()
        };
        Self {
            frame: RgbFrame::new(camera.width, camera.height),
            camera,
            background: BackgroundModel::new(config.color_tolerance),
            background_frames: config.background_frames.max(1),
            needs_background: true,
            contour: ContourExtractor::new(config.contour_cell, config.noise_pixel_tolerance),
            tracer: EdgeTracer::new(config.merge_tolerance),
            preview_kind: config.preview,
            preview_scale: config.preview_scale,
            preview: None,
            report,
        }
    }

    pub fn camera(&self) -> &Arc<CameraPose> {
        &self.camera
    }

    /// The live frame of the last `process`.
    pub fn frame(&self) -> &RgbFrame {
        &self.frame
    }

    pub fn background(&self) -> &BackgroundModel {
        &self.background
    }

    pub fn contour(&self) -> &ContourExtractor {
        &self.contour
    }

    pub fn tracer(&self) -> &EdgeTracer {
        &self.tracer
    }

    pub fn report(&self) -> &CameraFrameReport {
        &self.report
    }

    pub fn report_mut(&mut self) -> &mut CameraFrameReport {
        &mut self.report
    }

    /// Samples a new background during the next `process`.
    pub fn request_background(&mut self) {
        self.needs_background = true;
    }

    pub fn needs_background(&self) -> bool {
        self.needs_background || !self.background.is_ready()
    }

    pub fn set_preview(&mut self, kind: PreviewKind) {
        self.preview_kind = kind;
        if !kind.is_enabled() {
            self.preview = None;
        }
    }

    pub fn preview_kind(&self) -> PreviewKind {
        self.preview_kind
    }

    /// Takes the preview rendered by the last `process`.
    pub fn take_preview(&mut self) -> Option<RgbFrame> {
        self.preview.take()
    }

    /// Builds a new background reference: an externally supplied one when
    /// the source has it, otherwise the mean of `background_frames` frames
    /// starting with the one already grabbed.
    pub fn sample_background<S: FrameSource + ?Sized>(
        &mut self,
        source: &mut S,
    ) -> Result<(), PipelineError> {
        let (w, h) = (self.camera.width, self.camera.height);
        if let Some(supplied) = source.supplied_background() {
            self.background.start_new_background(w, h, SampleCount::External);
            check_frame_size(&self.camera, &supplied)?;
            self.background.set_background(&supplied);
            info!("{}: using supplied background", self.camera.name);
        } else {
            let k = self.background_frames;
            self.background.start_new_background(w, h, SampleCount::Sampled(k));
            for i in 0..k {
                if i > 0 {
                    source.grab()?;
                }
                source.retrieve(&mut self.frame)?;
                self.background.add_frame(&self.frame)?;
            }
            self.background.finalize_background();
            source.store_background(self.background.background()?)?;
            info!("{}: background sampled from {k} frames", self.camera.name);
        }
        self.needs_background = false;
        Ok(())
    }

    /// Runs the 2D stages on the frame latched by the last `grab` and writes
    /// the camera's rays into `rays`. On error `rays` is left empty.
    pub fn process<S: FrameSource + ?Sized>(
        &mut self,
        source: &mut S,
        frame_index: u64,
        rays: &mut Vec<Ray>,
    ) -> Result<&CameraFrameReport, PipelineError> {
        rays.clear();
        self.report = CameraFrameReport {
            camera: self.camera.index,
            frame_index,
            ..Default::default()
        };

        if self.needs_background() {
            self.sample_background(source)?;
            self.report.skipped = Some("background sampled".to_string());
            return Ok(&self.report);
        }

        let timing = &mut self.report.timing;
        timing.measure("retrieve", || source.retrieve(&mut self.frame))?;
        check_frame_size(&self.camera, &self.frame)?;

        let background = &mut self.background;
        let frame = &self.frame;
        let foreground = timing.measure("mask", || {
            background
                .compute_binary_mask(frame)
                .map(|mask| mask.foreground_count())
        })?;
        let mask = self.background.mask()?;
        let contour = &mut self.contour;
        let keypoints = timing.measure("contour", || contour.compute(mask).keypoint_count());
        let grid = self.contour.grid();
        let tracer = &mut self.tracer;
        let segments = timing.measure("edges", || tracer.trace(grid).len());
        let camera = &self.camera;
        let segment_list = self.tracer.segments();
        timing.measure("rays", || build_rays(camera, segment_list, rays));

        self.report.foreground_pixels = foreground;
        self.report.keypoints = keypoints;
        self.report.segments = segments;
        self.report.rays = rays.len();
        self.report.trace = self.tracer.stats();

        if self.preview_kind.is_enabled() {
            self.preview = self.render_preview();
        }
        debug!(
            "{} frame {frame_index}: {} fg px, {keypoints} keypoints, {segments} segments, {} rays",
            self.camera.name,
            foreground,
            rays.len()
        );
        Ok(&self.report)
    }

    /// Renders the selected preview from the current stage outputs.
    pub fn render_preview(&self) -> Option<RgbFrame> {
        let inputs = PreviewInputs {
            frame: &self.frame,
            background: if self.background.is_ready() {
                self.background.background().ok()
            } else {
                None
            },
            mask: if self.background.has_mask() {
                self.background.mask().ok()
            } else {
                None
            },
            grid: Some(self.contour.grid()),
            boundary: self.contour.boundary(),
            segments: self.tracer.segments(),
        };
        render_preview(self.preview_kind, &inputs, self.preview_scale)
    }

}

fn check_frame_size(camera: &CameraPose, frame: &RgbFrame) -> Result<(), PipelineError> {
    let expected = (camera.width, camera.height);
    if frame.dims() != expected {
        return Err(PipelineError::FrameSize {
            expected,
            actual: frame.dims(),
        });
    }
    Ok(())
}
