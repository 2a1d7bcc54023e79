//! Synchronous whole-frame driver on the rayon pool.
//!
//! Runs the same three phases as the threaded orchestrator (grab every
//! source, process every camera, intersect every camera) but as plain
//! parallel loops, so tools and tests get deterministic frames without
//! worker threads.
use super::CameraPipeline;
use crate::camera::CameraPose;
use crate::config::HullConfig;
use crate::diagnostics::CameraFrameReport;
use crate::model::{CameraRays, ModelBuilder};
use crate::rays::Ray;
use crate::source::FrameSource;
use crate::texture::TextureAtlas;
use crate::types::ModelFrame;
use log::warn;
use rayon::prelude::*;
use std::sync::Arc;

struct Station<S> {
    pipeline: CameraPipeline,
    source: S,
}

pub struct SyncDriver<S> {
    cameras: Vec<Arc<CameraPose>>,
    stations: Vec<Station<S>>,
    rays: Vec<Vec<Ray>>,
    builders: Vec<ModelBuilder>,
    atlas: Option<Arc<TextureAtlas>>,
    show_full_rays: bool,
    frame_index: u64,
}

impl<S: FrameSource> SyncDriver<S> {
    /// One camera per configured camera entry, paired with `sources` in order.
    /// Extra sources or cameras are ignored.
    pub fn new(config: &HullConfig, sources: Vec<S>) -> Self {
        let cameras: Vec<Arc<CameraPose>> = config
            .cameras
            .iter()
            .enumerate()
            .map(|(i, c)| Arc::new(CameraPose::from_config(i, c)))
            .collect();
        let stations: Vec<Station<S>> = cameras
            .iter()
            .zip(sources)
            .map(|(camera, source)| Station {
                pipeline: CameraPipeline::new(camera.clone(), &config.processing),
                source,
            })
            .collect();
        let n = stations.len();
        let atlas = config
            .processing
            .texture_atlas
            .then(|| Arc::new(TextureAtlas::for_cameras(cameras.iter().take(n).map(|c| c.as_ref()))));
        Self {
            builders: (0..n).map(|i| ModelBuilder::new(i, config)).collect(),
            rays: vec![Vec::new(); n],
            cameras: cameras.into_iter().take(n).collect(),
            stations,
            atlas,
            show_full_rays: config.processing.show_full_rays,
            frame_index: 0,
        }
    }

    pub fn camera_count(&self) -> usize {
        self.stations.len()
    }

    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }

    pub fn pipeline(&self, camera: usize) -> Option<&CameraPipeline> {
        self.stations.get(camera).map(|s| &s.pipeline)
    }

    pub fn pipeline_mut(&mut self, camera: usize) -> Option<&mut CameraPipeline> {
        self.stations.get_mut(camera).map(|s| &mut s.pipeline)
    }

    pub fn rays(&self, camera: usize) -> &[Ray] {
        self.rays.get(camera).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn builder(&self, camera: usize) -> Option<&ModelBuilder> {
        self.builders.get(camera)
    }

    pub fn atlas(&self) -> Option<&Arc<TextureAtlas>> {
        self.atlas.as_ref()
    }

    pub fn set_show_full_rays(&mut self, enabled: bool) {
        self.show_full_rays = enabled;
    }

    /// Asks every camera to sample a new background on the next frame.
    pub fn request_background(&mut self) {
        for station in &mut self.stations {
            station.pipeline.request_background();
        }
    }

    /// Runs one global frame and writes the concatenated quads into `out`.
    /// Returns the per-camera reports.
    pub fn reconstruct_frame(&mut self, out: &mut ModelFrame) -> Vec<CameraFrameReport> {
        let frame_index = self.frame_index;
        self.frame_index += 1;

        // grab
        let mut grabbed = vec![true; self.stations.len()];
        for (station, ok) in self.stations.iter_mut().zip(&mut grabbed) {
            if let Err(e) = station.source.grab() {
                warn!("{}: grab failed: {e}", station.source.name());
                *ok = false;
            }
        }

        // process
        let atlas = self.atlas.as_deref();
        self.stations
            .par_iter_mut()
            .zip(self.rays.par_iter_mut())
            .zip(grabbed.par_iter())
            .for_each(|((station, rays), &ok)| {
                if !ok {
                    rays.clear();
                    return;
                }
                let Station { pipeline, source } = station;
                match pipeline.process(source, frame_index, rays).map(|_| ()) {
                    Ok(_) => {
                        if let Some(atlas) = atlas {
                            atlas.write_frame(pipeline.camera(), pipeline.frame());
                        }
                    }
                    Err(e) => warn!("{}: frame {frame_index} skipped: {e}", pipeline.camera().name),
                }
            });

        // intersect + emit
        let views: Vec<CameraRays<'_>> = self
            .cameras
            .iter()
            .zip(&self.rays)
            .map(|(camera, rays)| CameraRays {
                camera: camera.as_ref(),
                rays: rays.as_slice(),
            })
            .collect();
        let show_full_rays = self.show_full_rays;
        self.builders.par_iter_mut().for_each(|builder| {
            builder.build(&views, show_full_rays);
        });

        out.clear();
        out.frame_index = frame_index;
        for builder in &self.builders {
            out.push_camera(builder.quads());
        }

        self.stations
            .iter_mut()
            .zip(&self.builders)
            .map(|(station, builder)| {
                let stats = builder.stats();
                let report = station.pipeline.report_mut();
                report.intersections = stats.intersections;
                report.quads = stats.quads;
                report.clone()
            })
            .collect()
    }
}
