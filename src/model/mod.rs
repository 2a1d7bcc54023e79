//! Cross-camera carving of one camera's rays into surface quads.
//!
//! Every camera owns a `ModelBuilder`. Per frame it
//! 1. flips its intersection buffers and intersects each of its own rays
//!    with every ray of every other camera,
//! 2. sorts the records of each own ray along the ray's length,
//! 3. walks the sorted records and emits a quad for every enter/exit pair.
//!
//! The builder only writes its own state; all ray lists are read-only here,
//! so the builders of different cameras can run concurrently.
pub mod buffers;
pub mod emit;
pub mod intersect;

pub use buffers::{IntersectionBuffers, IntersectionRecord, IntersectionSet};
pub use emit::emit_ray_quads;
pub use intersect::{classify_overlap, intersect_rays, Overlap, OverlapCase, RayAxis};

use crate::camera::CameraPose;
use crate::config::{HullConfig, IntersectionConfig};
use crate::geometry::LinePair;
use crate::rays::Ray;
use crate::types::ModelQuad;
use log::debug;
use serde::Serialize;

/// Relative size of `a·c − b²` below which two forward axes count as parallel.
const PARALLEL_AXES_EPS: f32 = 1e-4;

/// Read-only view of one camera's rays for the current frame.
#[derive(Clone, Copy, Debug)]
pub struct CameraRays<'a> {
    pub camera: &'a CameraPose,
    pub rays: &'a [Ray],
}

/// Counters of the last `intersect`/`emit` pair.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelStats {
    pub own_rays: usize,
    pub other_rays: usize,
    pub parallel_cameras: usize,
    pub intersections: usize,
    pub quads: usize,
}

#[derive(Debug)]
pub struct ModelBuilder {
    camera_index: usize,
    max_ray_length: f32,
    params: IntersectionConfig,
    buffers: IntersectionBuffers,
    quads: Vec<ModelQuad>,
    stats: ModelStats,
}

impl ModelBuilder {
    pub fn new(camera_index: usize, config: &HullConfig) -> Self {
        Self {
            camera_index,
            max_ray_length: config.processing.max_ray_length,
            params: config.intersection.clone(),
            buffers: IntersectionBuffers::default(),
            quads: Vec::new(),
            stats: ModelStats::default(),
        }
    }

    pub fn camera_index(&self) -> usize {
        self.camera_index
    }

    /// Quads of the last emission.
    pub fn quads(&self) -> &[ModelQuad] {
        &self.quads
    }

    /// Records written by the last `intersect`.
    pub fn records(&self) -> &IntersectionSet {
        self.buffers.active()
    }

    pub fn buffers(&self) -> &IntersectionBuffers {
        &self.buffers
    }

    pub fn stats(&self) -> ModelStats {
        self.stats
    }

    /// Intersects the own camera's rays (the entry of `cameras` whose camera
    /// index matches this builder) with the rays of every other entry.
    /// Returns the number of records written.
    pub fn intersect(&mut self, cameras: &[CameraRays<'_>]) -> usize {
        let Some(own) = cameras.iter().find(|c| c.camera.index == self.camera_index) else {
            self.buffers.flip(0);
            self.stats = ModelStats::default();
            return 0;
        };
        let length = self.max_ray_length;
        let own_axis = RayAxis::new(own.camera.forward(), length);
        let set = self.buffers.flip(own.rays.len());
        let mut stats = ModelStats {
            own_rays: own.rays.len(),
            ..ModelStats::default()
        };

        for other in cameras.iter().filter(|c| c.camera.index != self.camera_index) {
            let other_axis = RayAxis::new(other.camera.forward(), length);
            let center_pair = LinePair::new(&own_axis.vector, &other_axis.vector);
            if center_pair.d <= PARALLEL_AXES_EPS * center_pair.a * center_pair.c {
                stats.parallel_cameras += 1;
                continue;
            }
            stats.other_rays += other.rays.len();
            for (ray_index, own_ray) in own.rays.iter().enumerate() {
                for other_ray in other.rays {
                    if let Some(record) = intersect_rays(
                        own_ray,
                        &own_axis,
                        other_ray,
                        &other_axis,
                        &center_pair,
                        &self.params,
                    ) {
                        set.push(ray_index, record);
                    }
                }
            }
        }

        for ray_index in 0..own.rays.len() {
            set.sort_ray(ray_index);
        }
        stats.intersections = set.len();
        self.stats = stats;
        debug!(
            "camera {}: {} rays, {} intersections ({} parallel cameras skipped)",
            self.camera_index, stats.own_rays, stats.intersections, stats.parallel_cameras
        );
        stats.intersections
    }

    /// Emits the quads of the own rays from the records of the last
    /// `intersect`. `own` must be the same ray list that was intersected.
    pub fn emit(&mut self, own: &CameraRays<'_>) -> &[ModelQuad] {
        self.quads.clear();
        let forward = own.camera.forward();
        let set = self.buffers.active();
        let rays = own.rays.len().min(set.ray_count());
        for (ray_index, ray) in own.rays[..rays].iter().enumerate() {
            emit_ray_quads(ray, &forward, set.ray_records(ray_index), &mut self.quads);
        }
        self.stats.quads = self.quads.len();
        &self.quads
    }

    /// Emits every own ray as a single quad of full length and width.
    pub fn emit_full_rays(&mut self, own: &CameraRays<'_>) -> &[ModelQuad] {
        self.quads.clear();
        let forward = own.camera.forward();
        self.quads.extend(
            own.rays
                .iter()
                .map(|ray| ray.full_quad(&forward, self.max_ray_length)),
        );
        self.stats = ModelStats {
            own_rays: own.rays.len(),
            quads: self.quads.len(),
            ..ModelStats::default()
        };
        &self.quads
    }

    /// One full frame: intersection then emission, or the full-ray output
    /// when `show_full_rays` is set.
    pub fn build(&mut self, cameras: &[CameraRays<'_>], show_full_rays: bool) -> &[ModelQuad] {
        let Some(own) = cameras
            .iter()
            .copied()
            .find(|c| c.camera.index == self.camera_index)
        else {
            self.quads.clear();
            self.stats = ModelStats::default();
            return &self.quads;
        };
        if show_full_rays {
            return self.emit_full_rays(&own);
        }
        self.intersect(cameras);
        self.emit(&own)
    }
}
