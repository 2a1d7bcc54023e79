//! Synthetic scene: a (possibly rotated) cube seen by the configured cameras.
//!
//! Frames are rendered with the same orthographic model the reconstruction
//! assumes: every pixel's lens-plane point is cast along the camera's forward
//! axis and tested against the cube (slab test in the cube's local frame).
//! Used by the demo binary and the end-to-end tests.
use crate::camera::CameraPose;
use crate::geometry::{hsv_to_rgb, Vec3};
use crate::image::{BinaryMask, RgbFrame};
use crate::source::SyntheticSource;
use nalgebra::UnitQuaternion;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SyntheticCube {
    pub center: Vec3,
    pub half_extent: f32,
    pub rotation: UnitQuaternion<f32>,
}

impl SyntheticCube {
    pub fn new(center: Vec3, half_extent: f32) -> Self {
        Self {
            center,
            half_extent,
            rotation: UnitQuaternion::identity(),
        }
    }

    /// Same cube with `rotation` applied about its centre.
    pub fn rotated(mut self, rotation: UnitQuaternion<f32>) -> Self {
        self.rotation = rotation * self.rotation;
        self
    }

    pub fn corners(&self) -> [Vec3; 8] {
        let h = self.half_extent;
        std::array::from_fn(|i| {
            let local = Vec3::new(
                if i & 1 == 0 { -h } else { h },
                if i & 2 == 0 { -h } else { h },
                if i & 4 == 0 { -h } else { h },
            );
            self.center + self.rotation * local
        })
    }

    /// Axis-aligned world bounds of the rotated cube.
    pub fn world_bounds(&self) -> ([f32; 3], [f32; 3]) {
        let mut lo = [f32::INFINITY; 3];
        let mut hi = [f32::NEG_INFINITY; 3];
        for c in self.corners() {
            for k in 0..3 {
                lo[k] = lo[k].min(c[k]);
                hi[k] = hi[k].max(c[k]);
            }
        }
        (lo, hi)
    }

    /// Entry distance along `dir` and the local axis of the entry face, or
    /// `None` when the half-line from `origin` misses the cube.
    pub fn hit(&self, origin: &Vec3, dir: &Vec3) -> Option<(f32, usize)> {
        let inv = self.rotation.inverse();
        let o = inv * (origin - self.center);
        let d = inv * dir;
        let h = self.half_extent;
        let (mut t_min, mut t_max, mut axis) = (f32::NEG_INFINITY, f32::INFINITY, 0);
        for k in 0..3 {
            if d[k].abs() < 1e-9 {
                if o[k].abs() > h {
                    return None;
                }
                continue;
            }
            let t1 = (-h - o[k]) / d[k];
            let t2 = (h - o[k]) / d[k];
            let (near, far) = if t1 < t2 { (t1, t2) } else { (t2, t1) };
            if near > t_min {
                t_min = near;
                axis = k;
            }
            t_max = t_max.min(far);
        }
        (t_max >= t_min.max(0.0)).then_some((t_min.max(0.0), axis))
    }

    /// Silhouette of the cube in `camera` (true = background).
    pub fn mask(&self, camera: &CameraPose) -> BinaryMask {
        let forward = camera.forward();
        BinaryMask::from_fn(camera.width, camera.height, |x, y| {
            self.hit(&camera.lens_point(x as f32, y as f32), &forward)
                .is_none()
        })
    }

    /// `background` with the cube drawn over it, one shade per face axis.
    pub fn render(&self, camera: &CameraPose, background: &RgbFrame) -> RgbFrame {
        let mut frame = background.clone();
        let forward = camera.forward();
        for y in 0..camera.height.min(frame.h) {
            for x in 0..camera.width.min(frame.w) {
                if let Some((_, axis)) = self.hit(&camera.lens_point(x as f32, y as f32), &forward) {
                    frame.set(x, y, object_color(axis));
                }
            }
        }
        frame
    }
}

/// Face colour: saturated red, brighter per axis so the faces are
/// distinguishable in previews.
fn object_color(axis: usize) -> [u8; 3] {
    hsv_to_rgb([0.0, 0.8, 0.6 + 0.13 * axis as f32])
}

/// Dim bluish gradient used as the empty scene.
pub fn background_frame(width: usize, height: usize) -> RgbFrame {
    let mut frame = RgbFrame::new(width, height);
    for y in 0..height {
        let hue = 180.0 + 60.0 * y as f32 / height.max(1) as f32;
        for x in 0..width {
            let value = 0.15 + 0.1 * x as f32 / width.max(1) as f32;
            frame.set(x, y, hsv_to_rgb([hue, 0.4, value]));
        }
    }
    frame
}

/// A source for `camera` that serves the empty scene for `warmup` grabs and
/// then cycles over one rendered frame per cube pose.
pub fn cube_source(camera: &CameraPose, poses: &[SyntheticCube], warmup: usize) -> SyntheticSource {
    let background = background_frame(camera.width, camera.height);
    let frames = poses
        .iter()
        .map(|cube| cube.render(camera, &background))
        .collect();
    SyntheticSource::new(camera.name.clone(), frames).with_background_warmup(background, warmup)
}

/// `count` poses of `cube` spinning about the world Y axis by `step`
/// radians per frame.
pub fn spinning_poses(cube: &SyntheticCube, count: usize, step: f32) -> Vec<SyntheticCube> {
    (0..count)
        .map(|i| cube.rotated(UnitQuaternion::from_axis_angle(&Vec3::y_axis(), step * i as f32)))
        .collect()
}
