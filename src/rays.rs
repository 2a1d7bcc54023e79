//! 3D rays built from oriented contour segments.
//!
//! A ray is the strip swept by a segment's lens-plane projection along the
//! camera's forward axis: it starts on the lens plane and reaches
//! `max_ray_length` world units into the scene. Its plane holds the width
//! direction (`dir_along_y`) and the forward axis; `normal` is their cross
//! product, which points to the walker's right of the source segment.
use crate::camera::{pixel_xy, CameraPose};
use crate::edges::EdgeSegment;
use crate::geometry::Vec3;
use crate::types::{scale_point, ModelQuad};
use serde::Serialize;

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Ray {
    pub origin_start: Vec3,
    pub origin_end: Vec3,
    /// Midpoint of `origin_start` and `origin_end`.
    pub origin: Vec3,
    /// Unit vector from `origin_start` to `origin_end`.
    pub dir_along_y: Vec3,
    pub ray_width: f32,
    pub normal: Vec3,
    /// Atlas texture coordinates of the segment start.
    pub tex_start: [f32; 2],
    /// Atlas texture coordinates of the segment end.
    pub tex_end: [f32; 2],
    pub inside_is_on_the_right: bool,
}

impl Ray {
    /// Builds the ray of one segment, `None` for a zero-length segment.
    pub fn from_segment(camera: &CameraPose, segment: &EdgeSegment) -> Option<Self> {
        let origin_start = camera.lens_pixel(segment.start);
        let origin_end = camera.lens_pixel(segment.end);
        let along = origin_end - origin_start;
        let ray_width = along.norm();
        if ray_width <= f32::EPSILON {
            return None;
        }
        let dir_along_y = along / ray_width;
        let normal = dir_along_y.cross(&camera.forward()).try_normalize(f32::EPSILON)?;
        let tex = |pixel: usize| {
            let (x, y) = pixel_xy(pixel, camera.width);
            [x as f32 + camera.tex_offset.0, y as f32 + camera.tex_offset.1]
        };
        Some(Self {
            origin_start,
            origin_end,
            origin: (origin_start + origin_end) * 0.5,
            dir_along_y,
            ray_width,
            normal,
            tex_start: tex(segment.start),
            tex_end: tex(segment.end),
            inside_is_on_the_right: segment.inside_is_on_the_right,
        })
    }

    /// Texture rectangle as `[start_u, start_v, end_u, end_v]`.
    #[inline]
    pub fn tex(&self) -> [f32; 4] {
        [self.tex_start[0], self.tex_start[1], self.tex_end[0], self.tex_end[1]]
    }

    /// Point at length `x` along `forward` and width `y` along the ray.
    #[inline]
    pub fn point(&self, forward: &Vec3, x: f32, y: f32) -> Vec3 {
        self.origin_start + forward * x + self.dir_along_y * y
    }

    /// The whole ray as one quad; used by the full-ray debug output.
    pub fn full_quad(&self, forward: &Vec3, length: f32) -> ModelQuad {
        let [su, sv, eu, ev] = self.tex();
        ModelQuad {
            corners: [
                scale_point(&self.point(forward, 0.0, 0.0)),
                scale_point(&self.point(forward, length, 0.0)),
                scale_point(&self.point(forward, 0.0, self.ray_width)),
                scale_point(&self.point(forward, length, self.ray_width)),
            ],
            uvs: [su, sv, su, sv, eu, ev, eu, ev],
        }
    }
}

/// Converts the segment list of one camera into rays.
///
/// Segments chained to neither neighbour are isolated noise and dropped,
/// except the first and the last of the list.
pub fn build_rays(camera: &CameraPose, segments: &[EdgeSegment], out: &mut Vec<Ray>) {
    out.clear();
    let n = segments.len();
    for (i, seg) in segments.iter().enumerate() {
        if i > 0 && i + 1 < n {
            let chained_prev = seg.start == segments[i - 1].end;
            let chained_next = seg.end == segments[i + 1].start;
            if !chained_prev && !chained_next {
                continue;
            }
        }
        if let Some(ray) = Ray::from_segment(camera, seg) {
            out.push(ray);
        }
    }
}
