//! Pairwise intersection of rays from two cameras.
//!
//! Both rays are planar strips. Their planes meet in a line; each strip
//! covers an interval of that line, bounded by where the line crosses the
//! strip's start and end edges (the edges are the lines through
//! `origin_start`/`origin_end` along the camera's forward axis). The overlap
//! of the two intervals is the part of the line on both rays.
use super::buffers::IntersectionRecord;
use crate::config::IntersectionConfig;
use crate::geometry::{
    line_collision, line_collision_full, line_distance_sq, plane_intersection, LinePair,
    PlaneIntersection, Vec3,
};
use crate::rays::Ray;

/// Forward axis of one camera with the ray length folded in.
#[derive(Clone, Copy, Debug)]
pub struct RayAxis {
    /// Unit forward vector.
    pub forward: Vec3,
    /// `forward · length`.
    pub vector: Vec3,
    pub length: f32,
}

impl RayAxis {
    pub fn new(forward: Vec3, length: f32) -> Self {
        Self {
            forward,
            vector: forward * length,
            length,
        }
    }
}

/// How two intervals on the intersection line overlap.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OverlapCase {
    /// own start ≤ other start ≤ own end ≤ other end
    OwnLeads,
    /// other start ≤ own start ≤ other end ≤ own end
    OtherLeads,
    /// other start ≤ own start ≤ own end ≤ other end
    OwnInside,
    /// own start ≤ other start ≤ other end ≤ own end
    OtherInside,
}

/// Overlap of two intervals, measured from the own interval's start.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Overlap {
    pub case: OverlapCase,
    pub y_start: f32,
    pub y_end: f32,
}

/// Classifies the overlap of the sorted intervals `own` and `other`.
/// Returns `None` when they are disjoint.
pub fn classify_overlap(own: (f32, f32), other: (f32, f32)) -> Option<Overlap> {
    let (ts, te) = own;
    let (os, oe) = other;
    let (case, y_start, y_end) = if ts <= os && os <= te && te <= oe {
        (OverlapCase::OwnLeads, os - ts, te - ts)
    } else if os <= ts && ts <= oe && oe <= te {
        (OverlapCase::OtherLeads, 0.0, oe - ts)
    } else if os <= ts && ts <= te && te <= oe {
        (OverlapCase::OwnInside, 0.0, te - ts)
    } else if ts <= os && os <= oe && oe <= te {
        (OverlapCase::OtherInside, os - ts, oe - ts)
    } else {
        return None;
    };
    Some(Overlap {
        case,
        y_start,
        y_end,
    })
}

/// Intersects `own` (of the camera with axis `own_axis`) with `other`.
///
/// `center_pair` holds the dot products of the two cameras' axis vectors.
/// Every degenerate configuration yields `None`.
pub fn intersect_rays(
    own: &Ray,
    own_axis: &RayAxis,
    other: &Ray,
    other_axis: &RayAxis,
    center_pair: &LinePair,
    params: &IntersectionConfig,
) -> Option<IntersectionRecord> {
    // 1. centre lines too far apart for the strips to touch
    let reach = 0.5 * (own.ray_width + other.ray_width);
    let w = own.origin - other.origin;
    if line_distance_sq(&w, &own_axis.vector, &other_axis.vector, center_pair) > reach * reach {
        return None;
    }

    // 2. line shared by both planes
    let PlaneIntersection::Line { origin, direction } = plane_intersection(
        &own.normal,
        &other.normal,
        &own.origin,
        &other.origin,
        params.parallel_plane_tolerance,
    ) else {
        return None;
    };
    let u = direction.try_normalize(f32::EPSILON)?;

    // 3. where the line crosses the edges of both strips
    let other_pair = LinePair::new(&u, &other_axis.vector);
    if other_pair.d < params.singular_threshold {
        return None;
    }
    let mut other_start = line_collision(&(origin - other.origin_start), &u, &other_axis.vector, &other_pair);
    let mut other_end = line_collision(&(origin - other.origin_end), &u, &other_axis.vector, &other_pair);

    let own_pair = LinePair::new(&u, &own_axis.vector);
    if own_pair.d < params.singular_threshold {
        return None;
    }
    let (mut own_start, mut t_start) =
        line_collision_full(&(origin - own.origin_start), &u, &own_axis.vector, &own_pair);
    let (mut own_end, mut t_end) =
        line_collision_full(&(origin - own.origin_end), &u, &own_axis.vector, &own_pair);

    // 4. order both intervals and classify the overlap
    if own_end < own_start {
        std::mem::swap(&mut own_start, &mut own_end);
        std::mem::swap(&mut t_start, &mut t_end);
    }
    if other_end < other_start {
        std::mem::swap(&mut other_start, &mut other_end);
    }
    let overlap = classify_overlap((own_start, own_end), (other_start, other_end))?;

    // 5. convert positions on the line into (length, width) on the own ray
    let forward = &own_axis.forward;
    let angle = u.dot(&forward.cross(&own.normal)).atan2(u.dot(forward));
    let (sin, cos) = angle.sin_cos();
    let base = t_start * own_axis.length;
    let mut x_start = base + overlap.y_start * cos;
    let mut x_end = base + overlap.y_end * cos;
    if x_start - x_end > own.ray_width {
        x_start = x_end + own.ray_width;
    } else if x_end - x_start > own.ray_width {
        x_end = x_start + own.ray_width;
    }

    // 6. polarity: starting on the object side of the other plane means the
    // crossing leaves the object
    let own_side = (own.origin_start - other.origin_start).dot(&other.normal) > 0.0;
    let entering = if own_side {
        !other.inside_is_on_the_right
    } else {
        other.inside_is_on_the_right
    };

    Some(IntersectionRecord {
        x_start,
        x_end,
        y_start: (overlap.y_start * sin).abs(),
        y_end: (overlap.y_end * sin).abs(),
        entering,
        tex: other.tex(),
    })
}
