//! Angle utilities used by the edge merge pass and the geometry helpers.

/// Heading of the 2D vector `(dx, dy)` in radians, in (-π, π].
#[inline]
pub fn heading(dx: f32, dy: f32) -> f32 {
    dy.atan2(dx)
}

/// Smallest unsigned difference between two headings, in [0, π].
///
/// Unlike line orientations, headings are directed: opposite directions are
/// π apart.
#[inline]
pub fn heading_difference(a: f32, b: f32) -> f32 {
    let diff = (a - b).rem_euclid(std::f32::consts::TAU);
    if diff > std::f32::consts::PI {
        std::f32::consts::TAU - diff
    } else {
        diff
    }
}

/// Heading of the pixel vector between two linear pixel coordinates.
#[inline]
pub fn pixel_heading(from: usize, to: usize, width: usize) -> f32 {
    let (fx, fy) = ((from % width) as f32, (from / width) as f32);
    let (tx, ty) = ((to % width) as f32, (to / width) as f32);
    heading(tx - fx, ty - fy)
}
