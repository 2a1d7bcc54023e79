//! Closed-form geometry used by the ray builder and the cross-camera
//! intersector.
//!
//! Overview
//! - Line–line closest distance and the closest-point parameters ("line
//!   collision") for two infinite 3D lines `P(s) = P0 + s·u` and
//!   `Q(t) = Q0 + t·v`. Callers precompute the dot products `a = u·u`,
//!   `b = u·v`, `c = v·v` and the denominator `D = a·c − b²` because the same
//!   direction pairs are reused for every ray of a camera pair.
//! - Plane–plane intersection returning the shared line.
//! - Small colour helpers (RGB ↔ HSV) used by the preview renderer.
//!
//! Notes
//! - None of the line helpers guard against `D ≈ 0`; the intersector rejects
//!   near-singular systems with its own threshold before calling them.
//! - The plane test measures the cross product with the L1 norm and compares
//!   it against a caller-supplied tolerance instead of testing for exact
//!   parallelism.
use nalgebra::Vector3;

pub type Vec3 = Vector3<f32>;

/// Precomputed dot products of two line directions.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LinePair {
    pub a: f32,
    pub b: f32,
    pub c: f32,
    pub d: f32,
}

impl LinePair {
    pub fn new(u: &Vec3, v: &Vec3) -> Self {
        let a = u.dot(u);
        let b = u.dot(v);
        let c = v.dot(v);
        Self {
            a,
            b,
            c,
            d: a * c - b * b,
        }
    }
}

/// Squared closest distance between the lines `P0 + s·u` and `Q0 + t·v`,
/// where `w = P0 − Q0`.
#[inline]
pub fn line_distance_sq(w: &Vec3, u: &Vec3, v: &Vec3, pair: &LinePair) -> f32 {
    let (s, t) = line_collision_full(w, u, v, pair);
    (w + u * s - v * t).norm_squared()
}

/// Parameter `s` of the point on `P0 + s·u` closest to the second line.
#[inline]
pub fn line_collision(w: &Vec3, u: &Vec3, v: &Vec3, pair: &LinePair) -> f32 {
    let d = u.dot(w);
    let e = v.dot(w);
    (pair.b * e - pair.c * d) / pair.d
}

/// Both closest-point parameters `(s, t)`.
#[inline]
pub fn line_collision_full(w: &Vec3, u: &Vec3, v: &Vec3, pair: &LinePair) -> (f32, f32) {
    let d = u.dot(w);
    let e = v.dot(w);
    let s = (pair.b * e - pair.c * d) / pair.d;
    let t = (pair.a * e - pair.b * d) / pair.d;
    (s, t)
}

/// Result of intersecting two planes given in normal/base-point form.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PlaneIntersection {
    /// Parallel planes that do not touch.
    Disjoint,
    /// Parallel planes lying on top of each other.
    Coincident,
    /// The shared line; `direction` is `n_a × n_b` and not normalized.
    Line { origin: Vec3, direction: Vec3 },
}

/// Intersects the planes `(n_a, base_a)` and `(n_b, base_b)`.
///
/// Planes whose normals' cross product has an L1 magnitude below `tolerance`
/// are treated as parallel.
pub fn plane_intersection(
    n_a: &Vec3,
    n_b: &Vec3,
    base_a: &Vec3,
    base_b: &Vec3,
    tolerance: f32,
) -> PlaneIntersection {
    let u = n_a.cross(n_b);
    let (ax, ay, az) = (u.x.abs(), u.y.abs(), u.z.abs());
    if ax + ay + az < tolerance {
        return if n_a.dot(&(base_b - base_a)).abs() < 1e-3 {
            PlaneIntersection::Coincident
        } else {
            PlaneIntersection::Disjoint
        };
    }

    let d1 = -n_a.dot(base_a);
    let d2 = -n_b.dot(base_b);

    // Solve with the dominant coordinate of the line direction set to zero.
    let origin = if ax >= ay && ax >= az {
        Vec3::new(
            0.0,
            (d2 * n_a.z - d1 * n_b.z) / u.x,
            (d1 * n_b.y - d2 * n_a.y) / u.x,
        )
    } else if ay >= az {
        Vec3::new(
            (d1 * n_b.z - d2 * n_a.z) / u.y,
            0.0,
            (d2 * n_a.x - d1 * n_b.x) / u.y,
        )
    } else {
        Vec3::new(
            (d2 * n_a.y - d1 * n_b.y) / u.z,
            (d1 * n_b.x - d2 * n_a.x) / u.z,
            0.0,
        )
    };
    PlaneIntersection::Line {
        origin,
        direction: u,
    }
}

/// Converts an RGB pixel to HSV: hue in degrees [0, 360), saturation and
/// value in [0, 1].
pub fn rgb_to_hsv(rgb: [u8; 3]) -> [f32; 3] {
    let r = rgb[0] as f32 / 255.0;
    let g = rgb[1] as f32 / 255.0;
    let b = rgb[2] as f32 / 255.0;
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let chroma = max - min;

    let hue = if chroma <= f32::EPSILON {
        0.0
    } else if max == r {
        60.0 * ((g - b) / chroma).rem_euclid(6.0)
    } else if max == g {
        60.0 * ((b - r) / chroma + 2.0)
    } else {
        60.0 * ((r - g) / chroma + 4.0)
    };
    let saturation = if max <= f32::EPSILON { 0.0 } else { chroma / max };
    [hue, saturation, max]
}

/// Inverse of [`rgb_to_hsv`].
pub fn hsv_to_rgb(hsv: [f32; 3]) -> [u8; 3] {
    let [h, s, v] = hsv;
    let c = v * s;
    let hp = h.rem_euclid(360.0) / 60.0;
    let x = c * (1.0 - (hp.rem_euclid(2.0) - 1.0).abs());
    let (r, g, b) = match hp as u32 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };
    let m = v - c;
    let to_u8 = |ch: f32| ((ch + m) * 255.0).round().clamp(0.0, 255.0) as u8;
    [to_u8(r), to_u8(g), to_u8(b)]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: f32, b: f32, tol: f32) -> bool {
        (a - b).abs() < tol
    }

    #[test]
    fn skew_lines_distance_matches_offset() {
        // x-axis and a line parallel to y shifted by 5 along z
        let u = Vec3::new(1.0, 0.0, 0.0);
        let v = Vec3::new(0.0, 1.0, 0.0);
        let p0 = Vec3::new(0.0, 0.0, 0.0);
        let q0 = Vec3::new(3.0, -2.0, 5.0);
        let pair = LinePair::new(&u, &v);
        let w = p0 - q0;
        assert!(approx_eq(line_distance_sq(&w, &u, &v, &pair), 25.0, 1e-4));

        let (s, t) = line_collision_full(&w, &u, &v, &pair);
        assert!(approx_eq(s, 3.0, 1e-5), "s={s}");
        assert!(approx_eq(t, 2.0, 1e-5), "t={t}");
        assert!(approx_eq(line_collision(&w, &u, &v, &pair), s, 1e-6));
    }

    #[test]
    fn collision_parameters_scale_with_direction_length() {
        let u = Vec3::new(0.0, 0.0, 1.0);
        let v = Vec3::new(640.0, 0.0, 0.0);
        let pair = LinePair::new(&u, &v);
        let w = Vec3::new(0.0, 0.0, 0.0) - Vec3::new(-320.0, 0.0, 7.0);
        let (s, t) = line_collision_full(&w, &u, &v, &pair);
        assert!(approx_eq(s, 7.0, 1e-4));
        assert!(approx_eq(t, 0.5, 1e-6));
    }

    #[test]
    fn perpendicular_planes_share_a_line() {
        let n_a = Vec3::new(1.0, 0.0, 0.0);
        let n_b = Vec3::new(0.0, 0.0, 1.0);
        let base_a = Vec3::new(-20.0, 4.0, 9.0);
        let base_b = Vec3::new(3.0, -1.0, 15.0);
        match plane_intersection(&n_a, &n_b, &base_a, &base_b, 1.0) {
            PlaneIntersection::Line { origin, direction } => {
                assert!(approx_eq(origin.x, -20.0, 1e-4), "origin={origin:?}");
                assert!(approx_eq(origin.z, 15.0, 1e-4), "origin={origin:?}");
                assert!(approx_eq(direction.normalize().y.abs(), 1.0, 1e-6));
                // any point on the line lies on both planes
                let p = origin + direction * 3.5;
                assert!(approx_eq(n_a.dot(&(p - base_a)), 0.0, 1e-3));
                assert!(approx_eq(n_b.dot(&(p - base_b)), 0.0, 1e-3));
            }
            other => panic!("expected a line, got {other:?}"),
        }
    }

    #[test]
    fn oblique_planes_line_lies_on_both() {
        let n_a = Vec3::new(1.0, 1.0, 0.0).normalize();
        let n_b = Vec3::new(0.0, 1.0, 1.0).normalize();
        let base_a = Vec3::new(1.0, 2.0, 3.0);
        let base_b = Vec3::new(-4.0, 0.5, 2.0);
        match plane_intersection(&n_a, &n_b, &base_a, &base_b, 0.5) {
            PlaneIntersection::Line { origin, direction } => {
                for s in [-10.0f32, 0.0, 25.0] {
                    let p = origin + direction * s;
                    assert!(approx_eq(n_a.dot(&(p - base_a)), 0.0, 1e-3));
                    assert!(approx_eq(n_b.dot(&(p - base_b)), 0.0, 1e-3));
                }
            }
            other => panic!("expected a line, got {other:?}"),
        }
    }

    #[test]
    fn parallel_planes_are_rejected() {
        let n = Vec3::new(0.0, 1.0, 0.0);
        let a = Vec3::new(0.0, 0.0, 0.0);
        assert_eq!(
            plane_intersection(&n, &n, &a, &Vec3::new(5.0, 0.0, 1.0), 1.0),
            PlaneIntersection::Coincident
        );
        assert_eq!(
            plane_intersection(&n, &n, &a, &Vec3::new(0.0, 2.0, 0.0), 1.0),
            PlaneIntersection::Disjoint
        );
    }

    #[test]
    fn shallow_angle_is_below_tolerance() {
        let n_a = Vec3::new(1.0, 0.0, 0.0);
        let n_b = Vec3::new(1.0, 0.2, 0.0).normalize();
        let base = Vec3::zeros();
        assert_ne!(
            plane_intersection(&n_a, &n_b, &base, &base, 0.5),
            PlaneIntersection::Disjoint
        );
        assert!(!matches!(
            plane_intersection(&n_a, &n_b, &base, &base, 1.0),
            PlaneIntersection::Line { .. }
        ));
    }

    #[test]
    fn hsv_of_primaries() {
        let red = rgb_to_hsv([255, 0, 0]);
        assert!(approx_eq(red[0], 0.0, 1e-3) && approx_eq(red[1], 1.0, 1e-6));
        let green = rgb_to_hsv([0, 255, 0]);
        assert!(approx_eq(green[0], 120.0, 1e-3));
        let blue = rgb_to_hsv([0, 0, 255]);
        assert!(approx_eq(blue[0], 240.0, 1e-3));
        let gray = rgb_to_hsv([128, 128, 128]);
        assert!(approx_eq(gray[1], 0.0, 1e-6));
        assert!(approx_eq(gray[2], 128.0 / 255.0, 1e-6));
    }

    #[test]
    fn hsv_back_to_rgb() {
        for px in [[12u8, 200, 77], [250, 250, 3], [90, 10, 180], [0, 0, 0]] {
            assert_eq!(hsv_to_rgb(rgb_to_hsv(px)), px, "pixel {px:?}");
        }
    }
}
