use super::buffers::IntersectionRecord;
use crate::geometry::Vec3;
use crate::rays::Ray;
use crate::types::{scale_point, ModelQuad};

/// Walks the sorted records of one ray and appends its surface quads.
///
/// An entering record met while outside becomes the pending start; an
/// exiting record met while inside closes a quad spanning the full ray width
/// between the two records' length positions. Any other combination only
/// carries the state forward, so a second "enter" is ignored and a ray may
/// end while still inside.
pub fn emit_ray_quads<'a>(
    ray: &Ray,
    forward: &Vec3,
    records: impl IntoIterator<Item = &'a IntersectionRecord>,
    out: &mut Vec<ModelQuad>,
) -> usize {
    let before = out.len();
    let mut pending: Option<&IntersectionRecord> = None;
    for record in records {
        match (pending, record.entering) {
            (None, true) => pending = Some(record),
            (Some(start), false) => {
                out.push(surface_quad(ray, forward, start, record));
                pending = None;
            }
            _ => {}
        }
    }
    out.len() - before
}

fn surface_quad(
    ray: &Ray,
    forward: &Vec3,
    start: &IntersectionRecord,
    end: &IntersectionRecord,
) -> ModelQuad {
    let width = ray.ray_width;
    let start_near = ray.point(forward, start.x_start, 0.0);
    let start_far = ray.point(forward, start.x_end, width);
    let end_near = ray.point(forward, end.x_start, 0.0);
    let end_far = ray.point(forward, end.x_end, width);
    let (l, c) = (start.tex, end.tex);
    ModelQuad {
        corners: [
            scale_point(&start_near),
            scale_point(&end_near),
            scale_point(&start_far),
            scale_point(&end_far),
        ],
        uvs: [l[0], l[1], c[0], c[1], l[2], l[3], c[2], c[3]],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ray() -> Ray {
        let origin_start = Vec3::new(-20.0, 8.0, -300.0);
        let origin_end = Vec3::new(-20.0, 0.0, -300.0);
        Ray {
            origin_start,
            origin_end,
            origin: (origin_start + origin_end) * 0.5,
            dir_along_y: Vec3::new(0.0, -1.0, 0.0),
            ray_width: 8.0,
            normal: Vec3::new(-1.0, 0.0, 0.0),
            tex_start: [0.0, 0.0],
            tex_end: [0.0, 8.0],
            inside_is_on_the_right: false,
        }
    }

    fn record(x: f32, entering: bool, tex: f32) -> IntersectionRecord {
        IntersectionRecord {
            x_start: x,
            x_end: x,
            y_start: 0.0,
            y_end: 8.0,
            entering,
            tex: [tex, tex + 1.0, tex + 2.0, tex + 3.0],
        }
    }

    #[test]
    fn enter_then_exit_emits_one_full_width_quad() {
        let ray = ray();
        let forward = Vec3::z();
        let records = [record(280.0, true, 10.0), record(320.0, false, 20.0)];
        let mut out = Vec::new();
        assert_eq!(emit_ray_quads(&ray, &forward, &records, &mut out), 1);
        let quad = out[0];
        assert_eq!(quad.corners[0], [-2000, 800, -2000]);
        assert_eq!(quad.corners[1], [-2000, 800, 2000]);
        assert_eq!(quad.corners[2], [-2000, 0, -2000]);
        assert_eq!(quad.corners[3], [-2000, 0, 2000]);
        assert_eq!(quad.uvs, [10.0, 11.0, 20.0, 21.0, 12.0, 13.0, 22.0, 23.0]);
    }

    #[test]
    fn malformed_sequences_carry_state_forward() {
        let ray = ray();
        let forward = Vec3::z();
        let mut out = Vec::new();
        // exit before any enter, then enter twice, then exit
        let records = [
            record(100.0, false, 0.0),
            record(200.0, true, 0.0),
            record(250.0, true, 0.0),
            record(300.0, false, 0.0),
            record(400.0, true, 0.0), // dangling
        ];
        assert_eq!(emit_ray_quads(&ray, &forward, &records, &mut out), 1);
        assert_eq!(out[0].corners[0][2], -10000);
        assert_eq!(out[0].corners[1][2], 0);
    }

    #[test]
    fn emission_is_repeatable() {
        let ray = ray();
        let forward = Vec3::z();
        let records = [
            record(280.0, true, 1.0),
            record(300.0, false, 2.0),
            record(310.0, true, 3.0),
            record(330.0, false, 4.0),
        ];
        let mut first = Vec::new();
        let mut second = Vec::new();
        emit_ray_quads(&ray, &forward, &records, &mut first);
        emit_ray_quads(&ray, &forward, &records, &mut second);
        assert_eq!(first.len(), 2);
        assert_eq!(first, second);
    }
}
