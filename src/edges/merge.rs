use super::EdgeSegment;
use crate::angle::{heading_difference, pixel_heading};

/// Fuses runs of chained segments that keep roughly the same heading.
///
/// A segment extends the current run when it starts where the run ends,
/// shares its orientation flag, and its own heading differs from the heading
/// of the extended run (run start → segment end) by at most `tolerance`
/// radians. `out` never holds more segments than `segments`.
pub fn merge_segments(
    segments: &[EdgeSegment],
    frame_w: usize,
    tolerance: f32,
    out: &mut Vec<EdgeSegment>,
) {
    out.clear();
    let mut run: Option<EdgeSegment> = None;
    for seg in segments {
        let extends = run.map_or(false, |current| {
            current.end == seg.start
                && current.inside_is_on_the_right == seg.inside_is_on_the_right
                && heading_difference(
                    pixel_heading(seg.start, seg.end, frame_w),
                    pixel_heading(current.start, seg.end, frame_w),
                ) <= tolerance
        });
        if extends {
            if let Some(current) = run.as_mut() {
                current.end = seg.end;
            }
        } else if let Some(done) = run.replace(*seg) {
            out.push(done);
        }
    }
    out.extend(run);
}
