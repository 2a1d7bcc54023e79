//! Debug snapshots of the per-camera stages.
//!
//! A preview is an `RgbFrame` rendered from one stage's output and scaled by
//! `preview_scale`. Workers only render one when a kind other than
//! `Disabled` is selected for their camera.
use crate::angle::pixel_heading;
use crate::contour::KeypointGrid;
use crate::edges::EdgeSegment;
use crate::geometry::hsv_to_rgb;
use crate::image::{BinaryMask, RgbFrame};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PreviewKind {
    #[default]
    Disabled,
    Live,
    Background,
    Foreground,
    BinaryMask,
    InsideOutside,
    ContourMask,
    Keypoints,
    Segments,
    SegmentsOverlay,
}

impl PreviewKind {
    pub const ALL: [PreviewKind; 10] = [
        PreviewKind::Disabled,
        PreviewKind::Live,
        PreviewKind::Background,
        PreviewKind::Foreground,
        PreviewKind::BinaryMask,
        PreviewKind::InsideOutside,
        PreviewKind::ContourMask,
        PreviewKind::Keypoints,
        PreviewKind::Segments,
        PreviewKind::SegmentsOverlay,
    ];

    pub fn is_enabled(self) -> bool {
        self != PreviewKind::Disabled
    }
}

/// Stage outputs a preview can be rendered from. Missing entries make the
/// corresponding kinds unavailable.
#[derive(Clone, Copy, Debug)]
pub struct PreviewInputs<'a> {
    pub frame: &'a RgbFrame,
    pub background: Option<&'a RgbFrame>,
    pub mask: Option<&'a BinaryMask>,
    pub grid: Option<&'a KeypointGrid>,
    pub boundary: &'a [bool],
    pub segments: &'a [EdgeSegment],
}

const WHITE: [u8; 3] = [255, 255, 255];
const KEYPOINT: [u8; 3] = [40, 255, 40];

/// Renders `kind` at `scale`; `None` when disabled or when the stage output
/// it shows does not exist yet.
pub fn render_preview(kind: PreviewKind, inputs: &PreviewInputs<'_>, scale: f32) -> Option<RgbFrame> {
    let (w, h) = inputs.frame.dims();
    let full = match kind {
        PreviewKind::Disabled => return None,
        PreviewKind::Live => inputs.frame.clone(),
        PreviewKind::Background => inputs.background?.clone(),
        PreviewKind::Foreground => {
            let mask = inputs.mask?;
            let mut out = RgbFrame::new(w, h);
            for y in 0..h.min(mask.h) {
                for x in 0..w.min(mask.w) {
                    if !mask.is_background(x, y) {
                        out.set(x, y, inputs.frame.get(x, y));
                    }
                }
            }
            out
        }
        PreviewKind::BinaryMask => {
            let mask = inputs.mask?;
            let mut out = RgbFrame::new(mask.w, mask.h);
            for (i, &bg) in mask.data.iter().enumerate() {
                if bg {
                    out.set(i % mask.w, i / mask.w, WHITE);
                }
            }
            out
        }
        PreviewKind::InsideOutside => inside_outside_image(inputs.grid?, w, h),
        PreviewKind::ContourMask => {
            let mut out = RgbFrame::new(w, h);
            for (i, _) in inputs.boundary.iter().enumerate().filter(|&(_, &b)| b) {
                if i < w * h {
                    out.set(i % w, i / w, WHITE);
                }
            }
            out
        }
        PreviewKind::Keypoints => {
            let grid = inputs.grid?;
            let mut out = RgbFrame::new(w, h);
            for cell in 0..grid.len() {
                if let Some(pixel) = grid.keypoint_pixel(cell) {
                    draw_cross(&mut out, pixel % w, pixel / w, KEYPOINT);
                }
            }
            out
        }
        PreviewKind::Segments => {
            let mut out = RgbFrame::new(w, h);
            draw_segments(&mut out, inputs.segments);
            out
        }
        PreviewKind::SegmentsOverlay => {
            let mut out = inputs.frame.clone();
            draw_segments(&mut out, inputs.segments);
            out
        }
    };
    Some(full.scaled(scale))
}

fn inside_outside_image(grid: &KeypointGrid, w: usize, h: usize) -> RgbFrame {
    let mut out = RgbFrame::new(w, h);
    let area = (grid.cell * grid.cell).max(1) as u32;
    for (cell, &count) in grid.inside_outside.iter().enumerate() {
        let v = (count.min(area) * 255 / area) as u8;
        let (gx, gy) = (cell % grid.grid_w, cell / grid.grid_w);
        for y in gy * grid.cell..((gy + 1) * grid.cell).min(h) {
            for x in gx * grid.cell..((gx + 1) * grid.cell).min(w) {
                out.set(x, y, [v, v, v]);
            }
        }
    }
    out
}

fn draw_cross(out: &mut RgbFrame, x: usize, y: usize, rgb: [u8; 3]) {
    let (x, y) = (x as i64, y as i64);
    for d in -2..=2 {
        out.put(x + d, y, rgb);
        out.put(x, y + d, rgb);
    }
}

/// Draws every segment coloured by its heading; the start pixel is marked
/// white so the walking direction is visible.
fn draw_segments(out: &mut RgbFrame, segments: &[EdgeSegment]) {
    let w = out.w.max(1);
    for seg in segments {
        let hue = pixel_heading(seg.start, seg.end, w).to_degrees().rem_euclid(360.0);
        let value = if seg.inside_is_on_the_right { 1.0 } else { 0.6 };
        let rgb = hsv_to_rgb([hue, 1.0, value]);
        let (x0, y0) = ((seg.start % w) as f32, (seg.start / w) as f32);
        let (x1, y1) = ((seg.end % w) as f32, (seg.end / w) as f32);
        let steps = (x1 - x0).abs().max((y1 - y0).abs()).ceil().max(1.0) as usize;
        for s in 0..=steps {
            let t = s as f32 / steps as f32;
            out.put(
                (x0 + (x1 - x0) * t).round() as i64,
                (y0 + (y1 - y0) * t).round() as i64,
                rgb,
            );
        }
        out.put(x0 as i64, y0 as i64, WHITE);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inputs<'a>(
        frame: &'a RgbFrame,
        mask: &'a BinaryMask,
        segments: &'a [EdgeSegment],
    ) -> PreviewInputs<'a> {
        PreviewInputs {
            frame,
            background: None,
            mask: Some(mask),
            grid: None,
            boundary: &[],
            segments,
        }
    }

    #[test]
    fn disabled_and_missing_stages_render_nothing() {
        let frame = RgbFrame::filled(8, 8, [1, 2, 3]);
        let mask = BinaryMask::new(8, 8);
        let inp = inputs(&frame, &mask, &[]);
        assert!(render_preview(PreviewKind::Disabled, &inp, 1.0).is_none());
        assert!(render_preview(PreviewKind::Background, &inp, 1.0).is_none());
        assert!(render_preview(PreviewKind::Keypoints, &inp, 1.0).is_none());
    }

    #[test]
    fn foreground_keeps_only_object_pixels() {
        let frame = RgbFrame::filled(4, 4, [9, 9, 9]);
        let mask = BinaryMask::from_fn(4, 4, |x, _| x < 2);
        let out = render_preview(PreviewKind::Foreground, &inputs(&frame, &mask, &[]), 1.0)
            .expect("preview");
        assert_eq!(out.get(0, 0), [0, 0, 0]);
        assert_eq!(out.get(3, 3), [9, 9, 9]);
    }

    #[test]
    fn previews_are_scaled() {
        let frame = RgbFrame::new(90, 60);
        let mask = BinaryMask::new(90, 60);
        let segments = [EdgeSegment {
            start: 10 + 10 * 90,
            end: 40 + 10 * 90,
            inside_is_on_the_right: true,
        }];
        let out = render_preview(PreviewKind::Segments, &inputs(&frame, &mask, &segments), 1.0 / 3.0)
            .expect("preview");
        assert_eq!(out.dims(), (30, 20));
        let full = render_preview(PreviewKind::SegmentsOverlay, &inputs(&frame, &mask, &segments), 1.0)
            .expect("preview");
        assert_eq!(full.get(10, 10), WHITE);
        assert_ne!(full.get(25, 10), [0, 0, 0]);
    }

    #[test]
    fn kinds_round_trip_through_json_names() {
        let kind: PreviewKind = serde_json::from_str("\"segments_overlay\"").expect("parse");
        assert_eq!(kind, PreviewKind::SegmentsOverlay);
        assert_eq!(PreviewKind::default(), PreviewKind::Disabled);
        assert_eq!(PreviewKind::ALL.iter().filter(|k| k.is_enabled()).count(), 9);
    }
}
