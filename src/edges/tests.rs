use super::*;
use crate::contour::ContourExtractor;
use crate::image::BinaryMask;

fn rect_mask(w: usize, h: usize, x0: usize, y0: usize, x1: usize, y1: usize) -> BinaryMask {
    BinaryMask::from_fn(w, h, |x, y| !(x >= x0 && x < x1 && y >= y0 && y < y1))
}

fn grid_for(mask: &BinaryMask, cell: usize) -> KeypointGrid {
    ContourExtractor::new(cell, 5).compute(mask).clone()
}

#[test]
fn uniform_grid_has_no_segments() {
    let grid = grid_for(&BinaryMask::new(64, 64), 8);
    let mut tracer = EdgeTracer::new(None);
    assert!(tracer.trace(&grid).is_empty());
    assert_eq!(tracer.stats().visited, 0);
}

#[test]
fn every_keypoint_cell_is_visited_once_and_pushes_are_bounded() {
    let grid = grid_for(&rect_mask(256, 256, 64, 72, 192, 180), 8);
    let mut tracer = EdgeTracer::new(None);
    tracer.trace(&grid);
    let stats = tracer.stats();
    assert!(stats.keypoint_cells > 40, "stats={stats:?}");
    assert_eq!(stats.visited, stats.keypoint_cells);
    assert!(
        stats.pushes <= 8 * stats.keypoint_cells,
        "pushes {} exceed bound for {} cells",
        stats.pushes,
        stats.keypoint_cells
    );
    // the grid handed in keeps its keypoints for previews
    assert_eq!(grid.keypoint_count(), stats.keypoint_cells);
}

#[test]
fn consecutive_segments_mostly_chain() {
    let grid = grid_for(&rect_mask(256, 256, 64, 64, 192, 192), 8);
    let mut tracer = EdgeTracer::new(None);
    let segments = tracer.trace(&grid).to_vec();
    assert!(segments.len() > 20, "got {} segments", segments.len());
    let chained = segments
        .windows(2)
        .filter(|pair| pair[0].end == pair[1].start)
        .count();
    assert!(
        chained * 2 > segments.len(),
        "only {chained} of {} segments chain",
        segments.len()
    );
}

#[test]
fn orientation_points_at_the_object() {
    let (w, h) = (256usize, 256usize);
    let mask = rect_mask(w, h, 64, 72, 192, 180);
    let grid = grid_for(&mask, 8);
    let mut tracer = EdgeTracer::new(None);
    let segments = tracer.trace(&grid).to_vec();

    let mut checked = 0;
    for seg in &segments {
        let (sx, sy) = ((seg.start % w) as f32, (seg.start / w) as f32);
        let (ex, ey) = ((seg.end % w) as f32, (seg.end / w) as f32);
        let axis_aligned = sx == ex || sy == ey;
        let len = ((ex - sx).powi(2) + (ey - sy).powi(2)).sqrt();
        if !axis_aligned || len < 4.0 {
            continue;
        }
        let (dx, dy) = ((ex - sx) / len, (ey - sy) / len);
        // image right-hand side of the walking direction
        let (rx, ry) = (-dy, dx);
        let (mx, my) = ((sx + ex) / 2.0, (sy + ey) / 2.0);
        let sample = |k: f32| {
            let x = (mx + k * rx).round() as usize;
            let y = (my + k * ry).round() as usize;
            !mask.is_background(x, y)
        };
        let (object_right, object_left) = (sample(6.0), sample(-6.0));
        if object_right == object_left {
            continue;
        }
        assert_eq!(
            seg.inside_is_on_the_right, object_right,
            "segment {seg:?} disagrees with the mask"
        );
        checked += 1;
    }
    assert!(checked >= 20, "only {checked} segments checked");
}

#[test]
fn segments_touching_the_border_are_dropped() {
    // object spans the full height, so its edge runs into the top and bottom border
    let mask = BinaryMask::from_fn(64, 64, |x, _| x < 36);
    let grid = grid_for(&mask, 8);
    let mut tracer = EdgeTracer::new(None);
    let segments = tracer.trace(&grid).to_vec();
    assert!(tracer.stats().dropped > 0);
    for seg in segments {
        let y = seg.end / 64;
        assert!((16..48).contains(&y), "segment end row {y} lies in the border band");
    }
}

#[test]
fn merge_pass_shortens_the_list() {
    let grid = grid_for(&rect_mask(256, 256, 64, 64, 192, 192), 8);
    let mut plain = EdgeTracer::new(None);
    let raw = plain.trace(&grid).len();
    let mut merging = EdgeTracer::new(Some(0.25));
    let merged = merging.trace(&grid).len();
    assert!(merged < raw, "merged {merged} vs raw {raw}");
    assert!(merged > 0);
}

#[test]
fn merge_fuses_only_straight_chains() {
    let w = 100;
    let seg = |start: usize, end: usize| EdgeSegment {
        start,
        end,
        inside_is_on_the_right: true,
    };
    let input = vec![
        seg(0, 10),
        seg(10, 20),
        seg(20, 30),
        seg(30, 30 + 10 * w), // turns south
        seg(500, 510),        // not chained
        EdgeSegment {
            start: 510,
            end: 520,
            inside_is_on_the_right: false,
        },
    ];
    let mut out = Vec::new();
    merge_segments(&input, w, 0.25, &mut out);
    assert_eq!(
        out,
        vec![
            seg(0, 30),
            seg(30, 30 + 10 * w),
            seg(500, 510),
            EdgeSegment {
                start: 510,
                end: 520,
                inside_is_on_the_right: false,
            },
        ]
    );
}

#[test]
fn direction_helpers() {
    assert_eq!(GridDirection::East.right(), GridDirection::South);
    assert_eq!(GridDirection::North.right(), GridDirection::East);
    assert_eq!(GridDirection::East.turned(-1), GridDirection::NorthEast);
    assert_eq!(GridDirection::NorthEast.turned(1), GridDirection::East);
    assert_eq!(GridDirection::West.neighbor(0, 4, 4), None);
    assert_eq!(GridDirection::SouthEast.neighbor(0, 4, 4), Some(5));
    assert_eq!(GridDirection::North.neighbor(13, 4, 4), Some(9));
}
