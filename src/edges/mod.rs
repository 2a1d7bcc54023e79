//! Contour edge tracing over the keypoint grid.
//!
//! The keypoint grid is walked as an implicit 8-connected graph: every cell
//! holding a keypoint is a node, its 8 grid neighbours are the candidate
//! edges. The walk is a depth-first search with an explicit stack of
//! `(cell, segment start pixel, incoming direction)` entries:
//!
//! - The first cell of a walk probes only the forward half-plane (E, SE, S,
//!   SW) and only when it is not on the grid border.
//! - Every later cell probes the incoming direction and its two 45°
//!   neighbours. The straight continuation is pushed last so it is popped
//!   first, which keeps straight contour runs together.
//! - Popping a cell that still holds a keypoint emits the segment from the
//!   parent's keypoint to this cell's keypoint, then consumes the cell.
//!
//! Orientation
//! - The inside/outside counts of the cells to the walker's right and left
//!   decide which side holds the object. When the immediate neighbours
//!   differ by no more than a third of the cell area, the cells two steps
//!   away are compared instead; if those are also too similar the segment is
//!   dropped. Segments ending within two cells of the grid border are
//!   dropped as well.
//!
//! Notes
//! - Consumed cells are never revisited, so the walk ends after
//!   O(keypoint cells) pops regardless of branching.
//! - Consecutive segments in the output are chained (`end == next.start`)
//!   whenever the walk continued from the previous cell; the order is
//!   otherwise an artifact of the scan.
//! - The optional merge pass only fuses existing segments.
mod direction;
mod merge;

pub use direction::GridDirection;
pub use merge::merge_segments;

use crate::contour::KeypointGrid;
use log::debug;
use serde::Serialize;

/// Oriented contour edge between two linear frame pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeSegment {
    pub start: usize,
    pub end: usize,
    /// The object lies to the right when walking start → end in the image.
    pub inside_is_on_the_right: bool,
}

/// Counters of one tracing pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TraceStats {
    pub keypoint_cells: usize,
    pub visited: usize,
    pub pushes: usize,
    pub emitted: usize,
    pub dropped: usize,
}

#[derive(Clone, Copy, Debug)]
struct WalkStep {
    cell: usize,
    segment_start: usize,
    direction: Option<GridDirection>,
}

/// Reusable tracing stage.
#[derive(Debug, Default)]
pub struct EdgeTracer {
    merge_tolerance: Option<f32>,
    remaining: Vec<Option<u32>>,
    stack: Vec<WalkStep>,
    raw: Vec<EdgeSegment>,
    merged: Vec<EdgeSegment>,
    stats: TraceStats,
}

impl EdgeTracer {
    pub fn new(merge_tolerance: Option<f32>) -> Self {
        Self {
            merge_tolerance: merge_tolerance.filter(|t| t.is_finite() && *t >= 0.0),
            ..Default::default()
        }
    }

    pub fn stats(&self) -> TraceStats {
        self.stats
    }

    /// Segments of the last pass (merged when merging is enabled).
    pub fn segments(&self) -> &[EdgeSegment] {
        if self.merge_tolerance.is_some() {
            &self.merged
        } else {
            &self.raw
        }
    }

    /// Traces all contours of `grid`. The grid itself is left untouched; the
    /// walk consumes a private copy of the keypoints.
    pub fn trace(&mut self, grid: &KeypointGrid) -> &[EdgeSegment] {
        self.remaining.clone_from(&grid.keypoints);
        self.stack.clear();
        self.raw.clear();
        self.stats = TraceStats {
            keypoint_cells: grid.keypoint_count(),
            ..Default::default()
        };

        for start in 0..grid.len() {
            if self.remaining[start].is_none() {
                continue;
            }
            self.stack.push(WalkStep {
                cell: start,
                segment_start: 0,
                direction: None,
            });
            self.stats.pushes += 1;
            self.walk(grid);
        }

        if let Some(tol) = self.merge_tolerance {
            merge_segments(&self.raw, grid.frame_w, tol, &mut self.merged);
        }
        debug!(
            "edges: {} keypoint cells, {} segments ({} dropped), {} after merge",
            self.stats.keypoint_cells,
            self.stats.emitted,
            self.stats.dropped,
            self.segments().len()
        );
        self.segments()
    }

    fn walk(&mut self, grid: &KeypointGrid) {
        let (grid_w, grid_h) = (grid.grid_w, grid.grid_h);
        while let Some(step) = self.stack.pop() {
            let Some(offset) = self.remaining[step.cell] else {
                continue;
            };
            let pixel = grid.pixel_of(step.cell, offset as usize);
            if let Some(dir) = step.direction {
                match orientation(grid, step.cell, dir) {
                    Some(inside_is_on_the_right) => {
                        self.raw.push(EdgeSegment {
                            start: step.segment_start,
                            end: pixel,
                            inside_is_on_the_right,
                        });
                        self.stats.emitted += 1;
                    }
                    None => self.stats.dropped += 1,
                }
            }
            self.remaining[step.cell] = None;
            self.stats.visited += 1;

            let (probes, probe_count) = match step.direction {
                None if is_interior(step.cell, grid_w, grid_h) => (GridDirection::FORWARD, 4),
                None => (GridDirection::FORWARD, 0),
                Some(dir) => ([dir.turned(-1), dir.turned(1), dir, dir], 3),
            };
            for &dir in &probes[..probe_count] {
                let Some(next) = dir.neighbor(step.cell, grid_w, grid_h) else {
                    continue;
                };
                if self.remaining[next].is_some() {
                    self.stack.push(WalkStep {
                        cell: next,
                        segment_start: pixel,
                        direction: Some(dir),
                    });
                    self.stats.pushes += 1;
                }
            }
        }
    }
}

#[inline]
fn is_interior(cell: usize, grid_w: usize, grid_h: usize) -> bool {
    let (x, y) = (cell % grid_w, cell / grid_w);
    x > 0 && y > 0 && x + 1 < grid_w && y + 1 < grid_h
}

/// Decides which side of a segment arriving at `cell` along `dir` holds the
/// object, or `None` when that cannot be told reliably.
fn orientation(grid: &KeypointGrid, cell: usize, dir: GridDirection) -> Option<bool> {
    let (gx, gy) = ((cell % grid.grid_w) as isize, (cell / grid.grid_w) as isize);
    let (gw, gh) = (grid.grid_w as isize, grid.grid_h as isize);
    if gx < 2 || gy < 2 || gx + 2 >= gw || gy + 2 >= gh {
        return None;
    }
    let (dx, dy) = dir.right().offset();
    let count = |k: isize| grid.inside_outside[((gx + k * dx) + (gy + k * dy) * gw) as usize] as i64;
    let max_dif = (grid.cell * grid.cell / 3) as i64;
    for reach in [1, 2] {
        let (right, left) = (count(reach), count(-reach));
        if (right - left).abs() > max_dif {
            // fewer background pixels on the right means the object is there
            return Some(right < left);
        }
    }
    None
}

#[cfg(test)]
mod tests;
