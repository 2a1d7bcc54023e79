//! Contour keypoints on a coarse grid.
//!
//! The mask is scanned in square cells of `cell × cell` pixels. A pixel is a
//! boundary pixel when its mask flag differs from its left or right
//! neighbour, or from the pixel above (not in the first row). The 3-neighbour
//! test is deliberate: the pixel below is covered by the next row's test.
//!
//! Per cell the extractor stores
//! - the keypoint: cell-local offset `cx + cy·cell` of the rounded centroid
//!   of the cell's boundary pixels, or `None` when fewer than
//!   `noise_tolerance` boundary pixels were found;
//! - the inside/outside count: how many background pixels the cell holds.
//!   Fewer background pixels means more of the object.
//!
//! Partial cells at the right and bottom frame edges are ignored.
use crate::image::BinaryMask;

/// Keypoints and inside/outside counts of one frame.
#[derive(Clone, Debug, Default)]
pub struct KeypointGrid {
    pub cell: usize,
    pub grid_w: usize,
    pub grid_h: usize,
    pub frame_w: usize,
    pub frame_h: usize,
    pub keypoints: Vec<Option<u32>>,
    pub inside_outside: Vec<u32>,
}

impl KeypointGrid {
    /// Number of grid cells.
    #[inline]
    pub fn len(&self) -> usize {
        self.grid_w * self.grid_h
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Linear frame pixel of the keypoint in `cell_index`.
    #[inline]
    pub fn keypoint_pixel(&self, cell_index: usize) -> Option<usize> {
        self.keypoints[cell_index].map(|offset| self.pixel_of(cell_index, offset as usize))
    }

    /// Linear frame pixel of a cell-local offset.
    #[inline]
    pub fn pixel_of(&self, cell_index: usize, offset: usize) -> usize {
        let gx = cell_index % self.grid_w;
        let gy = cell_index / self.grid_w;
        let x = gx * self.cell + offset % self.cell;
        let y = gy * self.cell + offset / self.cell;
        x + y * self.frame_w
    }

    /// Number of cells that currently hold a keypoint.
    pub fn keypoint_count(&self) -> usize {
        self.keypoints.iter().filter(|k| k.is_some()).count()
    }

    fn ensure(&mut self, cell: usize, frame_w: usize, frame_h: usize) {
        self.cell = cell;
        self.frame_w = frame_w;
        self.frame_h = frame_h;
        self.grid_w = frame_w / cell;
        self.grid_h = frame_h / cell;
        let n = self.grid_w * self.grid_h;
        self.keypoints.clear();
        self.keypoints.resize(n, None);
        self.inside_outside.clear();
        self.inside_outside.resize(n, 0);
    }
}

/// Reusable contour extraction stage.
#[derive(Clone, Debug)]
pub struct ContourExtractor {
    cell: usize,
    noise_tolerance: usize,
    grid: KeypointGrid,
    /// Boundary flag per frame pixel, kept for previews.
    boundary: Vec<bool>,
}

impl ContourExtractor {
    pub fn new(cell: usize, noise_tolerance: usize) -> Self {
        Self {
            cell: cell.max(1),
            noise_tolerance,
            grid: KeypointGrid::default(),
            boundary: Vec::new(),
        }
    }

    pub fn cell(&self) -> usize {
        self.cell
    }

    pub fn grid(&self) -> &KeypointGrid {
        &self.grid
    }

    pub fn boundary(&self) -> &[bool] {
        &self.boundary
    }

    /// Recomputes keypoints and inside/outside counts from `mask`.
    pub fn compute(&mut self, mask: &BinaryMask) -> &KeypointGrid {
        let (w, h) = mask.dims();
        let cell = self.cell;
        self.grid.ensure(cell, w, h);
        self.boundary.clear();
        self.boundary.resize(w * h, false);

        let data = &mask.data;
        for gy in 0..self.grid.grid_h {
            for gx in 0..self.grid.grid_w {
                let mut count = 0usize;
                let mut inside_outside = 0u32;
                let (mut sum_x, mut sum_y) = (0usize, 0usize);
                for cy in 0..cell {
                    let y = gy * cell + cy;
                    for cx in 0..cell {
                        let x = gx * cell + cx;
                        let i = x + y * w;
                        let m = data[i];
                        if m {
                            inside_outside += 1;
                        }
                        let is_boundary = (x > 0 && m != data[i - 1])
                            || (x + 1 < w && m != data[i + 1])
                            || (y > 0 && m != data[i - w]);
                        if is_boundary {
                            self.boundary[i] = true;
                            count += 1;
                            sum_x += cx;
                            sum_y += cy;
                        }
                    }
                }
                let index = gx + gy * self.grid.grid_w;
                self.grid.inside_outside[index] = inside_outside;
                if count >= self.noise_tolerance.max(1) {
                    let cx = (sum_x + count / 2) / count;
                    let cy = (sum_y + count / 2) / count;
                    self.grid.keypoints[index] = Some((cx + cy * cell) as u32);
                }
            }
        }
        &self.grid
    }
}
