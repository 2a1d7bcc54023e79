//! Output types shared between the reconstruction core and its consumers.
use serde::Serialize;

/// Fixed-point scale applied to world coordinates of emitted quads.
pub const MODEL_SCALE: f32 = 100.0;

/// One surface quad: 4 corners of integer world coordinates (scaled by
/// [`MODEL_SCALE`]) and 2 texture coordinates per corner.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct ModelQuad {
    pub corners: [[i32; 3]; 4],
    pub uvs: [f32; 8],
}

impl ModelQuad {
    /// Corner positions in world units (descaled).
    pub fn world_corners(&self) -> [[f32; 3]; 4] {
        self.corners
            .map(|c| [c[0] as f32 / MODEL_SCALE, c[1] as f32 / MODEL_SCALE, c[2] as f32 / MODEL_SCALE])
    }
}

/// Converts a world position into the scaled integer representation.
#[inline]
pub fn scale_point(p: &nalgebra::Vector3<f32>) -> [i32; 3] {
    [
        (p.x * MODEL_SCALE) as i32,
        (p.y * MODEL_SCALE) as i32,
        (p.z * MODEL_SCALE) as i32,
    ]
}

/// The union of all cameras' quads for one global frame.
#[derive(Clone, Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelFrame {
    /// Global frame counter the quads belong to.
    pub frame_index: u64,
    pub quads: Vec<ModelQuad>,
    /// Number of quads contributed by each camera, in camera order.
    pub per_camera: Vec<usize>,
}

impl ModelFrame {
    pub fn clear(&mut self) {
        self.quads.clear();
        self.per_camera.clear();
    }

    /// Appends the quads of the next camera.
    pub fn push_camera(&mut self, quads: &[ModelQuad]) {
        self.quads.extend_from_slice(quads);
        self.per_camera.push(quads.len());
    }

    /// Quads contributed by camera `index`.
    pub fn camera_quads(&self, index: usize) -> &[ModelQuad] {
        let start: usize = self.per_camera.iter().take(index).sum();
        let len = self.per_camera.get(index).copied().unwrap_or(0);
        &self.quads[start..start + len]
    }

    pub fn len(&self) -> usize {
        self.quads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.quads.is_empty()
    }

    /// Corner coordinates of all quads as one flat stream, 12 per quad.
    pub fn flat_corners(&self) -> Vec<i32> {
        self.quads
            .iter()
            .flat_map(|q| q.corners.iter().flatten().copied())
            .collect()
    }

    /// Texture coordinates of all quads as one flat stream, 8 per quad.
    pub fn flat_uvs(&self) -> Vec<f32> {
        self.quads.iter().flat_map(|q| q.uvs).collect()
    }

    /// Axis-aligned bounds of all corners in world units, `None` when empty.
    pub fn bounds(&self) -> Option<([f32; 3], [f32; 3])> {
        let mut corners = self.quads.iter().flat_map(|q| q.world_corners());
        let first = corners.next()?;
        let (mut lo, mut hi) = (first, first);
        for c in corners {
            for k in 0..3 {
                lo[k] = lo[k].min(c[k]);
                hi[k] = hi[k].max(c[k]);
            }
        }
        Some((lo, hi))
    }
}
