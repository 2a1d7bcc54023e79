//! Owned 8-bit RGB frame in row-major layout, 3 bytes per pixel.
//!
//! This is the live per-camera buffer: sources decode into it, the
//! background model reads it, previews and the texture atlas copy from it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RgbFrame {
    /// Image width in pixels
    pub w: usize,
    /// Image height in pixels
    pub h: usize,
    /// Backing storage, `w * h * 3` bytes
    pub data: Vec<u8>,
}

impl RgbFrame {
    pub const CHANNELS: usize = 3;

    /// Construct a black frame of size `w × h`.
    pub fn new(w: usize, h: usize) -> Self {
        Self {
            w,
            h,
            data: vec![0; w * h * Self::CHANNELS],
        }
    }

    /// Construct a frame filled with one colour.
    pub fn filled(w: usize, h: usize, rgb: [u8; 3]) -> Self {
        let mut frame = Self::new(w, h);
        frame.fill(rgb);
        frame
    }

    /// Wrap raw bytes, returning `None` when the length does not match.
    pub fn from_raw(w: usize, h: usize, data: Vec<u8>) -> Option<Self> {
        (data.len() == w * h * Self::CHANNELS).then_some(Self { w, h, data })
    }

    #[inline]
    pub fn dims(&self) -> (usize, usize) {
        (self.w, self.h)
    }

    /// Reallocates to `w × h` if the size differs; content is unspecified
    /// afterwards.
    pub fn ensure_size(&mut self, w: usize, h: usize) {
        if self.w != w || self.h != h {
            self.w = w;
            self.h = h;
            self.data.clear();
            self.data.resize(w * h * Self::CHANNELS, 0);
        }
    }

    pub fn fill(&mut self, rgb: [u8; 3]) {
        for px in self.data.chunks_exact_mut(Self::CHANNELS) {
            px.copy_from_slice(&rgb);
        }
    }

    /// Pixel at linear index `i`.
    #[inline]
    pub fn pixel(&self, i: usize) -> [u8; 3] {
        let o = i * Self::CHANNELS;
        [self.data[o], self.data[o + 1], self.data[o + 2]]
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> [u8; 3] {
        self.pixel(y * self.w + x)
    }

    #[inline]
    pub fn set(&mut self, x: usize, y: usize, rgb: [u8; 3]) {
        let o = (y * self.w + x) * Self::CHANNELS;
        self.data[o..o + Self::CHANNELS].copy_from_slice(&rgb);
    }

    /// Sets a pixel when `(x, y)` lies inside the frame; used by the preview
    /// drawing helpers which may run off the edge.
    #[inline]
    pub fn put(&mut self, x: i64, y: i64, rgb: [u8; 3]) {
        if x >= 0 && y >= 0 && (x as usize) < self.w && (y as usize) < self.h {
            self.set(x as usize, y as usize, rgb);
        }
    }

    /// Nearest-neighbour rescale by `scale` (at least one pixel per side).
    pub fn scaled(&self, scale: f32) -> RgbFrame {
        if (scale - 1.0).abs() < f32::EPSILON {
            return self.clone();
        }
        let w = ((self.w as f32 * scale).round() as usize).max(1);
        let h = ((self.h as f32 * scale).round() as usize).max(1);
        let mut out = RgbFrame::new(w, h);
        for y in 0..h {
            let sy = ((y * self.h) / h).min(self.h.saturating_sub(1));
            for x in 0..w {
                let sx = ((x * self.w) / w).min(self.w.saturating_sub(1));
                out.set(x, y, self.get(sx, sy));
            }
        }
        out
    }
}
