//! Per-pixel background/foreground classification.

/// One flag per pixel, row-major; `true` marks a background pixel.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BinaryMask {
    pub w: usize,
    pub h: usize,
    pub data: Vec<bool>,
}

impl BinaryMask {
    /// All-background mask of size `w × h`.
    pub fn new(w: usize, h: usize) -> Self {
        Self {
            w,
            h,
            data: vec![true; w * h],
        }
    }

    /// Builds a mask from a predicate over pixel coordinates returning
    /// `true` for background.
    pub fn from_fn(w: usize, h: usize, mut is_background: impl FnMut(usize, usize) -> bool) -> Self {
        let mut data = Vec::with_capacity(w * h);
        for y in 0..h {
            for x in 0..w {
                data.push(is_background(x, y));
            }
        }
        Self { w, h, data }
    }

    pub fn ensure_size(&mut self, w: usize, h: usize) {
        if self.w != w || self.h != h {
            self.w = w;
            self.h = h;
            self.data.clear();
            self.data.resize(w * h, true);
        }
    }

    #[inline]
    pub fn dims(&self) -> (usize, usize) {
        (self.w, self.h)
    }

    #[inline]
    pub fn is_background(&self, x: usize, y: usize) -> bool {
        self.data[y * self.w + x]
    }

    /// Number of pixels classified as foreground (object).
    pub fn foreground_count(&self) -> usize {
        self.data.iter().filter(|&&bg| !bg).count()
    }
}
