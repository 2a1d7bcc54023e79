//! Shared RGBA texture atlas holding the live frame of every camera.
//!
//! Camera `i` occupies the region starting at its `tex_offset`; the texture
//! coordinates stored in rays and quads address this atlas in pixels.
use crate::camera::CameraPose;
use crate::image::RgbFrame;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug)]
pub struct TextureAtlas {
    width: usize,
    height: usize,
    data: Mutex<Vec<u8>>,
    version: AtomicU64,
}

impl TextureAtlas {
    pub const CHANNELS: usize = 4;

    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            data: Mutex::new(vec![0; width * height * Self::CHANNELS]),
            version: AtomicU64::new(0),
        }
    }

    /// Atlas large enough for every camera's region.
    pub fn for_cameras<'a>(cameras: impl IntoIterator<Item = &'a CameraPose>) -> Self {
        let (width, height) = cameras.into_iter().fold((0, 0), |(w, h), c| {
            (
                w.max(c.tex_offset.0 as usize + c.width),
                h.max(c.tex_offset.1 as usize + c.height),
            )
        });
        Self::new(width, height)
    }

    pub fn dims(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    /// Incremented on every write.
    pub fn version(&self) -> u64 {
        self.version.load(Ordering::Acquire)
    }

    /// Copies `frame` into the camera's region with opaque alpha. Parts
    /// outside the atlas are clipped.
    pub fn write_frame(&self, camera: &CameraPose, frame: &RgbFrame) {
        let (ox, oy) = (camera.tex_offset.0 as usize, camera.tex_offset.1 as usize);
        if ox >= self.width || oy >= self.height {
            return;
        }
        let cols = frame.w.min(self.width - ox);
        let rows = frame.h.min(self.height - oy);
        let mut data = self.data.lock();
        for y in 0..rows {
            let src = &frame.data[y * frame.w * RgbFrame::CHANNELS..][..cols * RgbFrame::CHANNELS];
            let start = ((oy + y) * self.width + ox) * Self::CHANNELS;
            let dst = &mut data[start..start + cols * Self::CHANNELS];
            for (d, s) in dst
                .chunks_exact_mut(Self::CHANNELS)
                .zip(src.chunks_exact(RgbFrame::CHANNELS))
            {
                d[..3].copy_from_slice(s);
                d[3] = 255;
            }
        }
        self.version.fetch_add(1, Ordering::AcqRel);
    }

    /// Runs `f` on the RGBA bytes while holding the lock.
    pub fn with_data<R>(&self, f: impl FnOnce(&[u8]) -> R) -> R {
        f(&self.data.lock())
    }

    pub fn snapshot(&self) -> Vec<u8> {
        self.data.lock().clone()
    }

    /// RGBA pixel at atlas position `(x, y)`.
    pub fn pixel(&self, x: usize, y: usize) -> [u8; 4] {
        let o = (y * self.width + x) * Self::CHANNELS;
        let data = self.data.lock();
        [data[o], data[o + 1], data[o + 2], data[o + 3]]
    }
}
