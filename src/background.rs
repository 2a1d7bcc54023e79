//! Running-average background reference and per-frame foreground mask.
//!
//! Overview
//! - `start_new_background` sizes the accumulator for the current frame and
//!   records how many samples will be folded in.
//! - `add_frame` adds `round(px · 4/K)` per channel into a `u32`
//!   accumulator, so after exactly `K` samples it holds four times the mean.
//!   Keeping the factor 4 preserves two extra bits through the per-sample
//!   rounding.
//! - `finalize_background` divides by 4 with rounding into an 8-bit frame.
//! - `compute_binary_mask` marks a pixel as background when every channel
//!   differs from the reference by less than the tolerance.
//!
//! Notes
//! - With `SampleCount::External` no sampling happens; the reference has to
//!   be handed over with `set_background` (recorded playback does this).
//! - Accessing the reference or the mask before they exist logs an error
//!   and returns `PipelineError::NotReady`.
use crate::error::PipelineError;
use crate::image::{BinaryMask, RgbFrame};
use log::{debug, error};

/// How the next background reference is obtained.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SampleCount {
    /// Average this many live frames.
    Sampled(usize),
    /// Supplied from outside via `set_background`.
    External,
}

#[derive(Debug)]
pub struct BackgroundModel {
    tolerance: u8,
    expected: SampleCount,
    added: usize,
    accumulator: Vec<u32>,
    reference: RgbFrame,
    mask: BinaryMask,
    has_reference: bool,
    has_mask: bool,
}

impl BackgroundModel {
    pub fn new(tolerance: u8) -> Self {
        Self {
            tolerance,
            expected: SampleCount::Sampled(1),
            added: 0,
            accumulator: Vec::new(),
            reference: RgbFrame::default(),
            mask: BinaryMask::default(),
            has_reference: false,
            has_mask: false,
        }
    }

    /// Starts a new reference for frames of size `width × height`.
    pub fn start_new_background(&mut self, width: usize, height: usize, expected: SampleCount) {
        self.expected = match expected {
            SampleCount::Sampled(k) => SampleCount::Sampled(k.max(1)),
            external => external,
        };
        self.added = 0;
        self.accumulator.clear();
        self.accumulator.resize(width * height * RgbFrame::CHANNELS, 0);
        self.reference.ensure_size(width, height);
        self.mask.ensure_size(width, height);
        self.has_reference = false;
        self.has_mask = false;
        debug!(
            "background: new reference {width}x{height}, samples {:?}",
            self.expected
        );
    }

    /// Folds one frame into the accumulator.
    pub fn add_frame(&mut self, frame: &RgbFrame) -> Result<(), PipelineError> {
        let k = match self.expected {
            SampleCount::Sampled(k) => k,
            SampleCount::External => return Ok(()),
        };
        self.check_size(frame)?;
        let weight = 4.0 / k as f32;
        for (acc, &px) in self.accumulator.iter_mut().zip(&frame.data) {
            *acc += (px as f32 * weight).round() as u32;
        }
        self.added += 1;
        Ok(())
    }

    /// Number of frames folded in since the last `start_new_background`.
    pub fn samples_added(&self) -> usize {
        self.added
    }

    /// Turns the accumulator into the 8-bit reference.
    pub fn finalize_background(&mut self) {
        if self.expected == SampleCount::External {
            return;
        }
        for (dst, &acc) in self.reference.data.iter_mut().zip(&self.accumulator) {
            *dst = ((acc + 2) / 4).min(255) as u8;
        }
        self.has_reference = true;
    }

    /// Installs an externally supplied reference.
    pub fn set_background(&mut self, background: &RgbFrame) {
        self.reference.clone_from(background);
        self.mask.ensure_size(background.w, background.h);
        self.accumulator.clear();
        self.added = 0;
        self.expected = SampleCount::External;
        self.has_reference = true;
        self.has_mask = false;
    }

    pub fn is_ready(&self) -> bool {
        self.has_reference
    }

    pub fn has_mask(&self) -> bool {
        self.has_mask
    }

    /// Classifies every pixel of `frame` against the reference.
    pub fn compute_binary_mask(&mut self, frame: &RgbFrame) -> Result<&BinaryMask, PipelineError> {
        if !self.has_reference {
            error!("binary mask requested before a background reference exists");
            return Err(PipelineError::NotReady("background reference"));
        }
        self.check_size(frame)?;
        let tol = self.tolerance as i16;
        let reference = self.reference.data.chunks_exact(RgbFrame::CHANNELS);
        let live = frame.data.chunks_exact(RgbFrame::CHANNELS);
        for ((dst, f), b) in self.mask.data.iter_mut().zip(live).zip(reference) {
            *dst = f
                .iter()
                .zip(b)
                .all(|(&f, &b)| (f as i16 - b as i16).abs() < tol);
        }
        self.has_mask = true;
        Ok(&self.mask)
    }

    pub fn background(&self) -> Result<&RgbFrame, PipelineError> {
        if !self.has_reference {
            error!("background reference requested before it was computed");
            return Err(PipelineError::NotReady("background reference"));
        }
        Ok(&self.reference)
    }

    pub fn mask(&self) -> Result<&BinaryMask, PipelineError> {
        if !self.has_mask {
            error!("binary mask requested before it was computed");
            return Err(PipelineError::NotReady("binary mask"));
        }
        Ok(&self.mask)
    }

    fn check_size(&self, frame: &RgbFrame) -> Result<(), PipelineError> {
        let expected = self.mask.dims();
        if frame.dims() != expected {
            return Err(PipelineError::FrameSize {
                expected,
                actual: frame.dims(),
            });
        }
        Ok(())
    }
}
