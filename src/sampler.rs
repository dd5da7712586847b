// Pulls the source's current frame into an off-screen raster at the target
// sample resolution and exposes the pixels as RGBA bytes. One sample call per
// render tick; the call is synchronous and bounded by the raster size.

use crate::error::Error;
use crate::source::FrameSource;
use crate::types::PixelBuffer;

use image::imageops::{self, FilterType};

/// Result of one sample call. Readiness is surfaced explicitly; a not-ready
/// source skips the frame instead of failing it.
pub enum Sample<'a> {
    NotReady,
    Frame(&'a PixelBuffer),
}

pub struct FrameSampler {
    source: Box<dyn FrameSource>,
    raster: PixelBuffer,
    // One-time sizing: explicit target dimensions, or the source's intrinsic
    // size applied on first ready sample — whichever happens first, once.
    dimensions_set: bool,
    sampled: bool,
}

impl FrameSampler {
    pub fn new(source: Box<dyn FrameSource>) -> Self {
        Self {
            source,
            raster: PixelBuffer::new(0, 0),
            dimensions_set: false,
            sampled: false,
        }
    }

    /// Set the target sample resolution. Giving only one dimension forces the
    /// other equal (square sampling region); giving neither is a no-op.
    pub fn set_sample_size(&mut self, width: Option<u32>, height: Option<u32>) {
        let (w, h) = match (width, height) {
            (None, None) => return,
            (Some(w), None) => (w, w),
            (None, Some(h)) => (h, h),
            (Some(w), Some(h)) => (w, h),
        };
        self.resize_raster(w as usize, h as usize);
        self.dimensions_set = true;
    }

    /// Current target resolution, once known.
    pub fn sample_size(&self) -> Option<(usize, usize)> {
        if self.raster.is_empty() {
            None
        } else {
            Some((self.raster.width, self.raster.height))
        }
    }

    pub fn is_ready(&self) -> bool {
        self.source.is_ready()
    }

    /// HUD tag of the underlying source.
    pub fn tag(&self) -> &'static str {
        self.source.tag()
    }

    /// The most recent sample, for debug overlays. None until one exists.
    pub fn last_frame(&self) -> Option<&PixelBuffer> {
        if self.sampled { Some(&self.raster) } else { None }
    }

    /// Scale the source's current frame into the backing raster and hand the
    /// pixels back. Safe to call once per tick.
    pub fn sample(&mut self, elapsed: f32) -> Result<Sample<'_>, Error> {
        if !self.source.is_ready() {
            return Ok(Sample::NotReady);
        }

        // Intrinsic-size initialization happens once, and only while no
        // explicit dimensions were supplied.
        if !self.dimensions_set {
            match self.source.intrinsic_size() {
                Some((w, h)) => {
                    self.resize_raster(w as usize, h as usize);
                    self.dimensions_set = true;
                }
                None => return Ok(Sample::NotReady),
            }
        }

        let frame = match self.source.current_frame(elapsed)? {
            Some(f) => f,
            None => return Ok(Sample::NotReady),
        };

        let (tw, th) = (self.raster.width as u32, self.raster.height as u32);
        if frame.dimensions() == (tw, th) {
            self.raster.data.copy_from_slice(frame.as_raw());
        } else {
            let scaled = imageops::resize(frame, tw, th, FilterType::Triangle);
            self.raster.data.copy_from_slice(scaled.as_raw());
        }
        self.sampled = true;
        Ok(Sample::Frame(&self.raster))
    }

    // The raster survives across calls; it is only replaced when the
    // requested dimensions actually differ.
    fn resize_raster(&mut self, width: usize, height: usize) {
        if self.raster.width != width || self.raster.height != height {
            self.raster = PixelBuffer::new(width, height);
            self.sampled = false;
        }
    }
}
