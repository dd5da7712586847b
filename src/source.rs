// Frame sources: where the pixels come from. Each source hands the sampler
// the RGBA frame that should be visible *right now*; the sampler never cares
// whether that frame came from a camera, a looping image sequence or a single
// still. A source that is not ready yet simply produces no frame.

use crate::error::Error;
use std::path::Path;

use image::{DynamicImage, RgbaImage};

// Bring in nokhwa types for camera control.
use nokhwa::{
    Camera,
    pixel_format::RgbFormat,
    utils::{CameraFormat, CameraIndex, FrameFormat, RequestedFormat, RequestedFormatType, Resolution},
};

pub trait FrameSource {
    /// True once frames can be produced; sampling earlier is skipped, not an error.
    fn is_ready(&self) -> bool;

    /// The source's native resolution, once known.
    fn intrinsic_size(&self) -> Option<(u32, u32)>;

    /// The frame visible at `elapsed` seconds since render start.
    /// `Ok(None)` while the source is not ready.
    fn current_frame(&mut self, elapsed: f32) -> Result<Option<&RgbaImage>, Error>;

    /// Short tag for the HUD ("CAM", "SEQ", "IMG").
    fn tag(&self) -> &'static str;
}

/* ------------------------------- camera -------------------------------- */

// A small wrapper around nokhwa::Camera so the loop stays clean. The stream
// opens in the constructor and closes when the source is dropped.
pub struct CameraSource {
    cam: Camera,
    width: u32,
    height: u32,
    frame: Option<RgbaImage>,
}

impl CameraSource {
    /// Try to open camera `index` at a target resolution (falls back if not exact).
    pub fn open(index: u32, width: u32, height: u32) -> Result<Self, Error> {
        // 1) Choose the device (0 = default webcam)
        let idx = CameraIndex::Index(index);

        let fmt = CameraFormat::new(
            Resolution::new(width, height),
            FrameFormat::YUYV, // uncompressed; cheap to convert to RGB
            30,                // target FPS
        );

        // 2) Ask for RGB frames, prioritizing the closest format to our request.
        let req = RequestedFormat::new::<RgbFormat>(RequestedFormatType::Closest(fmt));

        // 3) Create the camera (this might fail if no device exists).
        let mut cam = Camera::new(idx, req)
            .map_err(|e| Error::SourceInit(format!("Create camera: {e}")))?;

        // 4) Start streaming. Readiness is exactly "the stream is open".
        cam.open_stream()
            .map_err(|e| Error::SourceInit(format!("Open stream: {e}")))?;

        // 5) The actual stream might choose a slightly different resolution.
        let actual = cam.resolution();

        Ok(Self {
            cam,
            width: actual.width(),
            height: actual.height(),
            frame: None,
        })
    }
}

impl FrameSource for CameraSource {
    fn is_ready(&self) -> bool {
        true // open_stream succeeded in the constructor
    }

    fn intrinsic_size(&self) -> Option<(u32, u32)> {
        Some((self.width, self.height))
    }

    /// Pull one frame from the camera (blocks until a new frame is ready)
    /// and convert it to RGBA for the sampler.
    fn current_frame(&mut self, _elapsed: f32) -> Result<Option<&RgbaImage>, Error> {
        let frame = self
            .cam
            .frame()
            .map_err(|e| Error::SourceFrame(format!("Fetch frame: {e}")))?;

        let rgb = frame
            .decode_image::<RgbFormat>() // ImageBuffer<Rgb<u8>, Vec<u8>>
            .map_err(|e| Error::SourceFrame(format!("Decode RGB: {e}")))?;

        self.frame = Some(DynamicImage::ImageRgb8(rgb).to_rgba8());
        Ok(self.frame.as_ref())
    }

    fn tag(&self) -> &'static str {
        "CAM"
    }
}

/* --------------------------- image sequence ---------------------------- */

/// A directory of numbered frames played back as looping video. The clock
/// decides which frame is current; playback starts as soon as decoding is
/// done, and loops indefinitely unless told otherwise.
pub struct SequenceSource {
    frames: Vec<RgbaImage>,
    fps: f32,
    looping: bool,
}

impl SequenceSource {
    pub const DEFAULT_FPS: f32 = 12.0;

    /// Decode every image file in `dir`, sorted by file name.
    pub fn open(dir: &Path, fps: f32, looping: bool) -> Result<Self, Error> {
        let mut paths: Vec<_> = std::fs::read_dir(dir)
            .map_err(|e| Error::SourceInit(format!("Read {}: {e}", dir.display())))?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| {
                matches!(
                    p.extension().and_then(|e| e.to_str()),
                    Some("png") | Some("jpg") | Some("jpeg") | Some("bmp")
                )
            })
            .collect();
        paths.sort();

        let mut frames = Vec::with_capacity(paths.len());
        for p in &paths {
            let img = image::open(p)
                .map_err(|e| Error::SourceInit(format!("Decode {}: {e}", p.display())))?;
            frames.push(img.to_rgba8());
        }
        Self::from_frames(frames, fps, looping)
    }

    /// Build from already-decoded frames. All frames must share one
    /// resolution, else the sampler's raster policy falls apart.
    pub fn from_frames(frames: Vec<RgbaImage>, fps: f32, looping: bool) -> Result<Self, Error> {
        if frames.is_empty() {
            return Err(Error::SourceInit("sequence has no frames".into()));
        }
        if fps <= 0.0 {
            return Err(Error::SourceInit(format!("sequence fps must be positive, got {fps}")));
        }
        let (w, h) = frames[0].dimensions();
        for f in &frames {
            if f.dimensions() != (w, h) {
                return Err(Error::SourceInit(
                    "sequence frames must share identical dimensions".into(),
                ));
            }
        }
        Ok(Self { frames, fps, looping })
    }

    fn frame_index(&self, elapsed: f32) -> usize {
        let raw = (elapsed.max(0.0) * self.fps) as usize;
        if self.looping {
            raw % self.frames.len()
        } else {
            // Non-looping playback parks on the last frame.
            raw.min(self.frames.len() - 1)
        }
    }
}

impl FrameSource for SequenceSource {
    fn is_ready(&self) -> bool {
        true // all frames decoded in the constructor
    }

    fn intrinsic_size(&self) -> Option<(u32, u32)> {
        Some(self.frames[0].dimensions())
    }

    fn current_frame(&mut self, elapsed: f32) -> Result<Option<&RgbaImage>, Error> {
        let idx = self.frame_index(elapsed);
        Ok(Some(&self.frames[idx]))
    }

    fn tag(&self) -> &'static str {
        "SEQ"
    }
}

/* ----------------------------- still image ----------------------------- */

/// One static image; every frame is the same.
pub struct ImageSource {
    image: RgbaImage,
}

impl ImageSource {
    pub fn open(path: &Path) -> Result<Self, Error> {
        let img = image::open(path)
            .map_err(|e| Error::SourceInit(format!("Decode {}: {e}", path.display())))?;
        Ok(Self { image: img.to_rgba8() })
    }

    pub fn from_image(image: RgbaImage) -> Self {
        Self { image }
    }
}

impl FrameSource for ImageSource {
    fn is_ready(&self) -> bool {
        true
    }

    fn intrinsic_size(&self) -> Option<(u32, u32)> {
        Some(self.image.dimensions())
    }

    fn current_frame(&mut self, _elapsed: f32) -> Result<Option<&RgbaImage>, Error> {
        Ok(Some(&self.image))
    }

    fn tag(&self) -> &'static str {
        "IMG"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn solid(w: u32, h: u32, v: u8) -> RgbaImage {
        RgbaImage::from_pixel(w, h, Rgba([v, v, v, 255]))
    }

    #[test]
    fn test_sequence_advances_with_the_clock() {
        let frames = vec![solid(2, 2, 0), solid(2, 2, 128), solid(2, 2, 255)];
        let mut seq = SequenceSource::from_frames(frames, 10.0, true).unwrap();
        let at = |seq: &mut SequenceSource, t: f32| {
            seq.current_frame(t).unwrap().unwrap().get_pixel(0, 0)[0]
        };
        assert_eq!(at(&mut seq, 0.0), 0);
        assert_eq!(at(&mut seq, 0.15), 128); // frame 1 at 10 fps
        assert_eq!(at(&mut seq, 0.25), 255);
    }

    #[test]
    fn test_looping_sequence_wraps_around() {
        let frames = vec![solid(2, 2, 10), solid(2, 2, 20)];
        let mut seq = SequenceSource::from_frames(frames, 10.0, true).unwrap();
        // 0.35s at 10 fps is raw index 3 -> wraps to frame 1.
        assert_eq!(seq.current_frame(0.35).unwrap().unwrap().get_pixel(0, 0)[0], 20);
    }

    #[test]
    fn test_non_looping_sequence_parks_on_last_frame() {
        let frames = vec![solid(2, 2, 10), solid(2, 2, 20)];
        let mut seq = SequenceSource::from_frames(frames, 10.0, false).unwrap();
        assert_eq!(seq.current_frame(9.0).unwrap().unwrap().get_pixel(0, 0)[0], 20);
    }

    #[test]
    fn test_sequence_rejects_mismatched_frame_sizes() {
        let frames = vec![solid(2, 2, 0), solid(3, 2, 0)];
        assert!(SequenceSource::from_frames(frames, 10.0, true).is_err());
    }

    #[test]
    fn test_sequence_rejects_empty_input() {
        assert!(SequenceSource::from_frames(Vec::new(), 10.0, true).is_err());
    }

    #[test]
    fn test_image_source_is_constant() {
        let mut src = ImageSource::from_image(solid(4, 3, 77));
        assert!(src.is_ready());
        assert_eq!(src.intrinsic_size(), Some((4, 3)));
        let a = src.current_frame(0.0).unwrap().unwrap().clone();
        let b = src.current_frame(5.0).unwrap().unwrap().clone();
        assert_eq!(a.as_raw(), b.as_raw());
    }
}
