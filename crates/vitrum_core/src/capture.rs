//! Per-frame image capture
//!
//! The capturer snapshots the pre-effect background (and, for raster mode,
//! the foreground coverage plus a blurred copy) once per frame. Each
//! [`CapturedFrame`] is stamped with the capturer's generation at capture
//! time; starting a new capture bumps the generation so older frames are
//! reported as [`GlassError::StaleImage`] instead of being sampled.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::blur::gaussian_blur_alpha;
use crate::error::{GlassError, Result};
use crate::image::{AlphaMask, SampledImage};

/// Default blur radius for the blurred foreground mask, in pixels
pub const DEFAULT_FOREGROUND_BLUR: f32 = 8.0;

// Shared by every capturer so frame ids never repeat within a process.
static NEXT_FRAME_ID: AtomicU64 = AtomicU64::new(1);

/// Which captured image an error refers to
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ImageRole {
    Background,
    Foreground,
    BlurredForeground,
}

impl fmt::Display for ImageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ImageRole::Background => "background",
            ImageRole::Foreground => "foreground",
            ImageRole::BlurredForeground => "blurred foreground",
        };
        f.write_str(name)
    }
}

/// Produces [`CapturedFrame`]s and tracks the current generation
#[derive(Debug)]
pub struct FrameCapturer {
    generation: Arc<AtomicU64>,
    foreground_blur: f32,
}

impl Default for FrameCapturer {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameCapturer {
    pub fn new() -> Self {
        Self {
            generation: Arc::new(AtomicU64::new(0)),
            foreground_blur: DEFAULT_FOREGROUND_BLUR,
        }
    }

    /// Radius of the Gaussian used for the blurred foreground mask
    pub fn with_foreground_blur(mut self, radius: f32) -> Self {
        self.foreground_blur = radius.max(0.0);
        self
    }

    /// Generation of the most recent capture (0 before the first one)
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// Snapshot the background, and optionally the foreground layer
    ///
    /// The foreground's alpha channel becomes the sharp mask; a separable
    /// Gaussian blur of it becomes the blurred mask.
    pub fn capture(
        &mut self,
        background: SampledImage,
        foreground: Option<&SampledImage>,
    ) -> CapturedFrame {
        let mask = foreground.map(SampledImage::alpha_mask);
        self.capture_with_mask(background, mask)
    }

    /// Snapshot the background together with an explicit coverage mask
    pub fn capture_with_mask(
        &mut self,
        background: SampledImage,
        mask: Option<AlphaMask>,
    ) -> CapturedFrame {
        let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
        let blurred = mask
            .as_ref()
            .map(|m| gaussian_blur_alpha(m, self.foreground_blur));
        tracing::debug!(
            generation,
            width = background.width(),
            height = background.height(),
            has_mask = mask.is_some(),
            "captured frame"
        );
        CapturedFrame {
            id: NEXT_FRAME_ID.fetch_add(1, Ordering::Relaxed),
            generation,
            current: Arc::clone(&self.generation),
            background: Some(background),
            foreground: mask,
            blurred_foreground: blurred,
        }
    }

    /// Capture a frame whose lifetime is bound to this capturer
    ///
    /// While the guard lives the capturer is mutably borrowed, so the next
    /// capture cannot start before this frame is released.
    pub fn begin_frame(
        &mut self,
        background: SampledImage,
        foreground: Option<&SampledImage>,
    ) -> FrameGuard<'_> {
        let frame = self.capture(background, foreground);
        FrameGuard {
            frame,
            _capturer: self,
        }
    }
}

/// Images captured for exactly one frame
#[derive(Debug)]
pub struct CapturedFrame {
    id: u64,
    generation: u64,
    current: Arc<AtomicU64>,
    background: Option<SampledImage>,
    foreground: Option<AlphaMask>,
    blurred_foreground: Option<AlphaMask>,
}

impl CapturedFrame {
    /// Identity of this capture, unique across all capturers
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Position of this capture in its own capturer's sequence
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Whether a newer capture has started since this one
    pub fn is_stale(&self) -> bool {
        self.current.load(Ordering::Acquire) != self.generation
    }

    pub fn is_released(&self) -> bool {
        self.background.is_none()
    }

    /// Viewport covered by the background, if still held
    pub fn viewport(&self) -> Option<(u32, u32)> {
        self.background.as_ref().map(SampledImage::dimensions)
    }

    pub fn background(&self) -> Result<&SampledImage> {
        self.background
            .as_ref()
            .ok_or(GlassError::MissingImage(ImageRole::Background))
    }

    pub fn foreground(&self) -> Result<&AlphaMask> {
        self.foreground
            .as_ref()
            .ok_or(GlassError::MissingImage(ImageRole::Foreground))
    }

    pub fn blurred_foreground(&self) -> Result<&AlphaMask> {
        self.blurred_foreground
            .as_ref()
            .ok_or(GlassError::MissingImage(ImageRole::BlurredForeground))
    }

    /// Check that this frame may be sampled
    ///
    /// Fails when a newer capture exists, when a required image is missing,
    /// or when a mask does not cover the background's viewport.
    pub fn validate(&self, needs_mask: bool) -> Result<()> {
        let current = self.current.load(Ordering::Acquire);
        let background = self.background()?;
        if current != self.generation {
            return Err(GlassError::StaleImage {
                role: ImageRole::Background,
                captured: self.generation,
                current,
            });
        }
        if !needs_mask {
            return Ok(());
        }
        let expected = background.dimensions();
        for (role, mask) in [
            (ImageRole::Foreground, self.foreground()?),
            (ImageRole::BlurredForeground, self.blurred_foreground()?),
        ] {
            if mask.dimensions() != expected {
                return Err(GlassError::SizeMismatch {
                    role,
                    expected,
                    actual: mask.dimensions(),
                });
            }
        }
        Ok(())
    }

    /// Drop the images; any later render of this frame fails
    pub fn release(&mut self) {
        if self.background.is_some() {
            tracing::trace!(generation = self.generation, "released frame");
        }
        self.background = None;
        self.foreground = None;
        self.blurred_foreground = None;
    }
}

impl Drop for CapturedFrame {
    fn drop(&mut self) {
        self.release();
    }
}

/// A [`CapturedFrame`] that holds its capturer borrowed until dropped
pub struct FrameGuard<'a> {
    frame: CapturedFrame,
    _capturer: &'a mut FrameCapturer,
}

impl FrameGuard<'_> {
    pub fn frame(&self) -> &CapturedFrame {
        &self.frame
    }
}

impl std::ops::Deref for FrameGuard<'_> {
    type Target = CapturedFrame;

    fn deref(&self) -> &CapturedFrame {
        &self.frame
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Color;

    fn bg(w: u32, h: u32) -> SampledImage {
        SampledImage::solid(w, h, Color::rgb(0.2, 0.3, 0.4))
    }

    #[test]
    fn test_generation_increases() {
        let mut capturer = FrameCapturer::new();
        assert_eq!(capturer.generation(), 0);
        let a = capturer.capture(bg(4, 4), None);
        let b = capturer.capture(bg(4, 4), None);
        assert_eq!(a.generation(), 1);
        assert_eq!(b.generation(), 2);
        assert!(a.is_stale());
        assert!(!b.is_stale());
    }

    #[test]
    fn test_frame_ids_unique_across_capturers() {
        let mut first = FrameCapturer::new();
        let mut second = FrameCapturer::new();
        let a = first.capture(bg(4, 4), None);
        let b = second.capture(bg(4, 4), None);
        assert_eq!(a.generation(), b.generation());
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_stale_frame_rejected() {
        let mut capturer = FrameCapturer::new();
        let old = capturer.capture(bg(4, 4), None);
        let _new = capturer.capture(bg(4, 4), None);
        assert_eq!(
            old.validate(false),
            Err(GlassError::StaleImage {
                role: ImageRole::Background,
                captured: 1,
                current: 2
            })
        );
    }

    #[test]
    fn test_released_frame_is_missing() {
        let mut capturer = FrameCapturer::new();
        let mut frame = capturer.capture(bg(4, 4), None);
        assert!(frame.validate(false).is_ok());
        frame.release();
        assert!(frame.is_released());
        assert_eq!(
            frame.validate(false),
            Err(GlassError::MissingImage(ImageRole::Background))
        );
    }

    #[test]
    fn test_mask_required_in_raster_mode() {
        let mut capturer = FrameCapturer::new();
        let frame = capturer.capture(bg(4, 4), None);
        assert_eq!(
            frame.validate(true),
            Err(GlassError::MissingImage(ImageRole::Foreground))
        );
    }

    #[test]
    fn test_mask_size_mismatch() {
        let mut capturer = FrameCapturer::new();
        let mask = AlphaMask::from_fn(3, 4, |_, _| 1.0);
        let frame = capturer.capture_with_mask(bg(4, 4), Some(mask));
        let err = frame.validate(true).unwrap_err();
        assert!(err.is_resource());
        assert_eq!(
            err,
            GlassError::SizeMismatch {
                role: ImageRole::Foreground,
                expected: (4, 4),
                actual: (3, 4)
            }
        );
    }

    #[test]
    fn test_foreground_capture_builds_both_masks() {
        let mut capturer = FrameCapturer::new().with_foreground_blur(2.0);
        let fg = SampledImage::solid(6, 6, Color::rgba(1.0, 1.0, 1.0, 0.5));
        let frame = capturer.capture(bg(6, 6), Some(&fg));
        assert!(frame.validate(true).is_ok());
        assert_eq!(frame.foreground().unwrap().value(2, 2), 0.5);
        assert!((frame.blurred_foreground().unwrap().value(2, 2) - 0.5).abs() < 1e-5);
    }

    #[test]
    fn test_guard_derefs_to_frame() {
        let mut capturer = FrameCapturer::new();
        {
            let guard = capturer.begin_frame(bg(2, 2), None);
            assert_eq!(guard.generation(), 1);
            assert!(guard.validate(false).is_ok());
        }
        assert_eq!(capturer.generation(), 1);
    }

    #[test]
    fn test_role_display() {
        assert_eq!(ImageRole::BlurredForeground.to_string(), "blurred foreground");
        assert_eq!(
            GlassError::MissingImage(ImageRole::Background).to_string(),
            "missing background image"
        );
    }
}
