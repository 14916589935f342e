// SPDX-License-Identifier: GPL-3.0-only

//! Camera frames handed to the core by a frame source
//!
//! A [`Frame`] owns the source's buffer until it is released. Release happens
//! exactly once: either explicitly through [`Frame::close`] or implicitly when
//! the frame is dropped on an early-exit path.

use image::RgbaImage;
use std::sync::Arc;
use std::time::Instant;

/// Sensor rotation in degrees (clockwise)
///
/// Detectors use this to interpret the image upright; the frame data itself is
/// never rotated by the core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SensorRotation {
    /// No rotation (sensor is oriented correctly)
    #[default]
    None,
    /// 90 degrees clockwise
    Rotate90,
    /// 180 degrees (upside down)
    Rotate180,
    /// 270 degrees clockwise (90 degrees counter-clockwise)
    Rotate270,
}

impl SensorRotation {
    /// Create rotation from an integer degree value (normalised to 0-360).
    pub fn from_degrees(degrees: i32) -> Self {
        match degrees.rem_euclid(360) {
            90 => SensorRotation::Rotate90,
            180 => SensorRotation::Rotate180,
            270 => SensorRotation::Rotate270,
            _ => SensorRotation::None,
        }
    }

    /// Rotation in degrees
    pub fn degrees(&self) -> u32 {
        match self {
            SensorRotation::None => 0,
            SensorRotation::Rotate90 => 90,
            SensorRotation::Rotate180 => 180,
            SensorRotation::Rotate270 => 270,
        }
    }
}

type ReleaseFn = Box<dyn FnOnce() + Send + Sync>;

/// One camera image plus orientation metadata
pub struct Frame {
    /// Monotonic sequence number assigned by the source
    pub sequence: u64,
    /// Pixel data (RGBA, tightly packed)
    pub image: Arc<RgbaImage>,
    /// Sensor rotation relative to the display
    pub rotation: SensorRotation,
    /// When the source produced the frame
    pub captured_at: Instant,
    release: Option<ReleaseFn>,
}

impl Frame {
    /// Create a frame without a release hook
    pub fn new(sequence: u64, image: Arc<RgbaImage>, rotation: SensorRotation) -> Self {
        Self {
            sequence,
            image,
            rotation,
            captured_at: Instant::now(),
            release: None,
        }
    }

    /// Attach the hook that hands the buffer back to the source
    pub fn with_release<F>(mut self, release: F) -> Self
    where
        F: FnOnce() + Send + Sync + 'static,
    {
        self.release = Some(Box::new(release));
        self
    }

    /// Frame width in pixels
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    /// Frame height in pixels
    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Release the frame back to its source
    pub fn close(mut self) {
        self.release_now();
    }

    fn release_now(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl Drop for Frame {
    fn drop(&mut self) {
        self.release_now();
    }
}

impl std::fmt::Debug for Frame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Frame")
            .field("sequence", &self.sequence)
            .field("width", &self.width())
            .field("height", &self.height())
            .field("rotation", &self.rotation)
            .field("released", &self.release.is_none())
            .finish()
    }
}
