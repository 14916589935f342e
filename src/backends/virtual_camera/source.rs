// SPDX-License-Identifier: GPL-3.0-only

//! Frame sources for the virtual camera

use image::{Rgba, RgbaImage};
use std::path::Path;
use std::sync::Arc;

/// What the virtual camera shows
#[derive(Debug, Clone)]
pub enum FrameSource {
    /// Moving test pattern
    Pattern { width: u32, height: u32 },
    /// The same still image on every frame
    Still(Arc<RgbaImage>),
}

impl Default for FrameSource {
    fn default() -> Self {
        FrameSource::Pattern {
            width: 640,
            height: 480,
        }
    }
}

impl FrameSource {
    /// Stream a still image file
    pub fn from_path(path: &Path) -> Result<Self, String> {
        let image = image::open(path)
            .map_err(|e| format!("Failed to open {}: {}", path.display(), e))?
            .to_rgba8();
        Ok(FrameSource::Still(Arc::new(image)))
    }

    pub fn dimensions(&self) -> (u32, u32) {
        match self {
            FrameSource::Pattern { width, height } => (*width, *height),
            FrameSource::Still(image) => image.dimensions(),
        }
    }

    /// Image for frame number `sequence`
    pub fn render(&self, sequence: u64) -> Arc<RgbaImage> {
        match self {
            FrameSource::Still(image) => Arc::clone(image),
            FrameSource::Pattern { width, height } => {
                let (w, h) = ((*width).max(1), (*height).max(1));
                let shift = (sequence * 4 % 256) as u32;
                Arc::new(RgbaImage::from_fn(w, h, |x, y| {
                    let r = (x * 255 / w + shift) % 256;
                    let g = y * 255 / h;
                    let b = 255 - shift;
                    Rgba([r as u8, g as u8, b as u8, 255])
                }))
            }
        }
    }
}
