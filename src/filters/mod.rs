// SPDX-License-Identifier: MPL-2.0

//! Preview filters
//!
//! Filters are applied on the CPU to a snapshot of the preview and shown as
//! an overlay. Each mode is a 3x3 colour matrix over RGB; alpha is kept.

pub mod preview_loop;

pub use preview_loop::{FilterLoopState, FilterPreviewLoop};

use image::RgbaImage;
use serde::{Deserialize, Serialize};

/// Filter applied to the live preview
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FilterMode {
    /// No filter, the preview is shown as-is
    #[default]
    Normal,
    /// Zero saturation
    Grayscale,
    /// Warm brownish tint
    Sepia,
}

/// Zero-saturation matrix using Rec.709 luma weights
const GRAYSCALE_MATRIX: [[f32; 3]; 3] = [
    [0.213, 0.715, 0.072],
    [0.213, 0.715, 0.072],
    [0.213, 0.715, 0.072],
];

const SEPIA_MATRIX: [[f32; 3]; 3] = [
    [0.393, 0.769, 0.189],
    [0.349, 0.686, 0.168],
    [0.272, 0.534, 0.131],
];

impl FilterMode {
    pub const ALL: [FilterMode; 3] = [FilterMode::Normal, FilterMode::Grayscale, FilterMode::Sepia];

    /// Next mode in the cycle Normal -> Grayscale -> Sepia -> Normal
    pub fn next(self) -> Self {
        match self {
            FilterMode::Normal => FilterMode::Grayscale,
            FilterMode::Grayscale => FilterMode::Sepia,
            FilterMode::Sepia => FilterMode::Normal,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            FilterMode::Normal => "Normal",
            FilterMode::Grayscale => "B/W",
            FilterMode::Sepia => "Sepia",
        }
    }

    /// Label shown when the mode changes
    pub fn label(&self) -> String {
        format!("Filter: {}", self.display_name())
    }

    pub fn is_normal(&self) -> bool {
        *self == FilterMode::Normal
    }

    fn matrix(&self) -> Option<&'static [[f32; 3]; 3]> {
        match self {
            FilterMode::Normal => None,
            FilterMode::Grayscale => Some(&GRAYSCALE_MATRIX),
            FilterMode::Sepia => Some(&SEPIA_MATRIX),
        }
    }

    /// Filtered copy of `src`, or `None` for [`FilterMode::Normal`]
    pub fn apply(&self, src: &RgbaImage) -> Option<RgbaImage> {
        let matrix = self.matrix()?;
        let mut out = src.clone();
        for pixel in out.pixels_mut() {
            let [r, g, b, a] = pixel.0;
            let (r, g, b) = (r as f32, g as f32, b as f32);
            let mix = |row: &[f32; 3]| (row[0] * r + row[1] * g + row[2] * b).round().clamp(0.0, 255.0) as u8;
            pixel.0 = [mix(&matrix[0]), mix(&matrix[1]), mix(&matrix[2]), a];
        }
        Some(out)
    }
}

impl std::fmt::Display for FilterMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

impl std::str::FromStr for FilterMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "normal" | "none" => Ok(FilterMode::Normal),
            "grayscale" | "greyscale" | "bw" | "mono" => Ok(FilterMode::Grayscale),
            "sepia" => Ok(FilterMode::Sepia),
            other => Err(format!("Unknown filter mode: {}", other)),
        }
    }
}
