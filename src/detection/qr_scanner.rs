// SPDX-License-Identifier: GPL-3.0-only

//! QR code scanning with rqrr
//!
//! Frames are converted to grayscale and downscaled before grid detection,
//! which keeps scanning fast enough to run on every admitted frame.

use super::detector::{Detector, DetectorResult};
use crate::constants::detection::BARCODE_MAX_DIMENSION;
use crate::errors::DetectorError;
use crate::frame::Frame;
use futures::future::BoxFuture;
use image::imageops::{self, FilterType};
use image::{GrayImage, RgbaImage};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, trace};

/// Barcode scanner for QR codes
pub struct QrScanner {
    /// Maximum dimension for processing (frames are downscaled to this)
    max_dimension: u32,
    closed: AtomicBool,
}

impl Default for QrScanner {
    fn default() -> Self {
        Self::new()
    }
}

impl QrScanner {
    pub fn new() -> Self {
        Self::with_max_dimension(BARCODE_MAX_DIMENSION)
    }

    pub fn with_max_dimension(max_dimension: u32) -> Self {
        Self {
            max_dimension: max_dimension.max(1),
            closed: AtomicBool::new(false),
        }
    }
}

impl Detector for QrScanner {
    type Output = Vec<String>;

    fn name(&self) -> &'static str {
        "qr"
    }

    fn analyze<'a>(&'a self, frame: &'a Frame) -> BoxFuture<'a, DetectorResult<Vec<String>>> {
        Box::pin(async move {
            if self.closed.load(Ordering::Acquire) {
                return Err(DetectorError::Closed);
            }

            let image = Arc::clone(&frame.image);
            let max_dimension = self.max_dimension;

            // CPU-bound; keep it off the async thread
            tokio::task::spawn_blocking(move || scan_codes(&image, max_dimension))
                .await
                .map_err(|e| DetectorError::AnalysisFailed(format!("QR scan task failed: {}", e)))
        })
    }

    fn close(&self) -> DetectorResult<()> {
        self.closed.store(true, Ordering::Release);
        Ok(())
    }
}

/// Decode every QR code found in `image`
pub fn scan_codes(image: &RgbaImage, max_dimension: u32) -> Vec<String> {
    let start = std::time::Instant::now();
    let gray = prepare_grayscale(image, max_dimension);

    let (width, height) = gray.dimensions();
    let mut prepared = rqrr::PreparedImage::prepare_from_greyscale(
        width as usize,
        height as usize,
        |x, y| gray.get_pixel(x as u32, y as u32).0[0],
    );
    let grids = prepared.detect_grids();

    let mut codes = Vec::with_capacity(grids.len());
    for grid in grids {
        match grid.decode() {
            Ok((_meta, content)) => {
                debug!(content = %content, "Decoded QR code");
                codes.push(content);
            }
            Err(e) => debug!(error = %e, "Failed to decode QR grid"),
        }
    }

    trace!(
        width,
        height,
        count = codes.len(),
        elapsed_ms = start.elapsed().as_millis(),
        "QR scan complete"
    );
    codes
}

/// Grayscale copy of `image`, downscaled so neither side exceeds `max_dimension`
fn prepare_grayscale(image: &RgbaImage, max_dimension: u32) -> GrayImage {
    let gray = imageops::grayscale(image);
    let (width, height) = gray.dimensions();

    if width <= max_dimension && height <= max_dimension {
        return gray;
    }

    let scale = (width as f32 / max_dimension as f32).max(height as f32 / max_dimension as f32);
    let new_width = ((width as f32 / scale) as u32).max(1);
    let new_height = ((height as f32 / scale) as u32).max(1);
    imageops::resize(&gray, new_width, new_height, FilterType::Triangle)
}
