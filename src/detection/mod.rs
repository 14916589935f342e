// SPDX-License-Identifier: MPL-2.0

//! Frame analysis: admission gate, detector adapters, pipeline and lifecycle
//!
//! Frames are sampled through a single-flight gate and analyzed by a text
//! recognizer and a barcode scanner in parallel. Merged results are posted to
//! the display context.

pub mod detector;
pub mod gate;
pub mod lifecycle;
pub mod pipeline;
pub mod qr_scanner;
pub mod types;

pub use detector::{
    BarcodeScanner, DefaultDetectors, Detector, DetectorFactory, DetectorResult, DetectorSet,
    NoTextRecognizer, TextRecognizer,
};
pub use gate::{AdmissionPermit, FrameAdmissionGate, PipelineState};
pub use lifecycle::AnalyzerLifecycle;
pub use pipeline::{Admission, AnalyzerStats, DetectionListener, DetectionPipeline, FrameAnalyzer};
pub use qr_scanner::QrScanner;
pub use types::DetectionResult;
