// SPDX-License-Identifier: MPL-2.0

//! Error types for the smart camera core
//!
//! Failures are grouped by the component that reports them. None of them is
//! fatal: callers log them and degrade the affected feature.

use crate::session::Facing;
use std::fmt;

/// Result type alias using AppError
pub type AppResult<T> = Result<T, AppError>;

/// Main application error type
#[derive(Debug, Clone)]
pub enum AppError {
    /// Capture behaviors could not be bound
    Binding(BindingError),
    /// A detector failed
    Detector(DetectorError),
    /// Recording-related errors
    Recording(RecordingError),
    /// Still capture errors
    Capture(CaptureError),
    /// Configuration errors
    Config(String),
    /// Storage/filesystem errors
    Storage(String),
    /// Generic error with message
    Other(String),
}

/// The capture surface rejected a requested behavior set
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BindingError {
    /// No camera available for the requested facing
    CameraUnavailable(Facing),
    /// The surface refused the combination of behaviors
    Rejected(String),
    /// The surface has been shut down
    SurfaceClosed,
}

/// Detector failures (per frame or on release)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DetectorError {
    /// Analysis of a single frame failed
    AnalysisFailed(String),
    /// The detector was used after release
    Closed,
    /// Releasing the detector's resources failed
    ReleaseFailed(String),
}

/// Recording-specific errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordingError {
    /// The active binding has no recorder
    NotSupported,
    /// Recording already in progress
    AlreadyRecording,
    /// No recording in progress
    NotRecording,
    /// Failed to start recording
    StartFailed(String),
    /// The recording finished with an error
    Finalize(String),
}

/// Still capture errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureError {
    /// No binding is active
    NotBound,
    /// No frame available for capture
    NoFrameAvailable,
    /// Capture failed
    CaptureFailed(String),
    /// Save failed
    SaveFailed(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Binding(e) => write!(f, "Binding error: {}", e),
            AppError::Detector(e) => write!(f, "Detector error: {}", e),
            AppError::Recording(e) => write!(f, "Recording error: {}", e),
            AppError::Capture(e) => write!(f, "Capture error: {}", e),
            AppError::Config(msg) => write!(f, "Configuration error: {}", msg),
            AppError::Storage(msg) => write!(f, "Storage error: {}", msg),
            AppError::Other(msg) => write!(f, "{}", msg),
        }
    }
}

impl fmt::Display for BindingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BindingError::CameraUnavailable(facing) => {
                write!(f, "No {} camera available", facing.display_name())
            }
            BindingError::Rejected(msg) => write!(f, "Behaviors rejected: {}", msg),
            BindingError::SurfaceClosed => write!(f, "Capture surface is closed"),
        }
    }
}

impl fmt::Display for DetectorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DetectorError::AnalysisFailed(msg) => write!(f, "Analysis failed: {}", msg),
            DetectorError::Closed => write!(f, "Detector already released"),
            DetectorError::ReleaseFailed(msg) => write!(f, "Release failed: {}", msg),
        }
    }
}

impl fmt::Display for RecordingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordingError::NotSupported => write!(f, "Recording is not supported"),
            RecordingError::AlreadyRecording => write!(f, "Recording already in progress"),
            RecordingError::NotRecording => write!(f, "No recording in progress"),
            RecordingError::StartFailed(msg) => write!(f, "Failed to start recording: {}", msg),
            RecordingError::Finalize(msg) => write!(f, "Recording failed: {}", msg),
        }
    }
}

impl fmt::Display for CaptureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaptureError::NotBound => write!(f, "Camera is not bound"),
            CaptureError::NoFrameAvailable => write!(f, "No frame available for capture"),
            CaptureError::CaptureFailed(msg) => write!(f, "Capture failed: {}", msg),
            CaptureError::SaveFailed(msg) => write!(f, "Save failed: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}
impl std::error::Error for BindingError {}
impl std::error::Error for DetectorError {}
impl std::error::Error for RecordingError {}
impl std::error::Error for CaptureError {}

// Conversions from sub-errors to AppError
impl From<BindingError> for AppError {
    fn from(err: BindingError) -> Self {
        AppError::Binding(err)
    }
}

impl From<DetectorError> for AppError {
    fn from(err: DetectorError) -> Self {
        AppError::Detector(err)
    }
}

impl From<RecordingError> for AppError {
    fn from(err: RecordingError) -> Self {
        AppError::Recording(err)
    }
}

impl From<CaptureError> for AppError {
    fn from(err: CaptureError) -> Self {
        AppError::Capture(err)
    }
}

impl From<String> for AppError {
    fn from(msg: String) -> Self {
        AppError::Other(msg)
    }
}

impl From<&str> for AppError {
    fn from(msg: &str) -> Self {
        AppError::Other(msg.to_string())
    }
}

// Conversions for I/O errors
impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Storage(err.to_string())
    }
}

impl From<std::io::Error> for CaptureError {
    fn from(err: std::io::Error) -> Self {
        CaptureError::SaveFailed(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Config(err.to_string())
    }
}
