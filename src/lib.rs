// SPDX-License-Identifier: MPL-2.0

//! Smart camera core
//!
//! Live text and barcode detection over camera frames, a single capture
//! control that takes a photo on tap and records while held, and colour
//! filters over the live preview.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`app`]: display loop, message handlers and teardown
//! - [`detection`]: admission gate, detectors, pipeline and lifecycle
//! - [`gesture`]: tap/hold recognizer for the capture control
//! - [`session`]: capture surface abstraction and atomic rebinding
//! - [`filters`]: preview filters and the filter preview loop
//! - [`runtime`]: display context dispatch and the background worker
//! - [`backends`]: capture surface implementations
//! - [`config`]: user configuration handling
//! - [`storage`]: output file naming

pub mod app;
pub mod backends;
pub mod config;
pub mod constants;
pub mod detection;
pub mod errors;
pub mod filters;
pub mod frame;
pub mod gesture;
pub mod runtime;
pub mod session;
pub mod storage;

// Re-export commonly used types
pub use app::{AppModel, CaptureIcon, DisplaySurface, Message, Notice};
pub use config::Config;
pub use detection::{DetectionResult, FrameAdmissionGate, FrameAnalyzer};
pub use filters::FilterMode;
pub use frame::{Frame, SensorRotation};
pub use session::{BindingConfig, CaptureSurface, Facing, SessionBinder};

/// Version string stamped at build time
pub const VERSION: &str = env!("GIT_VERSION");
