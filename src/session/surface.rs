// SPDX-License-Identifier: GPL-3.0-only

//! Capture surface abstraction
//!
//! The surface is the camera-side collaborator: it owns the device, delivers
//! frames to the bound analyzer, and performs still capture and recording.

use super::Facing;
use crate::detection::FrameAnalyzer;
use crate::errors::{BindingError, CaptureError, RecordingError};
use crate::filters::FilterMode;
use futures::future::BoxFuture;
use futures::stream::BoxStream;
use std::path::PathBuf;

/// Progress of one recording
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordEvent {
    /// Frames are being written
    Started,
    /// The recording ended; the final output or why it failed
    Finalized(Result<PathBuf, RecordingError>),
}

/// Event stream of one recording, ends after `Finalized`
pub type RecordStream = BoxStream<'static, RecordEvent>;

/// Behaviors requested for one binding
///
/// Preview and still capture are always present in practice; the analyzer and
/// recorder are optional.
#[derive(Debug, Clone)]
pub struct Behaviors {
    pub preview: bool,
    pub still_capture: bool,
    /// Receives every frame while bound
    pub analyzer: Option<FrameAnalyzer>,
    pub recorder: bool,
}

/// Camera-side collaborator bound by the session binder
///
/// All methods may be called from the display context and must not block for
/// long. Frame delivery to the analyzer happens on the surface's own thread.
pub trait CaptureSurface: Send + Sync {
    /// Whether a recorder can be bound for `facing`
    fn supports_recording(&self, facing: Facing) -> bool;

    /// Whether the camera for `facing` has a torch
    fn has_torch(&self, facing: Facing) -> bool;

    /// Bind `behaviors` to the camera for `facing`, all or nothing
    ///
    /// # Returns
    /// * `Ok(())` - Every behavior is live
    /// * `Err(BindingError)` - Nothing is bound; the behaviors were dropped
    fn bind(&self, facing: Facing, behaviors: Behaviors) -> Result<(), BindingError>;

    /// Unbind everything
    ///
    /// After this returns the surface holds no analyzer and delivers no more
    /// frames. Calling it when nothing is bound is a no-op.
    fn unbind_all(&self);

    /// Capture one still image to `target` with `filter` applied
    fn capture(
        &self,
        target: PathBuf,
        filter: FilterMode,
    ) -> BoxFuture<'static, Result<PathBuf, CaptureError>>;

    /// Start recording to `target`, writing frames with `filter` applied
    ///
    /// The stream yields `Started` once frames are being written and
    /// `Finalized` after [`stop_recording`](Self::stop_recording) or a failure.
    /// `Finalized` may arrive well after the stop request.
    fn start_recording(
        &self,
        target: PathBuf,
        filter: FilterMode,
    ) -> Result<RecordStream, RecordingError>;

    /// Stop the active recording
    fn stop_recording(&self) -> Result<(), RecordingError>;

    /// Switch the torch of the bound camera
    fn set_torch(&self, on: bool) -> Result<(), String>;
}
