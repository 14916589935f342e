// SPDX-License-Identifier: GPL-3.0-only

//! Application state management

use crate::config::Config;
use crate::errors::CaptureError;
use crate::filters::FilterPreviewLoop;
use crate::filters::preview_loop::FilterFrame;
use crate::gesture::CaptureGesture;
use crate::runtime::{BackgroundWorker, DisplayHandle, TimerHandle, TimerId};
use crate::session::{BindingConfig, RecordEvent, SessionBinder};
use image::RgbaImage;
use std::path::PathBuf;
use uuid::Uuid;

/// Icon shown on the capture control
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CaptureIcon {
    /// Ready to take a photo
    #[default]
    Idle,
    /// A recording is running; releasing stops it
    Recording,
}

/// Short user-visible notices
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    PhotoSaved(PathBuf),
    PhotoFailed(String),
    RecordingStarted,
    RecordingSaved(PathBuf),
    RecordingFailed(String),
    RecordingUnsupported,
    DetectionOn,
    DetectionOff,
    FlashUnavailable,
    BindingFailed(String),
}

impl std::fmt::Display for Notice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Notice::PhotoSaved(path) => write!(f, "Photo saved: {}", path.display()),
            Notice::PhotoFailed(msg) => write!(f, "Photo failed: {}", msg),
            Notice::RecordingStarted => write!(f, "Recording..."),
            Notice::RecordingSaved(path) => write!(f, "Video saved: {}", path.display()),
            Notice::RecordingFailed(msg) => write!(f, "Recording failed: {}", msg),
            Notice::RecordingUnsupported => write!(f, "Recording is not available"),
            Notice::DetectionOn => write!(f, "Smart detection enabled"),
            Notice::DetectionOff => write!(f, "Smart detection disabled"),
            Notice::FlashUnavailable => write!(f, "Flash not available on the front camera"),
            Notice::BindingFailed(msg) => write!(f, "Could not start camera: {}", msg),
        }
    }
}

/// UI sink driven by the display context
///
/// Every method is called on the display context only.
pub trait DisplaySurface: Send {
    fn show_result(&mut self, text: &str);
    fn hide_result(&mut self);
    fn show_filter_label(&mut self, label: &str);
    fn hide_filter_label(&mut self);
    fn set_capture_icon(&mut self, icon: CaptureIcon);
    fn notify(&mut self, notice: Notice);
    /// Show `image` over the preview, or remove the overlay
    fn render_overlay(&mut self, image: Option<&RgbaImage>);
    /// Current preview contents, if a frame is available
    fn snapshot_preview(&mut self) -> Option<RgbaImage>;
}

/// Messages handled by the display loop
///
/// - **Input**: capture control gestures and toggles
/// - **Timers**: gesture debounce, filter ticks, auto-hide
/// - **Results**: detection, filter frames, capture and recording outcomes
#[derive(Debug)]
pub enum Message {
    // ===== Input =====
    CapturePressed,
    CaptureReleased,
    CaptureCancelled,
    SwitchCamera,
    ToggleDetection,
    CycleFilter,
    ToggleFlash,
    Shutdown,

    // ===== Timers =====
    GestureTimer(TimerId),
    FilterTick(TimerId),
    HideResult(TimerId),
    HideFilterLabel(TimerId),

    // ===== Results =====
    DetectionResult(String),
    FilterFrame(FilterFrame),
    PhotoSaved(Result<PathBuf, CaptureError>),
    /// Event of the recording with the given id
    Recording(Uuid, RecordEvent),
    /// Detectors kept alive by a timed-out drain have been closed
    DetectorsReleased,
}

/// State owned by the display loop
pub struct AppModel {
    /// Settings loaded at startup, updated on every toggle
    pub config: Config,
    /// Configuration of the current binding
    pub binding_config: BindingConfig,
    pub(crate) binder: SessionBinder,
    pub(crate) gesture: CaptureGesture,
    pub(crate) filter_loop: FilterPreviewLoop<Message>,
    pub(crate) display: DisplayHandle<Message>,
    pub(crate) ui: Box<dyn DisplaySurface>,
    pub(crate) worker: Option<BackgroundWorker>,
    /// Pending auto-hide of the detection result
    pub(crate) result_timer: Option<TimerHandle>,
    /// Pending auto-hide of the filter label
    pub(crate) filter_label_timer: Option<TimerHandle>,
    /// Whether a photo capture is in progress
    pub is_capturing: bool,
}
