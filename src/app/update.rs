// SPDX-License-Identifier: GPL-3.0-only

//! Message update handling
//!
//! `update()` is a dispatcher; the handlers live in the `handlers` submodules
//! organized by functional domain:
//!
//! - `handlers::capture`: capture gesture, photo capture, recording
//! - `handlers::camera`: camera switch, detection and flash toggles, teardown
//! - `handlers::filter`: filter cycling and the filter preview loop

use crate::app::state::{AppModel, Message};

impl AppModel {
    /// Route one message to its handler
    ///
    /// Returns false once the loop should exit.
    pub async fn update(&mut self, message: Message) -> bool {
        match message {
            // ===== Input =====
            Message::CapturePressed => self.handle_capture_pressed(),
            Message::CaptureReleased => self.handle_capture_released(),
            Message::CaptureCancelled => self.handle_capture_cancelled(),
            Message::SwitchCamera => self.handle_switch_camera().await,
            Message::ToggleDetection => self.handle_toggle_detection().await,
            Message::CycleFilter => self.handle_cycle_filter().await,
            Message::ToggleFlash => self.handle_toggle_flash().await,
            Message::Shutdown => {
                self.shutdown().await;
                return false;
            }

            // ===== Timers =====
            Message::GestureTimer(id) => self.handle_gesture_timer(id),
            Message::FilterTick(id) => self.handle_filter_tick(id),
            Message::HideResult(id) => self.handle_hide_result(id),
            Message::HideFilterLabel(id) => self.handle_hide_filter_label(id),

            // ===== Results =====
            Message::DetectionResult(text) => self.handle_detection_result(text),
            Message::FilterFrame(frame) => self.handle_filter_frame(frame),
            Message::PhotoSaved(result) => self.handle_photo_saved(result),
            Message::DetectorsReleased => self.handle_detectors_released().await,
            Message::Recording(id, event) => self.handle_recording_event(id, event),
        }
        true
    }
}
