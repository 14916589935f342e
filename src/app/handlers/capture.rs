// SPDX-License-Identifier: GPL-3.0-only

//! Capture gesture, photo capture and recording handlers

use crate::app::state::{AppModel, CaptureIcon, Message, Notice};
use crate::errors::{CaptureError, RecordingError};
use crate::gesture::GestureCommand;
use crate::runtime::TimerId;
use crate::session::RecordEvent;
use crate::storage::{self, MediaKind};
use futures::StreamExt;
use std::path::PathBuf;
use uuid::Uuid;
use tracing::{debug, error, info, warn};

impl AppModel {
    pub(crate) fn handle_capture_pressed(&mut self) {
        self.gesture.press(&self.display, Message::GestureTimer);
    }

    pub(crate) fn handle_capture_released(&mut self) {
        let commands = self.gesture.release();
        self.run_gesture_commands(commands);
    }

    pub(crate) fn handle_capture_cancelled(&mut self) {
        let commands = self.gesture.cancel();
        self.run_gesture_commands(commands);
    }

    pub(crate) fn handle_gesture_timer(&mut self, id: TimerId) {
        if let Some(command) = self.gesture.on_timer(id) {
            self.run_gesture_commands(vec![command]);
        }
    }

    fn run_gesture_commands(&mut self, commands: Vec<GestureCommand>) {
        for command in commands {
            match command {
                GestureCommand::Capture => self.capture_photo(),
                GestureCommand::StartRecording => self.start_recording(),
                GestureCommand::StopRecording => self.stop_recording(),
            }
        }
    }

    fn capture_photo(&mut self) {
        if self.is_capturing {
            debug!("Capture already in progress");
            return;
        }
        if self.binder.active().is_none() {
            self.ui
                .notify(Notice::PhotoFailed(CaptureError::NotBound.to_string()));
            return;
        }

        let target = match storage::prepare_output(&self.config.photo_directory(), MediaKind::Photo) {
            Ok(path) => path,
            Err(e) => {
                error!(error = %e, "Failed to prepare photo directory");
                self.ui.notify(Notice::PhotoFailed(e.to_string()));
                return;
            }
        };

        info!(path = %target.display(), "Capturing photo");
        self.is_capturing = true;
        let capture = self
            .binder
            .surface()
            .capture(target, self.binding_config.filter_mode);
        let display = self.display.clone();
        tokio::spawn(async move {
            display.post(Message::PhotoSaved(capture.await));
        });
    }

    pub(crate) fn handle_photo_saved(&mut self, result: Result<PathBuf, CaptureError>) {
        self.is_capturing = false;
        match result {
            Ok(path) => {
                info!(path = %path.display(), "Photo saved");
                self.ui.notify(Notice::PhotoSaved(path));
            }
            Err(e) => {
                error!(error = %e, "Failed to save photo");
                self.ui.notify(Notice::PhotoFailed(e.to_string()));
            }
        }
    }

    fn start_recording(&mut self) {
        let has_recorder = self.binder.active().is_some_and(|b| b.has_recorder());
        if !has_recorder {
            info!("Recording requested but no recorder is bound");
            self.ui.notify(Notice::RecordingUnsupported);
            return;
        }

        let target = match storage::prepare_output(&self.config.video_directory(), MediaKind::Video) {
            Ok(path) => path,
            Err(e) => {
                error!(error = %e, "Failed to prepare video directory");
                self.ui.notify(Notice::RecordingFailed(e.to_string()));
                return;
            }
        };

        match self
            .binder
            .start_recording(target, self.binding_config.filter_mode)
        {
            Ok((id, mut events)) => {
                self.ui.set_capture_icon(CaptureIcon::Recording);
                let display = self.display.clone();
                tokio::spawn(async move {
                    while let Some(event) = events.next().await {
                        if !display.post(Message::Recording(id, event)) {
                            break;
                        }
                    }
                });
            }
            Err(RecordingError::NotSupported) => self.ui.notify(Notice::RecordingUnsupported),
            Err(e) => {
                error!(error = %e, "Failed to start recording");
                self.ui.notify(Notice::RecordingFailed(e.to_string()));
            }
        }
    }

    fn stop_recording(&mut self) {
        if !self.binder.stop_recording() {
            debug!("Stop requested with no recording running");
        }
        self.ui.set_capture_icon(CaptureIcon::Idle);
    }

    pub(crate) fn handle_recording_event(&mut self, id: Uuid, event: RecordEvent) {
        match event {
            RecordEvent::Started => {
                if self.binder.is_current_recording(id) && self.gesture.on_recording_started() {
                    self.ui.notify(Notice::RecordingStarted);
                } else {
                    // Released before the recorder confirmed; stop was already requested
                    debug!(recording = %id, "Recording started after the press ended");
                }
            }
            RecordEvent::Finalized(result) => {
                // A newer recording may already be running; its state stays
                let superseded = self.binder.recording().is_recording()
                    && !self.binder.is_current_recording(id);
                if superseded {
                    debug!(recording = %id, "Earlier recording finalized");
                } else {
                    self.binder.recording_finished(id);
                    self.ui.set_capture_icon(CaptureIcon::Idle);
                }
                match result {
                    Ok(path) => {
                        info!(path = %path.display(), "Recording saved");
                        self.ui.notify(Notice::RecordingSaved(path));
                    }
                    Err(e) => {
                        warn!(error = %e, "Recording failed");
                        self.ui.notify(Notice::RecordingFailed(e.to_string()));
                    }
                }
            }
        }
    }
}
