// SPDX-License-Identifier: GPL-3.0-only

//! Session binder
//!
//! Keeps exactly one [`ActiveBinding`] alive and replaces it atomically. A
//! rebind always tears the previous binding down completely before anything
//! new is created:
//!
//! 1. unbind every behavior and stop a recording the old binding left running
//! 2. drain the admission gate, then release the old detectors
//! 3. create fresh detectors if the new config enables detection
//! 4. bind preview, still capture, analyzer and recorder in one call
//!
//! If step 4 fails nothing is bound, the fresh detectors are released and the
//! error is returned once. There is no retry.
//!
//! When the drain times out the old detectors outlive the unbind. A
//! detection-enabled rebind then binds without an analyzer and reports the
//! binding as deferred; the caller rebinds once
//! [`detectors_released`](SessionBinder::detectors_released) resolves.

use super::recording::RecordingState;
use super::surface::{Behaviors, CaptureSurface, RecordStream};
use super::BindingConfig;
use crate::detection::{
    AnalyzerLifecycle, DetectionListener, DetectionPipeline, DetectorFactory, FrameAdmissionGate,
    FrameAnalyzer,
};
use crate::errors::{BindingError, RecordingError};
use crate::filters::FilterMode;
use crate::runtime::WorkerHandle;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// The behaviors currently bound to the surface
#[derive(Debug)]
pub struct ActiveBinding {
    id: Uuid,
    config: BindingConfig,
    analyzer: Option<FrameAnalyzer>,
    recorder: bool,
    detection_deferred: bool,
}

impl ActiveBinding {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn config(&self) -> &BindingConfig {
        &self.config
    }

    pub fn analyzer(&self) -> Option<&FrameAnalyzer> {
        self.analyzer.as_ref()
    }

    pub fn has_recorder(&self) -> bool {
        self.recorder
    }

    /// Detection was requested but the previous detectors were still alive
    pub fn detection_deferred(&self) -> bool {
        self.detection_deferred
    }
}

pub struct SessionBinder {
    surface: Arc<dyn CaptureSurface>,
    lifecycle: AnalyzerLifecycle,
    gate: FrameAdmissionGate,
    worker: WorkerHandle,
    listener: DetectionListener,
    drain_timeout: Duration,
    active: Option<ActiveBinding>,
    recording: RecordingState,
}

impl SessionBinder {
    pub fn new(
        surface: Arc<dyn CaptureSurface>,
        factory: Arc<dyn DetectorFactory>,
        worker: WorkerHandle,
        listener: DetectionListener,
        drain_timeout: Duration,
    ) -> Self {
        Self {
            surface,
            lifecycle: AnalyzerLifecycle::new(factory),
            gate: FrameAdmissionGate::new(),
            worker,
            listener,
            drain_timeout,
            active: None,
            recording: RecordingState::Idle,
        }
    }

    pub fn active(&self) -> Option<&ActiveBinding> {
        self.active.as_ref()
    }

    pub fn gate(&self) -> &FrameAdmissionGate {
        &self.gate
    }

    pub fn surface(&self) -> &Arc<dyn CaptureSurface> {
        &self.surface
    }

    pub fn detectors_active(&self) -> bool {
        self.lifecycle.is_active()
    }

    pub fn recording(&self) -> &RecordingState {
        &self.recording
    }

    /// Replace the active binding with one built from `config`
    pub async fn rebind(&mut self, config: BindingConfig) -> Result<&ActiveBinding, BindingError> {
        self.unbind().await;
        self.stop_recording();
        self.lifecycle.deactivate();

        let mut detection_deferred = false;
        let analyzer = match config.detection_enabled.then(|| self.lifecycle.activate()) {
            Some(Some(detectors)) => {
                let pipeline = DetectionPipeline::new(detectors, self.listener.clone());
                Some(FrameAnalyzer::new(
                    self.gate.clone(),
                    pipeline,
                    self.worker.clone(),
                ))
            }
            Some(None) => {
                warn!("Previous detectors still in use, binding without analyzer");
                detection_deferred = true;
                None
            }
            None => None,
        };

        let recorder = config.recording_supported && self.surface.supports_recording(config.facing);
        let behaviors = Behaviors {
            preview: true,
            still_capture: true,
            analyzer: analyzer.clone(),
            recorder,
        };

        if let Err(e) = self.surface.bind(config.facing, behaviors) {
            error!(error = %e, facing = %config.facing, "Failed to bind capture behaviors");
            drop(analyzer);
            self.lifecycle.deactivate();
            return Err(e);
        }

        let binding = ActiveBinding {
            id: Uuid::new_v4(),
            config,
            analyzer,
            recorder,
            detection_deferred,
        };
        info!(
            binding = %binding.id,
            facing = %config.facing,
            detection = config.detection_enabled,
            detection_deferred,
            recorder,
            filter = %config.filter_mode,
            "Capture behaviors bound"
        );

        self.apply_torch(&config);
        Ok(self.active.insert(binding))
    }

    /// Unbind everything and wait for the in-flight frame, if any
    ///
    /// Detectors stay allocated; see [`deactivate`](Self::deactivate).
    pub async fn unbind(&mut self) {
        let Some(binding) = self.active.take() else {
            return;
        };

        self.surface.unbind_all();
        debug!(binding = %binding.id, "Capture behaviors unbound");
        drop(binding);

        if !self.gate.drain(self.drain_timeout).await {
            warn!(
                timeout_ms = self.drain_timeout.as_millis(),
                "Frame still in flight after unbind"
            );
        }
    }

    /// Release the detectors of the last detection-enabled binding
    pub fn deactivate(&mut self) {
        self.lifecycle.deactivate();
    }

    /// Resolves once detectors left alive by a timed-out drain are closed
    pub fn detectors_released(&self) -> impl Future<Output = ()> + Send + 'static {
        self.lifecycle.retired()
    }

    /// Start recording on the active binding
    ///
    /// Returns the id of the new recording along with its events.
    pub fn start_recording(
        &mut self,
        target: PathBuf,
        filter: FilterMode,
    ) -> Result<(Uuid, RecordStream), RecordingError> {
        let Some(binding) = &self.active else {
            return Err(RecordingError::NotSupported);
        };
        if !binding.recorder {
            return Err(RecordingError::NotSupported);
        }
        if self.recording.is_recording() {
            return Err(RecordingError::AlreadyRecording);
        }

        let stream = self.surface.start_recording(target.clone(), filter)?;
        self.recording = RecordingState::start(target);
        let id = self.recording.id().unwrap_or_default();
        info!(recording = %id, path = ?self.recording.file_path(), "Recording requested");
        Ok((id, stream))
    }

    /// Stop the recording if one is running; returns true if one was stopped
    ///
    /// Errors are logged; the recording is considered over either way.
    pub fn stop_recording(&mut self) -> bool {
        if !self.recording.is_recording() {
            return false;
        }
        let elapsed_ms = self.recording.elapsed().as_millis();
        let RecordingState::Recording { id, file_path, .. } = self.recording.stop() else {
            return false;
        };

        match self.surface.stop_recording() {
            Ok(()) => info!(recording = %id, path = %file_path.display(), elapsed_ms, "Recording stop requested"),
            Err(e) => warn!(recording = %id, error = %e, path = %file_path.display(), "Failed to stop recording"),
        }
        true
    }

    /// Whether `id` is the recording currently running
    pub fn is_current_recording(&self, id: Uuid) -> bool {
        self.recording.id() == Some(id)
    }

    /// The surface reported the end of recording `id`
    ///
    /// Returns false, leaving the state alone, if `id` is not the current
    /// recording.
    pub fn recording_finished(&mut self, id: Uuid) -> bool {
        if !self.is_current_recording(id) {
            return false;
        }
        debug!(recording = %id, "Recording ended by the surface");
        self.recording.stop();
        true
    }

    /// Tear everything down: unbind, release detectors, stop recording
    pub async fn teardown(&mut self) {
        self.unbind().await;
        self.deactivate();
        self.stop_recording();
        debug!("Session torn down");
    }

    fn apply_torch(&self, config: &BindingConfig) {
        if !self.surface.has_torch(config.facing) {
            return;
        }
        if let Err(e) = self.surface.set_torch(config.effective_torch()) {
            warn!(error = %e, "Failed to apply torch state");
        }
    }
}
