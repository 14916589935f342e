// SPDX-License-Identifier: GPL-3.0-only

//! Smart camera application core
//!
//! [`AppModel`] is the display context: a single message loop that owns every
//! piece of UI-facing state. Camera frames, detector results, filter frames
//! and timers all reach it as [`Message`]s posted through a
//! [`DisplayHandle`](crate::runtime::DisplayHandle).
//!
//! Shutdown releases everything in a fixed order: filter preview, gesture
//! timer, capture behaviors, detectors, recording, then the background worker
//! after it finished its queued jobs.

pub mod handlers;
pub mod state;
mod update;

pub use state::{AppModel, CaptureIcon, DisplaySurface, Message, Notice};

use crate::config::Config;
use crate::detection::{DetectionListener, DetectorFactory};
use crate::filters::FilterPreviewLoop;
use crate::gesture::CaptureGesture;
use crate::runtime::{BackgroundWorker, DisplayHandle, DisplayQueue};
use crate::session::{CaptureSurface, SessionBinder};
use std::sync::Arc;
use tracing::{debug, info};

/// Name of the background worker thread
pub const WORKER_NAME: &str = "smartcam-worker";

impl AppModel {
    /// Build the model and start the background worker
    ///
    /// Nothing is bound until [`start`](Self::start).
    pub fn new(
        config: Config,
        surface: Arc<dyn CaptureSurface>,
        factory: Arc<dyn DetectorFactory>,
        ui: Box<dyn DisplaySurface>,
        display: DisplayHandle<Message>,
    ) -> std::io::Result<Self> {
        let worker = BackgroundWorker::start(WORKER_NAME)?;
        let listener = DetectionListener::on_display(display.clone(), Message::DetectionResult);
        let binder = SessionBinder::new(
            surface,
            factory,
            worker.handle(),
            listener,
            config.analyzer_drain_timeout(),
        );
        let filter_loop = FilterPreviewLoop::new(
            display.clone(),
            worker.handle(),
            config.filter_tick_interval(),
            Message::FilterTick,
            Message::FilterFrame,
        );

        Ok(Self {
            binding_config: config.binding_config(),
            gesture: CaptureGesture::new(config.long_press_threshold()),
            config,
            binder,
            filter_loop,
            display,
            ui,
            worker: Some(worker),
            result_timer: None,
            filter_label_timer: None,
            is_capturing: false,
        })
    }

    /// Bind the initial configuration
    pub async fn start(&mut self) {
        let config = self.binding_config;
        info!(facing = %config.facing, detection = config.detection_enabled, "Starting camera session");
        self.apply_binding(config).await;
        if !config.filter_mode.is_normal() {
            self.filter_loop.start(config.filter_mode);
        }
    }

    /// Whether the background worker is still running
    pub fn is_running(&self) -> bool {
        self.worker.is_some()
    }

    /// Session binder, for inspection
    pub fn binder(&self) -> &SessionBinder {
        &self.binder
    }

    pub fn gesture(&self) -> &CaptureGesture {
        &self.gesture
    }

    pub fn filter_running(&self) -> bool {
        self.filter_loop.is_running()
    }

    /// Handle to post messages to this model's loop
    pub fn display(&self) -> DisplayHandle<Message> {
        self.display.clone()
    }
}

/// Run the display loop until [`Message::Shutdown`]
///
/// Returns the final configuration so the caller can persist it.
pub async fn run(mut model: AppModel, mut queue: DisplayQueue<Message>) -> Config {
    model.start().await;

    while let Some(message) = queue.recv().await {
        if !model.update(message).await {
            break;
        }
    }

    model.shutdown().await;
    queue.close();
    debug!("Display loop exited");
    model.config
}
