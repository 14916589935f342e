// SPDX-License-Identifier: GPL-3.0-only

//! Camera configuration toggles, detection results and teardown

use crate::app::state::{AppModel, Message, Notice};
use crate::runtime::TimerId;
use crate::session::{BindingConfig, Facing};
use tracing::{debug, info, warn};

impl AppModel {
    pub(crate) async fn handle_switch_camera(&mut self) {
        let mut config = self.binding_config;
        config.facing = config.facing.toggle();
        if config.facing == Facing::Front {
            config.torch_enabled = false;
        }
        info!(facing = %config.facing, "Switching camera");
        self.apply_binding(config).await;
    }

    pub(crate) async fn handle_toggle_detection(&mut self) {
        let mut config = self.binding_config;
        config.detection_enabled = !config.detection_enabled;

        if !config.detection_enabled {
            self.result_timer = None;
            self.ui.hide_result();
        }
        if !self.apply_binding(config).await {
            return;
        }
        self.ui.notify(if config.detection_enabled {
            Notice::DetectionOn
        } else {
            Notice::DetectionOff
        });
    }

    pub(crate) async fn handle_toggle_flash(&mut self) {
        let mut config = self.binding_config;
        if config.facing == Facing::Front || !self.binder.surface().has_torch(config.facing) {
            self.ui.notify(Notice::FlashUnavailable);
            return;
        }

        config.torch_enabled = !config.torch_enabled;
        debug!(torch = config.torch_enabled, "Toggling flash");
        self.apply_binding(config).await;
    }

    /// Make `config` current and rebind; a failure is reported once
    ///
    /// Returns whether the rebind succeeded.
    pub(crate) async fn apply_binding(&mut self, config: BindingConfig) -> bool {
        self.binding_config = config;
        self.config.remember(&config);

        let deferred = match self.binder.rebind(config).await {
            Ok(binding) => binding.detection_deferred(),
            Err(e) => {
                self.ui.notify(Notice::BindingFailed(e.to_string()));
                return false;
            }
        };

        if deferred {
            let released = self.binder.detectors_released();
            let display = self.display.clone();
            tokio::spawn(async move {
                released.await;
                display.post(Message::DetectorsReleased);
            });
        }
        true
    }

    /// Attach detection to a binding that had to go without it
    pub(crate) async fn handle_detectors_released(&mut self) {
        let deferred = self.binder.active().is_some_and(|b| b.detection_deferred());
        if !deferred {
            return;
        }
        info!("Previous detectors released, rebinding with detection");
        self.apply_binding(self.binding_config).await;
    }

    pub(crate) fn handle_detection_result(&mut self, text: String) {
        if !self.binding_config.detection_enabled {
            debug!("Detection result arrived after detection was disabled");
            return;
        }

        self.ui.show_result(&text);
        // Replacing the handle cancels the previous hide
        self.result_timer = Some(
            self.display
                .post_delayed(self.config.result_display(), Message::HideResult),
        );
    }

    pub(crate) fn handle_hide_result(&mut self, id: TimerId) {
        if self.result_timer.as_ref().is_some_and(|t| t.id() == id) {
            self.result_timer = None;
            self.ui.hide_result();
        }
    }

    /// Release everything in teardown order; safe to call more than once
    pub async fn shutdown(&mut self) {
        let Some(worker) = self.worker.take() else {
            return;
        };
        info!("Shutting down camera session");

        self.stop_filter_preview();
        self.gesture.reset();
        self.binder.unbind().await;
        self.binder.deactivate();
        if self.binder.stop_recording() {
            warn!("Recording was still running at shutdown");
        }

        self.result_timer = None;
        self.filter_label_timer = None;
        worker.shutdown_async().await;
        debug!("Camera session shut down");
    }
}
