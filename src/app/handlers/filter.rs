// SPDX-License-Identifier: GPL-3.0-only

//! Filter selection and preview overlay handlers

use crate::app::state::{AppModel, Message};
use crate::filters::preview_loop::FilterFrame;
use crate::runtime::TimerId;
use tracing::info;

impl AppModel {
    pub(crate) async fn handle_cycle_filter(&mut self) {
        let mut config = self.binding_config;
        config.filter_mode = config.filter_mode.next();
        info!(filter = %config.filter_mode, "Filter selected");

        self.ui.show_filter_label(&config.filter_mode.label());
        self.filter_label_timer = Some(
            self.display
                .post_delayed(self.config.filter_label_display(), Message::HideFilterLabel),
        );

        if config.filter_mode.is_normal() {
            self.stop_filter_preview();
        } else {
            self.filter_loop.start(config.filter_mode);
        }
        self.apply_binding(config).await;
    }

    pub(crate) fn handle_filter_tick(&mut self, id: TimerId) {
        let ui = &mut self.ui;
        self.filter_loop.on_tick(id, || ui.snapshot_preview());
    }

    pub(crate) fn handle_filter_frame(&mut self, frame: FilterFrame) {
        if let Some(image) = self.filter_loop.on_frame(frame) {
            self.ui.render_overlay(Some(&image));
        }
    }

    pub(crate) fn handle_hide_filter_label(&mut self, id: TimerId) {
        if self.filter_label_timer.as_ref().is_some_and(|t| t.id() == id) {
            self.filter_label_timer = None;
            self.ui.hide_filter_label();
        }
    }

    /// Stop the preview loop and clear its overlay
    pub(crate) fn stop_filter_preview(&mut self) {
        self.filter_loop.stop();
        self.ui.render_overlay(None);
    }
}
