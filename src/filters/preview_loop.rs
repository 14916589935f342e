// SPDX-License-Identifier: GPL-3.0-only

//! Filter preview loop
//!
//! While a filter other than [`FilterMode::Normal`] is selected, the preview is
//! periodically snapshotted on the display context, transformed on the
//! background worker and rendered back on the display context as an overlay.
//! The next tick is armed only after a frame has been rendered, so at most one
//! transform is ever in flight.
//!
//! Every start and stop bumps a generation counter. Transforms finishing after
//! a stop carry an old generation and are discarded.
//!
//! A transform job always posts a frame, with no image if it panicked, so the
//! loop never waits on a tick that will not come.

use super::FilterMode;
use crate::runtime::{DisplayHandle, TimerHandle, TimerId, WorkerHandle};
use image::RgbaImage;
use std::time::Duration;
use tracing::{debug, trace, warn};

/// Result of one transform, delivered to the display context
pub struct FilterFrame {
    pub generation: u64,
    pub image: Option<RgbaImage>,
}

impl std::fmt::Debug for FilterFrame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilterFrame")
            .field("generation", &self.generation)
            .field("size", &self.image.as_ref().map(|image| image.dimensions()))
            .finish()
    }
}

/// Posts the frame when dropped, whether or not the transform finished
struct FramePoster<M: Send + 'static> {
    display: DisplayHandle<M>,
    frame_message: fn(FilterFrame) -> M,
    generation: u64,
    image: Option<RgbaImage>,
}

impl<M: Send + 'static> Drop for FramePoster<M> {
    fn drop(&mut self) {
        let frame = FilterFrame {
            generation: self.generation,
            image: self.image.take(),
        };
        self.display.post((self.frame_message)(frame));
    }
}

#[derive(Debug, Default)]
pub enum FilterLoopState {
    /// `tick` is `None` while a transform is in flight
    Running {
        mode: FilterMode,
        tick: Option<TimerHandle>,
    },
    #[default]
    Stopped,
}

pub struct FilterPreviewLoop<M> {
    display: DisplayHandle<M>,
    worker: WorkerHandle,
    interval: Duration,
    tick_message: fn(TimerId) -> M,
    frame_message: fn(FilterFrame) -> M,
    state: FilterLoopState,
    generation: u64,
}

impl<M: Send + 'static> FilterPreviewLoop<M> {
    pub fn new(
        display: DisplayHandle<M>,
        worker: WorkerHandle,
        interval: Duration,
        tick_message: fn(TimerId) -> M,
        frame_message: fn(FilterFrame) -> M,
    ) -> Self {
        Self {
            display,
            worker,
            interval,
            tick_message,
            frame_message,
            state: FilterLoopState::Stopped,
            generation: 0,
        }
    }

    pub fn state(&self) -> &FilterLoopState {
        &self.state
    }

    pub fn is_running(&self) -> bool {
        matches!(self.state, FilterLoopState::Running { .. })
    }

    /// (Re)start the loop for `mode`; stops it for [`FilterMode::Normal`]
    ///
    /// The first tick fires immediately.
    pub fn start(&mut self, mode: FilterMode) {
        if mode.is_normal() {
            self.stop();
            return;
        }

        self.generation += 1;
        debug!(mode = %mode, generation = self.generation, "Filter preview started");
        let tick = self.schedule(Duration::ZERO);
        self.state = FilterLoopState::Running {
            mode,
            tick: Some(tick),
        };
    }

    /// Stop the loop; returns false if it was not running
    ///
    /// Drops the pending tick and invalidates an in-flight transform. The
    /// caller clears the overlay.
    pub fn stop(&mut self) -> bool {
        match std::mem::take(&mut self.state) {
            FilterLoopState::Running { mode, .. } => {
                self.generation += 1;
                debug!(mode = %mode, "Filter preview stopped");
                true
            }
            FilterLoopState::Stopped => false,
        }
    }

    /// Handle a tick: take a snapshot and hand it to the worker
    ///
    /// `snapshot` is only called for the current tick.
    pub fn on_tick<S>(&mut self, id: TimerId, snapshot: S)
    where
        S: FnOnce() -> Option<RgbaImage>,
    {
        self.on_tick_with(id, snapshot, |mode, source| mode.apply(source));
    }

    fn on_tick_with<S, T>(&mut self, id: TimerId, snapshot: S, transform: T)
    where
        S: FnOnce() -> Option<RgbaImage>,
        T: FnOnce(FilterMode, &RgbaImage) -> Option<RgbaImage> + Send + 'static,
    {
        let mode = match &mut self.state {
            FilterLoopState::Running { mode, tick } if tick.as_ref().is_some_and(|t| t.id() == id) => {
                tick.take();
                *mode
            }
            _ => {
                trace!(timer = ?id, "Stale filter tick ignored");
                return;
            }
        };

        let Some(source) = snapshot() else {
            trace!("No preview snapshot available");
            self.reschedule();
            return;
        };

        let mut poster = FramePoster {
            display: self.display.clone(),
            frame_message: self.frame_message,
            generation: self.generation,
            image: None,
        };
        let job = async move {
            poster.image = transform(mode, &source);
        };

        if !self.worker.spawn(job) {
            warn!("Background worker stopped, filter preview halted");
            self.stop();
        }
    }

    /// Handle a finished transform
    ///
    /// Returns the image to render, or `None` if the loop stopped or was
    /// restarted meanwhile. Arms the next tick when the frame is current.
    pub fn on_frame(&mut self, frame: FilterFrame) -> Option<RgbaImage> {
        if !self.is_running() || frame.generation != self.generation {
            trace!(generation = frame.generation, "Stale filter frame discarded");
            return None;
        }

        self.reschedule();
        frame.image
    }

    fn reschedule(&mut self) {
        let next = self.schedule(self.interval);
        if let FilterLoopState::Running { tick, .. } = &mut self.state {
            *tick = Some(next);
        }
    }

    fn schedule(&self, delay: Duration) -> TimerHandle {
        self.display.post_delayed(delay, self.tick_message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::{BackgroundWorker, display};
    use image::Rgba;

    #[derive(Debug)]
    enum Msg {
        Tick(TimerId),
        Frame(FilterFrame),
    }

    fn snapshot() -> Option<RgbaImage> {
        Some(RgbaImage::from_pixel(2, 2, Rgba([255, 255, 255, 255])))
    }

    #[tokio::test]
    async fn test_tick_transforms_and_reschedules() {
        let worker = BackgroundWorker::start("filter-test").unwrap();
        let (handle, mut queue) = display::channel();
        let mut preview = FilterPreviewLoop::new(
            handle,
            worker.handle(),
            Duration::from_millis(10),
            Msg::Tick,
            Msg::Frame,
        );

        preview.start(FilterMode::Sepia);
        let Some(Msg::Tick(id)) = queue.recv().await else {
            panic!("expected tick");
        };
        preview.on_tick(id, snapshot);

        let Some(Msg::Frame(frame)) = queue.recv().await else {
            panic!("expected frame");
        };
        let image = preview.on_frame(frame).unwrap();
        assert_eq!(image.get_pixel(0, 0).0, [255, 255, 239, 255]);

        // Rescheduled after rendering
        assert!(matches!(queue.recv().await, Some(Msg::Tick(_))));
        worker.shutdown_async().await;
    }

    #[tokio::test]
    async fn test_failed_transform_still_rearms_tick() {
        let worker = BackgroundWorker::start("filter-test").unwrap();
        let (handle, mut queue) = display::channel();
        let mut preview = FilterPreviewLoop::new(
            handle,
            worker.handle(),
            Duration::from_millis(10),
            Msg::Tick,
            Msg::Frame,
        );

        preview.start(FilterMode::Sepia);
        let Some(Msg::Tick(id)) = queue.recv().await else {
            panic!("expected tick");
        };
        preview.on_tick_with(id, snapshot, |_, _| panic!("transform failed"));

        let Some(Msg::Frame(frame)) = queue.recv().await else {
            panic!("expected frame");
        };
        assert!(frame.image.is_none());
        assert!(preview.on_frame(frame).is_none());
        assert!(preview.is_running());

        // The loop keeps ticking
        let Some(Msg::Tick(id)) = queue.recv().await else {
            panic!("expected tick");
        };
        preview.on_tick(id, snapshot);
        let Some(Msg::Frame(frame)) = queue.recv().await else {
            panic!("expected frame");
        };
        assert!(preview.on_frame(frame).is_some());
        worker.shutdown_async().await;
    }

    #[tokio::test]
    async fn test_frame_after_stop_is_discarded() {
        let worker = BackgroundWorker::start("filter-test").unwrap();
        let (handle, mut queue) = display::channel();
        let mut preview = FilterPreviewLoop::new(
            handle,
            worker.handle(),
            Duration::from_millis(10),
            Msg::Tick,
            Msg::Frame,
        );

        preview.start(FilterMode::Grayscale);
        let Some(Msg::Tick(id)) = queue.recv().await else {
            panic!("expected tick");
        };
        preview.on_tick(id, snapshot);
        assert!(preview.stop());

        let Some(Msg::Frame(frame)) = queue.recv().await else {
            panic!("expected frame");
        };
        assert!(preview.on_frame(frame).is_none());
        assert!(queue.try_recv().is_none());
        worker.shutdown_async().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_is_idempotent() {
        let worker = BackgroundWorker::start("filter-test").unwrap();
        let (handle, mut queue) = display::channel();
        let mut preview = FilterPreviewLoop::new(
            handle,
            worker.handle(),
            Duration::from_millis(120),
            Msg::Tick,
            Msg::Frame,
        );

        preview.start(FilterMode::Sepia);
        assert!(preview.stop());
        assert!(!preview.stop());
        assert!(!preview.is_running());

        tokio::time::advance(Duration::from_secs(1)).await;
        tokio::task::yield_now().await;
        assert!(queue.try_recv().is_none());
        worker.shutdown_async().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_normal_mode_does_not_start() {
        let worker = BackgroundWorker::start("filter-test").unwrap();
        let (handle, _queue) = display::channel();
        let mut preview = FilterPreviewLoop::new(
            handle,
            worker.handle(),
            Duration::from_millis(120),
            Msg::Tick,
            Msg::Frame,
        );

        preview.start(FilterMode::Normal);
        assert!(!preview.is_running());
        worker.shutdown_async().await;
    }
}
