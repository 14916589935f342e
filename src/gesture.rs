// SPDX-License-Identifier: GPL-3.0-only

//! Capture gesture recognizer
//!
//! One control does two things: a short tap takes a photo, holding it past
//! the long-press threshold starts a recording that ends on release.
//!
//! ```text
//! Idle --press--> Pressed --timer--> RecordingPending --Started--> Recording
//!                    |                      |                          |
//!                    +--release: Capture    +--release: StopRecording--+
//! ```
//!
//! The recognizer lives on the display context. The debounce timer is a
//! display timer, so its expiry arrives as a message and goes through
//! [`CaptureGesture::on_timer`].

use crate::runtime::{DisplayHandle, TimerHandle, TimerId};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, trace};

/// Current gesture phase
#[derive(Debug, Default)]
pub enum GestureState {
    #[default]
    Idle,
    /// Held, the debounce timer is armed
    Pressed { since: Instant, timer: TimerHandle },
    /// Threshold reached, waiting for the recorder to confirm
    RecordingPending,
    Recording,
}

impl GestureState {
    pub fn is_idle(&self) -> bool {
        matches!(self, GestureState::Idle)
    }

    pub fn is_recording(&self) -> bool {
        matches!(self, GestureState::RecordingPending | GestureState::Recording)
    }
}

/// What the owner must do in response to a gesture
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureCommand {
    Capture,
    StartRecording,
    StopRecording,
}

#[derive(Debug)]
pub struct CaptureGesture {
    state: GestureState,
    threshold: Duration,
}

impl CaptureGesture {
    pub fn new(threshold: Duration) -> Self {
        Self {
            state: GestureState::Idle,
            threshold,
        }
    }

    pub fn state(&self) -> &GestureState {
        &self.state
    }

    /// Start a press and arm the debounce timer
    ///
    /// `on_timer` builds the message delivering the expiry back to the
    /// display loop. Returns false if a press is already active.
    pub fn press<M, F>(&mut self, display: &DisplayHandle<M>, on_timer: F) -> bool
    where
        M: Send + 'static,
        F: FnOnce(TimerId) -> M + Send + 'static,
    {
        if !self.state.is_idle() {
            trace!(state = ?self.state, "Press ignored, gesture already active");
            return false;
        }

        let timer = display.post_delayed(self.threshold, on_timer);
        debug!(timer = ?timer.id(), "Capture pressed");
        self.state = GestureState::Pressed {
            since: Instant::now(),
            timer,
        };
        true
    }

    /// End the press
    ///
    /// If the threshold has already passed but the timer message has not been
    /// handled yet, the press still counts as a hold and both recording
    /// commands are returned in order.
    pub fn release(&mut self) -> Vec<GestureCommand> {
        match std::mem::take(&mut self.state) {
            GestureState::Idle => Vec::new(),
            GestureState::Pressed { since, timer } => {
                timer.cancel();
                if since.elapsed() >= self.threshold {
                    debug!("Release after threshold, treating as hold");
                    vec![GestureCommand::StartRecording, GestureCommand::StopRecording]
                } else {
                    debug!("Tap recognized");
                    vec![GestureCommand::Capture]
                }
            }
            GestureState::RecordingPending | GestureState::Recording => {
                debug!("Hold released");
                vec![GestureCommand::StopRecording]
            }
        }
    }

    /// Pointer left the control or the press was aborted; same as release
    pub fn cancel(&mut self) -> Vec<GestureCommand> {
        self.release()
    }

    /// Debounce timer expiry
    ///
    /// Ignored unless `id` is the timer of the current press.
    pub fn on_timer(&mut self, id: TimerId) -> Option<GestureCommand> {
        match &self.state {
            GestureState::Pressed { timer, .. } if timer.id() == id => {
                debug!("Long press recognized");
                self.state = GestureState::RecordingPending;
                Some(GestureCommand::StartRecording)
            }
            _ => {
                trace!(timer = ?id, "Stale gesture timer ignored");
                None
            }
        }
    }

    /// The recorder confirmed that recording began
    pub fn on_recording_started(&mut self) -> bool {
        if matches!(self.state, GestureState::RecordingPending) {
            self.state = GestureState::Recording;
            true
        } else {
            false
        }
    }

    /// Drop any armed timer and return to idle without emitting commands
    pub fn reset(&mut self) {
        if !self.state.is_idle() {
            debug!(state = ?self.state, "Gesture reset");
        }
        self.state = GestureState::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::display;

    #[derive(Debug, PartialEq)]
    enum Msg {
        Timer(TimerId),
    }

    fn gesture() -> CaptureGesture {
        CaptureGesture::new(Duration::from_millis(350))
    }

    #[tokio::test(start_paused = true)]
    async fn test_tap_emits_capture() {
        let (handle, mut queue) = display::channel();
        let mut gesture = gesture();
        assert!(gesture.press(&handle, Msg::Timer));

        tokio::time::advance(Duration::from_millis(349)).await;
        assert_eq!(gesture.release(), vec![GestureCommand::Capture]);
        assert!(gesture.state().is_idle());

        tokio::time::advance(Duration::from_millis(100)).await;
        tokio::task::yield_now().await;
        assert!(queue.try_recv().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_hold_emits_start_then_stop() {
        let (handle, mut queue) = display::channel();
        let mut gesture = gesture();
        gesture.press(&handle, Msg::Timer);

        tokio::time::advance(Duration::from_millis(350)).await;
        let Some(Msg::Timer(id)) = queue.recv().await else {
            panic!("display queue closed");
        };
        assert_eq!(gesture.on_timer(id), Some(GestureCommand::StartRecording));
        assert!(gesture.on_recording_started());
        assert!(matches!(gesture.state(), GestureState::Recording));

        assert_eq!(gesture.release(), vec![GestureCommand::StopRecording]);
        assert!(gesture.state().is_idle());
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_press_is_ignored() {
        let (handle, _queue) = display::channel();
        let mut gesture = gesture();
        assert!(gesture.press(&handle, Msg::Timer));
        assert!(!gesture.press(&handle, Msg::Timer));
        assert_eq!(gesture.release(), vec![GestureCommand::Capture]);
        assert!(gesture.release().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_timer_is_ignored() {
        let (handle, mut queue) = display::channel();
        let mut gesture = gesture();
        gesture.press(&handle, Msg::Timer);
        tokio::time::advance(Duration::from_millis(350)).await;
        let Some(Msg::Timer(first)) = queue.recv().await else {
            panic!("display queue closed");
        };

        // The timer fired but the release was handled first
        assert_eq!(
            gesture.release(),
            vec![GestureCommand::StartRecording, GestureCommand::StopRecording]
        );
        gesture.press(&handle, Msg::Timer);
        assert_eq!(gesture.on_timer(first), None);
        assert!(matches!(gesture.state(), GestureState::Pressed { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_before_threshold_captures() {
        let (handle, _queue) = display::channel();
        let mut gesture = gesture();
        gesture.press(&handle, Msg::Timer);
        assert_eq!(gesture.cancel(), vec![GestureCommand::Capture]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reset_cancels_timer() {
        let (handle, mut queue) = display::channel();
        let mut gesture = gesture();
        gesture.press(&handle, Msg::Timer);
        gesture.reset();

        tokio::time::advance(Duration::from_secs(1)).await;
        tokio::task::yield_now().await;
        assert!(queue.try_recv().is_none());
        assert!(gesture.state().is_idle());
    }
}
