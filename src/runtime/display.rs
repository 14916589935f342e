// SPDX-License-Identifier: GPL-3.0-only

//! Display context dispatch
//!
//! The display context is a single message loop that owns all UI state. Other
//! threads never touch that state directly: they post messages through a
//! [`DisplayHandle`], and the loop applies them one at a time in posting order.
//!
//! Delayed messages are armed through [`DisplayHandle::post_delayed`]. The
//! returned [`TimerHandle`] is the only way to cancel it, and dropping the
//! handle cancels it too. A timer that already fired before cancellation still
//! delivers its message, so owners compare the carried [`TimerId`] against the
//! timer they currently hold and ignore stale ones. Both cancellation and that
//! comparison run on the display context, which makes the pair race-free.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::AbortHandle;
use tracing::trace;

/// Identifies one armed timer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerId(u64);

/// Sending side of the display context
pub struct DisplayHandle<M> {
    tx: mpsc::UnboundedSender<M>,
    next_timer: Arc<AtomicU64>,
}

impl<M> Clone for DisplayHandle<M> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
            next_timer: Arc::clone(&self.next_timer),
        }
    }
}

/// Receiving side of the display context, consumed by the message loop
pub struct DisplayQueue<M> {
    rx: mpsc::UnboundedReceiver<M>,
}

/// Create a connected handle/queue pair
pub fn channel<M: Send + 'static>() -> (DisplayHandle<M>, DisplayQueue<M>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (
        DisplayHandle {
            tx,
            next_timer: Arc::new(AtomicU64::new(1)),
        },
        DisplayQueue { rx },
    )
}

impl<M: Send + 'static> DisplayHandle<M> {
    /// Queue a message for the display context
    ///
    /// Returns false when the display loop has already exited.
    pub fn post(&self, message: M) -> bool {
        self.tx.send(message).is_ok()
    }

    /// Deliver `make(id)` to the display context after `delay`
    ///
    /// The deadline is computed now, not when the timer task first runs.
    /// Must be called from within a tokio runtime.
    pub fn post_delayed<F>(&self, delay: Duration, make: F) -> TimerHandle
    where
        F: FnOnce(TimerId) -> M + Send + 'static,
    {
        let id = TimerId(self.next_timer.fetch_add(1, Ordering::Relaxed));
        let deadline = tokio::time::Instant::now() + delay;
        let tx = self.tx.clone();

        let task = tokio::spawn(async move {
            tokio::time::sleep_until(deadline).await;
            trace!(timer = id.0, "Display timer fired");
            let _ = tx.send(make(id));
        });

        TimerHandle {
            id,
            abort: task.abort_handle(),
        }
    }

    /// Whether the display loop is still receiving
    pub fn is_open(&self) -> bool {
        !self.tx.is_closed()
    }
}

impl<M> DisplayQueue<M> {
    /// Wait for the next message; `None` once every handle is gone
    pub async fn recv(&mut self) -> Option<M> {
        self.rx.recv().await
    }

    /// Take a message if one is already queued
    pub fn try_recv(&mut self) -> Option<M> {
        self.rx.try_recv().ok()
    }

    /// Stop accepting new messages; queued ones can still be received
    pub fn close(&mut self) {
        self.rx.close();
    }
}

/// Single-owner handle of an armed display timer
///
/// Dropping the handle cancels the timer.
#[derive(Debug)]
pub struct TimerHandle {
    id: TimerId,
    abort: AbortHandle,
}

impl TimerHandle {
    /// The id carried by this timer's message
    pub fn id(&self) -> TimerId {
        self.id
    }

    /// Cancel the timer (same as dropping the handle)
    pub fn cancel(self) {}
}

impl Drop for TimerHandle {
    fn drop(&mut self) {
        self.abort.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    enum Msg {
        Now(u32),
        Later(TimerId),
    }

    #[tokio::test]
    async fn test_post_preserves_order() {
        let (handle, mut queue) = channel::<Msg>();
        assert!(handle.post(Msg::Now(1)));
        assert!(handle.post(Msg::Now(2)));
        assert_eq!(queue.recv().await, Some(Msg::Now(1)));
        assert_eq!(queue.recv().await, Some(Msg::Now(2)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_delayed_message_carries_its_id() {
        let (handle, mut queue) = channel::<Msg>();
        let timer = handle.post_delayed(Duration::from_millis(100), Msg::Later);
        let id = timer.id();

        tokio::time::advance(Duration::from_millis(99)).await;
        tokio::task::yield_now().await;
        assert!(queue.try_recv().is_none());

        tokio::time::advance(Duration::from_millis(1)).await;
        assert_eq!(queue.recv().await, Some(Msg::Later(id)));
        drop(timer);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_timer_never_fires() {
        let (handle, mut queue) = channel::<Msg>();
        let timer = handle.post_delayed(Duration::from_millis(50), Msg::Later);
        timer.cancel();

        tokio::time::advance(Duration::from_millis(200)).await;
        tokio::task::yield_now().await;
        assert!(queue.try_recv().is_none());
    }

    #[tokio::test]
    async fn test_post_after_queue_dropped_reports_closed() {
        let (handle, queue) = channel::<Msg>();
        drop(queue);
        assert!(!handle.is_open());
        assert!(!handle.post(Msg::Now(3)));
    }
}
