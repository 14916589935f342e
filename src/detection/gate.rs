// SPDX-License-Identifier: GPL-3.0-only

//! Frame admission gate
//!
//! Single-flight guard over the detection pipeline. A frame is admitted only
//! when nothing else is being analyzed; every other frame is dropped by the
//! caller immediately. Excess work is never queued.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::Notify;

/// Observable state of the gate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    /// No frame in flight
    Idle,
    /// One frame is being analyzed
    Busy,
}

/// Cloneable handle to one admission flag
#[derive(Clone, Default)]
pub struct FrameAdmissionGate {
    inner: Arc<GateInner>,
}

#[derive(Default)]
struct GateInner {
    busy: AtomicBool,
    idle: Notify,
}

impl FrameAdmissionGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Try to move `Idle -> Busy`; true for exactly one caller per busy period
    pub fn try_admit(&self) -> bool {
        self.inner
            .busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Move `Busy -> Idle`
    ///
    /// Must be called exactly once per successful [`try_admit`](Self::try_admit).
    /// Prefer [`try_acquire`](Self::try_acquire), whose permit does this on drop.
    pub fn release(&self) {
        self.inner.busy.store(false, Ordering::Release);
        self.inner.idle.notify_waiters();
    }

    /// Admit and wrap the busy period in a permit that releases on drop
    pub fn try_acquire(&self) -> Option<AdmissionPermit> {
        self.try_admit().then(|| AdmissionPermit { gate: self.clone() })
    }

    pub fn state(&self) -> PipelineState {
        if self.inner.busy.load(Ordering::Acquire) {
            PipelineState::Busy
        } else {
            PipelineState::Idle
        }
    }

    pub fn is_idle(&self) -> bool {
        self.state() == PipelineState::Idle
    }

    /// Wait until no frame is in flight
    pub async fn wait_idle(&self) {
        loop {
            let notified = self.inner.idle.notified();
            tokio::pin!(notified);
            // Register before checking so a release in between is not missed
            notified.as_mut().enable();

            if self.is_idle() {
                return;
            }
            notified.await;
        }
    }

    /// [`wait_idle`](Self::wait_idle) bounded by `timeout`; false if it elapsed
    pub async fn drain(&self, timeout: Duration) -> bool {
        tokio::time::timeout(timeout, self.wait_idle()).await.is_ok()
    }
}

impl std::fmt::Debug for FrameAdmissionGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("FrameAdmissionGate")
            .field(&self.state())
            .finish()
    }
}

/// Proof of admission; releases the gate exactly once when dropped
#[must_use = "dropping the permit immediately re-opens the gate"]
pub struct AdmissionPermit {
    gate: FrameAdmissionGate,
}

impl Drop for AdmissionPermit {
    fn drop(&mut self) {
        self.gate.release();
    }
}
