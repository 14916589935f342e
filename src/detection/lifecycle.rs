// SPDX-License-Identifier: GPL-3.0-only

//! Analyzer lifecycle
//!
//! Owns the detector set for one detection-enabled span. Pipelines hold
//! shared references while a frame is in flight; the set is closed when the
//! last reference goes away, which after a drained rebind is always the
//! lifecycle's own.
//!
//! When a deactivated set is still referenced, it is retiring: no new set is
//! created until it has been closed, so two sets never coexist.

use super::detector::{DetectorFactory, DetectorSet};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info, warn};

pub struct AnalyzerLifecycle {
    factory: Arc<dyn DetectorFactory>,
    active: Option<Arc<DetectorSet>>,
    retiring: Option<watch::Receiver<bool>>,
}

impl AnalyzerLifecycle {
    pub fn new(factory: Arc<dyn DetectorFactory>) -> Self {
        Self {
            factory,
            active: None,
            retiring: None,
        }
    }

    /// Return the active set, creating one if needed
    ///
    /// Returns `None` while a previously deactivated set is still alive.
    pub fn activate(&mut self) -> Option<Arc<DetectorSet>> {
        if let Some(set) = &self.active {
            return Some(Arc::clone(set));
        }
        if self.is_retiring() {
            debug!("Previous detectors not yet released, activation refused");
            return None;
        }

        let set = Arc::new(self.factory.create());
        info!(set = %set.id(), "Detectors activated");
        self.active = Some(Arc::clone(&set));
        Some(set)
    }

    /// Whether a deactivated set is still waiting for its last holder
    pub fn is_retiring(&mut self) -> bool {
        let released = self.retiring.as_ref().is_none_or(|rx| *rx.borrow());
        if released {
            self.retiring = None;
        }
        !released
    }

    /// Resolves once the retiring set, if any, has been closed
    pub fn retired(&self) -> impl Future<Output = ()> + Send + 'static {
        let retiring = self.retiring.clone();
        async move {
            if let Some(mut rx) = retiring {
                // A dropped sender means the set is gone as well
                let _ = rx.wait_for(|released| *released).await;
            }
        }
    }

    /// Release the active set; no-op if nothing is active
    ///
    /// Callers must have unbound every analyzer using the set and drained the
    /// admission gate first. Returns true if a set was released immediately.
    pub fn deactivate(&mut self) -> bool {
        let Some(set) = self.active.take() else {
            return false;
        };

        let id = set.id();
        match Arc::try_unwrap(set) {
            Ok(set) => {
                drop(set);
                true
            }
            Err(shared) => {
                self.retiring = Some(shared.release_signal());
                warn!(
                    set = %id,
                    holders = Arc::strong_count(&shared) - 1,
                    "Detectors still referenced, release deferred to last holder"
                );
                false
            }
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }
}

impl Drop for AnalyzerLifecycle {
    fn drop(&mut self) {
        self.deactivate();
    }
}
