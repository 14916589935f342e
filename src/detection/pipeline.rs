// SPDX-License-Identifier: GPL-3.0-only

//! Detection pipeline
//!
//! [`FrameAnalyzer`] is the analysis behavior handed to the capture surface.
//! The surface calls [`FrameAnalyzer::analyze`] on its own thread for every
//! frame. Frames that do not get through the admission gate are released on
//! the spot; the admitted one is moved onto the background worker, where
//! [`DetectionPipeline::process`] runs both detectors and joins them.

use super::detector::DetectorSet;
use super::gate::{AdmissionPermit, FrameAdmissionGate};
use super::types::DetectionResult;
use crate::frame::Frame;
use crate::runtime::{DisplayHandle, WorkerHandle};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, trace, warn};

/// Receiver of merged detection strings
///
/// Can only be built from a [`DisplayHandle`], so results always arrive on the
/// display context no matter which thread finished the detection.
#[derive(Clone)]
pub struct DetectionListener {
    post: Arc<dyn Fn(String) -> bool + Send + Sync>,
}

impl DetectionListener {
    /// Deliver results as `wrap(result)` messages on `display`
    pub fn on_display<M: Send + 'static>(display: DisplayHandle<M>, wrap: fn(String) -> M) -> Self {
        Self {
            post: Arc::new(move |result| display.post(wrap(result))),
        }
    }

    fn deliver(&self, result: String) {
        if !(self.post)(result) {
            debug!("Display context closed, detection result discarded");
        }
    }
}

/// Runs both detectors over one admitted frame
#[derive(Clone)]
pub struct DetectionPipeline {
    detectors: Arc<DetectorSet>,
    listener: DetectionListener,
}

impl DetectionPipeline {
    pub fn new(detectors: Arc<DetectorSet>, listener: DetectionListener) -> Self {
        Self {
            detectors,
            listener,
        }
    }

    /// Analyze `frame`, release it and the gate, then publish the merged result
    ///
    /// Holding the permit proves the frame was admitted. A failing detector
    /// only removes its own contribution.
    pub async fn process(self, frame: Frame, permit: AdmissionPermit) {
        let DetectionPipeline {
            detectors,
            listener,
        } = self;
        let sequence = frame.sequence;

        let result = {
            // Scoped so the detector reference is gone before the gate re-opens
            let detectors = detectors;
            let (text, codes) = futures::join!(
                detectors.text().analyze(&frame),
                detectors.barcode().analyze(&frame)
            );

            let text = text.unwrap_or_else(|e| {
                warn!(frame = sequence, detector = detectors.text().name(), error = %e, "Detector failed");
                None
            });
            let codes = codes.unwrap_or_else(|e| {
                warn!(frame = sequence, detector = detectors.barcode().name(), error = %e, "Detector failed");
                Vec::new()
            });
            DetectionResult::new(text, codes)
        };

        frame.close();
        drop(permit);

        match result.merged() {
            Some(merged) => {
                debug!(frame = sequence, "Publishing detection result");
                listener.deliver(merged);
            }
            None => trace!(frame = sequence, "Nothing detected"),
        }
    }
}

/// Outcome of offering a frame to the analyzer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// The frame entered the pipeline
    Admitted,
    /// The frame was released without processing
    Dropped,
}

/// Frame counters for one analyzer
#[derive(Debug, Default)]
pub struct AnalyzerStats {
    admitted: AtomicU64,
    dropped: AtomicU64,
}

impl AnalyzerStats {
    pub fn admitted(&self) -> u64 {
        self.admitted.load(Ordering::Relaxed)
    }

    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

/// Analysis behavior bound to the capture surface
#[derive(Clone)]
pub struct FrameAnalyzer {
    gate: FrameAdmissionGate,
    pipeline: DetectionPipeline,
    worker: WorkerHandle,
    stats: Arc<AnalyzerStats>,
}

impl FrameAnalyzer {
    pub fn new(gate: FrameAdmissionGate, pipeline: DetectionPipeline, worker: WorkerHandle) -> Self {
        Self {
            gate,
            pipeline,
            worker,
            stats: Arc::new(AnalyzerStats::default()),
        }
    }

    /// Offer one frame; callable from any thread
    pub fn analyze(&self, frame: Frame) -> Admission {
        let Some(permit) = self.gate.try_acquire() else {
            trace!(frame = frame.sequence, "Pipeline busy, dropping frame");
            self.stats.dropped.fetch_add(1, Ordering::Relaxed);
            frame.close();
            return Admission::Dropped;
        };

        let sequence = frame.sequence;
        let job = self.pipeline.clone().process(frame, permit);
        if !self.worker.spawn(job) {
            // The rejected job was dropped, releasing its frame and permit
            warn!(frame = sequence, "Background worker stopped, dropping frame");
            self.stats.dropped.fetch_add(1, Ordering::Relaxed);
            return Admission::Dropped;
        }

        self.stats.admitted.fetch_add(1, Ordering::Relaxed);
        Admission::Admitted
    }

    pub fn stats(&self) -> &AnalyzerStats {
        &self.stats
    }

    pub fn gate(&self) -> &FrameAdmissionGate {
        &self.gate
    }
}

impl std::fmt::Debug for FrameAnalyzer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameAnalyzer")
            .field("detectors", &self.pipeline.detectors.id())
            .field("gate", &self.gate)
            .finish()
    }
}
