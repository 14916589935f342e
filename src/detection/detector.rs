// SPDX-License-Identifier: GPL-3.0-only

//! Detector adapters
//!
//! A detector wraps one recognizer behind an asynchronous `analyze` call. It
//! borrows the frame for the duration of that call only, so it cannot keep
//! the buffer alive past the pipeline's release.

use crate::errors::DetectorError;
use crate::frame::Frame;
use futures::future::BoxFuture;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Result type for detector operations
pub type DetectorResult<T> = Result<T, DetectorError>;

/// One long-lived recognizer
pub trait Detector: Send + Sync {
    /// What a successful analysis yields
    type Output: Send;

    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Analyze one frame
    fn analyze<'a>(&'a self, frame: &'a Frame) -> BoxFuture<'a, DetectorResult<Self::Output>>;

    /// Release the recognizer's resources
    fn close(&self) -> DetectorResult<()>;
}

/// Text recognizer: the recognized text, if any
pub type TextRecognizer = dyn Detector<Output = Option<String>>;

/// Barcode scanner: raw values of every code found
pub type BarcodeScanner = dyn Detector<Output = Vec<String>>;

/// The pair of detectors used for one detection-enabled binding
///
/// Dropping the set closes both detectors. Close failures are logged and do
/// not stop the other detector from being closed.
pub struct DetectorSet {
    id: Uuid,
    text: Box<TextRecognizer>,
    barcode: Box<BarcodeScanner>,
    released: watch::Sender<bool>,
}

impl DetectorSet {
    pub fn new(text: Box<TextRecognizer>, barcode: Box<BarcodeScanner>) -> Self {
        Self {
            id: Uuid::new_v4(),
            text,
            barcode,
            released: watch::Sender::new(false),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Flips to true once both detectors have been closed
    pub fn release_signal(&self) -> watch::Receiver<bool> {
        self.released.subscribe()
    }

    pub fn text(&self) -> &TextRecognizer {
        self.text.as_ref()
    }

    pub fn barcode(&self) -> &BarcodeScanner {
        self.barcode.as_ref()
    }
}

impl Drop for DetectorSet {
    fn drop(&mut self) {
        if let Err(e) = self.text.close() {
            warn!(set = %self.id, detector = self.text.name(), error = %e, "Error closing detector");
        }
        if let Err(e) = self.barcode.close() {
            warn!(set = %self.id, detector = self.barcode.name(), error = %e, "Error closing detector");
        }
        info!(set = %self.id, "Detectors released");
        self.released.send_replace(true);
    }
}

impl std::fmt::Debug for DetectorSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DetectorSet")
            .field("id", &self.id)
            .field("text", &self.text.name())
            .field("barcode", &self.barcode.name())
            .finish()
    }
}

/// Creates detector sets on activation
pub trait DetectorFactory: Send + Sync {
    fn create(&self) -> DetectorSet;
}

/// Factory for the built-in detectors
///
/// Barcodes are decoded with [`QrScanner`](super::QrScanner). No OCR engine
/// ships with the crate, so the text side reports nothing unless a recognizer
/// is supplied through [`DefaultDetectors::with_text`].
#[derive(Clone, Default)]
pub struct DefaultDetectors {
    text: Option<Arc<dyn Fn() -> Box<TextRecognizer> + Send + Sync>>,
}

impl DefaultDetectors {
    /// Use `make` to build the text recognizer of every new set
    pub fn with_text<F>(make: F) -> Self
    where
        F: Fn() -> Box<TextRecognizer> + Send + Sync + 'static,
    {
        Self {
            text: Some(Arc::new(make)),
        }
    }
}

impl DetectorFactory for DefaultDetectors {
    fn create(&self) -> DetectorSet {
        let text = match &self.text {
            Some(make) => make(),
            None => Box::new(NoTextRecognizer),
        };
        DetectorSet::new(text, Box::new(super::QrScanner::new()))
    }
}

/// Text recognizer used when no OCR engine is available
pub struct NoTextRecognizer;

impl Detector for NoTextRecognizer {
    type Output = Option<String>;

    fn name(&self) -> &'static str {
        "no-text"
    }

    fn analyze<'a>(&'a self, frame: &'a Frame) -> BoxFuture<'a, DetectorResult<Option<String>>> {
        Box::pin(async move {
            debug!(frame = frame.sequence, "No text recognizer configured");
            Ok(None)
        })
    }

    fn close(&self) -> DetectorResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::SensorRotation;
    use image::RgbaImage;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Closing {
        closes: Arc<AtomicUsize>,
        fail: bool,
    }

    impl Detector for Closing {
        type Output = Vec<String>;

        fn name(&self) -> &'static str {
            "closing"
        }

        fn analyze<'a>(&'a self, _frame: &'a Frame) -> BoxFuture<'a, DetectorResult<Vec<String>>> {
            Box::pin(async { Ok(Vec::new()) })
        }

        fn close(&self) -> DetectorResult<()> {
            self.closes.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(DetectorError::ReleaseFailed("busy".into()))
            } else {
                Ok(())
            }
        }
    }

    #[test]
    fn test_dropping_set_closes_barcode_even_if_text_fails() {
        struct FailingText(Arc<AtomicUsize>);
        impl Detector for FailingText {
            type Output = Option<String>;
            fn name(&self) -> &'static str {
                "failing-text"
            }
            fn analyze<'a>(&'a self, _: &'a Frame) -> BoxFuture<'a, DetectorResult<Option<String>>> {
                Box::pin(async { Ok(None) })
            }
            fn close(&self) -> DetectorResult<()> {
                self.0.fetch_add(1, Ordering::SeqCst);
                Err(DetectorError::ReleaseFailed("stuck".into()))
            }
        }

        let text_closes = Arc::new(AtomicUsize::new(0));
        let barcode_closes = Arc::new(AtomicUsize::new(0));
        let set = DetectorSet::new(
            Box::new(FailingText(Arc::clone(&text_closes))),
            Box::new(Closing {
                closes: Arc::clone(&barcode_closes),
                fail: false,
            }),
        );
        drop(set);

        assert_eq!(text_closes.load(Ordering::SeqCst), 1);
        assert_eq!(barcode_closes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_no_text_recognizer_reports_nothing() {
        let frame = Frame::new(7, Arc::new(RgbaImage::new(2, 2)), SensorRotation::None);
        assert_eq!(NoTextRecognizer.analyze(&frame).await, Ok(None));
    }

    #[test]
    fn test_default_factory_uses_custom_text_recognizer() {
        let closes = Arc::new(AtomicUsize::new(0));
        let factory = {
            let closes = Arc::clone(&closes);
            DefaultDetectors::with_text(move || {
                Box::new(FailingTextStub(Arc::clone(&closes))) as Box<TextRecognizer>
            })
        };

        let set = factory.create();
        assert_eq!(set.text().name(), "stub-text");
        assert_eq!(set.barcode().name(), "qr");
        drop(set);
        assert_eq!(closes.load(Ordering::SeqCst), 1);
    }

    struct FailingTextStub(Arc<AtomicUsize>);

    impl Detector for FailingTextStub {
        type Output = Option<String>;
        fn name(&self) -> &'static str {
            "stub-text"
        }
        fn analyze<'a>(&'a self, _: &'a Frame) -> BoxFuture<'a, DetectorResult<Option<String>>> {
            Box::pin(async { Ok(Some("stub".into())) })
        }
        fn close(&self) -> DetectorResult<()> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }
}
