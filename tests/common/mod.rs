// SPDX-License-Identifier: MPL-2.0

//! Shared fakes for integration tests

#![allow(dead_code)]

use futures::future::BoxFuture;
use futures::stream;
use image::RgbaImage;
use smartcam::detection::{Detector, DetectorFactory, DetectorResult, DetectorSet};
use smartcam::errors::{BindingError, CaptureError, DetectorError, RecordingError};
use smartcam::session::{Behaviors, RecordEvent, RecordStream};
use smartcam::{
    CaptureIcon, CaptureSurface, DisplaySurface, Facing, FilterMode, Frame, Notice, SensorRotation,
};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;

/// Ordered log shared between fakes and the test body
#[derive(Clone, Default)]
pub struct Journal(Arc<Mutex<Vec<String>>>);

impl Journal {
    pub fn push(&self, entry: impl Into<String>) {
        self.0.lock().unwrap().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    pub fn position(&self, entry: &str) -> Option<usize> {
        self.entries().iter().position(|e| e == entry)
    }

    pub fn count(&self, entry: &str) -> usize {
        self.entries().iter().filter(|e| *e == entry).count()
    }
}

/// Frame whose release increments `released`
pub fn counted_frame(sequence: u64, released: &Arc<AtomicUsize>) -> Frame {
    let released = Arc::clone(released);
    Frame::new(sequence, Arc::new(RgbaImage::new(8, 8)), SensorRotation::Rotate90).with_release(
        move || {
            released.fetch_add(1, Ordering::SeqCst);
        },
    )
}

/// Scripted text recognizer
pub struct FakeText {
    pub set: usize,
    pub journal: Journal,
    pub output: Result<Option<String>, DetectorError>,
    pub delay: Duration,
}

impl Detector for FakeText {
    type Output = Option<String>;

    fn name(&self) -> &'static str {
        "fake-text"
    }

    fn analyze<'a>(&'a self, _frame: &'a Frame) -> BoxFuture<'a, DetectorResult<Option<String>>> {
        Box::pin(async move {
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            self.output.clone()
        })
    }

    fn close(&self) -> DetectorResult<()> {
        self.journal.push(format!("close text {}", self.set));
        Ok(())
    }
}

/// Scripted barcode scanner
pub struct FakeBarcode {
    pub set: usize,
    pub journal: Journal,
    pub output: Result<Vec<String>, DetectorError>,
}

impl Detector for FakeBarcode {
    type Output = Vec<String>;

    fn name(&self) -> &'static str {
        "fake-barcode"
    }

    fn analyze<'a>(&'a self, _frame: &'a Frame) -> BoxFuture<'a, DetectorResult<Vec<String>>> {
        Box::pin(async move { self.output.clone() })
    }

    fn close(&self) -> DetectorResult<()> {
        self.journal.push(format!("close barcode {}", self.set));
        Ok(())
    }
}

/// Factory numbering each set and logging creation to the journal
pub struct FakeFactory {
    pub journal: Journal,
    pub text: Result<Option<String>, DetectorError>,
    pub codes: Result<Vec<String>, DetectorError>,
    pub delay: Duration,
    created: AtomicUsize,
}

impl FakeFactory {
    pub fn new(journal: Journal) -> Self {
        Self {
            journal,
            text: Ok(None),
            codes: Ok(Vec::new()),
            delay: Duration::ZERO,
            created: AtomicUsize::new(0),
        }
    }

    pub fn with_results(
        mut self,
        text: Result<Option<String>, DetectorError>,
        codes: Result<Vec<String>, DetectorError>,
    ) -> Self {
        self.text = text;
        self.codes = codes;
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }
}

impl DetectorFactory for FakeFactory {
    fn create(&self) -> DetectorSet {
        let set = self.created.fetch_add(1, Ordering::SeqCst) + 1;
        self.journal.push(format!("create {}", set));
        DetectorSet::new(
            Box::new(FakeText {
                set,
                journal: self.journal.clone(),
                output: self.text.clone(),
                delay: self.delay,
            }),
            Box::new(FakeBarcode {
                set,
                journal: self.journal.clone(),
                output: self.codes.clone(),
            }),
        )
    }
}

/// Capture surface that logs every call and keeps the bound analyzer
pub struct FakeSurface {
    pub journal: Journal,
    pub fail_bind: Mutex<bool>,
    pub recording_facings: Vec<Facing>,
    pub torch_facings: Vec<Facing>,
    /// How long after stop the recording reports `Finalized`
    pub finalize_delay: Duration,
    bound: Mutex<Option<Behaviors>>,
    recording: Mutex<Option<(mpsc::UnboundedSender<RecordEvent>, PathBuf)>>,
}

impl FakeSurface {
    pub fn new(journal: Journal) -> Self {
        Self {
            journal,
            fail_bind: Mutex::new(false),
            recording_facings: vec![Facing::Front, Facing::Back],
            torch_facings: vec![Facing::Back],
            finalize_delay: Duration::ZERO,
            bound: Mutex::new(None),
            recording: Mutex::new(None),
        }
    }

    pub fn set_fail_bind(&self, fail: bool) {
        *self.fail_bind.lock().unwrap() = fail;
    }

    pub fn is_bound(&self) -> bool {
        self.bound.lock().unwrap().is_some()
    }

    /// Deliver a frame to the bound analyzer, as the camera thread would
    pub fn deliver(&self, frame: Frame) -> bool {
        let analyzer = self
            .bound
            .lock()
            .unwrap()
            .as_ref()
            .and_then(|b| b.analyzer.clone());
        match analyzer {
            Some(analyzer) => {
                analyzer.analyze(frame);
                true
            }
            None => false,
        }
    }
}

impl CaptureSurface for FakeSurface {
    fn supports_recording(&self, facing: Facing) -> bool {
        self.recording_facings.contains(&facing)
    }

    fn has_torch(&self, facing: Facing) -> bool {
        self.torch_facings.contains(&facing)
    }

    fn bind(&self, facing: Facing, behaviors: Behaviors) -> Result<(), BindingError> {
        if *self.fail_bind.lock().unwrap() {
            self.journal.push(format!("bind {} failed", facing));
            return Err(BindingError::Rejected("fake rejection".into()));
        }
        self.journal.push(format!(
            "bind {} analyzer={} recorder={}",
            facing,
            behaviors.analyzer.is_some(),
            behaviors.recorder
        ));
        *self.bound.lock().unwrap() = Some(behaviors);
        Ok(())
    }

    fn unbind_all(&self) {
        if self.bound.lock().unwrap().take().is_some() {
            self.journal.push("unbind");
        }
    }

    fn capture(
        &self,
        target: PathBuf,
        filter: FilterMode,
    ) -> BoxFuture<'static, Result<PathBuf, CaptureError>> {
        self.journal.push("capture");
        if !filter.is_normal() {
            self.journal.push(format!("capture filter {}", filter));
        }
        Box::pin(async move { Ok(target) })
    }

    fn start_recording(
        &self,
        target: PathBuf,
        _filter: FilterMode,
    ) -> Result<RecordStream, RecordingError> {
        self.journal.push("start recording");
        let (tx, rx) = mpsc::unbounded_channel();
        let _ = tx.send(RecordEvent::Started);
        *self.recording.lock().unwrap() = Some((tx, target));
        Ok(Box::pin(stream::unfold(rx, |mut rx| async move {
            rx.recv().await.map(|event| (event, rx))
        })))
    }

    /// Finalizes after `finalize_delay`; the stream ends with it
    fn stop_recording(&self) -> Result<(), RecordingError> {
        self.journal.push("stop recording");
        let Some((tx, target)) = self.recording.lock().unwrap().take() else {
            return Err(RecordingError::NotRecording);
        };
        let delay = self.finalize_delay;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = tx.send(RecordEvent::Finalized(Ok(target)));
        });
        Ok(())
    }

    fn set_torch(&self, on: bool) -> Result<(), String> {
        self.journal.push(format!("torch {}", on));
        Ok(())
    }
}

/// What the UI was asked to do
#[derive(Debug, Clone, PartialEq)]
pub enum UiEvent {
    ShowResult(String),
    HideResult,
    ShowFilterLabel(String),
    HideFilterLabel,
    Icon(CaptureIcon),
    Notice(Notice),
    Overlay(bool),
}

/// Display surface recording every call
#[derive(Clone, Default)]
pub struct FakeUi {
    pub events: Arc<Mutex<Vec<UiEvent>>>,
}

impl FakeUi {
    pub fn events(&self) -> Vec<UiEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn notices(&self) -> Vec<Notice> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                UiEvent::Notice(n) => Some(n),
                _ => None,
            })
            .collect()
    }

    fn push(&self, event: UiEvent) {
        self.events.lock().unwrap().push(event);
    }
}

impl DisplaySurface for FakeUi {
    fn show_result(&mut self, text: &str) {
        self.push(UiEvent::ShowResult(text.to_string()));
    }

    fn hide_result(&mut self) {
        self.push(UiEvent::HideResult);
    }

    fn show_filter_label(&mut self, label: &str) {
        self.push(UiEvent::ShowFilterLabel(label.to_string()));
    }

    fn hide_filter_label(&mut self) {
        self.push(UiEvent::HideFilterLabel);
    }

    fn set_capture_icon(&mut self, icon: CaptureIcon) {
        self.push(UiEvent::Icon(icon));
    }

    fn notify(&mut self, notice: Notice) {
        self.push(UiEvent::Notice(notice));
    }

    fn render_overlay(&mut self, image: Option<&RgbaImage>) {
        self.push(UiEvent::Overlay(image.is_some()));
    }

    fn snapshot_preview(&mut self) -> Option<RgbaImage> {
        Some(RgbaImage::from_pixel(4, 4, image::Rgba([200, 40, 90, 255])))
    }
}

/// Unique scratch directory under the system temp dir
pub fn scratch_dir(prefix: &str) -> PathBuf {
    std::env::temp_dir().join(format!("{}-{}", prefix, uuid::Uuid::new_v4()))
}
