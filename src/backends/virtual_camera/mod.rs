// SPDX-License-Identifier: GPL-3.0-only

//! Virtual camera
//!
//! A [`CaptureSurface`] without hardware. While bound, a frame loop thread
//! renders frames from a [`FrameSource`] at a fixed rate, keeps the latest
//! one for still capture, offers each frame to the bound analyzer and, while
//! recording, writes it to a JPEG sequence directory.

pub mod frame_loop;
pub mod source;

pub use frame_loop::{FrameLoopController, LoopAction};
pub use source::FrameSource;

use crate::constants::storage::JPEG_QUALITY;
use crate::constants::timing::VIRTUAL_FRAME_INTERVAL;
use crate::errors::{BindingError, CaptureError, RecordingError};
use crate::filters::FilterMode;
use crate::frame::{Frame, SensorRotation};
use crate::session::{Behaviors, CaptureSurface, Facing, RecordEvent, RecordStream};
use futures::future::BoxFuture;
use image::RgbaImage;
use image::codecs::jpeg::JpegEncoder;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Recording in progress, shared with the frame loop
struct RecordingSink {
    dir: PathBuf,
    filter: FilterMode,
    frames: u32,
    events: mpsc::UnboundedSender<RecordEvent>,
}

impl RecordingSink {
    fn write(&mut self, image: &RgbaImage) -> Result<(), String> {
        let path = self.dir.join(format!("frame_{:06}.jpg", self.frames));
        match self.filter.apply(image) {
            Some(filtered) => save_jpeg(&filtered, &path)?,
            None => save_jpeg(image, &path)?,
        }
        self.frames += 1;
        Ok(())
    }

    fn finish(self, result: Result<PathBuf, RecordingError>) {
        let _ = self.events.send(RecordEvent::Finalized(result));
    }
}

struct Bound {
    facing: Facing,
    frame_loop: FrameLoopController,
}

#[derive(Default)]
struct Shared {
    latest: Mutex<Option<Arc<RgbaImage>>>,
    recording: Mutex<Option<RecordingSink>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

pub struct VirtualCamera {
    source: FrameSource,
    interval: Duration,
    facings: Vec<Facing>,
    recording_supported: bool,
    bound: Mutex<Option<Bound>>,
    shared: Arc<Shared>,
    sequence: Arc<AtomicU64>,
    torch: AtomicBool,
    closed: AtomicBool,
}

impl VirtualCamera {
    pub fn new(source: FrameSource) -> Self {
        Self {
            source,
            interval: VIRTUAL_FRAME_INTERVAL,
            facings: vec![Facing::Back, Facing::Front],
            recording_supported: true,
            bound: Mutex::new(None),
            shared: Arc::new(Shared::default()),
            sequence: Arc::new(AtomicU64::new(0)),
            torch: AtomicBool::new(false),
            closed: AtomicBool::new(false),
        }
    }

    /// Only offer cameras for `facings`
    pub fn with_facings(mut self, facings: &[Facing]) -> Self {
        self.facings = facings.to_vec();
        self
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn without_recording(mut self) -> Self {
        self.recording_supported = false;
        self
    }

    pub fn torch_on(&self) -> bool {
        self.torch.load(Ordering::Relaxed)
    }

    /// Most recent frame while bound
    pub fn latest_frame(&self) -> Option<Arc<RgbaImage>> {
        lock(&self.shared.latest).clone()
    }

    pub fn bound_facing(&self) -> Option<Facing> {
        lock(&self.bound).as_ref().map(|b| b.facing)
    }

    /// Unbind and refuse further bindings
    pub fn close(&self) {
        self.closed.store(true, Ordering::Release);
        self.unbind_all();
        if let Err(e) = self.stop_recording()
            && e != RecordingError::NotRecording
        {
            warn!(error = %e, "Failed to stop recording on close");
        }
    }

    fn rotation(facing: Facing) -> SensorRotation {
        match facing {
            Facing::Back => SensorRotation::Rotate90,
            Facing::Front => SensorRotation::Rotate270,
        }
    }
}

impl CaptureSurface for VirtualCamera {
    fn supports_recording(&self, facing: Facing) -> bool {
        self.recording_supported && self.facings.contains(&facing)
    }

    fn has_torch(&self, facing: Facing) -> bool {
        facing == Facing::Back && self.facings.contains(&facing)
    }

    fn bind(&self, facing: Facing, behaviors: Behaviors) -> Result<(), BindingError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(BindingError::SurfaceClosed);
        }
        if !self.facings.contains(&facing) {
            return Err(BindingError::CameraUnavailable(facing));
        }
        if behaviors.recorder && !self.recording_supported {
            return Err(BindingError::Rejected("recorder not available".to_string()));
        }

        let mut bound = lock(&self.bound);
        if let Some(mut previous) = bound.take() {
            debug!(facing = %previous.facing, "Replacing existing binding");
            previous.frame_loop.stop();
        }

        let source = self.source.clone();
        let interval = self.interval;
        let shared = Arc::clone(&self.shared);
        let sequence = Arc::clone(&self.sequence);
        let analyzer = behaviors.analyzer;
        let rotation = Self::rotation(facing);

        let frame_loop = FrameLoopController::start("virtual-camera", move || {
            let seq = sequence.fetch_add(1, Ordering::Relaxed);
            let image = source.render(seq);
            *lock(&shared.latest) = Some(Arc::clone(&image));

            {
                let mut recording = lock(&shared.recording);
                if let Some(sink) = recording.as_mut()
                    && let Err(e) = sink.write(&image)
                {
                    warn!(error = %e, "Failed to write recording frame");
                    if let Some(sink) = recording.take() {
                        sink.finish(Err(RecordingError::Finalize(e)));
                    }
                }
            }

            if let Some(analyzer) = &analyzer {
                analyzer.analyze(Frame::new(seq, image, rotation));
            }

            std::thread::sleep(interval);
            LoopAction::Continue
        })
        .map_err(|e| BindingError::Rejected(format!("Failed to start frame loop: {}", e)))?;

        info!(
            facing = %facing,
            preview = behaviors.preview,
            still_capture = behaviors.still_capture,
            recorder = behaviors.recorder,
            "Virtual camera bound"
        );
        *bound = Some(Bound { facing, frame_loop });
        Ok(())
    }

    fn unbind_all(&self) {
        let previous = lock(&self.bound).take();
        if let Some(mut previous) = previous {
            previous.frame_loop.stop();
            *lock(&self.shared.latest) = None;
            debug!(facing = %previous.facing, "Virtual camera unbound");
        }
    }

    fn capture(
        &self,
        target: PathBuf,
        filter: FilterMode,
    ) -> BoxFuture<'static, Result<PathBuf, CaptureError>> {
        let bound = lock(&self.bound).is_some();
        let latest = lock(&self.shared.latest).clone();

        Box::pin(async move {
            if !bound {
                return Err(CaptureError::NotBound);
            }
            let image = latest.ok_or(CaptureError::NoFrameAvailable)?;

            tokio::task::spawn_blocking(move || -> Result<PathBuf, CaptureError> {
                let saved = match filter.apply(&image) {
                    Some(filtered) => save_jpeg(&filtered, &target),
                    None => save_jpeg(&image, &target),
                };
                saved.map_err(CaptureError::SaveFailed)?;
                Ok(target)
            })
            .await
            .map_err(|e| CaptureError::CaptureFailed(e.to_string()))?
        })
    }

    fn start_recording(
        &self,
        target: PathBuf,
        filter: FilterMode,
    ) -> Result<RecordStream, RecordingError> {
        if !self.recording_supported {
            return Err(RecordingError::NotSupported);
        }
        if lock(&self.bound).is_none() {
            return Err(RecordingError::StartFailed("camera is not bound".to_string()));
        }

        let mut recording = lock(&self.shared.recording);
        if recording.is_some() {
            return Err(RecordingError::AlreadyRecording);
        }

        let dir = target.with_extension("frames");
        std::fs::create_dir_all(&dir).map_err(|e| RecordingError::StartFailed(e.to_string()))?;

        let (tx, mut rx) = mpsc::unbounded_channel();
        let _ = tx.send(RecordEvent::Started);
        info!(dir = %dir.display(), filter = %filter, "Virtual recording started");
        *recording = Some(RecordingSink {
            dir,
            filter,
            frames: 0,
            events: tx,
        });

        let stream = async_stream::stream! {
            while let Some(event) = rx.recv().await {
                let done = matches!(event, RecordEvent::Finalized(_));
                yield event;
                if done {
                    break;
                }
            }
        };
        Ok(Box::pin(stream))
    }

    fn stop_recording(&self) -> Result<(), RecordingError> {
        let sink = lock(&self.shared.recording)
            .take()
            .ok_or(RecordingError::NotRecording)?;

        info!(dir = %sink.dir.display(), frames = sink.frames, "Virtual recording stopped");
        let result = if sink.frames == 0 {
            Err(RecordingError::Finalize("no frames recorded".to_string()))
        } else {
            Ok(sink.dir.clone())
        };
        sink.finish(result);
        Ok(())
    }

    fn set_torch(&self, on: bool) -> Result<(), String> {
        let facing = self.bound_facing().ok_or_else(|| "No camera bound".to_string())?;
        if on && !self.has_torch(facing) {
            return Err(format!("No torch on the {} camera", facing));
        }
        self.torch.store(on, Ordering::Relaxed);
        debug!(on, "Torch set");
        Ok(())
    }
}

impl Drop for VirtualCamera {
    fn drop(&mut self) {
        self.close();
    }
}

/// Encode `image` as JPEG at `path`
pub fn save_jpeg(image: &RgbaImage, path: &Path) -> Result<(), String> {
    let file = std::fs::File::create(path)
        .map_err(|e| format!("Failed to create {}: {}", path.display(), e))?;
    let mut writer = std::io::BufWriter::new(file);
    let rgb = image::DynamicImage::ImageRgba8(image.clone()).to_rgb8();
    JpegEncoder::new_with_quality(&mut writer, JPEG_QUALITY)
        .encode_image(&rgb)
        .map_err(|e| format!("Failed to encode {}: {}", path.display(), e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    fn behaviors() -> Behaviors {
        Behaviors {
            preview: true,
            still_capture: true,
            analyzer: None,
            recorder: true,
        }
    }

    fn temp_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("smartcam-vcam-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn camera() -> VirtualCamera {
        VirtualCamera::new(FrameSource::Pattern {
            width: 32,
            height: 24,
        })
        .with_interval(Duration::from_millis(5))
    }

    #[test]
    fn test_missing_facing_is_unavailable() {
        let camera = camera().with_facings(&[Facing::Back]);
        assert_eq!(
            camera.bind(Facing::Front, behaviors()),
            Err(BindingError::CameraUnavailable(Facing::Front))
        );
        assert!(camera.bound_facing().is_none());
    }

    #[test]
    fn test_closed_camera_refuses_binding() {
        let camera = camera();
        camera.close();
        assert_eq!(
            camera.bind(Facing::Back, behaviors()),
            Err(BindingError::SurfaceClosed)
        );
    }

    #[tokio::test]
    async fn test_capture_writes_jpeg() {
        let camera = camera();
        let dir = temp_dir();
        let target = dir.join("shot.jpg");

        assert_eq!(
            camera.capture(target.clone(), FilterMode::Normal).await,
            Err(CaptureError::NotBound)
        );

        camera.bind(Facing::Back, behaviors()).unwrap();
        tokio::time::sleep(Duration::from_millis(30)).await;
        let saved = camera.capture(target.clone(), FilterMode::Normal).await.unwrap();
        assert_eq!(saved, target);
        assert_eq!(image::open(&saved).unwrap().width(), 32);

        camera.unbind_all();
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[tokio::test]
    async fn test_recording_reports_started_and_finalized() {
        let camera = camera();
        let dir = temp_dir();
        camera.bind(Facing::Back, behaviors()).unwrap();

        let mut events = camera
            .start_recording(dir.join("clip.mp4"), FilterMode::Normal)
            .unwrap();
        assert_eq!(events.next().await, Some(RecordEvent::Started));

        tokio::time::sleep(Duration::from_millis(40)).await;
        camera.stop_recording().unwrap();
        assert_eq!(
            events.next().await,
            Some(RecordEvent::Finalized(Ok(dir.join("clip.frames"))))
        );
        assert_eq!(events.next().await, None);
        assert_eq!(camera.stop_recording(), Err(RecordingError::NotRecording));

        camera.unbind_all();
        std::fs::remove_dir_all(&dir).unwrap();
    }

    fn white_camera() -> VirtualCamera {
        let white = RgbaImage::from_pixel(16, 16, image::Rgba([255, 255, 255, 255]));
        VirtualCamera::new(FrameSource::Still(Arc::new(white)))
            .with_interval(Duration::from_millis(5))
    }

    fn assert_sepia_white(path: &Path) {
        let saved = image::open(path).unwrap().to_rgb8();
        let [r, g, b] = saved.get_pixel(8, 8).0;
        // Sepia maps white to [255, 255, 239]; allow for JPEG rounding
        assert!(r >= 250 && g >= 250, "expected warm white, got {:?}", [r, g, b]);
        assert!((230..=246).contains(&b), "expected sepia blue channel, got {}", b);
    }

    #[tokio::test]
    async fn test_capture_applies_filter() {
        let camera = white_camera();
        let dir = temp_dir();
        camera.bind(Facing::Back, behaviors()).unwrap();
        tokio::time::sleep(Duration::from_millis(30)).await;

        let plain = camera
            .capture(dir.join("plain.jpg"), FilterMode::Normal)
            .await
            .unwrap();
        assert!(image::open(&plain).unwrap().to_rgb8().get_pixel(8, 8).0[2] >= 250);

        let sepia = camera
            .capture(dir.join("sepia.jpg"), FilterMode::Sepia)
            .await
            .unwrap();
        assert_sepia_white(&sepia);

        camera.unbind_all();
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[tokio::test]
    async fn test_recording_applies_filter() {
        let camera = white_camera();
        let dir = temp_dir();
        camera.bind(Facing::Back, behaviors()).unwrap();

        let mut events = camera
            .start_recording(dir.join("clip.mp4"), FilterMode::Sepia)
            .unwrap();
        assert_eq!(events.next().await, Some(RecordEvent::Started));
        tokio::time::sleep(Duration::from_millis(40)).await;
        camera.stop_recording().unwrap();

        let Some(RecordEvent::Finalized(Ok(frames))) = events.next().await else {
            panic!("recording did not finalize");
        };
        assert_sepia_white(&frames.join("frame_000000.jpg"));

        camera.unbind_all();
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_torch_only_on_back_camera() {
        let camera = camera();
        camera.bind(Facing::Front, behaviors()).unwrap();
        assert!(camera.set_torch(true).is_err());
        assert!(camera.set_torch(false).is_ok());

        camera.bind(Facing::Back, behaviors()).unwrap();
        camera.set_torch(true).unwrap();
        assert!(camera.torch_on());
        camera.unbind_all();
    }
}
