// SPDX-License-Identifier: GPL-3.0-only

//! CLI commands
//!
//! This module provides command-line functionality for:
//! - Running an interactive session on the virtual camera
//! - Scanning an image file for text and barcodes
//! - Applying a preview filter to an image file
//! - Printing the configuration

use image::RgbaImage;
use smartcam::app::{self, AppModel, CaptureIcon, DisplaySurface, Message, Notice};
use smartcam::backends::VirtualCamera;
use smartcam::backends::virtual_camera::{FrameSource, save_jpeg};
use smartcam::detection::{
    DefaultDetectors, DetectionListener, DetectionPipeline, DetectorFactory, FrameAdmissionGate,
    FrameAnalyzer,
};
use smartcam::runtime::{self, BackgroundWorker, DisplayHandle};
use smartcam::{Config, FilterMode, Frame, SensorRotation};
use std::io::BufRead;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// How long `scan` waits for the detectors
const SCAN_TIMEOUT: Duration = Duration::from_secs(10);

/// UI sink printing to the terminal
struct TerminalSurface {
    camera: Arc<VirtualCamera>,
}

impl DisplaySurface for TerminalSurface {
    fn show_result(&mut self, text: &str) {
        println!("{}", text);
    }

    fn hide_result(&mut self) {
        debug!("Result hidden");
    }

    fn show_filter_label(&mut self, label: &str) {
        println!("{}", label);
    }

    fn hide_filter_label(&mut self) {
        debug!("Filter label hidden");
    }

    fn set_capture_icon(&mut self, icon: CaptureIcon) {
        match icon {
            CaptureIcon::Idle => println!("[ capture ]"),
            CaptureIcon::Recording => println!("[ recording ]"),
        }
    }

    fn notify(&mut self, notice: Notice) {
        println!("{}", notice);
    }

    fn render_overlay(&mut self, image: Option<&RgbaImage>) {
        match image {
            Some(image) => debug!(width = image.width(), height = image.height(), "Overlay frame"),
            None => debug!("Overlay cleared"),
        }
    }

    fn snapshot_preview(&mut self) -> Option<RgbaImage> {
        self.camera.latest_frame().map(|frame| frame.as_ref().clone())
    }
}

/// Run an interactive session driven by stdin commands
pub fn run_session(
    image: Option<PathBuf>,
    detect: bool,
    filter: Option<FilterMode>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = Config::load();
    if detect {
        config.detection_enabled = true;
    }
    if let Some(filter) = filter {
        config.filter_mode = filter;
    }

    let source = match image {
        Some(path) => FrameSource::from_path(&path)?,
        None => FrameSource::default(),
    };
    let (width, height) = source.dimensions();
    println!("Streaming {}x{} virtual camera", width, height);
    let camera = Arc::new(VirtualCamera::new(source));

    let rt = tokio::runtime::Runtime::new()?;
    let final_config = rt.block_on(async {
        let (display, queue) = runtime::display::channel();
        let ui = Box::new(TerminalSurface {
            camera: Arc::clone(&camera),
        });
        let model = AppModel::new(
            config,
            camera.clone(),
            Arc::new(DefaultDetectors::default()),
            ui,
            display.clone(),
        )?;

        let ctrlc_display = display.clone();
        ctrlc::set_handler(move || {
            ctrlc_display.post(Message::Shutdown);
        })?;
        spawn_stdin_reader(display);

        print_help();
        Ok::<_, Box<dyn std::error::Error>>(app::run(model, queue).await)
    })?;

    camera.close();
    if let Err(e) = final_config.save() {
        warn!(error = %e, "Failed to save configuration");
    }
    Ok(())
}

fn print_help() {
    println!("Commands:");
    println!("  tap            take a photo");
    println!("  hold <ms>      hold the capture control (records past 350 ms)");
    println!("  press/release  drive the capture control manually");
    println!("  switch         switch between front and back camera");
    println!("  detect         toggle text and barcode detection");
    println!("  filter         cycle the preview filter");
    println!("  flash          toggle the torch");
    println!("  quit           exit (also Ctrl+C)");
}

/// Translate stdin lines into display messages on a separate thread
fn spawn_stdin_reader(display: DisplayHandle<Message>) {
    let spawned = std::thread::Builder::new()
        .name("smartcam-stdin".to_string())
        .spawn(move || {
            let stdin = std::io::stdin();
            for line in stdin.lock().lines() {
                let Ok(line) = line else {
                    break;
                };
                let mut parts = line.split_whitespace();
                let messages = match parts.next() {
                    Some("tap") => vec![Message::CapturePressed, Message::CaptureReleased],
                    Some("press") => vec![Message::CapturePressed],
                    Some("release") => vec![Message::CaptureReleased],
                    Some("hold") => {
                        let ms = parts.next().and_then(|v| v.parse().ok()).unwrap_or(1000);
                        display.post(Message::CapturePressed);
                        std::thread::sleep(Duration::from_millis(ms));
                        vec![Message::CaptureReleased]
                    }
                    Some("switch") => vec![Message::SwitchCamera],
                    Some("detect") => vec![Message::ToggleDetection],
                    Some("filter") => vec![Message::CycleFilter],
                    Some("flash") => vec![Message::ToggleFlash],
                    Some("quit") | Some("q") => vec![Message::Shutdown],
                    Some(other) => {
                        println!("Unknown command: {}", other);
                        Vec::new()
                    }
                    None => Vec::new(),
                };

                for message in messages {
                    if !display.post(message) {
                        return;
                    }
                }
            }
            display.post(Message::Shutdown);
        });

    if let Err(e) = spawned {
        warn!(error = %e, "Failed to start stdin reader");
    }
}

/// Run both detectors once over an image file
pub fn scan_image(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let image = image::open(path)?.to_rgba8();
    println!("Scanning {} ({}x{})", path.display(), image.width(), image.height());

    let rt = tokio::runtime::Runtime::new()?;
    let result = rt.block_on(async {
        let worker = BackgroundWorker::start("smartcam-scan")?;
        let (display, mut queue) = runtime::display::channel::<String>();

        let gate = FrameAdmissionGate::new();
        let detectors = Arc::new(DefaultDetectors::default().create());
        let pipeline = DetectionPipeline::new(detectors, DetectionListener::on_display(display, |s| s));
        let analyzer = FrameAnalyzer::new(gate.clone(), pipeline, worker.handle());

        analyzer.analyze(Frame::new(0, Arc::new(image), SensorRotation::None));
        // The analyzer holds the last display handle; dropping it closes the queue
        drop(analyzer);

        let result = tokio::time::timeout(SCAN_TIMEOUT, queue.recv()).await;
        gate.drain(SCAN_TIMEOUT).await;
        worker.shutdown_async().await;
        Ok::<_, std::io::Error>(result)
    })?;

    match result {
        Ok(Some(text)) => println!("{}", text),
        Ok(None) => println!("Nothing detected"),
        Err(_) => println!("Detection timed out"),
    }
    Ok(())
}

/// Apply `mode` to an image file
pub fn filter_image(
    input: &Path,
    output: &Path,
    mode: FilterMode,
) -> Result<(), Box<dyn std::error::Error>> {
    let image = image::open(input)?.to_rgba8();
    let filtered = mode.apply(&image).unwrap_or(image);

    let is_jpeg = output
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("jpg") || ext.eq_ignore_ascii_case("jpeg"));
    if is_jpeg {
        save_jpeg(&filtered, output)?;
    } else {
        filtered.save(output)?;
    }

    println!("{} filter written to {}", mode, output.display());
    Ok(())
}

/// Print the effective configuration as JSON
pub fn print_config() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load();
    match Config::default_path() {
        Some(path) => println!("# {}", path.display()),
        None => println!("# no config directory"),
    }
    println!("{}", serde_json::to_string_pretty(&config)?);
    println!("# photos: {}", config.photo_directory().display());
    println!("# videos: {}", config.video_directory().display());
    Ok(())
}
