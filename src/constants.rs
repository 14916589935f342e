// SPDX-License-Identifier: GPL-3.0-only

//! Application-wide constants

/// Timing constants for gestures, overlays and background loops
pub mod timing {
    use std::time::Duration;

    /// Hold duration after which a press on the capture control starts recording
    pub const LONG_PRESS_THRESHOLD: Duration = Duration::from_millis(350);

    /// Interval between filter preview ticks
    pub const FILTER_TICK_INTERVAL: Duration = Duration::from_millis(120);

    /// How long a detection result stays on screen
    pub const RESULT_DISPLAY: Duration = Duration::from_millis(3000);

    /// How long the filter name label stays on screen
    pub const FILTER_LABEL_DISPLAY: Duration = Duration::from_millis(1500);

    /// Upper bound for waiting on an in-flight frame during rebind
    pub const ANALYZER_DRAIN_TIMEOUT: Duration = Duration::from_secs(2);

    /// Frame interval of the virtual camera (~30 fps)
    pub const VIRTUAL_FRAME_INTERVAL: Duration = Duration::from_millis(33);
}

/// Detection constants
pub mod detection {
    /// Maximum dimension a frame is downscaled to before barcode scanning
    pub const BARCODE_MAX_DIMENSION: u32 = 640;

    /// Prefix for recognized text in the merged result string
    pub const TEXT_PREFIX: &str = "TEXT: ";

    /// Prefix for barcode values in the merged result string
    pub const CODE_PREFIX: &str = "CODE: ";
}

/// Output naming
pub mod storage {
    /// Folder created inside the user's pictures/videos directories
    pub const APP_FOLDER: &str = "SmartCamera";

    /// Timestamp pattern for output file names (e.g. 20240131_142501)
    pub const FILENAME_TIMESTAMP: &str = "%Y%m%d_%H%M%S";

    /// Extension of still captures
    pub const PHOTO_EXTENSION: &str = "jpg";

    /// Extension of recordings
    pub const VIDEO_EXTENSION: &str = "mp4";

    /// JPEG quality used by the virtual camera
    pub const JPEG_QUALITY: u8 = 92;
}
