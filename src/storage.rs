// SPDX-License-Identifier: MPL-2.0

//! Storage utilities for naming photo and video files

use crate::constants::storage::{FILENAME_TIMESTAMP, PHOTO_EXTENSION, VIDEO_EXTENSION};
use chrono::{DateTime, Local};
use std::path::{Path, PathBuf};
use tracing::debug;

/// What kind of media a path is for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Photo,
    Video,
}

impl MediaKind {
    pub fn extension(&self) -> &'static str {
        match self {
            MediaKind::Photo => PHOTO_EXTENSION,
            MediaKind::Video => VIDEO_EXTENSION,
        }
    }
}

/// File name for media taken at `time`, e.g. `20240131_174502.jpg`
pub fn file_name(kind: MediaKind, time: &DateTime<Local>) -> String {
    format!("{}.{}", time.format(FILENAME_TIMESTAMP), kind.extension())
}

/// Unused path in `dir` for media taken at `time`
///
/// When the plain name exists, `_1`, `_2`, ... is appended to the stem.
pub fn unique_path(dir: &Path, kind: MediaKind, time: &DateTime<Local>) -> PathBuf {
    let stem = time.format(FILENAME_TIMESTAMP).to_string();
    let ext = kind.extension();

    let candidate = dir.join(format!("{}.{}", stem, ext));
    if !candidate.exists() {
        return candidate;
    }

    let mut index = 1u32;
    loop {
        let candidate = dir.join(format!("{}_{}.{}", stem, index, ext));
        if !candidate.exists() {
            debug!(path = %candidate.display(), "Name collision resolved");
            return candidate;
        }
        index += 1;
    }
}

/// Create `dir` if needed and return a fresh output path in it
pub fn prepare_output(dir: &Path, kind: MediaKind) -> std::io::Result<PathBuf> {
    std::fs::create_dir_all(dir)?;
    Ok(unique_path(dir, kind, &Local::now()))
}
