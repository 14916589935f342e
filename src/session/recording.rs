// SPDX-License-Identifier: GPL-3.0-only

//! Recording state machine
//!
//! Simple two-state design: either recording or not. Every recording gets its
//! own id so events of an earlier recording can be told apart from the
//! current one.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use uuid::Uuid;

#[derive(Debug, Default)]
pub enum RecordingState {
    /// Not recording
    #[default]
    Idle,
    /// Actively recording
    Recording {
        id: Uuid,
        /// When recording started
        start_time: Instant,
        /// Output path
        file_path: PathBuf,
    },
}

impl RecordingState {
    pub fn start(file_path: PathBuf) -> Self {
        RecordingState::Recording {
            id: Uuid::new_v4(),
            start_time: Instant::now(),
            file_path,
        }
    }

    pub fn is_recording(&self) -> bool {
        matches!(self, RecordingState::Recording { .. })
    }

    /// Id of the running recording
    pub fn id(&self) -> Option<Uuid> {
        match self {
            RecordingState::Idle => None,
            RecordingState::Recording { id, .. } => Some(*id),
        }
    }

    /// Get the recording file path if recording
    pub fn file_path(&self) -> Option<&Path> {
        match self {
            RecordingState::Idle => None,
            RecordingState::Recording { file_path, .. } => Some(file_path),
        }
    }

    /// How long the recording has been running
    pub fn elapsed(&self) -> Duration {
        match self {
            RecordingState::Idle => Duration::ZERO,
            RecordingState::Recording { start_time, .. } => start_time.elapsed(),
        }
    }

    /// Stop recording (returns the previous state)
    pub fn stop(&mut self) -> Self {
        std::mem::take(self)
    }
}
