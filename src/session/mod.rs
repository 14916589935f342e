// SPDX-License-Identifier: GPL-3.0-only

//! Capture session management
//!
//! The [`SessionBinder`] owns the single active binding of capture behaviors
//! to a [`CaptureSurface`] and rebuilds it whenever the configuration changes.

pub mod binder;
pub mod recording;
pub mod surface;

pub use binder::{ActiveBinding, SessionBinder};
pub use recording::RecordingState;
pub use surface::{Behaviors, CaptureSurface, RecordEvent, RecordStream};

use crate::filters::FilterMode;
use serde::{Deserialize, Serialize};

/// Which camera is used
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Facing {
    Front,
    #[default]
    Back,
}

impl Facing {
    pub fn toggle(self) -> Self {
        match self {
            Facing::Front => Facing::Back,
            Facing::Back => Facing::Front,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Facing::Front => "front",
            Facing::Back => "back",
        }
    }
}

impl std::fmt::Display for Facing {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Everything a rebind depends on
///
/// Any change to one of these fields produces a new config and a rebind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BindingConfig {
    pub facing: Facing,
    pub detection_enabled: bool,
    pub filter_mode: FilterMode,
    pub recording_supported: bool,
    pub torch_enabled: bool,
}

impl Default for BindingConfig {
    fn default() -> Self {
        Self {
            facing: Facing::Back,
            detection_enabled: false,
            filter_mode: FilterMode::Normal,
            recording_supported: true,
            torch_enabled: false,
        }
    }
}

impl BindingConfig {
    /// Torch state actually applied; the front camera never lights
    pub fn effective_torch(&self) -> bool {
        self.torch_enabled && self.facing == Facing::Back
    }
}
