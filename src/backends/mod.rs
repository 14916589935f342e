// SPDX-License-Identifier: GPL-3.0-only

//! Capture surface implementations

pub mod virtual_camera;

pub use virtual_camera::VirtualCamera;
