// SPDX-License-Identifier: GPL-3.0-only

//! Execution contexts
//!
//! - [`display`]: the single-threaded message loop that owns UI state and timers
//! - [`worker`]: the single background worker for detection joins and filters

pub mod display;
pub mod worker;

pub use display::{DisplayHandle, DisplayQueue, TimerHandle, TimerId};
pub use worker::{BackgroundWorker, WorkerHandle};
