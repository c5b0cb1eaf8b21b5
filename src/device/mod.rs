//! Capture/input collaborator interface
//!
//! The engine drives the game purely through this narrow surface:
//! screenshots in, taps and swipes out. The backend (emulator bridge,
//! ADB, window capture) lives outside the crate. A device is a single
//! shared, non-thread-safe resource: only one logical owner may call
//! into it at a time, and the engine assumes exclusive access.

pub mod frame;

use std::time::Duration;

pub use frame::Frame;

use crate::scaling::{Point, Rect};

/// Synchronous capture and input backend.
///
/// Transport failures are reported as `anyhow::Error` and propagate
/// through the engine uninterpreted.
pub trait Device {
    /// Capture the current screen.
    fn screenshot(&mut self) -> anyhow::Result<Frame>;

    /// Tap somewhere inside the given rectangle.
    fn tap(&mut self, rect: Rect) -> anyhow::Result<()>;

    /// Swipe from one point to another over the given duration.
    fn swipe(&mut self, from: Point, to: Point, duration: Duration) -> anyhow::Result<()>;
}
