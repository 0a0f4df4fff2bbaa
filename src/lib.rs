//! Radar Loop - loop playback warped by rays bouncing inside a circle
//!
//! A playback position on a loop is an angle around a unit disk. A ray is
//! emitted at that angle from a user-placed origin, bounces off the shapes
//! drawn inside the disk, and the angle where it finally leaves the disk
//! picks the sample frame that is actually played.
//!
//! Core modules:
//! - `radar`: Ray, obstacles, bounce loop, pattern, editing helpers
//! - `format`: Serialized pattern snapshot records
//! - `playback`: Per-sample remapping and the audio processor
//! - `message`: Messages and the lock-free snapshot queue into the audio side
//! - `settings`: Editor/engine preferences
//! - `error`: Error type shared by loading and validation
//! - `worklet`: AudioWorklet bindings (wasm32 only)

pub mod error;
pub mod format;
pub mod message;
pub mod playback;
pub mod radar;
pub mod settings;

#[cfg(target_arch = "wasm32")]
pub mod worklet;

pub use error::{RadarError, Result};
pub use settings::Settings;

use glam::DVec2;
use std::f64::consts::TAU;

/// Engine constants
pub mod consts {
    /// Maximum number of ray movements before a trace is cut off
    pub const MAX_MOVEMENTS: u32 = 250;

    /// Minimum forward distance/parameter margin for an intersection
    pub const EPSILON: f64 = 1e-5;
    /// An arc whose |bend| is below this is treated as its chord
    pub const LINE_MODE_EPSILON: f64 = 1e-5;
    /// Allowed overshoot of the unit circle after a move
    pub const RIM_TOLERANCE: f64 = 1e-4;

    /// Frames rendered per audio callback
    pub const RENDER_QUANTUM: usize = 128;

    /// Default pattern timing
    pub const DEFAULT_BPM: f64 = 160.0;
    pub const DEFAULT_BARS: u32 = 2;
    pub const DEFAULT_FILE: &str = "amen.wav";
}

/// Normalize angle to [0, 2π)
#[inline]
pub fn normalize_angle(angle: f64) -> f64 {
    let wrapped = angle.rem_euclid(TAU);
    // rem_euclid can round up to exactly TAU for tiny negative inputs
    if wrapped >= TAU { 0.0 } else { wrapped }
}

/// Unit direction for a radar angle: 0 is (0, -1), π/2 is (1, 0)
#[inline]
pub fn angle_to_direction(angle: f64) -> DVec2 {
    DVec2::new(angle.sin(), -angle.cos())
}

/// Radar angle of a vector, inverse of [`angle_to_direction`]
#[inline]
pub fn direction_to_angle(v: DVec2) -> f64 {
    normalize_angle(v.x.atan2(-v.y))
}
