//! Error types

use thiserror::Error;

/// Errors raised while loading or validating patterns and settings
#[derive(Debug, Error)]
pub enum RadarError {
    #[error("malformed pattern snapshot: {0}")]
    Json(#[from] serde_json::Error),

    #[error("i/o failure: {0}")]
    Io(#[from] std::io::Error),

    #[error("origin ({x}, {y}) lies outside the unit disk")]
    OriginOutsideDisk { x: f64, y: f64 },

    #[error("non-finite value in {what}")]
    NonFinite { what: &'static str },

    #[error("invalid loop timing: bpm={bpm}, bars={bars}")]
    InvalidTiming { bpm: f64, bars: u32 },
}

pub type Result<T> = std::result::Result<T, RadarError>;
