//! Serialized pattern snapshot
//!
//! Flat records, one per user obstacle, discriminated by `class`. The outline
//! is implicit and never written.

use serde::{Deserialize, Serialize};

use crate::consts::{DEFAULT_BARS, DEFAULT_BPM, DEFAULT_FILE};

/// Point in disk coordinates
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PointFormat {
    pub x: f64,
    pub y: f64,
}

/// One user obstacle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "class", rename_all = "lowercase")]
pub enum ObstacleFormat {
    Line {
        x0: f64,
        y0: f64,
        x1: f64,
        y1: f64,
    },
    Arc {
        x0: f64,
        y0: f64,
        x1: f64,
        y1: f64,
        bend: f64,
    },
    Curve {
        x0: f64,
        y0: f64,
        x1: f64,
        y1: f64,
        x2: f64,
        y2: f64,
    },
}

impl ObstacleFormat {
    pub fn is_finite(&self) -> bool {
        match *self {
            ObstacleFormat::Line { x0, y0, x1, y1 } => [x0, y0, x1, y1].iter().all(|v| v.is_finite()),
            ObstacleFormat::Arc { x0, y0, x1, y1, bend } => {
                [x0, y0, x1, y1, bend].iter().all(|v| v.is_finite())
            }
            ObstacleFormat::Curve { x0, y0, x1, y1, x2, y2 } => {
                [x0, y0, x1, y1, x2, y2].iter().all(|v| v.is_finite())
            }
        }
    }
}

/// Whole pattern snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternFormat {
    pub origin: PointFormat,
    pub obstacles: Vec<ObstacleFormat>,
    pub file: String,
    pub bpm: f64,
    pub bars: u32,
}

impl Default for PatternFormat {
    fn default() -> Self {
        Self {
            origin: PointFormat::default(),
            obstacles: Vec::new(),
            file: DEFAULT_FILE.to_string(),
            bpm: DEFAULT_BPM,
            bars: DEFAULT_BARS,
        }
    }
}

impl PatternFormat {
    pub fn from_json(json: &str) -> crate::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> crate::Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_class_tags() {
        let json = r#"{
            "origin": {"x": 0.1, "y": -0.2},
            "obstacles": [
                {"class": "line", "x0": -0.8, "y0": -0.5, "x1": 0.8, "y1": -0.5},
                {"class": "arc", "x0": -0.25, "y0": 0.5, "x1": 0.5, "y1": 0.5, "bend": 1.3},
                {"class": "curve", "x0": 0.0, "y0": 0.0, "x1": 0.2, "y1": 0.3, "x2": 0.4, "y2": 0.0}
            ],
            "file": "loop.wav",
            "bpm": 120.0,
            "bars": 4
        }"#;
        let format = PatternFormat::from_json(json).unwrap();
        assert_eq!(format.obstacles.len(), 3);
        assert!(matches!(format.obstacles[1], ObstacleFormat::Arc { bend, .. } if bend == 1.3));
        assert_eq!(format.bars, 4);

        let out = format.to_json().unwrap();
        assert!(out.contains(r#""class":"curve""#));
        assert_eq!(PatternFormat::from_json(&out).unwrap(), format);
    }

    #[test]
    fn test_unknown_class_rejected() {
        let json = r#"{
            "origin": {"x": 0.0, "y": 0.0},
            "obstacles": [
                {"class": "line", "x0": 0.0, "y0": 0.0, "x1": 0.5, "y1": 0.0},
                {"class": "spiral", "x0": 0.0, "y0": 0.0}
            ],
            "file": "loop.wav",
            "bpm": 120.0,
            "bars": 4
        }"#;
        assert!(PatternFormat::from_json(json).is_err());
    }
}
