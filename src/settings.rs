//! Editor and engine preferences
//!
//! Persisted as JSON next to the patterns, separately from them.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::consts::RENDER_QUANTUM;

/// Editor/engine settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // === Editing ===
    /// Spokes of the snapping grid (0 disables angle snapping)
    pub angle_resolution: u32,
    /// Rings per unit length of the snapping grid (0 disables length snapping)
    pub distance_resolution: u32,
    /// Pick distance for handles and obstacles, in disk units
    pub capture_radius: f64,

    // === Audio ===
    /// Output sample rate the processor is created with
    pub sample_rate: f64,
    /// How often the processor reports its position, per second
    pub report_rate_hz: f64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            angle_resolution: 64,
            distance_resolution: 24,
            capture_radius: 8.0 / 256.0,

            sample_rate: 48_000.0,
            report_rate_hz: 60.0,
        }
    }
}

impl Settings {
    /// Render blocks between two position reports, at least one
    pub fn report_interval_blocks(&self) -> u32 {
        let blocks = self.sample_rate / RENDER_QUANTUM as f64 / self.report_rate_hz;
        if blocks.is_finite() && blocks >= 1.0 {
            blocks.floor() as u32
        } else {
            1
        }
    }

    /// Load settings from `path`, falling back to defaults
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match fs::read_to_string(path) {
            Ok(json) => match serde_json::from_str(&json) {
                Ok(settings) => {
                    log::info!("Loaded settings from {}", path.display());
                    return settings;
                }
                Err(e) => log::warn!("Ignoring malformed settings {}: {}", path.display(), e),
            },
            Err(e) => log::debug!("No settings at {}: {}", path.display(), e),
        }

        log::info!("Using default settings");
        Self::default()
    }

    /// Save settings to `path`
    pub fn save(&self, path: impl AsRef<Path>) -> crate::Result<()> {
        let path = path.as_ref();
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        log::info!("Settings saved to {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("radar-loop-{}-{}.json", name, std::process::id()))
    }

    #[test]
    fn test_report_interval() {
        let settings = Settings::default();
        // 48000 / 128 / 60 = 6.25
        assert_eq!(settings.report_interval_blocks(), 6);

        let slow = Settings {
            sample_rate: 1000.0,
            ..Settings::default()
        };
        assert_eq!(slow.report_interval_blocks(), 1);
    }

    #[test]
    fn test_save_and_load() {
        let path = temp_path("roundtrip");
        let settings = Settings {
            angle_resolution: 32,
            capture_radius: 0.05,
            ..Settings::default()
        };
        settings.save(&path).unwrap();
        assert_eq!(Settings::load(&path), settings);
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_missing_or_partial_file() {
        assert_eq!(Settings::load(temp_path("missing")), Settings::default());

        let path = temp_path("partial");
        fs::write(&path, r#"{"angle_resolution": 16}"#).unwrap();
        let settings = Settings::load(&path);
        assert_eq!(settings.angle_resolution, 16);
        assert_eq!(settings.distance_resolution, 24);
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_malformed_file_uses_defaults() {
        let path = temp_path("malformed");
        fs::write(&path, "not json").unwrap();
        assert_eq!(Settings::load(&path), Settings::default());
        let _ = fs::remove_file(&path);
    }
}
