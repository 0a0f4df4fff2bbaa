//! AudioWorklet bindings
//!
//! The worklet script owns one `RadarWorklet`, forwards `port` messages to
//! it, and calls `process` for every render quantum.

use wasm_bindgen::prelude::*;

use crate::message::RadarMessage;
use crate::playback::RadarProcessor;
use crate::radar::{Pattern, Ray};
use crate::RadarError;

fn to_js(e: RadarError) -> JsValue {
    js_sys::Error::new(&e.to_string()).into()
}

/// Install the panic hook and console logger once per context
fn init_logging() {
    console_error_panic_hook::set_once();
    // a second worklet in the same context already has a logger
    let _ = console_log::init_with_level(log::Level::Info);
}

#[wasm_bindgen]
pub struct RadarWorklet {
    processor: RadarProcessor,
}

#[wasm_bindgen]
impl RadarWorklet {
    #[wasm_bindgen(constructor)]
    pub fn new(sample_rate: f64) -> RadarWorklet {
        init_logging();
        log::info!("Radar worklet starting at {} Hz", sample_rate);
        RadarWorklet {
            processor: RadarProcessor::new(sample_rate),
        }
    }

    /// Apply a JSON message posted from the editor
    pub fn message(&mut self, json: &str) -> Result<(), JsValue> {
        let message = RadarMessage::from_json(json).map_err(to_js)?;
        self.processor.handle(message);
        Ok(())
    }

    /// Load audio without going through JSON
    #[wasm_bindgen(js_name = setAudio)]
    pub fn set_audio(&mut self, left: Vec<f32>, right: Vec<f32>) {
        let frames = left.len().min(right.len());
        self.processor.handle(RadarMessage::SetAudio {
            channels: vec![left, right],
            frames,
        });
    }

    /// Render one block; returns the normalized position when a report is due
    pub fn process(&mut self, left: &mut [f32], right: &mut [f32]) -> Option<f64> {
        self.processor.process(left, right)
    }

    #[wasm_bindgen(getter)]
    pub fn playing(&self) -> bool {
        self.processor.is_playing()
    }
}

/// Exit angles for `count` evenly spaced input angles, for the editor preview
#[wasm_bindgen(js_name = warpCurve)]
pub fn warp_curve(pattern_json: &str, count: usize) -> Result<Vec<f64>, JsValue> {
    let pattern = Pattern::from_json(pattern_json).map_err(to_js)?;
    let mut ray = Ray::new();
    Ok((0..count)
        .map(|i| pattern.evaluate(&mut ray, i as f64 / count as f64 * std::f64::consts::TAU))
        .collect())
}
