//! Playback remapping and the audio processor
//!
//! The read head walks the loop linearly. Every output frame, its position is
//! turned into an angle, traced through the pattern, and the exit angle picks
//! the frame that is actually played.

use std::f64::consts::TAU;

use crate::message::{MessageReceiver, RadarMessage};
use crate::radar::{Pattern, Ray};
use crate::settings::Settings;

/// Frame to play for read head `position` in a loop of `frames` frames
pub fn remap(pattern: &Pattern, ray: &mut Ray, position: usize, frames: usize) -> usize {
    if frames == 0 {
        return 0;
    }
    let n = frames as f64;
    let angle = position as f64 / n * TAU;
    let out = pattern.evaluate(ray, angle);
    (out / TAU * n).floor() as usize % frames
}

/// Renders the warped loop, one block at a time
///
/// Owns its own pattern copy, updated only through [`RadarMessage`]s.
#[derive(Debug)]
pub struct RadarProcessor {
    pattern: Pattern,
    ray: Ray,
    left: Vec<f32>,
    right: Vec<f32>,
    frames: usize,
    position: usize,
    playing: bool,
    blocks: u32,
    report_interval: u32,
}

impl RadarProcessor {
    pub fn new(sample_rate: f64) -> Self {
        Self::from_settings(&Settings {
            sample_rate,
            ..Settings::default()
        })
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            pattern: Pattern::new(),
            ray: Ray::new(),
            left: Vec::new(),
            right: Vec::new(),
            frames: 0,
            position: 0,
            playing: false,
            blocks: 0,
            report_interval: settings.report_interval_blocks(),
        }
    }

    pub fn pattern(&self) -> &Pattern {
        &self.pattern
    }

    /// Loop length in frames, 0 when nothing is loaded
    pub fn frames(&self) -> usize {
        self.frames
    }

    /// Linear read head
    pub fn position(&self) -> usize {
        self.position
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn handle(&mut self, message: RadarMessage) {
        match message {
            RadarMessage::SetAudio { channels, frames } => self.set_audio(channels, frames),
            RadarMessage::UpdatePattern { format } => {
                if let Err(e) = self.pattern.deserialize(&format) {
                    log::warn!("Keeping previous pattern: {}", e);
                }
            }
            RadarMessage::TransportPlay => self.playing = true,
            RadarMessage::TransportPause => self.playing = false,
            RadarMessage::TransportMove { position } => {
                if self.frames > 0 && position.is_finite() {
                    let head = (position.rem_euclid(1.0) * self.frames as f64).floor() as usize;
                    self.position = head % self.frames;
                }
            }
        }
    }

    /// Apply every pending message
    pub fn drain(&mut self, receiver: &mut MessageReceiver) {
        while let Some(message) = receiver.try_recv() {
            self.handle(message);
        }
    }

    fn set_audio(&mut self, channels: Vec<Vec<f32>>, frames: usize) {
        if channels.is_empty() || frames == 0 {
            log::info!("Audio unloaded");
            self.left.clear();
            self.right.clear();
            self.frames = 0;
            self.position = 0;
            return;
        }

        let shortest = channels.iter().map(Vec::len).min().unwrap_or(0);
        let frames = if shortest < frames {
            log::warn!("Audio has {} frames, expected {}", shortest, frames);
            shortest
        } else {
            frames
        };

        let mut channels = channels.into_iter();
        let mut left = channels.next().unwrap_or_default();
        // mono plays on both sides
        let mut right = channels.next().unwrap_or_else(|| left.clone());
        left.truncate(frames);
        right.truncate(frames);

        log::info!("Loaded {} frames of audio", frames);
        self.left = left;
        self.right = right;
        self.frames = frames;
        self.position = 0;
    }

    /// Render one block into `left` and `right`
    ///
    /// Returns the normalized read head position every report interval of
    /// playing blocks. Stopped or empty blocks are silent and not counted.
    pub fn process(&mut self, left: &mut [f32], right: &mut [f32]) -> Option<f64> {
        if self.frames == 0 || !self.playing {
            left.fill(0.0);
            right.fill(0.0);
            return None;
        }

        let n = left.len().min(right.len());
        for i in 0..n {
            let frame = remap(&self.pattern, &mut self.ray, self.position, self.frames);
            left[i] = self.left[frame];
            right[i] = self.right[frame];
            self.position = (self.position + 1) % self.frames;
        }
        // mismatched buffers: the longer one's tail has no frames to play
        left[n..].fill(0.0);
        right[n..].fill(0.0);

        self.blocks += 1;
        if self.blocks < self.report_interval {
            return None;
        }
        self.blocks = 0;
        Some(self.position as f64 / self.frames as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::RENDER_QUANTUM;
    use crate::message::snapshot_channel;
    use crate::radar::Line;
    use glam::DVec2;

    fn ramp(frames: usize) -> Vec<f32> {
        (0..frames).map(|i| i as f32).collect()
    }

    fn mirror_pattern() -> Pattern {
        // reflects rays starting toward the bottom back up
        let mut pattern = Pattern::new();
        pattern.add_obstacle(Line::new(DVec2::new(-0.8, -0.5), DVec2::new(0.8, -0.5)));
        pattern
    }

    fn loaded(frames: usize) -> RadarProcessor {
        let mut processor = RadarProcessor::new(48_000.0);
        processor.handle(RadarMessage::SetAudio {
            channels: vec![ramp(frames), ramp(frames)],
            frames,
        });
        processor
    }

    #[test]
    fn test_remap_identity_without_obstacles() {
        let pattern = Pattern::new();
        let mut ray = Ray::new();
        for position in [0, 1, 17, 255, 511] {
            let frame = remap(&pattern, &mut ray, position, 512);
            // exit angle may land a hair below the input
            assert!(frame == position || frame + 1 == position, "{position} -> {frame}");
        }
        assert_eq!(remap(&pattern, &mut ray, 3, 0), 0);
    }

    #[test]
    fn test_remap_reflected() {
        let pattern = mirror_pattern();
        let mut ray = Ray::new();
        // angle 0 hits the line and comes back out at π
        assert_eq!(remap(&pattern, &mut ray, 0, 1024), 512);
    }

    #[test]
    fn test_silence_until_playing() {
        let mut processor = RadarProcessor::new(48_000.0);
        let mut left = [1.0f32; RENDER_QUANTUM];
        let mut right = [1.0f32; RENDER_QUANTUM];
        processor.process(&mut left, &mut right);
        assert!(left.iter().chain(right.iter()).all(|&s| s == 0.0));

        let mut processor = loaded(1024);
        left.fill(1.0);
        processor.process(&mut left, &mut right);
        assert!(left.iter().all(|&s| s == 0.0));
        assert_eq!(processor.position(), 0);
    }

    #[test]
    fn test_plays_and_wraps() {
        let mut processor = loaded(200);
        processor.handle(RadarMessage::TransportPlay);
        let mut left = [0.0f32; RENDER_QUANTUM];
        let mut right = [0.0f32; RENDER_QUANTUM];
        processor.process(&mut left, &mut right);
        processor.process(&mut left, &mut right);
        assert_eq!(processor.position(), (2 * RENDER_QUANTUM) % 200);
        assert_eq!(left, right);
        assert!(left.iter().all(|&s| (0.0..200.0).contains(&s)));
    }

    #[test]
    fn test_pattern_update_changes_output() {
        let (mut publisher, mut receiver) = snapshot_channel(4);
        let mut processor = loaded(1024);
        processor.handle(RadarMessage::TransportPlay);
        publisher.publish(&mirror_pattern());
        processor.drain(&mut receiver);
        assert_eq!(processor.pattern().user_obstacles().len(), 1);

        let mut left = [0.0f32; 1];
        let mut right = [0.0f32; 1];
        processor.process(&mut left, &mut right);
        assert_eq!(left[0], 512.0);
    }

    #[test]
    fn test_bad_pattern_keeps_previous() {
        let mut processor = loaded(64);
        processor.handle(RadarMessage::UpdatePattern {
            format: mirror_pattern().serialize(),
        });
        let mut format = mirror_pattern().serialize();
        format.bpm = -1.0;
        processor.handle(RadarMessage::UpdatePattern { format });
        assert_eq!(processor.pattern().user_obstacles().len(), 1);
        assert_eq!(processor.pattern().bpm(), 160.0);
    }

    #[test]
    fn test_transport_move() {
        let mut processor = loaded(1000);
        processor.handle(RadarMessage::TransportMove { position: 0.25 });
        assert_eq!(processor.position(), 250);
        processor.handle(RadarMessage::TransportMove { position: 1.5 });
        assert_eq!(processor.position(), 500);
        processor.handle(RadarMessage::TransportMove { position: f64::NAN });
        assert_eq!(processor.position(), 500);
    }

    #[test]
    fn test_mono_and_short_audio() {
        let mut processor = RadarProcessor::new(48_000.0);
        processor.handle(RadarMessage::SetAudio {
            channels: vec![ramp(100)],
            frames: 120,
        });
        assert_eq!(processor.frames(), 100);

        processor.handle(RadarMessage::TransportPlay);
        let mut left = [0.0f32; 8];
        let mut right = [0.0f32; 8];
        processor.process(&mut left, &mut right);
        assert_eq!(left, right);

        processor.handle(RadarMessage::SetAudio {
            channels: Vec::new(),
            frames: 0,
        });
        assert_eq!(processor.frames(), 0);
    }

    #[test]
    fn test_position_reports() {
        let mut processor = loaded(4800);
        processor.handle(RadarMessage::TransportPlay);
        let mut left = [0.0f32; RENDER_QUANTUM];
        let mut right = [0.0f32; RENDER_QUANTUM];

        // 48000 / 128 / 60 rounds down to 6 blocks per report
        let reports: Vec<_> = (0..12).map(|_| processor.process(&mut left, &mut right)).collect();
        assert!(reports[..5].iter().all(Option::is_none));
        let first = reports[5].unwrap();
        assert!((first - 6.0 * RENDER_QUANTUM as f64 / 4800.0).abs() < 1e-12);
        assert!(reports[11].is_some());
        assert_eq!(reports.iter().filter(|r| r.is_some()).count(), 2);
    }

    #[test]
    fn test_no_reports_while_paused() {
        let mut processor = loaded(4800);
        let mut left = [0.0f32; RENDER_QUANTUM];
        let mut right = [0.0f32; RENDER_QUANTUM];
        assert!((0..12).all(|_| processor.process(&mut left, &mut right).is_none()));

        // paused blocks don't count toward the next report
        processor.handle(RadarMessage::TransportPlay);
        let reports: Vec<_> = (0..6).map(|_| processor.process(&mut left, &mut right)).collect();
        assert!(reports[..5].iter().all(Option::is_none));
        assert!(reports[5].is_some());
    }

    #[test]
    fn test_mismatched_buffers_zero_the_tail() {
        let mut processor = loaded(64);
        processor.handle(RadarMessage::TransportPlay);
        let mut left = [9.0f32; 8];
        let mut right = [9.0f32; 4];
        processor.process(&mut left, &mut right);
        assert!(left[..4].iter().all(|&s| (0.0..64.0).contains(&s)));
        assert_eq!(&left[4..], &[0.0; 4]);
        assert!(right.iter().all(|&s| s != 9.0));
        assert_eq!(processor.position(), 4);
    }
}
