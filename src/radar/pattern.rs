//! Pattern - the outline, the user obstacles, and the origin rays start from
//!
//! Index 0 of the obstacle list is always the outline. Every mutation
//! notifies the registered observers, which is how the editor view and the
//! audio side learn about edits.

use std::fmt;

use glam::DVec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::obstacle::{Arc, Curve, HandleKind, Line, Obstacle};
use super::ray::Ray;
use super::tracer::{self, Trace};
use crate::consts::{DEFAULT_BARS, DEFAULT_BPM, DEFAULT_FILE, RIM_TOLERANCE};
use crate::error::{RadarError, Result};
use crate::format::{ObstacleFormat, PatternFormat, PointFormat};

/// Token returned by [`Pattern::add_observer`]
pub type ObserverId = u64;

type Observer = Box<dyn FnMut(&Pattern) + Send>;

pub struct Pattern {
    origin: DVec2,
    obstacles: Vec<Obstacle>,
    file: String,
    bpm: f64,
    bars: u32,
    observers: Vec<(ObserverId, Observer)>,
    next_observer: ObserverId,
}

impl fmt::Debug for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pattern")
            .field("origin", &self.origin)
            .field("obstacles", &self.obstacles)
            .field("file", &self.file)
            .field("bpm", &self.bpm)
            .field("bars", &self.bars)
            .field("observers", &self.observers.len())
            .finish()
    }
}

impl Default for Pattern {
    fn default() -> Self {
        Self::new()
    }
}

impl Pattern {
    /// Empty pattern: just the outline, origin at the center
    pub fn new() -> Self {
        Self {
            origin: DVec2::ZERO,
            obstacles: vec![Obstacle::Outline],
            file: DEFAULT_FILE.to_string(),
            bpm: DEFAULT_BPM,
            bars: DEFAULT_BARS,
            observers: Vec::new(),
            next_observer: 0,
        }
    }

    /// Random pattern for experiments, reproducible from `seed`
    pub fn scatter(seed: u64, count: usize) -> Self {
        let mut rng = Pcg32::seed_from_u64(seed);
        let mut pattern = Self::new();

        let point = |rng: &mut Pcg32| {
            let angle = rng.random_range(0.0..std::f64::consts::TAU);
            let radius = 0.9 * rng.random::<f64>().sqrt();
            DVec2::new(angle.cos(), angle.sin()) * radius
        };

        for _ in 0..count {
            let p0 = point(&mut rng);
            let p1 = point(&mut rng);
            let obstacle: Obstacle = match rng.random_range(0..3) {
                0 => Line::new(p0, p1).into(),
                1 => Arc::new(p0, p1, rng.random_range(-1.5..1.5)).into(),
                _ => Curve::new(p0, point(&mut rng), p1).into(),
            };
            pattern.obstacles.push(obstacle);
        }
        pattern.origin = point(&mut rng) * 0.5;

        log::info!("Scattered {} obstacles from seed {}", count, seed);
        pattern
    }

    pub fn origin(&self) -> DVec2 {
        self.origin
    }

    /// Move the origin; it must stay inside the disk
    pub fn set_origin(&mut self, origin: DVec2) -> Result<()> {
        check_origin(origin)?;
        self.origin = origin;
        self.notify();
        Ok(())
    }

    pub fn reset_origin(&mut self) {
        self.origin = DVec2::ZERO;
        self.notify();
    }

    /// All obstacles, outline first
    pub fn obstacles(&self) -> &[Obstacle] {
        &self.obstacles
    }

    /// Obstacles without the outline
    pub fn user_obstacles(&self) -> &[Obstacle] {
        &self.obstacles[1..]
    }

    pub fn obstacle(&self, index: usize) -> Option<&Obstacle> {
        self.obstacles.get(index)
    }

    /// Append an obstacle and return its index
    pub fn add_obstacle(&mut self, obstacle: impl Into<Obstacle>) -> usize {
        let obstacle = obstacle.into();
        if obstacle.is_boundary() {
            log::warn!("Ignoring a second outline");
            return 0;
        }
        self.obstacles.push(obstacle);
        self.notify();
        self.obstacles.len() - 1
    }

    /// Remove the obstacle at `index`; the outline can't be removed
    pub fn remove_obstacle(&mut self, index: usize) -> Option<Obstacle> {
        if index == 0 {
            log::warn!("Refusing to remove the outline");
            return None;
        }
        if index >= self.obstacles.len() {
            log::warn!("No obstacle at index {}", index);
            return None;
        }
        let removed = self.obstacles.remove(index);
        self.notify();
        Some(removed)
    }

    /// Remove every user obstacle
    pub fn clear_obstacles(&mut self) {
        self.obstacles.truncate(1);
        self.notify();
    }

    /// Edit a user obstacle in place
    pub fn update_obstacle(&mut self, index: usize, edit: impl FnOnce(&mut Obstacle)) -> bool {
        if index == 0 {
            return false;
        }
        let Some(obstacle) = self.obstacles.get_mut(index) else {
            return false;
        };
        edit(obstacle);
        self.notify();
        true
    }

    /// Drag one handle of a user obstacle
    pub fn move_handle(&mut self, index: usize, kind: HandleKind, p: DVec2) -> bool {
        if index == 0 {
            return false;
        }
        let moved = self
            .obstacles
            .get_mut(index)
            .is_some_and(|obstacle| obstacle.move_handle(kind, p));
        if moved {
            self.notify();
        }
        moved
    }

    pub fn file(&self) -> &str {
        &self.file
    }

    pub fn set_file(&mut self, file: impl Into<String>) {
        self.file = file.into();
        self.notify();
    }

    pub fn bpm(&self) -> f64 {
        self.bpm
    }

    pub fn bars(&self) -> u32 {
        self.bars
    }

    pub fn set_timing(&mut self, bpm: f64, bars: u32) -> Result<()> {
        check_timing(bpm, bars)?;
        self.bpm = bpm;
        self.bars = bars;
        self.notify();
        Ok(())
    }

    /// Loop length in seconds, four beats to the bar
    pub fn loop_seconds(&self) -> f64 {
        self.bars as f64 * 4.0 * 60.0 / self.bpm
    }

    /// Register a callback run after every change
    pub fn add_observer(&mut self, observer: impl FnMut(&Pattern) + Send + 'static) -> ObserverId {
        let id = self.next_observer;
        self.next_observer += 1;
        self.observers.push((id, Box::new(observer)));
        id
    }

    pub fn remove_observer(&mut self, id: ObserverId) -> bool {
        let before = self.observers.len();
        self.observers.retain(|(other, _)| *other != id);
        self.observers.len() != before
    }

    fn notify(&mut self) {
        let mut observers = std::mem::take(&mut self.observers);
        for (_, observer) in observers.iter_mut() {
            observer(self);
        }
        self.observers = observers;
    }

    /// Snapshot of everything but the outline
    pub fn serialize(&self) -> PatternFormat {
        PatternFormat {
            origin: PointFormat {
                x: self.origin.x,
                y: self.origin.y,
            },
            obstacles: self.obstacles.iter().filter_map(Obstacle::to_format).collect(),
            file: self.file.clone(),
            bpm: self.bpm,
            bars: self.bars,
        }
    }

    /// Replace the pattern contents from a snapshot
    ///
    /// The snapshot is validated first; on error nothing changes. Observers
    /// are kept.
    pub fn deserialize(&mut self, format: &PatternFormat) -> Result<()> {
        let origin = DVec2::new(format.origin.x, format.origin.y);
        if !origin.is_finite() {
            return Err(RadarError::NonFinite { what: "origin" });
        }
        check_origin(origin)?;
        check_timing(format.bpm, format.bars)?;
        if !format.obstacles.iter().all(ObstacleFormat::is_finite) {
            return Err(RadarError::NonFinite { what: "obstacle" });
        }

        self.origin = origin;
        self.obstacles.truncate(1);
        self.obstacles.extend(format.obstacles.iter().map(Obstacle::from));
        self.file.clone_from(&format.file);
        self.bpm = format.bpm;
        self.bars = format.bars;
        log::debug!("Loaded pattern with {} obstacles", format.obstacles.len());
        self.notify();
        Ok(())
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let mut pattern = Self::new();
        pattern.deserialize(&PatternFormat::from_json(json)?)?;
        Ok(pattern)
    }

    pub fn to_json(&self) -> Result<String> {
        self.serialize().to_json()
    }

    /// Exit angle for a ray emitted at `angle` from the origin
    pub fn evaluate(&self, ray: &mut Ray, angle: f64) -> f64 {
        ray.reuse(angle, self.origin);
        tracer::evaluate(ray, &self.obstacles)
    }

    /// Bounce path for a ray emitted at `angle` from the origin
    pub fn trace<'a>(&'a self, ray: &'a mut Ray, angle: f64) -> Trace<'a> {
        ray.reuse(angle, self.origin);
        Trace::new(ray, &self.obstacles)
    }
}

fn check_origin(origin: DVec2) -> Result<()> {
    if !origin.is_finite() || origin.length() > 1.0 + RIM_TOLERANCE {
        return Err(RadarError::OriginOutsideDisk {
            x: origin.x,
            y: origin.y,
        });
    }
    Ok(())
}

fn check_timing(bpm: f64, bars: u32) -> Result<()> {
    if !(bpm.is_finite() && bpm > 0.0) || bars == 0 {
        return Err(RadarError::InvalidTiming { bpm, bars });
    }
    Ok(())
}
