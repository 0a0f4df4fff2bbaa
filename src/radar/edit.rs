//! Editing helpers: handle picking, grid snapping, creation tools
//!
//! Everything here works in disk coordinates; converting from screen pixels
//! is the caller's job.

use glam::DVec2;
use std::f64::consts::TAU;

use super::obstacle::{Arc, Curve, HandleKind, Line, Obstacle};
use super::pattern::Pattern;

/// What a handle moves when dragged
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandleTarget {
    Origin,
    Obstacle { index: usize, kind: HandleKind },
}

/// A draggable point
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Handle {
    pub target: HandleTarget,
    pub pos: DVec2,
}

impl Handle {
    /// Drags of this handle are clamped to the unit circle
    pub fn constrained_to_circle(&self) -> bool {
        match self.target {
            HandleTarget::Origin => true,
            HandleTarget::Obstacle { kind, .. } => kind.constrained_to_circle(),
        }
    }
}

/// Every handle of the pattern: obstacle handles in list order, then the origin
pub fn handles(pattern: &Pattern) -> Vec<Handle> {
    let mut out: Vec<Handle> = pattern
        .obstacles()
        .iter()
        .enumerate()
        .flat_map(|(index, obstacle)| {
            obstacle.handles().into_iter().map(move |(kind, pos)| Handle {
                target: HandleTarget::Obstacle { index, kind },
                pos,
            })
        })
        .collect();
    out.push(Handle {
        target: HandleTarget::Origin,
        pos: pattern.origin(),
    });
    out
}

/// Nearest handle within `capture_radius` of `p`
pub fn closest_handle(pattern: &Pattern, p: DVec2, capture_radius: f64) -> Option<Handle> {
    let limit = capture_radius * capture_radius;
    let mut best = None;
    let mut best_distance = f64::INFINITY;
    for handle in handles(pattern) {
        let d = handle.pos.distance_squared(p);
        if d < limit && d < best_distance {
            best_distance = d;
            best = Some(handle);
        }
    }
    best
}

/// Index of the nearest user obstacle within `capture_radius` of `p`
pub fn closest_obstacle(pattern: &Pattern, p: DVec2, capture_radius: f64) -> Option<usize> {
    let mut best = None;
    let mut best_distance = f64::INFINITY;
    for (index, obstacle) in pattern.obstacles().iter().enumerate().skip(1) {
        let d = obstacle.distance(p);
        if d < capture_radius && d < best_distance {
            best_distance = d;
            best = Some(index);
        }
    }
    best
}

/// Apply a drag of `handle` to `p`
///
/// Constrained handles are pulled back onto the unit circle. Returns false if
/// the handle no longer matches the pattern.
pub fn drag_handle(pattern: &mut Pattern, handle: &Handle, p: DVec2) -> bool {
    let p = if handle.constrained_to_circle() {
        clamp_to_circle(p)
    } else {
        p
    };
    match handle.target {
        HandleTarget::Origin => pattern.set_origin(p).is_ok(),
        HandleTarget::Obstacle { index, kind } => pattern.move_handle(index, kind, p),
    }
}

fn clamp_to_circle(p: DVec2) -> DVec2 {
    let length = p.length();
    if length > 1.0 { p / length } else { p }
}

/// Round a length to a multiple of `1 / resolution`; 0 disables
pub fn snap_length(length: f64, resolution: u32) -> f64 {
    if resolution == 0 {
        return length;
    }
    let res = resolution as f64;
    (length * res).round() / res
}

/// Round an angle to a multiple of `2π / resolution`; 0 disables
pub fn snap_angle(angle: f64, resolution: u32) -> f64 {
    if resolution == 0 {
        return angle;
    }
    let res = resolution as f64;
    let turns = angle / TAU;
    ((turns - turns.floor()) * res).round() / res * TAU
}

/// Snap `p` to the polar grid
///
/// The grid is centered on the disk center, with `angle_resolution` spokes
/// and `distance_resolution` rings per unit length. With `constrain` the
/// result never leaves the disk.
pub fn snap(p: DVec2, angle_resolution: u32, distance_resolution: u32, constrain: bool) -> DVec2 {
    let length = snap_length(p.length(), distance_resolution);
    let length = if constrain { length.min(1.0) } else { length };
    let angle = snap_angle(p.y.atan2(p.x), angle_resolution);
    DVec2::new(angle.cos(), angle.sin()) * length
}

/// Shape created by a press-and-drag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tool {
    Line,
    Arc,
    Curve,
}

impl Tool {
    /// Degenerate shape at the press point
    pub fn create(self, p: DVec2) -> Obstacle {
        match self {
            Tool::Line => Line::new(p, p).into(),
            Tool::Arc => Arc::new(p, p, 0.0).into(),
            Tool::Curve => Curve::new(p, p, p).into(),
        }
    }

    /// Stretch a freshly created shape from its start point to `p`
    ///
    /// Arcs start flat and curves start straight; the bend and control
    /// handles shape them afterwards.
    pub fn drag(self, obstacle: &mut Obstacle, p: DVec2) {
        match (self, obstacle) {
            (Tool::Line, Obstacle::Line(line)) => line.set(line.p0(), p),
            (Tool::Arc, Obstacle::Arc(arc)) => arc.set(arc.p0(), p, 0.0),
            (Tool::Curve, Obstacle::Curve(curve)) => {
                let p0 = curve.p0();
                curve.set(p0, p0.lerp(p, 0.5), p);
            }
            (tool, obstacle) => {
                log::warn!("{:?} tool can't drag a {}", tool, obstacle.kind());
            }
        }
    }
}
