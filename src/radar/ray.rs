//! Ray state for a single trace
//!
//! A ray starts at the pattern origin, walks straight to the nearest
//! obstacle, reflects, and repeats. The same instance is reused for every
//! trace of its owner (audio processor, editor preview), so it also keeps
//! the last angle it resolved.

use glam::DVec2;

use crate::consts::{MAX_MOVEMENTS, RIM_TOLERANCE};
use crate::{angle_to_direction, direction_to_angle};

/// Read-only copy of a ray at one point of a trace
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RaySnapshot {
    pub pos: DVec2,
    pub dir: DVec2,
    pub movements: u32,
    /// The trace ran out of movements; `pos` was put back on the rim
    pub exceeded: bool,
}

impl RaySnapshot {
    /// Radar angle of the snapshot position
    pub fn angle(&self) -> f64 {
        direction_to_angle(self.pos)
    }
}

#[derive(Debug, Clone)]
pub struct Ray {
    pos: DVec2,
    dir: DVec2,
    movements: u32,
    last_angle: f64,
}

impl Default for Ray {
    fn default() -> Self {
        Self::new()
    }
}

impl Ray {
    pub fn new() -> Self {
        Self {
            pos: DVec2::ZERO,
            dir: DVec2::new(0.0, -1.0),
            movements: 0,
            last_angle: 0.0,
        }
    }

    /// Restart the ray at `origin`, heading along radar `angle`
    pub fn reuse(&mut self, angle: f64, origin: DVec2) -> &mut Self {
        self.pos = origin;
        self.assert_inside_unit_circle();
        self.dir = angle_to_direction(angle);
        self.normalize();
        self.movements = 0;
        self
    }

    /// Advance along the direction by `dt`; counts as one movement
    pub fn advance(&mut self, dt: f64) {
        debug_assert!(dt >= 0.0, "negative move {dt}");
        self.pos += self.dir * dt;
        self.assert_inside_unit_circle();
        self.movements += 1;
    }

    /// Mirror the direction about the unit normal `n`
    pub fn reflect(&mut self, n: DVec2) {
        self.dir -= 2.0 * self.dir.dot(n) * n;
        self.normalize();
    }

    /// Re-normalize the direction against accumulated drift
    pub fn normalize(&mut self) {
        self.dir /= self.dir.length();
    }

    #[inline]
    pub fn pos(&self) -> DVec2 {
        self.pos
    }

    #[inline]
    pub fn dir(&self) -> DVec2 {
        self.dir
    }

    #[inline]
    pub fn movements(&self) -> u32 {
        self.movements
    }

    /// position · direction
    #[inline]
    pub fn dot(&self) -> f64 {
        self.pos.dot(self.dir)
    }

    /// position × direction
    #[inline]
    pub fn cross(&self) -> f64 {
        self.pos.perp_dot(self.dir)
    }

    /// Radar angle of the current position in [0, 2π)
    pub fn angle(&self) -> f64 {
        direction_to_angle(self.pos)
    }

    pub fn move_exceeded(&self) -> bool {
        self.movements >= MAX_MOVEMENTS
    }

    /// Angle of the last trace that reached the rim
    pub fn last_angle(&self) -> f64 {
        self.last_angle
    }

    pub(crate) fn resolve(&mut self) -> f64 {
        self.last_angle = self.angle();
        self.last_angle
    }

    /// Park the ray on the rim at the last resolved angle
    pub(crate) fn fall_back_to_last_angle(&mut self) {
        self.pos = angle_to_direction(self.last_angle);
    }

    pub fn snapshot(&self) -> RaySnapshot {
        RaySnapshot {
            pos: self.pos,
            dir: self.dir,
            movements: self.movements,
            exceeded: self.move_exceeded(),
        }
    }

    #[inline]
    fn assert_inside_unit_circle(&self) {
        debug_assert!(
            self.pos.length() <= 1.0 + RIM_TOLERANCE,
            "outside circle ({})",
            self.pos.length()
        );
    }
}
