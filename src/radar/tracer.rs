//! Bounce loop
//!
//! A trace repeatedly moves the ray to the nearest obstacle hit and reflects
//! it there, until it reaches the outline or runs out of movements. The same
//! loop drives the audio mapping (`evaluate`) and the editor preview
//! (`Trace`).

use super::obstacle::Obstacle;
use super::ray::{Ray, RaySnapshot};

/// Outcome of a single step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Touch {
    /// Reflected off a user obstacle, keep going
    Obstacle,
    /// Reached the boundary, the trace is over
    Boundary,
}

/// Move the ray to the nearest obstacle and respond to it
///
/// # Panics
///
/// Panics if no obstacle reports a positive distance. The outline always
/// does, so this only happens for an obstacle list without one.
pub fn step(ray: &mut Ray, obstacles: &[Obstacle]) -> Touch {
    let mut nearest = None;
    let mut nearest_distance = f64::INFINITY;
    for obstacle in obstacles {
        let capture = obstacle.capture(ray);
        // strict: the first obstacle wins a tie
        if capture.distance > 0.0 && capture.distance < nearest_distance {
            nearest_distance = capture.distance;
            nearest = Some((obstacle, capture));
        }
    }
    let Some((obstacle, capture)) = nearest else {
        panic!(
            "no obstacle captured the ray at {:?} heading {:?}; the outline is missing",
            ray.pos(),
            ray.dir()
        );
    };

    ray.advance(capture.distance);
    if obstacle.is_boundary() {
        return Touch::Boundary;
    }
    obstacle.reflect(ray, &capture);
    Touch::Obstacle
}

/// Trace the ray to completion and return its exit angle
///
/// When the movement budget runs out, the last angle this ray resolved is
/// returned instead of a mid-flight one.
pub fn evaluate(ray: &mut Ray, obstacles: &[Obstacle]) -> f64 {
    loop {
        if step(ray, obstacles) == Touch::Boundary {
            return ray.resolve();
        }
        if ray.move_exceeded() {
            return ray.last_angle();
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TraceState {
    Start,
    Bouncing,
    Done,
}

/// Step-by-step trace for drawing the ray path
///
/// Yields the starting point, one snapshot per bounce, and the exit point.
/// A trace that runs out of movements ends with a snapshot parked on the rim
/// at the last resolved angle, flagged `exceeded`.
#[derive(Debug)]
pub struct Trace<'a> {
    ray: &'a mut Ray,
    obstacles: &'a [Obstacle],
    state: TraceState,
}

impl<'a> Trace<'a> {
    /// Trace an already positioned ray
    pub fn new(ray: &'a mut Ray, obstacles: &'a [Obstacle]) -> Self {
        Self {
            ray,
            obstacles,
            state: TraceState::Start,
        }
    }
}

impl Iterator for Trace<'_> {
    type Item = RaySnapshot;

    fn next(&mut self) -> Option<RaySnapshot> {
        match self.state {
            TraceState::Start => {
                self.state = TraceState::Bouncing;
                Some(self.ray.snapshot())
            }
            TraceState::Bouncing => {
                if self.ray.move_exceeded() {
                    self.ray.fall_back_to_last_angle();
                    self.state = TraceState::Done;
                    return Some(self.ray.snapshot());
                }
                if step(self.ray, self.obstacles) == Touch::Boundary {
                    self.ray.resolve();
                    self.state = TraceState::Done;
                }
                Some(self.ray.snapshot())
            }
            TraceState::Done => None,
        }
    }
}

impl std::iter::FusedIterator for Trace<'_> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::MAX_MOVEMENTS;
    use crate::radar::obstacle::{Arc, Line};
    use glam::DVec2;
    use std::f64::consts::{PI, TAU};

    fn ray_at(angle: f64, origin: DVec2) -> Ray {
        let mut ray = Ray::new();
        ray.reuse(angle, origin);
        ray
    }

    #[test]
    fn test_outline_only_single_step() {
        let obstacles = [Obstacle::Outline];
        for i in 0..24 {
            let angle = i as f64 / 24.0 * TAU;
            let origin = DVec2::new(0.3, -0.2);
            let mut ray = ray_at(angle, origin);
            let out = evaluate(&mut ray, &obstacles);
            assert_eq!(ray.movements(), 1);

            // closed form exit point
            let dir = crate::angle_to_direction(angle);
            let b = origin.dot(dir);
            let t = -b + (b * b - origin.length_squared() + 1.0).sqrt();
            let expected = crate::direction_to_angle(origin + dir * t);
            let diff = (out - expected).abs();
            assert!(diff < 1e-9 || (diff - TAU).abs() < 1e-9, "{angle}: {out} vs {expected}");
        }
    }

    #[test]
    fn test_centered_ray_is_identity() {
        let obstacles = [Obstacle::Outline];
        let mut ray = ray_at(1.234, DVec2::ZERO);
        assert!((evaluate(&mut ray, &obstacles) - 1.234).abs() < 1e-12);
    }

    #[test]
    fn test_line_bounce_reverses_playback() {
        let obstacles = [
            Obstacle::Outline,
            Obstacle::Line(Line::new(DVec2::new(-0.8, -0.5), DVec2::new(0.8, -0.5))),
        ];
        let mut ray = ray_at(0.0, DVec2::ZERO);
        assert_eq!(step(&mut ray, &obstacles), Touch::Obstacle);
        assert!((ray.pos() - DVec2::new(0.0, -0.5)).length() < 1e-12);
        assert!((ray.dir() - DVec2::new(0.0, 1.0)).length() < 1e-12);
        assert_eq!(step(&mut ray, &obstacles), Touch::Boundary);
        assert!((ray.angle() - PI).abs() < 1e-12);
    }

    #[test]
    fn test_tie_goes_to_first_obstacle() {
        // both cross the ray path at (0, -0.5)
        let flat = Obstacle::Line(Line::new(DVec2::new(-0.75, -0.5), DVec2::new(0.75, -0.5)));
        let tilted = Obstacle::Line(Line::new(DVec2::new(-0.25, -0.75), DVec2::new(0.25, -0.25)));

        let obstacles = [Obstacle::Outline, flat.clone(), tilted.clone()];
        let mut ray = ray_at(0.0, DVec2::ZERO);
        step(&mut ray, &obstacles);
        assert!((ray.dir() - DVec2::new(0.0, 1.0)).length() < 1e-12);

        let obstacles = [Obstacle::Outline, tilted, flat];
        let mut ray = ray_at(0.0, DVec2::ZERO);
        step(&mut ray, &obstacles);
        assert!(ray.dir().y.abs() < 1e-12);
    }

    #[test]
    #[should_panic(expected = "outline is missing")]
    fn test_missing_outline_panics() {
        let obstacles = [Obstacle::Line(Line::new(DVec2::new(-0.8, -0.5), DVec2::new(0.8, -0.5)))];
        let mut ray = ray_at(PI, DVec2::ZERO);
        step(&mut ray, &obstacles);
    }

    fn trapped() -> Vec<Obstacle> {
        // two facing mirrors; a ray running along the y axis bounces forever
        vec![
            Obstacle::Outline,
            Obstacle::Line(Line::new(DVec2::new(-0.5, -0.5), DVec2::new(0.5, -0.5))),
            Obstacle::Line(Line::new(DVec2::new(-0.5, 0.5), DVec2::new(0.5, 0.5))),
        ]
    }

    #[test]
    fn test_budget_falls_back_to_last_angle() {
        let obstacles = trapped();
        let mut ray = Ray::new();

        // resolve a real angle first, away from the mirrors
        ray.reuse(PI / 2.0, DVec2::ZERO);
        let first = evaluate(&mut ray, &obstacles);
        assert!((first - PI / 2.0).abs() < 1e-12);

        ray.reuse(0.0, DVec2::ZERO);
        let out = evaluate(&mut ray, &obstacles);
        assert_eq!(ray.movements(), MAX_MOVEMENTS);
        assert_eq!(out, first);
    }

    #[test]
    fn test_trace_path() {
        let obstacles = [
            Obstacle::Outline,
            Obstacle::Line(Line::new(DVec2::new(-0.8, -0.5), DVec2::new(0.8, -0.5))),
        ];
        let mut ray = ray_at(0.0, DVec2::ZERO);
        let points: Vec<_> = Trace::new(&mut ray, &obstacles).collect();
        assert_eq!(points.len(), 3);
        assert_eq!(points[0].pos, DVec2::ZERO);
        assert!((points[1].pos - DVec2::new(0.0, -0.5)).length() < 1e-12);
        assert!((points[2].pos - DVec2::new(0.0, 1.0)).length() < 1e-12);
        assert!(!points[2].exceeded);
        assert!((ray.last_angle() - PI).abs() < 1e-12);
    }

    #[test]
    fn test_trace_matches_evaluate() {
        let obstacles = [
            Obstacle::Outline,
            Obstacle::Arc(Arc::new(DVec2::new(-0.6, 0.2), DVec2::new(0.5, -0.4), 0.7)),
            Obstacle::Line(Line::new(DVec2::new(0.1, 0.6), DVec2::new(0.7, 0.1))),
        ];
        let origin = DVec2::new(-0.1, 0.1);
        for i in 0..48 {
            let angle = i as f64 / 48.0 * TAU;
            let mut ray = ray_at(angle, origin);
            let out = evaluate(&mut ray, &obstacles);

            let mut ray = ray_at(angle, origin);
            let last = Trace::new(&mut ray, &obstacles).last().unwrap();
            assert!((last.angle() - out).abs() < 1e-12);
        }
    }

    #[test]
    fn test_trace_budget_ends_on_rim() {
        let obstacles = trapped();
        let mut ray = ray_at(0.0, DVec2::ZERO);
        let points: Vec<_> = Trace::new(&mut ray, &obstacles).collect();
        // start + every movement + the parked point
        assert_eq!(points.len(), MAX_MOVEMENTS as usize + 2);
        let last = points.last().unwrap();
        assert!(last.exceeded);
        assert!((last.pos.length() - 1.0).abs() < 1e-12);
    }
}
