//! Obstacles a ray can hit
//!
//! Every obstacle answers the same questions:
//! - `capture`: forward distance along a ray to the shape (or a miss)
//! - `reflect`: bounce the ray at the captured point
//! - `is_boundary`: whether a hit ends the trace instead
//!
//! Derived geometry (line normal, fitted arc circle) is recomputed on every
//! `set`; nothing is cached across traces.

use glam::DVec2;
use std::f64::consts::TAU;

use super::ray::Ray;
use super::sdf::{sd_arc, sd_bezier, sd_segment};
use crate::consts::{EPSILON, LINE_MODE_EPSILON};
use crate::format::ObstacleFormat;

/// Result of a capture query
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Capture {
    /// Forward distance along the ray, `f64::INFINITY` for a miss
    pub distance: f64,
    /// Shape parameter at the hit (segment/curve `t`), handed back to `reflect`
    pub t: f64,
}

impl Capture {
    pub const MISS: Capture = Capture {
        distance: f64::INFINITY,
        t: 0.0,
    };

    #[inline]
    pub fn at(distance: f64) -> Self {
        Self { distance, t: 0.0 }
    }

    #[inline]
    pub fn is_hit(&self) -> bool {
        self.distance.is_finite()
    }
}

/// Ray against the segment `p0`-`p1`, endpoints included
fn segment_capture(ray: &Ray, p0: DVec2, p1: DVec2) -> Capture {
    let d = p1 - p0;
    let v = ray.dir();
    let ud = d.y * v.x - d.x * v.y;
    let p = p0 - ray.pos();
    let dt = (d.y * p.x - d.x * p.y) / ud;
    // also rejects NaN from a parallel or zero-length segment
    if !(dt >= EPSILON) {
        return Capture::MISS;
    }
    let ua = (v.y * p.x - v.x * p.y) / ud;
    if !(0.0..=1.0).contains(&ua) {
        return Capture::MISS;
    }
    Capture { distance: dt, t: ua }
}

/// Unit normal of the segment `p0`-`p1`
fn segment_normal(p0: DVec2, p1: DVec2) -> DVec2 {
    let d = p1 - p0;
    DVec2::new(d.y, -d.x).normalize_or_zero()
}

fn lerp_points(p0: DVec2, p1: DVec2, n: usize) -> Vec<DVec2> {
    (0..n)
        .map(|i| p0.lerp(p1, i as f64 / (n - 1).max(1) as f64))
        .collect()
}

/// Draggable control point of an obstacle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandleKind {
    Start,
    End,
    /// Arc bend point
    Bend,
    /// Curve midpoint (t = ½)
    Control,
}

impl HandleKind {
    /// Endpoints stay inside the disk while dragged
    pub fn constrained_to_circle(&self) -> bool {
        matches!(self, HandleKind::Start | HandleKind::End)
    }
}

/// Straight segment
#[derive(Debug, Clone, PartialEq)]
pub struct Line {
    p0: DVec2,
    p1: DVec2,
    normal: DVec2,
}

impl Line {
    pub fn new(p0: DVec2, p1: DVec2) -> Self {
        let mut line = Self {
            p0,
            p1,
            normal: DVec2::ZERO,
        };
        line.update();
        line
    }

    pub fn set(&mut self, p0: DVec2, p1: DVec2) {
        self.p0 = p0;
        self.p1 = p1;
        self.update();
    }

    pub fn p0(&self) -> DVec2 {
        self.p0
    }

    pub fn p1(&self) -> DVec2 {
        self.p1
    }

    pub fn normal(&self) -> DVec2 {
        self.normal
    }

    pub fn capture(&self, ray: &Ray) -> Capture {
        segment_capture(ray, self.p0, self.p1)
    }

    pub fn reflect(&self, ray: &mut Ray) {
        ray.reflect(self.normal);
    }

    pub fn distance(&self, p: DVec2) -> f64 {
        sd_segment(p, self.p0, self.p1)
    }

    fn update(&mut self) {
        self.normal = segment_normal(self.p0, self.p1);
    }
}

/// Circular arc through two endpoints, bulging by `bend`
///
/// The bend point sits on the chord's perpendicular bisector, offset by
/// `bend * chord / 2`. With |bend| below [`LINE_MODE_EPSILON`] the arc is its
/// chord.
#[derive(Debug, Clone, PartialEq)]
pub struct Arc {
    p0: DVec2,
    p1: DVec2,
    bend: f64,
    bend_point: DVec2,
    center: DVec2,
    radius: f64,
    angle0: f64,
    angle1: f64,
    angle_width: f64,
}

impl Arc {
    pub fn new(p0: DVec2, p1: DVec2, bend: f64) -> Self {
        let mut arc = Self {
            p0,
            p1,
            bend,
            bend_point: DVec2::ZERO,
            center: DVec2::ZERO,
            radius: 0.0,
            angle0: 0.0,
            angle1: 0.0,
            angle_width: 0.0,
        };
        arc.update();
        arc
    }

    pub fn set(&mut self, p0: DVec2, p1: DVec2, bend: f64) {
        self.p0 = p0;
        self.p1 = p1;
        self.bend = bend;
        self.update();
    }

    pub fn p0(&self) -> DVec2 {
        self.p0
    }

    pub fn p1(&self) -> DVec2 {
        self.p1
    }

    pub fn bend(&self) -> f64 {
        self.bend
    }

    pub fn bend_point(&self) -> DVec2 {
        self.bend_point
    }

    pub fn center(&self) -> DVec2 {
        self.center
    }

    pub fn radius(&self) -> f64 {
        self.radius
    }

    /// Start angle (atan2 about the center) in [0, 2π)
    pub fn angle0(&self) -> f64 {
        self.angle0
    }

    pub fn angle1(&self) -> f64 {
        self.angle1
    }

    /// Angular span in [0, 2π)
    pub fn angle_width(&self) -> f64 {
        self.angle_width
    }

    pub fn appears_as_line(&self) -> bool {
        self.bend.abs() < LINE_MODE_EPSILON || self.radius == 0.0
    }

    /// Whether the atan2 angle `theta` about the center lies on the arc
    pub fn contains_angle(&self, theta: f64) -> bool {
        (theta - self.angle0).rem_euclid(TAU) <= self.angle_width
    }

    /// Bend that places the bend point at `q`, keeping the endpoints
    pub fn bend_toward(&self, q: DVec2) -> f64 {
        let d = self.p1 - self.p0;
        let len_sq = d.length_squared();
        if len_sq < 1e-24 {
            return self.bend;
        }
        let m = self.p0 + d * 0.5;
        2.0 * (d.y * (q.x - m.x) - d.x * (q.y - m.y)) / len_sq
    }

    pub fn capture(&self, ray: &Ray) -> Capture {
        if self.appears_as_line() {
            return segment_capture(ray, self.p0, self.p1);
        }
        let v = ray.dir();
        let e = ray.pos() - self.center;
        let ev = e.perp_dot(v);
        let sq = self.radius * self.radius - ev * ev;
        if sq < 0.0 {
            return Capture::MISS;
        }
        let sq = sq.sqrt();
        let ed = e.dot(v);

        let mut best = Capture::MISS;
        for dt in [sq - ed, -sq - ed] {
            if dt < EPSILON || dt >= best.distance {
                continue;
            }
            let hit = e + v * dt;
            if self.contains_angle(hit.y.atan2(hit.x)) {
                best = Capture::at(dt);
            }
        }
        best
    }

    pub fn reflect(&self, ray: &mut Ray) {
        if self.appears_as_line() {
            ray.reflect(segment_normal(self.p0, self.p1));
        } else {
            ray.reflect((ray.pos() - self.center) / self.radius);
        }
    }

    pub fn distance(&self, p: DVec2) -> f64 {
        if self.appears_as_line() {
            sd_segment(p, self.p0, self.p1)
        } else {
            sd_arc(p, self.center, self.radius, self.angle0, self.angle_width, self.p0, self.p1)
        }
    }

    pub fn sample_path(&self, n: usize) -> Vec<DVec2> {
        if self.appears_as_line() {
            return lerp_points(self.p0, self.p1, n);
        }
        (0..n)
            .map(|i| {
                let a = self.angle0 + self.angle_width * i as f64 / (n - 1).max(1) as f64;
                self.center + DVec2::new(a.cos(), a.sin()) * self.radius
            })
            .collect()
    }

    fn update(&mut self) {
        let (p0, p1) = (self.p0, self.p1);
        let d = p1 - p0;
        self.bend_point = p0 + 0.5 * DVec2::new(d.x + d.y * self.bend, d.y - d.x * self.bend);

        // center is equidistant from p0, p1 and the bend point:
        // 2(p2 - p1)·c = |p2|² - |p1|²
        // 2(p0 - p1)·c = |p0|² - |p1|²
        let p2 = self.bend_point;
        let a1 = 2.0 * (p2 - p1);
        let a2 = 2.0 * (p0 - p1);
        let c1 = p2.length_squared() - p1.length_squared();
        let c2 = p0.length_squared() - p1.length_squared();
        let det = a1.x * a2.y - a2.x * a1.y;
        if self.bend.abs() < LINE_MODE_EPSILON || det.abs() < 1e-18 {
            self.center = DVec2::ZERO;
            self.radius = 0.0;
            self.angle0 = 0.0;
            self.angle1 = 0.0;
            self.angle_width = 0.0;
            return;
        }
        self.center = DVec2::new((c1 * a2.y - c2 * a1.y) / det, (a1.x * c2 - a2.x * c1) / det);
        self.radius = (p1 - self.center).length();

        let r0 = p0 - self.center;
        let r1 = p1 - self.center;
        let (mut angle0, mut angle1) = (r0.y.atan2(r0.x), r1.y.atan2(r1.x));
        if self.bend < 0.0 {
            std::mem::swap(&mut angle0, &mut angle1);
        }
        self.angle0 = angle0.rem_euclid(TAU);
        self.angle1 = angle1.rem_euclid(TAU);
        self.angle_width = (self.angle1 - self.angle0).rem_euclid(TAU);
    }
}

/// Quadratic Bezier through `p0` and `p2`, pulled by the control point `p1`
#[derive(Debug, Clone, PartialEq)]
pub struct Curve {
    p0: DVec2,
    p1: DVec2,
    p2: DVec2,
}

impl Curve {
    pub fn new(p0: DVec2, p1: DVec2, p2: DVec2) -> Self {
        Self { p0, p1, p2 }
    }

    pub fn set(&mut self, p0: DVec2, p1: DVec2, p2: DVec2) {
        self.p0 = p0;
        self.p1 = p1;
        self.p2 = p2;
    }

    pub fn p0(&self) -> DVec2 {
        self.p0
    }

    pub fn p1(&self) -> DVec2 {
        self.p1
    }

    pub fn p2(&self) -> DVec2 {
        self.p2
    }

    /// Curve point at parameter `t`
    pub fn point_at(&self, t: f64) -> DVec2 {
        let s = 1.0 - t;
        self.p0 * (s * s) + self.p1 * (2.0 * s * t) + self.p2 * (t * t)
    }

    /// Half the derivative at `t`
    fn tangent_at(&self, t: f64) -> DVec2 {
        (self.p0 - 2.0 * self.p1 + self.p2) * t + (self.p1 - self.p0)
    }

    /// The handle shown for `p1`: the curve point at t = ½
    pub fn mid_point(&self) -> DVec2 {
        self.p1 * 0.5 + (self.p0 + self.p2) * 0.25
    }

    /// Control point that moves the curve's t = ½ point to `q`
    pub fn control_for_mid(&self, q: DVec2) -> DVec2 {
        2.0 * q - 0.5 * (self.p0 + self.p2)
    }

    fn is_straight(&self) -> bool {
        let c2 = self.p0 - 2.0 * self.p1 + self.p2;
        c2.x.abs() < LINE_MODE_EPSILON && c2.y.abs() < LINE_MODE_EPSILON
    }

    pub fn capture(&self, ray: &Ray) -> Capture {
        if self.is_straight() {
            return segment_capture(ray, self.p0, self.p2);
        }
        // B(t) = p0 + c1 t + c2 t², substituted into v × (B(t) - r) = 0
        let v = ray.dir();
        let r = ray.pos();
        let c1 = (self.p1 - self.p0) * 2.0;
        let c2 = self.p0 - 2.0 * self.p1 + self.p2;
        let a = v.perp_dot(c2);
        let b = v.perp_dot(c1);
        let c = v.perp_dot(self.p0 - r);

        let mut roots = [f64::NAN; 2];
        if a.abs() < 1e-12 {
            // ray parallel to the curve's axis: linear in t
            roots[0] = -c / b;
        } else {
            let d = b * b - 4.0 * a * c;
            if d >= 0.0 {
                // avoids cancellation when a is small
                let q = -0.5 * (b + b.signum() * d.sqrt());
                roots = [q / a, c / q];
            }
        }

        let mut best = Capture::MISS;
        for t in roots {
            if !(0.0..=1.0).contains(&t) {
                continue;
            }
            let dt = self.advance_distance(t, ray);
            if dt < best.distance {
                best = Capture { distance: dt, t };
            }
        }
        best
    }

    /// Distance from the ray to the curve point at `t`, if it is ahead of the ray
    fn advance_distance(&self, t: f64, ray: &Ray) -> f64 {
        let n = self.tangent_at(t);
        let v = ray.dir();
        let dir = n.perp_dot(v) < 0.0;
        let delta = self.point_at(t) - ray.pos();
        let side = delta.perp_dot(n) < 0.0;
        // same orientation means the point is behind the ray
        if side == dir {
            return f64::INFINITY;
        }
        let dt = delta.length();
        if dt < EPSILON {
            return f64::INFINITY;
        }
        dt
    }

    pub fn reflect(&self, ray: &mut Ray, t: f64) {
        let tangent = self.tangent_at(t);
        let normal = DVec2::new(tangent.y, -tangent.x).normalize_or_zero();
        if normal == DVec2::ZERO {
            // cusp: no defined tangent, send the ray back
            let back = ray.dir();
            ray.reflect(back);
        } else {
            ray.reflect(normal);
        }
    }

    pub fn distance(&self, p: DVec2) -> f64 {
        sd_bezier(p, self.p0, self.p1, self.p2)
    }

    pub fn sample_path(&self, n: usize) -> Vec<DVec2> {
        (0..n)
            .map(|i| self.point_at(i as f64 / (n - 1).max(1) as f64))
            .collect()
    }
}

/// Anything a ray can hit
#[derive(Debug, Clone, PartialEq)]
pub enum Obstacle {
    /// The unit circle; ends a trace
    Outline,
    Line(Line),
    Arc(Arc),
    Curve(Curve),
}

impl Obstacle {
    pub fn capture(&self, ray: &Ray) -> Capture {
        match self {
            Obstacle::Outline => {
                // the ray is inside the disk, so exactly one forward exit exists
                let ev = ray.cross();
                let sq = (1.0 - ev * ev).max(0.0);
                Capture::at((sq.sqrt() - ray.dot()).max(f64::EPSILON))
            }
            Obstacle::Line(line) => line.capture(ray),
            Obstacle::Arc(arc) => arc.capture(ray),
            Obstacle::Curve(curve) => curve.capture(ray),
        }
    }

    /// Bounce `ray`, already moved onto the point found by `capture`
    pub fn reflect(&self, ray: &mut Ray, capture: &Capture) {
        match self {
            Obstacle::Outline => {}
            Obstacle::Line(line) => line.reflect(ray),
            Obstacle::Arc(arc) => arc.reflect(ray),
            Obstacle::Curve(curve) => curve.reflect(ray, capture.t),
        }
    }

    pub fn is_boundary(&self) -> bool {
        matches!(self, Obstacle::Outline)
    }

    /// Distance from `p` to the shape, for picking
    pub fn distance(&self, p: DVec2) -> f64 {
        match self {
            Obstacle::Outline => f64::INFINITY,
            Obstacle::Line(line) => line.distance(p),
            Obstacle::Arc(arc) => arc.distance(p),
            Obstacle::Curve(curve) => curve.distance(p),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Obstacle::Outline => "outline",
            Obstacle::Line(_) => "line",
            Obstacle::Arc(_) => "arc",
            Obstacle::Curve(_) => "curve",
        }
    }

    /// `n` points along the shape for drawing; empty for the outline
    pub fn sample_path(&self, n: usize) -> Vec<DVec2> {
        match self {
            Obstacle::Outline => Vec::new(),
            Obstacle::Line(line) => lerp_points(line.p0, line.p1, n),
            Obstacle::Arc(arc) => arc.sample_path(n),
            Obstacle::Curve(curve) => curve.sample_path(n),
        }
    }

    pub fn handles(&self) -> Vec<(HandleKind, DVec2)> {
        match self {
            Obstacle::Outline => Vec::new(),
            Obstacle::Line(line) => vec![(HandleKind::Start, line.p0), (HandleKind::End, line.p1)],
            Obstacle::Arc(arc) => vec![
                (HandleKind::Start, arc.p0),
                (HandleKind::End, arc.p1),
                (HandleKind::Bend, arc.bend_point),
            ],
            Obstacle::Curve(curve) => vec![
                (HandleKind::Start, curve.p0),
                (HandleKind::Control, curve.mid_point()),
                (HandleKind::End, curve.p2),
            ],
        }
    }

    /// Drag one handle to `p`; returns false if the shape has no such handle
    pub fn move_handle(&mut self, kind: HandleKind, p: DVec2) -> bool {
        match (self, kind) {
            (Obstacle::Line(line), HandleKind::Start) => line.set(p, line.p1),
            (Obstacle::Line(line), HandleKind::End) => line.set(line.p0, p),
            (Obstacle::Arc(arc), HandleKind::Start) => arc.set(p, arc.p1, arc.bend),
            (Obstacle::Arc(arc), HandleKind::End) => arc.set(arc.p0, p, arc.bend),
            (Obstacle::Arc(arc), HandleKind::Bend) => {
                let bend = arc.bend_toward(p);
                arc.set(arc.p0, arc.p1, bend);
            }
            (Obstacle::Curve(curve), HandleKind::Start) => curve.set(p, curve.p1, curve.p2),
            (Obstacle::Curve(curve), HandleKind::End) => curve.set(curve.p0, curve.p1, p),
            (Obstacle::Curve(curve), HandleKind::Control) => {
                let p1 = curve.control_for_mid(p);
                curve.set(curve.p0, p1, curve.p2);
            }
            _ => return false,
        }
        true
    }

    /// Serialized record; `None` for the outline
    pub fn to_format(&self) -> Option<ObstacleFormat> {
        match self {
            Obstacle::Outline => None,
            Obstacle::Line(line) => Some(ObstacleFormat::Line {
                x0: line.p0.x,
                y0: line.p0.y,
                x1: line.p1.x,
                y1: line.p1.y,
            }),
            Obstacle::Arc(arc) => Some(ObstacleFormat::Arc {
                x0: arc.p0.x,
                y0: arc.p0.y,
                x1: arc.p1.x,
                y1: arc.p1.y,
                bend: arc.bend,
            }),
            Obstacle::Curve(curve) => Some(ObstacleFormat::Curve {
                x0: curve.p0.x,
                y0: curve.p0.y,
                x1: curve.p1.x,
                y1: curve.p1.y,
                x2: curve.p2.x,
                y2: curve.p2.y,
            }),
        }
    }
}

impl From<&ObstacleFormat> for Obstacle {
    fn from(format: &ObstacleFormat) -> Self {
        match *format {
            ObstacleFormat::Line { x0, y0, x1, y1 } => {
                Obstacle::Line(Line::new(DVec2::new(x0, y0), DVec2::new(x1, y1)))
            }
            ObstacleFormat::Arc { x0, y0, x1, y1, bend } => {
                Obstacle::Arc(Arc::new(DVec2::new(x0, y0), DVec2::new(x1, y1), bend))
            }
            ObstacleFormat::Curve { x0, y0, x1, y1, x2, y2 } => Obstacle::Curve(Curve::new(
                DVec2::new(x0, y0),
                DVec2::new(x1, y1),
                DVec2::new(x2, y2),
            )),
        }
    }
}

impl From<Line> for Obstacle {
    fn from(line: Line) -> Self {
        Obstacle::Line(line)
    }
}

impl From<Arc> for Obstacle {
    fn from(arc: Arc) -> Self {
        Obstacle::Arc(arc)
    }
}

impl From<Curve> for Obstacle {
    fn from(curve: Curve) -> Self {
        Obstacle::Curve(curve)
    }
}
