//! Unsigned distance helpers for editor hit-testing
//!
//! Not used on the audio path. Formulas follow the usual 2D distance
//! functions (segment, quadratic Bezier) plus a circular-arc variant that
//! matches how arcs are parameterized here.

use glam::DVec2;
use std::f64::consts::TAU;

/// Distance from `p` to the segment `a`-`b`
pub fn sd_segment(p: DVec2, a: DVec2, b: DVec2) -> f64 {
    let pa = p - a;
    let ba = b - a;
    let len_sq = ba.length_squared();
    if len_sq < 1e-24 {
        return pa.length();
    }
    let h = (pa.dot(ba) / len_sq).clamp(0.0, 1.0);
    (pa - ba * h).length()
}

/// Distance from `p` to the quadratic Bezier `a`, `b` (control), `c`
///
/// Solves the cubic for the closest curve parameter in closed form.
pub fn sd_bezier(p: DVec2, a: DVec2, b: DVec2, c: DVec2) -> f64 {
    let ea = b - a;
    let eb = a - 2.0 * b + c;
    if eb.length_squared() < 1e-18 {
        return sd_segment(p, a, c);
    }
    let ec = ea * 2.0;
    let d = a - p;

    let kk = 1.0 / eb.dot(eb);
    let kx = kk * ea.dot(eb);
    let ky = kk * (2.0 * ea.dot(ea) + d.dot(eb)) / 3.0;
    let kz = kk * d.dot(ea);

    let pp = ky - kx * kx;
    let p3 = pp * pp * pp;
    let q = kx * (2.0 * kx * kx - 3.0 * ky) + kz;
    let h = q * q + 4.0 * p3;

    let at = |t: f64| (d + (ec + eb * t) * t).length_squared();

    let res = if h >= 0.0 {
        // one real root
        let h = h.sqrt();
        let x0 = (h - q) * 0.5;
        let x1 = (-h - q) * 0.5;
        let t = (x0.cbrt() + x1.cbrt() - kx).clamp(0.0, 1.0);
        at(t)
    } else {
        // three real roots, the third is never the closest
        let z = (-pp).sqrt();
        let v = (q / (pp * z * 2.0)).clamp(-1.0, 1.0).acos() / 3.0;
        let m = v.cos();
        let n = v.sin() * 3f64.sqrt();
        let t0 = ((m + m) * z - kx).clamp(0.0, 1.0);
        let t1 = ((-n - m) * z - kx).clamp(0.0, 1.0);
        at(t0).min(at(t1))
    };
    res.sqrt()
}

/// Distance from `p` to a circular arc
///
/// The arc runs counter-clockwise (in atan2 terms) from `angle0` across
/// `width` radians around `center`; `a` and `b` are its endpoints.
pub fn sd_arc(p: DVec2, center: DVec2, radius: f64, angle0: f64, width: f64, a: DVec2, b: DVec2) -> f64 {
    let mut min = p.distance(a).min(p.distance(b));
    let rel = p - center;
    let angle = (rel.y.atan2(rel.x) - angle0).rem_euclid(TAU);
    if angle < width {
        min = min.min((rel.length() - radius).abs());
    }
    min
}
