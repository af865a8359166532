//! Cubic Bézier utilities for arc construction, sampling and length.
//!
//! Corner and bridge arcs are quarter-circle approximations: the control
//! points sit on the tangents at `k * r` from each endpoint.

use crate::model::Vec2;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CubicBezier {
    pub p0: Vec2,
    pub p1: Vec2,
    pub p2: Vec2,
    pub p3: Vec2,
}

impl CubicBezier {
    pub fn new(p0: Vec2, p1: Vec2, p2: Vec2, p3: Vec2) -> Self {
        CubicBezier { p0, p1, p2, p3 }
    }

    /// Quarter arc from `start` (leaving along `t0`) to `end` (arriving along
    /// `t1`) with radius `r` and control ratio `k`.
    pub fn quarter_arc(start: Vec2, t0: Vec2, end: Vec2, t1: Vec2, r: f32, k: f32) -> Self {
        Self::new(start, start + t0 * (k * r), end - t1 * (k * r), end)
    }

    /// Point at `t` in [0, 1].
    pub fn eval(&self, t: f32) -> Vec2 {
        self.split_at(t).0.p3
    }

    /// First derivative at `t`, from the quadratic hodograph.
    pub fn tangent(&self, t: f32) -> Vec2 {
        let d0 = (self.p1 - self.p0) * 3.0;
        let d1 = (self.p2 - self.p1) * 3.0;
        let d2 = (self.p3 - self.p2) * 3.0;
        let a = d0.lerp(d1, t);
        let b = d1.lerp(d2, t);
        a.lerp(b, t)
    }

    /// De Casteljau subdivision at `t`.
    pub fn split_at(&self, t: f32) -> (CubicBezier, CubicBezier) {
        let a = self.p0.lerp(self.p1, t);
        let b = self.p1.lerp(self.p2, t);
        let c = self.p2.lerp(self.p3, t);
        let ab = a.lerp(b, t);
        let bc = b.lerp(c, t);
        let mid = ab.lerp(bc, t);
        (
            CubicBezier::new(self.p0, a, ab, mid),
            CubicBezier::new(mid, bc, c, self.p3),
        )
    }

    pub fn reversed(&self) -> CubicBezier {
        CubicBezier::new(self.p3, self.p2, self.p1, self.p0)
    }

    /// Uniform scale of every control point about `origin`.
    pub fn scaled_about(&self, origin: Vec2, factor: f32) -> CubicBezier {
        let s = |p: Vec2| origin + (p - origin) * factor;
        CubicBezier::new(s(self.p0), s(self.p1), s(self.p2), s(self.p3))
    }

    fn hull_length(&self) -> f32 {
        self.p0.distance(self.p1) + self.p1.distance(self.p2) + self.p2.distance(self.p3)
    }

    /// Length by halving until the control hull and chord agree within `tol`.
    pub fn arc_length(&self, tol: f32) -> f32 {
        self.length_within(tol, 0)
    }

    fn length_within(&self, tol: f32, depth: u32) -> f32 {
        const MAX_SPLITS: u32 = 16;
        let chord = self.p0.distance(self.p3);
        let hull = self.hull_length();
        if depth >= MAX_SPLITS || hull - chord < tol {
            return 0.5 * (chord + hull);
        }
        let (a, b) = self.split_at(0.5);
        a.length_within(tol, depth + 1) + b.length_within(tol, depth + 1)
    }
}
