use crate::geometry::cubic::CubicBezier;
use crate::geometry::flatten::flatten_cubic;
use crate::geometry::math::{points_coincide, segments_cross, signed_area};
use crate::model::Vec2;
use crate::svg::fmt_num;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PathKind {
    /// Blob boundary (outer rim or the rim of an enclosed hole).
    Outline,
    /// Circular hole punched by a point modification.
    Cutout,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum PathCommand {
    MoveTo { to: Vec2 },
    LineTo { to: Vec2 },
    CubicTo { c1: Vec2, c2: Vec2, to: Vec2 },
    Close,
}

/// One drawable piece of a path, with both endpoints resolved.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PathSegment {
    Line(Vec2, Vec2),
    Cubic(CubicBezier),
}

impl PathSegment {
    pub fn start(&self) -> Vec2 {
        match self {
            PathSegment::Line(a, _) => *a,
            PathSegment::Cubic(c) => c.p0,
        }
    }

    pub fn end(&self) -> Vec2 {
        match self {
            PathSegment::Line(_, b) => *b,
            PathSegment::Cubic(c) => c.p3,
        }
    }

    pub fn point_at(&self, t: f32) -> Vec2 {
        match self {
            PathSegment::Line(a, b) => a.lerp(*b, t),
            PathSegment::Cubic(c) => c.eval(t),
        }
    }

    pub fn length(&self) -> f32 {
        match self {
            PathSegment::Line(a, b) => a.distance(*b),
            PathSegment::Cubic(c) => c.arc_length(1e-3),
        }
    }
}

/// A finished sub-path in pixel space.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BlobPath {
    pub kind: PathKind,
    pub closed: bool,
    pub commands: Vec<PathCommand>,
}

impl BlobPath {
    pub fn new(kind: PathKind) -> Self {
        BlobPath {
            kind,
            closed: false,
            commands: Vec::new(),
        }
    }

    pub fn move_to(&mut self, to: Vec2) {
        self.commands.push(PathCommand::MoveTo { to });
    }

    pub fn line_to(&mut self, to: Vec2) {
        self.commands.push(PathCommand::LineTo { to });
    }

    pub fn cubic_to(&mut self, c1: Vec2, c2: Vec2, to: Vec2) {
        self.commands.push(PathCommand::CubicTo { c1, c2, to });
    }

    pub fn close(&mut self) {
        self.commands.push(PathCommand::Close);
        self.closed = true;
    }

    /// Segments in drawing order. A closing line is added when the last
    /// point does not already sit on the start.
    pub fn segments(&self) -> Vec<PathSegment> {
        let mut out = Vec::new();
        let mut cur = Vec2::ZERO;
        let mut start = Vec2::ZERO;
        for cmd in &self.commands {
            match *cmd {
                PathCommand::MoveTo { to } => {
                    cur = to;
                    start = to;
                }
                PathCommand::LineTo { to } => {
                    out.push(PathSegment::Line(cur, to));
                    cur = to;
                }
                PathCommand::CubicTo { c1, c2, to } => {
                    out.push(PathSegment::Cubic(CubicBezier::new(cur, c1, c2, to)));
                    cur = to;
                }
                PathCommand::Close => {
                    if !points_coincide(cur, start, 1e-4) {
                        out.push(PathSegment::Line(cur, start));
                    }
                    cur = start;
                }
            }
        }
        out
    }

    /// On-curve points (segment endpoints), start point first.
    pub fn vertices(&self) -> Vec<Vec2> {
        self.commands
            .iter()
            .filter_map(|c| match *c {
                PathCommand::MoveTo { to } | PathCommand::LineTo { to } | PathCommand::CubicTo { to, .. } => Some(to),
                PathCommand::Close => None,
            })
            .collect()
    }

    pub fn distinct_vertex_count(&self, eps: f32) -> usize {
        let mut seen: Vec<Vec2> = Vec::new();
        for v in self.vertices() {
            if !seen.iter().any(|s| points_coincide(*s, v, eps)) {
                seen.push(v);
            }
        }
        seen.len()
    }

    pub fn arc_count(&self) -> usize {
        self.commands
            .iter()
            .filter(|c| matches!(c, PathCommand::CubicTo { .. }))
            .count()
    }

    pub fn line_count(&self) -> usize {
        self.segments()
            .iter()
            .filter(|s| matches!(s, PathSegment::Line(..)))
            .count()
    }

    /// Polyline approximation; the first point is not repeated at the end.
    pub fn flatten(&self, tol: f32) -> Vec<Vec2> {
        let segs = self.segments();
        let mut pts = Vec::with_capacity(segs.len() * 4);
        if let Some(first) = segs.first() {
            pts.push(first.start());
        }
        for s in &segs {
            match s {
                PathSegment::Line(_, b) => pts.push(*b),
                PathSegment::Cubic(c) => flatten_cubic(&mut pts, c.p0, c.p1, c.p2, c.p3, tol, 0),
            }
        }
        if self.closed && pts.len() > 1 {
            if let (Some(a), Some(b)) = (pts.first().copied(), pts.last().copied()) {
                if points_coincide(a, b, 1e-4) {
                    pts.pop();
                }
            }
        }
        pts
    }

    /// `per_segment` evenly spaced parameters on every segment, used for
    /// geometric comparisons that must not depend on traversal order.
    pub fn sample(&self, per_segment: usize) -> Vec<Vec2> {
        let n = per_segment.max(1);
        let mut out = Vec::new();
        for s in self.segments() {
            for i in 0..n {
                out.push(s.point_at(i as f32 / n as f32));
            }
        }
        out
    }

    /// Positive for clockwise loops in y-down screen space.
    pub fn signed_area(&self) -> f32 {
        signed_area(&self.flatten(0.05))
    }

    pub fn length(&self) -> f32 {
        self.segments().iter().map(PathSegment::length).sum()
    }

    /// Any proper crossing between non-adjacent pieces of the flattened path.
    pub fn self_intersects(&self, tol: f32) -> bool {
        let pts = self.flatten(tol);
        let n = pts.len();
        if n < 4 {
            return false;
        }
        for i in 0..n {
            let a = pts[i];
            let b = pts[(i + 1) % n];
            for j in (i + 2)..n {
                if i == 0 && j == n - 1 {
                    continue;
                }
                let c = pts[j];
                let d = pts[(j + 1) % n];
                if segments_cross(a, b, c, d) {
                    return true;
                }
            }
        }
        false
    }

    pub fn scaled(&self, s: f32) -> BlobPath {
        let commands = self
            .commands
            .iter()
            .map(|c| match *c {
                PathCommand::MoveTo { to } => PathCommand::MoveTo { to: to * s },
                PathCommand::LineTo { to } => PathCommand::LineTo { to: to * s },
                PathCommand::CubicTo { c1, c2, to } => PathCommand::CubicTo {
                    c1: c1 * s,
                    c2: c2 * s,
                    to: to * s,
                },
                PathCommand::Close => PathCommand::Close,
            })
            .collect();
        BlobPath { commands, ..*self }
    }

    /// Control-point box. Quarter arcs keep their controls inside the arc's
    /// bounding square, so this is tight for engine output.
    pub fn bounding_box(&self) -> Option<BoundingBox> {
        let grow = |bb: Option<BoundingBox>, p: Vec2| {
            Some(bb.map_or_else(|| BoundingBox::from_point(p), |b| b.include(p)))
        };
        let mut bb: Option<BoundingBox> = None;
        for cmd in &self.commands {
            match *cmd {
                PathCommand::MoveTo { to } | PathCommand::LineTo { to } => bb = grow(bb, to),
                PathCommand::CubicTo { c1, c2, to } => {
                    for p in [c1, c2, to] {
                        bb = grow(bb, p);
                    }
                }
                PathCommand::Close => {}
            }
        }
        bb
    }

    /// SVG path data with every coordinate multiplied by `scale`.
    pub fn to_svg_d(&self, scale: f32) -> String {
        let mut d = String::new();
        for cmd in &self.commands {
            if !d.is_empty() {
                d.push(' ');
            }
            match *cmd {
                PathCommand::MoveTo { to } => {
                    d.push_str(&format!("M {} {}", fmt_num(to.x * scale), fmt_num(to.y * scale)));
                }
                PathCommand::LineTo { to } => {
                    d.push_str(&format!("L {} {}", fmt_num(to.x * scale), fmt_num(to.y * scale)));
                }
                PathCommand::CubicTo { c1, c2, to } => {
                    d.push_str(&format!(
                        "C {} {}, {} {}, {} {}",
                        fmt_num(c1.x * scale),
                        fmt_num(c1.y * scale),
                        fmt_num(c2.x * scale),
                        fmt_num(c2.y * scale),
                        fmt_num(to.x * scale),
                        fmt_num(to.y * scale)
                    ));
                }
                PathCommand::Close => d.push('Z'),
            }
        }
        d
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoundingBox {
    pub min_x: f32,
    pub min_y: f32,
    pub max_x: f32,
    pub max_y: f32,
}

impl BoundingBox {
    pub fn from_point(p: Vec2) -> Self {
        BoundingBox {
            min_x: p.x,
            min_y: p.y,
            max_x: p.x,
            max_y: p.y,
        }
    }

    pub fn include(self, p: Vec2) -> Self {
        BoundingBox {
            min_x: self.min_x.min(p.x),
            min_y: self.min_y.min(p.y),
            max_x: self.max_x.max(p.x),
            max_y: self.max_y.max(p.y),
        }
    }

    pub fn union(self, o: BoundingBox) -> Self {
        BoundingBox {
            min_x: self.min_x.min(o.min_x),
            min_y: self.min_y.min(o.min_y),
            max_x: self.max_x.max(o.max_x),
            max_y: self.max_y.max(o.max_y),
        }
    }

    pub fn width(&self) -> f32 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f32 {
        self.max_y - self.min_y
    }

    pub fn scaled(self, s: f32) -> Self {
        BoundingBox {
            min_x: self.min_x * s,
            min_y: self.min_y * s,
            max_x: self.max_x * s,
            max_y: self.max_y * s,
        }
    }

    pub fn expanded(self, by: f32) -> Self {
        BoundingBox {
            min_x: self.min_x - by,
            min_y: self.min_y - by,
            max_x: self.max_x + by,
            max_y: self.max_y + by,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(size: f32) -> BlobPath {
        let mut p = BlobPath::new(PathKind::Outline);
        p.move_to(Vec2::new(0.0, 0.0));
        p.line_to(Vec2::new(size, 0.0));
        p.line_to(Vec2::new(size, size));
        p.line_to(Vec2::new(0.0, size));
        p.close();
        p
    }

    #[test]
    fn close_adds_the_implicit_segment() {
        let p = square(2.0);
        assert_eq!(p.segments().len(), 4);
        assert_eq!(p.distinct_vertex_count(1e-4), 4);
        assert!((p.length() - 8.0).abs() < 1e-5);
        assert!((p.signed_area() - 4.0).abs() < 1e-4);
    }

    #[test]
    fn bowtie_self_intersects() {
        let mut p = BlobPath::new(PathKind::Outline);
        p.move_to(Vec2::new(0.0, 0.0));
        p.line_to(Vec2::new(2.0, 2.0));
        p.line_to(Vec2::new(2.0, 0.0));
        p.line_to(Vec2::new(0.0, 2.0));
        p.close();
        assert!(p.self_intersects(0.01));
        assert!(!square(2.0).self_intersects(0.01));
    }

    #[test]
    fn svg_data_uses_scale() {
        let d = square(50.0).to_svg_d(1.0 / 50.0);
        assert_eq!(d, "M 0 0 L 1 0 L 1 1 L 0 1 Z");
        let bb = square(3.0).bounding_box().unwrap();
        assert_eq!((bb.width(), bb.height()), (3.0, 3.0));
    }
}
