//! Border growth over every loop of a layer at once.
//!
//! Loops are handed to cavalier_contours as the complement of the material:
//! a frame rectangle with every loop reversed inside it. Shrinking that region
//! by the border grows the material and merges loops that come within
//! `2 * border` of each other. The frame is dropped afterwards and the
//! remaining loops are reversed back to material orientation.

use std::f64::consts::FRAC_PI_2;

use cavalier_contours::polyline::{PlineSource, PlineSourceMut, PlineVertex, Polyline};
use cavalier_contours::shape_algorithms::{Shape, ShapeOffsetOptions};

use crate::geometry::edge::Edge;
use crate::geometry::path::{BlobPath, BoundingBox, PathKind};
use crate::geometry::tolerance::KAPPA;
use crate::model::Vec2;

const REPEAT_POS: f64 = 1e-5;
const LINE_BULGE: f64 = 1e-9;

// (start, end, bulge) in material orientation.
type Seg = (Vec2, Vec2, f64);

/// Grow `loops` (pixel space, material on the left in y-up terms) by
/// `border` and union the results. `concave_scale` tightens the controls of
/// arcs that bend away from the material. Returns `None` when every loop
/// vanished.
pub fn grow(loops: &[Vec<Edge>], border: f32, concave_scale: f32) -> Option<Vec<BlobPath>> {
    let bbox = loops
        .iter()
        .flatten()
        .flat_map(|e| {
            let mut pts = vec![e.start, e.end];
            if let Some(c) = e.controls {
                pts.extend([c.c1, c.c2]);
            }
            pts
        })
        .fold(None, |acc: Option<BoundingBox>, p| {
            Some(acc.map_or(BoundingBox::from_point(p), |b| b.include(p)))
        })?;
    let b = f64::from(border);
    let pad = 4.0 * b + 1.0;

    let mut plines = vec![frame(&bbox, pad)];
    plines.extend(loops.iter().filter_map(|l| to_pline(l)));
    let shape = Shape::from_plines(plines);
    let grown = shape.parallel_offset(b, ShapeOffsetOptions::default());

    let frame_x = f64::from(bbox.min_x) - pad / 2.0;
    let paths: Vec<BlobPath> = grown
        .ccw_plines
        .iter()
        .chain(grown.cw_plines.iter())
        .map(|ip| &ip.polyline)
        .filter(|pl| pl.vertex_count() > 1 && !(0..pl.vertex_count()).any(|i| pl.at(i).x < frame_x))
        .map(|pl| emit_reversed(pl, concave_scale))
        .collect();
    (!paths.is_empty()).then_some(paths)
}

fn frame(bbox: &BoundingBox, pad: f64) -> Polyline<f64> {
    let (x0, y0) = (f64::from(bbox.min_x) - pad, f64::from(bbox.min_y) - pad);
    let (x1, y1) = (f64::from(bbox.max_x) + pad, f64::from(bbox.max_y) + pad);
    let mut pl = Polyline::new();
    for (x, y) in [(x0, y0), (x1, y0), (x1, y1), (x0, y1)] {
        pl.add_vertex(PlineVertex::new(x, y, 0.0));
    }
    pl.set_is_closed(true);
    pl
}

/// Signed bulge of an edge: `tan(sweep / 4)`, positive counter-clockwise.
pub fn bulge(e: &Edge) -> f64 {
    let Some(center) = e.center() else {
        return 0.0;
    };
    let a = e.start - center;
    let b = e.end - center;
    let sweep = f64::from(a.cross(b)).atan2(f64::from(a.dot(b)));
    (sweep / 4.0).tan()
}

// Reversed loop: material outlines become islands of the complement.
fn to_pline(edges: &[Edge]) -> Option<Polyline<f64>> {
    let mut pl: Polyline<f64> = Polyline::new();
    for e in edges.iter().rev() {
        let (x, y) = (f64::from(e.end.x), f64::from(e.end.y));
        let repeat = pl.vertex_count().checked_sub(1).map(|i| pl.at(i)).map_or(false, |v| {
            (v.x - x).abs() < REPEAT_POS && (v.y - y).abs() < REPEAT_POS
        });
        if !repeat {
            pl.add_vertex(PlineVertex::new(x, y, -bulge(e)));
        }
    }
    pl.set_is_closed(true);
    (pl.vertex_count() > 2).then_some(pl)
}

fn emit_reversed(pl: &Polyline<f64>, concave_scale: f32) -> BlobPath {
    let n = pl.vertex_count();
    let point = |i: usize| {
        let v = pl.at(i % n);
        Vec2::new(v.x as f32, v.y as f32)
    };
    let segs: Vec<Seg> = (0..n)
        .rev()
        .map(|i| (point(i + 1), point(i), -pl.at(i).bulge))
        .collect();

    let mut path = BlobPath::new(PathKind::Outline);
    let Some(first) = segs.first() else {
        return path;
    };
    path.move_to(first.0);
    let last = segs.len() - 1;
    for (i, &(from, to, b)) in segs.iter().enumerate() {
        if b.abs() > LINE_BULGE {
            let k = if b < 0.0 { KAPPA * concave_scale } else { KAPPA };
            arc_to(&mut path, from, to, b, k);
        } else if i != last {
            path.line_to(to);
        }
    }
    path.close();
    path
}

/// Append the arc from `from` to `to` with bulge `b` as cubics of at most a
/// quarter turn each. `k` is the control ratio of a full quarter.
pub fn arc_to(path: &mut BlobPath, from: Vec2, to: Vec2, b: f64, k: f32) {
    let (p0, p1) = ((f64::from(from.x), f64::from(from.y)), (f64::from(to.x), f64::from(to.y)));
    let (dx, dy) = (p1.0 - p0.0, p1.1 - p0.1);
    let len = dx.hypot(dy);
    if len <= f64::EPSILON {
        return;
    }
    let d = (len / 2.0) * (1.0 - b * b) / (2.0 * b);
    let center = ((p0.0 + p1.0) / 2.0 - dy / len * d, (p0.1 + p1.1) / 2.0 + dx / len * d);
    let r = (p0.0 - center.0).hypot(p0.1 - center.1);
    let sweep = 4.0 * b.atan();
    let pieces = ((sweep.abs() / FRAC_PI_2 - 1e-6).ceil() as usize).max(1);
    let phi = sweep / pieces as f64;
    let h = r * f64::from(k) * (phi.abs() / 4.0).tan() / (std::f64::consts::PI / 8.0).tan();
    let s = sweep.signum();
    let a0 = (p0.1 - center.1).atan2(p0.0 - center.0);
    let at = |a: f64| (center.0 + r * a.cos(), center.1 + r * a.sin());
    let tangent = |a: f64| (-s * a.sin(), s * a.cos());

    for i in 0..pieces {
        let (a, a1) = (a0 + phi * i as f64, a0 + phi * (i + 1) as f64);
        let start = at(a);
        let end = if i + 1 == pieces { p1 } else { at(a1) };
        let (t0, t1) = (tangent(a), tangent(a1));
        let c1 = Vec2::new((start.0 + t0.0 * h) as f32, (start.1 + t0.1 * h) as f32);
        let c2 = Vec2::new((end.0 - t1.0 * h) as f32, (end.1 - t1.1 * h) as f32);
        path.cubic_to(c1, c2, Vec2::new(end.0 as f32, end.1 as f32));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::math::points_coincide;
    use crate::model::GridPoint;

    fn square(x: f32, y: f32, size: f32) -> Vec<Edge> {
        let p = GridPoint::new(0, 0);
        let c = [
            Vec2::new(x, y),
            Vec2::new(x + size, y),
            Vec2::new(x + size, y + size),
            Vec2::new(x, y + size),
        ];
        (0..4).map(|i| Edge::line(c[i], c[(i + 1) % 4], p, None)).collect()
    }

    fn hole(x: f32, y: f32, size: f32) -> Vec<Edge> {
        let mut h: Vec<Edge> = square(x, y, size).iter().map(Edge::reversed).collect();
        h.reverse();
        h
    }

    #[test]
    fn square_grows_with_round_corners() {
        let out = grow(&[square(0.0, 0.0, 10.0)], 2.0, 1.0).unwrap();
        assert_eq!(out.len(), 1);
        let bb = out[0].bounding_box().unwrap();
        assert!((bb.min_x + 2.0).abs() < 1e-3 && (bb.max_x - 12.0).abs() < 1e-3);
        assert!((bb.min_y + 2.0).abs() < 1e-3 && (bb.max_y - 12.0).abs() < 1e-3);
        assert_eq!(out[0].arc_count(), 4);
        assert!(out[0].signed_area() > 0.0);
    }

    #[test]
    fn nearby_loops_fuse() {
        let out = grow(&[square(0.0, 0.0, 10.0), square(13.0, 0.0, 10.0)], 2.0, 1.0).unwrap();
        assert_eq!(out.len(), 1);
        let far = grow(&[square(0.0, 0.0, 10.0), square(20.0, 0.0, 10.0)], 2.0, 1.0).unwrap();
        assert_eq!(far.len(), 2);
    }

    #[test]
    fn hole_narrower_than_border_closes() {
        let ring = [square(0.0, 0.0, 10.0), hole(4.0, 4.0, 2.0)];
        assert_eq!(grow(&ring, 1.5, 1.0).unwrap().len(), 1);
        let open = grow(&ring, 0.5, 1.0).unwrap();
        assert_eq!(open.len(), 2);
        assert_eq!(open.iter().filter(|p| p.signed_area() < 0.0).count(), 1);
    }

    #[test]
    fn quarter_bulge_lands_on_the_circle() {
        let mut path = BlobPath::new(PathKind::Outline);
        let (from, to) = (Vec2::new(10.0, 0.0), Vec2::new(0.0, 10.0));
        path.move_to(from);
        arc_to(&mut path, from, to, (std::f64::consts::PI / 8.0).tan(), KAPPA);
        assert_eq!(path.arc_count(), 1);
        let mid = path.segments()[0].point_at(0.5);
        assert!((mid.length() - 10.0).abs() < 0.01, "{:?}", mid);
        assert!(points_coincide(path.segments()[0].end(), to, 1e-4));
    }

    #[test]
    fn half_turn_splits_into_quarters() {
        let mut path = BlobPath::new(PathKind::Outline);
        let (from, to) = (Vec2::new(5.0, 0.0), Vec2::new(-5.0, 0.0));
        path.move_to(from);
        arc_to(&mut path, from, to, 1.0, KAPPA);
        assert_eq!(path.arc_count(), 2);
        let top = path.segments()[0].end();
        assert!(points_coincide(top, Vec2::new(0.0, 5.0), 1e-4), "{:?}", top);
    }
}
