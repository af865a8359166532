//! Outline finishing: collinear merge, subgrid to pixel mapping and the
//! hand-off to the border.

use crate::geometry::border;
use crate::geometry::edge::Edge;
use crate::geometry::math::points_coincide;
use crate::geometry::path::{BlobPath, PathKind};
use crate::geometry::tolerance::EPS_POS;

/// Fuse consecutive straight edges that continue in the same direction,
/// including across the loop seam.
pub fn merge_collinear(edges: &[Edge]) -> Vec<Edge> {
    let mut out: Vec<Edge> = Vec::with_capacity(edges.len());
    for e in edges {
        if let Some(last) = out.last_mut() {
            if continues(last, e) {
                last.end = e.end;
                continue;
            }
        }
        out.push(*e);
    }
    while out.len() > 2 {
        let (first, last) = (out[0], out[out.len() - 1]);
        if !continues(&last, &first) {
            break;
        }
        out[0].start = last.start;
        out.pop();
    }
    out
}

fn continues(a: &Edge, b: &Edge) -> bool {
    if a.is_arc() || b.is_arc() || !points_coincide(a.end, b.start, EPS_POS) {
        return false;
    }
    let da = (a.end - a.start).normalized();
    let db = (b.end - b.start).normalized();
    da.cross(db).abs() <= 1e-5 && da.dot(db) > 0.0
}

/// Closed loop to path commands. A trailing straight edge is left to `Z`.
pub fn emit_closed(edges: &[Edge], kind: PathKind) -> BlobPath {
    let mut path = BlobPath::new(kind);
    let Some(first) = edges.first() else {
        return path;
    };
    path.move_to(first.start);
    let last = edges.len() - 1;
    for (i, e) in edges.iter().enumerate() {
        match e.controls {
            Some(c) => path.cubic_to(c.c1, c.c2, e.end),
            None if i == last => {}
            None => path.line_to(e.end),
        }
    }
    path.close();
    path
}

/// Unclosed fragment; only produced for boundary defects.
pub fn emit_open(edges: &[Edge], kind: PathKind) -> BlobPath {
    let mut path = BlobPath::new(kind);
    let Some(first) = edges.first() else {
        return path;
    };
    path.move_to(first.start);
    for e in edges {
        match e.controls {
            Some(c) => path.cubic_to(c.c1, c.c2, e.end),
            None => path.line_to(e.end),
        }
    }
    path
}

/// Subgrid loops to finished pixel-space outlines. With a border the loops
/// are grown together and may merge; without one each loop maps to one path.
pub fn finish_loops(loops: &[Vec<Edge>], scale: f32, border: f32, concave_scale: f32) -> Option<Vec<BlobPath>> {
    let scaled: Vec<Vec<Edge>> = loops
        .iter()
        .map(|l| merge_collinear(l).iter().map(|e| e.scaled(scale)).collect())
        .collect();
    if border <= 0.0 {
        return Some(scaled.iter().map(|l| emit_closed(l, PathKind::Outline)).collect());
    }
    border::grow(&scaled, border, concave_scale)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{GridPoint, Vec2};

    fn square_loop(size: f32, split: bool) -> Vec<Edge> {
        let p = GridPoint::new(0, 0);
        let corners = [
            Vec2::new(0.0, 0.0),
            Vec2::new(size, 0.0),
            Vec2::new(size, size),
            Vec2::new(0.0, size),
        ];
        let mut out = Vec::new();
        for i in 0..4 {
            let a = corners[i];
            let b = corners[(i + 1) % 4];
            if split {
                let m = a.lerp(b, 0.5);
                out.push(Edge::line(a, m, p, None));
                out.push(Edge::line(m, b, p, None));
            } else {
                out.push(Edge::line(a, b, p, None));
            }
        }
        out
    }

    #[test]
    fn collinear_runs_merge_across_seam() {
        let mut edges = square_loop(2.0, true);
        edges.rotate_left(1);
        let merged = merge_collinear(&edges);
        assert_eq!(merged.len(), 4);
        assert!(points_coincide(merged[0].start, merged[3].end, 1e-6));
    }

    #[test]
    fn zero_border_keeps_one_path_per_loop() {
        let loops = vec![square_loop(1.0, true), square_loop(1.0, false)];
        let out = finish_loops(&loops, 10.0, 0.0, 1.0).unwrap();
        assert_eq!(out.len(), 2);
        assert!(out.iter().all(|p| p.segments().len() == 4));
        let bb = out[0].bounding_box().unwrap();
        assert!((bb.max_x - 10.0).abs() < 1e-4);
    }

    #[test]
    fn border_is_applied_after_scaling() {
        let out = finish_loops(&[square_loop(1.0, false)], 10.0, 2.0, 1.0).unwrap();
        assert_eq!(out.len(), 1);
        let bb = out[0].bounding_box().unwrap();
        assert!((bb.min_x + 2.0).abs() < 1e-3 && (bb.max_x - 12.0).abs() < 1e-3);
    }

    #[test]
    fn closed_emit_leaves_last_line_to_close() {
        let path = emit_closed(&square_loop(1.0, false), PathKind::Outline);
        assert_eq!(path.commands.len(), 5);
        assert!(path.closed);
        assert_eq!(path.segments().len(), 4);
    }
}
