//! Chains surviving boundary edges into loops.

use crate::algorithms::cancel::Boundary;
use crate::geometry::edge::Edge;
use crate::trace::Defect;
use tracing::warn;

#[derive(Clone, Debug, Default)]
pub struct Stitched {
    pub loops: Vec<Vec<Edge>>,
    /// Walks that could not be closed. Empty for a balanced boundary.
    pub open: Vec<Vec<Edge>>,
    pub defects: Vec<Defect>,
}

// Signed turn from `incoming` to `outgoing`; positive turns right on screen.
fn turn(incoming: &Edge, outgoing: &Edge) -> f32 {
    let a = incoming.end_tangent();
    let b = outgoing.start_tangent();
    a.cross(b).atan2(a.dot(b))
}

pub fn stitch(boundary: &Boundary) -> Stitched {
    let edges = &boundary.edges;
    let mut outgoing: Vec<Vec<usize>> = vec![Vec::new(); boundary.vertices.len()];
    for (i, w) in edges.iter().enumerate() {
        outgoing[w.from].push(i);
    }

    let mut visited = vec![false; edges.len()];
    let mut out = Stitched::default();
    for start in 0..edges.len() {
        if visited[start] {
            continue;
        }
        let origin = edges[start].from;
        let mut walk = Vec::new();
        let mut cur = start;
        let closed = loop {
            visited[cur] = true;
            walk.push(edges[cur].edge);
            let v = edges[cur].to;
            if v == origin {
                break true;
            }
            // Sharpest right turn keeps loops that share a pinch vertex apart.
            let mut best: Option<(usize, f32)> = None;
            for &cand in &outgoing[v] {
                if visited[cand] {
                    continue;
                }
                let t = turn(&edges[cur].edge, &edges[cand].edge);
                if best.map_or(true, |(_, bt)| t > bt) {
                    best = Some((cand, t));
                }
            }
            match best {
                Some((next, _)) => cur = next,
                None => break false,
            }
        };

        if closed {
            out.loops.push(walk);
        } else {
            let at = boundary.vertices[edges[cur].to];
            debug_assert!(false, "open boundary walk at {:?}", at);
            warn!(x = at.x, y = at.y, edges = walk.len(), "boundary walk did not close");
            out.defects.push(Defect::OpenWalk { at, edges: walk.len() });
            out.open.push(walk);
        }
    }
    out
}
