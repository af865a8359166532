//! Edge cancellation: welded endpoints, opposite pairs removed.

use crate::geometry::edge::Edge;
use crate::model::Vec2;
use crate::trace::Defect;
use std::collections::HashMap;
use tracing::debug;

/// Snaps nearby points to one vertex id using a uniform hash grid.
///
/// Buckets are `tol` wide, so every point within `tol` of a query lies in the
/// 3×3 block around the query's bucket.
pub struct Welder {
    tol: f32,
    buckets: HashMap<(i64, i64), Vec<usize>>,
    vertices: Vec<Vec2>,
}

impl Welder {
    pub fn new(tol: f32) -> Self {
        Welder {
            tol: tol.max(1e-6),
            buckets: HashMap::new(),
            vertices: Vec::new(),
        }
    }

    #[inline]
    fn bucket(&self, p: Vec2) -> (i64, i64) {
        ((p.x / self.tol).floor() as i64, (p.y / self.tol).floor() as i64)
    }

    /// Vertex id for `p`; the lowest matching id wins.
    pub fn weld(&mut self, p: Vec2) -> usize {
        let (bx, by) = self.bucket(p);
        let mut best: Option<usize> = None;
        for dy in -1..=1 {
            for dx in -1..=1 {
                if let Some(ids) = self.buckets.get(&(bx + dx, by + dy)) {
                    for &id in ids {
                        if self.vertices[id].distance(p) <= self.tol && best.map_or(true, |b| id < b) {
                            best = Some(id);
                        }
                    }
                }
            }
        }
        if let Some(id) = best {
            return id;
        }
        let id = self.vertices.len();
        self.vertices.push(p);
        self.buckets.entry((bx, by)).or_default().push(id);
        id
    }

    pub fn vertex(&self, id: usize) -> Vec2 {
        self.vertices[id]
    }

    pub fn into_vertices(self) -> Vec<Vec2> {
        self.vertices
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WeldedEdge {
    pub edge: Edge,
    pub from: usize,
    pub to: usize,
}

/// Surviving edges with welded endpoints.
#[derive(Clone, Debug, Default)]
pub struct Boundary {
    pub vertices: Vec<Vec2>,
    pub edges: Vec<WeldedEdge>,
    pub cancelled: usize,
    pub degenerate: usize,
    pub defects: Vec<Defect>,
}

impl Boundary {
    pub fn edges(&self) -> impl Iterator<Item = &Edge> + '_ {
        self.edges.iter().map(|w| &w.edge)
    }

    /// In-degree equals out-degree at every vertex.
    pub fn is_balanced(&self) -> bool {
        let mut degree = vec![0i64; self.vertices.len()];
        for w in &self.edges {
            degree[w.from] += 1;
            degree[w.to] -= 1;
        }
        degree.iter().all(|d| *d == 0)
    }
}

/// Remove every pair of edges that trace the same curve in opposite directions.
pub fn cancel(edges: &[Edge], tol: f32) -> Boundary {
    let mut welder = Welder::new(tol);
    let mut welded = Vec::with_capacity(edges.len());
    let mut degenerate = 0usize;
    for e in edges {
        let from = welder.weld(e.start);
        let to = welder.weld(e.end);
        if from == to && !e.is_arc() {
            degenerate += 1;
            continue;
        }
        welded.push(WeldedEdge { edge: *e, from, to });
    }

    let mut by_ends: HashMap<(usize, usize), Vec<usize>> = HashMap::new();
    for (i, w) in welded.iter().enumerate() {
        by_ends.entry((w.from, w.to)).or_default().push(i);
    }

    let mut alive = vec![true; welded.len()];
    let mut cancelled = 0usize;
    let mut defects = Vec::new();
    for i in 0..welded.len() {
        if !alive[i] {
            continue;
        }
        let w = welded[i];
        let partner = by_ends.get(&(w.to, w.from)).and_then(|cands| {
            cands
                .iter()
                .copied()
                .find(|&j| j != i && alive[j] && w.edge.cancels(&welded[j].edge, tol))
        });
        if let Some(j) = partner {
            alive[i] = false;
            alive[j] = false;
            cancelled += 2;
        }
    }

    for (i, w) in welded.iter().enumerate() {
        if !alive[i] {
            continue;
        }
        if let Some(cands) = by_ends.get(&(w.from, w.to)) {
            let dup = cands
                .iter()
                .copied()
                .any(|j| j < i && alive[j] && w.edge.duplicates(&welded[j].edge, tol));
            if dup {
                defects.push(Defect::DuplicateEdge {
                    from: w.edge.start,
                    to: w.edge.end,
                });
            }
        }
    }

    let survivors: Vec<WeldedEdge> = welded
        .into_iter()
        .zip(alive)
        .filter_map(|(w, keep)| keep.then_some(w))
        .collect();
    debug!(
        total = edges.len(),
        cancelled,
        degenerate,
        boundary = survivors.len(),
        "edges cancelled"
    );
    Boundary {
        vertices: welder.into_vertices(),
        edges: survivors,
        cancelled,
        degenerate,
        defects,
    }
}
