//! Resolved quadrant states to closed tiles in subgrid space.
//!
//! A tile for quadrant `q` of cell `p` lives in the unit square between the
//! cell center `C` and the cell corner `K = C + (sx, sy)`. Tiles are emitted
//! clockwise on screen (y down) so that neighbouring tiles trace their shared
//! sides in opposite directions.

use crate::algorithms::merge::QuadrantPlan;
use crate::config::BlobConfig;
use crate::geometry::cubic::CubicBezier;
use crate::geometry::edge::{CurveKind, Edge};
use crate::geometry::math::points_coincide;
use crate::geometry::tolerance::{EPS_LEN, EPS_POS, KAPPA};
use crate::model::{GridPoint, Quadrant, QuadrantState, Vec2};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TileParams {
    /// Convex corner radius in subgrid units.
    pub corner: f32,
    /// Concave bridge radius in subgrid units.
    pub bridge: f32,
    pub kappa: f32,
    pub bridge_kappa: f32,
}

impl TileParams {
    pub fn from_config(cfg: &BlobConfig) -> Self {
        TileParams {
            corner: cfg.corner_ratio,
            bridge: cfg.bridge_ratio,
            kappa: KAPPA,
            bridge_kappa: cfg.bridge_kappa(),
        }
    }

    /// Distances from the cell corner at which every cell-boundary side is
    /// split, descending.
    fn breakpoints(&self) -> Vec<f32> {
        let mut bp: Vec<f32> = [self.corner, self.bridge]
            .into_iter()
            .filter(|d| *d > EPS_POS && *d < 1.0 - EPS_POS)
            .collect();
        bp.sort_by(|a, b| b.total_cmp(a));
        bp.dedup_by(|a, b| (*a - *b).abs() <= EPS_POS);
        bp
    }
}

impl Default for TileParams {
    fn default() -> Self {
        TileParams::from_config(&BlobConfig::default())
    }
}

// Corner treatment of a tile
enum Corner {
    Square,
    Arc,
    Cut,
}

struct TileBuilder {
    source: GridPoint,
    quadrant: Quadrant,
    cursor: Vec2,
    edges: Vec<Edge>,
}

impl TileBuilder {
    fn new(source: GridPoint, quadrant: Quadrant, start: Vec2) -> Self {
        TileBuilder {
            source,
            quadrant,
            cursor: start,
            edges: Vec::with_capacity(8),
        }
    }

    fn line_to(&mut self, p: Vec2) {
        if !points_coincide(self.cursor, p, EPS_LEN) {
            self.edges
                .push(Edge::line(self.cursor, p, self.source, Some(self.quadrant)));
        }
        self.cursor = p;
    }

    fn arc(&mut self, curve: CurveKind, bez: CubicBezier, center: Vec2) {
        self.edges
            .push(Edge::arc(curve, bez, center, self.source, Some(self.quadrant)));
        self.cursor = bez.p3;
    }

    /// Canonical cycles are clockwise only when `sx * sy > 0`.
    fn finish(self, flip: bool) -> Vec<Edge> {
        if flip {
            self.edges.iter().rev().map(Edge::reversed).collect()
        } else {
            self.edges
        }
    }
}

fn corner_of(p: GridPoint, q: Quadrant) -> (Vec2, f32, f32) {
    let (sx, sy) = q.signs();
    let (sx, sy) = (sx as f32, sy as f32);
    (p.center_subgrid() + Vec2::new(sx, sy), sx, sy)
}

fn tile(p: GridPoint, q: Quadrant, corner: Corner, params: &TileParams) -> Vec<Edge> {
    let (k, sx, sy) = corner_of(p, q);
    let c = p.center_subgrid();
    let a = c + Vec2::new(sx, 0.0);
    let b = c + Vec2::new(0.0, sy);
    let keep = match corner {
        Corner::Square => 0.0,
        Corner::Arc => params.corner,
        Corner::Cut => params.bridge,
    };
    let bp = params.breakpoints();

    let mut t = TileBuilder::new(p, q, c);
    t.line_to(a);
    // Side A..K on the vertical cell boundary.
    for &d in bp.iter().filter(|d| **d > keep + EPS_POS) {
        t.line_to(k - Vec2::new(0.0, sy * d));
    }
    let sv = k - Vec2::new(0.0, sy * keep);
    let sh = k - Vec2::new(sx * keep, 0.0);
    t.line_to(sv);
    match corner {
        Corner::Square => {}
        Corner::Arc => {
            let bez = CubicBezier::quarter_arc(
                sv,
                Vec2::new(0.0, sy),
                sh,
                Vec2::new(-sx, 0.0),
                params.corner,
                params.kappa,
            );
            let center = k - Vec2::new(sx * params.corner, sy * params.corner);
            t.arc(CurveKind::Convex(q), bez, center);
        }
        Corner::Cut => t.line_to(sh),
    }
    // Side K..B on the horizontal cell boundary.
    for &d in bp.iter().rev().filter(|d| **d > keep + EPS_POS) {
        t.line_to(k - Vec2::new(sx * d, 0.0));
    }
    t.line_to(b);
    t.line_to(c);
    t.finish(sx * sy < 0.0)
}

pub fn full_tile(p: GridPoint, q: Quadrant, params: &TileParams) -> Vec<Edge> {
    tile(p, q, Corner::Square, params)
}

pub fn convex_tile(p: GridPoint, q: Quadrant, params: &TileParams) -> Vec<Edge> {
    tile(p, q, Corner::Arc, params)
}

/// Quadrant square with its corner cut on the diagonal; the bridge tile
/// fills the cut.
pub fn concave_tile(p: GridPoint, q: Quadrant, params: &TileParams) -> Vec<Edge> {
    tile(p, q, Corner::Cut, params)
}

/// Diamond around the corner shared by `upper` (quadrant `q`, pointing south)
/// and its diagonal partner, bounded by two concave arcs.
pub fn bridge_tile(upper: GridPoint, q: Quadrant, params: &TileParams) -> Vec<Edge> {
    let (k, sx, sy) = corner_of(upper, q);
    let r = params.bridge;
    let kb = params.bridge_kappa;
    let top = k + Vec2::new(0.0, -sy * r);
    let right = k + Vec2::new(sx * r, 0.0);
    let bottom = k + Vec2::new(0.0, sy * r);
    let left = k + Vec2::new(-sx * r, 0.0);

    let mut t = TileBuilder::new(upper, q, top);
    let arc1 = CubicBezier::quarter_arc(top, Vec2::new(0.0, sy), right, Vec2::new(sx, 0.0), r, kb);
    t.arc(CurveKind::Concave(q), arc1, k + Vec2::new(sx * r, -sy * r));
    t.line_to(bottom);
    let arc2 = CubicBezier::quarter_arc(bottom, Vec2::new(0.0, -sy), left, Vec2::new(-sx, 0.0), r, kb);
    t.arc(CurveKind::Concave(q.opposite()), arc2, k + Vec2::new(-sx * r, sy * r));
    t.line_to(top);
    t.finish(sx * sy < 0.0)
}

/// Edge multiset for a settled plan.
pub fn generate(plan: &QuadrantPlan, params: &TileParams) -> Vec<Edge> {
    let mut out = Vec::with_capacity(plan.len() * 16);
    for (p, states) in plan.iter() {
        for q in Quadrant::ALL {
            match states[q.index()] {
                QuadrantState::Empty => {}
                QuadrantState::Full => out.extend(full_tile(p, q, params)),
                QuadrantState::ConvexSe
                | QuadrantState::ConvexSw
                | QuadrantState::ConvexNw
                | QuadrantState::ConvexNe => out.extend(convex_tile(p, q, params)),
                QuadrantState::ConcaveSe
                | QuadrantState::ConcaveSw
                | QuadrantState::ConcaveNw
                | QuadrantState::ConcaveNe => {
                    out.extend(concave_tile(p, q, params));
                    // The pair's upper cell owns the bridge.
                    if q.signs().1 > 0 {
                        out.extend(bridge_tile(p, q, params));
                    }
                }
            }
        }
    }
    out
}
