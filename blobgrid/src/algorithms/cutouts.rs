//! Circular cutouts as counter-clockwise hole sub-paths in pixel space.

use crate::config::BlobConfig;
use crate::geometry::cubic::CubicBezier;
use crate::geometry::path::{BlobPath, PathKind};
use crate::geometry::tolerance::KAPPA;
use crate::model::{CircularCutout, GridPoint, Layer, PointSet, Vec2};
use serde::{Deserialize, Serialize};

/// Preset anchors sit this far from the cell center on each axis (grid units).
pub const ANCHOR_INSET: f32 = 0.25;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CutoutCircle {
    pub source: GridPoint,
    pub center: Vec2,
    pub radius: f32,
    pub path: BlobPath,
}

/// Cutout center in grid units.
pub fn cutout_center(p: GridPoint, c: &CircularCutout) -> Vec2 {
    let base = Vec2::new(p.x as f32 + 0.5, p.y as f32 + 0.5);
    let anchor = match c.anchor.preset_direction() {
        Some((dx, dy)) => Vec2::new(dx, dy) * ANCHOR_INSET,
        None => c.custom_offset.unwrap_or_default(),
    };
    base + anchor + c.offset.unwrap_or_default()
}

/// Cutout radius in grid units.
pub fn cutout_radius(c: &CircularCutout, mm_per_unit: f32) -> f32 {
    c.diameter_mm / mm_per_unit * 0.5
}

/// Four-arc circle walked counter-clockwise on screen (y down).
pub fn circle_path(center: Vec2, r: f32) -> BlobPath {
    let east = center + Vec2::new(r, 0.0);
    let north = center + Vec2::new(0.0, -r);
    let west = center + Vec2::new(-r, 0.0);
    let south = center + Vec2::new(0.0, r);
    let up = Vec2::new(0.0, -1.0);
    let down = Vec2::new(0.0, 1.0);
    let left = Vec2::new(-1.0, 0.0);
    let right = Vec2::new(1.0, 0.0);
    let arcs = [
        CubicBezier::quarter_arc(east, up, north, left, r, KAPPA),
        CubicBezier::quarter_arc(north, left, west, down, r, KAPPA),
        CubicBezier::quarter_arc(west, down, south, right, r, KAPPA),
        CubicBezier::quarter_arc(south, right, east, up, r, KAPPA),
    ];
    let mut path = BlobPath::new(PathKind::Cutout);
    path.move_to(east);
    for a in arcs {
        path.cubic_to(a.p1, a.p2, a.p3);
    }
    path.close();
    path
}

/// Holes for every point of `points` that carries cutouts.
pub fn generate(layer: &Layer, points: &PointSet, cfg: &BlobConfig) -> Vec<CutoutCircle> {
    let mut out = Vec::new();
    for (&p, m) in &layer.modifications {
        if !points.contains(p) {
            continue;
        }
        // A zero diameter means no hole.
        for c in m.cutouts.iter().filter(|c| c.diameter_mm > 0.0) {
            let center = cutout_center(p, c) * cfg.grid_size;
            let radius = cutout_radius(c, cfg.mm_per_unit) * cfg.grid_size;
            out.push(CutoutCircle {
                source: p,
                center,
                radius,
                path: circle_path(center, radius),
            });
        }
    }
    out
}
