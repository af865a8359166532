//! Directed boundary edges in subgrid space.

use crate::geometry::cubic::CubicBezier;
use crate::geometry::math::points_coincide;
use crate::geometry::tolerance::EPS_LEN;
use crate::model::{GridPoint, Quadrant, Vec2};
use serde::{Deserialize, Serialize};

/// Curve vocabulary of the engine: straight segments plus the eight quarter
/// arc orientations.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "quadrant", rename_all = "camelCase")]
pub enum CurveKind {
    Line,
    Convex(Quadrant),
    Concave(Quadrant),
}

impl CurveKind {
    pub fn is_arc(self) -> bool {
        !matches!(self, CurveKind::Line)
    }
}

/// Cubic controls and circle center of an arc edge.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ArcControls {
    pub c1: Vec2,
    pub c2: Vec2,
    pub center: Vec2,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Edge {
    pub start: Vec2,
    pub end: Vec2,
    pub curve: CurveKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub controls: Option<ArcControls>,
    pub source: GridPoint,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quadrant: Option<Quadrant>,
}

impl Edge {
    pub fn line(start: Vec2, end: Vec2, source: GridPoint, quadrant: Option<Quadrant>) -> Edge {
        Edge {
            start,
            end,
            curve: CurveKind::Line,
            controls: None,
            source,
            quadrant,
        }
    }

    pub fn arc(
        curve: CurveKind,
        bezier: CubicBezier,
        center: Vec2,
        source: GridPoint,
        quadrant: Option<Quadrant>,
    ) -> Edge {
        Edge {
            start: bezier.p0,
            end: bezier.p3,
            curve,
            controls: Some(ArcControls {
                c1: bezier.p1,
                c2: bezier.p2,
                center,
            }),
            source,
            quadrant,
        }
    }

    pub fn is_arc(&self) -> bool {
        self.controls.is_some()
    }

    pub fn cubic(&self) -> Option<CubicBezier> {
        self.controls
            .map(|c| CubicBezier::new(self.start, c.c1, c.c2, self.end))
    }

    pub fn center(&self) -> Option<Vec2> {
        self.controls.map(|c| c.center)
    }

    /// Same curve walked the other way. Curve kind and provenance are kept.
    pub fn reversed(&self) -> Edge {
        Edge {
            start: self.end,
            end: self.start,
            controls: self.controls.map(|c| ArcControls {
                c1: c.c2,
                c2: c.c1,
                center: c.center,
            }),
            ..*self
        }
    }

    /// Unit direction leaving `start`.
    pub fn start_tangent(&self) -> Vec2 {
        if let Some(c) = self.controls {
            let t = (c.c1 - self.start).normalized();
            if t.length() > EPS_LEN {
                return t;
            }
        }
        (self.end - self.start).normalized()
    }

    /// Unit direction arriving at `end`.
    pub fn end_tangent(&self) -> Vec2 {
        if let Some(c) = self.controls {
            let t = (self.end - c.c2).normalized();
            if t.length() > EPS_LEN {
                return t;
            }
        }
        (self.end - self.start).normalized()
    }

    pub fn is_degenerate(&self, eps: f32) -> bool {
        !self.is_arc() && points_coincide(self.start, self.end, eps)
    }

    /// Uniform scale about the origin (subgrid to pixel space).
    pub fn scaled(&self, s: f32) -> Edge {
        Edge {
            start: self.start * s,
            end: self.end * s,
            controls: self.controls.map(|c| ArcControls {
                c1: c.c1 * s,
                c2: c.c2 * s,
                center: c.center * s,
            }),
            ..*self
        }
    }

    /// Whether `other` traces the same curve in the opposite direction.
    pub fn cancels(&self, other: &Edge, tol: f32) -> bool {
        if self.curve != other.curve {
            return false;
        }
        if !points_coincide(self.start, other.end, tol) || !points_coincide(self.end, other.start, tol) {
            return false;
        }
        match (self.controls, other.controls) {
            (None, None) => true,
            (Some(a), Some(b)) => points_coincide(a.c1, b.c2, tol) && points_coincide(a.c2, b.c1, tol),
            _ => false,
        }
    }

    /// Whether `other` traces the same curve in the same direction.
    pub fn duplicates(&self, other: &Edge, tol: f32) -> bool {
        self.cancels(&other.reversed(), tol)
    }
}
