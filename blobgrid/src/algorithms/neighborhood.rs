//! 3×3 occupancy around a point and the automatic quadrant classification.

use crate::model::{GridPoint, PointSet, Quadrant, QuadrantState};

/// Neighbour slots, clockwise from north.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    N = 0,
    Ne = 1,
    E = 2,
    Se = 3,
    S = 4,
    Sw = 5,
    W = 6,
    Nw = 7,
}

impl Direction {
    pub const ALL: [Direction; 8] = [
        Direction::N,
        Direction::Ne,
        Direction::E,
        Direction::Se,
        Direction::S,
        Direction::Sw,
        Direction::W,
        Direction::Nw,
    ];

    pub fn delta(self) -> (i32, i32) {
        match self {
            Direction::N => (0, -1),
            Direction::Ne => (1, -1),
            Direction::E => (1, 0),
            Direction::Se => (1, 1),
            Direction::S => (0, 1),
            Direction::Sw => (-1, 1),
            Direction::W => (-1, 0),
            Direction::Nw => (-1, -1),
        }
    }

    pub fn from_delta(dx: i32, dy: i32) -> Option<Direction> {
        Direction::ALL.into_iter().find(|d| d.delta() == (dx, dy))
    }
}

/// The two orthogonal neighbours and the diagonal neighbour that touch a quadrant.
pub fn quadrant_neighbors(q: Quadrant) -> (Direction, Direction, Direction) {
    let (sx, sy) = q.signs();
    let lookup = |dx, dy| Direction::from_delta(dx, dy).unwrap_or(Direction::N);
    (lookup(sx, 0), lookup(0, sy), lookup(sx, sy))
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Neighborhood {
    pub center: GridPoint,
    pub occupied: [bool; 8],
    /// Per direction: the neighbour there renders a concave bridge whose
    /// corner touches `center`.
    pub bridges: [bool; 8],
}

impl Neighborhood {
    #[inline]
    pub fn is_occupied(&self, d: Direction) -> bool {
        self.occupied[d as usize]
    }

    #[inline]
    pub fn has_bridge(&self, d: Direction) -> bool {
        self.bridges[d as usize]
    }
}

fn has(points: &PointSet, p: GridPoint, d: Direction) -> bool {
    let (dx, dy) = d.delta();
    points.contains(p.offset(dx, dy))
}

// Auto rule for a single quadrant of `p`: only the diagonal occupied.
fn auto_concave(points: &PointSet, p: GridPoint, q: Quadrant) -> bool {
    let (h, v, d) = quadrant_neighbors(q);
    !has(points, p, h) && !has(points, p, v) && has(points, p, d)
}

/// Occupancy and bridge look-ahead for `p` against one group's points.
pub fn analyze(p: GridPoint, points: &PointSet) -> Neighborhood {
    let mut occupied = [false; 8];
    for d in Direction::ALL {
        occupied[d as usize] = has(points, p, d);
    }

    let mut bridges = [false; 8];
    for d in Direction::ALL {
        if !occupied[d as usize] {
            continue;
        }
        let (dx, dy) = d.delta();
        let n = p.offset(dx, dy);
        // Neighbour quadrants whose corner (in subgrid offsets from the
        // center of `p`) is also a corner of `p`.
        bridges[d as usize] = Quadrant::ALL.into_iter().any(|q| {
            let (sx, sy) = q.signs();
            let shared = (2 * dx + sx).abs() == 1 && (2 * dy + sy).abs() == 1;
            shared && auto_concave(points, n, q)
        });
    }

    Neighborhood {
        center: p,
        occupied,
        bridges,
    }
}

/// Automatic quadrant states, indexed by [`Quadrant::index`].
pub fn classify(n: &Neighborhood) -> [QuadrantState; 4] {
    let mut out = [QuadrantState::Empty; 4];
    for q in Quadrant::ALL {
        let (h, v, d) = quadrant_neighbors(q);
        out[q.index()] = if n.is_occupied(h) || n.is_occupied(v) {
            QuadrantState::Full
        } else if n.has_bridge(d) {
            QuadrantState::concave(q)
        } else {
            QuadrantState::convex(q)
        };
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(pts: &[(i32, i32)]) -> PointSet {
        pts.iter().map(|&(x, y)| GridPoint::new(x, y)).collect()
    }

    #[test]
    fn isolated_point_is_all_convex() {
        let pts = set(&[(0, 0)]);
        let states = classify(&analyze(GridPoint::new(0, 0), &pts));
        for q in Quadrant::ALL {
            assert_eq!(states[q.index()], QuadrantState::convex(q));
        }
    }

    #[test]
    fn orthogonal_neighbor_fills_two_quadrants() {
        let pts = set(&[(0, 0), (1, 0)]);
        let states = classify(&analyze(GridPoint::new(0, 0), &pts));
        assert_eq!(states[Quadrant::Se.index()], QuadrantState::Full);
        assert_eq!(states[Quadrant::Ne.index()], QuadrantState::Full);
        assert_eq!(states[Quadrant::Sw.index()], QuadrantState::ConvexSw);
        assert_eq!(states[Quadrant::Nw.index()], QuadrantState::ConvexNw);
    }

    #[test]
    fn lone_diagonal_becomes_concave_on_both_sides() {
        let pts = set(&[(0, 0), (1, 1)]);
        let a = analyze(GridPoint::new(0, 0), &pts);
        assert!(a.has_bridge(Direction::Se));
        assert_eq!(classify(&a)[Quadrant::Se.index()], QuadrantState::ConcaveSe);
        let b = classify(&analyze(GridPoint::new(1, 1), &pts));
        assert_eq!(b[Quadrant::Nw.index()], QuadrantState::ConcaveNw);
    }

    #[test]
    fn diagonal_with_shared_orthogonal_is_full() {
        let pts = set(&[(0, 0), (1, 1), (1, 0)]);
        let a = classify(&analyze(GridPoint::new(0, 0), &pts));
        assert_eq!(a[Quadrant::Se.index()], QuadrantState::Full);
        assert!(!analyze(GridPoint::new(0, 0), &pts).has_bridge(Direction::Se));
    }
}
