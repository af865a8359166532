//! Per-group classification merged into one layer plan.

use crate::algorithms::neighborhood::{analyze, classify};
use crate::algorithms::overrides::{overridden_count, resolve};
use crate::model::{GridPoint, Layer, Quadrant, QuadrantShape, QuadrantState};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::debug;

/// Quadrant counts for one interaction group, before merging.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupStats {
    pub id: String,
    pub points: usize,
    pub full: usize,
    pub empty: usize,
    pub convex: usize,
    pub concave: usize,
    pub overridden: usize,
}

impl GroupStats {
    fn count(&mut self, s: QuadrantState) {
        match s.shape() {
            QuadrantShape::Full => self.full += 1,
            QuadrantShape::Empty => self.empty += 1,
            QuadrantShape::Convex => self.convex += 1,
            QuadrantShape::Concave => self.concave += 1,
        }
    }
}

/// Resolved state of every (point, quadrant) slot of a layer.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct QuadrantPlan {
    states: BTreeMap<GridPoint, [QuadrantState; 4]>,
}

impl QuadrantPlan {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge `states` into the slots of `p`; the larger coverage wins per slot.
    pub fn merge_point(&mut self, p: GridPoint, states: [QuadrantState; 4]) {
        let slot = self.states.entry(p).or_insert([QuadrantState::Empty; 4]);
        for q in Quadrant::ALL {
            let i = q.index();
            slot[i] = slot[i].merge(states[i]);
        }
    }

    /// State of a slot; points outside the layer are empty.
    pub fn state(&self, p: GridPoint, q: Quadrant) -> QuadrantState {
        self.states
            .get(&p)
            .map_or(QuadrantState::Empty, |s| s[q.index()])
    }

    pub fn iter(&self) -> impl Iterator<Item = (GridPoint, &[QuadrantState; 4])> + '_ {
        self.states.iter().map(|(p, s)| (*p, s))
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// A concave slot renders a bridge only when the diagonal partner is
    /// concave toward it and both flanking slots at the shared corner are empty.
    pub fn bridge_is_valid(&self, p: GridPoint, q: Quadrant) -> bool {
        let (sx, sy) = q.signs();
        let partner = p.offset(sx, sy);
        self.state(partner, q.opposite()) == QuadrantState::concave(q.opposite())
            && self.state(p.offset(sx, 0), q.mirror_x()).is_empty()
            && self.state(p.offset(0, sy), q.mirror_y()).is_empty()
    }

    /// Demote concave slots that cannot form a bridge to `full`. Returns the
    /// number of demoted slots.
    pub fn settle_bridges(&mut self) -> usize {
        let mut demote = Vec::new();
        for (p, states) in &self.states {
            for q in Quadrant::ALL {
                if states[q.index()].shape() == QuadrantShape::Concave && !self.bridge_is_valid(*p, q) {
                    demote.push((*p, q));
                }
            }
        }
        for &(p, q) in &demote {
            if let Some(s) = self.states.get_mut(&p) {
                s[q.index()] = QuadrantState::Full;
            }
        }
        demote.len()
    }
}

/// Classify and resolve each group against its own points, then merge.
pub fn build_plan(layer: &Layer) -> (QuadrantPlan, Vec<GroupStats>) {
    let mut plan = QuadrantPlan::new();
    let mut stats = Vec::with_capacity(layer.groups.len());
    for group in &layer.groups {
        let mut gs = GroupStats {
            id: group.id.clone(),
            points: group.points.len(),
            ..Default::default()
        };
        for p in group.points.iter() {
            let auto = classify(&analyze(p, &group.points));
            let resolved = resolve(auto, layer.modification(p));
            gs.overridden += overridden_count(&auto, &resolved);
            for s in resolved {
                gs.count(s);
            }
            plan.merge_point(p, resolved);
        }
        debug!(
            group = %gs.id,
            points = gs.points,
            full = gs.full,
            convex = gs.convex,
            concave = gs.concave,
            "group classified"
        );
        stats.push(gs);
    }
    (plan, stats)
}
