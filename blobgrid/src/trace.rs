//! Per-call debug record of the geometry pipeline.

use crate::algorithms::merge::GroupStats;
use crate::geometry::edge::Edge;
use crate::model::Vec2;
use serde::Serialize;

/// Boundary problems found while extracting or stitching. These indicate a
/// generator bug; the pipeline still returns best-effort output.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Defect {
    /// Two edges trace the same curve in the same direction.
    DuplicateEdge { from: Vec2, to: Vec2 },
    /// A walk ran out of outgoing edges before returning to its start.
    OpenWalk { at: Vec2, edges: usize },
    /// The border offset failed; the loops were emitted without a border.
    BorderOffset { loops: usize },
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TraceCounts {
    pub total_edges: usize,
    pub cancelled_edges: usize,
    pub degenerate_edges: usize,
    pub boundary_edges: usize,
    pub demoted_bridges: usize,
    pub paths: usize,
    pub cutouts: usize,
}

#[derive(Clone, Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineTrace {
    pub layer_id: String,
    pub groups: Vec<GroupStats>,
    /// Tile edges as generated, before cancellation.
    pub tile_edges: Vec<Edge>,
    /// Surviving boundary edges.
    pub boundary_edges: Vec<Edge>,
    /// Stitched loops in subgrid space.
    pub loops: Vec<Vec<Edge>>,
    /// Final SVG path data, grid units.
    pub path_data: Vec<String>,
    pub counts: TraceCounts,
    pub defects: Vec<Defect>,
}

impl EngineTrace {
    pub fn new(layer_id: impl Into<String>) -> Self {
        EngineTrace {
            layer_id: layer_id.into(),
            ..Default::default()
        }
    }

    pub fn is_clean(&self) -> bool {
        self.defects.is_empty()
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}
