pub mod model;
pub mod config;
pub mod error;
pub mod geometry {
    pub mod border;
    pub mod cubic;
    pub mod edge;
    pub mod flatten;
    pub mod limits;
    pub mod math;
    pub mod offset;
    pub mod path;
    pub mod tolerance;
}
pub mod algorithms {
    pub mod cancel;
    pub mod cutouts;
    pub mod merge;
    pub mod neighborhood;
    pub mod overrides;
    pub mod primitives;
    pub mod stitch;
}
pub mod cache;
pub mod canvas;
pub mod dxf;
pub mod json;
pub mod svg;
pub mod trace;

pub use cache::GeometryCache;
pub use config::BlobConfig;
pub use error::BlobError;
pub use model::{
    CircularCutout, CutoutAnchor, GridPoint, InteractionGroup, Layer, PointModification, PointSet, Quadrant,
    QuadrantState, Vec2,
};
pub use trace::EngineTrace;
use trace::Defect;

use algorithms::cutouts::CutoutCircle;
use algorithms::primitives::TileParams;
use algorithms::{cancel, cutouts, merge, primitives, stitch};
use geometry::edge::Edge;
use geometry::offset::{emit_open, finish_loops};
use geometry::path::{BlobPath, BoundingBox, PathKind};
use serde::{Deserialize, Serialize};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use tracing::{debug, warn};

/// Finished geometry of one layer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlobGeometry {
    pub layer_id: String,
    /// Surviving boundary edges, subgrid units.
    pub primitives: Vec<Edge>,
    /// Outlines in pixel space.
    pub paths: Vec<BlobPath>,
    /// Holes in pixel space.
    pub cutouts: Vec<CutoutCircle>,
    pub bounding_box: Option<BoundingBox>,
    pub grid_size: f32,
    pub border_width: f32,
    pub mm_per_unit: f32,
}

impl BlobGeometry {
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty() && self.cutouts.is_empty()
    }

    /// Outlines followed by cutout holes, in drawing order.
    pub fn all_paths(&self) -> impl Iterator<Item = &BlobPath> + '_ {
        self.paths.iter().chain(self.cutouts.iter().map(|c| &c.path))
    }
}

/// Run the whole pipeline for one layer.
pub fn compute_geometry(layer: &Layer, cfg: &BlobConfig) -> Result<BlobGeometry, BlobError> {
    run(layer, cfg, None)
}

/// Same as [`compute_geometry`], also returning the stage-by-stage trace.
pub fn compute_geometry_traced(layer: &Layer, cfg: &BlobConfig) -> Result<(BlobGeometry, EngineTrace), BlobError> {
    let mut trace = EngineTrace::new(layer.id.clone());
    let g = run(layer, cfg, Some(&mut trace))?;
    Ok((g, trace))
}

fn run(layer: &Layer, cfg: &BlobConfig, trace: Option<&mut EngineTrace>) -> Result<BlobGeometry, BlobError> {
    cfg.validate()?;
    layer.validate()?;
    let points = layer.points();

    let (mut plan, groups) = merge::build_plan(layer);
    let demoted = plan.settle_bridges();
    let tiles = primitives::generate(&plan, &TileParams::from_config(cfg));
    let boundary = cancel::cancel(&tiles, cfg.cancel_tolerance);
    let stitched = stitch::stitch(&boundary);

    let scale = cfg.subgrid_px();
    let mut defects = boundary.defects.clone();
    defects.extend(stitched.defects.iter().cloned());
    let grown = panic::catch_unwind(AssertUnwindSafe(|| {
        finish_loops(&stitched.loops, scale, cfg.border_width, cfg.bridge_control_scale)
    }));
    let mut paths: Vec<BlobPath> = match grown {
        Ok(paths) => paths.unwrap_or_default(),
        Err(_) => {
            warn!(layer = %layer.id, loops = stitched.loops.len(), "border offset panicked");
            defects.push(Defect::BorderOffset {
                loops: stitched.loops.len(),
            });
            finish_loops(&stitched.loops, scale, 0.0, cfg.bridge_control_scale).unwrap_or_default()
        }
    };
    for frag in &stitched.open {
        let scaled: Vec<Edge> = frag.iter().map(|e| e.scaled(scale)).collect();
        paths.push(emit_open(&scaled, PathKind::Outline));
    }
    let holes = cutouts::generate(layer, &points, cfg);

    let bounding_box = paths
        .iter()
        .chain(holes.iter().map(|c| &c.path))
        .filter_map(BlobPath::bounding_box)
        .reduce(BoundingBox::union);

    if !defects.is_empty() {
        warn!(layer = %layer.id, defects = defects.len(), "boundary defects");
    }
    debug!(
        layer = %layer.id,
        points = points.len(),
        tiles = tiles.len(),
        boundary = boundary.edges.len(),
        loops = stitched.loops.len(),
        paths = paths.len(),
        cutouts = holes.len(),
        "layer geometry"
    );

    let geometry = BlobGeometry {
        layer_id: layer.id.clone(),
        primitives: boundary.edges().copied().collect(),
        paths,
        cutouts: holes,
        bounding_box,
        grid_size: cfg.grid_size,
        border_width: cfg.border_width,
        mm_per_unit: cfg.mm_per_unit,
    };

    if let Some(t) = trace {
        t.groups = groups;
        t.counts = trace::TraceCounts {
            total_edges: tiles.len(),
            cancelled_edges: boundary.cancelled,
            degenerate_edges: boundary.degenerate,
            boundary_edges: boundary.edges.len(),
            demoted_bridges: demoted,
            paths: geometry.paths.len(),
            cutouts: geometry.cutouts.len(),
        };
        t.tile_edges = tiles;
        t.boundary_edges = geometry.primitives.clone();
        t.loops = stitched.loops;
        t.path_data = geometry
            .all_paths()
            .map(|p| p.to_svg_d(1.0 / cfg.grid_size))
            .collect();
        t.defects = defects;
    }
    Ok(geometry)
}

/// Engine facade owning the configuration and the per-document cache.
#[derive(Debug, Default)]
pub struct BlobEngine {
    config: BlobConfig,
    cache: GeometryCache,
}

impl BlobEngine {
    pub fn new(config: BlobConfig) -> Result<Self, BlobError> {
        config.validate()?;
        Ok(BlobEngine {
            config,
            cache: GeometryCache::new(),
        })
    }

    pub fn config(&self) -> &BlobConfig {
        &self.config
    }

    /// Config is part of every cache key, so stale entries simply miss.
    pub fn set_config(&mut self, config: BlobConfig) -> Result<(), BlobError> {
        config.validate()?;
        self.config = config;
        Ok(())
    }

    pub fn cache(&self) -> &GeometryCache {
        &self.cache
    }

    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }

    /// Drop one layer's entry, e.g. after the layer was deleted.
    pub fn invalidate(&mut self, layer_id: &str) -> bool {
        self.cache.invalidate(layer_id)
    }

    pub fn geometry(&mut self, layer: &Layer) -> Result<Arc<BlobGeometry>, BlobError> {
        let cfg = &self.config;
        self.cache
            .get_or_compute(layer, cfg, || compute_geometry(layer, cfg))
    }

    /// Uncached run with the full trace.
    pub fn geometry_with_trace(&self, layer: &Layer) -> Result<(BlobGeometry, EngineTrace), BlobError> {
        compute_geometry_traced(layer, &self.config)
    }

    /// One result per layer; a failing layer does not affect the others.
    pub fn layers(&mut self, layers: &[Layer]) -> Vec<Result<Arc<BlobGeometry>, BlobError>> {
        layers.iter().map(|l| self.geometry(l)).collect()
    }

    pub fn svg(&mut self, layer: &Layer, opts: &svg::SvgOptions) -> Result<String, BlobError> {
        let g = self.geometry(layer)?;
        Ok(svg::render(&g, opts))
    }

    /// One document for several layers.
    pub fn svg_selection(&mut self, layers: &[Layer], opts: &svg::SvgOptions) -> Result<String, BlobError> {
        let geoms = layers
            .iter()
            .map(|l| self.geometry(l))
            .collect::<Result<Vec<_>, _>>()?;
        let refs: Vec<&BlobGeometry> = geoms.iter().map(|g| g.as_ref()).collect();
        svg::render_selection(&refs, opts)
    }

    pub fn dxf(&mut self, layer: &Layer) -> Result<String, BlobError> {
        let g = self.geometry(layer)?;
        dxf::from_geometry(&g)
    }
}
