use blobgrid::algorithms::cutouts::CutoutCircle;
use blobgrid::geometry::edge::Edge;
use blobgrid::geometry::math::segments_cross;
use blobgrid::geometry::path::{BlobPath, PathKind};
use blobgrid::{
    compute_geometry, compute_geometry_traced, BlobConfig, BlobEngine, BlobGeometry, CircularCutout, GridPoint,
    InteractionGroup, Layer, PointModification, Quadrant, QuadrantState, Vec2,
};

fn pts(list: &[(i32, i32)]) -> Vec<GridPoint> {
    list.iter().map(|&(x, y)| GridPoint::new(x, y)).collect()
}

fn layer(list: &[(i32, i32)]) -> Layer {
    Layer::with_points("layer", pts(list))
}

fn geometry(l: &Layer, cfg: &BlobConfig) -> BlobGeometry {
    let (g, trace) = compute_geometry_traced(l, cfg).unwrap();
    assert!(trace.is_clean(), "defects: {:?}", trace.defects);
    g
}

// Proper crossings between any two flattened segments of the outlines.
fn crossings(g: &BlobGeometry) -> usize {
    let segs: Vec<(Vec2, Vec2)> = g
        .paths
        .iter()
        .flat_map(|p| {
            let pts = p.flatten(0.5);
            let n = pts.len();
            (0..n).map(move |i| (pts[i], pts[(i + 1) % n])).collect::<Vec<_>>()
        })
        .collect();
    let mut count = 0;
    for i in 0..segs.len() {
        for j in i + 1..segs.len() {
            if segments_cross(segs[i].0, segs[i].1, segs[j].0, segs[j].1) {
                count += 1;
            }
        }
    }
    count
}

fn assert_well_formed(g: &BlobGeometry) {
    for p in g.all_paths() {
        assert!(p.closed, "open path {:?}", p);
        assert!(p.distinct_vertex_count(1e-3) >= 3);
    }
}

#[test]
fn isolated_point_is_a_rounded_square() {
    let g = geometry(&layer(&[(0, 0)]), &BlobConfig::default());
    assert_well_formed(&g);
    assert_eq!(g.paths.len(), 1);
    let p = &g.paths[0];
    assert_eq!(p.arc_count(), 4);
    assert_eq!(p.line_count(), 4);
    assert!(p.signed_area() > 0.0);
    let bb = g.bounding_box.unwrap();
    assert!((bb.min_x - 0.0).abs() < 1e-3 && (bb.max_x - 50.0).abs() < 1e-3);
}

#[test]
fn border_grows_corner_radius() {
    let g = geometry(&layer(&[(0, 0)]), &BlobConfig::new(50.0, 2.0));
    assert_well_formed(&g);
    let p = &g.paths[0];
    assert_eq!(p.arc_count(), 4);
    // Corner radius in pixels is corner_ratio * gridSize / 2 + borderWidth.
    let center = Vec2::new(12.5, 12.5);
    let nw = p
        .sample(8)
        .into_iter()
        .filter(|v| v.x < 12.5 && v.y < 12.5)
        .collect::<Vec<_>>();
    assert!(!nw.is_empty());
    for v in nw {
        assert!((v.distance(center) - 14.5).abs() < 0.05, "{:?}", v);
    }
    let bb = g.bounding_box.unwrap();
    assert!((bb.min_x + 2.0).abs() < 1e-3 && (bb.max_y - 52.0).abs() < 1e-3);
}

#[test]
fn horizontal_pair_has_no_seam() {
    let g = geometry(&layer(&[(0, 0), (1, 0)]), &BlobConfig::default());
    assert_well_formed(&g);
    assert_eq!(g.paths.len(), 1);
    assert_eq!(g.paths[0].line_count(), 4);
    assert_eq!(g.paths[0].arc_count(), 4);
    // No surviving edge on the shared cell side x = 2 (subgrid).
    let seam = g
        .primitives
        .iter()
        .filter(|e| (e.start.x - 2.0).abs() < 1e-4 && (e.end.x - 2.0).abs() < 1e-4)
        .count();
    assert_eq!(seam, 0);
}

#[test]
fn diagonal_pair_is_bridged() {
    let g = geometry(&layer(&[(0, 0), (1, 1)]), &BlobConfig::default());
    assert_well_formed(&g);
    assert_eq!(g.paths.len(), 1);
    let p = &g.paths[0];
    // 6 convex corners plus the two concave bridge arcs.
    assert_eq!(p.arc_count(), 8);
    assert!(!p.self_intersects(0.1));
    let concave = g
        .primitives
        .iter()
        .filter(|e| matches!(e.curve, blobgrid::geometry::edge::CurveKind::Concave(_)))
        .count();
    assert_eq!(concave, 2);
}

#[test]
fn diagonal_pair_with_border_stays_simple() {
    let g = geometry(&layer(&[(0, 0), (1, 1)]), &BlobConfig::new(50.0, 2.0));
    assert_well_formed(&g);
    assert_eq!(g.paths.len(), 1);
    assert!(!g.paths[0].self_intersects(0.1));
}

#[test]
fn full_corners_touching_at_a_point_fuse_under_a_border() {
    let l = layer(&[(0, 0), (1, 1)])
        .modify(
            GridPoint::new(0, 0),
            PointModification::default().with_override(Quadrant::Se, QuadrantState::Full),
        )
        .modify(
            GridPoint::new(1, 1),
            PointModification::default().with_override(Quadrant::Nw, QuadrantState::Full),
        );
    let g = geometry(&l, &BlobConfig::new(50.0, 2.0));
    assert_well_formed(&g);
    assert_eq!(g.paths.len(), 1);
    assert_eq!(crossings(&g), 0);
}

#[test]
fn wide_border_bridges_a_gap_cell() {
    let g = geometry(&layer(&[(0, 0), (2, 0)]), &BlobConfig::new(50.0, 30.0));
    assert_well_formed(&g);
    assert_eq!(g.paths.len(), 1);
    assert_eq!(crossings(&g), 0);
    let bb = g.bounding_box.unwrap();
    assert!((bb.min_x + 30.0).abs() < 1e-2, "{:?}", bb);
    assert!((bb.max_x - 180.0).abs() < 1e-2, "{:?}", bb);
}

#[test]
fn wide_border_fills_a_u_notch() {
    let g = geometry(&layer(&[(0, 0), (0, 1), (1, 1), (2, 1), (2, 0)]), &BlobConfig::new(50.0, 30.0));
    assert_well_formed(&g);
    assert_eq!(g.paths.len(), 1);
    assert!(g.paths[0].signed_area() > 0.0);
    assert!(!g.paths[0].self_intersects(0.1));
    assert_eq!(crossings(&g), 0);
}

#[test]
fn full_corner_ratio_rounds_an_isolated_point_into_a_circle() {
    let cfg = BlobConfig {
        corner_ratio: 1.0,
        ..BlobConfig::default()
    };
    let g = geometry(&layer(&[(0, 0)]), &cfg);
    assert_well_formed(&g);
    assert_eq!(g.paths.len(), 1);
    let p = &g.paths[0];
    assert_eq!(p.arc_count(), 4);
    // r = gridSize / 2 + borderWidth with no border.
    let center = Vec2::new(25.0, 25.0);
    for v in p.sample(8) {
        assert!((v.distance(center) - 25.0).abs() < 0.05, "{:?}", v);
    }
}

#[test]
fn empty_override_changes_the_outline() {
    let p0 = GridPoint::new(0, 0);
    let plain = geometry(&layer(&[(0, 0)]), &BlobConfig::default());
    let notched_layer = layer(&[(0, 0)]).modify(
        p0,
        PointModification::default().with_override(Quadrant::Se, QuadrantState::Empty),
    );
    let notched = geometry(&notched_layer, &BlobConfig::default());
    assert_well_formed(&notched);
    assert_eq!(notched.paths.len(), 1);
    assert_eq!(notched.paths[0].arc_count(), 3);
    assert_ne!(plain.paths[0], notched.paths[0]);
    assert!(notched.paths[0].signed_area() < plain.paths[0].signed_area());
    // The notch corner sits at the cell center.
    let center = Vec2::new(25.0, 25.0);
    assert!(notched.paths[0].vertices().iter().any(|v| v.distance(center) < 1e-3));
}

#[test]
fn two_by_two_block_is_one_loop_without_internal_edges() {
    let l = layer(&[(5, 5), (6, 5), (5, 6), (6, 6)]);
    let g = geometry(&l, &BlobConfig::new(50.0, 2.0));
    assert_well_formed(&g);
    assert_eq!(g.paths.len(), 1);
    let on_rim = |v: Vec2| {
        let near = |a: f32, b: f32| (a - b).abs() < 1e-4;
        near(v.x, 10.0) || near(v.x, 14.0) || near(v.y, 10.0) || near(v.y, 14.0)
    };
    assert!(g.primitives.iter().all(|e: &Edge| on_rim(e.start) && on_rim(e.end)));
    let bb = g.bounding_box.unwrap();
    assert!((bb.min_x - 248.0).abs() < 1e-3);
    assert!((bb.max_x - 352.0).abs() < 1e-3);
}

#[test]
fn cutout_becomes_a_separate_hole() {
    let p = GridPoint::new(5, 5);
    let l = layer(&[(5, 5)]).modify(p, PointModification::default().with_cutout(CircularCutout::centered(2.0)));
    let cfg = BlobConfig::default().with_mm_per_unit(1.0);
    let g = geometry(&l, &cfg);
    assert_well_formed(&g);
    assert_eq!(g.paths.len(), 1);
    assert_eq!(g.cutouts.len(), 1);
    let CutoutCircle { center, radius, path, .. } = &g.cutouts[0];
    assert_eq!(path.kind, PathKind::Cutout);
    // One grid unit of radius.
    assert!((radius / cfg.grid_size - 1.0).abs() < 1e-6);
    assert!((center.x - 275.0).abs() < 1e-3 && (center.y - 275.0).abs() < 1e-3);
    assert!(path.signed_area() < 0.0);
    for v in path.sample(6) {
        assert!((v.distance(*center) - 50.0).abs() < 0.1);
    }
}

#[test]
fn overlapping_groups_fuse_cleanly() {
    let l = Layer::new("layer")
        .push_group(InteractionGroup::new("a", pts(&[(4, 5), (5, 5), (4, 6), (5, 6)])))
        .push_group(InteractionGroup::new("b", pts(&[(5, 5), (6, 5), (5, 6), (6, 6)])));
    let g = geometry(&l, &BlobConfig::new(50.0, 2.0));
    assert_well_formed(&g);
    assert_eq!(g.paths.len(), 1);
    assert!(!g.paths[0].self_intersects(0.1));
    // Same outline as painting the union in a single group.
    let single = geometry(&layer(&[(4, 5), (5, 5), (6, 5), (4, 6), (5, 6), (6, 6)]), &BlobConfig::new(50.0, 2.0));
    let area = single.paths[0].signed_area();
    assert!((g.paths[0].signed_area() - area).abs() < 1e-3 * area);
}

#[test]
fn ring_encloses_a_hole() {
    // 3x3 block with the middle missing.
    let ring = layer(&[(0, 0), (1, 0), (2, 0), (0, 1), (2, 1), (0, 2), (1, 2), (2, 2)]);
    let g = geometry(&ring, &BlobConfig::default());
    assert_well_formed(&g);
    assert_eq!(g.paths.len(), 2);
    let mut areas: Vec<f32> = g.paths.iter().map(BlobPath::signed_area).collect();
    areas.sort_by(f32::total_cmp);
    assert!(areas[0] < 0.0 && areas[1] > 0.0);
}

#[test]
fn modifications_for_absent_points_are_ignored() {
    let stray = GridPoint::new(40, 40);
    let l = layer(&[(0, 0)]).modify(
        stray,
        PointModification::default()
            .with_override(Quadrant::Nw, QuadrantState::Empty)
            .with_cutout(CircularCutout::centered(1.0)),
    );
    let g = geometry(&l, &BlobConfig::default());
    assert!(g.cutouts.is_empty());
    assert_eq!(g.paths, geometry(&layer(&[(0, 0)]), &BlobConfig::default()).paths);
}

#[test]
fn empty_layer_has_no_paths() {
    let g = geometry(&Layer::new("empty"), &BlobConfig::default());
    assert!(g.is_empty());
    assert!(g.bounding_box.is_none());
}

#[test]
fn recompute_is_identical_cold_cached_and_fresh() {
    let l = layer(&[(0, 0), (1, 1), (2, 1), (4, 4), (4, 5)]);
    let cfg = BlobConfig::new(40.0, 1.5);
    let cold = compute_geometry(&l, &cfg).unwrap();
    let mut engine = BlobEngine::new(cfg.clone()).unwrap();
    let first = engine.geometry(&l).unwrap();
    let cached = engine.geometry(&l).unwrap();
    let fresh = BlobEngine::new(cfg).unwrap().geometry(&l).unwrap();
    assert_eq!(cold, *first);
    assert_eq!(*first, *cached);
    assert_eq!(*cached, *fresh);
    assert_eq!(engine.cache().stats().hits, 1);
}

#[test]
fn layer_failures_are_isolated() {
    let good = layer(&[(0, 0)]);
    let bad = layer(&[(1, 1)]).modify(
        GridPoint::new(1, 1),
        PointModification::default().with_override(Quadrant::Ne, QuadrantState::ConcaveSw),
    );
    let mut engine = BlobEngine::default();
    let out = engine.layers(&[good.clone(), bad, good]);
    assert!(out[0].is_ok());
    assert_eq!(out[1].as_ref().unwrap_err().code(), "invalid_override");
    assert!(out[2].is_ok());
}

#[test]
fn trace_reports_counts() {
    let (_, trace) = compute_geometry_traced(&layer(&[(0, 0), (1, 0)]), &BlobConfig::default()).unwrap();
    assert_eq!(trace.groups.len(), 1);
    assert_eq!(trace.groups[0].full, 4);
    assert_eq!(trace.groups[0].convex, 4);
    assert_eq!(trace.counts.total_edges, trace.tile_edges.len());
    assert_eq!(
        trace.counts.total_edges,
        trace.counts.cancelled_edges + trace.counts.boundary_edges + trace.counts.degenerate_edges
    );
    assert_eq!(trace.loops.len(), 1);
    assert_eq!(trace.path_data.len(), 1);
    assert!(trace.path_data[0].starts_with('M'));
    assert_eq!(trace.to_json()["counts"]["paths"], 1);
}
