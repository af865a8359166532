use blobgrid::algorithms::primitives::{self, TileParams};
use blobgrid::algorithms::{cancel, merge};
use blobgrid::geometry::math::segments_cross;
use blobgrid::{
    compute_geometry, compute_geometry_traced, BlobConfig, BlobEngine, GridPoint, InteractionGroup, Layer,
    Quadrant, QuadrantState, Vec2,
};
use proptest::prelude::*;

#[derive(Clone, Debug)]
struct Override {
    pick: usize,
    quadrant: usize,
    kind: u8,
}

fn state_for(q: Quadrant, kind: u8) -> QuadrantState {
    match kind % 4 {
        0 => QuadrantState::Empty,
        1 => QuadrantState::Full,
        2 => QuadrantState::convex(q),
        _ => QuadrantState::concave(q),
    }
}

fn points_strategy() -> impl Strategy<Value = Vec<(i32, i32)>> {
    prop::collection::vec((0i32..8, 0i32..8), 1..28)
}

fn overrides_strategy() -> impl Strategy<Value = Vec<Override>> {
    prop::collection::vec(
        (any::<usize>(), 0usize..4, any::<u8>()).prop_map(|(pick, quadrant, kind)| Override { pick, quadrant, kind }),
        0..8,
    )
}

fn build_layer(points: &[(i32, i32)], split: &[bool], overrides: &[Override]) -> Layer {
    let all: Vec<GridPoint> = points.iter().map(|&(x, y)| GridPoint::new(x, y)).collect();
    let mut a = Vec::new();
    let mut b = Vec::new();
    for (i, p) in all.iter().enumerate() {
        if split.get(i).copied().unwrap_or(false) {
            b.push(*p);
        } else {
            a.push(*p);
        }
    }
    let mut layer = Layer::new("prop").push_group(InteractionGroup::new("a", a));
    if !b.is_empty() {
        layer = layer.push_group(InteractionGroup::new("b", b));
    }
    for o in overrides {
        let p = all[o.pick % all.len()];
        let Some(q) = Quadrant::from_index(o.quadrant) else {
            continue;
        };
        let m = layer
            .modifications
            .remove(&p)
            .unwrap_or_default()
            .with_override(q, state_for(q, o.kind));
        layer = layer.modify(p, m);
    }
    layer
}

fn rings_cross(a: &[Vec2], b: &[Vec2]) -> bool {
    let edges = |r: &[Vec2]| (0..r.len()).map(|i| (r[i], r[(i + 1) % r.len()])).collect::<Vec<_>>();
    let (ea, eb) = (edges(a), edges(b));
    ea.iter().any(|&(p, q)| eb.iter().any(|&(r, s)| segments_cross(p, q, r, s)))
}

proptest! {
    #[test]
    fn outlines_close_and_edges_balance(
        points in points_strategy(),
        split in prop::collection::vec(any::<bool>(), 0..28),
        overrides in overrides_strategy(),
    ) {
        let layer = build_layer(&points, &split, &overrides);
        let cfg = BlobConfig::default();
        let (g, trace) = compute_geometry_traced(&layer, &cfg).unwrap();
        prop_assert!(trace.is_clean(), "defects: {:?}", trace.defects);
        for p in &g.paths {
            prop_assert!(p.closed);
            prop_assert!(p.distinct_vertex_count(1e-3) >= 3);
        }

        let (mut plan, _) = merge::build_plan(&layer);
        plan.settle_bridges();
        let tiles = primitives::generate(&plan, &TileParams::from_config(&cfg));
        let boundary = cancel::cancel(&tiles, cfg.cancel_tolerance);
        prop_assert!(boundary.is_balanced());
        prop_assert_eq!(boundary.edges.len(), g.primitives.len());
    }

    #[test]
    fn automatic_outlines_do_not_self_intersect(
        points in points_strategy(),
        bordered in any::<bool>(),
    ) {
        let layer = build_layer(&points, &[], &[]);
        let cfg = BlobConfig::new(50.0, if bordered { 2.0 } else { 0.0 });
        let (g, trace) = compute_geometry_traced(&layer, &cfg).unwrap();
        prop_assert!(trace.is_clean());
        prop_assert_eq!(trace.counts.demoted_bridges, 0);
        for p in &g.paths {
            prop_assert!(p.closed);
            prop_assert!(!p.self_intersects(0.5), "self-intersecting path {:?}", p.to_svg_d(1.0));
        }
        let rings: Vec<Vec<Vec2>> = g.paths.iter().map(|p| p.flatten(0.5)).collect();
        for (i, a) in rings.iter().enumerate() {
            for b in &rings[i + 1..] {
                prop_assert!(!rings_cross(a, b), "outlines cross each other");
            }
        }
    }

    #[test]
    fn geometry_is_deterministic(
        points in points_strategy(),
        overrides in overrides_strategy(),
    ) {
        let layer = build_layer(&points, &[], &overrides);
        let mut reversed_points = points.clone();
        reversed_points.reverse();
        let shuffled = build_layer(&reversed_points, &[], &[]);
        let shuffled = layer
            .modifications
            .iter()
            .fold(shuffled, |l, (p, m)| l.modify(*p, m.clone()));

        let cfg = BlobConfig::new(40.0, 1.0);
        let cold = compute_geometry(&layer, &cfg).unwrap();
        let mut engine = BlobEngine::new(cfg.clone()).unwrap();
        let first = engine.geometry(&layer).unwrap();
        let cached = engine.geometry(&layer).unwrap();
        prop_assert_eq!(&cold, first.as_ref());
        prop_assert_eq!(first.as_ref(), cached.as_ref());
        prop_assert_eq!(cold, compute_geometry(&shuffled, &cfg).unwrap());
    }

    #[test]
    fn weld_tolerance_does_not_change_the_result(
        points in points_strategy(),
        tol in prop::sample::select(vec![1e-4f32, 1e-3, 0.05, 0.08]),
    ) {
        let layer = build_layer(&points, &[], &[]);
        let base = compute_geometry(&layer, &BlobConfig::default()).unwrap();
        let other = compute_geometry(&layer, &BlobConfig::default().with_cancel_tolerance(tol)).unwrap();
        prop_assert_eq!(base.paths, other.paths);
    }

    #[test]
    fn overridden_fill_never_escapes_the_cells(
        points in points_strategy(),
        overrides in overrides_strategy(),
    ) {
        let layer = build_layer(&points, &[], &overrides);
        let g = compute_geometry(&layer, &BlobConfig::default()).unwrap();
        let Some(bb) = g.bounding_box else {
            return Ok(());
        };
        let min_x = points.iter().map(|p| p.0).min().unwrap() as f32 * 50.0;
        let max_x = (points.iter().map(|p| p.0).max().unwrap() + 1) as f32 * 50.0;
        let min_y = points.iter().map(|p| p.1).min().unwrap() as f32 * 50.0;
        let max_y = (points.iter().map(|p| p.1).max().unwrap() + 1) as f32 * 50.0;
        prop_assert!(bb.min_x >= min_x - 1e-3 && bb.max_x <= max_x + 1e-3);
        prop_assert!(bb.min_y >= min_y - 1e-3 && bb.max_y <= max_y + 1e-3);
    }
}
