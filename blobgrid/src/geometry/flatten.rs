use crate::geometry::math::dist_point_to_seg_sq;
use crate::geometry::tolerance::MAX_FLATTEN_DEPTH;
use crate::model::Vec2;

pub fn flatten_cubic(points: &mut Vec<Vec2>, p0: Vec2, p1: Vec2, p2: Vec2, p3: Vec2, tol: f32, depth: u32) {
    let d1 = dist_point_to_seg_sq(p1, p0, p3);
    let d2 = dist_point_to_seg_sq(p2, p0, p3);
    let tol2 = tol * tol;
    if d1.max(d2) <= tol2 || depth > MAX_FLATTEN_DEPTH {
        points.push(p3);
        return;
    }
    let p01 = p0.lerp(p1, 0.5);
    let p12 = p1.lerp(p2, 0.5);
    let p23 = p2.lerp(p3, 0.5);
    let p012 = p01.lerp(p12, 0.5);
    let p123 = p12.lerp(p23, 0.5);
    let mid = p012.lerp(p123, 0.5);
    flatten_cubic(points, p0, p01, p012, mid, tol, depth + 1);
    flatten_cubic(points, mid, p123, p23, p3, tol, depth + 1);
}
