// Centralized tolerances and curve constants

pub const EPS_POS: f32 = 1e-4; // point coincidence threshold (subgrid units)
pub const EPS_LEN: f32 = 1e-6; // zero-length vector threshold

// Default endpoint welding tolerance for edge cancellation (subgrid units)
pub const DEFAULT_CANCEL_TOL: f32 = 0.01;

// Quarter-circle cubic approximation constant
pub const KAPPA: f32 = 0.552786;
// Bridge arcs use a tightened control ratio: KAPPA * BRIDGE_CONTROL_SCALE
pub const BRIDGE_CONTROL_SCALE: f32 = 0.76;

// Cubic flattening cap for sampling/intersection checks
pub const MAX_FLATTEN_DEPTH: u32 = 16;

#[inline] pub fn approx_eq(a: f32, b: f32, eps: f32) -> bool { (a - b).abs() <= eps }

#[inline]
pub fn norm2(mut x: f32, mut y: f32) -> ((f32, f32), f32) {
    let len = (x * x + y * y).sqrt();
    if len > EPS_LEN { x /= len; y /= len; ((x, y), len) } else { ((0.0, 0.0), 0.0) }
}
