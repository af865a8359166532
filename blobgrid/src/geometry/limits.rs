// Centralized ingestion limits to harden against untrusted documents

// Layer size caps
pub const MAX_POINTS_PER_LAYER: usize = 250_000;
pub const MAX_GROUPS_PER_LAYER: usize = 4_096;
pub const MAX_CUTOUTS_PER_POINT: usize = 64;

// Grid coordinates (subgrid positions 2x+2 must stay exact in f32)
pub const COORD_MIN: i64 = -1_000_000;
pub const COORD_MAX: i64 = 1_000_000;

// Config bounds (pixel units unless noted)
pub const GRID_SIZE_MIN: f32 = 0.01;
pub const GRID_SIZE_MAX: f32 = 10_000.0;
pub const BORDER_MAX: f32 = 10_000.0;
pub const MM_PER_UNIT_MIN: f32 = 1e-4;
pub const MM_PER_UNIT_MAX: f32 = 10_000.0;
pub const DIAMETER_MAX_MM: f32 = 100_000.0;
pub const CUTOUT_OFFSET_MAX: f32 = 1_000.0; // grid units

// SVG ingestion caps (DXF conversion)
pub const MAX_SVG_BYTES: usize = 8 * 1024 * 1024;
pub const MAX_SVG_COMMANDS: usize = 200_000;

#[inline]
pub fn in_coord_bounds(v: i64) -> bool { (COORD_MIN..=COORD_MAX).contains(&v) }
