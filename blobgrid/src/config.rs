use crate::error::BlobError;
use crate::geometry::{limits, tolerance};
use serde::{Deserialize, Serialize};

/// Engine parameters. Everything that shapes geometry lives here and is part
/// of the cache key.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BlobConfig {
    /// Cell size in pixel units.
    pub grid_size: f32,
    /// Outward growth of every outline, in pixel units.
    pub border_width: f32,
    /// Physical size of one grid unit, used for cutout diameters and SVG/DXF sizing.
    pub mm_per_unit: f32,
    /// Convex corner radius as a fraction of half a cell.
    pub corner_ratio: f32,
    /// Diagonal bridge fillet radius as a fraction of half a cell.
    pub bridge_ratio: f32,
    /// Control-point scale applied to bridge arcs on top of the quarter-circle constant.
    pub bridge_control_scale: f32,
    /// Endpoint welding tolerance for edge cancellation, in subgrid units.
    pub cancel_tolerance: f32,
}

impl Default for BlobConfig {
    fn default() -> Self {
        BlobConfig {
            grid_size: 50.0,
            border_width: 0.0,
            mm_per_unit: 1.0,
            corner_ratio: 0.5,
            bridge_ratio: 0.5,
            bridge_control_scale: tolerance::BRIDGE_CONTROL_SCALE,
            cancel_tolerance: tolerance::DEFAULT_CANCEL_TOL,
        }
    }
}

impl BlobConfig {
    pub fn new(grid_size: f32, border_width: f32) -> Self {
        BlobConfig {
            grid_size,
            border_width,
            ..Default::default()
        }
    }

    pub fn with_mm_per_unit(mut self, mm: f32) -> Self {
        self.mm_per_unit = mm;
        self
    }

    pub fn with_cancel_tolerance(mut self, tol: f32) -> Self {
        self.cancel_tolerance = tol;
        self
    }

    pub fn from_json(v: serde_json::Value) -> Result<Self, BlobError> {
        let cfg: BlobConfig = serde_json::from_value(v)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), BlobError> {
        BlobError::check_range("grid_size", self.grid_size, limits::GRID_SIZE_MIN, limits::GRID_SIZE_MAX)?;
        BlobError::check_range("border_width", self.border_width, 0.0, limits::BORDER_MAX)?;
        BlobError::check_range("mm_per_unit", self.mm_per_unit, limits::MM_PER_UNIT_MIN, limits::MM_PER_UNIT_MAX)?;
        BlobError::check_range("corner_ratio", self.corner_ratio, 0.05, 1.0)?;
        BlobError::check_range("bridge_ratio", self.bridge_ratio, 0.05, 1.0)?;
        BlobError::check_range("bridge_control_scale", self.bridge_control_scale, 0.1, 1.5)?;
        // Welding must stay well below the smallest feature (quarter of a subgrid unit).
        BlobError::check_range("cancel_tolerance", self.cancel_tolerance, 1e-5, 0.1)?;
        Ok(())
    }

    /// Pixel length of one subgrid unit.
    #[inline]
    pub fn subgrid_px(&self) -> f32 {
        self.grid_size * 0.5
    }

    /// Bridge arc control ratio.
    #[inline]
    pub fn bridge_kappa(&self) -> f32 {
        tolerance::KAPPA * self.bridge_control_scale
    }
}
