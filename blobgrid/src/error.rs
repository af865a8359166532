//! Errors raised at the input boundary, before the geometry pipeline runs.
//!
//! Boundary defects (edges that fail to cancel or close) are not errors:
//! they are reported through [`crate::trace::EngineTrace`].

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum BlobError {
    /// A numeric parameter was NaN or infinite
    #[error("parameter '{param}' must be finite")]
    NonFinite { param: &'static str },

    /// A numeric parameter fell outside its accepted range
    #[error("parameter '{param}' out of range [{min}, {max}], got {got}")]
    OutOfRange {
        param: &'static str,
        min: f64,
        max: f64,
        got: f64,
    },

    /// A point key was not two in-bounds integers separated by a comma
    #[error("invalid point key '{key}'")]
    InvalidPointKey { key: String },

    /// An override names a curve orientation that does not match its quadrant slot
    #[error("override '{state}' cannot be stored in quadrant {quadrant} of point {point}")]
    InvalidOverride {
        point: String,
        quadrant: u8,
        state: String,
    },

    #[error("cutout diameter must not be negative at point {point}, got {got}")]
    NegativeDiameter { point: String, got: f64 },

    #[error("layer '{layer}' has {count} points, limit is {limit}")]
    TooManyPoints {
        layer: String,
        count: usize,
        limit: usize,
    },

    #[error("invalid document: {0}")]
    InvalidDocument(String),

    #[error("invalid svg: {0}")]
    InvalidSvg(String),

    /// Layers exported into one document disagree on their physical unit
    #[error("selection mixes mm_per_unit {first} and {got}")]
    MixedUnits { first: f64, got: f64 },

    #[error("export failed: {0}")]
    Export(String),
}

impl BlobError {
    /// Stable machine-readable code, mirrored by the wasm result objects.
    pub fn code(&self) -> &'static str {
        match self {
            BlobError::NonFinite { .. } => "non_finite",
            BlobError::OutOfRange { .. } => "out_of_range",
            BlobError::InvalidPointKey { .. } => "invalid_point_key",
            BlobError::InvalidOverride { .. } => "invalid_override",
            BlobError::NegativeDiameter { .. } => "negative_diameter",
            BlobError::TooManyPoints { .. } => "too_many_points",
            BlobError::InvalidDocument(_) => "invalid_document",
            BlobError::InvalidSvg(_) => "invalid_svg",
            BlobError::MixedUnits { .. } => "mixed_units",
            BlobError::Export(_) => "export_failed",
        }
    }

    pub(crate) fn check_finite(param: &'static str, v: f32) -> Result<(), BlobError> {
        if v.is_finite() {
            Ok(())
        } else {
            Err(BlobError::NonFinite { param })
        }
    }

    pub(crate) fn check_range(param: &'static str, v: f32, min: f32, max: f32) -> Result<(), BlobError> {
        Self::check_finite(param, v)?;
        if v < min || v > max {
            return Err(BlobError::OutOfRange {
                param,
                min: min as f64,
                max: max as f64,
                got: v as f64,
            });
        }
        Ok(())
    }
}

impl From<serde_json::Error> for BlobError {
    fn from(e: serde_json::Error) -> Self {
        BlobError::InvalidDocument(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_stable() {
        assert_eq!(BlobError::NonFinite { param: "x" }.code(), "non_finite");
        assert_eq!(
            BlobError::InvalidPointKey { key: "a,b".into() }.code(),
            "invalid_point_key"
        );
        assert_eq!(BlobError::InvalidSvg("no path".into()).code(), "invalid_svg");
    }

    #[test]
    fn range_check_rejects_nan_before_bounds() {
        let e = BlobError::check_range("grid_size", f32::NAN, 1.0, 10.0).unwrap_err();
        assert_eq!(e.code(), "non_finite");
        let e = BlobError::check_range("grid_size", 0.5, 1.0, 10.0).unwrap_err();
        assert_eq!(e.code(), "out_of_range");
        assert!(BlobError::check_range("grid_size", 5.0, 1.0, 10.0).is_ok());
    }
}
