use crate::model::{PointModification, Quadrant, QuadrantState};

/// Apply a point's explicit quadrant overrides on top of its automatic states.
///
/// Overrides are validated against their slot when the layer is checked; an
/// oriented state that still does not fit is ignored here.
pub fn resolve(auto: [QuadrantState; 4], modification: Option<&PointModification>) -> [QuadrantState; 4] {
    let Some(m) = modification else {
        return auto;
    };
    let mut out = auto;
    for (&q, &state) in &m.quadrant_overrides {
        if state.fits(q) {
            out[q.index()] = state;
        }
    }
    out
}

/// Number of quadrants where the resolved state differs from the automatic one.
pub fn overridden_count(auto: &[QuadrantState; 4], resolved: &[QuadrantState; 4]) -> usize {
    Quadrant::ALL
        .iter()
        .filter(|q| auto[q.index()] != resolved[q.index()])
        .count()
}
