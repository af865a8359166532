//! ASCII DXF (R2010, millimetres) with one LWPOLYLINE per sub-path.

use crate::error::BlobError;
use crate::geometry::path::BlobPath;
use crate::model::Vec2;
use crate::svg;
use crate::BlobGeometry;
use ::dxf::entities::{Entity, EntityType, LwPolyline};
use ::dxf::enums::{AcadVersion, Units};
use ::dxf::{Drawing, LwPolylineVertex};

/// Sampling density along each segment.
pub const POINTS_PER_MM: f32 = 10.0;
/// Consecutive points closer than this on both axes are dropped.
pub const MIN_SPACING_MM: f32 = 0.01;

#[derive(Clone, Debug, PartialEq)]
pub struct Polyline {
    pub points: Vec<Vec2>,
    pub closed: bool,
}

/// Sample `path` with every coordinate multiplied by `scale` (to millimetres).
pub fn sample_path(path: &BlobPath, scale: f32) -> Polyline {
    fn push(points: &mut Vec<Vec2>, p: Vec2) {
        let keep = points.last().map_or(true, |last| {
            (p.x - last.x).abs() > MIN_SPACING_MM || (p.y - last.y).abs() > MIN_SPACING_MM
        });
        if keep {
            points.push(p);
        }
    }
    let mut points: Vec<Vec2> = Vec::new();
    for seg in path.segments() {
        let len_mm = seg.length() * scale;
        let n = ((len_mm * POINTS_PER_MM).ceil() as usize).max(1);
        if points.is_empty() {
            push(&mut points, seg.start() * scale);
        }
        for i in 1..=n {
            push(&mut points, seg.point_at(i as f32 / n as f32) * scale);
        }
    }
    if path.closed && points.len() > 2 {
        if let (Some(first), Some(last)) = (points.first().copied(), points.last().copied()) {
            if (first.x - last.x).abs() <= MIN_SPACING_MM && (first.y - last.y).abs() <= MIN_SPACING_MM {
                points.pop();
            }
        }
    }
    Polyline {
        points,
        closed: path.closed,
    }
}

/// Serialize polylines; entries with fewer than two points are skipped.
pub fn write(polylines: &[Polyline]) -> Result<String, BlobError> {
    let mut drawing = Drawing::new();
    drawing.header.version = AcadVersion::R2010;
    drawing.header.default_drawing_units = Units::Millimeters;
    for pl in polylines.iter().filter(|p| p.points.len() > 1) {
        let mut poly = LwPolyline::default();
        poly.vertices = pl
            .points
            .iter()
            .map(|p| LwPolylineVertex {
                x: f64::from(p.x),
                y: f64::from(p.y),
                ..Default::default()
            })
            .collect();
        poly.set_is_closed(pl.closed);
        drawing.add_entity(Entity::new(EntityType::LwPolyline(poly)));
    }
    let mut bytes: Vec<u8> = Vec::new();
    drawing
        .save(&mut bytes)
        .map_err(|e| BlobError::Export(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| BlobError::Export(e.to_string()))
}

/// Outlines and cutouts of one layer; pixel units map to mm through the grid.
pub fn from_geometry(g: &BlobGeometry) -> Result<String, BlobError> {
    let scale = g.mm_per_unit / g.grid_size;
    let polylines: Vec<Polyline> = g.all_paths().map(|p| sample_path(p, scale)).collect();
    write(&polylines)
}

/// Convert an SVG document. User units scale by `width_mm / viewBox width`;
/// without both attributes user units are taken as millimetres.
pub fn from_svg_document(text: &str) -> Result<String, BlobError> {
    let doc = svg::parse_document(text)?;
    let scale = match (doc.width, doc.view_box) {
        (Some(w), Some([_, _, vw, _])) if w > 0.0 => w / vw,
        _ => 1.0,
    };
    let polylines: Vec<Polyline> = doc
        .paths
        .iter()
        .flatten()
        .map(|p| sample_path(p, scale))
        .collect();
    write(&polylines)
}
