//! Canvas2D-style rendering through a minimal drawing trait.

use crate::geometry::path::{BlobPath, PathCommand};
use crate::BlobGeometry;
use serde::{Deserialize, Serialize};

/// The subset of `CanvasRenderingContext2D` the renderer drives.
pub trait DrawSurface {
    fn save(&mut self);
    fn restore(&mut self);
    /// Affine `[a, b, c, d, e, f]` as in `setTransform`.
    fn set_transform(&mut self, m: [f64; 6]);
    fn begin_path(&mut self);
    fn move_to(&mut self, x: f64, y: f64);
    fn line_to(&mut self, x: f64, y: f64);
    fn bezier_curve_to(&mut self, c1x: f64, c1y: f64, c2x: f64, c2y: f64, x: f64, y: f64);
    fn close_path(&mut self);
    fn set_fill_style(&mut self, style: &str);
    fn set_stroke_style(&mut self, style: &str);
    fn set_line_width(&mut self, w: f64);
    /// Fill the current path with the even-odd rule.
    fn fill_even_odd(&mut self);
    fn stroke(&mut self);
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Viewport {
    pub pan_x: f64,
    pub pan_y: f64,
    pub zoom: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Viewport {
            pan_x: 0.0,
            pan_y: 0.0,
            zoom: 1.0,
        }
    }
}

impl Viewport {
    pub fn transform(&self) -> [f64; 6] {
        [self.zoom, 0.0, 0.0, self.zoom, self.pan_x, self.pan_y]
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PathStyle {
    pub fill: Option<String>,
    pub stroke: Option<String>,
    /// Screen pixels; divided by zoom so strokes keep their width.
    pub line_width: f64,
}

impl Default for PathStyle {
    fn default() -> Self {
        PathStyle {
            fill: Some("#000000".to_string()),
            stroke: None,
            line_width: 1.0,
        }
    }
}

fn trace_path<S: DrawSurface + ?Sized>(s: &mut S, path: &BlobPath) {
    for cmd in &path.commands {
        match *cmd {
            PathCommand::MoveTo { to } => s.move_to(to.x as f64, to.y as f64),
            PathCommand::LineTo { to } => s.line_to(to.x as f64, to.y as f64),
            PathCommand::CubicTo { c1, c2, to } => s.bezier_curve_to(
                c1.x as f64,
                c1.y as f64,
                c2.x as f64,
                c2.y as f64,
                to.x as f64,
                to.y as f64,
            ),
            PathCommand::Close => s.close_path(),
        }
    }
}

/// Draw every outline and cutout of `g` as one compound path.
pub fn render_canvas<S: DrawSurface + ?Sized>(s: &mut S, g: &BlobGeometry, vp: &Viewport, style: &PathStyle) {
    s.save();
    s.set_transform(vp.transform());
    s.begin_path();
    for p in &g.paths {
        trace_path(s, p);
    }
    for c in &g.cutouts {
        trace_path(s, &c.path);
    }
    if let Some(fill) = &style.fill {
        s.set_fill_style(fill);
        s.fill_even_odd();
    }
    if let Some(stroke) = &style.stroke {
        s.set_stroke_style(stroke);
        s.set_line_width(if vp.zoom > 0.0 { style.line_width / vp.zoom } else { style.line_width });
        s.stroke();
    }
    s.restore();
}

/// One recorded drawing call.
#[derive(Clone, Debug, PartialEq)]
pub enum DrawCall {
    Save,
    Restore,
    SetTransform([f64; 6]),
    BeginPath,
    MoveTo(f64, f64),
    LineTo(f64, f64),
    BezierCurveTo([f64; 6]),
    ClosePath,
    FillStyle(String),
    StrokeStyle(String),
    LineWidth(f64),
    FillEvenOdd,
    Stroke,
}

/// Surface that records calls, for tests and headless comparisons.
#[derive(Clone, Debug, Default)]
pub struct RecordingSurface {
    pub calls: Vec<DrawCall>,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self, pred: impl Fn(&DrawCall) -> bool) -> usize {
        self.calls.iter().filter(|c| pred(c)).count()
    }
}

impl DrawSurface for RecordingSurface {
    fn save(&mut self) {
        self.calls.push(DrawCall::Save);
    }
    fn restore(&mut self) {
        self.calls.push(DrawCall::Restore);
    }
    fn set_transform(&mut self, m: [f64; 6]) {
        self.calls.push(DrawCall::SetTransform(m));
    }
    fn begin_path(&mut self) {
        self.calls.push(DrawCall::BeginPath);
    }
    fn move_to(&mut self, x: f64, y: f64) {
        self.calls.push(DrawCall::MoveTo(x, y));
    }
    fn line_to(&mut self, x: f64, y: f64) {
        self.calls.push(DrawCall::LineTo(x, y));
    }
    fn bezier_curve_to(&mut self, c1x: f64, c1y: f64, c2x: f64, c2y: f64, x: f64, y: f64) {
        self.calls
            .push(DrawCall::BezierCurveTo([c1x, c1y, c2x, c2y, x, y]));
    }
    fn close_path(&mut self) {
        self.calls.push(DrawCall::ClosePath);
    }
    fn set_fill_style(&mut self, style: &str) {
        self.calls.push(DrawCall::FillStyle(style.to_string()));
    }
    fn set_stroke_style(&mut self, style: &str) {
        self.calls.push(DrawCall::StrokeStyle(style.to_string()));
    }
    fn set_line_width(&mut self, w: f64) {
        self.calls.push(DrawCall::LineWidth(w));
    }
    fn fill_even_odd(&mut self) {
        self.calls.push(DrawCall::FillEvenOdd);
    }
    fn stroke(&mut self) {
        self.calls.push(DrawCall::Stroke);
    }
}
