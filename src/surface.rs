use blobgrid::canvas::DrawSurface;
use web_sys::{CanvasRenderingContext2d, CanvasWindingRule};

/// `DrawSurface` over a browser 2D context.
pub struct CanvasSurface<'a> { ctx: &'a CanvasRenderingContext2d }

impl<'a> CanvasSurface<'a> {
    pub fn new(ctx: &'a CanvasRenderingContext2d) -> Self { CanvasSurface { ctx } }
}

impl DrawSurface for CanvasSurface<'_> {
    fn save(&mut self) { self.ctx.save(); }
    fn restore(&mut self) { self.ctx.restore(); }
    fn set_transform(&mut self, m: [f64; 6]) {
        // Only fails for non-finite entries, which Viewport validation excludes.
        let _ = self.ctx.set_transform(m[0], m[1], m[2], m[3], m[4], m[5]);
    }
    fn begin_path(&mut self) { self.ctx.begin_path(); }
    fn move_to(&mut self, x: f64, y: f64) { self.ctx.move_to(x, y); }
    fn line_to(&mut self, x: f64, y: f64) { self.ctx.line_to(x, y); }
    fn bezier_curve_to(&mut self, c1x: f64, c1y: f64, c2x: f64, c2y: f64, x: f64, y: f64) {
        self.ctx.bezier_curve_to(c1x, c1y, c2x, c2y, x, y);
    }
    fn close_path(&mut self) { self.ctx.close_path(); }
    fn set_fill_style(&mut self, style: &str) { self.ctx.set_fill_style_str(style); }
    fn set_stroke_style(&mut self, style: &str) { self.ctx.set_stroke_style_str(style); }
    fn set_line_width(&mut self, w: f64) { self.ctx.set_line_width(w); }
    fn fill_even_odd(&mut self) { self.ctx.fill_with_canvas_winding_rule(CanvasWindingRule::Evenodd); }
    fn stroke(&mut self) { self.ctx.stroke(); }
}
