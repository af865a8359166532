use crate::error::BlobError;
use crate::geometry::limits;
use crate::geometry::path::{BlobPath, BoundingBox, PathKind};
use crate::model::Vec2;
use crate::BlobGeometry;
use serde::{Deserialize, Serialize};

/// Padding around the content box, grid units.
pub const VIEWBOX_PADDING: f32 = 1.0;
/// Extra margin per side for previews, as a fraction of the padded box.
pub const PREVIEW_MARGIN: f32 = 0.2;

/// Fixed-point number without trailing zeros.
pub fn fmt_num(v: f32) -> String {
    let s = format!("{:.3}", v);
    let s = s.trim_end_matches('0').trim_end_matches('.');
    if s == "-0" || s.is_empty() {
        "0".to_string()
    } else {
        s.to_string()
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SvgStyle {
    pub fill: String,
    pub stroke: Option<String>,
    /// Grid units.
    pub stroke_width: f32,
}

impl Default for SvgStyle {
    fn default() -> Self {
        SvgStyle {
            fill: "#000000".to_string(),
            stroke: None,
            stroke_width: 0.05,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SvgOptions {
    pub style: SvgStyle,
    pub preview_margin: bool,
    pub include_cutouts: bool,
}

impl Default for SvgOptions {
    fn default() -> Self {
        SvgOptions {
            style: SvgStyle::default(),
            preview_margin: false,
            include_cutouts: true,
        }
    }
}

/// `[min_x, min_y, width, height]` in grid units.
pub fn view_box(geoms: &[&BlobGeometry], preview_margin: bool) -> [f32; 4] {
    let content = geoms.iter().fold(None::<BoundingBox>, |acc, g| {
        match (acc, g.bounding_box.map(|b| b.scaled(1.0 / g.grid_size))) {
            (Some(a), Some(b)) => Some(a.union(b)),
            (a, b) => a.or(b),
        }
    });
    let Some(bb) = content else {
        return [0.0, 0.0, 0.0, 0.0];
    };
    let mut bb = bb.expanded(VIEWBOX_PADDING);
    if preview_margin {
        bb = BoundingBox {
            min_x: bb.min_x - bb.width() * PREVIEW_MARGIN,
            min_y: bb.min_y - bb.height() * PREVIEW_MARGIN,
            max_x: bb.max_x + bb.width() * PREVIEW_MARGIN,
            max_y: bb.max_y + bb.height() * PREVIEW_MARGIN,
        };
    }
    [bb.min_x, bb.min_y, bb.width(), bb.height()]
}

/// Combined path data of one layer in grid units; holes ride along so the
/// even-odd rule punches them.
pub fn layer_path_data(g: &BlobGeometry, include_cutouts: bool) -> String {
    let scale = 1.0 / g.grid_size;
    let mut parts: Vec<String> = g.paths.iter().map(|p| p.to_svg_d(scale)).collect();
    if include_cutouts {
        parts.extend(g.cutouts.iter().map(|c| c.path.to_svg_d(scale)));
    }
    parts.retain(|s| !s.is_empty());
    parts.join(" ")
}

/// One `<svg>` document for a single layer.
pub fn render(g: &BlobGeometry, opts: &SvgOptions) -> String {
    write_document(&[g], g.mm_per_unit, opts)
}

/// One `<svg>` document for a selection of layers, sized in millimetres.
///
/// Every layer must share one `mm_per_unit`; the document has a single
/// physical size.
pub fn render_selection(geoms: &[&BlobGeometry], opts: &SvgOptions) -> Result<String, BlobError> {
    let mm_per_unit = geoms.first().map_or(1.0, |g| g.mm_per_unit);
    if let Some(g) = geoms.iter().find(|g| g.mm_per_unit != mm_per_unit) {
        return Err(BlobError::MixedUnits {
            first: mm_per_unit as f64,
            got: g.mm_per_unit as f64,
        });
    }
    Ok(write_document(geoms, mm_per_unit, opts))
}

fn write_document(geoms: &[&BlobGeometry], mm_per_unit: f32, opts: &SvgOptions) -> String {
    let [x, y, w, h] = view_box(geoms, opts.preview_margin);
    let mut out = String::new();
    out.push_str(&format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{}mm\" height=\"{}mm\" viewBox=\"{} {} {} {}\">\n",
        fmt_num(w * mm_per_unit),
        fmt_num(h * mm_per_unit),
        fmt_num(x),
        fmt_num(y),
        fmt_num(w),
        fmt_num(h)
    ));
    let stroke = match &opts.style.stroke {
        Some(s) => format!(
            " stroke=\"{}\" stroke-width=\"{}\"",
            escape_attr(s),
            fmt_num(opts.style.stroke_width)
        ),
        None => " stroke=\"none\"".to_string(),
    };
    for g in geoms {
        let d = layer_path_data(g, opts.include_cutouts);
        if d.is_empty() {
            continue;
        }
        out.push_str(&format!(
            "  <path id=\"{}\" d=\"{}\" fill=\"{}\" fill-rule=\"evenodd\"{}/>\n",
            escape_attr(&g.layer_id),
            d,
            escape_attr(&opts.style.fill),
            stroke
        ));
    }
    out.push_str("</svg>\n");
    out
}

fn escape_attr(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Parse M/L/C/Z path data (absolute and relative) into sub-paths.
pub fn parse_path_data(d: &str) -> Result<Vec<BlobPath>, BlobError> {
    if d.len() > limits::MAX_SVG_BYTES {
        return Err(BlobError::InvalidSvg("path data too large".into()));
    }
    let bytes = d.as_bytes();
    let mut i = 0usize;
    let mut cur = Vec2::ZERO;
    let mut start_sub = Vec2::ZERO;
    let mut last_cmd: Option<u8> = None;
    let mut cmd_count = 0usize;
    let mut paths: Vec<BlobPath> = Vec::new();

    fn skip_ws(bytes: &[u8], i: &mut usize) {
        while *i < bytes.len() {
            let c = bytes[*i];
            if c == b' ' || c == b'\n' || c == b'\r' || c == b'\t' || c == b',' {
                *i += 1;
            } else {
                break;
            }
        }
    }
    fn parse_num(bytes: &[u8], i: &mut usize) -> Result<f32, BlobError> {
        skip_ws(bytes, i);
        let start = *i;
        let mut seen_dot = false;
        while *i < bytes.len() {
            let c = bytes[*i];
            let sign_ok = (c == b'-' || c == b'+')
                && (*i == start || matches!(bytes[*i - 1], b'e' | b'E'));
            if c.is_ascii_digit() || sign_ok || c == b'e' || c == b'E' || (c == b'.' && !seen_dot) {
                seen_dot |= c == b'.';
                *i += 1;
            } else {
                break;
            }
        }
        let s = std::str::from_utf8(&bytes[start..*i]).map_err(|_| BlobError::InvalidSvg("bad number".into()))?;
        let v: f32 = s
            .parse()
            .map_err(|_| BlobError::InvalidSvg(format!("bad number '{}'", s)))?;
        if !v.is_finite() {
            return Err(BlobError::InvalidSvg(format!("non-finite number '{}'", s)));
        }
        Ok(v)
    }
    fn point(bytes: &[u8], i: &mut usize, rel: bool, cur: Vec2) -> Result<Vec2, BlobError> {
        let x = parse_num(bytes, i)?;
        let y = parse_num(bytes, i)?;
        Ok(if rel { cur + Vec2::new(x, y) } else { Vec2::new(x, y) })
    }
    fn current(paths: &mut [BlobPath]) -> Result<&mut BlobPath, BlobError> {
        paths
            .last_mut()
            .ok_or_else(|| BlobError::InvalidSvg("path data must start with M".into()))
    }

    loop {
        skip_ws(bytes, &mut i);
        if i >= bytes.len() {
            break;
        }
        let c = bytes[i];
        let cmd = if c.is_ascii_alphabetic() {
            i += 1;
            c
        } else {
            match last_cmd {
                // Coordinates after a move continue as line-tos.
                Some(b'M') => b'L',
                Some(b'm') => b'l',
                Some(prev) if prev != b'Z' && prev != b'z' => prev,
                _ => return Err(BlobError::InvalidSvg(format!("unexpected '{}'", c as char))),
            }
        };
        cmd_count += 1;
        if cmd_count > limits::MAX_SVG_COMMANDS {
            return Err(BlobError::InvalidSvg("too many commands".into()));
        }
        let rel = cmd.is_ascii_lowercase();
        match cmd {
            b'M' | b'm' => {
                cur = point(bytes, &mut i, rel, cur)?;
                start_sub = cur;
                let mut p = BlobPath::new(PathKind::Outline);
                p.move_to(cur);
                paths.push(p);
            }
            b'L' | b'l' => {
                cur = point(bytes, &mut i, rel, cur)?;
                current(&mut paths)?.line_to(cur);
            }
            b'C' | b'c' => {
                let c1 = point(bytes, &mut i, rel, cur)?;
                let c2 = point(bytes, &mut i, rel, cur)?;
                let to = point(bytes, &mut i, rel, cur)?;
                current(&mut paths)?.cubic_to(c1, c2, to);
                cur = to;
            }
            b'Z' | b'z' => {
                current(&mut paths)?.close();
                cur = start_sub;
            }
            other => {
                return Err(BlobError::InvalidSvg(format!("unsupported command '{}'", other as char)));
            }
        }
        last_cmd = Some(cmd);
    }
    Ok(paths)
}

/// The parts of an SVG document the DXF exporter needs.
#[derive(Clone, Debug, PartialEq)]
pub struct SvgDocument {
    pub width: Option<f32>,
    pub height: Option<f32>,
    pub view_box: Option<[f32; 4]>,
    /// One entry per `<path>` element, each with its sub-paths.
    pub paths: Vec<Vec<BlobPath>>,
}

fn attr<'a>(tag: &'a str, name: &str) -> Option<&'a str> {
    let mut from = 0;
    while let Some(pos) = tag[from..].find(name) {
        let at = from + pos;
        from = at + name.len();
        let before_ok = at == 0 || tag.as_bytes()[at - 1].is_ascii_whitespace();
        let rest = tag[from..].trim_start();
        if !before_ok || !rest.starts_with('=') {
            continue;
        }
        let rest = rest[1..].trim_start();
        let quote = rest.chars().next()?;
        if quote != '"' && quote != '\'' {
            return None;
        }
        let body = &rest[1..];
        return body.find(quote).map(|end| &body[..end]);
    }
    None
}

// Length attribute in millimetres or bare user units.
fn parse_length(v: &str) -> Result<f32, BlobError> {
    let t = v.trim();
    let t = t.strip_suffix("mm").unwrap_or(t).trim();
    t.parse::<f32>()
        .ok()
        .filter(|x| x.is_finite() && *x >= 0.0)
        .ok_or_else(|| BlobError::InvalidSvg(format!("bad length '{}'", v)))
}

fn tags<'a>(text: &'a str, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
    let open = format!("<{}", name);
    let mut from = 0;
    std::iter::from_fn(move || loop {
        let pos = text[from..].find(&open)?;
        let start = from + pos;
        let after = start + open.len();
        let end = text[after..].find('>').map(|e| after + e)?;
        from = end + 1;
        let boundary = text[after..].chars().next().map_or(false, |c| c.is_whitespace() || c == '/' || c == '>');
        if boundary {
            return Some(&text[after..end]);
        }
    })
}

pub fn parse_document(text: &str) -> Result<SvgDocument, BlobError> {
    if text.len() > limits::MAX_SVG_BYTES {
        return Err(BlobError::InvalidSvg("document too large".into()));
    }
    let root = tags(text, "svg")
        .next()
        .ok_or_else(|| BlobError::InvalidSvg("missing <svg> element".into()))?;
    let width = attr(root, "width").map(parse_length).transpose()?;
    let height = attr(root, "height").map(parse_length).transpose()?;
    let view_box = match attr(root, "viewBox") {
        Some(v) => {
            let nums: Vec<f32> = v
                .split(|c: char| c.is_whitespace() || c == ',')
                .filter(|s| !s.is_empty())
                .map(|s| s.parse::<f32>())
                .collect::<Result<_, _>>()
                .map_err(|_| BlobError::InvalidSvg(format!("bad viewBox '{}'", v)))?;
            match nums.as_slice() {
                [x, y, w, h] if *w > 0.0 && *h > 0.0 => Some([*x, *y, *w, *h]),
                _ => return Err(BlobError::InvalidSvg(format!("bad viewBox '{}'", v))),
            }
        }
        None => None,
    };
    let mut paths = Vec::new();
    for tag in tags(text, "path") {
        if let Some(d) = attr(tag, "d") {
            paths.push(parse_path_data(d)?);
        }
    }
    Ok(SvgDocument {
        width,
        height,
        view_box,
        paths,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::path::PathCommand;

    #[test]
    fn numbers_are_trimmed() {
        assert_eq!(fmt_num(1.0), "1");
        assert_eq!(fmt_num(0.5), "0.5");
        assert_eq!(fmt_num(-0.0001), "0");
        assert_eq!(fmt_num(12.3456), "12.346");
    }

    #[test]
    fn parses_absolute_and_relative_commands() {
        let paths = parse_path_data("M 0 0 L 1 0 l 0 1 C 1 1.5, 0.5 2, 0 2 Z m 5 5 1 0 0 1 z").unwrap();
        assert_eq!(paths.len(), 2);
        assert!(paths[0].closed && paths[1].closed);
        assert_eq!(paths[0].commands[2], PathCommand::LineTo { to: Vec2::new(1.0, 1.0) });
        // Relative move starts from the closed sub-path's start point.
        assert_eq!(paths[1].commands[0], PathCommand::MoveTo { to: Vec2::new(5.0, 5.0) });
        assert_eq!(paths[1].commands[2], PathCommand::LineTo { to: Vec2::new(6.0, 6.0) });
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse_path_data("L 1 1").is_err());
        assert!(parse_path_data("M 0 0 Q 1 1 2 2").is_err());
        assert!(parse_path_data("M 0 zz").is_err());
    }

    #[test]
    fn reads_document_attributes() {
        let doc = parse_document(
            r##"<?xml version="1.0"?><svg xmlns="http://www.w3.org/2000/svg" width="12mm" height="8" viewBox="-1 -1 6 4">
            <path id="a" d="M0 0L1 0L1 1Z" fill="#000"/><path d='M 2 2 L 3 3'/></svg>"##,
        )
        .unwrap();
        assert_eq!(doc.width, Some(12.0));
        assert_eq!(doc.height, Some(8.0));
        assert_eq!(doc.view_box, Some([-1.0, -1.0, 6.0, 4.0]));
        assert_eq!(doc.paths.len(), 2);
        assert!(!doc.paths[1][0].closed);
    }

    #[test]
    fn selection_needs_one_physical_unit() {
        use crate::model::{GridPoint, Layer};
        use crate::{compute_geometry, BlobConfig};
        let layer = Layer::with_points("l", [GridPoint::new(0, 0)]);
        let a = compute_geometry(&layer, &BlobConfig::default()).unwrap();
        let b = compute_geometry(&layer, &BlobConfig::default().with_mm_per_unit(2.0)).unwrap();
        let e = render_selection(&[&a, &b], &SvgOptions::default()).unwrap_err();
        assert_eq!(e, BlobError::MixedUnits { first: 1.0, got: 2.0 });
        assert_eq!(e.code(), "mixed_units");
        let same = render_selection(&[&a, &a], &SvgOptions::default()).unwrap();
        assert_eq!(same.matches("<path").count(), 2);
    }
}
