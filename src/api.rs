use crate::error;
use crate::interop::{array, from_js, from_js_or_default, new_obj, set_kv, to_js};
use crate::{CanvasSurface, Engine};
use blobgrid::canvas::{render_canvas, PathStyle, Viewport};
use blobgrid::svg::SvgOptions;
use blobgrid::{dxf, json, BlobConfig, Layer};
use wasm_bindgen::prelude::*;
use web_sys::CanvasRenderingContext2d;

#[wasm_bindgen]
pub fn set_panic_hook() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

fn decode_layer(v: JsValue) -> Result<Layer, JsValue> {
    from_js::<Layer>(v).map_err(|e| error::invalid_input("layer", e))
}

fn decode_layers(v: JsValue) -> Result<Vec<Layer>, JsValue> {
    from_js::<Vec<Layer>>(v).map_err(|e| error::invalid_input("layers", e))
}

fn decode_viewport(v: JsValue) -> Result<Viewport, JsValue> {
    let vp: Viewport = from_js_or_default(v).map_err(|e| error::invalid_input("viewport", e))?;
    for (name, x) in [("panX", vp.pan_x), ("panY", vp.pan_y), ("zoom", vp.zoom)] {
        if !x.is_finite() {
            let d = new_obj();
            set_kv(&d, "param", &JsValue::from_str(name));
            return Err(error::err("non_finite", format!("parameter '{}' must be finite", name), Some(d.into())));
        }
    }
    if vp.zoom <= 0.0 {
        let d = new_obj();
        set_kv(&d, "param", &JsValue::from_str("zoom"));
        set_kv(&d, "got", &JsValue::from_f64(vp.zoom));
        return Err(error::err("out_of_range", "parameter 'zoom' must be positive", Some(d.into())));
    }
    Ok(vp)
}

macro_rules! try_js {
    ($e:expr) => {
        match $e {
            Ok(v) => v,
            Err(js) => return js,
        }
    };
}

/// Convert an SVG document (as exported by `svg_res`) to DXF text.
#[wasm_bindgen]
pub fn svg_to_dxf_res(svg: &str) -> JsValue {
    error::result(dxf::from_svg_document(svg), |text| Ok(JsValue::from_str(&text)))
}

/// Parse a JSON document into `{ config, layers: [result, ...] }`; each layer
/// carries its own result object.
#[wasm_bindgen]
pub fn parse_document_res(text: &str) -> JsValue {
    error::result(json::parse_document(text), |doc| {
        let obj = new_obj();
        set_kv(&obj, "config", &to_js(&doc.config)?);
        let mut layers = Vec::with_capacity(doc.layers.len());
        for l in &doc.layers {
            layers.push(match l {
                Ok(layer) => error::ok(to_js(layer)?),
                Err(e) => error::from_blob(e),
            });
        }
        set_kv(&obj, "layers", &array(layers).into());
        Ok(obj.into())
    })
}

#[wasm_bindgen]
impl Engine {
    #[wasm_bindgen(constructor)]
    pub fn new() -> Engine {
        crate::Engine::rs_new()
    }

    pub fn config(&self) -> JsValue {
        to_js(self.inner.config()).unwrap_or(JsValue::NULL)
    }
    pub fn set_config_res(&mut self, config: JsValue) -> JsValue {
        let cfg: BlobConfig = try_js!(from_js_or_default(config).map_err(|e| error::invalid_input("config", e)));
        error::result(self.inner.set_config(cfg), |_| to_js(self.inner.config()))
    }

    // Geometry
    pub fn geometry_res(&mut self, layer: JsValue) -> JsValue {
        let layer = try_js!(decode_layer(layer));
        error::result(self.inner.geometry(&layer), |g| to_js(g.as_ref()))
    }
    /// One result object per layer; a failing layer does not affect the rest.
    pub fn layers_res(&mut self, layers: JsValue) -> JsValue {
        let layers = try_js!(decode_layers(layers));
        let out = self
            .inner
            .layers(&layers)
            .into_iter()
            .map(|r| error::result(r, |g| to_js(g.as_ref())));
        error::ok(array(out).into())
    }
    pub fn trace_res(&self, layer: JsValue) -> JsValue {
        let layer = try_js!(decode_layer(layer));
        error::result(self.inner.geometry_with_trace(&layer), |(_, trace)| to_js(&trace))
    }

    // Export
    pub fn svg_res(&mut self, layer: JsValue, options: JsValue) -> JsValue {
        let layer = try_js!(decode_layer(layer));
        let opts: SvgOptions = try_js!(from_js_or_default(options).map_err(|e| error::invalid_input("options", e)));
        error::result(self.inner.svg(&layer, &opts), |s| Ok(JsValue::from_str(&s)))
    }
    pub fn svg_selection_res(&mut self, layers: JsValue, options: JsValue) -> JsValue {
        let layers = try_js!(decode_layers(layers));
        let opts: SvgOptions = try_js!(from_js_or_default(options).map_err(|e| error::invalid_input("options", e)));
        error::result(self.inner.svg_selection(&layers, &opts), |s| Ok(JsValue::from_str(&s)))
    }
    pub fn dxf_res(&mut self, layer: JsValue) -> JsValue {
        let layer = try_js!(decode_layer(layer));
        error::result(self.inner.dxf(&layer), |s| Ok(JsValue::from_str(&s)))
    }

    // Canvas
    pub fn render_res(
        &mut self,
        ctx: &CanvasRenderingContext2d,
        layer: JsValue,
        viewport: JsValue,
        style: JsValue,
    ) -> JsValue {
        let layer = try_js!(decode_layer(layer));
        let vp = try_js!(decode_viewport(viewport));
        let style: PathStyle = try_js!(from_js_or_default(style).map_err(|e| error::invalid_input("style", e)));
        error::result(self.inner.geometry(&layer), |g| {
            render_canvas(&mut CanvasSurface::new(ctx), &g, &vp, &style);
            Ok(JsValue::from_f64(g.all_paths().count() as f64))
        })
    }

    // Cache
    pub fn cache_stats(&self) -> JsValue {
        to_js(&self.inner.cache().stats()).unwrap_or(JsValue::NULL)
    }
    pub fn cached_geometry(&self, layer_id: &str) -> JsValue {
        match self.inner.cache().get(layer_id) {
            Some(g) => error::ok(to_js(g.as_ref()).unwrap_or(JsValue::NULL)),
            None => {
                let d = new_obj();
                set_kv(&d, "layer", &JsValue::from_str(layer_id));
                error::err("not_cached", format!("no cached geometry for layer '{}'", layer_id), Some(d.into()))
            }
        }
    }
    pub fn invalidate_layer(&mut self, layer_id: &str) -> bool {
        self.inner.invalidate(layer_id)
    }
    pub fn clear_cache(&mut self) {
        self.inner.clear_cache();
    }

    /// Serialize the current config and `layers` as a JSON document that
    /// `parse_document_res` reads back.
    pub fn export_document_res(&self, layers: JsValue) -> JsValue {
        let layers = try_js!(decode_layers(layers));
        error::result(json::to_value(self.inner.config(), &layers), |v| {
            serde_json::to_string_pretty(&v)
                .map(|s| JsValue::from_str(&s))
                .map_err(|e| JsValue::from_str(&e.to_string()))
        })
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}
