use crate::interop::{new_obj, set_kv};
use blobgrid::BlobError;
use js_sys::Object;
use wasm_bindgen::prelude::*;

pub fn ok(v: JsValue) -> JsValue {
    let o = new_obj();
    set_kv(&o, "ok", &JsValue::from_bool(true));
    set_kv(&o, "value", &v);
    o.into()
}

pub fn err(code: &'static str, message: impl Into<String>, data: Option<JsValue>) -> JsValue {
    let root = new_obj();
    set_kv(&root, "ok", &JsValue::from_bool(false));
    let e = new_obj();
    set_kv(&e, "code", &JsValue::from_str(code));
    set_kv(&e, "message", &JsValue::from_str(&message.into()));
    if let Some(d) = data { set_kv(&e, "data", &d); }
    set_kv(&root, "error", &e.into());
    root.into()
}

/// Input the JS side handed over could not be decoded.
#[inline]
pub fn invalid_input(what: &str, detail: String) -> JsValue {
    let d = new_obj();
    set_kv(&d, "input", &JsValue::from_str(what));
    err("invalid_document", format!("invalid {}: {}", what, detail), Some(d.into()))
}

#[inline]
pub fn serialize_failed(detail: JsValue) -> JsValue {
    err("serialize_failed", "could not convert result to JS", Some(detail))
}

fn num(o: &Object, k: &str, v: f64) { set_kv(o, k, &JsValue::from_f64(v)); }
fn text(o: &Object, k: &str, v: &str) { set_kv(o, k, &JsValue::from_str(v)); }

/// Result object for an engine error; `data` carries the variant's fields.
pub fn from_blob(e: &BlobError) -> JsValue {
    let d = new_obj();
    match e {
        BlobError::NonFinite { param } => text(&d, "param", param),
        BlobError::OutOfRange { param, min, max, got } => {
            text(&d, "param", param);
            num(&d, "min", *min);
            num(&d, "max", *max);
            num(&d, "got", *got);
        }
        BlobError::InvalidPointKey { key } => text(&d, "key", key),
        BlobError::InvalidOverride { point, quadrant, state } => {
            text(&d, "point", point);
            num(&d, "quadrant", *quadrant as f64);
            text(&d, "state", state);
        }
        BlobError::NegativeDiameter { point, got } => {
            text(&d, "point", point);
            num(&d, "got", *got);
        }
        BlobError::TooManyPoints { layer, count, limit } => {
            text(&d, "layer", layer);
            num(&d, "count", *count as f64);
            num(&d, "limit", *limit as f64);
        }
        BlobError::MixedUnits { first, got } => {
            num(&d, "first", *first);
            num(&d, "got", *got);
        }
        BlobError::InvalidDocument(_) | BlobError::InvalidSvg(_) | BlobError::Export(_) => {
            return err(e.code(), e.to_string(), None);
        }
    }
    err(e.code(), e.to_string(), Some(d.into()))
}

pub fn result<T>(r: Result<T, BlobError>, f: impl FnOnce(T) -> Result<JsValue, JsValue>) -> JsValue {
    match r {
        Ok(v) => match f(v) {
            Ok(js) => ok(js),
            Err(detail) => serialize_failed(detail),
        },
        Err(e) => {
            web_sys::console::warn_1(&JsValue::from_str(&format!("blobgrid: {}", e)));
            from_blob(&e)
        }
    }
}
