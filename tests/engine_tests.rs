use blobgrid_wasm::{parse_document_res, svg_to_dxf_res, Engine};
use js_sys::{Array, Reflect, JSON};
use wasm_bindgen::JsValue;
use wasm_bindgen_test::*;

wasm_bindgen_test_configure!(run_in_browser);

fn is_ok(v: &JsValue) -> bool { Reflect::get(v, &JsValue::from_str("ok")).ok().and_then(|x| x.as_bool()).unwrap_or(false) }
fn value(v: &JsValue) -> JsValue { Reflect::get(v, &JsValue::from_str("value")).unwrap() }
fn get(v: &JsValue, k: &str) -> JsValue { Reflect::get(v, &JsValue::from_str(k)).unwrap() }
fn js(text: &str) -> JsValue { JSON::parse(text).unwrap() }

const PAIR: &str = r#"{ "id": "pair", "groups": [ { "id": "g", "points": ["0,0", "1,0"] } ] }"#;

#[wasm_bindgen_test]
fn geometry_round_trips_as_plain_objects() {
    let mut e = Engine::new();
    let r = e.geometry_res(js(PAIR));
    assert!(is_ok(&r));
    let g = value(&r);
    assert_eq!(get(&g, "layerId").as_string().as_deref(), Some("pair"));
    let paths: Array = get(&g, "paths").into();
    assert_eq!(paths.length(), 1);
    // Serializable with JSON.stringify (no Maps).
    let s = JSON::stringify(&g).unwrap().as_string().unwrap();
    assert!(s.contains("\"closed\":true"));
}

#[wasm_bindgen_test]
fn second_call_hits_the_cache() {
    let mut e = Engine::new();
    assert!(is_ok(&e.geometry_res(js(PAIR))));
    assert!(is_ok(&e.geometry_res(js(PAIR))));
    let stats = e.cache_stats();
    assert_eq!(get(&stats, "hits").as_f64(), Some(1.0));
    assert_eq!(get(&stats, "misses").as_f64(), Some(1.0));
    assert!(is_ok(&e.cached_geometry("pair")));
    e.clear_cache();
    assert!(!is_ok(&e.cached_geometry("pair")));
}

#[wasm_bindgen_test]
fn svg_and_dxf_exports() {
    let mut e = Engine::new();
    let r = e.svg_res(js(PAIR), JsValue::UNDEFINED);
    assert!(is_ok(&r));
    let svg = value(&r).as_string().unwrap();
    assert!(svg.contains("fill-rule=\"evenodd\""));
    let d = svg_to_dxf_res(&svg);
    assert!(is_ok(&d));
    assert!(value(&d).as_string().unwrap().contains("LWPOLYLINE"));
    let d2 = e.dxf_res(js(PAIR));
    assert!(value(&d2).as_string().unwrap().trim_end().ends_with("EOF"));
}

#[wasm_bindgen_test]
fn trace_exposes_counts() {
    let e = Engine::new();
    let r = e.trace_res(js(PAIR));
    assert!(is_ok(&r));
    let counts = get(&value(&r), "counts");
    assert_eq!(get(&counts, "paths").as_f64(), Some(1.0));
    let defects: Array = get(&value(&r), "defects").into();
    assert_eq!(defects.length(), 0);
}

#[wasm_bindgen_test]
fn config_changes_apply() {
    let mut e = Engine::new();
    let r = e.set_config_res(js(r#"{ "gridSize": 20, "borderWidth": 1 }"#));
    assert!(is_ok(&r));
    assert_eq!(get(&e.config(), "gridSize").as_f64(), Some(20.0));
    let g = value(&e.geometry_res(js(PAIR)));
    assert_eq!(get(&g, "gridSize").as_f64(), Some(20.0));
}

#[wasm_bindgen_test]
fn documents_parse_per_layer() {
    let doc = r#"{ "gridSize": 30, "layers": [
        { "id": "a", "groups": [ { "id": "g", "points": ["1,1"] } ] },
        { "id": "b", "groups": [ { "id": "g", "points": ["x,1"] } ] } ] }"#;
    let r = parse_document_res(doc);
    assert!(is_ok(&r));
    let layers: Array = get(&value(&r), "layers").into();
    assert_eq!(layers.length(), 2);
    assert!(is_ok(&layers.get(0)));
    assert!(!is_ok(&layers.get(1)));
}

#[wasm_bindgen_test]
fn exported_document_parses_back() {
    let e = Engine::new();
    let layers = js(&format!("[{}]", PAIR));
    let r = e.export_document_res(layers);
    assert!(is_ok(&r));
    let text = value(&r).as_string().unwrap();
    let doc = parse_document_res(&text);
    assert!(is_ok(&doc));
    let parsed: Array = get(&value(&doc), "layers").into();
    assert_eq!(parsed.length(), 1);
    assert!(is_ok(&parsed.get(0)));
}

#[wasm_bindgen_test]
fn invalidate_drops_one_layer() {
    let mut e = Engine::new();
    assert!(is_ok(&e.geometry_res(js(PAIR))));
    assert!(e.invalidate_layer("pair"));
    assert!(!e.invalidate_layer("pair"));
    assert!(!is_ok(&e.cached_geometry("pair")));
}
