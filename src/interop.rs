use js_sys::{Array, Object, Reflect};
use serde::de::DeserializeOwned;
use serde::Serialize;
use wasm_bindgen::JsValue;

pub fn new_obj() -> Object { Object::new() }
pub fn set_kv(obj: &Object, k: &str, v: &JsValue) {
    let _ = Reflect::set(obj, &JsValue::from_str(k), v);
}

/// Plain JS objects rather than `Map`s, so results survive `JSON.stringify`.
pub fn to_js<T: Serialize + ?Sized>(v: &T) -> Result<JsValue, JsValue> {
    v.serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .map_err(|e| JsValue::from_str(&e.to_string()))
}

pub fn from_js<T: DeserializeOwned>(v: JsValue) -> Result<T, String> {
    serde_wasm_bindgen::from_value(v).map_err(|e| e.to_string())
}

/// `undefined`/`null` means "use the default".
pub fn from_js_or_default<T: DeserializeOwned + Default>(v: JsValue) -> Result<T, String> {
    if v.is_undefined() || v.is_null() { Ok(T::default()) } else { from_js(v) }
}

pub fn array(items: impl IntoIterator<Item = JsValue>) -> Array {
    let arr = Array::new();
    for v in items { arr.push(&v); }
    arr
}
