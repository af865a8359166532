use wasm_bindgen::prelude::*;
mod api;
mod error;
mod interop;
mod surface;

pub use api::{parse_document_res, set_panic_hook, svg_to_dxf_res};
pub use surface::CanvasSurface;

/// Blob engine handle: configuration plus the document's geometry cache.
#[wasm_bindgen]
pub struct Engine { pub(crate) inner: blobgrid::BlobEngine }

impl Engine {
    pub fn rs_new() -> Engine { Engine { inner: blobgrid::BlobEngine::default() } }
}
