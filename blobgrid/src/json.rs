//! Document form: engine settings plus an ordered list of layers.
//!
//! ```json
//! { "gridSize": 50, "borderWidth": 2, "mmPerUnit": 1,
//!   "layers": [ { "id": "l1",
//!                 "groups": [ { "id": "g1", "points": ["5,5", "6,5"] } ],
//!                 "modifications": { "5,5": { "quadrantOverrides": { "0": "empty" } } } } ] }
//! ```

use crate::config::BlobConfig;
use crate::error::BlobError;
use crate::model::Layer;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Envelope {
    #[serde(flatten)]
    config: BlobConfig,
    #[serde(default)]
    layers: Vec<Value>,
}

/// A parsed document. Layers parse independently so one malformed layer
/// does not hide the others.
#[derive(Debug)]
pub struct BlobDocument {
    pub config: BlobConfig,
    pub layers: Vec<Result<Layer, BlobError>>,
}

impl BlobDocument {
    /// Layers that parsed and validated.
    pub fn valid_layers(&self) -> Vec<Layer> {
        self.layers
            .iter()
            .filter_map(|l| l.as_ref().ok().cloned())
            .collect()
    }
}

pub fn parse_layer(v: Value) -> Result<Layer, BlobError> {
    let layer: Layer = serde_json::from_value(v)?;
    layer.validate()?;
    Ok(layer)
}

pub fn from_value(v: Value) -> Result<BlobDocument, BlobError> {
    if !v.is_object() {
        return Err(BlobError::InvalidDocument("expected an object".into()));
    }
    let env: Envelope = serde_json::from_value(v)?;
    env.config.validate()?;
    let layers = env
        .layers
        .into_iter()
        .enumerate()
        .map(|(i, v)| {
            parse_layer(v).inspect_err(|e| warn!(index = i, code = e.code(), "layer rejected"))
        })
        .collect();
    Ok(BlobDocument {
        config: env.config,
        layers,
    })
}

pub fn parse_document(text: &str) -> Result<BlobDocument, BlobError> {
    let v: Value = serde_json::from_str(text)?;
    from_value(v)
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct EnvelopeOut<'a> {
    #[serde(flatten)]
    config: &'a BlobConfig,
    layers: &'a [Layer],
}

pub fn to_value(config: &BlobConfig, layers: &[Layer]) -> Result<Value, BlobError> {
    Ok(serde_json::to_value(EnvelopeOut { config, layers })?)
}
