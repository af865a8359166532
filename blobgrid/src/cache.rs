//! Content-addressed geometry memoization, one entry per layer.

use crate::config::BlobConfig;
use crate::error::BlobError;
use crate::model::{GridPoint, Layer, PointModification, PointSet};
use crate::BlobGeometry;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::trace;

#[derive(Serialize)]
struct KeyContent<'a> {
    groups: Vec<&'a PointSet>,
    modifications: &'a BTreeMap<GridPoint, PointModification>,
    config: &'a BlobConfig,
}

/// Serialized geometry-shaping content of `layer` under `cfg`. Group ids and
/// names do not shape geometry and are left out.
pub fn content_key(layer: &Layer, cfg: &BlobConfig) -> Result<String, BlobError> {
    let content = KeyContent {
        groups: layer.groups.iter().map(|g| &g.points).collect(),
        modifications: &layer.modifications,
        config: cfg,
    };
    Ok(serde_json::to_string(&content)?)
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
}

#[derive(Debug)]
struct CacheEntry {
    key: String,
    geometry: Arc<BlobGeometry>,
}

#[derive(Debug, Default)]
pub struct GeometryCache {
    entries: HashMap<String, CacheEntry>,
    hits: u64,
    misses: u64,
}

impl GeometryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached geometry for `layer`, computing and storing it on a miss. A new
    /// key replaces the layer's previous entry.
    pub fn get_or_compute<F>(&mut self, layer: &Layer, cfg: &BlobConfig, compute: F) -> Result<Arc<BlobGeometry>, BlobError>
    where
        F: FnOnce() -> Result<BlobGeometry, BlobError>,
    {
        let key = content_key(layer, cfg)?;
        if let Some(e) = self.entries.get(&layer.id) {
            if e.key == key {
                self.hits += 1;
                trace!(layer = %layer.id, "geometry cache hit");
                return Ok(Arc::clone(&e.geometry));
            }
        }
        self.misses += 1;
        trace!(layer = %layer.id, "geometry cache miss");
        let geometry = Arc::new(compute()?);
        self.entries.insert(
            layer.id.clone(),
            CacheEntry {
                key,
                geometry: Arc::clone(&geometry),
            },
        );
        Ok(geometry)
    }

    pub fn get(&self, layer_id: &str) -> Option<Arc<BlobGeometry>> {
        self.entries.get(layer_id).map(|e| Arc::clone(&e.geometry))
    }

    pub fn invalidate(&mut self, layer_id: &str) -> bool {
        self.entries.remove(layer_id).is_some()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.entries.len(),
            hits: self.hits,
            misses: self.misses,
        }
    }
}
