//! Vector index contract.

use papersage_core::{Error, Result};

use crate::types::*;

/// Nearest-neighbour search over vectors with JSON payloads.
pub trait VectorIndex: Send + Sync {
    /// Names of all collections.
    fn list_collections(&self) -> Result<Vec<String>>;

    fn collection_exists(&self, name: &str) -> Result<bool>;

    /// Create a collection. Fails if it already exists.
    fn create_collection(&self, config: &CollectionConfig) -> Result<()>;

    /// Insert or replace points. Returns the number written.
    fn upsert(&self, collection: &str, points: Vec<Point>) -> Result<usize>;

    /// Up to `limit` points most similar to `vector`, best first.
    fn search(
        &self,
        collection: &str,
        vector: &[f32],
        limit: usize,
        params: &SearchParams,
    ) -> Result<Vec<ScoredPoint>>;

    fn collection_info(&self, collection: &str) -> Result<CollectionInfo>;

    /// Create the collection if absent. Returns true when it was created.
    ///
    /// An existing collection must match the requested dimension and distance.
    fn ensure_collection(&self, config: &CollectionConfig) -> Result<bool> {
        if !self.collection_exists(&config.name)? {
            self.create_collection(config)?;
            return Ok(true);
        }
        let info = self.collection_info(&config.name)?;
        if info.dimension != config.dimension || info.distance != config.distance {
            return Err(Error::Index(format!(
                "collection {} exists with dim={} distance={}, requested dim={} distance={}",
                config.name, info.dimension, info.distance, config.dimension, config.distance
            )));
        }
        Ok(false)
    }
}
