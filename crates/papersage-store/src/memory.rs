//! Process-local vector index.

use std::collections::HashMap;

use papersage_core::{Error, Result};
use parking_lot::RwLock;
use tracing::debug;

use crate::collection::Collection;
use crate::index::VectorIndex;
use crate::types::*;

/// In-memory collections, lost when the process exits.
#[derive(Default)]
pub struct MemoryIndex {
    collections: RwLock<HashMap<String, Collection>>,
}

impl MemoryIndex {
    pub fn new() -> Self {
        Self::default()
    }
}

fn missing(name: &str) -> Error {
    Error::NotFound(format!("collection {}", name))
}

impl VectorIndex for MemoryIndex {
    fn list_collections(&self) -> Result<Vec<String>> {
        let mut names: Vec<String> = self.collections.read().keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    fn collection_exists(&self, name: &str) -> Result<bool> {
        Ok(self.collections.read().contains_key(name))
    }

    fn create_collection(&self, config: &CollectionConfig) -> Result<()> {
        if config.dimension == 0 {
            return Err(Error::InvalidInput("collection dimension must be > 0".into()));
        }
        let mut collections = self.collections.write();
        if collections.contains_key(&config.name) {
            return Err(Error::Index(format!("collection {} already exists", config.name)));
        }
        collections.insert(config.name.clone(), Collection::new(config.clone()));
        debug!(
            "Created in-memory collection {} (dim={}, distance={})",
            config.name, config.dimension, config.distance
        );
        Ok(())
    }

    fn upsert(&self, collection: &str, points: Vec<Point>) -> Result<usize> {
        let mut collections = self.collections.write();
        let target = collections.get_mut(collection).ok_or_else(|| missing(collection))?;
        let count = points.len();
        for point in points {
            target.upsert(point)?;
        }
        Ok(count)
    }

    fn search(
        &self,
        collection: &str,
        vector: &[f32],
        limit: usize,
        params: &SearchParams,
    ) -> Result<Vec<ScoredPoint>> {
        let collections = self.collections.read();
        let target = collections.get(collection).ok_or_else(|| missing(collection))?;
        target.search(vector, limit, params)
    }

    fn collection_info(&self, collection: &str) -> Result<CollectionInfo> {
        self.collections
            .read()
            .get(collection)
            .map(Collection::info)
            .ok_or_else(|| missing(collection))
    }
}
