//! SQLite-backed vector index.
//!
//! Points are persisted in `papersage.db`; each collection is loaded into a
//! `Collection` matrix on first search and reloaded after writes.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use papersage_core::{Error, Result};
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, info};

use crate::collection::Collection;
use crate::embedding::{blob_to_vector, vector_to_blob};
use crate::index::VectorIndex;
use crate::schema::SCHEMA_SQL;
use crate::types::*;

/// Persistent vector index with per-collection search matrices.
pub struct SqliteIndex {
    conn: Mutex<Connection>,
    db_path: PathBuf,
    /// Loaded matrices; an absent entry means "load on next search".
    loaded: Mutex<HashMap<String, Collection>>,
}

fn db_err(e: rusqlite::Error) -> Error {
    Error::Database(e.to_string())
}

impl SqliteIndex {
    /// Open or create the index.
    ///
    /// `db_dir` is the directory (e.g., `data/vectordb/`). The file will be `db_dir/papersage.db`.
    pub fn open(db_dir: impl AsRef<Path>) -> Result<Self> {
        let db_dir = db_dir.as_ref();
        std::fs::create_dir_all(db_dir)?;
        let db_path = db_dir.join("papersage.db");

        let conn = Self::create_connection(&db_path)?;
        conn.execute_batch(SCHEMA_SQL)
            .map_err(|e| Error::Database(format!("Schema init failed: {}", e)))?;

        let index = Self {
            conn: Mutex::new(conn),
            db_path,
            loaded: Mutex::new(HashMap::new()),
        };

        info!(
            "SqliteIndex initialized: {} collections, path={}",
            index.list_collections()?.len(),
            index.db_path.display()
        );
        Ok(index)
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    fn create_connection(db_path: &Path) -> Result<Connection> {
        let conn = Connection::open(db_path).map_err(db_err)?;
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA foreign_keys = ON;
             PRAGMA synchronous = NORMAL;",
        )
        .map_err(db_err)?;
        Ok(conn)
    }

    fn load_config(&self, name: &str) -> Result<Option<CollectionConfig>> {
        let conn = self.conn.lock();
        let row = conn
            .query_row(
                "SELECT dimension, distance FROM collections WHERE name = ?1",
                params![name],
                |row| Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?)),
            )
            .optional()
            .map_err(db_err)?;
        match row {
            Some((dimension, distance)) => Ok(Some(CollectionConfig::new(
                name,
                dimension as usize,
                distance.parse()?,
            ))),
            None => Ok(None),
        }
    }

    fn require_config(&self, name: &str) -> Result<CollectionConfig> {
        self.load_config(name)?
            .ok_or_else(|| Error::NotFound(format!("collection {}", name)))
    }

    /// Read every point of a collection into a search matrix.
    fn load_collection(&self, config: CollectionConfig) -> Result<Collection> {
        let mut collection = Collection::new(config);
        let rows: Vec<(i64, Vec<u8>, String)> = {
            let conn = self.conn.lock();
            let mut stmt = conn
                .prepare(
                    "SELECT id, vector, payload_json FROM points \
                     WHERE collection = ?1 ORDER BY id",
                )
                .map_err(db_err)?;
            let rows = stmt
                .query_map(params![collection.config().name], |row| {
                    Ok((row.get(0)?, row.get(1)?, row.get(2)?))
                })
                .map_err(db_err)?;
            rows.collect::<std::result::Result<_, _>>().map_err(db_err)?
        };

        for (id, blob, payload_json) in rows {
            let vector = blob_to_vector(&blob)
                .ok_or_else(|| Error::Database(format!("corrupt vector blob for point {}", id)))?;
            let payload: Payload = serde_json::from_str(&payload_json)?;
            collection.upsert(Point {
                id: id as u64,
                vector,
                payload,
            })?;
        }
        debug!(
            "Loaded {} points into matrix for {}",
            collection.len(),
            collection.config().name
        );
        Ok(collection)
    }
}

impl VectorIndex for SqliteIndex {
    fn list_collections(&self) -> Result<Vec<String>> {
        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare("SELECT name FROM collections ORDER BY name")
            .map_err(db_err)?;
        let names = stmt
            .query_map([], |row| row.get(0))
            .map_err(db_err)?
            .collect::<std::result::Result<Vec<String>, _>>()
            .map_err(db_err)?;
        Ok(names)
    }

    fn collection_exists(&self, name: &str) -> Result<bool> {
        Ok(self.load_config(name)?.is_some())
    }

    fn create_collection(&self, config: &CollectionConfig) -> Result<()> {
        if config.dimension == 0 {
            return Err(Error::InvalidInput("collection dimension must be > 0".into()));
        }
        let conn = self.conn.lock();
        let inserted = conn
            .execute(
                "INSERT OR IGNORE INTO collections (name, dimension, distance, created_at) \
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    config.name,
                    config.dimension as i64,
                    config.distance.as_str(),
                    chrono::Utc::now().timestamp()
                ],
            )
            .map_err(db_err)?;
        if inserted == 0 {
            return Err(Error::Index(format!("collection {} already exists", config.name)));
        }
        info!(
            "Created collection {} (dim={}, distance={})",
            config.name, config.dimension, config.distance
        );
        Ok(())
    }

    fn upsert(&self, collection: &str, points: Vec<Point>) -> Result<usize> {
        let config = self.require_config(collection)?;

        // Validate up front so a bad point leaves nothing half-written.
        let validator = Collection::new(config);
        for point in &points {
            validator.prepare_vector(&point.vector)?;
        }

        let now = chrono::Utc::now().timestamp();
        {
            let mut conn = self.conn.lock();
            let tx = conn.transaction().map_err(db_err)?;
            {
                let mut stmt = tx
                    .prepare(
                        "INSERT OR REPLACE INTO points (collection, id, vector, payload_json, updated_at) \
                         VALUES (?1, ?2, ?3, ?4, ?5)",
                    )
                    .map_err(db_err)?;
                for point in &points {
                    let payload_json = serde_json::to_string(&point.payload)?;
                    stmt.execute(params![
                        collection,
                        point.id as i64,
                        vector_to_blob(&point.vector),
                        payload_json,
                        now
                    ])
                    .map_err(db_err)?;
                }
            }
            tx.commit().map_err(db_err)?;
        }

        self.loaded.lock().remove(collection);
        Ok(points.len())
    }

    fn search(
        &self,
        collection: &str,
        vector: &[f32],
        limit: usize,
        params: &SearchParams,
    ) -> Result<Vec<ScoredPoint>> {
        let mut loaded = self.loaded.lock();
        if !loaded.contains_key(collection) {
            let config = self.require_config(collection)?;
            let matrix = self.load_collection(config)?;
            loaded.insert(collection.to_string(), matrix);
        }
        match loaded.get(collection) {
            Some(matrix) => matrix.search(vector, limit, params),
            None => Err(Error::Internal(format!("collection {} not loaded", collection))),
        }
    }

    fn collection_info(&self, collection: &str) -> Result<CollectionInfo> {
        let config = self.require_config(collection)?;
        let count: i64 = {
            let conn = self.conn.lock();
            conn.query_row(
                "SELECT COUNT(*) FROM points WHERE collection = ?1",
                params![collection],
                |row| row.get(0),
            )
            .map_err(db_err)?
        };
        Ok(CollectionInfo {
            name: config.name,
            dimension: config.dimension,
            distance: config.distance,
            points_count: count as usize,
        })
    }
}
