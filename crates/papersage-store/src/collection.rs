//! In-memory scoring matrix for one collection.
//!
//! Rows are normalized on insert for cosine collections, so similarity is a
//! single matrix-vector product. Each row also keeps a uint8 copy used for
//! cheap candidate scoring.

use std::collections::HashMap;

use ndarray::{Array1, Array2};
use papersage_core::{Error, Result};

use crate::embedding::QuantizedVector;
use crate::types::*;

/// Points of a collection laid out for search.
pub struct Collection {
    config: CollectionConfig,
    /// Vectors, shape (N, dim).
    matrix: Array2<f32>,
    quantized: Vec<QuantizedVector>,
    /// Point ids corresponding to each row.
    ids: Vec<u64>,
    payloads: Vec<Payload>,
    rows_by_id: HashMap<u64, usize>,
}

impl Collection {
    pub fn new(config: CollectionConfig) -> Self {
        let dim = config.dimension;
        Self {
            config,
            matrix: Array2::zeros((0, dim)),
            quantized: Vec::new(),
            ids: Vec::new(),
            payloads: Vec::new(),
            rows_by_id: HashMap::new(),
        }
    }

    pub fn config(&self) -> &CollectionConfig {
        &self.config
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn info(&self) -> CollectionInfo {
        CollectionInfo {
            name: self.config.name.clone(),
            dimension: self.config.dimension,
            distance: self.config.distance,
            points_count: self.len(),
        }
    }

    /// Validate a vector and bring it into stored form.
    pub fn prepare_vector(&self, vector: &[f32]) -> Result<Array1<f32>> {
        if vector.len() != self.config.dimension {
            return Err(Error::InvalidInput(format!(
                "vector has {} dimensions, collection {} expects {}",
                vector.len(),
                self.config.name,
                self.config.dimension
            )));
        }
        let mut row = Array1::from_vec(vector.to_vec());
        if self.config.distance == Distance::Cosine {
            let norm = row.dot(&row).sqrt();
            if norm < 1e-9 {
                return Err(Error::InvalidInput(
                    "zero vector cannot be stored in a cosine collection".into(),
                ));
            }
            row /= norm;
        }
        Ok(row)
    }

    /// Insert or replace a point.
    pub fn upsert(&mut self, point: Point) -> Result<()> {
        let row = self.prepare_vector(&point.vector)?;
        let quantized = QuantizedVector::quantize(row.view());

        match self.rows_by_id.get(&point.id) {
            Some(&pos) => {
                self.matrix.row_mut(pos).assign(&row);
                self.quantized[pos] = quantized;
                self.payloads[pos] = point.payload;
            }
            None => {
                self.matrix
                    .push_row(row.view())
                    .map_err(|e| Error::Index(format!("failed to append row: {}", e)))?;
                self.quantized.push(quantized);
                self.rows_by_id.insert(point.id, self.ids.len());
                self.ids.push(point.id);
                self.payloads.push(point.payload);
            }
        }
        Ok(())
    }

    /// Nearest points to `vector`, best first, at most `limit`.
    pub fn search(
        &self,
        vector: &[f32],
        limit: usize,
        params: &SearchParams,
    ) -> Result<Vec<ScoredPoint>> {
        if vector.len() != self.config.dimension {
            return Err(Error::Index(format!(
                "query has {} dimensions, collection {} expects {}",
                vector.len(),
                self.config.name,
                self.config.dimension
            )));
        }
        if limit == 0 || self.is_empty() {
            return Ok(Vec::new());
        }

        let mut query = Array1::from_vec(vector.to_vec());
        if self.config.distance == Distance::Cosine {
            let norm = query.dot(&query).sqrt();
            if norm < 1e-9 {
                return Ok(Vec::new());
            }
            query /= norm;
        }

        let scored: Vec<(usize, f32)> = if params.exact {
            // (N, dim) @ (dim,) → (N,)
            self.matrix.dot(&query).iter().copied().enumerate().collect()
        } else {
            let query_sum = query.sum();
            let approx: Vec<(usize, f32)> = self
                .quantized
                .iter()
                .enumerate()
                .map(|(i, q)| (i, q.dot(query.view(), query_sum)))
                .collect();
            let mut candidates = self.rank(approx, params.candidate_pool(limit));
            if params.rescore {
                for (row, score) in candidates.iter_mut() {
                    *score = self.matrix.row(*row).dot(&query);
                }
            }
            candidates
        };

        Ok(self
            .rank(scored, limit)
            .into_iter()
            .map(|(row, score)| ScoredPoint {
                id: self.ids[row],
                score,
                payload: self.payloads[row].clone(),
            })
            .collect())
    }

    /// Sort by descending score, ties by ascending point id, keep `k`.
    fn rank(&self, mut scored: Vec<(usize, f32)>, k: usize) -> Vec<(usize, f32)> {
        scored.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| self.ids[a.0].cmp(&self.ids[b.0]))
        });
        scored.truncate(k);
        scored
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(id: u64, vector: Vec<f32>) -> Point {
        let mut payload = Payload::new();
        payload.insert("arxiv_id".into(), serde_json::json!(format!("paper-{}", id)));
        Point {
            id,
            vector,
            payload,
        }
    }

    /// Deterministic pseudo-random vectors.
    fn vector(seed: u64, dim: usize) -> Vec<f32> {
        let mut state = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        (0..dim)
            .map(|_| {
                state = state
                    .wrapping_mul(6364136223846793005)
                    .wrapping_add(1442695040888963407);
                ((state >> 33) as f32 / (1u64 << 31) as f32) - 0.5
            })
            .collect()
    }

    #[test]
    fn test_exact_search_orders_by_similarity() {
        let mut c = Collection::new(CollectionConfig::cosine("t", 3));
        c.upsert(point(1, vec![1.0, 0.0, 0.0])).unwrap();
        c.upsert(point(2, vec![0.0, 1.0, 0.0])).unwrap();
        c.upsert(point(3, vec![0.7, 0.7, 0.0])).unwrap();

        let hits = c.search(&[1.0, 0.1, 0.0], 3, &SearchParams::exact()).unwrap();
        let ids: Vec<u64> = hits.iter().map(|h| h.id).collect();
        assert_eq!(ids, vec![1, 3, 2]);
        assert!(hits[0].score > 0.99);
        assert_eq!(hits[0].payload_str("arxiv_id"), Some("paper-1"));
    }

    #[test]
    fn test_limit_bounds_results() {
        let mut c = Collection::new(CollectionConfig::cosine("t", 16));
        for id in 0..100 {
            c.upsert(point(id, vector(id, 16))).unwrap();
        }
        let hits = c.search(&vector(7, 16), 5, &SearchParams::exact()).unwrap();
        assert_eq!(hits.len(), 5);
        assert_eq!(hits[0].id, 7);
    }

    #[test]
    fn test_fewer_points_than_limit() {
        let mut c = Collection::new(CollectionConfig::cosine("t", 2));
        c.upsert(point(1, vec![1.0, 0.0])).unwrap();
        let hits = c.search(&[1.0, 0.0], 10, &SearchParams::exact()).unwrap();
        assert_eq!(hits.len(), 1);
    }

    #[test]
    fn test_upsert_replaces_existing_id() {
        let mut c = Collection::new(CollectionConfig::cosine("t", 2));
        c.upsert(point(1, vec![1.0, 0.0])).unwrap();
        c.upsert(point(1, vec![0.0, 1.0])).unwrap();
        assert_eq!(c.len(), 1);

        let hits = c.search(&[0.0, 1.0], 1, &SearchParams::exact()).unwrap();
        assert!(hits[0].score > 0.99);
    }

    #[test]
    fn test_dimension_mismatch() {
        let mut c = Collection::new(CollectionConfig::cosine("t", 3));
        assert!(c.upsert(point(1, vec![1.0, 0.0])).is_err());
        assert!(c.search(&[1.0], 1, &SearchParams::exact()).is_err());
    }

    #[test]
    fn test_zero_vector_rejected_for_cosine() {
        let mut c = Collection::new(CollectionConfig::cosine("t", 2));
        assert!(matches!(
            c.upsert(point(1, vec![0.0, 0.0])),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn test_quantized_rescored_matches_exact_top_hit() {
        let mut c = Collection::new(CollectionConfig::cosine("t", 64));
        for id in 0..200 {
            c.upsert(point(id, vector(id, 64))).unwrap();
        }
        let query = vector(42, 64);
        let exact = c.search(&query, 5, &SearchParams::exact()).unwrap();
        let rescored = c
            .search(&query, 5, &SearchParams::quantized(4.0, true))
            .unwrap();
        assert_eq!(exact[0].id, 42);
        assert_eq!(rescored[0].id, 42);
        assert!((exact[0].score - rescored[0].score).abs() < 1e-5);
    }

    #[test]
    fn test_quantized_without_rescore_is_approximate() {
        let mut c = Collection::new(CollectionConfig::cosine("t", 32));
        for id in 0..50 {
            c.upsert(point(id, vector(id, 32))).unwrap();
        }
        let hits = c
            .search(&vector(3, 32), 3, &SearchParams::quantized(1.0, false))
            .unwrap();
        assert_eq!(hits.len(), 3);
        assert_eq!(hits[0].id, 3);
        assert!((hits[0].score - 1.0).abs() < 0.05);
    }

    #[test]
    fn test_ties_break_by_id() {
        let mut c = Collection::new(CollectionConfig::cosine("t", 2));
        c.upsert(point(9, vec![1.0, 0.0])).unwrap();
        c.upsert(point(4, vec![1.0, 0.0])).unwrap();
        let hits = c.search(&[1.0, 0.0], 2, &SearchParams::exact()).unwrap();
        assert_eq!(hits[0].id, 4);
        assert_eq!(hits[1].id, 9);
    }
}
