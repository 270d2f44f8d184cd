//! Data types for collections, points and search hits.

use std::str::FromStr;

use papersage_core::Error;
use serde::{Deserialize, Serialize};

/// JSON object attached to each point.
pub type Payload = serde_json::Map<String, serde_json::Value>;

/// Similarity function of a collection. Higher scores are more similar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Distance {
    /// Cosine similarity in [-1, 1]; vectors are normalized on insert.
    #[default]
    Cosine,
    /// Raw dot product.
    Dot,
}

impl Distance {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cosine => "cosine",
            Self::Dot => "dot",
        }
    }
}

impl std::fmt::Display for Distance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Distance {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cosine" => Ok(Self::Cosine),
            "dot" => Ok(Self::Dot),
            other => Err(Error::Index(format!("unknown distance: {}", other))),
        }
    }
}

/// Parameters fixed at collection creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionConfig {
    pub name: String,
    pub dimension: usize,
    pub distance: Distance,
}

impl CollectionConfig {
    pub fn new(name: impl Into<String>, dimension: usize, distance: Distance) -> Self {
        Self {
            name: name.into(),
            dimension,
            distance,
        }
    }

    pub fn cosine(name: impl Into<String>, dimension: usize) -> Self {
        Self::new(name, dimension, Distance::Cosine)
    }
}

/// A vector with its id and payload, as written by `upsert`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Point {
    pub id: u64,
    pub vector: Vec<f32>,
    #[serde(default)]
    pub payload: Payload,
}

/// Search hit: point id, similarity score and payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredPoint {
    pub id: u64,
    pub score: f32,
    pub payload: Payload,
}

impl ScoredPoint {
    /// String payload field, if present.
    pub fn payload_str(&self, key: &str) -> Option<&str> {
        self.payload.get(key).and_then(|v| v.as_str())
    }
}

/// How a search scans the collection.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SearchParams {
    /// Score every point with full-precision vectors.
    pub exact: bool,
    /// Candidate pool size as a multiple of the limit (int8 search only).
    pub oversampling: f32,
    /// Re-score int8 candidates with full-precision vectors.
    pub rescore: bool,
}

impl SearchParams {
    pub fn exact() -> Self {
        Self {
            exact: true,
            oversampling: 1.0,
            rescore: false,
        }
    }

    pub fn quantized(oversampling: f32, rescore: bool) -> Self {
        Self {
            exact: false,
            oversampling: oversampling.max(1.0),
            rescore,
        }
    }

    /// Number of int8 candidates to keep for `limit` results.
    pub fn candidate_pool(&self, limit: usize) -> usize {
        ((limit as f32) * self.oversampling.max(1.0)).ceil() as usize
    }
}

impl Default for SearchParams {
    fn default() -> Self {
        Self::exact()
    }
}

/// Collection summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionInfo {
    pub name: String,
    pub dimension: usize,
    pub distance: Distance,
    pub points_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_candidate_pool() {
        assert_eq!(SearchParams::quantized(2.0, true).candidate_pool(5), 10);
        assert_eq!(SearchParams::quantized(1.5, true).candidate_pool(3), 5);
        // oversampling below 1 is clamped
        assert_eq!(SearchParams::quantized(0.5, false).candidate_pool(4), 4);
    }

    #[test]
    fn test_distance_roundtrip_names() {
        assert_eq!("cosine".parse::<Distance>().unwrap(), Distance::Cosine);
        assert_eq!(Distance::Dot.to_string(), "dot");
        assert!("euclid".parse::<Distance>().is_err());
    }

    #[test]
    fn test_payload_str() {
        let mut payload = Payload::new();
        payload.insert("arxiv_id".into(), serde_json::json!("1810.04805"));
        payload.insert("year".into(), serde_json::json!(2018));
        let hit = ScoredPoint {
            id: 2,
            score: 0.9,
            payload,
        };
        assert_eq!(hit.payload_str("arxiv_id"), Some("1810.04805"));
        assert_eq!(hit.payload_str("year"), None);
        assert_eq!(hit.payload_str("missing"), None);
    }
}
