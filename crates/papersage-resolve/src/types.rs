//! Search results and their per-mode diagnostics.

use std::collections::HashMap;

use papersage_catalog::PaperMetadata;
use papersage_store::ScoredPoint;
use serde::Serialize;

use crate::modes::SearchMode;

/// Scores above this count as high confidence.
pub const HIGH_CONFIDENCE_THRESHOLD: f32 = 0.8;
/// Scores above this count as good results.
pub const GOOD_RESULT_THRESHOLD: f32 = 0.7;

/// Metadata keyed by canonical arXiv id.
pub type MetadataMap = HashMap<String, PaperMetadata>;

/// Result of one search in one mode.
#[derive(Debug, Clone, Serialize)]
pub struct SearchOutcome {
    pub mode: SearchMode,
    pub hits: Vec<ScoredPoint>,
    /// Embedding plus index query, enrichment excluded.
    pub latency_ms: f64,
    pub metadata: MetadataMap,
}

/// Hits of one mode with summary statistics.
#[derive(Debug, Clone, Serialize)]
pub struct ModeResult {
    pub mode: SearchMode,
    pub hits: Vec<ScoredPoint>,
    pub latency_ms: f64,
    /// 0.0 when there are no hits.
    pub mean_score: f32,
    pub high_confidence: usize,
    pub good_results: usize,
}

impl ModeResult {
    pub fn from_hits(mode: SearchMode, hits: Vec<ScoredPoint>, latency_ms: f64) -> Self {
        let mean_score = if hits.is_empty() {
            0.0
        } else {
            hits.iter().map(|h| h.score).sum::<f32>() / hits.len() as f32
        };
        let high_confidence = hits
            .iter()
            .filter(|h| h.score > HIGH_CONFIDENCE_THRESHOLD)
            .count();
        let good_results = hits
            .iter()
            .filter(|h| h.score > GOOD_RESULT_THRESHOLD)
            .count();
        Self {
            mode,
            hits,
            latency_ms,
            mean_score,
            high_confidence,
            good_results,
        }
    }
}

/// All modes side by side.
#[derive(Debug, Clone, Serialize)]
pub struct SearchReport {
    /// One entry per mode, in `SearchMode::ALL` order.
    pub modes: Vec<ModeResult>,
    pub best_mode: SearchMode,
    /// Union of every mode's metadata.
    pub metadata: MetadataMap,
}

impl SearchReport {
    pub fn mode(&self, mode: SearchMode) -> Option<&ModeResult> {
        self.modes.iter().find(|r| r.mode == mode)
    }

    pub fn best(&self) -> Option<&ModeResult> {
        self.mode(self.best_mode)
    }
}

/// Result of smart search.
#[derive(Debug, Clone, Serialize)]
pub struct SmartOutcome {
    pub mode_used: SearchMode,
    pub hits: Vec<ScoredPoint>,
    /// Search latency of the chosen mode.
    pub latency_ms: f64,
    /// Modes run, in order.
    pub modes_tried: Vec<SearchMode>,
    pub metadata: MetadataMap,
}

/// How smart search picks its mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SmartStrategy {
    /// Try fast, balanced, quality until one yields enough good results.
    #[default]
    Escalate,
    /// Always run the given mode.
    Fixed(SearchMode),
}

/// A paper to embed and index.
#[derive(Debug, Clone)]
pub struct PaperRecord {
    /// Point id in the collection.
    pub id: u64,
    pub arxiv_id: String,
    pub title: String,
    /// Text that is embedded, usually title plus abstract.
    pub text: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use papersage_store::Payload;

    fn hits(scores: &[f32]) -> Vec<ScoredPoint> {
        scores
            .iter()
            .enumerate()
            .map(|(i, &score)| ScoredPoint {
                id: i as u64,
                score,
                payload: Payload::new(),
            })
            .collect()
    }

    #[test]
    fn test_zero_hits_mean_is_zero() {
        let r = ModeResult::from_hits(SearchMode::Fast, Vec::new(), 1.0);
        assert_eq!(r.mean_score, 0.0);
        assert_eq!(r.high_confidence, 0);
        assert_eq!(r.good_results, 0);
    }

    #[test]
    fn test_thresholds_are_strict() {
        let scores = [0.95, 0.8, 0.75, 0.7, 0.2];
        let r = ModeResult::from_hits(SearchMode::Quality, hits(&scores), 3.0);
        assert_eq!(r.high_confidence, 1);
        assert_eq!(r.good_results, 3);
        assert!((r.mean_score - 0.68).abs() < 1e-5);
    }
}
