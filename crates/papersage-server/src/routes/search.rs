//! Search routes: single mode, smart search, mode comparison.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use papersage_catalog::canonical_id;
use papersage_resolve::{MetadataMap, ModeResult, SearchMode};
use papersage_store::ScoredPoint;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::ApiError;
use crate::state::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/search", post(search))
        .route("/smart-search", post(smart_search))
        .route("/compare-modes", post(compare_modes))
}

fn default_top_k() -> usize {
    10
}

fn default_true() -> bool {
    true
}

fn default_mode() -> String {
    SearchMode::default().as_str().to_string()
}

fn default_min_good_results() -> usize {
    3
}

#[derive(Debug, Deserialize)]
struct SearchRequest {
    query: String,
    #[serde(default = "default_top_k")]
    top_k: usize,
    #[serde(default = "default_mode")]
    search_mode: String,
    #[serde(default = "default_true")]
    fetch_metadata: bool,
}

#[derive(Debug, Deserialize)]
struct SmartSearchRequest {
    query: String,
    #[serde(default = "default_top_k")]
    top_k: usize,
    #[serde(default = "default_min_good_results")]
    min_good_results: usize,
    #[serde(default = "default_true")]
    fetch_metadata: bool,
}

#[derive(Debug, Deserialize)]
struct CompareRequest {
    query: String,
    #[serde(default = "default_top_k")]
    top_k: usize,
    #[serde(default = "default_true")]
    fetch_metadata: bool,
}

/// One hit as the frontend renders it.
#[derive(Debug, Serialize)]
struct ResultItem {
    arxiv_id: String,
    score: f32,
    title: Option<String>,
    metadata: Option<Value>,
}

fn result_items(hits: &[ScoredPoint], metadata: &MetadataMap) -> Vec<ResultItem> {
    hits.iter()
        .map(|hit| {
            let arxiv_id = hit.payload_str("arxiv_id").unwrap_or_default().to_string();
            let metadata = metadata
                .get(&canonical_id(&arxiv_id))
                .and_then(|m| serde_json::to_value(m).ok());
            ResultItem {
                score: hit.score,
                title: hit.payload_str("title").map(String::from),
                arxiv_id,
                metadata,
            }
        })
        .collect()
}

fn mode_summary(result: &ModeResult, metadata: &MetadataMap) -> Value {
    json!({
        "results": result_items(&result.hits, metadata),
        "search_time_ms": result.latency_ms,
        "avg_score": result.mean_score,
        "high_confidence": result.high_confidence,
        "good_results": result.good_results,
    })
}

/// POST /search
async fn search(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<SearchRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(req) = payload?;
    let mode: SearchMode = req.search_mode.parse()?;

    let engine = state.engine.clone();
    let query = req.query.clone();
    let outcome = tokio::task::spawn_blocking(move || {
        engine.search(&query, req.top_k, mode, req.fetch_metadata)
    })
    .await??;

    let results = result_items(&outcome.hits, &outcome.metadata);
    Ok(Json(json!({
        "query": req.query,
        "total_results": results.len(),
        "results": results,
        "search_time_ms": outcome.latency_ms,
        "mode_used": outcome.mode,
    })))
}

/// POST /smart-search
async fn smart_search(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<SmartSearchRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(req) = payload?;

    let engine = state.engine.clone();
    let query = req.query.clone();
    let outcome = tokio::task::spawn_blocking(move || {
        engine.smart_search(&query, req.top_k, req.min_good_results, req.fetch_metadata)
    })
    .await??;

    let results = result_items(&outcome.hits, &outcome.metadata);
    Ok(Json(json!({
        "query": req.query,
        "total_results": results.len(),
        "results": results,
        "search_time_ms": outcome.latency_ms,
        "mode_used": outcome.mode_used,
        "modes_tried": outcome.modes_tried,
    })))
}

/// POST /compare-modes
async fn compare_modes(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CompareRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(req) = payload?;

    let engine = state.engine.clone();
    let query = req.query.clone();
    let report = tokio::task::spawn_blocking(move || {
        engine.compare_modes(&query, req.top_k, req.fetch_metadata)
    })
    .await??;

    let modes: serde_json::Map<String, Value> = report
        .modes
        .iter()
        .map(|r| (r.mode.as_str().to_string(), mode_summary(r, &report.metadata)))
        .collect();

    Ok(Json(json!({
        "query": req.query,
        "best_mode": report.best_mode,
        "modes": modes,
    })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use papersage_catalog::PaperMetadata;
    use papersage_store::Payload;

    #[test]
    fn test_request_defaults() {
        let req: SearchRequest = serde_json::from_str(r#"{"query": "bert"}"#).unwrap();
        assert_eq!(req.top_k, 10);
        assert_eq!(req.search_mode, "balanced");
        assert!(req.fetch_metadata);

        let smart: SmartSearchRequest = serde_json::from_str(r#"{"query": "bert"}"#).unwrap();
        assert_eq!(smart.min_good_results, 3);
    }

    #[test]
    fn test_result_items_attach_metadata() {
        let mut payload = Payload::new();
        payload.insert("arxiv_id".into(), json!("1810.04805"));
        payload.insert("title".into(), json!("BERT"));
        let hits = vec![
            ScoredPoint {
                id: 2,
                score: 0.91,
                payload,
            },
            ScoredPoint {
                id: 7,
                score: 0.4,
                payload: Payload::new(),
            },
        ];
        let mut metadata = MetadataMap::new();
        metadata.insert(
            "1810.04805".into(),
            PaperMetadata {
                arxiv_id: "1810.04805".into(),
                title: "BERT: Pre-training".into(),
                authors: vec!["Jacob Devlin".into()],
                abstract_text: "We introduce BERT.".into(),
                published: "2018-10-11T00:50:01+00:00".into(),
                categories: vec!["cs.CL".into()],
                doi: None,
                journal_ref: None,
            },
        );

        let items = result_items(&hits, &metadata);
        let json = serde_json::to_value(&items).unwrap();
        assert_eq!(json[0]["arxiv_id"], "1810.04805");
        assert_eq!(json[0]["title"], "BERT");
        assert_eq!(json[0]["metadata"]["abstract"], "We introduce BERT.");
        assert_eq!(json[1]["arxiv_id"], "");
        assert!(json[1]["metadata"].is_null());
    }
}
