//! API tests: drive the router in process and check response shapes
//! against what the web frontend reads.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use papersage_catalog::{MetadataCatalog, MetadataFetcher, PaperMetadata};
use papersage_core::{Error, PaperSageConfig, Result};
use papersage_infer::HashingEmbedder;
use papersage_resolve::PaperSearch;
use papersage_server::{build_router, AppState};
use papersage_store::MemoryIndex;
use serde_json::{json, Value};
use tower::ServiceExt;

const BERT_QUERY: &str = "introduce BERT, a new language representation model which stands for \
                          Bidirectional Encoder Representations from Transformers";

struct DemoCatalog {
    fail: bool,
}

impl MetadataCatalog for DemoCatalog {
    fn fetch_batch(&self, ids: &[String]) -> Result<Vec<PaperMetadata>> {
        if self.fail {
            return Err(Error::Catalog("arXiv unreachable".into()));
        }
        Ok(ids
            .iter()
            .map(|id| PaperMetadata {
                arxiv_id: format!("{}v2", id),
                title: format!("Paper {}", id),
                authors: vec!["Jacob Devlin".into(), "Ming-Wei Chang".into()],
                abstract_text: "An abstract.".into(),
                published: "2018-10-11T00:50:01+00:00".into(),
                categories: vec!["cs.CL".into()],
                doi: None,
                journal_ref: None,
            })
            .collect())
    }
}

fn app_with(fail: bool) -> Router {
    let engine = PaperSearch::new(
        Arc::new(HashingEmbedder::new(768)),
        Arc::new(MemoryIndex::new()),
        Arc::new(MetadataFetcher::new(Arc::new(DemoCatalog { fail }))),
        "arxiv_papers",
    );
    engine.add_demo_data().unwrap();
    let state = AppState::new(PaperSageConfig::default(), engine);
    build_router(Arc::new(state))
}

async fn post(app: Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

async fn get(app: Router, uri: &str) -> (StatusCode, Value) {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    send(app, request).await
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

#[tokio::test]
async fn test_health() {
    let (status, body) = get(app_with(false), "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["model"], "fnv1a-768");
    assert_eq!(body["collection"], "arxiv_papers");
    assert_eq!(body["points"], 3);
}

#[tokio::test]
async fn test_stats_shape() {
    let (status, body) = get(app_with(false), "/stats").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["collection"]["points_count"], 3);
    assert_eq!(body["embedding_dim"], 768);
    assert!(body["metadata_cache"]["cache_hits"].is_number());
    assert!(body["compute"]["cpu_cores"].is_number());
    assert_eq!(body["smart_search"], "escalate");
}

#[tokio::test]
async fn test_search_response_shape() {
    let (status, body) = post(
        app_with(false),
        "/search",
        json!({ "query": BERT_QUERY, "top_k": 2, "search_mode": "quality" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["query"], BERT_QUERY);
    assert_eq!(body["mode_used"], "quality");
    assert_eq!(body["total_results"], 2);
    assert!(body["search_time_ms"].is_number());

    let top = &body["results"][0];
    assert_eq!(top["arxiv_id"], "1810.04805");
    assert!(top["score"].as_f64().unwrap() > 0.7);
    assert!(top["title"].as_str().unwrap().starts_with("BERT"));
    assert_eq!(top["metadata"]["arxiv_id"], "1810.04805");
    assert!(top["metadata"]["authors"].is_array());
    assert!(top["metadata"]["abstract"].is_string());
}

#[tokio::test]
async fn test_search_defaults_to_balanced() {
    let (status, body) = post(app_with(false), "/search", json!({ "query": "attention" })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["mode_used"], "balanced");
    assert_eq!(body["total_results"], 3);
}

#[tokio::test]
async fn test_search_without_metadata() {
    let (status, body) = post(
        app_with(false),
        "/search",
        json!({ "query": BERT_QUERY, "fetch_metadata": false }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["results"][0]["metadata"].is_null());
}

#[tokio::test]
async fn test_catalog_outage_still_returns_results() {
    let (status, body) = post(app_with(true), "/search", json!({ "query": BERT_QUERY })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_results"], 3);
    assert_eq!(body["results"][0]["arxiv_id"], "1810.04805");
    assert!(body["results"][0]["metadata"].is_null());
}

#[tokio::test]
async fn test_smart_search_shape() {
    let (status, body) = post(
        app_with(false),
        "/smart-search",
        json!({ "query": BERT_QUERY, "min_good_results": 1 }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["mode_used"], "fast");
    assert_eq!(body["modes_tried"], json!(["fast"]));
    assert_eq!(body["results"][0]["arxiv_id"], "1810.04805");
}

#[tokio::test]
async fn test_compare_modes_shape() {
    let (status, body) = post(
        app_with(false),
        "/compare-modes",
        json!({ "query": BERT_QUERY, "top_k": 3 }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["query"], BERT_QUERY);
    assert!(["fast", "balanced", "quality"].contains(&body["best_mode"].as_str().unwrap()));

    for mode in ["fast", "balanced", "quality"] {
        let summary = &body["modes"][mode];
        assert_eq!(summary["results"].as_array().unwrap().len(), 3, "{}", mode);
        assert!(summary["search_time_ms"].is_number());
        assert!(summary["avg_score"].is_number());
        assert_eq!(summary["good_results"], 1);
        assert!(summary["high_confidence"].is_number());
    }
}

#[tokio::test]
async fn test_invalid_requests_are_bad_request() {
    let (status, body) = post(
        app_with(false),
        "/search",
        json!({ "query": "bert", "search_mode": "turbo" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["detail"].as_str().unwrap().contains("turbo"));

    let (status, _) = post(app_with(false), "/search", json!({ "query": "  " })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = post(app_with(false), "/search", json!({ "query": "bert", "top_k": 0 })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = post(app_with(false), "/compare-modes", json!({ "top_k": 3 })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
