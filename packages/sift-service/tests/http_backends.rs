use std::time::Duration;

use axum::{
	Json, Router,
	extract::{Path, State},
	routing,
};
use serde_json::Value;

use sift_domain::CollectionDescriptor;
use sift_service::{RetrieveRequest, SiftService};
use sift_testkit::{FakeBackend, Recorder};

async fn chat(State(recorder): State<Recorder>, Json(body): Json<Value>) -> Json<Value> {
	recorder.record(body);

	let content = serde_json::json!({
		"need_retrieval": true,
		"retrieval_queries": [
			{ "dataset_id": "docs", "query": "export format" },
			{ "dataset_id": "slow", "query": "export format" }
		]
	});

	Json(serde_json::json!({
		"choices": [{ "message": { "content": format!("```json\n{content}\n```") } }]
	}))
}

async fn search(
	State(recorder): State<Recorder>,
	Path(collection_id): Path<String>,
	Json(body): Json<Value>,
) -> Json<Value> {
	recorder.record(serde_json::json!({ "collection_id": collection_id, "body": body }));

	if collection_id == "slow" {
		tokio::time::sleep(Duration::from_secs(5)).await;
	}

	let records: Vec<Value> = (0..4)
		.map(|i| {
			serde_json::json!({
				"segment": {
					"id": format!("seg-{i}"),
					"document_id": "doc-1",
					"content": format!("Export chapter {i}"),
					"position": i,
					"document": { "name": "Exporter", "doc_metadata": { "lang": "en" } }
				},
				"score": 0.5
			})
		})
		.collect();

	Json(serde_json::json!({ "records": records }))
}

async fn rerank(State(recorder): State<Recorder>, Json(body): Json<Value>) -> Json<Value> {
	recorder.record(body);

	Json(serde_json::json!({
		"results": [
			{ "index": 3, "relevance_score": 0.93 },
			{ "index": 1, "relevance_score": 0.71 }
		]
	}))
}

#[tokio::test]
async fn default_providers_run_the_pipeline_over_http() {
	let chat_calls = Recorder::default();
	let search_calls = Recorder::default();
	let rerank_calls = Recorder::default();
	let reasoning = FakeBackend::start(
		Router::new()
			.route("/chat/completions", routing::post(chat))
			.with_state(chat_calls.clone()),
	)
	.await
	.expect("Failed to start reasoning backend.");
	let collections = FakeBackend::start(
		Router::new()
			.route("/datasets/{collection_id}/retrieve", routing::post(search))
			.with_state(search_calls.clone()),
	)
	.await
	.expect("Failed to start collection backend.");
	let reranker = FakeBackend::start(
		Router::new().route("/rerank", routing::post(rerank)).with_state(rerank_calls.clone()),
	)
	.await
	.expect("Failed to start rerank backend.");
	let mut cfg = sift_testkit::test_config(
		reasoning.base_url(),
		collections.base_url(),
		reranker.base_url(),
	);

	cfg.providers.collections.read_timeout_ms = 300;

	let service = SiftService::new(cfg);
	let request = RetrieveRequest {
		collections: vec![
			CollectionDescriptor { id: "docs".to_string(), description: "Manual".to_string() },
			CollectionDescriptor { id: "slow".to_string(), description: "Archive".to_string() },
		],
		collection_api_key: Some("dataset-key".to_string()),
		question: "How do I export data?".to_string(),
		document: None,
		top_k: Some(4),
		rerank_top_k: Some(2),
		score_threshold: None,
		semantic_weight: None,
	};
	let response = service.retrieve(request).await.expect("retrieve failed");

	assert!(response.success, "Unexpected failure: {:?}", response.error);
	assert_eq!(response.retrieval_queries.len(), 2);
	assert_eq!(response.total_segments, 2);
	assert_eq!(response.segments[0].passage_id, "seg-3");
	assert_eq!(response.segments[1].passage_id, "seg-1");
	assert!((response.segments[0].score - 0.93).abs() < 1e-6);
	assert_eq!(response.segments[0].collection_id, "docs");
	assert_eq!(chat_calls.count(), 1);
	assert_eq!(search_calls.count(), 2);

	let rerank_body = &rerank_calls.bodies()[0];

	assert_eq!(rerank_body["query"], "How do I export data?");
	assert_eq!(rerank_body["top_n"], 2);
	assert_eq!(rerank_body["documents"].as_array().map(Vec::len), Some(4));
}
