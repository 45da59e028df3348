use axum::{
	Json, Router,
	body::{self, Body},
	http::{Request, StatusCode},
	routing,
};
use serde_json::Value;
use tower::util::ServiceExt;

use sift_api::{routes, state::AppState};
use sift_testkit::FakeBackend;

fn app(reasoning_base: &str) -> Router {
	let config = sift_testkit::test_config(
		reasoning_base,
		sift_testkit::UNREACHABLE_BASE,
		sift_testkit::UNREACHABLE_BASE,
	);

	routes::router(AppState::new(config))
}

async fn call(app: Router, request: Request<Body>) -> (StatusCode, Value) {
	let response = app.oneshot(request).await.expect("Failed to call route.");
	let status = response.status();
	let body = body::to_bytes(response.into_body(), usize::MAX)
		.await
		.expect("Failed to read response body.");
	let json = serde_json::from_slice(&body).expect("Failed to parse response.");

	(status, json)
}

fn post_retrieve(payload: String) -> Request<Body> {
	Request::builder()
		.method("POST")
		.uri("/api/v1/retrieve")
		.header("content-type", "application/json")
		.body(Body::from(payload))
		.expect("Failed to build request.")
}

#[tokio::test]
async fn root_describes_the_service() {
	let request = Request::builder().uri("/").body(Body::empty()).expect("Failed to build request.");
	let (status, json) = call(app(sift_testkit::UNREACHABLE_BASE), request).await;

	assert_eq!(status, StatusCode::OK);
	assert_eq!(json["name"], "sift");
	assert_eq!(json["status"], "running");
	assert_eq!(json["endpoints"]["retrieve"], "/api/v1/retrieve");
	assert_eq!(json["endpoints"]["health"], "/health");
}

#[tokio::test]
async fn health_reports_timestamp() {
	let request =
		Request::builder().uri("/health").body(Body::empty()).expect("Failed to build request.");
	let (status, json) = call(app(sift_testkit::UNREACHABLE_BASE), request).await;

	assert_eq!(status, StatusCode::OK);
	assert_eq!(json["status"], "healthy");
	assert!(json["timestamp"].as_f64().is_some_and(|ts| ts > 1_600_000_000.0));
}

#[tokio::test]
async fn rejects_empty_datasets_with_field_path() {
	let payload = serde_json::json!({
		"datasets": [],
		"dataset_api_key": "k",
		"question": "What changed?"
	});
	let (status, json) =
		call(app(sift_testkit::UNREACHABLE_BASE), post_retrieve(payload.to_string())).await;

	assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
	assert_eq!(json["error_code"], "INVALID_REQUEST");
	assert_eq!(json["fields"][0], "$.datasets");
}

#[tokio::test]
async fn rejects_out_of_range_rerank_top_k() {
	let payload = serde_json::json!({
		"datasets": [{ "dataset_id": "docs", "description": "Manual" }],
		"dataset_api_key": "k",
		"question": "What changed?",
		"rerank_top_k": 50
	});
	let (status, json) =
		call(app(sift_testkit::UNREACHABLE_BASE), post_retrieve(payload.to_string())).await;

	assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
	assert_eq!(json["fields"][0], "$.rerank_top_k");
}

#[tokio::test]
async fn rejects_malformed_json() {
	let (status, json) =
		call(app(sift_testkit::UNREACHABLE_BASE), post_retrieve("{\"datasets\": [".to_string()))
			.await;

	assert_eq!(status, StatusCode::BAD_REQUEST);
	assert_eq!(json["error_code"], "MALFORMED_BODY");
}

#[tokio::test]
async fn returns_no_retrieval_outcome() {
	let backend = FakeBackend::start(Router::new().route(
		"/chat/completions",
		routing::post(|| async {
			Json(serde_json::json!({
				"choices": [{ "message": { "content": "{\"need_retrieval\": false}" } }]
			}))
		}),
	))
	.await
	.expect("Failed to start reasoning backend.");
	let payload = serde_json::json!({
		"datasets": [{ "dataset_id": "docs", "description": "Manual" }],
		"dataset_api_key": "k",
		"question": "hello"
	});
	let (status, json) = call(app(backend.base_url()), post_retrieve(payload.to_string())).await;

	assert_eq!(status, StatusCode::OK);
	assert_eq!(json["success"], true);
	assert_eq!(json["need_retrieval"], false);
	assert_eq!(json["segments"], serde_json::json!([]));
	assert_eq!(json["total_segments"], 0);
	assert!(json["message"].is_string());
	assert!(json["error"].is_null());
}

#[tokio::test]
async fn unreachable_backends_degrade_to_empty_success() {
	let payload = serde_json::json!({
		"datasets": [
			{ "dataset_id": "docs", "description": "Manual" },
			{ "dataset_id": "faq", "description": "Answers" }
		],
		"dataset_api_key": "k",
		"question": "How do refunds work?"
	});
	let (status, json) =
		call(app(sift_testkit::UNREACHABLE_BASE), post_retrieve(payload.to_string())).await;

	assert_eq!(status, StatusCode::OK);
	assert_eq!(json["success"], true);
	assert_eq!(json["need_retrieval"], true);
	assert_eq!(json["retrieval_queries"][0]["dataset_id"], "docs");
	assert_eq!(json["retrieval_queries"][1]["query"], "How do refunds work?");
	assert_eq!(json["total_segments"], 0);
}

#[tokio::test]
async fn answers_cors_preflight_for_any_origin() {
	let request = Request::builder()
		.method("OPTIONS")
		.uri("/api/v1/retrieve")
		.header("origin", "http://chat.local")
		.header("access-control-request-method", "POST")
		.header("access-control-request-headers", "content-type")
		.body(Body::empty())
		.expect("Failed to build request.");
	let response =
		app(sift_testkit::UNREACHABLE_BASE).oneshot(request).await.expect("Failed to call route.");
	let headers = response.headers();

	assert_eq!(response.status(), StatusCode::OK);
	assert_eq!(headers["access-control-allow-origin"], "*");
	assert!(headers.contains_key("access-control-allow-methods"));
}

#[tokio::test]
async fn cross_origin_responses_carry_allow_origin() {
	let request = Request::builder()
		.uri("/health")
		.header("origin", "http://chat.local")
		.body(Body::empty())
		.expect("Failed to build request.");
	let response =
		app(sift_testkit::UNREACHABLE_BASE).oneshot(request).await.expect("Failed to call route.");

	assert_eq!(response.status(), StatusCode::OK);
	assert_eq!(response.headers()["access-control-allow-origin"], "*");
}
