use std::time::Duration;

use reqwest::Client;
use serde_json::Value;

use crate::{Error, Result};

/// One ranked entry as reported by the backend. `index` points into the submitted documents and
/// is not bounds-checked here.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RerankHit {
	pub index: i64,
	pub relevance_score: f32,
}

/// Returns hits in the order the backend ranked them.
pub async fn rerank(
	cfg: &sift_config::ProviderConfig,
	query: &str,
	docs: &[String],
	top_n: usize,
) -> Result<Vec<RerankHit>> {
	let client = Client::builder().timeout(Duration::from_millis(cfg.timeout_ms)).build()?;
	let url = format!("{}{}", cfg.api_base, cfg.path);
	let body = serde_json::json!({
		"model": cfg.model,
		"query": query,
		"documents": docs,
		"top_n": top_n,
		"return_documents": true,
	});
	let headers = crate::auth_headers(&cfg.api_key, &cfg.default_headers)?;
	let json = crate::post_json(&client, &url, headers, &body).await?;

	parse_rerank_response(json)
}

fn parse_rerank_response(json: Value) -> Result<Vec<RerankHit>> {
	let results = json
		.get("results")
		.or_else(|| json.get("data"))
		.and_then(|v| v.as_array())
		.ok_or_else(|| Error::invalid_response("Rerank response is missing results array."))?;
	let mut hits = Vec::with_capacity(results.len());

	for item in results {
		let index = item
			.get("index")
			.and_then(|v| v.as_i64())
			.ok_or_else(|| Error::invalid_response("Rerank result missing index."))?;
		let score = item
			.get("relevance_score")
			.or_else(|| item.get("score"))
			.and_then(|v| v.as_f64())
			.ok_or_else(|| Error::invalid_response("Rerank result missing score."))?;

		hits.push(RerankHit { index, relevance_score: score as f32 });
	}

	Ok(hits)
}
