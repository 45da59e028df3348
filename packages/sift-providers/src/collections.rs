use std::time::Duration;

use reqwest::Client;
use serde_json::{Map, Value};

use sift_config::CollectionProviderConfig;
use sift_domain::Passage;

use crate::{Error, Result};

/// Parameters for one hybrid-search call against one collection.
#[derive(Debug, Clone, Copy)]
pub struct SearchParams<'a> {
	pub collection_id: &'a str,
	pub query: &'a str,
	pub api_key: &'a str,
	pub top_k: u32,
	pub score_threshold: f32,
	pub semantic_weight: f32,
}

#[derive(Debug, Default)]
pub struct SearchPage {
	pub passages: Vec<Passage>,
	/// Records dropped because they could not be normalized.
	pub skipped: usize,
}

pub async fn search(
	cfg: &CollectionProviderConfig,
	params: SearchParams<'_>,
) -> Result<SearchPage> {
	let client = build_client(cfg)?;
	let url = cfg.url_for(params.collection_id);
	let headers = crate::auth_headers(params.api_key, &cfg.default_headers)?;
	let body = build_search_body(&params);
	let json = crate::post_json(&client, &url, headers, &body).await?;

	parse_search_response(json, params.collection_id)
}

/// Connect and read phases get their own ceilings. Write and pool-wait phases have no dedicated
/// knob in the client, so they are folded into the overall request deadline.
fn build_client(cfg: &CollectionProviderConfig) -> Result<Client> {
	let total_ms = cfg.connect_timeout_ms
		+ cfg.write_timeout_ms
		+ cfg.read_timeout_ms
		+ cfg.pool_timeout_ms;

	Ok(Client::builder()
		.connect_timeout(Duration::from_millis(cfg.connect_timeout_ms))
		.read_timeout(Duration::from_millis(cfg.read_timeout_ms))
		.timeout(Duration::from_millis(total_ms))
		.build()?)
}

fn build_search_body(params: &SearchParams<'_>) -> Value {
	serde_json::json!({
		"query": params.query,
		"retrieval_model": {
			"search_method": "hybrid_search",
			"reranking_enable": false,
			"weights": params.semantic_weight,
			"top_k": params.top_k,
			"score_threshold_enabled": true,
			"score_threshold": params.score_threshold,
		},
	})
}

fn parse_search_response(json: Value, collection_id: &str) -> Result<SearchPage> {
	if !json.is_object() {
		return Err(Error::invalid_response("Search response must be a JSON object."));
	}

	let records = match json.get("records") {
		None | Some(Value::Null) => return Ok(SearchPage::default()),
		Some(Value::Array(records)) => records,
		Some(_) =>
			return Err(Error::invalid_response("Search response records must be an array.")),
	};
	let mut page = SearchPage { passages: Vec::with_capacity(records.len()), skipped: 0 };

	for (index, record) in records.iter().enumerate() {
		match parse_record(record, collection_id) {
			Some(passage) => page.passages.push(passage),
			None => {
				tracing::warn!(collection_id, index, "Skipping malformed search record.");

				page.skipped += 1;
			},
		}
	}

	Ok(page)
}

fn parse_record(record: &Value, collection_id: &str) -> Option<Passage> {
	let segment = record.get("segment")?.as_object()?;
	let passage_id = segment.get("id")?.as_str()?;
	let content = segment.get("content")?.as_str()?;
	let score = match record.get("score") {
		None => 0.0,
		Some(value) => value.as_f64()?,
	};
	let document = segment.get("document").and_then(Value::as_object);
	let metadata = document
		.and_then(|doc| doc.get("doc_metadata"))
		.and_then(Value::as_object)
		.cloned()
		.unwrap_or_else(Map::new);

	Some(Passage {
		collection_id: collection_id.to_string(),
		collection_name: None,
		document_id: segment
			.get("document_id")
			.and_then(Value::as_str)
			.unwrap_or_default()
			.to_string(),
		document_name: document
			.and_then(|doc| doc.get("name"))
			.and_then(Value::as_str)
			.map(str::to_string),
		passage_id: passage_id.to_string(),
		content: content.to_string(),
		score: score as f32,
		position: segment.get("position").and_then(Value::as_i64),
		metadata,
	})
}
