use std::{panic::AssertUnwindSafe, time::Instant};

use futures_util::FutureExt;
use serde::{Deserialize, Serialize};
use tracing::Instrument;
use uuid::Uuid;

use sift_config::MAX_TOP_K;
use sift_domain::{CollectionDescriptor, Passage, RetrievalQuery};

use crate::{Error, Result, RetrievalParams, SiftService};

/// Caller input for one retrieval. Omitted numeric settings take the configured defaults.
#[derive(Debug, Clone, Deserialize)]
pub struct RetrieveRequest {
	#[serde(rename = "datasets", alias = "collections")]
	pub collections: Vec<CollectionDescriptor>,
	#[serde(default, rename = "dataset_api_key", alias = "collection_api_key")]
	pub collection_api_key: Option<String>,
	pub question: String,
	#[serde(default)]
	pub document: Option<String>,
	#[serde(default)]
	pub top_k: Option<u32>,
	#[serde(default)]
	pub rerank_top_k: Option<u32>,
	#[serde(default)]
	pub score_threshold: Option<f32>,
	#[serde(default)]
	pub semantic_weight: Option<f32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrieveResponse {
	pub success: bool,
	pub need_retrieval: bool,
	pub retrieval_queries: Vec<RetrievalQuery>,
	pub segments: Vec<Passage>,
	pub total_segments: usize,
	pub message: Option<String>,
	pub error: Option<String>,
}
impl RetrieveResponse {
	fn not_needed(message: String) -> Self {
		Self {
			success: true,
			need_retrieval: false,
			retrieval_queries: Vec::new(),
			segments: Vec::new(),
			total_segments: 0,
			message: Some(message),
			error: None,
		}
	}

	fn found(queries: Vec<RetrievalQuery>, segments: Vec<Passage>, message: String) -> Self {
		Self {
			success: true,
			need_retrieval: true,
			retrieval_queries: queries,
			total_segments: segments.len(),
			segments,
			message: Some(message),
			error: None,
		}
	}

	fn failed(err: &Error) -> Self {
		Self {
			success: false,
			need_retrieval: true,
			retrieval_queries: Vec::new(),
			segments: Vec::new(),
			total_segments: 0,
			message: None,
			error: Some(err.to_string()),
		}
	}
}

/// A request after validation and default resolution.
#[derive(Debug)]
struct Plan {
	collections: Vec<CollectionDescriptor>,
	api_key: String,
	question: String,
	document: Option<String>,
	top_k: u32,
	rerank_top_k: usize,
	score_threshold: f32,
	semantic_weight: f32,
}
impl Plan {
	fn rerank_query(&self) -> String {
		match &self.document {
			Some(document) => format!("{document}\n\n{}", self.question),
			None => self.question.clone(),
		}
	}
}

impl SiftService {
	/// Validates the request and runs decision, retrieval and rerank. Only validation errors are
	/// returned as `Err`; every pipeline outcome, including failures, is a response.
	pub async fn retrieve(&self, req: RetrieveRequest) -> Result<RetrieveResponse> {
		let plan = self.plan(req)?;
		let span = tracing::info_span!(
			"retrieve",
			request_id = %Uuid::new_v4(),
			collection_count = plan.collections.len()
		);

		Ok(self.run_guarded(&plan).instrument(span).await)
	}

	async fn run_guarded(&self, plan: &Plan) -> RetrieveResponse {
		let err = match AssertUnwindSafe(self.run(plan)).catch_unwind().await {
			Ok(Ok(response)) => return response,
			Ok(Err(err)) => err,
			Err(payload) => Error::panicked(payload),
		};

		tracing::error!(error = %err, "Retrieval pipeline failed.");

		RetrieveResponse::failed(&err)
	}

	async fn run(&self, plan: &Plan) -> Result<RetrieveResponse> {
		let started = Instant::now();
		let outcome =
			self.decide(&plan.question, &plan.collections, plan.document.as_deref()).await;
		let decide_secs = started.elapsed().as_secs_f64();
		let decision = outcome.into_decision();

		tracing::info!(
			need_retrieval = decision.need_retrieval(),
			query_count = decision.queries().len(),
			elapsed_ms = elapsed_ms(decide_secs),
			"Relevance decision made."
		);

		if !decision.need_retrieval() {
			return Ok(RetrieveResponse::not_needed(format!(
				"Retrieval is not needed for this question (decision {decide_secs:.2}s)."
			)));
		}
		if !decision.is_actionable() {
			return Err(Error::DecisionContract {
				message: "retrieval was requested but no queries were produced.".to_string(),
			});
		}

		let queries = decision.into_queries();
		let stage = Instant::now();
		let params = RetrievalParams {
			api_key: &plan.api_key,
			top_k: plan.top_k,
			score_threshold: plan.score_threshold,
			semantic_weight: plan.semantic_weight,
		};
		let passages = self.batch_retrieve(&queries, params).await;
		let retrieve_secs = stage.elapsed().as_secs_f64();

		tracing::info!(
			passage_count = passages.len(),
			elapsed_ms = elapsed_ms(retrieve_secs),
			"Retrieval finished."
		);

		if passages.is_empty() {
			return Ok(RetrieveResponse::found(
				queries,
				Vec::new(),
				format!(
					"No passages matched the retrieval queries (decision {decide_secs:.2}s, \
retrieval {retrieve_secs:.2}s)."
				),
			));
		}

		let stage = Instant::now();
		let rerank_query = plan.rerank_query();
		let outcome = if self.cfg.rerank.is_multi_query() {
			let texts = rerank_texts(&queries, rerank_query);

			self.rerank_multi(&texts, passages, plan.rerank_top_k).await
		} else {
			self.rerank(&rerank_query, passages, plan.rerank_top_k).await
		};
		let rerank_secs = stage.elapsed().as_secs_f64();
		let total_secs = started.elapsed().as_secs_f64();
		let segments = outcome.into_passages();

		tracing::info!(
			segment_count = segments.len(),
			elapsed_ms = elapsed_ms(rerank_secs),
			total_ms = elapsed_ms(total_secs),
			"Rerank finished."
		);

		let message = format!(
			"Returned {} passages in {total_secs:.2}s (decision {decide_secs:.2}s, retrieval \
{retrieve_secs:.2}s, rerank {rerank_secs:.2}s).",
			segments.len()
		);

		Ok(RetrieveResponse::found(queries, segments, message))
	}

	fn plan(&self, req: RetrieveRequest) -> Result<Plan> {
		let defaults = &self.cfg.retrieval;

		if req.collections.is_empty() {
			return Err(Error::invalid("datasets", "must list at least one dataset."));
		}
		if req.collections.iter().any(|collection| collection.id.trim().is_empty()) {
			return Err(Error::invalid("datasets", "must not contain a blank dataset_id."));
		}
		if req.question.trim().is_empty() {
			return Err(Error::invalid("question", "must be non-empty."));
		}

		let top_k = check_top_k("top_k", req.top_k.unwrap_or(defaults.default_top_k))?;
		let rerank_top_k = check_top_k(
			"rerank_top_k",
			req.rerank_top_k.unwrap_or(defaults.default_rerank_top_k),
		)?;
		let score_threshold = check_unit(
			"score_threshold",
			req.score_threshold.unwrap_or(defaults.default_score_threshold),
		)?;
		let semantic_weight = check_unit(
			"semantic_weight",
			req.semantic_weight.unwrap_or(defaults.default_semantic_weight),
		)?;
		let api_key = req
			.collection_api_key
			.filter(|key| !key.trim().is_empty())
			.or_else(|| self.cfg.providers.collections.api_key.clone())
			.ok_or_else(|| {
				Error::invalid(
					"dataset_api_key",
					"is required when no collection API key is configured.",
				)
			})?;

		Ok(Plan {
			collections: req.collections,
			api_key,
			question: req.question,
			document: req.document.filter(|document| !document.trim().is_empty()),
			top_k,
			rerank_top_k: rerank_top_k as usize,
			score_threshold,
			semantic_weight,
		})
	}
}

fn check_top_k(field: &str, value: u32) -> Result<u32> {
	if !(1..=MAX_TOP_K).contains(&value) {
		return Err(Error::invalid(field, format!("must be between 1 and {MAX_TOP_K}.")));
	}

	Ok(value)
}

fn check_unit(field: &str, value: f32) -> Result<f32> {
	if !value.is_finite() || !(0.0..=1.0).contains(&value) {
		return Err(Error::invalid(field, "must be between 0.0 and 1.0."));
	}

	Ok(value)
}

/// Distinct query texts in execution order, followed by the rerank query.
fn rerank_texts(queries: &[RetrievalQuery], rerank_query: String) -> Vec<String> {
	let mut texts: Vec<String> = Vec::with_capacity(queries.len() + 1);

	for text in queries.iter().map(|query| query.query_text.clone()).chain([rerank_query]) {
		if !texts.contains(&text) {
			texts.push(text);
		}
	}

	texts
}

fn elapsed_ms(secs: f64) -> u64 {
	(secs * 1_000.0) as u64
}
