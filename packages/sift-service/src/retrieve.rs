use std::panic::AssertUnwindSafe;

use futures_util::{FutureExt, future};

use sift_domain::{Passage, RetrievalQuery, merge::PassageMerger};
use sift_providers::collections::SearchParams;

use crate::{Error, SiftService};

/// Search settings shared by every call of one batch.
#[derive(Debug, Clone, Copy)]
pub struct RetrievalParams<'a> {
	pub api_key: &'a str,
	pub top_k: u32,
	pub score_threshold: f32,
	pub semantic_weight: f32,
}

/// Result of one collection call. Failures are values so a batch can fold them.
#[derive(Debug)]
pub enum CollectionOutcome {
	Retrieved { collection_id: String, passages: Vec<Passage> },
	Failed { collection_id: String, error: Error },
}
impl CollectionOutcome {
	/// Passages contributed to the batch; empty for a failed call.
	pub fn into_passages(self) -> Vec<Passage> {
		match self {
			Self::Retrieved { passages, .. } => passages,
			Self::Failed { .. } => Vec::new(),
		}
	}
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchStats {
	pub calls: usize,
	pub failed_calls: usize,
	pub received: usize,
	pub kept: usize,
}

impl SiftService {
	pub async fn retrieve_collection(
		&self,
		query: &RetrievalQuery,
		params: RetrievalParams<'_>,
	) -> CollectionOutcome {
		let search = SearchParams {
			collection_id: &query.collection_id,
			query: &query.query_text,
			api_key: params.api_key,
			top_k: params.top_k,
			score_threshold: params.score_threshold,
			semantic_weight: params.semantic_weight,
		};

		match self.providers.collections.search(&self.cfg.providers.collections, search).await {
			Ok(page) => {
				tracing::debug!(
					collection_id = %query.collection_id,
					passage_count = page.passages.len(),
					skipped = page.skipped,
					"Collection search returned."
				);

				CollectionOutcome::Retrieved {
					collection_id: query.collection_id.clone(),
					passages: page.passages,
				}
			},
			Err(err) => {
				tracing::warn!(
					collection_id = %query.collection_id,
					error = %err,
					kind = err.kind(),
					hint = err.hint().unwrap_or_default(),
					"Collection search failed; continuing without it."
				);

				CollectionOutcome::Failed {
					collection_id: query.collection_id.clone(),
					error: err.into(),
				}
			},
		}
	}

	/// Runs one search per query concurrently and merges the results in query order. Individual
	/// failures, including panics, only remove that call's contribution.
	pub async fn batch_retrieve(
		&self,
		queries: &[RetrievalQuery],
		params: RetrievalParams<'_>,
	) -> Vec<Passage> {
		let calls = queries.iter().map(|query| async move {
			match AssertUnwindSafe(self.retrieve_collection(query, params)).catch_unwind().await {
				Ok(outcome) => outcome,
				Err(payload) => {
					let error = Error::panicked(payload);

					tracing::warn!(
						collection_id = %query.collection_id,
						error = %error,
						"Collection search panicked; continuing without it."
					);

					CollectionOutcome::Failed { collection_id: query.collection_id.clone(), error }
				},
			}
		});
		let outcomes = future::join_all(calls).await;
		let (passages, stats) = fold_outcomes(outcomes);

		tracing::info!(
			calls = stats.calls,
			failed_calls = stats.failed_calls,
			received = stats.received,
			kept = stats.kept,
			"Retrieval batch merged."
		);

		passages
	}
}

/// Folds outcomes in submission order into one deduplicated passage list.
pub fn fold_outcomes<I>(outcomes: I) -> (Vec<Passage>, BatchStats)
where
	I: IntoIterator<Item = CollectionOutcome>,
{
	let mut merger = PassageMerger::new();
	let mut calls = 0;
	let mut failed_calls = 0;

	for outcome in outcomes {
		calls += 1;

		if matches!(outcome, CollectionOutcome::Failed { .. }) {
			failed_calls += 1;
		}

		merger.extend(outcome.into_passages());
	}

	let (passages, merge) = merger.finish();

	(passages, BatchStats { calls, failed_calls, received: merge.received, kept: merge.kept })
}
