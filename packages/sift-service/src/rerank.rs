use std::collections::HashSet;

use futures_util::future;

use sift_domain::{
	Passage,
	scoring::{self, ScoreBoard},
};

use crate::{Error, Result, SiftService};

/// Result of a rerank call. Every variant carries a usable passage list.
#[derive(Debug)]
pub enum RerankOutcome {
	Reranked(Vec<Passage>),
	/// Input was empty or already within `top_k`; the backend was not called.
	Unchanged(Vec<Passage>),
	/// The backend failed; passages are the first `top_k` in pre-rerank order.
	Fallback { passages: Vec<Passage>, error: Error },
}
impl RerankOutcome {
	pub fn passages(&self) -> &[Passage] {
		match self {
			Self::Reranked(passages) | Self::Unchanged(passages) => passages,
			Self::Fallback { passages, .. } => passages,
		}
	}

	pub fn into_passages(self) -> Vec<Passage> {
		match self {
			Self::Reranked(passages) | Self::Unchanged(passages) => passages,
			Self::Fallback { passages, .. } => passages,
		}
	}

	pub fn is_fallback(&self) -> bool {
		matches!(self, Self::Fallback { .. })
	}
}

impl SiftService {
	/// Reorders passages by the backend's relevance to `query` and keeps `top_k`. Returned
	/// passages carry the backend score.
	pub async fn rerank(
		&self,
		query: &str,
		passages: Vec<Passage>,
		top_k: usize,
	) -> RerankOutcome {
		if top_k == 0 {
			return RerankOutcome::Unchanged(Vec::new());
		}
		if passages.len() <= top_k {
			return RerankOutcome::Unchanged(passages);
		}

		match self.score_pass(query, &passages, top_k).await {
			Ok(ranked) => RerankOutcome::Reranked(ranked),
			Err(err) => {
				tracing::warn!(
					error = %err,
					passage_count = passages.len(),
					top_k,
					"Rerank failed; keeping retrieval order."
				);

				RerankOutcome::Fallback { passages: keep_first(passages, top_k), error: err }
			},
		}
	}

	/// Scores every passage under each query and ranks by the mean of the scores each passage
	/// received. A query pass that fails contributes nothing.
	pub async fn rerank_multi(
		&self,
		queries: &[String],
		passages: Vec<Passage>,
		top_k: usize,
	) -> RerankOutcome {
		if queries.is_empty() || passages.is_empty() {
			return RerankOutcome::Unchanged(keep_first(passages, top_k));
		}

		let full = passages.len();
		let passes = future::join_all(
			queries.iter().map(|query| self.score_pass(query, &passages, full)),
		)
		.await;
		let mut board = ScoreBoard::new();
		let mut last_error = None;

		for (query, pass) in queries.iter().zip(passes) {
			match pass {
				Ok(scored) => board.record_pass(&scored),
				Err(err) => {
					tracing::warn!(error = %err, %query, "Rerank pass failed; skipping it.");

					last_error = Some(err);
				},
			}
		}

		if board.is_empty() {
			let error = last_error.unwrap_or_else(|| Error::Internal {
				message: "Every rerank pass returned no scores.".to_string(),
			});

			tracing::warn!(error = %error, "Multi-query rerank failed; keeping retrieval order.");

			return RerankOutcome::Fallback { passages: keep_first(passages, top_k), error };
		}

		tracing::debug!(
			query_count = queries.len(),
			passage_count = full,
			"Averaged rerank scores."
		);

		RerankOutcome::Reranked(scoring::rank_by_mean(passages, &board, top_k))
	}

	/// One backend call. Hits are mapped back to the passages they index, in backend order, with
	/// the backend score; invalid or repeated indices are dropped.
	async fn score_pass(
		&self,
		query: &str,
		passages: &[Passage],
		top_n: usize,
	) -> Result<Vec<Passage>> {
		let docs: Vec<String> = passages.iter().map(|passage| passage.content.clone()).collect();
		let hits =
			self.providers.rerank.rerank(&self.cfg.providers.rerank, query, &docs, top_n).await?;
		let mut seen = HashSet::new();
		let mut ranked = Vec::with_capacity(top_n.min(hits.len()));

		for hit in hits {
			let passage = usize::try_from(hit.index).ok().and_then(|index| passages.get(index));
			let Some(passage) = passage else {
				tracing::warn!(index = hit.index, "Rerank hit index is out of range; skipping it.");

				continue;
			};

			if !seen.insert(hit.index) {
				continue;
			}

			ranked.push(passage.clone().with_score(hit.relevance_score));

			if ranked.len() >= top_n {
				break;
			}
		}

		if ranked.is_empty() {
			return Err(Error::Provider {
				message: "Rerank response referenced no submitted document.".to_string(),
			});
		}

		Ok(ranked)
	}
}

fn keep_first(mut passages: Vec<Passage>, top_k: usize) -> Vec<Passage> {
	passages.truncate(top_k);

	passages
}
