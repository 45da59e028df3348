use std::collections::HashMap;

use crate::passage::{Passage, PassageKey};

/// Scores collected for each passage identity across independent rerank passes.
///
/// A passage that a pass did not return contributes nothing for that pass; it is not counted as
/// a zero.
#[derive(Debug, Default)]
pub struct ScoreBoard {
	scores: HashMap<PassageKey, Vec<f32>>,
}
impl ScoreBoard {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn record(&mut self, key: PassageKey, score: f32) {
		self.scores.entry(key).or_default().push(score);
	}

	pub fn record_pass(&mut self, pass: &[Passage]) {
		for passage in pass {
			self.record(passage.key(), passage.score);
		}
	}

	pub fn mean(&self, key: &PassageKey) -> Option<f32> {
		let scores = self.scores.get(key).filter(|scores| !scores.is_empty())?;
		let sum: f64 = scores.iter().map(|score| f64::from(*score)).sum();

		Some((sum / scores.len() as f64) as f32)
	}

	pub fn is_empty(&self) -> bool {
		self.scores.is_empty()
	}
}

/// Rescores every passage with its mean (passages with no recorded score keep their own), then
/// orders by score descending and keeps `top_k`. Equal scores keep input order.
pub fn rank_by_mean(passages: Vec<Passage>, board: &ScoreBoard, top_k: usize) -> Vec<Passage> {
	let mut rescored: Vec<Passage> = passages
		.into_iter()
		.map(|passage| match board.mean(&passage.key()) {
			Some(mean) => passage.with_score(mean),
			None => passage,
		})
		.collect();

	rescored.sort_by(|a, b| b.score.total_cmp(&a.score));
	rescored.truncate(top_k);

	rescored
}
