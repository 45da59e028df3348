use std::collections::HashSet;

use crate::passage::{Passage, PassageKey};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeStats {
	pub received: usize,
	pub kept: usize,
	pub duplicate_keys: usize,
	pub duplicate_contents: usize,
}

/// First-seen-wins merge over passages, deduplicated by identity and, independently, by raw
/// content. Only kept passages register their keys.
#[derive(Debug, Default)]
pub struct PassageMerger {
	seen_keys: HashSet<PassageKey>,
	seen_contents: HashSet<String>,
	passages: Vec<Passage>,
	stats: MergeStats,
}
impl PassageMerger {
	pub fn new() -> Self {
		Self::default()
	}

	/// Returns whether the passage was kept.
	pub fn push(&mut self, passage: Passage) -> bool {
		self.stats.received += 1;

		let key = passage.key();

		if self.seen_keys.contains(&key) {
			self.stats.duplicate_keys += 1;

			return false;
		}
		if self.seen_contents.contains(&passage.content) {
			self.stats.duplicate_contents += 1;

			return false;
		}

		self.seen_keys.insert(key);
		self.seen_contents.insert(passage.content.clone());
		self.passages.push(passage);
		self.stats.kept += 1;

		true
	}

	pub fn extend(&mut self, passages: impl IntoIterator<Item = Passage>) {
		for passage in passages {
			self.push(passage);
		}
	}

	pub fn finish(self) -> (Vec<Passage>, MergeStats) {
		(self.passages, self.stats)
	}
}
