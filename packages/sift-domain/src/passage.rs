use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A retrievable unit of text and its provenance.
///
/// Field names on the wire follow the collection backend's vocabulary (dataset, segment).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Passage {
	#[serde(rename = "dataset_id")]
	pub collection_id: String,
	#[serde(rename = "dataset_name")]
	pub collection_name: Option<String>,
	pub document_id: String,
	pub document_name: Option<String>,
	#[serde(rename = "segment_id")]
	pub passage_id: String,
	pub content: String,
	pub score: f32,
	pub position: Option<i64>,
	#[serde(default)]
	pub metadata: Map<String, Value>,
}
impl Passage {
	pub fn key(&self) -> PassageKey {
		PassageKey {
			collection_id: self.collection_id.clone(),
			passage_id: self.passage_id.clone(),
		}
	}

	pub fn with_score(mut self, score: f32) -> Self {
		self.score = score;

		self
	}
}

/// Identity of a passage across retrieval calls and rerank passes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PassageKey {
	pub collection_id: String,
	pub passage_id: String,
}
