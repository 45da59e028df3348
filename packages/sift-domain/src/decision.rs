use serde::{Deserialize, Serialize};

/// A knowledge collection the caller offers for retrieval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionDescriptor {
	#[serde(rename = "dataset_id", alias = "collection_id")]
	pub id: String,
	pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetrievalQuery {
	#[serde(rename = "dataset_id", alias = "collection_id")]
	pub collection_id: String,
	#[serde(rename = "query", alias = "query_text")]
	pub query_text: String,
}
impl RetrievalQuery {
	pub fn new(collection_id: impl Into<String>, query_text: impl Into<String>) -> Self {
		Self { collection_id: collection_id.into(), query_text: query_text.into() }
	}
}

/// Outcome of the relevance decision.
///
/// A decision that skips retrieval never carries queries. A decision that asks for retrieval is
/// expected to carry at least one; [`Decision::is_actionable`] reports whether it does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decision {
	need_retrieval: bool,
	queries: Vec<RetrievalQuery>,
}
impl Decision {
	/// Any queries are discarded when `need_retrieval` is false.
	pub fn new(need_retrieval: bool, queries: Vec<RetrievalQuery>) -> Self {
		if need_retrieval { Self::retrieve(queries) } else { Self::skip() }
	}

	pub fn skip() -> Self {
		Self { need_retrieval: false, queries: Vec::new() }
	}

	pub fn retrieve(queries: Vec<RetrievalQuery>) -> Self {
		Self { need_retrieval: true, queries }
	}

	/// Safe default used when the reasoning backend cannot be trusted: retrieve from every
	/// collection with the question verbatim.
	pub fn fallback(question: &str, collections: &[CollectionDescriptor]) -> Self {
		Self::retrieve(
			collections
				.iter()
				.map(|collection| RetrievalQuery::new(collection.id.clone(), question))
				.collect(),
		)
	}

	pub fn need_retrieval(&self) -> bool {
		self.need_retrieval
	}

	pub fn queries(&self) -> &[RetrievalQuery] {
		&self.queries
	}

	pub fn into_queries(self) -> Vec<RetrievalQuery> {
		self.queries
	}

	pub fn is_actionable(&self) -> bool {
		!self.need_retrieval || !self.queries.is_empty()
	}
}
