use serde::Deserialize;
use serde_json::Value;

use sift_domain::{CollectionDescriptor, Decision, RetrievalQuery};

use crate::{Error, Result, SiftService};

/// Result of the relevance step. A fallback still carries a usable decision.
#[derive(Debug)]
pub enum DecisionOutcome {
	Decided { decision: Decision, reason: Option<String> },
	Fallback { decision: Decision, error: Error },
}
impl DecisionOutcome {
	pub fn decision(&self) -> &Decision {
		match self {
			Self::Decided { decision, .. } | Self::Fallback { decision, .. } => decision,
		}
	}

	pub fn into_decision(self) -> Decision {
		match self {
			Self::Decided { decision, .. } | Self::Fallback { decision, .. } => decision,
		}
	}

	pub fn is_fallback(&self) -> bool {
		matches!(self, Self::Fallback { .. })
	}
}

#[derive(Debug, Deserialize)]
struct DecisionOutput {
	need_retrieval: bool,
	#[serde(default)]
	retrieval_queries: Vec<RetrievalQuery>,
	#[serde(default)]
	reason: Option<String>,
}

impl SiftService {
	/// Asks the reasoning backend whether the question needs retrieval. Never fails: transport
	/// and decoding problems degrade to [`Decision::fallback`].
	pub async fn decide(
		&self,
		question: &str,
		collections: &[CollectionDescriptor],
		document: Option<&str>,
	) -> DecisionOutcome {
		let messages = build_decision_messages(question, collections, document);
		let raw = match self
			.providers
			.reasoning
			.complete(&self.cfg.providers.reasoning, &messages)
			.await
		{
			Ok(value) => value,
			Err(err) => {
				tracing::warn!(
					error = %err,
					kind = err.kind(),
					"Relevance decision failed; retrieving from every collection."
				);

				return DecisionOutcome::Fallback {
					decision: Decision::fallback(question, collections),
					error: err.into(),
				};
			},
		};

		match decode_decision(raw) {
			Ok((decision, reason)) => {
				tracing::debug!(
					need_retrieval = decision.need_retrieval(),
					query_count = decision.queries().len(),
					reason = reason.as_deref().unwrap_or_default(),
					"Relevance decision decoded."
				);

				DecisionOutcome::Decided { decision, reason }
			},
			Err(err) => {
				tracing::warn!(
					error = %err,
					"Relevance decision was malformed; retrieving from every collection."
				);

				DecisionOutcome::Fallback {
					decision: Decision::fallback(question, collections),
					error: err,
				}
			},
		}
	}
}

fn decode_decision(raw: Value) -> Result<(Decision, Option<String>)> {
	let output: DecisionOutput = serde_json::from_value(raw).map_err(|err| Error::Provider {
		message: format!("Decision output does not match the schema: {err}"),
	})?;

	let blank = |query: &RetrievalQuery| {
		query.collection_id.trim().is_empty() || query.query_text.trim().is_empty()
	};

	if output.need_retrieval && output.retrieval_queries.iter().any(blank) {
		return Err(Error::Provider {
			message: "Decision output has a query with a blank dataset_id or query.".to_string(),
		});
	}

	let reason = output.reason.filter(|reason| !reason.trim().is_empty());

	Ok((Decision::new(output.need_retrieval, output.retrieval_queries), reason))
}

fn build_decision_messages(
	question: &str,
	collections: &[CollectionDescriptor],
	document: Option<&str>,
) -> Vec<Value> {
	let catalog = collections
		.iter()
		.map(|collection| {
			format!("- dataset_id: {}\n  description: {}", collection.id, collection.description)
		})
		.collect::<Vec<_>>()
		.join("\n");
	let schema = serde_json::json!({
		"need_retrieval": "boolean",
		"retrieval_queries": [{ "dataset_id": "string", "query": "string" }],
		"reason": "string"
	});
	let schema_text = serde_json::to_string_pretty(&schema).unwrap_or_else(|_| {
		"{\"need_retrieval\": \"boolean\", \"retrieval_queries\": []}".to_string()
	});
	let system_prompt = format!(
		"You are a retrieval planner for a knowledge base assistant. \
Decide whether answering the user's question requires searching the knowledge collections below.\n\
Available collections:\n{catalog}\n\
Rules:\n\
- Retrieve when the question needs specific facts, data, document content or domain expertise.\n\
- Do not retrieve for greetings, small talk or general common knowledge.\n\
- When retrieving, write one or more concise search queries for each relevant collection. \
Several queries may target the same collection from different angles.\n\
- Queries should carry the core keywords and meaning of the question.\n\
- When need_retrieval is false, retrieval_queries must be an empty array.\n\
Output must be valid JSON only and must match this schema exactly:\n{schema_text}"
	);
	let user_prompt = match document {
		Some(document) => format!(
			"Related document:\n{document}\n\nQuestion:\n{question}\n\n\
Decide whether more information must be retrieved from the collections."
		),
		None => format!(
			"Question:\n{question}\n\n\
Decide whether information must be retrieved from the collections."
		),
	};

	vec![
		serde_json::json!({ "role": "system", "content": system_prompt }),
		serde_json::json!({ "role": "user", "content": user_prompt }),
	]
}

#[cfg(test)]
mod tests {
	use super::*;

	fn collection(id: &str, description: &str) -> CollectionDescriptor {
		CollectionDescriptor { id: id.to_string(), description: description.to_string() }
	}

	fn collections() -> Vec<CollectionDescriptor> {
		vec![
			collection("docs", "Product manual"),
			collection("faq", "Support answers"),
		]
	}

	#[test]
	fn prompt_lists_every_collection_and_the_question() {
		let messages = build_decision_messages("How do I import?", &collections(), None);
		let system = messages[0]["content"].as_str().expect("system content");
		let user = messages[1]["content"].as_str().expect("user content");

		assert_eq!(messages[0]["role"], "system");
		assert!(system.contains("dataset_id: docs"));
		assert!(system.contains("description: Support answers"));
		assert!(user.contains("How do I import?"));
		assert!(!user.contains("Related document"));
	}

	#[test]
	fn prompt_puts_document_before_question() {
		let messages = build_decision_messages("Q?", &collections(), Some("DOC BODY"));
		let user = messages[1]["content"].as_str().expect("user content");

		assert!(user.find("DOC BODY") < user.find("Q?"));
	}

	#[test]
	fn decodes_queries_and_reason() {
		let raw = serde_json::json!({
			"need_retrieval": true,
			"retrieval_queries": [
				{ "dataset_id": "docs", "query": "import csv" },
				{ "dataset_id": "docs", "query": "import limits" }
			],
			"reason": "needs product facts"
		});
		let (decision, reason) = decode_decision(raw).expect("decode failed");

		assert!(decision.need_retrieval());
		assert_eq!(decision.queries().len(), 2);
		assert_eq!(reason.as_deref(), Some("needs product facts"));
	}

	#[test]
	fn drops_queries_when_retrieval_not_needed() {
		let raw = serde_json::json!({
			"need_retrieval": false,
			"retrieval_queries": [{ "dataset_id": "docs", "query": "anything" }]
		});
		let (decision, _) = decode_decision(raw).expect("decode failed");

		assert!(!decision.need_retrieval());
		assert!(decision.queries().is_empty());
	}

	#[test]
	fn keeps_empty_query_list_for_the_controller() {
		let raw = serde_json::json!({ "need_retrieval": true, "retrieval_queries": [] });
		let (decision, _) = decode_decision(raw).expect("decode failed");

		assert!(!decision.is_actionable());
	}

	#[test]
	fn rejects_missing_flag_and_blank_entries() {
		assert!(decode_decision(serde_json::json!({ "retrieval_queries": [] })).is_err());
		assert!(decode_decision(serde_json::json!({ "need_retrieval": "yes" })).is_err());
		assert!(
			decode_decision(serde_json::json!({
				"need_retrieval": true,
				"retrieval_queries": [{ "dataset_id": " ", "query": "x" }]
			}))
			.is_err()
		);
		assert!(
			decode_decision(serde_json::json!({
				"need_retrieval": true,
				"retrieval_queries": [{ "dataset_id": "docs" }]
			}))
			.is_err()
		);
	}
}
