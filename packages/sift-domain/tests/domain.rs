use serde_json::Map;

use sift_domain::{
	CollectionDescriptor, Decision, Passage, RetrievalQuery,
	merge::PassageMerger,
	scoring::{ScoreBoard, rank_by_mean},
};

fn passage(collection_id: &str, passage_id: &str, content: &str, score: f32) -> Passage {
	Passage {
		collection_id: collection_id.to_string(),
		collection_name: None,
		document_id: format!("doc-{passage_id}"),
		document_name: Some("Guide".to_string()),
		passage_id: passage_id.to_string(),
		content: content.to_string(),
		score,
		position: Some(1),
		metadata: Map::new(),
	}
}

fn collection(id: &str) -> CollectionDescriptor {
	CollectionDescriptor { id: id.to_string(), description: format!("{id} collection") }
}

#[test]
fn skip_decision_never_carries_queries() {
	let decision = Decision::new(false, vec![RetrievalQuery::new("docs", "how to import")]);

	assert!(!decision.need_retrieval());
	assert!(decision.queries().is_empty());
	assert!(decision.is_actionable());
}

#[test]
fn retrieval_without_queries_is_not_actionable() {
	let decision = Decision::new(true, Vec::new());

	assert!(decision.need_retrieval());
	assert!(!decision.is_actionable());
}

#[test]
fn fallback_targets_every_collection_with_the_question() {
	let decision = Decision::fallback("What is the SLA?", &[collection("docs"), collection("faq")]);

	assert!(decision.need_retrieval());
	assert_eq!(
		decision.queries(),
		&[
			RetrievalQuery::new("docs", "What is the SLA?"),
			RetrievalQuery::new("faq", "What is the SLA?"),
		]
	);
}

fn merge_batches(batches: Vec<Vec<Passage>>) -> Vec<Passage> {
	let mut merger = PassageMerger::new();

	for batch in batches {
		merger.extend(batch);
	}

	merger.finish().0
}

#[test]
fn merge_keeps_first_seen_identity() {
	let merged = merge_batches(vec![
		vec![passage("docs", "p1", "alpha", 0.9), passage("docs", "p2", "beta", 0.8)],
		vec![passage("docs", "p1", "alpha revised", 0.95), passage("docs", "p3", "gamma", 0.7)],
	]);
	let ids: Vec<&str> = merged.iter().map(|p| p.passage_id.as_str()).collect();

	assert_eq!(ids, vec!["p1", "p2", "p3"]);
	assert_eq!(merged[0].content, "alpha");
	assert!((merged[0].score - 0.9).abs() < 1e-6);
}

#[test]
fn merge_collapses_identical_content() {
	let mut merger = PassageMerger::new();

	merger.extend(vec![passage("docs", "p1", "shared text", 0.6)]);
	merger.extend(vec![passage("faq", "q9", "shared text", 0.9)]);

	let (merged, stats) = merger.finish();

	assert_eq!(merged.len(), 1);
	assert_eq!(merged[0].collection_id, "docs");
	assert_eq!(stats.duplicate_contents, 1);
}

#[test]
fn merge_of_nothing_is_empty() {
	assert!(merge_batches(Vec::new()).is_empty());
	assert!(merge_batches(vec![Vec::new(), Vec::new()]).is_empty());
}

#[test]
fn mean_of_two_passes() {
	let mut board = ScoreBoard::new();

	board.record_pass(&[passage("docs", "p1", "a", 0.8)]);
	board.record_pass(&[passage("docs", "p1", "a", 0.6)]);

	let ranked = rank_by_mean(vec![passage("docs", "p1", "a", 0.1)], &board, 5);

	assert!((ranked[0].score - 0.7).abs() < 1e-6, "Unexpected mean: {}", ranked[0].score);
}

#[test]
fn missing_from_a_pass_is_excluded_not_zeroed() {
	let mut board = ScoreBoard::new();

	board.record_pass(&[passage("docs", "p1", "a", 0.8), passage("docs", "p2", "b", 0.4)]);
	board.record_pass(&[passage("docs", "p2", "b", 0.6)]);

	let candidates = vec![passage("docs", "p1", "a", 0.0), passage("docs", "p2", "b", 0.0)];
	let ranked = rank_by_mean(candidates, &board, 5);

	assert_eq!(ranked[0].passage_id, "p1");
	assert!((ranked[0].score - 0.8).abs() < 1e-6);
	assert!((ranked[1].score - 0.5).abs() < 1e-6);
}

#[test]
fn rank_by_mean_is_stable_on_ties_and_truncates() {
	let mut board = ScoreBoard::new();

	board.record_pass(&[
		passage("docs", "p1", "a", 0.5),
		passage("docs", "p2", "b", 0.5),
		passage("docs", "p3", "c", 0.9),
	]);

	let candidates = vec![
		passage("docs", "p1", "a", 0.0),
		passage("docs", "p2", "b", 0.0),
		passage("docs", "p3", "c", 0.0),
	];
	let ranked = rank_by_mean(candidates, &board, 2);
	let ids: Vec<&str> = ranked.iter().map(|p| p.passage_id.as_str()).collect();

	assert_eq!(ids, vec!["p3", "p1"]);
}

#[test]
fn passage_serializes_with_segment_vocabulary() {
	let json = serde_json::to_value(passage("docs", "p1", "alpha", 0.5)).expect("serialize failed");

	assert_eq!(json["dataset_id"], "docs");
	assert_eq!(json["segment_id"], "p1");
	assert!(json["dataset_name"].is_null());
	assert_eq!(json["document_name"], "Guide");
}

#[test]
fn query_accepts_either_vocabulary() {
	let from_backend: RetrievalQuery =
		serde_json::from_value(serde_json::json!({ "dataset_id": "docs", "query": "q" }))
			.expect("parse failed");
	let from_model: RetrievalQuery =
		serde_json::from_value(serde_json::json!({ "collection_id": "docs", "query": "q" }))
			.expect("parse failed");

	assert_eq!(from_backend, from_model);
}
