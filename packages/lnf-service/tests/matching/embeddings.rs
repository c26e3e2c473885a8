use lnf_config::MatchingMode;
use lnf_domain::report::ReportKind;

use super::{Harness, report};

#[tokio::test]
async fn ensure_embedding_twice_calls_provider_once() {
	let harness = Harness::new(MatchingMode::Deterministic, 0.70);
	let lost = report(ReportKind::Lost, "Blue backpack", "owner@example.edu");
	let lost_id = lost.report_id;

	harness.store.insert(lost);

	let mut first = harness.store.report(lost_id);

	harness.service.ensure_embedding(&mut first).await.expect("First ensure failed.");

	let stored = harness.store.report(lost_id);

	harness.service.ensure_embedding(&mut first).await.expect("Second ensure failed.");

	let mut refetched = harness.store.report(lost_id);

	harness.service.ensure_embedding(&mut refetched).await.expect("Third ensure failed.");

	assert_eq!(harness.embedding.embed_calls(), 1);
	assert_eq!(stored.embedding, first.embedding);
	assert_eq!(harness.store.report(lost_id).embedding, stored.embedding);
	assert_eq!(stored.embedding_model.as_deref(), Some("stub-clip"));
}

#[tokio::test]
async fn concurrent_writer_wins_and_is_adopted() {
	let harness = Harness::new(MatchingMode::Deterministic, 0.70);
	let lost = report(ReportKind::Lost, "Scarf", "owner@example.edu");
	let lost_id = lost.report_id;

	harness.store.insert(lost);

	let mut stale = harness.store.report(lost_id);

	// Another run stores its vector after `stale` was read.
	harness.store.update(lost_id, |report| {
		report.embedding = Some(vec![9.0, 9.0, 9.0, 9.0]);
		report.embedding_model = Some("other".to_string());
	});
	harness.service.ensure_embedding(&mut stale).await.expect("Ensure failed.");

	assert_eq!(stale.embedding, Some(vec![9.0, 9.0, 9.0, 9.0]));
	assert_eq!(harness.store.report(lost_id).embedding, Some(vec![9.0, 9.0, 9.0, 9.0]));
}

#[tokio::test]
async fn failing_candidates_are_dropped_from_the_batch() {
	let harness = Harness::new(MatchingMode::Deterministic, 0.70);
	let good = report(ReportKind::Found, "Umbrella", "a@example.edu");
	let bad = report(ReportKind::Found, "Unreadable", "b@example.edu");
	let good_id = good.report_id;

	harness.embedding.fail_title("Unreadable");

	let ready = harness.service.ensure_embeddings_for_candidates(vec![bad, good]).await;

	assert_eq!(ready.len(), 1);
	assert_eq!(ready[0].report_id, good_id);
	assert!(ready[0].has_embedding());
}
