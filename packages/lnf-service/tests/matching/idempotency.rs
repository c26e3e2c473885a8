use lnf_config::MatchingMode;
use lnf_domain::report::ReportKind;

use super::{Harness, approx, report};

#[tokio::test]
async fn rerun_after_notification_sends_nothing() {
	let harness = Harness::new(MatchingMode::Deterministic, 0.70);
	let lost = report(ReportKind::Lost, "Grey hoodie", "owner@example.edu");
	let lost_id = lost.report_id;
	let found_id = harness.add(report(ReportKind::Found, "Hoodie", "finder@example.edu"), 0.8);

	harness.store.insert(lost);

	let first = harness.service.run_matching(lost_id, 0.70).await;

	assert_eq!(first.notified, 1);

	harness.embedding.set_score(found_id, 0.9);

	let second = harness.service.run_matching(lost_id, 0.70).await;

	assert_eq!(second.notified, 0);
	assert_eq!(second.matches_above_threshold, 1);
	assert_eq!(harness.mailer.sent().len(), 1);

	let entries = harness.store.entries();

	assert_eq!(entries.len(), 1);
	assert!(entries[0].notified);
	// The score is refreshed even though nobody is notified again.
	assert!(approx(entries[0].score, 0.9));
}

#[tokio::test]
async fn opposite_direction_is_skipped_after_notification() {
	let harness = Harness::new(MatchingMode::Production, 0.70);
	let lost = report(ReportKind::Lost, "Bike lock", "owner@example.edu");
	let found = report(ReportKind::Found, "U-lock", "finder@example.edu");
	let lost_id = lost.report_id;
	let found_id = found.report_id;

	harness.add(lost, 0.9);
	harness.add(found, 0.9);

	let forward = harness.service.run_matching(lost_id, 0.70).await;
	let reverse = harness.service.run_matching(found_id, 0.70).await;

	assert_eq!(forward.notified, 1);
	assert_eq!(reverse.notified, 0);
	assert_eq!(reverse.matches_above_threshold, 1);
	assert_eq!(harness.mailer.sent().len(), 1);

	let entries = harness.store.entries();

	assert_eq!(entries.len(), 2);
	assert_eq!(harness.store.notified_entries().len(), 1);
	assert_eq!(harness.store.notified_entries()[0].direction, "lost_to_found");
}

#[tokio::test]
async fn embedding_is_computed_once_across_runs() {
	let harness = Harness::new(MatchingMode::Deterministic, 0.70);
	let lost = report(ReportKind::Lost, "Calculator", "owner@example.edu");
	let lost_id = lost.report_id;

	harness.add(report(ReportKind::Found, "TI-84", "finder@example.edu"), 0.5);
	harness.store.insert(lost);
	harness.service.run_matching(lost_id, 0.70).await;

	let calls_after_first = harness.embedding.embed_calls();
	let vector = harness.store.report(lost_id).embedding;

	harness.service.run_matching(lost_id, 0.70).await;

	assert_eq!(calls_after_first, 2);
	assert_eq!(harness.embedding.embed_calls(), 2);
	assert_eq!(harness.store.report(lost_id).embedding, vector);
}
