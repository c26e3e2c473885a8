use uuid::Uuid;

use lnf_config::MatchingMode;
use lnf_domain::report::ReportKind;
use lnf_service::RunErrorKind;

use super::{Harness, report};

#[tokio::test]
async fn failed_send_leaves_entry_pending_for_the_next_run() {
	let harness = Harness::new(MatchingMode::Deterministic, 0.70);
	let lost = report(ReportKind::Lost, "Headphones", "owner@example.edu");
	let lost_id = lost.report_id;

	harness.add(report(ReportKind::Found, "Sony headphones", "finder@example.edu"), 0.9);
	harness.store.insert(lost);
	harness.mailer.fail_next(1);

	let first = harness.service.run_matching(lost_id, 0.70).await;

	assert_eq!(first.error, None);
	assert_eq!(first.notified, 0);
	assert_eq!(first.matches_above_threshold, 1);

	let entries = harness.store.entries();

	assert_eq!(entries.len(), 1);
	assert!(!entries[0].notified);
	assert_eq!(entries[0].claim_id, None);

	let second = harness.service.run_matching(lost_id, 0.70).await;

	assert_eq!(second.notified, 1);
	assert_eq!(harness.mailer.sent().len(), 1);
	assert!(harness.store.entries()[0].notified);
}

#[tokio::test]
async fn candidate_embedding_failure_is_isolated() {
	let harness = Harness::new(MatchingMode::Deterministic, 0.70);
	let lost = report(ReportKind::Lost, "Water bottle", "owner@example.edu");
	let lost_id = lost.report_id;
	let healthy = harness.add(report(ReportKind::Found, "Bottle", "a@example.edu"), 0.8);
	let broken = harness.add(report(ReportKind::Found, "Corrupt upload", "b@example.edu"), 0.95);

	harness.embedding.fail_title("Corrupt upload");
	harness.store.insert(lost);

	let summary = harness.service.run_matching(lost_id, 0.70).await;

	assert_eq!(summary.error, None);
	assert_eq!(summary.processed, 2);
	assert_eq!(summary.notified, 1);

	let entries = harness.store.entries();

	assert_eq!(entries.len(), 1);
	assert_eq!(entries[0].target_report_id, healthy);
	assert!(!harness.store.report(broken).has_embedding());
}

#[tokio::test]
async fn source_embedding_failure_aborts_with_error() {
	let harness = Harness::new(MatchingMode::Deterministic, 0.70);
	let lost = report(ReportKind::Lost, "Broken source", "owner@example.edu");
	let lost_id = lost.report_id;

	harness.add(report(ReportKind::Found, "Anything", "finder@example.edu"), 0.9);
	harness.embedding.fail_title("Broken source");
	harness.store.insert(lost);

	let summary = harness.service.run_matching(lost_id, 0.70).await;
	let error = summary.error.expect("Expected a run error.");

	assert_eq!(error.kind, RunErrorKind::Provider);
	assert!(error.is_retryable());
	assert_eq!(summary.processed, 0);
	assert_eq!(summary.notified, 0);
	assert!(harness.store.entries().is_empty());
}

#[tokio::test]
async fn comparison_failure_aborts_with_error() {
	let harness = Harness::new(MatchingMode::Deterministic, 0.70);
	let lost = report(ReportKind::Lost, "Notebook", "owner@example.edu");
	let lost_id = lost.report_id;

	harness.add(report(ReportKind::Found, "Moleskine", "finder@example.edu"), 0.9);
	harness.store.insert(lost);
	*harness.embedding.fail_compare.lock().unwrap() = true;

	let summary = harness.service.run_matching(lost_id, 0.70).await;
	let error = summary.error.expect("Expected a run error.");

	assert_eq!(error.kind, RunErrorKind::Provider);
	assert!(error.message.contains("model loading"));
	assert_eq!(summary.processed, 0);
	assert!(harness.mailer.sent().is_empty());
}

#[tokio::test]
async fn missing_or_deleted_report_fails_fast() {
	let harness = Harness::new(MatchingMode::Deterministic, 0.70);
	let missing = harness.service.run_matching(Uuid::new_v4(), 0.70).await;

	assert_eq!(missing.error.as_ref().map(|err| err.kind), Some(RunErrorKind::NotFound));

	let mut lost = report(ReportKind::Lost, "Deleted", "owner@example.edu");

	lost.is_deleted = true;

	let lost_id = lost.report_id;

	harness.store.insert(lost);

	let deleted = harness.service.run_matching(lost_id, 0.70).await;

	assert_eq!(deleted.error.as_ref().map(|err| err.kind), Some(RunErrorKind::NotFound));
	assert_eq!(harness.embedding.embed_calls(), 0);
}

#[tokio::test]
async fn no_counterparts_is_an_empty_success() {
	let harness = Harness::new(MatchingMode::Deterministic, 0.70);
	let lost = report(ReportKind::Lost, "Lonely glove", "owner@example.edu");
	let lost_id = lost.report_id;

	harness.store.insert(lost);

	let summary = harness.service.run_matching(lost_id, 0.70).await;

	assert_eq!(summary.error, None);
	assert_eq!(summary.processed, 0);
	assert_eq!(summary.notified, 0);
}

#[tokio::test]
async fn removed_and_deleted_counterparts_are_not_considered() {
	let harness = Harness::new(MatchingMode::Deterministic, 0.70);
	let lost = report(ReportKind::Lost, "Phone", "owner@example.edu");
	let lost_id = lost.report_id;
	let mut removed = report(ReportKind::Found, "Phone A", "a@example.edu");
	let mut deleted = report(ReportKind::Found, "Phone B", "b@example.edu");

	removed.status = "removed".to_string();
	deleted.is_deleted = true;

	harness.add(removed, 0.9);
	harness.add(deleted, 0.9);
	harness.add(report(ReportKind::Lost, "Other lost phone", "c@example.edu"), 0.9);
	harness.store.insert(lost);

	let summary = harness.service.run_matching(lost_id, 0.70).await;

	assert_eq!(summary.processed, 0);
	assert!(harness.mailer.sent().is_empty());
}

#[tokio::test]
async fn missing_recipient_keeps_entry_pending() {
	let harness = Harness::new(MatchingMode::Deterministic, 0.70);
	let mut lost = report(ReportKind::Lost, "Textbook", "not-an-address");

	lost.account_email = None;

	let lost_id = lost.report_id;

	harness.add(report(ReportKind::Found, "Chemistry textbook", "finder@example.edu"), 0.9);
	harness.store.insert(lost);

	let summary = harness.service.run_matching(lost_id, 0.70).await;

	assert_eq!(summary.notified, 0);
	assert_eq!(summary.matches_above_threshold, 1);

	let entries = harness.store.entries();

	assert_eq!(entries.len(), 1);
	assert!(!entries[0].notified);
	assert!(harness.mailer.sent().is_empty());
}
