use lnf_config::MatchingMode;
use lnf_domain::report::ReportKind;

use super::{Harness, approx, report};

#[tokio::test]
async fn lost_report_notifies_single_found_match() {
	let harness = Harness::new(MatchingMode::Deterministic, 0.70);
	let lost = report(ReportKind::Lost, "Blue umbrella", "owner@example.edu");
	let lost_id = lost.report_id;
	let found_id =
		harness.add(report(ReportKind::Found, "Umbrella, blue", "finder@example.edu"), 0.72);

	harness.store.insert(lost);

	let summary = harness.service.run_matching(lost_id, 0.70).await;

	assert_eq!(summary.error, None);
	assert_eq!(summary.processed, 1);
	assert_eq!(summary.notified, 1);
	assert_eq!(summary.matches_above_threshold, 1);
	assert!(approx(summary.threshold, 0.70));

	let entries = harness.store.entries();

	assert_eq!(entries.len(), 1);
	assert_eq!(entries[0].source_report_id, lost_id);
	assert_eq!(entries[0].target_report_id, found_id);
	assert_eq!(entries[0].direction, "lost_to_found");
	assert!(approx(entries[0].score, 0.72));
	assert!(entries[0].notified);

	let sent = harness.mailer.sent();

	assert_eq!(sent.len(), 1);
	assert_eq!(sent[0].to, "owner@example.edu");
	assert_eq!(sent[0].subject, "Lost & Found: Potential Match for \"Blue umbrella\"");
}

#[tokio::test]
async fn found_report_notifies_the_lost_reporter() {
	let harness = Harness::new(MatchingMode::Production, 0.70);
	let found = report(ReportKind::Found, "Silver laptop", "finder@example.edu");
	let found_id = found.report_id;
	let lost_id = harness.add(report(ReportKind::Lost, "Laptop", "owner@example.edu"), 0.85);

	harness.store.insert(found);

	let summary = harness.service.run_matching(found_id, 0.70).await;

	assert_eq!(summary.notified, 1);

	let entries = harness.store.entries();

	assert_eq!(entries.len(), 1);
	assert_eq!(entries[0].source_report_id, found_id);
	assert_eq!(entries[0].target_report_id, lost_id);
	assert_eq!(entries[0].direction, "found_to_lost");
	assert_eq!(entries[0].source_kind, "found");
	assert_eq!(entries[0].target_kind, "lost");

	let sent = harness.mailer.sent();

	assert_eq!(sent.len(), 1);
	assert_eq!(sent[0].to, "owner@example.edu");
	assert!(sent[0].subject.contains("\"Laptop\""));
}

#[tokio::test]
async fn score_just_below_threshold_is_not_recorded() {
	let harness = Harness::new(MatchingMode::Deterministic, 0.70);
	let lost = report(ReportKind::Lost, "Red scarf", "owner@example.edu");
	let lost_id = lost.report_id;

	harness.add(report(ReportKind::Found, "Scarf", "finder@example.edu"), 0.69);
	harness.store.insert(lost);

	let summary = harness.service.run_matching(lost_id, 0.70).await;

	assert_eq!(summary.processed, 1);
	assert_eq!(summary.notified, 0);
	assert_eq!(summary.matches_above_threshold, 0);
	assert!(harness.store.notified_entries().is_empty());
	assert!(harness.store.entries().is_empty());
	assert!(harness.mailer.sent().is_empty());
}

#[tokio::test]
async fn two_found_matches_notify_twice_best_first() {
	let harness = Harness::new(MatchingMode::Deterministic, 0.70);
	let lost = report(ReportKind::Lost, "Black wallet", "owner@example.edu");
	let lost_id = lost.report_id;
	let weaker = harness.add(report(ReportKind::Found, "Wallet", "a@example.edu"), 0.75);
	let stronger = harness.add(report(ReportKind::Found, "Leather wallet", "b@example.edu"), 0.82);

	harness.store.insert(lost);

	let summary = harness.service.run_matching(lost_id, 0.70).await;

	assert_eq!(summary.processed, 2);
	assert_eq!(summary.notified, 2);
	assert_eq!(summary.matches_above_threshold, 2);

	let entries = harness.store.entries();

	assert_eq!(entries.len(), 2);
	assert_eq!(entries[0].target_report_id, stronger);
	assert_eq!(entries[1].target_report_id, weaker);
	assert!(entries.iter().all(|entry| entry.notified));

	let sent = harness.mailer.sent();

	assert_eq!(sent.len(), 2);
	assert!(sent[0].text.contains(&stronger.to_string()));
	assert!(sent[1].text.contains(&weaker.to_string()));
}

#[tokio::test]
async fn production_mode_blends_minor_factors() {
	let harness = Harness::new(MatchingMode::Production, 0.5);
	let lost = report(ReportKind::Lost, "Green bottle", "owner@example.edu");
	let lost_id = lost.report_id;

	harness.add(report(ReportKind::Found, "Bottle", "finder@example.edu"), 0.72);
	harness.store.insert(lost);

	let summary = harness.service.run_matching(lost_id, 0.5).await;

	assert_eq!(summary.notified, 1);

	// No images and no location: clip 0.97, date 0.03, and both reports share a timestamp.
	let entries = harness.store.entries();

	assert!(approx(entries[0].score, 0.72 * 0.97 + 0.03));
}

#[tokio::test]
async fn run_with_config_uses_configured_threshold() {
	let harness = Harness::new(MatchingMode::Deterministic, 0.9);
	let lost = report(ReportKind::Lost, "Keys", "owner@example.edu");
	let lost_id = lost.report_id;

	harness.add(report(ReportKind::Found, "Key ring", "finder@example.edu"), 0.85);
	harness.store.insert(lost);

	let summary = harness.service.run_matching_with_config(lost_id).await;

	assert!(approx(summary.threshold, 0.9));
	assert_eq!(summary.matches_above_threshold, 0);
	assert_eq!(summary.notified, 0);
}
