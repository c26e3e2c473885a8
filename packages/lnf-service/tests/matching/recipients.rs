use lnf_config::MatchingMode;
use lnf_domain::report::ReportKind;

use super::{Harness, report};

#[tokio::test]
async fn deterministic_mode_notifies_the_triggering_reporter() {
	let harness = Harness::new(MatchingMode::Deterministic, 0.70);
	let found = report(ReportKind::Found, "Student ID card", "finder@example.edu");
	let found_id = found.report_id;

	harness.add(report(ReportKind::Lost, "ID card", "owner@example.edu"), 0.9);
	harness.store.insert(found);

	let summary = harness.service.run_matching(found_id, 0.70).await;

	assert_eq!(summary.notified, 1);
	assert_eq!(harness.mailer.sent()[0].to, "finder@example.edu");
}

#[tokio::test]
async fn contact_email_falls_back_to_account_email() {
	let harness = Harness::new(MatchingMode::Production, 0.70);
	let mut lost = report(ReportKind::Lost, "Glasses", "");

	lost.contact_email = None;
	lost.account_email = Some("account@example.edu".to_string());

	let lost_id = lost.report_id;

	harness.add(report(ReportKind::Found, "Reading glasses", "finder@example.edu"), 0.9);
	harness.store.insert(lost);

	let summary = harness.service.run_matching(lost_id, 0.70).await;

	assert_eq!(summary.notified, 1);
	assert_eq!(harness.mailer.sent()[0].to, "account@example.edu");
}

#[tokio::test]
async fn curated_reports_score_on_semantics_alone() {
	let harness = Harness::new(MatchingMode::Production, 0.70);
	let mut found = report(ReportKind::Found, "Office intake: black wallet", "office@example.edu");

	found.curated = true;

	let found_id = found.report_id;
	let lost_id = harness.add(report(ReportKind::Lost, "Wallet", "owner@example.edu"), 0.72);

	harness.store.insert(found);

	let summary = harness.service.run_matching(found_id, 0.70).await;

	assert_eq!(summary.notified, 1);

	let entries = harness.store.entries();

	assert_eq!(entries[0].target_report_id, lost_id);
	assert!(super::approx(entries[0].score, 0.72));
	assert_eq!(harness.mailer.sent()[0].to, "owner@example.edu");
}
