use std::time::Duration;

use lnf_config::MatchingMode;
use lnf_domain::report::ReportKind;

use super::{Harness, SpyMailer, report, test_config};

fn short_lease_harness(send_delay: Duration) -> Harness {
	let mut cfg = test_config(MatchingMode::Production, 0.70);

	cfg.matching.claim_lease_seconds = 1;

	Harness::with_config(cfg, SpyMailer::with_delay(send_delay))
}

#[tokio::test]
async fn concurrent_runs_on_both_sides_send_once() {
	let harness = Harness::with_mailer(
		MatchingMode::Production,
		0.70,
		SpyMailer::with_delay(Duration::from_millis(50)),
	);
	let lost = report(ReportKind::Lost, "Camera", "owner@example.edu");
	let found = report(ReportKind::Found, "Canon camera", "finder@example.edu");
	let lost_id = lost.report_id;
	let found_id = found.report_id;

	harness.add(lost, 0.9);
	harness.add(found, 0.9);

	let (forward, reverse) = tokio::join!(
		harness.service.run_matching(lost_id, 0.70),
		harness.service.run_matching(found_id, 0.70),
	);

	assert_eq!(forward.notified + reverse.notified, 1);
	assert_eq!(harness.mailer.sent().len(), 1);
	assert_eq!(harness.store.notified_entries().len(), 1);
}

#[tokio::test]
async fn concurrent_runs_of_the_same_report_send_once() {
	let harness = Harness::with_mailer(
		MatchingMode::Deterministic,
		0.70,
		SpyMailer::with_delay(Duration::from_millis(50)),
	);
	let lost = report(ReportKind::Lost, "Tablet", "owner@example.edu");
	let lost_id = lost.report_id;

	harness.add(report(ReportKind::Found, "iPad", "finder@example.edu"), 0.88);
	harness.store.insert(lost);

	let runs = tokio::join!(
		harness.service.run_matching(lost_id, 0.70),
		harness.service.run_matching(lost_id, 0.70),
		harness.service.run_matching(lost_id, 0.70),
	);

	assert_eq!(runs.0.notified + runs.1.notified + runs.2.notified, 1);
	assert_eq!(harness.mailer.sent().len(), 1);
	assert_eq!(harness.store.entries().len(), 1);
}

#[tokio::test]
async fn send_outliving_the_lease_never_doubles_up() {
	let harness = short_lease_harness(Duration::from_millis(1_500));
	let lost = report(ReportKind::Lost, "Laptop", "owner@example.edu");
	let found = report(ReportKind::Found, "Dell laptop", "finder@example.edu");
	let lost_id = lost.report_id;
	let found_id = found.report_id;

	harness.add(lost, 0.9);
	harness.add(found, 0.9);

	let (forward, reverse) = tokio::join!(harness.service.run_matching(lost_id, 0.70), async {
		tokio::time::sleep(Duration::from_millis(1_200)).await;

		harness.service.run_matching(found_id, 0.70).await
	});

	assert!(forward.notified + reverse.notified <= 1);
	assert!(harness.mailer.sent().len() <= 1);
	assert!(harness.store.notified_entries().len() <= 1);
	assert_eq!(harness.mailer.sent().len(), harness.store.notified_entries().len());
	assert_eq!(forward.notified, 0, "a send past its claim budget must be abandoned");
}

#[tokio::test]
async fn send_inside_the_lease_blocks_the_opposite_run() {
	let harness = short_lease_harness(Duration::from_millis(300));
	let lost = report(ReportKind::Lost, "Scarf", "owner@example.edu");
	let found = report(ReportKind::Found, "Wool scarf", "finder@example.edu");
	let lost_id = lost.report_id;
	let found_id = found.report_id;

	harness.add(lost, 0.9);
	harness.add(found, 0.9);

	let (forward, reverse) = tokio::join!(harness.service.run_matching(lost_id, 0.70), async {
		tokio::time::sleep(Duration::from_millis(100)).await;

		harness.service.run_matching(found_id, 0.70).await
	});

	assert_eq!(forward.notified, 1);
	assert_eq!(reverse.notified, 0);
	assert_eq!(reverse.matches_above_threshold, 1);
	assert_eq!(harness.mailer.sent().len(), 1);
	assert_eq!(harness.store.notified_entries().len(), 1);
}
