use std::sync::Arc;

use time::macros::datetime;
use uuid::Uuid;

use lnf_config::MatchingMode;
use lnf_service::{LnfService, Providers};
use lnf_storage::{db::Db, ledger, models::NewReport, reports};

use super::{SpyMailer, StubEmbedding, test_config};

fn new_report(kind: &str, title: &str, email: &str) -> NewReport {
	NewReport {
		report_id: Uuid::new_v4(),
		user_id: None,
		kind: kind.to_string(),
		title: title.to_string(),
		description: String::new(),
		category: "other".to_string(),
		image_urls: Vec::new(),
		location_text: None,
		latitude: None,
		longitude: None,
		curated: false,
		contact_email: Some(email.to_string()),
		created_at: datetime!(2025-09-01 9:00 UTC),
	}
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set LNF_PG_DSN to run."]
async fn postgres_run_notifies_once_per_pair() {
	let Some(base_dsn) = lnf_testkit::env_dsn() else {
		eprintln!("Skipping postgres_run_notifies_once_per_pair; set LNF_PG_DSN to run.");

		return;
	};
	let test_db =
		lnf_testkit::TestDatabase::new(&base_dsn).await.expect("Failed to create test database.");
	let mut cfg = test_config(MatchingMode::Deterministic, 0.70);

	cfg.storage.postgres.dsn = test_db.dsn().to_string();
	cfg.storage.postgres.pool_max_conns = 4;

	let db = Db::connect(&cfg.storage.postgres).await.expect("Failed to connect to Postgres.");

	db.ensure_schema().await.expect("Failed to ensure schema.");

	let lost = new_report("lost", "Blue umbrella", "owner@example.edu");
	let found = new_report("found", "Umbrella", "finder@example.edu");

	reports::insert_report(&db.pool, &lost).await.expect("Failed to insert report.");
	reports::insert_report(&db.pool, &found).await.expect("Failed to insert report.");

	let embedding = Arc::new(StubEmbedding::default());
	let mailer = Arc::new(SpyMailer::default());

	embedding.set_score(found.report_id, 0.72);
	embedding.set_score(lost.report_id, 0.72);

	let service = LnfService::with_providers(
		cfg,
		db.clone(),
		Providers::new(embedding.clone(), mailer.clone()),
	);
	let forward = service.run_matching(lost.report_id, 0.70).await;
	let reverse = service.run_matching(found.report_id, 0.70).await;
	let again = service.run_matching(lost.report_id, 0.70).await;

	assert_eq!(forward.error, None);
	assert_eq!(forward.notified, 1);
	assert_eq!(reverse.notified, 0);
	assert_eq!(again.notified, 0);
	assert_eq!(again.matches_above_threshold, 1);
	assert_eq!(mailer.sent().len(), 1);
	assert_eq!(embedding.embed_calls(), 2);

	let entries = ledger::list_entries_for_report(&db.pool, lost.report_id)
		.await
		.expect("Failed to list ledger entries.");

	assert_eq!(entries.len(), 2);
	assert_eq!(entries.iter().filter(|entry| entry.notified).count(), 1);

	let stored = reports::fetch_report(&db.pool, lost.report_id)
		.await
		.expect("Failed to fetch report.")
		.expect("Report must exist.");

	assert_eq!(stored.embedding_model.as_deref(), Some("stub-clip"));

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}
