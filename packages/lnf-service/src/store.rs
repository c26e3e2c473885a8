use time::OffsetDateTime;
use uuid::Uuid;

use lnf_domain::report::ReportKind;
use lnf_storage::{
	db::Db,
	ledger,
	models::{ClaimOutcome, LedgerKey, MatchLedgerEntry, PendingMatch, Report, StoredEmbedding},
	reports,
};

use crate::{BoxFuture, MatchLedger, ReportStore, Result};

/// Postgres-backed report store and match ledger.
#[derive(Clone)]
pub struct PgStore {
	db: Db,
}
impl PgStore {
	pub fn new(db: Db) -> Self {
		Self { db }
	}

	pub fn db(&self) -> &Db {
		&self.db
	}
}
impl ReportStore for PgStore {
	fn fetch_report<'a>(&'a self, report_id: Uuid) -> BoxFuture<'a, Result<Option<Report>>> {
		Box::pin(async move { Ok(reports::fetch_report(&self.db.pool, report_id).await?) })
	}

	fn fetch_counterparts<'a>(&'a self, kind: ReportKind) -> BoxFuture<'a, Result<Vec<Report>>> {
		Box::pin(async move {
			Ok(reports::fetch_active_by_kind(&self.db.pool, kind.as_str()).await?)
		})
	}

	fn store_embedding<'a>(
		&'a self,
		report_id: Uuid,
		embedding: &'a StoredEmbedding,
	) -> BoxFuture<'a, Result<bool>> {
		Box::pin(async move {
			Ok(reports::store_embedding_if_absent(&self.db.pool, report_id, embedding).await?)
		})
	}
}
impl MatchLedger for PgStore {
	fn upsert_pending<'a>(
		&'a self,
		pending: &'a PendingMatch,
		now: OffsetDateTime,
	) -> BoxFuture<'a, Result<MatchLedgerEntry>> {
		Box::pin(async move { Ok(ledger::upsert_pending(&self.db.pool, pending, now).await?) })
	}

	fn claim_notification<'a>(
		&'a self,
		key: &'a LedgerKey,
		claim_id: Uuid,
		now: OffsetDateTime,
		lease_until: OffsetDateTime,
	) -> BoxFuture<'a, Result<ClaimOutcome>> {
		Box::pin(async move {
			Ok(ledger::claim_notification(&self.db, key, claim_id, now, lease_until).await?)
		})
	}

	fn complete_notification<'a>(
		&'a self,
		key: &'a LedgerKey,
		claim_id: Uuid,
		now: OffsetDateTime,
	) -> BoxFuture<'a, Result<bool>> {
		Box::pin(async move {
			Ok(ledger::complete_notification(&self.db.pool, key, claim_id, now).await?)
		})
	}

	fn release_claim<'a>(
		&'a self,
		key: &'a LedgerKey,
		claim_id: Uuid,
		now: OffsetDateTime,
	) -> BoxFuture<'a, Result<()>> {
		Box::pin(async move { Ok(ledger::release_claim(&self.db.pool, key, claim_id, now).await?) })
	}
}
