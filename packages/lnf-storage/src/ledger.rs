use sqlx::PgExecutor;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
	Error, Result,
	db::Db,
	models::{ClaimOutcome, LedgerKey, MatchLedgerEntry, PendingMatch},
};

const ENTRY_COLUMNS: &str = "\
\tledger_id,
\tsource_report_id,
\ttarget_report_id,
\tdirection,
\tsource_kind,
\ttarget_kind,
\tscore,
\tnotified,
\tnotified_at,
\tclaim_id,
\tclaimed_until,
\tcreated_at,
\tupdated_at";

/// Notification state of one ledger row, as seen by a claim attempt.
#[derive(Clone, Debug)]
pub struct ClaimState {
	pub source_report_id: Uuid,
	pub target_report_id: Uuid,
	pub direction: String,
	pub notified: bool,
	pub claimed_until: Option<OffsetDateTime>,
}
impl ClaimState {
	fn matches(&self, key: &LedgerKey) -> bool {
		self.source_report_id == key.source_report_id
			&& self.target_report_id == key.target_report_id
			&& self.direction == key.direction
	}

	fn claim_live(&self, now: OffsetDateTime) -> bool {
		self.claimed_until.is_some_and(|until| until > now)
	}
}

/// Advisory lock id shared by both orderings of a report pair.
pub fn pair_lock_key(a: Uuid, b: Uuid) -> i64 {
	let (low, high) = if a <= b { (a, b) } else { (b, a) };
	let mut hasher = blake3::Hasher::new();

	hasher.update(b"lnf:match-pair:");
	hasher.update(low.as_bytes());
	hasher.update(high.as_bytes());

	let digest = hasher.finalize();
	let mut bytes = [0_u8; 8];

	bytes.copy_from_slice(&digest.as_bytes()[..8]);

	i64::from_be_bytes(bytes)
}

/// Decides a claim for `key` given every ledger row of the same unordered pair.
pub fn evaluate_claim(key: &LedgerKey, pair_rows: &[ClaimState], now: OffsetDateTime) -> ClaimOutcome {
	if pair_rows.iter().any(|row| row.notified) {
		return ClaimOutcome::AlreadyNotified;
	}
	if pair_rows.iter().any(|row| row.claim_live(now)) {
		return ClaimOutcome::InFlight;
	}
	if !pair_rows.iter().any(|row| row.matches(key)) {
		return ClaimOutcome::Missing;
	}

	ClaimOutcome::Claimed
}

/// Inserts a pending entry or refreshes the score of an existing one. Never touches `notified`.
pub async fn upsert_pending<'e, E>(
	executor: E,
	pending: &PendingMatch,
	now: OffsetDateTime,
) -> Result<MatchLedgerEntry>
where
	E: PgExecutor<'e>,
{
	if !(0.0..=1.0).contains(&pending.score) {
		return Err(Error::InvalidArgument(format!(
			"Ledger score {} is outside 0.0-1.0.",
			pending.score
		)));
	}

	let sql = format!(
		"\
INSERT INTO match_ledger (
\tledger_id,
\tsource_report_id,
\ttarget_report_id,
\tdirection,
\tsource_kind,
\ttarget_kind,
\tscore,
\tnotified,
\tcreated_at,
\tupdated_at
)
VALUES ($1,$2,$3,$4,$5,$6,$7,false,$8,$8)
ON CONFLICT (source_report_id, target_report_id, direction) DO UPDATE
SET score = EXCLUDED.score,
\tupdated_at = EXCLUDED.updated_at
RETURNING
{ENTRY_COLUMNS}"
	);
	let entry = sqlx::query_as::<_, MatchLedgerEntry>(&sql)
		.bind(Uuid::new_v4())
		.bind(pending.key.source_report_id)
		.bind(pending.key.target_report_id)
		.bind(pending.key.direction)
		.bind(pending.source_kind)
		.bind(pending.target_kind)
		.bind(pending.score)
		.bind(now)
		.fetch_one(executor)
		.await?;

	Ok(entry)
}

pub async fn fetch_entry<'e, E>(executor: E, key: &LedgerKey) -> Result<Option<MatchLedgerEntry>>
where
	E: PgExecutor<'e>,
{
	let sql = format!(
		"\
SELECT
{ENTRY_COLUMNS}
FROM match_ledger
WHERE source_report_id = $1 AND target_report_id = $2 AND direction = $3"
	);
	let entry = sqlx::query_as::<_, MatchLedgerEntry>(&sql)
		.bind(key.source_report_id)
		.bind(key.target_report_id)
		.bind(key.direction)
		.fetch_optional(executor)
		.await?;

	Ok(entry)
}

/// Entries where the report appears on either side, best score first.
pub async fn list_entries_for_report<'e, E>(
	executor: E,
	report_id: Uuid,
) -> Result<Vec<MatchLedgerEntry>>
where
	E: PgExecutor<'e>,
{
	let sql = format!(
		"\
SELECT
{ENTRY_COLUMNS}
FROM match_ledger
WHERE source_report_id = $1 OR target_report_id = $1
ORDER BY score DESC, created_at ASC"
	);
	let entries =
		sqlx::query_as::<_, MatchLedgerEntry>(&sql).bind(report_id).fetch_all(executor).await?;

	Ok(entries)
}

/// Atomically reserves the right to notify for the pair behind `key`.
///
/// Runs under a transaction-scoped advisory lock derived from the unordered pair, so claims for
/// `(a, b)` and `(b, a)` serialize against each other.
pub async fn claim_notification(
	db: &Db,
	key: &LedgerKey,
	claim_id: Uuid,
	now: OffsetDateTime,
	lease_until: OffsetDateTime,
) -> Result<ClaimOutcome> {
	let mut tx = db.pool.begin().await?;

	sqlx::query("SELECT pg_advisory_xact_lock($1)")
		.bind(pair_lock_key(key.source_report_id, key.target_report_id))
		.execute(&mut *tx)
		.await?;

	let rows: Vec<(Uuid, Uuid, String, bool, Option<OffsetDateTime>)> = sqlx::query_as(
		"\
SELECT source_report_id, target_report_id, direction, notified, claimed_until
FROM match_ledger
WHERE (source_report_id = $1 AND target_report_id = $2)
\tOR (source_report_id = $2 AND target_report_id = $1)
FOR UPDATE",
	)
	.bind(key.source_report_id)
	.bind(key.target_report_id)
	.fetch_all(&mut *tx)
	.await?;
	let states = rows
		.into_iter()
		.map(|(source_report_id, target_report_id, direction, notified, claimed_until)| {
			ClaimState { source_report_id, target_report_id, direction, notified, claimed_until }
		})
		.collect::<Vec<_>>();
	let outcome = evaluate_claim(key, &states, now);

	if outcome == ClaimOutcome::Claimed {
		sqlx::query(
			"\
UPDATE match_ledger
SET claim_id = $1,
\tclaimed_until = $2,
\tupdated_at = $3
WHERE source_report_id = $4 AND target_report_id = $5 AND direction = $6",
		)
		.bind(claim_id)
		.bind(lease_until)
		.bind(now)
		.bind(key.source_report_id)
		.bind(key.target_report_id)
		.bind(key.direction)
		.execute(&mut *tx)
		.await?;
	}

	tx.commit().await?;

	Ok(outcome)
}

/// Marks the entry notified if it is still unnotified and still owned by `claim_id`.
pub async fn complete_notification<'e, E>(
	executor: E,
	key: &LedgerKey,
	claim_id: Uuid,
	now: OffsetDateTime,
) -> Result<bool>
where
	E: PgExecutor<'e>,
{
	let result = sqlx::query(
		"\
UPDATE match_ledger
SET notified = true,
\tnotified_at = $1,
\tclaim_id = NULL,
\tclaimed_until = NULL,
\tupdated_at = $1
WHERE source_report_id = $2
\tAND target_report_id = $3
\tAND direction = $4
\tAND claim_id = $5
\tAND notified = false",
	)
	.bind(now)
	.bind(key.source_report_id)
	.bind(key.target_report_id)
	.bind(key.direction)
	.bind(claim_id)
	.execute(executor)
	.await
	.map_err(|err| match err {
		sqlx::Error::Database(db_err) if db_err.is_unique_violation() => Error::Conflict(format!(
			"Pair {}/{} already has a notified entry.",
			key.source_report_id, key.target_report_id
		)),
		other => Error::Sqlx(other),
	})?;

	Ok(result.rows_affected() == 1)
}

pub async fn release_claim<'e, E>(
	executor: E,
	key: &LedgerKey,
	claim_id: Uuid,
	now: OffsetDateTime,
) -> Result<()>
where
	E: PgExecutor<'e>,
{
	sqlx::query(
		"\
UPDATE match_ledger
SET claim_id = NULL,
\tclaimed_until = NULL,
\tupdated_at = $1
WHERE source_report_id = $2
\tAND target_report_id = $3
\tAND direction = $4
\tAND claim_id = $5",
	)
	.bind(now)
	.bind(key.source_report_id)
	.bind(key.target_report_id)
	.bind(key.direction)
	.bind(claim_id)
	.execute(executor)
	.await?;

	Ok(())
}
