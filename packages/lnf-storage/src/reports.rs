use sqlx::PgExecutor;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
	Result,
	models::{NewReport, Report, StoredEmbedding},
};

const REPORT_SELECT: &str = "\
SELECT
\tr.report_id,
\tr.user_id,
\tr.kind,
\tr.title,
\tr.description,
\tr.category,
\tr.image_urls,
\tr.location_text,
\tr.latitude,
\tr.longitude,
\tr.curated,
\tr.status,
\tr.is_deleted,
\tr.contact_email,
\tu.email AS account_email,
\tr.embedding,
\tr.embedding_model,
\tr.embedded_at,
\tr.created_at,
\tr.updated_at
FROM reports r
LEFT JOIN users u ON u.user_id = r.user_id";

pub async fn fetch_report<'e, E>(executor: E, report_id: Uuid) -> Result<Option<Report>>
where
	E: PgExecutor<'e>,
{
	let sql = format!("{REPORT_SELECT}\nWHERE r.report_id = $1");
	let row = sqlx::query_as::<_, Report>(&sql).bind(report_id).fetch_optional(executor).await?;

	Ok(row)
}

/// Every active report of `kind`, oldest first. No limit is applied.
pub async fn fetch_active_by_kind<'e, E>(executor: E, kind: &str) -> Result<Vec<Report>>
where
	E: PgExecutor<'e>,
{
	let sql = format!(
		"{REPORT_SELECT}
WHERE r.kind = $1
\tAND r.is_deleted = false
\tAND r.status <> 'removed'
ORDER BY r.created_at ASC, r.report_id ASC"
	);
	let rows = sqlx::query_as::<_, Report>(&sql).bind(kind).fetch_all(executor).await?;

	Ok(rows)
}

/// Writes the embedding only when the report has none yet. Returns whether this call stored it.
pub async fn store_embedding_if_absent<'e, E>(
	executor: E,
	report_id: Uuid,
	embedding: &StoredEmbedding,
) -> Result<bool>
where
	E: PgExecutor<'e>,
{
	let result = sqlx::query(
		"\
UPDATE reports
SET embedding = $1,
\tembedding_model = $2,
\tembedded_at = $3
WHERE report_id = $4
\tAND (embedding IS NULL OR cardinality(embedding) = 0)",
	)
	.bind(&embedding.vector)
	.bind(&embedding.model)
	.bind(embedding.embedded_at)
	.bind(report_id)
	.execute(executor)
	.await?;

	Ok(result.rows_affected() == 1)
}

pub async fn insert_user<'e, E>(executor: E, user_id: Uuid, name: &str, email: &str) -> Result<()>
where
	E: PgExecutor<'e>,
{
	sqlx::query("INSERT INTO users (user_id, name, email) VALUES ($1,$2,$3)")
		.bind(user_id)
		.bind(name)
		.bind(email)
		.execute(executor)
		.await?;

	Ok(())
}

pub async fn insert_report<'e, E>(executor: E, report: &NewReport) -> Result<()>
where
	E: PgExecutor<'e>,
{
	sqlx::query(
		"\
INSERT INTO reports (
\treport_id,
\tuser_id,
\tkind,
\ttitle,
\tdescription,
\tcategory,
\timage_urls,
\tlocation_text,
\tlatitude,
\tlongitude,
\tcurated,
\tcontact_email,
\tcreated_at,
\tupdated_at
)
VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11,$12,$13,$13)",
	)
	.bind(report.report_id)
	.bind(report.user_id)
	.bind(&report.kind)
	.bind(&report.title)
	.bind(&report.description)
	.bind(&report.category)
	.bind(&report.image_urls)
	.bind(&report.location_text)
	.bind(report.latitude)
	.bind(report.longitude)
	.bind(report.curated)
	.bind(&report.contact_email)
	.bind(report.created_at)
	.execute(executor)
	.await?;

	Ok(())
}

pub async fn set_report_status<'e, E>(
	executor: E,
	report_id: Uuid,
	status: &str,
	now: OffsetDateTime,
) -> Result<()>
where
	E: PgExecutor<'e>,
{
	sqlx::query("UPDATE reports SET status = $1, updated_at = $2 WHERE report_id = $3")
		.bind(status)
		.bind(now)
		.bind(report_id)
		.execute(executor)
		.await?;

	Ok(())
}
