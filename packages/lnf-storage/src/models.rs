use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Clone, Debug, sqlx::FromRow)]
pub struct Report {
	pub report_id: Uuid,
	pub user_id: Option<Uuid>,
	pub kind: String,
	pub title: String,
	pub description: String,
	pub category: String,
	pub image_urls: Vec<String>,
	pub location_text: Option<String>,
	pub latitude: Option<f64>,
	pub longitude: Option<f64>,
	pub curated: bool,
	pub status: String,
	pub is_deleted: bool,
	pub contact_email: Option<String>,
	/// Email of the owning account, joined from `users`.
	pub account_email: Option<String>,
	pub embedding: Option<Vec<f32>>,
	pub embedding_model: Option<String>,
	pub embedded_at: Option<OffsetDateTime>,
	pub created_at: OffsetDateTime,
	pub updated_at: OffsetDateTime,
}
impl Report {
	pub fn has_embedding(&self) -> bool {
		self.embedding.as_ref().is_some_and(|vec| !vec.is_empty())
	}

	pub fn primary_image(&self) -> Option<&str> {
		self.image_urls.first().map(String::as_str).filter(|url| !url.trim().is_empty())
	}

	/// Address used to reach the reporter: the report's contact email, else the account email.
	pub fn reporter_email(&self) -> Option<&str> {
		[self.contact_email.as_deref(), self.account_email.as_deref()]
			.into_iter()
			.flatten()
			.map(str::trim)
			.find(|email| !email.is_empty())
	}
}

#[derive(Clone, Debug)]
pub struct NewReport {
	pub report_id: Uuid,
	pub user_id: Option<Uuid>,
	pub kind: String,
	pub title: String,
	pub description: String,
	pub category: String,
	pub image_urls: Vec<String>,
	pub location_text: Option<String>,
	pub latitude: Option<f64>,
	pub longitude: Option<f64>,
	pub curated: bool,
	pub contact_email: Option<String>,
	pub created_at: OffsetDateTime,
}

#[derive(Clone, Debug)]
pub struct StoredEmbedding {
	pub vector: Vec<f32>,
	pub model: String,
	pub embedded_at: OffsetDateTime,
}

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct LedgerKey {
	pub source_report_id: Uuid,
	pub target_report_id: Uuid,
	pub direction: &'static str,
}

#[derive(Clone, Debug)]
pub struct PendingMatch {
	pub key: LedgerKey,
	pub source_kind: &'static str,
	pub target_kind: &'static str,
	pub score: f32,
}

#[derive(Clone, Debug, sqlx::FromRow)]
pub struct MatchLedgerEntry {
	pub ledger_id: Uuid,
	pub source_report_id: Uuid,
	pub target_report_id: Uuid,
	pub direction: String,
	pub source_kind: String,
	pub target_kind: String,
	pub score: f32,
	pub notified: bool,
	pub notified_at: Option<OffsetDateTime>,
	pub claim_id: Option<Uuid>,
	pub claimed_until: Option<OffsetDateTime>,
	pub created_at: OffsetDateTime,
	pub updated_at: OffsetDateTime,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ClaimOutcome {
	Claimed,
	/// Some entry for the unordered pair has already been notified.
	AlreadyNotified,
	/// Another run holds an unexpired claim on the pair.
	InFlight,
	/// No ledger row exists for the key.
	Missing,
}

#[derive(Debug, sqlx::FromRow)]
pub struct MatchingOutboxEntry {
	pub outbox_id: Uuid,
	pub report_id: Uuid,
	pub status: String,
	pub attempts: i32,
	pub last_error: Option<String>,
	pub available_at: OffsetDateTime,
	pub created_at: OffsetDateTime,
	pub updated_at: OffsetDateTime,
}
