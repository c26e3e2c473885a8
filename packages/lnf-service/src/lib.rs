pub mod embeddings;
pub mod ledger;
pub mod matching;
pub mod notification;
pub mod scoring;
pub mod store;

mod error;

pub use error::{Error, Result};
pub use ledger::MatchOutcome;
pub use matching::{RunError, RunErrorKind, RunSummary};
pub use notification::{DeliveryError, MatchEmail};
pub use scoring::ScoredCandidate;

use std::{future::Future, pin::Pin, sync::Arc};

use time::OffsetDateTime;
use uuid::Uuid;

use lnf_config::{Config, EmbeddingProviderConfig, MailProviderConfig};
use lnf_domain::report::ReportKind;
use lnf_providers::{
	embedding::{self, CompareItem, CompareScore, EmbedInput, Embedding},
	mail::{self, OutgoingMail},
};
use lnf_storage::{
	db::Db,
	models::{ClaimOutcome, LedgerKey, MatchLedgerEntry, PendingMatch, Report, StoredEmbedding},
};

use crate::store::PgStore;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

pub trait EmbeddingProvider
where
	Self: Send + Sync,
{
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		input: EmbedInput<'a>,
	) -> BoxFuture<'a, lnf_providers::Result<Embedding>>;

	fn compare<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		query: &'a [f32],
		items: &'a [CompareItem<'a>],
	) -> BoxFuture<'a, lnf_providers::Result<Vec<CompareScore>>>;
}

pub trait Mailer
where
	Self: Send + Sync,
{
	fn send<'a>(
		&'a self,
		cfg: &'a MailProviderConfig,
		mail: &'a OutgoingMail<'a>,
	) -> BoxFuture<'a, lnf_providers::Result<Option<String>>>;
}

/// Read access to reports plus the one write the matcher is allowed: storing a missing embedding.
pub trait ReportStore
where
	Self: Send + Sync,
{
	fn fetch_report<'a>(&'a self, report_id: Uuid) -> BoxFuture<'a, Result<Option<Report>>>;

	/// Every non-deleted, non-removed report of `kind`.
	fn fetch_counterparts<'a>(&'a self, kind: ReportKind) -> BoxFuture<'a, Result<Vec<Report>>>;

	/// Stores `embedding` only if the report has none yet. Returns whether this call wrote it.
	fn store_embedding<'a>(
		&'a self,
		report_id: Uuid,
		embedding: &'a StoredEmbedding,
	) -> BoxFuture<'a, Result<bool>>;
}

pub trait MatchLedger
where
	Self: Send + Sync,
{
	fn upsert_pending<'a>(
		&'a self,
		pending: &'a PendingMatch,
		now: OffsetDateTime,
	) -> BoxFuture<'a, Result<MatchLedgerEntry>>;

	fn claim_notification<'a>(
		&'a self,
		key: &'a LedgerKey,
		claim_id: Uuid,
		now: OffsetDateTime,
		lease_until: OffsetDateTime,
	) -> BoxFuture<'a, Result<ClaimOutcome>>;

	fn complete_notification<'a>(
		&'a self,
		key: &'a LedgerKey,
		claim_id: Uuid,
		now: OffsetDateTime,
	) -> BoxFuture<'a, Result<bool>>;

	fn release_claim<'a>(
		&'a self,
		key: &'a LedgerKey,
		claim_id: Uuid,
		now: OffsetDateTime,
	) -> BoxFuture<'a, Result<()>>;
}

#[derive(Clone)]
pub struct Providers {
	pub embedding: Arc<dyn EmbeddingProvider>,
	pub mailer: Arc<dyn Mailer>,
}
impl Providers {
	pub fn new(embedding: Arc<dyn EmbeddingProvider>, mailer: Arc<dyn Mailer>) -> Self {
		Self { embedding, mailer }
	}
}
impl Default for Providers {
	fn default() -> Self {
		let provider = Arc::new(DefaultProviders);

		Self { embedding: provider.clone(), mailer: provider }
	}
}

#[derive(Clone)]
pub struct Stores {
	pub reports: Arc<dyn ReportStore>,
	pub ledger: Arc<dyn MatchLedger>,
}
impl Stores {
	pub fn new(reports: Arc<dyn ReportStore>, ledger: Arc<dyn MatchLedger>) -> Self {
		Self { reports, ledger }
	}

	pub fn postgres(db: Db) -> Self {
		let store = Arc::new(PgStore::new(db));

		Self { reports: store.clone(), ledger: store }
	}
}

pub struct LnfService {
	pub cfg: Config,
	pub stores: Stores,
	pub providers: Providers,
}
impl LnfService {
	pub fn new(cfg: Config, db: Db) -> Self {
		Self { cfg, stores: Stores::postgres(db), providers: Providers::default() }
	}

	pub fn with_providers(cfg: Config, db: Db, providers: Providers) -> Self {
		Self { cfg, stores: Stores::postgres(db), providers }
	}

	pub fn with_stores(cfg: Config, stores: Stores, providers: Providers) -> Self {
		Self { cfg, stores, providers }
	}
}

struct DefaultProviders;
impl EmbeddingProvider for DefaultProviders {
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		input: EmbedInput<'a>,
	) -> BoxFuture<'a, lnf_providers::Result<Embedding>> {
		Box::pin(embedding::embed(cfg, input))
	}

	fn compare<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		query: &'a [f32],
		items: &'a [CompareItem<'a>],
	) -> BoxFuture<'a, lnf_providers::Result<Vec<CompareScore>>> {
		Box::pin(embedding::compare(cfg, query, items))
	}
}
impl Mailer for DefaultProviders {
	fn send<'a>(
		&'a self,
		cfg: &'a MailProviderConfig,
		mail: &'a OutgoingMail<'a>,
	) -> BoxFuture<'a, lnf_providers::Result<Option<String>>> {
		Box::pin(mail::send(cfg, mail))
	}
}
