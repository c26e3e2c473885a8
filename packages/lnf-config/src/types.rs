use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Clone, Debug, Deserialize)]
pub struct Config {
	pub service: Service,
	pub storage: Storage,
	pub providers: Providers,
	#[serde(default)]
	pub matching: Matching,
	#[serde(default)]
	pub worker: Worker,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Service {
	pub http_bind: String,
	pub log_level: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Storage {
	pub postgres: Postgres,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Postgres {
	pub dsn: String,
	pub pool_max_conns: u32,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Providers {
	pub embedding: EmbeddingProviderConfig,
	pub mail: MailProviderConfig,
}

/// Connection settings for the CLIP-style embedding service.
///
/// The service exposes two endpoints: one that embeds text plus an optional image, and one that
/// scores a query vector against a batch of candidate vectors.
#[derive(Clone, Debug, Deserialize)]
pub struct EmbeddingProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	#[serde(default)]
	pub api_key: Option<String>,
	#[serde(default = "default_embed_path")]
	pub embed_path: String,
	#[serde(default = "default_compare_path")]
	pub compare_path: String,
	pub model: String,
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct MailProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	#[serde(default)]
	pub api_key: Option<String>,
	pub path: String,
	/// Sender mailbox, e.g. `Lost & Found <no-reply@example.edu>`.
	pub from: String,
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Matching {
	#[serde(default = "default_similarity_threshold")]
	pub similarity_threshold: f32,
	#[serde(default)]
	pub mode: MatchingMode,
	/// Base URL used to build item deep links in notification emails.
	#[serde(default = "default_app_url")]
	pub app_url: String,
	#[serde(default = "default_claim_lease_seconds")]
	pub claim_lease_seconds: i64,
}
impl Default for Matching {
	fn default() -> Self {
		Self {
			similarity_threshold: default_similarity_threshold(),
			mode: MatchingMode::default(),
			app_url: default_app_url(),
			claim_lease_seconds: default_claim_lease_seconds(),
		}
	}
}

/// Run mode of the matcher.
///
/// `Deterministic` disables the location and date factors and notifies the reporter of the
/// triggering report. It exists so fixtures produce scores equal to the raw semantic score.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum MatchingMode {
	#[default]
	Production,
	Deterministic,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Worker {
	#[serde(default = "default_poll_interval_ms")]
	pub poll_interval_ms: u64,
	#[serde(default = "default_lease_seconds")]
	pub lease_seconds: i64,
	#[serde(default = "default_max_attempts")]
	pub max_attempts: i32,
	#[serde(default = "default_base_backoff_ms")]
	pub base_backoff_ms: i64,
	#[serde(default = "default_max_backoff_ms")]
	pub max_backoff_ms: i64,
}
impl Default for Worker {
	fn default() -> Self {
		Self {
			poll_interval_ms: default_poll_interval_ms(),
			lease_seconds: default_lease_seconds(),
			max_attempts: default_max_attempts(),
			base_backoff_ms: default_base_backoff_ms(),
			max_backoff_ms: default_max_backoff_ms(),
		}
	}
}

fn default_embed_path() -> String {
	"/embed".to_string()
}

fn default_compare_path() -> String {
	"/compare".to_string()
}

fn default_similarity_threshold() -> f32 {
	0.75
}

fn default_app_url() -> String {
	"http://localhost:3000".to_string()
}

fn default_claim_lease_seconds() -> i64 {
	60
}

fn default_poll_interval_ms() -> u64 {
	500
}

fn default_lease_seconds() -> i64 {
	120
}

fn default_max_attempts() -> i32 {
	3
}

fn default_base_backoff_ms() -> i64 {
	1_000
}

fn default_max_backoff_ms() -> i64 {
	60_000
}
