mod error;
mod types;

pub use error::{Error, Result};
pub use types::{
	Config, EmbeddingProviderConfig, MailProviderConfig, Matching, MatchingMode, Postgres,
	Providers, Service, Storage, Worker,
};

use std::{fs, path::Path};

/// A notification claim must outlive a mail send that runs into its timeout.
const CLAIM_LEASE_MAIL_TIMEOUT_FACTOR: i64 = 2;

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;

	let mut cfg: Config = toml::from_str(&raw)
		.map_err(|err| Error::ParseConfig { path: path.to_path_buf(), source: err })?;

	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	if cfg.service.http_bind.trim().is_empty() {
		return Err(Error::Validation {
			message: "service.http_bind must be non-empty.".to_string(),
		});
	}
	if cfg.storage.postgres.dsn.trim().is_empty() {
		return Err(Error::Validation {
			message: "storage.postgres.dsn must be non-empty.".to_string(),
		});
	}
	if cfg.storage.postgres.pool_max_conns == 0 {
		return Err(Error::Validation {
			message: "storage.postgres.pool_max_conns must be greater than zero.".to_string(),
		});
	}

	for (label, api_base, timeout_ms) in [
		("embedding", &cfg.providers.embedding.api_base, cfg.providers.embedding.timeout_ms),
		("mail", &cfg.providers.mail.api_base, cfg.providers.mail.timeout_ms),
	] {
		if api_base.trim().is_empty() {
			return Err(Error::Validation {
				message: format!("Provider {label} api_base must be non-empty."),
			});
		}
		if timeout_ms == 0 {
			return Err(Error::Validation {
				message: format!("Provider {label} timeout_ms must be greater than zero."),
			});
		}
	}

	if cfg.providers.embedding.model.trim().is_empty() {
		return Err(Error::Validation {
			message: "providers.embedding.model must be non-empty.".to_string(),
		});
	}
	if cfg.providers.mail.from.trim().is_empty() {
		return Err(Error::Validation {
			message: "providers.mail.from must be non-empty.".to_string(),
		});
	}

	let threshold = cfg.matching.similarity_threshold;

	if !threshold.is_finite() {
		return Err(Error::Validation {
			message: "matching.similarity_threshold must be a finite number.".to_string(),
		});
	}
	if !(0.0..=1.0).contains(&threshold) {
		return Err(Error::Validation {
			message: "matching.similarity_threshold must be in the range 0.0-1.0.".to_string(),
		});
	}
	if !(cfg.matching.app_url.starts_with("http://") || cfg.matching.app_url.starts_with("https://"))
	{
		return Err(Error::Validation {
			message: "matching.app_url must start with http:// or https://.".to_string(),
		});
	}
	if cfg.matching.claim_lease_seconds <= 0 {
		return Err(Error::Validation {
			message: "matching.claim_lease_seconds must be greater than zero.".to_string(),
		});
	}

	let lease_ms = cfg.matching.claim_lease_seconds.saturating_mul(1_000);
	let mail_timeout_ms = i64::try_from(cfg.providers.mail.timeout_ms).unwrap_or(i64::MAX);

	if lease_ms < mail_timeout_ms.saturating_mul(CLAIM_LEASE_MAIL_TIMEOUT_FACTOR) {
		return Err(Error::Validation {
			message: format!(
				"matching.claim_lease_seconds must be at least {CLAIM_LEASE_MAIL_TIMEOUT_FACTOR}x providers.mail.timeout_ms."
			),
		});
	}
	if cfg.worker.poll_interval_ms == 0 {
		return Err(Error::Validation {
			message: "worker.poll_interval_ms must be greater than zero.".to_string(),
		});
	}
	if cfg.worker.lease_seconds <= 0 {
		return Err(Error::Validation {
			message: "worker.lease_seconds must be greater than zero.".to_string(),
		});
	}
	if cfg.worker.max_attempts <= 0 {
		return Err(Error::Validation {
			message: "worker.max_attempts must be greater than zero.".to_string(),
		});
	}
	if cfg.worker.base_backoff_ms <= 0 {
		return Err(Error::Validation {
			message: "worker.base_backoff_ms must be greater than zero.".to_string(),
		});
	}
	if cfg.worker.base_backoff_ms > cfg.worker.max_backoff_ms {
		return Err(Error::Validation {
			message: "worker.base_backoff_ms must not exceed worker.max_backoff_ms.".to_string(),
		});
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	for key in [&mut cfg.providers.embedding.api_key, &mut cfg.providers.mail.api_key] {
		if key.as_deref().map(|key| key.trim().is_empty()).unwrap_or(false) {
			*key = None;
		}
	}

	let trimmed = cfg.matching.app_url.trim().trim_end_matches('/').to_string();

	cfg.matching.app_url = trimmed;
}
