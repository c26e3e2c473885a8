use uuid::Uuid;

use crate::notification::DeliveryError;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Invalid request: {message}")]
	InvalidRequest { message: String },
	#[error("Not found: {message}")]
	NotFound { message: String },
	#[error("Conflict: {message}")]
	Conflict { message: String },
	#[error("Provider error: {message}")]
	Provider { message: String },
	#[error("Candidate {report_id} skipped: {message}")]
	Candidate { report_id: Uuid, message: String },
	#[error("No deliverable recipient for report {report_id}.")]
	Recipient { report_id: Uuid },
	#[error(transparent)]
	Delivery(#[from] DeliveryError),
	#[error("Mail delivery to {recipient} did not finish within {budget_ms} ms of the claim lease.")]
	DeliveryTimeout { recipient: String, budget_ms: u64 },
	#[error("Storage error: {message}")]
	Storage { message: String },
}
impl From<lnf_storage::Error> for Error {
	fn from(err: lnf_storage::Error) -> Self {
		match err {
			lnf_storage::Error::Sqlx(inner) => Self::Storage { message: inner.to_string() },
			lnf_storage::Error::InvalidArgument(message) => Self::InvalidRequest { message },
			lnf_storage::Error::NotFound(message) => Self::NotFound { message },
			lnf_storage::Error::Conflict(message) => Self::Conflict { message },
		}
	}
}

impl From<lnf_providers::Error> for Error {
	fn from(err: lnf_providers::Error) -> Self {
		Self::Provider { message: err.to_string() }
	}
}
