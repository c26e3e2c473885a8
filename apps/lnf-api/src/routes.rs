use axum::{
	Json, Router,
	extract::{
		Path, State,
		rejection::{JsonRejection, PathRejection},
	},
	http::StatusCode,
	response::{IntoResponse, Response},
	routing::{get, post},
};
use serde::{Deserialize, Serialize};
use time::{OffsetDateTime, format_description::well_known::Rfc3339};
use uuid::Uuid;

use lnf_service::{RunErrorKind, RunSummary};
use lnf_storage::{ledger, models::MatchLedgerEntry, outbox};

use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct RunRequest {
	pub report_id: Uuid,
	#[serde(default)]
	pub threshold: Option<f32>,
}

#[derive(Debug, Deserialize)]
pub struct EnqueueRequest {
	pub report_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct EnqueueResponse {
	pub outbox_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct MatchesResponse {
	pub matches: Vec<MatchView>,
}

#[derive(Debug, Serialize)]
pub struct MatchView {
	pub source_report_id: Uuid,
	pub target_report_id: Uuid,
	pub direction: String,
	pub score: f32,
	pub notified: bool,
	pub notified_at: Option<String>,
	pub updated_at: String,
}
impl From<MatchLedgerEntry> for MatchView {
	fn from(entry: MatchLedgerEntry) -> Self {
		Self {
			source_report_id: entry.source_report_id,
			target_report_id: entry.target_report_id,
			direction: entry.direction,
			score: entry.score,
			notified: entry.notified,
			notified_at: entry.notified_at.map(format_timestamp),
			updated_at: format_timestamp(entry.updated_at),
		}
	}
}

#[derive(Debug, Serialize)]
struct ErrorBody {
	error_code: String,
	message: String,
}

#[derive(Debug)]
pub struct ApiError {
	status: StatusCode,
	error_code: String,
	message: String,
}
impl ApiError {
	fn new(status: StatusCode, error_code: impl Into<String>, message: impl Into<String>) -> Self {
		Self { status, error_code: error_code.into(), message: message.into() }
	}

	fn invalid_request(message: impl Into<String>) -> Self {
		Self::new(StatusCode::BAD_REQUEST, "INVALID_REQUEST", message)
	}
}
impl From<lnf_storage::Error> for ApiError {
	fn from(err: lnf_storage::Error) -> Self {
		match err {
			lnf_storage::Error::InvalidArgument(message) => Self::invalid_request(message),
			lnf_storage::Error::NotFound(message) =>
				Self::new(StatusCode::NOT_FOUND, "NOT_FOUND", message),
			err => {
				tracing::error!(error = %err, "Storage request failed.");

				Self::new(StatusCode::INTERNAL_SERVER_ERROR, "STORAGE_ERROR", "Storage failure.")
			},
		}
	}
}
impl From<JsonRejection> for ApiError {
	fn from(rejection: JsonRejection) -> Self {
		Self::invalid_request(rejection.body_text())
	}
}
impl From<PathRejection> for ApiError {
	fn from(rejection: PathRejection) -> Self {
		Self::invalid_request(rejection.body_text())
	}
}
impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		let body = ErrorBody { error_code: self.error_code, message: self.message };

		(self.status, Json(body)).into_response()
	}
}

pub fn router(state: AppState) -> Router {
	Router::new()
		.route("/health", get(health))
		.route("/v1/matching/run", post(run_matching))
		.route("/v1/matching/enqueue", post(enqueue_matching))
		.route("/v1/matching/reports/{report_id}/matches", get(list_matches))
		.with_state(state)
}

async fn health() -> StatusCode {
	StatusCode::OK
}

async fn run_matching(
	State(state): State<AppState>,
	payload: Result<Json<RunRequest>, JsonRejection>,
) -> Result<Json<RunSummary>, ApiError> {
	let Json(payload) = payload?;
	let threshold =
		payload.threshold.unwrap_or(state.service.cfg.matching.similarity_threshold);

	if !threshold.is_finite() || !(0.0..=1.0).contains(&threshold) {
		return Err(ApiError::invalid_request("threshold must be in the range 0.0-1.0."));
	}

	let summary = state.service.run_matching(payload.report_id, threshold).await;

	match &summary.error {
		None => Ok(Json(summary)),
		Some(err) => {
			let (status, code) = run_error_status(err.kind);

			Err(ApiError::new(status, code, err.message.clone()))
		},
	}
}

async fn enqueue_matching(
	State(state): State<AppState>,
	payload: Result<Json<EnqueueRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<EnqueueResponse>), ApiError> {
	let Json(payload) = payload?;
	let outbox_id =
		outbox::enqueue_matching_job(&state.db.pool, payload.report_id, OffsetDateTime::now_utc())
			.await?;

	tracing::info!(report_id = %payload.report_id, outbox_id = %outbox_id, "Matching job enqueued.");

	Ok((StatusCode::ACCEPTED, Json(EnqueueResponse { outbox_id })))
}

async fn list_matches(
	State(state): State<AppState>,
	report_id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<MatchesResponse>, ApiError> {
	let Path(report_id) = report_id?;
	let entries = ledger::list_entries_for_report(&state.db.pool, report_id).await?;

	Ok(Json(MatchesResponse { matches: entries.into_iter().map(MatchView::from).collect() }))
}

fn run_error_status(kind: RunErrorKind) -> (StatusCode, &'static str) {
	match kind {
		RunErrorKind::NotFound => (StatusCode::NOT_FOUND, "NOT_FOUND"),
		RunErrorKind::Provider => (StatusCode::BAD_GATEWAY, "PROVIDER_ERROR"),
		RunErrorKind::Conflict => (StatusCode::CONFLICT, "CONFLICT"),
		RunErrorKind::Storage => (StatusCode::INTERNAL_SERVER_ERROR, "STORAGE_ERROR"),
	}
}

fn format_timestamp(ts: OffsetDateTime) -> String {
	ts.format(&Rfc3339).unwrap_or_default()
}
