use serde::Serialize;
use uuid::Uuid;

use lnf_domain::report::ReportKind;

use crate::{Error, LnfService, ledger::MatchOutcome};

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunErrorKind {
	/// The report is missing, deleted, or unusable. Retrying will not help.
	NotFound,
	Provider,
	/// A concurrent writer won a race on the same row. A later attempt sees its result.
	Conflict,
	Storage,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RunError {
	pub kind: RunErrorKind,
	pub message: String,
}
impl RunError {
	pub fn is_retryable(&self) -> bool {
		self.kind != RunErrorKind::NotFound
	}

	fn from_error(err: &Error) -> Self {
		let kind = match err {
			Error::NotFound { .. } | Error::InvalidRequest { .. } | Error::Recipient { .. } =>
				RunErrorKind::NotFound,
			Error::Provider { .. }
			| Error::Candidate { .. }
			| Error::Delivery(_)
			| Error::DeliveryTimeout { .. } => RunErrorKind::Provider,
			Error::Conflict { .. } => RunErrorKind::Conflict,
			Error::Storage { .. } => RunErrorKind::Storage,
		};

		Self { kind, message: err.to_string() }
	}
}

/// Result of one matching run. A run never fails; source-level problems are reported in `error`
/// with every counter at zero.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RunSummary {
	/// Counterparts fetched, before any was dropped for lacking an embedding. Zero when no
	/// candidate could be compared.
	pub processed: usize,
	pub notified: usize,
	pub matches_above_threshold: usize,
	pub threshold: f32,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub error: Option<RunError>,
}
impl RunSummary {
	pub fn empty(threshold: f32) -> Self {
		Self { processed: 0, notified: 0, matches_above_threshold: 0, threshold, error: None }
	}

	fn failed(threshold: f32, err: &Error) -> Self {
		Self { error: Some(RunError::from_error(err)), ..Self::empty(threshold) }
	}
}

impl LnfService {
	pub async fn run_matching_with_config(&self, report_id: Uuid) -> RunSummary {
		self.run_matching(report_id, self.cfg.matching.similarity_threshold).await
	}

	/// Matches one report against every counterpart and notifies new pairs at or above
	/// `threshold`.
	pub async fn run_matching(&self, report_id: Uuid, threshold: f32) -> RunSummary {
		tracing::info!(report_id = %report_id, threshold, "Matching run started.");

		let mut source = match self.load_source(report_id).await {
			Ok(source) => source,
			Err(err) => return self.abort(report_id, threshold, err),
		};
		let source_kind = match source.kind.parse::<ReportKind>() {
			Ok(kind) => kind,
			Err(err) => {
				return self.abort(report_id, threshold, Error::InvalidRequest {
					message: err.to_string(),
				});
			},
		};

		if let Err(err) = self.ensure_embedding(&mut source).await {
			return self.abort(report_id, threshold, err);
		}

		let counterparts = match self.stores.reports.fetch_counterparts(source_kind.counterpart()).await
		{
			Ok(counterparts) => counterparts,
			Err(err) => return self.abort(report_id, threshold, err),
		};
		let processed = counterparts.len();
		let candidates = self.ensure_embeddings_for_candidates(counterparts).await;

		if candidates.is_empty() {
			tracing::info!(report_id = %report_id, processed, "No candidates with embeddings.");

			return RunSummary::empty(threshold);
		}

		let ranked = match self.score_candidates(&source, candidates).await {
			Ok(ranked) => ranked,
			Err(err) => return self.abort(report_id, threshold, err),
		};
		let mut summary = RunSummary { processed, ..RunSummary::empty(threshold) };

		for candidate in ranked.iter().filter(|candidate| candidate.final_score() >= threshold) {
			summary.matches_above_threshold += 1;

			tracing::debug!(
				report_id = %report_id,
				candidate_id = %candidate.report.report_id,
				score = candidate.final_score(),
				semantic = candidate.breakdown.semantic,
				location = candidate.breakdown.location,
				date = candidate.breakdown.date,
				policy = ?candidate.breakdown.policy,
				"Candidate above threshold."
			);

			let outcome = self.process_match(&source, source_kind, candidate).await;

			if outcome == MatchOutcome::Notified {
				summary.notified += 1;
			}
		}

		tracing::info!(
			report_id = %report_id,
			processed = summary.processed,
			matches_above_threshold = summary.matches_above_threshold,
			notified = summary.notified,
			"Matching run finished."
		);

		summary
	}

	async fn load_source(&self, report_id: Uuid) -> crate::Result<lnf_storage::models::Report> {
		let Some(report) = self.stores.reports.fetch_report(report_id).await? else {
			return Err(Error::NotFound { message: format!("Report {report_id} does not exist.") });
		};

		if report.is_deleted {
			return Err(Error::NotFound { message: format!("Report {report_id} is deleted.") });
		}

		Ok(report)
	}

	fn abort(&self, report_id: Uuid, threshold: f32, err: Error) -> RunSummary {
		tracing::warn!(report_id = %report_id, error = %err, "Matching run aborted.");

		RunSummary::failed(threshold, &err)
	}
}
