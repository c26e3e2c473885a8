use std::time::Duration as StdDuration;

use serde::Serialize;
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

use lnf_domain::{
	recipient::RecipientPolicy,
	report::{MatchDirection, ReportKind},
};
use lnf_storage::models::{ClaimOutcome, LedgerKey, PendingMatch, Report};

use crate::{
	Error, LnfService,
	notification::{self, MatchEmail},
	scoring::ScoredCandidate,
};

const SEND_BUDGET_SHARE: f64 = 0.8;

/// Where one above-threshold candidate ended up after the ledger protocol.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MatchOutcome {
	Notified,
	/// The pair was already notified in this or the opposite direction.
	SkippedDuplicate,
	/// Another run currently holds the notification claim for the pair.
	SkippedInFlight,
	NoRecipient,
	DeliveryFailed,
	LedgerFailed,
}
impl MatchOutcome {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Notified => "NOTIFIED",
			Self::SkippedDuplicate => "SKIPPED_DUPLICATE",
			Self::SkippedInFlight => "SKIPPED_IN_FLIGHT",
			Self::NoRecipient => "NO_RECIPIENT",
			Self::DeliveryFailed => "DELIVERY_FAILED",
			Self::LedgerFailed => "LEDGER_FAILED",
		}
	}
}

pub fn ledger_key(source: &Report, source_kind: ReportKind, target: &Report) -> LedgerKey {
	LedgerKey {
		source_report_id: source.report_id,
		target_report_id: target.report_id,
		direction: MatchDirection::from_source(source_kind).as_str(),
	}
}

/// Orders a source/target pair as (lost, found).
pub fn lost_and_found<'a>(
	source: &'a Report,
	source_kind: ReportKind,
	target: &'a Report,
) -> (&'a Report, &'a Report) {
	match source_kind {
		ReportKind::Lost => (source, target),
		ReportKind::Found => (target, source),
	}
}

/// Time a send may take once the claim is held. Stays strictly inside the remaining lease so an
/// expired claim never belongs to a sender that is still running.
pub fn send_budget(remaining_lease: Duration) -> StdDuration {
	let budget = remaining_lease * SEND_BUDGET_SHARE;

	StdDuration::try_from(budget).unwrap_or(StdDuration::ZERO)
}

impl LnfService {
	/// Records an above-threshold candidate and notifies at most once per unordered pair.
	pub async fn process_match(
		&self,
		source: &Report,
		source_kind: ReportKind,
		candidate: &ScoredCandidate,
	) -> MatchOutcome {
		let target = &candidate.report;
		let score = candidate.final_score();
		let key = ledger_key(source, source_kind, target);
		let pending = PendingMatch {
			key,
			source_kind: source_kind.as_str(),
			target_kind: source_kind.counterpart().as_str(),
			score,
		};
		let now = OffsetDateTime::now_utc();

		match self.stores.ledger.upsert_pending(&pending, now).await {
			Ok(entry) if entry.notified => {
				tracing::info!(
					report_id = %source.report_id,
					candidate_id = %target.report_id,
					score,
					"Pair already notified."
				);

				return MatchOutcome::SkippedDuplicate;
			},
			Ok(_) => {},
			Err(err) => {
				tracing::warn!(
					report_id = %source.report_id,
					candidate_id = %target.report_id,
					error = %err,
					"Failed to record pending match."
				);

				return MatchOutcome::LedgerFailed;
			},
		}

		let (lost, found) = lost_and_found(source, source_kind, target);
		let policy = RecipientPolicy::for_mode(self.cfg.matching.mode);
		let recipient_report = match policy.recipient_kind(source_kind) {
			ReportKind::Lost => lost,
			ReportKind::Found => found,
		};
		let Some(to) = recipient_report.reporter_email().and_then(notification::validate_recipient)
		else {
			let err = Error::Recipient { report_id: recipient_report.report_id };

			tracing::warn!(
				report_id = %source.report_id,
				candidate_id = %target.report_id,
				error = %err,
				"Match left pending."
			);

			return MatchOutcome::NoRecipient;
		};
		let claim_id = Uuid::new_v4();
		let lease_until = now + Duration::seconds(self.cfg.matching.claim_lease_seconds);

		match self.stores.ledger.claim_notification(&key, claim_id, now, lease_until).await {
			Ok(ClaimOutcome::Claimed) => {},
			Ok(ClaimOutcome::AlreadyNotified) => return MatchOutcome::SkippedDuplicate,
			Ok(ClaimOutcome::InFlight) => {
				tracing::info!(
					report_id = %source.report_id,
					candidate_id = %target.report_id,
					"Another run is notifying this pair."
				);

				return MatchOutcome::SkippedInFlight;
			},
			Ok(ClaimOutcome::Missing) => {
				tracing::warn!(
					report_id = %source.report_id,
					candidate_id = %target.report_id,
					"Ledger entry vanished before it could be claimed."
				);

				return MatchOutcome::LedgerFailed;
			},
			Err(err) => {
				tracing::warn!(
					report_id = %source.report_id,
					candidate_id = %target.report_id,
					error = %err,
					"Failed to claim match notification."
				);

				return MatchOutcome::LedgerFailed;
			},
		}

		let email = MatchEmail::render(&self.cfg.matching.app_url, lost, found, score);
		let budget = send_budget(lease_until - OffsetDateTime::now_utc());
		let send =
			notification::deliver(self.providers.mailer.as_ref(), &self.cfg.providers.mail, to, &email);
		let delivery = match tokio::time::timeout(budget, send).await {
			Ok(sent) => sent.map_err(Error::from),
			Err(_) => Err(Error::DeliveryTimeout {
				recipient: to.to_string(),
				budget_ms: u64::try_from(budget.as_millis()).unwrap_or(u64::MAX),
			}),
		};

		match delivery {
			Ok(message_id) => {
				tracing::info!(
					report_id = %source.report_id,
					candidate_id = %target.report_id,
					score,
					message_id = message_id.as_deref().unwrap_or(""),
					"Match notification sent."
				);
			},
			Err(err) => {
				tracing::warn!(
					report_id = %source.report_id,
					candidate_id = %target.report_id,
					error = %err,
					"Match notification failed. Entry stays pending."
				);

				if let Err(release_err) =
					self.stores.ledger.release_claim(&key, claim_id, OffsetDateTime::now_utc()).await
				{
					tracing::warn!(
						report_id = %source.report_id,
						candidate_id = %target.report_id,
						error = %release_err,
						"Failed to release notification claim."
					);
				}

				return MatchOutcome::DeliveryFailed;
			},
		}

		match self
			.stores
			.ledger
			.complete_notification(&key, claim_id, OffsetDateTime::now_utc())
			.await
		{
			Ok(true) => {},
			Ok(false) => tracing::error!(
				report_id = %source.report_id,
				candidate_id = %target.report_id,
				"Notification sent but the claim was no longer held."
			),
			Err(err) => tracing::error!(
				report_id = %source.report_id,
				candidate_id = %target.report_id,
				error = %err,
				"Notification sent but could not be recorded."
			),
		}

		MatchOutcome::Notified
	}
}
