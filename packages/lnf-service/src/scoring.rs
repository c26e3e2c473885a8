use std::collections::HashMap;

use lnf_config::MatchingMode;
use lnf_domain::{
	report::{Coordinates, ReportSignals},
	scoring::{self, ScoreBreakdown},
};
use lnf_providers::embedding::{CompareItem, CompareScore};
use lnf_storage::models::Report;

use crate::{Error, LnfService, Result};

#[derive(Clone, Debug)]
pub struct ScoredCandidate {
	pub report: Report,
	pub breakdown: ScoreBreakdown,
}
impl ScoredCandidate {
	pub fn final_score(&self) -> f32 {
		self.breakdown.final_score
	}
}

/// Projects a stored report onto the inputs the weight policy and minor factors look at.
pub fn signals(report: &Report) -> ReportSignals<'_> {
	let coordinates = match (report.latitude, report.longitude) {
		(Some(latitude), Some(longitude)) => Some(Coordinates { latitude, longitude }),
		_ => None,
	};

	ReportSignals {
		has_image: report.primary_image().is_some(),
		has_text: !report.title.trim().is_empty() || !report.description.trim().is_empty(),
		location_text: report.location_text.as_deref(),
		coordinates,
		created_at: Some(report.created_at),
		curated: report.curated,
	}
}

/// Joins provider scores back onto candidates and orders them by final score.
///
/// Ids the provider returns that are not candidates are ignored, as are repeats. Candidates the
/// provider leaves out are dropped. Equal final scores keep provider order.
pub fn rank_candidates(
	mode: MatchingMode,
	source: &Report,
	candidates: Vec<Report>,
	scores: &[CompareScore],
) -> Vec<ScoredCandidate> {
	let index = candidates
		.iter()
		.enumerate()
		.map(|(idx, candidate)| (candidate.report_id.to_string(), idx))
		.collect::<HashMap<_, _>>();
	let mut slots = candidates.into_iter().map(Some).collect::<Vec<_>>();
	let source_signals = signals(source);
	let mut ranked = Vec::with_capacity(scores.len().min(slots.len()));

	for score in scores {
		let Some(&idx) = index.get(score.id.as_str()) else {
			tracing::debug!(candidate_id = %score.id, "Ignoring score for an unknown candidate.");

			continue;
		};
		let Some(report) = slots[idx].take() else {
			continue;
		};
		let breakdown = scoring::score_pair(mode, &source_signals, &signals(&report), score.score);

		ranked.push(ScoredCandidate { report, breakdown });
	}

	ranked.sort_by(|a, b| b.final_score().total_cmp(&a.final_score()));

	ranked
}

impl LnfService {
	/// Scores every embedded candidate against `source` with one batched provider call.
	pub async fn score_candidates(
		&self,
		source: &Report,
		candidates: Vec<Report>,
	) -> Result<Vec<ScoredCandidate>> {
		let Some(query) = source.embedding.as_deref().filter(|vec| !vec.is_empty()) else {
			return Err(Error::InvalidRequest {
				message: format!("Report {} has no embedding to compare.", source.report_id),
			});
		};
		let ids = candidates.iter().map(|candidate| candidate.report_id.to_string()).collect::<Vec<_>>();
		let scores = {
			let items = candidates
				.iter()
				.zip(&ids)
				.filter_map(|(candidate, id)| {
					candidate
						.embedding
						.as_deref()
						.filter(|vec| !vec.is_empty())
						.map(|embedding| CompareItem { id: id.as_str(), embedding })
				})
				.collect::<Vec<_>>();

			if items.is_empty() {
				return Ok(Vec::new());
			}

			self.providers
				.embedding
				.compare(&self.cfg.providers.embedding, query, &items)
				.await
				.map_err(|err| Error::Provider {
					message: format!("Batched comparison for report {} failed: {err}", source.report_id),
				})?
		};

		Ok(rank_candidates(self.cfg.matching.mode, source, candidates, &scores))
	}
}
