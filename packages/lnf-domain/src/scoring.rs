use serde::Serialize;

use lnf_config::MatchingMode;

use crate::{
	factors::{self, LocationEvidence},
	report::ReportSignals,
	weights::{Modality, WeightPolicy, Weights},
};

/// Every input that went into one final score, kept for logs and the ledger trace.
#[derive(Clone, Copy, Debug, Serialize)]
pub struct ScoreBreakdown {
	pub semantic: f32,
	pub location: f32,
	pub location_method: &'static str,
	pub date: f32,
	pub date_diff_days: Option<f64>,
	pub policy: WeightPolicy,
	pub modality: Modality,
	pub weights: Weights,
	pub final_score: f32,
}

pub fn combine(semantic: f32, location: f32, date: f32, weights: Weights) -> f32 {
	factors::clamp01(
		factors::clamp01(semantic) * weights.clip
			+ factors::clamp01(location) * weights.location
			+ factors::clamp01(date) * weights.date,
	)
}

pub fn score_pair(
	mode: MatchingMode,
	source: &ReportSignals<'_>,
	target: &ReportSignals<'_>,
	semantic: f32,
) -> ScoreBreakdown {
	let semantic = factors::clamp01(semantic);
	let policy = WeightPolicy::resolve(mode, source, target);
	let weights = policy.weights(source, target);
	let modality = Modality::between(source, target);

	if !policy.uses_minor_factors() {
		return ScoreBreakdown {
			semantic,
			location: 0.0,
			location_method: LocationEvidence::NoData.method(),
			date: 0.0,
			date_diff_days: None,
			policy,
			modality,
			weights,
			final_score: semantic,
		};
	}

	let evidence = LocationEvidence::between(source, target);
	let location = evidence.score();
	let date = factors::date_score(source, target);
	let final_score = combine(semantic, location, date, weights);

	ScoreBreakdown {
		semantic,
		location,
		location_method: evidence.method(),
		date,
		date_diff_days: factors::date_diff_days(source, target),
		policy,
		modality,
		weights,
		final_score,
	}
}
