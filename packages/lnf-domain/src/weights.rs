use serde::Serialize;

use lnf_config::MatchingMode;

use crate::report::ReportSignals;

const BASE_CLIP: f32 = 0.85;
const BASE_LOCATION: f32 = 0.10;
const BASE_DATE: f32 = 0.05;
const MISSING_IMAGE_CLIP_BONUS: f32 = 0.05;
const MISSING_IMAGE_LOCATION_PENALTY: f32 = 0.03;
const MISSING_IMAGE_DATE_PENALTY: f32 = 0.02;

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Weights {
	pub clip: f32,
	pub location: f32,
	pub date: f32,
}
impl Weights {
	pub const SEMANTIC_ONLY: Self = Self { clip: 1.0, location: 0.0, date: 0.0 };

	fn normalized(self) -> Self {
		let total = self.clip + self.location + self.date;
		let total = if total > 0.0 { total } else { 1.0 };

		Self { clip: self.clip / total, location: self.location / total, date: self.date / total }
	}
}

/// How the final score of one comparison is split between the semantic signal and the minor
/// factors.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WeightPolicy {
	Standard,
	CuratedChannel,
	DeterministicTest,
}
impl WeightPolicy {
	pub fn resolve(mode: MatchingMode, a: &ReportSignals<'_>, b: &ReportSignals<'_>) -> Self {
		if mode == MatchingMode::Deterministic {
			return Self::DeterministicTest;
		}
		if a.curated || b.curated {
			return Self::CuratedChannel;
		}

		Self::Standard
	}

	pub fn weights(self, a: &ReportSignals<'_>, b: &ReportSignals<'_>) -> Weights {
		match self {
			Self::DeterministicTest | Self::CuratedChannel => Weights::SEMANTIC_ONLY,
			Self::Standard => standard_weights(a, b),
		}
	}

	pub fn uses_minor_factors(self) -> bool {
		matches!(self, Self::Standard)
	}
}

/// Which content the two sides of a comparison carry. Diagnostic only.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Modality {
	TextText,
	ImageImage,
	TextImage,
	Mixed,
}
impl Modality {
	pub fn between(a: &ReportSignals<'_>, b: &ReportSignals<'_>) -> Self {
		if a.has_text && b.has_text && !a.has_image && !b.has_image {
			Self::TextText
		} else if a.has_image && b.has_image && !a.has_text && !b.has_text {
			Self::ImageImage
		} else if (a.has_text && b.has_image) || (a.has_image && b.has_text) {
			Self::TextImage
		} else {
			Self::Mixed
		}
	}
}

pub fn compute_weights(mode: MatchingMode, a: &ReportSignals<'_>, b: &ReportSignals<'_>) -> Weights {
	WeightPolicy::resolve(mode, a, b).weights(a, b)
}

pub fn location_available(a: &ReportSignals<'_>, b: &ReportSignals<'_>) -> bool {
	let coordinates = a.coordinates.is_some() && b.coordinates.is_some();
	let text = a.has_location_text() && b.has_location_text();

	coordinates || text
}

fn standard_weights(a: &ReportSignals<'_>, b: &ReportSignals<'_>) -> Weights {
	let mut weights = Weights { clip: BASE_CLIP, location: BASE_LOCATION, date: BASE_DATE };

	if !(a.has_image && b.has_image) {
		weights.clip += MISSING_IMAGE_CLIP_BONUS;
		weights.location = (weights.location - MISSING_IMAGE_LOCATION_PENALTY).max(0.0);
		weights.date = (weights.date - MISSING_IMAGE_DATE_PENALTY).max(0.0);
	}
	if !location_available(a, b) {
		weights.clip += weights.location;
		weights.location = 0.0;
	}
	if a.created_at.is_none() || b.created_at.is_none() {
		weights.clip += weights.date;
		weights.date = 0.0;
	}

	weights.normalized()
}
