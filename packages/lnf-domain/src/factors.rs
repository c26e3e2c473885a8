//! Location and date proximity between two reports.
//!
//! Both factors are weak corroborating signals. They decay linearly to zero and are always
//! clamped to `[0, 1]`, so a missing or malformed input can lower a final score but never push
//! it outside the unit range.

use std::collections::HashSet;

use crate::report::{Coordinates, ReportSignals};

/// Distance at which the location factor reaches zero.
pub const MAX_DISTANCE_KM: f64 = 50.0;
/// Age gap at which the date factor reaches zero.
pub const MAX_DATE_DIFF_DAYS: f64 = 30.0;

const EARTH_RADIUS_KM: f64 = 6_371.0;
const SECONDS_PER_DAY: f64 = 86_400.0;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum LocationEvidence {
	Coordinates { distance_km: f64 },
	TextOverlap { jaccard: f64 },
	NoData,
}
impl LocationEvidence {
	pub fn between(a: &ReportSignals<'_>, b: &ReportSignals<'_>) -> Self {
		if let (Some(left), Some(right)) = (a.coordinates, b.coordinates) {
			return Self::Coordinates { distance_km: haversine_km(left, right) };
		}
		if let (Some(left), Some(right)) = (a.location_text, b.location_text)
			&& !left.trim().is_empty()
			&& !right.trim().is_empty()
		{
			return Self::TextOverlap { jaccard: jaccard_similarity(left, right) };
		}

		Self::NoData
	}

	pub fn score(&self) -> f32 {
		match *self {
			Self::Coordinates { distance_km } => coordinate_score(distance_km),
			Self::TextOverlap { jaccard } => clamp01(jaccard as f32),
			Self::NoData => 0.0,
		}
	}

	pub fn method(&self) -> &'static str {
		match self {
			Self::Coordinates { .. } => "geo",
			Self::TextOverlap { .. } => "text",
			Self::NoData => "none",
		}
	}
}

pub fn location_score(a: &ReportSignals<'_>, b: &ReportSignals<'_>) -> f32 {
	LocationEvidence::between(a, b).score()
}

pub fn date_score(a: &ReportSignals<'_>, b: &ReportSignals<'_>) -> f32 {
	match date_diff_days(a, b) {
		Some(days) => clamp01((1.0 - days / MAX_DATE_DIFF_DAYS) as f32),
		None => 0.0,
	}
}

pub fn date_diff_days(a: &ReportSignals<'_>, b: &ReportSignals<'_>) -> Option<f64> {
	let (left, right) = (a.created_at?, b.created_at?);

	Some((left - right).abs().as_seconds_f64() / SECONDS_PER_DAY)
}

/// Clamps into `[0, 1]`, mapping NaN to zero.
pub fn clamp01(value: f32) -> f32 {
	if value.is_nan() {
		return 0.0;
	}

	value.clamp(0.0, 1.0)
}

pub fn haversine_km(a: Coordinates, b: Coordinates) -> f64 {
	let d_lat = (b.latitude - a.latitude).to_radians();
	let d_lon = (b.longitude - a.longitude).to_radians();
	let h = (d_lat / 2.0).sin().powi(2)
		+ a.latitude.to_radians().cos() * b.latitude.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
	let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

	EARTH_RADIUS_KM * c
}

pub fn jaccard_similarity(a: &str, b: &str) -> f64 {
	let left = tokenize(a);
	let right = tokenize(b);
	let union = left.union(&right).count();

	if union == 0 {
		return 0.0;
	}

	left.intersection(&right).count() as f64 / union as f64
}

fn tokenize(text: &str) -> HashSet<String> {
	let cleaned: String = text
		.chars()
		.map(|ch| if ch.is_ascii_alphanumeric() { ch.to_ascii_lowercase() } else { ' ' })
		.collect();

	cleaned.split_whitespace().map(str::to_string).collect()
}

fn coordinate_score(distance_km: f64) -> f32 {
	clamp01((1.0 - distance_km / MAX_DISTANCE_KM) as f32)
}
