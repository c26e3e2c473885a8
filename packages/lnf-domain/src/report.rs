use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportKind {
	Lost,
	Found,
}
impl ReportKind {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Lost => "lost",
			Self::Found => "found",
		}
	}

	pub fn counterpart(self) -> Self {
		match self {
			Self::Lost => Self::Found,
			Self::Found => Self::Lost,
		}
	}
}
impl FromStr for ReportKind {
	type Err = UnknownValue;

	fn from_str(raw: &str) -> Result<Self, Self::Err> {
		match raw.trim().to_ascii_lowercase().as_str() {
			"lost" => Ok(Self::Lost),
			"found" => Ok(Self::Found),
			_ => Err(UnknownValue { field: "kind", value: raw.to_string() }),
		}
	}
}
impl fmt::Display for ReportKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Direction of a ledger entry, named after the kind of the triggering report.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchDirection {
	LostToFound,
	FoundToLost,
}
impl MatchDirection {
	pub fn from_source(kind: ReportKind) -> Self {
		match kind {
			ReportKind::Lost => Self::LostToFound,
			ReportKind::Found => Self::FoundToLost,
		}
	}

	pub fn opposite(self) -> Self {
		match self {
			Self::LostToFound => Self::FoundToLost,
			Self::FoundToLost => Self::LostToFound,
		}
	}

	pub fn as_str(self) -> &'static str {
		match self {
			Self::LostToFound => "lost_to_found",
			Self::FoundToLost => "found_to_lost",
		}
	}
}
impl FromStr for MatchDirection {
	type Err = UnknownValue;

	fn from_str(raw: &str) -> Result<Self, Self::Err> {
		match raw {
			"lost_to_found" => Ok(Self::LostToFound),
			"found_to_lost" => Ok(Self::FoundToLost),
			_ => Err(UnknownValue { field: "direction", value: raw.to_string() }),
		}
	}
}
impl fmt::Display for MatchDirection {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownValue {
	pub field: &'static str,
	pub value: String,
}
impl fmt::Display for UnknownValue {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "Unknown {} value {:?}.", self.field, self.value)
	}
}
impl std::error::Error for UnknownValue {}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Coordinates {
	pub latitude: f64,
	pub longitude: f64,
}

/// The parts of a report that the weighting policy and the minor-factor scorers look at.
#[derive(Clone, Copy, Debug, Default)]
pub struct ReportSignals<'a> {
	pub has_image: bool,
	pub has_text: bool,
	pub location_text: Option<&'a str>,
	pub coordinates: Option<Coordinates>,
	pub created_at: Option<OffsetDateTime>,
	pub curated: bool,
}
impl ReportSignals<'_> {
	pub fn has_location_text(&self) -> bool {
		self.location_text.map(|text| !text.trim().is_empty()).unwrap_or(false)
	}
}
