use serde::Serialize;

use lnf_config::MatchingMode;

use crate::report::ReportKind;

/// Which reporter receives the match email.
///
/// Production always writes to whoever lost the item, regardless of which side triggered the
/// run. Deterministic mode writes to the reporter of the triggering report instead.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecipientPolicy {
	LostReporter,
	SourceReporter,
}
impl RecipientPolicy {
	pub fn for_mode(mode: MatchingMode) -> Self {
		match mode {
			MatchingMode::Production => Self::LostReporter,
			MatchingMode::Deterministic => Self::SourceReporter,
		}
	}

	/// Kind of the report whose reporter should be notified when `source_kind` triggered the run.
	pub fn recipient_kind(self, source_kind: ReportKind) -> ReportKind {
		match self {
			Self::LostReporter => ReportKind::Lost,
			Self::SourceReporter => source_kind,
		}
	}
}
