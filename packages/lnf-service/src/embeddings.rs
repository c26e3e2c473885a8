use time::OffsetDateTime;

use lnf_providers::embedding::EmbedInput;
use lnf_storage::models::{Report, StoredEmbedding};

use crate::{Error, LnfService, Result};

/// Text sent to the embedding provider: title and description on separate lines.
pub fn embedding_text(report: &Report) -> String {
	let title = report.title.trim();
	let description = report.description.trim();

	match (title.is_empty(), description.is_empty()) {
		(false, false) => format!("{title}\n{description}"),
		(false, true) => title.to_string(),
		(true, false) => description.to_string(),
		(true, true) => String::new(),
	}
}

impl LnfService {
	/// Makes sure `report` carries an embedding, computing and persisting one if it has none.
	///
	/// An existing vector is never recomputed. When another writer stores a vector first, the
	/// stored one wins and is copied into `report`.
	pub async fn ensure_embedding(&self, report: &mut Report) -> Result<()> {
		if report.has_embedding() {
			return Ok(());
		}

		let cfg = &self.cfg.providers.embedding;
		let text = embedding_text(report);
		let input = EmbedInput { text: &text, image_url: report.primary_image() };
		let embedding = self.providers.embedding.embed(cfg, input).await.map_err(|err| {
			Error::Provider {
				message: format!("Failed to embed report {}: {err}", report.report_id),
			}
		})?;

		if embedding.vector.is_empty() {
			return Err(Error::Provider {
				message: format!("Embedding provider returned no vector for report {}.", report.report_id),
			});
		}

		let stored = StoredEmbedding {
			vector: embedding.vector,
			model: embedding.model.unwrap_or_else(|| cfg.model.clone()),
			embedded_at: OffsetDateTime::now_utc(),
		};

		if self.stores.reports.store_embedding(report.report_id, &stored).await? {
			tracing::info!(
				report_id = %report.report_id,
				dim = stored.vector.len(),
				model = %stored.model,
				"Stored report embedding."
			);

			report.embedding = Some(stored.vector);
			report.embedding_model = Some(stored.model);
			report.embedded_at = Some(stored.embedded_at);

			return Ok(());
		}

		let Some(winner) = self.stores.reports.fetch_report(report.report_id).await? else {
			return Err(Error::NotFound {
				message: format!("Report {} disappeared while storing its embedding.", report.report_id),
			});
		};

		if !winner.has_embedding() {
			return Err(Error::Conflict {
				message: format!("Embedding for report {} was not stored.", report.report_id),
			});
		}

		tracing::debug!(report_id = %report.report_id, "Kept embedding stored by a concurrent run.");

		report.embedding = winner.embedding;
		report.embedding_model = winner.embedding_model;
		report.embedded_at = winner.embedded_at;

		Ok(())
	}

	/// Ensures embeddings for every candidate, dropping the ones that fail. Never fails as a whole.
	pub async fn ensure_embeddings_for_candidates(&self, candidates: Vec<Report>) -> Vec<Report> {
		let mut ready = Vec::with_capacity(candidates.len());

		for mut candidate in candidates {
			match self.ensure_embedding(&mut candidate).await {
				Ok(()) => ready.push(candidate),
				Err(err) => {
					let err = Error::Candidate { report_id: candidate.report_id, message: err.to_string() };

					tracing::warn!(
						candidate_id = %candidate.report_id,
						error = %err,
						"Dropping candidate without an embedding."
					);
				},
			}
		}

		ready
	}
}
