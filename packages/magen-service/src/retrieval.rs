use magen_domain::CandidateDocument;

use crate::{Error, MagenService, MatchQuery, Result};

/// Result of the embed-then-search step.
///
/// `Empty` routes to the general-knowledge fallback. `Failed` never does.
#[derive(Debug)]
pub enum SearchOutcome {
	Found(Vec<CandidateDocument>),
	Empty,
	Failed(Error),
}
impl From<Result<Vec<CandidateDocument>>> for SearchOutcome {
	fn from(result: Result<Vec<CandidateDocument>>) -> Self {
		match result {
			Ok(documents) if documents.is_empty() => Self::Empty,
			Ok(documents) => Self::Found(documents),
			Err(err) => Self::Failed(err),
		}
	}
}

impl MagenService {
	pub async fn retrieve(&self, question: &str) -> SearchOutcome {
		let embedding =
			match self.providers.embedding.embed(&self.cfg.providers.embedding, question).await {
				Ok(embedding) => embedding,
				Err(err) => {
					tracing::error!(
						provider_id = %self.cfg.providers.embedding.provider_id,
						error = %err,
						"Question embedding failed."
					);

					return SearchOutcome::Failed(err);
				},
			};
		let query = MatchQuery {
			embedding: &embedding,
			match_threshold: self.cfg.retrieval.match_threshold,
			match_count: self.cfg.retrieval.match_count,
		};
		let outcome: SearchOutcome =
			self.providers.search.search(&self.cfg.providers.search, query).await.into();

		match &outcome {
			SearchOutcome::Found(documents) => {
				tracing::info!(documents = documents.len(), "Similarity search matched documents.")
			},
			SearchOutcome::Empty => tracing::info!("Similarity search matched no documents."),
			SearchOutcome::Failed(err) => tracing::error!(
				provider_id = %self.cfg.providers.search.provider_id,
				error = %err,
				"Similarity search failed."
			),
		}

		outcome
	}
}
