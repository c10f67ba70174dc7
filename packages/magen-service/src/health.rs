use crate::{MagenService, Result};

impl MagenService {
	/// Confirms the document store answers queries.
	pub async fn readiness(&self) -> Result<()> {
		self.providers
			.search
			.probe(&self.cfg.providers.search)
			.await
			.inspect_err(|err| {
				tracing::warn!(
					provider_id = %self.cfg.providers.search.provider_id,
					error = %err,
					"Readiness probe failed."
				)
			})
	}
}
