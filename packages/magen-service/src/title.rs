use serde::{Deserialize, Serialize};

use magen_domain::prompt;

use crate::{Error, MagenService, Result};

#[derive(Debug, Clone, Deserialize)]
pub struct TitleRequest {
	#[serde(default, deserialize_with = "magen_domain::document::null_as_empty")]
	pub question: String,
	#[serde(default, deserialize_with = "magen_domain::document::null_as_empty")]
	pub answer: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TitleResponse {
	pub title: String,
}

impl MagenService {
	/// Names a chat exchange. The model's reply is only trimmed, never shortened.
	pub async fn generate_title(&self, req: TitleRequest) -> Result<TitleResponse> {
		if req.question.trim().is_empty() {
			return Err(Error::InvalidRequest {
				message: "Question is required".to_string(),
			});
		}

		let prompt = prompt::title_prompt(&req.question, &req.answer);
		let title = self
			.providers
			.completion
			.complete(&self.cfg.providers.llm, &prompt)
			.await
			.inspect_err(|err| {
				tracing::error!(
					provider_id = %self.cfg.providers.llm.provider_id,
					error = %err,
					"Title generation failed."
				)
			})?;

		Ok(TitleResponse { title: title.trim().to_string() })
	}
}
