//! Question answering over retrieved documents, blocking or streamed.

use std::{pin::Pin, time::Duration};

use futures::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use tracing::Instrument;
use uuid::Uuid;

use magen_config::PromptVariant;
use magen_domain::{CandidateDocument, context, prompt, sources};

use crate::{Error, MagenService, Result, SearchOutcome, TokenStream};

pub type FrameStream = Pin<Box<dyn Stream<Item = StreamFrame> + Send>>;

#[derive(Debug, Clone, Deserialize)]
pub struct ChatRequest {
	#[serde(default, deserialize_with = "magen_domain::document::null_as_empty")]
	pub message: String,
	#[serde(default)]
	pub session_id: Option<String>,
	/// Prompt variant for grounded answers. Falls back to `answer.default_prompt`.
	#[serde(default)]
	pub prompt: Option<PromptVariant>,
	#[serde(default)]
	pub stream: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
	pub answer: String,
	pub sources: Vec<String>,
	pub source_type: SourceType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
	Fallback,
	Stepback,
	Direct,
}
impl SourceType {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Fallback => "fallback",
			Self::Stepback => "stepback",
			Self::Direct => "direct",
		}
	}
}
impl From<PromptVariant> for SourceType {
	fn from(variant: PromptVariant) -> Self {
		match variant {
			PromptVariant::Direct => Self::Direct,
			PromptVariant::Stepback => Self::Stepback,
		}
	}
}

/// One unit of a streamed answer.
///
/// Tokens come first in generation order, then exactly one `Footer`. An `Error` frame
/// replaces the footer and is always the last frame.
#[derive(Debug)]
pub enum StreamFrame {
	Token(String),
	Footer(String),
	Error(Error),
}

pub struct ChatStream {
	pub source_type: SourceType,
	pub sources: Vec<String>,
	pub frames: FrameStream,
}

struct PreparedAnswer {
	source_type: SourceType,
	sources: Vec<String>,
	prompt: String,
	footer: String,
}

impl MagenService {
	pub async fn chat(&self, req: ChatRequest) -> Result<ChatResponse> {
		let span = chat_span(&req);

		async move {
			let prepared = self.prepare_answer(&req).await?;
			let answer = self
				.providers
				.completion
				.complete(&self.cfg.providers.llm, &prepared.prompt)
				.await
				.inspect_err(|err| {
					tracing::error!(
						provider_id = %self.cfg.providers.llm.provider_id,
						error = %err,
						"Answer generation failed."
					)
				})?;

			tracing::info!(source_type = prepared.source_type.as_str(), "Answer generated.");

			Ok(ChatResponse {
				answer: format!("{answer}{}", prepared.footer),
				sources: prepared.sources,
				source_type: prepared.source_type,
			})
		}
		.instrument(span)
		.await
	}

	/// Opens a streamed answer.
	///
	/// Every failure up to and including opening the token stream is returned here, so
	/// callers can still answer with an error status. Later failures become an
	/// `Error` frame.
	pub async fn chat_stream(&self, req: ChatRequest) -> Result<ChatStream> {
		let span = chat_span(&req);

		async move {
			let prepared = self.prepare_answer(&req).await?;
			let tokens = self
				.providers
				.completion
				.stream(&self.cfg.providers.llm, &prepared.prompt)
				.await
				.inspect_err(|err| {
					tracing::error!(
						provider_id = %self.cfg.providers.llm.provider_id,
						error = %err,
						"Answer stream failed to open."
					)
				})?;
			let idle = Duration::from_millis(self.cfg.answer.stream_idle_timeout_ms);

			tracing::info!(source_type = prepared.source_type.as_str(), "Answer stream opened.");

			Ok(ChatStream {
				source_type: prepared.source_type,
				sources: prepared.sources,
				frames: relay(tokens, prepared.footer, idle, tracing::Span::current()),
			})
		}
		.instrument(span)
		.await
	}

	async fn prepare_answer(&self, req: &ChatRequest) -> Result<PreparedAnswer> {
		if req.message.trim().is_empty() {
			return Err(Error::InvalidRequest {
				message: "Message is required".to_string(),
			});
		}

		match self.retrieve(&req.message).await {
			SearchOutcome::Found(documents) => Ok(self.grounded_answer(req, &documents)),
			SearchOutcome::Empty => Ok(PreparedAnswer {
				source_type: SourceType::Fallback,
				sources: Vec::new(),
				prompt: prompt::fallback_prompt(&req.message),
				footer: sources::fallback_suffix(&self.cfg.answer.fallback_disclaimer),
			}),
			SearchOutcome::Failed(err) => Err(err),
		}
	}

	fn grounded_answer(
		&self,
		req: &ChatRequest,
		documents: &[CandidateDocument],
	) -> PreparedAnswer {
		let answer_cfg = &self.cfg.answer;
		let variant = req.prompt.unwrap_or(answer_cfg.default_prompt);
		let context = context::build_context(documents);
		let template = prompt::template(answer_cfg.template_set, variant);
		let sources = sources::source_titles(documents, &answer_cfg.untitled_placeholder);
		let footer = sources::sources_footer(&sources, &answer_cfg.sources_label);

		PreparedAnswer {
			source_type: variant.into(),
			sources,
			prompt: prompt::assemble(template, &context, &req.message),
			footer,
		}
	}
}

fn chat_span(req: &ChatRequest) -> tracing::Span {
	tracing::info_span!(
		"chat",
		request_id = %Uuid::new_v4(),
		session_id = req.session_id.as_deref().unwrap_or_default(),
		stream = req.stream,
	)
}

/// Relays tokens, then the footer.
///
/// A token error or an idle gap longer than `idle` drops the upstream stream and ends the
/// relay with an `Error` frame. Upstream polls and relay events belong to `span`.
pub fn relay(
	mut tokens: TokenStream,
	footer: String,
	idle: Duration,
	span: tracing::Span,
) -> FrameStream {
	Box::pin(async_stream::stream! {
		loop {
			match tokio::time::timeout(idle, tokens.next().instrument(span.clone())).await {
				Ok(Some(Ok(token))) => yield StreamFrame::Token(token),
				Ok(Some(Err(err))) => {
					tracing::error!(parent: &span, error = %err, "Answer stream interrupted.");

					yield StreamFrame::Error(Error::StreamInterrupted { message: err.to_string() });

					return;
				},
				Ok(None) => break,
				Err(_) => {
					let idle_ms = idle.as_millis() as u64;

					tracing::error!(parent: &span, idle_ms, "Answer stream stalled.");

					yield StreamFrame::Error(Error::StreamInterrupted {
						message: format!("No token received within {idle_ms} ms."),
					});

					return;
				},
			}
		}

		tracing::info!(parent: &span, "Answer stream completed.");

		yield StreamFrame::Footer(footer);
	})
}
