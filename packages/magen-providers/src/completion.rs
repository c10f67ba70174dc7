//! OpenAI-compatible chat completions, blocking and streamed.

use std::{pin::Pin, time::Duration};

use futures::{Stream, StreamExt};
use reqwest::Client;
use serde_json::Value;

use crate::{Error, Result};

/// Tokens in generation order. Finite and not restartable.
pub type TokenStream = Pin<Box<dyn Stream<Item = Result<String>> + Send>>;

const DONE_SENTINEL: &str = "[DONE]";

pub async fn complete(
	client: &Client,
	cfg: &magen_config::LlmProviderConfig,
	prompt: &str,
) -> Result<String> {
	let res = client
		.post(format!("{}{}", cfg.api_base, cfg.path))
		.timeout(Duration::from_millis(cfg.timeout_ms))
		.headers(crate::auth_headers(&cfg.api_key, &cfg.default_headers)?)
		.json(&request_body(cfg, prompt, false))
		.send()
		.await?;
	let json: Value = res.error_for_status()?.json().await?;

	parse_completion_response(&json)
}

/// Opens a streamed completion.
///
/// Connection and status failures surface here, before any token is produced. Failures
/// after that arrive as an `Err` item on the returned stream.
///
/// `timeout_ms` bounds only the wait for response headers. The body may run longer; the
/// caller owns the per-token idle limit.
pub async fn stream(
	client: &Client,
	cfg: &magen_config::LlmProviderConfig,
	prompt: &str,
) -> Result<TokenStream> {
	let request = client
		.post(format!("{}{}", cfg.api_base, cfg.path))
		.headers(crate::auth_headers(&cfg.api_key, &cfg.default_headers)?)
		.json(&request_body(cfg, prompt, true))
		.send();
	let res = tokio::time::timeout(Duration::from_millis(cfg.timeout_ms), request)
		.await
		.map_err(|_| Error::Timeout { timeout_ms: cfg.timeout_ms })??
		.error_for_status()?;
	let mut bytes = res.bytes_stream();
	let tokens = async_stream::stream! {
		let mut decoder = SseDecoder::default();

		while let Some(chunk) = bytes.next().await {
			match chunk.map_err(Error::from).and_then(|chunk| decoder.push(&chunk)) {
				Ok(batch) =>
					for token in batch {
						yield Ok(token);
					},
				Err(err) => {
					yield Err(err);

					return;
				},
			}

			if decoder.is_done() {
				return;
			}
		}

		match decoder.finish() {
			Ok(batch) =>
				for token in batch {
					yield Ok(token);
				},
			Err(err) => yield Err(err),
		}
	};

	Ok(Box::pin(tokens))
}

fn request_body(cfg: &magen_config::LlmProviderConfig, prompt: &str, stream: bool) -> Value {
	serde_json::json!({
		"model": cfg.model,
		"temperature": cfg.temperature,
		"stream": stream,
		"messages": [{ "role": "user", "content": prompt }],
	})
}

fn parse_completion_response(json: &Value) -> Result<String> {
	json.get("choices")
		.and_then(|v| v.as_array())
		.and_then(|arr| arr.first())
		.and_then(|choice| choice.get("message"))
		.and_then(|msg| msg.get("content"))
		.and_then(|c| c.as_str())
		.map(str::to_string)
		.ok_or_else(|| Error::InvalidResponse {
			message: "Completion response is missing message content.".to_string(),
		})
}

/// Incremental decoder for `text/event-stream` completion bodies.
///
/// Network chunks may split lines and multi-byte characters, so bytes are buffered until
/// a full line is available.
#[derive(Debug, Default)]
pub struct SseDecoder {
	buffer: Vec<u8>,
	done: bool,
}
impl SseDecoder {
	pub fn push(&mut self, chunk: &[u8]) -> Result<Vec<String>> {
		self.buffer.extend_from_slice(chunk);

		let mut tokens = Vec::new();

		while !self.done {
			let Some(newline) = self.buffer.iter().position(|byte| *byte == b'\n') else {
				break;
			};
			let line: Vec<u8> = self.buffer.drain(..=newline).collect();

			if let Some(token) = self.decode_line(&line[..newline])? {
				tokens.push(token);
			}
		}

		Ok(tokens)
	}

	/// Decodes a trailing line that arrived without a newline.
	pub fn finish(&mut self) -> Result<Vec<String>> {
		let line = std::mem::take(&mut self.buffer);

		Ok(self.decode_line(&line)?.into_iter().collect())
	}

	pub fn is_done(&self) -> bool {
		self.done
	}

	fn decode_line(&mut self, line: &[u8]) -> Result<Option<String>> {
		let line = String::from_utf8_lossy(line);
		let line = line.trim_end_matches('\r');
		let Some(data) = line.strip_prefix("data:") else {
			return Ok(None);
		};
		let data = data.trim_start();

		if data == DONE_SENTINEL {
			self.done = true;

			return Ok(None);
		}

		let Ok(event) = serde_json::from_str::<Value>(data) else {
			tracing::debug!(line = data, "Skipping undecodable stream event.");

			return Ok(None);
		};

		if let Some(error) = event.get("error") {
			let message = error
				.get("message")
				.and_then(|m| m.as_str())
				.map(str::to_string)
				.unwrap_or_else(|| error.to_string());

			return Err(Error::InvalidResponse {
				message: format!("Completion stream reported an error: {message}"),
			});
		}

		Ok(event
			.get("choices")
			.and_then(|v| v.as_array())
			.and_then(|arr| arr.first())
			.and_then(|choice| choice.get("delta"))
			.and_then(|delta| delta.get("content"))
			.and_then(|c| c.as_str())
			.filter(|content| !content.is_empty())
			.map(str::to_string))
	}
}
