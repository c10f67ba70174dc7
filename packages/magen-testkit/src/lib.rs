//! Scripted providers and configuration for exercising the answer pipeline offline.

use std::sync::{
	Arc, Mutex,
	atomic::{AtomicUsize, Ordering},
};

use futures::{StreamExt, stream};
use serde_json::Map;

use magen_config::{
	Answer, Config, EmbeddingProviderConfig, LlmProviderConfig, Providers as ProviderConfigs,
	Retrieval, SearchProviderConfig, Security, Service,
};
use magen_domain::CandidateDocument;
use magen_service::{
	BoxFuture, CompletionProvider, EmbeddingProvider, Error, MatchQuery, Providers, Result,
	SearchProvider, TokenStream,
};

pub const EMBEDDING_DIMENSIONS: usize = 4;

pub fn test_config() -> Config {
	Config {
		service: Service {
			http_bind: "127.0.0.1:0".to_string(),
			log_level: "info".to_string(),
			cors_permissive: false,
		},
		security: Security { bind_localhost_only: true },
		providers: ProviderConfigs {
			embedding: EmbeddingProviderConfig {
				provider_id: "test-embedding".to_string(),
				api_base: "http://127.0.0.1:1".to_string(),
				api_key: "test-key".to_string(),
				path: "/v1/embeddings".to_string(),
				model: "test".to_string(),
				dimensions: None,
				timeout_ms: 1_000,
				default_headers: Map::new(),
			},
			search: SearchProviderConfig {
				provider_id: "test-search".to_string(),
				api_base: "http://127.0.0.1:1".to_string(),
				api_key: "test-key".to_string(),
				rpc_function: "match_documents".to_string(),
				health_table: "documents".to_string(),
				timeout_ms: 1_000,
				default_headers: Map::new(),
			},
			llm: LlmProviderConfig {
				provider_id: "test-llm".to_string(),
				api_base: "http://127.0.0.1:1".to_string(),
				api_key: "test-key".to_string(),
				path: "/v1/chat/completions".to_string(),
				model: "test".to_string(),
				temperature: 0.0,
				timeout_ms: 1_000,
				default_headers: Map::new(),
			},
		},
		retrieval: Retrieval::default(),
		answer: Answer::default(),
	}
}

pub fn document(title: Option<&str>, text: &str) -> CandidateDocument {
	CandidateDocument {
		title: title.map(str::to_string),
		plain_text: text.to_string(),
		similarity: 0.9,
	}
}

pub fn providers(
	embedding: Arc<StubEmbedding>,
	search: Arc<ScriptedSearch>,
	completion: Arc<ScriptedCompletion>,
) -> Providers {
	Providers::new(embedding, search, completion)
}

#[derive(Default)]
pub struct StubEmbedding {
	calls: AtomicUsize,
	fails: bool,
}
impl StubEmbedding {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn failing() -> Self {
		Self { fails: true, ..Self::default() }
	}

	pub fn calls(&self) -> usize {
		self.calls.load(Ordering::SeqCst)
	}
}
impl EmbeddingProvider for StubEmbedding {
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		_text: &'a str,
	) -> BoxFuture<'a, Result<Vec<f32>>> {
		self.calls.fetch_add(1, Ordering::SeqCst);

		let dim = cfg.dimensions.map(|dim| dim as usize).unwrap_or(EMBEDDING_DIMENSIONS);
		let fails = self.fails;

		Box::pin(async move {
			if fails {
				return Err(Error::Provider { message: "embedding unavailable".to_string() });
			}

			Ok(vec![0.1; dim])
		})
	}
}

/// Returns a fixed result set, or fails, for every query.
#[derive(Default)]
pub struct ScriptedSearch {
	documents: Vec<CandidateDocument>,
	fails: bool,
	probe_fails: bool,
	calls: AtomicUsize,
	queries: Mutex<Vec<(f32, u32)>>,
}
impl ScriptedSearch {
	pub fn returning(documents: Vec<CandidateDocument>) -> Self {
		Self { documents, ..Self::default() }
	}

	pub fn empty() -> Self {
		Self::default()
	}

	pub fn failing() -> Self {
		Self { fails: true, probe_fails: true, ..Self::default() }
	}

	pub fn calls(&self) -> usize {
		self.calls.load(Ordering::SeqCst)
	}

	/// `(match_threshold, match_count)` of every query received.
	pub fn queries(&self) -> Vec<(f32, u32)> {
		self.queries.lock().unwrap_or_else(|err| err.into_inner()).clone()
	}
}
impl SearchProvider for ScriptedSearch {
	fn search<'a>(
		&'a self,
		_cfg: &'a SearchProviderConfig,
		query: MatchQuery<'a>,
	) -> BoxFuture<'a, Result<Vec<CandidateDocument>>> {
		self.calls.fetch_add(1, Ordering::SeqCst);
		self.queries
			.lock()
			.unwrap_or_else(|err| err.into_inner())
			.push((query.match_threshold, query.match_count));

		Box::pin(async move {
			if self.fails {
				return Err(Error::Provider { message: "connection refused".to_string() });
			}

			Ok(self.documents.clone())
		})
	}

	fn probe<'a>(&'a self, _cfg: &'a SearchProviderConfig) -> BoxFuture<'a, Result<()>> {
		Box::pin(async move {
			if self.probe_fails {
				return Err(Error::Provider { message: "connection refused".to_string() });
			}

			Ok(())
		})
	}
}

/// Answers with a fixed token script.
///
/// `complete` returns the concatenated tokens. `stream` yields them one by one and then
/// optionally fails or stalls.
#[derive(Default)]
pub struct ScriptedCompletion {
	tokens: Vec<String>,
	fails: bool,
	fail_after: Option<usize>,
	stall_after: Option<usize>,
	calls: AtomicUsize,
	prompts: Mutex<Vec<String>>,
}
impl ScriptedCompletion {
	pub fn answering(answer: &str) -> Self {
		Self::streaming(&[answer])
	}

	pub fn streaming(tokens: &[&str]) -> Self {
		Self { tokens: tokens.iter().map(|token| token.to_string()).collect(), ..Self::default() }
	}

	pub fn failing() -> Self {
		Self { fails: true, ..Self::default() }
	}

	/// Emits the first `count` tokens and then an error item.
	pub fn fail_after(mut self, count: usize) -> Self {
		self.fail_after = Some(count);

		self
	}

	/// Emits the first `count` tokens and then never yields again.
	pub fn stall_after(mut self, count: usize) -> Self {
		self.stall_after = Some(count);

		self
	}

	pub fn calls(&self) -> usize {
		self.calls.load(Ordering::SeqCst)
	}

	pub fn prompts(&self) -> Vec<String> {
		self.prompts.lock().unwrap_or_else(|err| err.into_inner()).clone()
	}

	fn record(&self, prompt: &str) {
		self.calls.fetch_add(1, Ordering::SeqCst);
		self.prompts.lock().unwrap_or_else(|err| err.into_inner()).push(prompt.to_string());
	}
}
impl CompletionProvider for ScriptedCompletion {
	fn complete<'a>(
		&'a self,
		_cfg: &'a LlmProviderConfig,
		prompt: &'a str,
	) -> BoxFuture<'a, Result<String>> {
		self.record(prompt);

		Box::pin(async move {
			if self.fails {
				return Err(Error::Provider { message: "completion unavailable".to_string() });
			}

			Ok(self.tokens.concat())
		})
	}

	fn stream<'a>(
		&'a self,
		_cfg: &'a LlmProviderConfig,
		prompt: &'a str,
	) -> BoxFuture<'a, Result<TokenStream>> {
		self.record(prompt);

		Box::pin(async move {
			if self.fails {
				return Err(Error::Provider { message: "completion unavailable".to_string() });
			}

			let cut = self.fail_after.or(self.stall_after).unwrap_or(self.tokens.len());
			let head: Vec<Result<String>> =
				self.tokens.iter().take(cut).cloned().map(Ok).collect();
			let tokens: TokenStream = if self.fail_after.is_some() {
				let err = Error::Provider { message: "connection reset".to_string() };

				Box::pin(stream::iter(head).chain(stream::iter([Err(err)])))
			} else if self.stall_after.is_some() {
				Box::pin(stream::iter(head).chain(stream::pending()))
			} else {
				Box::pin(stream::iter(head))
			};

			Ok(tokens)
		})
	}
}
