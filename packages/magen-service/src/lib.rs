pub mod chat;
pub mod health;
pub mod retrieval;
pub mod title;

mod error;

pub use chat::{ChatRequest, ChatResponse, ChatStream, FrameStream, SourceType, StreamFrame};
pub use error::{Error, Result};
pub use magen_providers::search::MatchQuery;
pub use retrieval::SearchOutcome;
pub use title::{TitleRequest, TitleResponse};

use std::{future::Future, pin::Pin, sync::Arc};

use futures::{Stream, StreamExt};
use reqwest::Client;

use magen_config::{Config, EmbeddingProviderConfig, LlmProviderConfig, SearchProviderConfig};
use magen_domain::CandidateDocument;
use magen_providers::{completion, embedding, search};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Generated tokens in order. An `Err` item ends generation.
pub type TokenStream = Pin<Box<dyn Stream<Item = Result<String>> + Send>>;

pub trait EmbeddingProvider
where
	Self: Send + Sync,
{
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		text: &'a str,
	) -> BoxFuture<'a, Result<Vec<f32>>>;
}

pub trait SearchProvider
where
	Self: Send + Sync,
{
	/// Ranked matches above the threshold. An empty vector is a valid answer.
	fn search<'a>(
		&'a self,
		cfg: &'a SearchProviderConfig,
		query: MatchQuery<'a>,
	) -> BoxFuture<'a, Result<Vec<CandidateDocument>>>;

	fn probe<'a>(&'a self, cfg: &'a SearchProviderConfig) -> BoxFuture<'a, Result<()>>;
}

pub trait CompletionProvider
where
	Self: Send + Sync,
{
	fn complete<'a>(
		&'a self,
		cfg: &'a LlmProviderConfig,
		prompt: &'a str,
	) -> BoxFuture<'a, Result<String>>;

	fn stream<'a>(
		&'a self,
		cfg: &'a LlmProviderConfig,
		prompt: &'a str,
	) -> BoxFuture<'a, Result<TokenStream>>;
}

#[derive(Clone)]
pub struct Providers {
	pub embedding: Arc<dyn EmbeddingProvider>,
	pub search: Arc<dyn SearchProvider>,
	pub completion: Arc<dyn CompletionProvider>,
}
impl Providers {
	pub fn new(
		embedding: Arc<dyn EmbeddingProvider>,
		search: Arc<dyn SearchProvider>,
		completion: Arc<dyn CompletionProvider>,
	) -> Self {
		Self { embedding, search, completion }
	}

	/// HTTP-backed providers sharing one connection pool.
	pub fn http(client: Client) -> Self {
		let provider = Arc::new(DefaultProviders { client });

		Self { embedding: provider.clone(), search: provider.clone(), completion: provider }
	}
}

pub struct MagenService {
	pub cfg: Config,
	pub providers: Providers,
}
impl MagenService {
	pub fn new(cfg: Config) -> Result<Self> {
		let client = Client::builder().build().map_err(magen_providers::Error::from)?;

		Ok(Self { cfg, providers: Providers::http(client) })
	}

	pub fn with_providers(cfg: Config, providers: Providers) -> Self {
		Self { cfg, providers }
	}
}

struct DefaultProviders {
	client: Client,
}
impl EmbeddingProvider for DefaultProviders {
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		text: &'a str,
	) -> BoxFuture<'a, Result<Vec<f32>>> {
		Box::pin(async move { Ok(embedding::embed(&self.client, cfg, text).await?) })
	}
}
impl SearchProvider for DefaultProviders {
	fn search<'a>(
		&'a self,
		cfg: &'a SearchProviderConfig,
		query: MatchQuery<'a>,
	) -> BoxFuture<'a, Result<Vec<CandidateDocument>>> {
		Box::pin(async move { Ok(search::search(&self.client, cfg, query).await?) })
	}

	fn probe<'a>(&'a self, cfg: &'a SearchProviderConfig) -> BoxFuture<'a, Result<()>> {
		Box::pin(async move { Ok(search::probe(&self.client, cfg).await?) })
	}
}
impl CompletionProvider for DefaultProviders {
	fn complete<'a>(
		&'a self,
		cfg: &'a LlmProviderConfig,
		prompt: &'a str,
	) -> BoxFuture<'a, Result<String>> {
		Box::pin(async move { Ok(completion::complete(&self.client, cfg, prompt).await?) })
	}

	fn stream<'a>(
		&'a self,
		cfg: &'a LlmProviderConfig,
		prompt: &'a str,
	) -> BoxFuture<'a, Result<TokenStream>> {
		Box::pin(async move {
			let tokens = completion::stream(&self.client, cfg, prompt).await?;
			let tokens: TokenStream = Box::pin(tokens.map(|token| token.map_err(Error::from)));

			Ok(tokens)
		})
	}
}
