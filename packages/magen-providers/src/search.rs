//! Similarity search through a PostgREST RPC (Supabase `match_documents`).
//!
//! Ranking and thresholding happen inside the remote function; rows come back in the
//! order the function returns them and are never re-ranked here.

use std::time::Duration;

use reqwest::{Client, header::HeaderName};
use serde_json::Value;

use magen_domain::CandidateDocument;

use crate::{Error, Result};

const APIKEY_HEADER: &str = "apikey";

#[derive(Debug, Clone, Copy)]
pub struct MatchQuery<'a> {
	pub embedding: &'a [f32],
	pub match_threshold: f32,
	pub match_count: u32,
}

pub async fn search(
	client: &Client,
	cfg: &magen_config::SearchProviderConfig,
	query: MatchQuery<'_>,
) -> Result<Vec<CandidateDocument>> {
	let url = format!("{}/rest/v1/rpc/{}", cfg.api_base, cfg.rpc_function);
	let body = serde_json::json!({
		"query_embedding": query.embedding,
		"match_threshold": query.match_threshold,
		"match_count": query.match_count,
	});
	let res = client
		.post(url)
		.timeout(Duration::from_millis(cfg.timeout_ms))
		.headers(postgrest_headers(cfg)?)
		.json(&body)
		.send()
		.await?;
	let json: Value = res.error_for_status()?.json().await?;

	parse_match_response(json)
}

/// Reads one row from the document table to confirm the store is reachable.
pub async fn probe(client: &Client, cfg: &magen_config::SearchProviderConfig) -> Result<()> {
	let url = format!("{}/rest/v1/{}", cfg.api_base, cfg.health_table);

	client
		.get(url)
		.timeout(Duration::from_millis(cfg.timeout_ms))
		.headers(postgrest_headers(cfg)?)
		.query(&[("select", "id"), ("limit", "1")])
		.send()
		.await?
		.error_for_status()?;

	Ok(())
}

fn postgrest_headers(
	cfg: &magen_config::SearchProviderConfig,
) -> Result<reqwest::header::HeaderMap> {
	let mut headers = crate::auth_headers(&cfg.api_key, &cfg.default_headers)?;

	headers.insert(HeaderName::from_static(APIKEY_HEADER), cfg.api_key.parse()?);

	Ok(headers)
}

fn parse_match_response(json: Value) -> Result<Vec<CandidateDocument>> {
	match json {
		Value::Array(rows) => rows
			.into_iter()
			.map(|row| serde_json::from_value(row).map_err(Error::from))
			.collect(),
		Value::Null => Ok(Vec::new()),
		_ => Err(Error::InvalidResponse {
			message: "Match response must be an array of rows.".to_string(),
		}),
	}
}
