mod error;
mod types;

pub use error::{Error, Result};
pub use types::{
	Answer, Config, EmbeddingProviderConfig, LlmProviderConfig, PromptVariant, Providers,
	Retrieval, SearchProviderConfig, Security, Service, TemplateSet,
};

use std::{fs, path::Path};

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;

	let mut cfg: Config = toml::from_str(&raw)
		.map_err(|err| Error::ParseConfig { path: path.to_path_buf(), source: err })?;

	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	if cfg.service.http_bind.trim().is_empty() {
		return Err(Error::Validation {
			message: "service.http_bind must be non-empty.".to_string(),
		});
	}
	if cfg.providers.llm.temperature != 0.0 {
		return Err(Error::Validation {
			message: "providers.llm.temperature must be 0.".to_string(),
		});
	}
	if let Some(dimensions) = cfg.providers.embedding.dimensions
		&& dimensions == 0
	{
		return Err(Error::Validation {
			message: "providers.embedding.dimensions must be greater than zero.".to_string(),
		});
	}
	if cfg.providers.search.rpc_function.trim().is_empty() {
		return Err(Error::Validation {
			message: "providers.search.rpc_function must be non-empty.".to_string(),
		});
	}
	if cfg.providers.search.health_table.trim().is_empty() {
		return Err(Error::Validation {
			message: "providers.search.health_table must be non-empty.".to_string(),
		});
	}

	for (label, key) in [
		("embedding", &cfg.providers.embedding.api_key),
		("search", &cfg.providers.search.api_key),
		("llm", &cfg.providers.llm.api_key),
	] {
		if key.trim().is_empty() {
			return Err(Error::Validation {
				message: format!("Provider {label} api_key must be non-empty."),
			});
		}
	}
	for (label, base) in [
		("embedding", &cfg.providers.embedding.api_base),
		("search", &cfg.providers.search.api_base),
		("llm", &cfg.providers.llm.api_base),
	] {
		if !(base.starts_with("http://") || base.starts_with("https://")) {
			return Err(Error::Validation {
				message: format!("Provider {label} api_base must be an http(s) URL."),
			});
		}
	}
	for (label, timeout_ms) in [
		("embedding", cfg.providers.embedding.timeout_ms),
		("search", cfg.providers.search.timeout_ms),
		("llm", cfg.providers.llm.timeout_ms),
	] {
		if timeout_ms == 0 {
			return Err(Error::Validation {
				message: format!("Provider {label} timeout_ms must be greater than zero."),
			});
		}
	}

	if !cfg.retrieval.match_threshold.is_finite() {
		return Err(Error::Validation {
			message: "retrieval.match_threshold must be a finite number.".to_string(),
		});
	}
	if !(0.0..=1.0).contains(&cfg.retrieval.match_threshold) {
		return Err(Error::Validation {
			message: "retrieval.match_threshold must be in the range 0.0-1.0.".to_string(),
		});
	}
	if cfg.retrieval.match_count == 0 {
		return Err(Error::Validation {
			message: "retrieval.match_count must be greater than zero.".to_string(),
		});
	}
	if cfg.answer.untitled_placeholder.trim().is_empty() {
		return Err(Error::Validation {
			message: "answer.untitled_placeholder must be non-empty.".to_string(),
		});
	}
	if cfg.answer.fallback_disclaimer.trim().is_empty() {
		return Err(Error::Validation {
			message: "answer.fallback_disclaimer must be non-empty.".to_string(),
		});
	}
	if cfg.answer.stream_idle_timeout_ms == 0 {
		return Err(Error::Validation {
			message: "answer.stream_idle_timeout_ms must be greater than zero.".to_string(),
		});
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	for base in [
		&mut cfg.providers.embedding.api_base,
		&mut cfg.providers.search.api_base,
		&mut cfg.providers.llm.api_base,
	] {
		let trimmed = base.trim().trim_end_matches('/').to_string();

		*base = trimmed;
	}
}
