use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
	pub service: Service,
	pub security: Security,
	pub providers: Providers,
	#[serde(default)]
	pub retrieval: Retrieval,
	#[serde(default)]
	pub answer: Answer,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Service {
	pub http_bind: String,
	pub log_level: String,
	#[serde(default)]
	pub cors_permissive: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Security {
	pub bind_localhost_only: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Providers {
	pub embedding: EmbeddingProviderConfig,
	pub search: SearchProviderConfig,
	pub llm: LlmProviderConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmbeddingProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub model: String,
	/// Optional. Sent to the provider and checked against returned vectors when set.
	pub dimensions: Option<u32>,
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

/// PostgREST endpoint exposing the `match_documents` similarity function.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	pub api_key: String,
	#[serde(default = "default_rpc_function")]
	pub rpc_function: String,
	/// Table probed by the readiness check.
	#[serde(default = "default_health_table")]
	pub health_table: String,
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LlmProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub model: String,
	pub temperature: f32,
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Retrieval {
	#[serde(default = "default_match_threshold")]
	pub match_threshold: f32,
	#[serde(default = "default_match_count")]
	pub match_count: u32,
}
impl Default for Retrieval {
	fn default() -> Self {
		Self { match_threshold: default_match_threshold(), match_count: default_match_count() }
	}
}

#[derive(Debug, Clone, Deserialize)]
pub struct Answer {
	#[serde(default)]
	pub template_set: TemplateSet,
	#[serde(default)]
	pub default_prompt: PromptVariant,
	#[serde(default = "default_sources_label")]
	pub sources_label: String,
	#[serde(default = "default_untitled_placeholder")]
	pub untitled_placeholder: String,
	#[serde(default = "default_fallback_disclaimer")]
	pub fallback_disclaimer: String,
	#[serde(default = "default_stream_error_marker")]
	pub stream_error_marker: String,
	/// Longest wait between two streamed tokens before the stream is abandoned.
	#[serde(default = "default_stream_idle_timeout_ms")]
	pub stream_idle_timeout_ms: u64,
}
impl Default for Answer {
	fn default() -> Self {
		Self {
			template_set: TemplateSet::default(),
			default_prompt: PromptVariant::default(),
			sources_label: default_sources_label(),
			untitled_placeholder: default_untitled_placeholder(),
			fallback_disclaimer: default_fallback_disclaimer(),
			stream_error_marker: default_stream_error_marker(),
			stream_idle_timeout_ms: default_stream_idle_timeout_ms(),
		}
	}
}

/// Named prompt wordings. Both sets carry a direct and a stepback template.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemplateSet {
	Concise,
	#[default]
	Chronological,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PromptVariant {
	Direct,
	#[default]
	Stepback,
}
fn default_rpc_function() -> String {
	"match_documents".to_string()
}

fn default_health_table() -> String {
	"documents".to_string()
}

fn default_match_threshold() -> f32 {
	0.75
}

fn default_match_count() -> u32 {
	5
}

fn default_sources_label() -> String {
	"Sources: ".to_string()
}

fn default_untitled_placeholder() -> String {
	"(untitled)".to_string()
}

fn default_fallback_disclaimer() -> String {
	"(התשובה מבוססת על ידע כללי ואינה נתמכת במסמכים רשמיים)".to_string()
}

fn default_stream_error_marker() -> String {
	"❌ שגיאה במהלך יצירת התשובה.".to_string()
}

fn default_stream_idle_timeout_ms() -> u64 {
	30_000
}
