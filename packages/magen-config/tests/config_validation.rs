use std::{
	env, fs,
	path::PathBuf,
	sync::atomic::{AtomicU64, Ordering},
	time::{SystemTime, UNIX_EPOCH},
};

use toml::Value;

use magen_config::{Config, Error, PromptVariant, TemplateSet};

const SAMPLE_CONFIG_TEMPLATE_TOML: &str = include_str!("fixtures/sample_config.template.toml");

fn sample_toml() -> String {
	SAMPLE_CONFIG_TEMPLATE_TOML.to_string()
}

fn sample_toml_with(section: &[&str], key: &str, value: Value) -> String {
	let mut root: Value =
		toml::from_str(SAMPLE_CONFIG_TEMPLATE_TOML).expect("Failed to parse template config.");
	let mut table = root.as_table_mut().expect("Template config must be a table.");

	for name in section {
		table = table
			.get_mut(*name)
			.and_then(Value::as_table_mut)
			.unwrap_or_else(|| panic!("Template config must include [{name}]."));
	}

	table.insert(key.to_string(), value);

	toml::to_string(&root).expect("Failed to render template config.")
}

fn sample_toml_without(section: &str) -> String {
	let mut root: Value =
		toml::from_str(SAMPLE_CONFIG_TEMPLATE_TOML).expect("Failed to parse template config.");

	root.as_table_mut().expect("Template config must be a table.").remove(section);

	toml::to_string(&root).expect("Failed to render template config.")
}

fn write_temp_config(payload: String) -> PathBuf {
	static COUNTER: AtomicU64 = AtomicU64::new(0);

	let nanos = SystemTime::now()
		.duration_since(UNIX_EPOCH)
		.expect("System time must be valid.")
		.as_nanos();
	let ordinal = COUNTER.fetch_add(1, Ordering::SeqCst);
	let pid = std::process::id();
	let mut path = env::temp_dir();

	path.push(format!("magen_config_test_{nanos}_{pid}_{ordinal}.toml"));

	fs::write(&path, payload).expect("Failed to write test config.");

	path
}

fn base_config() -> Config {
	toml::from_str(&sample_toml()).expect("Failed to parse test config.")
}

#[test]
fn sample_config_loads() {
	let path = write_temp_config(sample_toml());
	let result = magen_config::load(&path);

	fs::remove_file(&path).expect("Failed to remove test config.");

	let cfg = result.expect("Expected sample config to load.");

	assert_eq!(cfg.retrieval.match_count, 5);
	assert_eq!(cfg.answer.template_set, TemplateSet::Chronological);
	assert_eq!(cfg.answer.default_prompt, PromptVariant::Stepback);
}

#[test]
fn load_trims_trailing_slash_from_api_base() {
	let path = write_temp_config(sample_toml());
	let result = magen_config::load(&path);

	fs::remove_file(&path).expect("Failed to remove test config.");

	let cfg = result.expect("Expected sample config to load.");

	assert_eq!(cfg.providers.embedding.api_base, "https://api.openai.com");
}

#[test]
fn retrieval_and_answer_sections_default_when_missing() {
	let payload = sample_toml_without("retrieval");
	let payload = {
		let mut root: Value = toml::from_str(&payload).expect("Failed to parse config.");

		root.as_table_mut().expect("Config must be a table.").remove("answer");

		toml::to_string(&root).expect("Failed to render config.")
	};
	let path = write_temp_config(payload);
	let result = magen_config::load(&path);

	fs::remove_file(&path).expect("Failed to remove test config.");

	let cfg = result.expect("Expected config without optional sections to load.");

	assert_eq!(cfg.retrieval.match_threshold, 0.75);
	assert_eq!(cfg.retrieval.match_count, 5);
	assert_eq!(cfg.answer.sources_label, "Sources: ");
	assert_eq!(cfg.answer.untitled_placeholder, "(untitled)");
	assert!(cfg.answer.fallback_disclaimer.contains("ידע כללי"));
}

#[test]
fn temperature_must_be_zero() {
	let payload = sample_toml_with(&["providers", "llm"], "temperature", Value::Float(0.7));
	let path = write_temp_config(payload);
	let result = magen_config::load(&path);

	fs::remove_file(&path).expect("Failed to remove test config.");

	let err = result.expect_err("Expected temperature validation error.");

	assert!(
		err.to_string().contains("providers.llm.temperature must be 0."),
		"Unexpected error: {err}"
	);
}

#[test]
fn unknown_template_set_fails_to_parse() {
	let payload =
		sample_toml_with(&["answer"], "template_set", Value::String("verbose".to_string()));
	let path = write_temp_config(payload);
	let result = magen_config::load(&path);

	fs::remove_file(&path).expect("Failed to remove test config.");

	assert!(matches!(result, Err(Error::ParseConfig { .. })));
}

#[test]
fn missing_file_reports_read_error() {
	let mut path = env::temp_dir();

	path.push("magen_config_test_missing.toml");

	let result = magen_config::load(&path);

	assert!(matches!(result, Err(Error::ReadConfig { .. })));
}

#[test]
fn api_keys_must_be_non_empty() {
	let mut cfg = base_config();

	cfg.providers.search.api_key = "  ".to_string();

	let err = magen_config::validate(&cfg).expect_err("Expected api_key validation error.");

	assert!(
		err.to_string().contains("Provider search api_key must be non-empty."),
		"Unexpected error: {err}"
	);
}

#[test]
fn api_base_must_be_http_url() {
	let mut cfg = base_config();

	cfg.providers.llm.api_base = "api.openai.com".to_string();

	let err = magen_config::validate(&cfg).expect_err("Expected api_base validation error.");

	assert!(
		err.to_string().contains("Provider llm api_base must be an http(s) URL."),
		"Unexpected error: {err}"
	);
}

#[test]
fn match_threshold_must_be_in_unit_range() {
	let mut cfg = base_config();

	cfg.retrieval.match_threshold = 1.5;

	let err = magen_config::validate(&cfg).expect_err("Expected match_threshold validation error.");

	assert!(
		err.to_string().contains("retrieval.match_threshold must be in the range 0.0-1.0."),
		"Unexpected error: {err}"
	);

	cfg.retrieval.match_threshold = f32::NAN;

	let err = magen_config::validate(&cfg).expect_err("Expected finite threshold error.");

	assert!(
		err.to_string().contains("retrieval.match_threshold must be a finite number."),
		"Unexpected error: {err}"
	);
}

#[test]
fn match_count_must_be_positive() {
	let mut cfg = base_config();

	cfg.retrieval.match_count = 0;

	let err = magen_config::validate(&cfg).expect_err("Expected match_count validation error.");

	assert!(
		err.to_string().contains("retrieval.match_count must be greater than zero."),
		"Unexpected error: {err}"
	);
}

#[test]
fn embedding_dimensions_must_be_positive_when_set() {
	let mut cfg = base_config();

	cfg.providers.embedding.dimensions = Some(0);

	let err = magen_config::validate(&cfg).expect_err("Expected dimensions validation error.");

	assert!(
		err.to_string().contains("providers.embedding.dimensions must be greater than zero."),
		"Unexpected error: {err}"
	);

	cfg.providers.embedding.dimensions = Some(1_536);

	assert!(magen_config::validate(&cfg).is_ok());
}

#[test]
fn provider_timeouts_must_be_positive() {
	let mut cfg = base_config();

	cfg.providers.embedding.timeout_ms = 0;

	let err = magen_config::validate(&cfg).expect_err("Expected timeout validation error.");

	assert!(
		err.to_string().contains("Provider embedding timeout_ms must be greater than zero."),
		"Unexpected error: {err}"
	);
}

#[test]
fn stream_idle_timeout_must_be_positive() {
	let mut cfg = base_config();

	cfg.answer.stream_idle_timeout_ms = 0;

	let err = magen_config::validate(&cfg).expect_err("Expected idle timeout validation error.");

	assert!(
		err.to_string().contains("answer.stream_idle_timeout_ms must be greater than zero."),
		"Unexpected error: {err}"
	);
}
