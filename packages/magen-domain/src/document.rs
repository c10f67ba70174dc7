use serde::{Deserialize, Deserializer, Serialize};

/// A row returned by the similarity search, ranked by the search function.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateDocument {
	#[serde(default)]
	pub title: Option<String>,
	#[serde(default, deserialize_with = "null_as_empty")]
	pub plain_text: String,
	#[serde(default)]
	pub similarity: f32,
}
impl CandidateDocument {
	/// The title when present and non-empty.
	pub fn display_title(&self) -> Option<&str> {
		self.title.as_deref().filter(|title| !title.is_empty())
	}
}

/// Reads a missing or `null` string as empty.
pub fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
	D: Deserializer<'de>,
{
	Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}
