use crate::{CandidateDocument, context};

/// Display titles of the documents that fed the context, in rank order.
pub fn source_titles(documents: &[CandidateDocument], untitled_placeholder: &str) -> Vec<String> {
	context::context_documents(documents)
		.iter()
		.map(|document| document.display_title().unwrap_or(untitled_placeholder).to_string())
		.collect()
}

/// `\n\n<label><title>, <title>, ...`
pub fn sources_footer(titles: &[String], label: &str) -> String {
	format!("\n\n{label}{}", titles.join(", "))
}

/// Suffix appended to answers produced without retrieved documents.
pub fn fallback_suffix(disclaimer: &str) -> String {
	format!("\n\n{disclaimer}")
}
