use crate::CandidateDocument;

pub const MAX_CONTEXT_DOCUMENTS: usize = 5;
pub const MAX_DOCUMENT_CHARS: usize = 500;
pub const CONTEXT_SEPARATOR: &str = "\n\n---\n\n";

/// The documents that feed the context, in search order.
pub fn context_documents(documents: &[CandidateDocument]) -> &[CandidateDocument] {
	&documents[..documents.len().min(MAX_CONTEXT_DOCUMENTS)]
}

/// Builds the prompt context from ranked search results.
///
/// Keeps the first [`MAX_CONTEXT_DOCUMENTS`] documents, truncates each text to
/// [`MAX_DOCUMENT_CHARS`] characters (mid-word cuts are expected) and prefixes a
/// `Title:` line when the document has a title. Entries are joined with
/// [`CONTEXT_SEPARATOR`].
pub fn build_context(documents: &[CandidateDocument]) -> String {
	context_documents(documents)
		.iter()
		.map(context_entry)
		.collect::<Vec<_>>()
		.join(CONTEXT_SEPARATOR)
}

fn context_entry(document: &CandidateDocument) -> String {
	let text = truncate_chars(&document.plain_text, MAX_DOCUMENT_CHARS);

	match document.display_title() {
		Some(title) => format!("Title: {title}\n{text}"),
		None => text.to_string(),
	}
}

fn truncate_chars(text: &str, max_chars: usize) -> &str {
	match text.char_indices().nth(max_chars) {
		Some((byte_index, _)) => &text[..byte_index],
		None => text,
	}
}
