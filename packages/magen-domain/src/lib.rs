pub mod context;
pub mod document;
pub mod prompt;
pub mod sources;

pub use document::CandidateDocument;
