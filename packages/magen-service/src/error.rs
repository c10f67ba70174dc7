pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Invalid request: {message}")]
	InvalidRequest { message: String },
	#[error("Provider error: {message}")]
	Provider { message: String },
	#[error("Stream interrupted: {message}")]
	StreamInterrupted { message: String },
}
impl From<magen_providers::Error> for Error {
	fn from(err: magen_providers::Error) -> Self {
		Self::Provider { message: err.to_string() }
	}
}
