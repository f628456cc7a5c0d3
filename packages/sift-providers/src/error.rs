pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Failures talking to an embedding or rerank endpoint.
#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Provider request failed: {0}")]
	Http(#[from] reqwest::Error),
	#[error("Invalid provider header name: {0}")]
	HeaderName(#[from] reqwest::header::InvalidHeaderName),
	#[error("Invalid provider header value: {0}")]
	HeaderValue(#[from] reqwest::header::InvalidHeaderValue),
	#[error("Default header {name:?} must have a string value.")]
	NonStringHeader { name: String },
	#[error("Malformed provider response: {message}")]
	MalformedResponse { message: String },
	#[error("Rerank response has no score for document {index}.")]
	MissingScore { index: usize },
	#[error("Embedding provider returned {actual} vectors for {expected} inputs.")]
	VectorCountMismatch { expected: usize, actual: usize },
}
