pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Invalid query: {message}")]
	InvalidQuery { message: String },
	#[error("Search unavailable: dense index failed ({dense}); sparse index failed ({sparse}).")]
	SearchUnavailable { dense: String, sparse: String },
	#[error("Collaborator contract violated: {message}")]
	CollaboratorContract { message: String },
	#[error("Invalid configuration: {message}")]
	InvalidConfig { message: String },
	#[error("Provider error: {message}")]
	Provider { message: String },
	#[error("Qdrant error: {message}")]
	Qdrant { message: String },
}
impl Error {
	/// Whether the caller may retry the whole search unchanged.
	pub fn is_retryable(&self) -> bool {
		matches!(self, Self::SearchUnavailable { .. } | Self::Provider { .. } | Self::Qdrant { .. })
	}
}

impl From<sift_providers::Error> for Error {
	fn from(err: sift_providers::Error) -> Self {
		Self::Provider { message: err.to_string() }
	}
}

impl From<sift_storage::Error> for Error {
	fn from(err: sift_storage::Error) -> Self {
		match err {
			sift_storage::Error::InvalidArgument(message) => Self::InvalidConfig { message },
			sift_storage::Error::Qdrant(inner) => Self::Qdrant { message: inner.to_string() },
		}
	}
}

impl From<crate::search::fusion::FusionError> for Error {
	fn from(err: crate::search::fusion::FusionError) -> Self {
		use crate::search::fusion::FusionError;

		match err {
			FusionError::InvalidK => Self::InvalidConfig { message: err.to_string() },
			FusionError::DuplicateChunk { .. } =>
				Self::CollaboratorContract { message: err.to_string() },
		}
	}
}

impl From<sift_config::Error> for Error {
	fn from(err: sift_config::Error) -> Self {
		Self::InvalidConfig { message: err.to_string() }
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn storage_argument_errors_are_not_retryable() {
		let err = Error::from(sift_storage::Error::InvalidArgument(
			"Query vector has 3 dimensions; collection expects 4.".to_string(),
		));

		assert!(matches!(err, Error::InvalidConfig { .. }));
		assert!(!err.is_retryable());
	}
}
