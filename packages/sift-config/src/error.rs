use std::path::PathBuf;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Cannot read config {path:?}: {source}")]
	ReadConfig { path: PathBuf, source: std::io::Error },
	#[error("Cannot parse config {path:?}: {source}")]
	ParseConfig { path: PathBuf, source: toml::de::Error },
	/// A value parsed but breaks a search or provider constraint.
	#[error("Invalid config: {message}")]
	Validation { message: String },
}
