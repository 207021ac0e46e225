use thiserror::Error;

/// Broad classification of an [`Error`].
///
/// Outer layers (the HTTP server, the demo binary) map kinds to status codes
/// or exit messages without matching every variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
	Validation,
	Format,
	Lookup,
	Exhaustion,
	Assertion,
	Io,
}

/// Errors raised while loading, compiling or sampling a phonology.
///
/// Every variant is unrecoverable at the point of detection and is
/// propagated to the caller as-is.
#[derive(Debug, Error)]
pub enum Error {
	/// A parameter is out of range (non-positive count, negative shape,
	/// mismatched lengths, unknown distribution name...).
	#[error("validation error: {0}")]
	Validation(String),

	/// The phonology document is malformed or incomplete.
	#[error("format error: {0}")]
	Format(String),

	/// A syllable template references a category that is not declared.
	#[error("lookup error: template references undeclared category `{0}`")]
	UnknownCategory(char),

	/// A deduplicated batch could not be filled within the attempt bound.
	#[error("exhaustion error: produced {produced} of {requested} distinct words after {attempts} attempts")]
	Exhausted {
		requested: usize,
		produced: usize,
		attempts: usize,
	},

	/// A sampled syllable came out empty.
	#[error("assertion error: template `{template}` produced an empty syllable")]
	EmptySyllable { template: String },

	#[error("io error: {0}")]
	Io(#[from] std::io::Error),
}

impl Error {
	/// Returns the broad kind of this error.
	pub fn kind(&self) -> ErrorKind {
		match self {
			Error::Validation(_) => ErrorKind::Validation,
			Error::Format(_) => ErrorKind::Format,
			Error::UnknownCategory(_) => ErrorKind::Lookup,
			Error::Exhausted { .. } => ErrorKind::Exhaustion,
			Error::EmptySyllable { .. } => ErrorKind::Assertion,
			Error::Io(_) => ErrorKind::Io,
		}
	}
}

impl From<serde_yaml::Error> for Error {
	fn from(error: serde_yaml::Error) -> Self {
		Error::Format(error.to_string())
	}
}

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, Error>;
