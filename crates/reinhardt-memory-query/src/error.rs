//! Errors raised by the in-memory backend

use reinhardt_delayed_query::DelayedQueryError;

#[derive(Debug, thiserror::Error)]
pub enum MemoryQueryError {
	#[error("invalid memory store configuration: {0}")]
	InvalidConfig(String),

	#[error("failed to parse memory store configuration: {0}")]
	Parse(#[from] toml::de::Error),

	/// Writes are refused on `UNION` / `INTERSECT` / `EXCEPT` results,
	/// the same way a database refuses to update a compound select
	#[error("{operation}() is not allowed on a combined query")]
	CombinedWrite { operation: &'static str },

	#[error("cannot combine {expected} rows with {found} rows")]
	ModelMismatch { expected: String, found: String },

	#[error("raw SQL is not supported by the in-memory backend")]
	RawUnsupported,

	#[error("{model} with primary key {key} already exists")]
	DuplicatePrimaryKey { model: String, key: String },

	/// Every integer key up to `i64::MAX` has been handed out
	#[error("primary key sequence of {model} is exhausted")]
	KeySequenceExhausted { model: String },
}

impl From<MemoryQueryError> for DelayedQueryError {
	fn from(error: MemoryQueryError) -> Self {
		DelayedQueryError::Backend(anyhow::Error::new(error))
	}
}
