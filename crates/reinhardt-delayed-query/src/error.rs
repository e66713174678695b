//! Error types for delayed query sets

/// Errors raised by delayed query sets
///
/// Construction errors are always raised synchronously by the constructors.
/// Errors produced by the underlying component queries are carried through
/// [`DelayedQueryError::Backend`] without being rewritten.
#[derive(Debug, thiserror::Error)]
pub enum DelayedQueryError {
	/// No component query was supplied
	#[error("a delayed {kind} query set requires at least one component query")]
	EmptyComponents { kind: &'static str },

	/// Components do not share a single model
	#[error("can only combine query sets of a single model: expected {expected}, found {found}")]
	ModelMismatch { expected: String, found: String },

	/// A composed query set of a kind that cannot be flattened was passed in
	#[error("can only pass in query sets to a delayed {kind} query set, found a delayed {found}")]
	NestedComposition {
		kind: &'static str,
		found: &'static str,
	},

	/// A nested composition of the same kind carries different parameters
	#[error("incompatible parameters for nested delayed {kind}: {detail}")]
	IncompatibleParameters { kind: &'static str, detail: String },

	/// A parameter bag contained a key the composition does not understand
	#[error("received an unexpected keyword argument '{0}'")]
	UnexpectedParameter(String),

	/// A known parameter carried a value of the wrong type
	#[error("invalid value for parameter '{name}': {detail}")]
	InvalidParameter { name: String, detail: String },

	/// `get()` matched zero rows
	#[error("{model} matching query does not exist.")]
	DoesNotExist { model: String },

	/// `get()` matched more than one row
	#[error("get() returned more than one {model} -- it returned {count}!")]
	MultipleObjectsReturned { model: String, count: usize },

	/// A fetched row carries no primary key, so it cannot be keyed by one
	#[error("in_bulk() requires {model} rows that include their primary key '{field}'")]
	MissingPrimaryKey { model: String, field: String },

	/// The operation has no well-defined meaning after composition
	#[error("{operation}() is not supported on a delayed {kind} query set")]
	NotSupported {
		operation: &'static str,
		kind: &'static str,
	},

	/// Error surfaced by the component query backend
	#[error(transparent)]
	Backend(#[from] anyhow::Error),
}

impl DelayedQueryError {
	pub fn is_not_found(&self) -> bool {
		matches!(self, Self::DoesNotExist { .. })
	}

	pub fn is_multiple_objects(&self) -> bool {
		matches!(self, Self::MultipleObjectsReturned { .. })
	}

	pub fn is_not_supported(&self) -> bool {
		matches!(self, Self::NotSupported { .. })
	}

	/// Whether this error was raised while building a delayed query set
	pub fn is_construction(&self) -> bool {
		matches!(
			self,
			Self::EmptyComponents { .. }
				| Self::ModelMismatch { .. }
				| Self::NestedComposition { .. }
				| Self::IncompatibleParameters { .. }
				| Self::UnexpectedParameter(_)
				| Self::InvalidParameter { .. }
		)
	}
}

pub type Result<T> = std::result::Result<T, DelayedQueryError>;
