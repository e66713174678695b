//! Memory store configuration

use crate::error::MemoryQueryError;
use serde::{Deserialize, Serialize};

/// Django's `REPR_OUTPUT_SIZE`
pub const DEFAULT_REPR_LIMIT: usize = 20;

#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryConfig {
	/// Table name used when rendering query plans
	pub table: String,
	/// Model name reported by every query over the store
	pub model: String,
	pub primary_key: String,
	pub database_alias: String,
	/// Number of rows shown by `repr()` before truncating
	pub repr_limit: usize,
}

impl Default for MemoryConfig {
	fn default() -> Self {
		Self {
			table: String::new(),
			model: String::new(),
			primary_key: "id".to_string(),
			database_alias: "default".to_string(),
			repr_limit: DEFAULT_REPR_LIMIT,
		}
	}
}

impl MemoryConfig {
	/// Create a configuration for `model` rows stored in `table`
	///
	/// # Examples
	///
	/// ```rust
	/// use reinhardt_memory_query::MemoryConfig;
	///
	/// let config = MemoryConfig::new("auth_user", "User");
	/// assert_eq!(config.primary_key, "id");
	/// assert_eq!(config.database_alias, "default");
	/// assert!(config.validate().is_ok());
	/// ```
	pub fn new(table: impl Into<String>, model: impl Into<String>) -> Self {
		Self {
			table: table.into(),
			model: model.into(),
			..Self::default()
		}
	}

	pub fn with_primary_key(mut self, field: impl Into<String>) -> Self {
		self.primary_key = field.into();
		self
	}

	pub fn with_database_alias(mut self, alias: impl Into<String>) -> Self {
		self.database_alias = alias.into();
		self
	}

	pub fn with_repr_limit(mut self, limit: usize) -> Self {
		self.repr_limit = limit;
		self
	}

	/// Load and validate a configuration from a TOML document
	///
	/// # Examples
	///
	/// ```rust
	/// use reinhardt_memory_query::MemoryConfig;
	///
	/// let config = MemoryConfig::from_toml_str(r#"
	/// table = "pets_dog"
	/// model = "Dog"
	/// repr_limit = 5
	/// "#).unwrap();
	/// assert_eq!(config.model, "Dog");
	/// assert_eq!(config.repr_limit, 5);
	/// ```
	pub fn from_toml_str(source: &str) -> Result<Self, MemoryQueryError> {
		let config: Self = toml::from_str(source)?;
		config.validate().map_err(MemoryQueryError::InvalidConfig)?;
		Ok(config)
	}

	pub fn validate(&self) -> Result<(), String> {
		if self.table.is_empty() {
			return Err("table must not be empty".to_string());
		}
		if self.model.is_empty() {
			return Err("model must not be empty".to_string());
		}
		if self.primary_key.is_empty() {
			return Err("primary_key must not be empty".to_string());
		}
		if self.repr_limit == 0 {
			return Err("repr_limit must be > 0".to_string());
		}
		Ok(())
	}
}
