//! Delayed query set configuration

use serde::{Deserialize, Serialize};

/// Behaviour switches shared by a delayed query set and everything derived from it
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DelayedConfig {
	/// Answer `count()` from a populated result cache without querying
	pub count_uses_result_cache: bool,
	/// Drop `select_related()` joins before counting; some backends reject
	/// duplicate column names inside combined subqueries
	pub strip_select_related_on_count: bool,
}

impl Default for DelayedConfig {
	fn default() -> Self {
		Self {
			count_uses_result_cache: true,
			strip_select_related_on_count: true,
		}
	}
}

impl DelayedConfig {
	/// Create a configuration with default values
	///
	/// # Examples
	///
	/// ```rust
	/// use reinhardt_delayed_query::DelayedConfig;
	///
	/// let config = DelayedConfig::new();
	/// assert!(config.count_uses_result_cache);
	/// assert!(config.strip_select_related_on_count);
	/// ```
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_count_uses_result_cache(mut self, enabled: bool) -> Self {
		self.count_uses_result_cache = enabled;
		self
	}

	pub fn with_strip_select_related_on_count(mut self, enabled: bool) -> Self {
		self.strip_select_related_on_count = enabled;
		self
	}

	/// Load a configuration from a TOML document
	///
	/// Missing keys fall back to their defaults.
	///
	/// # Examples
	///
	/// ```rust
	/// use reinhardt_delayed_query::DelayedConfig;
	///
	/// let config = DelayedConfig::from_toml_str("count_uses_result_cache = false").unwrap();
	/// assert!(!config.count_uses_result_cache);
	/// assert!(config.strip_select_related_on_count);
	/// ```
	pub fn from_toml_str(source: &str) -> Result<Self, toml::de::Error> {
		toml::from_str(source)
	}
}
