//! Rows of the in-memory store

use indexmap::IndexMap;
use reinhardt_delayed_query::criteria::FilterValue;
use std::fmt;

/// A single record: field names mapped to values, in insertion order
///
/// Equality compares field sets and values, so two rows with the same data
/// are equal regardless of field order. Combined queries rely on this to
/// remove duplicates.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
	fields: IndexMap<String, FilterValue>,
}

impl Row {
	pub fn new() -> Self {
		Self::default()
	}

	/// Field value, or `None` if the row has no such field
	pub fn get(&self, field: &str) -> Option<&FilterValue> {
		self.fields.get(field)
	}

	/// Field value, treating a missing field as `NULL`
	pub fn value(&self, field: &str) -> FilterValue {
		self.fields.get(field).cloned().unwrap_or(FilterValue::Null)
	}

	pub fn set(&mut self, field: impl Into<String>, value: impl Into<FilterValue>) {
		self.fields.insert(field.into(), value.into());
	}

	/// Builder form of [`Row::set`]
	pub fn with(mut self, field: impl Into<String>, value: impl Into<FilterValue>) -> Self {
		self.set(field, value);
		self
	}

	pub fn remove(&mut self, field: &str) -> Option<FilterValue> {
		self.fields.shift_remove(field)
	}

	pub fn contains_field(&self, field: &str) -> bool {
		self.fields.contains_key(field)
	}

	pub fn field_names(&self) -> impl Iterator<Item = &str> {
		self.fields.keys().map(String::as_str)
	}

	pub fn iter(&self) -> impl Iterator<Item = (&str, &FilterValue)> {
		self.fields.iter().map(|(k, v)| (k.as_str(), v))
	}

	pub fn len(&self) -> usize {
		self.fields.len()
	}

	pub fn is_empty(&self) -> bool {
		self.fields.is_empty()
	}

	/// Keep only `fields`, in the given order
	///
	/// Fields the row does not have come back as `NULL`.
	pub fn project(&self, fields: &[String]) -> Row {
		fields
			.iter()
			.map(|field| (field.clone(), self.value(field)))
			.collect()
	}

	/// Drop every field in `fields`
	pub fn without(&self, fields: &[String]) -> Row {
		self.fields
			.iter()
			.filter(|(name, _)| !fields.contains(name))
			.map(|(name, value)| (name.clone(), value.clone()))
			.collect()
	}
}

impl<K, V> FromIterator<(K, V)> for Row
where
	K: Into<String>,
	V: Into<FilterValue>,
{
	fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
		Self {
			fields: iter
				.into_iter()
				.map(|(k, v)| (k.into(), v.into()))
				.collect(),
		}
	}
}

impl<K, V, const N: usize> From<[(K, V); N]> for Row
where
	K: Into<String>,
	V: Into<FilterValue>,
{
	fn from(pairs: [(K, V); N]) -> Self {
		pairs.into_iter().collect()
	}
}

impl fmt::Display for Row {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{{")?;
		for (i, (name, value)) in self.fields.iter().enumerate() {
			if i > 0 {
				write!(f, ", ")?;
			}
			write!(f, "{}: {}", name, value)?;
		}
		write!(f, "}}")
	}
}
