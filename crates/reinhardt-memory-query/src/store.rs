//! Shared in-memory table

use crate::config::MemoryConfig;
use crate::error::MemoryQueryError;
use crate::queryset::MemoryQuerySet;
use crate::row::Row;
use parking_lot::RwLock;
use reinhardt_delayed_query::criteria::FilterValue;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Debug, Default)]
struct Table {
	rows: Vec<Row>,
	// None once the sequence has passed i64::MAX
	next_id: Option<i64>,
}

impl Table {
	fn holds_key(&self, pk_field: &str, key: &FilterValue) -> bool {
		self.rows.iter().any(|row| row.value(pk_field) == *key)
	}
}

/// Counters of work done against a store
#[derive(Debug, Default)]
struct Stats {
	compositions: AtomicUsize,
	executions: AtomicUsize,
}

/// A table of rows shared by every query set created from it
///
/// Cloning the store is cheap and yields a handle to the same rows.
#[derive(Debug, Clone)]
pub struct MemoryStore {
	config: Arc<MemoryConfig>,
	table: Arc<RwLock<Table>>,
	stats: Arc<Stats>,
}

impl MemoryStore {
	/// Create an empty store
	///
	/// # Examples
	///
	/// ```rust
	/// use reinhardt_memory_query::{MemoryConfig, MemoryStore, Row};
	///
	/// let store = MemoryStore::new(MemoryConfig::new("pets_dog", "Dog")).unwrap();
	/// let rex = store.insert(Row::new().with("name", "Rex")).unwrap();
	/// assert_eq!(rex.value("id").as_i64(), Some(1));
	/// assert_eq!(store.len(), 1);
	/// ```
	pub fn new(config: MemoryConfig) -> Result<Self, MemoryQueryError> {
		config.validate().map_err(MemoryQueryError::InvalidConfig)?;
		Ok(Self {
			config: Arc::new(config),
			table: Arc::new(RwLock::new(Table {
				rows: Vec::new(),
				next_id: Some(1),
			})),
			stats: Arc::new(Stats::default()),
		})
	}

	pub fn config(&self) -> &MemoryConfig {
		&self.config
	}

	pub fn model(&self) -> &str {
		&self.config.model
	}

	pub fn primary_key(&self) -> &str {
		&self.config.primary_key
	}

	/// Query set over every row of the store
	pub fn all(&self) -> MemoryQuerySet {
		MemoryQuerySet::new(self.clone())
	}

	/// Insert a row, assigning the next primary key if it has none
	///
	/// An explicit integer primary key moves the sequence past it. A key that
	/// is already taken fails with [`MemoryQueryError::DuplicatePrimaryKey`];
	/// once the sequence has passed `i64::MAX`, rows without a key fail with
	/// [`MemoryQueryError::KeySequenceExhausted`].
	pub fn insert(&self, mut row: Row) -> Result<Row, MemoryQueryError> {
		let pk_field = self.primary_key().to_string();
		let mut table = self.table.write();
		match row.value(&pk_field) {
			FilterValue::Null => {
				let id = table
					.next_id
					.ok_or_else(|| MemoryQueryError::KeySequenceExhausted {
						model: self.model().to_string(),
					})?;
				table.next_id = id.checked_add(1);
				// bulk_update may have written this key by hand
				if table.holds_key(&pk_field, &FilterValue::Integer(id)) {
					return Err(MemoryQueryError::DuplicatePrimaryKey {
						model: self.model().to_string(),
						key: id.to_string(),
					});
				}
				row.set(pk_field.as_str(), id);
			}
			key => {
				if table.holds_key(&pk_field, &key) {
					return Err(MemoryQueryError::DuplicatePrimaryKey {
						model: self.model().to_string(),
						key: key.to_string(),
					});
				}
				if let FilterValue::Integer(id) = key {
					table.next_id = match (table.next_id, id.checked_add(1)) {
						(Some(next), Some(after)) => Some(next.max(after)),
						_ => None,
					};
				}
			}
		}
		tracing::debug!(model = self.model(), row = %row, "inserted row");
		table.rows.push(row.clone());
		Ok(row)
	}

	/// Insert every row in order, stopping at the first failure
	///
	/// Rows inserted before the failing one are kept.
	pub fn insert_many<I>(&self, rows: I) -> Result<Vec<Row>, MemoryQueryError>
	where
		I: IntoIterator<Item = Row>,
	{
		rows.into_iter().map(|row| self.insert(row)).collect()
	}

	/// Snapshot of every row in insertion order
	pub fn rows(&self) -> Vec<Row> {
		self.table.read().rows.clone()
	}

	pub fn len(&self) -> usize {
		self.table.read().rows.len()
	}

	pub fn is_empty(&self) -> bool {
		self.table.read().rows.is_empty()
	}

	/// Apply `f` to every row whose primary key is in `ids`
	///
	/// Returns the number of rows touched.
	pub(crate) fn update_rows(&self, ids: &[FilterValue], mut f: impl FnMut(&mut Row)) -> usize {
		let pk_field = self.primary_key().to_string();
		let mut table = self.table.write();
		let mut updated = 0;
		for row in table.rows.iter_mut() {
			if ids.contains(&row.value(&pk_field)) {
				f(row);
				updated += 1;
			}
		}
		tracing::debug!(model = self.model(), updated, "updated rows");
		updated
	}

	pub(crate) fn delete_rows(&self, ids: &[FilterValue]) -> usize {
		let pk_field = self.primary_key().to_string();
		let mut table = self.table.write();
		let before = table.rows.len();
		table.rows.retain(|row| !ids.contains(&row.value(&pk_field)));
		let deleted = before - table.rows.len();
		tracing::debug!(model = self.model(), deleted, "deleted rows");
		deleted
	}

	pub(crate) fn record_composition(&self) {
		self.stats.compositions.fetch_add(1, Ordering::SeqCst);
	}

	pub(crate) fn record_execution(&self) {
		self.stats.executions.fetch_add(1, Ordering::SeqCst);
	}

	/// Number of set operations built against this store
	pub fn compositions(&self) -> usize {
		self.stats.compositions.load(Ordering::SeqCst)
	}

	/// Number of queries executed against this store
	pub fn executions(&self) -> usize {
		self.stats.executions.load(Ordering::SeqCst)
	}
}
