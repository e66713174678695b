//! Query sets over a [`MemoryStore`]

use crate::error::MemoryQueryError;
use crate::filter_eval::{compare_rows, evaluate, extra_value, matches, update_value};
use crate::plan::{PlanSource, Projection, QueryPlan, SetOperation};
use crate::row::Row;
use crate::store::MemoryStore;
use async_trait::async_trait;
use reinhardt_delayed_query::criteria::{
	Annotation, ExtraSelect, FilterCondition, FilterValue, Hints, OrderByField, UpdateValues,
};
use reinhardt_delayed_query::{ComponentQuery, DelayedQueryError, Result};

#[derive(Debug, Clone)]
enum Source {
	Table,
	Combined {
		operation: SetOperation,
		operands: Vec<MemoryQuerySet>,
	},
}

/// Lazily evaluated query over the rows of a [`MemoryStore`]
///
/// Evaluation runs in a fixed order: source rows, annotations and extra
/// selects, filters, ordering, projection. A combined query evaluates each
/// operand in full first and compares whole projected rows, as SQL does.
#[derive(Debug, Clone)]
pub struct MemoryQuerySet {
	store: MemoryStore,
	source: Source,
	conditions: Vec<FilterCondition>,
	annotations: Vec<Annotation>,
	aliases: Vec<Annotation>,
	extra: Vec<ExtraSelect>,
	order_by: Vec<OrderByField>,
	standard_ordering: bool,
	projection: Projection,
	select_related: Vec<String>,
	prefetch_related: Vec<String>,
	db: String,
	hints: Hints,
	result_cache: Option<Vec<Row>>,
	empty: bool,
}

impl MemoryQuerySet {
	pub fn new(store: MemoryStore) -> Self {
		let db = store.config().database_alias.clone();
		Self {
			store,
			source: Source::Table,
			conditions: Vec::new(),
			annotations: Vec::new(),
			aliases: Vec::new(),
			extra: Vec::new(),
			order_by: Vec::new(),
			standard_ordering: true,
			projection: Projection::All,
			select_related: Vec::new(),
			prefetch_related: Vec::new(),
			db,
			hints: Hints::new(),
			result_cache: None,
			empty: false,
		}
	}

	pub fn store(&self) -> &MemoryStore {
		&self.store
	}

	pub fn is_combined(&self) -> bool {
		matches!(self.source, Source::Combined { .. })
	}

	pub fn ordering(&self) -> &[OrderByField] {
		&self.order_by
	}

	pub fn standard_ordering(&self) -> bool {
		self.standard_ordering
	}

	pub fn select_related_fields(&self) -> &[String] {
		&self.select_related
	}

	pub fn prefetch_related_fields(&self) -> &[String] {
		&self.prefetch_related
	}

	/// Copy without the result cache, the starting point of every refinement
	fn chain(&self) -> Self {
		let mut clone = self.clone();
		clone.result_cache = None;
		clone
	}

	fn effective_ordering(&self) -> Vec<OrderByField> {
		if self.standard_ordering {
			self.order_by.clone()
		} else {
			self.order_by.iter().map(OrderByField::reversed).collect()
		}
	}

	fn combine(&self) -> Vec<Row> {
		let Source::Combined {
			operation,
			operands,
		} = &self.source
		else {
			return self.store.rows();
		};
		let mut results = operands.iter().map(|operand| operand.compute(true));
		let first = results.next().unwrap_or_default();
		match operation {
			SetOperation::UnionAll => first.into_iter().chain(results.flatten()).collect(),
			SetOperation::Union => distinct(first.into_iter().chain(results.flatten())),
			SetOperation::Intersect => {
				let others: Vec<Vec<Row>> = results.collect();
				distinct(first)
					.into_iter()
					.filter(|row| others.iter().all(|other| other.contains(row)))
					.collect()
			}
			SetOperation::Except => {
				let others: Vec<Vec<Row>> = results.collect();
				distinct(first)
					.into_iter()
					.filter(|row| !others.iter().any(|other| other.contains(row)))
					.collect()
			}
		}
	}

	/// Evaluate without touching the result cache or the execution counter
	fn compute(&self, project: bool) -> Vec<Row> {
		if self.empty {
			return Vec::new();
		}
		let mut rows = self.combine();
		if !self.annotations.is_empty() || !self.aliases.is_empty() || !self.extra.is_empty() {
			for row in rows.iter_mut() {
				for annotation in self.annotations.iter().chain(&self.aliases) {
					let value = evaluate(&annotation.expression, row);
					row.set(annotation.alias.as_str(), value);
				}
				for extra in &self.extra {
					let value = extra_value(&extra.sql, row);
					row.set(extra.alias.as_str(), value);
				}
			}
		}
		rows.retain(|row| self.conditions.iter().all(|c| matches(c, row)));
		let ordering = self.effective_ordering();
		if !ordering.is_empty() {
			rows.sort_by(|a, b| compare_rows(a, b, &ordering));
		}
		if project {
			rows.into_iter().map(|row| self.project(row)).collect()
		} else {
			rows
		}
	}

	fn project(&self, row: Row) -> Row {
		let aliases: Vec<String> = self.aliases.iter().map(|a| a.alias.clone()).collect();
		match &self.projection {
			Projection::All => row.without(&aliases),
			Projection::Values { fields, .. } if fields.is_empty() => row.without(&aliases),
			Projection::Values { fields, .. } => row.project(fields),
			Projection::Only(fields) => {
				let pk = self.store.primary_key().to_string();
				let mut columns = vec![pk.clone()];
				columns.extend(fields.iter().filter(|f| **f != pk).cloned());
				columns.extend(self.annotations.iter().map(|a| a.alias.clone()));
				columns.extend(self.extra.iter().map(|e| e.alias.clone()));
				row.project(&columns)
			}
			Projection::Defer(fields) => {
				let pk = self.store.primary_key();
				let mut hidden: Vec<String> =
					fields.iter().filter(|f| f.as_str() != pk).cloned().collect();
				hidden.extend(aliases);
				row.without(&hidden)
			}
		}
	}

	fn execute(&self) -> Vec<Row> {
		self.store.record_execution();
		tracing::trace!(
			model = self.store.model(),
			combined = self.is_combined(),
			"executing in-memory query"
		);
		self.compute(true)
	}

	fn rows(&self) -> Vec<Row> {
		match &self.result_cache {
			Some(rows) => rows.clone(),
			None => self.execute(),
		}
	}

	/// Primary keys of the table rows a write would touch
	fn target_ids(&self, operation: &'static str) -> Result<Vec<FilterValue>> {
		if self.is_combined() {
			return Err(MemoryQueryError::CombinedWrite { operation }.into());
		}
		self.store.record_execution();
		let pk = self.store.primary_key();
		Ok(self
			.compute(false)
			.iter()
			.map(|row| row.value(pk))
			.collect())
	}

	fn combined_with(&self, operation: SetOperation, others: &[Self]) -> Result<Self> {
		if let Some(other) = others.iter().find(|o| o.model_name() != self.model_name()) {
			return Err(MemoryQueryError::ModelMismatch {
				expected: self.model_name().to_string(),
				found: other.model_name().to_string(),
			}
			.into());
		}
		self.store.record_composition();
		tracing::debug!(
			model = self.model_name(),
			operation = operation.to_sql(),
			operands = others.len() + 1,
			"combining in-memory queries"
		);
		let mut operands = Vec::with_capacity(others.len() + 1);
		operands.push(self.chain());
		operands.extend(others.iter().map(Self::chain));

		let mut combined = Self::new(self.store.clone());
		combined.source = Source::Combined {
			operation,
			operands,
		};
		combined.db = self.db.clone();
		combined.hints = self.hints.clone();
		combined.select_related = self.select_related.clone();
		combined.prefetch_related = self.prefetch_related.clone();
		Ok(combined)
	}
}

fn distinct(rows: impl IntoIterator<Item = Row>) -> Vec<Row> {
	let mut unique: Vec<Row> = Vec::new();
	for row in rows {
		if !unique.contains(&row) {
			unique.push(row);
		}
	}
	unique
}

#[async_trait]
impl ComponentQuery for MemoryQuerySet {
	type Row = Row;
	type PrimaryKey = i64;
	type Plan = QueryPlan;

	fn model_name(&self) -> &str {
		self.store.model()
	}

	fn db(&self) -> &str {
		&self.db
	}

	fn query(&self) -> QueryPlan {
		let source = match &self.source {
			Source::Table => PlanSource::Table(self.store.config().table.clone()),
			Source::Combined {
				operation,
				operands,
			} => PlanSource::Combined {
				operation: *operation,
				operands: operands.iter().map(|o| o.query()).collect(),
			},
		};
		QueryPlan {
			source,
			projection: self.projection.clone(),
			annotations: self.annotations.clone(),
			extra: self.extra.clone(),
			conditions: self.conditions.clone(),
			order_by: self.effective_ordering(),
			select_related: self.select_related.clone(),
			empty: self.empty,
		}
	}

	fn hints(&self) -> &Hints {
		&self.hints
	}

	fn add_hints(&mut self, hints: Hints) {
		self.hints.extend(hints);
	}

	fn result_cache(&self) -> Option<&[Row]> {
		self.result_cache.as_deref()
	}

	fn set_result_cache(&mut self, rows: Vec<Row>) {
		self.result_cache = Some(rows);
	}

	fn primary_key_field(&self) -> &str {
		self.store.primary_key()
	}

	fn primary_key_of(&self, row: &Row) -> Option<i64> {
		row.get(self.store.primary_key()).and_then(FilterValue::as_i64)
	}

	fn without_ordering(&self) -> Self {
		let mut clone = self.chain();
		clone.order_by.clear();
		clone
	}

	fn with_ordering(&self, fields: &[OrderByField]) -> Self {
		let mut clone = self.chain();
		clone.order_by = fields.to_vec();
		clone
	}

	fn reversed_ordering(&self) -> Self {
		let mut clone = self.chain();
		clone.standard_ordering = !clone.standard_ordering;
		clone
	}

	fn all(&self) -> Self {
		self.chain()
	}

	fn filter(&self, condition: &FilterCondition) -> Self {
		let mut clone = self.chain();
		clone.conditions.push(condition.clone());
		clone
	}

	fn exclude(&self, condition: &FilterCondition) -> Self {
		let mut clone = self.chain();
		clone.conditions.push(FilterCondition::not(condition.clone()));
		clone
	}

	fn values(&self, fields: &[&str]) -> Self {
		self.values_list(fields, false)
	}

	fn values_list(&self, fields: &[&str], flat: bool) -> Self {
		let mut clone = self.chain();
		clone.projection = Projection::Values {
			fields: fields.iter().map(|f| f.to_string()).collect(),
			flat,
		};
		clone
	}

	fn annotate(&self, annotations: &[Annotation]) -> Self {
		let mut clone = self.chain();
		clone.annotations.extend(annotations.iter().cloned());
		clone
	}

	fn alias(&self, annotations: &[Annotation]) -> Self {
		let mut clone = self.chain();
		clone.aliases.extend(annotations.iter().cloned());
		clone
	}

	fn select_related(&self, fields: &[&str]) -> Self {
		let mut clone = self.chain();
		clone
			.select_related
			.extend(fields.iter().map(|f| f.to_string()));
		clone
	}

	fn without_select_related(&self) -> Self {
		let mut clone = self.chain();
		clone.select_related.clear();
		clone
	}

	fn prefetch_related(&self, fields: &[&str]) -> Self {
		let mut clone = self.chain();
		clone
			.prefetch_related
			.extend(fields.iter().map(|f| f.to_string()));
		clone
	}

	fn defer(&self, fields: &[&str]) -> Self {
		let mut clone = self.chain();
		clone.projection = Projection::Defer(fields.iter().map(|f| f.to_string()).collect());
		clone
	}

	fn only(&self, fields: &[&str]) -> Self {
		let mut clone = self.chain();
		clone.projection = Projection::Only(fields.iter().map(|f| f.to_string()).collect());
		clone
	}

	fn extra(&self, select: &[ExtraSelect]) -> Self {
		let mut clone = self.chain();
		clone.extra.extend(select.iter().cloned());
		clone
	}

	fn using(&self, alias: &str) -> Self {
		let mut clone = self.chain();
		clone.db = alias.to_string();
		clone
	}

	fn none(&self) -> Self {
		let mut clone = self.chain();
		clone.empty = true;
		clone
	}

	fn union(&self, others: &[Self], all: bool) -> Result<Self> {
		let operation = if all {
			SetOperation::UnionAll
		} else {
			SetOperation::Union
		};
		self.combined_with(operation, others)
	}

	fn intersection(&self, others: &[Self]) -> Result<Self> {
		self.combined_with(SetOperation::Intersect, others)
	}

	fn difference(&self, others: &[Self]) -> Result<Self> {
		self.combined_with(SetOperation::Except, others)
	}

	async fn fetch_all(&self) -> Result<Vec<Row>> {
		Ok(self.rows())
	}

	async fn count(&self) -> Result<usize> {
		match &self.result_cache {
			Some(rows) => Ok(rows.len()),
			None => Ok(self.execute().len()),
		}
	}

	async fn exists(&self) -> Result<bool> {
		match &self.result_cache {
			Some(rows) => Ok(!rows.is_empty()),
			None => Ok(!self.execute().is_empty()),
		}
	}

	async fn first(&self) -> Result<Option<Row>> {
		let qs = if self.order_by.is_empty() {
			self.with_ordering(&[OrderByField::asc(self.primary_key_field())])
		} else {
			self.chain()
		};
		Ok(qs.execute().into_iter().next())
	}

	async fn last(&self) -> Result<Option<Row>> {
		let qs = if self.order_by.is_empty() {
			self.with_ordering(&[OrderByField::desc(self.primary_key_field())])
		} else {
			self.reversed_ordering()
		};
		Ok(qs.execute().into_iter().next())
	}

	async fn earliest(&self, field: &str) -> Result<Row> {
		let mut qs = self.with_ordering(&[OrderByField::asc(field)]);
		qs.standard_ordering = true;
		qs.execute()
			.into_iter()
			.next()
			.ok_or_else(|| DelayedQueryError::DoesNotExist {
				model: self.model_name().to_string(),
			})
	}

	async fn latest(&self, field: &str) -> Result<Row> {
		let mut qs = self.with_ordering(&[OrderByField::desc(field)]);
		qs.standard_ordering = true;
		qs.execute()
			.into_iter()
			.next()
			.ok_or_else(|| DelayedQueryError::DoesNotExist {
				model: self.model_name().to_string(),
			})
	}

	async fn delete(&self) -> Result<usize> {
		let ids = self.target_ids("delete")?;
		Ok(self.store.delete_rows(&ids))
	}

	async fn update(&self, values: &UpdateValues) -> Result<usize> {
		let ids = self.target_ids("update")?;
		Ok(self.store.update_rows(&ids, |row| {
			let assignments: Vec<(String, FilterValue)> = values
				.iter()
				.map(|(field, value)| (field.clone(), update_value(value, row)))
				.collect();
			for (field, value) in assignments {
				row.set(field, value);
			}
		}))
	}

	async fn raw(&self, _sql: &str) -> Result<Vec<Row>> {
		Err(MemoryQueryError::RawUnsupported.into())
	}

	async fn explain(&self) -> Result<String> {
		Ok(format!("EXPLAIN {}", self.query().to_sql()))
	}

	async fn create(&self, row: Row) -> Result<Row> {
		Ok(self.store.insert(row)?)
	}

	async fn bulk_create(&self, rows: Vec<Row>) -> Result<Vec<Row>> {
		Ok(self.store.insert_many(rows)?)
	}

	async fn bulk_update(&self, rows: Vec<Row>, fields: &[&str]) -> Result<usize> {
		let pk = self.store.primary_key();
		let mut updated = 0;
		for source in rows {
			let id = source.value(pk);
			if id.is_null() {
				continue;
			}
			updated += self.store.update_rows(&[id], |row| {
				for field in fields {
					row.set(*field, source.value(field));
				}
			});
		}
		Ok(updated)
	}

	/// Django style representation, truncated after the configured number of rows
	async fn repr(&self) -> Result<String> {
		let limit = self.store.config().repr_limit;
		let rows = self.rows();
		let mut items: Vec<String> = rows.iter().take(limit).map(Row::to_string).collect();
		if rows.len() > limit {
			items.push("...(remaining elements truncated)...".to_string());
		}
		Ok(format!("<QuerySet [{}]>", items.join(", ")))
	}
}
