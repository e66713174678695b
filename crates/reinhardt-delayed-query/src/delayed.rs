//! The delayed query set
//!
//! A [`DelayedQuerySet`] keeps its component queries apart and only performs
//! the set operation when a terminal operation needs it. Refining operations
//! such as `filter()` are pushed down into every component, which keeps them
//! meaningful: filtering a query after a native `UNION` is either rejected or
//! silently ignored by most backends.
//!
//! # Examples
//!
//! ```rust,ignore
//! use reinhardt_delayed_query::{DelayedUnionQuerySet, criteria::Filter};
//!
//! let qs = DelayedUnionQuerySet::new([active_users, staff_users])?;
//!
//! // Equivalent to DelayedUnionQuerySet::new([active_users.filter(..), staff_users.filter(..)])
//! let recent = qs.filter(Filter::gte("id", 100)).order_by(&["-id"]);
//!
//! // Only now is `active.union(staff).order_by(-id)` built and executed
//! let newest = recent.first().await?;
//! ```

use crate::component::ComponentQuery;
use crate::config::DelayedConfig;
use crate::criteria::{
	Annotation, ExtraSelect, Filter, FilterCondition, FilterValue, Hints, OrderByField,
	UpdateValues,
};
use crate::dispatch::{DispatchStrategy, Operation};
use crate::error::{DelayedQueryError, Result};
use crate::operand::Operand;
use futures::stream::BoxStream;
use once_cell::sync::OnceCell;
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

/// The set operation a delayed query set postpones
pub trait SetOperationKind: Sized + Send + Sync + 'static {
	/// Operation specific parameters
	type Params: Clone + fmt::Debug + Default + PartialEq + Send + Sync;

	/// Short name used in logs and error messages
	const NAME: &'static str;

	/// Whether `update()` runs against every component instead of failing
	const UPDATES_COMPONENTS: bool = false;

	/// Turns one constructor argument into component queries
	///
	/// Plain queries are accepted as-is. Kinds that can absorb a nested
	/// composition override this to splice in its components.
	fn expand<Q: ComponentQuery>(operand: Operand<Q>, _params: &Self::Params) -> Result<Vec<Q>> {
		match operand {
			Operand::Query(query) => Ok(vec![query]),
			other => Err(DelayedQueryError::NestedComposition {
				kind: Self::NAME,
				found: other.kind_name(),
			}),
		}
	}

	/// Performs the native set operation over the components, in order
	fn compose<Q: ComponentQuery>(components: &[Q], params: &Self::Params) -> Result<Q>;

	/// Parameters of the `distinct()` clone, or `None` if unsupported
	fn distinct(_params: &Self::Params) -> Option<Self::Params> {
		None
	}

	/// Dispatch strategy of `op` for this kind
	fn strategy(op: Operation) -> Option<DispatchStrategy> {
		op.base_strategy()
	}
}

/// Component queries combined by a postponed set operation
pub struct DelayedQuerySet<Q: ComponentQuery, K: SetOperationKind> {
	querysets: Vec<Q>,
	params: K::Params,
	order_by: Vec<OrderByField>,
	standard_ordering: bool,
	config: Arc<DelayedConfig>,
	applied: OnceCell<Q>,
	kind: PhantomData<fn() -> K>,
}

impl<Q: ComponentQuery, K: SetOperationKind> DelayedQuerySet<Q, K> {
	/// Combine `querysets` with default parameters
	pub fn new<I>(querysets: I) -> Result<Self>
	where
		I: IntoIterator<Item = Q>,
	{
		Self::with_params(querysets, K::Params::default())
	}

	/// Combine `querysets` with explicit parameters
	///
	/// Fails when `querysets` is empty or mixes models.
	pub fn with_params<I>(querysets: I, params: K::Params) -> Result<Self>
	where
		I: IntoIterator<Item = Q>,
	{
		Self::from_operands(querysets.into_iter().map(Operand::Query), params)
	}

	/// Combine plain queries and nested delayed query sets
	///
	/// Nested delayed query sets are flattened when the kind allows it;
	/// otherwise construction fails.
	pub fn from_operands<I>(operands: I, params: K::Params) -> Result<Self>
	where
		I: IntoIterator<Item = Operand<Q>>,
	{
		let mut querysets = Vec::new();
		for operand in operands {
			querysets.extend(K::expand(operand, &params)?);
		}

		let first = querysets
			.first()
			.ok_or(DelayedQueryError::EmptyComponents { kind: K::NAME })?;
		if let Some(other) = querysets
			.iter()
			.find(|qs| qs.model_name() != first.model_name())
		{
			return Err(DelayedQueryError::ModelMismatch {
				expected: first.model_name().to_string(),
				found: other.model_name().to_string(),
			});
		}

		Ok(Self::assemble(
			querysets,
			params,
			Arc::new(DelayedConfig::default()),
		))
	}

	fn assemble(querysets: Vec<Q>, params: K::Params, config: Arc<DelayedConfig>) -> Self {
		Self {
			querysets: querysets.iter().map(|qs| qs.without_ordering()).collect(),
			params,
			order_by: Vec::new(),
			standard_ordering: true,
			config,
			applied: OnceCell::new(),
			kind: PhantomData,
		}
	}

	/// New instance over `querysets` carrying this instance's parameters and ordering
	///
	/// The composition cache is never carried over.
	fn derive(&self, querysets: Vec<Q>) -> Self {
		self.derive_with_params(querysets, self.params.clone())
	}

	fn derive_with_params(&self, querysets: Vec<Q>, params: K::Params) -> Self {
		let mut clone = Self::assemble(querysets, params, Arc::clone(&self.config));
		clone.order_by = self.order_by.clone();
		clone.standard_ordering = self.standard_ordering;
		clone
	}

	/// Replace the configuration; every instance derived from this one shares it
	pub fn with_config(mut self, config: Arc<DelayedConfig>) -> Self {
		self.config = config;
		self
	}

	pub fn config(&self) -> &DelayedConfig {
		&self.config
	}

	pub fn components(&self) -> &[Q] {
		&self.querysets
	}

	pub fn into_components(self) -> Vec<Q> {
		self.querysets
	}

	pub fn params(&self) -> &K::Params {
		&self.params
	}

	/// Global ordering applied after composition
	pub fn ordering(&self) -> &[OrderByField] {
		&self.order_by
	}

	pub fn standard_ordering(&self) -> bool {
		self.standard_ordering
	}

	pub fn is_applied(&self) -> bool {
		self.applied.get().is_some()
	}

	/// Model of the first component
	pub fn model(&self) -> &str {
		self.dispatch(Operation::Model);
		self.model_name()
	}

	fn model_name(&self) -> &str {
		self.first_query().model_name()
	}

	fn first_query(&self) -> &Q {
		// Construction guarantees at least one component
		&self.querysets[0]
	}

	/// Runs the set operation and the global ordering, once per instance
	///
	/// Every later call returns the same composed query.
	pub fn apply(&self) -> Result<&Q> {
		self.applied.get_or_try_init(|| self.compose_ordered())
	}

	fn compose_ordered(&self) -> Result<Q> {
		tracing::debug!(
			kind = K::NAME,
			components = self.querysets.len(),
			ordering = ?self.order_by,
			standard_ordering = self.standard_ordering,
			"applying delayed set operation"
		);
		let composed = K::compose(&self.querysets, &self.params)?.with_ordering(&self.order_by);
		if self.standard_ordering {
			Ok(composed)
		} else {
			Ok(composed.reversed_ordering())
		}
	}

	fn dispatch(&self, op: Operation) {
		tracing::trace!(
			operation = op.name(),
			strategy = K::strategy(op).map(|s| s.name()).unwrap_or("custom"),
			kind = K::NAME,
			"dispatching delayed query set operation"
		);
	}

	fn post_apply(&self, op: Operation) -> Result<&Q> {
		self.dispatch(op);
		self.apply()
	}

	fn post_apply_mut<R>(&mut self, op: Operation, f: impl FnOnce(&mut Q) -> R) -> Result<R> {
		self.dispatch(op);
		let mut applied = match self.applied.take() {
			Some(applied) => applied,
			None => self.compose_ordered()?,
		};
		let result = f(&mut applied);
		self.applied = OnceCell::with_value(applied);
		Ok(result)
	}

	fn passthrough(&self, op: Operation, f: impl Fn(&Q) -> Q) -> Self {
		self.dispatch(op);
		self.derive(self.querysets.iter().map(f).collect())
	}

	fn first_passthrough(&self, op: Operation, f: impl FnOnce(&Q) -> Q) -> Self {
		self.dispatch(op);
		let mut querysets = Vec::with_capacity(self.querysets.len());
		querysets.push(f(self.first_query()));
		querysets.extend(self.querysets[1..].iter().cloned());
		self.derive(querysets)
	}

	fn first_only(&self, op: Operation) -> &Q {
		self.dispatch(op);
		self.first_query()
	}

	fn unsupported<T>(&self, op: Operation) -> Result<T> {
		self.dispatch(op);
		Err(DelayedQueryError::NotSupported {
			operation: op.name(),
			kind: K::NAME,
		})
	}

	// Ordering

	/// Replace the global ordering; an empty slice clears it
	///
	/// This orders the composed result, not the individual components.
	pub fn order_by(&self, fields: &[&str]) -> Self {
		self.order_by_fields(OrderByField::parse_all(fields))
	}

	pub fn order_by_fields(&self, fields: Vec<OrderByField>) -> Self {
		self.dispatch(Operation::OrderBy);
		let mut clone = self.clone();
		clone.order_by = fields;
		clone
	}

	/// Flip the direction of the global ordering
	pub fn reverse(&self) -> Self {
		self.dispatch(Operation::Reverse);
		let mut clone = self.clone();
		clone.standard_ordering = !clone.standard_ordering;
		clone
	}

	/// Whether a global ordering is set; component orderings never count
	pub fn ordered(&self) -> bool {
		self.dispatch(Operation::Ordered);
		!self.order_by.is_empty()
	}

	// Lookups

	/// Fetch exactly one row matching `condition`
	///
	/// The condition is pushed into every component before composing rather
	/// than applied to the composed query.
	pub async fn get(&self, condition: impl Into<FilterCondition>) -> Result<Q::Row> {
		self.dispatch(Operation::Get);
		let clone = self.filter(condition);
		let mut rows = clone.fetch_all().await?;
		match rows.len() {
			1 => Ok(rows.remove(0)),
			0 => Err(DelayedQueryError::DoesNotExist {
				model: self.model_name().to_string(),
			}),
			count => {
				tracing::warn!(model = self.model_name(), count, "get() matched multiple rows");
				Err(DelayedQueryError::MultipleObjectsReturned {
					model: self.model_name().to_string(),
					count,
				})
			}
		}
	}

	/// Map primary keys to rows
	///
	/// With `None` the whole query set is evaluated. An empty id list returns
	/// an empty map without touching the components. A fetched row without a
	/// primary key, such as one projected away by `values()`, fails with
	/// [`DelayedQueryError::MissingPrimaryKey`].
	pub async fn in_bulk(
		&self,
		ids: Option<&[Q::PrimaryKey]>,
	) -> Result<HashMap<Q::PrimaryKey, Q::Row>> {
		self.dispatch(Operation::InBulk);
		let qs = match ids {
			Some([]) => return Ok(HashMap::new()),
			Some(ids) => self
				.filter(Filter::in_list(
					self.first_query().primary_key_field(),
					ids.iter().cloned(),
				))
				.order_by(&[]),
			None => self.clone(),
		};
		let rows = qs.fetch_all().await?;
		let first = qs.first_query();
		rows.into_iter()
			.map(|row| match first.primary_key_of(&row) {
				Some(pk) => Ok((pk, row)),
				None => Err(DelayedQueryError::MissingPrimaryKey {
					model: self.model_name().to_string(),
					field: first.primary_key_field().to_string(),
				}),
			})
			.collect()
	}

	// Evaluated after composition

	pub async fn repr(&self) -> Result<String> {
		self.post_apply(Operation::Repr)?.repr().await
	}

	pub async fn len(&self) -> Result<usize> {
		self.post_apply(Operation::Len)?.len().await
	}

	pub async fn fetch_all(&self) -> Result<Vec<Q::Row>> {
		self.post_apply(Operation::FetchAll)?.fetch_all().await
	}

	pub async fn is_empty(&self) -> Result<bool> {
		self.post_apply(Operation::IsEmpty)?.is_empty().await
	}

	pub async fn get_item(&self, index: usize) -> Result<Option<Q::Row>> {
		self.post_apply(Operation::GetItem)?.get_item(index).await
	}

	pub async fn contains(&self, row: &Q::Row) -> Result<bool> {
		self.post_apply(Operation::Contains)?.contains(row).await
	}

	pub async fn iterator(&self) -> Result<BoxStream<'static, Q::Row>> {
		self.post_apply(Operation::Iterator)?.iterator().await
	}

	/// Number of rows in the composed result
	///
	/// A populated result cache on the composed query answers directly.
	/// Otherwise `select_related()` joins are dropped before counting.
	pub async fn count(&self) -> Result<usize> {
		let applied = self.post_apply(Operation::Count)?;
		if self.config.count_uses_result_cache {
			if let Some(rows) = applied.result_cache() {
				tracing::debug!(kind = K::NAME, count = rows.len(), "count() served from result cache");
				return Ok(rows.len());
			}
		}
		if self.config.strip_select_related_on_count {
			applied.without_select_related().count().await
		} else {
			applied.count().await
		}
	}

	pub async fn earliest(&self, field: &str) -> Result<Q::Row> {
		self.post_apply(Operation::Earliest)?.earliest(field).await
	}

	pub async fn latest(&self, field: &str) -> Result<Q::Row> {
		self.post_apply(Operation::Latest)?.latest(field).await
	}

	pub async fn first(&self) -> Result<Option<Q::Row>> {
		self.post_apply(Operation::First)?.first().await
	}

	pub async fn last(&self) -> Result<Option<Q::Row>> {
		self.post_apply(Operation::Last)?.last().await
	}

	pub async fn delete(&self) -> Result<usize> {
		self.post_apply(Operation::Delete)?.delete().await
	}

	pub async fn exists(&self) -> Result<bool> {
		self.post_apply(Operation::Exists)?.exists().await
	}

	pub async fn raw(&self, sql: &str) -> Result<Vec<Q::Row>> {
		self.post_apply(Operation::Raw)?.raw(sql).await
	}

	pub async fn explain(&self) -> Result<String> {
		self.post_apply(Operation::Explain)?.explain().await
	}

	// Properties of the composed query

	pub fn db(&self) -> Result<&str> {
		Ok(self.post_apply(Operation::Db)?.db())
	}

	pub fn hints(&self) -> Result<&Hints> {
		Ok(self.post_apply(Operation::Hints)?.hints())
	}

	pub fn add_hints(&mut self, hints: Hints) -> Result<()> {
		self.post_apply_mut(Operation::AddHints, |applied| applied.add_hints(hints))
	}

	/// Plan of the composed query
	pub fn query(&self) -> Result<Q::Plan> {
		Ok(self.post_apply(Operation::Query)?.query())
	}

	pub fn result_cache(&self) -> Result<Option<&[Q::Row]>> {
		Ok(self.post_apply(Operation::ResultCache)?.result_cache())
	}

	pub fn set_result_cache(&mut self, rows: Vec<Q::Row>) -> Result<()> {
		self.post_apply_mut(Operation::SetResultCache, |applied| {
			applied.set_result_cache(rows)
		})
	}

	// Distributed to every component

	pub fn all(&self) -> Self {
		self.passthrough(Operation::All, |qs| qs.all())
	}

	pub fn filter(&self, condition: impl Into<FilterCondition>) -> Self {
		let condition = condition.into();
		self.passthrough(Operation::Filter, |qs| qs.filter(&condition))
	}

	pub fn exclude(&self, condition: impl Into<FilterCondition>) -> Self {
		let condition = condition.into();
		self.passthrough(Operation::Exclude, |qs| qs.exclude(&condition))
	}

	pub fn complex_filter(&self, condition: impl Into<FilterCondition>) -> Self {
		let condition = condition.into();
		self.passthrough(Operation::ComplexFilter, |qs| {
			qs.complex_filter(&condition)
		})
	}

	pub fn values(&self, fields: &[&str]) -> Self {
		self.passthrough(Operation::Values, |qs| qs.values(fields))
	}

	pub fn values_list(&self, fields: &[&str], flat: bool) -> Self {
		self.passthrough(Operation::ValuesList, |qs| qs.values_list(fields, flat))
	}

	pub fn annotate(&self, annotations: &[Annotation]) -> Self {
		self.passthrough(Operation::Annotate, |qs| qs.annotate(annotations))
	}

	pub fn alias(&self, annotations: &[Annotation]) -> Self {
		self.passthrough(Operation::Alias, |qs| qs.alias(annotations))
	}

	pub fn select_related(&self, fields: &[&str]) -> Self {
		self.passthrough(Operation::SelectRelated, |qs| qs.select_related(fields))
	}

	pub fn defer(&self, fields: &[&str]) -> Self {
		self.passthrough(Operation::Defer, |qs| qs.defer(fields))
	}

	pub fn only(&self, fields: &[&str]) -> Self {
		self.passthrough(Operation::Only, |qs| qs.only(fields))
	}

	pub fn extra(&self, select: &[ExtraSelect]) -> Self {
		self.passthrough(Operation::Extra, |qs| qs.extra(select))
	}

	pub fn using(&self, alias: &str) -> Self {
		self.passthrough(Operation::Using, |qs| qs.using(alias))
	}

	pub fn none(&self) -> Self {
		self.passthrough(Operation::None, |qs| qs.none())
	}

	// Applied to the first component only; after composition only the
	// first component's prefetches survive anyway

	pub fn prefetch_related(&self, fields: &[&str]) -> Self {
		self.first_passthrough(Operation::PrefetchRelated, |qs| {
			qs.prefetch_related(fields)
		})
	}

	pub fn as_manager(&self) -> Self {
		self.first_passthrough(Operation::AsManager, |qs| qs.as_manager())
	}

	// Writes go to the first component

	pub async fn create(&self, row: Q::Row) -> Result<Q::Row> {
		self.first_only(Operation::Create).create(row).await
	}

	pub async fn bulk_create(&self, rows: Vec<Q::Row>) -> Result<Vec<Q::Row>> {
		self.first_only(Operation::BulkCreate).bulk_create(rows).await
	}

	pub async fn bulk_update(&self, rows: Vec<Q::Row>, fields: &[&str]) -> Result<usize> {
		self.first_only(Operation::BulkUpdate)
			.bulk_update(rows, fields)
			.await
	}

	// Kind specific

	/// Clone selecting only distinct rows, if the kind defines it
	pub fn distinct(&self) -> Result<Self> {
		match K::distinct(&self.params) {
			Some(params) => {
				self.dispatch(Operation::Distinct);
				Ok(self.derive_with_params(
					self.querysets.iter().cloned().collect(),
					params,
				))
			}
			None => self.unsupported(Operation::Distinct),
		}
	}

	/// Mass update, only for kinds that update per component
	///
	/// Returns the summed row counts of the components. Rows matched by more
	/// than one component are counted once per component.
	pub async fn update(&self, values: &UpdateValues) -> Result<usize> {
		if !K::UPDATES_COMPONENTS {
			return self.unsupported(Operation::Update);
		}
		self.dispatch(Operation::Update);
		let mut total = 0;
		for qs in &self.querysets {
			total += qs.update(values).await?;
		}
		Ok(total)
	}

	// Unsupported after composition

	pub fn aggregate(&self, _aggregates: &[Annotation]) -> Result<HashMap<String, FilterValue>> {
		self.unsupported(Operation::Aggregate)
	}

	pub fn union(&self, _other: &Self) -> Result<Self> {
		self.unsupported(Operation::Union)
	}

	pub fn intersection(&self, _other: &Self) -> Result<Self> {
		self.unsupported(Operation::Intersection)
	}

	pub fn difference(&self, _other: &Self) -> Result<Self> {
		self.unsupported(Operation::Difference)
	}

	pub fn select_for_update(&self) -> Result<Self> {
		self.unsupported(Operation::SelectForUpdate)
	}

	pub fn get_or_create(
		&self,
		_condition: impl Into<FilterCondition>,
		_defaults: Q::Row,
	) -> Result<(Q::Row, bool)> {
		self.unsupported(Operation::GetOrCreate)
	}

	pub fn update_or_create(
		&self,
		_condition: impl Into<FilterCondition>,
		_defaults: &UpdateValues,
	) -> Result<(Q::Row, bool)> {
		self.unsupported(Operation::UpdateOrCreate)
	}

	/// Truncated dates depend on per-row annotations lost by composition
	pub fn dates(&self, _field: &str, _kind: &str) -> Result<Vec<FilterValue>> {
		self.unsupported(Operation::Dates)
	}

	pub fn datetimes(&self, _field: &str, _kind: &str) -> Result<Vec<FilterValue>> {
		self.unsupported(Operation::Datetimes)
	}
}

impl<Q: ComponentQuery, K: SetOperationKind> Clone for DelayedQuerySet<Q, K> {
	fn clone(&self) -> Self {
		self.derive(self.querysets.clone())
	}
}

impl<Q: ComponentQuery, K: SetOperationKind> fmt::Debug for DelayedQuerySet<Q, K> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("DelayedQuerySet")
			.field("kind", &K::NAME)
			.field("querysets", &self.querysets)
			.field("params", &self.params)
			.field("order_by", &self.order_by)
			.field("standard_ordering", &self.standard_ordering)
			.field("applied", &self.applied.get().is_some())
			.finish()
	}
}
