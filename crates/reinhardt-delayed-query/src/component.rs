//! The component query capability
//!
//! A delayed query set never talks to a data store itself. Everything it
//! needs is expressed by [`ComponentQuery`]: a chainable, cloneable query over
//! rows of a single model that can perform native set operations.

use crate::criteria::{
	Annotation, ExtraSelect, FilterCondition, Hints, OrderByField, UpdateValues,
};
use crate::error::Result;
use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt};
use std::fmt::Debug;
use std::hash::Hash;

/// A queryable set of rows of one model
///
/// Builder methods take `&self` and return a new query, so that a delayed
/// query set can distribute the same call to each of its components. Native
/// set operations return `Result` because a backend may refuse to combine
/// some queries (for example when their projections differ).
#[async_trait]
pub trait ComponentQuery: Clone + Debug + Send + Sync + 'static {
	type Row: Clone + Debug + PartialEq + Send + Sync + 'static;
	type PrimaryKey: Clone + Debug + Eq + Hash + Send + Sync + Into<crate::criteria::FilterValue>;
	/// Introspectable query plan
	type Plan: Clone + Debug + Send + Sync;

	/// Name of the model the rows belong to
	fn model_name(&self) -> &str;

	/// Database alias the query runs against
	fn db(&self) -> &str;

	fn query(&self) -> Self::Plan;

	fn hints(&self) -> &Hints;

	fn add_hints(&mut self, hints: Hints);

	fn result_cache(&self) -> Option<&[Self::Row]>;

	fn set_result_cache(&mut self, rows: Vec<Self::Row>);

	/// Name of the primary key field, used for bulk lookups
	fn primary_key_field(&self) -> &str;

	fn primary_key_of(&self, row: &Self::Row) -> Option<Self::PrimaryKey>;

	// Ordering

	fn without_ordering(&self) -> Self;

	fn with_ordering(&self, fields: &[OrderByField]) -> Self;

	/// Flips the standard ordering flag of the query
	fn reversed_ordering(&self) -> Self;

	// Refinement

	fn all(&self) -> Self {
		self.clone()
	}

	fn filter(&self, condition: &FilterCondition) -> Self;

	fn exclude(&self, condition: &FilterCondition) -> Self;

	fn complex_filter(&self, condition: &FilterCondition) -> Self {
		self.filter(condition)
	}

	fn values(&self, fields: &[&str]) -> Self;

	fn values_list(&self, fields: &[&str], flat: bool) -> Self;

	fn annotate(&self, annotations: &[Annotation]) -> Self;

	fn alias(&self, annotations: &[Annotation]) -> Self;

	fn select_related(&self, fields: &[&str]) -> Self;

	/// Drops any `select_related()` joins
	fn without_select_related(&self) -> Self;

	fn prefetch_related(&self, fields: &[&str]) -> Self;

	fn defer(&self, fields: &[&str]) -> Self;

	fn only(&self, fields: &[&str]) -> Self;

	fn extra(&self, select: &[ExtraSelect]) -> Self;

	fn using(&self, alias: &str) -> Self;

	/// Returns a query that always evaluates to no rows
	fn none(&self) -> Self;

	/// Marks the query as the default query of a manager
	fn as_manager(&self) -> Self {
		self.clone()
	}

	// Native set operations

	fn union(&self, others: &[Self], all: bool) -> Result<Self>;

	fn intersection(&self, others: &[Self]) -> Result<Self>;

	fn difference(&self, others: &[Self]) -> Result<Self>;

	// Terminal operations

	async fn fetch_all(&self) -> Result<Vec<Self::Row>>;

	async fn count(&self) -> Result<usize>;

	async fn exists(&self) -> Result<bool>;

	async fn first(&self) -> Result<Option<Self::Row>>;

	async fn last(&self) -> Result<Option<Self::Row>>;

	async fn earliest(&self, field: &str) -> Result<Self::Row>;

	async fn latest(&self, field: &str) -> Result<Self::Row>;

	async fn delete(&self) -> Result<usize>;

	async fn update(&self, values: &UpdateValues) -> Result<usize>;

	async fn raw(&self, sql: &str) -> Result<Vec<Self::Row>>;

	async fn explain(&self) -> Result<String>;

	async fn create(&self, row: Self::Row) -> Result<Self::Row>;

	async fn bulk_create(&self, rows: Vec<Self::Row>) -> Result<Vec<Self::Row>>;

	async fn bulk_update(&self, rows: Vec<Self::Row>, fields: &[&str]) -> Result<usize>;

	async fn len(&self) -> Result<usize> {
		Ok(self.fetch_all().await?.len())
	}

	async fn is_empty(&self) -> Result<bool> {
		Ok(self.fetch_all().await?.is_empty())
	}

	async fn get_item(&self, index: usize) -> Result<Option<Self::Row>> {
		Ok(self.fetch_all().await?.into_iter().nth(index))
	}

	async fn contains(&self, row: &Self::Row) -> Result<bool> {
		Ok(self.fetch_all().await?.iter().any(|r| r == row))
	}

	async fn repr(&self) -> Result<String> {
		Ok(format!("<QuerySet {:?}>", self.fetch_all().await?))
	}

	/// Streams the rows without keeping them in the result cache
	async fn iterator(&self) -> Result<BoxStream<'static, Self::Row>> {
		let rows = self.fetch_all().await?;
		Ok(stream::iter(rows).boxed())
	}
}
