//! Operation dispatch table
//!
//! Every public operation of a delayed query set is fulfilled by one of a
//! handful of [`DispatchStrategy`] rules. The mapping lives in
//! [`Operation::base_strategy`]; a composition kind may override individual
//! entries through [`SetOperationKind::strategy`](crate::delayed::SetOperationKind::strategy).
//!
//! | Strategy | Behaviour |
//! |---|---|
//! | `PostApply` | compose, then call the operation on the composed query |
//! | `PostApplyProperty` | compose, then read or write a property of the composed query |
//! | `Passthrough` | call the operation on every component, wrap the results again |
//! | `FirstPassthrough` | call the operation on the first component only, keep the rest |
//! | `FirstOnly` | call the operation on the first component and return its result |
//! | `Unsupported` | always fail |

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DispatchStrategy {
	PostApply,
	PostApplyProperty,
	Passthrough,
	FirstPassthrough,
	FirstOnly,
	Unsupported,
}

impl DispatchStrategy {
	pub fn name(&self) -> &'static str {
		match self {
			DispatchStrategy::PostApply => "post_apply",
			DispatchStrategy::PostApplyProperty => "post_apply_property",
			DispatchStrategy::Passthrough => "passthrough",
			DispatchStrategy::FirstPassthrough => "first_passthrough",
			DispatchStrategy::FirstOnly => "first_only",
			DispatchStrategy::Unsupported => "unsupported",
		}
	}
}

impl fmt::Display for DispatchStrategy {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.name())
	}
}

/// Every operation exposed by a delayed query set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
	// Evaluate the composition, then delegate
	Repr,
	Len,
	FetchAll,
	IsEmpty,
	GetItem,
	Contains,
	Iterator,
	Count,
	Earliest,
	Latest,
	First,
	Last,
	Delete,
	Exists,
	Raw,
	Explain,

	// Evaluate the composition, then access a property
	Db,
	Hints,
	AddHints,
	Query,
	ResultCache,
	SetResultCache,

	// Distributed to every component
	All,
	Filter,
	Exclude,
	Values,
	ValuesList,
	Annotate,
	Alias,
	SelectRelated,
	Defer,
	Only,
	Extra,
	Using,
	ComplexFilter,
	None,

	// Applied to the first component, others kept
	PrefetchRelated,
	AsManager,

	// Run against the first component only
	Create,
	BulkCreate,
	BulkUpdate,

	// No meaning after composition
	Distinct,
	Aggregate,
	Union,
	Intersection,
	Difference,
	Update,
	SelectForUpdate,
	GetOrCreate,
	UpdateOrCreate,
	Dates,
	Datetimes,

	// Implemented by hand on the delayed query set
	Get,
	OrderBy,
	Reverse,
	Ordered,
	InBulk,
	Model,
}

impl Operation {
	pub const ALL: &'static [Operation] = &[
		Operation::Repr,
		Operation::Len,
		Operation::FetchAll,
		Operation::IsEmpty,
		Operation::GetItem,
		Operation::Contains,
		Operation::Iterator,
		Operation::Count,
		Operation::Earliest,
		Operation::Latest,
		Operation::First,
		Operation::Last,
		Operation::Delete,
		Operation::Exists,
		Operation::Raw,
		Operation::Explain,
		Operation::Db,
		Operation::Hints,
		Operation::AddHints,
		Operation::Query,
		Operation::ResultCache,
		Operation::SetResultCache,
		Operation::All,
		Operation::Filter,
		Operation::Exclude,
		Operation::Values,
		Operation::ValuesList,
		Operation::Annotate,
		Operation::Alias,
		Operation::SelectRelated,
		Operation::Defer,
		Operation::Only,
		Operation::Extra,
		Operation::Using,
		Operation::ComplexFilter,
		Operation::None,
		Operation::PrefetchRelated,
		Operation::AsManager,
		Operation::Create,
		Operation::BulkCreate,
		Operation::BulkUpdate,
		Operation::Distinct,
		Operation::Aggregate,
		Operation::Union,
		Operation::Intersection,
		Operation::Difference,
		Operation::Update,
		Operation::SelectForUpdate,
		Operation::GetOrCreate,
		Operation::UpdateOrCreate,
		Operation::Dates,
		Operation::Datetimes,
		Operation::Get,
		Operation::OrderBy,
		Operation::Reverse,
		Operation::Ordered,
		Operation::InBulk,
		Operation::Model,
	];

	/// Method name of the operation
	pub fn name(&self) -> &'static str {
		match self {
			Operation::Repr => "repr",
			Operation::Len => "len",
			Operation::FetchAll => "fetch_all",
			Operation::IsEmpty => "is_empty",
			Operation::GetItem => "get_item",
			Operation::Contains => "contains",
			Operation::Iterator => "iterator",
			Operation::Count => "count",
			Operation::Earliest => "earliest",
			Operation::Latest => "latest",
			Operation::First => "first",
			Operation::Last => "last",
			Operation::Delete => "delete",
			Operation::Exists => "exists",
			Operation::Raw => "raw",
			Operation::Explain => "explain",
			Operation::Db => "db",
			Operation::Hints => "hints",
			Operation::AddHints => "add_hints",
			Operation::Query => "query",
			Operation::ResultCache => "result_cache",
			Operation::SetResultCache => "set_result_cache",
			Operation::All => "all",
			Operation::Filter => "filter",
			Operation::Exclude => "exclude",
			Operation::Values => "values",
			Operation::ValuesList => "values_list",
			Operation::Annotate => "annotate",
			Operation::Alias => "alias",
			Operation::SelectRelated => "select_related",
			Operation::Defer => "defer",
			Operation::Only => "only",
			Operation::Extra => "extra",
			Operation::Using => "using",
			Operation::ComplexFilter => "complex_filter",
			Operation::None => "none",
			Operation::PrefetchRelated => "prefetch_related",
			Operation::AsManager => "as_manager",
			Operation::Create => "create",
			Operation::BulkCreate => "bulk_create",
			Operation::BulkUpdate => "bulk_update",
			Operation::Distinct => "distinct",
			Operation::Aggregate => "aggregate",
			Operation::Union => "union",
			Operation::Intersection => "intersection",
			Operation::Difference => "difference",
			Operation::Update => "update",
			Operation::SelectForUpdate => "select_for_update",
			Operation::GetOrCreate => "get_or_create",
			Operation::UpdateOrCreate => "update_or_create",
			Operation::Dates => "dates",
			Operation::Datetimes => "datetimes",
			Operation::Get => "get",
			Operation::OrderBy => "order_by",
			Operation::Reverse => "reverse",
			Operation::Ordered => "ordered",
			Operation::InBulk => "in_bulk",
			Operation::Model => "model",
		}
	}

	/// Strategy shared by every composition kind
	///
	/// Returns `None` for operations implemented by hand.
	pub fn base_strategy(&self) -> Option<DispatchStrategy> {
		use DispatchStrategy::*;

		let strategy = match self {
			Operation::Repr
			| Operation::Len
			| Operation::FetchAll
			| Operation::IsEmpty
			| Operation::GetItem
			| Operation::Contains
			| Operation::Iterator
			| Operation::Count
			| Operation::Earliest
			| Operation::Latest
			| Operation::First
			| Operation::Last
			| Operation::Delete
			| Operation::Exists
			| Operation::Raw
			| Operation::Explain => PostApply,

			Operation::Db
			| Operation::Hints
			| Operation::AddHints
			| Operation::Query
			| Operation::ResultCache
			| Operation::SetResultCache => PostApplyProperty,

			Operation::All
			| Operation::Filter
			| Operation::Exclude
			| Operation::Values
			| Operation::ValuesList
			| Operation::Annotate
			| Operation::Alias
			| Operation::SelectRelated
			| Operation::Defer
			| Operation::Only
			| Operation::Extra
			| Operation::Using
			| Operation::ComplexFilter
			| Operation::None => Passthrough,

			Operation::PrefetchRelated | Operation::AsManager => FirstPassthrough,

			Operation::Create | Operation::BulkCreate | Operation::BulkUpdate => FirstOnly,

			Operation::Distinct
			| Operation::Aggregate
			| Operation::Union
			| Operation::Intersection
			| Operation::Difference
			| Operation::Update
			| Operation::SelectForUpdate
			| Operation::GetOrCreate
			| Operation::UpdateOrCreate
			| Operation::Dates
			| Operation::Datetimes => Unsupported,

			Operation::Get
			| Operation::OrderBy
			| Operation::Reverse
			| Operation::Ordered
			| Operation::InBulk
			| Operation::Model => return Option::None,
		};
		Some(strategy)
	}
}

impl fmt::Display for Operation {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.name())
	}
}
