//! Delayed `UNION`

use crate::component::ComponentQuery;
use crate::delayed::{DelayedQuerySet, SetOperationKind};
use crate::dispatch::{DispatchStrategy, Operation};
use crate::error::{DelayedQueryError, Result};
use crate::operand::Operand;
use serde::{Deserialize, Serialize};

/// Parameters of a delayed union
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnionParams {
	/// Keep duplicate rows (`UNION ALL`) instead of removing them
	pub all: bool,
}

impl UnionParams {
	pub fn new(all: bool) -> Self {
		Self { all }
	}

	/// Build parameters from a loosely typed map
	///
	/// Only `all` is recognised; it defaults to `false`.
	///
	/// # Examples
	///
	/// ```
	/// use reinhardt_delayed_query::UnionParams;
	///
	/// let mut map = serde_json::Map::new();
	/// map.insert("all".to_string(), serde_json::Value::Bool(true));
	/// assert!(UnionParams::from_map(&map).unwrap().all);
	///
	/// map.insert("foo".to_string(), serde_json::json!(42));
	/// assert!(UnionParams::from_map(&map).is_err());
	/// ```
	pub fn from_map(map: &serde_json::Map<String, serde_json::Value>) -> Result<Self> {
		if let Some(key) = map.keys().find(|key| key.as_str() != "all") {
			return Err(DelayedQueryError::UnexpectedParameter(key.clone()));
		}
		match map.get("all") {
			None => Ok(Self::default()),
			Some(serde_json::Value::Bool(all)) => Ok(Self::new(*all)),
			Some(other) => Err(DelayedQueryError::InvalidParameter {
				name: "all".to_string(),
				detail: format!("expected a boolean, got {}", other),
			}),
		}
	}
}

/// `UNION` / `UNION ALL` over every component, in argument order
#[derive(Debug, Clone, Copy, Default)]
pub struct UnionOperation;

impl SetOperationKind for UnionOperation {
	type Params = UnionParams;

	const NAME: &'static str = "union";

	// A combined query cannot be updated, but each component can
	const UPDATES_COMPONENTS: bool = true;

	fn expand<Q: ComponentQuery>(operand: Operand<Q>, params: &UnionParams) -> Result<Vec<Q>> {
		match operand {
			Operand::Query(query) => Ok(vec![query]),
			Operand::Union(nested) if nested.params() == params => Ok(nested.into_components()),
			Operand::Union(nested) => Err(DelayedQueryError::IncompatibleParameters {
				kind: Self::NAME,
				detail: format!(
					"nested union has all={}, expected all={}",
					nested.params().all,
					params.all
				),
			}),
			other => Err(DelayedQueryError::NestedComposition {
				kind: Self::NAME,
				found: other.kind_name(),
			}),
		}
	}

	fn compose<Q: ComponentQuery>(components: &[Q], params: &UnionParams) -> Result<Q> {
		let (first, rest) = components
			.split_first()
			.ok_or(DelayedQueryError::EmptyComponents { kind: Self::NAME })?;
		first.union(rest, params.all)
	}

	// Deduplication is exactly what a plain UNION does
	fn distinct(_params: &UnionParams) -> Option<UnionParams> {
		Some(UnionParams::new(false))
	}

	fn strategy(op: Operation) -> Option<DispatchStrategy> {
		match op {
			Operation::Distinct | Operation::Update => None,
			other => other.base_strategy(),
		}
	}
}

pub type DelayedUnionQuerySet<Q> = DelayedQuerySet<Q, UnionOperation>;

impl<Q: ComponentQuery> DelayedQuerySet<Q, UnionOperation> {
	/// Union keeping duplicate rows
	pub fn union_all<I>(querysets: I) -> Result<Self>
	where
		I: IntoIterator<Item = Q>,
	{
		Self::with_params(querysets, UnionParams::new(true))
	}

	pub fn keeps_duplicates(&self) -> bool {
		self.params().all
	}
}
