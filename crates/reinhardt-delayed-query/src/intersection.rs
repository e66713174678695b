//! Delayed `INTERSECT`

use crate::component::ComponentQuery;
use crate::delayed::{DelayedQuerySet, SetOperationKind};
use crate::dispatch::{DispatchStrategy, Operation};
use crate::error::{DelayedQueryError, Result};
use crate::operand::Operand;

/// `INTERSECT` over every component, in argument order
#[derive(Debug, Clone, Copy, Default)]
pub struct IntersectionOperation;

impl SetOperationKind for IntersectionOperation {
	type Params = ();

	const NAME: &'static str = "intersection";

	// Intersection is associative, so nested intersections always flatten
	fn expand<Q: ComponentQuery>(operand: Operand<Q>, _params: &()) -> Result<Vec<Q>> {
		match operand {
			Operand::Query(query) => Ok(vec![query]),
			Operand::Intersection(nested) => Ok(nested.into_components()),
			other => Err(DelayedQueryError::NestedComposition {
				kind: Self::NAME,
				found: other.kind_name(),
			}),
		}
	}

	fn compose<Q: ComponentQuery>(components: &[Q], _params: &()) -> Result<Q> {
		let (first, rest) = components
			.split_first()
			.ok_or(DelayedQueryError::EmptyComponents { kind: Self::NAME })?;
		first.intersection(rest)
	}

	// Rows of an intersection are already distinct
	fn distinct(_params: &()) -> Option<()> {
		Some(())
	}

	fn strategy(op: Operation) -> Option<DispatchStrategy> {
		match op {
			Operation::Distinct => None,
			other => other.base_strategy(),
		}
	}
}

pub type DelayedIntersectionQuerySet<Q> = DelayedQuerySet<Q, IntersectionOperation>;
