//! Delayed `EXCEPT`

use crate::component::ComponentQuery;
use crate::delayed::{DelayedQuerySet, SetOperationKind};
use crate::dispatch::{DispatchStrategy, Operation};
use crate::error::{DelayedQueryError, Result};

/// The first component minus every other component
///
/// Nested delayed differences are rejected instead of flattened:
/// `a - (b - c)` and `a - b - c` select different rows.
#[derive(Debug, Clone, Copy, Default)]
pub struct DifferenceOperation;

impl SetOperationKind for DifferenceOperation {
	type Params = ();

	const NAME: &'static str = "difference";

	fn compose<Q: ComponentQuery>(components: &[Q], _params: &()) -> Result<Q> {
		let (first, rest) = components
			.split_first()
			.ok_or(DelayedQueryError::EmptyComponents { kind: Self::NAME })?;
		first.difference(rest)
	}

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

pub type DelayedDifferenceQuerySet<Q> = DelayedQuerySet<Q, DifferenceOperation>;
