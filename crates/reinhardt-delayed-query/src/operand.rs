//! Inputs accepted when building a delayed query set

use crate::component::ComponentQuery;
use crate::difference::DelayedDifferenceQuerySet;
use crate::intersection::DelayedIntersectionQuerySet;
use crate::union::DelayedUnionQuerySet;

/// Either a plain component query or an already composed delayed query set
///
/// Composed operands are flattened into their components when the target
/// kind allows it, and rejected otherwise.
#[derive(Debug, Clone)]
pub enum Operand<Q: ComponentQuery> {
	Query(Q),
	Union(DelayedUnionQuerySet<Q>),
	Intersection(DelayedIntersectionQuerySet<Q>),
	Difference(DelayedDifferenceQuerySet<Q>),
}

impl<Q: ComponentQuery> Operand<Q> {
	pub fn query(query: Q) -> Self {
		Operand::Query(query)
	}

	/// Short name of the operand's kind, used in error messages
	pub fn kind_name(&self) -> &'static str {
		match self {
			Operand::Query(_) => "query",
			Operand::Union(_) => "union",
			Operand::Intersection(_) => "intersection",
			Operand::Difference(_) => "difference",
		}
	}
}

impl<Q: ComponentQuery> From<DelayedUnionQuerySet<Q>> for Operand<Q> {
	fn from(qs: DelayedUnionQuerySet<Q>) -> Self {
		Operand::Union(qs)
	}
}

impl<Q: ComponentQuery> From<DelayedIntersectionQuerySet<Q>> for Operand<Q> {
	fn from(qs: DelayedIntersectionQuerySet<Q>) -> Self {
		Operand::Intersection(qs)
	}
}

impl<Q: ComponentQuery> From<DelayedDifferenceQuerySet<Q>> for Operand<Q> {
	fn from(qs: DelayedDifferenceQuerySet<Q>) -> Self {
		Operand::Difference(qs)
	}
}
