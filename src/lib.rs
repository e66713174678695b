//! # Reinhardt Delayed
//!
//! Set operations on query sets that stay refinable after composition.
//!
//! Combining query sets with `UNION`, `INTERSECT` or `EXCEPT` normally ends
//! the chain: most backends reject a `filter()` or `values()` on top of a
//! compound select. The delayed query sets re-exported here hold on to their
//! component query sets instead, distribute refinements to every component,
//! and only build the compound select when the result is evaluated.
//!
//! ## Crates
//!
//! - [`query`]: the delayed query sets and the [`ComponentQuery`] contract
//! - [`memory`]: an in-memory component query backend (feature `memory`,
//!   enabled by default)
//!
//! ## Examples
//!
//! ```rust
//! use reinhardt_delayed::prelude::*;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<()> {
//! let store = MemoryStore::new(MemoryConfig::new("pets_dog", "Dog")).unwrap();
//! store.insert(Row::new().with("name", "Rex").with("age", 3))?;
//! store.insert(Row::new().with("name", "Fido").with("age", 5))?;
//! store.insert(Row::new().with("name", "Spot").with("age", 1))?;
//!
//! let dogs = DelayedUnionQuerySet::new([
//! 	store.all().filter(&Filter::eq("name", "Rex").into()),
//! 	store.all().filter(&Filter::gte("age", 4).into()),
//! ])?;
//!
//! // Pushed into both components; the union itself is built only once, below
//! let young = dogs.filter(Filter::lte("age", 4)).order_by(&["-age"]);
//! assert_eq!(young.count().await?, 1);
//! # Ok(())
//! # }
//! ```

pub use reinhardt_delayed_query as query;

#[cfg(feature = "memory")]
pub use reinhardt_memory_query as memory;

pub use reinhardt_delayed_query::{
	ComponentQuery, DelayedConfig, DelayedDifferenceQuerySet, DelayedIntersectionQuerySet,
	DelayedQueryError, DelayedQuerySet, DelayedUnionQuerySet, DifferenceOperation,
	DispatchStrategy, IntersectionOperation, Operand, Operation, Result, SetOperationKind,
	UnionOperation, UnionParams,
};

/// Everything needed to build and evaluate delayed query sets
pub mod prelude {
	pub use crate::query::criteria::{
		Annotation, Expression, ExtraSelect, Filter, FilterCondition, FilterOperator, FilterValue,
		Hints, OrderByField, UpdateValue, UpdateValues,
	};
	pub use crate::{
		ComponentQuery, DelayedConfig, DelayedDifferenceQuerySet, DelayedIntersectionQuerySet,
		DelayedQueryError, DelayedUnionQuerySet, Operand, Result, UnionParams,
	};

	#[cfg(feature = "memory")]
	pub use crate::memory::{MemoryConfig, MemoryQuerySet, MemoryStore, Row};

	// External
	pub use async_trait::async_trait;
}
