//! # Reinhardt Delayed Query
//!
//! Delayed `UNION`, `INTERSECT` and `EXCEPT` query sets.
//!
//! Most backends refuse to filter, annotate or otherwise refine a query once
//! it has been combined with a set operation. The query sets in this crate
//! keep their component queries apart instead, push refinements down into
//! each component, and only build the combined query when it is evaluated.
//!
//! ## Examples
//!
//! ```rust,ignore
//! use reinhardt_delayed_query::{DelayedUnionQuerySet, criteria::Filter};
//!
//! let qs = DelayedUnionQuerySet::new([active_users, staff_users])?
//! 	.filter(Filter::eq("is_superuser", false))
//! 	.order_by(&["username"]);
//!
//! let users = qs.fetch_all().await?;
//! ```
//!
//! Any query type can take part by implementing [`ComponentQuery`].

pub mod component;
pub mod config;
pub mod criteria;
pub mod delayed;
pub mod difference;
pub mod dispatch;
pub mod error;
pub mod intersection;
pub mod operand;
pub mod union;


pub use component::ComponentQuery;
pub use config::DelayedConfig;
pub use delayed::{DelayedQuerySet, SetOperationKind};
pub use difference::{DelayedDifferenceQuerySet, DifferenceOperation};
pub use dispatch::{DispatchStrategy, Operation};
pub use error::{DelayedQueryError, Result};
pub use intersection::{DelayedIntersectionQuerySet, IntersectionOperation};
pub use operand::Operand;
pub use union::{DelayedUnionQuerySet, UnionOperation, UnionParams};
