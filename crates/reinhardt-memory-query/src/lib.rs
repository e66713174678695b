//! # Reinhardt Memory Query
//!
//! An in-memory [`ComponentQuery`](reinhardt_delayed_query::ComponentQuery)
//! backend. Rows live in a shared [`MemoryStore`]; a [`MemoryQuerySet`]
//! filters, orders, projects and combines them the way a relational database
//! would, without any connection.
//!
//! ## Examples
//!
//! ```rust
//! use reinhardt_delayed_query::{ComponentQuery, DelayedUnionQuerySet, criteria::Filter};
//! use reinhardt_memory_query::{MemoryConfig, MemoryStore, Row};
//!
//! # tokio_test::block_on(async {
//! let store = MemoryStore::new(MemoryConfig::new("pets_dog", "Dog")).unwrap();
//! store.insert(Row::new().with("name", "Rex")).unwrap();
//! store.insert(Row::new().with("name", "Fido")).unwrap();
//!
//! let qs = DelayedUnionQuerySet::new([
//! 	store.all().filter(&Filter::eq("name", "Rex").into()),
//! 	store.all().filter(&Filter::eq("name", "Fido").into()),
//! ])
//! .unwrap()
//! .order_by(&["-id"]);
//!
//! assert_eq!(qs.count().await.unwrap(), 2);
//! # });
//! ```

pub mod config;
pub mod error;
pub mod filter_eval;
pub mod plan;
pub mod queryset;
pub mod row;
pub mod store;

pub use config::MemoryConfig;
pub use error::MemoryQueryError;
pub use plan::{QueryPlan, SetOperation};
pub use queryset::MemoryQuerySet;
pub use row::Row;
pub use store::MemoryStore;
