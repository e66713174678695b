//! Introspectable query plans
//!
//! A [`QueryPlan`] is what `query()` returns for an in-memory query set. It
//! renders as SQL-like text so tests and `explain()` can show what the query
//! would look like against a real database.

use reinhardt_delayed_query::criteria::{Annotation, ExtraSelect, FilterCondition, OrderByField};
use serde::{Deserialize, Serialize};

/// Set operation combining the operands of a compound select
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SetOperation {
	Union,
	UnionAll,
	Intersect,
	Except,
}

impl SetOperation {
	pub fn to_sql(&self) -> &'static str {
		match self {
			SetOperation::Union => "UNION",
			SetOperation::UnionAll => "UNION ALL",
			SetOperation::Intersect => "INTERSECT",
			SetOperation::Except => "EXCEPT",
		}
	}

	/// Whether duplicate rows survive the operation
	pub fn keeps_duplicates(&self) -> bool {
		matches!(self, SetOperation::UnionAll)
	}
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PlanSource {
	Table(String),
	Combined {
		operation: SetOperation,
		operands: Vec<QueryPlan>,
	},
}

/// Selected columns
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Projection {
	All,
	/// `values()` / `values_list()`; an empty list selects every column
	Values { fields: Vec<String>, flat: bool },
	/// `only()`; the primary key is always loaded
	Only(Vec<String>),
	/// `defer()`
	Defer(Vec<String>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryPlan {
	pub source: PlanSource,
	pub projection: Projection,
	pub annotations: Vec<Annotation>,
	pub extra: Vec<ExtraSelect>,
	pub conditions: Vec<FilterCondition>,
	pub order_by: Vec<OrderByField>,
	pub select_related: Vec<String>,
	pub empty: bool,
}

impl QueryPlan {
	pub fn table(name: impl Into<String>) -> Self {
		Self {
			source: PlanSource::Table(name.into()),
			projection: Projection::All,
			annotations: Vec::new(),
			extra: Vec::new(),
			conditions: Vec::new(),
			order_by: Vec::new(),
			select_related: Vec::new(),
			empty: false,
		}
	}

	pub fn combined(operation: SetOperation, operands: Vec<QueryPlan>) -> Self {
		Self {
			source: PlanSource::Combined {
				operation,
				operands,
			},
			..Self::table("")
		}
	}

	pub fn is_combined(&self) -> bool {
		matches!(self.source, PlanSource::Combined { .. })
	}

	fn columns(&self) -> String {
		let mut columns: Vec<String> = match &self.projection {
			Projection::All => vec!["*".to_string()],
			Projection::Values { fields, .. } if fields.is_empty() => vec!["*".to_string()],
			Projection::Values { fields, .. } | Projection::Only(fields) => fields.clone(),
			Projection::Defer(fields) => vec![format!("* EXCEPT ({})", fields.join(", "))],
		};
		columns.extend(
			self.annotations
				.iter()
				.map(|a| format!("{} AS {}", a.expression.to_sql(), a.alias)),
		);
		columns.extend(self.extra.iter().map(|e| format!("({}) AS {}", e.sql, e.alias)));
		columns.join(", ")
	}

	/// Render the plan as SQL
	///
	/// # Examples
	///
	/// ```
	/// use reinhardt_memory_query::plan::{QueryPlan, SetOperation};
	///
	/// let plan = QueryPlan::combined(
	/// 	SetOperation::UnionAll,
	/// 	vec![QueryPlan::table("pets_dog"), QueryPlan::table("pets_dog")],
	/// );
	/// assert_eq!(
	/// 	plan.to_sql(),
	/// 	"(SELECT * FROM pets_dog)\nUNION ALL\n(SELECT * FROM pets_dog)"
	/// );
	/// ```
	pub fn to_sql(&self) -> String {
		let from = match &self.source {
			PlanSource::Table(name) => name.clone(),
			PlanSource::Combined {
				operation,
				operands,
			} => {
				let compound = operands
					.iter()
					.map(|operand| format!("({})", operand.to_sql()))
					.collect::<Vec<_>>()
					.join(&format!("\n{}\n", operation.to_sql()));
				if self.is_plain_compound() {
					return compound;
				}
				format!("({}) AS combined", compound)
			}
		};

		let mut sql = format!("SELECT {} FROM {}", self.columns(), from);
		let mut conditions: Vec<String> = self.conditions.iter().map(|c| c.to_sql()).collect();
		if self.empty {
			conditions.push("1 = 0".to_string());
		}
		if !conditions.is_empty() {
			sql.push_str(&format!(" WHERE {}", conditions.join(" AND ")));
		}
		if !self.order_by.is_empty() {
			let terms: Vec<String> = self.order_by.iter().map(|o| o.to_sql()).collect();
			sql.push_str(&format!(" ORDER BY {}", terms.join(", ")));
		}
		sql
	}

	// A compound select with nothing applied on top renders without a wrapper
	fn is_plain_compound(&self) -> bool {
		self.projection == Projection::All
			&& self.annotations.is_empty()
			&& self.extra.is_empty()
			&& self.conditions.is_empty()
			&& self.order_by.is_empty()
			&& !self.empty
	}
}
