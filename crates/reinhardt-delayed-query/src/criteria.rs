//! Backend-neutral query criteria
//!
//! These are the values handed to every component query when a refining
//! operation is distributed: filter conditions, orderings, annotations and
//! update assignments. Component backends interpret them; the delayed query
//! set only clones and forwards them.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Execution hints bag shared with the composed query
pub type Hints = HashMap<String, serde_json::Value>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FilterOperator {
	Eq,
	Ne,
	Gt,
	Gte,
	Lt,
	Lte,
	In,
	NotIn,
	Contains,
	StartsWith,
	EndsWith,
	/// Is null check
	IsNull,
	/// Is not null check
	IsNotNull,
}

impl FilterOperator {
	pub fn as_sql(&self) -> &'static str {
		match self {
			FilterOperator::Eq => "=",
			FilterOperator::Ne => "!=",
			FilterOperator::Gt => ">",
			FilterOperator::Gte => ">=",
			FilterOperator::Lt => "<",
			FilterOperator::Lte => "<=",
			FilterOperator::In => "IN",
			FilterOperator::NotIn => "NOT IN",
			FilterOperator::Contains | FilterOperator::StartsWith | FilterOperator::EndsWith => {
				"LIKE"
			}
			FilterOperator::IsNull => "IS NULL",
			FilterOperator::IsNotNull => "IS NOT NULL",
		}
	}
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FilterValue {
	String(String),
	Integer(i64),
	Float(f64),
	Boolean(bool),
	Null,
	List(Vec<FilterValue>),
}

impl FilterValue {
	pub fn as_i64(&self) -> Option<i64> {
		match self {
			FilterValue::Integer(v) => Some(*v),
			_ => None,
		}
	}

	pub fn as_str(&self) -> Option<&str> {
		match self {
			FilterValue::String(s) => Some(s),
			_ => None,
		}
	}

	pub fn is_null(&self) -> bool {
		matches!(self, FilterValue::Null)
	}
}

impl fmt::Display for FilterValue {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			FilterValue::String(s) => write!(f, "'{}'", s.replace('\'', "''")),
			FilterValue::Integer(v) => write!(f, "{}", v),
			FilterValue::Float(v) => write!(f, "{}", v),
			FilterValue::Boolean(v) => write!(f, "{}", if *v { "TRUE" } else { "FALSE" }),
			FilterValue::Null => write!(f, "NULL"),
			FilterValue::List(values) => {
				let items: Vec<String> = values.iter().map(|v| v.to_string()).collect();
				write!(f, "({})", items.join(", "))
			}
		}
	}
}

impl From<String> for FilterValue {
	fn from(s: String) -> Self {
		FilterValue::String(s)
	}
}

impl From<&str> for FilterValue {
	fn from(s: &str) -> Self {
		FilterValue::String(s.to_string())
	}
}

impl From<i64> for FilterValue {
	fn from(v: i64) -> Self {
		FilterValue::Integer(v)
	}
}

impl From<i32> for FilterValue {
	fn from(v: i32) -> Self {
		FilterValue::Integer(v as i64)
	}
}

impl From<f64> for FilterValue {
	fn from(v: f64) -> Self {
		FilterValue::Float(v)
	}
}

impl From<bool> for FilterValue {
	fn from(v: bool) -> Self {
		FilterValue::Boolean(v)
	}
}

impl<T: Into<FilterValue>> From<Vec<T>> for FilterValue {
	fn from(values: Vec<T>) -> Self {
		FilterValue::List(values.into_iter().map(Into::into).collect())
	}
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Filter {
	pub field: String,
	pub operator: FilterOperator,
	pub value: FilterValue,
}

impl Filter {
	pub fn new(field: impl Into<String>, operator: FilterOperator, value: FilterValue) -> Self {
		Self {
			field: field.into(),
			operator,
			value,
		}
	}

	pub fn eq(field: impl Into<String>, value: impl Into<FilterValue>) -> Self {
		Self::new(field, FilterOperator::Eq, value.into())
	}

	pub fn ne(field: impl Into<String>, value: impl Into<FilterValue>) -> Self {
		Self::new(field, FilterOperator::Ne, value.into())
	}

	pub fn gte(field: impl Into<String>, value: impl Into<FilterValue>) -> Self {
		Self::new(field, FilterOperator::Gte, value.into())
	}

	pub fn lte(field: impl Into<String>, value: impl Into<FilterValue>) -> Self {
		Self::new(field, FilterOperator::Lte, value.into())
	}

	/// `field IN (values...)`
	pub fn in_list<I, V>(field: impl Into<String>, values: I) -> Self
	where
		I: IntoIterator<Item = V>,
		V: Into<FilterValue>,
	{
		Self::new(
			field,
			FilterOperator::In,
			FilterValue::List(values.into_iter().map(Into::into).collect()),
		)
	}
}

/// Composite filter condition supporting AND/OR/NOT logic
///
/// # Examples
///
/// ```
/// use reinhardt_delayed_query::criteria::{Filter, FilterCondition};
///
/// // (status = 'active') AND (id = 1 OR id = 2)
/// let condition = FilterCondition::and(vec![
///     Filter::eq("status", "active").into(),
///     FilterCondition::or(vec![Filter::eq("id", 1).into(), Filter::eq("id", 2).into()]),
/// ]);
/// assert!(!condition.is_empty());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FilterCondition {
	/// A single filter expression
	Single(Filter),
	/// All conditions must match (AND logic)
	And(Vec<FilterCondition>),
	/// Any condition must match (OR logic)
	Or(Vec<FilterCondition>),
	/// Negates the inner condition (NOT logic)
	Not(Box<FilterCondition>),
}

impl FilterCondition {
	pub fn single(filter: Filter) -> Self {
		Self::Single(filter)
	}

	pub fn and(conditions: Vec<FilterCondition>) -> Self {
		Self::And(conditions)
	}

	pub fn or(conditions: Vec<FilterCondition>) -> Self {
		Self::Or(conditions)
	}

	#[allow(clippy::should_implement_trait)]
	pub fn not(condition: FilterCondition) -> Self {
		Self::Not(Box::new(condition))
	}

	/// Returns true if this condition contains no filters
	pub fn is_empty(&self) -> bool {
		match self {
			Self::Single(_) => false,
			Self::And(conditions) | Self::Or(conditions) => {
				conditions.iter().all(|c| c.is_empty())
			}
			Self::Not(inner) => inner.is_empty(),
		}
	}

	/// Renders the condition as a SQL `WHERE` fragment
	pub fn to_sql(&self) -> String {
		match self {
			Self::Single(filter) => match filter.operator {
				FilterOperator::IsNull | FilterOperator::IsNotNull => {
					format!("{} {}", filter.field, filter.operator.as_sql())
				}
				FilterOperator::Contains => format!(
					"{} LIKE '%{}%'",
					filter.field,
					filter.value.as_str().unwrap_or_default()
				),
				FilterOperator::StartsWith => format!(
					"{} LIKE '{}%'",
					filter.field,
					filter.value.as_str().unwrap_or_default()
				),
				FilterOperator::EndsWith => format!(
					"{} LIKE '%{}'",
					filter.field,
					filter.value.as_str().unwrap_or_default()
				),
				_ => format!(
					"{} {} {}",
					filter.field,
					filter.operator.as_sql(),
					filter.value
				),
			},
			Self::And(conditions) => join_conditions(conditions, " AND ", "TRUE"),
			Self::Or(conditions) => join_conditions(conditions, " OR ", "FALSE"),
			Self::Not(inner) => format!("NOT ({})", inner.to_sql()),
		}
	}
}

fn join_conditions(conditions: &[FilterCondition], separator: &str, empty: &str) -> String {
	if conditions.is_empty() {
		return empty.to_string();
	}
	let parts: Vec<String> = conditions
		.iter()
		.map(|c| format!("({})", c.to_sql()))
		.collect();
	parts.join(separator)
}

impl From<Filter> for FilterCondition {
	fn from(filter: Filter) -> Self {
		Self::Single(filter)
	}
}

/// A single `ORDER BY` term
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OrderByField {
	pub field: String,
	pub descending: bool,
}

impl OrderByField {
	pub fn asc(field: impl Into<String>) -> Self {
		Self {
			field: field.into(),
			descending: false,
		}
	}

	pub fn desc(field: impl Into<String>) -> Self {
		Self {
			field: field.into(),
			descending: true,
		}
	}

	/// Parses a Django-style ordering term, where a leading `-` means descending
	///
	/// # Examples
	///
	/// ```
	/// use reinhardt_delayed_query::criteria::OrderByField;
	///
	/// assert_eq!(OrderByField::parse("-id"), OrderByField::desc("id"));
	/// assert_eq!(OrderByField::parse("name"), OrderByField::asc("name"));
	/// ```
	pub fn parse(term: &str) -> Self {
		match term.strip_prefix('-') {
			Some(field) => Self::desc(field),
			None => Self::asc(term),
		}
	}

	pub fn parse_all(terms: &[&str]) -> Vec<Self> {
		terms.iter().map(|t| Self::parse(t)).collect()
	}

	pub fn reversed(&self) -> Self {
		Self {
			field: self.field.clone(),
			descending: !self.descending,
		}
	}

	pub fn to_sql(&self) -> String {
		format!(
			"{} {}",
			self.field,
			if self.descending { "DESC" } else { "ASC" }
		)
	}
}

/// Value expressions for annotations and updates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expression {
	/// Reference to another field of the same row
	Field(String),
	Value(FilterValue),
	Add(Box<Expression>, Box<Expression>),
	Sub(Box<Expression>, Box<Expression>),
	Mul(Box<Expression>, Box<Expression>),
}

impl Expression {
	pub fn field(name: impl Into<String>) -> Self {
		Self::Field(name.into())
	}

	pub fn value(value: impl Into<FilterValue>) -> Self {
		Self::Value(value.into())
	}

	pub fn add(self, other: Expression) -> Self {
		Self::Add(Box::new(self), Box::new(other))
	}

	pub fn sub(self, other: Expression) -> Self {
		Self::Sub(Box::new(self), Box::new(other))
	}

	pub fn mul(self, other: Expression) -> Self {
		Self::Mul(Box::new(self), Box::new(other))
	}

	pub fn to_sql(&self) -> String {
		match self {
			Self::Field(name) => name.clone(),
			Self::Value(value) => value.to_string(),
			Self::Add(l, r) => format!("({} + {})", l.to_sql(), r.to_sql()),
			Self::Sub(l, r) => format!("({} - {})", l.to_sql(), r.to_sql()),
			Self::Mul(l, r) => format!("({} * {})", l.to_sql(), r.to_sql()),
		}
	}
}

/// Named computed column, used by `annotate()` and `alias()`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
	pub alias: String,
	pub expression: Expression,
}

impl Annotation {
	pub fn new(alias: impl Into<String>, expression: Expression) -> Self {
		Self {
			alias: alias.into(),
			expression,
		}
	}
}

/// Raw SQL select fragment, used by `extra()`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtraSelect {
	pub alias: String,
	pub sql: String,
}

impl ExtraSelect {
	pub fn new(alias: impl Into<String>, sql: impl Into<String>) -> Self {
		Self {
			alias: alias.into(),
			sql: sql.into(),
		}
	}
}

/// Values that can be used in UPDATE statements
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum UpdateValue {
	String(String),
	Integer(i64),
	Float(f64),
	Boolean(bool),
	Null,
	/// Field-to-field or arithmetic update (e.g., SET total = price * quantity)
	Expression(Expression),
}

impl From<&str> for UpdateValue {
	fn from(s: &str) -> Self {
		UpdateValue::String(s.to_string())
	}
}

impl From<String> for UpdateValue {
	fn from(s: String) -> Self {
		UpdateValue::String(s)
	}
}

impl From<i64> for UpdateValue {
	fn from(v: i64) -> Self {
		UpdateValue::Integer(v)
	}
}

impl From<bool> for UpdateValue {
	fn from(v: bool) -> Self {
		UpdateValue::Boolean(v)
	}
}

/// Column assignments for a mass update
pub type UpdateValues = HashMap<String, UpdateValue>;
