//! Evaluation of filter conditions and expressions against rows

use crate::row::Row;
use reinhardt_delayed_query::criteria::{
	Expression, Filter, FilterCondition, FilterOperator, FilterValue, OrderByField, UpdateValue,
};
use std::cmp::Ordering;

/// Whether `row` satisfies `condition`
///
/// Comparisons involving `NULL` are false, as in SQL. Missing fields read
/// as `NULL`.
pub fn matches(condition: &FilterCondition, row: &Row) -> bool {
	match condition {
		FilterCondition::Single(filter) => matches_filter(filter, row),
		FilterCondition::And(conditions) => conditions.iter().all(|c| matches(c, row)),
		FilterCondition::Or(conditions) => conditions.iter().any(|c| matches(c, row)),
		FilterCondition::Not(inner) => !matches(inner, row),
	}
}

fn matches_filter(filter: &Filter, row: &Row) -> bool {
	let value = row.value(&filter.field);
	match filter.operator {
		FilterOperator::IsNull => value.is_null(),
		FilterOperator::IsNotNull => !value.is_null(),
		_ if value.is_null() => false,
		FilterOperator::Eq => compare(&value, &filter.value) == Some(Ordering::Equal),
		FilterOperator::Ne => matches!(
			compare(&value, &filter.value),
			Some(Ordering::Less | Ordering::Greater)
		),
		FilterOperator::Gt => compare(&value, &filter.value) == Some(Ordering::Greater),
		FilterOperator::Gte => matches!(
			compare(&value, &filter.value),
			Some(Ordering::Greater | Ordering::Equal)
		),
		FilterOperator::Lt => compare(&value, &filter.value) == Some(Ordering::Less),
		FilterOperator::Lte => matches!(
			compare(&value, &filter.value),
			Some(Ordering::Less | Ordering::Equal)
		),
		FilterOperator::In => in_list(&value, &filter.value),
		FilterOperator::NotIn => !in_list(&value, &filter.value),
		FilterOperator::Contains => text_test(&value, &filter.value, |v, p| v.contains(p)),
		FilterOperator::StartsWith => text_test(&value, &filter.value, |v, p| v.starts_with(p)),
		FilterOperator::EndsWith => text_test(&value, &filter.value, |v, p| v.ends_with(p)),
	}
}

fn in_list(value: &FilterValue, list: &FilterValue) -> bool {
	match list {
		FilterValue::List(items) => items
			.iter()
			.any(|item| compare(value, item) == Some(Ordering::Equal)),
		other => compare(value, other) == Some(Ordering::Equal),
	}
}

fn text_test(
	value: &FilterValue,
	pattern: &FilterValue,
	test: impl Fn(&str, &str) -> bool,
) -> bool {
	match (value.as_str(), pattern.as_str()) {
		(Some(value), Some(pattern)) => test(value, pattern),
		_ => false,
	}
}

/// SQL-style comparison; `None` when either side is `NULL` or the types
/// cannot be compared
pub fn compare(left: &FilterValue, right: &FilterValue) -> Option<Ordering> {
	use FilterValue::*;
	match (left, right) {
		(Integer(a), Integer(b)) => Some(a.cmp(b)),
		(Integer(a), Float(b)) => (*a as f64).partial_cmp(b),
		(Float(a), Integer(b)) => a.partial_cmp(&(*b as f64)),
		(Float(a), Float(b)) => a.partial_cmp(b),
		(String(a), String(b)) => Some(a.cmp(b)),
		(Boolean(a), Boolean(b)) => Some(a.cmp(b)),
		_ => None,
	}
}

/// Sort key comparison for `ORDER BY`
///
/// `NULL` sorts before every other value in ascending order.
fn sort_compare(left: &FilterValue, right: &FilterValue) -> Ordering {
	match (left.is_null(), right.is_null()) {
		(true, true) => Ordering::Equal,
		(true, false) => Ordering::Less,
		(false, true) => Ordering::Greater,
		(false, false) => compare(left, right).unwrap_or(Ordering::Equal),
	}
}

/// Compare two rows by a list of ordering terms
pub fn compare_rows(left: &Row, right: &Row, ordering: &[OrderByField]) -> Ordering {
	for term in ordering {
		let ord = sort_compare(&left.value(&term.field), &right.value(&term.field));
		let ord = if term.descending { ord.reverse() } else { ord };
		if ord != Ordering::Equal {
			return ord;
		}
	}
	Ordering::Equal
}

/// Evaluate an arithmetic expression in the context of `row`
///
/// Arithmetic on `NULL` or on non-numeric values yields `NULL`.
pub fn evaluate(expression: &Expression, row: &Row) -> FilterValue {
	match expression {
		Expression::Field(name) => row.value(name),
		Expression::Value(value) => value.clone(),
		Expression::Add(l, r) => arithmetic(
			evaluate(l, row),
			evaluate(r, row),
			i64::checked_add,
			|a, b| a + b,
		),
		Expression::Sub(l, r) => arithmetic(
			evaluate(l, row),
			evaluate(r, row),
			i64::checked_sub,
			|a, b| a - b,
		),
		Expression::Mul(l, r) => arithmetic(
			evaluate(l, row),
			evaluate(r, row),
			i64::checked_mul,
			|a, b| a * b,
		),
	}
}

fn arithmetic(
	left: FilterValue,
	right: FilterValue,
	int_op: impl Fn(i64, i64) -> Option<i64>,
	float_op: impl Fn(f64, f64) -> f64,
) -> FilterValue {
	use FilterValue::*;
	match (left, right) {
		(Integer(a), Integer(b)) => int_op(a, b).map(Integer).unwrap_or(Null),
		(Integer(a), Float(b)) => Float(float_op(a as f64, b)),
		(Float(a), Integer(b)) => Float(float_op(a, b as f64)),
		(Float(a), Float(b)) => Float(float_op(a, b)),
		_ => Null,
	}
}

/// Value stored by `update()` for one assignment
pub fn update_value(value: &UpdateValue, row: &Row) -> FilterValue {
	match value {
		UpdateValue::String(s) => FilterValue::String(s.clone()),
		UpdateValue::Integer(v) => FilterValue::Integer(*v),
		UpdateValue::Float(v) => FilterValue::Float(*v),
		UpdateValue::Boolean(v) => FilterValue::Boolean(*v),
		UpdateValue::Null => FilterValue::Null,
		UpdateValue::Expression(expression) => evaluate(expression, row),
	}
}

/// Value of an `extra()` select
///
/// The fragment cannot be executed as SQL here: a bare column name copies
/// that column, a numeric literal is parsed, anything else is kept as text.
/// A leading `SELECT` is ignored.
pub fn extra_value(sql: &str, row: &Row) -> FilterValue {
	let sql = sql.trim();
	let sql = match sql.get(..7) {
		Some(keyword) if keyword.eq_ignore_ascii_case("select ") => sql[7..].trim(),
		_ => sql,
	};
	if let Some(value) = row.get(sql) {
		return value.clone();
	}
	if let Ok(v) = sql.parse::<i64>() {
		return FilterValue::Integer(v);
	}
	if let Ok(v) = sql.parse::<f64>() {
		return FilterValue::Float(v);
	}
	FilterValue::String(sql.to_string())
}
