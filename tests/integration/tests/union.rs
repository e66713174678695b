//! Delayed union integration tests
//!
//! Runs the full query set surface of `DelayedUnionQuerySet` against the
//! in-memory backend.

use futures::StreamExt;
use reinhardt_delayed::prelude::*;
use reinhardt_delayed_integration_tests::{dogs, id_is, ids, sorted};
use rstest::*;

#[fixture]
fn store() -> MemoryStore {
	dogs(3)
}

/// Union of two full components over its own store
#[fixture]
fn qs(store: MemoryStore) -> DelayedUnionQuerySet<MemoryQuerySet> {
	DelayedUnionQuerySet::new([store.all(), store.all()]).unwrap()
}

// ============================================================================
// Construction
// ============================================================================

#[rstest]
fn test_union_params_from_map_rejects_unknown_keys() {
	// Arrange
	let mut params = serde_json::Map::new();
	params.insert("all".to_string(), serde_json::json!(true));
	params.insert("ordered".to_string(), serde_json::json!(true));

	// Act
	let error = UnionParams::from_map(&params).unwrap_err();

	// Assert
	assert_eq!(
		error.to_string(),
		"received an unexpected keyword argument 'ordered'"
	);
}

#[rstest]
fn test_union_of_other_model_is_rejected(store: MemoryStore) {
	// Arrange
	let cats = MemoryStore::new(MemoryConfig::new("pets_cat", "Cat")).unwrap();

	// Act
	let error = DelayedUnionQuerySet::new([store.all(), cats.all()]).unwrap_err();

	// Assert
	assert!(error.is_construction());
}

#[rstest]
#[tokio::test]
async fn test_nested_union_is_flattened(store: MemoryStore) {
	// Arrange
	let inner = DelayedUnionQuerySet::new([
		store.all().filter(&id_is(1)),
		store.all().filter(&id_is(2)),
	])
	.unwrap();

	// Act
	let qs = DelayedUnionQuerySet::from_operands(
		[Operand::query(store.all().filter(&id_is(3))), inner.into()],
		UnionParams::default(),
	)
	.unwrap();

	// Assert
	assert_eq!(qs.components().len(), 3);
	assert_eq!(sorted(ids(&qs.fetch_all().await.unwrap())), vec![1, 2, 3]);
}

// ============================================================================
// Evaluated after composition
// ============================================================================

#[rstest]
#[tokio::test]
async fn test_count_removes_duplicates(qs: DelayedUnionQuerySet<MemoryQuerySet>) {
	// Act
	let count = qs.count().await.unwrap();
	let len = qs.len().await.unwrap();

	// Assert
	assert_eq!(count, 3);
	assert_eq!(len, 3);
}

#[rstest]
#[tokio::test]
async fn test_union_all_keeps_duplicates() {
	// Arrange
	let store = dogs(1);

	// Act
	let qs = DelayedUnionQuerySet::union_all([store.all(), store.all()]).unwrap();

	// Assert
	assert_eq!(qs.count().await.unwrap(), 2);
	assert_eq!(ids(&qs.fetch_all().await.unwrap()), vec![1, 1]);
	assert_eq!(qs.distinct().unwrap().count().await.unwrap(), 1);
}

#[rstest]
#[tokio::test]
async fn test_get(qs: DelayedUnionQuerySet<MemoryQuerySet>) {
	// Act
	let dog = qs.get(Filter::eq("name", "dog-2")).await.unwrap();
	let missing = qs.get(id_is(42)).await.unwrap_err();
	let many = qs.get(Filter::gte("age", 2)).await.unwrap_err();

	// Assert
	assert_eq!(dog.value("id"), FilterValue::Integer(2));
	assert_eq!(missing.to_string(), "Dog matching query does not exist.");
	assert_eq!(
		many.to_string(),
		"get() returned more than one Dog -- it returned 2!"
	);
}

#[rstest]
#[tokio::test]
async fn test_repr(store: MemoryStore) {
	// Arrange
	let dog_one = store.all().filter(&id_is(1));
	let qs = DelayedUnionQuerySet::new([dog_one.clone(), dog_one]).unwrap();

	// Act
	let repr = qs.repr().await.unwrap();

	// Assert
	assert_eq!(repr, "<QuerySet [{id: 1, name: 'dog-1', age: 1}]>");
}

#[rstest]
#[tokio::test]
async fn test_contains_and_indexing(store: MemoryStore) {
	// Arrange
	let qs = DelayedUnionQuerySet::new([store.all(), store.all()]).unwrap();
	let first = store.rows().remove(0);
	let ordered = qs.order_by(&["id"]);

	// Act / Assert
	assert!(qs.contains(&first).await.unwrap());
	assert!(!qs.contains(&Row::new().with("id", 42)).await.unwrap());
	assert_eq!(ordered.get_item(0).await.unwrap(), Some(first));
	assert_eq!(ordered.get_item(9).await.unwrap(), None);
}

#[rstest]
#[tokio::test]
async fn test_truthiness(qs: DelayedUnionQuerySet<MemoryQuerySet>) {
	// Arrange
	let empty = qs.filter(id_is(42));

	// Act / Assert
	assert!(!qs.is_empty().await.unwrap());
	assert!(qs.exists().await.unwrap());
	assert!(empty.is_empty().await.unwrap());
	assert!(!empty.exists().await.unwrap());
}

#[rstest]
#[tokio::test]
async fn test_iterator(qs: DelayedUnionQuerySet<MemoryQuerySet>) {
	// Act
	let rows: Vec<Row> = qs.order_by(&["id"]).iterator().await.unwrap().collect().await;

	// Assert
	assert_eq!(ids(&rows), vec![1, 2, 3]);
}

#[rstest]
#[tokio::test]
async fn test_first_last_earliest_latest(qs: DelayedUnionQuerySet<MemoryQuerySet>) {
	// Arrange
	let id = |row: Row| row.value("id").as_i64();
	let descending = qs.order_by(&["-id"]);

	// Act / Assert
	assert_eq!(qs.first().await.unwrap().and_then(id), Some(1));
	assert_eq!(qs.last().await.unwrap().and_then(id), Some(3));
	assert_eq!(descending.first().await.unwrap().and_then(id), Some(3));
	assert_eq!(descending.last().await.unwrap().and_then(id), Some(1));
	assert_eq!(id(qs.earliest("id").await.unwrap()), Some(1));
	assert_eq!(id(qs.latest("id").await.unwrap()), Some(3));
}

#[rstest]
#[tokio::test]
async fn test_delete_of_compound_select_fails(store: MemoryStore) {
	// Arrange
	let qs = DelayedUnionQuerySet::new([store.all(), store.all()]).unwrap();

	// Act
	let error = qs.delete().await.unwrap_err();

	// Assert
	assert!(matches!(error, DelayedQueryError::Backend(_)));
	assert_eq!(store.len(), 3);
}

#[rstest]
#[tokio::test]
async fn test_raw_and_explain(qs: DelayedUnionQuerySet<MemoryQuerySet>) {
	// Act
	let raw = qs.raw("SELECT * FROM pets_dog").await;
	let plan = qs.explain().await.unwrap();

	// Assert
	assert!(raw.is_err());
	assert_eq!(
		plan,
		"EXPLAIN (SELECT * FROM pets_dog)\nUNION\n(SELECT * FROM pets_dog)"
	);
}

// ============================================================================
// Distributed to every component
// ============================================================================

#[rstest]
#[tokio::test]
async fn test_filter_and_exclude(qs: DelayedUnionQuerySet<MemoryQuerySet>) {
	// Arrange
	let either = FilterCondition::or(vec![id_is(1), id_is(3)]);

	// Act / Assert
	assert_eq!(qs.filter(id_is(42)).count().await.unwrap(), 0);
	assert_eq!(qs.exclude(id_is(1)).count().await.unwrap(), 2);
	assert_eq!(qs.complex_filter(either).count().await.unwrap(), 2);
}

#[rstest]
#[tokio::test]
async fn test_filtering_after_ordering(qs: DelayedUnionQuerySet<MemoryQuerySet>) {
	// Act
	let dog = qs.order_by(&["-id"]).exclude(id_is(42)).first().await.unwrap();

	// Assert
	assert_eq!(dog.map(|row| row.value("id")), Some(FilterValue::Integer(3)));
}

#[rstest]
#[tokio::test]
async fn test_values_and_values_list(qs: DelayedUnionQuerySet<MemoryQuerySet>) {
	// Act
	let values = qs.values(&["id"]).order_by(&["id"]).fetch_all().await.unwrap();
	let flat = qs.values_list(&["age"], true).fetch_all().await.unwrap();

	// Assert
	assert_eq!(values[0], Row::new().with("id", 1));
	assert!(flat.iter().all(|row| row.field_names().eq(["age"])));
}

#[rstest]
#[tokio::test]
async fn test_annotate_and_alias(qs: DelayedUnionQuerySet<MemoryQuerySet>) {
	// Arrange
	let doubled = Annotation::new("doubled", Expression::field("id").mul(Expression::value(2)));

	// Act
	let dog = qs.annotate(&[doubled.clone()]).first().await.unwrap().unwrap();
	let aliased = qs
		.alias(&[doubled])
		.filter(Filter::gte("doubled", 4))
		.fetch_all()
		.await
		.unwrap();

	// Assert
	assert_eq!(dog.value("doubled"), FilterValue::Integer(2));
	assert_eq!(aliased.len(), 2);
	assert!(aliased.iter().all(|row| !row.contains_field("doubled")));
}

#[rstest]
#[tokio::test]
async fn test_only_and_defer(qs: DelayedUnionQuerySet<MemoryQuerySet>) {
	// Act
	let only = qs.only(&["name"]).first().await.unwrap().unwrap();
	let deferred = qs.defer(&["name"]).first().await.unwrap().unwrap();

	// Assert
	assert_eq!(only.field_names().collect::<Vec<_>>(), vec!["id", "name"]);
	assert!(!deferred.contains_field("name"));
	assert!(deferred.contains_field("age"));
}

#[rstest]
#[tokio::test]
async fn test_extra(qs: DelayedUnionQuerySet<MemoryQuerySet>) {
	// Act
	let dog = qs
		.extra(&[ExtraSelect::new("n", "SELECT 42")])
		.first()
		.await
		.unwrap()
		.unwrap();

	// Assert
	assert_eq!(dog.value("n"), FilterValue::Integer(42));
}

#[rstest]
#[tokio::test]
async fn test_none(qs: DelayedUnionQuerySet<MemoryQuerySet>) {
	// Act
	let rows = qs.none().fetch_all().await.unwrap();

	// Assert
	assert!(rows.is_empty());
}

#[rstest]
fn test_db_and_using(qs: DelayedUnionQuerySet<MemoryQuerySet>) {
	// Act
	let routed = qs.using("some_db");

	// Assert
	assert_eq!(qs.db().unwrap(), "default");
	assert_eq!(routed.db().unwrap(), "some_db");
}

#[rstest]
fn test_select_related_reaches_components(qs: DelayedUnionQuerySet<MemoryQuerySet>) {
	// Act
	let qs = qs.select_related(&["owner"]);

	// Assert
	for component in qs.components() {
		assert_eq!(component.select_related_fields(), ["owner".to_string()]);
	}
}

#[rstest]
#[tokio::test]
async fn test_prefetch_related_preserves_ordering(qs: DelayedUnionQuerySet<MemoryQuerySet>) {
	// Act
	let qs = qs.order_by(&["-id"]).prefetch_related(&["owner"]);

	// Assert
	assert_eq!(qs.components()[0].prefetch_related_fields(), ["owner".to_string()]);
	assert!(qs.components()[1].prefetch_related_fields().is_empty());
	let first = qs.first().await.unwrap().unwrap();
	assert_eq!(first.value("id"), FilterValue::Integer(3));
	assert_eq!(
		qs.apply().unwrap().prefetch_related_fields(),
		["owner".to_string()]
	);
}

// ============================================================================
// Ordering
// ============================================================================

#[rstest]
#[tokio::test]
async fn test_order_by_and_reverse(qs: DelayedUnionQuerySet<MemoryQuerySet>) {
	// Arrange
	let ascending = qs.order_by(&["id"]);
	let descending = qs.order_by(&["-id"]);

	// Act / Assert
	assert!(!qs.ordered());
	assert!(ascending.ordered());
	assert_eq!(ids(&ascending.fetch_all().await.unwrap()), vec![1, 2, 3]);
	assert_eq!(ids(&descending.fetch_all().await.unwrap()), vec![3, 2, 1]);
	assert_eq!(
		ids(&descending.reverse().fetch_all().await.unwrap()),
		vec![1, 2, 3]
	);
}

// ============================================================================
// Lookups
// ============================================================================

#[rstest]
#[tokio::test]
async fn test_in_bulk(qs: DelayedUnionQuerySet<MemoryQuerySet>) {
	// Act
	let everything = qs.in_bulk(None).await.unwrap();
	let nothing = qs.in_bulk(Some(&[][..])).await.unwrap();
	let found = qs.in_bulk(Some(&[1, 42][..])).await.unwrap();

	// Assert
	assert_eq!(everything.len(), 3);
	assert!(nothing.is_empty());
	assert_eq!(found.len(), 1);
	assert_eq!(found[&1].value("name"), FilterValue::from("dog-1"));
}

#[rstest]
#[case::whole_query_set(None)]
#[case::listed_ids(Some(vec![1, 2]))]
#[tokio::test]
async fn test_in_bulk_of_projection_without_primary_key(
	qs: DelayedUnionQuerySet<MemoryQuerySet>,
	#[case] wanted: Option<Vec<i64>>,
) {
	// Arrange
	let names = qs.values(&["name"]);

	// Act
	let error = names.in_bulk(wanted.as_deref()).await.unwrap_err();

	// Assert
	assert!(matches!(
		&error,
		DelayedQueryError::MissingPrimaryKey { model, field } if model == "Dog" && field == "id"
	));
	assert_eq!(
		error.to_string(),
		"in_bulk() requires Dog rows that include their primary key 'id'"
	);
}

// ============================================================================
// Writes
// ============================================================================

#[rstest]
#[tokio::test]
async fn test_create_and_bulk_create(store: MemoryStore) {
	// Arrange
	let qs = DelayedUnionQuerySet::new([store.all(), store.all()]).unwrap();

	// Act
	let created = qs.create(Row::new().with("name", "Bolt")).await.unwrap();
	qs.bulk_create(vec![Row::new().with("id", 4242)]).await.unwrap();

	// Assert
	assert!(created.get("id").is_some());
	assert!(store.all().filter(&id_is(4242)).exists().await.unwrap());
	assert_eq!(store.len(), 5);
}

#[rstest]
#[tokio::test]
async fn test_bulk_create_with_taken_key_fails(store: MemoryStore) {
	// Arrange
	let qs = DelayedUnionQuerySet::new([store.all(), store.all()]).unwrap();

	// Act
	let error = qs
		.bulk_create(vec![Row::new().with("id", 2).with("name", "Copy")])
		.await
		.unwrap_err();

	// Assert
	assert!(matches!(error, DelayedQueryError::Backend(_)));
	assert_eq!(store.len(), 3);
	assert_eq!(
		store.rows()[1].value("name"),
		FilterValue::from("dog-2")
	);
}

#[rstest]
#[tokio::test]
async fn test_update_runs_per_component(store: MemoryStore) {
	// Arrange
	let qs = DelayedUnionQuerySet::new([store.all(), store.all()]).unwrap();
	let mut values = UpdateValues::new();
	values.insert("name".to_string(), UpdateValue::from("Rover"));

	// Act
	let updated = qs.update(&values).await.unwrap();

	// Assert
	// every row is matched by both components
	assert_eq!(updated, 6);
	assert!(
		store
			.rows()
			.iter()
			.all(|row| row.value("name") == FilterValue::from("Rover"))
	);
}

// ============================================================================
// Unsupported
// ============================================================================

#[rstest]
fn test_unsupported_operations(qs: DelayedUnionQuerySet<MemoryQuerySet>) {
	// Act / Assert
	assert!(qs.select_for_update().unwrap_err().is_not_supported());
	assert!(qs.dates("joined", "day").unwrap_err().is_not_supported());
	assert!(qs.datetimes("joined", "second").unwrap_err().is_not_supported());
	assert!(qs.aggregate(&[]).unwrap_err().is_not_supported());
	assert!(
		qs.get_or_create(id_is(4242), Row::new())
			.unwrap_err()
			.is_not_supported()
	);
	assert!(
		qs.update_or_create(id_is(4242), &UpdateValues::new())
			.unwrap_err()
			.is_not_supported()
	);
	assert!(qs.intersection(&qs).unwrap_err().is_not_supported());
}
