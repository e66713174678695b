//! Delayed intersection integration tests

use reinhardt_delayed::prelude::*;
use reinhardt_delayed_integration_tests::{dogs, id_is, ids, sorted};
use rstest::*;

#[fixture]
fn store() -> MemoryStore {
	dogs(3)
}

#[rstest]
#[tokio::test]
async fn test_intersection_keeps_common_rows(store: MemoryStore) {
	// Arrange
	let qs = DelayedIntersectionQuerySet::new([
		store.all().exclude(&id_is(2)),
		store.all().exclude(&id_is(3)),
	])
	.unwrap();

	// Act
	let rows = qs.fetch_all().await.unwrap();

	// Assert
	assert_eq!(ids(&rows), vec![1]);
	assert_eq!(qs.count().await.unwrap(), 1);
}

#[rstest]
#[tokio::test]
async fn test_filter_is_pushed_into_components(store: MemoryStore) {
	// Arrange
	let qs = DelayedIntersectionQuerySet::new([store.all(), store.all().exclude(&id_is(3))]).unwrap();

	// Act
	let qs = qs.filter(Filter::gte("age", 2));

	// Assert
	assert_eq!(ids(&qs.fetch_all().await.unwrap()), vec![2]);
	for component in qs.components() {
		assert!(component.query().to_sql().contains("age >= 2"));
	}
}

#[rstest]
#[tokio::test]
async fn test_nested_intersection_is_flattened(store: MemoryStore) {
	// Arrange
	let inner =
		DelayedIntersectionQuerySet::new([store.all(), store.all().exclude(&id_is(1))]).unwrap();

	// Act
	let qs = DelayedIntersectionQuerySet::from_operands(
		[inner.into(), Operand::query(store.all().exclude(&id_is(2)))],
		(),
	)
	.unwrap();

	// Assert
	assert_eq!(qs.components().len(), 3);
	assert_eq!(sorted(ids(&qs.fetch_all().await.unwrap())), vec![3]);
}

#[rstest]
fn test_nested_union_is_rejected(store: MemoryStore) {
	// Arrange
	let union = DelayedUnionQuerySet::new([store.all(), store.all()]).unwrap();

	// Act
	let error =
		DelayedIntersectionQuerySet::from_operands([Operand::query(store.all()), union.into()], ())
			.unwrap_err();

	// Assert
	assert!(error.is_construction());
	assert_eq!(
		error.to_string(),
		"can only pass in query sets to a delayed intersection query set, found a delayed union"
	);
}

#[rstest]
#[tokio::test]
async fn test_distinct_and_update(store: MemoryStore) {
	// Arrange
	let qs = DelayedIntersectionQuerySet::new([store.all(), store.all()]).unwrap();

	// Act
	let distinct = qs.distinct().unwrap();
	let error = qs.update(&UpdateValues::new()).await.unwrap_err();

	// Assert
	assert_eq!(distinct.count().await.unwrap(), 3);
	assert!(error.is_not_supported());
	assert_eq!(
		error.to_string(),
		"update() is not supported on a delayed intersection query set"
	);
}

#[rstest]
#[tokio::test]
async fn test_explain_renders_intersect(store: MemoryStore) {
	// Arrange
	let qs = DelayedIntersectionQuerySet::new([store.all(), store.all()]).unwrap();

	// Act
	let plan = qs.explain().await.unwrap();

	// Assert
	assert!(plan.contains("\nINTERSECT\n"));
}
