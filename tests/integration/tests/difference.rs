//! Delayed difference integration tests

use reinhardt_delayed::prelude::*;
use reinhardt_delayed_integration_tests::{dogs, id_is, ids};
use rstest::*;

#[fixture]
fn store() -> MemoryStore {
	dogs(3)
}

#[rstest]
#[tokio::test]
async fn test_difference_removes_later_components(store: MemoryStore) {
	// Arrange
	let qs = DelayedDifferenceQuerySet::new([store.all(), store.all().filter(&id_is(2))]).unwrap();

	// Act
	let rows = qs.order_by(&["id"]).fetch_all().await.unwrap();

	// Assert
	assert_eq!(ids(&rows), vec![1, 3]);
	assert!(!qs.contains(&store.rows()[1]).await.unwrap());
}

#[rstest]
#[tokio::test]
async fn test_every_later_component_is_subtracted(store: MemoryStore) {
	// Arrange
	let qs = DelayedDifferenceQuerySet::new([
		store.all(),
		store.all().filter(&id_is(1)),
		store.all().filter(&id_is(3)),
	])
	.unwrap();

	// Act
	let rows = qs.fetch_all().await.unwrap();

	// Assert
	assert_eq!(ids(&rows), vec![2]);
}

#[rstest]
#[tokio::test]
async fn test_refinement_reaches_subtracted_components(store: MemoryStore) {
	// Arrange
	let qs = DelayedDifferenceQuerySet::new([store.all(), store.all().filter(&id_is(1))]).unwrap();

	// Act
	// Row 1 is already subtracted; excluding it again changes nothing
	let refined = qs.exclude(id_is(1)).filter(Filter::lte("age", 2));

	// Assert
	assert_eq!(ids(&refined.fetch_all().await.unwrap()), vec![2]);
}

#[rstest]
fn test_nested_difference_is_rejected(store: MemoryStore) {
	// Arrange
	let nested = DelayedDifferenceQuerySet::new([store.all(), store.all()]).unwrap();

	// Act
	let error =
		DelayedDifferenceQuerySet::from_operands([Operand::query(store.all()), nested.into()], ())
			.unwrap_err();

	// Assert
	assert!(matches!(
		error,
		DelayedQueryError::NestedComposition {
			kind: "difference",
			found: "difference"
		}
	));
}

#[rstest]
fn test_empty_components_are_rejected() {
	// Act
	let error = DelayedDifferenceQuerySet::<MemoryQuerySet>::new([]).unwrap_err();

	// Assert
	assert_eq!(
		error.to_string(),
		"a delayed difference query set requires at least one component query"
	);
}

#[rstest]
#[tokio::test]
async fn test_update_is_unsupported(store: MemoryStore) {
	// Arrange
	let qs = DelayedDifferenceQuerySet::new([store.all(), store.all().filter(&id_is(2))]).unwrap();
	let mut values = UpdateValues::new();
	values.insert("name".to_string(), UpdateValue::from("Rover"));

	// Act
	let error = qs.update(&values).await.unwrap_err();

	// Assert
	assert!(error.is_not_supported());
	assert!(store.rows().iter().all(|row| row.value("name") != FilterValue::from("Rover")));
}
