//! Integration test: Seeded train/test splitting

use std::collections::HashSet;
use tabula::data::{Table, Value};
use tabula::split::{shuffled_indices, split, Lcg, SplitConfig};
use tabula::TabulaError;

fn numbered(n: usize) -> Table {
    let rows = (0..n).map(|i| vec![Value::Number(i as f64)]).collect();
    Table::new(vec!["id".into()], rows).unwrap()
}

fn ids(table: &Table) -> Vec<usize> {
    (0..table.n_rows())
        .map(|i| table.get(i, "id").and_then(Value::as_f64).unwrap() as usize)
        .collect()
}

#[test]
fn test_lcg_sequence_is_fixed() {
    let mut a = Lcg::new(42);
    let mut b = Lcg::new(42);
    for _ in 0..100 {
        assert_eq!(a.next_u64(), b.next_u64());
    }
    let r = Lcg::new(7).next_f64();
    assert!((0.0..1.0).contains(&r));
}

#[test]
fn test_split_is_a_partition() {
    let s = split(&numbered(100), 0.2, 42).unwrap();
    assert_eq!(s.train.n_rows(), 80);
    assert_eq!(s.test.n_rows(), 20);

    let all: HashSet<usize> = ids(&s.train).into_iter().chain(ids(&s.test)).collect();
    assert_eq!(all.len(), 100);
    assert_eq!(ids(&s.train), s.train_indices);
    assert_eq!(ids(&s.test), s.test_indices);
}

#[test]
fn test_same_seed_same_split() {
    let table = numbered(57);
    let a = split(&table, 0.3, 1234).unwrap();
    let b = split(&table, 0.3, 1234).unwrap();
    assert_eq!(a.train, b.train);
    assert_eq!(a.test, b.test);

    let c = split(&table, 0.3, 1235).unwrap();
    assert_ne!(a.train_indices, c.train_indices);
}

#[test]
fn test_shuffle_is_a_permutation() {
    let mut order = shuffled_indices(31, 9);
    order.sort_unstable();
    assert_eq!(order, (0..31).collect::<Vec<_>>());
}

#[test]
fn test_boundary_uses_floor() {
    let s = split(&numbered(10), 0.25, 42).unwrap();
    // floor(10 * 0.75) = 7
    assert_eq!(s.train.n_rows(), 7);
    assert_eq!(s.test.n_rows(), 3);
}

#[test]
fn test_invalid_and_degenerate_splits() {
    for f in [0.0, 1.0, -0.1, f64::NAN] {
        assert!(matches!(
            split(&numbered(10), f, 42),
            Err(TabulaError::InvalidParameter { .. })
        ));
    }
    assert!(matches!(
        split(&numbered(1), 0.5, 42),
        Err(TabulaError::DegenerateSplit { .. })
    ));
    assert!(SplitConfig::new(0.5, 0).validate().is_ok());
}

#[test]
fn test_summary_previews_are_capped() {
    let summary = split(&numbered(100), 0.2, 42).unwrap().summary();
    assert_eq!(summary.train_count, 80);
    assert_eq!(summary.test_count, 20);
    assert_eq!(summary.train_preview.n_rows(), 5);
    assert_eq!(summary.test_preview.n_rows(), 5);
}
