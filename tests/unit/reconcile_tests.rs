//! Unit tests for the reconciler's public API

use crate::common::dataset;
use stockrecon::reconcile::{ColumnPolicy, DuplicateKeyPolicy};
use stockrecon::{reconcile, reconcile_by_keys, Key, ReconError, ReconcileOptions, Side};

fn keys_of<'a>(rows: impl Iterator<Item = &'a Key>) -> Vec<Vec<String>> {
    rows.map(|k| k.values().to_vec()).collect()
}

#[test]
fn test_composite_key_uses_key_column_order() {
    let v1 = dataset(Side::Old, &["loc", "item", "qty"], &[&["MAIN", "A", "1"]]);
    let v2 = dataset(Side::New, &["item", "loc", "qty"], &[&["A", "MAIN", "1"]]);

    let result = reconcile_by_keys(&v1, &v2, &["item", "loc"]).unwrap();
    assert_eq!(result.summary().count_identical, 1);
    assert_eq!(
        keys_of(result.matched_identical.iter().map(|r| &r.key)),
        vec![vec!["A".to_string(), "MAIN".to_string()]]
    );
}

#[test]
fn test_composite_key_does_not_collide_on_concatenation() {
    // "ab"+"c" and "a"+"bc" must stay distinct keys
    let v1 = dataset(Side::Old, &["x", "y", "qty"], &[&["ab", "c", "1"]]);
    let v2 = dataset(Side::New, &["x", "y", "qty"], &[&["a", "bc", "1"]]);

    let result = reconcile_by_keys(&v1, &v2, &["x", "y"]).unwrap();
    assert_eq!(result.summary().count_only_old, 1);
    assert_eq!(result.summary().count_only_new, 1);
    assert_eq!(result.summary().count_identical, 0);
}

#[test]
fn test_matched_rows_follow_v1_order() {
    let v1 = dataset(Side::Old, &["k", "v"], &[&["3", "a"], &["1", "b"], &["2", "c"]]);
    let v2 = dataset(Side::New, &["k", "v"], &[&["1", "b"], &["2", "x"], &["3", "a"]]);

    let result = reconcile_by_keys(&v1, &v2, &["k"]).unwrap();
    assert_eq!(
        keys_of(result.matched_identical.iter().map(|r| &r.key)),
        vec![vec!["3".to_string()], vec!["1".to_string()]]
    );
    assert_eq!(
        keys_of(result.matched_differing.iter().map(|r| &r.key)),
        vec![vec!["2".to_string()]]
    );
}

#[test]
fn test_only_sets_follow_their_own_order() {
    let v1 = dataset(Side::Old, &["k"], &[&["9"], &["1"], &["5"]]);
    let v2 = dataset(Side::New, &["k"], &[&["8"], &["1"], &["2"]]);

    let result = reconcile_by_keys(&v1, &v2, &["k"]).unwrap();
    assert_eq!(
        keys_of(result.only_in_old.iter().map(|r| &r.key)),
        vec![vec!["9".to_string()], vec!["5".to_string()]]
    );
    assert_eq!(
        keys_of(result.only_in_new.iter().map(|r| &r.key)),
        vec![vec!["8".to_string()], vec!["2".to_string()]]
    );
}

#[test]
fn test_key_only_schema_is_identical_when_matched() {
    let v1 = dataset(Side::Old, &["k"], &[&["1"]]);
    let v2 = dataset(Side::New, &["k"], &[&["1"]]);

    let result = reconcile_by_keys(&v1, &v2, &["k"]).unwrap();
    assert!(result.compared_columns.is_empty());
    assert_eq!(result.summary().count_identical, 1);
}

#[test]
fn test_empty_values_compare_equal() {
    let v1 = dataset(Side::Old, &["k", "note"], &[&["1", ""]]);
    let v2 = dataset(Side::New, &["k", "note"], &[&["1", ""]]);

    let result = reconcile_by_keys(&v1, &v2, &["k"]).unwrap();
    assert_eq!(result.summary().count_identical, 1);
}

#[test]
fn test_empty_key_value_is_a_valid_key() {
    let v1 = dataset(Side::Old, &["k", "qty"], &[&["", "1"]]);
    let v2 = dataset(Side::New, &["k", "qty"], &[&["", "2"]]);

    let result = reconcile_by_keys(&v1, &v2, &["k"]).unwrap();
    assert_eq!(result.summary().count_differing, 1);
}

#[test]
fn test_duplicate_in_new_dataset_reports_v2() {
    let v1 = dataset(Side::Old, &["k"], &[&["1"]]);
    let v2 = dataset(Side::New, &["k"], &[&["1"], &["2"], &["1"]]);

    let err = reconcile_by_keys(&v1, &v2, &["k"]).unwrap_err();
    assert_eq!(err.to_string(), "Duplicate key (1) in v2 dataset");
}

#[test]
fn test_duplicate_check_uses_full_composite_key() {
    let v1 = dataset(
        Side::Old,
        &["item", "loc"],
        &[&["A", "MAIN"], &["A", "EAST"]],
    );
    let v2 = dataset(Side::New, &["item", "loc"], &[&["A", "MAIN"]]);

    let result = reconcile_by_keys(&v1, &v2, &["item", "loc"]).unwrap();
    assert_eq!(result.summary().count_identical, 1);
    assert_eq!(result.summary().count_only_old, 1);

    let err = reconcile_by_keys(&v1, &v2, &["item"]).unwrap_err();
    assert!(matches!(err, ReconError::DuplicateKey { side: Side::Old, .. }));
}

#[test]
fn test_missing_key_column_checked_before_duplicates() {
    let v1 = dataset(Side::Old, &["k"], &[&["1"], &["1"]]);
    let v2 = dataset(Side::New, &["other"], &[]);

    let err = reconcile_by_keys(&v1, &v2, &["k"]).unwrap_err();
    assert!(matches!(err, ReconError::MissingKeyColumn { side: Side::New, .. }));
}

#[test]
fn test_strict_policy_checked_before_duplicates() {
    let v1 = dataset(Side::Old, &["k", "a"], &[&["1", "x"], &["1", "y"]]);
    let v2 = dataset(Side::New, &["k", "b"], &[]);

    let options = ReconcileOptions::new(vec!["k".to_string()])
        .with_column_policy(ColumnPolicy::Strict);
    let err = reconcile(&v1, &v2, &options).unwrap_err();
    assert!(matches!(err, ReconError::SchemaMismatch { .. }));
}

#[test]
fn test_keep_policies_apply_to_both_sides() {
    let v1 = dataset(Side::Old, &["k", "v"], &[&["1", "a"], &["1", "b"]]);
    let v2 = dataset(Side::New, &["k", "v"], &[&["1", "b"], &["1", "a"]]);

    let first = ReconcileOptions::new(vec!["k".to_string()])
        .with_duplicates(DuplicateKeyPolicy::KeepFirst);
    let result = reconcile(&v1, &v2, &first).unwrap();
    assert_eq!(result.matched_differing[0].old.values(), &["1".to_string(), "a".to_string()]);
    assert_eq!(result.matched_differing[0].new.values(), &["1".to_string(), "b".to_string()]);

    let last = ReconcileOptions::new(vec!["k".to_string()])
        .with_duplicates(DuplicateKeyPolicy::KeepLast);
    let result = reconcile(&v1, &v2, &last).unwrap();
    assert_eq!(result.matched_differing[0].old.get(1), Some("b"));
    assert_eq!(result.matched_differing[0].new.get(1), Some("a"));
}

#[test]
fn test_result_records_schemas() {
    let v1 = dataset(Side::Old, &["k", "a"], &[]);
    let v2 = dataset(Side::New, &["k", "b", "a"], &[]);

    let result = reconcile_by_keys(&v1, &v2, &["k"]).unwrap();
    assert_eq!(result.key_columns, vec!["k"]);
    assert_eq!(result.old_columns, vec!["k", "a"]);
    assert_eq!(result.new_columns, vec!["k", "b", "a"]);
    assert_eq!(result.compared_columns, vec!["a", "b"]);
}
