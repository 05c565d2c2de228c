//! Tests for maintenance utilities

use super::*;
use crate::storage::{read_parquet, write_batch_to_parquet};
use crate::Error;
use arrow::array::{Array, ArrayRef, Int64Array, StringArray};
use arrow::record_batch::RecordBatch;
use std::sync::Arc;
use tempfile::TempDir;
use test_case::test_case;

fn trips(ids: Vec<Option<&str>>) -> RecordBatch {
    let seq: Vec<i64> = (0..ids.len() as i64).collect();
    RecordBatch::try_from_iter(vec![
        ("trip_id", Arc::new(StringArray::from(ids)) as ArrayRef),
        ("seq", Arc::new(Int64Array::from(seq)) as ArrayRef),
    ])
    .unwrap()
}

fn seq_values(batch: &RecordBatch) -> Vec<i64> {
    batch
        .column_by_name("seq")
        .unwrap()
        .as_any()
        .downcast_ref::<Int64Array>()
        .unwrap()
        .values()
        .to_vec()
}

// ============================================================================
// Deduplication Tests
// ============================================================================

#[test]
fn test_deduplicate_keeps_first_occurrence() {
    let batch = trips(vec![
        Some("a"),
        Some("b"),
        Some("a"),
        Some("c"),
        Some("b"),
    ]);

    let deduped = deduplicate(&batch, "trip_id").unwrap();

    assert_eq!(deduped.num_rows(), 3);
    assert_eq!(seq_values(&deduped), vec![0, 1, 3]);
}

#[test]
fn test_deduplicate_nulls_are_one_key() {
    let batch = trips(vec![None, Some("a"), None]);
    let deduped = deduplicate(&batch, "trip_id").unwrap();
    assert_eq!(seq_values(&deduped), vec![0, 1]);
}

#[test]
fn test_deduplicate_unknown_key() {
    let err = deduplicate(&trips(vec![Some("a")]), "missing").unwrap_err();
    assert!(matches!(err, Error::Schema { .. }));
}

#[test]
fn test_deduplicate_file_rewrites_only_with_duplicates() {
    let dir = TempDir::new().unwrap();
    let clean = dir.path().join("clean.parquet");
    let dirty = dir.path().join("dirty.parquet");
    write_batch_to_parquet(&clean, &trips(vec![Some("a"), Some("b")]), None).unwrap();
    write_batch_to_parquet(&dirty, &trips(vec![Some("a"), Some("a")]), None).unwrap();
    let clean_before = std::fs::read(&clean).unwrap();

    let report = deduplicate_file(&clean, "trip_id", None).unwrap();
    assert_eq!(report.removed(), 0);
    assert_eq!(std::fs::read(&clean).unwrap(), clean_before);

    let report = deduplicate_file(&dirty, "trip_id", None).unwrap();
    assert_eq!(report.rows_before, 2);
    assert_eq!(report.rows_after, 1);
    assert_eq!(read_parquet(&dirty).unwrap().num_rows(), 1);
}

// ============================================================================
// Split Tests
// ============================================================================

#[test_case(10, 3 => vec![4, 3, 3]; "remainder goes to first outputs")]
#[test_case(9, 3 => vec![3, 3, 3]; "even split")]
#[test_case(2, 4 => vec![1, 1, 0, 0]; "more parts than rows")]
#[test_case(0, 2 => vec![0, 0]; "empty input")]
fn test_split_sizes(total: usize, parts: usize) -> Vec<usize> {
    split_sizes(total, parts)
}

#[test]
fn test_split_sizes_balanced() {
    for total in 0..50 {
        for parts in 1..8 {
            let sizes = split_sizes(total, parts);
            assert_eq!(sizes.iter().sum::<usize>(), total);
            let max = sizes.iter().max().unwrap();
            let min = sizes.iter().min().unwrap();
            assert!(max - min <= 1);
        }
    }
}

#[test]
fn test_split_file_writes_numbered_outputs() {
    let dir = TempDir::new().unwrap();
    let source = dir.path().join("trip_data_2013_6.parquet");
    let ids: Vec<Option<&str>> = vec![Some("a"); 7];
    write_batch_to_parquet(&source, &trips(ids), None).unwrap();

    let outputs = split_file(&source, 3, true, None).unwrap();

    assert_eq!(
        outputs,
        vec![
            dir.path().join("trip_data_2013_6_1.parquet"),
            dir.path().join("trip_data_2013_6_2.parquet"),
            dir.path().join("trip_data_2013_6_3.parquet"),
        ]
    );
    assert!(!source.exists());
    assert_eq!(seq_values(&read_parquet(&outputs[0]).unwrap()), vec![0, 1, 2]);
    assert_eq!(seq_values(&read_parquet(&outputs[1]).unwrap()), vec![3, 4]);
    assert_eq!(seq_values(&read_parquet(&outputs[2]).unwrap()), vec![5, 6]);
}

#[test]
fn test_split_file_rejects_zero_parts() {
    let dir = TempDir::new().unwrap();
    let source = dir.path().join("part.parquet");
    write_batch_to_parquet(&source, &trips(vec![Some("a")]), None).unwrap();

    let err = split_file(&source, 0, false, None).unwrap_err();
    assert!(matches!(err, Error::InvalidConfigValue { .. }));
    assert!(source.exists());
}

// ============================================================================
// Filename Normalization Tests
// ============================================================================

#[test]
fn test_normalize_page_filenames() {
    let dir = TempDir::new().unwrap();
    for name in [
        "trip_data_page_7.json",
        "trip_data_page_42.json",
        "trip_data_page_00043.json",
        "trip_data_page_900.json",
        "notes.txt",
    ] {
        std::fs::write(dir.path().join(name), "[]").unwrap();
    }

    let renamed = normalize_page_filenames(dir.path(), 1, 100, 5).unwrap();

    let mut targets: Vec<String> = renamed
        .iter()
        .map(|r| r.to.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    targets.sort();
    assert_eq!(
        targets,
        vec!["trip_data_page_00007.json", "trip_data_page_00042.json"]
    );
    assert!(dir.path().join("trip_data_page_00043.json").exists());
    assert!(dir.path().join("trip_data_page_900.json").exists());
    assert!(!dir.path().join("trip_data_page_7.json").exists());
}

#[test]
fn test_normalize_never_overwrites() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("trip_data_page_5.json"), "short").unwrap();
    std::fs::write(dir.path().join("trip_data_page_00005.json"), "padded").unwrap();

    let renamed = normalize_page_filenames(dir.path(), 1, 10, 5).unwrap();

    assert!(renamed.is_empty());
    assert_eq!(
        std::fs::read_to_string(dir.path().join("trip_data_page_00005.json")).unwrap(),
        "padded"
    );
    assert!(dir.path().join("trip_data_page_5.json").exists());
}
