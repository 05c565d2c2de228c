//! Tests for the ingestion orchestrator

use super::*;
use crate::partition::{PartitionStore, PartitionTarget, TemporalPartitioner};
use crate::schema::CanonicalSchema;
use crate::Error;
use serde_json::json;
use std::path::PathBuf;
use tempfile::TempDir;

struct Fixture {
    dir: TempDir,
    ingestor: Ingestor,
    partitioner: TemporalPartitioner,
}

impl Fixture {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let schema = CanonicalSchema::trip_events();
        let store = PartitionStore::new(dir.path().join("parquet"));
        let ingestor = Ingestor::new(schema.clone(), store)
            .with_run_log(RunLog::new(dir.path().join("json_processing.log.txt")));
        Self {
            dir,
            ingestor,
            partitioner: TemporalPartitioner::new(&schema),
        }
    }

    fn write_batch(&self, page: u64, records: serde_json::Value) -> PathBuf {
        let path = self.dir.path().join(page_file_name(page));
        std::fs::write(&path, serde_json::to_vec(&records).unwrap()).unwrap();
        path
    }

    fn rows_in(&self, target: PartitionTarget) -> usize {
        self.ingestor.store().read(target).unwrap().num_rows()
    }

    fn run_log(&self) -> String {
        std::fs::read_to_string(self.dir.path().join("json_processing.log.txt")).unwrap()
    }
}

fn trips() -> serde_json::Value {
    json!([
        {"trip_id": "a", "trip_start_timestamp": "2024-01-02T08:00:00.000", "fare": "10.5"},
        {"trip_id": "b", "trip_start_timestamp": "2024-02-10T09:30:00.000", "fare": "8"},
        {"trip_id": "c", "trip_start_timestamp": "2024-01-20T17:45:00.000", "fare": "22.25"}
    ])
}

// ============================================================================
// Single Batch Tests
// ============================================================================

#[test]
fn test_ingest_routes_rows_by_month() {
    let fx = Fixture::new();
    let path = fx.write_batch(1, trips());

    let report = fx.ingestor.ingest(&path, Some(&fx.partitioner)).unwrap();

    assert_eq!(report.rows, 3);
    assert_eq!(report.status(), BatchStatus::Ok);
    assert_eq!(report.rows_written(), 3);
    let targets: Vec<PartitionTarget> = report.partitions.iter().map(|p| p.target).collect();
    assert_eq!(
        targets,
        vec![
            PartitionTarget::month(2024, 1).unwrap(),
            PartitionTarget::month(2024, 2).unwrap(),
        ]
    );
    assert_eq!(fx.rows_in(PartitionTarget::month(2024, 1).unwrap()), 2);
    assert_eq!(fx.rows_in(PartitionTarget::month(2024, 2).unwrap()), 1);

    assert!(fx.run_log().contains("| Status: ok"));
}

#[test]
fn test_ingest_without_transform_goes_to_unparsed() {
    let fx = Fixture::new();
    let path = fx.write_batch(1, trips());

    let report = fx.ingestor.ingest(&path, None).unwrap();

    assert_eq!(report.partitions.len(), 1);
    assert_eq!(report.partitions[0].target, PartitionTarget::Unparsed);
    assert_eq!(fx.rows_in(PartitionTarget::Unparsed), 3);
}

#[test]
fn test_ingest_splits_unparsed_rows() {
    let fx = Fixture::new();
    let path = fx.write_batch(
        1,
        json!([
            {"trip_id": "a", "trip_start_timestamp": "2024-03-01T00:00:00"},
            {"trip_id": "b", "trip_start_timestamp": "garbage"}
        ]),
    );

    let report = fx.ingestor.ingest(&path, Some(&fx.partitioner)).unwrap();

    assert_eq!(report.status(), BatchStatus::Ok);
    assert_eq!(fx.rows_in(PartitionTarget::month(2024, 3).unwrap()), 1);
    assert_eq!(fx.rows_in(PartitionTarget::Unparsed), 1);
}

#[test]
fn test_malformed_batch_fails_whole_batch() {
    let fx = Fixture::new();
    let path = fx.dir.path().join(page_file_name(1));
    std::fs::write(&path, "{ this is not json").unwrap();

    let err = fx.ingestor.ingest(&path, Some(&fx.partitioner)).unwrap_err();

    assert!(matches!(err, Error::BatchRead { .. }));
    assert!(fx.run_log().contains("| Status: failed"));
    assert!(fx.ingestor.store().list_partitions().unwrap().is_empty());
}

#[test]
fn test_schema_conflict_fails_whole_batch() {
    let fx = Fixture::new();
    let path = fx.write_batch(
        1,
        json!([{"trip_id": "a", "trip_start_timestamp": "2024-01-01T00:00:00", "fare": "free"}]),
    );

    let err = fx.ingestor.ingest(&path, Some(&fx.partitioner)).unwrap_err();
    assert!(matches!(err, Error::Schema { .. }));
}

#[test]
fn test_corrupt_partition_is_isolated() {
    let fx = Fixture::new();
    let store_dir = fx.ingestor.store().dir().to_path_buf();
    std::fs::create_dir_all(&store_dir).unwrap();
    let jan = PartitionTarget::month(2024, 1).unwrap();
    std::fs::write(jan.path_in(&store_dir), b"corrupt").unwrap();

    let path = fx.write_batch(1, trips());
    let report = fx.ingestor.ingest(&path, Some(&fx.partitioner)).unwrap();

    assert_eq!(report.status(), BatchStatus::Partial);
    let failed: Vec<_> = report.failed_partitions().collect();
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].target, jan);
    assert!(matches!(
        failed[0].outcome,
        Err(Error::PartitionCorrupt { .. })
    ));
    assert_eq!(fx.rows_in(PartitionTarget::month(2024, 2).unwrap()), 1);
    assert!(fx.run_log().contains("| Status: partial"));
}

// ============================================================================
// Multi Batch Tests
// ============================================================================

#[test]
fn test_ingest_all_continues_past_failures() {
    let fx = Fixture::new();
    let first = fx.write_batch(1, trips());
    let broken = fx.dir.path().join(page_file_name(2));
    std::fs::write(&broken, "[1, 2, 3]").unwrap();
    let third = fx.write_batch(
        3,
        json!([{"trip_id": "d", "trip_start_timestamp": "2024-01-15T12:00:00.000"}]),
    );

    let summary = fx
        .ingestor
        .ingest_all([&first, &broken, &third], Some(&fx.partitioner));

    assert_eq!(summary.succeeded.len(), 2);
    assert_eq!(summary.failed.len(), 1);
    assert_eq!(summary.failed[0].0, broken);
    assert_eq!(summary.rows_written(), 4);
    assert!(!summary.is_clean());
    assert_eq!(fx.rows_in(PartitionTarget::month(2024, 1).unwrap()), 3);
    assert_eq!(fx.run_log().lines().count(), 3);
}

#[test]
fn test_batch_paths_inclusive_and_skips_missing() {
    let fx = Fixture::new();
    fx.write_batch(1, json!([]));
    fx.write_batch(2, json!([]));
    fx.write_batch(4, json!([]));

    let paths = batch_paths(fx.dir.path(), 1, 4);

    assert_eq!(
        paths,
        vec![
            fx.dir.path().join("trip_data_page_00001.json"),
            fx.dir.path().join("trip_data_page_00002.json"),
            fx.dir.path().join("trip_data_page_00004.json"),
        ]
    );
    assert!(batch_paths(fx.dir.path(), 5, 4).is_empty());
}
