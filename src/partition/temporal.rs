//! Temporal partitioning
//!
//! Derives the (year, month) partition key of each record from its text
//! start timestamp and groups a batch by the keys present.

use super::types::{BatchTransform, PartitionKey};
use crate::error::{Error, Result};
use crate::schema::CanonicalSchema;
use arrow::array::{
    Array, ArrayRef, BooleanArray, StringArray, TimestampMicrosecondArray, UInt16Array,
    UInt8Array,
};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use chrono::{Datelike, NaiveDateTime};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, warn};

/// Pattern the API's timestamps follow; the fractional part is optional
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

/// Parsed start timestamp column added by the partitioner
pub const START_DATE_COLUMN: &str = "trip_start_date";

/// Parsed end timestamp column added by the partitioner
pub const END_DATE_COLUMN: &str = "trip_end_date";

/// Parse one API timestamp
pub fn parse_timestamp(value: &str) -> Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value.trim(), TIMESTAMP_FORMAT)
        .map_err(|e| Error::timestamp_parse(value, e.to_string()))
}

/// Adds parsed timestamps and the partition year/month to aligned batches.
///
/// Rows whose start timestamp is missing or malformed get null year and
/// month; they are routed to the unparsed partition instead of failing
/// the batch.
#[derive(Debug, Clone)]
pub struct TemporalPartitioner {
    schema: CanonicalSchema,
}

impl TemporalPartitioner {
    /// Create a partitioner reading column names from the canonical schema
    pub fn new(schema: &CanonicalSchema) -> Self {
        Self {
            schema: schema.clone(),
        }
    }

    /// Derive `trip_start_date`, `trip_end_date`, year and month columns.
    ///
    /// Year and month replace the existing columns of the same name in
    /// place; the date columns are appended (or replaced if present).
    pub fn derive_partition_fields(&self, batch: &RecordBatch) -> Result<RecordBatch> {
        let (starts, start_failures) = parse_column(batch, self.schema.start_timestamp())?;
        let (ends, end_failures) = parse_column(batch, self.schema.end_timestamp())?;

        if start_failures > 0 || end_failures > 0 {
            warn!(
                start_failures,
                end_failures,
                rows = batch.num_rows(),
                "Unparseable timestamps; affected rows get null partition fields"
            );
        }

        let years: UInt16Array = starts
            .iter()
            .map(|dt| dt.and_then(|dt| u16::try_from(dt.year()).ok()))
            .collect();
        let months: UInt8Array = starts
            .iter()
            .map(|dt| dt.and_then(|dt| u8::try_from(dt.month()).ok()))
            .collect();

        let mut fields: Vec<Field> = batch
            .schema()
            .fields()
            .iter()
            .map(|f| f.as_ref().clone())
            .collect();
        let mut columns: Vec<ArrayRef> = batch.columns().to_vec();

        set_column(
            &mut fields,
            &mut columns,
            self.schema.year_column(),
            Arc::new(years),
        );
        set_column(
            &mut fields,
            &mut columns,
            self.schema.month_column(),
            Arc::new(months),
        );
        set_column(
            &mut fields,
            &mut columns,
            START_DATE_COLUMN,
            Arc::new(to_timestamp_array(&starts)),
        );
        set_column(
            &mut fields,
            &mut columns,
            END_DATE_COLUMN,
            Arc::new(to_timestamp_array(&ends)),
        );

        Ok(RecordBatch::try_new(
            Arc::new(Schema::new(fields)),
            columns,
        )?)
    }
}

impl BatchTransform for TemporalPartitioner {
    fn apply(&self, batch: RecordBatch) -> Result<RecordBatch> {
        self.derive_partition_fields(&batch)
    }

    fn name(&self) -> &str {
        "temporal"
    }
}

/// Parse a text timestamp column, returning parsed values and failure count.
///
/// Null cells are not failures.
fn parse_column(batch: &RecordBatch, name: &str) -> Result<(Vec<Option<NaiveDateTime>>, usize)> {
    let column = batch
        .column_by_name(name)
        .ok_or_else(|| Error::schema(name, "timestamp column missing"))?;
    let strings = column
        .as_any()
        .downcast_ref::<StringArray>()
        .ok_or_else(|| {
            Error::schema(
                name,
                format!("expected text timestamps, found {}", column.data_type()),
            )
        })?;

    let mut failures = 0;
    let parsed = strings
        .iter()
        .map(|value| {
            let value = value?;
            match parse_timestamp(value) {
                Ok(dt) => Some(dt),
                Err(e) => {
                    if failures == 0 {
                        debug!(column = name, error = %e, "First unparseable timestamp");
                    }
                    failures += 1;
                    None
                }
            }
        })
        .collect();

    Ok((parsed, failures))
}

fn to_timestamp_array(values: &[Option<NaiveDateTime>]) -> TimestampMicrosecondArray {
    values
        .iter()
        .map(|dt| dt.map(|dt| dt.and_utc().timestamp_micros()))
        .collect()
}

fn set_column(fields: &mut Vec<Field>, columns: &mut Vec<ArrayRef>, name: &str, array: ArrayRef) {
    let field = Field::new(name, array.data_type().clone(), true);
    match fields.iter().position(|f| f.name() == name) {
        Some(idx) => {
            fields[idx] = field;
            columns[idx] = array;
        }
        None => {
            fields.push(field);
            columns.push(array);
        }
    }
}

// ============================================================================
// Grouping
// ============================================================================

/// Typed view over a batch's year and month columns
struct KeyColumns {
    years: UInt16Array,
    months: UInt8Array,
}

impl KeyColumns {
    fn from_batch(batch: &RecordBatch, schema: &CanonicalSchema) -> Result<Self> {
        let years = key_column(batch, schema.year_column(), &DataType::UInt16)?;
        let months = key_column(batch, schema.month_column(), &DataType::UInt8)?;
        Ok(Self {
            years: years
                .as_any()
                .downcast_ref::<UInt16Array>()
                .cloned()
                .ok_or_else(|| Error::schema(schema.year_column(), "expected uint16"))?,
            months: months
                .as_any()
                .downcast_ref::<UInt8Array>()
                .cloned()
                .ok_or_else(|| Error::schema(schema.month_column(), "expected uint8"))?,
        })
    }

    fn key(&self, row: usize) -> Option<PartitionKey> {
        if self.years.is_null(row) || self.months.is_null(row) {
            return None;
        }
        PartitionKey::new(self.years.value(row), self.months.value(row)).ok()
    }

    fn len(&self) -> usize {
        self.years.len()
    }
}

fn key_column(batch: &RecordBatch, name: &str, expected: &DataType) -> Result<ArrayRef> {
    let column = batch
        .column_by_name(name)
        .ok_or_else(|| Error::schema(name, "partition column missing"))?;
    crate::schema::conform_array(column, expected, name)
}

/// Distinct partition keys present in the batch, in first-seen row order.
///
/// Rows without a valid key are not represented; see [`unparsed_mask`].
pub fn partition_keys(batch: &RecordBatch, schema: &CanonicalSchema) -> Result<Vec<PartitionKey>> {
    let keys = KeyColumns::from_batch(batch, schema)?;
    let mut seen = HashSet::new();
    let mut ordered = Vec::new();
    for row in 0..keys.len() {
        if let Some(key) = keys.key(row) {
            if seen.insert(key) {
                ordered.push(key);
            }
        }
    }
    Ok(ordered)
}

/// Row mask selecting the rows of one partition key
pub fn key_mask(
    batch: &RecordBatch,
    schema: &CanonicalSchema,
    key: PartitionKey,
) -> Result<BooleanArray> {
    let keys = KeyColumns::from_batch(batch, schema)?;
    Ok((0..keys.len())
        .map(|row| Some(keys.key(row) == Some(key)))
        .collect())
}

/// Row mask selecting rows without a valid partition key
pub fn unparsed_mask(batch: &RecordBatch, schema: &CanonicalSchema) -> Result<BooleanArray> {
    let keys = KeyColumns::from_batch(batch, schema)?;
    Ok((0..keys.len())
        .map(|row| Some(keys.key(row).is_none()))
        .collect())
}
