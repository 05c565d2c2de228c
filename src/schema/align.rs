//! Column alignment
//!
//! Projects an arbitrary batch onto a canonical schema: exactly the
//! canonical columns, in canonical order, each with its declared type.

use super::types::CanonicalSchema;
use crate::error::{Error, Result};
use arrow::array::{new_null_array, Array, ArrayRef, ListArray, StructArray};
use arrow::compute::{can_cast_types, cast_with_options, CastOptions};
use arrow::datatypes::DataType;
use arrow::record_batch::{RecordBatch, RecordBatchOptions};
use std::sync::Arc;

/// Align a batch to the canonical schema.
///
/// Missing canonical columns are synthesized as nulls of the declared type.
/// Columns not in the canonical schema are dropped. Present columns are
/// converted to the declared type; a value that cannot be converted fails
/// the whole call with a schema error naming the column.
pub fn align(batch: &RecordBatch, schema: &CanonicalSchema) -> Result<RecordBatch> {
    let num_rows = batch.num_rows();
    let source = batch.schema();

    let mut columns: Vec<ArrayRef> = Vec::with_capacity(schema.len());
    for field in schema.fields() {
        let target = field.semantic_type.data_type();
        let column = match source.index_of(&field.name) {
            Ok(idx) => conform_array(batch.column(idx), &target, &field.name)?,
            Err(_) => new_null_array(&target, num_rows),
        };
        columns.push(column);
    }

    let options = RecordBatchOptions::new().with_row_count(Some(num_rows));
    RecordBatch::try_new_with_options(schema.arrow_schema(), columns, &options).map_err(Into::into)
}

/// Names of the batch columns that alignment would drop
pub fn dropped_columns(batch: &RecordBatch, schema: &CanonicalSchema) -> Vec<String> {
    batch
        .schema()
        .fields()
        .iter()
        .filter(|f| schema.field(f.name()).is_none())
        .map(|f| f.name().clone())
        .collect()
}

/// Names of canonical columns absent from the batch
pub fn missing_columns<'a>(batch: &RecordBatch, schema: &'a CanonicalSchema) -> Vec<&'a str> {
    let source = batch.schema();
    schema
        .fields()
        .iter()
        .filter(|f| source.index_of(&f.name).is_err())
        .map(|f| f.name.as_str())
        .collect()
}

/// Convert one array to the target type.
///
/// Structs are matched child-by-child by name, lists element-wise; anything
/// else goes through a strict Arrow cast. `path` names the column in errors.
pub fn conform_array(array: &ArrayRef, target: &DataType, path: &str) -> Result<ArrayRef> {
    let source = array.data_type();
    if source == target {
        return Ok(Arc::clone(array));
    }
    if *source == DataType::Null {
        return Ok(new_null_array(target, array.len()));
    }

    match (source, target) {
        (DataType::Struct(_), DataType::Struct(target_fields)) => {
            let structs = array
                .as_any()
                .downcast_ref::<StructArray>()
                .ok_or_else(|| Error::schema(path, "expected a struct array"))?;

            let mut children = Vec::with_capacity(target_fields.len());
            for child in target_fields {
                let child_path = format!("{path}.{}", child.name());
                let aligned = match structs.column_by_name(child.name()) {
                    Some(existing) => conform_array(existing, child.data_type(), &child_path)?,
                    None => new_null_array(child.data_type(), structs.len()),
                };
                children.push(aligned);
            }

            let rebuilt =
                StructArray::try_new(target_fields.clone(), children, structs.nulls().cloned())
                    .map_err(|e| Error::schema(path, e.to_string()))?;
            Ok(Arc::new(rebuilt))
        }

        (DataType::List(_), DataType::List(target_item)) => {
            let lists = array
                .as_any()
                .downcast_ref::<ListArray>()
                .ok_or_else(|| Error::schema(path, "expected a list array"))?;

            let values = conform_array(lists.values(), target_item.data_type(), path)?;
            let rebuilt = ListArray::try_new(
                Arc::clone(target_item),
                lists.offsets().clone(),
                values,
                lists.nulls().cloned(),
            )
            .map_err(|e| Error::schema(path, e.to_string()))?;
            Ok(Arc::new(rebuilt))
        }

        _ if can_cast_types(source, target) => {
            let options = CastOptions {
                safe: false,
                ..Default::default()
            };
            cast_with_options(array, target, &options).map_err(|e| {
                Error::schema(path, format!("cannot convert {source} to {target}: {e}"))
            })
        }

        _ => Err(Error::schema(
            path,
            format!("stored type {source} is incompatible with {target}"),
        )),
    }
}
