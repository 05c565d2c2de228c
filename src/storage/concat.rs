//! Union-of-columns ("diagonal") concatenation

use super::json::merge_types;
use crate::error::{Error, Result};
use crate::schema::conform_array;
use arrow::array::{new_null_array, ArrayRef};
use arrow::compute::{can_cast_types, concat_batches};
use arrow::datatypes::{DataType, Field, Schema, SchemaRef};
use arrow::record_batch::{RecordBatch, RecordBatchOptions};
use std::sync::Arc;

/// Concatenate batches whose column sets may differ.
///
/// The result has every column of every input: the first batch's columns
/// in their order, then columns first seen in later batches. Cells of a
/// column a batch does not have are null. Rows keep input order.
pub fn concat_diagonal(batches: &[RecordBatch]) -> Result<RecordBatch> {
    let schema = union_schema(batches.iter().map(|b| b.schema()))?;

    let mut projected = Vec::with_capacity(batches.len());
    for batch in batches {
        projected.push(project_onto(batch, &schema)?);
    }

    Ok(concat_batches(&schema, &projected)?)
}

/// Union of several schemas, reconciling same-named columns.
///
/// A null-typed column adopts the other side's type and Int64/Float64
/// widen to Float64. Otherwise the later type must be castable to the
/// earlier one, which is kept.
pub fn union_schema(schemas: impl IntoIterator<Item = SchemaRef>) -> Result<SchemaRef> {
    let mut fields: Vec<Field> = Vec::new();

    for schema in schemas {
        for field in schema.fields() {
            match fields.iter_mut().find(|f| f.name() == field.name()) {
                Some(existing) => {
                    let dtype = reconcile(existing.data_type(), field.data_type(), field.name())?;
                    *existing = Field::new(field.name(), dtype, true);
                }
                None => fields.push(Field::new(field.name(), field.data_type().clone(), true)),
            }
        }
    }

    Ok(Arc::new(Schema::new(fields)))
}

fn reconcile(existing: &DataType, incoming: &DataType, name: &str) -> Result<DataType> {
    match (existing, incoming) {
        (a, b) if a == b => Ok(a.clone()),
        (DataType::Null, _)
        | (_, DataType::Null)
        | (DataType::Int64, DataType::Float64)
        | (DataType::Float64, DataType::Int64) => Ok(merge_types(existing, incoming)),
        _ if can_cast_types(incoming, existing) => Ok(existing.clone()),
        _ => Err(Error::schema(
            name,
            format!("cannot union column of type {existing} with {incoming}"),
        )),
    }
}

/// Reorder, null-pad and convert a batch's columns to match `schema`
fn project_onto(batch: &RecordBatch, schema: &SchemaRef) -> Result<RecordBatch> {
    let num_rows = batch.num_rows();
    let source = batch.schema();

    let columns: Vec<ArrayRef> = schema
        .fields()
        .iter()
        .map(|field| match source.index_of(field.name()) {
            Ok(idx) => conform_array(batch.column(idx), field.data_type(), field.name()),
            Err(_) => Ok(new_null_array(field.data_type(), num_rows)),
        })
        .collect::<Result<_>>()?;

    let options = RecordBatchOptions::new().with_row_count(Some(num_rows));
    Ok(RecordBatch::try_new_with_options(
        Arc::clone(schema),
        columns,
        &options,
    )?)
}
