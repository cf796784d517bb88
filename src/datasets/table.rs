//! In-memory split tables and their row-wise concatenation.

use std::path::Path;
use std::sync::Arc;

use arrow::array::ArrayRef;
use arrow::datatypes::{DataType, Field, Schema, SchemaRef};
use arrow::record_batch::{RecordBatch, RecordBatchOptions};

use super::reader::read_batches;
use super::splits::DataFormat;
use crate::error::{PipelineError, Result};

/// One split of a dataset, rows in original order.
#[derive(Debug, Clone)]
pub struct SplitTable {
    name: String,
    schema: SchemaRef,
    batches: Vec<RecordBatch>,
}

impl SplitTable {
    /// Wraps batches that share `schema`.
    ///
    /// # Errors
    ///
    /// [`PipelineError::SchemaMismatch`] if a batch's columns differ from `schema`.
    pub fn new(name: &str, schema: SchemaRef, batches: Vec<RecordBatch>) -> Result<Self> {
        let batches = batches
            .into_iter()
            .map(|batch| align_batch(&schema, &batch, name))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            name: name.into(),
            schema,
            batches,
        })
    }

    /// Reads and stacks several files of one split, in the given order.
    ///
    /// A column that is entirely null in one file takes its type from the other files.
    pub fn from_files<P: AsRef<Path>>(name: &str, files: &[(P, DataFormat)]) -> Result<Self> {
        let parsed = files
            .iter()
            .map(|(path, format)| read_batches(path.as_ref(), *format))
            .collect::<Result<Vec<_>>>()?;

        let schemas: Vec<SchemaRef> = parsed.iter().map(|(schema, _)| schema.clone()).collect();
        let schema = unify_schemas(&schemas).ok_or_else(|| {
            PipelineError::ResourceUnavailable(format!("Split '{name}' has no data files"))
        })?;

        let batches = parsed
            .iter()
            .flat_map(|(_, batches)| batches)
            .map(|batch| align_batch(&schema, batch, name))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            name: name.into(),
            schema,
            batches,
        })
    }

    /// Split name, e.g. `train`.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Column layout shared by every batch.
    pub fn schema(&self) -> &SchemaRef {
        &self.schema
    }

    /// Record batches in row order.
    pub fn batches(&self) -> &[RecordBatch] {
        &self.batches
    }

    /// Total rows across all batches.
    pub fn num_rows(&self) -> usize {
        self.batches.iter().map(RecordBatch::num_rows).sum()
    }

    /// Number of columns.
    pub fn num_columns(&self) -> usize {
        self.schema.fields().len()
    }
}

/// Several splits stacked into one table, first split's rows first.
#[derive(Debug, Clone)]
pub struct MergedTable {
    batch: RecordBatch,
    split_rows: Vec<(String, usize)>,
}

impl MergedTable {
    /// Concatenates `splits` row-wise in the given order.
    ///
    /// Columns of later splits are matched to the first split by name, so column order may
    /// differ between splits; names and data types may not. An all-null column (Arrow type
    /// `Null`) matches any type.
    ///
    /// # Errors
    ///
    /// [`PipelineError::SchemaMismatch`] if any split's columns differ from the first split's,
    /// [`PipelineError::Unexpected`] if `splits` is empty.
    pub fn concat(splits: &[SplitTable]) -> Result<Self> {
        let schemas: Vec<SchemaRef> = splits.iter().map(|s| s.schema().clone()).collect();
        let schema = unify_schemas(&schemas)
            .ok_or_else(|| PipelineError::Unexpected("No splits to concatenate".to_string()))?;

        let mut aligned: Vec<RecordBatch> = Vec::new();
        for split in splits {
            for batch in split.batches() {
                aligned.push(align_batch(&schema, batch, split.name())?);
            }
        }
        let batch = arrow::compute::concat_batches(&schema, &aligned)?;

        let split_rows = splits
            .iter()
            .map(|s| (s.name().to_string(), s.num_rows()))
            .collect();

        Ok(Self { batch, split_rows })
    }

    /// `(rows, columns)`.
    pub fn shape(&self) -> (usize, usize) {
        (self.num_rows(), self.num_columns())
    }

    /// Total rows.
    pub fn num_rows(&self) -> usize {
        self.batch.num_rows()
    }

    /// Number of columns.
    pub fn num_columns(&self) -> usize {
        self.batch.num_columns()
    }

    /// Schema of the stacked table.
    pub fn schema(&self) -> SchemaRef {
        self.batch.schema()
    }

    /// All rows as one record batch.
    pub fn batch(&self) -> &RecordBatch {
        &self.batch
    }

    /// Row count contributed by each split, in stacking order.
    pub fn split_rows(&self) -> &[(String, usize)] {
        &self.split_rows
    }
}

fn describe_columns(schema: &Schema) -> String {
    schema
        .fields()
        .iter()
        .map(|f| format!("{}: {}", f.name(), f.data_type()))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Rebuilds `batch` with `expected`'s column order and types.
///
/// All-null columns are cast to the expected type; any other difference in names or types
/// is a mismatch.
fn align_batch(expected: &SchemaRef, batch: &RecordBatch, split: &str) -> Result<RecordBatch> {
    let actual = batch.schema();
    let mismatch = || {
        PipelineError::SchemaMismatch(format!(
            "Split '{}' has columns [{}], expected [{}]",
            split,
            describe_columns(&actual),
            describe_columns(expected)
        ))
    };

    if actual.fields().len() != expected.fields().len() {
        return Err(mismatch());
    }

    let columns = expected
        .fields()
        .iter()
        .map(|field| {
            let idx = actual.index_of(field.name()).map_err(|_| mismatch())?;
            let column = batch.column(idx);
            match column.data_type() {
                found if found == field.data_type() => Ok(column.clone()),
                DataType::Null => Ok(arrow::compute::cast(column, field.data_type())?),
                _ => Err(mismatch()),
            }
        })
        .collect::<Result<Vec<ArrayRef>>>()?;

    let options = RecordBatchOptions::new().with_row_count(Some(batch.num_rows()));
    Ok(RecordBatch::try_new_with_options(
        expected.clone(),
        columns,
        &options,
    )?)
}

/// Columns of the first schema, matched by name across the rest.
///
/// A `Null`-typed column takes the first concrete type any schema gives it. A column is
/// nullable if it is nullable or all-null anywhere.
fn unify_schemas(schemas: &[SchemaRef]) -> Option<SchemaRef> {
    let first = schemas.first()?;
    let fields: Vec<Field> = first
        .fields()
        .iter()
        .map(|field| {
            let others: Vec<&Field> = schemas
                .iter()
                .filter_map(|s| s.field_with_name(field.name()).ok())
                .collect();
            let data_type = others
                .iter()
                .map(|f| f.data_type())
                .find(|t| **t != DataType::Null)
                .unwrap_or(field.data_type())
                .clone();
            let nullable = others
                .iter()
                .any(|f| f.is_nullable() || *f.data_type() == DataType::Null);
            Field::new(field.name(), data_type, nullable)
        })
        .collect();
    Some(Arc::new(Schema::new(fields)))
}
