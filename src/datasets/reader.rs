//! Parses split files into Arrow record batches.

use std::fs::File;
use std::io::{BufRead, BufReader, Read, Seek};
use std::path::Path;
use std::sync::Arc;

use arrow::datatypes::{Schema, SchemaRef};
use arrow::error::ArrowError;
use arrow::record_batch::RecordBatch;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::{Map, Value};

use super::splits::DataFormat;
use crate::error::{PipelineError, Result};

/// Reads every row of `path`, in file order.
pub fn read_batches(path: &Path, format: DataFormat) -> Result<(SchemaRef, Vec<RecordBatch>)> {
    let open = || {
        File::open(path).map_err(|e| {
            PipelineError::Io(format!("Failed to open '{}': {}", path.display(), e))
        })
    };
    let parse_err = |e: String| {
        PipelineError::Unexpected(format!(
            "Failed to parse {:?} file '{}': {}",
            format,
            path.display(),
            e
        ))
    };

    let (schema, batches) = match format {
        DataFormat::Parquet => {
            let builder = ParquetRecordBatchReaderBuilder::try_new(open()?)
                .map_err(|e| parse_err(e.to_string()))?;
            let schema = builder.schema().clone();
            let reader = builder.build().map_err(|e| parse_err(e.to_string()))?;
            let batches = reader
                .collect::<std::result::Result<Vec<_>, ArrowError>>()
                .map_err(|e| parse_err(e.to_string()))?;
            (schema, batches)
        }
        DataFormat::JsonLines => read_json_lines(open()?, open()?).map_err(parse_err)?,
        DataFormat::Json => {
            let mut file = open()?;
            if starts_with_array(&mut file)? {
                read_json_array(file).map_err(parse_err)?
            } else {
                read_json_lines(file, open()?).map_err(parse_err)?
            }
        }
        DataFormat::Csv => {
            let mut file = open()?;
            let (schema, _) = arrow::csv::reader::Format::default()
                .with_header(true)
                .infer_schema(&mut file, None)
                .map_err(|e| parse_err(e.to_string()))?;
            file.rewind()?;
            let schema = Arc::new(schema);
            let reader = arrow::csv::ReaderBuilder::new(schema.clone())
                .with_header(true)
                .build(file)
                .map_err(|e| parse_err(e.to_string()))?;
            let batches = reader
                .collect::<std::result::Result<Vec<_>, ArrowError>>()
                .map_err(|e| parse_err(e.to_string()))?;
            (schema, batches)
        }
    };

    tracing::debug!(
        path = %path.display(),
        rows = batches.iter().map(RecordBatch::num_rows).sum::<usize>(),
        "split file parsed"
    );
    Ok((schema, batches))
}

type Parsed = (SchemaRef, Vec<RecordBatch>);

/// Rows decoded per record batch for JSON arrays.
const JSON_BATCH_SIZE: usize = 1024;

/// Newline-delimited objects. `infer` and `data` are two handles on the same file.
fn read_json_lines(infer: File, data: File) -> std::result::Result<Parsed, String> {
    let mut infer = BufReader::new(infer);
    let first = first_record(&mut infer)?;
    infer.rewind().map_err(|e| e.to_string())?;

    let (inferred, _) =
        arrow::json::reader::infer_json_schema(infer, None).map_err(|e| e.to_string())?;
    let schema = Arc::new(in_key_order(inferred, first.as_ref()));
    let batches = arrow::json::ReaderBuilder::new(schema.clone())
        .build(BufReader::new(data))
        .map_err(|e| e.to_string())?
        .collect::<std::result::Result<Vec<_>, ArrowError>>()
        .map_err(|e| e.to_string())?;
    Ok((schema, batches))
}

/// A single top-level array of objects.
fn read_json_array(file: File) -> std::result::Result<Parsed, String> {
    let rows: Vec<Value> =
        serde_json::from_reader(BufReader::new(file)).map_err(|e| e.to_string())?;

    let inferred = arrow::json::reader::infer_json_schema_from_iterator(rows.iter().map(Ok))
        .map_err(|e| e.to_string())?;
    let first = rows.first().and_then(Value::as_object);
    let schema = Arc::new(in_key_order(inferred, first));

    let mut decoder = arrow::json::ReaderBuilder::new(schema.clone())
        .with_batch_size(JSON_BATCH_SIZE)
        .build_decoder()
        .map_err(|e| e.to_string())?;
    let mut batches = Vec::new();
    for chunk in rows.chunks(JSON_BATCH_SIZE) {
        decoder.serialize(chunk).map_err(|e| e.to_string())?;
        if let Some(batch) = decoder.flush().map_err(|e| e.to_string())? {
            batches.push(batch);
        }
    }
    Ok((schema, batches))
}

/// Whether the first non-whitespace byte is `[`. Leaves the file rewound.
fn starts_with_array(file: &mut File) -> Result<bool> {
    let mut head = [0u8; 256];
    let mut found = None;
    loop {
        let n = file.read(&mut head)?;
        if n == 0 {
            break;
        }
        if let Some(b) = head[..n].iter().find(|b| !b.is_ascii_whitespace()) {
            found = Some(*b);
            break;
        }
    }
    file.rewind()?;
    Ok(found == Some(b'['))
}

/// The first non-blank line parsed as an object, keys in file order.
fn first_record(
    reader: &mut impl BufRead,
) -> std::result::Result<Option<Map<String, Value>>, String> {
    let mut line = String::new();
    loop {
        line.clear();
        if reader.read_line(&mut line).map_err(|e| e.to_string())? == 0 {
            return Ok(None);
        }
        if !line.trim().is_empty() {
            break;
        }
    }
    match serde_json::from_str::<Value>(&line).map_err(|e| e.to_string())? {
        Value::Object(map) => Ok(Some(map)),
        other => Err(format!("Expected a JSON object per line, found {other}")),
    }
}

/// Reorders inferred fields to follow `first`'s keys; keys first seen in later rows go last.
///
/// Arrow's inference orders fields by name, not by position in the file.
fn in_key_order(inferred: Schema, first: Option<&Map<String, Value>>) -> Schema {
    let Some(first) = first else {
        return inferred;
    };
    let mut fields: Vec<_> = first
        .keys()
        .filter_map(|key| inferred.field_with_name(key).ok().cloned())
        .collect();
    for field in inferred.fields() {
        if !first.contains_key(field.name()) {
            fields.push(field.as_ref().clone());
        }
    }
    Schema::new(fields)
}
