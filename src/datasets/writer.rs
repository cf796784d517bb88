//! Parquet serialization of merged tables.

use std::fs::File;
use std::path::Path;

use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use parquet::basic::{Compression, GzipLevel, ZstdLevel};
use parquet::file::properties::WriterProperties;

use crate::error::{PipelineError, Result};

/// Column compression codec for the output file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ParquetCompression {
    /// Snappy (default).
    #[default]
    Snappy,
    /// Zstandard at its default level.
    Zstd,
    /// Gzip at its default level.
    Gzip,
    /// No compression.
    Uncompressed,
}

impl ParquetCompression {
    fn codec(self) -> Compression {
        match self {
            ParquetCompression::Snappy => Compression::SNAPPY,
            ParquetCompression::Zstd => Compression::ZSTD(ZstdLevel::default()),
            ParquetCompression::Gzip => Compression::GZIP(GzipLevel::default()),
            ParquetCompression::Uncompressed => Compression::UNCOMPRESSED,
        }
    }
}

/// Writes `batch` to `path`, creating or truncating the file. Returns the bytes written.
///
/// A failure part-way through can leave a truncated file behind.
pub fn write_parquet(
    path: &Path,
    batch: &RecordBatch,
    compression: ParquetCompression,
) -> Result<u64> {
    let file = File::create(path).map_err(|e| {
        PipelineError::Io(format!("Failed to create '{}': {}", path.display(), e))
    })?;

    let props = WriterProperties::builder()
        .set_compression(compression.codec())
        .build();

    let mut writer = ArrowWriter::try_new(file, batch.schema(), Some(props))?;
    writer.write(batch)?;
    writer.close()?;

    let bytes = std::fs::metadata(path)?.len();
    tracing::debug!(path = %path.display(), bytes, ?compression, "parquet written");
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{Int64Array, StringArray};
    use arrow::datatypes::{DataType, Field, Schema};
    use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
    use parquet::file::reader::{FileReader, SerializedFileReader};
    use std::sync::Arc;

    fn sample_batch() -> RecordBatch {
        let schema = Arc::new(Schema::new(vec![
            Field::new("text", DataType::Utf8, true),
            Field::new("label", DataType::Int64, true),
        ]));
        RecordBatch::try_new(
            schema,
            vec![
                Arc::new(StringArray::from(vec!["love it", "hate it", "meh"])),
                Arc::new(Int64Array::from(vec![2, 0, 1])),
            ],
        )
        .unwrap()
    }

    #[test]
    fn writes_snappy_columns_and_all_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("train.parquet");

        let bytes = write_parquet(&path, &sample_batch(), ParquetCompression::default()).unwrap();
        assert!(bytes > 0);

        let reader = SerializedFileReader::new(File::open(&path).unwrap()).unwrap();
        let metadata = reader.metadata();
        assert_eq!(metadata.file_metadata().num_rows(), 3);
        assert_eq!(metadata.row_group(0).column(0).compression(), Compression::SNAPPY);

        let rows: usize = ParquetRecordBatchReaderBuilder::try_new(File::open(&path).unwrap())
            .unwrap()
            .build()
            .unwrap()
            .map(|b| b.unwrap().num_rows())
            .sum();
        assert_eq!(rows, 3);
    }

    #[test]
    fn existing_file_is_overwritten() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("train.parquet");
        std::fs::write(&path, vec![0u8; 1 << 16]).unwrap();

        let bytes =
            write_parquet(&path, &sample_batch(), ParquetCompression::Uncompressed).unwrap();
        assert_eq!(std::fs::metadata(&path).unwrap().len(), bytes);
        assert!(bytes < 1 << 16);
    }

    #[test]
    fn unwritable_location_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("train.parquet");

        let err = write_parquet(&path, &sample_batch(), ParquetCompression::Snappy).unwrap_err();
        assert!(matches!(err, PipelineError::Io(_)));
    }
}
