use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use super::source::{DatasetSource, HubDataset, LocalDataset};
use super::table::{MergedTable, SplitTable};
use super::writer::{write_parquet, ParquetCompression};
use crate::error::{PipelineError, Result};

/// Summary of one materialization run.
#[derive(Debug, Clone)]
pub struct MaterializeReport {
    /// Dataset the rows came from.
    pub dataset: String,
    /// File that was written.
    pub output: PathBuf,
    /// Total rows written.
    pub rows: usize,
    /// Columns written.
    pub columns: usize,
    /// Rows contributed by each split, in output order.
    pub split_rows: Vec<(String, usize)>,
    /// Size of the output file.
    pub bytes_written: u64,
    /// Wall time from first download to closed file.
    pub elapsed: Duration,
}

impl MaterializeReport {
    /// `(rows, columns)`.
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.columns)
    }
}

/// Stacks dataset splits into a single Parquet file.
///
/// Construct with [`DatasetMaterializerBuilder`].
///
/// # Examples
///
/// ```rust,no_run
/// use sentiment_pipelines::datasets::DatasetMaterializerBuilder;
///
/// # fn main() -> sentiment_pipelines::error::Result<()> {
/// let report = DatasetMaterializerBuilder::hub("mteb/tweet_sentiment_extraction")
///     .output("train.parquet")
///     .build()?
///     .run()?;
/// println!("{:?} rows/columns written", report.shape());
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct DatasetMaterializer<S: DatasetSource> {
    source: S,
    splits: Vec<String>,
    output: PathBuf,
    compression: ParquetCompression,
}

impl<S: DatasetSource> DatasetMaterializer<S> {
    /// Fetches every configured split and stacks them in order.
    ///
    /// Nothing is written to disk.
    ///
    /// # Errors
    ///
    /// [`PipelineError::ResourceUnavailable`] if a split cannot be fetched,
    /// [`PipelineError::SchemaMismatch`] if the splits' columns differ.
    pub fn load(&self) -> Result<MergedTable> {
        let tables = self
            .splits
            .iter()
            .map(|split| self.source.load_split(split))
            .collect::<Result<Vec<SplitTable>>>()?;

        let merged = MergedTable::concat(&tables)?;
        let (rows, columns) = merged.shape();
        tracing::info!(dataset = %self.source.describe(), rows, columns, "splits merged");
        Ok(merged)
    }

    /// Writes `table` to the output path, replacing any existing file.
    ///
    /// # Errors
    ///
    /// [`PipelineError::Io`] if the output location is not writable.
    pub fn write(&self, table: &MergedTable) -> Result<u64> {
        let bytes = write_parquet(&self.output, table.batch(), self.compression)?;
        tracing::info!(path = %self.output.display(), bytes, "dataset saved");
        Ok(bytes)
    }

    /// [`load`](Self::load) then [`write`](Self::write).
    ///
    /// The output file is only created once every split has been fetched and merged.
    pub fn run(&self) -> Result<MaterializeReport> {
        let started = Instant::now();
        let table = self.load()?;
        let bytes_written = self.write(&table)?;

        Ok(MaterializeReport {
            dataset: self.source.describe(),
            output: self.output.clone(),
            rows: table.num_rows(),
            columns: table.num_columns(),
            split_rows: table.split_rows().to_vec(),
            bytes_written,
            elapsed: started.elapsed(),
        })
    }

    /// Where the Parquet file goes.
    pub fn output(&self) -> &Path {
        &self.output
    }

    /// Splits in stacking order.
    pub fn splits(&self) -> &[String] {
        &self.splits
    }

    /// Where the rows come from.
    pub fn source(&self) -> &S {
        &self.source
    }
}

/// Builder for [`DatasetMaterializer`].
///
/// Defaults: splits `test` then `train`, output `train.parquet`, Snappy compression.
#[derive(Debug)]
pub struct DatasetMaterializerBuilder<S: DatasetSource> {
    source: S,
    splits: Vec<String>,
    output: PathBuf,
    compression: ParquetCompression,
}

impl<S: DatasetSource> DatasetMaterializerBuilder<S> {
    /// Starts from any [`DatasetSource`].
    pub fn new(source: S) -> Self {
        Self {
            source,
            splits: crate::DEFAULT_SPLITS.iter().map(|s| s.to_string()).collect(),
            output: PathBuf::from(crate::DEFAULT_OUTPUT_PATH),
            compression: ParquetCompression::default(),
        }
    }

    /// Splits to stack, in output order.
    pub fn splits<I, T>(mut self, splits: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.splits = splits.into_iter().map(Into::into).collect();
        self
    }

    /// Output file path.
    pub fn output(mut self, path: impl Into<PathBuf>) -> Self {
        self.output = path.into();
        self
    }

    /// Parquet compression codec.
    pub fn compression(mut self, compression: ParquetCompression) -> Self {
        self.compression = compression;
        self
    }

    /// Finishes configuration.
    ///
    /// # Errors
    ///
    /// [`PipelineError::Unexpected`] if no splits are configured.
    pub fn build(self) -> Result<DatasetMaterializer<S>> {
        if self.splits.is_empty() {
            return Err(PipelineError::Unexpected(
                "At least one split is required".to_string(),
            ));
        }
        Ok(DatasetMaterializer {
            source: self.source,
            splits: self.splits,
            output: self.output,
            compression: self.compression,
        })
    }
}

impl DatasetMaterializerBuilder<HubDataset> {
    /// Materializes a hub dataset.
    pub fn hub(id: &str) -> Self {
        Self::new(HubDataset::new(id))
    }

    /// Materializes `mteb/tweet_sentiment_extraction`.
    pub fn tweet_sentiment() -> Self {
        Self::hub(crate::DEFAULT_DATASET_ID)
    }

    /// Pins the hub dataset to a branch, tag or commit.
    pub fn revision(mut self, revision: &str) -> Self {
        self.source = self.source.with_revision(revision);
        self
    }
}

impl DatasetMaterializerBuilder<LocalDataset> {
    /// Materializes a dataset laid out in a local directory.
    pub fn local(root: impl Into<PathBuf>) -> Self {
        Self::new(LocalDataset::new(root))
    }
}
