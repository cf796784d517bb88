//! Dataset materialization.
//!
//! Fetches the splits of a dataset, stacks them row-wise (test rows first, then train rows by
//! default) and writes a single Snappy-compressed Parquet file.
//!
//! ```rust,no_run
//! use sentiment_pipelines::datasets::DatasetMaterializerBuilder;
//!
//! # fn main() -> sentiment_pipelines::error::Result<()> {
//! let materializer = DatasetMaterializerBuilder::tweet_sentiment().build()?;
//!
//! let table = materializer.load()?;
//! println!("shape of the data is: {:?}", table.shape());
//! materializer.write(&table)?;
//! # Ok(())
//! # }
//! ```
//!
//! Split files are discovered by name: a `.parquet`, `.jsonl`, `.json` or `.csv` file belongs to
//! `train` when a word of its path is `train` or `training`, to `test` for `test`, `testing`,
//! `eval` or `evaluation`, and so on. Hub datasets without matching files on their default branch
//! fall back to the hub's auto-converted Parquet revision.

mod materializer;
mod reader;
mod source;
mod splits;
mod table;
mod writer;

pub use materializer::{DatasetMaterializer, DatasetMaterializerBuilder, MaterializeReport};
pub use reader::read_batches;
pub use source::{DatasetSource, HubDataset, LocalDataset};
pub use splits::{matches_split, split_files, DataFormat};
pub use table::{MergedTable, SplitTable};
pub use writer::{write_parquet, ParquetCompression};
